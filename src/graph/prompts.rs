pub fn supervisor_prompt(question: &str, draft: &str) -> String {
    format!(
        "You are an AI quality supervisor. Review the answer produced by the knowledge-base \
assistant and decide the next step.\n\
Respond ONLY with a JSON object containing two fields: \"type\" and \"data\".\n\n\
\"type\" must be one of:\n\
- \"FinalAnswer\" (the answer is excellent and ready for the user)\n\
- \"CorrectAndRefine\" (the answer is correct but needs better style or clarity)\n\
- \"ComplementWithWikipedia\" (the answer is good but would benefit from extra Wikipedia context)\n\n\
\"data\" must match the chosen type:\n\
FinalAnswer: {{\"answer\": \"the final, well-formed answer to show the user\"}}\n\
CorrectAndRefine: {{\"reasoning\": \"why the answer needs refining\", \"corrected_answer\": \"the improved answer\"}}\n\
ComplementWithWikipedia: {{\"reasoning\": \"why extra context is needed\", \"search_query\": \"a Wikipedia search query, e.g. 'Economic order quantity'\"}}\n\n\
Example:\n\
{{\"type\": \"FinalAnswer\", \"data\": {{\"answer\": \"Just-in-time is a production approach that removes waste...\"}}}}\n\n\
Original question: \"{question}\"\n\
Assistant answer: \"{draft}\"\n\n\
Your JSON response:"
    )
}

pub fn merge_prompt(draft: &str, reference: &str) -> String {
    format!(
        "Combine the original answer with the Wikipedia context so it reads naturally. \
Keep the original answer's facts and formatting, and add only what the context supports.\n\
Original answer: \"{draft}\"\n\
Wikipedia context: \"{reference}\"\n\
Combined answer:"
    )
}
