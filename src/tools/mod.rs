pub mod reference;
pub mod wikipedia;

pub use reference::ReferenceLookup;
pub use wikipedia::WikipediaLookup;
