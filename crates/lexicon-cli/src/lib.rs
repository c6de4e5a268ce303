pub mod handlers;
pub mod index;

pub use handlers::{AppState, router};
pub use index::{LexiconIndex, SearchParams, SearchResult};
