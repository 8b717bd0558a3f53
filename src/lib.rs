// Re-export modules
pub mod config;
pub mod error;
pub mod filter;
pub mod identity;
pub mod orchestrator;
pub mod parsers;
pub mod renderers;
pub mod results;
pub mod server;
pub mod store;
pub mod utils;

// Re-export commonly used types for convenience
pub use error::{ExtractionError, Stage};
pub use orchestrator::{ExtractionOutcome, ExtractionRequest, Extractor};
pub use results::{ExtractedLink, PersistedLinkRecord};
