pub mod config;
pub mod dictionary;
pub mod error;
pub mod matcher;
pub mod report;
pub mod session;
pub mod store;
pub mod summarizer;

pub use error::{PolicyLensError, Result};
pub use session::{AnalysisSession, Provenance};
