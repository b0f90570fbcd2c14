pub mod cli;
pub mod errors;
pub mod loader;
pub mod report;

pub use cli::{QuoteRequest, run_quote, write_error};
pub use errors::FrontendError;
pub use report::{ErrorReport, QuoteReport};
