pub mod checks;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod querylog;
pub mod report;
pub mod store;

pub use error::{Result, TablecheckError};
