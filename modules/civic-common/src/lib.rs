pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, LocalityRule};
pub use error::CivicError;
pub use types::*;
