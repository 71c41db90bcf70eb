pub mod assistant;
pub mod config;
pub mod error;
pub mod pricing;
pub mod session;
pub mod token;

// Re-export common error type
pub use error::{Result, TestaError};
