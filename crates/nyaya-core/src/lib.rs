pub mod config;
pub mod error;

pub use config::NyayaConfig;
pub use error::{NyayaError, Result};
