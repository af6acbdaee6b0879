pub mod browser;
pub mod config;
pub mod core;
pub mod logging;
pub mod models;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use utils::error::{AppError, DriverError};

pub type Result<T> = std::result::Result<T, AppError>;
