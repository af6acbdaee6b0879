pub mod error;

pub use error::{AppError, DriverError, Result};
