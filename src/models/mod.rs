pub mod product;
pub mod specification;

// Re-exports for convenience
pub use product::*;
pub use specification::*;
