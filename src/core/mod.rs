pub mod canonical;
pub mod extractor;
pub mod navigator;
pub mod pipeline;
pub mod retry;
pub mod specifications;

pub use canonical::{CanonicalField, CanonicalMapper};
pub use navigator::{PageNavigator, PageState};
pub use pipeline::ProductPipeline;
pub use retry::{BackoffRange, Pause, RetryExecutor, RetryPolicy, TokioPause};
