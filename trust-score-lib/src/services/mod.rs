//! Clients for the external services the evaluators consult.
//!
//! Both services sit behind small dyn-compatible traits so the pipeline can be driven by
//! fakes in tests.

mod dataset_metadata;
mod llm;
mod resilient_http;

pub use dataset_metadata::{DatasetInfo, DatasetMetadataProvider, HuggingFaceClient};
pub use llm::{DEFAULT_CHAT_RESPONSE, GenAiClient, LlmProvider};
pub use resilient_http::RetryPolicy;

const LOG_TARGET: &str = "  services";
