//! extractbench-providers: reference collaborators for extractbench
//!
//! - [`HttpFetcher`]: plain HTTP GET into a `Document`
//! - [`ChatClient`]: OpenAI-compatible chat completions with usage metering
//! - [`ChatExtractor`]: `basic` and `iterative-prompt` answer extraction
//! - [`ChatLinkDiscovery`]: AI-picked links from a seed page's anchors
//! - [`ProviderFactory`]: one fresh chat session per evaluation
//!
//! Provider endpoints and keys come from the environment
//! (`OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OLLAMA_BASE_URL`, ...).

pub mod chat;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod factory;
pub mod http;
pub mod markup;

pub use chat::{AiId, ChatClient, Endpoint, Pricing};
pub use discovery::ChatLinkDiscovery;
pub use error::{ProviderError, Result};
pub use extractor::{ChatExtractor, Preprocess, Strategy};
pub use factory::ProviderFactory;
pub use http::{HttpFetcher, DEFAULT_TIMEOUT};
