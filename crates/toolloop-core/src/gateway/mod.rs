//! Model gateway implementations
//!
//! The loop only depends on the [`ModelGateway`] trait. Two implementations
//! ship with the crate:
//!
//! - `GenaiGateway`: any provider the `genai` crate can reach, plus
//!   OpenAI-compatible endpoints via a custom `api_base`
//! - `MockGateway`: scripted rounds for tests and demos

mod traits;
mod error;
mod genai_adapter;
mod genai_gateway;
mod mock;

pub use traits::{FragmentStream, ModelGateway, RequestOptions};
pub use error::{GatewayError, GatewayResult};

pub use genai_gateway::GenaiGateway;
pub use genai_adapter::{flatten_part, provider_env_var, GatewayModelConfig, ToolTurns};

pub use mock::{tool_result_texts, MockConfig, MockGateway, MockMode, RecordedRequest};
