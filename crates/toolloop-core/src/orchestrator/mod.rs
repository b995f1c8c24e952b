//! The tool orchestration loop
//!
//! ```text
//!  messages ──▶ ToolLoop ──send_request──▶ ModelGateway
//!                  │  ◀──── fragments ────────┘
//!                  │ text ──▶ OutputSink
//!                  │ tool calls
//!                  ▼
//!              ToolInvoker ──invoke──▶ ToolRegistry
//!                  │ truncate
//!                  ▼
//!            tool results appended, next round
//!
//!  after the loop: ConclusionEnforcer (one tool-free round at most)
//! ```

mod context;
mod error;
mod round;
mod truncation;
mod invoker;
mod controller;
mod conclusion;
mod sink;

pub use context::LoopContext;
pub use error::{LoopError, LoopResult};
pub use truncation::{text_len, truncate, truncation_notice, TruncationPolicy, DEFAULT_MAX_BYTES};
pub use invoker::{sanitize_error, ToolInvoker, ToolResultOutcome};
pub use controller::{LoopOutcome, LoopState, TerminationReason, ToolLoop, TurnOutcome};
pub use conclusion::{ConclusionEnforcer, ConclusionOutcome, KeywordClassifier, RequestClassifier};
pub use sink::{ConsoleSink, LoggerSink, OutputSink, RecordingSink, SinkEvent};
