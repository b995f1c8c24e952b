//! Tool registries
//!
//! The loop sees tools only through the [`ToolRegistry`] trait: a list of
//! descriptors and an `invoke(name, input, cancel)` call.
//!
//! ```text
//! ┌──────────────────────────┐
//! │  ToolLoop / ToolInvoker   │
//! └────────────┬─────────────┘
//!              │ list / invoke
//!              ▼
//! ┌──────────────────────────┐      MCP (tools/list, tools/call)
//! │  McpToolRegistry          │ ───────────────────────────────▶ backend
//! │  MemoryToolRegistry       │      closures, in-process
//! └──────────────────────────┘
//! ```

mod traits;
mod filter;
mod registry;
mod memory;

pub use traits::{ToolError, ToolRegistry, ToolRegistryResult};
pub use filter::{ToolFilter, ToolInfo};
pub use registry::{McpToolRegistry, output_from_mcp};
pub use memory::MemoryToolRegistry;
