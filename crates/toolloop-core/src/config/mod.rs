//! Loop configuration
//!
//! Settings come from defaults, then a user-level YAML file
//! (`<config dir>/toolloop/config.yaml`), then a workspace-level one
//! (`<workspace>/.config/toolloop/config.yaml`). Later layers override
//! earlier ones field by field.

mod error;
mod settings;
mod file;

pub use error::{ConfigError, ConfigResult};
pub use settings::{
    ConclusionConfig, LoopConfig, PartialConclusion, PartialLoopConfig, PartialTruncation,
    ToolSelection, DEFAULT_ANALYSIS_KEYWORDS, DEFAULT_MAX_ITERATIONS, DEFAULT_REQUIRED_SECTIONS,
};
pub use file::{load_layered, ConfigLevel, FileConfigProvider};
