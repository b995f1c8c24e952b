//! Loop settings and their partial (file) form

use serde::{Deserialize, Serialize};

use crate::orchestrator::TruncationPolicy;
use crate::tools::ToolFilter;

use super::error::{ConfigError, ConfigResult};

/// Rounds allowed before the loop force-stops
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Words that mark a prompt as an analysis request rather than a lookup
pub const DEFAULT_ANALYSIS_KEYWORDS: &[&str] = &[
    "analyze",
    "analyse",
    "analysis",
    "investigate",
    "diagnose",
    "root cause",
    "why",
    "trend",
    "compare",
    "correlate",
    "anomal",
    "insight",
];

/// Section headings an analysis answer must contain
pub const DEFAULT_REQUIRED_SECTIONS: &[&str] = &["## Key Findings", "## Recommendations"];

/// Settings for the conclusion enforcer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConclusionConfig {
    /// Whether the enforcer runs at all
    pub enabled: bool,
    /// Case-insensitive substrings that classify a prompt as analysis
    pub keywords: Vec<String>,
    /// Markers that must appear in an analysis answer
    pub required_sections: Vec<String>,
}

impl Default for ConclusionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keywords: DEFAULT_ANALYSIS_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            required_sections: DEFAULT_REQUIRED_SECTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Which registry tools are offered to the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSelection {
    /// If non-empty, only these tools
    #[serde(default)]
    pub include: Vec<String>,
    /// Never these tools
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ToolSelection {
    pub fn to_filter(&self) -> ToolFilter {
        let mut filter = ToolFilter::new().with_exclude(self.exclude.iter().cloned());
        if !self.include.is_empty() {
            filter = filter.with_include(self.include.iter().cloned());
        }
        filter
    }
}

/// Effective configuration of a loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    pub max_iterations: usize,
    pub truncation: TruncationPolicy,
    pub conclusion: ConclusionConfig,
    pub tools: ToolSelection,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            truncation: TruncationPolicy::default(),
            conclusion: ConclusionConfig::default(),
            tools: ToolSelection::default(),
        }
    }
}

impl LoopConfig {
    /// Set the iteration cap (values below 1 are raised to 1)
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Set the truncation limit
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.truncation = TruncationPolicy::new(max_bytes);
        self
    }

    /// Set the conclusion settings
    pub fn with_conclusion(mut self, conclusion: ConclusionConfig) -> Self {
        self.conclusion = conclusion;
        self
    }

    /// Check values that cannot be clamped into something sensible
    pub fn validate(&self) -> ConfigResult<()> {
        if self.truncation.max_bytes == 0 {
            return Err(ConfigError::Invalid("truncation.max_bytes must be greater than 0".into()));
        }
        if self.conclusion.enabled && self.conclusion.required_sections.is_empty() {
            return Err(ConfigError::Invalid(
                "conclusion.required_sections must not be empty when the enforcer is enabled".into(),
            ));
        }
        Ok(())
    }

    /// Apply the values set in a partial config on top of this one
    pub fn apply(mut self, partial: &PartialLoopConfig) -> Self {
        if let Some(max_iterations) = partial.max_iterations {
            self.max_iterations = max_iterations.max(1);
        }
        if let Some(ref truncation) = partial.truncation {
            if let Some(max_bytes) = truncation.max_bytes {
                self.truncation = TruncationPolicy::new(max_bytes);
            }
        }
        if let Some(ref conclusion) = partial.conclusion {
            if let Some(enabled) = conclusion.enabled {
                self.conclusion.enabled = enabled;
            }
            if let Some(ref keywords) = conclusion.keywords {
                self.conclusion.keywords = keywords.clone();
            }
            if let Some(ref sections) = conclusion.required_sections {
                self.conclusion.required_sections = sections.clone();
            }
        }
        if let Some(ref tools) = partial.tools {
            self.tools = tools.clone();
        }
        self
    }
}

/// Truncation settings as written in a config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialTruncation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<usize>,
}

/// Conclusion settings as written in a config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialConclusion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_sections: Option<Vec<String>>,
}

/// A config file: every field optional so user and workspace files layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialLoopConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncation: Option<PartialTruncation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<PartialConclusion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolSelection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoopConfig::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.truncation.max_bytes, 100_000);
        assert!(config.conclusion.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_iterations_clamped() {
        assert_eq!(LoopConfig::default().with_max_iterations(0).max_iterations, 1);

        let partial = PartialLoopConfig {
            max_iterations: Some(0),
            ..Default::default()
        };
        assert_eq!(LoopConfig::default().apply(&partial).max_iterations, 1);
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let config = LoopConfig::default().with_max_bytes(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_apply_is_field_by_field() {
        let partial: PartialLoopConfig = serde_yaml::from_str(
            "truncation:\n  max_bytes: 2048\nconclusion:\n  enabled: false\n",
        )
        .unwrap();

        let config = LoopConfig::default().apply(&partial);
        assert_eq!(config.truncation.max_bytes, 2048);
        assert!(!config.conclusion.enabled);
        // Untouched fields keep their defaults
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.conclusion.keywords, ConclusionConfig::default().keywords);
    }

    #[test]
    fn test_tool_selection_filter() {
        let selection = ToolSelection {
            include: vec![],
            exclude: vec!["drop_table".to_string()],
        };
        let filter = selection.to_filter();
        assert!(filter.include.is_none());
        assert!(filter.exclude.contains("drop_table"));

        let selection = ToolSelection {
            include: vec!["query_table".to_string()],
            exclude: vec![],
        };
        assert!(selection.to_filter().matches_name("query_table"));
        assert!(!selection.to_filter().matches_name("list_tables"));
    }
}
