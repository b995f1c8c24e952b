//! Tool filtering

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::mcp::is_internal_tool;
use crate::types::ToolDescriptor;

/// Information about a tool with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// What the model sees
    pub descriptor: ToolDescriptor,
    /// Whether this tool is enabled
    pub enabled: bool,
    /// Source of this tool (e.g., "mcp:kusto-backend", "memory")
    pub source: String,
    /// Whether this is an internal tool (hidden from the model)
    pub internal: bool,
}

impl ToolInfo {
    /// Wrap a descriptor, deriving the internal flag from its name
    pub fn new(descriptor: ToolDescriptor, source: impl Into<String>) -> Self {
        let internal = is_internal_tool(&descriptor.name);
        Self {
            descriptor,
            enabled: true,
            source: source.into(),
            internal,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Filter for tool discovery
#[derive(Debug, Clone)]
pub struct ToolFilter {
    /// If set, only include tools with these names
    pub include: Option<HashSet<String>>,
    /// Exclude tools with these names
    pub exclude: HashSet<String>,
    /// Include internal tools (default: false)
    pub include_internal: bool,
    /// Only include enabled tools (default: true)
    pub only_enabled: bool,
}

impl Default for ToolFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolFilter {
    pub fn new() -> Self {
        Self {
            include: None,
            exclude: HashSet::new(),
            include_internal: false,
            only_enabled: true,
        }
    }

    /// Include all tools
    pub fn all() -> Self {
        Self {
            include: None,
            exclude: HashSet::new(),
            include_internal: true,
            only_enabled: false,
        }
    }

    /// Include only specific tools
    pub fn with_include(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.include = Some(names.into_iter().collect());
        self
    }

    /// Exclude specific tools
    pub fn with_exclude(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.exclude = names.into_iter().collect();
        self
    }

    /// Include internal tools
    pub fn with_internal(mut self) -> Self {
        self.include_internal = true;
        self
    }

    /// Check if a tool matches this filter
    pub fn matches(&self, tool: &ToolInfo) -> bool {
        if !self.include_internal && tool.internal {
            return false;
        }

        if self.only_enabled && !tool.enabled {
            return false;
        }

        self.matches_name(tool.name())
    }

    /// Name-only check, for descriptors that carry no enabled/internal state
    pub fn matches_name(&self, name: &str) -> bool {
        if self.exclude.contains(name) {
            return false;
        }

        match self.include {
            Some(ref include) => include.contains(name),
            None => true,
        }
    }

    /// Apply the name rules and internal-tool hiding to plain descriptors
    pub fn apply(&self, tools: Vec<ToolDescriptor>) -> Vec<ToolDescriptor> {
        tools
            .into_iter()
            .filter(|t| self.include_internal || !is_internal_tool(&t.name))
            .filter(|t| self.matches_name(&t.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> ToolInfo {
        ToolInfo::new(ToolDescriptor::new(name, "A tool"), "memory")
    }

    #[test]
    fn test_tool_filter_default() {
        let filter = ToolFilter::new();

        let user_tool = info("query_table");
        let internal_tool = info("_internal_health");
        let mut disabled_tool = info("some_tool");
        disabled_tool.enabled = false;

        assert!(!user_tool.internal);
        assert!(internal_tool.internal);

        assert!(filter.matches(&user_tool));
        assert!(!filter.matches(&internal_tool));
        assert!(!filter.matches(&disabled_tool));
    }

    #[test]
    fn test_tool_filter_with_internal() {
        let filter = ToolFilter::new().with_internal();
        assert!(filter.matches(&info("_internal_health")));
        assert!(ToolFilter::all().matches(&info("_internal_health")));
    }

    #[test]
    fn test_tool_filter_include_exclude() {
        let filter = ToolFilter::new().with_exclude(["drop_table".to_string()]);
        assert!(filter.matches(&info("query_table")));
        assert!(!filter.matches(&info("drop_table")));

        let filter = ToolFilter::new().with_include(["query_table".to_string()]);
        assert!(filter.matches(&info("query_table")));
        assert!(!filter.matches(&info("list_tables")));
    }

    #[test]
    fn test_apply_to_descriptors() {
        let filter = ToolFilter::new().with_exclude(["drop_table".to_string()]);
        let tools = vec![
            ToolDescriptor::new("query_table", ""),
            ToolDescriptor::new("drop_table", ""),
            ToolDescriptor::new("_internal_health", ""),
        ];

        let names: Vec<String> = filter.apply(tools).into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["query_table".to_string()]);
    }
}
