//! Tool registry - holds the tools offered to the model
//!
//! Lookups are exact-match on the tool name. An unknown name is a normal
//! outcome, not an error: the model chooses names freely and the caller
//! must degrade gracefully.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Result, StackchatError, ToolDeclaration};
use crate::tools::Tool;

/// Registry of available tools
///
/// Keeps registration order so the declaration list the model sees is
/// stable for the lifetime of a conversation loop.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    ///
    /// Fails with [`StackchatError::DuplicateTool`] if the name is taken.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.declaration().tool_name.clone();
        if self.index.contains_key(&name) {
            return Err(StackchatError::DuplicateTool(name));
        }
        self.index.insert(name, self.entries.len());
        self.entries.push(tool);
        Ok(())
    }

    /// Look up a tool by name
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| Arc::clone(&self.entries[i]))
    }

    /// All declarations in registration order
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.entries.iter().map(|t| t.declaration().clone()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
