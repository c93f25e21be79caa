//! Tools module - capabilities the model can invoke by name
//!
//! Contains the tool trait, the registry, the invoker, the demo favorites
//! tools, and MCP-backed remote tools.

pub mod favorites;
pub mod invoker;
pub mod mcp;
pub mod registry;

use async_trait::async_trait;

use crate::core::{Result, ToolDeclaration};

pub use registry::ToolRegistry;

/// A capability the model can invoke by name
///
/// Implementations are either in-process functions or proxies for tools
/// served by a remote MCP session.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The declaration advertised to the model
    fn declaration(&self) -> &ToolDeclaration;

    /// Execute with the model-supplied arguments
    ///
    /// Failures are ordinary `Err` values here; the invoker converts them
    /// into tool messages so they never abort a conversation.
    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String>;
}

/// A tool backed by a plain function
pub struct FunctionTool {
    declaration: ToolDeclaration,
    func: Box<dyn Fn(&serde_json::Value) -> Result<String> + Send + Sync>,
}

impl FunctionTool {
    /// Create a tool from a declaration and a function
    pub fn new(
        declaration: ToolDeclaration,
        func: impl Fn(&serde_json::Value) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            declaration,
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String> {
        (self.func)(arguments)
    }
}
