//! Register the MCP toolgroup with the stack
//!
//! Points the stack at a running MCP server so server-side agents can use
//! its tools by toolgroup id.

use crate::client::StackClient;
use crate::core::{Config, Result};

pub async fn run(config: &Config) -> Result<()> {
    let client = StackClient::from_config(config)?;

    client
        .register_toolgroup(&config.mcp.toolgroup_id, &config.mcp.endpoint_uri)
        .await?;

    println!(
        "Successfully registered MCP toolgroup: {}",
        config.mcp.toolgroup_id
    );
    Ok(())
}
