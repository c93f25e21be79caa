//! Demo tools answering favorite-color and favorite-hockey questions
//!
//! Fixed lookup tables keyed on city and country. The response strings ask
//! the model to request missing parameters from the user, so the demos can
//! show multi-turn parameter gathering.

use async_trait::async_trait;

use crate::core::{Result, ToolDeclaration};
use crate::tools::{Tool, ToolRegistry};

fn city_country(arguments: &serde_json::Value) -> (Option<&str>, Option<&str>) {
    (
        arguments.get("city").and_then(|v| v.as_str()),
        arguments.get("country").and_then(|v| v.as_str()),
    )
}

/// Returns a person's favorite color given their city and country
pub struct FavoriteColorTool {
    declaration: ToolDeclaration,
}

impl FavoriteColorTool {
    pub fn new() -> Self {
        Self {
            declaration: ToolDeclaration::new(
                "favorite_color_tool",
                "returns the favorite color for person given their City and Country",
            )
            .with_param("city", "string", "the city for the person", true)
            .with_param("country", "string", "the country for the person", true),
        }
    }
}

impl Default for FavoriteColorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FavoriteColorTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String> {
        let answer = match city_country(arguments) {
            (Some("Ottawa"), Some("Canada")) => {
                "the favoriteColorTool returned that the favorite color for Ottawa Canada is black"
            }
            (Some("Montreal"), Some("Canada")) => {
                "the favoriteColorTool returned that the favorite color for Montreal Canada is red"
            }
            _ => {
                "the favoriteColorTool returned The city or country \
                 was not valid, assistant please ask the user for them"
            }
        };
        Ok(answer.to_string())
    }
}

/// Returns a person's favorite hockey team given their city and country
pub struct FavoriteHockeyTool {
    declaration: ToolDeclaration,
}

impl FavoriteHockeyTool {
    pub fn new() -> Self {
        Self {
            declaration: ToolDeclaration::new(
                "favorite_hockey_tool",
                "returns the favorite hockey team for a person given their City and Country",
            )
            .with_param("city", "string", "the city for the person", true)
            .with_param("country", "string", "the country for the person", true),
        }
    }
}

impl Default for FavoriteHockeyTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FavoriteHockeyTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.declaration
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String> {
        let answer = match city_country(arguments) {
            (Some("Ottawa"), Some("Canada")) => {
                "the favoriteHockeyTool returned that the favorite hockey team for \
                 Ottawa Canada is The Ottawa Senators"
            }
            (Some("Montreal"), Some("Canada")) => {
                "the favoriteHockeyTool returned that the favorite hockey team for \
                 Montreal Canada is the Montreal Canadians"
            }
            _ => {
                "the favoriteHockeyTool returned The city or country \
                 was not valid, please ask the user for them"
            }
        };
        Ok(answer.to_string())
    }
}

/// Build a registry holding both favorites tools
pub fn demo_registry() -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(FavoriteColorTool::new())?;
    registry.register(FavoriteHockeyTool::new())?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_favorite_color_known_cities() {
        let tool = FavoriteColorTool::new();

        let answer = tool
            .invoke(&json!({"city": "Ottawa", "country": "Canada"}))
            .await
            .unwrap();
        assert!(answer.contains("black"));

        let answer = tool
            .invoke(&json!({"city": "Montreal", "country": "Canada"}))
            .await
            .unwrap();
        assert!(answer.contains("red"));
    }

    #[tokio::test]
    async fn test_favorite_color_unknown_city_asks_for_parameters() {
        let tool = FavoriteColorTool::new();
        let answer = tool
            .invoke(&json!({"city": "Paris", "country": "France"}))
            .await
            .unwrap();
        assert!(answer.contains("was not valid"));

        // Missing arguments get the same degraded answer
        let answer = tool.invoke(&json!({})).await.unwrap();
        assert!(answer.contains("was not valid"));
    }

    #[tokio::test]
    async fn test_favorite_hockey_teams() {
        let tool = FavoriteHockeyTool::new();

        let answer = tool
            .invoke(&json!({"city": "Ottawa", "country": "Canada"}))
            .await
            .unwrap();
        assert!(answer.contains("The Ottawa Senators"));

        let answer = tool
            .invoke(&json!({"city": "Montreal", "country": "Canada"}))
            .await
            .unwrap();
        assert!(answer.contains("Montreal Canadians"));
    }

    #[test]
    fn test_demo_registry_declaration_order() {
        let registry = demo_registry().unwrap();
        let names: Vec<String> = registry
            .declarations()
            .into_iter()
            .map(|d| d.tool_name)
            .collect();
        assert_eq!(names, vec!["favorite_color_tool", "favorite_hockey_tool"]);
    }
}
