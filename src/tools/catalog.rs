//! The five catalog tools.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog::{COMPONENT_ID_MAX_LEN, COMPONENT_ID_PATTERN};
use crate::schema::SchemaNode;
use crate::search::{SearchFilters, MAX_LIMIT, MIN_LIMIT};
use crate::service::MAX_QUERY_LEN;

use super::registry::{ToolBuilder, ToolContext, ToolOutput, ToolRegistry, ToolResult};
use super::protocol::ToolError;

pub fn register_all_tools(registry: &mut ToolRegistry) {
    registry.register(search_components_tool());
    registry.register(get_component_tool());
    registry.register(list_categories_tool());
    registry.register(browse_category_tool());
    registry.register(get_random_component_tool());
}

fn parse_args<T: for<'de> Deserialize<'de>>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Internal(e.to_string()))
}

fn id_schema() -> SchemaNode {
    SchemaNode::string()
        .pattern(COMPONENT_ID_PATTERN)
        .max_length(COMPONENT_ID_MAX_LEN)
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    difficulty: Option<crate::catalog::Difficulty>,
    #[serde(default)]
    has_demo: Option<bool>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    offset: Option<usize>,
}

fn search_components_tool() -> super::registry::RegisteredTool {
    ToolBuilder::new("search_components")
        .description("Search UI components by text query with optional filters")
        .input_schema(
            SchemaNode::object()
                .property(
                    "query",
                    SchemaNode::string().min_length(1).max_length(MAX_QUERY_LEN),
                )
                .property("category", id_schema())
                .property(
                    "tags",
                    SchemaNode::array()
                        .max_items(10)
                        .unique()
                        .items(SchemaNode::string().min_length(1)),
                )
                .property(
                    "difficulty",
                    SchemaNode::string().one_of(&["beginner", "intermediate", "advanced"]),
                )
                .property("has_demo", SchemaNode::boolean())
                .property(
                    "limit",
                    SchemaNode::integer()
                        .minimum(MIN_LIMIT as i64)
                        .maximum(MAX_LIMIT as i64),
                )
                .property("offset", SchemaNode::integer().minimum(0))
                .required(&["query"])
                .no_additional_properties(),
        )
        .build(|ctx: ToolContext, args: Value| async move {
            let args: SearchArgs = parse_args(args)?;
            let filters = SearchFilters {
                category: args.category,
                tags: args.tags,
                difficulty: args.difficulty,
                has_demo: args.has_demo,
                limit: args.limit,
                offset: args.offset,
                ..SearchFilters::default()
            };
            let (page, cached) = ctx.search_components(&args.query, &filters).await?;
            Ok(ToolOutput::new(to_json(&page)?, cached))
        })
}

#[derive(Debug, Deserialize)]
struct GetComponentArgs {
    id: String,
}

fn get_component_tool() -> super::registry::RegisteredTool {
    ToolBuilder::new("get_component")
        .description("Fetch one component by id, full code included")
        .input_schema(
            SchemaNode::object()
                .property("id", id_schema())
                .required(&["id"])
                .no_additional_properties(),
        )
        .build(|ctx: ToolContext, args: Value| async move {
            let args: GetComponentArgs = parse_args(args)?;
            let (component, cached) = ctx.get_component(&args.id).await?;
            Ok(ToolOutput::new(to_json(&component)?, cached))
        })
}

fn list_categories_tool() -> super::registry::RegisteredTool {
    ToolBuilder::new("list_categories")
        .description("List all catalog categories")
        .build(|ctx: ToolContext, _args: Value| async move {
            let categories = ctx.list_categories().await?;
            Ok(ToolOutput::fresh(json!({
                "categories": to_json(&categories)?,
                "total": categories.len(),
            })))
        })
}

#[derive(Debug, Deserialize)]
struct BrowseCategoryArgs {
    category_id: String,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    offset: Option<usize>,
}

fn browse_category_tool() -> super::registry::RegisteredTool {
    ToolBuilder::new("browse_category")
        .description("Page through the components of one category")
        .input_schema(
            SchemaNode::object()
                .property("category_id", id_schema())
                .property(
                    "limit",
                    SchemaNode::integer()
                        .minimum(MIN_LIMIT as i64)
                        .maximum(MAX_LIMIT as i64),
                )
                .property("offset", SchemaNode::integer().minimum(0))
                .required(&["category_id"])
                .no_additional_properties(),
        )
        .build(|ctx: ToolContext, args: Value| async move {
            let args: BrowseCategoryArgs = parse_args(args)?;
            let (page, cached) = ctx
                .browse_category(&args.category_id, args.limit, args.offset)
                .await?;
            Ok(ToolOutput::new(to_json(&page)?, cached))
        })
}

fn get_random_component_tool() -> super::registry::RegisteredTool {
    ToolBuilder::new("get_random_component")
        .description("Fetch a uniformly random component")
        .build(|ctx: ToolContext, _args: Value| async move {
            let component = ctx.get_random_component().await?;
            Ok(ToolOutput::fresh(to_json(&component)?))
        })
}
