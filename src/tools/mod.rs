mod catalog;
mod protocol;
mod registry;

pub use catalog::register_all_tools;
pub use protocol::{ResponseMetadata, ToolError, ToolErrorBody, ToolRequest, ToolResponse};
pub use registry::{
    RegisteredTool, ToolBuilder, ToolContext, ToolDefinition, ToolOutput, ToolRegistry, ToolResult,
};
