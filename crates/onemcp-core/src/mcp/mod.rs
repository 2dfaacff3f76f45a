//! MCP server model: records, partial updates, validation and argument
//! string helpers.

pub mod args;
pub mod server;
pub mod validation;

pub use args::{parse_args, stringify_args};
pub use server::{
    ApprovalSettings, ServerRecord, ServerUpdate, ToolSettings, generate_server_id,
};
pub use validation::{is_valid_name, validate_server};
