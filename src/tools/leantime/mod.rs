pub mod ops;
pub mod tool_router;
