//! Core types: Leantime wire envelopes, row filtering and the client error model.

pub mod error;
pub mod jsonrpc;
pub mod rows;
