//! JSON-RPC 2.0 envelopes spoken to the Leantime `/api/jsonrpc` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as J};

/// Leantime answers every call from this gateway under the same id.
pub const REQUEST_ID: i64 = 1;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RpcReq {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Map<String, J>,
    pub id: i64,
}

impl RpcReq {
    pub fn new(method: &'static str, params: Map<String, J>) -> Self {
        RpcReq { jsonrpc: "2.0", method, params, id: REQUEST_ID }
    }
}

/// Response envelope. `error` is checked first: when present the call is a
/// remote failure regardless of what `result` carries.
#[derive(Deserialize, Debug, Default)]
pub struct RpcResp {
    #[serde(default)]
    pub result: Option<J>,
    #[serde(default)]
    pub error: Option<J>,
}

impl RpcResp {
    pub fn into_result(self) -> Result<J, J> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result.unwrap_or(J::Null)),
        }
    }
}
