use reqwest::RequestBuilder;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Generate a simple request id suitable for logging/correlation.
pub fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("lt-{}-{}", now.as_secs(), now.subsec_nanos())
}

/// Add standard headers to an outgoing request. Returns the updated builder and the request id used.
pub fn add_standard_headers(
    builder: RequestBuilder,
    request_id: Option<String>,
) -> (RequestBuilder, String) {
    let rid = request_id.unwrap_or_else(generate_request_id);
    let b = builder.header("x-request-id", rid.as_str()).header(
        reqwest::header::USER_AGENT,
        format!("leantime-mcp-gateway/{}", env!("CARGO_PKG_VERSION")),
    );
    (b, rid)
}

/// Standard headers plus the Leantime API key.
pub fn add_leantime_headers(builder: RequestBuilder, api_key: &str) -> (RequestBuilder, String) {
    let (b, rid) = add_standard_headers(builder, None);
    let b = b
        .header(API_KEY_HEADER, api_key)
        .header(reqwest::header::CONTENT_TYPE, "application/json");
    (b, rid)
}
