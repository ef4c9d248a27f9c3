use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a reqwest client with the default request timeout.
pub fn make_http_client() -> reqwest::Result<reqwest::Client> {
    make_http_client_with(DEFAULT_TIMEOUT)
}

/// Build a reqwest client with a connect timeout and the given total timeout.
/// Requests that exceed it fail like any other transport error.
pub fn make_http_client_with(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_default_and_custom_clients() {
        assert!(make_http_client().is_ok());
        assert!(make_http_client_with(Duration::from_millis(250)).is_ok());
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        use httpmock::prelude::*;
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500));
        });
        let http = make_http_client_with(Duration::from_millis(50)).unwrap();
        let err = http.get(server.url("/slow")).send().await.unwrap_err();
        assert!(err.is_timeout());
    }
}
