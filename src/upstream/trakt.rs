use crate::upstream::{send_json, FetchResult};
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "trakt";
const API_VERSION: &str = "2";

/// Catalog and ratings provider client.
pub struct TraktClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TraktClient {
    pub fn new(base_url: &str, api_key: &str) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)], timeout: Duration) -> FetchResult {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Trakt request");

        let request = self
            .http
            .get(&url)
            .header("Content-Type", "application/json")
            .header("trakt-api-version", API_VERSION)
            .header("trakt-api-key", &self.api_key)
            .query(query);

        send_json(PROVIDER, path, request, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamError;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn sends_auth_headers_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .and(query_param("query", "batman"))
            .and(header("trakt-api-key", "secret"))
            .and(header("trakt-api-version", "2"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"type": "movie"}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = TraktClient::new(&server.uri(), "secret").unwrap();
        let body = client
            .get("/search/movie", &[("query", "batman".to_string())], TIMEOUT)
            .await
            .unwrap();

        assert_eq!(body, Some(json!([{"type": "movie"}])));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movies/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = TraktClient::new(&server.uri(), "secret").unwrap();
        let err = client.get("/movies/9", &[], TIMEOUT).await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movies/1/stats"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"watchers": 1}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = TraktClient::new(&server.uri(), "secret").unwrap();
        let err = client
            .get("/movies/1/stats", &[], Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Timeout { provider: "trakt", .. }));
    }

    #[tokio::test]
    async fn null_body_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let client = TraktClient::new(&server.uri(), "secret").unwrap();
        assert_eq!(client.get("/movies/2", &[], TIMEOUT).await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_json_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = TraktClient::new(&server.uri(), "secret").unwrap();
        let err = client.get("/movies/3", &[], TIMEOUT).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode { .. }));
    }
}
