use crate::upstream::{send_json, FetchResult};
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "tmdb";

/// Image/metadata provider client. Without an API key every lookup is a
/// no-op returning `Ok(None)`.
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl TmdbClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)], timeout: Duration) -> FetchResult {
        let Some(api_key) = &self.api_key else {
            return Ok(None);
        };

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "TMDB request");

        let request = self
            .http
            .get(&url)
            .query(query)
            .query(&[("api_key", api_key)]);

        send_json(PROVIDER, path, request, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{any, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn attaches_api_key_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .and(query_param("api_key", "tmdb-key"))
            .and(query_param("query", "Heat"))
            .and(query_param("year", "1995"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": [{"poster_path": "/heat.jpg"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = TmdbClient::new(&server.uri(), Some("tmdb-key".to_string())).unwrap();
        let body = client
            .get(
                "/search/movie",
                &[("query", "Heat".to_string()), ("year", "1995".to_string())],
                TIMEOUT,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(body["results"][0]["poster_path"], "/heat.jpg");
    }

    #[tokio::test]
    async fn unconfigured_client_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = TmdbClient::new(&server.uri(), Some(String::new())).unwrap();
        assert!(!client.is_configured());
        assert_eq!(client.get("/search/movie", &[], TIMEOUT).await.unwrap(), None);
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = TmdbClient::new(&server.uri(), Some("k".to_string())).unwrap();
        let err = client.get("/search/movie", &[], TIMEOUT).await.unwrap_err();
        assert_eq!(err.to_string(), "tmdb returned HTTP 503");
    }
}
