//! Scripted in-memory [`Upstream`] for tests.

use crate::upstream::{FetchResult, Upstream, UpstreamError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16),
    /// Answer after sleeping, so callers' deadlines can expire first.
    Delayed(Duration, Box<Reply>),
}

#[derive(Default)]
pub struct FakeUpstream {
    catalog: HashMap<String, Reply>,
    images: HashMap<String, Reply>,
    image_key: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_key(mut self) -> Self {
        self.image_key = true;
        self
    }

    pub fn catalog(mut self, path: &str, reply: Reply) -> Self {
        self.catalog.insert(path.to_string(), reply);
        self
    }

    pub fn catalog_json(self, path: &str, body: Value) -> Self {
        self.catalog(path, Reply::Json(body))
    }

    /// Script the poster search for one title.
    pub fn poster(mut self, title: &str, reply: Reply) -> Self {
        self.images.insert(title.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn image_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with("image:"))
            .count()
    }

    async fn answer(provider: &'static str, reply: Option<Reply>) -> FetchResult {
        let mut reply = match reply {
            Some(reply) => reply,
            None => return Err(UpstreamError::Status { provider, status: 404 }),
        };
        loop {
            match reply {
                Reply::Json(Value::Null) => return Ok(None),
                Reply::Json(body) => return Ok(Some(body)),
                Reply::Status(status) => return Err(UpstreamError::Status { provider, status }),
                Reply::Delayed(delay, next) => {
                    tokio::time::sleep(delay).await;
                    reply = *next;
                }
            }
        }
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn fetch_catalog(
        &self,
        path: &str,
        _query: &[(&str, String)],
        _timeout: Duration,
    ) -> FetchResult {
        self.calls.lock().unwrap().push(format!("catalog:{path}"));
        Self::answer("trakt", self.catalog.get(path).cloned()).await
    }

    async fn fetch_image_meta(
        &self,
        path: &str,
        query: &[(&str, String)],
        _timeout: Duration,
    ) -> FetchResult {
        if !self.image_key {
            return Ok(None);
        }
        let title = query
            .iter()
            .find(|(k, _)| *k == "query")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        let params: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        self.calls
            .lock()
            .unwrap()
            .push(format!("image:{path}?{}", params.join("&")));
        Self::answer("tmdb", self.images.get(&title).cloned()).await
    }

    fn catalog_configured(&self) -> bool {
        true
    }

    fn image_configured(&self) -> bool {
        self.image_key
    }
}
