use crate::config::{AppConfig, FlowConfig};
use crate::enhance::{BatchExecutor, BoundedExecutor, EnhanceMode, Enhancer};
use crate::model::{MovieEntry, MovieRecord};
use crate::upstream::{Upstream, UpstreamError};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Provider credentials as reported by the health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderStatus {
    pub catalog_configured: bool,
    pub image_configured: bool,
}

/// Request-scoped movie operations: a primary catalog fetch, optionally
/// followed by enhancement.
pub struct MovieService<E = BoundedExecutor> {
    upstream: Arc<dyn Upstream>,
    enhancer: Enhancer<E>,
    search: FlowConfig,
    related: FlowConfig,
    request_timeout: Duration,
    detail_timeout: Duration,
}

impl<E: BatchExecutor> MovieService<E> {
    pub fn new(upstream: Arc<dyn Upstream>, enhancer: Enhancer<E>, config: &AppConfig) -> Self {
        Self {
            upstream,
            enhancer,
            search: config.search.clone(),
            related: config.related.clone(),
            request_timeout: config.trakt.timeout(),
            detail_timeout: config.trakt.detail_timeout(),
        }
    }

    pub fn provider_status(&self) -> ProviderStatus {
        ProviderStatus {
            catalog_configured: self.upstream.catalog_configured(),
            image_configured: self.upstream.image_configured(),
        }
    }

    /// Movie search hits, enhanced with stats, ratings and posters.
    pub async fn search_movies(&self, query: &str) -> Result<Vec<MovieRecord>, ServiceError> {
        let started = Instant::now();
        let hits = self.search_hits(query, self.search.full_limit).await?;

        let records: Vec<MovieRecord> = self
            .enhancer
            .enhance_batch(hits, EnhanceMode::Full)
            .await
            .into_iter()
            .map(|result| result.record)
            .collect();

        info!(
            query,
            results = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search completed"
        );
        Ok(records)
    }

    /// Movie search hits exactly as the catalog returned them.
    pub async fn search_movies_fast(&self, query: &str) -> Result<Vec<Value>, ServiceError> {
        let hits = self.search_hits(query, self.search.fast_limit).await?;
        Ok(hits.into_iter().map(MovieEntry::into_value).collect())
    }

    pub async fn movie_details(&self, id: u64) -> Result<Value, ServiceError> {
        self.fetch_detail(id).await
    }

    /// Single movie with the same enhancement a search hit gets.
    pub async fn enhance_movie(&self, id: u64) -> Result<MovieRecord, ServiceError> {
        let detail = self.fetch_detail(id).await?;
        let entry = MovieEntry::from_detail(detail)
            .ok_or_else(|| ServiceError::NotFound("Movie not found".to_string()))?;

        let result = self.enhancer.enhance_bounded(entry, EnhanceMode::Full).await;
        Ok(result.record)
    }

    /// Related movies, each with a flat `rating` and poster.
    pub async fn related_movies(&self, id: u64) -> Result<Vec<MovieRecord>, ServiceError> {
        let started = Instant::now();
        let entries: Vec<MovieEntry> = self
            .related_list(id)
            .await?
            .into_iter()
            .filter_map(MovieEntry::from_movie)
            .take(self.related.full_limit)
            .collect();

        let records: Vec<MovieRecord> = self
            .enhancer
            .enhance_batch(entries, EnhanceMode::Related)
            .await
            .into_iter()
            .map(|result| result.record)
            .collect();

        info!(
            id,
            results = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Related movies completed"
        );
        Ok(records)
    }

    pub async fn related_movies_fast(&self, id: u64) -> Result<Vec<Value>, ServiceError> {
        let mut items = self.related_list(id).await?;
        items.truncate(self.related.fast_limit);
        Ok(items)
    }

    async fn search_hits(&self, query: &str, limit: usize) -> Result<Vec<MovieEntry>, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Query parameter is required".to_string(),
            ));
        }

        let items = self
            .primary_list("/search/movie", &[("query", query.to_string())])
            .await?;

        Ok(items
            .into_iter()
            .filter_map(MovieEntry::from_search_hit)
            .take(limit)
            .collect())
    }

    async fn related_list(&self, id: u64) -> Result<Vec<Value>, ServiceError> {
        self.primary_list(&format!("/movies/{id}/related"), &[]).await
    }

    /// A missing list is an empty list; any other failure surfaces.
    async fn primary_list(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Value>, ServiceError> {
        match self
            .upstream
            .fetch_catalog(path, query, self.request_timeout)
            .await
        {
            Ok(Some(Value::Array(items))) => Ok(items),
            Ok(Some(other)) => {
                warn!(path, kind = json_kind(&other), "Expected a list from catalog");
                Ok(Vec::new())
            }
            Ok(None) => Ok(Vec::new()),
            Err(err) if err.is_not_found() => {
                warn!(path, error = %err, "Catalog list not found");
                Ok(Vec::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn fetch_detail(&self, id: u64) -> Result<Value, ServiceError> {
        match self
            .upstream
            .fetch_catalog(&format!("/movies/{id}"), &[], self.detail_timeout)
            .await
        {
            Ok(Some(detail)) => Ok(detail),
            Ok(None) => Err(ServiceError::NotFound("Movie not found".to_string())),
            Err(err) if err.is_not_found() => {
                warn!(id, error = %err, "Catalog movie not found");
                Err(ServiceError::NotFound("Movie not found".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
