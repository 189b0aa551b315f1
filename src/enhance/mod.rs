//! Concurrent enrichment of catalog entries with stats, ratings and posters.
//!
//! Every secondary lookup is best effort: a failure or timeout leaves the
//! corresponding field out (or, for related movies, defaults `rating` to 0)
//! and is recorded on the [`EnhancementResult`] instead of failing the entry.

pub mod executor;

pub use executor::{BatchExecutor, BoundedExecutor, SequentialExecutor};

use crate::config::{AppConfig, EnhancementConfig, FlowConfig};
use crate::model::{EnhancedField, EnhancementResult, FieldOutcome, MovieEntry, MovieRecord, MovieRef};
use crate::upstream::{FetchResult, Upstream};
use futures::FutureExt;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

const POSTER_SEARCH_PATH: &str = "/search/movie";

/// Which enhancement an entry gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhanceMode {
    /// Stats, full ratings and poster.
    Full,
    /// Flattened `rating` (0 when unavailable) and poster.
    Related,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSettings {
    pub workers: usize,
    pub call_timeout: Duration,
    pub entry_timeout: Duration,
}

impl From<&FlowConfig> for FlowSettings {
    fn from(flow: &FlowConfig) -> Self {
        Self {
            workers: flow.workers,
            call_timeout: flow.call_timeout(),
            entry_timeout: flow.entry_timeout(),
        }
    }
}

pub struct Enhancer<E = BoundedExecutor> {
    upstream: Arc<dyn Upstream>,
    executor: E,
    image_base: String,
    full: FlowSettings,
    related: FlowSettings,
    /// Entries being enhanced across all requests, batch or on demand.
    in_flight: Arc<Semaphore>,
    /// Upper bound on any image lookup, on top of the flow's call timeout.
    image_timeout: Option<Duration>,
}

impl Enhancer<BoundedExecutor> {
    pub fn from_config(upstream: Arc<dyn Upstream>, config: &AppConfig) -> Self {
        Self::new(
            upstream,
            BoundedExecutor,
            config.tmdb.image_base.clone(),
            FlowSettings::from(&config.search),
            FlowSettings::from(&config.related),
        )
        .with_max_in_flight(config.enhancement.max_in_flight)
        .with_image_timeout(config.tmdb.timeout())
    }
}

impl<E: BatchExecutor> Enhancer<E> {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        executor: E,
        image_base: impl Into<String>,
        full: FlowSettings,
        related: FlowSettings,
    ) -> Self {
        Self {
            upstream,
            executor,
            image_base: image_base.into(),
            full,
            related,
            in_flight: Arc::new(Semaphore::new(EnhancementConfig::default().max_in_flight)),
            image_timeout: None,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.in_flight = Arc::new(Semaphore::new(max_in_flight.max(1)));
        self
    }

    pub fn with_image_timeout(mut self, timeout: Duration) -> Self {
        self.image_timeout = Some(timeout);
        self
    }

    fn settings(&self, mode: EnhanceMode) -> FlowSettings {
        match mode {
            EnhanceMode::Full => self.full,
            EnhanceMode::Related => self.related,
        }
    }

    /// Enhance every entry under the mode's worker limit. Output order
    /// matches input order and no entry is ever dropped.
    pub async fn enhance_batch(
        &self,
        entries: Vec<MovieEntry>,
        mode: EnhanceMode,
    ) -> Vec<EnhancementResult> {
        let jobs = entries
            .into_iter()
            .map(|entry| self.enhance_bounded(entry, mode).boxed())
            .collect();

        let results = self.executor.run_all(self.settings(mode).workers, jobs).await;

        let partial = results.iter().filter(|r| !r.is_complete()).count();
        if partial > 0 {
            debug!(?mode, partial, total = results.len(), "Batch enhanced with gaps");
        }
        results
    }

    /// Enhance one entry, degrading it to its unenhanced form if the whole
    /// entry overruns the mode's per-entry deadline. Waiting for a shared
    /// in-flight slot counts against that deadline.
    pub async fn enhance_bounded(&self, entry: MovieEntry, mode: EnhanceMode) -> EnhancementResult {
        let deadline = self.settings(mode).entry_timeout;
        let fallback = entry.clone();

        let work = async {
            // Never closed, so the permit is always granted.
            let _permit = self.in_flight.acquire().await.ok();
            match mode {
                EnhanceMode::Full => self.enhance_one(entry).await,
                EnhanceMode::Related => self.enhance_related(entry).await,
            }
        };

        match tokio::time::timeout(deadline, work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    title = fallback.display_title(),
                    deadline_ms = deadline.as_millis() as u64,
                    "Enhancement overran deadline, returning unenhanced entry"
                );
                degraded(fallback, mode, format!("timed out after {deadline:?}"))
            }
        }
    }

    /// Stats, ratings and poster fetched concurrently; each lookup that fails
    /// or times out simply leaves its field out.
    pub async fn enhance_one(&self, entry: MovieEntry) -> EnhancementResult {
        let Some(movie) = entry.movie().cloned() else {
            warn!("Search entry has no usable movie identity, skipping enhancement");
            return degraded(entry, EnhanceMode::Full, "missing movie identity".to_string());
        };
        let timeout = self.full.call_timeout;

        let (stats, ratings, poster) = tokio::join!(
            self.catalog_field(format!("/movies/{}/stats", movie.provider_id), timeout),
            self.catalog_field(format!("/movies/{}/ratings", movie.provider_id), timeout),
            self.poster(&movie, timeout),
        );

        let failures = failures([
            (EnhancedField::Stats, stats.failure()),
            (EnhancedField::Ratings, ratings.failure()),
            (EnhancedField::Poster, poster.failure()),
        ]);
        log_failures(&movie, &failures);

        EnhancementResult {
            record: MovieRecord {
                entry,
                stats: stats.present(),
                ratings: ratings.present(),
                rating: None,
                poster_url: poster.present(),
            },
            failures,
        }
    }

    /// Rating and poster for a related-movie summary. Unlike
    /// [`enhance_one`](Self::enhance_one), a missing rating becomes `0`.
    pub async fn enhance_related(&self, entry: MovieEntry) -> EnhancementResult {
        let Some(movie) = entry.movie().cloned() else {
            warn!("Related entry has no usable movie identity, skipping enhancement");
            return degraded(entry, EnhanceMode::Related, "missing movie identity".to_string());
        };
        let timeout = self.related.call_timeout;

        let (ratings, poster) = tokio::join!(
            self.catalog_field(format!("/movies/{}/ratings", movie.provider_id), timeout),
            self.poster(&movie, timeout),
        );

        let failures = failures([
            (EnhancedField::Ratings, ratings.failure()),
            (EnhancedField::Poster, poster.failure()),
        ]);
        log_failures(&movie, &failures);

        let rating = ratings
            .and_then(|r| r.get("rating").and_then(Value::as_f64))
            .present()
            .unwrap_or(0.0);

        EnhancementResult {
            record: MovieRecord {
                entry,
                stats: None,
                ratings: None,
                rating: Some(rating),
                poster_url: poster.present(),
            },
            failures,
        }
    }

    async fn catalog_field(&self, path: String, timeout: Duration) -> FieldOutcome<Value> {
        settle(self.upstream.fetch_catalog(&path, &[], timeout), timeout).await
    }

    async fn poster(&self, movie: &MovieRef, timeout: Duration) -> FieldOutcome<String> {
        if !self.upstream.image_configured() {
            return FieldOutcome::Absent;
        }

        let mut query = vec![("query", movie.title.clone())];
        if let Some(year) = movie.year {
            query.push(("year", year.to_string()));
        }
        let timeout = self.image_timeout.map_or(timeout, |cap| cap.min(timeout));

        settle(
            self.upstream.fetch_image_meta(POSTER_SEARCH_PATH, &query, timeout),
            timeout,
        )
        .await
        .and_then(|body| poster_url(&self.image_base, &body))
    }
}

/// Bound a lookup by `timeout` from dispatch and fold it into a field outcome.
async fn settle(lookup: impl Future<Output = FetchResult>, timeout: Duration) -> FieldOutcome<Value> {
    match tokio::time::timeout(timeout, lookup).await {
        Err(_) => FieldOutcome::Failed(format!("timed out after {timeout:?}")),
        Ok(Err(err)) => FieldOutcome::Failed(err.to_string()),
        Ok(Ok(Some(body))) if !is_empty_json(&body) => FieldOutcome::Present(body),
        Ok(Ok(_)) => FieldOutcome::Absent,
    }
}

/// First search result's poster, if it has a non-empty path.
fn poster_url(image_base: &str, search: &Value) -> Option<String> {
    let path = search
        .get("results")?
        .get(0)?
        .get("poster_path")?
        .as_str()
        .filter(|p| !p.is_empty())?;
    Some(format!("{image_base}{path}"))
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn failures<const N: usize>(
    outcomes: [(EnhancedField, Option<&str>); N],
) -> Vec<(EnhancedField, String)> {
    outcomes
        .into_iter()
        .filter_map(|(field, reason)| reason.map(|r| (field, r.to_string())))
        .collect()
}

fn log_failures(movie: &MovieRef, failures: &[(EnhancedField, String)]) {
    for (field, reason) in failures {
        warn!(
            title = %movie.title,
            provider_id = movie.provider_id,
            field = %field,
            reason = %reason,
            "Enhancement lookup failed"
        );
    }
    if failures.is_empty() {
        debug!(title = %movie.title, "Enhanced movie");
    }
}

fn degraded(entry: MovieEntry, mode: EnhanceMode, reason: String) -> EnhancementResult {
    let mut record = MovieRecord::unenhanced(entry);
    if mode == EnhanceMode::Related {
        record.rating = Some(0.0);
    }
    EnhancementResult {
        record,
        failures: vec![(EnhancedField::Entry, reason)],
    }
}
