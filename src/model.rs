use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Identity of a catalog movie, read from a primary response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRef {
    pub provider_id: u64,
    pub title: String,
    pub year: Option<i32>,
}

impl MovieRef {
    /// Read `ids.trakt`, `title` and `year` from a catalog movie object.
    pub fn from_movie_json(movie: &Value) -> Option<Self> {
        movie.as_object().and_then(Self::from_fields)
    }

    fn from_fields(movie: &Map<String, Value>) -> Option<Self> {
        let provider_id = movie.get("ids")?.get("trakt")?.as_u64()?;
        let title = movie.get("title")?.as_str()?.to_string();
        let year = movie
            .get("year")
            .and_then(Value::as_i64)
            .and_then(|y| i32::try_from(y).ok());

        Some(Self {
            provider_id,
            title,
            year,
        })
    }
}

/// A primary entry as returned by the catalog, kept verbatim.
///
/// Search hits wrap the movie (`{"type": "movie", "movie": {...}}`), related
/// results are bare movie objects. Either way enhanced fields are merged at
/// the top level of the entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieEntry {
    fields: Map<String, Value>,
    movie: Option<MovieRef>,
}

impl MovieEntry {
    /// Accepts only hits that carry a non-null `movie` object.
    pub fn from_search_hit(hit: Value) -> Option<Self> {
        let Value::Object(fields) = hit else {
            return None;
        };
        let movie = fields.get("movie").filter(|m| m.is_object())?;
        let movie = MovieRef::from_movie_json(movie);
        Some(Self { fields, movie })
    }

    pub fn from_movie(movie: Value) -> Option<Self> {
        let Value::Object(fields) = movie else {
            return None;
        };
        let movie = MovieRef::from_fields(&fields);
        Some(Self { fields, movie })
    }

    /// Wrap a single detail response the way search hits are shaped.
    pub fn from_detail(detail: Value) -> Option<Self> {
        if !detail.is_object() {
            return None;
        }
        let mut fields = Map::new();
        fields.insert("movie".to_string(), detail);
        Self::from_search_hit(Value::Object(fields))
    }

    /// `None` when the primary entry lacks a usable id or title.
    pub fn movie(&self) -> Option<&MovieRef> {
        self.movie.as_ref()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn display_title(&self) -> &str {
        self.movie.as_ref().map_or("<unknown>", |m| m.title.as_str())
    }
}

/// An entry plus whatever secondary data was fetched for it.
///
/// Built from a copy of the primary entry; present fields are merged on
/// serialization, absent ones leave the entry untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "Value")]
pub struct MovieRecord {
    pub entry: MovieEntry,
    pub stats: Option<Value>,
    pub ratings: Option<Value>,
    pub rating: Option<f64>,
    pub poster_url: Option<String>,
}

impl MovieRecord {
    pub fn unenhanced(entry: MovieEntry) -> Self {
        Self {
            entry,
            stats: None,
            ratings: None,
            rating: None,
            poster_url: None,
        }
    }
}

impl From<MovieRecord> for Value {
    fn from(record: MovieRecord) -> Self {
        let mut fields = record.entry.fields;
        if let Some(stats) = record.stats {
            fields.insert("stats".to_string(), stats);
        }
        if let Some(ratings) = record.ratings {
            fields.insert("ratings".to_string(), ratings);
        }
        if let Some(rating) = record.rating {
            fields.insert("rating".to_string(), Value::from(rating));
        }
        if let Some(url) = record.poster_url {
            fields.insert("posterUrl".to_string(), Value::String(url));
        }
        Value::Object(fields)
    }
}

/// Outcome of one secondary lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome<T> {
    Present(T),
    Absent,
    Failed(String),
}

impl<T> FieldOutcome<T> {
    pub fn present(self) -> Option<T> {
        match self {
            FieldOutcome::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            FieldOutcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Option<U>) -> FieldOutcome<U> {
        match self {
            FieldOutcome::Present(value) => f(value).map_or(FieldOutcome::Absent, FieldOutcome::Present),
            FieldOutcome::Absent => FieldOutcome::Absent,
            FieldOutcome::Failed(reason) => FieldOutcome::Failed(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancedField {
    Stats,
    Ratings,
    Poster,
    /// The whole entry, when the per-entry deadline expired.
    Entry,
}

impl fmt::Display for EnhancedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnhancedField::Stats => "stats",
            EnhancedField::Ratings => "ratings",
            EnhancedField::Poster => "poster",
            EnhancedField::Entry => "entry",
        };
        f.write_str(name)
    }
}

/// Per-request result of enhancing one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementResult {
    pub record: MovieRecord,
    pub failures: Vec<(EnhancedField, String)>,
}

impl EnhancementResult {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, field: EnhancedField) -> bool {
        self.failures.iter().any(|(f, _)| *f == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit() -> Value {
        json!({
            "type": "movie",
            "score": 42.0,
            "movie": {"title": "Batman", "year": 1989, "ids": {"trakt": 101, "slug": "batman-1989"}}
        })
    }

    #[test]
    fn search_hit_identity_is_read_from_nested_movie() {
        let entry = MovieEntry::from_search_hit(hit()).unwrap();
        assert_eq!(
            entry.movie(),
            Some(&MovieRef {
                provider_id: 101,
                title: "Batman".to_string(),
                year: Some(1989),
            })
        );
    }

    #[test]
    fn hits_without_movie_are_rejected() {
        assert!(MovieEntry::from_search_hit(json!({"type": "show", "show": {}})).is_none());
        assert!(MovieEntry::from_search_hit(json!({"type": "movie", "movie": null})).is_none());
        assert!(MovieEntry::from_search_hit(json!([1, 2])).is_none());
    }

    #[test]
    fn movie_without_ids_keeps_entry_but_has_no_identity() {
        let entry = MovieEntry::from_movie(json!({"title": "Untracked"})).unwrap();
        assert!(entry.movie().is_none());
        assert_eq!(entry.display_title(), "<unknown>");
    }

    #[test]
    fn detail_is_wrapped_like_a_hit() {
        let entry =
            MovieEntry::from_detail(json!({"title": "Heat", "year": 1995, "ids": {"trakt": 7}}))
                .unwrap();
        assert_eq!(entry.movie().unwrap().provider_id, 7);
        assert_eq!(entry.into_value()["movie"]["title"], "Heat");
    }

    #[test]
    fn record_merges_only_present_fields() {
        let entry = MovieEntry::from_search_hit(hit()).unwrap();
        let mut record = MovieRecord::unenhanced(entry);
        record.ratings = Some(json!({"rating": 7.5}));
        record.poster_url = Some("http://img/p.jpg".to_string());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["ratings"]["rating"], 7.5);
        assert_eq!(value["posterUrl"], "http://img/p.jpg");
        assert!(value.get("stats").is_none());
        assert!(value.get("rating").is_none());
        assert_eq!(value["movie"]["ids"]["trakt"], 101);
        assert_eq!(value["score"], 42.0);
    }

    #[test]
    fn absent_enhancement_keeps_existing_fields() {
        let entry =
            MovieEntry::from_movie(json!({"title": "X", "ids": {"trakt": 1}, "stats": {"plays": 3}}))
                .unwrap();
        let value = serde_json::to_value(MovieRecord::unenhanced(entry)).unwrap();
        assert_eq!(value["stats"]["plays"], 3);
    }

    #[test]
    fn field_outcome_and_then_maps_missing_to_absent() {
        let outcome = FieldOutcome::Present(json!({"votes": 3}));
        let rating = outcome.and_then(|v| v.get("rating").and_then(Value::as_f64));
        assert_eq!(rating, FieldOutcome::Absent);

        let failed: FieldOutcome<Value> = FieldOutcome::Failed("boom".to_string());
        assert_eq!(failed.failure(), Some("boom"));
    }
}
