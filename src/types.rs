use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use time::format_description::well_known::Iso8601;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::Error;

/// One JSON object representing a single resource instance
/// (an interval, a type, or an activity).
pub type Record = serde_json::Map<String, Value>;

/// Default `limit` meaning "unbounded": the API treats this sentinel as
/// no limit at all.
pub const REQUEST_MAX: u64 = 0x7FFF_FFFF;

// =============================================================================
// RESOURCE MODELS
// =============================================================================

/// The fixed set of resource categories exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Intervals,
    Types,
    Activities,
    Goals,
    Statistics,
}

impl Model {
    pub const ALL: [Model; 5] = [
        Self::Intervals,
        Self::Types,
        Self::Activities,
        Self::Goals,
        Self::Statistics,
    ];

    /// Returns the URL path segment for this model.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intervals => "intervals",
            Self::Types => "types",
            Self::Activities => "activities",
            Self::Goals => "goals",
            Self::Statistics => "statistics",
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

/// Sort order for list operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    /// Returns the query-string value for this order.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamp in any of the forms the API accepts as a filter bound:
/// an ISO-8601 string, a datetime, or raw epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    /// An ISO-8601 string, with or without a UTC offset. Strings without
    /// an offset are interpreted as UTC.
    Iso(String),
    DateTime(OffsetDateTime),
    Epoch(i64),
}

impl Timestamp {
    /// Converts this timestamp to integer epoch seconds.
    ///
    /// # Errors
    /// Returns [`Error::Timestamp`] if an ISO-8601 string cannot be parsed.
    pub fn epoch_seconds(&self) -> Result<i64, Error> {
        match self {
            Self::Iso(s) => Ok(parse_iso(s)?.unix_timestamp()),
            Self::DateTime(dt) => Ok(dt.unix_timestamp()),
            Self::Epoch(secs) => Ok(*secs),
        }
    }

    /// The UTC offset this timestamp carries, if it carries one.
    /// Epoch seconds are absolute and carry none; ISO strings carry one
    /// only when written with an explicit offset.
    #[must_use]
    pub fn known_offset(&self) -> Option<UtcOffset> {
        match self {
            Self::Iso(s) => OffsetDateTime::parse(s, &Iso8601::DEFAULT)
                .ok()
                .map(|dt| dt.offset()),
            Self::DateTime(dt) => Some(dt.offset()),
            Self::Epoch(_) => None,
        }
    }
}

fn parse_iso(s: &str) -> Result<OffsetDateTime, Error> {
    if let Ok(dt) = OffsetDateTime::parse(s, &Iso8601::DEFAULT) {
        return Ok(dt);
    }
    PrimitiveDateTime::parse(s, &Iso8601::DEFAULT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| Error::Timestamp(format!("cannot parse {s:?} as ISO-8601: {e}")))
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Self::Iso(value.to_string())
    }
}

impl From<String> for Timestamp {
    fn from(value: String) -> Self {
        Self::Iso(value)
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(value: OffsetDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self::Epoch(value)
    }
}

/// Lower and upper bounds of a datetime-range filter. Either bound may be
/// absent, meaning no limit on that side.
pub type DateRange = (Option<Timestamp>, Option<Timestamp>);

/// Query parameters for list operations.
///
/// `assemble` produces the flat map sent as the HTTP query string:
/// `limit`, `offset` and `order` are always present, the optional filters
/// only when set, and overrides are merged last, winning over computed
/// entries.
#[must_use]
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub offset: u64,
    pub limit: u64,
    pub order: Order,
    pub range: DateRange,
    pub types: Option<Vec<String>>,
    pub state: Option<String>,
    pub overrides: Vec<(String, String)>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: REQUEST_MAX,
            order: Order::Asc,
            range: (None, None),
            types: None,
            state: None,
            overrides: Vec::new(),
        }
    }
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub const fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub const fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Adds a caller-supplied parameter, overriding any computed value
    /// under the same name.
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Builds the flat query-parameter map for an API request.
    ///
    /// # Errors
    /// Returns [`Error::Timestamp`] if a range bound cannot be converted
    /// to epoch seconds.
    pub fn assemble(&self) -> Result<BTreeMap<String, String>, Error> {
        let mut params = BTreeMap::new();
        params.insert("limit".to_string(), self.limit.to_string());
        params.insert("offset".to_string(), self.offset.to_string());
        params.insert("order".to_string(), self.order.to_string());

        let (lower, upper) = &self.range;
        if let Some(lower) = lower {
            params.insert("from".to_string(), lower.epoch_seconds()?.to_string());
        }
        if let Some(upper) = upper {
            params.insert("to".to_string(), upper.epoch_seconds()?.to_string());
        }
        if let Some(types) = &self.types {
            if !types.is_empty() {
                params.insert("types".to_string(), types.join(","));
            }
        }
        if let Some(state) = &self.state {
            if !state.is_empty() {
                params.insert("state".to_string(), state.clone());
            }
        }

        for (key, value) in &self.overrides {
            params.insert(key.clone(), value.clone());
        }
        Ok(params)
    }
}

// =============================================================================
// RESPONSE ENVELOPES
// =============================================================================

/// Response envelope of the `types` endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct TypesResponse {
    /// Records describing the account's activity types.
    pub types: Vec<Record>,
    /// Server-side success flag.
    #[serde(default)]
    pub success: bool,
    /// Catch-all for any additional fields from the API.
    #[serde(flatten)]
    pub extra: Record,
}

/// Response envelope of the `activities` endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct ActivitiesResponse {
    /// Records describing the account's activities.
    pub activities: Vec<Record>,
    /// Records describing the activity types referenced above.
    #[serde(default)]
    pub types: Vec<Record>,
    /// Account metadata, passed through unmodified.
    #[serde(default)]
    pub account: Option<Value>,
    /// Server-side revision number.
    #[serde(default)]
    pub revision: Option<i64>,
    /// Catch-all for any additional fields from the API.
    #[serde(flatten)]
    pub extra: Record,
}

/// Response envelope of the `intervals` endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct IntervalsResponse {
    /// The intervals matching the query, post-processed per [`Interval`].
    pub intervals: Vec<Interval>,
    /// Pagination/window metadata, passed through unmodified.
    #[serde(default)]
    pub meta: Option<Value>,
    /// Catch-all for any additional fields from the API.
    #[serde(flatten)]
    pub extra: Record,
}

/// One logged time interval.
///
/// The raw API record carries `from`/`to` as epoch seconds, an empty
/// string for a missing comment, and the type as a nested object; decoding
/// normalizes all three (see [`crate::decode`]).
#[derive(Debug, Deserialize, Serialize)]
pub struct Interval {
    #[serde(default)]
    pub guid: Option<String>,
    /// Start of the interval, in the offset derived from the query's
    /// date-range filter.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub from: Option<OffsetDateTime>,
    /// End of the interval; absent while the activity is still running.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub to: Option<OffsetDateTime>,
    /// Comment attached to the interval; empty comments decode as `None`.
    #[serde(default)]
    pub comment: Option<String>,
    /// Guid of the interval's activity type, flattened from the nested
    /// `type` object.
    #[serde(default, rename = "typeGuid")]
    pub type_guid: Option<String>,
    /// Catch-all for any additional fields from the API.
    #[serde(flatten)]
    pub extra: Record,
}
