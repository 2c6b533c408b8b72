//! Async client for the [aTimeLogger](https://app.atimelogger.com) REST API.
//!
//! Authenticates with HTTP Basic Auth and exposes the read endpoints for
//! activity types, activities, and logged intervals. Interval records are
//! post-processed during decoding: epoch timestamps become offset-aware
//! datetimes, empty comments become `None`, and the nested type reference
//! is flattened to a guid.

pub mod decode;
mod error;
pub mod types;

use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::classify_api_error;
use crate::types::{
    ActivitiesResponse, DateRange, IntervalsResponse, Model, Order, QueryParams, Record,
    TypesResponse, REQUEST_MAX,
};

pub use error::Error;

/// Production API endpoint.
pub const ENDPOINT: &str = "https://app.atimelogger.com/api/v2";

/// Client for one aTimeLogger account.
///
/// Owns a [`reqwest::Client`] whose connection pool lives exactly as long
/// as this value; dropping the client releases the pool on every exit
/// path. Credentials are attached to each request as HTTP Basic Auth.
pub struct ATimeLoggerClient {
    client: Client,
    username: String,
    password: String,
    base_url: String,
}

impl ATimeLoggerClient {
    /// Creates a new `ATimeLoggerClient` with the given account credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            username: username.into(),
            password: password.into(),
            base_url: ENDPOINT.to_string(),
        }
    }

    /// Overrides the API endpoint, e.g. to point at a test server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Issues a raw request against `{base}/{model}/{guid}` and returns the
    /// response for the caller to validate and decode. Together with
    /// [`check_response`](Self::check_response) and
    /// [`decode::decode_response`] this reaches the models without a
    /// dedicated operation (`goals`, `statistics`) and supports arbitrary
    /// parameter overrides via [`QueryParams::with_override`].
    ///
    /// # Errors
    /// Returns an error if the request cannot be sent.
    pub async fn request(
        &self,
        method: Method,
        model: Model,
        guid: &str,
        params: &BTreeMap<String, String>,
        json: Option<&Value>,
    ) -> Result<Response, Error> {
        let url = format!("{}/{}/{}", self.base_url, model, guid);
        let mut request = self
            .client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .query(params);
        if let Some(body) = json {
            request = request.json(body);
        }
        request.send().await.map_err(Error::from)
    }

    /// Reads the response body, classifying 4xx/5xx statuses into
    /// [`Error::Api`].
    ///
    /// # Errors
    /// Returns [`Error::Api`] for an error status, or an error if the body
    /// cannot be read.
    pub async fn check_response(
        &self,
        method: Method,
        response: Response,
    ) -> Result<String, Error> {
        let status = response.status();
        let url = response.url().clone();
        let text = response.text().await?;
        if status.is_client_error() || status.is_server_error() {
            return Err(classify_api_error(status, &method, url.as_str(), &text));
        }
        Ok(text)
    }

    async fn fetch(
        &self,
        model: Model,
        guid: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Record, Error> {
        let response = self.request(Method::GET, model, guid, params, None).await?;
        let body = self.check_response(Method::GET, response).await?;
        decode::decode_response(&body)
    }

    /// Retrieves the account's activity types, or a single type by guid.
    ///
    /// # Errors
    /// Returns an error if the HTTP request fails, the server answers with
    /// an error status, or the response cannot be parsed.
    pub async fn get_types(
        &self,
        guid: Option<&str>,
        order: Order,
    ) -> Result<TypesResponse, Error> {
        let mut params = QueryParams::new().with_order(order).assemble()?;
        // the types endpoint does not paginate
        params.remove("limit");
        params.remove("offset");
        let map = self.fetch(Model::Types, guid.unwrap_or(""), &params).await?;
        serde_json::from_value(Value::Object(map)).map_err(Error::from)
    }

    /// Retrieves activities, with pagination and an optional state filter.
    /// `offset` defaults to 0 and `limit` to [`REQUEST_MAX`] (unbounded).
    ///
    /// # Errors
    /// Returns an error if the HTTP request fails, the server answers with
    /// an error status, or the response cannot be parsed.
    pub async fn get_activities(
        &self,
        offset: Option<u64>,
        limit: Option<u64>,
        state: Option<&str>,
        order: Order,
    ) -> Result<ActivitiesResponse, Error> {
        let mut query = QueryParams::new()
            .with_offset(offset.unwrap_or(0))
            .with_limit(limit.unwrap_or(REQUEST_MAX))
            .with_order(order);
        if let Some(state) = state {
            query = query.with_state(state);
        }
        let params = query.assemble()?;
        let map = self.fetch(Model::Activities, "", &params).await?;
        serde_json::from_value(Value::Object(map)).map_err(Error::from)
    }

    /// Retrieves logged intervals, with pagination and optional date-range
    /// and type filters. `offset` defaults to 0 and `limit` to
    /// [`REQUEST_MAX`] (unbounded).
    ///
    /// Interval records are post-processed: `from`/`to` become datetimes
    /// in the offset derived from `range` (see [`crate::decode`]), empty
    /// comments become `None`, and the nested `type` object is flattened
    /// into [`types::Interval::type_guid`].
    ///
    /// # Errors
    /// Returns an error if a range bound cannot be converted to epoch
    /// seconds, the HTTP request fails, the server answers with an error
    /// status, or the response cannot be parsed.
    pub async fn get_intervals(
        &self,
        offset: Option<u64>,
        limit: Option<u64>,
        range: DateRange,
        types: Option<&[&str]>,
        order: Order,
    ) -> Result<IntervalsResponse, Error> {
        let tz = decode::derive_offset(&range);
        let mut query = QueryParams::new()
            .with_offset(offset.unwrap_or(0))
            .with_limit(limit.unwrap_or(REQUEST_MAX))
            .with_order(order)
            .with_range(range);
        if let Some(types) = types {
            query = query.with_types(types.iter().copied());
        }
        let params = query.assemble()?;
        let map = self.fetch(Model::Intervals, "", &params).await?;

        let mut value = Value::Object(map);
        decode::map_objects(&mut value, &mut decode::interval_hook(tz));
        serde_json::from_value(value).map_err(Error::from)
    }
}
