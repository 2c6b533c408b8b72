use atimelogger::ATimeLoggerClient;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

pub struct AtlMock {
    pub server: MockServer,
}

impl AtlMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Mounts a JSON response for a GET of the given path under `/api/v2/`.
    /// The path includes the guid segment, so a bare model is e.g. `types/`.
    #[allow(dead_code)]
    pub async fn mount_json(&self, api_path: &str, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v2/{api_path}")))
            .respond_with(ResponseTemplate::new(status).set_body_json(&body))
            .mount(&self.server)
            .await;
    }

    /// Mounts a raw-bodied response, e.g. an HTML error page.
    #[allow(dead_code)]
    pub async fn mount_raw(&self, api_path: &str, status: u16, body: &str, content_type: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v2/{api_path}")))
            .respond_with(ResponseTemplate::new(status).set_body_raw(body.as_bytes().to_vec(), content_type))
            .mount(&self.server)
            .await;
    }

    pub fn client(&self) -> ATimeLoggerClient {
        ATimeLoggerClient::new("testuser", "hunter2")
            .with_base_url(format!("{}/api/v2", self.server.uri()))
    }
}

/// Matches only requests whose query string does not mention `key` at all.
#[allow(dead_code)]
pub fn query_param_absent(key: impl Into<String>) -> QueryParamAbsentMatcher {
    QueryParamAbsentMatcher { key: key.into() }
}

#[allow(dead_code)]
pub struct QueryParamAbsentMatcher {
    key: String,
}

impl Match for QueryParamAbsentMatcher {
    fn matches(&self, request: &Request) -> bool {
        request
            .url
            .query_pairs()
            .all(|(key, _)| key != self.key.as_str())
    }
}
