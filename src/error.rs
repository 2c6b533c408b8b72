use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::{Method, StatusCode};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),
    /// A timestamp supplied as a query-parameter bound could not be
    /// converted to epoch seconds.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),
    /// The server answered with a 4xx/5xx status. `message` is the
    /// best-effort human-readable classification; `status` and `body`
    /// carry the original response for programmatic inspection.
    #[error("{message}")]
    Api {
        status: StatusCode,
        message: String,
        body: String,
    },
}

// The API fronts errors with a servlet-container HTML page; JSON or plain
// text only shows up for some gateway-level failures.
static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<title>(.*)</title>").unwrap());
static MESSAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<p><b>Message</b> (.*?)</p>").unwrap());
static DESCRIPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<p><b>Description</b> (.*?)</p>").unwrap());

/// Builds the [`Error::Api`] for a 4xx/5xx response.
///
/// Classification tiers: an HTML error page with a `<title>` (Message and
/// Description paragraphs each optional), then a JSON body, then the raw
/// body text. The last tier cannot fail.
pub(crate) fn classify_api_error(
    status: StatusCode,
    method: &Method,
    url: &str,
    body: &str,
) -> Error {
    let request_info = format!("{method} {url}");
    let message = match TITLE_RE.captures(body) {
        Some(title) => {
            let title = &title[1];
            let reason = MESSAGE_RE
                .captures(body)
                .map_or_else(String::new, |c| unescape_html(&c[1]));
            let details = DESCRIPTION_RE
                .captures(body)
                .map_or_else(String::new, |c| unescape_html(&c[1]));
            format!("{title}: {reason} for {request_info}.\n{details}")
        }
        None => {
            let kind = if status.as_u16() < 500 {
                "Client Error"
            } else {
                "Server Error"
            };
            let detail = serde_json::from_str::<Value>(body)
                .map_or_else(|_| body.to_string(), |json| json.to_string());
            format!("{} {kind}: for {request_info}.\n{detail}", status.as_u16())
        }
    };
    Error::Api {
        status,
        message,
        body: body.to_string(),
    }
}

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[xX]?[0-9A-Fa-f]+|[A-Za-z]+);").unwrap());

// Covers the entities servlet error pages actually emit; anything
// unrecognized is left as-is.
fn unescape_html(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            match entity {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                "nbsp" => "\u{a0}".to_string(),
                _ if entity.starts_with('#') => {
                    let digits = &entity[1..];
                    let code = digits
                        .strip_prefix(['x', 'X'])
                        .map_or_else(|| digits.parse(), |hex| u32::from_str_radix(hex, 16));
                    code.ok()
                        .and_then(char::from_u32)
                        .map_or_else(|| caps[0].to_string(), |c| c.to_string())
                }
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_handles_named_and_numeric_entities() {
        assert_eq!(unescape_html("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(unescape_html("it&#39;s &#x41;"), "it's A");
        assert_eq!(unescape_html("&bogus; stays"), "&bogus; stays");
    }

    #[test]
    fn html_error_page_yields_title_message_and_description() {
        let body = "<html><head><title>Not Found</title></head><body>\
                    <p><b>Message</b> no such guid</p>\
                    <p><b>Description</b> The requested resource is not available.</p>\
                    </body></html>";
        let err = classify_api_error(
            StatusCode::NOT_FOUND,
            &Method::GET,
            "https://example.com/api/v2/types/x",
            body,
        );
        let Error::Api { message, .. } = err else {
            panic!("expected Error::Api");
        };
        assert_eq!(
            message,
            "Not Found: no such guid for GET https://example.com/api/v2/types/x.\n\
             The requested resource is not available."
        );
    }

    #[test]
    fn missing_paragraphs_substitute_empty_strings() {
        let body = "<title>Bad Request</title>";
        let err = classify_api_error(StatusCode::BAD_REQUEST, &Method::GET, "u", body);
        let Error::Api { message, .. } = err else {
            panic!("expected Error::Api");
        };
        assert_eq!(message, "Bad Request:  for GET u.\n");
    }

    #[test]
    fn json_body_is_reserialized_into_the_message() {
        let err = classify_api_error(
            StatusCode::BAD_REQUEST,
            &Method::GET,
            "u",
            "{\"error\": \"nope\"}",
        );
        let Error::Api { message, .. } = err else {
            panic!("expected Error::Api");
        };
        assert_eq!(message, "400 Client Error: for GET u.\n{\"error\":\"nope\"}");
    }

    #[test]
    fn unparseable_body_falls_back_to_raw_text() {
        let err = classify_api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &Method::GET,
            "u",
            "gateway exploded",
        );
        let Error::Api { status, message, body } = err else {
            panic!("expected Error::Api");
        };
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "gateway exploded");
        assert_eq!(message, "500 Server Error: for GET u.\ngateway exploded");
    }
}
