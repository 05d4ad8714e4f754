//! Flash messages.
//!
//! Messages survive one redirect in the `messages` cookie, as a
//! percent-encoded JSON list. Rendering a page consumes them.

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use djinn_http::cookies::{Cookie, SameSite};
use djinn_http::{HttpRequest, HttpResponse};

/// Name of the cookie holding queued messages.
pub const COOKIE_NAME: &str = "messages";

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

/// One flash message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub level: Level,
    pub message: String,
}

fn decode(raw: &str) -> Vec<Message> {
    let json = percent_decode_str(raw).decode_utf8_lossy();
    serde_json::from_str(&json).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "discarding unreadable messages cookie");
        Vec::new()
    })
}

/// Returns the messages queued for this request.
pub fn get_messages(request: &HttpRequest) -> Vec<Message> {
    request
        .cookie(COOKIE_NAME)
        .filter(|raw| !raw.is_empty())
        .map(decode)
        .unwrap_or_default()
}

/// Queues a message for the next page the user sees.
///
/// Messages already queued on the request or the response are kept.
pub fn add_message(request: &HttpRequest, response: &mut HttpResponse, level: Level, text: &str) {
    let mut queued = response
        .cookies()
        .iter()
        .find(|c| c.name == COOKIE_NAME)
        .map_or_else(|| get_messages(request), |c| decode(&c.value));
    queued.push(Message {
        level,
        message: text.to_string(),
    });

    match serde_json::to_string(&queued) {
        Ok(json) => {
            let value = utf8_percent_encode(&json, NON_ALPHANUMERIC).to_string();
            response.set_cookie(
                Cookie::new(COOKIE_NAME, value)
                    .httponly(true)
                    .samesite(SameSite::Lax),
            );
        }
        Err(e) => tracing::warn!(error = %e, "could not encode flash messages"),
    }
}

pub fn success(request: &HttpRequest, response: &mut HttpResponse, text: &str) {
    add_message(request, response, Level::Success, text);
}

/// Tells the browser to drop the queued messages.
pub fn clear(response: &mut HttpResponse) {
    response.set_cookie(Cookie::removal(COOKIE_NAME));
}
