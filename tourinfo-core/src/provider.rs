use serde::Deserialize;

use crate::{
    error::{Error, Result},
    transport::{HttpRequest, HttpResponse, Transport},
};

pub mod nominatim;
pub mod openmeteo;

pub use nominatim::LocationResolver;
pub use openmeteo::{ForecastFetcher, HOURLY_VARIABLES, HourlyFrame};

/// Error body some providers send alongside a non-success status.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    reason: String,
}

/// Send `request` and insist on a 2xx status.
///
/// Transport failures and non-success statuses both become [`Error::Provider`];
/// `what` names the request in the message.
pub(crate) async fn fetch_body(
    transport: &dyn Transport,
    request: &HttpRequest,
    what: &str,
) -> Result<String> {
    let res = transport
        .get(request)
        .await
        .map_err(|e| Error::provider(None, format!("Failed to send {what} request: {e}")))?;

    ensure_success(res, what)
}

fn ensure_success(res: HttpResponse, what: &str) -> Result<String> {
    if res.is_success() {
        return Ok(res.body);
    }

    let detail = serde_json::from_str::<ProviderErrorBody>(&res.body)
        .map(|b| b.reason)
        .unwrap_or_else(|_| truncate_body(&res.body));

    Err(Error::provider(
        Some(res.status),
        format!("{what} request rejected: {detail}"),
    ))
}

pub(crate) fn parse_body<'a, T: Deserialize<'a>>(body: &'a str, what: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| Error::provider(None, format!("Failed to parse {what} JSON: {e}")))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
