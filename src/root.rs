//! The root!
//!
//! All wildcard requests end up here: the public redirect hot path. One
//! slug lookup, a lifecycle decision, and a detached click write.

use std::str::Utf8Error;

use axum::http::header::LOCATION;
use axum::http::header::REFERER;
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Extension;
use percent_encoding::percent_decode_str;

use crate::clicks::Clicks;
use crate::clicks::Visit;
use crate::client_ip::ClientIp;
use crate::links::Links;
use crate::resolve::resolve;
use crate::resolve::Resolution;
use crate::store::Store;

/// The root!
///
/// A lookup in the registry will be done looking for the right slug, based
/// on the path. Recording the click is triggered before the response goes
/// out but never holds it up.
pub async fn root<S: Store>(
    ip_address: Option<ClientIp>,
    Extension(links): Extension<Links<S>>,
    Extension(clicks): Extension<Clicks<S>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let slug = uri.path().trim_matches('/');

    let Ok(slug) = url_decode_slug(slug) else {
        return (
            StatusCode::BAD_REQUEST,
            "URL contains invalid UTF-8 characters",
        )
            .into_response();
    };

    if slug.is_empty() || slug.contains('/') {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    tracing::debug!("Looking for slug: /{slug}");

    let resolution = match resolve(&links, &slug).await {
        Ok(resolution) => resolution,
        Err(err) => {
            tracing::error!("Could not resolve /{slug}: {err}");

            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
        }
    };

    match resolution {
        Resolution::NotFound => {
            tracing::debug!(r#"Slug "{slug}" not found"#);

            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
        Resolution::Expired => {
            tracing::debug!(r#"Slug "{slug}" has expired"#);

            (StatusCode::GONE, "Expired").into_response()
        }
        Resolution::Redirect {
            link_id,
            destination_url,
        } => {
            tracing::debug!(r#"Slug "{slug}" redirecting to: {destination_url}"#);

            clicks.record_detached(link_id, visit_from_request(ip_address, &headers));

            let Ok(location) = HeaderValue::from_str(&destination_url) else {
                // destinations are validated at write time; this is a
                // store-level anomaly
                tracing::error!(r#"Stored destination for "{slug}" is not a valid header value"#);

                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    .into_response();
            };

            let mut redirect_headers = HeaderMap::new();
            redirect_headers.insert(LOCATION, location);

            (StatusCode::FOUND, redirect_headers).into_response()
        }
    }
}

/// Collect the visit metadata a click record is made of
fn visit_from_request(ip_address: Option<ClientIp>, headers: &HeaderMap) -> Visit {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string)
    };

    Visit {
        ip_address: ip_address.map(|client_ip| client_ip.0),
        user_agent: header_value(USER_AGENT.as_str()),
        // some clients still send the misspelling-corrected variant
        referrer: header_value(REFERER.as_str()).or_else(|| header_value("referrer")),
        country: header_value("cf-ipcountry"),
    }
}

/// URL decode slug
///
/// Uses percentage encoding for the decoding, might error in case of
/// invalid UTF-8
fn url_decode_slug(slug: &str) -> Result<String, Utf8Error> {
    let decoded = percent_decode_str(slug);

    decoded.decode_utf8().map(|decoded| decoded.to_string())
}
