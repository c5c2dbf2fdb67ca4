//! Analytics API endpoints
//!
//! Just the basics: a per-link click count. Aggregation lives elsewhere.

use axum::Extension;
use serde::Serialize;
use uuid::Uuid;

use crate::clicks::Clicks;
use crate::links::Links;
use crate::store::Store;

use super::CurrentAdmin;
use super::Error;
use super::PathParameters;
use super::Success;

/// Basic per-link analytics
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicAnalyticsResponse {
    /// Link the count belongs to
    pub link_id: Uuid,

    /// All clicks ever recorded for the link
    pub total_clicks: u64,
}

/// Count the clicks of a link
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/analytics/<uuid>/basic
/// ```
///
/// Response
/// ```json
/// { "data": { "linkId": "<uuid>", "totalClicks": 42 } }
/// ```
pub async fn basic<S: Store>(
    Extension(links): Extension<Links<S>>,
    Extension(clicks): Extension<Clicks<S>>,
    _current_admin: CurrentAdmin,
    PathParameters(link_id): PathParameters<Uuid>,
) -> Result<Success<BasicAnalyticsResponse>, Error> {
    // unknown links are a 404, not a zero count
    let link = links.get(&link_id).await?;

    let total_clicks = clicks.count_for_link(&link.id).await?;

    Ok(Success::ok(BasicAnalyticsResponse {
        link_id: link.id,
        total_clicks,
    }))
}
