//! Resolution
//!
//! Maps a raw public slug to a redirect decision. Read-only: the one write
//! a resolved redirect causes (the click) is someone else's job.

use chrono::DateTime;
use chrono::Utc;

use crate::links;
use crate::links::Link;
use crate::links::Links;
use crate::store::Store;

/// Terminal outcome of resolving a slug
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// No resolvable link; absent, anomalous and inactive all look the same
    NotFound,

    /// The link existed but lapsed
    Expired,

    /// Redirect to the destination
    Redirect {
        /// Link that resolved, for the click record
        link_id: uuid::Uuid,

        /// Where to send the visitor
        destination_url: String,
    },
}

/// Resolve a raw slug against the registry
pub async fn resolve<S: Store>(links: &Links<S>, raw_slug: &str) -> links::Result<Resolution> {
    let slug = raw_slug.to_lowercase();

    let Some(link) = links.find_by_slug(&slug).await? else {
        return Ok(Resolution::NotFound);
    };

    Ok(decide(&link, Utc::now()))
}

/// Lifecycle decision for a link that exists in the registry
pub fn decide(link: &Link, now: DateTime<Utc>) -> Resolution {
    if !link.is_active {
        // inactive must be indistinguishable from absent
        return Resolution::NotFound;
    }

    if let Some(expires_at) = link.expires_at {
        if expires_at < now {
            return Resolution::Expired;
        }
    }

    Resolution::Redirect {
        link_id: link.id,
        destination_url: link.destination_url.clone(),
    }
}
