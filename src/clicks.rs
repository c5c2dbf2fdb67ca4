//! Clicks
//!
//! Append-only click log, one record per resolved redirect. Recording is
//! best-effort and fully decoupled from the redirect response.

use std::net::IpAddr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use uuid::Uuid;

use crate::store;
use crate::store::Store;

/// One resolved redirect, immutable once written
///
/// Persisted as JSON under `click:<linkId>:<clickId>` so the clicks of a
/// link are one prefix scan.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Click {
    /// Click ID
    pub id: Uuid,

    /// Link that resolved; does not keep the link alive
    pub link_id: Uuid,

    /// Instant of resolution
    pub ts: DateTime<Utc>,

    /// One-way digest of the client IP; the raw address is never persisted
    pub ip_hash: Option<String>,

    /// Client user agent, attacker-controlled
    pub user_agent: Option<String>,

    /// Referrer, attacker-controlled
    pub referrer: Option<String>,

    /// Country as reported by the edge, attacker-controlled
    pub country: Option<String>,
}

/// Request-side metadata of a single visit
#[derive(Clone, Debug, Default)]
pub struct Visit {
    /// Raw client IP; hashed before it reaches the store
    pub ip_address: Option<IpAddr>,

    /// Client user agent
    pub user_agent: Option<String>,

    /// Referrer header
    pub referrer: Option<String>,

    /// Country header
    pub country: Option<String>,
}

/// The click recorder
#[derive(Clone)]
pub struct Clicks<S: Store> {
    /// Backing store for the click log
    store: S,
}

impl<S: Store> Clicks<S> {
    /// Create a recorder on top of a store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a click without holding up the caller
    ///
    /// The write may complete after the redirect response has been sent;
    /// failures are logged and swallowed.
    pub fn record_detached(&self, link_id: Uuid, visit: Visit) {
        let recorder = self.clone();

        tokio::spawn(async move {
            if let Err(err) = recorder.record(link_id, visit).await {
                tracing::warn!("Could not record click for link {link_id}: {err}");
            }
        });
    }

    /// Record a click
    pub async fn record(&self, link_id: Uuid, visit: Visit) -> store::Result<Click> {
        let click = Click {
            id: Uuid::new_v4(),
            link_id,
            ts: Utc::now(),
            ip_hash: visit.ip_address.map(|ip_address| hash_ip(&ip_address)),
            user_agent: visit.user_agent,
            referrer: visit.referrer,
            country: visit.country,
        };

        let encoded = serde_json::to_string(&click)?;

        self.store
            .put(&click_key(&click.link_id, &click.id), &encoded)
            .await?;

        Ok(click)
    }

    /// Count all clicks of a link
    pub async fn count_for_link(&self, link_id: &Uuid) -> store::Result<u64> {
        let keys = self.store.list_by_prefix(&click_prefix(link_id)).await?;

        Ok(keys.len() as u64)
    }
}

fn click_key(link_id: &Uuid, click_id: &Uuid) -> String {
    format!("click:{link_id}:{click_id}")
}

fn click_prefix(link_id: &Uuid) -> String {
    format!("click:{link_id}:")
}

/// One-way digest of a client IP, as lowercase hex
pub fn hash_ip(ip_address: &IpAddr) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip_address.to_string().as_bytes());

    format!("{:x}", hasher.finalize())
}
