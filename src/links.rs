//! Links
//!
//! The registry owning the slug ↔ link mapping and its lifecycle. All
//! writes to the `link:` and `slug:` key families go through here; the
//! slug index entry is the single source of truth for uniqueness.

use chrono::DateTime;
use chrono::Utc;
use moka::future::Cache;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::store;
use crate::store::Store;

/// Longest slug the registry accepts
pub const SLUG_MAX_LENGTH: usize = 64;

/// Slugs that collide with the reserved route space
const RESERVED_SLUGS: [&str; 2] = ["api", "healthz"];

/// How many resolved links the hot path keeps around
const RESOLVE_CACHE_CAPACITY: u64 = 10_000;

/// A link binding a slug to a destination URL
///
/// Persisted as JSON under `link:<id>`; the owning slug index entry under
/// `slug:<slug>` holds the id.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Link ID, immutable for the lifetime of the link
    pub id: Uuid,

    /// Normalized slug, unique across the whole registry
    pub slug: String,

    /// Absolute http(s) URL the public path redirects to
    pub destination_url: String,

    /// Principal that created the link
    pub owner_id: String,

    /// Inactive links resolve as not-found
    pub is_active: bool,

    /// Past this instant resolution reports expired instead of not-found
    pub expires_at: Option<DateTime<Utc>>,

    /// Declared click cap; not enforced during resolution
    pub click_limit: Option<u32>,

    /// Free-text labels
    pub tags: Option<Vec<String>>,

    /// Creation date
    pub created_at: DateTime<Utc>,

    /// Last updated at
    pub updated_at: DateTime<Utc>,
}

/// Registry errors
#[derive(Debug, Error)]
pub enum Error {
    /// The slug failed the charset or length check
    #[error("Slug must be 1-64 characters of a-z, 0-9, \"-\" or \"_\"")]
    InvalidSlug,

    /// The slug is part of the reserved route space
    #[error("Slug is reserved")]
    ReservedSlug,

    /// The destination is not an absolute http(s) URL
    #[error("Destination URL must be an absolute http(s) URL")]
    InvalidUrl,

    /// The click limit must be positive when set
    #[error("Click limit must be a positive number")]
    InvalidClickLimit,

    /// Another link already owns the slug
    #[error("Slug already exists")]
    SlugTaken,

    /// No link with the given ID
    #[error("Link not found")]
    NotFound,

    /// The store misbehaved
    #[error(transparent)]
    Store(#[from] store::Error),
}

/// Result type for all registry interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a Link
pub struct CreateLinkValues<'a> {
    /// Principal creating the link
    pub owner_id: &'a str,

    /// Raw slug, normalized and validated by the registry
    pub slug: &'a str,

    /// Raw destination URL
    pub destination_url: &'a str,

    /// Whether the link starts out resolvable
    pub is_active: bool,

    /// Optional expiry instant
    pub expires_at: Option<DateTime<Utc>>,

    /// Optional click cap
    pub click_limit: Option<u32>,

    /// Optional labels
    pub tags: Option<Vec<String>>,
}

/// Values to update a Link
///
/// Absent fields are left untouched.
#[derive(Default)]
pub struct UpdateLinkValues {
    /// New slug; rebinding retires the old index entry
    pub slug: Option<String>,

    /// New destination URL
    pub destination_url: Option<String>,

    /// New active flag
    pub is_active: Option<bool>,

    /// New expiry instant
    pub expires_at: Option<DateTime<Utc>>,

    /// New click cap
    pub click_limit: Option<u32>,

    /// New labels
    pub tags: Option<Vec<String>>,
}

/// The link registry
#[derive(Clone)]
pub struct Links<S: Store> {
    /// Backing store for records and the slug index
    store: S,

    /// Slug → link cache for the public redirect path
    ///
    /// Holds positive entries only; every mutation invalidates the slugs it
    /// touches.
    resolve_cache: Cache<String, Link>,
}

impl<S: Store> Links<S> {
    /// Create a registry on top of a store
    pub fn new(store: S) -> Self {
        Self {
            store,
            resolve_cache: Cache::builder()
                .max_capacity(RESOLVE_CACHE_CAPACITY)
                .build(),
        }
    }

    /// Create a link
    ///
    /// The slug index entry is claimed with a conditional write before the
    /// record exists; of two concurrent creates for the same slug exactly
    /// one claim succeeds and the loser observes [`Error::SlugTaken`].
    pub async fn create(&self, values: CreateLinkValues<'_>) -> Result<Link> {
        let slug = normalize_slug(values.slug)?;
        let destination_url = parse_destination_url(values.destination_url)?;
        ensure_click_limit(values.click_limit)?;

        let now = Utc::now();
        let link = Link {
            id: Uuid::new_v4(),
            slug,
            destination_url,
            owner_id: values.owner_id.to_string(),
            is_active: values.is_active,
            expires_at: values.expires_at,
            click_limit: values.click_limit,
            tags: values.tags,
            created_at: now,
            updated_at: now,
        };

        let encoded = serde_json::to_string(&link).map_err(store::Error::from)?;

        let claimed = self
            .store
            .put_if_absent(&slug_key(&link.slug), &link.id.to_string())
            .await?;

        if !claimed {
            return Err(Error::SlugTaken);
        }

        if let Err(err) = self.store.put(&link_key(&link.id), &encoded).await {
            // Release the claim rather than leave a dangling slug entry
            if let Err(release_err) = self.store.delete(&slug_key(&link.slug)).await {
                tracing::error!(
                    "Could not release slug \"{}\" after failed create: {release_err}",
                    link.slug
                );
            }

            return Err(err.into());
        }

        Ok(link)
    }

    /// Get a link by ID
    pub async fn get(&self, id: &Uuid) -> Result<Link> {
        self.fetch(id).await?.ok_or(Error::NotFound)
    }

    /// List all links
    ///
    /// Order follows the key order of the store, not insertion order.
    pub async fn list(&self) -> Result<Vec<Link>> {
        let keys = self.store.list_by_prefix(LINK_KEY_PREFIX).await?;

        let mut links = Vec::with_capacity(keys.len());
        for key in keys {
            // a key may disappear between the scan and the read
            if let Some(encoded) = self.store.get(&key).await? {
                links.push(decode_link(&encoded)?);
            }
        }

        Ok(links)
    }

    /// Update a link with the provided fields
    ///
    /// Always refreshes `updated_at`. A slug change claims the new index
    /// entry first, rewrites the record, and only then retires the old
    /// entry; the link never dangles without a record.
    pub async fn update(&self, id: &Uuid, values: UpdateLinkValues) -> Result<Link> {
        let mut link = self.get(id).await?;
        let previous_slug = link.slug.clone();

        // Validate everything before touching the store
        if let Some(raw) = &values.slug {
            link.slug = normalize_slug(raw)?;
        }
        if let Some(raw) = &values.destination_url {
            link.destination_url = parse_destination_url(raw)?;
        }
        ensure_click_limit(values.click_limit)?;

        if let Some(is_active) = values.is_active {
            link.is_active = is_active;
        }
        if let Some(expires_at) = values.expires_at {
            link.expires_at = Some(expires_at);
        }
        if let Some(click_limit) = values.click_limit {
            link.click_limit = Some(click_limit);
        }
        if let Some(tags) = values.tags {
            link.tags = Some(tags);
        }

        link.updated_at = Utc::now();

        let encoded = serde_json::to_string(&link).map_err(store::Error::from)?;

        let rebinding = link.slug != previous_slug;

        if rebinding {
            let claimed = self
                .store
                .put_if_absent(&slug_key(&link.slug), &link.id.to_string())
                .await?;

            if !claimed {
                return Err(Error::SlugTaken);
            }
        }

        if let Err(err) = self.store.put(&link_key(&link.id), &encoded).await {
            if rebinding {
                if let Err(release_err) = self.store.delete(&slug_key(&link.slug)).await {
                    tracing::error!(
                        "Could not release slug \"{}\" after failed update: {release_err}",
                        link.slug
                    );
                }
            }

            return Err(err.into());
        }

        if rebinding {
            self.store.delete(&slug_key(&previous_slug)).await?;
            self.resolve_cache.invalidate(&previous_slug).await;
        }

        self.resolve_cache.invalidate(&link.slug).await;

        Ok(link)
    }

    /// Delete a link
    ///
    /// Idempotent; deleting an unknown ID is Ok. Removes the slug index
    /// entry before the record so no slug is ever left pointing at nothing
    /// permanently.
    pub async fn delete(&self, id: &Uuid) -> Result<()> {
        if let Some(link) = self.fetch(id).await? {
            self.store.delete(&slug_key(&link.slug)).await?;
            self.store.delete(&link_key(&link.id)).await?;

            self.resolve_cache.invalidate(&link.slug).await;
        }

        Ok(())
    }

    /// Find a link by its normalized slug
    ///
    /// The lookup the public redirect path runs on: cache first, then the
    /// slug index, then the record. An index entry pointing at a missing
    /// record reads as absent.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>> {
        if let Some(link) = self.resolve_cache.get(slug).await {
            return Ok(Some(link));
        }

        let Some(id) = self.store.get(&slug_key(slug)).await? else {
            return Ok(None);
        };

        let Ok(id) = Uuid::parse_str(&id) else {
            tracing::error!("Slug index entry for \"{slug}\" holds a malformed ID");

            return Ok(None);
        };

        let Some(link) = self.fetch(&id).await? else {
            tracing::warn!("Slug index entry for \"{slug}\" points at a missing record");

            return Ok(None);
        };

        self.resolve_cache.insert(slug.to_string(), link.clone()).await;

        Ok(Some(link))
    }

    async fn fetch(&self, id: &Uuid) -> Result<Option<Link>> {
        let Some(encoded) = self.store.get(&link_key(id)).await? else {
            return Ok(None);
        };

        Ok(Some(decode_link(&encoded)?))
    }
}

const LINK_KEY_PREFIX: &str = "link:";

fn link_key(id: &Uuid) -> String {
    format!("{LINK_KEY_PREFIX}{id}")
}

fn slug_key(slug: &str) -> String {
    format!("slug:{slug}")
}

fn decode_link(encoded: &str) -> Result<Link> {
    Ok(serde_json::from_str(encoded).map_err(store::Error::from)?)
}

/// Normalize and validate a slug
///
/// Lowercases the input, then checks it against `[a-z0-9-_]{1,64}` and the
/// reserved route space.
pub fn normalize_slug(raw: &str) -> Result<String> {
    let slug = raw.trim().to_lowercase();

    if slug.is_empty() || slug.len() > SLUG_MAX_LENGTH {
        return Err(Error::InvalidSlug);
    }

    let valid = slug
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');

    if !valid {
        return Err(Error::InvalidSlug);
    }

    if RESERVED_SLUGS.contains(&slug.as_str()) {
        return Err(Error::ReservedSlug);
    }

    Ok(slug)
}

/// Validate a destination URL and bring it into its normalized form
fn parse_destination_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw).map_err(|_| Error::InvalidUrl)?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::InvalidUrl);
    }

    Ok(url.to_string())
}

fn ensure_click_limit(click_limit: Option<u32>) -> Result<()> {
    if click_limit == Some(0) {
        return Err(Error::InvalidClickLimit);
    }

    Ok(())
}
