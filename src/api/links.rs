//! Links API endpoints
//!
//! Everything related to link management

use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::links::CreateLinkValues;
use crate::links::Link;
use crate::links::Links;
use crate::links::UpdateLinkValues;
use crate::store::Store;

use super::CurrentAdmin;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// Link response going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    /// Link ID
    pub id: Uuid,

    /// Normalized slug
    pub slug: String,

    /// Where the public path redirects to
    pub destination_url: String,

    /// Principal that created the link
    pub owner_id: String,

    /// Whether the link resolves
    pub is_active: bool,

    /// Optional expiry instant
    pub expires_at: Option<DateTime<Utc>>,

    /// Declared click cap
    pub click_limit: Option<u32>,

    /// Free-text labels
    pub tags: Option<Vec<String>>,

    /// Creation date
    pub created_at: DateTime<Utc>,

    /// Last updated at
    pub updated_at: DateTime<Utc>,
}

impl LinkResponse {
    /// Create a response from a [`Link`](Link)
    fn from_link(link: Link) -> Self {
        Self {
            id: link.id,
            slug: link.slug,
            destination_url: link.destination_url,
            owner_id: link.owner_id,
            is_active: link.is_active,
            expires_at: link.expires_at,
            click_limit: link.click_limit,
            tags: link.tags,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }

    /// Create a response from multiple [`Link`](Link)s
    fn from_link_multiple(links: Vec<Link>) -> Vec<Self> {
        links.into_iter().map(Self::from_link).collect()
    }
}

/// Create link form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkForm {
    /// Slug to register; lowercased before it is stored
    slug: String,

    /// Absolute http(s) URL to redirect to
    destination_url: String,

    /// Defaults to active
    is_active: Option<bool>,

    /// Optional expiry instant
    expires_at: Option<DateTime<Utc>>,

    /// Optional positive click cap
    click_limit: Option<u32>,

    /// Optional labels
    tags: Option<Vec<String>>,
}

/// Create a link based on the [`CreateLinkForm`](CreateLinkForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "slug": "go-home", "destinationUrl": "https://www.example.com/" }' \
///     http://localhost:6000/api/links
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "slug": "go-home" ... } }
/// ```
pub async fn create<S: Store>(
    Extension(links): Extension<Links<S>>,
    current_admin: CurrentAdmin,
    Form(form): Form<CreateLinkForm>,
) -> Result<Success<LinkResponse>, Error> {
    let values = CreateLinkValues {
        owner_id: &current_admin.subject,
        slug: &form.slug,
        destination_url: &form.destination_url,
        is_active: form.is_active.unwrap_or(true),
        expires_at: form.expires_at,
        click_limit: form.click_limit,
        tags: form.tags,
    };

    let link = links.create(values).await?;

    Ok(Success::created(LinkResponse::from_link(link)))
}

/// List all links
pub async fn list<S: Store>(
    Extension(links): Extension<Links<S>>,
    _current_admin: CurrentAdmin,
) -> Result<Success<Vec<LinkResponse>>, Error> {
    let links = links.list().await?;

    Ok(Success::ok(LinkResponse::from_link_multiple(links)))
}

/// Get a single link
pub async fn single<S: Store>(
    Extension(links): Extension<Links<S>>,
    _current_admin: CurrentAdmin,
    PathParameters(link_id): PathParameters<Uuid>,
) -> Result<Success<LinkResponse>, Error> {
    let link = links.get(&link_id).await?;

    Ok(Success::ok(LinkResponse::from_link(link)))
}

/// Update link form
///
/// Fields to update a link with, all fields are optional and are not
/// touched when not provided
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkForm {
    /// New slug; the old one stops resolving
    slug: Option<String>,

    /// New destination URL
    destination_url: Option<String>,

    /// New active flag
    is_active: Option<bool>,

    /// New expiry instant
    expires_at: Option<DateTime<Utc>>,

    /// New click cap
    click_limit: Option<u32>,

    /// New labels
    tags: Option<Vec<String>>,
}

/// Update a link based on the [`UpdateLinkForm`](UpdateLinkForm) form
///
/// Only provided values are processed, the other fields of the link will
/// not be touched
pub async fn update<S: Store>(
    Extension(links): Extension<Links<S>>,
    _current_admin: CurrentAdmin,
    PathParameters(link_id): PathParameters<Uuid>,
    Form(form): Form<UpdateLinkForm>,
) -> Result<Success<LinkResponse>, Error> {
    let values = UpdateLinkValues {
        slug: form.slug,
        destination_url: form.destination_url,
        is_active: form.is_active,
        expires_at: form.expires_at,
        click_limit: form.click_limit,
        tags: form.tags,
    };

    let link = links.update(&link_id, values).await?;

    Ok(Success::ok(LinkResponse::from_link(link)))
}

/// Deletion confirmation
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Always true; deleting an unknown link is still ok
    pub ok: bool,
}

/// Delete a link
///
/// Idempotent; the slug index entry goes away with the record
pub async fn delete<S: Store>(
    Extension(links): Extension<Links<S>>,
    _current_admin: CurrentAdmin,
    PathParameters(link_id): PathParameters<Uuid>,
) -> Result<Success<DeleteResponse>, Error> {
    links.delete(&link_id).await?;

    Ok(Success::ok(DeleteResponse { ok: true }))
}
