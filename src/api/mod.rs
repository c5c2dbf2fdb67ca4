//! All API endpoint setup

use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;

pub use current_admin::CurrentAdmin;
pub use current_admin::JwtKeys;
pub use request::Form;
pub use request::PathParameters;
pub use response::Error;
pub use response::Success;

use crate::store::Store;

mod analytics;
mod auth;
mod current_admin;
mod links;
mod request;
mod response;

/// Get the Axum router for all API routes
pub fn router<S: Store>() -> Router {
    let auth = Router::new().route("/login", post(auth::login));

    let links = Router::new()
        .route("/", get(links::list::<S>))
        .route("/", post(links::create::<S>))
        .route("/{link}", get(links::single::<S>))
        .route("/{link}", put(links::update::<S>))
        .route("/{link}", delete(links::delete::<S>));

    let analytics = Router::new().route("/{link}/basic", get(analytics::basic::<S>));

    Router::new()
        .nest("/auth", auth)
        .nest("/links", links)
        .nest("/analytics", analytics)
}
