//! WordPress content page handlers.
//!
//! Static content (terms, privacy, about) lives as WordPress pages on the
//! shop host and is rendered here inside the storefront layout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::filters;
use crate::routes::NotFoundTemplate;
use crate::state::AppState;
use crate::woo::WooError;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/show.html")]
pub struct PageShowTemplate {
    pub title: String,
    /// HTML from WordPress, rendered as-is.
    pub content: String,
    pub analytics: AnalyticsConfig,
}

/// Display a WordPress content page by slug.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Response> {
    let page = match state.catalog().get_page_by_slug(&slug).await {
        Ok(page) => page,
        Err(WooError::NotFound(_)) => {
            return Ok((
                StatusCode::NOT_FOUND,
                NotFoundTemplate {
                    analytics: state.config().analytics.clone(),
                },
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(PageShowTemplate {
        title: page.title.rendered,
        content: page.content.rendered,
        analytics: state.config().analytics.clone(),
    }
    .into_response())
}
