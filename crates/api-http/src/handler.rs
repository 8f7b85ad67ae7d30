//! HTTP Handlers
//!
//! Both routes always answer 200 with a rendered page; failures surface as
//! notices or error text on the page itself.

use crate::instrumentation::request_span;
use crate::server::AppState;
use crate::types::{search_query, QueryPairs};
use crate::views;
use axum::extract::{Query, State};
use axum::response::Html;
use ecommerce_search_core::application::{index_page, search_page};

/// GET /
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let page = index_page(state.search.is_some());
    Html(views::render_index(&page))
}

/// GET /search?query=
pub async fn search(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Html<String> {
    let span = request_span(&state.instrumentation);
    let page = search_page(state.search.as_deref(), search_query(&pairs), span.as_ref()).await;
    Html(views::render_search(&page))
}
