pub mod config;
pub mod estimate;

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

pub async fn health() -> &'static str {
    "OK"
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
