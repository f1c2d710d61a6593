//! HTTP layer: axum router, handlers, the session extractor and templates.

pub mod cookies;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod templates;
