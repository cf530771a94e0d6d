//! HTTP API
//!
//! axum routes over [`PipelineServices`](crate::services::PipelineServices):
//! - workflow intake, client selection, dashboard and SSE event stream
//! - Cloudflare deployment, domains, monitoring and analytics
//! - enrichment, proposal emails with open/click tracking
//! - Sanity integration and project lookup
//!
//! Every JSON body carries `success`. Errors render as
//! `{success: false, error, message, code}`.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use middleware::cors_layer;
pub use response::SuccessResponse;
pub use routes::{create_router, AppState};
