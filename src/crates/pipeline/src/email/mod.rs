//! Client emails
//!
//! The proposal email links to every ready mockup through tracked URLs; a 1×1 pixel and
//! the click redirect endpoint feed [`TrackingStore`]. A reminder goes out after a fixed
//! delay when the client did not react.

pub mod notifier;
pub mod templates;
pub mod tracking;

pub use notifier::{EmailNotifier, EmailSendResult, MockupEmailRequest};
pub use templates::MockupLink;
pub use tracking::{add_tracking_params, generate_tracking_id, EmailAnalytics, TrackingRecord, TrackingStore};
