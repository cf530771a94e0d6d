//! Request middleware and input checks shared by the handlers

pub mod cors;
pub mod validation;

pub use cors::cors_layer;
pub use validation::{require, require_query};
