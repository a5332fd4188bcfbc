//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names follow the dashboard's camelCase convention and every
//! response carries a `success` flag.

pub mod analytics_dto;
pub mod auth_dto;
pub mod common_dto;
pub mod dustbin_dto;
pub mod notification_dto;

pub use analytics_dto::*;
pub use auth_dto::*;
pub use common_dto::*;
pub use dustbin_dto::*;
pub use notification_dto::*;
