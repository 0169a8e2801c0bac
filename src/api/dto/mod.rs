//! Request/response DTOs for the REST API.

pub mod common_dto;
pub mod control_dto;

pub use common_dto::{PaginationMeta, PaginationParams};
pub use control_dto::ControlRequest;
