//! JW Platform REST API client.
//!
//! [`Client`] talks to the v2 API with a bearer secret, [`UploadsClient`]
//! to the upload host of one multipart session, and [`v1::V1Client`] to the
//! legacy signed v1 API.

pub mod client;
pub mod error;
pub mod resource;
pub mod response;
pub mod uploads;
pub mod v1;

#[cfg(test)]
mod mock;

pub use client::{Client, JWPLATFORM_API_HOST, base_url_for};
pub use error::{ApiError, Error, ErrorDetail, StatusKind};
pub use resource::SiteResource;
pub use response::ApiResponse;
pub use uploads::{JWPLATFORM_UPLOAD_HOST, UploadsClient};
