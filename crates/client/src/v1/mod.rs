//! Legacy v1 API (signed query parameters).

mod client;
mod error;

pub use client::{Params, V1_API_HOST, V1Client, V1ClientBuilder, base_string, sign};
pub use error::{V1Error, V1ErrorCode};
