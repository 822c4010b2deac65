//! Site-scoped resource dispatch.
//!
//! Every v2 resource collection lives under `/v2/sites/{site_id}/{collection}/`
//! and shares the same list/create/get/update/delete surface.

use percent_encoding::utf8_percent_encode;
use reqwest::Method;
use serde_json::Value;

use crate::client::{Client, QUERY_ENCODE_SET};
use crate::error::Error;
use crate::response::ApiResponse;

/// A resource collection of one site, e.g. the site's media.
#[derive(Debug, Clone, Copy)]
pub struct SiteResource<'a> {
    client: &'a Client,
    collection: &'static str,
}

impl<'a> SiteResource<'a> {
    pub(crate) fn new(client: &'a Client, collection: &'static str) -> Self {
        Self { client, collection }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn collection_path(&self, site_id: &str) -> String {
        format!(
            "/v2/sites/{}/{}/",
            utf8_percent_encode(site_id, QUERY_ENCODE_SET),
            self.collection
        )
    }

    pub fn item_path(&self, site_id: &str, id: &str) -> String {
        format!(
            "{}{}/",
            self.collection_path(site_id),
            utf8_percent_encode(id, QUERY_ENCODE_SET)
        )
    }

    /// Lists the collection; the items are under the collection name.
    pub async fn list(
        &self,
        site_id: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse, Error> {
        self.client
            .request(Method::GET, &self.collection_path(site_id), None, query)
            .await
    }

    pub async fn create(
        &self,
        site_id: &str,
        body: &Value,
        query: &[(String, String)],
    ) -> Result<ApiResponse, Error> {
        self.client
            .request(Method::POST, &self.collection_path(site_id), Some(body), query)
            .await
    }

    pub async fn get(&self, site_id: &str, id: &str) -> Result<ApiResponse, Error> {
        self.client
            .request(Method::GET, &self.item_path(site_id, id), None, &[])
            .await
    }

    /// Partially updates an item (PATCH).
    pub async fn update(&self, site_id: &str, id: &str, body: &Value) -> Result<ApiResponse, Error> {
        self.client
            .request(Method::PATCH, &self.item_path(site_id, id), Some(body), &[])
            .await
    }

    pub async fn delete(&self, site_id: &str, id: &str) -> Result<ApiResponse, Error> {
        self.client
            .request(Method::DELETE, &self.item_path(site_id, id), None, &[])
            .await
    }
}
