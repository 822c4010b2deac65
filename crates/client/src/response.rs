//! Raw API responses.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// A response as received from the API, before any typed decoding.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Parsed body; `None` when the body is empty or not JSON.
    pub json_body: Option<Value>,
}

impl ApiResponse {
    pub(crate) fn new(status: u16, body: Vec<u8>) -> Self {
        let json_body = if body.is_empty() {
            None
        } else {
            serde_json::from_slice(&body).ok()
        };
        Self {
            status,
            body,
            json_body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Looks up a top-level string field of the JSON body.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.json_body.as_ref()?.get(key)?.as_str()
    }

    /// Items of a list response, e.g. `resources("media")`.
    ///
    /// Returns an empty slice when the key is missing or not an array.
    pub fn resources(&self, key: &str) -> &[Value] {
        self.json_body
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Decodes the body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_body() {
        let resp = ApiResponse::new(200, br#"{"field":"value"}"#.to_vec());
        assert!(resp.is_success());
        assert_eq!(resp.str_field("field"), Some("value"));
        assert_eq!(resp.body, br#"{"field":"value"}"#);
    }

    #[test]
    fn empty_body_has_no_json() {
        let resp = ApiResponse::new(204, Vec::new());
        assert!(resp.json_body.is_none());
        assert!(resp.resources("media").is_empty());
    }

    #[test]
    fn non_json_body_kept_raw() {
        let resp = ApiResponse::new(502, b"502 Bad Gateway".to_vec());
        assert!(!resp.is_success());
        assert!(resp.json_body.is_none());
        assert_eq!(resp.body, b"502 Bad Gateway");
    }

    #[test]
    fn resources_lists_items() {
        let resp = ApiResponse::new(
            200,
            br#"{"media":[{"id":"mediaid1","type":"media"}],"total":1}"#.to_vec(),
        );
        let items = resp.resources("media");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], "mediaid1");
    }

    #[test]
    fn typed_decode() {
        #[derive(serde::Deserialize)]
        struct Media {
            id: String,
        }
        let resp = ApiResponse::new(200, br#"{"id":"abc12345"}"#.to_vec());
        let media: Media = resp.json().unwrap();
        assert_eq!(media.id, "abc12345");
    }
}
