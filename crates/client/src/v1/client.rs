//! Legacy v1 client with signed query parameters.
//!
//! Every call carries `api_key`, a nonce and a timestamp, and is signed with
//! a SHA-1 digest over the sorted parameters followed by the API secret.

use std::time::{SystemTime, UNIX_EPOCH};

use percent_encoding::utf8_percent_encode;
use reqwest::Method;
use serde_json::Value;
use sha1::{Digest, Sha1};
use tracing::debug;

use super::error::{V1Error, V1ErrorCode};
use crate::client::QUERY_ENCODE_SET;

pub const V1_API_HOST: &str = "api.jwplatform.com";

const USER_AGENT: &str = concat!("jwplatform_client-rust/", env!("CARGO_PKG_VERSION"));
const KIT: &str = concat!("rust-", env!("CARGO_PKG_VERSION"));

/// Request parameters. A key may repeat to send a list of values.
pub type Params = Vec<(String, String)>;

/// JW Platform v1 API client.
#[derive(Debug, Clone)]
pub struct V1Client {
    http: reqwest::Client,
    key: String,
    secret: String,
    scheme: String,
    host: String,
    port: Option<u16>,
    version: String,
    agent: Option<String>,
}

impl V1Client {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Result<Self, V1Error> {
        Self::builder(key, secret).build()
    }

    pub fn builder(key: impl Into<String>, secret: impl Into<String>) -> V1ClientBuilder {
        V1ClientBuilder {
            key: key.into(),
            secret: secret.into(),
            scheme: "https".into(),
            host: V1_API_HOST.into(),
            port: None,
            version: "v1".into(),
            agent: None,
        }
    }

    fn url(&self, path: &str) -> String {
        let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
        format!("{}://{}{}/{}{}", self.scheme, self.host, port, self.version, path)
    }

    fn kit(&self) -> String {
        match &self.agent {
            Some(agent) => format!("{KIT}-{agent}"),
            None => KIT.to_string(),
        }
    }

    /// Builds the URL and the signed parameter list for `path`.
    pub fn build_request(&self, path: &str, params: &[(String, String)]) -> (String, Params) {
        let nonce = uuid::Uuid::new_v4().as_u128() % 1_000_000_000;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut signed: Params = params.to_vec();
        signed.push(("api_nonce".into(), format!("{nonce:09}")));
        signed.push(("api_timestamp".into(), timestamp.to_string()));
        signed.push(("api_key".into(), self.key.clone()));
        signed.push(("api_format".into(), "json".into()));
        signed.push(("api_kit".into(), self.kit()));

        let signature = sign(&signed, &self.secret);
        signed.push(("api_signature".into(), signature));

        (self.url(path), signed)
    }

    /// Calls `path`, e.g. `/videos/show`.
    ///
    /// POST sends the parameters as a form body, other methods as a query
    /// string.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Value, V1Error> {
        let use_body = method == Method::POST;
        self.call_with(method, path, params, use_body).await
    }

    pub async fn call_with(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        use_body: bool,
    ) -> Result<Value, V1Error> {
        let (url, signed) = self.build_request(path, params);
        debug!(%method, path, "v1 API call");

        let mut req = self.http.request(method, &url);
        req = if use_body {
            req.form(&signed)
        } else {
            req.query(&signed)
        };

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        parse_response(status, &text)
    }
}

pub struct V1ClientBuilder {
    key: String,
    secret: String,
    scheme: String,
    host: String,
    port: Option<u16>,
    version: String,
    agent: Option<String>,
}

impl V1ClientBuilder {
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Agent name appended to the user agent and `api_kit`.
    pub fn agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<V1Client, V1Error> {
        let user_agent = match &self.agent {
            Some(agent) => format!("{USER_AGENT}-{agent}"),
            None => USER_AGENT.to_string(),
        };
        let http = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(V1Client {
            http,
            key: self.key,
            secret: self.secret,
            scheme: self.scheme,
            host: self.host,
            port: self.port,
            version: self.version,
            agent: self.agent,
        })
    }
}

/// Signature base string: parameters sorted by key, percent-encoded, joined
/// by `&`. Repeated keys keep their relative order.
pub fn base_string(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, QUERY_ENCODE_SET),
                utf8_percent_encode(v, QUERY_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// SHA-1 hex of the base string followed by the secret.
pub fn sign(params: &[(String, String)], secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(base_string(params).as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn parse_response(status: u16, text: &str) -> Result<Value, V1Error> {
    let body: Value = serde_json::from_str(text)
        .map_err(|_| V1Error::unknown(format!("Not a valid JSON string: {text}")))?;

    if status == 200 {
        return Ok(body);
    }

    if body.get("status").and_then(Value::as_str) == Some("error") {
        let code = body
            .get("code")
            .and_then(Value::as_str)
            .map(V1ErrorCode::from_code)
            .unwrap_or(V1ErrorCode::Unknown);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(V1Error::Api { code, message });
    }
    Err(V1Error::unknown(text))
}
