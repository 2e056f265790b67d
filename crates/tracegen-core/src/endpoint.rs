//! Endpoint descriptors for the self-traffic generator.

use crate::ports::RandomSource;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// HTTP method of a self-traffic call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One endpoint the generator may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub method: HttpMethod,
    pub path: String,
    pub name: String,
    /// JSON object sent as the request body. A fresh random `value` in
    /// `[1, 100]` is merged in on every call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl EndpointDescriptor {
    pub fn get(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            name: name.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, name: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            name: name.into(),
            body: Some(body),
        }
    }

    /// Render the body for a single call, or `None` for body-less requests.
    pub fn request_body(&self, random: &dyn RandomSource) -> Option<Value> {
        let mut body = self.body.clone()?;
        if let Value::Object(map) = &mut body {
            map.insert("value".to_string(), json!(random.int_in(1, 100)));
        }
        Some(body)
    }
}

/// The fixed set of endpoints exercised by the generator. The error
/// endpoint is left out so background traffic never produces 500s.
pub fn default_endpoints() -> Vec<EndpointDescriptor> {
    vec![
        EndpointDescriptor::get("/", "home"),
        EndpointDescriptor::get("/health", "health"),
        EndpointDescriptor::get("/api/data", "get_data"),
        EndpointDescriptor::post("/api/process", "process_data", json!({ "auto": true })),
        EndpointDescriptor::get("/api/chain", "chain_ops"),
    ]
}
