use bytes::Bytes;
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method,
};
use serde::Serialize;

use crate::{CoachError, Result};

/// One part of a `multipart/form-data` body.
#[derive(Clone, Debug, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime_type: String,
        bytes: Bytes,
    },
}

/// Outbound request body.
///
/// Forms are kept as parts so that the transport can render a fresh
/// multipart body for every attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum CallBody {
    Bytes(Bytes),
    Form(Vec<FormPart>),
}

/// Fully-formed outbound provider call. Immutable once built.
#[derive(Clone, Debug)]
pub struct CallRequest {
    url: String,
    method: Method,
    headers: HeaderMap,
    body: CallBody,
}

impl CallRequest {
    /// Creates a POST request with an opaque body.
    pub fn post(url: impl Into<String>, headers: HeaderMap, body: CallBody) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            headers,
            body,
        }
    }

    /// Creates a POST request whose body is `payload` serialized as JSON.
    pub fn post_json<T: Serialize>(
        url: impl Into<String>,
        mut headers: HeaderMap,
        payload: &T,
    ) -> Result<Self> {
        let body = serde_json::to_vec(payload)
            .map_err(|err| CoachError::InvalidRequest(format!("payload not serializable: {err}")))?;
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(Self::post(url, headers, CallBody::Bytes(Bytes::from(body))))
    }

    /// Creates a POST request with a multipart form body.
    pub fn post_form(url: impl Into<String>, headers: HeaderMap, parts: Vec<FormPart>) -> Self {
        Self::post(url, headers, CallBody::Form(parts))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &CallBody {
        &self.body
    }
}

/// Builds a header map from static names and runtime values.
///
/// Values are marked sensitive so they never show up in `Debug` output.
pub(crate) fn secret_headers<const N: usize>(
    entries: [(HeaderName, String); N],
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(N);
    for (name, value) in entries {
        let mut value = HeaderValue::from_str(&value).map_err(|_| {
            CoachError::InvalidRequest(format!("header '{name}' contains invalid characters"))
        })?;
        value.set_sensitive(true);
        headers.insert(name, value);
    }
    Ok(headers)
}
