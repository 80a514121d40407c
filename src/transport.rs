use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{
    multipart::{Form, Part},
    StatusCode,
};

use crate::{CallBody, CallRequest, ClientOptions, CoachError, FormPart, Result};

/// Raw response of one provider call.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Failure before any HTTP status was received.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    timeout: bool,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timeout: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timeout: true,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.timeout
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let timeout = err.is_timeout();
        Self {
            message: err.to_string(),
            timeout,
        }
    }
}

/// Sends a [`CallRequest`] once. Retrying is left to the caller.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &CallRequest,
    ) -> impl Future<Output = std::result::Result<TransportResponse, TransportError>> + Send;
}

/// Suspends the current task between retry attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Timer-backed [`Sleeper`]; only the calling task is suspended.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// [`Transport`] over a shared `reqwest` connection pool.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
    options: ClientOptions,
}

impl HttpTransport {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(options.connect_timeout_ms))
            .build()
            .map_err(|err| CoachError::Config(format!("could not build HTTP client: {err}")))?;
        Ok(Self { http, options })
    }
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &CallRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let builder = self
            .http
            .request(request.method().clone(), request.url())
            .headers(request.headers().clone())
            .timeout(Duration::from_millis(self.options.timeout_ms));

        let builder = match request.body() {
            CallBody::Bytes(bytes) => builder.body(bytes.clone()),
            CallBody::Form(parts) => builder.multipart(render_form(parts)),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(TransportResponse { status, body })
    }
}

fn render_form(parts: &[FormPart]) -> Form {
    parts.iter().fold(Form::new(), |form, part| match part {
        FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
        FormPart::File {
            name,
            file_name,
            mime_type,
            bytes,
        } => {
            let file = || Part::bytes(bytes.to_vec()).file_name(file_name.clone());
            let part = file().mime_str(mime_type).unwrap_or_else(|_| file());
            form.part(name.clone(), part)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::TransportError;

    #[test]
    fn timeout_flag_is_kept() {
        assert!(TransportError::timeout("deadline").is_timeout());
        assert!(!TransportError::new("reset").is_timeout());
        assert_eq!(TransportError::new("reset").to_string(), "reset");
    }
}
