use std::{fmt, net::SocketAddr, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use crate::{
    provider::{GeminiAdapter, OpenAiAdapter, ProviderAdapter, ProviderKind},
    ClientOptions, CoachError, CoachService, ResilientClient, Result, RetryPolicy,
};

/// Size cap for each uploaded audio file, matching the original 15 MB limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Cap on a whole multipart request body; room for several full-size clips.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 8 * DEFAULT_MAX_UPLOAD_BYTES;

/// Service configuration, read once at startup and passed explicitly.
#[derive(Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub transcription_model: String,
    pub base_url: String,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub max_request_bytes: usize,
    pub client: ClientOptions,
    pub retry: RetryPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("transcription_model", &self.transcription_model)
            .field("base_url", &self.base_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("static_dir", &self.static_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("max_request_bytes", &self.max_request_bytes)
            .field("client", &self.client)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Config {
    /// Reads configuration from process environment variables.
    ///
    /// Reads:
    /// - `COACH_PROVIDER`: `gemini` (default) or `openai`
    /// - `GEMINI_API_KEY` / `OPENAI_API_KEY`: required for the chosen provider
    /// - `COACH_MODEL`, `COACH_TRANSCRIPTION_MODEL`, `COACH_API_BASE_URL`
    /// - `HOST` (`0.0.0.0`), `PORT` (`5000`), `COACH_STATIC_DIR` (`public`)
    /// - `COACH_MAX_UPLOAD_BYTES` (per file), `COACH_MAX_REQUEST_BYTES` (whole body)
    /// - `COACH_TIMEOUT_MS`, `COACH_MAX_ATTEMPTS`, `COACH_RETRY_BASE_MS`,
    ///   `COACH_BACKOFF_ON_TRANSPORT_ERROR`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let provider = var("COACH_PROVIDER")
            .map(|value| value.parse::<ProviderKind>())
            .transpose()?
            .unwrap_or_default();
        let key_var = provider.api_key_var();
        let api_key = lookup(key_var)
            .ok_or_else(|| CoachError::Config(format!("missing {key_var} environment variable")))?;
        if api_key.trim().is_empty() {
            return Err(CoachError::Config(format!("{key_var} is set but empty")));
        }

        let defaults = ClientOptions::default();
        let default_retry = RetryPolicy::default();

        let config = Self {
            provider,
            api_key: api_key.trim().to_owned(),
            model: var("COACH_MODEL").unwrap_or_else(|| provider.default_model().to_owned()),
            transcription_model: var("COACH_TRANSCRIPTION_MODEL")
                .unwrap_or_else(|| OpenAiAdapter::DEFAULT_TRANSCRIPTION_MODEL.to_owned()),
            base_url: var("COACH_API_BASE_URL")
                .unwrap_or_else(|| provider.default_base_url().to_owned()),
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parse_var(&var, "PORT")?.unwrap_or(5000),
            static_dir: var("COACH_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            max_upload_bytes: parse_var(&var, "COACH_MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            max_request_bytes: parse_var(&var, "COACH_MAX_REQUEST_BYTES")?
                .unwrap_or(DEFAULT_MAX_REQUEST_BYTES),
            client: ClientOptions {
                timeout_ms: parse_var(&var, "COACH_TIMEOUT_MS")?.unwrap_or(defaults.timeout_ms),
                ..defaults
            },
            retry: RetryPolicy {
                max_attempts: parse_var(&var, "COACH_MAX_ATTEMPTS")?
                    .unwrap_or(default_retry.max_attempts),
                base_delay: parse_var(&var, "COACH_RETRY_BASE_MS")?
                    .map(Duration::from_millis)
                    .unwrap_or(default_retry.base_delay),
                backoff_on_transport_error: parse_var(&var, "COACH_BACKOFF_ON_TRANSPORT_ERROR")?
                    .unwrap_or(default_retry.backoff_on_transport_error),
                ..default_retry
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the service unusable.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(CoachError::Config(
                "COACH_MAX_ATTEMPTS must be at least 1".to_owned(),
            ));
        }
        if self.client.timeout_ms == 0 {
            return Err(CoachError::Config("COACH_TIMEOUT_MS must be positive".to_owned()));
        }
        if self.max_upload_bytes == 0 {
            return Err(CoachError::Config(
                "COACH_MAX_UPLOAD_BYTES must be positive".to_owned(),
            ));
        }
        if self.max_request_bytes < self.max_upload_bytes {
            return Err(CoachError::Config(format!(
                "COACH_MAX_REQUEST_BYTES ({}) must not be below COACH_MAX_UPLOAD_BYTES ({})",
                self.max_request_bytes, self.max_upload_bytes
            )));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(CoachError::Config(format!(
                "COACH_API_BASE_URL '{}' must be an http(s) URL",
                self.base_url
            )));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|err| CoachError::Config(format!("invalid HOST/PORT: {err}")))
    }

    /// Adapter for the configured provider family.
    pub fn adapter(&self) -> Arc<dyn ProviderAdapter> {
        match self.provider {
            ProviderKind::Gemini => Arc::new(GeminiAdapter::new(
                &self.base_url,
                self.model.clone(),
                self.api_key.clone(),
            )),
            ProviderKind::OpenAi => Arc::new(OpenAiAdapter::new(
                &self.base_url,
                self.model.clone(),
                self.transcription_model.clone(),
                self.api_key.clone(),
            )),
        }
    }

    /// Wires the HTTP client, adapter and retry policy together.
    pub fn build_service(&self) -> Result<CoachService> {
        let client = ResilientClient::new(self.client.clone())?;
        Ok(CoachService::new(client, self.adapter(), self.retry.clone()))
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|err| CoachError::Config(format!("invalid {key}='{raw}': {err}")))
        })
        .transpose()
}
