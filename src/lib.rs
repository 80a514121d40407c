//! `ielts-coach` grades spoken IELTS answers by relaying uploaded audio to
//! a hosted generative-AI provider (Gemini or OpenAI) and returning the
//! model's JSON answer.
//!
//! The provider call goes through [`ResilientClient`], which retries
//! rate-limited attempts with exponential backoff:
//! - [`ResilientClient::execute`]
//! - [`ResilientClient::execute_text`]
//!
//! [`CoachService`] combines the client with a [`ProviderAdapter`] chosen by
//! [`Config`]. With the `server` feature, [`server::router`] exposes it over
//! HTTP.

mod audio;
mod client;
mod config;
mod error;
pub mod extract;
mod options;
mod prompt;
pub mod provider;
mod request;
mod retry;
mod service;
pub mod transport;
mod types;

#[cfg(feature = "server")]
pub mod server;

pub use audio::{AudioClip, Submission, DEFAULT_AUDIO_MIME};
pub use client::ResilientClient;
pub use config::{Config, DEFAULT_MAX_REQUEST_BYTES, DEFAULT_MAX_UPLOAD_BYTES};
pub use error::CoachError;
pub use options::ClientOptions;
pub use prompt::Task;
pub use provider::{ProviderAdapter, ProviderKind};
pub use request::{CallBody, CallRequest, FormPart};
pub use retry::RetryPolicy;
pub use service::CoachService;
pub use types::{
    Analysis, AttemptOutcome, BandAssessment, CallAttempt, CallResponse, SampleAnswers,
};

pub type Result<T> = std::result::Result<T, CoachError>;
