use std::fmt;

use crate::{
    extract::{extract_text, TextPath},
    transport::{HttpTransport, Sleeper, TokioSleeper, Transport},
    AttemptOutcome, CallAttempt, CallRequest, CallResponse, ClientOptions, CoachError, Result,
    RetryPolicy,
};

/// Calls a provider endpoint, retrying rate-limited and failed attempts
/// with exponential backoff.
///
/// Dropping the returned future abandons the in-flight call together with
/// any pending backoff sleep.
#[derive(Clone)]
pub struct ResilientClient<T = HttpTransport, S = TokioSleeper> {
    transport: T,
    sleeper: S,
}

impl<T, S> fmt::Debug for ResilientClient<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientClient").finish_non_exhaustive()
    }
}

impl ResilientClient {
    /// Creates a client over `reqwest` with real timers.
    pub fn new(options: ClientOptions) -> Result<Self> {
        Ok(Self::with_parts(HttpTransport::new(options)?, TokioSleeper))
    }
}

impl<T: Transport, S: Sleeper> ResilientClient<T, S> {
    /// Creates a client from an explicit transport and sleeper.
    pub fn with_parts(transport: T, sleeper: S) -> Self {
        Self { transport, sleeper }
    }

    /// Sends `request` until it succeeds, fails fatally, or `policy` runs out
    /// of attempts, and returns the parsed JSON body.
    pub async fn execute(&self, request: &CallRequest, policy: &RetryPolicy) -> Result<CallResponse> {
        let mut attempts = Vec::new();
        let mut attempt = 0u32;

        while attempt < policy.max_attempts {
            match self.transport.send(request).await {
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(attempt, url = %request.url(), error = %err, "provider call failed");

                    let outcome = if err.is_timeout() {
                        AttemptOutcome::Timeout(err.to_string())
                    } else {
                        AttemptOutcome::Transport(err.to_string())
                    };
                    attempts.push(CallAttempt::now(attempt, outcome));
                    if policy.backoff_on_transport_error && policy.has_attempts_after(attempt) {
                        self.wait_before_retry(policy, attempt).await;
                    }
                    attempt += 1;
                }
                Ok(response) if response.status.is_success() => {
                    attempts.push(CallAttempt::now(attempt, AttemptOutcome::Success));
                    let body = serde_json::from_slice::<serde_json::Value>(&response.body)
                        .map_err(|err| {
                            CoachError::ResponseParse(format!(
                                "invalid provider response JSON: {err}; body: {}",
                                String::from_utf8_lossy(&response.body)
                            ))
                        })?;
                    return Ok(CallResponse { body, attempts });
                }
                Ok(response) if policy.is_retryable(response.status) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        attempt,
                        status = response.status.as_u16(),
                        "provider rate limit exceeded"
                    );

                    attempts.push(CallAttempt::now(attempt, AttemptOutcome::RateLimited));
                    if policy.has_attempts_after(attempt) {
                        self.wait_before_retry(policy, attempt).await;
                    }
                    attempt += 1;
                }
                Ok(response) => {
                    let status = response.status.as_u16();
                    attempts.push(CallAttempt::now(attempt, AttemptOutcome::HttpError(status)));
                    return Err(CoachError::Upstream {
                        status,
                        body: String::from_utf8_lossy(&response.body).into_owned(),
                    });
                }
            }
        }

        Err(CoachError::RetriesExhausted { attempts })
    }

    /// Like [`execute`](Self::execute), then pulls the generated text out of
    /// the body at `path`, falling back to the placeholder when it is absent.
    pub async fn execute_text(
        &self,
        request: &CallRequest,
        policy: &RetryPolicy,
        path: TextPath,
    ) -> Result<String> {
        let response = self.execute(request, policy).await?;
        Ok(extract_text(&response.body, path))
    }

    async fn wait_before_retry(&self, policy: &RetryPolicy, attempt: u32) {
        let delay = policy.delay(attempt);

        #[cfg(feature = "tracing")]
        tracing::debug!("retrying provider request after {} ms", delay.as_millis());

        self.sleeper.sleep(delay).await;
    }
}
