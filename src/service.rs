use std::{fmt, sync::Arc};

use serde::Deserialize;

use crate::{
    extract::decode_model_json,
    provider::{part_label, ProviderAdapter},
    transport::{HttpTransport, Sleeper, TokioSleeper, Transport},
    Analysis, BandAssessment, CoachError, ResilientClient, Result, RetryPolicy, SampleAnswers,
    Submission, Task,
};

const MAX_BAND: f64 = 9.0;

/// Turns learner submissions into model feedback through one provider.
pub struct CoachService<T = HttpTransport, S = TokioSleeper> {
    client: ResilientClient<T, S>,
    adapter: Arc<dyn ProviderAdapter>,
    policy: RetryPolicy,
}

impl<T: Clone, S: Clone> Clone for CoachService<T, S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            adapter: Arc::clone(&self.adapter),
            policy: self.policy.clone(),
        }
    }
}

impl<T, S> fmt::Debug for CoachService<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoachService")
            .field("adapter", &self.adapter)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BandValue {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
struct RawBand {
    #[serde(alias = "score", alias = "user_score")]
    band: BandValue,
    #[serde(default)]
    feedback: String,
}

#[derive(Deserialize)]
struct RawSampleAnswers {
    #[serde(default)]
    transcript: Option<String>,
    band7: String,
    band8: String,
    band9: String,
}

impl<T: Transport, S: Sleeper> CoachService<T, S> {
    pub fn new(
        client: ResilientClient<T, S>,
        adapter: Arc<dyn ProviderAdapter>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            adapter,
            policy,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.adapter.name()
    }

    /// Free-text feedback. A response without generated text yields the
    /// placeholder instead of an error.
    pub async fn analyze(&self, submission: &Submission) -> Result<Analysis> {
        let analysis = self.run(Task::Analyze, submission).await?.text;
        Ok(Analysis { analysis })
    }

    /// Band estimate and feedback decoded from the model's JSON answer.
    pub async fn check_band(&self, submission: &Submission) -> Result<BandAssessment> {
        let answer = self.run(Task::CheckBand, submission).await?;
        let raw: RawBand = decode_model_json(&answer.text)?;
        let band = match raw.band {
            BandValue::Number(band) => band,
            BandValue::Text(text) => text.trim().parse::<f64>().map_err(|err| {
                CoachError::ResponseParse(format!("band '{text}' is not a number: {err}"))
            })?,
        };
        if !(0.0..=MAX_BAND).contains(&band) {
            return Err(CoachError::ResponseParse(format!(
                "band {band} is outside 0..={MAX_BAND}"
            )));
        }
        Ok(BandAssessment {
            band,
            feedback: raw.feedback,
        })
    }

    /// Transcript plus sample answers at bands 7, 8 and 9.
    ///
    /// A transcript from a speech-to-text stage takes precedence over the
    /// one the model wrote.
    pub async fn sample_answers(&self, submission: &Submission) -> Result<SampleAnswers> {
        let answer = self.run(Task::SampleAnswers, submission).await?;
        let raw: RawSampleAnswers = decode_model_json(&answer.text)?;
        Ok(SampleAnswers {
            transcript: answer.transcript.or(raw.transcript).unwrap_or_default(),
            band7: raw.band7,
            band8: raw.band8,
            band9: raw.band9,
        })
    }

    async fn run(&self, task: Task, submission: &Submission) -> Result<ModelAnswer> {
        if submission.is_empty() {
            return Err(CoachError::InvalidRequest("submission has no audio".to_owned()));
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            ?task,
            provider = self.adapter.name(),
            clips = submission.clips.len(),
            "evaluating submission"
        );

        let transcript = self.transcribe(submission).await?;
        let request = self
            .adapter
            .generation_request(task, submission, transcript.as_deref())
            .map_err(|err| stage_error(err, CoachError::Generation))?;
        let text = self
            .client
            .execute_text(&request, &self.policy, self.adapter.generation_path())
            .await
            .map_err(|err| stage_error(err, CoachError::Generation))?;

        Ok(ModelAnswer { transcript, text })
    }

    /// Runs the speech-to-text stage, if the provider has one.
    async fn transcribe(&self, submission: &Submission) -> Result<Option<String>> {
        let labelled = submission.clips.len() > 1;
        let mut sections = Vec::with_capacity(submission.clips.len());

        for (index, clip) in submission.clips.iter().enumerate() {
            let Some(request) = self
                .adapter
                .transcription_request(clip)
                .map_err(|err| stage_error(err, CoachError::Transcription))?
            else {
                return Ok(None);
            };

            let response = self
                .client
                .execute(&request, &self.policy)
                .await
                .map_err(|err| stage_error(err, CoachError::Transcription))?;
            let text = response
                .body
                .pointer(self.adapter.transcription_path().0)
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .ok_or_else(|| {
                    CoachError::Transcription(format!(
                        "no speech recognized in audio part {}",
                        index + 1
                    ))
                })?;

            sections.push(if labelled {
                format!("{}\n{text}", part_label(index))
            } else {
                text.to_owned()
            });
        }

        Ok(Some(sections.join("\n\n")))
    }
}

struct ModelAnswer {
    transcript: Option<String>,
    text: String,
}

/// Keeps the client's own failure kinds, wraps everything else in the
/// stage's error.
fn stage_error(err: CoachError, wrap: fn(String) -> CoachError) -> CoachError {
    if err.is_call_failure() {
        err
    } else {
        wrap(err.to_string())
    }
}
