use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// How a single provider call ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    RateLimited,
    HttpError(u16),
    /// No response within the per-attempt timeout.
    Timeout(String),
    Transport(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallAttempt {
    /// 0-indexed position of the attempt.
    pub ordinal: u32,
    pub outcome: AttemptOutcome,
    pub at: SystemTime,
}

impl CallAttempt {
    pub(crate) fn now(ordinal: u32, outcome: AttemptOutcome) -> Self {
        Self {
            ordinal,
            outcome,
            at: SystemTime::now(),
        }
    }
}

/// Successful terminal outcome of a provider call.
#[derive(Clone, Debug, PartialEq)]
pub struct CallResponse {
    /// Parsed JSON body of the 2xx response.
    pub body: serde_json::Value,
    /// Every attempt made, the last one being the success.
    pub attempts: Vec<CallAttempt>,
}

/// Free-text feedback returned by `/analyze-speech`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub analysis: String,
}

/// Estimated band score with feedback, returned by `/checkband`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandAssessment {
    pub band: f64,
    pub feedback: String,
}

/// Transcript of the learner plus model answers at three band levels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleAnswers {
    pub transcript: String,
    pub band7: String,
    pub band8: String,
    pub band9: String,
}
