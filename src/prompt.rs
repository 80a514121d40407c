use serde_json::{json, Value};

/// What the model is asked to do with a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    /// Free-text rewrite of the answer at bands 7, 8 and 9.
    Analyze,
    /// Band estimate plus improvement feedback.
    CheckBand,
    /// Transcript plus model answers at bands 7, 8 and 9, as JSON.
    SampleAnswers,
}

const SAMPLE_ANSWERS_SYSTEM: &str = "\
You are an AI specialized in generating IELTS speaking responses. Based on the user's speech, \
provide a sample spoken response for the IELTS Speaking test at three distinct proficiency \
levels: Band 7, Band 8, and Band 9.

- Band 7: clear and well-organized, with a generally good command of vocabulary and grammar, \
but may include some hesitations or minor errors.
- Band 8: very fluent and detailed, with a wide range of vocabulary and complex grammatical \
structures.
- Band 9: flawless, natural, and effortless, demonstrating a full command of the language with \
no significant errors.

Your response must be a JSON object with the keys \"band7\", \"band8\", and \"band9\". The value \
for each key is the generated speech text for that band. Do not include any additional text, \
analysis, or introductory phrases.";

const CHECK_BAND_SYSTEM: &str = "\
You are a world-class IELTS examiner. Provide a detailed analysis of a candidate's spoken \
English performance for the IELTS Speaking test, estimating the band score and comparing the \
performance with the characteristics of a Band 9 response.

Do not use personal pronouns like \"you\" or \"your\" in the analysis. Maintain a formal, \
academic tone. Your response must be a JSON object with the keys \"band\" (a number between 0 \
and 9 in steps of 0.5) and \"feedback\" (a string). Do not include any additional text.";

impl Task {
    pub fn system_instruction(self) -> &'static str {
        match self {
            Self::Analyze | Self::SampleAnswers => SAMPLE_ANSWERS_SYSTEM,
            Self::CheckBand => CHECK_BAND_SYSTEM,
        }
    }

    /// Instruction placed next to the audio (or transcript) in the user turn.
    pub fn user_instruction(self) -> &'static str {
        match self {
            Self::Analyze => {
                "You are an IELTS speaking evaluator. Given a student's input, rewrite it into \
                 Band 7, Band 8, and Band 9 responses. Return ONLY valid JSON with keys band7, \
                 band8, band9."
            }
            Self::CheckBand => {
                "You are an IELTS speaking evaluator. Given a student's input, check it, tell \
                 what band score it is and give feedback to improve. Return ONLY valid JSON with \
                 keys band, feedback."
            }
            Self::SampleAnswers => {
                "You are an IELTS speaking evaluator. Transcribe the student's input verbatim, \
                 then rewrite it into Band 7, Band 8, and Band 9 responses. Return ONLY valid \
                 JSON with keys transcript, band7, band8, band9."
            }
        }
    }

    /// Whether the model answer is decoded as a JSON object.
    pub fn expects_json(self) -> bool {
        !matches!(self, Self::Analyze)
    }

    /// OpenAPI-subset schema constraining structured answers.
    ///
    /// `include_transcript` is false when the transcript comes from a
    /// separate speech-to-text stage.
    pub fn response_schema(self, include_transcript: bool) -> Option<Value> {
        match self {
            Self::Analyze => None,
            Self::CheckBand => Some(json!({
                "type": "OBJECT",
                "properties": {
                    "band": { "type": "NUMBER" },
                    "feedback": { "type": "STRING" }
                },
                "required": ["band", "feedback"]
            })),
            Self::SampleAnswers => {
                let mut keys = vec!["band7", "band8", "band9"];
                if include_transcript {
                    keys.insert(0, "transcript");
                }
                let properties: serde_json::Map<String, Value> = keys
                    .iter()
                    .map(|key| ((*key).to_owned(), json!({ "type": "STRING" })))
                    .collect();
                Some(json!({
                    "type": "OBJECT",
                    "properties": properties,
                    "required": keys
                }))
            }
        }
    }
}

/// Renders question prompts sent alongside the recordings.
pub(crate) fn context_block(context: &[String]) -> Option<String> {
    let lines: Vec<String> = context
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| format!("Question {}: {line}", index + 1))
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::{context_block, Task};

    #[test]
    fn analyze_has_no_schema() {
        assert!(Task::Analyze.response_schema(true).is_none());
        assert!(!Task::Analyze.expects_json());
    }

    #[test]
    fn sample_schema_lists_transcript_only_when_requested() {
        let with = Task::SampleAnswers.response_schema(true).unwrap();
        let without = Task::SampleAnswers.response_schema(false).unwrap();

        assert!(with["properties"].get("transcript").is_some());
        assert_eq!(with["required"][0], "transcript");
        assert!(without["properties"].get("transcript").is_none());
        assert_eq!(without["required"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn context_block_numbers_non_empty_lines() {
        let context = vec![
            "Describe your hometown.".to_owned(),
            "   ".to_owned(),
            "Why do people travel?".to_owned(),
        ];
        assert_eq!(
            context_block(&context).unwrap(),
            "Question 1: Describe your hometown.\nQuestion 2: Why do people travel?"
        );
        assert!(context_block(&[]).is_none());
    }
}
