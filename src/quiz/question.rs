use crate::*;
use std::ops::RangeInclusive;
use std::time::Duration;
use std::time::SystemTime;

/// A multiple-choice question as authored by the host.
///
/// Deliberately not `Serialize`: the correct index must never reach a player,
/// so the only outward form is [`QuestionView`].
#[derive(Debug, Clone)]
pub struct Question {
    id: ID<Question>,
    prompt: String,
    options: Vec<String>,
    correct: usize,
    time_limit: Duration,
    created: SystemTime,
}

/// Raw host submission, before validation.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct QuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub time_limit: u64,
}

/// What players see of a live question.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct QuestionView {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub time_limit: u64,
    /// Unix millis at which the round opened, so clients can count down
    /// independently of delivery latency.
    pub start_time: i64,
}

impl Question {
    /// Validates a draft. Options are trimmed and blanks dropped before counting.
    pub fn new(draft: QuestionDraft, limits: RangeInclusive<u64>) -> Result<Self, QuestionError> {
        let prompt = draft.question.trim().to_string();
        let options = draft
            .options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect::<Vec<_>>();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
            return Err(QuestionError::OptionCount {
                min: MIN_OPTIONS,
                max: MAX_OPTIONS,
                got: options.len(),
            });
        }
        if draft.correct_index >= options.len() {
            return Err(QuestionError::CorrectIndex {
                index: draft.correct_index,
                options: options.len(),
            });
        }
        if !limits.contains(&draft.time_limit) {
            return Err(QuestionError::TimeLimit {
                secs: draft.time_limit,
                min: *limits.start(),
                max: *limits.end(),
            });
        }
        Ok(Self {
            id: ID::default(),
            prompt,
            options,
            correct: draft.correct_index,
            time_limit: Duration::from_secs(draft.time_limit),
            created: SystemTime::now(),
        })
    }
    pub fn id(&self) -> ID<Question> {
        self.id
    }
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
    pub fn options(&self) -> &[String] {
        &self.options
    }
    pub fn correct(&self) -> usize {
        self.correct
    }
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }
    pub fn created(&self) -> SystemTime {
        self.created
    }
    pub fn view(&self, started: SystemTime) -> QuestionView {
        QuestionView {
            id: self.id.to_string(),
            question: self.prompt.clone(),
            options: self.options.clone(),
            time_limit: self.time_limit.as_secs(),
            start_time: unix_millis(started),
        }
    }
}
