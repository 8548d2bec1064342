//! Participant self-report questionnaire

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed-choice question from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileQuestion {
    /// Column name in the profile table
    pub id: String,
    pub prompt: String,
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileAnswer {
    pub question: String,
    pub answer: String,
}

/// One row of the participant-profile table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    pub participant_id: String,
    pub timestamp: DateTime<Utc>,
    /// In configured question order
    pub answers: Vec<ProfileAnswer>,
    pub free_text: String,
}

/// Questions used when the config declares none
pub fn default_questions() -> Vec<ProfileQuestion> {
    vec![
        ProfileQuestion {
            id: "musical_training".to_string(),
            prompt: "Years of formal musical training".to_string(),
            choices: vec![
                "none".to_string(),
                "1-3".to_string(),
                "4-10".to_string(),
                "10+".to_string(),
            ],
        },
        ProfileQuestion {
            id: "microtonal_familiarity".to_string(),
            prompt: "Familiarity with microtonal music".to_string(),
            choices: vec![
                "none".to_string(),
                "some".to_string(),
                "familiar".to_string(),
            ],
        },
        ProfileQuestion {
            id: "listening_device".to_string(),
            prompt: "Listening device".to_string(),
            choices: vec!["headphones".to_string(), "speakers".to_string()],
        },
    ]
}
