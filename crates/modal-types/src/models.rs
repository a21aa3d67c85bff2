use serde::{Deserialize, Serialize};

/// Stored user record. The password field holds whatever the API layer
/// handed to the store (an Argon2 PHC string) and must never be sent to
/// clients; use [`crate::api::PublicUser`] for responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: String,
    pub join_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityQuestions {
    pub id: i64,
    pub user_id: i64,
    pub question1: String,
    pub answer1: String,
    pub question2: String,
    pub answer2: String,
    pub question3: String,
    pub answer3: String,
    pub created_at: String,
}

/// Direct message between two users. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: i64,
    pub user_id: i64,
    pub score: i64,
    pub total_questions: i64,
    #[serde(default)]
    pub answers: serde_json::Value,
    pub created_at: String,
}

/// One saved calculator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub input: String,
    pub result: String,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: i64,
    pub theme: String,
    pub language: String,
    pub notifications: bool,
    pub auto_save: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl UserPreferences {
    /// What a user without a stored row gets.
    pub fn defaults_for(user_id: i64) -> Self {
        Self {
            user_id,
            theme: "light".into(),
            language: "en".into(),
            notifications: true,
            auto_save: true,
            updated_at: None,
        }
    }
}

/// Current time as stored in every `created_at`/`updated_at` column.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
