use serde::{Deserialize, Serialize};

use crate::models::{CalculationRecord, User};

// -- JWT Claims --

/// Session carried by every authenticated request. Shared between the REST
/// middleware that decodes it and the auth handlers that mint it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub name: String,
    pub exp: usize,
}

// -- Envelope --

/// `{success, data | message | error}` wrapper used by every JSON endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

/// A user as clients see it: everything but the password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    #[serde(alias = "avatarUrl")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SecurityQuestionsRequest {
    pub question1: String,
    pub answer1: String,
    pub question2: String,
    pub answer2: String,
    pub question3: String,
    pub answer3: String,
}

// -- Calculations --

/// Body of `POST /api/calculations`. Every field is optional on the wire so
/// a missing one produces the envelope error rather than a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct SaveCalculationRequest {
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub input: Option<String>,
    pub result: Option<String>,
    pub description: Option<String>,
}

/// Body carrying only the owner, as sent with deletes and single exports.
#[derive(Debug, Default, Deserialize)]
pub struct UserIdBody {
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<String>,
}

// -- Preferences --

#[derive(Debug, Default, Deserialize)]
pub struct SavePreferencesRequest {
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: Option<i64>,
    pub theme: Option<String>,
    pub language: Option<String>,
    pub notifications: Option<bool>,
    #[serde(alias = "autoSave")]
    pub auto_save: Option<bool>,
}

// -- Export --

/// A calculation as posted for export. Records come from the client, so
/// only the fields the report prints are read.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportCalculation {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<CalculationRecord> for ExportCalculation {
    fn from(record: CalculationRecord) -> Self {
        Self {
            kind: record.kind,
            input: record.input,
            result: record.result,
            description: Some(record.description).filter(|d| !d.is_empty()),
            created_at: Some(record.created_at),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportPdfRequest {
    pub calculations: Option<Vec<ExportCalculation>>,
    pub title: Option<String>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(alias = "receiverId")]
    pub receiver_id: i64,
    pub content: String,
    /// Run the content through the classical logic filter before storing.
    #[serde(default = "default_true")]
    pub filter: bool,
}

fn default_true() -> bool {
    true
}

// -- Quiz --

#[derive(Debug, Deserialize)]
pub struct QuizResultRequest {
    pub score: i64,
    #[serde(alias = "totalQuestions")]
    pub total_questions: i64,
    #[serde(default)]
    pub answers: serde_json::Value,
}

// -- Logic filter / assistant --

#[derive(Debug, Deserialize)]
pub struct ProcessTextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct AssistantQueryRequest {
    pub query: String,
    #[serde(default)]
    pub context: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionsQuery {
    pub page: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineUsersResponse {
    pub user_ids: Vec<i64>,
}
