//! Store input types. Records coming back out are the `modal_types::models`
//! structs; these are what callers hand in.

use modal_types::models::UserPreferences;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// User id as older JSON documents wrote it: an integer, a float (ids were
/// minted from a millisecond clock plus a random fraction) or a numeric
/// string. Fractions are truncated.
pub fn loose_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let whole = |f: f64| f.is_finite().then(|| f.trunc() as i64);
    let id = match &value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole)),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(whole),
        _ => None,
    };
    id.ok_or_else(|| D::Error::custom(format!("expected a numeric id, got {}", value)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Fields left as `None` are not touched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUserProfile {
    #[serde(deserialize_with = "loose_id")]
    pub user_id: i64,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewSecurityQuestions {
    pub question1: String,
    pub answer1: String,
    pub question2: String,
    pub answer2: String,
    pub question3: String,
    pub answer3: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    #[serde(deserialize_with = "loose_id")]
    pub sender_id: i64,
    #[serde(deserialize_with = "loose_id")]
    pub receiver_id: i64,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuizResult {
    #[serde(deserialize_with = "loose_id")]
    pub user_id: i64,
    pub score: i64,
    pub total_questions: i64,
    #[serde(default)]
    pub answers: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCalculation {
    #[serde(rename = "type")]
    pub kind: String,
    pub input: String,
    pub result: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub theme: Option<String>,
    pub language: Option<String>,
    pub notifications: Option<bool>,
    pub auto_save: Option<bool>,
}

impl PreferencesUpdate {
    /// Overlay the supplied fields onto `prefs`.
    pub fn apply_to(&self, prefs: &mut UserPreferences) {
        if let Some(theme) = &self.theme {
            prefs.theme = theme.clone();
        }
        if let Some(language) = &self.language {
            prefs.language = language.clone();
        }
        if let Some(notifications) = self.notifications {
            prefs.notifications = notifications;
        }
        if let Some(auto_save) = self.auto_save {
            prefs.auto_save = auto_save;
        }
    }
}
