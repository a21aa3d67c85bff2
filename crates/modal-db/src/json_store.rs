use anyhow::{Context, Result, bail};
use modal_types::models::{
    CalculationRecord, Message, QuizResult, SecurityQuestions, User, UserPreferences, UserProfile,
    timestamp_now,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

use crate::models::{
    NewCalculation, NewMessage, NewQuizResult, NewSecurityQuestions, NewUser, NewUserProfile,
    PreferencesUpdate, ProfileUpdate, UserUpdate,
};
use crate::store::Store;

/// On-disk layout of the JSON backend: one array per entity.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub user_profiles: Vec<UserProfile>,
    #[serde(default)]
    pub security_questions: Vec<SecurityQuestions>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub quiz_results: Vec<QuizResult>,
    #[serde(default)]
    pub online_users: Vec<i64>,
    #[serde(default)]
    pub calculation_history: Vec<CalculationRecord>,
    #[serde(default)]
    pub user_preferences: Vec<UserPreferences>,
}

/// Flat-file backend. Every call re-reads the whole document and every
/// mutation rewrites it. The mutex only orders writers in this process.
pub struct JsonStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Create the file with an empty document if it does not exist yet.
    pub fn init(&self) -> Result<()> {
        if !self.path.exists() {
            write_document(&self.path, &Document::default())?;
        }
        info!("JSON store ready at {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&Document) -> T) -> Result<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| anyhow::anyhow!("JSON store lock poisoned: {}", e))?;
        let doc = read_document(&self.path)?;
        Ok(f(&doc))
    }

    fn update<T>(&self, f: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| anyhow::anyhow!("JSON store lock poisoned: {}", e))?;
        let mut doc = read_document(&self.path)?;
        let out = f(&mut doc)?;
        write_document(&self.path, &doc)?;
        Ok(out)
    }
}

/// A missing file reads as the empty document.
pub fn read_document(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Ok(Document::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_document(path: &Path, doc: &Document) -> Result<()> {
    let text = serde_json::to_string_pretty(doc)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}

impl Store for JsonStore {
    // -- Users --

    fn create_user(&self, user: &NewUser) -> Result<User> {
        self.update(|doc| {
            if doc.users.iter().any(|u| u.email == user.email) {
                bail!("email already registered: {}", user.email);
            }
            let now = timestamp_now();
            let record = User {
                id: next_id(doc.users.iter().map(|u| u.id)),
                email: user.email.clone(),
                password: user.password.clone(),
                name: user.name.clone(),
                created_at: now.clone(),
                updated_at: now,
            };
            doc.users.push(record.clone());
            Ok(record)
        })
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.read(|doc| doc.users.iter().find(|u| u.email == email).cloned())
    }

    fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.read(|doc| doc.users.iter().find(|u| u.id == id).cloned())
    }

    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        self.update(|doc| {
            let Some(user) = doc.users.iter_mut().find(|u| u.id == id) else {
                return Ok(None);
            };
            if let Some(email) = &update.email {
                user.email = email.clone();
            }
            if let Some(password) = &update.password {
                user.password = password.clone();
            }
            if let Some(name) = &update.name {
                user.name = name.clone();
            }
            user.updated_at = timestamp_now();
            Ok(Some(user.clone()))
        })
    }

    fn get_all_users(&self) -> Result<Vec<User>> {
        self.read(|doc| doc.users.clone())
    }

    // -- Profiles --

    fn create_user_profile(&self, profile: &NewUserProfile) -> Result<UserProfile> {
        self.update(|doc| {
            let record = UserProfile {
                id: next_id(doc.user_profiles.iter().map(|p| p.id)),
                user_id: profile.user_id,
                bio: profile.bio.clone(),
                avatar_url: profile.avatar_url.clone(),
                join_date: timestamp_now(),
            };
            doc.user_profiles.push(record.clone());
            Ok(record)
        })
    }

    fn get_user_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        self.read(|doc| {
            doc.user_profiles
                .iter()
                .find(|p| p.user_id == user_id)
                .cloned()
        })
    }

    fn update_user_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>> {
        self.update(|doc| {
            let Some(profile) = doc.user_profiles.iter_mut().find(|p| p.user_id == user_id)
            else {
                return Ok(None);
            };
            if let Some(bio) = &update.bio {
                profile.bio = bio.clone();
            }
            if let Some(avatar_url) = &update.avatar_url {
                profile.avatar_url = avatar_url.clone();
            }
            Ok(Some(profile.clone()))
        })
    }

    // -- Security questions --

    fn create_security_questions(
        &self,
        user_id: i64,
        q: &NewSecurityQuestions,
    ) -> Result<SecurityQuestions> {
        self.update(|doc| {
            let record = SecurityQuestions {
                id: next_id(doc.security_questions.iter().map(|s| s.id)),
                user_id,
                question1: q.question1.clone(),
                answer1: q.answer1.clone(),
                question2: q.question2.clone(),
                answer2: q.answer2.clone(),
                question3: q.question3.clone(),
                answer3: q.answer3.clone(),
                created_at: timestamp_now(),
            };
            doc.security_questions.push(record.clone());
            Ok(record)
        })
    }

    fn get_security_questions(&self, user_id: i64) -> Result<Option<SecurityQuestions>> {
        self.read(|doc| {
            doc.security_questions
                .iter()
                .find(|s| s.user_id == user_id)
                .cloned()
        })
    }

    // -- Messages --

    fn create_message(&self, message: &NewMessage) -> Result<Message> {
        self.update(|doc| {
            let record = Message {
                id: next_id(doc.messages.iter().map(|m| m.id)),
                sender_id: message.sender_id,
                receiver_id: message.receiver_id,
                content: message.content.clone(),
                created_at: timestamp_now(),
            };
            doc.messages.push(record.clone());
            Ok(record)
        })
    }

    fn get_messages(&self, a: i64, b: i64) -> Result<Vec<Message>> {
        self.read(|doc| {
            let mut messages: Vec<Message> = doc
                .messages
                .iter()
                .filter(|m| {
                    (m.sender_id == a && m.receiver_id == b)
                        || (m.sender_id == b && m.receiver_id == a)
                })
                .cloned()
                .collect();
            messages.sort_by(|x, y| x.created_at.cmp(&y.created_at).then(x.id.cmp(&y.id)));
            messages
        })
    }

    // -- Quiz results --

    fn create_quiz_result(&self, result: &NewQuizResult) -> Result<QuizResult> {
        self.update(|doc| {
            let record = QuizResult {
                id: next_id(doc.quiz_results.iter().map(|r| r.id)),
                user_id: result.user_id,
                score: result.score,
                total_questions: result.total_questions,
                answers: result.answers.clone(),
                created_at: timestamp_now(),
            };
            doc.quiz_results.push(record.clone());
            Ok(record)
        })
    }

    fn get_quiz_results(&self, user_id: i64) -> Result<Vec<QuizResult>> {
        self.read(|doc| {
            let mut results: Vec<QuizResult> = doc
                .quiz_results
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect();
            results.sort_by(|x, y| y.created_at.cmp(&x.created_at).then(y.id.cmp(&x.id)));
            results
        })
    }

    // -- Online users --

    fn add_online_user(&self, user_id: i64) -> Result<()> {
        self.update(|doc| {
            if !doc.online_users.contains(&user_id) {
                doc.online_users.push(user_id);
            }
            Ok(())
        })
    }

    fn remove_online_user(&self, user_id: i64) -> Result<()> {
        self.update(|doc| {
            doc.online_users.retain(|id| *id != user_id);
            Ok(())
        })
    }

    fn get_online_users(&self) -> Result<Vec<i64>> {
        self.read(|doc| doc.online_users.clone())
    }

    // -- Calculation history --

    fn save_calculation(
        &self,
        user_id: i64,
        calculation: &NewCalculation,
    ) -> Result<CalculationRecord> {
        self.update(|doc| {
            let record = CalculationRecord {
                id: next_id(doc.calculation_history.iter().map(|c| c.id)),
                user_id,
                kind: calculation.kind.clone(),
                input: calculation.input.clone(),
                result: calculation.result.clone(),
                description: calculation.description.clone(),
                created_at: timestamp_now(),
            };
            doc.calculation_history.push(record.clone());
            Ok(record)
        })
    }

    fn get_calculation_history(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<CalculationRecord>> {
        self.read(|doc| {
            let mut history: Vec<CalculationRecord> = doc
                .calculation_history
                .iter()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect();
            history.sort_by(|x, y| y.created_at.cmp(&x.created_at).then(y.id.cmp(&x.id)));
            history.truncate(limit);
            history
        })
    }

    fn delete_calculation(&self, id: i64, user_id: i64) -> Result<bool> {
        self.update(|doc| {
            let before = doc.calculation_history.len();
            doc.calculation_history
                .retain(|c| !(c.id == id && c.user_id == user_id));
            Ok(doc.calculation_history.len() < before)
        })
    }

    // -- Preferences --

    fn save_user_preferences(
        &self,
        user_id: i64,
        update: &PreferencesUpdate,
    ) -> Result<UserPreferences> {
        self.update(|doc| {
            let index = doc
                .user_preferences
                .iter()
                .position(|p| p.user_id == user_id);

            let mut prefs = match index {
                Some(i) => doc.user_preferences[i].clone(),
                None => UserPreferences::defaults_for(user_id),
            };
            update.apply_to(&mut prefs);
            prefs.updated_at = Some(timestamp_now());

            match index {
                Some(i) => doc.user_preferences[i] = prefs.clone(),
                None => doc.user_preferences.push(prefs.clone()),
            }
            Ok(prefs)
        })
    }

    fn get_user_preferences(&self, user_id: i64) -> Result<UserPreferences> {
        self.read(|doc| {
            doc.user_preferences
                .iter()
                .find(|p| p.user_id == user_id)
                .cloned()
                .unwrap_or_else(|| UserPreferences::defaults_for(user_id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open() -> (TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("database.json"));
        store.init().unwrap();
        (dir, store)
    }

    #[test]
    fn init_writes_empty_document() {
        let (_dir, store) = open();
        let text = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        for key in [
            "users",
            "user_profiles",
            "security_questions",
            "messages",
            "quiz_results",
            "online_users",
            "calculation_history",
            "user_preferences",
        ] {
            assert_eq!(value[key], serde_json::json!([]), "{} should be empty", key);
        }
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("absent.json"));
        assert!(store.get_all_users().unwrap().is_empty());
        assert_eq!(
            store.get_user_preferences(1).unwrap(),
            UserPreferences::defaults_for(1)
        );
    }

    #[test]
    fn history_is_newest_first() {
        let (_dir, store) = open();
        let calc = |kind: &str, input: &str| NewCalculation {
            kind: kind.into(),
            input: input.into(),
            result: "r".into(),
            description: String::new(),
        };
        store.save_calculation(1, &calc("world-size", "3")).unwrap();
        store.save_calculation(1, &calc("prime", "7")).unwrap();

        let history = store.get_calculation_history(1, 50).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, "prime");
        assert_eq!(history[0].input, "7");
        assert_eq!(history[0].result, "r");
        assert!(history[0].id > history[1].id);
    }

    #[test]
    fn ids_follow_max_plus_one() {
        let (_dir, store) = open();
        let first = store
            .create_user(&NewUser {
                email: "a@x".into(),
                password: "p".into(),
                name: "A".into(),
            })
            .unwrap();
        let second = store
            .create_user(&NewUser {
                email: "b@x".into(),
                password: "p".into(),
                name: "B".into(),
            })
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let dup = store.create_user(&NewUser {
            email: "a@x".into(),
            password: "p".into(),
            name: "A2".into(),
        });
        assert!(dup.is_err());
    }

    #[test]
    fn preferences_merge_over_existing() {
        let (_dir, store) = open();
        store
            .save_user_preferences(
                2,
                &PreferencesUpdate {
                    language: Some("fr".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let prefs = store
            .save_user_preferences(
                2,
                &PreferencesUpdate {
                    auto_save: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(prefs.language, "fr");
        assert_eq!(prefs.theme, "light");
        assert!(!prefs.auto_save);

        let text = std::fs::read_to_string(store.path()).unwrap();
        let doc: Document = serde_json::from_str(&text).unwrap();
        assert_eq!(doc.user_preferences.len(), 1);
    }

    #[test]
    fn online_users_are_a_set() {
        let (_dir, store) = open();
        store.add_online_user(3).unwrap();
        store.add_online_user(3).unwrap();
        store.add_online_user(4).unwrap();
        store.remove_online_user(3).unwrap();
        assert_eq!(store.get_online_users().unwrap(), vec![4]);
    }
}
