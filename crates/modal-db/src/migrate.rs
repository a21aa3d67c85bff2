//! One-shot copy of a JSON document into another store.
//!
//! Records are read loosely (only the fields each create call needs) so that
//! documents written by older clients, with float ids or missing timestamps,
//! still migrate. Ids are reassigned by the target store.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::{
    NewCalculation, NewMessage, NewQuizResult, NewSecurityQuestions, NewUser, NewUserProfile,
    PreferencesUpdate,
};
use crate::store::Store;

/// Migrated / failed counts for one entity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    pub migrated: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub users: EntityReport,
    pub user_profiles: EntityReport,
    pub security_questions: EntityReport,
    pub messages: EntityReport,
    pub quiz_results: EntityReport,
    pub calculation_history: EntityReport,
    pub user_preferences: EntityReport,
    /// Where the source document was copied; `None` when there was no source.
    pub backup: Option<PathBuf>,
}

impl MigrationReport {
    pub fn total_migrated(&self) -> usize {
        self.entities().iter().map(|e| e.migrated).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.entities().iter().map(|e| e.failed).sum()
    }

    fn entities(&self) -> [EntityReport; 7] {
        [
            self.users,
            self.user_profiles,
            self.security_questions,
            self.messages,
            self.quiz_results,
            self.calculation_history,
            self.user_preferences,
        ]
    }
}

#[derive(serde::Deserialize, Default)]
struct RawDocument {
    #[serde(default)]
    users: Vec<Value>,
    #[serde(default)]
    user_profiles: Vec<Value>,
    #[serde(default)]
    security_questions: Vec<Value>,
    #[serde(default)]
    messages: Vec<Value>,
    #[serde(default)]
    quiz_results: Vec<Value>,
    #[serde(default)]
    calculation_history: Vec<Value>,
    #[serde(default)]
    user_preferences: Vec<Value>,
}

/// A record plus the `user_id` that the target's create call takes separately.
#[derive(serde::Deserialize)]
struct Owned<T> {
    #[serde(deserialize_with = "crate::models::loose_id")]
    user_id: i64,
    #[serde(flatten)]
    record: T,
}

pub fn migrate_json_to_store(json_path: &Path, target: &dyn Store) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();

    if !json_path.exists() {
        info!(
            "No JSON database at {}, nothing to migrate",
            json_path.display()
        );
        return Ok(report);
    }

    let text = std::fs::read_to_string(json_path)
        .with_context(|| format!("reading {}", json_path.display()))?;
    let doc: RawDocument = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", json_path.display()))?;
    info!("Migrating JSON database from {}", json_path.display());

    report.users = copy_each("users", &doc.users, |u: NewUser| {
        target.create_user(&u).map(drop)
    });
    report.user_profiles = copy_each("user_profiles", &doc.user_profiles, |p: NewUserProfile| {
        target.create_user_profile(&p).map(drop)
    });
    report.security_questions = copy_each(
        "security_questions",
        &doc.security_questions,
        |q: Owned<NewSecurityQuestions>| {
            target
                .create_security_questions(q.user_id, &q.record)
                .map(drop)
        },
    );
    report.messages = copy_each("messages", &doc.messages, |m: NewMessage| {
        target.create_message(&m).map(drop)
    });
    report.quiz_results = copy_each("quiz_results", &doc.quiz_results, |r: NewQuizResult| {
        target.create_quiz_result(&r).map(drop)
    });
    report.calculation_history = copy_each(
        "calculation_history",
        &doc.calculation_history,
        |c: Owned<NewCalculation>| target.save_calculation(c.user_id, &c.record).map(drop),
    );
    report.user_preferences = copy_each(
        "user_preferences",
        &doc.user_preferences,
        |p: Owned<PreferencesUpdate>| {
            target
                .save_user_preferences(p.user_id, &p.record)
                .map(drop)
        },
    );

    let backup = backup_path(json_path);
    std::fs::copy(json_path, &backup)
        .with_context(|| format!("backing up to {}", backup.display()))?;
    info!(
        migrated = report.total_migrated(),
        failed = report.total_failed(),
        "Migration complete, original kept at {}",
        backup.display()
    );
    report.backup = Some(backup);

    Ok(report)
}

fn copy_each<T, F>(entity: &str, records: &[Value], mut create: F) -> EntityReport
where
    T: DeserializeOwned,
    F: FnMut(T) -> Result<()>,
{
    let mut counts = EntityReport::default();
    for (index, raw) in records.iter().enumerate() {
        let outcome = serde_json::from_value::<T>(raw.clone())
            .map_err(anyhow::Error::from)
            .and_then(&mut create);
        match outcome {
            Ok(()) => counts.migrated += 1,
            Err(e) => {
                warn!("Skipping {} record #{}: {}", entity, index, e);
                counts.failed += 1;
            }
        }
    }
    info!(
        "{}: {} migrated, {} failed",
        entity, counts.migrated, counts.failed
    );
    counts
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use serde_json::json;

    #[test]
    fn missing_source_is_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("db.sqlite")).unwrap();

        let report = migrate_json_to_store(&dir.path().join("none.json"), &db).unwrap();
        assert_eq!(report, MigrationReport::default());
    }

    #[test]
    fn moves_every_entity_and_writes_backup() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("database.json");
        let doc = json!({
            "users": [
                { "id": 1700000000000.5, "email": "a@x", "password": "h", "name": "A" },
                { "id": 2, "email": "a@x", "password": "h", "name": "dup" },
                { "id": 3, "name": "no email" }
            ],
            "user_profiles": [{ "user_id": 1, "bio": "b" }],
            "security_questions": [{
                "user_id": 1, "question1": "q1", "answer1": "a1",
                "question2": "q2", "answer2": "a2", "question3": "q3", "answer3": "a3"
            }],
            "messages": [{ "sender_id": 1, "receiver_id": 2, "content": "hello" }],
            "quiz_results": [{ "user_id": 1, "score": 4, "total_questions": 5, "answers": [1, 2] }],
            "online_users": [1],
            "calculation_history": [
                { "user_id": 1, "type": "prime", "input": "7", "result": "true" },
                { "user_id": 1, "type": "world-size", "input": "2", "result": "0.5", "description": "half" }
            ],
            "user_preferences": [{ "user_id": 1, "theme": "dark", "notifications": false }]
        });
        std::fs::write(&json_path, serde_json::to_string(&doc).unwrap()).unwrap();

        let db = Database::open(&dir.path().join("db.sqlite")).unwrap();
        let report = migrate_json_to_store(&json_path, &db).unwrap();

        assert_eq!(report.users, EntityReport { migrated: 1, failed: 2 });
        assert_eq!(report.user_profiles.migrated, 1);
        assert_eq!(report.security_questions.migrated, 1);
        assert_eq!(report.messages.migrated, 1);
        assert_eq!(report.quiz_results.migrated, 1);
        assert_eq!(report.calculation_history.migrated, 2);
        assert_eq!(report.user_preferences.migrated, 1);
        assert_eq!(report.total_failed(), 2);

        let backup = report.backup.unwrap();
        assert!(backup.ends_with("database.json.backup"));
        assert!(backup.exists());

        assert_eq!(db.get_calculation_history(1, 50).unwrap().len(), 2);
        assert_eq!(db.get_messages(1, 2).unwrap()[0].content, "hello");
        assert_eq!(db.get_security_questions(1).unwrap().unwrap().answer3, "a3");

        let prefs = db.get_user_preferences(1).unwrap();
        assert_eq!(prefs.theme, "dark");
        assert!(!prefs.notifications);
        assert!(prefs.auto_save);
    }

    #[test]
    fn float_user_ids_from_old_documents_migrate() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("database.json");
        let doc = json!({
            "messages": [{
                "sender_id": 1700000000000.25,
                "receiver_id": 1700000000001.75,
                "content": "hi"
            }],
            "calculation_history": [
                { "user_id": 1700000000000.25, "type": "prime", "input": "7", "result": "true" }
            ],
            "user_preferences": [{ "user_id": 1700000000000.25, "theme": "dark" }]
        });
        std::fs::write(&json_path, serde_json::to_string(&doc).unwrap()).unwrap();

        let db = Database::open(&dir.path().join("db.sqlite")).unwrap();
        let report = migrate_json_to_store(&json_path, &db).unwrap();
        assert_eq!(report.total_failed(), 0);
        assert_eq!(report.total_migrated(), 3);

        let user = 1_700_000_000_000;
        assert_eq!(db.get_calculation_history(user, 50).unwrap().len(), 1);
        assert_eq!(db.get_messages(user, user + 1).unwrap().len(), 1);
        assert_eq!(db.get_user_preferences(user).unwrap().theme, "dark");
    }
}
