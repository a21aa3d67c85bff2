use crate::Database;
use crate::models::{
    NewCalculation, NewMessage, NewQuizResult, NewSecurityQuestions, NewUser, NewUserProfile,
    PreferencesUpdate, ProfileUpdate, UserUpdate,
};
use crate::store::Store;
use anyhow::Result;
use modal_types::models::{
    CalculationRecord, Message, QuizResult, SecurityQuestions, User, UserPreferences, UserProfile,
    timestamp_now,
};
use rusqlite::{Connection, Row, params};

const USER_COLUMNS: &str = "id, email, password, name, created_at, updated_at";
const PROFILE_COLUMNS: &str = "id, user_id, bio, avatar_url, join_date";
const QUESTION_COLUMNS: &str =
    "id, user_id, question1, answer1, question2, answer2, question3, answer3, created_at";
const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, created_at";
const QUIZ_COLUMNS: &str = "id, user_id, score, total_questions, answers, created_at";
const CALCULATION_COLUMNS: &str = "id, user_id, type, input, result, description, created_at";
const PREFERENCE_COLUMNS: &str = "user_id, theme, language, notifications, auto_save, updated_at";

impl Store for Database {
    // -- Users --

    fn create_user(&self, user: &NewUser) -> Result<User> {
        self.with_conn(|conn| {
            let now = timestamp_now();
            conn.execute(
                "INSERT INTO users (email, password, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![user.email, user.password, user.name, now],
            )?;
            Ok(User {
                id: conn.last_insert_rowid(),
                email: user.email.clone(),
                password: user.password.clone(),
                name: user.name.clone(),
                created_at: now.clone(),
                updated_at: now,
            })
        })
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
            conn.query_row(&sql, [email], user_from_row).optional()
        })
    }

    fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET
                    email = COALESCE(?1, email),
                    password = COALESCE(?2, password),
                    name = COALESCE(?3, name),
                    updated_at = ?4
                 WHERE id = ?5",
                params![update.email, update.password, update.name, timestamp_now(), id],
            )?;
            query_user_by_id(conn, id)
        })
    }

    fn get_all_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Profiles --

    fn create_user_profile(&self, profile: &NewUserProfile) -> Result<UserProfile> {
        self.with_conn(|conn| {
            let now = timestamp_now();
            conn.execute(
                "INSERT INTO user_profiles (user_id, bio, avatar_url, join_date)
                 VALUES (?1, ?2, ?3, ?4)",
                params![profile.user_id, profile.bio, profile.avatar_url, now],
            )?;
            Ok(UserProfile {
                id: conn.last_insert_rowid(),
                user_id: profile.user_id,
                bio: profile.bio.clone(),
                avatar_url: profile.avatar_url.clone(),
                join_date: now,
            })
        })
    }

    fn get_user_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        self.with_conn(|conn| query_profile(conn, user_id))
    }

    fn update_user_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE user_profiles SET
                    bio = COALESCE(?1, bio),
                    avatar_url = COALESCE(?2, avatar_url)
                 WHERE user_id = ?3",
                params![update.bio, update.avatar_url, user_id],
            )?;
            query_profile(conn, user_id)
        })
    }

    // -- Security questions --

    fn create_security_questions(
        &self,
        user_id: i64,
        q: &NewSecurityQuestions,
    ) -> Result<SecurityQuestions> {
        self.with_conn(|conn| {
            let now = timestamp_now();
            conn.execute(
                "INSERT INTO security_questions
                    (user_id, question1, answer1, question2, answer2, question3, answer3, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user_id,
                    q.question1,
                    q.answer1,
                    q.question2,
                    q.answer2,
                    q.question3,
                    q.answer3,
                    now
                ],
            )?;
            Ok(SecurityQuestions {
                id: conn.last_insert_rowid(),
                user_id,
                question1: q.question1.clone(),
                answer1: q.answer1.clone(),
                question2: q.question2.clone(),
                answer2: q.answer2.clone(),
                question3: q.question3.clone(),
                answer3: q.answer3.clone(),
                created_at: now,
            })
        })
    }

    fn get_security_questions(&self, user_id: i64) -> Result<Option<SecurityQuestions>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM security_questions WHERE user_id = ?1 ORDER BY id LIMIT 1",
                QUESTION_COLUMNS
            );
            conn.query_row(&sql, [user_id], |row| {
                Ok(SecurityQuestions {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    question1: text_or_empty(row, 2)?,
                    answer1: text_or_empty(row, 3)?,
                    question2: text_or_empty(row, 4)?,
                    answer2: text_or_empty(row, 5)?,
                    question3: text_or_empty(row, 6)?,
                    answer3: text_or_empty(row, 7)?,
                    created_at: row.get(8)?,
                })
            })
            .optional()
        })
    }

    // -- Messages --

    fn create_message(&self, message: &NewMessage) -> Result<Message> {
        self.with_conn(|conn| {
            let now = timestamp_now();
            conn.execute(
                "INSERT INTO messages (sender_id, receiver_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![message.sender_id, message.receiver_id, message.content, now],
            )?;
            Ok(Message {
                id: conn.last_insert_rowid(),
                sender_id: message.sender_id,
                receiver_id: message.receiver_id,
                content: message.content.clone(),
                created_at: now,
            })
        })
    }

    fn get_messages(&self, a: i64, b: i64) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM messages
                 WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)
                 ORDER BY created_at ASC, id ASC",
                MESSAGE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![a, b], |row| {
                    Ok(Message {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        receiver_id: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Quiz results --

    fn create_quiz_result(&self, result: &NewQuizResult) -> Result<QuizResult> {
        let answers = serde_json::to_string(&result.answers)?;
        self.with_conn(|conn| {
            let now = timestamp_now();
            conn.execute(
                "INSERT INTO quiz_results (user_id, score, total_questions, answers, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![result.user_id, result.score, result.total_questions, answers, now],
            )?;
            Ok(QuizResult {
                id: conn.last_insert_rowid(),
                user_id: result.user_id,
                score: result.score,
                total_questions: result.total_questions,
                answers: result.answers.clone(),
                created_at: now,
            })
        })
    }

    fn get_quiz_results(&self, user_id: i64) -> Result<Vec<QuizResult>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM quiz_results WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
                QUIZ_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], |row| {
                    let answers: Option<String> = row.get(4)?;
                    Ok(QuizResult {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        score: row.get(2)?,
                        total_questions: row.get(3)?,
                        answers: parse_answers(answers),
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Online users --

    fn add_online_user(&self, user_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO online_users (user_id, last_seen) VALUES (?1, ?2)",
                params![user_id, timestamp_now()],
            )?;
            Ok(())
        })
    }

    fn remove_online_user(&self, user_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM online_users WHERE user_id = ?1", [user_id])?;
            Ok(())
        })
    }

    fn get_online_users(&self) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT user_id FROM online_users ORDER BY user_id")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
    }

    // -- Calculation history --

    fn save_calculation(
        &self,
        user_id: i64,
        calculation: &NewCalculation,
    ) -> Result<CalculationRecord> {
        self.with_conn(|conn| {
            let now = timestamp_now();
            conn.execute(
                "INSERT INTO calculation_history (user_id, type, input, result, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user_id,
                    calculation.kind,
                    calculation.input,
                    calculation.result,
                    calculation.description,
                    now
                ],
            )?;
            Ok(CalculationRecord {
                id: conn.last_insert_rowid(),
                user_id,
                kind: calculation.kind.clone(),
                input: calculation.input.clone(),
                result: calculation.result.clone(),
                description: calculation.description.clone(),
                created_at: now,
            })
        })
    }

    fn get_calculation_history(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<CalculationRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM calculation_history
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
                CALCULATION_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![user_id, limit], |row| {
                    Ok(CalculationRecord {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        kind: row.get(2)?,
                        input: row.get(3)?,
                        result: row.get(4)?,
                        description: text_or_empty(row, 5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn delete_calculation(&self, id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM calculation_history WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Preferences --

    fn save_user_preferences(
        &self,
        user_id: i64,
        update: &PreferencesUpdate,
    ) -> Result<UserPreferences> {
        self.with_conn(|conn| {
            let mut prefs = query_preferences(conn, user_id)?
                .unwrap_or_else(|| UserPreferences::defaults_for(user_id));
            update.apply_to(&mut prefs);
            let now = timestamp_now();

            conn.execute(
                "INSERT INTO user_preferences
                    (user_id, theme, language, notifications, auto_save, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                    theme = excluded.theme,
                    language = excluded.language,
                    notifications = excluded.notifications,
                    auto_save = excluded.auto_save,
                    updated_at = excluded.updated_at",
                params![
                    user_id,
                    prefs.theme,
                    prefs.language,
                    prefs.notifications,
                    prefs.auto_save,
                    now
                ],
            )?;

            prefs.updated_at = Some(now);
            Ok(prefs)
        })
    }

    fn get_user_preferences(&self, user_id: i64) -> Result<UserPreferences> {
        self.with_conn(|conn| {
            Ok(query_preferences(conn, user_id)?
                .unwrap_or_else(|| UserPreferences::defaults_for(user_id)))
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        name: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    conn.query_row(&sql, [id], user_from_row).optional()
}

fn query_profile(conn: &Connection, user_id: i64) -> Result<Option<UserProfile>> {
    let sql = format!(
        "SELECT {} FROM user_profiles WHERE user_id = ?1 ORDER BY id LIMIT 1",
        PROFILE_COLUMNS
    );
    conn.query_row(&sql, [user_id], |row| {
        Ok(UserProfile {
            id: row.get(0)?,
            user_id: row.get(1)?,
            bio: text_or_empty(row, 2)?,
            avatar_url: text_or_empty(row, 3)?,
            join_date: row.get(4)?,
        })
    })
    .optional()
}

fn query_preferences(conn: &Connection, user_id: i64) -> Result<Option<UserPreferences>> {
    let sql = format!(
        "SELECT {} FROM user_preferences WHERE user_id = ?1",
        PREFERENCE_COLUMNS
    );
    conn.query_row(&sql, [user_id], |row| {
        Ok(UserPreferences {
            user_id: row.get(0)?,
            theme: row.get(1)?,
            language: row.get(2)?,
            notifications: row.get(3)?,
            auto_save: row.get(4)?,
            updated_at: row.get(5)?,
        })
    })
    .optional()
}

fn text_or_empty(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

/// Rows written by older clients may hold non-JSON text; keep it as a string.
fn parse_answers(raw: Option<String>) -> serde_json::Value {
    match raw {
        None => serde_json::Value::Null,
        Some(text) => serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)),
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn open() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.sqlite")).unwrap();
        (dir, db)
    }

    fn calc(kind: &str, input: &str, result: &str) -> NewCalculation {
        NewCalculation {
            kind: kind.into(),
            input: input.into(),
            result: result.into(),
            description: String::new(),
        }
    }

    #[test]
    fn user_round_trip_and_update() {
        let (_dir, db) = open();
        let user = db
            .create_user(&NewUser {
                email: "a@example.com".into(),
                password: "hash".into(),
                name: "Ann".into(),
            })
            .unwrap();

        let found = db.get_user_by_email("a@example.com").unwrap().unwrap();
        assert_eq!(found, user);

        let updated = db
            .update_user(
                user.id,
                &UserUpdate {
                    name: Some("Anna".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Anna");
        assert_eq!(updated.email, "a@example.com");

        assert!(db.update_user(999, &UserUpdate::default()).unwrap().is_none());
        assert_eq!(db.get_all_users().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (_dir, db) = open();
        let user = NewUser {
            email: "dup@example.com".into(),
            password: "x".into(),
            name: "D".into(),
        };
        db.create_user(&user).unwrap();
        assert!(db.create_user(&user).is_err());
    }

    #[test]
    fn history_is_newest_first() {
        let (_dir, db) = open();
        db.save_calculation(1, &calc("world-size", "3", "0.333")).unwrap();
        db.save_calculation(1, &calc("prime", "7", "true")).unwrap();
        db.save_calculation(2, &calc("prime", "9", "false")).unwrap();

        let history = db.get_calculation_history(1, 50).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, "prime");
        assert_eq!(history[0].input, "7");
        assert_eq!(history[0].result, "true");
        assert_eq!(history[1].kind, "world-size");

        assert_eq!(db.get_calculation_history(1, 1).unwrap().len(), 1);
    }

    #[test]
    fn delete_only_own_calculation() {
        let (_dir, db) = open();
        let record = db.save_calculation(1, &calc("prime", "7", "true")).unwrap();

        assert!(!db.delete_calculation(record.id, 2).unwrap());
        assert!(db.delete_calculation(record.id, 1).unwrap());
        assert!(!db.delete_calculation(record.id, 1).unwrap());
    }

    #[test]
    fn preferences_default_then_merge() {
        let (_dir, db) = open();
        let prefs = db.get_user_preferences(5).unwrap();
        assert_eq!(prefs, UserPreferences::defaults_for(5));

        db.save_user_preferences(
            5,
            &PreferencesUpdate {
                theme: Some("dark".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let saved = db
            .save_user_preferences(
                5,
                &PreferencesUpdate {
                    notifications: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(saved.theme, "dark");
        assert!(!saved.notifications);
        assert!(saved.updated_at.is_some());

        let stored = db.get_user_preferences(5).unwrap();
        assert_eq!(stored, saved);
    }

    #[test]
    fn conversation_covers_both_directions() {
        let (_dir, db) = open();
        let send = |from, to, content: &str| {
            db.create_message(&NewMessage {
                sender_id: from,
                receiver_id: to,
                content: content.into(),
            })
            .unwrap()
        };
        send(1, 2, "first");
        send(2, 1, "second");
        send(1, 3, "elsewhere");

        let messages = db.get_messages(2, 1).unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn quiz_answers_survive_storage() {
        let (_dir, db) = open();
        db.create_quiz_result(&NewQuizResult {
            user_id: 4,
            score: 3,
            total_questions: 5,
            answers: json!(["a", "c", "b"]),
        })
        .unwrap();

        let results = db.get_quiz_results(4).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].answers, json!(["a", "c", "b"]));
    }

    #[test]
    fn online_set_and_profile() {
        let (_dir, db) = open();
        db.add_online_user(7).unwrap();
        db.add_online_user(7).unwrap();
        db.add_online_user(8).unwrap();
        db.remove_online_user(8).unwrap();
        assert_eq!(db.get_online_users().unwrap(), vec![7]);

        db.create_user_profile(&NewUserProfile {
            user_id: 7,
            bio: "hi".into(),
            avatar_url: String::new(),
        })
        .unwrap();
        let profile = db
            .update_user_profile(
                7,
                &ProfileUpdate {
                    avatar_url: Some("/a.png".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(profile.bio, "hi");
        assert_eq!(profile.avatar_url, "/a.png");
    }
}
