use anyhow::Result;
use modal_types::models::{
    CalculationRecord, Message, QuizResult, SecurityQuestions, User, UserPreferences, UserProfile,
};

use crate::models::{
    NewCalculation, NewMessage, NewQuizResult, NewSecurityQuestions, NewUser, NewUserProfile,
    PreferencesUpdate, ProfileUpdate, UserUpdate,
};

/// Persistence operations shared by the SQLite and JSON backends.
///
/// Every method is a self-contained read-modify-write; nothing spans calls.
/// All methods block, so async callers go through `spawn_blocking`.
pub trait Store: Send + Sync {
    // -- Users --

    fn create_user(&self, user: &NewUser) -> Result<User>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    /// Returns the updated user, or `None` if no user has this id.
    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>>;
    fn get_all_users(&self) -> Result<Vec<User>>;

    // -- Profiles --

    fn create_user_profile(&self, profile: &NewUserProfile) -> Result<UserProfile>;
    fn get_user_profile(&self, user_id: i64) -> Result<Option<UserProfile>>;
    fn update_user_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>>;

    // -- Security questions --

    fn create_security_questions(
        &self,
        user_id: i64,
        questions: &NewSecurityQuestions,
    ) -> Result<SecurityQuestions>;
    fn get_security_questions(&self, user_id: i64) -> Result<Option<SecurityQuestions>>;

    // -- Messages --

    fn create_message(&self, message: &NewMessage) -> Result<Message>;
    /// Both directions of the conversation between `a` and `b`, oldest first.
    fn get_messages(&self, a: i64, b: i64) -> Result<Vec<Message>>;

    // -- Quiz results --

    fn create_quiz_result(&self, result: &NewQuizResult) -> Result<QuizResult>;
    /// Newest first.
    fn get_quiz_results(&self, user_id: i64) -> Result<Vec<QuizResult>>;

    // -- Online users --

    fn add_online_user(&self, user_id: i64) -> Result<()>;
    fn remove_online_user(&self, user_id: i64) -> Result<()>;
    fn get_online_users(&self) -> Result<Vec<i64>>;

    // -- Calculation history --

    fn save_calculation(
        &self,
        user_id: i64,
        calculation: &NewCalculation,
    ) -> Result<CalculationRecord>;
    /// Newest first, ties broken by id, at most `limit` records.
    fn get_calculation_history(&self, user_id: i64, limit: usize)
    -> Result<Vec<CalculationRecord>>;
    /// True if a record with this id belonging to `user_id` was removed.
    fn delete_calculation(&self, id: i64, user_id: i64) -> Result<bool>;

    // -- Preferences --

    /// Merge `update` over the stored record (or the defaults) and persist.
    fn save_user_preferences(
        &self,
        user_id: i64,
        update: &PreferencesUpdate,
    ) -> Result<UserPreferences>;
    /// Stored record, or the defaults when none exists.
    fn get_user_preferences(&self, user_id: i64) -> Result<UserPreferences>;
}
