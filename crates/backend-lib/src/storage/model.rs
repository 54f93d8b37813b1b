// ============================
// crates/backend-lib/src/storage/model.rs
// ============================
//! User record and the typed filter / update builders used against the store.
use std::fmt;

use account_auth_common::{UserId, UserView};

use super::StoreError;
use crate::auth::HashedPassword;

/// One stored account
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub hashed_password: HashedPassword,
    pub session_id: Option<String>,
    pub reset_token: Option<String>,
    /// Unix seconds at which `session_id` was issued
    pub session_created_at: Option<i64>,
}

impl User {
    /// Value currently held in `field`
    pub fn value_of(&self, field: UserField) -> FieldValue {
        match field {
            UserField::Id => FieldValue::Integer(self.id),
            UserField::Email => FieldValue::Text(self.email.clone()),
            UserField::HashedPassword => FieldValue::Text(self.hashed_password.as_str().to_string()),
            UserField::SessionId => FieldValue::from(self.session_id.clone()),
            UserField::ResetToken => FieldValue::from(self.reset_token.clone()),
            UserField::SessionCreatedAt => self
                .session_created_at
                .map_or(FieldValue::Null, FieldValue::Integer),
        }
    }

    /// Public view, without credentials or session state
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            email: self.email.clone(),
        }
    }

    pub(crate) fn apply(&mut self, update: &UserUpdate) {
        for (field, value) in update.assignments() {
            match (field, value) {
                (UserField::HashedPassword, FieldValue::Text(hash)) => {
                    self.hashed_password = HashedPassword::from(hash.clone());
                },
                (UserField::SessionId, value) => self.session_id = value.as_text().map(str::to_string),
                (UserField::ResetToken, value) => self.reset_token = value.as_text().map(str::to_string),
                (UserField::SessionCreatedAt, value) => self.session_created_at = value.as_integer(),
                // `UserUpdate` never carries the remaining combinations
                _ => {},
            }
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("has_session", &self.session_id.is_some())
            .finish_non_exhaustive()
    }
}

/// Attributes of a [`User`] that can appear in filters and updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    Id,
    Email,
    HashedPassword,
    SessionId,
    ResetToken,
    SessionCreatedAt,
}

impl UserField {
    pub const ALL: [UserField; 6] = [
        UserField::Id,
        UserField::Email,
        UserField::HashedPassword,
        UserField::SessionId,
        UserField::ResetToken,
        UserField::SessionCreatedAt,
    ];

    /// Column name in the `users` table
    pub fn column(self) -> &'static str {
        match self {
            UserField::Id => "id",
            UserField::Email => "email",
            UserField::HashedPassword => "hashed_password",
            UserField::SessionId => "session_id",
            UserField::ResetToken => "reset_token",
            UserField::SessionCreatedAt => "session_created_at",
        }
    }

    /// Look up a field by its column name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == name)
    }

    fn kind(self) -> ValueKind {
        match self {
            UserField::Id => ValueKind::Integer { nullable: false },
            UserField::SessionCreatedAt => ValueKind::Integer { nullable: true },
            UserField::Email | UserField::HashedPassword => ValueKind::Text { nullable: false },
            UserField::SessionId | UserField::ResetToken => ValueKind::Text { nullable: true },
        }
    }

    fn accepts(self, value: &FieldValue) -> bool {
        match (self.kind(), value) {
            (ValueKind::Integer { .. }, FieldValue::Integer(_)) => true,
            (ValueKind::Text { .. }, FieldValue::Text(_)) => true,
            (ValueKind::Integer { nullable } | ValueKind::Text { nullable }, FieldValue::Null) => nullable,
            _ => false,
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Clone, Copy)]
enum ValueKind {
    Integer { nullable: bool },
    Text { nullable: bool },
}

/// A value bound to a [`UserField`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Text)
    }
}

/// Conjunction of field equalities
///
/// Matching is tuple membership: a user matches when the tuple of its
/// values for the filtered fields equals the tuple of filter values.
/// A null filter value never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    terms: Vec<(UserField, FieldValue)>,
}

impl UserFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: UserId) -> Self {
        Self::new().id(id)
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self::new().email(email)
    }

    pub fn by_session_id(session_id: impl Into<String>) -> Self {
        Self::new().session_id(session_id)
    }

    pub fn id(mut self, id: UserId) -> Self {
        self.terms.push((UserField::Id, FieldValue::Integer(id)));
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.terms.push((UserField::Email, FieldValue::Text(email.into())));
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.terms.push((UserField::SessionId, FieldValue::Text(session_id.into())));
        self
    }

    pub fn reset_token(mut self, reset_token: impl Into<String>) -> Self {
        self.terms.push((UserField::ResetToken, FieldValue::Text(reset_token.into())));
        self
    }

    /// Build a filter from column names, rejecting unknown names and
    /// values of the wrong kind.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (&'a str, FieldValue)>,
    {
        let mut terms = Vec::new();
        for (name, value) in pairs {
            let field = UserField::parse(name)
                .ok_or_else(|| StoreError::InvalidFilter(format!("unknown field `{name}`")))?;
            if !matches!(value, FieldValue::Null) && !field.accepts(&value) {
                return Err(StoreError::InvalidFilter(format!("wrong value type for `{name}`")));
            }
            terms.push((field, value));
        }
        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[(UserField, FieldValue)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Reject filters that cannot be evaluated
    pub fn ensure_valid(&self) -> Result<(), StoreError> {
        if self.terms.is_empty() {
            return Err(StoreError::InvalidFilter("empty filter".to_string()));
        }
        Ok(())
    }

    pub fn matches(&self, user: &User) -> bool {
        self.terms.iter().all(|(field, value)| {
            !matches!(value, FieldValue::Null) && user.value_of(*field) == *value
        })
    }
}

/// Partial update of a user record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    assignments: Vec<(UserField, FieldValue)>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hashed_password(mut self, hash: &HashedPassword) -> Self {
        self.set(UserField::HashedPassword, FieldValue::Text(hash.as_str().to_string()));
        self
    }

    pub fn session_id(mut self, session_id: Option<String>) -> Self {
        self.set(UserField::SessionId, session_id.into());
        self
    }

    pub fn reset_token(mut self, reset_token: Option<String>) -> Self {
        self.set(UserField::ResetToken, reset_token.into());
        self
    }

    pub fn session_created_at(mut self, at: Option<i64>) -> Self {
        self.set(UserField::SessionCreatedAt, at.map_or(FieldValue::Null, FieldValue::Integer));
        self
    }

    /// Build an update from column names.
    ///
    /// `id` and `email` are immutable and rejected along with unknown names
    /// and values of the wrong kind.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (&'a str, FieldValue)>,
    {
        let mut update = Self::new();
        for (name, value) in pairs {
            let field = UserField::parse(name)
                .ok_or_else(|| StoreError::InvalidAttribute(format!("unknown field `{name}`")))?;
            if matches!(field, UserField::Id | UserField::Email) {
                return Err(StoreError::InvalidAttribute(format!("`{name}` is immutable")));
            }
            if !field.accepts(&value) {
                return Err(StoreError::InvalidAttribute(format!("wrong value type for `{name}`")));
            }
            update.set(field, value);
        }
        Ok(update)
    }

    pub fn assignments(&self) -> &[(UserField, FieldValue)] {
        &self.assignments
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    // Later assignments to the same field replace earlier ones.
    fn set(&mut self, field: UserField, value: FieldValue) {
        match self.assignments.iter_mut().find(|(existing, _)| *existing == field) {
            Some(slot) => slot.1 = value,
            None => self.assignments.push((field, value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            email: "a@b.com".to_string(),
            hashed_password: HashedPassword::from("$scrypt$fake".to_string()),
            session_id: Some("abc".to_string()),
            reset_token: None,
            session_created_at: None,
        }
    }

    #[test]
    fn test_field_parse_roundtrips_columns() {
        for field in UserField::ALL {
            assert_eq!(UserField::parse(field.column()), Some(field));
        }
        assert_eq!(UserField::parse("password"), None);
    }

    #[test]
    fn test_filter_from_pairs_rejects_unknown_field() {
        let err = UserFilter::from_pairs([("nickname", FieldValue::from("bob"))]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));
    }

    #[test]
    fn test_filter_from_pairs_rejects_wrong_kind() {
        let err = UserFilter::from_pairs([("id", FieldValue::from("7"))]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));
    }

    #[test]
    fn test_filter_is_conjunctive() {
        let user = sample_user();
        assert!(UserFilter::by_email("a@b.com").matches(&user));
        assert!(UserFilter::by_email("a@b.com").session_id("abc").matches(&user));
        assert!(!UserFilter::by_email("a@b.com").session_id("xyz").matches(&user));
        assert!(!UserFilter::by_id(8).matches(&user));
    }

    #[test]
    fn test_null_filter_value_never_matches() {
        let mut user = sample_user();
        user.session_id = None;
        let filter = UserFilter::from_pairs([("session_id", FieldValue::Null)]).unwrap();
        assert!(!filter.matches(&user));
    }

    #[test]
    fn test_empty_filter_is_invalid() {
        assert!(matches!(
            UserFilter::new().ensure_valid(),
            Err(StoreError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_update_rejects_unknown_and_immutable_fields() {
        let unknown = UserUpdate::from_pairs([("nickname", FieldValue::from("x"))]).unwrap_err();
        assert!(matches!(unknown, StoreError::InvalidAttribute(_)));

        let email = UserUpdate::from_pairs([("email", FieldValue::from("x@y.z"))]).unwrap_err();
        assert!(matches!(email, StoreError::InvalidAttribute(_)));

        let id = UserUpdate::from_pairs([("id", FieldValue::from(3))]).unwrap_err();
        assert!(matches!(id, StoreError::InvalidAttribute(_)));

        let null_hash = UserUpdate::from_pairs([("hashed_password", FieldValue::Null)]).unwrap_err();
        assert!(matches!(null_hash, StoreError::InvalidAttribute(_)));
    }

    #[test]
    fn test_update_apply_is_partial() {
        let mut user = sample_user();
        let update = UserUpdate::new()
            .session_id(None)
            .reset_token(Some("r".to_string()));
        user.apply(&update);
        assert_eq!(user.session_id, None);
        assert_eq!(user.reset_token.as_deref(), Some("r"));
        assert_eq!(user.email, "a@b.com");
    }

    #[test]
    fn test_update_last_assignment_wins() {
        let update = UserUpdate::new()
            .session_id(Some("one".to_string()))
            .session_id(Some("two".to_string()));
        assert_eq!(update.assignments().len(), 1);
        assert_eq!(update.assignments()[0].1, FieldValue::from("two"));
    }

    #[test]
    fn test_user_debug_hides_credentials() {
        let printed = format!("{:?}", sample_user());
        assert!(!printed.contains("scrypt"));
        assert!(!printed.contains("abc"));
    }
}
