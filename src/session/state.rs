//! Account and sign-in state.
//!
//! [`AppState`] is a plain value: every operation takes the current state
//! and returns the outcome, leaving persistence to the caller.

use crate::models::User;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Fixed id of the guest profile.
pub const GUEST_ID: &str = "guest";

/// Errors from account operations. The display text is shown to the user.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Please fill in all required fields.")]
    MissingFields,

    #[error("An account with this email already exists.")]
    EmailTaken,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("You are not signed in.")]
    NotSignedIn,

    #[error("No stored account with id '{0}'.")]
    UnknownUser(String),
}

/// Details collected when creating an account.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub mobile: String,
}

/// Editable profile fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub mobile: Option<String>,
}

/// Registered users plus whoever is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub current_user: Option<User>,
}

impl AppState {
    pub fn is_signed_in(&self) -> bool {
        self.current_user.is_some()
    }

    /// The signed-in user, or [`AccountError::NotSignedIn`].
    pub fn require_user(&self) -> Result<&User, AccountError> {
        self.current_user.as_ref().ok_or(AccountError::NotSignedIn)
    }

    /// Create an account and sign it in.
    pub fn register(&mut self, registration: Registration, id: String) -> Result<&User, AccountError> {
        let name = registration.name.trim();
        let email = registration.email.trim();

        if name.is_empty() || email.is_empty() || registration.password.is_empty() {
            return Err(AccountError::MissingFields);
        }

        if self.users.iter().any(|u| u.email == email) {
            return Err(AccountError::EmailTaken);
        }

        let user = User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password: Some(registration.password),
            mobile: registration.mobile.trim().to_string(),
            profile_pic_url: avatar_url(name),
        };

        info!("Registered account {} ({})", user.id, user.email);

        self.users.push(user.clone());
        Ok(self.current_user.insert(user))
    }

    /// Sign in with email and password.
    pub fn login(&mut self, email: &str, password: &str) -> Result<&User, AccountError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AccountError::MissingFields);
        }

        let user = self
            .users
            .iter()
            .find(|u| u.email == email.trim() && u.password.as_deref() == Some(password))
            .cloned()
            .ok_or(AccountError::InvalidCredentials)?;

        info!("Signed in as {}", user.email);
        Ok(self.current_user.insert(user))
    }

    /// Sign in as the shared guest profile.
    pub fn guest_login(&mut self) -> &User {
        info!("Signed in as guest");
        self.current_user.insert(User {
            id: GUEST_ID.to_string(),
            name: "Guest User".to_string(),
            email: "guest@spendai.com".to_string(),
            password: None,
            mobile: String::new(),
            profile_pic_url: avatar_url("Guest"),
        })
    }

    /// Sign out. Returns the user who was signed in.
    pub fn logout(&mut self) -> Option<User> {
        let previous = self.current_user.take();
        if let Some(ref user) = previous {
            info!("Signed out {}", user.email);
        }
        previous
    }

    /// Change name and mobile of the signed-in user.
    ///
    /// The email address cannot be changed.
    pub fn update_profile(&mut self, update: ProfileUpdate) -> Result<&User, AccountError> {
        let mut user = self.require_user()?.clone();

        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AccountError::MissingFields);
            }
            user.name = name.to_string();
        }
        if let Some(mobile) = update.mobile {
            user.mobile = mobile.trim().to_string();
        }

        self.replace_current(user)
    }

    /// Change the profile picture of the signed-in user.
    pub fn update_profile_picture(&mut self, url: &str) -> Result<&User, AccountError> {
        let mut user = self.require_user()?.clone();
        user.profile_pic_url = url.trim().to_string();
        self.replace_current(user)
    }

    /// Write the edited user to both the current slot and the user list.
    fn replace_current(&mut self, user: User) -> Result<&User, AccountError> {
        if let Some(stored) = self.users.iter_mut().find(|u| u.id == user.id) {
            *stored = user.clone();
        } else if !user.is_guest() {
            return Err(AccountError::UnknownUser(user.id));
        }

        info!("Updated profile for {}", user.email);
        Ok(self.current_user.insert(user))
    }
}

/// Default avatar for a display name.
pub fn avatar_url(seed: &str) -> String {
    format!(
        "https://api.dicebear.com/8.x/initials/svg?seed={}",
        seed.replace(' ', "%20")
    )
}

/// Id for a newly registered user.
pub fn new_user_id() -> String {
    format!("user_{}", chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
            mobile: "555-0100".to_string(),
        }
    }

    #[test]
    fn test_register_signs_in() {
        let mut state = AppState::default();
        let user = state
            .register(registration("ada@example.com"), "user_1".to_string())
            .unwrap()
            .clone();

        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(
            user.profile_pic_url,
            "https://api.dicebear.com/8.x/initials/svg?seed=Ada%20Lovelace"
        );
        assert_eq!(state.users.len(), 1);
        assert_eq!(state.current_user, Some(user));
    }

    #[test]
    fn test_register_rejects_duplicates_and_blanks() {
        let mut state = AppState::default();
        state
            .register(registration("ada@example.com"), "user_1".to_string())
            .unwrap();

        assert_eq!(
            state.register(registration("ada@example.com"), "user_2".to_string()),
            Err(AccountError::EmailTaken)
        );

        let blank = Registration {
            password: String::new(),
            ..registration("new@example.com")
        };
        assert_eq!(
            state.register(blank, "user_3".to_string()),
            Err(AccountError::MissingFields)
        );
        assert_eq!(state.users.len(), 1);
    }

    #[test]
    fn test_login_and_logout() {
        let mut state = AppState::default();
        state
            .register(registration("ada@example.com"), "user_1".to_string())
            .unwrap();
        state.logout();
        assert!(!state.is_signed_in());

        assert_eq!(
            state.login("ada@example.com", "wrong"),
            Err(AccountError::InvalidCredentials)
        );
        assert_eq!(state.login("", "secret"), Err(AccountError::MissingFields));

        let user = state.login("ada@example.com", "secret").unwrap();
        assert_eq!(user.id, "user_1");
        assert_eq!(state.logout().map(|u| u.id), Some("user_1".to_string()));
    }

    #[test]
    fn test_guest_login() {
        let mut state = AppState::default();
        let guest = state.guest_login();
        assert!(guest.is_guest());
        assert_eq!(guest.email, "guest@spendai.com");
        assert!(state.users.is_empty());
    }

    #[test]
    fn test_update_profile_changes_stored_user() {
        let mut state = AppState::default();
        state
            .register(registration("ada@example.com"), "user_1".to_string())
            .unwrap();

        state
            .update_profile(ProfileUpdate {
                name: Some("Ada King".to_string()),
                mobile: None,
            })
            .unwrap();

        assert_eq!(state.current_user.as_ref().unwrap().name, "Ada King");
        assert_eq!(state.users[0].name, "Ada King");
        assert_eq!(state.users[0].mobile, "555-0100");
        assert_eq!(state.users[0].email, "ada@example.com");

        state.update_profile_picture("https://example.com/me.png").unwrap();
        assert_eq!(state.users[0].profile_pic_url, "https://example.com/me.png");
    }

    #[test]
    fn test_update_profile_requires_sign_in() {
        let mut state = AppState::default();
        assert_eq!(
            state.update_profile(ProfileUpdate::default()),
            Err(AccountError::NotSignedIn)
        );
    }

    #[test]
    fn test_guest_profile_edits_stay_in_session() {
        let mut state = AppState::default();
        state.guest_login();
        state
            .update_profile(ProfileUpdate {
                name: None,
                mobile: Some("555-0199".to_string()),
            })
            .unwrap();

        assert_eq!(state.current_user.as_ref().unwrap().mobile, "555-0199");
        assert!(state.users.is_empty());
    }
}
