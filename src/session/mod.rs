//! Local accounts and sign-in state.

pub mod state;
pub mod store;

pub use state::{new_user_id, AccountError, AppState, ProfileUpdate, Registration};
pub use store::{JsonFileStore, SessionStore};
