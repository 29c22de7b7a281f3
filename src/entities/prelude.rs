pub use super::access_keys::Entity as AccessKeys;
pub use super::accounts::Entity as Accounts;
pub use super::login_attempts::Entity as LoginAttempts;
