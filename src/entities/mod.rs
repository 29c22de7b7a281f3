pub mod prelude;

pub mod access_keys;
pub mod accounts;
pub mod login_attempts;
