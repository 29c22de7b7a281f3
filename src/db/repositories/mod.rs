pub mod access_key;
pub mod account;
pub mod login_attempt;
