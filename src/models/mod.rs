pub mod access_key;
pub mod account;

pub use access_key::{AccessKey, AccessKeyChanges, NewAccessKey};
pub use account::{Account, AccountChanges, AccountStats, NewAccount};
