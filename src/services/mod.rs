pub mod password;
pub use password::PasswordService;

pub mod throttle;
pub use throttle::LoginThrottle;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{AccountError, AccountPage, AccountService, ProfileUpdate};
pub use account_service_impl::DefaultAccountService;

pub mod desktop_auth_service;
pub mod desktop_auth_service_impl;
pub use desktop_auth_service::{AuthDecision, DesktopAuthError, DesktopAuthService, Rejection};
pub use desktop_auth_service_impl::DefaultDesktopAuthService;

pub mod key_service;
pub mod key_service_impl;
pub use key_service::{GenerateKeys, KeyError, KeyService};
pub use key_service_impl::DefaultKeyService;

#[cfg(test)]
pub mod memory_store;
