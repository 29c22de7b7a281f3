mod accounts;
mod keys;

pub use accounts::{cmd_block, cmd_create_admin, cmd_stats, cmd_users};
pub use keys::cmd_generate_keys;
