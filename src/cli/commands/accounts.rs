//! Account command handlers

use crate::config::Config;
use crate::db::CredentialStore;
use crate::state::SharedState;

pub async fn cmd_create_admin(
    config: Config,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let state = SharedState::connect(config).await?;
    let admin = state
        .account_service
        .create_admin(username, email, password)
        .await?;

    println!("✓ Administrator '{}' created ({})", admin.username, admin.id);
    Ok(())
}

pub async fn cmd_users(config: Config, page: u64, limit: u64) -> anyhow::Result<()> {
    let state = SharedState::connect(config).await?;
    let result = state.account_service.list(page.max(1), limit.max(1)).await?;

    if result.accounts.is_empty() {
        println!("No accounts on page {page}.");
        return Ok(());
    }

    println!("Accounts (page {}, {} total)", page, result.total);
    println!("{:-<78}", "");

    for account in result.accounts {
        let flags = match (account.is_admin, account.is_blocked) {
            (true, true) => "admin, blocked",
            (true, false) => "admin",
            (false, true) => "blocked",
            (false, false) => "",
        };
        let last_login = account
            .last_login
            .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());

        println!("{} <{}> {}", account.username, account.email, flags);
        println!(
            "  ID: {} | HWID: {} | Last login: {}",
            account.id,
            account.hwid.as_deref().unwrap_or("-"),
            last_login
        );
    }

    Ok(())
}

pub async fn cmd_stats(config: Config) -> anyhow::Result<()> {
    let state = SharedState::connect(config).await?;
    let stats = state.account_service.stats().await?;

    println!("Users:   {} total", stats.total_users);
    println!("         {} active", stats.active_users);
    println!("         {} blocked", stats.blocked_users);
    println!("Keys:    {} total", stats.total_keys);
    Ok(())
}

pub async fn cmd_block(config: Config, username: &str, unblock: bool) -> anyhow::Result<()> {
    let state = SharedState::connect(config).await?;

    let Some(account) = state.store.find_account_by_username(username).await? else {
        println!("No account named '{username}'");
        return Ok(());
    };

    let account = state
        .account_service
        .set_blocked(account.id, !unblock)
        .await?;

    if account.is_blocked {
        println!("✓ '{}' is now blocked", account.username);
    } else {
        println!("✓ '{}' is now active", account.username);
    }
    Ok(())
}
