//! Key generation command handler

use crate::config::Config;
use crate::services::GenerateKeys;
use crate::state::SharedState;

pub async fn cmd_generate_keys(
    config: Config,
    quantity: u32,
    days: u32,
    prefix: Option<String>,
    notes: Option<String>,
) -> anyhow::Result<()> {
    let state = SharedState::connect(config).await?;

    let keys = state
        .key_service
        .generate(GenerateKeys {
            quantity,
            expiration_days: days,
            prefix,
            notes,
        })
        .await?;

    for key in &keys {
        match key.expires_at {
            Some(expires_at) => {
                println!("{}  (expires {})", key.key_value, expires_at.format("%Y-%m-%d"));
            }
            None => println!("{}", key.key_value),
        }
    }

    println!();
    println!("✓ Generated {} key(s)", keys.len());
    Ok(())
}
