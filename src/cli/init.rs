use super::config::{default_config_path, state_path_for, BallotConfig};
use super::ops::open_service;
use std::path::PathBuf;

/// Write a config file and create the ballot it describes.
///
/// The state file defaults to `ballot.cbor` next to the config. If a state
/// file already exists there, it is reused as-is and keeps its own
/// administrator.
pub async fn execute(
    config_path: Option<String>,
    administrator: String,
    state_path: Option<String>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if administrator.trim().is_empty() {
        return Err("Administrator must not be empty".into());
    }

    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    if config_path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }

    let state_path = state_path
        .map(PathBuf::from)
        .unwrap_or_else(|| state_path_for(&config_path));

    BallotConfig::create_default(&config_path, &administrator, &state_path)?;
    println!("📝 Config: {}", config_path.display());

    let service = open_service(Some(config_path.display().to_string())).await?;
    let stored_admin = service.administrator().await;

    println!("🗳️  Ballot: {}", state_path.display());
    println!("   Administrator: {}", stored_admin);
    println!("   Phase: {}", service.current_phase().await);
    if stored_admin.as_str() != administrator {
        println!(
            "⚠️  Existing ballot is administered by {}; --administrator {} was not applied",
            stored_admin, administrator
        );
    }

    Ok(())
}
