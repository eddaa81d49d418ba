use crate::cli::output::OutputFormatter;
use crate::config::{DEFAULT_STORAGE_DIR, DeskConfig};
use crate::error::{DeskError, Result};
use crate::storage::FileStorage;

/// Handle the init command
///
/// Creates the storage layout under the current directory and writes a
/// project config file. An existing desk is left alone unless `force` is set,
/// in which case only the config file is rewritten; tickets are never touched.
pub fn handle_init(prefix: &str, force: bool, formatter: &OutputFormatter) -> Result<()> {
    let storage_dir = std::env::current_dir()?.join(DEFAULT_STORAGE_DIR);
    let storage = FileStorage::new(&storage_dir);

    if storage.is_initialized() && !force {
        return Err(DeskError::custom(format!(
            "a desk already exists at {}; use --force to rewrite its config",
            storage_dir.display()
        )));
    }

    let config = DeskConfig {
        storage_dir: storage_dir.clone(),
        ticket_prefix: prefix.trim().to_uppercase(),
        ..DeskConfig::default()
    };
    config.validate()?;

    storage.ensure_directories()?;
    let config_path = config.save_project_file()?;
    tracing::info!(path = %storage_dir.display(), "desk initialized");

    if formatter.is_json() {
        formatter.print_json(&serde_json::json!({
            "status": "success",
            "storage_dir": storage_dir,
            "config": config_path,
            "ticket_prefix": config.ticket_prefix,
        }))?;
    } else {
        formatter.success(&format!("Initialized desk in {}", storage_dir.display()));
        formatter.info(&format!("Display numbers: {}-YYYYMMDD-NNNN", config.ticket_prefix));
        formatter.info(
            "Set ETDESK_REMOTE__BASE_URL and ETDESK_REMOTE__API_KEY to enable helpdesk sync",
        );
    }
    Ok(())
}
