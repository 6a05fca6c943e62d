//! The persisted `AppSettings` record.

pub mod handlers;

use tracing::info;

use crate::errors::AppError;
use crate::models::settings::SETTINGS_KEY;
use crate::models::AppSettings;
use crate::store::Repository;

/// Reads the settings record; a fresh install has none and gets defaults.
pub async fn load_settings(repo: &Repository) -> Result<AppSettings, AppError> {
    Ok(repo
        .get::<AppSettings>(SETTINGS_KEY)
        .await?
        .unwrap_or_default())
}

pub async fn save_settings(repo: &Repository, settings: &AppSettings) -> Result<(), AppError> {
    repo.put(settings).await?;
    info!(
        "Settings saved (model: {})",
        settings.selected_model.as_deref().unwrap_or("default")
    );
    Ok(())
}
