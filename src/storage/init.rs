//! Storage initialization
//!
//! First-run setup: settings plus empty rule and catalog files.

use tracing::info;

use crate::config::paths::WaterfallPaths;
use crate::config::settings::Settings;
use crate::error::WaterfallError;

use super::catalog::CatalogData;
use super::file_io::write_json_atomic;
use super::rules::RuleSet;

/// Initialize the data directory for a fresh installation
///
/// Existing files are left alone, so running it twice is harmless.
pub fn initialize_storage(paths: &WaterfallPaths) -> Result<(), WaterfallError> {
    paths.ensure_directories()?;

    if !paths.settings_file().exists() {
        Settings::default().save(paths)?;
    }
    if !paths.rules_file().exists() {
        write_json_atomic(paths.rules_file(), &RuleSet::default())?;
    }
    if !paths.catalog_file().exists() {
        write_json_atomic(paths.catalog_file(), &CatalogData::default())?;
    }

    info!(dir = %paths.base_dir().display(), "storage initialized");
    Ok(())
}
