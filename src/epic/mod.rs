//! Epic Games Launcher integration
//!
//! Installed titles are discovered from two launcher-owned files: `*.item`
//! JSON manifests (one per installed title) and a base64-encoded catalog
//! cache supplying artwork URLs. Launching goes through the launcher's
//! `com.epicgames.launcher://` URL scheme.

pub mod catalog;
pub mod manifest;

pub use catalog::load_image_index;
pub use manifest::{EpicInstalledApplication, installed_apps};

use std::path::PathBuf;

/// Default manifests directory under `%ProgramData%`
pub fn default_manifests_dir() -> PathBuf {
    program_data().join(r"Epic\EpicGamesLauncher\Data\Manifests")
}

/// Default catalog cache file under `%ProgramData%`
pub fn default_catalog_file() -> PathBuf {
    program_data().join(r"Epic\EpicGamesLauncher\Data\Catalog\catcache.bin")
}

fn program_data() -> PathBuf {
    PathBuf::from(std::env::var("ProgramData").unwrap_or_else(|_| r"C:\ProgramData".to_string()))
}

/// Build the launcher URL for a title.
pub fn launch_url(namespace: &str, id: &str, app_name: &str) -> String {
    format!("com.epicgames.launcher://apps/{namespace}:{id}:{app_name}?action=launch&silent=true")
}

/// Discover all installed Epic titles with artwork attached.
pub fn load_installed_apps() -> Vec<EpicInstalledApplication> {
    let image_index = load_image_index(&default_catalog_file());
    installed_apps(&default_manifests_dir(), &image_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_url_format() {
        assert_eq!(
            launch_url("fn", "abc123", "Fortnite"),
            "com.epicgames.launcher://apps/fn:abc123:Fortnite?action=launch&silent=true"
        );
    }
}
