//! Epic installed-app manifest scan
//!
//! Every installed Epic title leaves a `*.item` JSON manifest under
//! `%ProgramData%\Epic\EpicGamesLauncher\Data\Manifests`. A manifest is
//! only usable when it carries all four identity fields (namespace,
//! catalog item id, app name, display name); partial installs and DLC
//! stubs are dropped. Catalog artwork is attached by item id.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// One installed Epic title, as persisted into the action settings for
/// the property inspector's dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicInstalledApplication {
    /// Catalog namespace, first segment of the launch URL
    pub namespace: String,
    /// Catalog item id
    pub id: String,
    /// Internal app name, last segment of the launch URL
    pub name: String,
    /// User-visible title
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Key-image URLs from the catalog cache (may be empty)
    #[serde(rename = "imageUrls")]
    pub image_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ItemManifest {
    #[serde(default, rename = "MainGameCatalogNamespace")]
    namespace: Option<String>,
    #[serde(default, rename = "MainGameCatalogItemId")]
    item_id: Option<String>,
    #[serde(default, rename = "MainGameAppName")]
    app_name: Option<String>,
    #[serde(default, rename = "DisplayName")]
    display_name: Option<String>,
}

/// Scan `*.item` manifests and merge in catalog image URLs.
///
/// Manifests missing any required field are excluded; per-file read or
/// parse failures are skipped with a warning. Two manifests sharing a
/// catalog item id keep only the first encountered. The final list is
/// sorted by display name.
pub fn installed_apps(
    manifests_dir: &Path,
    image_index: &HashMap<String, Vec<String>>,
) -> Vec<EpicInstalledApplication> {
    let entries = match std::fs::read_dir(manifests_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Could not find Epic directory {}: {e}", manifests_dir.display());
            return Vec::new();
        }
    };

    let mut apps: Vec<EpicInstalledApplication> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("item") {
            continue;
        }

        let manifest: ItemManifest = match std::fs::read_to_string(&path)
            .map_err(crate::LauncherError::from)
            .and_then(|text| serde_json::from_str(text.trim()).map_err(crate::LauncherError::from))
        {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Failed to read manifest {}: {e}", path.display());
                continue;
            }
        };

        let (Some(namespace), Some(id), Some(name), Some(display_name)) = (
            manifest.namespace,
            manifest.item_id,
            manifest.app_name,
            manifest.display_name,
        ) else {
            continue;
        };

        // First manifest for an item id wins
        if !seen.insert(id.clone()) {
            continue;
        }

        let image_urls = image_index.get(&id).cloned().unwrap_or_default();
        apps.push(EpicInstalledApplication {
            namespace,
            id,
            name,
            display_name,
            image_urls,
        });
    }

    apps.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
    });
    info!("Found {} Epic apps", apps.len());
    apps
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_item(dir: &Path, file: &str, json: &serde_json::Value) {
        fs::write(dir.join(file), serde_json::to_string_pretty(json).unwrap()).unwrap();
    }

    fn full_manifest(id: &str, display_name: &str) -> serde_json::Value {
        serde_json::json!({
            "FormatVersion": 0,
            "MainGameCatalogNamespace": "fn",
            "MainGameCatalogItemId": id,
            "MainGameAppName": format!("app-{id}"),
            "DisplayName": display_name,
            "InstallLocation": "C:\\Games"
        })
    }

    #[test]
    fn test_manifest_missing_required_field_excluded() {
        let temp = tempfile::tempdir().unwrap();
        write_item(temp.path(), "good.item", &full_manifest("aaa", "Alpha"));
        write_item(
            temp.path(),
            "no-display.item",
            &serde_json::json!({
                "MainGameCatalogNamespace": "fn",
                "MainGameCatalogItemId": "bbb",
                "MainGameAppName": "app-bbb"
            }),
        );

        let apps = installed_apps(temp.path(), &HashMap::new());
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].id, "aaa");
    }

    #[test]
    fn test_duplicate_id_first_wins_sorted_by_display_name() {
        let temp = tempfile::tempdir().unwrap();
        // read_dir order is not guaranteed, so give the duplicates the same
        // identity fields and check only one survives
        write_item(temp.path(), "a.item", &full_manifest("dup", "Zulu"));
        write_item(temp.path(), "b.item", &full_manifest("dup", "Zulu"));
        write_item(temp.path(), "c.item", &full_manifest("solo", "Alpha"));

        let apps = installed_apps(temp.path(), &HashMap::new());
        assert_eq!(apps.len(), 2);
        let names: Vec<&str> = apps.iter().map(|a| a.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zulu"]);
    }

    #[test]
    fn test_image_urls_attached_by_id() {
        let temp = tempfile::tempdir().unwrap();
        write_item(temp.path(), "a.item", &full_manifest("aaa", "Alpha"));

        let mut index = HashMap::new();
        index.insert(
            "aaa".to_string(),
            vec!["https://cdn.example/a.png".to_string()],
        );

        let apps = installed_apps(temp.path(), &index);
        assert_eq!(apps[0].image_urls, vec!["https://cdn.example/a.png"]);
    }

    #[test]
    fn test_unparseable_manifest_skipped() {
        let temp = tempfile::tempdir().unwrap();
        write_item(temp.path(), "good.item", &full_manifest("aaa", "Alpha"));
        fs::write(temp.path().join("broken.item"), "{ not json").unwrap();

        let apps = installed_apps(temp.path(), &HashMap::new());
        assert_eq!(apps.len(), 1);
    }

    #[test]
    fn test_missing_directory_yields_empty() {
        let apps = installed_apps(Path::new("/nope/Manifests"), &HashMap::new());
        assert!(apps.is_empty());
    }
}
