//! Epic catalog cache decoding
//!
//! The Epic launcher keeps a catalog cache at
//! `%ProgramData%\Epic\EpicGamesLauncher\Data\Catalog\catcache.bin`: a
//! base64-encoded JSON array of catalog entries. Only entries categorized
//! as games matter here; their key-image URL lists are indexed by catalog
//! item id so the manifest scan can attach artwork.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{error, warn};

use crate::error::Result;

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    categories: Vec<CatalogCategory>,
    #[serde(default, rename = "keyImages")]
    key_images: Option<Vec<KeyImage>>,
}

#[derive(Debug, Deserialize)]
struct CatalogCategory {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyImage {
    #[serde(default)]
    url: Option<String>,
}

/// Build the item-id → image-URL-list index from the catalog cache file.
///
/// Entries that are not categorized `"games"` or lack an id or key-image
/// list are skipped. A failure to read or decode the file logs an error
/// and yields an empty index; artwork is optional, titles are not.
pub fn load_image_index(catalog_file: &Path) -> HashMap<String, Vec<String>> {
    match decode_catalog(catalog_file) {
        Ok(index) => index,
        Err(e) => {
            error!("Failed loading image urls from catalog: {e}");
            HashMap::new()
        }
    }
}

fn decode_catalog(catalog_file: &Path) -> Result<HashMap<String, Vec<String>>> {
    let raw = std::fs::read_to_string(catalog_file)?;
    let bytes = STANDARD
        .decode(raw.trim())
        .map_err(|e| crate::LauncherError::EpicCatalog(Box::new(e)))?;
    let entries: Vec<CatalogEntry> = serde_json::from_slice(&bytes)?;

    let mut index = HashMap::new();
    for entry in entries {
        let is_game = entry
            .categories
            .iter()
            .any(|c| c.path.as_deref() == Some("games"));
        if !is_game {
            continue;
        }

        let (Some(id), Some(images)) = (entry.id, entry.key_images) else {
            continue;
        };

        let urls: Vec<String> = images.into_iter().filter_map(|img| img.url).collect();
        if index.insert(id.clone(), urls).is_some() {
            warn!("Duplicate catalog entry for item {id}, keeping the later one");
        }
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use std::fs;

    fn write_catalog(entries: &serde_json::Value) -> tempfile::TempDir {
        let temp = tempfile::tempdir().unwrap();
        let encoded = STANDARD.encode(serde_json::to_vec(entries).unwrap());
        fs::write(temp.path().join("catcache.bin"), encoded).unwrap();
        temp
    }

    #[test]
    fn test_load_image_index_games_only() {
        let catalog = serde_json::json!([
            {
                "id": "abc123",
                "categories": [{ "path": "games" }, { "path": "applications" }],
                "keyImages": [
                    { "url": "https://cdn.example/tall.png" },
                    { "url": "https://cdn.example/wide.png" }
                ]
            },
            {
                "id": "plugin1",
                "categories": [{ "path": "plugins" }],
                "keyImages": [{ "url": "https://cdn.example/plugin.png" }]
            }
        ]);
        let temp = write_catalog(&catalog);
        let index = load_image_index(&temp.path().join("catcache.bin"));

        assert_eq!(index.len(), 1);
        assert_eq!(
            index["abc123"],
            vec![
                "https://cdn.example/tall.png".to_string(),
                "https://cdn.example/wide.png".to_string()
            ]
        );
    }

    #[test]
    fn test_load_image_index_skips_entries_missing_fields() {
        let catalog = serde_json::json!([
            { "categories": [{ "path": "games" }], "keyImages": [] },
            { "id": "no-images", "categories": [{ "path": "games" }] }
        ]);
        let temp = write_catalog(&catalog);
        let index = load_image_index(&temp.path().join("catcache.bin"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_load_image_index_tolerates_surrounding_whitespace() {
        let temp = tempfile::tempdir().unwrap();
        let encoded = STANDARD.encode(b"[]" as &[u8]);
        fs::write(temp.path().join("catcache.bin"), format!("  {encoded}\n")).unwrap();
        let index = load_image_index(&temp.path().join("catcache.bin"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_load_image_index_missing_file_yields_empty() {
        let index = load_image_index(Path::new("/nope/catcache.bin"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_load_image_index_invalid_base64_yields_empty() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("catcache.bin"), "!!! not base64 !!!").unwrap();
        let index = load_image_index(&temp.path().join("catcache.bin"));
        assert!(index.is_empty());
    }
}
