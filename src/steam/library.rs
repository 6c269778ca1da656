//! Steam installed-application discovery
//!
//! Resolves the Steam install directory from the registry, expands the set
//! of library folders via `steamapps/libraryfolders.vdf`, and scans every
//! folder's `*.acf` app manifests for installed titles.
//!
//! Per-file parse failures skip the offending manifest with a warning and
//! continue the scan; only a missing top-level directory degrades the whole
//! result to an empty list.

use crate::steam::vdf::{self, VdfValue};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Subfolder of a library root that holds the app manifests
const STEAM_APPS_DIR: &str = "steamapps";
/// Library-folders index inside the primary `steamapps` folder
const STEAM_LIBRARY_FILE: &str = "libraryfolders.vdf";
/// App manifest extension
const STEAM_APPS_EXTENSION: &str = "acf";

#[cfg(windows)]
const REGISTRY_STEAM_KEY: &str = r"Software\Valve\Steam";
#[cfg(windows)]
const REGISTRY_STEAM_INSTALL_DIR_VALUE: &str = "SteamPath";
#[cfg(windows)]
const DEFAULT_STEAM_DIR: &str = r"c:/program files (x86)/steam";

/// One installed Steam title, as persisted into the action settings for
/// the property inspector's dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteamInstalledApplication {
    /// Steam app id (decimal string)
    pub id: String,
    /// Display name from the app manifest
    pub name: String,
}

/// Resolve the Steam install directory from the registry.
///
/// Reads `HKCU\Software\Valve\Steam\SteamPath`, falling back to the
/// default install location when the value is missing.
#[cfg(windows)]
pub fn steam_install_dir() -> PathBuf {
    use winreg::RegKey;
    use winreg::enums::HKEY_CURRENT_USER;

    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let path: String = hkcu
        .open_subkey(REGISTRY_STEAM_KEY)
        .and_then(|key| key.get_value(REGISTRY_STEAM_INSTALL_DIR_VALUE))
        .unwrap_or_else(|e| {
            warn!("Steam registry lookup failed ({e}), using default install dir");
            DEFAULT_STEAM_DIR.to_string()
        });
    PathBuf::from(path)
}

/// Non-Windows stub; there is no registry to consult.
#[cfg(not(windows))]
pub fn steam_install_dir() -> PathBuf {
    PathBuf::new()
}

/// Expand a primary `steamapps` folder into the full list of library
/// `steamapps` folders.
///
/// The primary folder is always included. Additional folders come from
/// `libraryfolders.vdf`: entries whose key parses as an integer denote a
/// library slot whose value is either a plain path (old format, must
/// exist on disk) or a block carrying `path` and an optional `mounted`
/// flag (skipped when `mounted != "1"`). Each slot contributes its
/// `steamapps` subfolder.
pub fn library_folders(steam_apps_dir: &Path) -> Vec<PathBuf> {
    let mut directories = vec![steam_apps_dir.to_path_buf()];

    let library_file = steam_apps_dir.join(STEAM_LIBRARY_FILE);
    let contents = match std::fs::read_to_string(&library_file) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Could not read {}: {e}", library_file.display());
            return directories;
        }
    };

    let doc = match vdf::parse(&contents) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Failed to parse {}: {e}", library_file.display());
            return directories;
        }
    };

    // Root block is "libraryfolders"; tolerate documents without the wrapper.
    let root = doc.get("libraryfolders").unwrap_or(&doc);
    let Some(slots) = root.as_object() else {
        warn!("Library folders document has no slot block");
        return directories;
    };

    for (key, value) in slots {
        // Library slots have numeric keys; everything else is metadata
        if key.parse::<u32>().is_err() {
            continue;
        }

        let path = match value {
            VdfValue::String(path) => {
                // Old format: the slot value is the path itself
                if path.is_empty() || !Path::new(path).is_dir() {
                    warn!("Skipping library slot {key}: path {path:?} does not exist");
                    continue;
                }
                path.clone()
            }
            VdfValue::Object(_) => {
                let Some(path) = value.get("path").and_then(VdfValue::as_str) else {
                    warn!("Skipping library slot {key}: no path field");
                    continue;
                };
                let mounted = value.get("mounted").and_then(VdfValue::as_str).unwrap_or("1");
                if mounted != "1" {
                    warn!("Skipping unmounted library folder: {path}");
                    continue;
                }
                path.to_string()
            }
        };

        directories.push(PathBuf::from(path).join(STEAM_APPS_DIR));
    }

    info!(
        "Found {} potential additional library folders",
        directories.len() - 1
    );
    directories
}

/// Scan the given `steamapps` folders for installed titles.
///
/// Reads `appid` and `name` from each `*.acf` manifest's `AppState` block.
/// Manifests that fail to parse or lack either field are skipped with a
/// warning. Result is sorted by name.
pub fn installed_apps(directories: &[PathBuf]) -> Vec<SteamInstalledApplication> {
    let mut apps = Vec::new();

    for directory in directories {
        let entries = match std::fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Missing Steam directory {}: {e}", directory.display());
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(STEAM_APPS_EXTENSION) {
                continue;
            }
            match parse_app_manifest(&path) {
                Ok(Some(app)) => apps.push(app),
                Ok(None) => warn!("No valid app info in {}", path.display()),
                Err(e) => warn!("Skipping {}: {e}", path.display()),
            }
        }
    }

    apps.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    info!("Found {} apps in {} dirs", apps.len(), directories.len());
    apps
}

/// Full discovery: registry install dir, library expansion, manifest scan.
pub fn load_installed_apps() -> Vec<SteamInstalledApplication> {
    let steam_dir = steam_install_dir();
    let apps_dir = steam_dir.join(STEAM_APPS_DIR);
    if !apps_dir.is_dir() {
        warn!("Could not find Steam directory {}", apps_dir.display());
        return Vec::new();
    }

    let directories = library_folders(&apps_dir);
    installed_apps(&directories)
}

/// Read one `*.acf` manifest, returning its app id and name.
///
/// Read and parse failures surface as errors; a manifest that parses but
/// lacks either field yields `Ok(None)`.
fn parse_app_manifest(path: &Path) -> crate::Result<Option<SteamInstalledApplication>> {
    let contents = std::fs::read_to_string(path)?;
    let doc = vdf::parse(&contents)?;

    let state = doc.get("AppState").unwrap_or(&doc);
    let (Some(id), Some(name)) = (
        state.get("appid").and_then(VdfValue::as_str),
        state.get("name").and_then(VdfValue::as_str),
    ) else {
        return Ok(None);
    };
    if id.is_empty() || name.is_empty() {
        return Ok(None);
    }

    Ok(Some(SteamInstalledApplication {
        id: id.to_string(),
        name: name.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_manifest(dir: &Path, file: &str, appid: &str, name: &str) {
        let contents = format!(
            "\"AppState\"\n{{\n\t\"appid\"\t\t\"{appid}\"\n\t\"universe\"\t\t\"1\"\n\t\"name\"\t\t\"{name}\"\n}}\n"
        );
        fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn test_library_folders_numeric_keys_only() {
        let temp = tempfile::tempdir().unwrap();
        let primary = temp.path().join("steamapps");
        fs::create_dir_all(&primary).unwrap();

        let extra = temp.path().join("extra");
        fs::create_dir_all(extra.join("steamapps")).unwrap();

        let vdf = format!(
            "\"libraryfolders\"\n{{\n\t\"contentstatsid\"\t\"-555\"\n\t\"0\"\n\t{{\n\t\t\"path\"\t\"{}\"\n\t\t\"mounted\"\t\"1\"\n\t}}\n}}\n",
            extra.display().to_string().replace('\\', "\\\\")
        );
        fs::write(primary.join("libraryfolders.vdf"), vdf).unwrap();

        let folders = library_folders(&primary);
        assert_eq!(folders.len(), 2);
        assert_eq!(folders[0], primary);
        assert_eq!(folders[1], extra.join("steamapps"));
    }

    #[test]
    fn test_library_folders_old_format_requires_existing_dir() {
        let temp = tempfile::tempdir().unwrap();
        let primary = temp.path().join("steamapps");
        fs::create_dir_all(&primary).unwrap();

        let existing = temp.path().join("lib1");
        fs::create_dir_all(&existing).unwrap();

        let vdf = format!(
            "\"LibraryFolders\"\n{{\n\t\"TimeNextStatsReport\"\t\"123\"\n\t\"1\"\t\"{}\"\n\t\"2\"\t\"{}\"\n}}\n",
            existing.display().to_string().replace('\\', "\\\\"),
            temp.path().join("missing").display().to_string().replace('\\', "\\\\"),
        );
        fs::write(primary.join("libraryfolders.vdf"), vdf).unwrap();

        let folders = library_folders(&primary);
        // Primary plus the one existing old-format slot; the missing dir is skipped
        assert_eq!(folders.len(), 2);
        assert_eq!(folders[1], existing.join("steamapps"));
    }

    #[test]
    fn test_library_folders_skips_unmounted() {
        let temp = tempfile::tempdir().unwrap();
        let primary = temp.path().join("steamapps");
        fs::create_dir_all(&primary).unwrap();

        let vdf = "\"libraryfolders\"\n{\n\t\"0\"\n\t{\n\t\t\"path\"\t\"D:\\\\SteamLibrary\"\n\t\t\"mounted\"\t\"0\"\n\t}\n}\n";
        fs::write(primary.join("libraryfolders.vdf"), vdf).unwrap();

        let folders = library_folders(&primary);
        assert_eq!(folders, vec![primary]);
    }

    #[test]
    fn test_library_folders_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let primary = temp.path().join("steamapps");
        fs::create_dir_all(&primary).unwrap();

        let folders = library_folders(&primary);
        assert_eq!(folders, vec![primary]);
    }

    #[test]
    fn test_installed_apps_sorted_by_name() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().to_path_buf();
        write_manifest(&dir, "appmanifest_620.acf", "620", "Portal 2");
        write_manifest(&dir, "appmanifest_400.acf", "400", "Portal");
        write_manifest(&dir, "appmanifest_570.acf", "570", "Dota 2");

        let apps = installed_apps(&[dir]);
        let names: Vec<&str> = apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Dota 2", "Portal", "Portal 2"]);
    }

    #[test]
    fn test_installed_apps_skips_malformed_manifest() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().to_path_buf();
        write_manifest(&dir, "appmanifest_620.acf", "620", "Portal 2");
        fs::write(dir.join("appmanifest_bad.acf"), "\"AppState\" { \"appid\" ").unwrap();
        fs::write(dir.join("appmanifest_partial.acf"), "\"AppState\" { \"appid\" \"1\" }").unwrap();
        fs::write(dir.join("notes.txt"), "not a manifest").unwrap();

        let apps = installed_apps(&[dir]);
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].id, "620");
    }

    #[test]
    fn test_manifest_parse_failure_surfaces_as_vdf_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("appmanifest_bad.acf");
        fs::write(&path, "\"AppState\" { \"appid\" ").unwrap();

        let err = parse_app_manifest(&path).unwrap_err();
        assert!(matches!(err, crate::LauncherError::Vdf(_)));
    }

    #[test]
    fn test_installed_apps_missing_directory_yields_empty() {
        let apps = installed_apps(&[PathBuf::from("/definitely/not/here")]);
        assert!(apps.is_empty());
    }
}
