//! UWP package enumeration via Windows Runtime APIs
//!
//! Discovers installed UWP applications with the `WinRT` `PackageManager`
//! API. Framework packages and packages without a display name are skipped,
//! and the surviving entries are sorted by display name for the property
//! inspector dropdown.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// Metadata for an installed UWP package.
///
/// `family_name` is the stable identifier used for launching; the display
/// name is what the property inspector shows and persists in settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UwpPackage {
    /// User-visible display name (e.g., "Calculator")
    #[serde(rename = "displayName")]
    pub display_name: String,

    /// Stable package identifier (e.g., "`Microsoft.WindowsCalculator_8wekyb3d8bbwe`")
    #[serde(rename = "familyName")]
    pub family_name: String,

    /// Package install directory, when resolvable
    #[serde(rename = "installPath")]
    pub install_path: Option<PathBuf>,

    /// Path to the package logo asset, when one is declared
    #[serde(rename = "logoPath")]
    pub logo_path: Option<PathBuf>,
}

/// Enumerate installed UWP packages for the current user.
///
/// Packages that fail metadata extraction are logged and skipped so one
/// broken package does not hide the rest. Returns an empty vector on
/// non-Windows platforms.
///
/// # Errors
///
/// Returns an error if `PackageManager` initialization or the package query
/// itself fails.
#[cfg(windows)]
pub fn enumerate_packages() -> Result<Vec<UwpPackage>> {
    use crate::error::LauncherError;
    use windows::Management::Deployment::PackageManager;

    let package_manager = PackageManager::new().map_err(|e| LauncherError::Uwp(Box::new(e)))?;

    let packages = package_manager
        .FindPackages()
        .map_err(|e| LauncherError::Uwp(Box::new(e)))?;

    let mut result = Vec::new();

    for package in packages {
        match extract_package_info(&package) {
            Ok(Some(info)) => result.push(info),
            Ok(None) => {
                // Framework or nameless system package
            }
            Err(e) => {
                tracing::warn!("Failed to extract package info: {e}");
            }
        }
    }

    result.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
    });

    Ok(result)
}

/// Extract package information from a `WinRT` Package object.
///
/// Returns `Ok(None)` if the package should be filtered out.
#[cfg(windows)]
fn extract_package_info(package: &windows::ApplicationModel::Package) -> Result<Option<UwpPackage>> {
    use crate::error::LauncherError;

    let is_framework = package
        .IsFramework()
        .map_err(|e| LauncherError::Uwp(Box::new(e)))?;

    if is_framework {
        return Ok(None);
    }

    let family_name = package
        .Id()
        .map_err(|e| LauncherError::Uwp(Box::new(e)))?
        .FamilyName()
        .map_err(|e| LauncherError::Uwp(Box::new(e)))?
        .to_string();

    let display_name = package
        .DisplayName()
        .map_err(|e| LauncherError::Uwp(Box::new(e)))?
        .to_string();

    if display_name.is_empty() {
        return Ok(None);
    }

    let install_path = package
        .InstalledLocation()
        .and_then(|location| location.Path())
        .ok()
        .map(|path| PathBuf::from(path.to_string()))
        .filter(|path| !path.as_os_str().is_empty());

    // Package.Logo is a file:/// URI into the install directory
    let logo_path = package
        .Logo()
        .and_then(|uri| uri.ToString())
        .ok()
        .map(|uri| uri.to_string())
        .filter(|uri| !uri.is_empty())
        .map(|uri| file_uri_to_path(&uri));

    Ok(Some(UwpPackage {
        display_name,
        family_name,
        install_path,
        logo_path,
    }))
}

/// Converts a `file:///C:/...` URI into a local path, decoding the escapes
/// that show up in install directories (spaces, mostly).
#[cfg_attr(not(windows), allow(dead_code))]
fn file_uri_to_path(uri: &str) -> PathBuf {
    let stripped = uri
        .strip_prefix("file:///")
        .or_else(|| uri.strip_prefix("file://"))
        .unwrap_or(uri);
    PathBuf::from(stripped.replace("%20", " ").replace('/', "\\"))
}

#[cfg(not(windows))]
pub fn enumerate_packages() -> Result<Vec<UwpPackage>> {
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_uri_strips_scheme_and_decodes_spaces() {
        let path = file_uri_to_path("file:///C:/Program%20Files/WindowsApps/App/logo.png");
        assert_eq!(
            path,
            PathBuf::from("C:\\Program Files\\WindowsApps\\App\\logo.png")
        );
    }

    #[test]
    fn plain_paths_pass_through_uri_conversion() {
        let path = file_uri_to_path("C:\\WindowsApps\\App\\logo.png");
        assert_eq!(path, PathBuf::from("C:\\WindowsApps\\App\\logo.png"));
    }

    #[test]
    fn package_serialization_uses_camel_case_keys() {
        let package = UwpPackage {
            display_name: "Calculator".to_string(),
            family_name: "Microsoft.WindowsCalculator_8wekyb3d8bbwe".to_string(),
            install_path: None,
            logo_path: None,
        };
        let json = serde_json::to_value(&package).unwrap();
        assert_eq!(json["displayName"], "Calculator");
        assert_eq!(
            json["familyName"],
            "Microsoft.WindowsCalculator_8wekyb3d8bbwe"
        );
    }

    #[test]
    #[cfg(windows)]
    fn enumeration_succeeds_and_filters_nameless_packages() {
        let packages = enumerate_packages().unwrap();
        for pkg in &packages {
            assert!(!pkg.display_name.is_empty());
            assert!(pkg.family_name.contains('_'));
        }
    }

    #[test]
    #[cfg(not(windows))]
    fn enumeration_is_empty_off_windows() {
        assert!(enumerate_packages().unwrap().is_empty());
    }
}
