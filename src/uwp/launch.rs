//! UWP application launching
//!
//! Resolves a package by family name and activates its first app-list
//! entry. The WinRT async operations are driven to completion with
//! blocking `get()` calls since launching happens on a key press, not a
//! hot path.

use crate::error::Result;

/// Launches the UWP package with the given family name.
///
/// Returns `Ok(true)` when an app-list entry reported a successful launch,
/// `Ok(false)` when the package has no launchable entry or the activation
/// was rejected.
///
/// # Errors
///
/// Returns an error for `PackageManager` or activation API failures.
#[cfg(windows)]
pub fn launch_by_family_name(family_name: &str) -> Result<bool> {
    use crate::error::LauncherError;
    use windows::Management::Deployment::PackageManager;
    use windows::core::HSTRING;

    let package_manager = PackageManager::new().map_err(|e| LauncherError::Uwp(Box::new(e)))?;

    // Empty security id means the current user
    let packages = package_manager
        .FindPackagesByUserSecurityIdPackageFamilyName(
            &HSTRING::new(),
            &HSTRING::from(family_name),
        )
        .map_err(|e| LauncherError::Uwp(Box::new(e)))?;

    for package in packages {
        let entries = package
            .GetAppListEntriesAsync()
            .and_then(|op| op.get())
            .map_err(|e| LauncherError::Uwp(Box::new(e)))?;

        if let Some(entry) = entries.into_iter().next() {
            let launched = entry
                .LaunchAsync()
                .and_then(|op| op.get())
                .map_err(|e| LauncherError::Uwp(Box::new(e)))?;
            return Ok(launched);
        }
    }

    Ok(false)
}

#[cfg(not(windows))]
pub fn launch_by_family_name(_family_name: &str) -> Result<bool> {
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_family_name_reports_no_launch() {
        let launched = launch_by_family_name("No.Such.Package_0000000000000").unwrap();
        assert!(!launched);
    }
}
