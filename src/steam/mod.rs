//! Steam integration
//!
//! Discovery of installed Steam titles (registry install dir, library
//! folder expansion via `libraryfolders.vdf`, `*.acf` manifest scan) and
//! metadata lookup through the public store API. Titles are launched via
//! `steam://rungameid/{id}` URLs, so no Steam process API is needed.

pub mod library;
pub mod store;
pub mod vdf;

pub use library::{SteamInstalledApplication, installed_apps, library_folders, load_installed_apps};
pub use store::{SteamAppInfo, fetch_app_info, fetch_image};
pub use vdf::{VdfError, VdfValue};

/// Launch URL template for Steam titles
pub const STEAM_LAUNCH_URL: &str = "steam://rungameid/";
