//! Steam store API client
//!
//! One GET against the public appdetails endpoint to resolve a configured
//! app id into its display name and header image, plus the image download
//! itself. The appdetails request carries a fixed 10-second timeout; all
//! failures degrade to `None` after an error log.

use image::DynamicImage;
use serde::Deserialize;
use std::time::Duration;
use tracing::error;

const STEAM_APP_INFO_URL: &str = "https://store.steampowered.com/api/appdetails/?appids=";

/// Timeout on the appdetails request
const STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// App metadata returned by the store appdetails endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SteamAppInfo {
    /// Numeric app id
    #[serde(rename = "steam_appid")]
    pub id: u32,
    /// Store display name
    pub name: String,
    /// Header/banner image URL
    #[serde(rename = "header_image")]
    pub image_url: Option<String>,
}

/// Fetch app metadata from the store.
///
/// Returns `None` when the id is not numeric, the request fails, or the
/// response carries no `data` object (unknown/delisted app).
pub fn fetch_app_info(app_id: &str) -> Option<SteamAppInfo> {
    if app_id.parse::<u32>().is_err() {
        error!("Not a numeric Steam app id: {app_id:?}");
        return None;
    }

    let client = match reqwest::blocking::Client::builder()
        .timeout(STORE_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {e}");
            return None;
        }
    };

    let url = format!("{STEAM_APP_INFO_URL}{app_id}");
    let response = match client.get(&url).send() {
        Ok(response) => response,
        Err(e) => {
            error!("appdetails request failed for app {app_id}: {e}");
            return None;
        }
    };

    if !response.status().is_success() {
        error!(
            "appdetails failed for app {app_id}! Status code: {}",
            response.status()
        );
        return None;
    }

    let body: serde_json::Value = match response.json() {
        Ok(body) => body,
        Err(e) => {
            error!("appdetails returned invalid JSON for app {app_id}: {e}");
            return None;
        }
    };

    let data = body.get(app_id)?.get("data")?.clone();
    match serde_json::from_value(data) {
        Ok(info) => Some(info),
        Err(e) => {
            error!("appdetails data did not deserialize for app {app_id}: {e}");
            None
        }
    }
}

/// Download and decode an image.
///
/// Used for Steam header images and Epic key images alike. Failures log
/// and return `None`.
pub fn fetch_image(image_url: &str) -> Option<DynamicImage> {
    if image_url.is_empty() {
        return None;
    }

    let result = reqwest::blocking::get(image_url)
        .and_then(reqwest::blocking::Response::bytes)
        .map_err(crate::LauncherError::from)
        .and_then(|bytes| image::load_from_memory(&bytes).map_err(crate::LauncherError::from));

    match result {
        Ok(img) => Some(img),
        Err(e) => {
            error!("Failed to fetch image {image_url}: {e}");
            None
        }
    }
}
