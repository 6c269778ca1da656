//! Steam launcher action
//!
//! Launches an installed Steam title through the `steam://rungameid/` URL
//! scheme. The property inspector gets the installed-title list scanned
//! from the Steam library folders; the key shows the title's store header
//! image composited per the configured fit.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::host::{Action, Connection, TitleParameters};
use crate::process::ProcessApi;
use crate::render::{self, ImageFit};
use crate::steam::{self, SteamInstalledApplication, store};

/// Persisted settings, including the installed-title list the property
/// inspector renders its dropdown from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SteamSettings {
    /// Selected Steam app id (decimal string)
    pub application_id: String,
    /// Installed titles for the property inspector
    pub applications: Vec<SteamInstalledApplication>,
    /// Show the title's name on the key
    pub show_app_name: bool,
    /// Artwork placement policy
    pub image_fit: ImageFit,
}

impl Default for SteamSettings {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            applications: Vec::new(),
            show_app_name: false,
            image_fit: ImageFit::default(),
        }
    }
}

/// Launch-a-Steam-title key.
pub struct SteamLauncherAction {
    connection: Arc<dyn Connection>,
    process_api: Arc<dyn ProcessApi>,
    settings: SteamSettings,
    app_name: Option<String>,
    key_image: Option<String>,
    title_parameters: Option<TitleParameters>,
}

impl SteamLauncherAction {
    /// Build the action from the host's initial settings payload.
    pub fn new(
        connection: Arc<dyn Connection>,
        process_api: Arc<dyn ProcessApi>,
        payload: &Value,
    ) -> Self {
        let settings = parse_settings(payload);
        let mut action = Self {
            connection,
            process_api,
            settings,
            app_name: None,
            key_image: None,
            title_parameters: None,
        };
        action.refresh_app_info();
        action.persist();
        action
    }

    fn persist(&self) {
        match serde_json::to_value(&self.settings) {
            Ok(value) => self.connection.set_settings(value),
            Err(e) => error!("Failed to serialize Steam settings: {e}"),
        }
    }

    /// Pulls name and header artwork for the selected title from the store
    /// API and re-composites the key image.
    fn refresh_app_info(&mut self) {
        self.app_name = None;
        self.key_image = None;

        if self.settings.application_id.is_empty() {
            return;
        }

        let Some(info) = store::fetch_app_info(&self.settings.application_id) else {
            warn!(
                "No store details for Steam app {}",
                self.settings.application_id
            );
            return;
        };
        self.app_name = Some(info.name);

        let Some(image_url) = info.image_url else {
            return;
        };
        let Some(artwork) = store::fetch_image(&image_url) else {
            return;
        };
        let canvas = render::compose(&artwork, self.settings.image_fit);
        match render::to_data_uri(&canvas) {
            Ok(uri) => self.key_image = Some(uri),
            Err(e) => warn!("Key image encoding failed: {e}"),
        }
    }

    /// Pushes the title only when a name, the title parameters and the
    /// setting are all present; otherwise the key title is left alone.
    fn push_title(&self) {
        if !self.settings.show_app_name {
            return;
        }
        if let (Some(name), Some(params)) = (&self.app_name, &self.title_parameters) {
            self.connection.set_title(Some(&params.split_to_fit(name)));
        }
    }
}

impl Action for SteamLauncherAction {
    fn key_pressed(&mut self) {
        if self.settings.application_id.is_empty() {
            warn!("Steam launch requested but no title is selected");
            return;
        }
        let url = format!("{}{}", steam::STEAM_LAUNCH_URL, self.settings.application_id);
        info!("Launching Steam title via {url}");
        if let Err(e) = self.process_api.open_url(&url) {
            error!("Steam launch failed: {e}");
            self.connection.show_alert();
        }
    }

    fn key_released(&mut self) {}

    fn on_tick(&mut self) {
        if let Some(uri) = self.key_image.as_deref() {
            self.connection.set_image(Some(uri));
        }
        self.push_title();
    }

    fn received_settings(&mut self, payload: &Value) {
        self.settings = parse_settings(payload);
        self.refresh_app_info();
        self.persist();
    }

    fn property_inspector_did_appear(&mut self) {
        self.settings.applications = steam::load_installed_apps();
        info!(
            "Found {} installed Steam titles",
            self.settings.applications.len()
        );
        self.persist();
    }

    fn title_parameters_did_change(&mut self, params: TitleParameters) {
        self.title_parameters = Some(params);
    }
}

fn parse_settings(payload: &Value) -> SteamSettings {
    serde_json::from_value(payload.clone()).unwrap_or_else(|e| {
        warn!("Invalid Steam settings payload, using defaults: {e}");
        SteamSettings::default()
    })
}
