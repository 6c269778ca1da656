//! UWP launcher action
//!
//! Launches an installed Store app by activating its app-list entry. The
//! property inspector gets the cached package list and can request a
//! rescan; the key shows the package logo.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::host::{Action, Connection, TitleParameters};
use crate::render;
use crate::uwp::{UwpAppCache, UwpPackage, launch_by_family_name};

/// Persisted settings. Packages are selected by display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UwpSettings {
    /// Display name of the selected package
    pub application_id: String,
    /// Installed packages for the property inspector
    pub applications: Vec<UwpPackage>,
    /// Show the package name on the key
    pub show_app_name: bool,
}

impl Default for UwpSettings {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            applications: Vec::new(),
            show_app_name: false,
        }
    }
}

/// Launch-a-Store-app key.
pub struct UwpLauncherAction {
    connection: Arc<dyn Connection>,
    packages: Arc<UwpAppCache>,
    settings: UwpSettings,
    key_image: Option<String>,
    title_parameters: Option<TitleParameters>,
}

impl UwpLauncherAction {
    /// Build the action from the host's initial settings payload.
    pub fn new(
        connection: Arc<dyn Connection>,
        packages: Arc<UwpAppCache>,
        payload: &Value,
    ) -> Self {
        let settings = parse_settings(payload);
        let mut action = Self {
            connection,
            packages,
            settings,
            key_image: None,
            title_parameters: None,
        };
        action.refresh_logo();
        action.persist();
        action
    }

    fn persist(&self) {
        match serde_json::to_value(&self.settings) {
            Ok(value) => self.connection.set_settings(value),
            Err(e) => error!("Failed to serialize UWP settings: {e}"),
        }
    }

    fn refresh_logo(&mut self) {
        self.key_image = None;

        if self.settings.application_id.is_empty() {
            return;
        }
        let Some(package) = self
            .packages
            .find_by_display_name(&self.settings.application_id)
        else {
            warn!(
                "Selected UWP package {:?} is not installed",
                self.settings.application_id
            );
            return;
        };
        let Some(logo_path) = package.logo_path else {
            return;
        };
        let logo = match image::open(&logo_path) {
            Ok(logo) => logo,
            Err(e) => {
                warn!("Failed to load package logo {logo_path:?}: {e}");
                return;
            }
        };
        let canvas = render::compose(&logo, render::ImageFit::Fit);
        match render::to_data_uri(&canvas) {
            Ok(uri) => self.key_image = Some(uri),
            Err(e) => warn!("Key image encoding failed: {e}"),
        }
    }

    /// Pushes the title only when a name, the title parameters and the
    /// setting are all present; otherwise the key title is left alone.
    fn push_title(&self) {
        if !self.settings.show_app_name || self.settings.application_id.is_empty() {
            return;
        }
        if let Some(params) = &self.title_parameters {
            let name = &self.settings.application_id;
            self.connection.set_title(Some(&params.split_to_fit(name)));
        }
    }
}

impl Action for UwpLauncherAction {
    fn key_pressed(&mut self) {
        if self.settings.application_id.is_empty() {
            error!("UWP launch requested but no package is selected");
            self.connection.show_alert();
            return;
        }
        let Some(package) = self
            .packages
            .find_by_display_name(&self.settings.application_id)
        else {
            error!(
                "UWP package {:?} is not installed",
                self.settings.application_id
            );
            self.connection.show_alert();
            return;
        };

        info!("Launching UWP package {}", package.family_name);
        match launch_by_family_name(&package.family_name) {
            Ok(true) => self.connection.show_ok(),
            Ok(false) => {
                error!("UWP activation rejected for {}", package.family_name);
                self.connection.show_alert();
            }
            Err(e) => {
                error!("UWP launch failed for {}: {e}", package.family_name);
                self.connection.show_alert();
            }
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
        self.refresh_logo();
        self.persist();
    }

    fn property_inspector_did_appear(&mut self) {
        self.settings.applications = self.packages.apps();
        self.persist();
    }

    fn title_parameters_did_change(&mut self, params: TitleParameters) {
        self.title_parameters = Some(params);
    }

    fn send_to_plugin(&mut self, payload: &Value) {
        let request = payload
            .get("property_inspector")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        if request == "refreshapps" {
            info!("Property inspector requested a UWP package rescan");
            self.settings.applications = self.packages.force_reload();
            self.persist();
        }
    }
}

fn parse_settings(payload: &Value) -> UwpSettings {
    serde_json::from_value(payload.clone()).unwrap_or_else(|e| {
        warn!("Invalid UWP settings payload, using defaults: {e}");
        UwpSettings::default()
    })
}
