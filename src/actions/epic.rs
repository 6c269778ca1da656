//! Epic Games launcher action
//!
//! Launches an installed Epic title through the
//! `com.epicgames.launcher://apps/` URL scheme. The installed-title list is
//! merged from the launcher's item manifests and the catalog cache; the key
//! shows the title's first catalog image.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::epic::{self, EpicInstalledApplication};
use crate::host::{Action, Connection, TitleParameters};
use crate::process::ProcessApi;
use crate::render::{self, ImageFit};
use crate::steam::store;

/// Persisted settings. The identity triplet (namespace, id, name) is what
/// the launch URL is built from; it is copied out of the installed list
/// whenever the selection changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EpicSettings {
    /// Catalog namespace of the selected title
    pub application_namespace: String,
    /// Catalog item id, the dropdown's value
    pub application_id: String,
    /// Internal app name, last launch URL segment
    pub application_name: String,
    /// User-visible title
    pub application_display_name: String,
    /// Installed titles for the property inspector
    pub applications: Vec<EpicInstalledApplication>,
    /// Show the title's name on the key
    pub show_app_name: bool,
    /// Artwork placement policy
    pub image_fit: ImageFit,
}

impl Default for EpicSettings {
    fn default() -> Self {
        Self {
            application_namespace: String::new(),
            application_id: String::new(),
            application_name: String::new(),
            application_display_name: String::new(),
            applications: Vec::new(),
            show_app_name: false,
            image_fit: ImageFit::default(),
        }
    }
}

/// Launch-an-Epic-title key.
pub struct EpicLauncherAction {
    connection: Arc<dyn Connection>,
    process_api: Arc<dyn ProcessApi>,
    settings: EpicSettings,
    key_image: Option<String>,
    title_parameters: Option<TitleParameters>,
}

impl EpicLauncherAction {
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
            key_image: None,
            title_parameters: None,
        };
        action.refresh_selected_app();
        action.persist();
        action
    }

    fn persist(&self) {
        match serde_json::to_value(&self.settings) {
            Ok(value) => self.connection.set_settings(value),
            Err(e) => error!("Failed to serialize Epic settings: {e}"),
        }
    }

    /// Resolves the selected catalog item id against the persisted installed
    /// list, copies its identity fields and downloads its first image.
    fn refresh_selected_app(&mut self) {
        self.key_image = None;

        if self.settings.application_id.is_empty() {
            return;
        }

        let Some(app) = self
            .settings
            .applications
            .iter()
            .find(|app| app.id == self.settings.application_id)
            .cloned()
        else {
            warn!(
                "Selected Epic title {} is not in the installed list",
                self.settings.application_id
            );
            return;
        };

        self.settings.application_namespace = app.namespace.clone();
        self.settings.application_name = app.name.clone();
        self.settings.application_display_name = app.display_name.clone();

        let Some(image_url) = app.image_urls.first() else {
            return;
        };
        let Some(artwork) = store::fetch_image(image_url) else {
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
        if !self.settings.show_app_name || self.settings.application_display_name.is_empty() {
            return;
        }
        if let Some(params) = &self.title_parameters {
            let name = &self.settings.application_display_name;
            self.connection.set_title(Some(&params.split_to_fit(name)));
        }
    }
}

impl Action for EpicLauncherAction {
    fn key_pressed(&mut self) {
        if self.settings.application_namespace.is_empty()
            || self.settings.application_id.is_empty()
            || self.settings.application_name.is_empty()
        {
            warn!("Epic launch requested but no title is selected");
            return;
        }
        let url = epic::launch_url(
            &self.settings.application_namespace,
            &self.settings.application_id,
            &self.settings.application_name,
        );
        info!("Launching Epic title via {url}");
        if let Err(e) = self.process_api.open_url(&url) {
            error!("Epic launch failed: {e}");
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
        self.refresh_selected_app();
        self.persist();
    }

    fn property_inspector_did_appear(&mut self) {
        self.settings.applications = epic::load_installed_apps();
        info!(
            "Found {} installed Epic titles",
            self.settings.applications.len()
        );
        self.persist();
    }

    fn title_parameters_did_change(&mut self, params: TitleParameters) {
        self.title_parameters = Some(params);
    }
}

fn parse_settings(payload: &Value) -> EpicSettings {
    serde_json::from_value(payload.clone()).unwrap_or_else(|e| {
        warn!("Invalid Epic settings payload, using defaults: {e}");
        EpicSettings::default()
    })
}
