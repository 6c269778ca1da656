//! Process killer action
//!
//! Terminates every running instance of the configured executable on key
//! press. The key shows the executable's icon.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::host::{Action, Connection};
use crate::process::{ProcessApi, file_stem_lowercase};
use crate::render;
use crate::utils::extract_file_icon;

/// Persisted settings: just the target executable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessKillerSettings {
    /// Full path to the executable whose instances get killed
    pub application: String,
}

/// Kill-all-instances key.
pub struct ProcessKillerAction {
    connection: Arc<dyn Connection>,
    process_api: Arc<dyn ProcessApi>,
    settings: ProcessKillerSettings,
    key_image: Option<String>,
}

impl ProcessKillerAction {
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
        };
        action.refresh_icon();
        action.persist();
        action
    }

    fn persist(&self) {
        match serde_json::to_value(&self.settings) {
            Ok(value) => self.connection.set_settings(value),
            Err(e) => error!("Failed to serialize process killer settings: {e}"),
        }
    }

    fn refresh_icon(&mut self) {
        self.key_image = None;

        let program = PathBuf::from(&self.settings.application);
        if self.settings.application.is_empty() || !program.exists() {
            return;
        }

        match extract_file_icon(&program) {
            Ok(Some(icon)) => {
                let canvas = render::compose_icon(&icon);
                match render::to_data_uri(&canvas) {
                    Ok(uri) => self.key_image = Some(uri),
                    Err(e) => warn!("Key image encoding failed: {e}"),
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Icon extraction failed for {program:?}: {e}"),
        }
    }
}

impl Action for ProcessKillerAction {
    fn key_pressed(&mut self) {
        if self.settings.application.is_empty() {
            error!("Kill requested but no application is configured");
            self.connection.show_alert();
            return;
        }

        let program = PathBuf::from(&self.settings.application);
        if !program.exists() {
            error!("Application not found: {program:?}");
            self.connection.show_alert();
            return;
        }

        let name = file_stem_lowercase(&self.settings.application);
        match self.process_api.kill_by_name(&name) {
            Ok(killed) => info!("Killed {killed} instance(s) of {name}"),
            Err(e) => {
                error!("Failed to kill instances of {name}: {e}");
                self.connection.show_alert();
            }
        }
    }

    fn key_released(&mut self) {}

    fn on_tick(&mut self) {
        if let Some(uri) = self.key_image.as_deref() {
            self.connection.set_image(Some(uri));
        }
    }

    fn received_settings(&mut self, payload: &Value) {
        self.settings = parse_settings(payload);
        self.refresh_icon();
        self.persist();
    }
}

fn parse_settings(payload: &Value) -> ProcessKillerSettings {
    serde_json::from_value(payload.clone()).unwrap_or_else(|e| {
        warn!("Invalid process killer settings payload, using defaults: {e}");
        ProcessKillerSettings::default()
    })
}
