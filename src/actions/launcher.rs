//! Launcher action
//!
//! Starts a configured executable on key press, with optional instance
//! limiting, kill-before-launch, elevation, background launch and
//! environment variable expansion. A long press can instead kill every
//! running instance. The key shows the executable's icon, with a green
//! dot overlaid while at least one instance is running.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::actions::Sleeper;
use crate::error::LauncherError;
use crate::host::{Action, Connection};
use crate::process::{LaunchSpec, ProcessApi, ProcessCountCache, file_stem_lowercase};
use crate::render;
use crate::utils::{expand_env_vars, extract_file_icon};

const DEFAULT_MAX_INSTANCES: usize = 1;
const DEFAULT_POST_KILL_DELAY_SECONDS: u64 = 0;
const DEFAULT_LONG_KEYPRESS_MS: u64 = 600;

/// What a long press does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LongPressAction {
    /// Long press is ignored
    #[default]
    Nothing,
    /// Long press kills every running instance
    KillProcess,
}

impl LongPressAction {
    fn from_index(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Nothing),
            1 => Some(Self::KillProcess),
            _ => None,
        }
    }
}

impl Serialize for LongPressAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(match self {
            Self::Nothing => 0,
            Self::KillProcess => 1,
        })
    }
}

impl<'de> Deserialize<'de> for LongPressAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ActionVisitor;

        impl Visitor<'_> for ActionVisitor {
            type Value = LongPressAction;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a long press action index (0 or 1)")
            }

            fn visit_u64<E: de::Error>(
                self,
                value: u64,
            ) -> std::result::Result<LongPressAction, E> {
                LongPressAction::from_index(value)
                    .ok_or_else(|| E::custom(format!("invalid long press action {value}")))
            }

            fn visit_i64<E: de::Error>(
                self,
                value: i64,
            ) -> std::result::Result<LongPressAction, E> {
                let index = u64::try_from(value)
                    .map_err(|_| E::custom(format!("invalid long press action {value}")))?;
                self.visit_u64(index)
            }

            fn visit_str<E: de::Error>(
                self,
                value: &str,
            ) -> std::result::Result<LongPressAction, E> {
                let index: u64 = value
                    .parse()
                    .map_err(|_| E::custom(format!("invalid long press action {value:?}")))?;
                self.visit_u64(index)
            }
        }

        deserializer.deserialize_any(ActionVisitor)
    }
}

/// Persisted settings, as the property inspector writes them.
///
/// Numeric fields arrive as strings and are re-validated on every change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LauncherSettings {
    /// Full path to the executable
    pub application: String,
    /// Raw argument string passed through to the process
    pub app_arguments: String,
    /// Working directory, defaulted to the executable's folder
    pub app_start_in: String,
    /// Cap the number of running instances
    pub limit_instances: bool,
    /// Instance cap, string-typed (default "1")
    pub max_instances: String,
    /// Kill all running instances before launching
    pub kill_instances: bool,
    /// Seconds to wait between kill and relaunch, string-typed
    pub post_kill_launch_delay: String,
    /// Launch elevated (UAC prompt)
    pub run_as_admin: bool,
    /// Overlay a green dot while an instance is running
    pub show_running_indicator: bool,
    /// When the instance cap blocks a launch, focus the running instance
    pub bring_to_front: bool,
    /// Launch with a hidden window
    pub background_run: bool,
    /// Expand `%VAR%` references in the path and arguments
    pub env_vars: bool,
    /// Long-press threshold in milliseconds, string-typed
    pub long_keypress_time: String,
    /// What a long press does
    pub long_press_action: LongPressAction,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            application: String::new(),
            app_arguments: String::new(),
            app_start_in: String::new(),
            limit_instances: false,
            max_instances: DEFAULT_MAX_INSTANCES.to_string(),
            kill_instances: false,
            post_kill_launch_delay: DEFAULT_POST_KILL_DELAY_SECONDS.to_string(),
            run_as_admin: false,
            show_running_indicator: false,
            bring_to_front: false,
            background_run: false,
            env_vars: false,
            long_keypress_time: DEFAULT_LONG_KEYPRESS_MS.to_string(),
            long_press_action: LongPressAction::default(),
        }
    }
}

/// Launch-an-executable key.
pub struct LauncherAction {
    connection: Arc<dyn Connection>,
    process_api: Arc<dyn ProcessApi>,
    process_counts: Arc<ProcessCountCache>,
    sleeper: Arc<dyn Sleeper>,
    settings: LauncherSettings,
    max_instances: usize,
    post_kill_delay: Duration,
    long_press_threshold: Duration,
    pressed_at: Option<Instant>,
    idle_image: Option<String>,
    running_image: Option<String>,
}

impl LauncherAction {
    /// Build the action from the host's initial settings payload.
    ///
    /// Derived state is initialized immediately and the (possibly
    /// corrected) settings are persisted back.
    pub fn new(
        connection: Arc<dyn Connection>,
        process_api: Arc<dyn ProcessApi>,
        process_counts: Arc<ProcessCountCache>,
        sleeper: Arc<dyn Sleeper>,
        payload: &Value,
    ) -> Self {
        let settings = parse_settings(payload);
        let mut action = Self {
            connection,
            process_api,
            process_counts,
            sleeper,
            settings,
            max_instances: DEFAULT_MAX_INSTANCES,
            post_kill_delay: Duration::from_secs(DEFAULT_POST_KILL_DELAY_SECONDS),
            long_press_threshold: Duration::from_millis(DEFAULT_LONG_KEYPRESS_MS),
            pressed_at: None,
            idle_image: None,
            running_image: None,
        };
        action.initialize();
        action.persist();
        action
    }

    /// Re-validates numeric settings, applies the kill-implies-single-instance
    /// rule and refreshes the key icon.
    fn initialize(&mut self) {
        if self.settings.kill_instances {
            self.settings.max_instances = "1".to_string();
        }

        self.max_instances =
            parse_or_reset(&mut self.settings.max_instances, DEFAULT_MAX_INSTANCES);
        self.post_kill_delay = Duration::from_secs(parse_or_reset(
            &mut self.settings.post_kill_launch_delay,
            DEFAULT_POST_KILL_DELAY_SECONDS,
        ));
        self.long_press_threshold = Duration::from_millis(parse_or_reset(
            &mut self.settings.long_keypress_time,
            DEFAULT_LONG_KEYPRESS_MS,
        ));

        self.refresh_icon();
    }

    fn persist(&self) {
        match serde_json::to_value(&self.settings) {
            Ok(value) => self.connection.set_settings(value),
            Err(e) => error!("Failed to serialize launcher settings: {e}"),
        }
    }

    /// Application path with `%VAR%` references expanded when enabled.
    fn resolved_application(&self) -> PathBuf {
        let raw = if self.settings.env_vars {
            expand_env_vars(&self.settings.application)
        } else {
            self.settings.application.clone()
        };
        PathBuf::from(raw)
    }

    fn process_name(&self) -> String {
        file_stem_lowercase(&self.settings.application)
    }

    fn refresh_icon(&mut self) {
        self.idle_image = None;
        self.running_image = None;

        let program = self.resolved_application();
        if self.settings.application.is_empty() || !program.exists() {
            return;
        }

        let icon = match extract_file_icon(&program) {
            Ok(Some(icon)) => icon,
            Ok(None) => return,
            Err(e) => {
                warn!("Icon extraction failed for {program:?}: {e}");
                return;
            }
        };

        let mut canvas = render::compose_icon(&icon);
        if self.settings.run_as_admin {
            canvas = render::overlay_admin_badge(&canvas);
        }
        let marked = render::overlay_running_indicator(&canvas);
        match (render::to_data_uri(&canvas), render::to_data_uri(&marked)) {
            (Ok(idle), Ok(running)) => {
                self.idle_image = Some(idle);
                self.running_image = Some(running);
            }
            (Err(e), _) | (_, Err(e)) => warn!("Key image encoding failed: {e}"),
        }
    }

    fn short_press(&mut self) {
        if self.settings.application.is_empty() {
            error!("Launch requested but no application is configured");
            self.connection.show_alert();
            return;
        }

        let program = self.resolved_application();
        if !program.exists() {
            let e = LauncherError::ApplicationNotFound(program.display().to_string());
            error!("Launch failed: {e}");
            self.connection.show_alert();
            return;
        }

        let name = self.process_name();

        if self.settings.kill_instances {
            match self.process_api.kill_by_name(&name) {
                Ok(killed) => info!("Killed {killed} instance(s) of {name}"),
                Err(e) => warn!("Failed to kill instances of {name}: {e}"),
            }
            if !self.post_kill_delay.is_zero() {
                info!(
                    "Waiting {}s before relaunching {name}",
                    self.post_kill_delay.as_secs()
                );
                self.sleeper.sleep(self.post_kill_delay);
            }
        }

        if self.settings.limit_instances {
            let running = self.process_api.pids_by_name(&name).len();
            if running >= self.max_instances {
                info!(
                    "{name} already has {running} instance(s) (max {}), not launching",
                    self.max_instances
                );
                if self.settings.bring_to_front && !self.process_api.bring_to_front(&name) {
                    warn!("Could not bring {name} to the foreground");
                }
                return;
            }
        }

        let working_dir = Some(PathBuf::from(&self.settings.app_start_in))
            .filter(|dir| !dir.as_os_str().is_empty() && dir.is_dir());
        let arguments = if self.settings.env_vars {
            expand_env_vars(&self.settings.app_arguments)
        } else {
            self.settings.app_arguments.clone()
        };

        let spec = LaunchSpec {
            program,
            arguments,
            working_dir,
            elevated: self.settings.run_as_admin,
            background: self.settings.background_run,
        };

        info!("Launching {:?}", spec.program);
        if let Err(e) = self.process_api.spawn(&spec) {
            error!("Launch failed: {e}");
            self.connection.show_alert();
        }
    }

    fn long_press(&mut self) {
        match self.settings.long_press_action {
            LongPressAction::Nothing => {}
            LongPressAction::KillProcess => {
                if self.settings.application.is_empty() {
                    self.connection.show_alert();
                    return;
                }
                let name = self.process_name();
                match self.process_api.kill_by_name(&name) {
                    Ok(killed) => {
                        info!("Long press killed {killed} instance(s) of {name}");
                        self.connection.show_ok();
                    }
                    Err(e) => {
                        error!("Long press kill failed for {name}: {e}");
                        self.connection.show_alert();
                    }
                }
            }
        }
    }
}

impl Action for LauncherAction {
    fn key_pressed(&mut self) {
        self.pressed_at = Some(Instant::now());
    }

    fn key_released(&mut self) {
        let held_long = self
            .pressed_at
            .take()
            .is_some_and(|pressed| pressed.elapsed() >= self.long_press_threshold);
        if held_long {
            self.long_press();
        } else {
            self.short_press();
        }
    }

    fn on_tick(&mut self) {
        let image = if self.settings.show_running_indicator
            && self.process_counts.count(&self.process_name()) > 0
        {
            self.running_image.as_deref()
        } else {
            self.idle_image.as_deref()
        };
        if let Some(uri) = image {
            self.connection.set_image(Some(uri));
        }
    }

    fn received_settings(&mut self, payload: &Value) {
        let previous_application = self.settings.application.clone();
        self.settings = parse_settings(payload);

        // A newly picked executable resets the working directory to its folder
        if self.settings.application != previous_application
            && !self.settings.application.is_empty()
        {
            if let Some(parent) = self.resolved_application().parent() {
                self.settings.app_start_in = parent.to_string_lossy().into_owned();
            }
        }

        self.initialize();
        self.persist();
    }
}

/// Deserializes the settings payload, recovering field by field when the
/// whole-struct pass fails so one malformed field does not throw away the
/// valid ones.
fn parse_settings(payload: &Value) -> LauncherSettings {
    match serde_json::from_value(payload.clone()) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Launcher settings payload partially invalid, recovering per field: {e}");
            let mut settings = LauncherSettings::default();
            let Some(map) = payload.as_object() else {
                return settings;
            };
            parse_field(map, "application", &mut settings.application);
            parse_field(map, "appArguments", &mut settings.app_arguments);
            parse_field(map, "appStartIn", &mut settings.app_start_in);
            parse_field(map, "limitInstances", &mut settings.limit_instances);
            parse_field(map, "maxInstances", &mut settings.max_instances);
            parse_field(map, "killInstances", &mut settings.kill_instances);
            parse_field(map, "postKillLaunchDelay", &mut settings.post_kill_launch_delay);
            parse_field(map, "runAsAdmin", &mut settings.run_as_admin);
            parse_field(map, "showRunningIndicator", &mut settings.show_running_indicator);
            parse_field(map, "bringToFront", &mut settings.bring_to_front);
            parse_field(map, "backgroundRun", &mut settings.background_run);
            parse_field(map, "envVars", &mut settings.env_vars);
            parse_field(map, "longKeypressTime", &mut settings.long_keypress_time);
            parse_field(map, "longPressAction", &mut settings.long_press_action);
            settings
        }
    }
}

/// Overwrites `slot` with the payload's value for `key` when it is present
/// and deserializes; otherwise the default already in `slot` stands.
fn parse_field<T: serde::de::DeserializeOwned>(
    map: &serde_json::Map<String, Value>,
    key: &str,
    slot: &mut T,
) {
    if let Some(value) = map.get(key) {
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => *slot = parsed,
            Err(e) => warn!("Ignoring invalid setting {key:?}: {e}"),
        }
    }
}

/// Parses a string-typed numeric setting. Invalid values are replaced by the
/// default, both in the returned value and in the persisted string.
fn parse_or_reset<T: std::str::FromStr + ToString + Copy>(field: &mut String, default: T) -> T {
    match field.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Invalid numeric setting {field:?}, falling back to {}", default.to_string());
            *field = default.to_string();
            default
        }
    }
}
