//! Shared test doubles
//!
//! Recording fakes for the host connection and the OS process seam, used by
//! the action unit tests and the integration tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::actions::Sleeper;
use crate::host::Connection;
use crate::process::{LaunchSpec, ProcessApi, ProcessLister};

/// Records everything an action pushes to the host.
#[derive(Default)]
pub struct MockConnection {
    pub titles: Mutex<Vec<Option<String>>>,
    pub images: Mutex<Vec<Option<String>>>,
    pub settings: Mutex<Vec<Value>>,
    pub alerts: Mutex<usize>,
    pub oks: Mutex<usize>,
}

impl MockConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn alert_count(&self) -> usize {
        *self.alerts.lock()
    }

    pub fn ok_count(&self) -> usize {
        *self.oks.lock()
    }

    pub fn last_settings(&self) -> Option<Value> {
        self.settings.lock().last().cloned()
    }

    pub fn last_title(&self) -> Option<Option<String>> {
        self.titles.lock().last().cloned()
    }

    pub fn last_image(&self) -> Option<Option<String>> {
        self.images.lock().last().cloned()
    }
}

impl Connection for MockConnection {
    fn set_title(&self, title: Option<&str>) {
        self.titles.lock().push(title.map(str::to_string));
    }

    fn set_image(&self, image: Option<&str>) {
        self.images.lock().push(image.map(str::to_string));
    }

    fn set_settings(&self, settings: Value) {
        self.settings.lock().push(settings);
    }

    fn show_alert(&self) {
        *self.alerts.lock() += 1;
    }

    fn show_ok(&self) {
        *self.oks.lock() += 1;
    }
}

/// Scriptable [`ProcessApi`] and [`ProcessLister`] that records every call.
#[derive(Default)]
pub struct MockProcessApi {
    /// Simulated running-process counts per lowercase name.
    pub counts: Mutex<HashMap<String, usize>>,
    pub kills: Mutex<Vec<String>>,
    pub spawns: Mutex<Vec<LaunchSpec>>,
    pub opened_urls: Mutex<Vec<String>>,
    pub foreground_requests: Mutex<Vec<String>>,
    /// What `bring_to_front` reports.
    pub foreground_result: Mutex<bool>,
    /// When set, `spawn` fails with this message.
    pub spawn_failure: Mutex<Option<String>>,
}

impl MockProcessApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_count(&self, name: &str, count: usize) {
        self.counts.lock().insert(name.to_lowercase(), count);
    }

    pub fn spawn_count(&self) -> usize {
        self.spawns.lock().len()
    }

    pub fn kill_count(&self) -> usize {
        self.kills.lock().len()
    }
}

impl ProcessApi for MockProcessApi {
    fn pids_by_name(&self, name: &str) -> Vec<u32> {
        let count = self
            .counts
            .lock()
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or(0);
        (1..=count as u32).collect()
    }

    fn kill_by_name(&self, name: &str) -> crate::Result<usize> {
        let key = name.to_lowercase();
        self.kills.lock().push(key.clone());
        let killed = self.counts.lock().remove(&key).unwrap_or(0);
        Ok(killed)
    }

    fn spawn(&self, spec: &LaunchSpec) -> crate::Result<()> {
        if let Some(message) = self.spawn_failure.lock().clone() {
            return Err(crate::LauncherError::ProcessControl(
                crate::error::StringError::new(message),
            ));
        }
        self.spawns.lock().push(spec.clone());
        Ok(())
    }

    fn bring_to_front(&self, name: &str) -> bool {
        self.foreground_requests.lock().push(name.to_lowercase());
        *self.foreground_result.lock()
    }

    fn open_url(&self, url: &str) -> crate::Result<()> {
        self.opened_urls.lock().push(url.to_string());
        Ok(())
    }
}

impl ProcessLister for MockProcessApi {
    fn process_counts(&self) -> crate::Result<HashMap<String, usize>> {
        Ok(self.counts.lock().clone())
    }
}

/// Records requested sleeps instead of blocking.
#[derive(Default)]
pub struct MockSleeper {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl MockSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl Sleeper for MockSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }
}
