//! Host runtime seam
//!
//! The Stream Deck software instantiates one action per configured key and
//! drives it with button, tick and settings events over its own transport.
//! That transport is not reproduced here; this module defines the two
//! contracts the plugin code is written against:
//!
//! - [`Connection`]: the host-owned channel an action pushes titles,
//!   images, settings and key feedback through.
//! - [`Action`]: the event surface the host dispatches into. Dispatch is
//!   single-threaded and synchronous; handlers may block.
//!
//! Settings payloads are opaque key/value JSON owned by the host; each
//! action deserializes its own typed settings struct out of them and
//! persists changes back via [`Connection::set_settings`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel back to the host for one key.
///
/// All calls are fire-and-forget: delivery failures are the transport's
/// problem, not the action's. Images are pushed as `data:image/png;base64,`
/// URIs (see [`crate::render::to_data_uri`]).
pub trait Connection: Send + Sync {
    /// Set or clear the key title.
    fn set_title(&self, title: Option<&str>);
    /// Set or clear the key image (PNG data URI).
    fn set_image(&self, image: Option<&str>);
    /// Persist the action's settings back to the host.
    fn set_settings(&self, settings: Value);
    /// Flash the warning triangle on the key.
    fn show_alert(&self);
    /// Flash the OK checkmark on the key.
    fn show_ok(&self);
}

/// Title rendering parameters delivered by the host.
///
/// Used to break long application names into lines that fit the key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TitleParameters {
    /// Title font size in points
    pub font_size: f32,
    /// Key width in pixels
    pub key_width: u32,
}

impl Default for TitleParameters {
    fn default() -> Self {
        Self {
            font_size: 9.0,
            key_width: 144,
        }
    }
}

impl TitleParameters {
    /// Split a string into newline-separated chunks that fit the key width.
    ///
    /// Uses an average glyph width of 0.6em, the same rough estimate the
    /// official SDK tooling uses. Words longer than a line are hard-wrapped.
    pub fn split_to_fit(&self, text: &str) -> String {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "glyph estimate is a small positive number well within usize"
        )]
        let chars_per_line = ((self.key_width as f32 / (self.font_size * 0.6)).floor() as usize).max(1);

        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        for word in text.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.chars().count() + 1 + word.chars().count() <= chars_per_line {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
            // Hard-wrap oversized words
            while current.chars().count() > chars_per_line {
                let head: String = current.chars().take(chars_per_line).collect();
                let tail: String = current.chars().skip(chars_per_line).collect();
                lines.push(head);
                current = tail;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines.join("\n")
    }
}

/// Event surface for one key action.
///
/// The host calls these from its single dispatch thread. Optional events
/// default to no-ops so actions only implement what they react to.
pub trait Action {
    /// Physical key pressed down.
    fn key_pressed(&mut self);
    /// Physical key released.
    fn key_released(&mut self);
    /// Periodic tick (roughly once per second).
    fn on_tick(&mut self);
    /// Settings changed in the property inspector.
    fn received_settings(&mut self, payload: &Value);
    /// The property inspector for this key was opened.
    fn property_inspector_did_appear(&mut self) {}
    /// Title font/size changed.
    fn title_parameters_did_change(&mut self, _params: TitleParameters) {}
    /// Free-form message from the property inspector.
    fn send_to_plugin(&mut self, _payload: &Value) {}
}
