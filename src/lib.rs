//! Advanced Launcher - Stream Deck launcher actions for Windows
//!
//! Implements the plugin-side logic for a set of Stream Deck actions that
//! launch and manage Windows applications: arbitrary executables, Steam
//! titles, Epic Games titles and UWP/Microsoft Store apps, plus a process
//! killer. The Stream Deck host owns the websocket transport and event
//! dispatch; this crate plugs into it through the narrow [`host`] seam
//! (`Action` + `Connection`).
//!
//! # Requirements
//!
//! - Windows 10/11 (process control, shell icon extraction, WinRT package
//!   manager). Parsers and compositing are platform-independent.

// Module declarations
pub mod actions;
pub mod epic;
pub mod error;
pub mod host;
pub mod process;
pub mod render;
pub mod steam;
pub mod utils;
pub mod uwp;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{LauncherError, Result};
