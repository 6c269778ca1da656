//! Key actions
//!
//! One module per action surfaced in the Stream Deck UI. Each action owns
//! its typed settings struct, reacts to the host events defined in
//! [`crate::host::Action`], and talks to the OS only through the injected
//! seams (`ProcessApi`, `ProcessCountCache`, `UwpAppCache`).

pub mod epic;
pub mod launcher;
pub mod process_killer;
pub mod steam;
pub mod uwp;

pub use epic::EpicLauncherAction;
pub use launcher::LauncherAction;
pub use process_killer::ProcessKillerAction;
pub use steam::SteamLauncherAction;
pub use uwp::UwpLauncherAction;

use std::time::Duration;

/// Blocking-delay seam so the kill-then-launch wait is testable.
pub trait Sleeper: Send + Sync {
    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by `std::thread::sleep`.
#[derive(Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
