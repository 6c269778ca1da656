//! Process enumeration, control and the count cache
//!
//! - [`ProcessApi`]: the trait seam actions use for spawn/kill/foreground,
//!   with [`WindowsProcessApi`] as the production implementation.
//! - [`ProcessCountCache`]: TTL-bounded name → count snapshot shared by
//!   every key that shows a running indicator.
//! - [`foreground`]: best-effort bring-to-front with a minimize/restore
//!   fallback.
//!
//! Process names are executable file stems, lowercase, without extension;
//! all matching is case-insensitive.

pub mod cache;
pub mod control;
pub mod foreground;

pub use cache::{CACHE_TTL, ProcessCountCache};
pub use control::{LaunchSpec, ProcessApi, ProcessLister, WindowsProcessApi, shell_open};

/// Normalize a file name or path to the lowercase stem used for matching.
///
/// `C:\Windows\notepad.exe` and `NOTEPAD.EXE` both become `notepad`.
pub fn file_stem_lowercase(name: &str) -> String {
    let filename = name
        .rsplit(['\\', '/'])
        .next()
        .unwrap_or(name);
    let stem = filename.rfind('.').map_or(filename, |pos| &filename[..pos]);
    stem.to_lowercase()
}
