//! UWP application support
//!
//! Enumerates installed UWP packages through the WinRT `PackageManager`,
//! caches the result for the property inspector, and launches packages via
//! their app-list entries.

pub mod cache;
pub mod enumerator;
pub mod launch;

pub use cache::UwpAppCache;
pub use enumerator::{UwpPackage, enumerate_packages};
pub use launch::launch_by_family_name;
