//! Key-image rendering
//!
//! All three store-backed actions display artwork on a fixed 144x144 key
//! canvas; the compositing routine lives here once, parameterized by the
//! [`ImageFit`] placement policy, instead of being copied per action.
//! Also provides the running-indicator overlay, icon placement for the
//! launcher key, and PNG/base64 encoding for the host.

pub mod key_image;

pub use key_image::{
    ImageFit, KEY_SIZE, compose, compose_icon, overlay_admin_badge, overlay_running_indicator,
    to_data_uri,
};
