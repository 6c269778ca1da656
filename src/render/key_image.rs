//! Composites artwork onto the fixed-size key canvas.
//!
//! Every rendered key starts from a black 144x144 canvas. Store artwork is
//! placed according to an [`ImageFit`] policy, small launcher icons are
//! inset with a margin derived from their size, and a green circle in the
//! lower-left corner marks a running target. The finished canvas is
//! PNG-encoded and handed to the host as a base64 data URI.

use std::fmt;
use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, imageops};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::Result;

/// Width and height of a key canvas in pixels.
pub const KEY_SIZE: u32 = 144;

/// Running-indicator fill color.
const INDICATOR_COLOR: Rgba<u8> = Rgba([0, 210, 106, 255]);
/// Running-indicator circle center.
const INDICATOR_CENTER: (i64, i64) = (30, 120);
/// Running-indicator circle radius in pixels.
const INDICATOR_RADIUS: i64 = 12;

/// Elevation-shield badge edge length in pixels.
const BADGE_SIZE: u32 = 40;
/// Rows from the top of the badge before the shield tapers to its point.
const BADGE_BODY_ROWS: u32 = 22;
/// Shield quadrant colors, after the UAC shield.
const BADGE_BLUE: Rgba<u8> = Rgba([0, 120, 215, 255]);
const BADGE_GOLD: Rgba<u8> = Rgba([255, 200, 40, 255]);

/// Placement policy for artwork whose aspect ratio differs from the canvas.
///
/// Property inspectors persist this as its numeric discriminant, and some
/// send it back as a string, so both encodings deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFit {
    /// Scale the whole source onto the canvas, padding with black.
    #[default]
    Fit,
    /// Scale the shorter dimension to the canvas and crop both overflowing edges equally.
    Center,
    /// Scale the shorter dimension to the canvas and keep the leading edge.
    CropLeft,
    /// Scale the shorter dimension to the canvas and keep the trailing edge.
    CropRight,
}

impl ImageFit {
    fn from_index(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Fit),
            1 => Some(Self::Center),
            2 => Some(Self::CropLeft),
            3 => Some(Self::CropRight),
            _ => None,
        }
    }

    fn index(self) -> u64 {
        match self {
            Self::Fit => 0,
            Self::Center => 1,
            Self::CropLeft => 2,
            Self::CropRight => 3,
        }
    }
}

impl Serialize for ImageFit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.index())
    }
}

impl<'de> Deserialize<'de> for ImageFit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct FitVisitor;

        impl Visitor<'_> for FitVisitor {
            type Value = ImageFit;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an image fit index between 0 and 3")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<ImageFit, E> {
                ImageFit::from_index(value)
                    .ok_or_else(|| E::custom(format!("invalid image fit index {value}")))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<ImageFit, E> {
                let index = u64::try_from(value)
                    .map_err(|_| E::custom(format!("invalid image fit index {value}")))?;
                self.visit_u64(index)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<ImageFit, E> {
                let index: u64 = value
                    .parse()
                    .map_err(|_| E::custom(format!("invalid image fit index {value:?}")))?;
                self.visit_u64(index)
            }
        }

        deserializer.deserialize_any(FitVisitor)
    }
}

fn black_canvas() -> RgbaImage {
    RgbaImage::from_pixel(KEY_SIZE, KEY_SIZE, Rgba([0, 0, 0, 255]))
}

/// Scales `source` so its shorter dimension matches the canvas, preserving
/// aspect ratio. The longer dimension ends up at or beyond `KEY_SIZE`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "scaled dimensions are bounded by the source aspect ratio times KEY_SIZE"
)]
fn scale_to_cover(source: &DynamicImage) -> RgbaImage {
    let (w, h) = (source.width(), source.height());
    if (w == KEY_SIZE && h >= KEY_SIZE) || (h == KEY_SIZE && w >= KEY_SIZE) {
        return source.to_rgba8();
    }
    let (target_w, target_h) = if w >= h {
        (
            (u64::from(w) * u64::from(KEY_SIZE) / u64::from(h.max(1))).max(u64::from(KEY_SIZE))
                as u32,
            KEY_SIZE,
        )
    } else {
        (
            KEY_SIZE,
            (u64::from(h) * u64::from(KEY_SIZE) / u64::from(w.max(1))).max(u64::from(KEY_SIZE))
                as u32,
        )
    };
    source
        .resize_exact(target_w, target_h, FilterType::CatmullRom)
        .to_rgba8()
}

/// Draws `source` onto a fresh black canvas according to `fit`.
pub fn compose(source: &DynamicImage, fit: ImageFit) -> RgbaImage {
    let mut canvas = black_canvas();
    match fit {
        ImageFit::Fit => {
            let scaled = source
                .resize(KEY_SIZE, KEY_SIZE, FilterType::CatmullRom)
                .to_rgba8();
            let x = i64::from((KEY_SIZE - scaled.width()) / 2);
            let y = i64::from((KEY_SIZE - scaled.height()) / 2);
            imageops::overlay(&mut canvas, &scaled, x, y);
        }
        ImageFit::Center | ImageFit::CropLeft | ImageFit::CropRight => {
            let scaled = scale_to_cover(source);
            let overflow_x = scaled.width().saturating_sub(KEY_SIZE);
            let overflow_y = scaled.height().saturating_sub(KEY_SIZE);
            let (x, y) = match fit {
                ImageFit::Center => (overflow_x / 2, overflow_y / 2),
                ImageFit::CropLeft => (0, 0),
                ImageFit::CropRight | ImageFit::Fit => (overflow_x, overflow_y),
            };
            let window = imageops::crop_imm(&scaled, x, y, KEY_SIZE, KEY_SIZE).to_image();
            imageops::overlay(&mut canvas, &window, 0, 0);
        }
    }
    canvas
}

/// Places a launcher icon on the canvas.
///
/// Icons smaller than the canvas are inset by half their shorter dimension
/// on every side, so a 32x32 file icon does not get blown up edge to edge.
/// Larger icons fill the canvas.
pub fn compose_icon(icon: &RgbaImage) -> RgbaImage {
    let mut canvas = black_canvas();
    let (w, h) = (icon.width(), icon.height());
    let margin = if w < KEY_SIZE && h < KEY_SIZE {
        (w.min(h) / 2).min((KEY_SIZE - 1) / 2)
    } else {
        0
    };
    let side = KEY_SIZE - 2 * margin;
    let scaled = DynamicImage::ImageRgba8(icon.clone())
        .resize_exact(side, side, FilterType::CatmullRom)
        .to_rgba8();
    imageops::overlay(&mut canvas, &scaled, i64::from(margin), i64::from(margin));
    canvas
}

/// Returns a copy of `base` with the running-indicator circle drawn over it.
pub fn overlay_running_indicator(base: &RgbaImage) -> RgbaImage {
    let mut canvas = base.clone();
    let (cx, cy) = INDICATOR_CENTER;
    for dy in -INDICATOR_RADIUS..=INDICATOR_RADIUS {
        for dx in -INDICATOR_RADIUS..=INDICATOR_RADIUS {
            if dx * dx + dy * dy > INDICATOR_RADIUS * INDICATOR_RADIUS {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if (0..i64::from(KEY_SIZE)).contains(&x) && (0..i64::from(KEY_SIZE)).contains(&y) {
                canvas.put_pixel(x as u32, y as u32, INDICATOR_COLOR);
            }
        }
    }
    canvas
}

/// Returns a copy of `base` with an elevation shield drawn in the
/// bottom-right corner, marking keys that launch with a UAC prompt.
///
/// The shield is a four-quadrant badge tapering to a point, drawn
/// procedurally so no image asset needs to ship with the plugin.
pub fn overlay_admin_badge(base: &RgbaImage) -> RgbaImage {
    let mut canvas = base.clone();
    let left = KEY_SIZE - BADGE_SIZE;
    let top = KEY_SIZE - BADGE_SIZE;
    let cx = left + BADGE_SIZE / 2;
    let cy = top + BADGE_SIZE / 2;
    for dy in 0..BADGE_SIZE {
        let half = if dy < BADGE_BODY_ROWS {
            BADGE_SIZE / 2
        } else {
            (BADGE_SIZE - dy) * (BADGE_SIZE / 2) / (BADGE_SIZE - BADGE_BODY_ROWS)
        };
        let y = top + dy;
        for x in (cx - half)..(cx + half) {
            let color = if (x < cx) == (y < cy) {
                BADGE_BLUE
            } else {
                BADGE_GOLD
            };
            canvas.put_pixel(x, y, color);
        }
    }
    canvas
}

/// PNG-encodes the canvas and wraps it in a base64 data URI for the host.
pub fn to_data_uri(canvas: &RgbaImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas.clone()).write_to(&mut buffer, ImageFormat::Png)?;
    let encoded = STANDARD.encode(buffer.into_inner());
    Ok(format!("data:image/png;base64,{encoded}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    /// 288x144 source, left half red, right half blue. Already cover-scaled,
    /// so crop offsets are exact and easy to assert on.
    fn wide_two_tone() -> DynamicImage {
        let img = RgbaImage::from_fn(288, 144, |x, _| if x < 144 { RED } else { BLUE });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn center_crop_discards_equal_amounts_from_both_edges() {
        let canvas = compose(&wide_two_tone(), ImageFit::Center);
        // 72px cropped off each side leaves 72 red then 72 blue columns.
        let red_cols = (0..KEY_SIZE)
            .filter(|&x| *canvas.get_pixel(x, 72) == RED)
            .count();
        let blue_cols = (0..KEY_SIZE)
            .filter(|&x| *canvas.get_pixel(x, 72) == BLUE)
            .count();
        assert_eq!(red_cols, 72);
        assert_eq!(blue_cols, 72);
        assert_eq!(*canvas.get_pixel(0, 72), RED);
        assert_eq!(*canvas.get_pixel(KEY_SIZE - 1, 72), BLUE);
    }

    #[test]
    fn crop_left_keeps_leading_edge() {
        let canvas = compose(&wide_two_tone(), ImageFit::CropLeft);
        assert!((0..KEY_SIZE).all(|x| *canvas.get_pixel(x, 72) == RED));
    }

    #[test]
    fn crop_right_keeps_trailing_edge() {
        let canvas = compose(&wide_two_tone(), ImageFit::CropRight);
        assert!((0..KEY_SIZE).all(|x| *canvas.get_pixel(x, 72) == BLUE));
    }

    #[test]
    fn fit_pads_with_black_instead_of_cropping() {
        let canvas = compose(&wide_two_tone(), ImageFit::Fit);
        // A 2:1 source scales to 144x72, centered, leaving black bands.
        assert_eq!(*canvas.get_pixel(72, 0), BLACK);
        assert_eq!(*canvas.get_pixel(72, KEY_SIZE - 1), BLACK);
        assert_ne!(*canvas.get_pixel(72, 72), BLACK);
    }

    #[test]
    fn crop_of_square_source_is_lossless() {
        let img = RgbaImage::from_pixel(KEY_SIZE, KEY_SIZE, RED);
        let canvas = compose(&DynamicImage::ImageRgba8(img), ImageFit::Center);
        assert!(canvas.pixels().all(|p| *p == RED));
    }

    #[test]
    fn small_icon_is_inset_by_half_its_size() {
        let icon = RgbaImage::from_pixel(32, 32, RED);
        let canvas = compose_icon(&icon);
        // 16px black margin on every side, red inside it.
        assert_eq!(*canvas.get_pixel(0, 0), BLACK);
        assert_eq!(*canvas.get_pixel(15, 72), BLACK);
        assert_eq!(*canvas.get_pixel(16, 72), RED);
        assert_eq!(*canvas.get_pixel(KEY_SIZE - 17, 72), RED);
        assert_eq!(*canvas.get_pixel(KEY_SIZE - 16, 72), BLACK);
    }

    #[test]
    fn oversized_icon_fills_the_canvas() {
        let icon = RgbaImage::from_pixel(256, 256, BLUE);
        let canvas = compose_icon(&icon);
        assert!(canvas.pixels().all(|p| *p == BLUE));
    }

    #[test]
    fn running_indicator_paints_circle_without_touching_the_rest() {
        let base = black_canvas();
        let marked = overlay_running_indicator(&base);
        assert_eq!(*marked.get_pixel(30, 120), INDICATOR_COLOR);
        assert_eq!(*marked.get_pixel(30, 120 - 12), INDICATOR_COLOR);
        // One pixel past the radius stays untouched.
        assert_eq!(*marked.get_pixel(30, 120 - 13), BLACK);
        assert_eq!(*marked.get_pixel(KEY_SIZE - 1, 0), BLACK);
    }

    #[test]
    fn admin_badge_fills_the_bottom_right_corner_only() {
        let base = black_canvas();
        let badged = overlay_admin_badge(&base);
        let left = KEY_SIZE - BADGE_SIZE;
        // Top corners of the badge box are inside the shield body.
        assert_eq!(*badged.get_pixel(left + 1, left + 1), BADGE_BLUE);
        assert_eq!(*badged.get_pixel(KEY_SIZE - 2, left + 1), BADGE_GOLD);
        // The taper leaves the box's lower-left corner untouched.
        assert_eq!(*badged.get_pixel(left, KEY_SIZE - 1), BLACK);
        // Nothing outside the badge box changes.
        assert_eq!(*badged.get_pixel(left - 1, KEY_SIZE - 1), BLACK);
        assert_eq!(*badged.get_pixel(72, 72), BLACK);
    }

    #[test]
    fn data_uri_has_png_prefix_and_decodable_payload() {
        let uri = to_data_uri(&black_canvas()).unwrap();
        let payload = uri.strip_prefix("data:image/png;base64,").unwrap();
        let bytes = STANDARD.decode(payload).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), KEY_SIZE);
        assert_eq!(decoded.height(), KEY_SIZE);
    }

    #[test]
    fn image_fit_deserializes_numbers_and_strings() {
        assert_eq!(
            serde_json::from_str::<ImageFit>("2").unwrap(),
            ImageFit::CropLeft
        );
        assert_eq!(
            serde_json::from_str::<ImageFit>("\"1\"").unwrap(),
            ImageFit::Center
        );
        assert!(serde_json::from_str::<ImageFit>("7").is_err());
        assert_eq!(serde_json::to_string(&ImageFit::CropRight).unwrap(), "3");
    }
}
