//! Icon extraction from executables
//!
//! Extracts the associated icon of a target executable through the Windows
//! Shell32 API so the launcher key can display it.

use crate::error::Result;
use image::RgbaImage;
use std::path::Path;
use tracing::debug;

#[cfg(windows)]
use crate::error::LauncherError;

#[cfg(windows)]
use tracing::warn;

#[cfg(windows)]
use windows::Win32::Graphics::Gdi::{
    BITMAP, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, CreateCompatibleDC, DIB_RGB_COLORS, DeleteDC,
    DeleteObject, GetDIBits, GetObjectW, SelectObject,
};
#[cfg(windows)]
use windows::Win32::Storage::FileSystem::FILE_FLAGS_AND_ATTRIBUTES;
#[cfg(windows)]
use windows::Win32::UI::Shell::{
    ExtractIconExW, SHFILEINFOW, SHGFI_ICON, SHGFI_LARGEICON, SHGetFileInfoW,
};
#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{DestroyIcon, GetIconInfo, HICON, ICONINFO};
#[cfg(windows)]
use windows::core::PCWSTR;

/// Extract the icon associated with an executable file.
///
/// Returns the icon at its native size; key-canvas placement is handled by
/// the renderer. On non-Windows platforms this is a stub that always returns
/// `None`.
pub fn extract_file_icon(#[allow(unused_variables)] path: &Path) -> Result<Option<RgbaImage>> {
    #[cfg(windows)]
    {
        extract_file_icon_windows(path)
    }

    #[cfg(not(windows))]
    {
        debug!("Icon extraction not supported on non-Windows platforms");
        Ok(None)
    }
}

#[cfg(windows)]
#[expect(unsafe_code, reason = "Shell32 icon extraction requires FFI")]
fn extract_file_icon_windows(path: &Path) -> Result<Option<RgbaImage>> {
    use std::os::windows::ffi::OsStrExt;

    let wide_path: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    debug!("Extracting icon from: {:?}", path);

    let mut large_icon: HICON = HICON::default();

    // SAFETY: wide_path is null-terminated and outlives the call; large_icon
    // receives at most one handle which is destroyed below.
    unsafe {
        let result = ExtractIconExW(
            PCWSTR(wide_path.as_ptr()),
            0,
            Some(&raw mut large_icon),
            None,
            1,
        );

        if result == 0 {
            warn!("ExtractIconExW failed for {:?}, trying SHGetFileInfoW", path);
            return extract_icon_using_shgetfileinfo(&wide_path);
        }
    }

    let icon = hicon_to_image(large_icon);

    // SAFETY: large_icon was returned by ExtractIconExW and is no longer used.
    unsafe {
        let _ = DestroyIcon(large_icon);
    }

    match icon {
        Ok(image) => Ok(Some(image)),
        Err(e) => {
            warn!("Failed to convert HICON to RGBA: {e}");
            Ok(None)
        }
    }
}

/// Fallback icon extraction using SHGetFileInfoW
#[cfg(windows)]
#[expect(unsafe_code, reason = "Shell32 icon extraction requires FFI")]
fn extract_icon_using_shgetfileinfo(wide_path: &[u16]) -> Result<Option<RgbaImage>> {
    use std::mem::zeroed;

    // SAFETY: file_info is zero-initialized and sized per the API contract;
    // the returned hIcon is destroyed before returning.
    unsafe {
        let mut file_info: SHFILEINFOW = zeroed();

        let result = SHGetFileInfoW(
            PCWSTR(wide_path.as_ptr()),
            FILE_FLAGS_AND_ATTRIBUTES(0),
            Some(&mut file_info),
            std::mem::size_of::<SHFILEINFOW>() as u32,
            SHGFI_ICON | SHGFI_LARGEICON,
        );

        if result == 0 {
            warn!("SHGetFileInfoW failed, no icon available");
            return Ok(None);
        }

        let icon = hicon_to_image(file_info.hIcon);
        let _ = DestroyIcon(file_info.hIcon);

        match icon {
            Ok(image) => Ok(Some(image)),
            Err(e) => {
                warn!("Failed to convert HICON to RGBA: {e}");
                Ok(None)
            }
        }
    }
}

/// Convert an HICON handle into an RGBA image at the icon's native size.
#[cfg(windows)]
#[expect(unsafe_code, reason = "GDI bitmap readout requires FFI")]
fn hicon_to_image(hicon: HICON) -> Result<RgbaImage> {
    use std::mem::zeroed;

    // SAFETY: all GDI objects obtained here are released on every path, and
    // the pixel buffer is sized to width * height * 4 before GetDIBits fills it.
    unsafe {
        let mut icon_info: ICONINFO = zeroed();
        if GetIconInfo(hicon, &mut icon_info).is_err() {
            return Err(LauncherError::WindowsApi(
                windows::core::Error::from_thread(),
            ));
        }

        let color_bitmap = icon_info.hbmColor;
        let mask_bitmap = icon_info.hbmMask;

        let mut bitmap: BITMAP = zeroed();
        if GetObjectW(
            color_bitmap.into(),
            std::mem::size_of::<BITMAP>() as i32,
            Some((&raw mut bitmap).cast()),
        ) == 0
        {
            let _ = DeleteObject(color_bitmap.into());
            let _ = DeleteObject(mask_bitmap.into());
            return Err(LauncherError::WindowsApi(
                windows::core::Error::from_thread(),
            ));
        }

        let width = bitmap.bmWidth.unsigned_abs();
        let height = bitmap.bmHeight.unsigned_abs();

        let hdc = CreateCompatibleDC(None);
        if hdc.is_invalid() {
            let _ = DeleteObject(color_bitmap.into());
            let _ = DeleteObject(mask_bitmap.into());
            return Err(LauncherError::WindowsApi(
                windows::core::Error::from_thread(),
            ));
        }

        let old_bitmap = SelectObject(hdc, color_bitmap.into());

        let mut bmi: BITMAPINFO = zeroed();
        bmi.bmiHeader.biSize = std::mem::size_of::<BITMAPINFOHEADER>() as u32;
        bmi.bmiHeader.biWidth = bitmap.bmWidth;
        bmi.bmiHeader.biHeight = -bitmap.bmHeight; // Negative for top-down DIB
        bmi.bmiHeader.biPlanes = 1;
        bmi.bmiHeader.biBitCount = 32;
        bmi.bmiHeader.biCompression = BI_RGB.0;

        let mut buffer = vec![0u8; (width * height * 4) as usize];

        let result = GetDIBits(
            hdc,
            color_bitmap,
            0,
            height,
            Some(buffer.as_mut_ptr().cast()),
            &mut bmi,
            DIB_RGB_COLORS,
        );

        let _ = SelectObject(hdc, old_bitmap);
        let _ = DeleteDC(hdc);
        let _ = DeleteObject(color_bitmap.into());
        let _ = DeleteObject(mask_bitmap.into());

        if result == 0 {
            return Err(LauncherError::WindowsApi(
                windows::core::Error::from_thread(),
            ));
        }

        // GDI hands back BGRA
        for i in (0..buffer.len()).step_by(4) {
            buffer.swap(i, i + 2);
        }

        RgbaImage::from_raw(width, height, buffer).ok_or_else(|| {
            LauncherError::WindowsApi(windows::core::Error::new(
                windows::Win32::Foundation::E_FAIL,
                "icon bitmap dimensions did not match pixel data",
            ))
        })
    }
}
