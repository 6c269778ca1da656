//! Bring-to-front
//!
//! Best-effort foregrounding of an already-running application: pick the
//! most recently created instance (largest PID) that owns a top-level
//! window with a non-empty title, ask Windows to foreground it, and if the
//! window stays minimized force it with a minimize/restore pair. One
//! attempt, one fallback, no retry loop.

use crate::process::ProcessApi;

/// Bring the named process's window to the foreground.
///
/// Returns false when no instance with a titled window exists.
#[cfg(windows)]
pub fn bring_to_front(api: &dyn ProcessApi, process_name: &str) -> bool {
    use tracing::{error, info, warn};

    let mut pids = api.pids_by_name(process_name);
    if pids.is_empty() {
        error!("Could not find process for {process_name}");
        return false;
    }
    // Largest PID approximates the most recently created instance
    pids.sort_unstable_by(|a, b| b.cmp(a));

    let Some(hwnd) = pids.iter().find_map(|pid| find_main_window(*pid)) else {
        error!("No titled window found for {process_name}");
        return false;
    };

    if set_foreground(hwnd) && !is_minimized(hwnd) {
        info!("Successfully set foreground window for {process_name} HWND: {hwnd:?}");
        return true;
    }

    warn!("Failed to set foreground window for {process_name} HWND: {hwnd:?}, trying to force it");
    minimize_and_restore(hwnd);
    true
}

/// Non-Windows stub.
#[cfg(not(windows))]
pub fn bring_to_front(_api: &dyn ProcessApi, _process_name: &str) -> bool {
    false
}

/// Find a visible top-level window with a non-empty title owned by the PID.
///
/// # Safety
///
/// The `EnumWindows` callback receives a pointer to a stack-local
/// `WindowSearch` through `LPARAM`; the pointer is valid for the whole
/// enumeration because `EnumWindows` is synchronous. Window text is read
/// into a fixed buffer sized by `GetWindowTextLengthW` + 1.
#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "Windows FFI for EnumWindows/GetWindowTextW window discovery"
)]
fn find_main_window(pid: u32) -> Option<windows::Win32::Foundation::HWND> {
    use windows::Win32::Foundation::{BOOL, HWND, LPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowTextLengthW, GetWindowThreadProcessId, IsWindowVisible,
    };

    struct WindowSearch {
        pid: u32,
        found: Option<HWND>,
    }

    unsafe extern "system" fn callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let search = unsafe { &mut *(lparam.0 as *mut WindowSearch) };

        let mut window_pid = 0u32;
        unsafe {
            GetWindowThreadProcessId(hwnd, Some(&raw mut window_pid));
        }
        if window_pid != search.pid {
            return true.into();
        }
        let visible = unsafe { IsWindowVisible(hwnd).as_bool() };
        let title_len = unsafe { GetWindowTextLengthW(hwnd) };
        if visible && title_len > 0 {
            search.found = Some(hwnd);
            return false.into(); // Stop enumeration
        }
        true.into()
    }

    let mut search = WindowSearch { pid, found: None };
    unsafe {
        // EnumWindows returns an error when the callback stops it early;
        // that is the success path here.
        let _ = EnumWindows(Some(callback), LPARAM(&raw mut search as isize));
    }
    search.found
}

#[cfg(windows)]
#[expect(unsafe_code, reason = "Windows FFI for SetForegroundWindow")]
fn set_foreground(hwnd: windows::Win32::Foundation::HWND) -> bool {
    use windows::Win32::UI::WindowsAndMessaging::SetForegroundWindow;
    unsafe { SetForegroundWindow(hwnd).as_bool() }
}

#[cfg(windows)]
#[expect(unsafe_code, reason = "Windows FFI for IsIconic")]
fn is_minimized(hwnd: windows::Win32::Foundation::HWND) -> bool {
    use windows::Win32::UI::WindowsAndMessaging::IsIconic;
    unsafe { IsIconic(hwnd).as_bool() }
}

/// Minimize-then-restore forces Windows to hand over foreground status.
#[cfg(windows)]
#[expect(unsafe_code, reason = "Windows FFI for ShowWindow")]
fn minimize_and_restore(hwnd: windows::Win32::Foundation::HWND) {
    use windows::Win32::UI::WindowsAndMessaging::{SW_MINIMIZE, SW_RESTORE, ShowWindow};
    unsafe {
        let _ = ShowWindow(hwnd, SW_MINIMIZE);
        let _ = ShowWindow(hwnd, SW_RESTORE);
    }
}
