//! Process control seam and Windows implementation
//!
//! Actions never talk to the OS directly; they go through the
//! [`ProcessApi`] trait so tests can substitute a recording fake. The
//! Windows implementation enumerates processes with the Toolhelp32
//! snapshot API, terminates by PID, spawns through `std::process::Command`
//! (or `ShellExecuteW` with the `runas` verb for elevation) and opens
//! `steam://`/`com.epicgames.launcher://` URLs through the shell.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::Result;

#[cfg(windows)]
use crate::error::LauncherError;

/// Everything needed to start one process.
#[derive(Debug, Clone, Default)]
pub struct LaunchSpec {
    /// Full path to the executable
    pub program: PathBuf,
    /// Raw argument string, passed through as typed in the inspector
    pub arguments: String,
    /// Working directory, when it exists
    pub working_dir: Option<PathBuf>,
    /// Launch elevated (UAC prompt)
    pub elevated: bool,
    /// Launch with a hidden window
    pub background: bool,
}

/// OS process/window operations the actions depend on.
///
/// Process names are executable file stems, matched case-insensitively.
pub trait ProcessApi: Send + Sync {
    /// PIDs of all running processes with the given name.
    fn pids_by_name(&self, name: &str) -> Vec<u32>;
    /// Terminate every process with the given name. Returns the number killed.
    fn kill_by_name(&self, name: &str) -> Result<usize>;
    /// Start a process.
    fn spawn(&self, spec: &LaunchSpec) -> Result<()>;
    /// Bring the newest window of the named process to the foreground.
    /// Returns false when no suitable window exists.
    fn bring_to_front(&self, name: &str) -> bool;
    /// Open a URL (or any shell-registered scheme) with its default handler.
    fn open_url(&self, url: &str) -> Result<()>;
}

/// Source of full name → count process snapshots for the count cache.
pub trait ProcessLister: Send + Sync {
    /// Current count of running processes per lowercase name (no extension).
    fn process_counts(&self) -> Result<HashMap<String, usize>>;
}

/// Production [`ProcessApi`] backed by the Win32 APIs.
#[derive(Debug, Default)]
pub struct WindowsProcessApi;

impl WindowsProcessApi {
    /// Create the production process API.
    pub fn new() -> Self {
        Self
    }
}

impl ProcessLister for WindowsProcessApi {
    fn process_counts(&self) -> Result<HashMap<String, usize>> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for (name, pids) in enumerate_processes()? {
            counts.insert(name, pids.len());
        }
        Ok(counts)
    }
}

impl ProcessApi for WindowsProcessApi {
    fn pids_by_name(&self, name: &str) -> Vec<u32> {
        let name = name.to_lowercase();
        match enumerate_processes() {
            Ok(map) => map.get(&name).cloned().unwrap_or_default(),
            Err(e) => {
                tracing::error!("Process enumeration failed: {e}");
                Vec::new()
            }
        }
    }

    fn kill_by_name(&self, name: &str) -> Result<usize> {
        let pids = self.pids_by_name(name);
        let mut killed = 0;
        for pid in &pids {
            tracing::info!("Killing process: {name} PID: {pid}");
            match terminate_process(*pid) {
                Ok(()) => killed += 1,
                Err(e) => tracing::warn!("Failed to kill PID {pid}: {e}"),
            }
        }
        Ok(killed)
    }

    fn spawn(&self, spec: &LaunchSpec) -> Result<()> {
        spawn_process(spec)
    }

    fn bring_to_front(&self, name: &str) -> bool {
        crate::process::foreground::bring_to_front(self, name)
    }

    fn open_url(&self, url: &str) -> Result<()> {
        shell_open(url)
    }
}

/// Enumerate all running processes as lowercase-stem → PIDs.
///
/// # Safety
///
/// `CreateToolhelp32Snapshot` is called with valid flags; the handle is
/// wrapped in an RAII guard so it is closed on every path.
/// `PROCESSENTRY32W` is initialized with the correct `dwSize`, and the
/// `Process32FirstW`/`NextW` return codes are checked before any field of
/// the entry is read.
#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "Windows FFI for process enumeration via CreateToolhelp32Snapshot and Process32FirstW/NextW"
)]
pub fn enumerate_processes() -> Result<HashMap<String, Vec<u32>>> {
    use windows::Win32::Foundation::ERROR_NO_MORE_FILES;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
        TH32CS_SNAPPROCESS,
    };

    let snapshot = unsafe {
        CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0).map_err(|e| {
            tracing::error!("CreateToolhelp32Snapshot failed: {e}");
            LauncherError::ProcessControl(Box::new(e))
        })?
    };
    let _guard = SnapshotGuard(snapshot);

    let mut processes: HashMap<String, Vec<u32>> = HashMap::new();

    #[expect(
        clippy::cast_possible_truncation,
        reason = "size_of::<PROCESSENTRY32W>() is a compile-time constant that fits in u32"
    )]
    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    let mut has_process = unsafe { Process32FirstW(snapshot, &raw mut entry).is_ok() };
    while has_process {
        if let Some(name) = wide_to_string(&entry.szExeFile) {
            let stem = crate::process::file_stem_lowercase(&name);
            processes.entry(stem).or_default().push(entry.th32ProcessID);
        }

        has_process = unsafe {
            match Process32NextW(snapshot, &raw mut entry) {
                Ok(()) => true,
                Err(e) => {
                    if e.code() != ERROR_NO_MORE_FILES.to_hresult() {
                        tracing::warn!("Error iterating processes: {e}");
                    }
                    false
                }
            }
        };
    }

    Ok(processes)
}

/// Non-Windows stub; nothing to enumerate.
#[cfg(not(windows))]
pub fn enumerate_processes() -> Result<HashMap<String, Vec<u32>>> {
    Ok(HashMap::new())
}

/// RAII guard for a Toolhelp snapshot handle.
#[cfg(windows)]
struct SnapshotGuard(windows::Win32::Foundation::HANDLE);

#[cfg(windows)]
impl Drop for SnapshotGuard {
    #[expect(
        unsafe_code,
        reason = "Windows FFI for CloseHandle to release the snapshot handle"
    )]
    fn drop(&mut self) {
        unsafe {
            let _ = windows::Win32::Foundation::CloseHandle(self.0);
        }
    }
}

/// Terminate one process by PID.
///
/// # Safety
///
/// The handle from `OpenProcess` is validated before use and closed via
/// the same RAII pattern as the snapshot guard.
#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "Windows FFI for OpenProcess/TerminateProcess"
)]
fn terminate_process(pid: u32) -> Result<()> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{OpenProcess, PROCESS_TERMINATE, TerminateProcess};

    unsafe {
        let handle =
            OpenProcess(PROCESS_TERMINATE, false, pid).map_err(LauncherError::WindowsApi)?;
        let result = TerminateProcess(handle, 1);
        let _ = CloseHandle(handle);
        result.map_err(LauncherError::WindowsApi)
    }
}

#[cfg(not(windows))]
fn terminate_process(_pid: u32) -> Result<()> {
    Err(crate::LauncherError::ProcessControl(
        crate::error::StringError::new("Process control is only supported on Windows"),
    ))
}

/// Spawn a process per the launch spec.
///
/// Elevated launches go through `ShellExecuteW` with the `runas` verb
/// (there is no CreateProcess flag for UAC); everything else uses
/// `std::process::Command`, with `CREATE_NO_WINDOW` for background runs.
#[cfg(windows)]
fn spawn_process(spec: &LaunchSpec) -> Result<()> {
    if spec.elevated {
        return shell_execute_runas(spec);
    }

    use std::os::windows::process::CommandExt;

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    let mut command = std::process::Command::new(&spec.program);
    if !spec.arguments.is_empty() {
        command.raw_arg(&spec.arguments);
    }
    if let Some(dir) = &spec.working_dir {
        command.current_dir(dir);
    }
    if spec.background {
        command.creation_flags(CREATE_NO_WINDOW);
    }
    command
        .spawn()
        .map(|_| ())
        .map_err(|e| LauncherError::ProcessControl(Box::new(e)))
}

#[cfg(not(windows))]
fn spawn_process(spec: &LaunchSpec) -> Result<()> {
    let mut command = std::process::Command::new(&spec.program);
    if !spec.arguments.is_empty() {
        command.args(spec.arguments.split_whitespace());
    }
    if let Some(dir) = &spec.working_dir {
        command.current_dir(dir);
    }
    command
        .spawn()
        .map(|_| ())
        .map_err(|e| crate::LauncherError::ProcessControl(Box::new(e)))
}

/// Launch elevated via the shell `runas` verb.
///
/// # Safety
///
/// All wide strings passed to `ShellExecuteW` are null-terminated buffers
/// that outlive the call; the return value is checked against the
/// documented success threshold (> 32).
#[cfg(windows)]
#[expect(unsafe_code, reason = "Windows FFI for ShellExecuteW with the runas verb")]
fn shell_execute_runas(spec: &LaunchSpec) -> Result<()> {
    use windows::Win32::UI::Shell::ShellExecuteW;
    use windows::Win32::UI::WindowsAndMessaging::{SW_HIDE, SW_SHOWNORMAL};
    use windows::core::PCWSTR;

    let verb = to_wide("runas");
    let program = to_wide(&spec.program.to_string_lossy());
    let arguments = to_wide(&spec.arguments);
    let directory = spec
        .working_dir
        .as_ref()
        .map(|d| to_wide(&d.to_string_lossy()));

    let show = if spec.background { SW_HIDE } else { SW_SHOWNORMAL };

    let instance = unsafe {
        ShellExecuteW(
            None,
            PCWSTR(verb.as_ptr()),
            PCWSTR(program.as_ptr()),
            PCWSTR(arguments.as_ptr()),
            directory
                .as_ref()
                .map_or(PCWSTR::null(), |d| PCWSTR(d.as_ptr())),
            show,
        )
    };

    // ShellExecuteW returns a fake HINSTANCE; values <= 32 are error codes
    if instance.0 as usize > 32 {
        Ok(())
    } else {
        Err(LauncherError::ProcessControl(crate::error::StringError::new(
            format!("ShellExecuteW runas failed with code {}", instance.0 as usize),
        )))
    }
}

/// Open a URL or document with its default shell handler.
#[cfg(windows)]
#[expect(unsafe_code, reason = "Windows FFI for ShellExecuteW with the open verb")]
pub fn shell_open(target: &str) -> Result<()> {
    use windows::Win32::UI::Shell::ShellExecuteW;
    use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;
    use windows::core::PCWSTR;

    let verb = to_wide("open");
    let wide_target = to_wide(target);

    let instance = unsafe {
        ShellExecuteW(
            None,
            PCWSTR(verb.as_ptr()),
            PCWSTR(wide_target.as_ptr()),
            PCWSTR::null(),
            PCWSTR::null(),
            SW_SHOWNORMAL,
        )
    };

    if instance.0 as usize > 32 {
        Ok(())
    } else {
        Err(LauncherError::ProcessControl(crate::error::StringError::new(
            format!("ShellExecuteW open failed for {target} with code {}", instance.0 as usize),
        )))
    }
}

/// Non-Windows stub.
#[cfg(not(windows))]
pub fn shell_open(_target: &str) -> Result<()> {
    Err(crate::LauncherError::ProcessControl(
        crate::error::StringError::new("Shell open is only supported on Windows"),
    ))
}

#[cfg(windows)]
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Convert a null-terminated wide buffer to a Rust string.
#[cfg(windows)]
fn wide_to_string(buffer: &[u16]) -> Option<String> {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16(&buffer[..len]).ok()
}
