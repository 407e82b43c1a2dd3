// Prevents console window in release builds
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

mod logging;
#[cfg(windows)]
mod overlay;
#[cfg(windows)]
mod permissions;
#[cfg(windows)]
mod tray;
#[cfg(windows)]
mod ui;

use subdim_shared::config;

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use std::sync::{Arc, Mutex};
    use subdim_shared::{PreferenceStore, UpdateBus};
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, GetMessageW, TranslateMessage, MSG,
    };

    // Read the config strictly so a fallback to defaults is logged once logging is up
    let loaded = PreferenceStore::try_open(config::config_path());
    let debug = loaded.as_ref().is_ok_and(|store| store.debug_logging());
    let _log_guard = logging::init(debug, &config::config_dir());
    let store = loaded.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "using default config");
        PreferenceStore::with_defaults(config::config_path())
    });

    if is_already_running() {
        tracing::info!("SubDim is already running, showing its settings window");
        focus_existing_window();
        return Ok(());
    }

    tracing::info!(config = %store.path().display(), "starting SubDim v{}", env!("CARGO_PKG_VERSION"));
    let prefs = Arc::new(Mutex::new(store));
    let bus = UpdateBus::new();

    overlay::create_service_host(prefs.clone(), bus.clone())?;
    let hwnd = ui::create_window(prefs, bus)?;
    tray::add_tray_icon(hwnd);
    ui::show_window(hwnd);
    ui::start_service(hwnd, false);

    // Win32 message loop
    unsafe {
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    tray::remove_tray_icon(hwnd);
    overlay::destroy_service_host();
    tracing::info!("SubDim stopped");
    Ok(())
}

#[cfg(not(windows))]
fn main() -> anyhow::Result<()> {
    let _log_guard = logging::init(false, &config::config_dir());
    anyhow::bail!("SubDim draws its overlay through Win32 and only runs on Windows")
}

#[cfg(windows)]
const SINGLE_INSTANCE_MUTEX: &str = "SubDimMutex";

/// Check if another instance is already running
#[cfg(windows)]
fn is_already_running() -> bool {
    use windows::core::PCWSTR;
    use windows::Win32::System::Threading::{CreateMutexW, OpenMutexW, SYNCHRONIZATION_ACCESS_RIGHTS};

    let name = ui::wide(SINGLE_INSTANCE_MUTEX);
    unsafe {
        let existing = OpenMutexW(
            SYNCHRONIZATION_ACCESS_RIGHTS(0x001F0001), // MUTEX_ALL_ACCESS
            false,
            PCWSTR(name.as_ptr()),
        );
        if existing.is_ok() {
            return true;
        }

        // This instance owns the mutex for the rest of its life
        let _ = CreateMutexW(None, true, PCWSTR(name.as_ptr()));
        false
    }
}

/// Bring the running instance's settings window to the front
#[cfg(windows)]
fn focus_existing_window() {
    use windows::core::PCWSTR;
    use windows::Win32::UI::WindowsAndMessaging::FindWindowW;

    let class_name = ui::wide(ui::CLASS_NAME);
    if let Ok(hwnd) = unsafe { FindWindowW(PCWSTR(class_name.as_ptr()), PCWSTR::null()) } {
        ui::show_window(hwnd);
    }
}
