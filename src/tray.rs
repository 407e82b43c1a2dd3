// System tray icon with context menu

use crate::ui::wide;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, POINT};
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, DestroyMenu, GetCursorPos, LoadIconW, SetForegroundWindow,
    TrackPopupMenu, IDI_APPLICATION, MF_SEPARATOR, MF_STRING, TPM_BOTTOMALIGN, TPM_LEFTALIGN,
};

/// Custom message ID for tray icon callbacks
pub const WM_TRAY_ICON: u32 = 0x8001; // WM_APP + 1

/// Menu item IDs
pub const IDM_SETTINGS: u32 = 1001;
pub const IDM_STOP: u32 = 1002;
pub const IDM_REVOKE: u32 = 1003;

/// Add the system tray icon
pub fn add_tray_icon(hwnd: HWND) -> bool {
    unsafe {
        let mut nid = NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd,
            uID: 1,
            uFlags: NIF_ICON | NIF_MESSAGE | NIF_TIP,
            uCallbackMessage: WM_TRAY_ICON,
            ..Default::default()
        };

        if let Ok(icon) = LoadIconW(None, IDI_APPLICATION) {
            nid.hIcon = icon;
        }

        let tip = wide("SubDim");
        let len = tip.len().min(128);
        nid.szTip[..len].copy_from_slice(&tip[..len]);

        let added = Shell_NotifyIconW(NIM_ADD, &nid).as_bool();
        if !added {
            tracing::warn!("could not add tray icon");
        }
        added
    }
}

/// Remove the system tray icon
pub fn remove_tray_icon(hwnd: HWND) {
    unsafe {
        let nid = NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd,
            uID: 1,
            ..Default::default()
        };
        let _ = Shell_NotifyIconW(NIM_DELETE, &nid);
    }
}

/// Show the tray context menu
pub fn show_context_menu(hwnd: HWND) {
    unsafe {
        let Ok(menu) = CreatePopupMenu() else {
            return;
        };
        let settings_text = wide("Settings");
        let revoke_text = wide("Revoke Overlay Permission");
        let stop_text = wide("Stop");

        let _ = AppendMenuW(
            menu,
            MF_STRING,
            IDM_SETTINGS as usize,
            PCWSTR(settings_text.as_ptr()),
        );
        let _ = AppendMenuW(
            menu,
            MF_STRING,
            IDM_REVOKE as usize,
            PCWSTR(revoke_text.as_ptr()),
        );
        let _ = AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null());
        let _ = AppendMenuW(menu, MF_STRING, IDM_STOP as usize, PCWSTR(stop_text.as_ptr()));

        let mut pt = POINT::default();
        let _ = GetCursorPos(&mut pt);

        // Required for TrackPopupMenu to work correctly with tray icons
        let _ = SetForegroundWindow(hwnd);

        let _ = TrackPopupMenu(
            menu,
            TPM_LEFTALIGN | TPM_BOTTOMALIGN,
            pt.x,
            pt.y,
            Some(0),
            hwnd,
            None,
        );

        let _ = DestroyMenu(menu);
    }
}
