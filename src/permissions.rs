// Overlay consent and the accessibility switch, backed by the config file

use crate::ui::wide;
use std::sync::PoisonError;
use subdim_shared::{PermissionProbe, SharedPreferences};
use windows::core::PCWSTR;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Shell::ShellExecuteW;
use windows::Win32::UI::WindowsAndMessaging::{
    MessageBoxW, IDYES, MB_ICONQUESTION, MB_YESNO, SW_SHOWNORMAL,
};

const ACCESSIBILITY_SETTINGS_URI: &str = "ms-settings:easeofaccess";

pub struct WindowsPermissions {
    prefs: SharedPreferences,
    // The consent prompt is modal to this window.
    owner: HWND,
}

impl WindowsPermissions {
    pub fn new(prefs: SharedPreferences, owner: HWND) -> Self {
        Self { prefs, owner }
    }

    pub fn revoke_overlay_permission(&mut self) {
        let mut prefs = self.prefs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = prefs.set_overlay_permission(Some(false)) {
            tracing::warn!(error = %err, "failed to save overlay permission");
        }
    }
}

impl PermissionProbe for WindowsPermissions {
    fn can_draw_overlays(&self) -> bool {
        self.prefs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .overlay_permission()
            == Some(true)
    }

    fn overlay_undecided(&self) -> bool {
        self.prefs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .overlay_permission()
            .is_none()
    }

    fn request_overlay_permission(&mut self) -> bool {
        let message = wide(
            "SubDim dims the screen by drawing a translucent layer over all other windows.\n\nAllow SubDim to draw over other apps?",
        );
        let title = wide("SubDim");
        let granted = unsafe {
            MessageBoxW(
                Some(self.owner),
                PCWSTR(message.as_ptr()),
                PCWSTR(title.as_ptr()),
                MB_YESNO | MB_ICONQUESTION,
            ) == IDYES
        };

        let mut prefs = self.prefs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = prefs.set_overlay_permission(Some(granted)) {
            tracing::warn!(error = %err, "failed to save overlay permission");
        }
        granted
    }

    fn accessibility_enabled(&self) -> bool {
        self.prefs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .service_enabled()
    }

    fn open_accessibility_settings(&mut self) {
        let uri = wide(ACCESSIBILITY_SETTINGS_URI);
        let verb = wide("open");
        let result = unsafe {
            ShellExecuteW(
                Some(self.owner),
                PCWSTR(verb.as_ptr()),
                PCWSTR(uri.as_ptr()),
                None,
                None,
                SW_SHOWNORMAL,
            )
        };
        // ShellExecuteW reports success with a value above 32.
        if result.0 as isize <= 32 {
            tracing::warn!(code = result.0 as isize, "could not open accessibility settings");
        }
    }
}
