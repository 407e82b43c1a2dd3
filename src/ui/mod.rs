pub mod controls;
pub mod painting;
pub mod theme;

use controls::*;
use theme::*;

use crate::permissions::WindowsPermissions;
use crate::{overlay, tray};

use std::cell::RefCell;
use std::sync::PoisonError;
use subdim_shared::{
    Notice, ScreenAction, SettingsController, SharedPreferences, StartOutcome, UpdateBus,
};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture};
use windows::Win32::UI::WindowsAndMessaging::*;

pub const CLASS_NAME: &str = "SubDimSettingsWnd";
const WM_TRAY_CALLBACK: u32 = tray::WM_TRAY_ICON;
const TOAST_TIMER_ID: usize = 100;

// Window state lives on the UI thread. Handlers that can pump messages
// (message boxes, shell launches) run with the UI borrow released, and
// re-entrant messages that find a cell busy are simply skipped.
thread_local! {
    static UI: RefCell<Option<UiState>> = const { RefCell::new(None) };
    static CONTROLLER: RefCell<Option<SettingsController<WindowsPermissions>>> =
        const { RefCell::new(None) };
    static PREFS: RefCell<Option<SharedPreferences>> = const { RefCell::new(None) };
}

fn with_ui<R>(f: impl FnOnce(&mut UiState) -> R) -> Option<R> {
    UI.with(|cell| {
        let mut guard = cell.try_borrow_mut().ok()?;
        guard.as_mut().map(f)
    })
}

fn with_controller<R>(f: impl FnOnce(&mut SettingsController<WindowsPermissions>) -> R) -> Option<R> {
    CONTROLLER.with(|cell| {
        let mut guard = cell.try_borrow_mut().ok()?;
        guard.as_mut().map(f)
    })
}

pub fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Create the settings window (initially hidden)
pub fn create_window(prefs: SharedPreferences, bus: UpdateBus) -> anyhow::Result<HWND> {
    let class_name = wide(CLASS_NAME);

    let hwnd = unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null()).unwrap_or_default();
        let wc = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(wnd_proc),
            hInstance: hinstance.into(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            hbrBackground: CreateSolidBrush(CLR_BACKGROUND),
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            hIcon: LoadIconW(None, IDI_APPLICATION).unwrap_or_default(),
            ..Default::default()
        };
        RegisterClassW(&wc);

        // Size the frame so the client area matches the layout
        let mut wr = RECT {
            left: 0,
            top: 0,
            right: WINDOW_WIDTH,
            bottom: WINDOW_HEIGHT,
        };
        let style = WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU | WS_MINIMIZEBOX;
        let _ = AdjustWindowRectEx(&mut wr, style, false, WINDOW_EX_STYLE::default());

        let title = wide("SubDim");
        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            PCWSTR(class_name.as_ptr()),
            PCWSTR(title.as_ptr()),
            style,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            wr.right - wr.left,
            wr.bottom - wr.top,
            None,
            None,
            Some(hinstance.into()),
            None,
        )?
    };

    let controller = SettingsController::new(
        prefs.clone(),
        bus,
        WindowsPermissions::new(prefs.clone(), hwnd),
    );
    let service_enabled = prefs
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .service_enabled();
    let ui = UiState::new(
        controller.alpha_position(),
        controller.color_position(),
        service_enabled,
    );

    UI.with_borrow_mut(|cell| *cell = Some(ui));
    CONTROLLER.with_borrow_mut(|cell| *cell = Some(controller));
    PREFS.with_borrow_mut(|cell| *cell = Some(prefs));

    Ok(hwnd)
}

/// Show and focus the settings window
pub fn show_window(hwnd: HWND) {
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = SetForegroundWindow(hwnd);
    }
}

pub fn hide_window(hwnd: HWND) {
    unsafe {
        let _ = ShowWindow(hwnd, SW_HIDE);
    }
}

pub fn invalidate(hwnd: HWND) {
    unsafe {
        let _ = InvalidateRect(Some(hwnd), None, true);
    }
}

/// Show a toast message
pub fn show_toast(hwnd: HWND, message: &str) {
    let shown = with_ui(|ui| {
        ui.toast_message = message.to_string();
        ui.toast_visible = true;
    });
    if shown.is_some() {
        invalidate(hwnd);
        unsafe {
            SetTimer(Some(hwnd), TOAST_TIMER_ID, 2000, None);
        }
    }
}

fn show_notice(hwnd: HWND, notice: Notice) {
    show_toast(hwnd, notice.text());
}

/// Check permissions and bind the overlay service if everything is granted.
///
/// `ask_again` re-prompts for an overlay permission the user denied or revoked
/// earlier; it is set when the user turns the service on by hand.
pub fn start_service(hwnd: HWND, ask_again: bool) {
    let Some((outcome, notice)) = with_controller(|c| c.start_with_prompt(ask_again)) else {
        return;
    };
    if let Some(notice) = notice {
        show_notice(hwnd, notice);
    }
    if outcome == StartOutcome::Started {
        overlay::bind();
    }
}

fn toggle_service(hwnd: HWND) {
    let Some(prefs) = PREFS.with_borrow(|p| p.clone()) else {
        return;
    };
    let enabled = {
        let mut prefs = prefs.lock().unwrap_or_else(PoisonError::into_inner);
        let enabled = !prefs.service_enabled();
        if let Err(err) = prefs.set_service_enabled(enabled) {
            tracing::warn!(error = %err, "failed to save service switch");
        }
        enabled
    };
    with_ui(|ui| ui.service_toggle.checked = enabled);
    invalidate(hwnd);

    if enabled {
        start_service(hwnd, true);
    } else {
        overlay::unbind();
        show_toast(hwnd, "Overlay service disabled");
    }
}

/// Send the stop message and close the settings screen.
pub fn stop(hwnd: HWND) {
    // With no service listening, nothing would answer the stop message.
    let bound = overlay::is_bound();
    if with_controller(|c| c.stop()) == Some(ScreenAction::Close) {
        hide_window(hwnd);
    }
    if !bound {
        unsafe { PostQuitMessage(0) };
    }
}

pub fn revoke_overlay_permission(hwnd: HWND) {
    with_controller(|c| c.permissions_mut().revoke_overlay_permission());
    overlay::unbind();
    show_toast(hwnd, "Overlay permission revoked");
}

fn slider_changed(id: SliderId, value: i32) {
    with_controller(|c| match id {
        SliderId::Dimming => c.on_alpha_changed(value),
        SliderId::Warmth => c.on_color_changed(value),
    });
}

fn lparam_point(lparam: LPARAM) -> (i32, i32) {
    let x = (lparam.0 & 0xFFFF) as i16 as i32;
    let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;
    (x, y)
}

/// Window procedure
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);

            // Double-buffer to avoid flicker
            let mut client = RECT::default();
            let _ = GetClientRect(hwnd, &mut client);

            let mem_dc = CreateCompatibleDC(Some(hdc));
            let mem_bmp = CreateCompatibleBitmap(hdc, client.right, client.bottom);
            let old_bmp = SelectObject(mem_dc, HGDIOBJ::from(mem_bmp));

            with_ui(|ui| painting::paint(mem_dc, &client, ui));

            let _ = BitBlt(
                hdc,
                0,
                0,
                client.right,
                client.bottom,
                Some(mem_dc),
                0,
                0,
                SRCCOPY,
            );

            SelectObject(mem_dc, old_bmp);
            let _ = DeleteObject(HGDIOBJ::from(mem_bmp));
            let _ = DeleteDC(mem_dc);
            let _ = EndPaint(hwnd, &ps);
            LRESULT(0)
        }

        WM_LBUTTONDOWN => {
            let (x, y) = lparam_point(lparam);
            match with_ui(|ui| ui.hit_test(x, y)).unwrap_or(Hit::Nothing) {
                Hit::Slider(id, value) => {
                    SetCapture(hwnd);
                    slider_changed(id, value);
                    invalidate(hwnd);
                }
                Hit::ServiceToggle => toggle_service(hwnd),
                Hit::OpenSettings => {
                    with_controller(|c| c.open_accessibility_settings());
                }
                Hit::Stop => stop(hwnd),
                Hit::Nothing => return DefWindowProcW(hwnd, msg, wparam, lparam),
            }
            LRESULT(0)
        }

        WM_MOUSEMOVE => {
            let (x, _) = lparam_point(lparam);
            // Push every movement so the overlay tracks the thumb live
            let moved = with_ui(|ui| {
                let id = ui.dragging()?;
                let slider = ui.slider_mut(id);
                let value = slider.value_from_x(x);
                if value == slider.value {
                    return None;
                }
                slider.value = value;
                Some((id, value))
            })
            .flatten();
            if let Some((id, value)) = moved {
                slider_changed(id, value);
                invalidate(hwnd);
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        WM_LBUTTONUP => {
            let released = with_ui(|ui| {
                let dragging = ui.dragging().is_some();
                ui.dimming.dragging = false;
                ui.warmth.dragging = false;
                dragging
            })
            .unwrap_or(false);
            if released {
                let _ = ReleaseCapture();
                invalidate(hwnd);
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        WM_COMMAND => {
            let cmd = (wparam.0 & 0xFFFF) as u32;
            match cmd {
                tray::IDM_SETTINGS => show_window(hwnd),
                tray::IDM_STOP => stop(hwnd),
                tray::IDM_REVOKE => revoke_overlay_permission(hwnd),
                _ => {}
            }
            LRESULT(0)
        }

        WM_TRAY_CALLBACK => {
            let event = (lparam.0 & 0xFFFF) as u32;
            match event {
                WM_LBUTTONUP => show_window(hwnd),
                WM_RBUTTONUP => tray::show_context_menu(hwnd),
                _ => {}
            }
            LRESULT(0)
        }

        WM_TIMER => {
            if wparam.0 == TOAST_TIMER_ID {
                with_ui(|ui| {
                    ui.toast_visible = false;
                    ui.toast_message.clear();
                });
                let _ = KillTimer(Some(hwnd), TOAST_TIMER_ID);
                invalidate(hwnd);
            }
            LRESULT(0)
        }

        WM_CLOSE => {
            // Hide to tray; the overlay keeps running
            hide_window(hwnd);
            LRESULT(0)
        }

        WM_DESTROY => {
            UI.with(|cell| {
                if let Ok(mut ui) = cell.try_borrow_mut() {
                    *ui = None;
                }
            });
            CONTROLLER.with(|cell| {
                if let Ok(mut controller) = cell.try_borrow_mut() {
                    *controller = None;
                }
            });
            PostQuitMessage(0);
            LRESULT(0)
        }

        WM_ERASEBKGND => {
            // Handled in WM_PAINT with double buffering
            LRESULT(1)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
