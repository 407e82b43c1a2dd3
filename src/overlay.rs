// Screen dimmer surface and the service host that drives it.
//
// The overlay is one layered, click-through, topmost popup spanning the whole
// virtual screen. Alpha goes through SetLayeredWindowAttributes(LWA_ALPHA);
// the tint is painted in WM_PAINT from FILL_COLOR.
//
// The service host is a message-only window. Bus listeners may run on any
// thread, so they only PostMessageW a WM_OVERLAY_UPDATE here; the service
// itself is only ever touched on the UI thread.

use std::cell::RefCell;
use crate::ui::wide;
use std::sync::atomic::{AtomicU32, Ordering};
use subdim_shared::channel::{schedule_resync, Subscription, RESYNC_DELAY};
use subdim_shared::{
    Argb, Control, OverlayHost, OverlayService, Rgb, ServiceError, SharedPreferences, UpdateBus,
    UpdateMessage,
};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, CreateSolidBrush, DeleteObject, EndPaint, FillRect, InvalidateRect, HGDIOBJ,
    PAINTSTRUCT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, GetClientRect, GetSystemMetrics, PostMessageW,
    PostQuitMessage, RegisterClassW, SetLayeredWindowAttributes, SetWindowPos, ShowWindow,
    CS_HREDRAW, CS_VREDRAW, HWND_MESSAGE, HWND_TOPMOST, LWA_ALPHA, SM_CXVIRTUALSCREEN,
    SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN, SWP_NOACTIVATE, SWP_NOSENDCHANGING,
    SW_HIDE, WINDOW_EX_STYLE, WINDOW_STYLE, WM_APP, WM_DISPLAYCHANGE, WM_ERASEBKGND, WM_PAINT,
    WNDCLASSW, WS_DISABLED, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST,
    WS_EX_TRANSPARENT, WS_POPUP, WS_VISIBLE,
};

const OVERLAY_CLASS: &str = "SubDimOverlay";
const HOST_CLASS: &str = "SubDimServiceHost";

/// wParam = message kind, lParam = payload bits (see `UpdateMessage::to_wire`).
pub const WM_OVERLAY_UPDATE: u32 = WM_APP + 20;

/// Current tint as COLORREF bits, read by the overlay's WM_PAINT.
static FILL_COLOR: AtomicU32 = AtomicU32::new(0);

fn to_hwnd(raw: isize) -> HWND {
    HWND(raw as *mut std::ffi::c_void)
}

// ── Overlay surface ─────────────────────────────────────────────────────────

/// Handle to the live overlay window.
pub struct OverlayWindow(isize);

impl OverlayWindow {
    fn hwnd(&self) -> HWND {
        to_hwnd(self.0)
    }
}

fn virtual_screen() -> RECT {
    unsafe {
        let left = GetSystemMetrics(SM_XVIRTUALSCREEN);
        let top = GetSystemMetrics(SM_YVIRTUALSCREEN);
        RECT {
            left,
            top,
            right: left + GetSystemMetrics(SM_CXVIRTUALSCREEN),
            bottom: top + GetSystemMetrics(SM_CYVIRTUALSCREEN),
        }
    }
}

fn cover_virtual_screen(hwnd: HWND) {
    let r = virtual_screen();
    unsafe {
        let _ = SetWindowPos(
            hwnd,
            Some(HWND_TOPMOST),
            r.left,
            r.top,
            r.right - r.left,
            r.bottom - r.top,
            SWP_NOACTIVATE | SWP_NOSENDCHANGING,
        );
    }
}

unsafe extern "system" fn overlay_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);
            let mut client = RECT::default();
            let _ = GetClientRect(hwnd, &mut client);
            let brush = CreateSolidBrush(COLORREF(FILL_COLOR.load(Ordering::Relaxed)));
            FillRect(hdc, &client, brush);
            let _ = DeleteObject(HGDIOBJ::from(brush));
            let _ = EndPaint(hwnd, &ps);
            LRESULT(0)
        }
        WM_ERASEBKGND => LRESULT(1),
        WM_DISPLAYCHANGE => {
            cover_virtual_screen(hwnd);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

fn register_class(name: &str, proc: windows::Win32::UI::WindowsAndMessaging::WNDPROC) -> bool {
    unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null()).unwrap_or_default();
        let class_name = wide(name);
        let wc = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: proc,
            hInstance: hinstance.into(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            ..Default::default()
        };
        RegisterClassW(&wc) != 0
    }
}

/// Win32 implementation of the overlay window manager.
#[derive(Default)]
pub struct LayeredOverlay {
    class_registered: bool,
}

impl OverlayHost for LayeredOverlay {
    type Handle = OverlayWindow;

    fn add_surface(&mut self, fill: Argb) -> Result<OverlayWindow, ServiceError> {
        if !self.class_registered {
            if !register_class(OVERLAY_CLASS, Some(overlay_proc)) {
                return Err(ServiceError::ClassRegistration);
            }
            self.class_registered = true;
        }

        FILL_COLOR.store(fill.rgb().to_colorref_bits(), Ordering::Relaxed);
        let r = virtual_screen();
        let class_name = wide(OVERLAY_CLASS);

        unsafe {
            let hinstance = GetModuleHandleW(PCWSTR::null()).unwrap_or_default();
            let hwnd = CreateWindowExW(
                WS_EX_LAYERED | WS_EX_TRANSPARENT | WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE,
                PCWSTR(class_name.as_ptr()),
                PCWSTR::null(),
                WS_POPUP | WS_VISIBLE | WS_DISABLED,
                r.left,
                r.top,
                r.right - r.left,
                r.bottom - r.top,
                None,
                None,
                Some(hinstance.into()),
                None,
            )
            .map_err(|e| ServiceError::SurfaceCreation(e.to_string()))?;

            let _ = SetLayeredWindowAttributes(hwnd, COLORREF(0), fill.a, LWA_ALPHA);
            cover_virtual_screen(hwnd);
            Ok(OverlayWindow(hwnd.0 as isize))
        }
    }

    fn set_alpha(&mut self, handle: &OverlayWindow, alpha: u8) {
        unsafe {
            let _ = SetLayeredWindowAttributes(handle.hwnd(), COLORREF(0), alpha, LWA_ALPHA);
        }
    }

    fn set_color(&mut self, handle: &OverlayWindow, color: Rgb) {
        FILL_COLOR.store(color.to_colorref_bits(), Ordering::Relaxed);
        unsafe {
            let _ = InvalidateRect(Some(handle.hwnd()), None, true);
        }
    }

    fn remove_surface(&mut self, handle: OverlayWindow) {
        unsafe {
            let hwnd = handle.hwnd();
            let _ = ShowWindow(hwnd, SW_HIDE);
            let _ = DestroyWindow(hwnd);
        }
    }
}

// ── Service host ────────────────────────────────────────────────────────────

struct ServiceHost {
    hwnd: isize,
    prefs: SharedPreferences,
    bus: UpdateBus,
    service: Option<OverlayService<LayeredOverlay>>,
    subscription: Option<Subscription>,
}

thread_local! {
    static HOST: RefCell<Option<ServiceHost>> = const { RefCell::new(None) };
}

unsafe extern "system" fn host_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if msg != WM_OVERLAY_UPDATE {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }

    let Some(update) = UpdateMessage::from_wire(wparam.0 as u32, lparam.0 as u32) else {
        tracing::debug!(kind = wparam.0, "ignoring unknown overlay update");
        return LRESULT(0);
    };

    let control = HOST.with_borrow_mut(|host| {
        host.as_mut()
            .and_then(|h| h.service.as_mut())
            .map(|service| service.handle(update))
    });

    if control == Some(Control::Exit) {
        unbind();
        PostQuitMessage(0);
    }
    LRESULT(0)
}

/// Create the message-only window that receives overlay updates.
pub fn create_service_host(prefs: SharedPreferences, bus: UpdateBus) -> anyhow::Result<()> {
    if !register_class(HOST_CLASS, Some(host_proc)) {
        anyhow::bail!("could not register the service host window class");
    }
    let class_name = wide(HOST_CLASS);
    let hwnd = unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null()).unwrap_or_default();
        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            PCWSTR(class_name.as_ptr()),
            PCWSTR::null(),
            WINDOW_STYLE::default(),
            0,
            0,
            0,
            0,
            Some(HWND_MESSAGE),
            None,
            Some(hinstance.into()),
            None,
        )?
    };

    HOST.with_borrow_mut(|host| {
        *host = Some(ServiceHost {
            hwnd: hwnd.0 as isize,
            prefs,
            bus,
            service: None,
            subscription: None,
        });
    });
    Ok(())
}

/// Start the overlay service: subscribe to updates and put the overlay up.
pub fn bind() {
    HOST.with_borrow_mut(|host| {
        let Some(host) = host.as_mut() else {
            return;
        };

        if host.subscription.is_none() {
            let target = host.hwnd;
            host.subscription = Some(host.bus.subscribe(move |msg| {
                let (kind, bits) = msg.to_wire();
                unsafe {
                    if let Err(err) = PostMessageW(
                        Some(to_hwnd(target)),
                        WM_OVERLAY_UPDATE,
                        WPARAM(kind as usize),
                        LPARAM(bits as isize),
                    ) {
                        tracing::warn!(error = %err, action = msg.action(), "could not post overlay update");
                    }
                }
            }));
        }

        let prefs = host.prefs.clone();
        let service = host
            .service
            .get_or_insert_with(|| OverlayService::new(LayeredOverlay::default(), prefs.clone()));

        if service.on_connected().is_ok() {
            schedule_resync(&host.bus, &prefs, RESYNC_DELAY);
        }
    });
}

/// Tear the overlay down and stop listening for updates.
pub fn unbind() {
    HOST.with_borrow_mut(|host| {
        let Some(host) = host.as_mut() else {
            return;
        };
        host.subscription = None;
        if let Some(mut service) = host.service.take() {
            service.on_unbind();
        }
    });
}

pub fn is_bound() -> bool {
    HOST.with_borrow(|host| host.as_ref().is_some_and(|h| h.subscription.is_some()))
}

pub fn destroy_service_host() {
    unbind();
    if let Some(host) = HOST.with_borrow_mut(|host| host.take()) {
        unsafe {
            let _ = DestroyWindow(to_hwnd(host.hwnd));
        }
    }
}
