// GDI owner-draw rendering for the settings window

use super::controls::*;
use super::theme::*;
use subdim_shared::color::color_for_position;
use windows::Win32::Foundation::{COLORREF, RECT};
use windows::Win32::Graphics::Gdi::*;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn create_font(size: i32, weight: i32, family: &str) -> HFONT {
    let face: Vec<u16> = family.encode_utf16().chain(std::iter::once(0)).collect();
    unsafe {
        let mut lf = LOGFONTW {
            lfHeight: size,
            lfWeight: weight,
            lfQuality: CLEARTYPE_QUALITY,
            lfCharSet: DEFAULT_CHARSET,
            ..Default::default()
        };
        let len = face.len().min(32);
        lf.lfFaceName[..len].copy_from_slice(&face[..len]);
        CreateFontIndirectW(&lf)
    }
}

fn fill_rect_color(hdc: HDC, r: &RECT, color: COLORREF) {
    unsafe {
        let brush = CreateSolidBrush(color);
        FillRect(hdc, r, brush);
        let _ = DeleteObject(HGDIOBJ::from(brush));
    }
}

fn draw_rounded_rect(hdc: HDC, r: &RECT, radius: i32, fill: COLORREF, border: COLORREF) {
    unsafe {
        let fill_brush = CreateSolidBrush(fill);
        let border_pen = CreatePen(PS_SOLID, 1, border);
        let old_brush = SelectObject(hdc, HGDIOBJ::from(fill_brush));
        let old_pen = SelectObject(hdc, HGDIOBJ::from(border_pen));
        let _ = RoundRect(hdc, r.left, r.top, r.right, r.bottom, radius, radius);
        SelectObject(hdc, old_pen);
        SelectObject(hdc, old_brush);
        let _ = DeleteObject(HGDIOBJ::from(fill_brush));
        let _ = DeleteObject(HGDIOBJ::from(border_pen));
    }
}

fn draw_text_simple(hdc: HDC, text: &str, x: i32, y: i32, color: COLORREF, font: HFONT) {
    unsafe {
        let old_font = SelectObject(hdc, HGDIOBJ::from(font));
        SetTextColor(hdc, color);
        SetBkMode(hdc, TRANSPARENT);
        let wide: Vec<u16> = text.encode_utf16().collect();
        let _ = TextOutW(hdc, x, y, &wide);
        SelectObject(hdc, old_font);
    }
}

fn measure_text(hdc: HDC, text: &str, font: HFONT) -> (i32, i32) {
    unsafe {
        let old_font = SelectObject(hdc, HGDIOBJ::from(font));
        let wide: Vec<u16> = text.encode_utf16().collect();
        let mut size = windows::Win32::Foundation::SIZE::default();
        let _ = GetTextExtentPoint32W(hdc, &wide, &mut size);
        SelectObject(hdc, old_font);
        (size.cx, size.cy)
    }
}

fn draw_text_right(hdc: HDC, text: &str, right_x: i32, y: i32, color: COLORREF, font: HFONT) {
    let (w, _) = measure_text(hdc, text, font);
    draw_text_simple(hdc, text, right_x - w, y, color, font);
}

fn draw_circle(hdc: HDC, cx: i32, cy: i32, r: i32, color: COLORREF) {
    unsafe {
        let brush = CreateSolidBrush(color);
        let pen = CreatePen(PS_SOLID, 0, color);
        let old_brush = SelectObject(hdc, HGDIOBJ::from(brush));
        let old_pen = SelectObject(hdc, HGDIOBJ::from(pen));
        let _ = Ellipse(hdc, cx - r, cy - r, cx + r, cy + r);
        SelectObject(hdc, old_pen);
        SelectObject(hdc, old_brush);
        let _ = DeleteObject(HGDIOBJ::from(brush));
        let _ = DeleteObject(HGDIOBJ::from(pen));
    }
}

// ── Main paint function ─────────────────────────────────────────────────────

pub fn paint(hdc: HDC, client: &RECT, state: &mut UiState) {
    fill_rect_color(hdc, client, CLR_BACKGROUND);

    let fonts = Fonts::create();
    let mut y = PADDING;

    y = draw_header(hdc, y, &fonts);
    y += GAP;

    y = draw_slider_card(hdc, y, "Dimming", "0%", "100%", &mut state.dimming, None, &fonts);
    y += GAP;

    let tint = color_for_position(state.warmth.value);
    let swatch = COLORREF(tint.to_colorref_bits());
    y = draw_slider_card(hdc, y, "Warmth", "Neutral", "Amber", &mut state.warmth, Some(swatch), &fonts);
    y += GAP;

    y = draw_service_card(hdc, y, state, &fonts);
    y += GAP;

    draw_stop_button(hdc, y, state, &fonts);

    if state.toast_visible {
        draw_toast(hdc, client, state, &fonts);
    }

    fonts.destroy();
}

// ── Font cache ──────────────────────────────────────────────────────────────

struct Fonts {
    title: HFONT,
    small_bold: HFONT,
    xs: HFONT,
    xxs: HFONT,
}

impl Fonts {
    fn create() -> Self {
        Self {
            title: create_font(FONT_SIZE_TITLE, 600, FONT_NAME),
            small_bold: create_font(FONT_SIZE_SMALL, 500, FONT_NAME),
            xs: create_font(FONT_SIZE_XS, 400, FONT_NAME),
            xxs: create_font(FONT_SIZE_XXS, 400, FONT_NAME),
        }
    }

    fn destroy(&self) {
        unsafe {
            let _ = DeleteObject(HGDIOBJ::from(self.title));
            let _ = DeleteObject(HGDIOBJ::from(self.small_bold));
            let _ = DeleteObject(HGDIOBJ::from(self.xs));
            let _ = DeleteObject(HGDIOBJ::from(self.xxs));
        }
    }
}

// ── Section renderers ───────────────────────────────────────────────────────

fn draw_header(hdc: HDC, y: i32, fonts: &Fonts) -> i32 {
    let x = PADDING;
    let right = PADDING + CONTENT_WIDTH;

    // Half-moon mark
    let icon_size = 36;
    draw_circle(hdc, x + icon_size / 2, y + icon_size / 2, icon_size / 2 - 2, CLR_BRAND);
    draw_circle(hdc, x + icon_size / 2 + 8, y + icon_size / 2 - 6, icon_size / 2 - 4, CLR_BACKGROUND);

    let text_x = x + icon_size + 12;
    draw_text_simple(hdc, "SubDim", text_x, y, CLR_FOREGROUND, fonts.title);
    draw_text_simple(hdc, "Below-minimum brightness", text_x, y + 20, CLR_MUTED_FG, fonts.xs);

    let header_bottom = y + icon_size + 8;
    unsafe {
        let pen = CreatePen(PS_SOLID, 1, CLR_BORDER);
        let old_pen = SelectObject(hdc, HGDIOBJ::from(pen));
        let _ = MoveToEx(hdc, PADDING, header_bottom, None);
        let _ = LineTo(hdc, right, header_bottom);
        SelectObject(hdc, old_pen);
        let _ = DeleteObject(HGDIOBJ::from(pen));
    }

    header_bottom + 4
}

#[allow(clippy::too_many_arguments)]
fn draw_slider_card(
    hdc: HDC,
    y: i32,
    title: &str,
    low_label: &str,
    high_label: &str,
    slider: &mut SliderState,
    swatch: Option<COLORREF>,
    fonts: &Fonts,
) -> i32 {
    let x = PADDING;
    let inner_x = x + 16;
    let inner_right = x + CONTENT_WIDTH - 16;

    let card = RECT {
        left: x,
        top: y,
        right: x + CONTENT_WIDTH,
        bottom: y + 100,
    };
    draw_rounded_rect(hdc, &card, CARD_RADIUS, CLR_BACKGROUND, CLR_BORDER);
    draw_text_simple(hdc, title, inner_x, y + 14, CLR_FOREGROUND, fonts.small_bold);

    // Badge
    let badge_text = format!("{}%", slider.value);
    let (bw, bh) = measure_text(hdc, &badge_text, fonts.xs);
    let badge_w = bw + 20;
    let badge_h = bh + 4;
    let badge_x = inner_right - badge_w;
    let badge_y = y + 12;
    let badge_rect = RECT {
        left: badge_x,
        top: badge_y,
        right: badge_x + badge_w,
        bottom: badge_y + badge_h,
    };
    draw_rounded_rect(hdc, &badge_rect, badge_h / 2, CLR_BRAND, CLR_BRAND);
    draw_text_simple(
        hdc,
        &badge_text,
        badge_x + (badge_w - bw) / 2,
        badge_y + (badge_h - bh) / 2,
        CLR_FOREGROUND,
        fonts.xs,
    );

    if let Some(color) = swatch {
        let swatch_rect = RECT {
            left: badge_x - badge_h - 8,
            top: badge_y,
            right: badge_x - 8,
            bottom: badge_y + badge_h,
        };
        draw_rounded_rect(hdc, &swatch_rect, 4, color, CLR_MUTED_FG);
    }

    // Slider
    let slider_y = y + 48;
    let track_h = 8;
    let thumb_r = 9;

    slider.rect = RECT {
        left: inner_x,
        top: slider_y,
        right: inner_right,
        bottom: slider_y + track_h,
    };
    draw_rounded_rect(hdc, &slider.rect, 4, CLR_SECONDARY, CLR_SECONDARY);

    let fill_w = slider.thumb_x() - inner_x;
    if fill_w > 0 {
        let fill_rect = RECT {
            left: inner_x,
            top: slider_y,
            right: inner_x + fill_w,
            bottom: slider_y + track_h,
        };
        draw_rounded_rect(hdc, &fill_rect, 4, CLR_BRAND, CLR_BRAND);
    }

    draw_circle(hdc, slider.thumb_x(), slider_y + track_h / 2, thumb_r, CLR_FOREGROUND);

    slider.thumb_rect = RECT {
        left: inner_x - thumb_r,
        top: slider_y - thumb_r - 4,
        right: inner_right + thumb_r,
        bottom: slider_y + track_h + thumb_r + 4,
    };

    draw_text_simple(hdc, low_label, inner_x, slider_y + track_h + 6, CLR_MUTED_FG, fonts.xxs);
    draw_text_right(hdc, high_label, inner_right, slider_y + track_h + 6, CLR_MUTED_FG, fonts.xxs);

    card.bottom
}

fn draw_service_card(hdc: HDC, y: i32, state: &mut UiState, fonts: &Fonts) -> i32 {
    let x = PADDING;
    let inner_x = x + 16;
    let inner_right = x + CONTENT_WIDTH - 16;

    let card = RECT {
        left: x,
        top: y,
        right: x + CONTENT_WIDTH,
        bottom: y + 112,
    };
    draw_rounded_rect(hdc, &card, CARD_RADIUS, CLR_BACKGROUND, CLR_BORDER);

    draw_text_simple(hdc, "Overlay Service", inner_x, y + 12, CLR_FOREGROUND, fonts.small_bold);
    draw_text_simple(
        hdc,
        "Keep the dimming layer above every window",
        inner_x,
        y + 30,
        CLR_MUTED_FG,
        fonts.xs,
    );
    state.service_toggle.rect = draw_toggle(hdc, inner_right - 44, y + 16, state.service_toggle.checked);

    // Divider
    let div_y = y + 56;
    unsafe {
        let pen = CreatePen(PS_SOLID, 1, CLR_BORDER);
        let old = SelectObject(hdc, HGDIOBJ::from(pen));
        let _ = MoveToEx(hdc, inner_x, div_y, None);
        let _ = LineTo(hdc, inner_right, div_y);
        SelectObject(hdc, old);
        let _ = DeleteObject(HGDIOBJ::from(pen));
    }

    draw_text_simple(hdc, "Accessibility", inner_x, div_y + 12, CLR_FOREGROUND, fonts.small_bold);
    draw_text_simple(hdc, "Windows ease-of-access settings", inner_x, div_y + 28, CLR_MUTED_FG, fonts.xxs);

    let btn_text = state.open_settings_btn.text.clone();
    let (bw, bh) = measure_text(hdc, &btn_text, fonts.xs);
    let btn_w = bw + 28;
    let btn_h = bh + 12;
    let btn_x = inner_right - btn_w;
    let btn_y = div_y + 12;
    let btn_rect = RECT {
        left: btn_x,
        top: btn_y,
        right: btn_x + btn_w,
        bottom: btn_y + btn_h,
    };
    draw_rounded_rect(hdc, &btn_rect, CARD_RADIUS, CLR_SECONDARY, CLR_BORDER);
    draw_text_simple(
        hdc,
        &btn_text,
        btn_x + (btn_w - bw) / 2,
        btn_y + (btn_h - bh) / 2,
        CLR_FOREGROUND,
        fonts.xs,
    );
    state.open_settings_btn.rect = btn_rect;

    card.bottom
}

fn draw_stop_button(hdc: HDC, y: i32, state: &mut UiState, fonts: &Fonts) {
    let rect = RECT {
        left: PADDING,
        top: y,
        right: PADDING + CONTENT_WIDTH,
        bottom: y + 40,
    };
    draw_rounded_rect(hdc, &rect, CARD_RADIUS, CLR_DESTRUCTIVE, CLR_DESTRUCTIVE);
    let text = state.stop_btn.text.clone();
    let (tw, th) = measure_text(hdc, &text, fonts.small_bold);
    draw_text_simple(
        hdc,
        &text,
        rect.left + (rect.right - rect.left - tw) / 2,
        rect.top + (rect.bottom - rect.top - th) / 2,
        CLR_FOREGROUND,
        fonts.small_bold,
    );
    state.stop_btn.rect = rect;
}

fn draw_toggle(hdc: HDC, x: i32, y: i32, checked: bool) -> RECT {
    let w = 44;
    let h = 24;
    let rect = RECT {
        left: x,
        top: y,
        right: x + w,
        bottom: y + h,
    };

    let track_color = if checked { CLR_BRAND } else { CLR_SECONDARY };
    draw_rounded_rect(hdc, &rect, h / 2, track_color, track_color);

    let thumb_r = 10;
    let thumb_x = if checked {
        x + w - 2 - thumb_r
    } else {
        x + 2 + thumb_r
    };
    draw_circle(hdc, thumb_x, y + h / 2, thumb_r, CLR_FOREGROUND);

    rect
}

fn draw_toast(hdc: HDC, client: &RECT, state: &UiState, fonts: &Fonts) {
    let msg = &state.toast_message;
    if msg.is_empty() {
        return;
    }

    let (tw, th) = measure_text(hdc, msg, fonts.small_bold);
    let toast_w = tw + 48;
    let toast_h = th + 24;
    let toast_x = (client.right - toast_w) / 2;
    let toast_y = client.bottom - toast_h - 16;

    let toast_rect = RECT {
        left: toast_x,
        top: toast_y,
        right: toast_x + toast_w,
        bottom: toast_y + toast_h,
    };
    draw_rounded_rect(hdc, &toast_rect, CARD_RADIUS, CLR_FOREGROUND, CLR_FOREGROUND);
    draw_text_simple(
        hdc,
        msg,
        toast_x + (toast_w - tw) / 2,
        toast_y + (toast_h - th) / 2,
        CLR_BACKGROUND,
        fonts.small_bold,
    );
}
