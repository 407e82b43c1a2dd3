use windows::Win32::Foundation::COLORREF;

// ── Color palette (shadcn dark) ──────────────────────────────────────────────

/// Background: #030711
pub const CLR_BACKGROUND: COLORREF = COLORREF(0x00110703);

/// Foreground / primary text: #F8FAFC
pub const CLR_FOREGROUND: COLORREF = COLORREF(0x00FCFAF8);

/// Secondary / muted bg: #1E293B
pub const CLR_SECONDARY: COLORREF = COLORREF(0x003B291E);

/// Muted foreground (descriptions, labels): #94A3B8
pub const CLR_MUTED_FG: COLORREF = COLORREF(0x00B8A394);

/// Brand amber: #D97706
pub const CLR_BRAND: COLORREF = COLORREF(0x000677D9);

/// Destructive red for the stop button: #B91C1C
pub const CLR_DESTRUCTIVE: COLORREF = COLORREF(0x001C1CB9);

pub const CLR_BORDER: COLORREF = COLORREF(0x003B291E);

// ── Dimensions ───────────────────────────────────────────────────────────────

pub const WINDOW_WIDTH: i32 = 400;
pub const WINDOW_HEIGHT: i32 = 540;

pub const PADDING: i32 = 24;

pub const CONTENT_WIDTH: i32 = WINDOW_WIDTH - 2 * PADDING;

pub const CARD_RADIUS: i32 = 8;

pub const GAP: i32 = 12;

// ── Font sizes (negative = character height) ─────────────────────────────────

pub const FONT_SIZE_TITLE: i32 = -18;
pub const FONT_SIZE_SMALL: i32 = -12;
pub const FONT_SIZE_XS: i32 = -11;
pub const FONT_SIZE_XXS: i32 = -10;

pub const FONT_NAME: &str = "Segoe UI";
