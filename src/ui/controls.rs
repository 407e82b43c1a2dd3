// UI control state tracking and hit-testing

use subdim_shared::color::SLIDER_MAX;
use windows::Win32::Foundation::RECT;

/// Which slider a drag belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderId {
    Dimming,
    Warmth,
}

/// State for a toggle switch control
#[derive(Debug, Clone)]
pub struct ToggleState {
    pub checked: bool,
    pub rect: RECT,
}

impl ToggleState {
    pub fn new(checked: bool) -> Self {
        Self {
            checked,
            rect: RECT::default(),
        }
    }
}

/// State for a 0-100 slider
#[derive(Debug, Clone)]
pub struct SliderState {
    pub value: i32,
    pub dragging: bool,
    pub rect: RECT,       // full track rect
    pub thumb_rect: RECT, // hit area around the track
}

impl SliderState {
    pub fn new(value: i32) -> Self {
        Self {
            value: value.clamp(0, SLIDER_MAX),
            dragging: false,
            rect: RECT::default(),
            thumb_rect: RECT::default(),
        }
    }

    pub fn thumb_x(&self) -> i32 {
        let track_width = self.rect.right - self.rect.left;
        self.rect.left + (self.value as f32 / SLIDER_MAX as f32 * track_width as f32) as i32
    }

    pub fn value_from_x(&self, x: i32) -> i32 {
        let track_width = self.rect.right - self.rect.left;
        if track_width <= 0 {
            return self.value;
        }
        let rel_x = (x - self.rect.left).clamp(0, track_width);
        ((rel_x as f32 / track_width as f32) * SLIDER_MAX as f32).round() as i32
    }
}

#[derive(Debug, Clone)]
pub struct ButtonState {
    pub rect: RECT,
    pub text: String,
}

impl ButtonState {
    pub fn new(text: &str) -> Self {
        Self {
            rect: RECT::default(),
            text: text.to_string(),
        }
    }
}

/// What a click landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Slider(SliderId, i32),
    ServiceToggle,
    OpenSettings,
    Stop,
    Nothing,
}

/// Complete UI state
pub struct UiState {
    pub dimming: SliderState,
    pub warmth: SliderState,
    pub service_toggle: ToggleState,
    pub open_settings_btn: ButtonState,
    pub stop_btn: ButtonState,

    pub toast_message: String,
    pub toast_visible: bool,
}

impl UiState {
    pub fn new(dimming: i32, warmth: i32, service_enabled: bool) -> Self {
        Self {
            dimming: SliderState::new(dimming),
            warmth: SliderState::new(warmth),
            service_toggle: ToggleState::new(service_enabled),
            open_settings_btn: ButtonState::new("Open Settings"),
            stop_btn: ButtonState::new("Stop SubDim"),

            toast_message: String::new(),
            toast_visible: false,
        }
    }

    pub fn slider_mut(&mut self, id: SliderId) -> &mut SliderState {
        match id {
            SliderId::Dimming => &mut self.dimming,
            SliderId::Warmth => &mut self.warmth,
        }
    }

    pub fn dragging(&self) -> Option<SliderId> {
        if self.dimming.dragging {
            Some(SliderId::Dimming)
        } else if self.warmth.dragging {
            Some(SliderId::Warmth)
        } else {
            None
        }
    }

    /// Resolve a click. Starting a slider drag also moves its thumb.
    pub fn hit_test(&mut self, x: i32, y: i32) -> Hit {
        for id in [SliderId::Dimming, SliderId::Warmth] {
            let slider = self.slider_mut(id);
            if point_in_rect(x, y, &slider.thumb_rect) {
                slider.dragging = true;
                slider.value = slider.value_from_x(x);
                return Hit::Slider(id, slider.value);
            }
        }
        if point_in_rect(x, y, &self.service_toggle.rect) {
            Hit::ServiceToggle
        } else if point_in_rect(x, y, &self.open_settings_btn.rect) {
            Hit::OpenSettings
        } else if point_in_rect(x, y, &self.stop_btn.rect) {
            Hit::Stop
        } else {
            Hit::Nothing
        }
    }
}

/// Check if a point is inside a rect
pub fn point_in_rect(x: i32, y: i32, r: &RECT) -> bool {
    x >= r.left && x < r.right && y >= r.top && y < r.bottom
}
