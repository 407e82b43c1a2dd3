use crate::channel::{UpdateBus, UpdateMessage};
use crate::color::{fraction_to_position, position_to_fraction, SLIDER_MAX};
use crate::config::PreferenceKey;
use crate::service::SharedPreferences;
use std::sync::PoisonError;

/// Platform permissions the overlay depends on. Both are user-granted and revocable.
pub trait PermissionProbe {
    fn can_draw_overlays(&self) -> bool;
    /// True while the user has never answered the overlay prompt.
    fn overlay_undecided(&self) -> bool {
        false
    }
    /// Ask the user for the overlay permission. Returns the resulting grant.
    fn request_overlay_permission(&mut self) -> bool;
    fn accessibility_enabled(&self) -> bool;
    fn open_accessibility_settings(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    PermissionDenied,
    AccessibilityDisabled,
}

/// Transient user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    PermissionGranted,
    PermissionDenied,
    EnableAccessibility,
}

impl Notice {
    pub fn text(self) -> &'static str {
        match self {
            Notice::PermissionGranted => "Permission granted",
            Notice::PermissionDenied => "Permission denied",
            Notice::EnableAccessibility => "Enable the overlay service to start dimming",
        }
    }
}

impl StartOutcome {
    pub fn notice(self) -> Option<Notice> {
        match self {
            StartOutcome::Started => None,
            StartOutcome::PermissionDenied => Some(Notice::PermissionDenied),
            StartOutcome::AccessibilityDisabled => Some(Notice::EnableAccessibility),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    Stay,
    Close,
}

/// Slider and button logic of the settings screen, independent of how it is drawn.
pub struct SettingsController<P: PermissionProbe> {
    prefs: SharedPreferences,
    bus: UpdateBus,
    permissions: P,
}

impl<P: PermissionProbe> SettingsController<P> {
    pub fn new(prefs: SharedPreferences, bus: UpdateBus, permissions: P) -> Self {
        Self {
            prefs,
            bus,
            permissions,
        }
    }

    pub fn permissions(&self) -> &P {
        &self.permissions
    }

    pub fn permissions_mut(&mut self) -> &mut P {
        &mut self.permissions
    }

    pub fn alpha_position(&self) -> i32 {
        self.position(PreferenceKey::OverlayAlpha)
    }

    pub fn color_position(&self) -> i32 {
        self.position(PreferenceKey::ColorTemperature)
    }

    fn position(&self, key: PreferenceKey) -> i32 {
        let prefs = self.prefs.lock().unwrap_or_else(PoisonError::into_inner);
        fraction_to_position(prefs.get(key))
    }

    /// Persist the new slider value and push it to the overlay right away.
    pub fn on_alpha_changed(&mut self, position: i32) -> i32 {
        let position = position.clamp(0, SLIDER_MAX);
        let alpha = position_to_fraction(position);
        self.persist(PreferenceKey::OverlayAlpha, alpha);
        self.bus.send(UpdateMessage::UpdateAlpha(alpha));
        position
    }

    pub fn on_color_changed(&mut self, position: i32) -> i32 {
        let position = position.clamp(0, SLIDER_MAX);
        let value = position_to_fraction(position);
        self.persist(PreferenceKey::ColorTemperature, value);
        self.bus.send(UpdateMessage::UpdateColorTemperature(value));
        position
    }

    fn persist(&self, key: PreferenceKey, value: f32) {
        let mut prefs = self.prefs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = prefs.set(key, value) {
            tracing::warn!(key = key.as_str(), error = %err, "failed to save preference");
        }
    }

    pub fn stop(&mut self) -> ScreenAction {
        self.bus.send(UpdateMessage::StopService);
        ScreenAction::Close
    }

    pub fn open_accessibility_settings(&mut self) {
        self.permissions.open_accessibility_settings();
    }

    pub fn request_overlay_permission(&mut self) -> Notice {
        if self.permissions.request_overlay_permission() {
            tracing::info!("overlay permission granted");
            Notice::PermissionGranted
        } else {
            tracing::warn!("overlay permission denied");
            Notice::PermissionDenied
        }
    }

    /// Prompt for a missing overlay permission, then start.
    ///
    /// Without `ask_again` the prompt only appears while the user has never
    /// answered it; a user asking to turn the service on passes `true` so an
    /// earlier denial or revocation can be undone.
    pub fn start_with_prompt(&mut self, ask_again: bool) -> (StartOutcome, Option<Notice>) {
        let mut prompted = None;
        if !self.permissions.can_draw_overlays()
            && (ask_again || self.permissions.overlay_undecided())
        {
            prompted = Some(self.request_overlay_permission());
        }
        let outcome = self.start_service();
        (outcome, outcome.notice().or(prompted))
    }

    /// Check both permissions. A missing accessibility switch redirects the user to its settings.
    pub fn start_service(&mut self) -> StartOutcome {
        if !self.permissions.can_draw_overlays() {
            tracing::warn!("overlay permission missing, service not started");
            return StartOutcome::PermissionDenied;
        }
        if !self.permissions.accessibility_enabled() {
            tracing::info!("overlay service disabled, redirecting to settings");
            self.permissions.open_accessibility_settings();
            return StartOutcome::AccessibilityDisabled;
        }
        StartOutcome::Started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreferenceStore;
    use std::sync::{mpsc, Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakePermissions {
        overlay: bool,
        undecided: bool,
        grant_on_request: bool,
        accessibility: bool,
        opened_settings: usize,
        prompts: usize,
    }

    impl PermissionProbe for FakePermissions {
        fn can_draw_overlays(&self) -> bool {
            self.overlay
        }

        fn overlay_undecided(&self) -> bool {
            self.undecided
        }

        fn request_overlay_permission(&mut self) -> bool {
            self.prompts += 1;
            self.undecided = false;
            self.overlay = self.grant_on_request;
            self.overlay
        }

        fn accessibility_enabled(&self) -> bool {
            self.accessibility
        }

        fn open_accessibility_settings(&mut self) {
            self.opened_settings += 1;
        }
    }

    fn controller(
        permissions: FakePermissions,
    ) -> (TempDir, SharedPreferences, UpdateBus, SettingsController<FakePermissions>) {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::open(dir.path().join("config.json"));
        let prefs = Arc::new(Mutex::new(store));
        let bus = UpdateBus::new();
        let controller = SettingsController::new(prefs.clone(), bus.clone(), permissions);
        (dir, prefs, bus, controller)
    }

    #[test]
    fn sliders_start_from_defaults() {
        let (_dir, _prefs, _bus, controller) = controller(FakePermissions::default());
        assert_eq!(controller.alpha_position(), 50);
        assert_eq!(controller.color_position(), 0);
    }

    #[test]
    fn every_slider_move_persists_and_broadcasts() {
        let (_dir, prefs, bus, mut controller) = controller(FakePermissions::default());
        let (tx, rx) = mpsc::channel();
        let _sub = bus.subscribe(move |msg| {
            let _ = tx.send(msg);
        });

        controller.on_alpha_changed(70);
        controller.on_alpha_changed(80);
        controller.on_color_changed(40);

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                UpdateMessage::UpdateAlpha(0.7),
                UpdateMessage::UpdateAlpha(0.8),
                UpdateMessage::UpdateColorTemperature(0.4),
            ]
        );
        let prefs = prefs.lock().unwrap();
        assert_eq!(prefs.overlay_alpha(), 0.8);
        assert_eq!(prefs.color_temperature(), 0.4);
    }

    #[test]
    fn slider_positions_are_clamped() {
        let (_dir, _prefs, _bus, mut controller) = controller(FakePermissions::default());
        assert_eq!(controller.on_alpha_changed(140), 100);
        assert_eq!(controller.on_color_changed(-3), 0);
        assert_eq!(controller.alpha_position(), 100);
    }

    #[test]
    fn stop_sends_stop_and_closes() {
        let (_dir, _prefs, bus, mut controller) = controller(FakePermissions::default());
        let (tx, rx) = mpsc::channel();
        let _sub = bus.subscribe(move |msg| {
            let _ = tx.send(msg);
        });
        assert_eq!(controller.stop(), ScreenAction::Close);
        assert_eq!(rx.try_recv(), Ok(UpdateMessage::StopService));
    }

    #[test]
    fn start_without_overlay_permission_is_denied() {
        let (_dir, _prefs, _bus, mut controller) = controller(FakePermissions {
            accessibility: true,
            ..Default::default()
        });
        let outcome = controller.start_service();
        assert_eq!(outcome, StartOutcome::PermissionDenied);
        assert_eq!(outcome.notice(), Some(Notice::PermissionDenied));
        assert_eq!(controller.permissions().opened_settings, 0);
    }

    #[test]
    fn start_without_accessibility_redirects() {
        let (_dir, _prefs, _bus, mut controller) = controller(FakePermissions {
            overlay: true,
            ..Default::default()
        });
        assert_eq!(controller.start_service(), StartOutcome::AccessibilityDisabled);
        assert_eq!(controller.permissions().opened_settings, 1);
    }

    #[test]
    fn start_with_both_permissions() {
        let (_dir, _prefs, _bus, mut controller) = controller(FakePermissions {
            overlay: true,
            accessibility: true,
            ..Default::default()
        });
        assert_eq!(controller.start_service(), StartOutcome::Started);
    }

    #[test]
    fn permission_request_reports_result() {
        let (_dir, _prefs, _bus, mut controller) = controller(FakePermissions {
            grant_on_request: true,
            ..Default::default()
        });
        assert_eq!(controller.request_overlay_permission(), Notice::PermissionGranted);
        assert!(controller.permissions().can_draw_overlays());

        controller.permissions_mut().grant_on_request = false;
        assert_eq!(controller.request_overlay_permission(), Notice::PermissionDenied);
        assert_eq!(Notice::PermissionDenied.text(), "Permission denied");
    }

    #[test]
    fn launch_prompts_only_when_never_asked() {
        let (_dir, _prefs, _bus, mut controller) = controller(FakePermissions {
            undecided: true,
            grant_on_request: true,
            accessibility: true,
            ..Default::default()
        });
        assert_eq!(
            controller.start_with_prompt(false),
            (StartOutcome::Started, Some(Notice::PermissionGranted))
        );
        assert_eq!(controller.start_with_prompt(false), (StartOutcome::Started, None));
        assert_eq!(controller.permissions().prompts, 1);
    }

    #[test]
    fn earlier_denial_is_not_asked_again_on_launch() {
        let (_dir, _prefs, _bus, mut controller) = controller(FakePermissions {
            grant_on_request: true,
            accessibility: true,
            ..Default::default()
        });
        assert_eq!(
            controller.start_with_prompt(false),
            (StartOutcome::PermissionDenied, Some(Notice::PermissionDenied))
        );
        assert_eq!(controller.permissions().prompts, 0);
    }

    #[test]
    fn turning_the_service_on_again_can_regrant_permission() {
        let (_dir, _prefs, _bus, mut controller) = controller(FakePermissions {
            undecided: true,
            accessibility: true,
            ..Default::default()
        });
        assert_eq!(
            controller.start_with_prompt(false),
            (StartOutcome::PermissionDenied, Some(Notice::PermissionDenied))
        );

        controller.permissions_mut().grant_on_request = true;
        assert_eq!(
            controller.start_with_prompt(true),
            (StartOutcome::Started, Some(Notice::PermissionGranted))
        );
        assert_eq!(controller.permissions().prompts, 2);
    }
}
