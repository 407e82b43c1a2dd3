// Overlay service: owns the single dimming surface for as long as the host keeps it bound.

use crate::channel::UpdateMessage;
use crate::color::{alpha_byte, color_for_temperature, composite, Argb, Rgb};
use crate::config::PreferenceStore;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

pub type SharedPreferences = Arc<Mutex<PreferenceStore>>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("overlay class registration failed")]
    ClassRegistration,
    #[error("overlay window could not be created: {0}")]
    SurfaceCreation(String),
}

/// Platform window manager the overlay is drawn through.
///
/// Surfaces must cover the whole screen, sit above everything else and
/// never take focus or input.
pub trait OverlayHost {
    type Handle;

    fn add_surface(&mut self, fill: Argb) -> Result<Self::Handle, ServiceError>;
    fn set_alpha(&mut self, handle: &Self::Handle, alpha: u8);
    fn set_color(&mut self, handle: &Self::Handle, color: Rgb);
    fn remove_surface(&mut self, handle: Self::Handle);
}

/// What the host should do after a message has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

struct LiveSurface<T> {
    handle: T,
    fill: Argb,
}

pub struct OverlayService<H: OverlayHost> {
    host: H,
    prefs: SharedPreferences,
    surface: Option<LiveSurface<H::Handle>>,
}

impl<H: OverlayHost> OverlayService<H> {
    pub fn new(host: H, prefs: SharedPreferences) -> Self {
        Self {
            host,
            prefs,
            surface: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn is_active(&self) -> bool {
        self.surface.is_some()
    }

    pub fn current_fill(&self) -> Option<Argb> {
        self.surface.as_ref().map(|s| s.fill)
    }

    /// Create the surface from the persisted preferences. No-op while one is live.
    pub fn on_connected(&mut self) -> Result<(), ServiceError> {
        if self.surface.is_some() {
            tracing::debug!("overlay already present");
            return Ok(());
        }

        let (alpha, temperature) = {
            let prefs = self.prefs.lock().unwrap_or_else(PoisonError::into_inner);
            (prefs.overlay_alpha(), prefs.color_temperature())
        };
        let fill = composite(color_for_temperature(temperature), alpha);

        match self.host.add_surface(fill) {
            Ok(handle) => {
                tracing::info!(alpha, temperature, "overlay created");
                self.surface = Some(LiveSurface { handle, fill });
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to create overlay");
                Err(err)
            }
        }
    }

    pub fn handle(&mut self, msg: UpdateMessage) -> Control {
        match msg {
            UpdateMessage::UpdateAlpha(alpha) => {
                if let Some(surface) = self.surface.as_mut() {
                    let a = alpha_byte(alpha);
                    self.host.set_alpha(&surface.handle, a);
                    surface.fill.a = a;
                } else {
                    tracing::debug!("alpha update with no overlay");
                }
                Control::Continue
            }
            UpdateMessage::UpdateColorTemperature(value) => {
                if let Some(surface) = self.surface.as_mut() {
                    let color = color_for_temperature(value);
                    self.host.set_color(&surface.handle, color);
                    surface.fill = surface.fill.with_rgb(color);
                } else {
                    tracing::debug!("color update with no overlay");
                }
                Control::Continue
            }
            UpdateMessage::StopService => {
                tracing::info!("stop requested");
                self.remove();
                Control::Exit
            }
        }
    }

    pub fn on_unbind(&mut self) {
        tracing::info!("service unbound");
        self.remove();
    }

    pub fn on_interrupt(&mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(surface) = self.surface.take() {
            self.host.remove_surface(surface.handle);
            tracing::debug!("overlay removed");
        }
    }
}

impl<H: OverlayHost> Drop for OverlayService<H> {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Add(Argb),
        Alpha(u32, u8),
        Color(u32, Rgb),
        Remove(u32),
    }

    #[derive(Default, Clone)]
    pub struct RecordingHost {
        pub calls: Arc<Mutex<Vec<Call>>>,
        pub fail: bool,
        pub(crate) next: u32,
    }

    impl RecordingHost {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl OverlayHost for RecordingHost {
        type Handle = u32;

        fn add_surface(&mut self, fill: Argb) -> Result<u32, ServiceError> {
            if self.fail {
                return Err(ServiceError::SurfaceCreation("denied".into()));
            }
            self.next += 1;
            self.calls.lock().unwrap().push(Call::Add(fill));
            Ok(self.next)
        }

        fn set_alpha(&mut self, handle: &u32, alpha: u8) {
            self.calls.lock().unwrap().push(Call::Alpha(*handle, alpha));
        }

        fn set_color(&mut self, handle: &u32, color: Rgb) {
            self.calls.lock().unwrap().push(Call::Color(*handle, color));
        }

        fn remove_surface(&mut self, handle: u32) {
            self.calls.lock().unwrap().push(Call::Remove(handle));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{Call, RecordingHost};
    use super::*;
    use crate::config::PreferenceKey;
    use tempfile::TempDir;

    fn prefs(alpha: f32, temperature: f32) -> (TempDir, SharedPreferences) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PreferenceStore::open(dir.path().join("config.json"));
        store.set(PreferenceKey::OverlayAlpha, alpha).unwrap();
        store.set(PreferenceKey::ColorTemperature, temperature).unwrap();
        (dir, Arc::new(Mutex::new(store)))
    }

    #[test]
    fn connect_builds_fill_from_preferences() {
        let (_dir, prefs) = prefs(0.5, 1.0);
        let host = RecordingHost::default();
        let mut service = OverlayService::new(host.clone(), prefs);
        service.on_connected().unwrap();
        assert_eq!(
            host.calls(),
            vec![Call::Add(Argb { a: 127, r: 130, g: 25, b: 0 })]
        );
        assert!(service.is_active());
    }

    #[test]
    fn second_connect_is_a_no_op() {
        let (_dir, prefs) = prefs(0.5, 0.0);
        let host = RecordingHost::default();
        let mut service = OverlayService::new(host.clone(), prefs);
        service.on_connected().unwrap();
        service.on_connected().unwrap();
        assert_eq!(host.calls().len(), 1);
    }

    #[test]
    fn alpha_update_leaves_color_alone() {
        let (_dir, prefs) = prefs(0.5, 1.0);
        let host = RecordingHost::default();
        let mut service = OverlayService::new(host.clone(), prefs);
        service.on_connected().unwrap();

        assert_eq!(service.handle(UpdateMessage::UpdateAlpha(0.8)), Control::Continue);
        assert_eq!(
            service.current_fill(),
            Some(Argb { a: 204, r: 130, g: 25, b: 0 })
        );
        assert_eq!(host.calls().last(), Some(&Call::Alpha(1, 204)));
    }

    #[test]
    fn color_update_keeps_alpha() {
        let (_dir, prefs) = prefs(0.5, 0.0);
        let host = RecordingHost::default();
        let mut service = OverlayService::new(host.clone(), prefs);
        service.on_connected().unwrap();

        service.handle(UpdateMessage::UpdateColorTemperature(0.25));
        let fill = service.current_fill().unwrap();
        assert_eq!(fill.a, 127);
        assert_eq!(fill.rgb(), Rgb::new(65, 6, 0));
        assert_eq!(host.calls().last(), Some(&Call::Color(1, Rgb::new(65, 6, 0))));
    }

    #[test]
    fn updates_without_surface_are_ignored() {
        let (_dir, prefs) = prefs(0.5, 0.0);
        let host = RecordingHost::default();
        let mut service = OverlayService::new(host.clone(), prefs);
        service.handle(UpdateMessage::UpdateAlpha(0.9));
        service.handle(UpdateMessage::UpdateColorTemperature(0.9));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn stop_removes_surface_and_exits() {
        let (_dir, prefs) = prefs(0.5, 0.0);
        let host = RecordingHost::default();
        let mut service = OverlayService::new(host.clone(), prefs);
        service.on_connected().unwrap();
        assert_eq!(service.handle(UpdateMessage::StopService), Control::Exit);
        assert!(!service.is_active());
        assert_eq!(host.calls().last(), Some(&Call::Remove(1)));
    }

    #[test]
    fn stop_without_surface_still_exits() {
        let (_dir, prefs) = prefs(0.5, 0.0);
        let host = RecordingHost::default();
        let mut service = OverlayService::new(host.clone(), prefs);
        assert_eq!(service.handle(UpdateMessage::StopService), Control::Exit);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn unbind_and_drop_tear_down_once() {
        let (_dir, prefs) = prefs(0.5, 0.0);
        let host = RecordingHost::default();
        let mut service = OverlayService::new(host.clone(), prefs.clone());
        service.on_connected().unwrap();
        service.on_unbind();
        drop(service);
        let removes = host
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Remove(_)))
            .count();
        assert_eq!(removes, 1);

        let mut service = OverlayService::new(host.clone(), prefs);
        service.on_connected().unwrap();
        drop(service);
        assert_eq!(host.calls().last(), Some(&Call::Remove(1)));
    }

    #[test]
    fn failed_creation_leaves_service_inactive() {
        let (_dir, prefs) = prefs(0.5, 0.0);
        let host = RecordingHost {
            fail: true,
            ..Default::default()
        };
        let mut service = OverlayService::new(host, prefs);
        assert!(service.on_connected().is_err());
        assert!(!service.is_active());
    }
}
