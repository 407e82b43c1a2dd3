use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use subdim_shared::channel::schedule_resync;
use subdim_shared::{
    Argb, Control, OverlayHost, OverlayService, PermissionProbe, PreferenceStore, Rgb,
    ScreenAction, ServiceError, SettingsController, StartOutcome, UpdateBus, UpdateMessage,
};

#[derive(Default)]
struct Screen {
    fill: Option<Argb>,
    created: usize,
}

/// Host that keeps one fake screen, shared with the test.
#[derive(Clone, Default)]
struct FakeHost(Arc<Mutex<Screen>>);

impl OverlayHost for FakeHost {
    type Handle = ();

    fn add_surface(&mut self, fill: Argb) -> Result<(), ServiceError> {
        let mut screen = self.0.lock().unwrap();
        screen.fill = Some(fill);
        screen.created += 1;
        Ok(())
    }

    fn set_alpha(&mut self, _: &(), alpha: u8) {
        if let Some(fill) = self.0.lock().unwrap().fill.as_mut() {
            fill.a = alpha;
        }
    }

    fn set_color(&mut self, _: &(), color: Rgb) {
        if let Some(fill) = self.0.lock().unwrap().fill.as_mut() {
            *fill = fill.with_rgb(color);
        }
    }

    fn remove_surface(&mut self, _: ()) {
        self.0.lock().unwrap().fill = None;
    }
}

struct Granted;

impl PermissionProbe for Granted {
    fn can_draw_overlays(&self) -> bool {
        true
    }
    fn request_overlay_permission(&mut self) -> bool {
        true
    }
    fn accessibility_enabled(&self) -> bool {
        true
    }
    fn open_accessibility_settings(&mut self) {}
}

/// Drains the bus the way the Windows host does: the listener only queues, the owner thread handles.
fn drain(rx: &mpsc::Receiver<UpdateMessage>, service: &mut OverlayService<FakeHost>) -> Control {
    let mut control = Control::Continue;
    while let Ok(msg) = rx.try_recv() {
        if service.handle(msg) == Control::Exit {
            control = Control::Exit;
        }
    }
    control
}

#[test]
fn settings_drive_the_overlay_until_stop() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = Arc::new(Mutex::new(PreferenceStore::open(dir.path().join("config.json"))));
    let bus = UpdateBus::new();
    let host = FakeHost::default();

    let mut settings = SettingsController::new(prefs.clone(), bus.clone(), Granted);
    assert_eq!(settings.start_service(), StartOutcome::Started);

    let mut service = OverlayService::new(host.clone(), prefs.clone());
    let (tx, rx) = mpsc::channel();
    let subscription = bus.subscribe(move |msg| {
        let _ = tx.send(msg);
    });
    service.on_connected().unwrap();
    assert_eq!(host.0.lock().unwrap().fill, Some(Argb { a: 127, r: 0, g: 0, b: 0 }));

    settings.on_alpha_changed(80);
    settings.on_color_changed(100);
    assert_eq!(drain(&rx, &mut service), Control::Continue);
    assert_eq!(host.0.lock().unwrap().fill, Some(Argb { a: 204, r: 130, g: 25, b: 0 }));

    assert_eq!(settings.stop(), ScreenAction::Close);
    assert_eq!(drain(&rx, &mut service), Control::Exit);
    drop(subscription);

    assert_eq!(host.0.lock().unwrap().fill, None);
    assert_eq!(host.0.lock().unwrap().created, 1);
    assert!(!bus.send(UpdateMessage::UpdateAlpha(0.1)));
}

#[test]
fn restarted_service_resumes_from_persisted_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let bus = UpdateBus::new();
    {
        let prefs = Arc::new(Mutex::new(PreferenceStore::open(&path)));
        let mut settings = SettingsController::new(prefs, bus.clone(), Granted);
        settings.on_alpha_changed(30);
        settings.on_color_changed(50);
    }

    let prefs = Arc::new(Mutex::new(PreferenceStore::open(&path)));
    let host = FakeHost::default();
    let mut service = OverlayService::new(host.clone(), prefs.clone());
    let (tx, rx) = mpsc::channel();
    let _subscription = bus.subscribe(move |msg| {
        let _ = tx.send(msg);
    });
    service.on_connected().unwrap();
    assert_eq!(host.0.lock().unwrap().fill, Some(Argb { a: 76, r: 130, g: 12, b: 0 }));

    schedule_resync(&bus, &prefs, Duration::from_millis(5))
        .join()
        .unwrap();
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(1)),
        Ok(UpdateMessage::UpdateColorTemperature(0.5))
    );
}

#[test]
fn dropping_the_service_clears_the_screen() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = Arc::new(Mutex::new(PreferenceStore::open(dir.path().join("config.json"))));
    let host = FakeHost::default();
    {
        let mut service = OverlayService::new(host.clone(), prefs);
        service.on_connected().unwrap();
        assert!(host.0.lock().unwrap().fill.is_some());
    }
    assert_eq!(host.0.lock().unwrap().fill, None);
}

#[test]
fn resync_does_not_undo_a_slider_move() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = Arc::new(Mutex::new(PreferenceStore::open(dir.path().join("config.json"))));
    let bus = UpdateBus::new();
    let host = FakeHost::default();
    let mut settings = SettingsController::new(prefs.clone(), bus.clone(), Granted);

    let mut service = OverlayService::new(host.clone(), prefs.clone());
    let (tx, rx) = mpsc::channel();
    let _subscription = bus.subscribe(move |msg| {
        let _ = tx.send(msg);
    });
    service.on_connected().unwrap();
    let resync = schedule_resync(&bus, &prefs, Duration::from_millis(50));

    // Warmth moved before the resync fires
    settings.on_color_changed(100);
    resync.join().unwrap();
    drain(&rx, &mut service);

    assert_eq!(prefs.lock().unwrap().color_temperature(), 1.0);
    assert_eq!(host.0.lock().unwrap().fill, Some(Argb { a: 127, r: 130, g: 25, b: 0 }));
}

#[test]
fn updates_queued_after_unbind_do_not_bring_the_overlay_back() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = Arc::new(Mutex::new(PreferenceStore::open(dir.path().join("config.json"))));
    let bus = UpdateBus::new();
    let host = FakeHost::default();
    let mut settings = SettingsController::new(prefs.clone(), bus.clone(), Granted);

    let mut service = OverlayService::new(host.clone(), prefs.clone());
    let (tx, rx) = mpsc::channel();
    let _subscription = bus.subscribe(move |msg| {
        let _ = tx.send(msg);
    });
    service.on_connected().unwrap();
    service.on_unbind();

    settings.on_alpha_changed(90);
    settings.on_color_changed(60);
    assert_eq!(drain(&rx, &mut service), Control::Continue);

    assert!(!service.is_active());
    assert_eq!(host.0.lock().unwrap().fill, None);
    assert_eq!(host.0.lock().unwrap().created, 1);
}
