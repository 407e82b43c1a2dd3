// Settings → overlay service messages.
//
// One subscriber at a time. Sends are fire-and-forget: a message sent while
// nobody listens is dropped.

use crate::service::SharedPreferences;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub const ACTION_UPDATE_ALPHA: &str = "subdim.action.UPDATE_ALPHA";
pub const ACTION_UPDATE_COLOR_TEMPERATURE: &str = "subdim.action.UPDATE_COLOR_TEMPERATURE";
pub const ACTION_STOP_SERVICE: &str = "subdim.action.STOP_SERVICE";

const KIND_UPDATE_ALPHA: u32 = 1;
const KIND_UPDATE_COLOR_TEMPERATURE: u32 = 2;
const KIND_STOP_SERVICE: u32 = 3;

/// Delay before a freshly connected overlay is re-sent the persisted color temperature.
pub const RESYNC_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateMessage {
    UpdateAlpha(f32),
    UpdateColorTemperature(f32),
    StopService,
}

impl UpdateMessage {
    pub fn action(&self) -> &'static str {
        match self {
            UpdateMessage::UpdateAlpha(_) => ACTION_UPDATE_ALPHA,
            UpdateMessage::UpdateColorTemperature(_) => ACTION_UPDATE_COLOR_TEMPERATURE,
            UpdateMessage::StopService => ACTION_STOP_SERVICE,
        }
    }

    /// Compact form for carrying a message through a window-message queue.
    pub fn to_wire(&self) -> (u32, u32) {
        match *self {
            UpdateMessage::UpdateAlpha(alpha) => (KIND_UPDATE_ALPHA, alpha.to_bits()),
            UpdateMessage::UpdateColorTemperature(value) => {
                (KIND_UPDATE_COLOR_TEMPERATURE, value.to_bits())
            }
            UpdateMessage::StopService => (KIND_STOP_SERVICE, 0),
        }
    }

    pub fn from_wire(kind: u32, payload: u32) -> Option<Self> {
        match kind {
            KIND_UPDATE_ALPHA => Some(UpdateMessage::UpdateAlpha(f32::from_bits(payload))),
            KIND_UPDATE_COLOR_TEMPERATURE => Some(UpdateMessage::UpdateColorTemperature(
                f32::from_bits(payload),
            )),
            KIND_STOP_SERVICE => Some(UpdateMessage::StopService),
            _ => None,
        }
    }
}

type Listener = Arc<dyn Fn(UpdateMessage) + Send + Sync>;

struct Slot {
    // Bumped on every subscribe so a stale guard can't remove a newer listener.
    generation: u64,
    listener: Option<Listener>,
}

#[derive(Clone)]
pub struct UpdateBus {
    slot: Arc<Mutex<Slot>>,
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UpdateBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateBus")
            .field("subscribed", &self.has_subscriber())
            .finish()
    }
}

impl UpdateBus {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                generation: 0,
                listener: None,
            })),
        }
    }

    /// Register the single listener. It stays registered until the returned guard drops.
    ///
    /// The listener runs outside the bus lock, so it may itself send or subscribe.
    #[must_use = "dropping the subscription deregisters the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(UpdateMessage) + Send + Sync + 'static,
    {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        slot.listener = Some(Arc::new(listener));
        Subscription {
            slot: Arc::clone(&self.slot),
            generation: slot.generation,
        }
    }

    pub fn has_subscriber(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listener
            .is_some()
    }

    /// Deliver `msg` to the listener, if any. Returns whether it was delivered.
    pub fn send(&self, msg: UpdateMessage) -> bool {
        let listener = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listener
            .clone();
        match listener {
            Some(listener) => {
                tracing::trace!(action = msg.action(), "delivering update");
                listener(msg);
                true
            }
            None => {
                tracing::debug!(action = msg.action(), "no listener, update dropped");
                false
            }
        }
    }
}

/// Listener registration. Deregisters on drop.
pub struct Subscription {
    slot: Arc<Mutex<Slot>>,
    generation: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.generation == self.generation {
            slot.listener = None;
        }
    }
}

/// Re-send the persisted color temperature once, after `delay`.
///
/// The value is read when the timer fires, so a slider move made in the
/// meantime is what gets sent.
pub fn schedule_resync(
    bus: &UpdateBus,
    prefs: &SharedPreferences,
    delay: Duration,
) -> std::thread::JoinHandle<()> {
    let bus = bus.clone();
    let prefs = Arc::clone(prefs);
    std::thread::spawn(move || {
        std::thread::sleep(delay);
        let value = prefs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .color_temperature();
        bus.send(UpdateMessage::UpdateColorTemperature(value));
    })
}
