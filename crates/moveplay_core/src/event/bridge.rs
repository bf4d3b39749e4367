//! Runtime notification bridge.
//!
//! # Responsibility
//! - Install one sink on the Runtime and decode each notification into an `Event`.
//! - Forward events to the registered observer in emission order.
//!
//! # Invariants
//! - Each Runtime notification reaches the observer exactly once, synchronously,
//!   while an observer is attached.
//! - No buffering, no coalescing.
//! - Without an observer (or after detach) notifications are dropped silently.
//! - A notification without keys is counted as rejected and delivered as
//!   `Event::empty()`.
//! - The observer is never called while the slot lock is held.

use crate::model::event::{Event, RawNotification};
use crate::runtime::{NotificationSink, Runtime, RuntimeResult};
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Host callback receiving normalized events.
pub type EventObserver = Arc<dyn Fn(Event) + Send + Sync>;

#[derive(Default)]
struct BridgeState {
    observer: Mutex<Option<EventObserver>>,
    delivered: AtomicU64,
    rejected: AtomicU64,
}

impl BridgeState {
    fn relay(&self, raw: RawNotification) {
        let event = match Event::decode(&raw) {
            Ok(event) => event,
            Err(err) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!("event=notification_decode module=event status=rejected error={err}");
                Event::empty()
            }
        };
        if raw.len() > 1 {
            debug!(
                "event=notification_decode module=event status=truncated extra_keys={}",
                raw.len() - 1
            );
        }

        let observer = match self.observer.lock() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        if let Some(observer) = observer {
            observer(event);
            self.delivered.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Wires Runtime notifications to one observer.
pub struct EventBridge;

impl EventBridge {
    /// Installs the bridge sink on `runtime` and returns the subscription.
    pub async fn attach(
        runtime: &dyn Runtime,
        observer: Option<EventObserver>,
    ) -> RuntimeResult<Subscription> {
        let state = Arc::new(BridgeState {
            observer: Mutex::new(observer),
            ..BridgeState::default()
        });
        let sink_state = Arc::clone(&state);
        let sink: NotificationSink = Arc::new(move |raw: RawNotification| sink_state.relay(raw));
        runtime.subscribe(sink).await?;
        debug!("event=bridge_attach module=event status=ok");
        Ok(Subscription { state })
    }
}

/// Handle over an attached bridge. Dropping it detaches the observer.
pub struct Subscription {
    state: Arc<BridgeState>,
}

impl Subscription {
    /// Stops delivery. Later notifications are dropped.
    pub fn detach(&self) {
        if let Ok(mut slot) = self.state.observer.lock() {
            if slot.take().is_some() {
                debug!("event=bridge_detach module=event status=ok");
            }
        }
    }

    pub fn is_attached(&self) -> bool {
        self.state
            .observer
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Events handed to the observer so far.
    pub fn delivered(&self) -> u64 {
        self.state.delivered.load(Ordering::Relaxed)
    }

    /// Notifications that could not be decoded and went out as empty events.
    pub fn rejected(&self) -> u64 {
        self.state.rejected.load(Ordering::Relaxed)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}
