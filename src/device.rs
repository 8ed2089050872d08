//! Async driver that connects a [`GattProfile`] to a [`GattTransport`].
//!
//! One background task owns the event pump. It executes the session's queued
//! requests one at a time, feeds results and inbound notifications back into
//! the session and publishes the resulting [`SessionEvent`]s on a broadcast
//! channel. While the session reports a pending operation a watchdog is armed;
//! it is re-armed on every inbound event.

use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::ble::transport::{GattTransport, NotificationEvent};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::session::events::{SessionCallbacks, SessionEvent};
use crate::session::queue::GattCommand;
use crate::session::{GattProfile, TransportEvent};

/// Callback handle for unregistering callbacks.
///
/// Dropping the handle unregisters the callback as well.
pub struct CallbackHandle {
    id: u64,
    unregister_fn: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CallbackHandle {
    /// Create a new callback handle.
    pub(crate) fn new(id: u64, unregister_fn: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            unregister_fn: Some(Box::new(unregister_fn)),
        }
    }

    /// Unregister this callback.
    pub fn unregister(mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }

    /// Get the callback ID.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }
}

/// State shared between the handle and the pump task.
struct Shared<P> {
    session: Mutex<P>,
    event_tx: broadcast::Sender<SessionEvent>,
    /// Unbounded feeds for registered callbacks, which must see every event.
    callbacks: Mutex<Vec<(u64, mpsc::UnboundedSender<SessionEvent>)>>,
    wake: Notify,
    running: AtomicBool,
}

impl<P: GattProfile> Shared<P> {
    /// Run `f` against the session and publish what it returns.
    ///
    /// Events are sent while the lock is held so that they leave in the order
    /// the session produced them.
    fn apply<F>(&self, f: F) -> Vec<SessionEvent>
    where
        F: FnOnce(&mut P) -> Vec<SessionEvent>,
    {
        let mut session = self.session.lock();
        let events = f(&mut session);
        if !events.is_empty() {
            let mut callbacks = self.callbacks.lock();
            for event in &events {
                trace!("Session event: {:?}", event);
                let _ = self.event_tx.send(event.clone());
                callbacks.retain(|(_, tx)| tx.send(event.clone()).is_ok());
            }
        }
        events
    }
}

/// A running profile session.
pub struct Device<P, T> {
    shared: Arc<Shared<P>>,
    transport: Arc<T>,
    racp_timeout: Duration,
    pump: Mutex<Option<JoinHandle<()>>>,
    callback_counter: AtomicU64,
}

impl<P, T> Device<P, T>
where
    P: GattProfile,
    T: GattTransport + 'static,
{
    /// Wrap a session and a transport. Nothing runs until [`Device::start`].
    pub fn new(session: P, transport: Arc<T>, config: &SessionConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(session),
                event_tx,
                callbacks: Mutex::new(Vec::new()),
                wake: Notify::new(),
                running: AtomicBool::new(false),
            }),
            transport,
            racp_timeout: config.racp_timeout,
            pump: Mutex::new(None),
            callback_counter: AtomicU64::new(0),
        }
    }

    /// Start the event pump.
    ///
    /// Reports the connection, runs service discovery and then processes
    /// requests and notifications until [`Device::stop`] is called or the
    /// notification stream ends.
    ///
    /// Returns `false` without doing anything if the pump is already running.
    pub async fn start(&self) -> Result<bool> {
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Event pump already running");
            return Ok(false);
        }

        let notifications = match self.transport.notifications().await {
            Ok(stream) => stream,
            Err(e) => {
                self.shared.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let pump = Pump {
            shared: self.shared.clone(),
            transport: self.transport.clone(),
            racp_timeout: self.racp_timeout,
            deadline: None,
        };
        let handle = tokio::spawn(pump.run(notifications));
        *self.pump.lock() = Some(handle);

        Ok(true)
    }

    /// Stop the event pump and reset the session as for a disconnect.
    ///
    /// `Disconnected` is reported once, either here or by the pump if the
    /// link was already gone.
    pub async fn stop(&self) {
        let was_running = self.shared.running.swap(false, Ordering::SeqCst);
        self.shared.wake.notify_one();

        let handle = self.pump.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        if was_running {
            self.shared
                .apply(|session| session.handle_event(TransportEvent::Disconnected));
        }
    }

    /// Whether the event pump is running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Apply a user action to the session.
    ///
    /// Returned events are published and queued requests are picked up by
    /// the pump.
    pub fn perform<F>(&self, f: F) -> Vec<SessionEvent>
    where
        F: FnOnce(&mut P) -> Vec<SessionEvent>,
    {
        let events = self.shared.apply(f);
        self.shared.wake.notify_one();
        events
    }

    /// Fallible form of [`Device::perform`].
    pub fn try_perform<F>(&self, f: F) -> Result<Vec<SessionEvent>>
    where
        F: FnOnce(&mut P) -> Result<Vec<SessionEvent>>,
    {
        let mut result = Ok(());
        let events = self.perform(|session| match f(session) {
            Ok(events) => events,
            Err(e) => {
                result = Err(e);
                Vec::new()
            }
        });
        result.map(|_| events)
    }

    /// Read session state.
    pub fn with_session<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        f(&self.shared.session.lock())
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Deliver session events to `callbacks`, one at a time and in order.
    ///
    /// Unlike [`Device::subscribe`], no event is ever dropped: the feed is
    /// unbounded and a slow implementation only delays delivery.
    pub fn set_callbacks(&self, callbacks: Arc<dyn SessionCallbacks>) -> CallbackHandle {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let (tx, mut rx) = mpsc::unbounded_channel::<SessionEvent>();
        self.shared.callbacks.lock().push((callback_id, tx));

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                event.dispatch(callbacks.as_ref());
            }
            debug!("Callback dispatcher {} stopped", callback_id);
        });

        let shared: Weak<Shared<P>> = Arc::downgrade(&self.shared);
        CallbackHandle::new(callback_id, move || {
            if let Some(shared) = shared.upgrade() {
                shared.callbacks.lock().retain(|(id, _)| *id != callback_id);
            }
            handle.abort();
        })
    }
}

impl<P, T> Drop for Device<P, T> {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.wake.notify_one();
    }
}

/// The event pump task.
struct Pump<P, T> {
    shared: Arc<Shared<P>>,
    transport: Arc<T>,
    racp_timeout: Duration,
    deadline: Option<Instant>,
}

impl<P, T> Pump<P, T>
where
    P: GattProfile,
    T: GattTransport + 'static,
{
    async fn run(mut self, mut notifications: BoxStream<'static, NotificationEvent>) {
        debug!("Event pump started");

        self.process(TransportEvent::Connected);
        let discovered = match self.transport.discover_services().await {
            Ok(services) => TransportEvent::ServicesDiscovered(services),
            Err(e) => TransportEvent::Error {
                reason: format!("Service discovery failed: {}", e),
                code: e.status_code(),
            },
        };
        if self.process(discovered) {
            self.disconnect().await;
        }

        let shared = self.shared.clone();
        while shared.running.load(Ordering::SeqCst) {
            self.execute_pending().await;
            if !shared.running.load(Ordering::SeqCst) {
                break;
            }

            let deadline = self.deadline;
            tokio::select! {
                notification = notifications.next() => match notification {
                    Some(n) => {
                        self.process(TransportEvent::CharacteristicChanged {
                            uuid: n.characteristic_uuid,
                            value: n.data,
                        });
                    }
                    None => {
                        info!("Notification stream ended");
                        if shared.running.swap(false, Ordering::SeqCst) {
                            self.process(TransportEvent::Disconnected);
                        }
                    }
                },
                _ = shared.wake.notified() => {}
                _ = sleep_until(deadline), if deadline.is_some() => {
                    warn!("No response within {:?}", self.racp_timeout);
                    self.deadline = None;
                    shared.apply(|session| session.on_watchdog_expired());
                }
            }
        }

        debug!("Event pump stopped");
    }

    /// Execute queued requests until the queue is empty.
    async fn execute_pending(&mut self) {
        loop {
            let command = self.shared.session.lock().requests().poll();
            let command = match command {
                Some(c) => c,
                None => break,
            };

            let result = self.execute(&command).await;
            self.process(result);
        }
    }

    async fn execute(&self, command: &GattCommand) -> TransportEvent {
        debug!("Executing {:?}", command);

        let result = match command {
            GattCommand::EnableNotifications(uuid) => self
                .transport
                .enable_notifications(uuid)
                .await
                .map(|_| TransportEvent::WriteComplete(*uuid)),
            GattCommand::EnableIndications(uuid) => self
                .transport
                .enable_indications(uuid)
                .await
                .map(|_| TransportEvent::WriteComplete(*uuid)),
            GattCommand::Write { uuid, value } => self
                .transport
                .write_characteristic(uuid, value)
                .await
                .map(|_| TransportEvent::WriteComplete(*uuid)),
            GattCommand::Read(uuid) => self
                .transport
                .read_characteristic(uuid)
                .await
                .map(|value| TransportEvent::CharacteristicRead { uuid: *uuid, value }),
        };

        result.unwrap_or_else(|e| TransportEvent::Error {
            reason: format!("{:?} failed: {}", command, e),
            code: e.status_code(),
        })
    }

    /// Feed one event to the session and update the watchdog.
    ///
    /// Returns `true` if the session reported a missing mandatory service.
    fn process(&mut self, event: TransportEvent) -> bool {
        let events = self.shared.apply(|session| session.handle_event(event));

        let pending = self.shared.session.lock().operation_pending();
        self.deadline = if pending {
            Some(Instant::now() + self.racp_timeout)
        } else {
            None
        };

        events
            .iter()
            .any(|e| matches!(e, SessionEvent::ServiceUnavailable { .. }))
    }

    async fn disconnect(&mut self) {
        info!("Device not supported, disconnecting");
        if let Err(e) = self.transport.disconnect().await {
            warn!("Disconnect failed: {}", e);
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio_test::{assert_pending, task};

    #[test]
    fn test_callback_handle_unregisters_once() {
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let handle = CallbackHandle::new(7, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(handle.id(), 7);
        handle.unregister();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let counter = calls.clone();
        let handle = CallbackHandle::new(8, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(handle);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_watchdog_without_deadline_never_fires() {
        let mut sleep = task::spawn(sleep_until(None));
        assert_pending!(sleep.poll());
        assert_pending!(sleep.poll());
    }
}
