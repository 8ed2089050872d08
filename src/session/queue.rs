//! Outbound GATT request queue.

use std::collections::VecDeque;

use tracing::trace;
use uuid::Uuid;

/// A GATT procedure a session wants executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GattCommand {
    /// Enable notifications on a characteristic.
    EnableNotifications(Uuid),
    /// Enable indications on a characteristic.
    EnableIndications(Uuid),
    /// Write a value with response.
    Write {
        /// Target characteristic.
        uuid: Uuid,
        /// Value to write.
        value: Vec<u8>,
    },
    /// Read a characteristic.
    Read(Uuid),
}

impl GattCommand {
    /// Characteristic the command targets.
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::EnableNotifications(uuid)
            | Self::EnableIndications(uuid)
            | Self::Read(uuid)
            | Self::Write { uuid, .. } => *uuid,
        }
    }
}

/// FIFO of GATT commands with a single in-flight slot.
///
/// A command leaves the queue through [`RequestQueue::poll`] and stays in
/// flight until [`RequestQueue::complete`] is called for it. Nothing else is
/// handed out in the meantime.
#[derive(Debug, Default)]
pub struct RequestQueue {
    pending: VecDeque<GattCommand>,
    in_flight: Option<GattCommand>,
    initializing: bool,
}

impl RequestQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command.
    pub fn push(&mut self, command: GattCommand) {
        trace!("Queued {:?}", command);
        self.pending.push_back(command);
    }

    /// Take the next command if nothing is in flight.
    pub fn poll(&mut self) -> Option<GattCommand> {
        if self.in_flight.is_some() {
            return None;
        }
        let next = self.pending.pop_front()?;
        self.in_flight = Some(next.clone());
        Some(next)
    }

    /// Mark the in-flight command as finished and return it.
    pub fn complete(&mut self) -> Option<GattCommand> {
        self.in_flight.take()
    }

    /// The command currently being executed.
    pub fn in_flight(&self) -> Option<&GattCommand> {
        self.in_flight.as_ref()
    }

    /// Number of commands waiting, excluding the in-flight one.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if no command is waiting.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Check if nothing is waiting or in flight.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.pending.is_empty()
    }

    /// Drop everything, including the in-flight command and any pending
    /// initialization.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.in_flight = None;
        self.initializing = false;
    }

    /// Mark the commands queued from now on as the initialization sequence.
    pub fn begin_initialization(&mut self) {
        self.initializing = true;
    }

    /// Returns `true` exactly once, when the initialization sequence has
    /// drained.
    pub fn take_ready(&mut self) -> bool {
        if self.initializing && self.is_idle() {
            self.initializing = false;
            true
        } else {
            false
        }
    }
}
