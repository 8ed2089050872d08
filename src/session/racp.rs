//! RACP request/response state machine.
//!
//! The machine is a value: [`RacpMachine::step`] consumes it together with an
//! input and returns the next machine, the events to report and the command
//! to write, if any. It never touches a transport.

use tracing::{debug, warn};

use crate::error::Error;
use crate::protocol::racp::{OpCode, RacpCommand, RacpResponse, ResponseCode};
use crate::session::events::SessionEvent;

/// Where the current RACP dialogue stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RacpPhase {
    /// No operation running.
    #[default]
    Idle,
    /// Waiting for a Number of Stored Records response.
    AwaitingCount,
    /// Records are being reported; waiting for the final response code.
    AwaitingRecords,
}

impl std::fmt::Display for RacpPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AwaitingCount => write!(f, "AwaitingCount"),
            Self::AwaitingRecords => write!(f, "AwaitingRecords"),
        }
    }
}

/// Inputs accepted by [`RacpMachine::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RacpInput {
    /// The user started an operation.
    Start(RacpCommand),
    /// The user asked to abort the running operation.
    Abort,
    /// The device indicated a RACP response.
    Response(RacpResponse),
    /// No inbound event arrived within the configured timeout.
    WatchdogExpired,
    /// The link went down.
    Reset,
}

/// Result of one transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RacpOutput {
    /// Events to report, in order.
    pub events: Vec<SessionEvent>,
    /// Command to write to the control point.
    pub command: Option<RacpCommand>,
}

impl RacpOutput {
    fn events(events: Vec<SessionEvent>) -> Self {
        Self {
            events,
            command: None,
        }
    }

    fn with_command(mut self, command: RacpCommand) -> Self {
        self.command = Some(command);
        self
    }
}

/// RACP dialogue state plus the orthogonal abort flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RacpMachine {
    phase: RacpPhase,
    abort_requested: bool,
}

impl RacpMachine {
    /// Create an idle machine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> RacpPhase {
        self.phase
    }

    /// Whether an abort is waiting for its response.
    pub fn abort_requested(&self) -> bool {
        self.abort_requested
    }

    /// Whether the machine expects a response from the device.
    pub fn is_busy(&self) -> bool {
        self.phase != RacpPhase::Idle || self.abort_requested
    }

    /// Apply one input.
    pub fn step(self, input: RacpInput) -> (Self, RacpOutput) {
        let (next, output) = match input {
            RacpInput::Start(command) => self.start(command),
            RacpInput::Abort => (
                Self {
                    abort_requested: true,
                    ..self
                },
                RacpOutput::default().with_command(RacpCommand::abort()),
            ),
            RacpInput::Response(RacpResponse::NumberOfRecords(count)) => {
                self.number_of_records(count)
            }
            RacpInput::Response(RacpResponse::OperationResult {
                requested_op_code,
                response_code,
            }) => self.operation_result(requested_op_code, response_code),
            RacpInput::WatchdogExpired => self.expire(),
            RacpInput::Reset => (Self::new(), RacpOutput::default()),
        };

        if next.phase != self.phase {
            debug!("RACP phase: {} -> {}", self.phase, next.phase);
        }

        (next, output)
    }

    fn start(self, command: RacpCommand) -> (Self, RacpOutput) {
        if self.phase != RacpPhase::Idle {
            debug!("Starting {:?} while {}", command.op_code, self.phase);
        }

        let phase = match command.op_code {
            OpCode::ReportNumberOfRecords => RacpPhase::AwaitingCount,
            _ => RacpPhase::AwaitingRecords,
        };

        (
            Self { phase, ..self },
            RacpOutput::events(vec![SessionEvent::OperationStarted]).with_command(command),
        )
    }

    fn number_of_records(self, count: u16) -> (Self, RacpOutput) {
        let mut events = vec![SessionEvent::NumberOfRecordsRequested(count)];

        if count > 0 {
            (
                Self {
                    phase: RacpPhase::AwaitingRecords,
                    ..self
                },
                RacpOutput::events(events).with_command(RacpCommand::report_all()),
            )
        } else {
            events.push(SessionEvent::OperationCompleted);
            (
                Self {
                    phase: RacpPhase::Idle,
                    ..self
                },
                RacpOutput::events(events),
            )
        }
    }

    fn operation_result(self, op_code: u8, response_code: ResponseCode) -> (Self, RacpOutput) {
        let event = match response_code {
            ResponseCode::Success if self.abort_requested => SessionEvent::OperationAborted,
            ResponseCode::Success | ResponseCode::NoRecordsFound => {
                SessionEvent::OperationCompleted
            }
            ResponseCode::OpCodeNotSupported => SessionEvent::OperationNotSupported,
            _ => SessionEvent::OperationFailed,
        };

        if let Err(e) = response_code.to_result(op_code) {
            debug!("RACP request rejected: {}", e);
        }

        (Self::new(), RacpOutput::events(vec![event]))
    }

    fn expire(self) -> (Self, RacpOutput) {
        if !self.is_busy() {
            return (self, RacpOutput::default());
        }

        warn!("RACP operation timed out in {}", self.phase);

        (
            Self::new(),
            RacpOutput::events(vec![
                SessionEvent::from_error(&Error::Timeout),
                SessionEvent::OperationFailed,
            ]),
        )
    }
}
