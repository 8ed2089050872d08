//! Blood Pressure profile session.
//!
//! Resolves the Blood Pressure, Intermediate Cuff Pressure, RACP and Current
//! Time characteristics, runs the initialization sequence, decodes inbound
//! measurements into the record store and drives the RACP dialogue.

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::transport::ServiceSet;
use crate::ble::uuids::*;
use crate::data::RecordStore;
use crate::error::Result;
use crate::protocol::current_time::CurrentTime;
use crate::protocol::pressure::{BloodPressureMeasurement, IntermediateCuffPressure};
use crate::protocol::racp::{RacpCommand, RacpResponse, UserFacingTime};
use crate::session::events::SessionEvent;
use crate::session::queue::{GattCommand, RequestQueue};
use crate::session::racp::{RacpInput, RacpMachine, RacpPhase};
use crate::session::{GattProfile, TransportEvent};

type Clock = Box<dyn Fn() -> NaiveDateTime + Send>;

/// Characteristic handles resolved at discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Handles {
    measurement: Option<Uuid>,
    intermediate_cuff_pressure: Option<Uuid>,
    record_access_control_point: Option<Uuid>,
    current_time: Option<Uuid>,
}

/// Session state for one connected blood pressure monitor.
///
/// Retrieval and delete entry points clear the record store before starting.
/// All RACP entry points do nothing when the device has no control point.
pub struct BloodPressureSession {
    handles: Handles,
    machine: RacpMachine,
    store: RecordStore,
    requests: RequestQueue,
    clock: Clock,
}

impl BloodPressureSession {
    /// Create a session that writes the local wall-clock time on connect.
    pub fn new() -> Self {
        Self::with_clock(|| Local::now().naive_local())
    }

    /// Create a session with a custom source for the Current Time write.
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + 'static,
    {
        Self {
            handles: Handles::default(),
            machine: RacpMachine::new(),
            store: RecordStore::new(),
            requests: RequestQueue::new(),
            clock: Box::new(clock),
        }
    }

    /// Records received since the last clear.
    pub fn records(&self) -> &RecordStore {
        &self.store
    }

    /// Current RACP phase.
    pub fn racp_phase(&self) -> RacpPhase {
        self.machine.phase()
    }

    /// Current RACP machine.
    pub fn racp_machine(&self) -> RacpMachine {
        self.machine
    }

    /// Whether discovery found the Blood Pressure Measurement characteristic.
    pub fn is_supported(&self) -> bool {
        self.handles.measurement.is_some()
    }

    /// Whether the device exposes a Record Access Control Point.
    pub fn has_record_access(&self) -> bool {
        self.handles.record_access_control_point.is_some()
    }

    /// Whether the device exposes Intermediate Cuff Pressure.
    pub fn has_intermediate_cuff_pressure(&self) -> bool {
        self.handles.intermediate_cuff_pressure.is_some()
    }

    // === RACP operations ===

    /// Request every stored record.
    pub fn get_all_records(&mut self) -> Vec<SessionEvent> {
        self.retrieve(RacpCommand::report_all())
    }

    /// Request the oldest stored record.
    pub fn get_first_record(&mut self) -> Vec<SessionEvent> {
        self.retrieve(RacpCommand::report_first())
    }

    /// Request the most recent stored record.
    pub fn get_last_record(&mut self) -> Vec<SessionEvent> {
        self.retrieve(RacpCommand::report_last())
    }

    /// Request records by sequence number.
    ///
    /// # Arguments
    ///
    /// * `sequence_number` - Reference sequence number
    /// * `greater_or_equal` - `true` for records at or after it, `false` for at or before
    pub fn get_records_by_sequence(
        &mut self,
        sequence_number: u16,
        greater_or_equal: bool,
    ) -> Vec<SessionEvent> {
        self.retrieve(RacpCommand::report_by_sequence(
            sequence_number,
            greater_or_equal,
        ))
    }

    /// Request records whose sequence number lies in `min..=max`.
    pub fn get_records_in_range(&mut self, min: u16, max: u16) -> Result<Vec<SessionEvent>> {
        if !self.has_record_access() {
            debug!("No Record Access Control Point; range request ignored");
            return Ok(Vec::new());
        }
        let command = RacpCommand::report_in_range(min, max)?;
        Ok(self.retrieve(command))
    }

    /// Request records by user facing time.
    ///
    /// Fails only when the year of `time` cannot be encoded.
    pub fn get_specific_record(
        &mut self,
        time: &NaiveDateTime,
        greater_or_equal: bool,
    ) -> Result<Vec<SessionEvent>> {
        if !self.has_record_access() {
            debug!("No Record Access Control Point; time request ignored");
            return Ok(Vec::new());
        }
        let operand = UserFacingTime::from_datetime(time)?;
        Ok(self.retrieve(RacpCommand::report_by_time(operand, greater_or_equal)))
    }

    /// Ask the device how many records it holds. A non-zero answer is
    /// followed by a request for all of them.
    pub fn request_number_of_records(&mut self) -> Vec<SessionEvent> {
        self.retrieve(RacpCommand::report_number_of_records())
    }

    /// Delete every record on the device.
    pub fn delete_all_records(&mut self) -> Vec<SessionEvent> {
        self.retrieve(RacpCommand::delete_all())
    }

    /// Abort the running operation. The outcome is reported when the device
    /// answers.
    pub fn abort(&mut self) -> Vec<SessionEvent> {
        if !self.has_record_access() {
            debug!("No Record Access Control Point; abort ignored");
            return Vec::new();
        }
        self.apply(RacpInput::Abort)
    }

    /// Fetch all records if none are held yet.
    ///
    /// With records already present this does nothing; continuing from the
    /// last sequence number is not supported.
    pub fn refresh_records(&mut self) -> Vec<SessionEvent> {
        if self.store.is_empty() {
            self.get_all_records()
        } else {
            Vec::new()
        }
    }

    /// Empty the record store.
    pub fn clear(&mut self) -> Vec<SessionEvent> {
        self.store.clear();
        vec![SessionEvent::DatasetChanged]
    }

    fn retrieve(&mut self, command: RacpCommand) -> Vec<SessionEvent> {
        if !self.has_record_access() {
            debug!("No Record Access Control Point; {:?} ignored", command.op_code);
            return Vec::new();
        }
        let mut events = self.clear();
        events.extend(self.apply(RacpInput::Start(command)));
        events
    }

    fn apply(&mut self, input: RacpInput) -> Vec<SessionEvent> {
        let (machine, output) = self.machine.step(input);
        self.machine = machine;

        if let (Some(command), Some(uuid)) =
            (output.command, self.handles.record_access_control_point)
        {
            debug!("RACP request: {:?}", command);
            self.requests.push(GattCommand::Write {
                uuid,
                value: command.to_bytes(),
            });
        }

        output.events
    }

    // === Transport events ===

    fn on_services_discovered(&mut self, services: &ServiceSet) -> Vec<SessionEvent> {
        let find = |service: Uuid, characteristic: Uuid| {
            services
                .characteristic(&service, &characteristic)
                .map(|c| c.uuid)
        };

        let handles = Handles {
            measurement: find(BLOOD_PRESSURE_SERVICE_UUID, BLOOD_PRESSURE_MEASUREMENT_UUID),
            intermediate_cuff_pressure: find(
                BLOOD_PRESSURE_SERVICE_UUID,
                INTERMEDIATE_CUFF_PRESSURE_UUID,
            ),
            record_access_control_point: find(
                BLOOD_PRESSURE_SERVICE_UUID,
                RECORD_ACCESS_CONTROL_POINT_UUID,
            ),
            current_time: find(CURRENT_TIME_SERVICE_UUID, CURRENT_TIME_UUID),
        };

        self.requests.clear();
        self.machine = RacpMachine::new();

        let measurement = match handles.measurement {
            Some(uuid) => uuid,
            None => {
                warn!("Blood Pressure Measurement characteristic not found");
                self.handles = Handles::default();
                return vec![SessionEvent::ServiceUnavailable {
                    uuid: BLOOD_PRESSURE_MEASUREMENT_UUID,
                }];
            }
        };
        self.handles = handles;

        info!(
            "Blood pressure service found (ICP: {}, RACP: {}, Current Time: {})",
            handles.intermediate_cuff_pressure.is_some(),
            handles.record_access_control_point.is_some(),
            handles.current_time.is_some()
        );

        let mut events = vec![SessionEvent::ServicesDiscovered {
            optional_services_found: handles.intermediate_cuff_pressure.is_some(),
        }];

        self.requests.begin_initialization();
        if let Some(icp) = handles.intermediate_cuff_pressure {
            self.requests.push(GattCommand::EnableNotifications(icp));
        }
        self.requests.push(GattCommand::EnableIndications(measurement));
        if let Some(racp) = handles.record_access_control_point {
            self.requests.push(GattCommand::EnableIndications(racp));
        }
        if let Some(current_time) = handles.current_time {
            let now = (self.clock)();
            match CurrentTime::from_datetime(&now).and_then(|t| t.to_bytes()) {
                Ok(value) => self.requests.push(GattCommand::Write {
                    uuid: current_time,
                    value: value.to_vec(),
                }),
                Err(e) => {
                    warn!("Skipping Current Time write: {}", e);
                    events.push(SessionEvent::from_error(&e));
                }
            }
        }

        events
    }

    fn on_disconnected(&mut self) -> Vec<SessionEvent> {
        info!("Blood pressure monitor disconnected");

        self.handles = Handles::default();
        self.requests.clear();
        let (machine, _) = self.machine.step(RacpInput::Reset);
        self.machine = machine;

        let mut events = vec![SessionEvent::Disconnected];
        if !self.store.is_empty() {
            self.store.clear();
            events.push(SessionEvent::DatasetChanged);
        }
        events
    }

    fn on_characteristic_changed(&mut self, uuid: Uuid, value: &[u8]) -> Vec<SessionEvent> {
        let handles = self.handles;
        if Some(uuid) == handles.measurement {
            self.on_measurement(value)
        } else if Some(uuid) == handles.intermediate_cuff_pressure {
            on_intermediate_cuff_pressure(value)
        } else if Some(uuid) == handles.record_access_control_point {
            match RacpResponse::parse(value) {
                Ok(response) => {
                    debug!("RACP response: {:?}", response);
                    self.apply(RacpInput::Response(response))
                }
                Err(e) => {
                    warn!("Dropping RACP response: {}", e);
                    vec![SessionEvent::from_error(&e)]
                }
            }
        } else {
            trace!("Ignoring value from {}", uuid);
            Vec::new()
        }
    }

    fn on_measurement(&mut self, value: &[u8]) -> Vec<SessionEvent> {
        let measurement = match BloodPressureMeasurement::parse(value) {
            Ok(m) => m,
            Err(e) => {
                warn!("Dropping Blood Pressure Measurement: {}", e);
                return vec![SessionEvent::from_error(&e)];
            }
        };

        self.store.push(measurement.to_record());
        debug!("Stored record {}", self.store.len());

        vec![
            SessionEvent::BloodPressureMeasurement {
                systolic: measurement.systolic,
                diastolic: measurement.diastolic,
                mean_arterial_pressure: measurement.mean_arterial_pressure,
                unit: measurement.unit,
            },
            SessionEvent::Timestamp(measurement.timestamp),
            SessionEvent::PulseRate(measurement.pulse_rate),
            SessionEvent::DatasetChanged,
        ]
    }
}

fn on_intermediate_cuff_pressure(value: &[u8]) -> Vec<SessionEvent> {
    match IntermediateCuffPressure::parse(value) {
        Ok(icp) => vec![
            SessionEvent::IntermediateCuffPressure {
                cuff_pressure: icp.cuff_pressure,
                unit: icp.unit,
            },
            SessionEvent::Timestamp(icp.timestamp),
            SessionEvent::PulseRate(icp.pulse_rate),
        ],
        Err(e) => {
            warn!("Dropping Intermediate Cuff Pressure: {}", e);
            vec![SessionEvent::from_error(&e)]
        }
    }
}

impl Default for BloodPressureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BloodPressureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloodPressureSession")
            .field("handles", &self.handles)
            .field("machine", &self.machine)
            .field("records", &self.store.len())
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

impl GattProfile for BloodPressureSession {
    fn handle_event(&mut self, event: TransportEvent) -> Vec<SessionEvent> {
        if event.completes_request() {
            self.requests.complete();
        }

        let mut events = match event {
            TransportEvent::Connected => {
                info!("Blood pressure monitor connected");
                vec![SessionEvent::Connected]
            }
            TransportEvent::Disconnected => self.on_disconnected(),
            TransportEvent::ServicesDiscovered(services) => {
                self.on_services_discovered(&services)
            }
            TransportEvent::CharacteristicChanged { uuid, value } => {
                self.on_characteristic_changed(uuid, &value)
            }
            TransportEvent::CharacteristicRead { uuid, .. } => {
                trace!("Unexpected read result from {}", uuid);
                Vec::new()
            }
            TransportEvent::WriteComplete(uuid) => {
                debug!("Request on {} complete", uuid);
                Vec::new()
            }
            TransportEvent::Error { reason, code } => {
                warn!("GATT error: {} ({})", reason, code);
                vec![SessionEvent::Error { reason, code }]
            }
        };

        if self.requests.take_ready() {
            info!("Blood pressure monitor ready");
            events.push(SessionEvent::DeviceReady);
        }

        events
    }

    fn requests(&mut self) -> &mut RequestQueue {
        &mut self.requests
    }

    fn operation_pending(&self) -> bool {
        self.machine.is_busy()
    }

    fn on_watchdog_expired(&mut self) -> Vec<SessionEvent> {
        self.apply(RacpInput::WatchdogExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PressureUnit, Timestamp};
    use crate::protocol::racp::ResponseCode;
    use crate::session::events::MockSessionCallbacks;
    use btleplug::api::CharPropFlags;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    /// Flags 0x07, 120/80/93, 2024-03-15 10:30:00, pulse 72.
    const FULL_FRAME: [u8; 16] = [
        0x07, 0x78, 0x00, 0x50, 0x00, 0x5D, 0x00, 0xE8, 0x07, 0x03, 0x0F, 0x0A, 0x1E, 0x00, 0x48,
        0x00,
    ];

    fn fixed_clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 30, 45)
            .unwrap()
    }

    fn full_services() -> ServiceSet {
        ServiceSet::new()
            .with_characteristic(
                BLOOD_PRESSURE_SERVICE_UUID,
                BLOOD_PRESSURE_MEASUREMENT_UUID,
                CharPropFlags::INDICATE,
            )
            .with_characteristic(
                BLOOD_PRESSURE_SERVICE_UUID,
                INTERMEDIATE_CUFF_PRESSURE_UUID,
                CharPropFlags::NOTIFY,
            )
            .with_characteristic(
                BLOOD_PRESSURE_SERVICE_UUID,
                RECORD_ACCESS_CONTROL_POINT_UUID,
                CharPropFlags::WRITE | CharPropFlags::INDICATE,
            )
            .with_characteristic(
                CURRENT_TIME_SERVICE_UUID,
                CURRENT_TIME_UUID,
                CharPropFlags::READ | CharPropFlags::WRITE | CharPropFlags::NOTIFY,
            )
    }

    /// Execute every queued request, acknowledging each one.
    fn drain(session: &mut BloodPressureSession) -> (Vec<GattCommand>, Vec<SessionEvent>) {
        let mut commands = Vec::new();
        let mut events = Vec::new();
        while let Some(command) = session.requests().poll() {
            let uuid = command.uuid();
            commands.push(command);
            events.extend(session.handle_event(TransportEvent::WriteComplete(uuid)));
        }
        (commands, events)
    }

    fn ready_session() -> BloodPressureSession {
        let mut session = BloodPressureSession::with_clock(fixed_clock);
        session.handle_event(TransportEvent::Connected);
        session.handle_event(TransportEvent::ServicesDiscovered(full_services()));
        drain(&mut session);
        session
    }

    fn indicate(session: &mut BloodPressureSession, uuid: Uuid, value: &[u8]) -> Vec<SessionEvent> {
        session.handle_event(TransportEvent::CharacteristicChanged {
            uuid,
            value: value.to_vec(),
        })
    }

    fn racp_result(op_code: u8, code: ResponseCode) -> Vec<u8> {
        RacpResponse::OperationResult {
            requested_op_code: op_code,
            response_code: code,
        }
        .to_bytes()
    }

    #[test]
    fn test_initialization_order() {
        let mut session = BloodPressureSession::with_clock(fixed_clock);
        let events = session.handle_event(TransportEvent::ServicesDiscovered(full_services()));
        assert_eq!(
            events,
            vec![SessionEvent::ServicesDiscovered {
                optional_services_found: true
            }]
        );

        let (commands, events) = drain(&mut session);
        assert_eq!(
            commands,
            vec![
                GattCommand::EnableNotifications(INTERMEDIATE_CUFF_PRESSURE_UUID),
                GattCommand::EnableIndications(BLOOD_PRESSURE_MEASUREMENT_UUID),
                GattCommand::EnableIndications(RECORD_ACCESS_CONTROL_POINT_UUID),
                GattCommand::Write {
                    uuid: CURRENT_TIME_UUID,
                    value: vec![0xE8, 0x07, 0x03, 0x0F, 0x0A, 0x1E, 0x00, 0x00, 0x00, 0x00],
                },
            ]
        );
        assert_eq!(events, vec![SessionEvent::DeviceReady]);
    }

    #[test]
    fn test_missing_measurement_is_unsupported() {
        let services = ServiceSet::new().with_characteristic(
            BLOOD_PRESSURE_SERVICE_UUID,
            RECORD_ACCESS_CONTROL_POINT_UUID,
            CharPropFlags::INDICATE,
        );
        let mut session = BloodPressureSession::new();
        let events = session.handle_event(TransportEvent::ServicesDiscovered(services));

        assert_eq!(
            events,
            vec![SessionEvent::ServiceUnavailable {
                uuid: BLOOD_PRESSURE_MEASUREMENT_UUID
            }]
        );
        assert!(session.requests().is_idle());
        assert!(!session.is_supported());
        assert!(session.get_all_records().is_empty());
    }

    #[test]
    fn test_measurement_only_device() {
        let services = ServiceSet::new().with_characteristic(
            BLOOD_PRESSURE_SERVICE_UUID,
            BLOOD_PRESSURE_MEASUREMENT_UUID,
            CharPropFlags::INDICATE,
        );
        let mut session = BloodPressureSession::new();
        let events = session.handle_event(TransportEvent::ServicesDiscovered(services));
        assert_eq!(
            events,
            vec![SessionEvent::ServicesDiscovered {
                optional_services_found: false
            }]
        );

        let (commands, _) = drain(&mut session);
        assert_eq!(
            commands,
            vec![GattCommand::EnableIndications(
                BLOOD_PRESSURE_MEASUREMENT_UUID
            )]
        );

        // No control point: every RACP entry point is silent.
        assert!(session.get_all_records().is_empty());
        assert!(session.abort().is_empty());
        assert!(session.delete_all_records().is_empty());
        assert!(session
            .get_specific_record(&fixed_clock(), true)
            .unwrap()
            .is_empty());
        assert!(session.requests().is_idle());
    }

    #[test]
    fn test_full_measurement_is_decoded_and_stored() {
        let mut session = ready_session();
        let events = indicate(&mut session, BLOOD_PRESSURE_MEASUREMENT_UUID, &FULL_FRAME);

        assert_eq!(
            events,
            vec![
                SessionEvent::BloodPressureMeasurement {
                    systolic: 120.0,
                    diastolic: 80.0,
                    mean_arterial_pressure: 93.0,
                    unit: PressureUnit::KPa,
                },
                SessionEvent::Timestamp(Some(Timestamp::new(2024, 3, 15, 10, 30, 0))),
                SessionEvent::PulseRate(Some(72.0)),
                SessionEvent::DatasetChanged,
            ]
        );

        assert_eq!(session.records().len(), 1);
        let record = session.records().get(0).unwrap();
        assert_eq!(record.systolic, 120.0);
        assert_eq!(record.diastolic, 80.0);
        assert_eq!(record.mean_arterial_pressure, 93.0);
        assert_eq!(record.pulse_rate, Some(72.0));
        assert_eq!(record.unit, PressureUnit::KPa);
        assert_eq!(
            record.timestamp.and_then(|t| t.to_naive()),
            NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
        );
    }

    #[test]
    fn test_intermediate_cuff_pressure_is_not_stored() {
        let mut session = ready_session();
        let events = indicate(
            &mut session,
            INTERMEDIATE_CUFF_PRESSURE_UUID,
            &[0x00, 0x8C, 0x00, 0xFF, 0x07, 0xFF, 0x07],
        );

        assert_eq!(
            events,
            vec![
                SessionEvent::IntermediateCuffPressure {
                    cuff_pressure: 140.0,
                    unit: PressureUnit::MmHg,
                },
                SessionEvent::Timestamp(None),
                SessionEvent::PulseRate(None),
            ]
        );
        assert!(session.records().is_empty());
    }

    #[test]
    fn test_malformed_frame_does_not_end_session() {
        let mut session = ready_session();
        let events = indicate(
            &mut session,
            BLOOD_PRESSURE_MEASUREMENT_UUID,
            &FULL_FRAME[..10],
        );

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SessionEvent::Error { code: 0, .. }));
        assert!(session.records().is_empty());

        indicate(&mut session, BLOOD_PRESSURE_MEASUREMENT_UUID, &FULL_FRAME);
        assert_eq!(session.records().len(), 1);
    }

    #[test]
    fn test_get_all_records_writes_request_and_clears_store() {
        let mut session = ready_session();
        indicate(&mut session, BLOOD_PRESSURE_MEASUREMENT_UUID, &FULL_FRAME);

        let events = session.get_all_records();
        assert_eq!(
            events,
            vec![SessionEvent::DatasetChanged, SessionEvent::OperationStarted]
        );
        assert!(session.records().is_empty());
        assert_eq!(session.racp_phase(), RacpPhase::AwaitingRecords);
        assert!(session.operation_pending());

        assert_eq!(
            session.requests().poll(),
            Some(GattCommand::Write {
                uuid: RECORD_ACCESS_CONTROL_POINT_UUID,
                value: vec![0x01, 0x01],
            })
        );
    }

    #[test]
    fn test_records_then_success() {
        let mut session = ready_session();
        session.get_all_records();
        drain(&mut session);

        indicate(&mut session, BLOOD_PRESSURE_MEASUREMENT_UUID, &FULL_FRAME);
        indicate(&mut session, BLOOD_PRESSURE_MEASUREMENT_UUID, &FULL_FRAME);
        let events = indicate(
            &mut session,
            RECORD_ACCESS_CONTROL_POINT_UUID,
            &racp_result(0x01, ResponseCode::Success),
        );

        assert_eq!(events, vec![SessionEvent::OperationCompleted]);
        assert_eq!(session.records().len(), 2);
        assert!(!session.operation_pending());
    }

    #[test]
    fn test_zero_records_reported() {
        let mut session = ready_session();
        session.get_all_records();
        drain(&mut session);

        let events = indicate(
            &mut session,
            RECORD_ACCESS_CONTROL_POINT_UUID,
            &RacpResponse::NumberOfRecords(0).to_bytes(),
        );

        assert_eq!(
            events,
            vec![
                SessionEvent::NumberOfRecordsRequested(0),
                SessionEvent::OperationCompleted
            ]
        );
        assert!(session.records().is_empty());
        assert!(session.requests().is_idle());
    }

    #[test]
    fn test_record_count_then_report_all() {
        let mut session = ready_session();
        session.request_number_of_records();
        let (commands, _) = drain(&mut session);
        assert_eq!(
            commands,
            vec![GattCommand::Write {
                uuid: RECORD_ACCESS_CONTROL_POINT_UUID,
                value: vec![0x04, 0x01],
            }]
        );
        assert_eq!(session.racp_phase(), RacpPhase::AwaitingCount);

        indicate(
            &mut session,
            RECORD_ACCESS_CONTROL_POINT_UUID,
            &RacpResponse::NumberOfRecords(3).to_bytes(),
        );
        assert_eq!(
            session.requests().poll(),
            Some(GattCommand::Write {
                uuid: RECORD_ACCESS_CONTROL_POINT_UUID,
                value: vec![0x01, 0x01],
            })
        );
        assert_eq!(session.racp_phase(), RacpPhase::AwaitingRecords);
    }

    #[test]
    fn test_abort_reports_aborted_not_completed() {
        let mut session = ready_session();
        let mut callbacks = MockSessionCallbacks::new();
        callbacks.expect_on_dataset_changed().return_const(());
        callbacks
            .expect_on_operation_started()
            .times(1)
            .return_const(());
        callbacks
            .expect_on_operation_aborted()
            .times(1)
            .return_const(());
        callbacks.expect_on_operation_completed().times(0);

        let mut events = session.get_all_records();
        events.extend(session.abort());
        let (commands, _) = drain(&mut session);
        assert_eq!(
            commands[1],
            GattCommand::Write {
                uuid: RECORD_ACCESS_CONTROL_POINT_UUID,
                value: vec![0x03, 0x00],
            }
        );

        events.extend(indicate(
            &mut session,
            RECORD_ACCESS_CONTROL_POINT_UUID,
            &racp_result(0x03, ResponseCode::Success),
        ));
        for event in &events {
            event.dispatch(&callbacks);
        }
        assert!(!session.racp_machine().abort_requested());
    }

    #[test]
    fn test_success_without_abort_reports_completed() {
        let mut session = ready_session();
        let mut callbacks = MockSessionCallbacks::new();
        callbacks.expect_on_dataset_changed().return_const(());
        callbacks.expect_on_operation_started().return_const(());
        callbacks
            .expect_on_operation_completed()
            .times(1)
            .return_const(());
        callbacks.expect_on_operation_aborted().times(0);

        let mut events = session.get_last_record();
        drain(&mut session);
        events.extend(indicate(
            &mut session,
            RECORD_ACCESS_CONTROL_POINT_UUID,
            &racp_result(0x01, ResponseCode::Success),
        ));
        for event in &events {
            event.dispatch(&callbacks);
        }
    }

    #[test]
    fn test_not_supported_and_failed() {
        let mut session = ready_session();
        session.delete_all_records();
        let events = indicate(
            &mut session,
            RECORD_ACCESS_CONTROL_POINT_UUID,
            &racp_result(0x02, ResponseCode::OpCodeNotSupported),
        );
        assert_eq!(events, vec![SessionEvent::OperationNotSupported]);

        session.get_first_record();
        let events = indicate(
            &mut session,
            RECORD_ACCESS_CONTROL_POINT_UUID,
            &racp_result(0x01, ResponseCode::Reserved(0x20)),
        );
        assert_eq!(events, vec![SessionEvent::OperationFailed]);
    }

    #[test]
    fn test_sequence_and_time_filters() {
        let mut session = ready_session();
        session.get_records_by_sequence(10, true);
        session.get_records_in_range(10, 20).unwrap();
        session.get_specific_record(&fixed_clock(), false).unwrap();

        let (commands, _) = drain(&mut session);
        let values: Vec<Vec<u8>> = commands
            .into_iter()
            .map(|c| match c {
                GattCommand::Write { value, .. } => value,
                other => panic!("unexpected command: {:?}", other),
            })
            .collect();

        assert_eq!(
            values,
            vec![
                vec![0x01, 0x03, 0x01, 0x0A, 0x00],
                vec![0x01, 0x04, 0x01, 0x0A, 0x00, 0x14, 0x00],
                vec![0x01, 0x02, 0x02, 0xE8, 0x07, 0x03, 0x0F, 0x0A, 0x1E, 0x00],
            ]
        );
    }

    #[test]
    fn test_refresh_records() {
        let mut session = ready_session();
        assert_eq!(
            session.refresh_records(),
            vec![SessionEvent::DatasetChanged, SessionEvent::OperationStarted]
        );
        drain(&mut session);

        indicate(&mut session, BLOOD_PRESSURE_MEASUREMENT_UUID, &FULL_FRAME);
        assert!(session.refresh_records().is_empty());
        assert!(session.requests().is_idle());
    }

    #[test]
    fn test_watchdog_fails_stalled_operation() {
        let mut session = ready_session();
        session.get_all_records();
        drain(&mut session);

        let events = session.on_watchdog_expired();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SessionEvent::Error { .. }));
        assert_eq!(events[1], SessionEvent::OperationFailed);
        assert!(!session.operation_pending());
        assert!(session.on_watchdog_expired().is_empty());
    }

    #[test]
    fn test_disconnect_resets_session() {
        let mut session = ready_session();
        session.get_records_by_sequence(1, true);
        indicate(&mut session, BLOOD_PRESSURE_MEASUREMENT_UUID, &FULL_FRAME);
        session.abort();

        let events = session.handle_event(TransportEvent::Disconnected);
        assert_eq!(
            events,
            vec![SessionEvent::Disconnected, SessionEvent::DatasetChanged]
        );
        assert!(!session.is_supported());
        assert!(!session.operation_pending());
        assert!(session.requests().is_idle());

        // Late values from the old link are ignored.
        assert!(indicate(&mut session, BLOOD_PRESSURE_MEASUREMENT_UUID, &FULL_FRAME).is_empty());
    }

    #[test]
    fn test_transport_error_completes_request() {
        let mut session = BloodPressureSession::with_clock(fixed_clock);
        session.handle_event(TransportEvent::ServicesDiscovered(full_services()));
        session.requests().poll();

        let events = session.handle_event(TransportEvent::Error {
            reason: "descriptor write failed".to_string(),
            code: 133,
        });
        assert_eq!(
            events,
            vec![SessionEvent::Error {
                reason: "descriptor write failed".to_string(),
                code: 133,
            }]
        );
        assert_eq!(
            session.requests().poll(),
            Some(GattCommand::EnableIndications(
                BLOOD_PRESSURE_MEASUREMENT_UUID
            ))
        );
    }
}
