use std::sync::{Arc, Mutex};

use icomfort_bridge::{
    Characteristic, CharacteristicUpdate, CharacteristicValue, CurrentHeatingCoolingState,
    DeviceSettings, Error, IComfortClient, OperationMode, RequestedChange, Result, SystemStatus,
    TargetHeatingCoolingState, TemperatureDisplayUnits, ThermostatSession, Transport,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory device: fetches return the stored record, writes replace it.
#[derive(Default)]
struct FakeTransport {
    device: Mutex<Option<DeviceSettings>>,
    writes: Mutex<Vec<DeviceSettings>>,
    reject_writes: bool,
    offline: bool,
}

impl FakeTransport {
    fn with(settings: DeviceSettings) -> Arc<Self> {
        Arc::new(Self {
            device: Mutex::new(Some(settings)),
            ..Default::default()
        })
    }

    fn rejecting(settings: DeviceSettings) -> Arc<Self> {
        Arc::new(Self {
            device: Mutex::new(Some(settings)),
            reject_writes: true,
            ..Default::default()
        })
    }

    fn offline(settings: DeviceSettings) -> Arc<Self> {
        Arc::new(Self {
            device: Mutex::new(Some(settings)),
            offline: true,
            ..Default::default()
        })
    }

    fn writes(&self) -> Vec<DeviceSettings> {
        self.writes.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    async fn fetch_settings(&self, device_id: &str) -> Result<DeviceSettings> {
        if self.offline {
            return Err(Error::unreachable("gateway offline"));
        }
        self.device
            .lock()
            .unwrap()
            .clone()
            .filter(|s| s.gateway_sn == device_id)
            .ok_or_else(|| Error::DeviceNotFound(device_id.to_string()))
    }

    async fn write_settings(&self, settings: &DeviceSettings) -> Result<()> {
        if self.reject_writes {
            return Err(Error::WriteRejected("FAILURE".to_string()));
        }
        self.writes.lock().unwrap().push(settings.clone());
        *self.device.lock().unwrap() = Some(settings.clone());
        Ok(())
    }
}

fn device(mode: OperationMode, heat: i32, cool: i32) -> DeviceSettings {
    DeviceSettings {
        gateway_sn: "WS1".to_string(),
        operation_mode: mode,
        system_status: SystemStatus::Idle,
        heat_set_point: heat,
        cool_set_point: cool,
        indoor_temp: 72,
        indoor_humidity: 44,
        ..Default::default()
    }
}

type Updates = Arc<Mutex<Vec<CharacteristicUpdate>>>;

fn session(transport: Arc<FakeTransport>) -> (ThermostatSession<Arc<FakeTransport>>, Updates) {
    let updates: Updates = Arc::new(Mutex::new(vec![]));
    let updates_clone = updates.clone();
    let session = ThermostatSession::builder("WS1", transport)
        .on_update(move |u| updates_clone.lock().unwrap().push(u.clone()))
        .build();
    (session, updates)
}

#[tokio::test]
async fn cooling_threshold_pushes_heat_down_and_notifies() {
    let transport = FakeTransport::with(device(OperationMode::Cool, 68, 72));
    let (session, updates) = session(transport.clone());

    session.set_cooling_threshold_temperature(18.89).await.unwrap();

    let writes = transport.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].cool_set_point, 66);
    assert_eq!(writes[0].heat_set_point, 63);

    let updates = updates.lock().unwrap();
    assert_eq!(
        *updates,
        vec![CharacteristicUpdate {
            device_id: "WS1".to_string(),
            characteristic: Characteristic::HeatingThresholdTemperature,
            value: CharacteristicValue::Float(17.22),
        }]
    );
}

#[tokio::test]
async fn adjusting_active_setpoint_also_updates_target() {
    let transport = FakeTransport::with(device(OperationMode::Heat, 68, 72));
    let (session, updates) = session(transport.clone());

    session.set_cooling_threshold_temperature(20.0).await.unwrap();

    let written = &transport.writes()[0];
    assert_eq!(written.cool_set_point, 68);
    assert_eq!(written.heat_set_point, 65);

    let characteristics: Vec<_> = updates.lock().unwrap().iter().map(|u| u.characteristic).collect();
    assert_eq!(
        characteristics,
        vec![
            Characteristic::HeatingThresholdTemperature,
            Characteristic::TargetTemperature
        ]
    );
}

#[tokio::test]
async fn repeated_change_writes_once() {
    let transport = FakeTransport::with(device(OperationMode::Heat, 68, 75));
    let (session, _) = session(transport.clone());

    let first = session.apply_change(RequestedChange::SetHeatThreshold(70)).await.unwrap();
    let second = session.apply_change(RequestedChange::SetHeatThreshold(70)).await.unwrap();

    assert!(first.changed);
    assert!(!second.changed);
    assert_eq!(transport.writes().len(), 1);
}

#[tokio::test]
async fn target_temperature_in_auto_or_off_does_not_write() {
    for mode in [OperationMode::Auto, OperationMode::Off] {
        let transport = FakeTransport::with(device(mode, 68, 75));
        let (session, updates) = session(transport.clone());

        session.set_target_temperature(22.0).await.unwrap();

        assert!(transport.writes().is_empty());
        assert!(updates.lock().unwrap().is_empty());
    }
}

#[tokio::test]
async fn target_temperature_in_heat_is_reconciled() {
    let transport = FakeTransport::with(device(OperationMode::Heat, 68, 72));
    let (session, updates) = session(transport.clone());

    session.set_target_temperature(22.0).await.unwrap();

    let written = &transport.writes()[0];
    assert_eq!(written.heat_set_point, 72);
    assert_eq!(written.cool_set_point, 75);
    assert_eq!(updates.lock().unwrap()[0].characteristic, Characteristic::CoolingThresholdTemperature);
}

#[tokio::test]
async fn mode_change_leaves_setpoints() {
    let transport = FakeTransport::with(device(OperationMode::Heat, 70, 71));
    let (session, updates) = session(transport.clone());

    session
        .set_target_heating_cooling_state(TargetHeatingCoolingState::Auto)
        .await
        .unwrap();

    let written = &transport.writes()[0];
    assert_eq!(written.operation_mode, OperationMode::Auto);
    assert_eq!(written.heat_set_point, 70);
    assert_eq!(written.cool_set_point, 71);
    assert!(updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rejected_write_pushes_nothing() {
    let transport = FakeTransport::rejecting(device(OperationMode::Cool, 68, 72));
    let (session, updates) = session(transport.clone());

    let err = session.set_cooling_threshold_temperature(18.89).await.unwrap_err();
    assert!(matches!(err, Error::WriteRejected(_)), "got {err:?}");
    assert!(updates.lock().unwrap().is_empty());
    assert_eq!(session.cooling_threshold_temperature().await.unwrap(), 22.22);
}

#[tokio::test]
async fn failed_fetch_writes_and_pushes_nothing() {
    let transport = FakeTransport::offline(device(OperationMode::Cool, 68, 72));
    let (session, updates) = session(transport.clone());

    let err = session.set_cooling_threshold_temperature(18.89).await.unwrap_err();
    assert!(matches!(err, Error::DeviceUnreachable(_)), "got {err:?}");
    assert!(transport.writes().is_empty());
    assert!(updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn thresholds_in_auto_or_off_move_only_the_requested_field() {
    for mode in [OperationMode::Auto, OperationMode::Off] {
        let transport = FakeTransport::with(device(mode, 68, 70));
        let (session, updates) = session(transport.clone());

        let r = session.apply_change(RequestedChange::SetHeatThreshold(69)).await.unwrap();
        assert!(r.adjusted.is_empty());
        let r = session.apply_change(RequestedChange::SetCoolThreshold(71)).await.unwrap();
        assert!(r.adjusted.is_empty());

        let writes = transport.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].heat_set_point, 69);
        assert_eq!(writes[1].cool_set_point, 71);
        assert!(updates.lock().unwrap().is_empty());
    }
}

#[tokio::test]
async fn out_of_range_setpoint_never_reaches_transport() {
    let transport = FakeTransport::with(device(OperationMode::Heat, 68, 72));
    let (session, _) = session(transport.clone());

    let err = session.set_heating_threshold_temperature(60.0).await.unwrap_err();
    assert!(matches!(err, Error::InvalidSetpoint { requested_f: 140, .. }), "got {err:?}");
    assert!(transport.writes().is_empty());
}

#[tokio::test]
async fn unknown_device_fails_reads() {
    let transport = FakeTransport::with(device(OperationMode::Heat, 68, 72));
    let session = ThermostatSession::builder("WS9", transport).build();

    let err = session.current_temperature().await.unwrap_err();
    assert!(matches!(err, Error::DeviceNotFound(ref id) if id == "WS9"), "got {err:?}");
}

#[tokio::test]
async fn characteristic_reads() {
    let mut settings = device(OperationMode::Auto, 68, 75);
    settings.indoor_temp = 78;
    settings.system_status = SystemStatus::Cooling;
    let transport = FakeTransport::with(settings);
    let session = ThermostatSession::builder("WS1", transport)
        .display_units(TemperatureDisplayUnits::Celsius)
        .build();

    assert_eq!(
        session.get(Characteristic::CurrentHeatingCoolingState).await.unwrap(),
        CharacteristicValue::Uint8(CurrentHeatingCoolingState::Cool.code())
    );
    assert_eq!(
        session.get(Characteristic::TargetHeatingCoolingState).await.unwrap(),
        CharacteristicValue::Uint8(3)
    );
    assert_eq!(
        session.get(Characteristic::CurrentTemperature).await.unwrap(),
        CharacteristicValue::Float(25.56)
    );
    assert_eq!(
        session.get(Characteristic::TargetTemperature).await.unwrap(),
        CharacteristicValue::Float(23.89)
    );
    assert_eq!(
        session.get(Characteristic::HeatingThresholdTemperature).await.unwrap(),
        CharacteristicValue::Float(20.0)
    );
    assert_eq!(
        session.get(Characteristic::CoolingThresholdTemperature).await.unwrap(),
        CharacteristicValue::Float(23.89)
    );
    assert_eq!(
        session.get(Characteristic::CurrentRelativeHumidity).await.unwrap(),
        CharacteristicValue::Float(44.0)
    );
    assert_eq!(
        session.get(Characteristic::TemperatureDisplayUnits).await.unwrap(),
        CharacteristicValue::Uint8(0)
    );
}

#[tokio::test]
async fn characteristic_writes_are_validated() {
    let transport = FakeTransport::with(device(OperationMode::Heat, 68, 72));
    let (session, _) = session(transport.clone());

    let err = session
        .set(Characteristic::CurrentTemperature, CharacteristicValue::Float(20.0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }), "got {err:?}");

    let err = session
        .set(Characteristic::TargetHeatingCoolingState, CharacteristicValue::Uint8(9))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidMode(9)), "got {err:?}");

    session
        .set(Characteristic::TargetHeatingCoolingState, CharacteristicValue::Uint8(2))
        .await
        .unwrap();
    assert_eq!(transport.writes()[0].operation_mode, OperationMode::Cool);
    assert_eq!(transport.writes().len(), 1);
    for c in Characteristic::ALL {
        if c.is_writable() {
            continue;
        }
        assert!(session.set(c, CharacteristicValue::Uint8(0)).await.is_err());
    }
}

#[tokio::test]
async fn concurrent_writes_both_land() {
    let transport = FakeTransport::with(device(OperationMode::Heat, 60, 80));
    let (session, _) = session(transport.clone());

    let (a, b) = tokio::join!(
        session.apply_change(RequestedChange::SetHeatThreshold(65)),
        session.apply_change(RequestedChange::SetCoolThreshold(75)),
    );
    a.unwrap();
    b.unwrap();

    // No per-device lock: each change was computed from its own snapshot.
    assert_eq!(transport.writes().len(), 2);
}

#[tokio::test]
async fn end_to_end_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/GetTStatInfoList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ReturnStatus": "SUCCESS",
            "tStatInfo": [{
                "GatewaySN": "WS1",
                "Operation_Mode": 2,
                "System_Status": 2,
                "Heat_Set_Point": 68,
                "Cool_Set_Point": 72,
                "Indoor_Temp": 74,
                "Indoor_Humidity": 50,
                "Pref_Temp_Units": "0",
                "Fan_Mode": 1,
                "Zone_Number": 0
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/SetTStatInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ReturnStatus": "SUCCESS"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = IComfortClient::builder("u", "p").base_url(server.uri()).build().unwrap();
    let updates: Updates = Arc::new(Mutex::new(vec![]));
    let updates_clone = updates.clone();
    let session = ThermostatSession::builder("WS1", Arc::new(client))
        .on_update(move |u| updates_clone.lock().unwrap().push(u.clone()))
        .build();

    session
        .set(Characteristic::CoolingThresholdTemperature, CharacteristicValue::Float(18.89))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let put = requests.iter().find(|r| r.method.as_str() == "PUT").unwrap();
    let body: Value = put.body_json().unwrap();
    assert_eq!(body["Cool_Set_Point"], 66);
    assert_eq!(body["Heat_Set_Point"], 63);
    assert_eq!(body["Fan_Mode"], 1);

    let updates = updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].characteristic, Characteristic::HeatingThresholdTemperature);
    assert_eq!(updates[0].value, CharacteristicValue::Float(17.22));
}
