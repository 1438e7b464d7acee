use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;

/// Requested HVAC behavior as the thermostat encodes it (`Operation_Mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OperationMode {
    #[default]
    Off,
    Heat,
    Cool,
    Auto,
}

impl OperationMode {
    pub fn code(&self) -> u8 {
        match self {
            OperationMode::Off => 0,
            OperationMode::Heat => 1,
            OperationMode::Cool => 2,
            OperationMode::Auto => 3,
        }
    }
}

impl TryFrom<u8> for OperationMode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(OperationMode::Off),
            1 => Ok(OperationMode::Heat),
            2 => Ok(OperationMode::Cool),
            3 => Ok(OperationMode::Auto),
            other => Err(Error::InvalidMode(other.into())),
        }
    }
}

impl From<OperationMode> for u8 {
    fn from(mode: OperationMode) -> Self {
        mode.code()
    }
}

/// What the equipment is doing right now (`System_Status`). Read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SystemStatus {
    #[default]
    Idle,
    Heating,
    Cooling,
}

impl SystemStatus {
    pub fn code(&self) -> u8 {
        match self {
            SystemStatus::Idle => 0,
            SystemStatus::Heating => 1,
            SystemStatus::Cooling => 2,
        }
    }
}

impl TryFrom<u8> for SystemStatus {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(SystemStatus::Idle),
            1 => Ok(SystemStatus::Heating),
            2 => Ok(SystemStatus::Cooling),
            other => Err(Error::InvalidStatus(other.into())),
        }
    }
}

impl From<SystemStatus> for u8 {
    fn from(status: SystemStatus) -> Self {
        status.code()
    }
}

/// The full thermostat record (`ThermostatInfo`) as read from and written back
/// to the cloud service. Temperatures are whole degrees Fahrenheit.
///
/// Fields the bridge does not interpret (fan mode, away state, schedule, zone
/// bookkeeping) are kept in `extra` so a write sends back everything that was read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceSettings {
    #[serde(rename = "GatewaySN")]
    pub gateway_sn: String,
    #[serde(rename = "Operation_Mode")]
    pub operation_mode: OperationMode,
    #[serde(rename = "System_Status")]
    pub system_status: SystemStatus,
    #[serde(rename = "Heat_Set_Point")]
    pub heat_set_point: i32,
    #[serde(rename = "Cool_Set_Point")]
    pub cool_set_point: i32,
    #[serde(rename = "Indoor_Temp")]
    pub indoor_temp: i32,
    #[serde(rename = "Indoor_Humidity")]
    pub indoor_humidity: i32,
    #[serde(rename = "Pref_Temp_Units", default, skip_serializing_if = "Option::is_none")]
    pub pref_temp_units: Option<String>,
    #[serde(rename = "System_Name", default, skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceSettings {
    pub fn device_id(&self) -> &str {
        &self.gateway_sn
    }
}

/// One entry of the account's systems list (`GetSystemsInfo`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(rename = "Gateway_SN")]
    pub gateway_sn: String,
    #[serde(rename = "System_Name", default)]
    pub system_name: String,
    #[serde(rename = "Firmware_Ver", default)]
    pub firmware_version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentHeatingCoolingState {
    Off,
    Heat,
    Cool,
}

impl CurrentHeatingCoolingState {
    pub fn code(&self) -> u8 {
        match self {
            CurrentHeatingCoolingState::Off => 0,
            CurrentHeatingCoolingState::Heat => 1,
            CurrentHeatingCoolingState::Cool => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetHeatingCoolingState {
    Off,
    Heat,
    Cool,
    Auto,
}

impl TargetHeatingCoolingState {
    pub fn code(&self) -> u8 {
        match self {
            TargetHeatingCoolingState::Off => 0,
            TargetHeatingCoolingState::Heat => 1,
            TargetHeatingCoolingState::Cool => 2,
            TargetHeatingCoolingState::Auto => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TargetHeatingCoolingState::Off),
            1 => Some(TargetHeatingCoolingState::Heat),
            2 => Some(TargetHeatingCoolingState::Cool),
            3 => Some(TargetHeatingCoolingState::Auto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureDisplayUnits {
    Celsius,
    #[default]
    Fahrenheit,
}

impl TemperatureDisplayUnits {
    pub fn code(&self) -> u8 {
        match self {
            TemperatureDisplayUnits::Celsius => 0,
            TemperatureDisplayUnits::Fahrenheit => 1,
        }
    }

    /// Account preference as reported in `Pref_Temp_Units`: "1" is Celsius,
    /// anything else Fahrenheit.
    pub fn from_preference(pref: &str) -> Self {
        match pref.trim() {
            "1" => TemperatureDisplayUnits::Celsius,
            _ => TemperatureDisplayUnits::Fahrenheit,
        }
    }
}

/// Host-facing projection of one settings snapshot. Temperatures in Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostTargetState {
    pub current_state: CurrentHeatingCoolingState,
    pub target_state: TargetHeatingCoolingState,
    pub current_temperature: f64,
    pub target_temperature: f64,
    pub heating_threshold: f64,
    pub cooling_threshold: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    CurrentHeatingCoolingState,
    TargetHeatingCoolingState,
    CurrentTemperature,
    TargetTemperature,
    TemperatureDisplayUnits,
    HeatingThresholdTemperature,
    CoolingThresholdTemperature,
    CurrentRelativeHumidity,
}

impl Characteristic {
    pub const ALL: [Characteristic; 8] = [
        Characteristic::CurrentHeatingCoolingState,
        Characteristic::TargetHeatingCoolingState,
        Characteristic::CurrentTemperature,
        Characteristic::TargetTemperature,
        Characteristic::TemperatureDisplayUnits,
        Characteristic::HeatingThresholdTemperature,
        Characteristic::CoolingThresholdTemperature,
        Characteristic::CurrentRelativeHumidity,
    ];

    pub fn is_writable(&self) -> bool {
        matches!(
            self,
            Characteristic::TargetHeatingCoolingState
                | Characteristic::TargetTemperature
                | Characteristic::HeatingThresholdTemperature
                | Characteristic::CoolingThresholdTemperature
        )
    }

    pub fn hap_name(&self) -> &'static str {
        match self {
            Characteristic::CurrentHeatingCoolingState => "CurrentHeatingCoolingState",
            Characteristic::TargetHeatingCoolingState => "TargetHeatingCoolingState",
            Characteristic::CurrentTemperature => "CurrentTemperature",
            Characteristic::TargetTemperature => "TargetTemperature",
            Characteristic::TemperatureDisplayUnits => "TemperatureDisplayUnits",
            Characteristic::HeatingThresholdTemperature => "HeatingThresholdTemperature",
            Characteristic::CoolingThresholdTemperature => "CoolingThresholdTemperature",
            Characteristic::CurrentRelativeHumidity => "CurrentRelativeHumidity",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hap_name())
    }
}

/// Value carried by a characteristic read, write or push. Modes and units are
/// `Uint8` codes, temperatures and humidity are `Float`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    Uint8(u8),
    Float(f64),
}

impl CharacteristicValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            CharacteristicValue::Uint8(v) => f64::from(*v),
            CharacteristicValue::Float(v) => *v,
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            CharacteristicValue::Uint8(v) => Some(*v),
            CharacteristicValue::Float(v) if v.fract() == 0.0 && (0.0..=255.0).contains(v) => {
                Some(*v as u8)
            }
            CharacteristicValue::Float(_) => None,
        }
    }
}

/// Out-of-band value change pushed to the host after a write moved a field
/// the host did not ask to change.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacteristicUpdate {
    pub device_id: String,
    pub characteristic: Characteristic,
    pub value: CharacteristicValue,
}

/// Accessory information record presented to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryInfo {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware_revision: Option<String>,
}

impl AccessoryInfo {
    pub fn from_settings(settings: &DeviceSettings, system: Option<&SystemInfo>) -> Self {
        let name = system
            .map(|s| s.system_name.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| settings.system_name.clone())
            .unwrap_or_else(|| settings.gateway_sn.clone());
        Self {
            name,
            manufacturer: "Lennox".to_string(),
            model: "iComfort Thermostat".to_string(),
            serial_number: settings.gateway_sn.clone(),
            firmware_revision: system.and_then(|s| s.firmware_version.clone()),
        }
    }
}
