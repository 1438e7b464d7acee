use crate::types::*;

/// Host Celsius to device Fahrenheit, rounded to whole degrees.
pub fn celsius_to_fahrenheit(celsius: f64) -> i32 {
    (celsius * 9.0 / 5.0 + 32.0).round() as i32
}

/// Device Fahrenheit to host Celsius, rounded to two decimals.
pub fn fahrenheit_to_celsius(fahrenheit: i32) -> f64 {
    let celsius = (f64::from(fahrenheit) - 32.0) * 5.0 / 9.0;
    (celsius * 100.0).round() / 100.0
}

pub fn operation_mode_to_host_target(mode: OperationMode) -> TargetHeatingCoolingState {
    match mode {
        OperationMode::Off => TargetHeatingCoolingState::Off,
        OperationMode::Heat => TargetHeatingCoolingState::Heat,
        OperationMode::Cool => TargetHeatingCoolingState::Cool,
        OperationMode::Auto => TargetHeatingCoolingState::Auto,
    }
}

pub fn host_target_to_operation_mode(target: TargetHeatingCoolingState) -> OperationMode {
    match target {
        TargetHeatingCoolingState::Off => OperationMode::Off,
        TargetHeatingCoolingState::Heat => OperationMode::Heat,
        TargetHeatingCoolingState::Cool => OperationMode::Cool,
        TargetHeatingCoolingState::Auto => OperationMode::Auto,
    }
}

pub fn system_status_to_host_current(status: SystemStatus) -> CurrentHeatingCoolingState {
    match status {
        SystemStatus::Idle => CurrentHeatingCoolingState::Off,
        SystemStatus::Heating => CurrentHeatingCoolingState::Heat,
        SystemStatus::Cooling => CurrentHeatingCoolingState::Cool,
    }
}

/// Setpoint the host should show as its single target temperature, in Fahrenheit.
///
/// In AUTO the indoor temperature is shown while it sits between the two
/// setpoints and is clamped to the nearer setpoint otherwise. OFF reports the
/// cool setpoint.
pub fn target_temperature_f(settings: &DeviceSettings) -> i32 {
    match settings.operation_mode {
        OperationMode::Heat => settings.heat_set_point,
        OperationMode::Off | OperationMode::Cool => settings.cool_set_point,
        OperationMode::Auto => {
            if settings.indoor_temp > settings.cool_set_point {
                settings.cool_set_point
            } else if settings.indoor_temp < settings.heat_set_point {
                settings.heat_set_point
            } else {
                settings.indoor_temp
            }
        }
    }
}

impl HostTargetState {
    pub fn from_settings(settings: &DeviceSettings) -> Self {
        Self {
            current_state: system_status_to_host_current(settings.system_status),
            target_state: operation_mode_to_host_target(settings.operation_mode),
            current_temperature: fahrenheit_to_celsius(settings.indoor_temp),
            target_temperature: fahrenheit_to_celsius(target_temperature_f(settings)),
            heating_threshold: fahrenheit_to_celsius(settings.heat_set_point),
            cooling_threshold: fahrenheit_to_celsius(settings.cool_set_point),
            humidity: f64::from(settings.indoor_humidity),
        }
    }
}
