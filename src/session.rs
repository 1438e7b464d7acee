use tracing::{debug, info};

use crate::convert::{
    celsius_to_fahrenheit, fahrenheit_to_celsius, host_target_to_operation_mode,
    target_temperature_f,
};
use crate::diff::settings_changes;
use crate::reconcile::{reconcile, Reconciliation, RequestedChange, SetpointField, SetpointLimits};
use crate::transport::Transport;
use crate::types::*;
use crate::{Error, Result};

type UpdateCallback = Box<dyn Fn(&CharacteristicUpdate) + Send + Sync>;

pub struct ThermostatSessionBuilder<T> {
    device_id: String,
    transport: T,
    limits: SetpointLimits,
    display_units: TemperatureDisplayUnits,
    update_callbacks: Vec<UpdateCallback>,
}

impl<T: Transport> ThermostatSessionBuilder<T> {
    pub fn new(device_id: impl Into<String>, transport: T) -> Self {
        Self {
            device_id: device_id.into(),
            transport,
            limits: SetpointLimits::default(),
            display_units: TemperatureDisplayUnits::default(),
            update_callbacks: Vec::new(),
        }
    }

    pub fn setpoint_limits(mut self, limits: SetpointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Account-wide display preference; not read from the device.
    pub fn display_units(mut self, units: TemperatureDisplayUnits) -> Self {
        self.display_units = units;
        self
    }

    /// Called for every characteristic the session changes on its own.
    pub fn on_update(mut self, f: impl Fn(&CharacteristicUpdate) + Send + Sync + 'static) -> Self {
        self.update_callbacks.push(Box::new(f));
        self
    }

    pub fn build(self) -> ThermostatSession<T> {
        ThermostatSession {
            device_id: self.device_id,
            transport: self.transport,
            limits: self.limits,
            display_units: self.display_units,
            update_callbacks: self.update_callbacks,
        }
    }
}

/// Host-facing thermostat accessory for one device.
///
/// Holds no device state: every read fetches a fresh record and every write
/// fetches, reconciles and writes back the full record. Concurrent writes on
/// the same session are not serialized; the last one to reach the device wins.
pub struct ThermostatSession<T> {
    device_id: String,
    transport: T,
    limits: SetpointLimits,
    display_units: TemperatureDisplayUnits,
    update_callbacks: Vec<UpdateCallback>,
}

impl<T: Transport> ThermostatSession<T> {
    pub fn builder(device_id: impl Into<String>, transport: T) -> ThermostatSessionBuilder<T> {
        ThermostatSessionBuilder::new(device_id, transport)
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn setpoint_limits(&self) -> SetpointLimits {
        self.limits
    }

    pub async fn read_current(&self) -> Result<HostTargetState> {
        let settings = self.transport.fetch_settings(&self.device_id).await?;
        let state = HostTargetState::from_settings(&settings);
        debug!(device = %self.device_id, ?state, "read thermostat state");
        Ok(state)
    }

    /// Fetch, reconcile and write back. Returns the reconciliation that was
    /// applied; nothing is written when it reports no change.
    pub async fn apply_change(&self, change: RequestedChange) -> Result<Reconciliation> {
        let current = self.transport.fetch_settings(&self.device_id).await?;
        let result = reconcile(&current, change, &self.limits)?;

        if !result.changed {
            debug!(device = %self.device_id, ?change, "no change, skipping write");
            return Ok(result);
        }

        for c in settings_changes(&current, &result.settings) {
            debug!(device = %self.device_id, field = %c.path, old = %c.old, new = %c.new, "field change");
        }

        self.transport.write_settings(&result.settings).await?;
        info!(
            device = %self.device_id,
            ?change,
            heat = result.settings.heat_set_point,
            cool = result.settings.cool_set_point,
            mode = ?result.settings.operation_mode,
            "wrote thermostat settings"
        );

        for update in self.adjusted_updates(&result) {
            debug!(device = %self.device_id, characteristic = %update.characteristic, value = ?update.value, "pushing update");
            for cb in &self.update_callbacks {
                cb(&update);
            }
        }

        Ok(result)
    }

    fn adjusted_updates(&self, result: &Reconciliation) -> Vec<CharacteristicUpdate> {
        let settings = &result.settings;
        let mut updates = Vec::new();
        for field in &result.adjusted {
            let (characteristic, value_f, shown_as_target) = match field {
                SetpointField::HeatSetPoint => (
                    Characteristic::HeatingThresholdTemperature,
                    settings.heat_set_point,
                    settings.operation_mode == OperationMode::Heat,
                ),
                SetpointField::CoolSetPoint => (
                    Characteristic::CoolingThresholdTemperature,
                    settings.cool_set_point,
                    settings.operation_mode == OperationMode::Cool,
                ),
            };
            updates.push(self.update(characteristic, fahrenheit_to_celsius(value_f)));
            if shown_as_target {
                updates.push(self.update(
                    Characteristic::TargetTemperature,
                    fahrenheit_to_celsius(target_temperature_f(settings)),
                ));
            }
        }
        updates
    }

    fn update(&self, characteristic: Characteristic, celsius: f64) -> CharacteristicUpdate {
        CharacteristicUpdate {
            device_id: self.device_id.clone(),
            characteristic,
            value: CharacteristicValue::Float(celsius),
        }
    }

    // -- Get handlers --

    pub async fn current_heating_cooling_state(&self) -> Result<CurrentHeatingCoolingState> {
        Ok(self.read_current().await?.current_state)
    }

    pub async fn target_heating_cooling_state(&self) -> Result<TargetHeatingCoolingState> {
        Ok(self.read_current().await?.target_state)
    }

    pub async fn current_temperature(&self) -> Result<f64> {
        Ok(self.read_current().await?.current_temperature)
    }

    pub async fn target_temperature(&self) -> Result<f64> {
        Ok(self.read_current().await?.target_temperature)
    }

    pub fn temperature_display_units(&self) -> TemperatureDisplayUnits {
        self.display_units
    }

    pub async fn heating_threshold_temperature(&self) -> Result<f64> {
        Ok(self.read_current().await?.heating_threshold)
    }

    pub async fn cooling_threshold_temperature(&self) -> Result<f64> {
        Ok(self.read_current().await?.cooling_threshold)
    }

    pub async fn current_relative_humidity(&self) -> Result<f64> {
        Ok(self.read_current().await?.humidity)
    }

    // -- Set handlers --

    pub async fn set_target_heating_cooling_state(&self, state: TargetHeatingCoolingState) -> Result<()> {
        let mode = host_target_to_operation_mode(state);
        self.apply_change(RequestedChange::SetMode(mode)).await?;
        Ok(())
    }

    pub async fn set_target_temperature(&self, celsius: f64) -> Result<()> {
        let f = requested_fahrenheit(Characteristic::TargetTemperature, celsius)?;
        self.apply_change(RequestedChange::SetTargetTemperature(f)).await?;
        Ok(())
    }

    pub async fn set_heating_threshold_temperature(&self, celsius: f64) -> Result<()> {
        let f = requested_fahrenheit(Characteristic::HeatingThresholdTemperature, celsius)?;
        self.apply_change(RequestedChange::SetHeatThreshold(f)).await?;
        Ok(())
    }

    pub async fn set_cooling_threshold_temperature(&self, celsius: f64) -> Result<()> {
        let f = requested_fahrenheit(Characteristic::CoolingThresholdTemperature, celsius)?;
        self.apply_change(RequestedChange::SetCoolThreshold(f)).await?;
        Ok(())
    }

    // -- Characteristic dispatch --

    pub async fn get(&self, characteristic: Characteristic) -> Result<CharacteristicValue> {
        debug!(device = %self.device_id, %characteristic, "get");
        let value = match characteristic {
            Characteristic::TemperatureDisplayUnits => {
                CharacteristicValue::Uint8(self.display_units.code())
            }
            Characteristic::CurrentHeatingCoolingState => {
                CharacteristicValue::Uint8(self.current_heating_cooling_state().await?.code())
            }
            Characteristic::TargetHeatingCoolingState => {
                CharacteristicValue::Uint8(self.target_heating_cooling_state().await?.code())
            }
            Characteristic::CurrentTemperature => {
                CharacteristicValue::Float(self.current_temperature().await?)
            }
            Characteristic::TargetTemperature => {
                CharacteristicValue::Float(self.target_temperature().await?)
            }
            Characteristic::HeatingThresholdTemperature => {
                CharacteristicValue::Float(self.heating_threshold_temperature().await?)
            }
            Characteristic::CoolingThresholdTemperature => {
                CharacteristicValue::Float(self.cooling_threshold_temperature().await?)
            }
            Characteristic::CurrentRelativeHumidity => {
                CharacteristicValue::Float(self.current_relative_humidity().await?)
            }
        };
        Ok(value)
    }

    pub async fn set(&self, characteristic: Characteristic, value: CharacteristicValue) -> Result<()> {
        debug!(device = %self.device_id, %characteristic, ?value, "set");
        match characteristic {
            Characteristic::TargetHeatingCoolingState => {
                let code = value.as_u8().ok_or_else(|| Error::InvalidValue {
                    characteristic,
                    reason: format!("expected a mode code, got {value:?}"),
                })?;
                let state = TargetHeatingCoolingState::from_code(code)
                    .ok_or(Error::InvalidMode(code.into()))?;
                self.set_target_heating_cooling_state(state).await
            }
            Characteristic::TargetTemperature => self.set_target_temperature(value.as_f64()).await,
            Characteristic::HeatingThresholdTemperature => {
                self.set_heating_threshold_temperature(value.as_f64()).await
            }
            Characteristic::CoolingThresholdTemperature => {
                self.set_cooling_threshold_temperature(value.as_f64()).await
            }
            _ => Err(Error::InvalidValue {
                characteristic,
                reason: "read-only characteristic".to_string(),
            }),
        }
    }
}

fn requested_fahrenheit(characteristic: Characteristic, celsius: f64) -> Result<i32> {
    if !celsius.is_finite() {
        return Err(Error::InvalidValue {
            characteristic,
            reason: format!("not a temperature: {celsius}"),
        });
    }
    Ok(celsius_to_fahrenheit(celsius))
}
