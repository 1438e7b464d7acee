use std::collections::BTreeSet;

use crate::types::{DeviceSettings, OperationMode};
use crate::{Error, Result};

/// Minimum separation the thermostat requires between heat and cool setpoints.
pub const MIN_DEADBAND_F: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedChange {
    SetMode(OperationMode),
    SetHeatThreshold(i32),
    SetCoolThreshold(i32),
    /// Resolved against the current mode: HEAT moves the heat setpoint, COOL
    /// the cool setpoint, OFF and AUTO ignore it.
    SetTargetTemperature(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SetpointField {
    HeatSetPoint,
    CoolSetPoint,
}

/// Setpoints the thermostat accepts, inclusive, in Fahrenheit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetpointLimits {
    pub min_f: i32,
    pub max_f: i32,
}

impl Default for SetpointLimits {
    fn default() -> Self {
        Self { min_f: 40, max_f: 99 }
    }
}

impl SetpointLimits {
    pub fn check(&self, requested_f: i32) -> Result<i32> {
        if (self.min_f..=self.max_f).contains(&requested_f) {
            Ok(requested_f)
        } else {
            Err(Error::InvalidSetpoint {
                requested_f,
                min_f: self.min_f,
                max_f: self.max_f,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub settings: DeviceSettings,
    /// Fields moved to keep the deadband, beyond the one that was requested.
    pub adjusted: BTreeSet<SetpointField>,
    pub changed: bool,
}

impl Reconciliation {
    fn unchanged(current: &DeviceSettings) -> Self {
        Self {
            settings: current.clone(),
            adjusted: BTreeSet::new(),
            changed: false,
        }
    }
}

/// Compute the record to write for `change`. Out-of-range setpoints are
/// rejected before anything is modified.
///
/// The deadband is only enforced in HEAT and COOL. In OFF and AUTO a threshold
/// write changes the requested field alone.
pub fn reconcile(
    current: &DeviceSettings,
    change: RequestedChange,
    limits: &SetpointLimits,
) -> Result<Reconciliation> {
    match change {
        RequestedChange::SetMode(mode) => {
            if mode == current.operation_mode {
                return Ok(Reconciliation::unchanged(current));
            }
            let mut settings = current.clone();
            settings.operation_mode = mode;
            Ok(Reconciliation {
                settings,
                adjusted: BTreeSet::new(),
                changed: true,
            })
        }
        RequestedChange::SetHeatThreshold(heat_f) => set_heat(current, heat_f, limits),
        RequestedChange::SetCoolThreshold(cool_f) => set_cool(current, cool_f, limits),
        RequestedChange::SetTargetTemperature(temp_f) => match current.operation_mode {
            OperationMode::Heat => set_heat(current, temp_f, limits),
            OperationMode::Cool => set_cool(current, temp_f, limits),
            OperationMode::Off | OperationMode::Auto => {
                limits.check(temp_f)?;
                Ok(Reconciliation::unchanged(current))
            }
        },
    }
}

/// Both setpoints only matter to the equipment in HEAT and COOL.
fn enforces_deadband(current: &DeviceSettings) -> bool {
    matches!(current.operation_mode, OperationMode::Heat | OperationMode::Cool)
}

fn inside_deadband(heat_f: i32, cool_f: i32) -> bool {
    i64::from(cool_f) - i64::from(heat_f) < i64::from(MIN_DEADBAND_F)
}

fn set_heat(current: &DeviceSettings, heat_f: i32, limits: &SetpointLimits) -> Result<Reconciliation> {
    let heat_f = limits.check(heat_f)?;
    if heat_f == current.heat_set_point {
        return Ok(Reconciliation::unchanged(current));
    }

    let mut settings = current.clone();
    let mut adjusted = BTreeSet::new();
    settings.heat_set_point = heat_f;
    if enforces_deadband(current) && inside_deadband(heat_f, settings.cool_set_point) {
        settings.cool_set_point = heat_f
            .checked_add(MIN_DEADBAND_F)
            .and_then(|cool_f| limits.check(cool_f).ok())
            .ok_or(Error::InvalidSetpoint {
                requested_f: heat_f,
                min_f: limits.min_f,
                max_f: limits.max_f.saturating_sub(MIN_DEADBAND_F),
            })?;
        adjusted.insert(SetpointField::CoolSetPoint);
    }

    Ok(Reconciliation {
        settings,
        adjusted,
        changed: true,
    })
}

fn set_cool(current: &DeviceSettings, cool_f: i32, limits: &SetpointLimits) -> Result<Reconciliation> {
    let cool_f = limits.check(cool_f)?;
    if cool_f == current.cool_set_point {
        return Ok(Reconciliation::unchanged(current));
    }

    let mut settings = current.clone();
    let mut adjusted = BTreeSet::new();
    settings.cool_set_point = cool_f;
    if enforces_deadband(current) && inside_deadband(settings.heat_set_point, cool_f) {
        settings.heat_set_point = cool_f
            .checked_sub(MIN_DEADBAND_F)
            .and_then(|heat_f| limits.check(heat_f).ok())
            .ok_or(Error::InvalidSetpoint {
                requested_f: cool_f,
                min_f: limits.min_f.saturating_add(MIN_DEADBAND_F),
                max_f: limits.max_f,
            })?;
        adjusted.insert(SetpointField::HeatSetPoint);
    }

    Ok(Reconciliation {
        settings,
        adjusted,
        changed: true,
    })
}
