use serde::Deserialize;
use serde_json::Value;

use crate::types::{DeviceSettings, SystemInfo};
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://services.myicomfort.com/DBAcessService.svc";

pub const GET_SYSTEMS_INFO: &str = "GetSystemsInfo";
pub const GET_THERMOSTAT_INFO_LIST: &str = "GetTStatInfoList";
pub const SET_THERMOSTAT_INFO: &str = "SetTStatInfo";

pub const RETURN_STATUS_SUCCESS: &str = "SUCCESS";

/// `TempUnit` query value asking the service for Fahrenheit readings.
pub const TEMP_UNIT_FAHRENHEIT: u8 = 0;

#[derive(Debug, Deserialize)]
struct SystemsInfoResponse {
    #[serde(rename = "ReturnStatus")]
    return_status: String,
    #[serde(rename = "Systems", default)]
    systems: Vec<SystemInfo>,
}

#[derive(Debug, Deserialize)]
struct ThermostatInfoListResponse {
    #[serde(rename = "ReturnStatus")]
    return_status: String,
    #[serde(rename = "tStatInfo", default)]
    thermostats: Vec<DeviceSettings>,
}

pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), endpoint)
}

pub fn systems_info_query(username: &str) -> [(&'static str, String); 1] {
    [("UserId", username.to_string())]
}

pub fn thermostat_info_query(gateway_sn: &str) -> [(&'static str, String); 2] {
    [
        ("GatewaySN", gateway_sn.to_string()),
        ("TempUnit", TEMP_UNIT_FAHRENHEIT.to_string()),
    ]
}

pub fn parse_systems_info(body: &str) -> Result<Vec<SystemInfo>> {
    let resp: SystemsInfoResponse = serde_json::from_str(body)?;
    check_status(&resp.return_status, GET_SYSTEMS_INFO)?;
    Ok(resp.systems)
}

pub fn parse_thermostat_info_list(body: &str) -> Result<Vec<DeviceSettings>> {
    let resp: ThermostatInfoListResponse = serde_json::from_str(body)?;
    check_status(&resp.return_status, GET_THERMOSTAT_INFO_LIST)?;
    Ok(resp.thermostats)
}

/// Status of a `SetTStatInfo` reply. An empty body counts as accepted.
pub fn parse_set_response(body: &str) -> std::result::Result<(), String> {
    if body.trim().is_empty() {
        return Ok(());
    }
    let parsed: Value = serde_json::from_str(body).map_err(|e| format!("unreadable reply: {e}"))?;
    match parsed.get("ReturnStatus").and_then(|v| v.as_str()) {
        Some(RETURN_STATUS_SUCCESS) | None => Ok(()),
        Some(status) => Err(status.to_string()),
    }
}

fn check_status(status: &str, endpoint: &str) -> Result<()> {
    if status == RETURN_STATUS_SUCCESS {
        Ok(())
    } else {
        Err(Error::Protocol(format!("{endpoint} returned {status}")))
    }
}
