use std::sync::Mutex;

use reqwest::StatusCode;
use tracing::{debug, trace, warn};

use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    endpoint_url, parse_set_response, parse_systems_info, parse_thermostat_info_list,
    systems_info_query, thermostat_info_query, DEFAULT_BASE_URL, GET_SYSTEMS_INFO,
    GET_THERMOSTAT_INFO_LIST, SET_THERMOSTAT_INFO,
};
use crate::transport::Transport;
use crate::types::*;
use crate::{Error, Result};

pub struct IComfortClientBuilder {
    username: String,
    password: String,
    base_url: String,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl IComfortClientBuilder {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<IComfortClient> {
        let http = reqwest::Client::builder().build()?;

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(Mutex::new(MessageLogger::new(mode, &path)?)),
            _ => None,
        };

        Ok(IComfortClient {
            http,
            base_url: self.base_url,
            username: self.username,
            password: self.password,
            logger,
        })
    }
}

/// Client for the iComfort cloud service. Cheap to share behind an `Arc`;
/// every call is independent.
pub struct IComfortClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    logger: Option<Mutex<MessageLogger>>,
}

impl IComfortClient {
    pub fn builder(username: impl Into<String>, password: impl Into<String>) -> IComfortClientBuilder {
        IComfortClientBuilder::new(username, password)
    }

    /// Systems (gateways) registered to the account.
    pub async fn systems(&self) -> Result<Vec<SystemInfo>> {
        let query = systems_info_query(&self.username);
        let body = self.get(GET_SYSTEMS_INFO, &query).await?;
        let systems = parse_systems_info(&body)?;
        debug!(count = systems.len(), "fetched systems");
        Ok(systems)
    }

    /// Thermostat records behind one gateway, in Fahrenheit.
    pub async fn thermostats(&self, gateway_sn: &str) -> Result<Vec<DeviceSettings>> {
        let query = thermostat_info_query(gateway_sn);
        let body = self.get(GET_THERMOSTAT_INFO_LIST, &query).await?;
        let thermostats = parse_thermostat_info_list(&body)?;
        self.with_logger(|logger| {
            for t in &thermostats {
                if let Ok(snapshot) = serde_json::to_value(t) {
                    logger.log_fetch(&t.gateway_sn, &snapshot);
                }
            }
        });
        Ok(thermostats)
    }

    /// Every thermostat on the account. A gateway whose list cannot be read
    /// is skipped.
    pub async fn fetch_all_thermostats(&self) -> Result<Vec<DeviceSettings>> {
        let systems = self.systems().await?;
        let mut all = Vec::new();
        for system in &systems {
            match self.thermostats(&system.gateway_sn).await {
                Ok(thermostats) => {
                    all.extend(thermostats.into_iter().map(|mut t| {
                        t.system_name = Some(system.system_name.clone());
                        t
                    }));
                }
                Err(e) => {
                    warn!(gateway = %system.gateway_sn, error = %e, "skipping gateway");
                }
            }
        }
        Ok(all)
    }

    /// Replace a thermostat's full record.
    pub async fn set_thermostat(&self, settings: &DeviceSettings) -> Result<()> {
        let url = endpoint_url(&self.base_url, SET_THERMOSTAT_INFO);
        debug!(url = %url, device = %settings.gateway_sn, "writing thermostat settings");

        self.with_logger(|logger| {
            if let Ok(body) = serde_json::to_value(settings) {
                logger.log_write(&settings.gateway_sn, &body);
            }
        });

        let resp = self
            .http
            .put(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(settings)
            .send()
            .await?;
        let status = resp.status();
        if status.is_server_error() {
            return Err(Error::unreachable(format!("{SET_THERMOSTAT_INFO}: HTTP {status}")));
        }
        if status.is_client_error() {
            return Err(Error::WriteRejected(format!("{SET_THERMOSTAT_INFO}: HTTP {status}")));
        }

        let body = resp.text().await?;
        parse_set_response(&body).map_err(Error::WriteRejected)
    }

    async fn get(&self, endpoint: &str, query: &[(&'static str, String)]) -> Result<String> {
        let url = endpoint_url(&self.base_url, endpoint);
        trace!(url = %url, "GET");
        self.with_logger(|logger| logger.log_request("GET", endpoint, query));

        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(query)
            .send()
            .await?;
        match resp.status() {
            s if s.is_server_error() => Err(Error::unreachable(format!("{endpoint}: HTTP {s}"))),
            StatusCode::OK => Ok(resp.text().await?),
            s => Err(Error::Protocol(format!("{endpoint}: HTTP {s}"))),
        }
    }

    fn with_logger(&self, f: impl FnOnce(&mut MessageLogger)) {
        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            f(&mut *logger);
        }
    }
}

impl Transport for IComfortClient {
    async fn fetch_settings(&self, device_id: &str) -> Result<DeviceSettings> {
        self.thermostats(device_id)
            .await?
            .into_iter()
            .find(|t| t.gateway_sn == device_id)
            .ok_or_else(|| Error::DeviceNotFound(device_id.to_string()))
    }

    async fn write_settings(&self, settings: &DeviceSettings) -> Result<()> {
        self.set_thermostat(settings).await
    }
}
