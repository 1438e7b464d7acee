mod client;
pub mod convert;
mod diff;
mod error;
mod logger;
pub mod protocol;
pub mod reconcile;
mod session;
mod transport;
mod types;

pub use client::{IComfortClient, IComfortClientBuilder};
pub use diff::{settings_changes, FieldChange};
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use reconcile::{reconcile, Reconciliation, RequestedChange, SetpointField, SetpointLimits, MIN_DEADBAND_F};
pub use session::{ThermostatSession, ThermostatSessionBuilder};
pub use transport::Transport;
pub use types::*;
