use std::env;
use std::sync::Arc;
use std::time::Duration;

use icomfort_bridge::{
    AccessoryInfo, IComfortClient, TemperatureDisplayUnits, ThermostatSession,
};

#[tokio::main]
async fn main() -> icomfort_bridge::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let username = args.get(1).expect("usage: monitor <username> <password>");
    let password = args.get(2).expect("usage: monitor <username> <password>");

    let client = Arc::new(IComfortClient::builder(username, password).build()?);

    let systems = client.systems().await?;
    let thermostats = client.fetch_all_thermostats().await?;
    let mut sessions = Vec::new();
    for t in &thermostats {
        let system = systems.iter().find(|s| s.gateway_sn == t.gateway_sn);
        let info = AccessoryInfo::from_settings(t, system);
        println!(
            "{} ({}) firmware {}",
            info.name,
            info.serial_number,
            info.firmware_revision.as_deref().unwrap_or("?")
        );
        let session = ThermostatSession::builder(t.gateway_sn.clone(), client.clone())
            .display_units(TemperatureDisplayUnits::from_preference(
                t.pref_temp_units.as_deref().unwrap_or_default(),
            ))
            .on_update(|update| println!("update: {update:?}"))
            .build();
        sessions.push((info.name, session));
    }

    loop {
        for (name, session) in &sessions {
            match session.read_current().await {
                Ok(state) => println!(
                    "[{name}] {:.1}\u{00b0}C | target {:.1}\u{00b0}C | {:.1}-{:.1}\u{00b0}C | {:?}/{:?} | {}%",
                    state.current_temperature,
                    state.target_temperature,
                    state.heating_threshold,
                    state.cooling_threshold,
                    state.current_state,
                    state.target_state,
                    state.humidity,
                ),
                Err(e) => eprintln!("[{name}] read failed: {e}"),
            }
        }
        tokio::time::sleep(Duration::from_secs(60)).await;
    }
}
