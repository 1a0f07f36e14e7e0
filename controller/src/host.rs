use std::{
    future::Future,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use anyhow::{anyhow, Context};
use axum::Router;
use embedded_hal::digital::OutputPin;
use irrigation_common::{
    CharDisplay, ControlLoop, ControllerConfig, HardwareConfig, MoistureSensor, Sleeper,
    StatusStore, HTTP_PORT,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::web;

const HOST_VAR: &str = "IRRIGATION_HTTP_HOST";
const PORT_VAR: &str = "IRRIGATION_HTTP_PORT";
const WEB_ROOT_VAR: &str = "IRRIGATION_WEB_ROOT";

#[derive(Debug, Clone, PartialEq, Eq)]
struct HttpSettings {
    host: IpAddr,
    port: u16,
    web_root: PathBuf,
}

impl HttpSettings {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup(HOST_VAR)
            .and_then(|value| value.trim().parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port = lookup(PORT_VAR)
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(HTTP_PORT);
        let web_root = lookup(WEB_ROOT_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map_or_else(
                || PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/web")),
                PathBuf::from,
            );
        Self {
            host,
            port,
            web_root,
        }
    }

    fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = ControllerConfig::default();
    config.sanitize();
    let mut hardware = HardwareConfig::default();
    hardware.sanitize();

    // Bind first: nothing touches the relay until the server can run.
    let settings = HttpSettings::from_env();
    let addr = settings.addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind status server at {addr}"))?;

    let store = StatusStore::new();

    #[cfg(feature = "linux-hw")]
    let control = crate::hw::control_loop(&hardware, config, store.clone())?;
    #[cfg(not(feature = "linux-hw"))]
    let control = crate::sim::control_loop(&hardware, config, store.clone());

    let control = tokio::task::spawn_blocking(move || {
        let mut control = control;
        control.start().map(|()| control)
    })
    .await
    .context("control loop startup task failed")?
    .context("failed to switch pump off at startup")?;

    let app = web::router(store, &settings.web_root);

    info!("status page on http://{addr}");
    serve_with_control(listener, app, control, shutdown_signal()).await?;
    Ok(())
}

/// Runs `control` on its own thread while `app` serves on `listener`. The
/// loop is stopped and joined before this returns, whatever the server's
/// outcome, and handed back.
async fn serve_with_control<S, P, D, Z>(
    listener: TcpListener,
    app: Router,
    control: ControlLoop<S, P, D, Z>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<ControlLoop<S, P, D, Z>>
where
    S: MoistureSensor + Send + 'static,
    P: OutputPin + Send + 'static,
    D: CharDisplay + Send + 'static,
    Z: Sleeper + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let control_thread = thread::Builder::new()
        .name("control".to_string())
        .spawn({
            let stop = Arc::clone(&stop);
            move || {
                let mut control = control;
                control.run(&stop);
                control
            }
        })
        .context("failed to spawn control thread")?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    stop.store(true, Ordering::Relaxed);
    let control = tokio::task::spawn_blocking(move || control_thread.join())
        .await
        .context("control thread join task failed")?
        .map_err(|_| anyhow!("control thread panicked"))?;

    served.context("status server failed")?;
    Ok(control)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use irrigation_common::{
        ads1115::AdcGain, MotorState, Relay, SensorReader, StatusDisplay, FULL_SCALE_VOLTAGE,
    };

    use super::*;
    use crate::sim::{LogDisplay, SimulatedAdc, SimulatedRelayPin, SoilModel};

    fn settings(vars: &[(&str, &str)]) -> HttpSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        HttpSettings::from_lookup(|key| vars.get(key).cloned())
    }

    struct ShortSleeper;

    impl Sleeper for ShortSleeper {
        fn sleep(&mut self, _duration: Duration) {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn defaults_to_all_interfaces_on_port_5000() {
        let settings = settings(&[]);
        assert_eq!(settings.addr(), "0.0.0.0:5000".parse().unwrap());
        assert!(settings.web_root.ends_with("web"));
    }

    #[test]
    fn reads_overrides() {
        let settings = settings(&[
            (HOST_VAR, "127.0.0.1"),
            (PORT_VAR, " 8081 "),
            (WEB_ROOT_VAR, "/srv/irrigation"),
        ]);
        assert_eq!(settings.addr(), "127.0.0.1:8081".parse().unwrap());
        assert_eq!(settings.web_root, PathBuf::from("/srv/irrigation"));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let settings = settings(&[
            (HOST_VAR, "garden.local"),
            (PORT_VAR, "70000"),
            (WEB_ROOT_VAR, "  "),
        ]);
        assert_eq!(settings.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(settings.port, HTTP_PORT);
        assert!(settings.web_root.ends_with("web"));
    }

    #[tokio::test]
    async fn server_exit_stops_loop_with_pump_off() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let store = StatusStore::new();

        // Dry soil, so the first tick energises the relay.
        let soil = SoilModel::new(3.7);
        let mut control = ControlLoop::new(
            SensorReader::new(
                SimulatedAdc::new(soil.clone(), AdcGain::One),
                FULL_SCALE_VOLTAGE,
            ),
            Relay::new(SimulatedRelayPin::new(soil, 27)),
            StatusDisplay::new(LogDisplay::new(2, 16)),
            ShortSleeper,
            store.clone(),
            ControllerConfig::default(),
        );
        control.start().unwrap();

        let watcher = store.clone();
        let pump_started = async move {
            while !watcher.snapshot().motor.is_on() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        let app = web::router(store.clone(), "/nonexistent");

        let control = serve_with_control(listener, app, control, pump_started)
            .await
            .unwrap();

        assert_eq!(control.motor_state(), MotorState::Off);
        assert_eq!(control.relay().state(), Some(MotorState::Off));
        assert_eq!(
            control.display().device().line(0).as_deref(),
            Some(&*" ".repeat(16))
        );
    }
}
