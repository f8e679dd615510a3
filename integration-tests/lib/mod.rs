use std::{net::SocketAddr, sync::Once, time::Duration};

use apollo_apps::state::DashboardState;
use command_panel::{config::CommandPanelConfig, error::PanelResult, CommandPanel};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

pub mod mock_roles;

static TRACING: Once = Once::new();

pub fn start_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A loopback address with an ephemeral port.
pub fn ephemeral_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

/// Throughput frame in the dynamic-key form the backend emits.
pub fn throughput_frame(window: i64, bytes_total: u64) -> String {
    serde_json::json!({
        "type": "throughput_data",
        "payload": { window.to_string(): { "bytes_total": bytes_total, "packets": 1 } }
    })
    .to_string()
}

pub fn alert_frame(ip: &str, severity: &str, reason: &str) -> String {
    serde_json::json!({
        "type": "security_alert",
        "payload": {
            "ip": ip,
            "timestamp": 1_700_000_000.25,
            "severity": severity,
            "reason": reason,
            "action": "BLOQUEADO",
            "geo": { "country_code": "N/A", "hostname": "N/A" }
        }
    })
    .to_string()
}

/// Starts a headless command panel against `backend_url`.
pub fn start_command_panel(
    backend_url: String,
    reconnect_delay: Duration,
) -> (CancellationToken, JoinHandle<PanelResult<DashboardState>>) {
    let config = CommandPanelConfig::new(backend_url).with_reconnect_delay(reconnect_delay);
    let panel = CommandPanel::new(config);
    let token = panel.shutdown_token();
    let handle = tokio::spawn(async move { panel.start().await });
    (token, handle)
}
