//! ## Command Panel
//!
//! Live operations dashboard fed by a single backend WebSocket.
//!
//! [`CommandPanel::start`] owns the [`DashboardState`] and runs the only loop that mutates it.
//! The connection task forwards [`ConnectionEvent`]s over a channel; terminal input, the
//! render tick, the monitoring refresh tick and Ctrl+C are multiplexed alongside them.

use std::{sync::Arc, time::Duration};

use apollo_apps::{
    dispatcher::{Dispatched, Dispatcher},
    monitoring::{MonitoringServer, SnapshotCache},
    state::DashboardState,
    task_manager::TaskManager,
};
use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    config::CommandPanelConfig,
    connection::{ConnectionEvent, ConnectionManager},
    error::{PanelErrorKind, PanelResult},
    ui::PanelTerminal,
};

pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod ui;

/// How long spawned tasks get to finish after teardown before being aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Represents the command panel.
#[derive(Clone)]
pub struct CommandPanel {
    config: CommandPanelConfig,
    cancellation_token: CancellationToken,
}

#[cfg_attr(not(test), hotpath::measure_all)]
impl CommandPanel {
    pub fn new(config: CommandPanelConfig) -> Self {
        Self {
            config,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Token that tears the panel down when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn shutdown(&self) {
        self.cancellation_token.cancel();
    }

    /// Runs the panel until the user quits, Ctrl+C or [`Self::shutdown`].
    ///
    /// Returns the final dashboard state.
    pub async fn start(&self) -> PanelResult<DashboardState> {
        info!(
            "Command panel starting, backend: {}",
            self.config.backend_url()
        );

        let token = self.cancellation_token.clone();
        let task_manager = Arc::new(TaskManager::new());
        let mut state = DashboardState::new(
            self.config.throughput_history_len(),
            self.config.alert_log_len(),
        );

        // Terminal first so a broken TTY fails before anything connects
        let mut terminal = if self.config.headless() {
            None
        } else {
            Some(PanelTerminal::enter()?)
        };
        let mut input = terminal.as_ref().map(|_| EventStream::new());

        let mut monitoring_refresh = None;
        let mut cache = None;
        if let Some(monitoring_addr) = self.config.monitoring_address() {
            info!(
                "Initializing monitoring server on http://{}",
                monitoring_addr
            );
            let refresh = Duration::from_secs(self.config.monitoring_cache_refresh_secs());
            let snapshot_cache = Arc::new(SnapshotCache::new(refresh));
            let server = MonitoringServer::new(monitoring_addr, snapshot_cache.clone())
                .map_err(|e| PanelErrorKind::Monitoring(e.to_string()))?;

            let shutdown_signal = token.clone().cancelled_owned();
            task_manager.spawn(async move {
                if let Err(e) = server.run(shutdown_signal).await {
                    error!("Monitoring server error: {:?}", e);
                }
            });

            let mut ticker = interval(refresh);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            monitoring_refresh = Some(ticker);
            cache = Some(snapshot_cache);
        }

        let (event_sender, event_receiver) = async_channel::unbounded::<ConnectionEvent>();
        let connection = ConnectionManager::new(
            self.config.backend_url(),
            self.config.reconnect_delay(),
            event_sender,
            token.clone(),
        );
        connection.start(&task_manager);

        let mut render_tick = interval(self.config.render_interval());
        render_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut dirty = true;
        let mut outcome = Ok(());

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, initiating graceful shutdown...");
                    break;
                }
                event = event_receiver.recv() => {
                    match event {
                        Ok(event) => {
                            dirty |= self.handle_connection_event(&mut state, event);
                        }
                        Err(_) => {
                            warn!("Connection task stopped, shutting down");
                            break;
                        }
                    }
                }
                input_event = next_input(&mut input) => {
                    match input_event {
                        Some(Ok(event)) if ui::is_quit(&event) => {
                            info!("Quit requested from terminal");
                            break;
                        }
                        Some(Ok(Event::Resize(_, _))) => dirty = true,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            outcome = Err(e.into());
                            break;
                        }
                        None => input = None,
                    }
                }
                _ = render_tick.tick(), if dirty && terminal.is_some() => {
                    if let Some(terminal) = terminal.as_mut() {
                        if let Err(e) = terminal.draw(&state, self.config.backend_url()) {
                            outcome = Err(e.into());
                            break;
                        }
                    }
                    dirty = false;
                }
                _ = next_tick(&mut monitoring_refresh) => {
                    if let Some(cache) = cache.as_ref() {
                        cache.refresh(&state);
                    }
                }
            }
        }

        if let Some(mut terminal) = terminal.take() {
            if let Err(e) = terminal.restore() {
                warn!("Failed to restore terminal: {e}");
            }
        }

        token.cancel();
        task_manager.shutdown(SHUTDOWN_GRACE).await;
        info!(
            "Command panel stopped after {} frames ({} malformed)",
            state.counters.total_frames(),
            state.counters.malformed_frames
        );

        outcome.map(|_| state)
    }

    // Applies one connection event; returns whether the views changed.
    fn handle_connection_event(&self, state: &mut DashboardState, event: ConnectionEvent) -> bool {
        match event {
            ConnectionEvent::Opened => {
                state.on_open();
                info!("Backend link active");
                true
            }
            ConnectionEvent::Closed { reason, retry_in } => {
                state.on_close();
                debug!("Backend link inactive ({reason}), retry in {retry_in:?}");
                true
            }
            ConnectionEvent::Text(frame) => match Dispatcher::dispatch_text(state, &frame) {
                Ok(dispatched) => {
                    self.log_dispatched(state, &dispatched);
                    dispatched.changed_view()
                }
                Err(_) => false,
            },
            ConnectionEvent::Binary(frame) => match Dispatcher::dispatch_binary(state, &frame) {
                Ok(dispatched) => {
                    self.log_dispatched(state, &dispatched);
                    dispatched.changed_view()
                }
                Err(_) => false,
            },
        }
    }

    fn log_dispatched(&self, state: &DashboardState, dispatched: &Dispatched) {
        if !self.config.headless() {
            return;
        }
        match dispatched {
            Dispatched::Throughput => {
                if let Some(sample) = state.throughput.latest() {
                    info!(
                        "Throughput at {}: {} Kbps",
                        sample.label,
                        sample.display_value()
                    );
                }
            }
            Dispatched::Alert => {
                if let Some(alert) = state.alerts.newest() {
                    info!(
                        "Security alert from {} [{}]: {} ({})",
                        alert.ip,
                        alert.severity.as_deref().unwrap_or("unknown"),
                        alert.reason.as_deref().unwrap_or("no reason given"),
                        alert.action.as_deref().unwrap_or("no action"),
                    );
                }
            }
            Dispatched::Ignored(_) => {}
        }
    }
}

async fn next_input(input: &mut Option<EventStream>) -> Option<std::io::Result<Event>> {
    match input {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
