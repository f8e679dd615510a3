// Integration tests for the command panel against a mock WebSocket backend.
use std::time::Duration;

use apollo_apps::{dispatcher::Dispatcher, state::DashboardState};
use async_channel::Receiver;
use command_panel::connection::{ConnectionEvent, ConnectionManager};
use integration_tests_apollo::{mock_roles::MockBackend, *};
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

async fn next_event(events: &Receiver<ConnectionEvent>) -> ConnectionEvent {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for a connection event")
        .expect("connection task stopped")
}

fn start_manager(
    url: String,
    delay: Duration,
) -> (
    ConnectionManager,
    Receiver<ConnectionEvent>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, rx) = async_channel::unbounded();
    let manager = ConnectionManager::new(url, delay, tx, CancellationToken::new());
    let handle = tokio::spawn(manager.clone().run());
    (manager, rx, handle)
}

// Applies events to `state` until `done` holds.
async fn drive_until(
    state: &mut DashboardState,
    events: &Receiver<ConnectionEvent>,
    done: impl Fn(&DashboardState) -> bool,
) {
    while !done(state) {
        match next_event(events).await {
            ConnectionEvent::Opened => state.on_open(),
            ConnectionEvent::Closed { .. } => state.on_close(),
            ConnectionEvent::Text(frame) => {
                let _ = Dispatcher::dispatch_text(state, &frame);
            }
            ConnectionEvent::Binary(frame) => {
                let _ = Dispatcher::dispatch_binary(state, &frame);
            }
        }
    }
}

// Open flips the indicator to connected; a server close flips it back and schedules a
// reconnect after the configured delay, which then happens.
#[tokio::test]
async fn panel_reconnects_after_backend_close() {
    start_tracing();
    let backend = MockBackend::new(ephemeral_addr()).start().await;
    let delay = Duration::from_millis(200);
    let (manager, events, handle) = start_manager(backend.url(), delay);

    let mut state = DashboardState::default();
    assert_eq!(next_event(&events).await, ConnectionEvent::Opened);
    state.on_open();
    assert!(state.connection.is_connected());

    backend.close_client().await;
    match next_event(&events).await {
        ConnectionEvent::Closed { retry_in, .. } => assert_eq!(retry_in, delay),
        other => panic!("expected close, got {other:?}"),
    }
    state.on_close();
    assert!(!state.connection.is_connected());

    assert_eq!(next_event(&events).await, ConnectionEvent::Opened);
    backend.wait_for_connections(2, WAIT).await;

    manager.shutdown();
    handle.await.unwrap();
}

// The next connection attempt only starts once the configured delay has elapsed.
#[tokio::test]
async fn reconnect_waits_for_configured_delay() {
    start_tracing();
    let backend = MockBackend::new(ephemeral_addr()).start().await;
    let delay = Duration::from_millis(800);
    let (manager, events, handle) = start_manager(backend.url(), delay);

    assert_eq!(next_event(&events).await, ConnectionEvent::Opened);
    backend.close_client().await;
    assert!(matches!(
        next_event(&events).await,
        ConnectionEvent::Closed { .. }
    ));
    let closed_at = tokio::time::Instant::now();

    tokio::time::sleep(delay / 2).await;
    assert_eq!(manager.connection_attempts(), 1);
    assert_eq!(backend.accepted_connections(), 1);

    assert_eq!(next_event(&events).await, ConnectionEvent::Opened);
    let waited = closed_at.elapsed();
    assert!(waited >= delay, "reconnected after {waited:?}, expected at least {delay:?}");
    assert_eq!(manager.connection_attempts(), 2);

    manager.shutdown();
    handle.await.unwrap();
}

// A malformed frame between two valid ones is dropped without affecting either.
#[tokio::test]
async fn malformed_frame_between_valid_frames_is_dropped() {
    start_tracing();
    let backend = MockBackend::new(ephemeral_addr()).start().await;
    let (manager, events, handle) = start_manager(backend.url(), Duration::from_secs(5));

    backend.send_text(throughput_frame(1_700_000_000, 1024)).await;
    backend.send_text("{\"type\": \"throughput_data\", ").await;
    backend
        .send_text(alert_frame("198.51.100.7", "critical", "Brute force"))
        .await;

    let mut state = DashboardState::default();
    drive_until(&mut state, &events, |s| s.counters.total_frames() == 3).await;

    assert_eq!(state.counters.malformed_frames, 1);
    assert_eq!(state.throughput.len(), 1);
    assert_eq!(state.throughput.display_values(), vec!["8.00".to_string()]);
    assert_eq!(state.alerts.len(), 1);
    assert_eq!(state.alerts.newest().unwrap().ip, "198.51.100.7");

    manager.shutdown();
    handle.await.unwrap();
}

// 65 samples leave the 60 most recent, the oldest one being the sixth received.
#[tokio::test]
async fn throughput_window_keeps_latest_sixty() {
    start_tracing();
    let backend = MockBackend::new(ephemeral_addr()).start().await;
    let (manager, events, handle) = start_manager(backend.url(), Duration::from_secs(5));

    let base = 1_700_000_000;
    for i in 0..65 {
        backend.send_text(throughput_frame(base + i, 128 * i as u64)).await;
    }

    let mut state = DashboardState::default();
    drive_until(&mut state, &events, |s| s.counters.throughput_frames == 65).await;

    assert_eq!(state.throughput.len(), 60);
    let first = state.throughput.iter().next().unwrap();
    assert_eq!(first.timestamp, base + 5);
    assert_eq!(
        first.label,
        apollo_apps::time_fmt::clock_label(base + 5)
    );
    assert_eq!(state.throughput.latest().unwrap().timestamp, base + 64);

    manager.shutdown();
    handle.await.unwrap();
}

// Alerts A, B, C come out newest first, binary frames included.
#[tokio::test]
async fn alerts_are_listed_newest_first() {
    start_tracing();
    let backend = MockBackend::new(ephemeral_addr()).start().await;
    let (manager, events, handle) = start_manager(backend.url(), Duration::from_secs(5));

    backend.send_text(alert_frame("10.0.0.1", "low", "A")).await;
    backend.send_text(alert_frame("10.0.0.2", "medium", "B")).await;
    backend
        .send_binary(alert_frame("10.0.0.3", "high", "C").into_bytes())
        .await;

    let mut state = DashboardState::default();
    drive_until(&mut state, &events, |s| s.counters.alert_frames == 3).await;

    let reasons: Vec<_> = state
        .alerts
        .iter()
        .map(|a| a.reason.clone().unwrap())
        .collect();
    assert_eq!(reasons, vec!["C", "B", "A"]);

    manager.shutdown();
    handle.await.unwrap();
}

// Tearing down while a reconnect is pending must not connect again.
#[tokio::test]
async fn teardown_cancels_pending_reconnect() {
    start_tracing();
    let backend = MockBackend::new(ephemeral_addr()).start().await;
    let delay = Duration::from_millis(300);
    let (manager, events, handle) = start_manager(backend.url(), delay);

    assert_eq!(next_event(&events).await, ConnectionEvent::Opened);
    backend.close_client().await;
    assert!(matches!(
        next_event(&events).await,
        ConnectionEvent::Closed { .. }
    ));

    manager.shutdown();
    handle.await.unwrap();
    tokio::time::sleep(delay * 3).await;

    assert_eq!(manager.connection_attempts(), 1);
    assert_eq!(backend.accepted_connections(), 1);
}

// End to end: the headless panel applies frames and stops cleanly on its shutdown token.
#[tokio::test]
async fn headless_panel_end_to_end() {
    start_tracing();
    let backend = MockBackend::new(ephemeral_addr()).start().await;
    let (token, handle) = start_command_panel(backend.url(), Duration::from_millis(200));

    backend.wait_for_connections(1, WAIT).await;
    backend.send_text(throughput_frame(1_700_000_000, 2048)).await;
    backend.send_text("not json at all").await;
    backend
        .send_text(r#"{"type":"heartbeat","payload":{}}"#)
        .await;
    backend
        .send_text(alert_frame("192.0.2.10", "medium", "Suspicious payload"))
        .await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    token.cancel();
    let state = tokio::time::timeout(WAIT, handle)
        .await
        .expect("panel did not stop")
        .unwrap()
        .unwrap();

    assert_eq!(state.counters.throughput_frames, 1);
    assert_eq!(state.counters.malformed_frames, 1);
    assert_eq!(state.counters.ignored_frames, 1);
    assert_eq!(state.counters.alert_frames, 1);
    assert_eq!(state.throughput.display_values(), vec!["16.00".to_string()]);
    assert_eq!(backend.accepted_connections(), 1);
}
