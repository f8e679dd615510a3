//! Routes inbound frames into the dashboard stores.
//!
//! A frame that fails to parse is dropped and counted; it never affects the connection or the
//! frames around it.

use tracing::{debug, warn};

use crate::{
    message::{InboundMessage, MessageError},
    state::DashboardState,
};

/// What a successfully dispatched frame changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// A sample was appended to the throughput series.
    Throughput,
    /// An alert was prepended to the alert log.
    Alert,
    /// The frame carried an unknown `type` and was ignored.
    Ignored(String),
}

impl Dispatched {
    /// Whether the views need to be redrawn.
    pub fn changed_view(&self) -> bool {
        !matches!(self, Dispatched::Ignored(_))
    }
}

/// Applies already-parsed messages to a [`DashboardState`].
pub struct Dispatcher;

#[cfg_attr(not(test), hotpath::measure_all)]
impl Dispatcher {
    /// Parses `frame` and applies it to `state`.
    ///
    /// Malformed frames are logged, counted in `state.counters.malformed_frames` and returned
    /// as errors so the caller can decide whether to surface them further.
    pub fn dispatch_text(
        state: &mut DashboardState,
        frame: &str,
    ) -> Result<Dispatched, MessageError> {
        match InboundMessage::parse(frame) {
            Ok(message) => {
                debug!("Dispatching `{}` frame", message.kind());
                Ok(Self::apply(state, message))
            }
            Err(e) => {
                state.counters.malformed_frames += 1;
                warn!("Dropping malformed frame: {e}");
                debug!("Malformed frame content: {frame}");
                Err(e)
            }
        }
    }

    /// Same as [`Self::dispatch_text`] for binary frames, which must be UTF-8 JSON.
    pub fn dispatch_binary(
        state: &mut DashboardState,
        frame: &[u8],
    ) -> Result<Dispatched, MessageError> {
        match std::str::from_utf8(frame) {
            Ok(text) => Self::dispatch_text(state, text),
            Err(_) => {
                state.counters.malformed_frames += 1;
                warn!("Dropping malformed frame: {}", MessageError::NonUtf8Frame);
                Err(MessageError::NonUtf8Frame)
            }
        }
    }

    /// Routes a typed message to its store.
    pub fn apply(state: &mut DashboardState, message: InboundMessage) -> Dispatched {
        match message {
            InboundMessage::Throughput(frame) => {
                let sample = state.throughput.append(frame.timestamp, &frame.sample);
                debug!(
                    "Throughput sample {} = {} Kbps",
                    sample.label,
                    sample.display_value()
                );
                state.counters.throughput_frames += 1;
                Dispatched::Throughput
            }
            InboundMessage::SecurityAlert(alert) => {
                debug!(
                    "Security alert from {} ({})",
                    alert.ip,
                    alert.reason.as_deref().unwrap_or("no reason")
                );
                state.alerts.prepend(*alert);
                state.counters.alert_frames += 1;
                Dispatched::Alert
            }
            InboundMessage::Unknown(kind) => {
                debug!("Ignoring frame with unknown type `{kind}`");
                state.counters.ignored_frames += 1;
                Dispatched::Ignored(kind)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throughput(ts: i64, bytes: u64) -> String {
        format!(r#"{{"type":"throughput_data","payload":{{"{ts}":{{"bytes_total":{bytes}}}}}}}"#)
    }

    fn alert(ip: &str) -> String {
        format!(
            r#"{{"type":"security_alert","payload":{{"ip":"{ip}","timestamp":1700000000,"severity":"LOW"}}}}"#
        )
    }

    #[test]
    fn test_routes_throughput_and_alerts() {
        let mut state = DashboardState::default();
        assert_eq!(
            Dispatcher::dispatch_text(&mut state, &throughput(1, 1024)).unwrap(),
            Dispatched::Throughput
        );
        assert_eq!(
            Dispatcher::dispatch_text(&mut state, &alert("1.2.3.4")).unwrap(),
            Dispatched::Alert
        );
        assert_eq!(state.throughput.values(), vec![8.0]);
        assert_eq!(state.alerts.newest().unwrap().ip, "1.2.3.4");
        assert_eq!(state.counters.throughput_frames, 1);
        assert_eq!(state.counters.alert_frames, 1);
    }

    #[test]
    fn test_malformed_frame_between_valid_frames() {
        let mut state = DashboardState::default();
        Dispatcher::dispatch_text(&mut state, &throughput(1, 1024)).unwrap();
        assert!(Dispatcher::dispatch_text(&mut state, "{\"type\": \"throughput_data\",").is_err());
        Dispatcher::dispatch_text(&mut state, &throughput(2, 2048)).unwrap();

        assert_eq!(state.throughput.values(), vec![8.0, 16.0]);
        assert_eq!(state.counters.malformed_frames, 1);
        assert_eq!(state.counters.throughput_frames, 2);
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        let mut state = DashboardState::default();
        let outcome =
            Dispatcher::dispatch_text(&mut state, r#"{"type":"ping","payload":{}}"#).unwrap();
        assert_eq!(outcome, Dispatched::Ignored("ping".to_string()));
        assert!(!outcome.changed_view());
        assert!(state.throughput.is_empty());
        assert!(state.alerts.is_empty());
        assert_eq!(state.counters.ignored_frames, 1);
        assert_eq!(state.counters.malformed_frames, 0);
    }

    #[test]
    fn test_alerts_stored_newest_first() {
        let mut state = DashboardState::default();
        for ip in ["A", "B", "C"] {
            Dispatcher::dispatch_text(&mut state, &alert(ip)).unwrap();
        }
        let ips: Vec<_> = state.alerts.iter().map(|a| a.ip.as_str()).collect();
        assert_eq!(ips, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_binary_frames() {
        let mut state = DashboardState::default();
        Dispatcher::dispatch_binary(&mut state, throughput(1, 0).as_bytes()).unwrap();
        assert!(matches!(
            Dispatcher::dispatch_binary(&mut state, &[0xff, 0xfe]),
            Err(MessageError::NonUtf8Frame)
        ));
        assert_eq!(state.throughput.len(), 1);
        assert_eq!(state.counters.malformed_frames, 1);
    }
}
