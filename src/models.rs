use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a single probe. Every failure mode a probe can hit is a
/// variant here; nothing crosses the probe boundary as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ProbeOutcome {
    PingResult { host: String, latency_ms: f64 },
    PingTimeout { host: String },
    PingError { host: String, detail: String },
    PortOpen { host: String, port: u16 },
    PortClosed { host: String, port: u16 },
    PortError { host: String, port: u16, detail: String },
}

impl ProbeOutcome {
    pub fn host(&self) -> &str {
        match self {
            Self::PingResult { host, .. }
            | Self::PingTimeout { host }
            | Self::PingError { host, .. }
            | Self::PortOpen { host, .. }
            | Self::PortClosed { host, .. }
            | Self::PortError { host, .. } => host,
        }
    }

    /// True for the ping-side variants, false for the port-side ones.
    pub fn is_ping(&self) -> bool {
        matches!(
            self,
            Self::PingResult { .. } | Self::PingTimeout { .. } | Self::PingError { .. }
        )
    }
}

/// One completed scheduling cycle: every configured host and (host, port)
/// pair has exactly one outcome, in enumeration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundReport {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub outcomes: Vec<ProbeOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let outcome = ProbeOutcome::PortOpen {
            host: "127.0.0.1".into(),
            port: 443,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "PortOpen");
        assert_eq!(json["host"], "127.0.0.1");
        assert_eq!(json["port"], 443);
    }

    #[test]
    fn outcome_host_accessor_covers_all_variants() {
        let outcomes = [
            ProbeOutcome::PingResult {
                host: "a".into(),
                latency_ms: 1.5,
            },
            ProbeOutcome::PingTimeout { host: "a".into() },
            ProbeOutcome::PingError {
                host: "a".into(),
                detail: "dns".into(),
            },
            ProbeOutcome::PortOpen {
                host: "a".into(),
                port: 80,
            },
            ProbeOutcome::PortClosed {
                host: "a".into(),
                port: 80,
            },
            ProbeOutcome::PortError {
                host: "a".into(),
                port: 80,
                detail: "route".into(),
            },
        ];
        for outcome in &outcomes {
            assert_eq!(outcome.host(), "a");
        }
        assert!(outcomes[0].is_ping());
        assert!(!outcomes[3].is_ping());
    }
}
