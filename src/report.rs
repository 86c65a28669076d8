use tracing::info;

use crate::models::{ProbeOutcome, RoundReport};

/// Sink for completed rounds. The scheduler hands over one report per
/// round, synchronously, so reports never overlap at this boundary.
pub trait Reporter: Send + Sync {
    fn report(&self, report: &RoundReport);
}

/// Prints one line per outcome on stdout.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, report: &RoundReport) {
        info!(round = report.seq, timestamp = %report.timestamp, "Round report");
        for outcome in &report.outcomes {
            println!("{}", format_outcome(outcome));
        }
        println!();
    }
}

/// Render a single outcome. Latency is shown with two decimals here,
/// at the display boundary only.
pub fn format_outcome(outcome: &ProbeOutcome) -> String {
    match outcome {
        ProbeOutcome::PingResult { host, latency_ms } => {
            format!("Ping to {host}: {latency_ms:.2} ms")
        }
        ProbeOutcome::PingTimeout { host } => {
            format!("Ping to {host} failed: request timed out")
        }
        ProbeOutcome::PingError { host, detail } => {
            format!("Ping to {host} failed: {detail}")
        }
        ProbeOutcome::PortOpen { host, port } => {
            format!("Port {port} on {host} is OPEN")
        }
        ProbeOutcome::PortClosed { host, port } => {
            format!("Port {port} on {host} is CLOSED")
        }
        ProbeOutcome::PortError { host, port, detail } => {
            format!("Port check error on {host}:{port} - {detail}")
        }
    }
}
