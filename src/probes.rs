use hickory_resolver::TokioResolver;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::time::Duration;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, SurgeError, ICMP};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::models::ProbeOutcome;

/// Standard 56-byte ICMP echo payload.
const PING_PAYLOAD: [u8; 56] = [0u8; 56];

/// One ICMP echo against `host`, bounded by `timeout`.
///
/// Resolution failures, missing raw-socket privileges and transport
/// errors all come back as `PingError`; an unanswered echo is
/// `PingTimeout`. Nothing here returns `Err`.
pub async fn ping_host(resolver: &TokioResolver, host: &str, probe_timeout: Duration) -> ProbeOutcome {
    let ip = match resolve(resolver, host).await {
        Ok(ip) => ip,
        Err(detail) => {
            return ProbeOutcome::PingError {
                host: host.to_string(),
                detail,
            }
        }
    };

    // The client is per-probe so a privilege problem surfaces as an
    // outcome for this host instead of taking down the whole loop.
    let client = match ip {
        IpAddr::V4(_) => Client::new(&Config::default()),
        IpAddr::V6(_) => Client::new(&Config::builder().kind(ICMP::V6).build()),
    };
    let client = match client {
        Ok(client) => client,
        Err(e) => {
            return ProbeOutcome::PingError {
                host: host.to_string(),
                detail: format!("icmp client: {e}"),
            }
        }
    };

    let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
    pinger.timeout(probe_timeout);

    match pinger.ping(PingSequence(0), &PING_PAYLOAD).await {
        Ok((_, rtt)) => {
            let latency_ms = rtt.as_secs_f64() * 1000.0;
            debug!(host, latency_ms, "Ping reply");
            ProbeOutcome::PingResult {
                host: host.to_string(),
                latency_ms,
            }
        }
        Err(SurgeError::Timeout { .. }) => ProbeOutcome::PingTimeout {
            host: host.to_string(),
        },
        Err(e) => ProbeOutcome::PingError {
            host: host.to_string(),
            detail: e.to_string(),
        },
    }
}

/// One TCP connect to `host:port`, bounded by `timeout`.
///
/// A refused connect and an elapsed timeout are both reported as
/// `PortClosed`; any other failure (resolution, routing, resources)
/// carries its detail in `PortError`. A successful connection is
/// dropped immediately.
pub async fn check_port(host: &str, port: u16, probe_timeout: Duration) -> ProbeOutcome {
    let addr = format!("{host}:{port}");

    match timeout(probe_timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => {
            drop(stream);
            debug!(host, port, "TCP connect succeeded");
            ProbeOutcome::PortOpen {
                host: host.to_string(),
                port,
            }
        }
        Ok(Err(e)) if matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::TimedOut) => {
            ProbeOutcome::PortClosed {
                host: host.to_string(),
                port,
            }
        }
        Ok(Err(e)) => ProbeOutcome::PortError {
            host: host.to_string(),
            port,
            detail: e.to_string(),
        },
        Err(_) => ProbeOutcome::PortClosed {
            host: host.to_string(),
            port,
        },
    }
}

/// Resolve `host` to an address, short-circuiting IP literals.
async fn resolve(resolver: &TokioResolver, host: &str) -> Result<IpAddr, String> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }
    match resolver.lookup_ip(host).await {
        Ok(lookup) => lookup
            .iter()
            .next()
            .ok_or_else(|| format!("no addresses found for {host}")),
        Err(e) => Err(format!("resolution failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::TokioResolver;
    use tokio::net::TcpListener;

    fn resolver() -> TokioResolver {
        TokioResolver::builder_tokio()
            .expect("system resolver config")
            .build()
    }

    #[tokio::test]
    async fn check_port_open_with_listener() {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                // Sandboxed environments may disallow binding; skip.
                return;
            }
            Err(e) => panic!("failed to bind test listener: {e}"),
        };
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let _ = listener.accept().await;
            }
        });

        let outcome =
            check_port(&addr.ip().to_string(), addr.port(), Duration::from_secs(1)).await;
        assert_eq!(
            outcome,
            ProbeOutcome::PortOpen {
                host: addr.ip().to_string(),
                port: addr.port(),
            }
        );
    }

    #[tokio::test]
    async fn check_port_closed_when_nothing_listens() {
        let outcome = check_port("localhost", 65530, Duration::from_secs(1)).await;
        assert_eq!(
            outcome,
            ProbeOutcome::PortClosed {
                host: "localhost".to_string(),
                port: 65530,
            }
        );
    }

    #[tokio::test]
    async fn check_port_unresolvable_host() {
        let outcome = check_port("nonexistent.invalid", 80, Duration::from_secs(3)).await;
        match outcome {
            ProbeOutcome::PortError { host, port, detail } => {
                assert_eq!(host, "nonexistent.invalid");
                assert_eq!(port, 80);
                assert!(!detail.is_empty());
            }
            // A resolver blackhole turns the lookup into an overall
            // timeout; tolerated so the suite passes without DNS.
            ProbeOutcome::PortClosed { .. } => {}
            other => panic!("expected PortError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ping_unresolvable_host_is_an_error() {
        let outcome = ping_host(&resolver(), "nonexistent.invalid", Duration::from_secs(1)).await;
        match outcome {
            ProbeOutcome::PingError { host, detail } => {
                assert_eq!(host, "nonexistent.invalid");
                assert!(!detail.is_empty());
            }
            other => panic!("expected PingError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ping_non_routable_host_times_out() {
        if Client::new(&Config::default()).is_err() {
            // No ICMP socket privileges in this environment; skip.
            return;
        }

        let outcome = ping_host(&resolver(), "10.255.255.1", Duration::from_millis(500)).await;
        match outcome {
            ProbeOutcome::PingTimeout { host } => assert_eq!(host, "10.255.255.1"),
            // Firewalled environments can reject the send outright.
            ProbeOutcome::PingError { detail, .. } => assert!(!detail.is_empty()),
            other => panic!("expected PingTimeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ping_loopback_never_times_out() {
        // Without raw-socket privileges this degrades to PingError,
        // which is still a valid terminal outcome for the loopback.
        let outcome = ping_host(&resolver(), "127.0.0.1", Duration::from_secs(1)).await;
        match outcome {
            ProbeOutcome::PingResult { latency_ms, .. } => assert!(latency_ms >= 0.0),
            ProbeOutcome::PingError { detail, .. } => assert!(!detail.is_empty()),
            other => panic!("unexpected outcome for loopback ping: {other:?}"),
        }
    }
}
