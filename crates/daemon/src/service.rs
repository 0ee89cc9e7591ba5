//! Systemd service integration
//!
//! Minimal sd-notify support: readiness once the screen is streaming, a
//! watchdog keepalive per telemetry tick, status lines, and stopping.
//! Every call is a no-op when not running under systemd with Type=notify.

use anyhow::{Context, Result};
use std::env;
use std::os::unix::net::UnixDatagram;
use std::time::Duration;
use tracing::debug;

fn notify(state: &str) -> Result<bool> {
    let Ok(socket_path) = env::var("NOTIFY_SOCKET") else {
        return Ok(false);
    };

    let socket = UnixDatagram::unbound().context("Failed to create Unix socket")?;
    socket
        .send_to(state.as_bytes(), &socket_path)
        .with_context(|| format!("Failed to send {} notification to systemd", state))?;
    Ok(true)
}

/// Notify systemd that the service is ready
pub fn notify_ready() -> Result<()> {
    if notify("READY=1")? {
        debug!("Notified systemd: service ready");
    }
    Ok(())
}

/// Notify systemd that the service is stopping
pub fn notify_stopping() -> Result<()> {
    if notify("STOPPING=1")? {
        debug!("Notified systemd: service stopping");
    }
    Ok(())
}

/// Send watchdog keepalive to systemd
pub fn notify_watchdog() -> Result<()> {
    notify("WATCHDOG=1").map(|_| ())
}

/// Send a custom status message to systemd
///
/// The status will be visible in `systemctl status` output.
pub fn notify_status(status: &str) -> Result<()> {
    if notify(&format!("STATUS={}", status))? {
        debug!("Notified systemd: status = {}", status);
    }
    Ok(())
}

/// Watchdog timeout configured by systemd
///
/// Returns None if watchdog is not enabled or not running under systemd.
pub fn watchdog_timeout() -> Option<Duration> {
    env::var("WATCHDOG_USEC")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_micros)
}

/// Check if running under systemd
pub fn is_systemd() -> bool {
    env::var("NOTIFY_SOCKET").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the environment mutations cannot race each other
    #[test]
    fn test_without_systemd() {
        unsafe {
            env::remove_var("NOTIFY_SOCKET");
            env::remove_var("WATCHDOG_USEC");
        }
        assert!(!is_systemd());
        assert!(notify_ready().is_ok());
        assert!(notify_stopping().is_ok());
        assert!(notify_watchdog().is_ok());
        assert!(notify_status("test").is_ok());
        assert!(watchdog_timeout().is_none());

        unsafe {
            env::set_var("WATCHDOG_USEC", "30000000");
        }
        assert_eq!(watchdog_timeout(), Some(Duration::from_secs(30)));

        unsafe {
            env::set_var("WATCHDOG_USEC", "invalid");
        }
        assert!(watchdog_timeout().is_none());

        unsafe {
            env::remove_var("WATCHDOG_USEC");
        }
    }
}
