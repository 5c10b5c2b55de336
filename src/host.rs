// src/host.rs

//! Host address detection.

use std::net::{IpAddr, UdpSocket};

use anyhow::Context;
use tracing::info;

use crate::config::HostSection;
use crate::errors::Result;

/// Address of the interface the default route goes out of.
///
/// Connecting a UDP socket only selects a route; no packet is sent.
pub fn detect_host_ip() -> Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("binding probe socket")?;
    socket
        .connect("192.0.2.1:80")
        .context("selecting outbound interface")?;
    let addr = socket.local_addr().context("reading local address")?;
    Ok(addr.ip())
}

/// `[host].ip` if configured, otherwise the detected address.
pub fn resolve_host_ip(host: &HostSection) -> Result<String> {
    if let Some(ip) = &host.ip {
        return Ok(ip.clone());
    }
    let ip = detect_host_ip()?;
    info!(%ip, "detected host address");
    Ok(ip.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_ip_wins() {
        let host = HostSection {
            ip: Some("10.0.0.5".to_string()),
        };
        assert_eq!(resolve_host_ip(&host).unwrap(), "10.0.0.5");
    }
}
