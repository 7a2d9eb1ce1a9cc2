use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
};

use tokio::net::UdpSocket;
use tracing::warn;

use crate::config::AppConfig;

/// Fire-and-forget sender from the HTTP path to the datagram sink.
///
/// Each call opens an ephemeral UDP socket, sends the payload once and drops
/// the socket. There is no acknowledgement and no retry: if the sink is down
/// or the datagram is lost, the submission is gone and nobody is told.
#[derive(Debug, Clone)]
pub struct DispatchClient {
    target: SocketAddr,
}

impl DispatchClient {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            target: cfg.sink_addr,
        }
    }

    /// Send `payload` as one datagram. Failures are logged, never returned.
    pub async fn send(&self, payload: &[u8]) {
        match self.try_send(payload).await {
            Ok(sent) => tracing::debug!("Dispatched {} bytes to {}", sent, self.target),
            Err(e) => warn!(
                "Dropping submission: send to {} failed: {} (payload: {})",
                self.target,
                e,
                String::from_utf8_lossy(payload)
            ),
        }
    }

    async fn try_send(&self, payload: &[u8]) -> io::Result<usize> {
        let local: SocketAddr = if self.target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.send_to(payload, self.target).await
    }
}
