//! OSC realtime sink.
//!
//! Each update becomes one OSC 1.0 message with a single float32 argument,
//! sent as a UDP datagram. Receivers such as avatar parameter drivers read
//! the latest value and need no history.

use super::{RealtimeSink, SinkError};
use crate::store::Timestamp;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::{lookup_host, UdpSocket};

/// Encodes an OSC message carrying one float argument.
pub fn encode_message(address: &str, value: f32) -> Result<Vec<u8>, SinkError> {
    if !address.starts_with('/') {
        return Err(SinkError::Encode(format!(
            "OSC address must start with '/': {address:?}"
        )));
    }
    if address.contains('\0') {
        return Err(SinkError::Encode("OSC address contains NUL".into()));
    }

    let mut packet = Vec::with_capacity(address.len() + 12);
    push_padded_str(&mut packet, address);
    push_padded_str(&mut packet, ",f");
    packet.extend_from_slice(&value.to_be_bytes());
    Ok(packet)
}

/// OSC strings are NUL-terminated and padded to a 4-byte boundary.
fn push_padded_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    let padding = 4 - (s.len() % 4);
    buf.extend(std::iter::repeat(0u8).take(padding));
}

/// Sends heart-rate values to an OSC receiver over UDP.
pub struct OscSink {
    socket: UdpSocket,
    target: SocketAddr,
    address: String,
}

impl OscSink {
    /// Resolves the receiver and binds a local socket for sending.
    pub async fn connect(host: &str, port: u16, address: &str) -> Result<Self, SinkError> {
        // Reject bad addresses at startup rather than on every send.
        encode_message(address, 0.0)?;

        let target = lookup_host((host, port)).await?.next().ok_or_else(|| {
            SinkError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no address found for {host}:{port}"),
            ))
        })?;

        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local).await?;

        tracing::info!(%target, address, "OSC sink ready");

        Ok(Self {
            socket,
            target,
            address: address.to_owned(),
        })
    }
}

#[async_trait]
impl RealtimeSink for OscSink {
    fn name(&self) -> &'static str {
        "osc"
    }

    async fn send(&self, value: f64, timestamp: Option<&Timestamp>) -> Result<(), SinkError> {
        let packet = encode_message(&self.address, value as f32)?;
        self.socket.send_to(&packet, self.target).await?;
        tracing::trace!(value, timestamp = ?timestamp, "Sent OSC heart rate");
        Ok(())
    }
}
