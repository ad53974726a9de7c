//! # Datagram Transport
//!
//! Connectionless, lossy, unordered. Sends are fire-and-forget and receives
//! never block: [`Transport::try_recv`] returns `Ok(None)` when nothing is
//! queued.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to configure socket on {addr}: {source}")]
    Configure {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Message channel used by a peer session.
pub trait Transport {
    /// Send one datagram to `dest`. Delivery is not guaranteed.
    fn send_to(&mut self, payload: &[u8], dest: SocketAddr) -> io::Result<usize>;

    /// Receive one queued datagram into `buf`.
    ///
    /// Returns `Ok(None)` when no datagram is pending. Datagrams longer than
    /// `buf` are truncated.
    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

/// UDP socket bound once in non-blocking mode.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        socket
            .set_nonblocking(true)
            .map_err(|source| TransportError::Configure { addr, source })?;
        Ok(UdpTransport { socket })
    }
}

impl Transport for UdpTransport {
    fn send_to(&mut self, payload: &[u8], dest: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(payload, dest)
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        match self.socket.recv_from(buf) {
            Ok((len, from)) => Ok(Some((len, from))),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
