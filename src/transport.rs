//! src/transport.rs
//!
//! The UDP collaborator (spec.md §6 "Transport"): binds a broadcast-
//! capable datagram socket, sends encoded frames to either the
//! broadcast address or an explicit peer list, and hands inbound
//! datagrams back to the Receive Path. The socket layer itself is
//! explicitly out of scope for the forwarding core (spec.md §1); this
//! module is the thin collaborator the core is specified against.
//!
//! Grounded on `examples/osotsia-gossip-network/src/transport/mod.rs`'s
//! `socket2::Socket` setup (reuse-address, bind, hand off to the async
//! runtime), adapted from QUIC/TLS to plain UDP.

use crate::error::{Error, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;

/// Platform datagram ceiling (spec.md §5 "Resource bounds").
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Where outbound frames go: the network broadcast address, or an
/// explicit list of peer addresses (spec.md §6).
enum Destinations {
    Broadcast(SocketAddr),
    Peers(Vec<SocketAddr>),
}

/// The UDP send/receive collaborator.
pub struct Transport {
    socket: UdpSocket,
    destinations: Destinations,
}

impl Transport {
    /// Binds `0.0.0.0:<port>` with `SO_REUSEADDR` and `SO_BROADCAST` set.
    /// A bind failure here is a configuration failure (spec.md §7: fatal,
    /// surfaced to the process exit status).
    pub fn bind(port: u16, peers: Vec<SocketAddr>) -> Result<Self> {
        let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);

        let socket = Socket::new(Domain::for_address(bind_addr), Type::DGRAM, Some(Protocol::UDP))
            .map_err(|err| Error::SocketBind(bind_addr, err))?;
        socket.set_reuse_address(true).map_err(|err| Error::SocketBind(bind_addr, err))?;
        socket.set_broadcast(true).map_err(|err| Error::SocketBind(bind_addr, err))?;
        socket.bind(&bind_addr.into()).map_err(|err| Error::SocketBind(bind_addr, err))?;

        let std_socket: std::net::UdpSocket = socket.into();
        std_socket.set_nonblocking(true).map_err(|err| Error::SocketBind(bind_addr, err))?;
        let socket = UdpSocket::from_std(std_socket).map_err(|err| Error::SocketBind(bind_addr, err))?;

        let destinations = if peers.is_empty() {
            Destinations::Broadcast(SocketAddr::new(
                IpAddr::V4(Ipv4Addr::BROADCAST),
                port,
            ))
        } else {
            Destinations::Peers(peers)
        };

        Ok(Self { socket, destinations })
    }

    /// Sends `bytes` to every configured destination (spec.md §4.4 step
    /// 4). A send failure is transient I/O (spec.md §7): logged by the
    /// caller, round cadence unaffected.
    pub async fn broadcast(&self, bytes: &[u8]) -> std::io::Result<()> {
        match &self.destinations {
            Destinations::Broadcast(addr) => {
                self.socket.send_to(bytes, addr).await?;
            }
            Destinations::Peers(peers) => {
                for peer in peers {
                    self.socket.send_to(bytes, peer).await?;
                }
            }
        }
        Ok(())
    }

    /// Blocks until one datagram arrives, returning it and its sender.
    pub async fn recv(&self, buf: &mut [u8]) -> std::io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }
}

/// Derives the self `NodeId` source address: the first non-loopback
/// IPv4 address of an interface that can route to the public internet,
/// found by the conventional "connect a UDP socket, read back the
/// local address" trick (no route is actually established — UDP
/// `connect` only selects the outbound interface). Used when the
/// `Hostname` override (spec.md §6) is absent.
pub fn detect_local_ipv4() -> Result<Ipv4Addr> {
    let probe = std::net::UdpSocket::bind("0.0.0.0:0").map_err(Error::Io)?;
    probe.connect("8.8.8.8:80").map_err(Error::Io)?;
    match probe.local_addr().map_err(Error::Io)?.ip() {
        IpAddr::V4(addr) if !addr.is_loopback() => Ok(addr),
        _ => Err(Error::NoUsableAddress),
    }
}
