//! Real UDP exchange on loopback between a stand-in coordinator socket and
//! a `PeerSession` over `UdpTransport`.

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use aks_link::config::PeerConfig;
use aks_link::liveness::ConnectionState;
use aks_link::session::PeerSession;
use aks_link::transport::{Transport, UdpTransport};
use aks_link::wire::{Message, Role, AKS_HEARTBEAT};

fn any_loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

/// Coordinator socket plus a peer session pointed at it.
fn setup(config: PeerConfig) -> (UdpSocket, PeerSession<UdpTransport>) {
    let coordinator = UdpSocket::bind(any_loopback()).unwrap();
    coordinator
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();

    let config = PeerConfig {
        bind: any_loopback(),
        coordinator: coordinator.local_addr().unwrap(),
        telemetry_seed: Some(5),
        ..config
    };
    let transport = UdpTransport::bind(config.bind).unwrap();
    (coordinator, PeerSession::new(config, transport))
}

/// Tick until the session reports a heartbeat, allowing for delivery delay.
fn tick_until_heartbeat(session: &mut PeerSession<UdpTransport>) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if session.tick().heartbeats > 0 {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("heartbeat never arrived");
}

fn recv_message(coordinator: &UdpSocket) -> Message {
    let mut buf = [0u8; 1024];
    let (len, _) = coordinator.recv_from(&mut buf).expect("peer reply");
    Message::decode(&buf[..len]).unwrap()
}

#[test]
fn ans_answers_coordinator_heartbeat() {
    let (coordinator, mut session) = setup(PeerConfig::ans());
    let peer_addr = session.transport().local_addr().unwrap();

    coordinator
        .send_to(AKS_HEARTBEAT.as_bytes(), peer_addr)
        .unwrap();
    tick_until_heartbeat(&mut session);
    assert_eq!(session.state(), ConnectionState::Connected);

    assert_eq!(recv_message(&coordinator), Message::Heartbeat(Role::Ans));
    assert_eq!(
        recv_message(&coordinator).encode(),
        "PLATFORM_INFO,0.000000,0.000000,10.00"
    );
}

#[test]
fn launcher_answers_with_its_own_token() {
    let (coordinator, mut session) = setup(PeerConfig::launcher());
    let peer_addr = session.transport().local_addr().unwrap();

    coordinator
        .send_to(AKS_HEARTBEAT.as_bytes(), peer_addr)
        .unwrap();
    tick_until_heartbeat(&mut session);

    assert_eq!(recv_message(&coordinator), Message::Heartbeat(Role::Launcher));

    coordinator
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    let mut buf = [0u8; 64];
    assert!(coordinator.recv_from(&mut buf).is_err(), "launcher sent extra data");
}

#[test]
fn empty_socket_tick_does_not_block() {
    let (_coordinator, mut session) = setup(PeerConfig::ans());
    let started = Instant::now();
    for _ in 0..100 {
        session.tick();
    }
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(session.stats().datagrams_received, 0);
}

#[test]
fn shutdown_releases_port() {
    let (_coordinator, session) = setup(PeerConfig::launcher());
    let addr = session.transport().local_addr().unwrap();
    session.shutdown();
    UdpTransport::bind(addr).expect("port free after shutdown");
}
