// ============================================
// File: crates/wormhole-relay/src/server.rs
// ============================================
//! # Relay Server Orchestrator
//!
//! ## Creation Reason
//! Owns one relay instance: its transports, workers, shared services and
//! lifecycle.
//!
//! ## Main Functionality
//! - `RelayServer`: start / stop / run, stats and bound addresses
//! - `RelayPhase`: Stopped → Starting → Listening → Stopping → Stopped
//! - One receive loop per transport, one task per inbound packet
//! - Periodic sweep: peer eviction and bandwidth figure
//!
//! ## Server Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RelayServer                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌────────────┐  ┌────────────┐  ┌──────────────┐          │
//! │  │ UDP Task   │  │ TCP Task   │  │ Sweep Task   │          │
//! │  │ recv_from  │  │ accept     │  │ evict peers  │          │
//! │  └─────┬──────┘  └─────┬──────┘  │ bandwidth    │          │
//! │        │ spawn         │ spawn   └──────────────┘          │
//! │        ▼               ▼                                    │
//! │  ┌─────────────────────────────────────────────┐           │
//! │  │        PacketHandler (one task/packet)      │           │
//! │  └─────────────────────────────────────────────┘           │
//! │                                                             │
//! │  RelayState · PeerTable · BandwidthLimiter (Arc-shared)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A bind failure disables ONE transport; start fails only if both fail
//! - Stop abandons in-flight packets; there is no drain
//! - Counters, peers and the bandwidth window reset on every start
//! - Multiple instances can coexist in one process
//!
//! ## Last Modified
//! v0.1.0 - Initial relay server

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

use wormhole_core::protocol::{target_key, MAX_PACKET_SIZE};
use wormhole_transport::{
    read_chunk, PacketSource, TcpTransport, Transport, TransportError, UdpTransport,
};

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::handlers::PacketHandler;
use crate::services::{
    AccessPolicy, BandwidthLimiter, DropReason, Forwarder, PeerTable, TransportKind, RelayState,
    RelayStats,
};

/// Time allowed for each worker to exit on stop.
const TASK_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Receive buffer: one byte more than the largest valid packet.
const RECV_BUFFER_SIZE: usize = MAX_PACKET_SIZE + 1;

// ============================================
// RelayPhase
// ============================================

/// Lifecycle phase of a relay instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayPhase {
    /// Not running.
    Stopped,
    /// Binding transports.
    Starting,
    /// Serving packets.
    Listening,
    /// Tearing down.
    Stopping,
}

impl fmt::Display for RelayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Listening => "listening",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Endpoints {
    udp: Option<SocketAddr>,
    tcp: Option<SocketAddr>,
}

struct Running {
    udp: Option<Arc<UdpTransport>>,
    tcp: Option<Arc<TcpTransport>>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

// ============================================
// RelayServer
// ============================================

/// A wormhole relay instance.
///
/// # Lifecycle
/// 1. Create with `RelayServer::new(config)`
/// 2. `start().await` binds and spawns workers
/// 3. `stop().await` tears down; `start` may be called again
///
/// `run().await` does all three, stopping on Ctrl+C or [`shutdown`](Self::shutdown).
/// `shutdown` also stops a relay driven by `start` directly.
pub struct RelayServer {
    config: RelayConfig,
    handler: Arc<PacketHandler>,
    state: Arc<RelayState>,
    peers: Arc<PeerTable>,
    limiter: Arc<BandwidthLimiter>,
    phase: RwLock<RelayPhase>,
    endpoints: RwLock<Endpoints>,
    shutdown: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    stop_tx: broadcast::Sender<()>,
    running: Mutex<Option<Running>>,
}

impl RelayServer {
    /// Creates a stopped relay from validated configuration.
    ///
    /// # Errors
    /// `ConfigInvalid` if the configuration does not validate, `Core` if
    /// the target key cannot be derived.
    pub fn new(config: RelayConfig) -> Result<Self> {
        config.validate()?;

        let target_key = config.target_key.seed.map(target_key).transpose()?;

        let state = Arc::new(RelayState::new());
        let peers = Arc::new(PeerTable::new(config.limits.peer_idle_timeout()));
        let limiter = Arc::new(BandwidthLimiter::new(config.limits.max_bandwidth_kbps));
        let policy = AccessPolicy::new(
            config.policy.allowed_cidrs.clone(),
            config.policy.blocked_cidrs.clone(),
        );

        let handler = Arc::new(PacketHandler::new(
            policy,
            Arc::clone(&limiter),
            Arc::clone(&peers),
            Arc::clone(&state),
            Forwarder::new(config.limits.forward_timeout()),
            target_key,
        ));

        let (shutdown_tx, _) = broadcast::channel(1);
        let (stop_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            handler,
            state,
            peers,
            limiter,
            phase: RwLock::new(RelayPhase::Stopped),
            endpoints: RwLock::new(Endpoints::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            stop_tx,
            running: Mutex::new(None),
        })
    }

    /// Binds both transports and spawns the workers.
    ///
    /// # Errors
    /// `AlreadyRunning` if started twice, `StartupFailed` if neither
    /// transport could bind.
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(RelayError::AlreadyRunning);
        }

        self.set_phase(RelayPhase::Starting);
        info!("Starting wormhole relay v{}", env!("CARGO_PKG_VERSION"));

        self.shutdown.store(false, Ordering::SeqCst);
        self.state.reset();
        self.peers.clear();
        self.limiter.reset();

        let udp = match UdpTransport::bind_addr(self.config.udp_addr()).await {
            Ok(transport) => Some(Arc::new(transport)),
            Err(e) => {
                error!(addr = %self.config.udp_addr(), error = %e, "UDP transport unavailable");
                None
            }
        };

        let tcp = match TcpTransport::bind_addr(self.config.tcp_addr()).await {
            Ok(transport) => Some(Arc::new(transport)),
            Err(e) => {
                error!(addr = %self.config.tcp_addr(), error = %e, "TCP transport unavailable");
                None
            }
        };

        if udp.is_none() && tcp.is_none() {
            self.set_phase(RelayPhase::Stopped);
            return Err(RelayError::startup_failed("no transport could bind"));
        }

        let mut tasks = Vec::new();
        let mut endpoints = Endpoints::default();

        if let Some(udp) = &udp {
            endpoints.udp = udp.local_addr().ok();
            tasks.push(("udp", self.spawn_udp_task(Arc::clone(udp))));
        }
        if let Some(tcp) = &tcp {
            endpoints.tcp = Some(tcp.local_addr());
            tasks.push(("tcp", self.spawn_tcp_task(Arc::clone(tcp))));
        }
        tasks.push(("sweep", self.spawn_sweep_task()));

        *self.endpoints.write() = endpoints;
        *running = Some(Running { udp, tcp, tasks });
        self.set_phase(RelayPhase::Listening);

        info!(
            udp = ?endpoints.udp,
            tcp = ?endpoints.tcp,
            max_bandwidth_kbps = self.config.limits.max_bandwidth_kbps,
            "Relay listening"
        );

        Ok(())
    }

    /// Closes both transports and waits for the workers.
    ///
    /// Does nothing if the relay is not running.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        let Some(run) = running.take() else {
            return;
        };

        self.set_phase(RelayPhase::Stopping);
        info!("Stopping wormhole relay...");

        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());

        if let Some(udp) = &run.udp {
            if let Err(e) = udp.shutdown().await {
                warn!("UDP shutdown error: {}", e);
            }
        }
        if let Some(tcp) = &run.tcp {
            tcp.shutdown();
        }

        for (name, mut task) in run.tasks {
            match tokio::time::timeout(TASK_STOP_TIMEOUT, &mut task).await {
                Ok(Ok(())) => debug!("Task '{}' completed", name),
                Ok(Err(e)) => warn!("Task '{}' failed: {}", name, e),
                Err(_) => {
                    warn!("Task '{}' timed out during shutdown", name);
                    task.abort();
                }
            }
        }

        *self.endpoints.write() = Endpoints::default();
        self.set_phase(RelayPhase::Stopped);

        info!(stats = %self.stats(), "Relay stopped");
    }

    /// Starts, waits for Ctrl+C or [`shutdown`](Self::shutdown), then stops.
    ///
    /// # Errors
    /// Propagates [`start`](Self::start) errors.
    pub async fn run(&self) -> Result<()> {
        let mut stop_rx = self.stop_tx.subscribe();
        self.start().await?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Received shutdown signal"),
                    Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
                }
            }
            _ = stop_rx.recv() => {
                info!("Shutdown requested");
            }
        }

        self.stop().await;
        Ok(())
    }

    /// Stops the relay and wakes a pending [`run`](Self::run).
    ///
    /// Returns once the relay is `Stopped`.
    pub async fn shutdown(&self) {
        let _ = self.stop_tx.send(());
        self.stop().await;
    }

    // ========================================
    // Observers
    // ========================================

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> RelayPhase {
        *self.phase.read()
    }

    /// Snapshot of the relay counters.
    #[must_use]
    pub fn stats(&self) -> RelayStats {
        self.state.snapshot(self.peers.len())
    }

    /// Bound UDP address, if the UDP transport is up.
    #[must_use]
    pub fn udp_addr(&self) -> Option<SocketAddr> {
        self.endpoints.read().udp
    }

    /// Bound TCP address, if the TCP transport is up.
    #[must_use]
    pub fn tcp_addr(&self) -> Option<SocketAddr> {
        self.endpoints.read().tcp
    }

    /// Peer table.
    #[must_use]
    pub fn peers(&self) -> &PeerTable {
        &self.peers
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &RelayConfig {
        &self.config
    }

    fn set_phase(&self, phase: RelayPhase) {
        let previous = std::mem::replace(&mut *self.phase.write(), phase);
        if previous != phase {
            debug!(from = %previous, to = %phase, "Relay phase changed");
        }
    }

    // ========================================
    // Workers
    // ========================================

    /// Spawns the UDP receive loop.
    fn spawn_udp_task(&self, udp: Arc<UdpTransport>) -> JoinHandle<()> {
        let handler = Arc::clone(&self.handler);
        let shutdown = Arc::clone(&self.shutdown);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut buf = vec![0u8; RECV_BUFFER_SIZE];

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("UDP task received shutdown signal");
                        break;
                    }
                    result = udp.recv(&mut buf) => {
                        match result {
                            Ok((len, source)) => {
                                if shutdown.load(Ordering::SeqCst) {
                                    break;
                                }

                                let data = Bytes::copy_from_slice(&buf[..len]);
                                let handler = Arc::clone(&handler);
                                let udp = Arc::clone(&udp);

                                tokio::spawn(async move {
                                    let Some(response) = handler
                                        .handle(data, source, TransportKind::Udp)
                                        .await
                                    else {
                                        return;
                                    };
                                    if let Err(e) = udp.send(&response, &source.addr).await {
                                        debug!(peer = %source.addr, error = %e, "Failed to send response");
                                    }
                                });
                            }
                            Err(e) => {
                                if shutdown.load(Ordering::SeqCst) {
                                    break;
                                }
                                warn!(error = %e, "UDP receive error");
                            }
                        }
                    }
                }
            }

            debug!("UDP task exiting");
        })
    }

    /// Spawns the TCP accept loop.
    fn spawn_tcp_task(&self, tcp: Arc<TcpTransport>) -> JoinHandle<()> {
        let handler = Arc::clone(&self.handler);
        let read_timeout = self.config.limits.forward_timeout();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("TCP task received shutdown signal");
                        break;
                    }
                    result = tcp.accept() => {
                        match result {
                            Ok((stream, source)) => {
                                let handler = Arc::clone(&handler);
                                tokio::spawn(serve_connection(stream, source, handler, read_timeout));
                            }
                            Err(TransportError::ShuttingDown) => break,
                            Err(e) => warn!(error = %e, "TCP accept error"),
                        }
                    }
                }
            }

            debug!("TCP task exiting");
        })
    }

    /// Spawns the periodic sweep.
    fn spawn_sweep_task(&self) -> JoinHandle<()> {
        let peers = Arc::clone(&self.peers);
        let limiter = Arc::clone(&self.limiter);
        let state = Arc::clone(&self.state);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let period = self.config.limits.sweep_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Sweep task received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        peers.sweep();
                        let bandwidth = limiter.current_usage();
                        state.set_bandwidth(bandwidth);
                        trace!(peers = peers.len(), bandwidth, "Sweep cycle complete");
                    }
                }
            }

            debug!("Sweep task exiting");
        })
    }
}

impl fmt::Debug for RelayServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayServer")
            .field("phase", &self.phase())
            .field("udp_addr", &self.udp_addr())
            .field("tcp_addr", &self.tcp_addr())
            .finish_non_exhaustive()
    }
}

/// Serves one TCP connection: one chunk in, at most one response out.
async fn serve_connection(
    mut stream: TcpStream,
    source: PacketSource,
    handler: Arc<PacketHandler>,
    read_timeout: Duration,
) {
    let peer = source.addr;
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    let len = match read_chunk(&mut stream, &mut buf, read_timeout).await {
        Ok(0) => {
            trace!(peer = %peer, "Connection closed without data");
            return;
        }
        Ok(len) => len,
        Err(e) => {
            handler.state().record_drop(DropReason::Malformed);
            debug!(peer = %peer, error = %e, "TCP read failed");
            return;
        }
    };
    buf.truncate(len);

    let Some(response) = handler.handle(Bytes::from(buf), source, TransportKind::Tcp).await else {
        return;
    };

    if let Err(e) = stream.write_all(&response).await {
        debug!(peer = %peer, error = %e, "Failed to write response");
        return;
    }
    let _ = stream.shutdown().await;
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddrV4};

    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, UdpSocket};
    use wormhole_core::protocol::{decode_packet, encode_packet, WormholeHeader};

    fn test_config() -> RelayConfig {
        let mut config = RelayConfig::default();
        config.network.bind_ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.network.udp_port = 0;
        config.network.tcp_port = 0;
        config.limits.forward_timeout_secs = 2;
        config.limits.sweep_interval_ms = 50;
        config
    }

    fn v4(addr: SocketAddr) -> SocketAddrV4 {
        match addr {
            SocketAddr::V4(v4) => v4,
            SocketAddr::V6(_) => unreachable!("loopback test sockets are IPv4"),
        }
    }

    async fn udp_echo() -> SocketAddrV4 {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = v4(socket.local_addr().unwrap());
        tokio::spawn(async move {
            let mut buf = vec![0u8; 70_000];
            while let Ok((len, from)) = socket.recv_from(&mut buf).await {
                let _ = socket.send_to(&buf[..len], from).await;
            }
        });
        addr
    }

    async fn tcp_echo() -> SocketAddrV4 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = v4(listener.local_addr().unwrap());
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    if let Ok(n) = stream.read(&mut buf).await {
                        let _ = stream.write_all(&buf[..n]).await;
                    }
                });
            }
        });
        addr
    }

    async fn udp_request(relay: SocketAddr, packet: &[u8], wait: Duration) -> Option<Bytes> {
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(packet, relay).await.unwrap();
        let mut buf = vec![0u8; 70_000];
        match tokio::time::timeout(wait, client.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => Some(Bytes::copy_from_slice(&buf[..len])),
            _ => None,
        }
    }

    async fn tcp_request(relay: SocketAddr, packet: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(relay).await.unwrap();
        stream.write_all(packet).await.unwrap();
        let mut out = Vec::new();
        tokio::time::timeout(Duration::from_secs(3), stream.read_to_end(&mut out))
            .await
            .unwrap()
            .unwrap();
        out
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..300 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    #[tokio::test]
    async fn test_udp_relay_roundtrip() {
        let dest = udp_echo().await;
        let relay = RelayServer::new(test_config()).unwrap();
        assert_eq!(relay.phase(), RelayPhase::Stopped);

        relay.start().await.unwrap();
        assert_eq!(relay.phase(), RelayPhase::Listening);

        let request = encode_packet(&WormholeHeader::new(dest), b"through").unwrap();
        let response = udp_request(relay.udp_addr().unwrap(), &request, Duration::from_secs(3))
            .await
            .unwrap();

        let packet = decode_packet(response).unwrap();
        assert!(packet.header.flags.is_response());
        assert_eq!(&packet.payload[..], b"through");

        let stats = relay.stats();
        assert_eq!(stats.packets_relayed, 1);
        assert_eq!(stats.bytes_relayed, 14);
        assert_eq!(stats.active_peers, 1);

        relay.stop().await;
        assert_eq!(relay.phase(), RelayPhase::Stopped);
        assert!(relay.udp_addr().is_none());
    }

    #[tokio::test]
    async fn test_tcp_relay_roundtrip() {
        let dest = tcp_echo().await;
        let relay = RelayServer::new(test_config()).unwrap();
        relay.start().await.unwrap();

        let request = encode_packet(&WormholeHeader::new(dest), b"stream").unwrap();
        let response = tcp_request(relay.tcp_addr().unwrap(), &request).await;

        let packet = decode_packet(Bytes::from(response)).unwrap();
        assert!(packet.header.flags.is_response());
        assert_eq!(&packet.payload[..], b"stream");
        assert_eq!(relay.stats().packets_relayed, 1);

        relay.stop().await;
    }

    #[tokio::test]
    async fn test_blocked_destination_dropped_exactly_once() {
        let dest = udp_echo().await;
        let mut config = test_config();
        config.policy.blocked_cidrs = vec!["127.0.0.0/8".parse().unwrap()];
        config.policy.allowed_cidrs = vec!["203.0.113.0/24".parse().unwrap()];

        let relay = RelayServer::new(config).unwrap();
        relay.start().await.unwrap();

        let request = encode_packet(&WormholeHeader::new(dest), b"nope").unwrap();
        let response = udp_request(relay.udp_addr().unwrap(), &request, Duration::from_millis(300)).await;
        assert!(response.is_none());

        assert!(wait_until(|| relay.stats().dropped_packets == 1).await);
        let stats = relay.stats();
        assert_eq!(stats.dropped_packets, 1);
        assert_eq!(stats.dropped_policy, 1);
        assert_eq!(stats.packets_relayed, 0);

        relay.stop().await;
    }

    #[tokio::test]
    async fn test_rate_limit_drops_excess() {
        let dest = udp_echo().await;
        let mut config = test_config();
        config.limits.max_bandwidth_kbps = 8;

        let relay = RelayServer::new(config).unwrap();
        relay.start().await.unwrap();
        let relay_addr = relay.udp_addr().unwrap();

        let fits = encode_packet(&WormholeHeader::new(dest), &[7u8; 1008]).unwrap();
        assert!(udp_request(relay_addr, &fits, Duration::from_secs(3)).await.is_some());

        let over = encode_packet(&WormholeHeader::new(dest), b"1").unwrap();
        assert!(udp_request(relay_addr, &over, Duration::from_millis(300)).await.is_none());

        assert!(wait_until(|| relay.stats().dropped_rate_limited == 1).await);
        relay.stop().await;
    }

    #[tokio::test]
    async fn test_malformed_datagram_counted() {
        let relay = RelayServer::new(test_config()).unwrap();
        relay.start().await.unwrap();

        let response = udp_request(relay.udp_addr().unwrap(), b"not a wormhole", Duration::from_millis(200)).await;
        assert!(response.is_none());
        assert!(wait_until(|| relay.stats().dropped_malformed == 1).await);

        relay.stop().await;
    }

    #[tokio::test]
    async fn test_udp_bind_failure_keeps_tcp() {
        let holder = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut config = test_config();
        config.network.udp_port = holder.local_addr().unwrap().port();

        let relay = RelayServer::new(config).unwrap();
        relay.start().await.unwrap();
        assert!(relay.udp_addr().is_none());
        assert!(relay.tcp_addr().is_some());
        assert_eq!(relay.phase(), RelayPhase::Listening);

        let dest = tcp_echo().await;
        let request = encode_packet(&WormholeHeader::new(dest), b"still up").unwrap();
        let response = tcp_request(relay.tcp_addr().unwrap(), &request).await;
        assert_eq!(&decode_packet(Bytes::from(response)).unwrap().payload[..], b"still up");

        relay.stop().await;
    }

    #[tokio::test]
    async fn test_both_binds_fail() {
        let udp_holder = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let tcp_holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = test_config();
        config.network.udp_port = udp_holder.local_addr().unwrap().port();
        config.network.tcp_port = tcp_holder.local_addr().unwrap().port();

        let relay = RelayServer::new(config).unwrap();
        let err = relay.start().await.unwrap_err();
        assert!(matches!(err, RelayError::StartupFailed { .. }));
        assert!(err.is_fatal());
        assert_eq!(relay.phase(), RelayPhase::Stopped);
    }

    #[tokio::test]
    async fn test_idle_peer_evicted_by_sweep() {
        let dest = udp_echo().await;
        let mut config = test_config();
        config.limits.peer_idle_timeout_secs = 1;

        let relay = RelayServer::new(config).unwrap();
        relay.start().await.unwrap();

        let request = encode_packet(&WormholeHeader::new(dest), b"hi").unwrap();
        assert!(udp_request(relay.udp_addr().unwrap(), &request, Duration::from_secs(3))
            .await
            .is_some());
        assert_eq!(relay.stats().active_peers, 1);

        assert!(wait_until(|| relay.stats().active_peers == 0).await);
        relay.stop().await;
    }

    #[tokio::test]
    async fn test_start_twice_and_restart() {
        let relay = RelayServer::new(test_config()).unwrap();
        relay.start().await.unwrap();
        assert!(matches!(relay.start().await, Err(RelayError::AlreadyRunning)));

        let _ = udp_request(relay.udp_addr().unwrap(), b"junk", Duration::from_millis(100)).await;
        assert!(wait_until(|| relay.stats().dropped_packets == 1).await);

        relay.stop().await;
        relay.stop().await;

        relay.start().await.unwrap();
        assert_eq!(relay.stats().dropped_packets, 0);
        assert!(relay.udp_addr().is_some());
        relay.stop().await;
    }

    #[tokio::test]
    async fn test_instances_are_independent() {
        let a = RelayServer::new(test_config()).unwrap();
        let b = RelayServer::new(test_config()).unwrap();
        a.start().await.unwrap();
        b.start().await.unwrap();

        let _ = udp_request(a.udp_addr().unwrap(), b"junk", Duration::from_millis(100)).await;
        assert!(wait_until(|| a.stats().dropped_packets == 1).await);
        assert_eq!(b.stats().dropped_packets, 0);

        a.stop().await;
        b.stop().await;
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let relay = Arc::new(RelayServer::new(test_config()).unwrap());
        let runner = {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move { relay.run().await })
        };

        assert!(wait_until(|| relay.phase() == RelayPhase::Listening).await);
        relay.shutdown().await;
        assert_eq!(relay.phase(), RelayPhase::Stopped);

        tokio::time::timeout(Duration::from_secs(5), runner)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(relay.phase(), RelayPhase::Stopped);
    }

    #[tokio::test]
    async fn test_shutdown_without_run_stops_workers() {
        let relay = RelayServer::new(test_config()).unwrap();
        relay.start().await.unwrap();
        let udp = relay.udp_addr().unwrap();

        relay.shutdown().await;
        assert_eq!(relay.phase(), RelayPhase::Stopped);
        assert!(relay.udp_addr().is_none());
        assert!(relay.tcp_addr().is_none());

        let _ = udp_request(udp, b"junk", Duration::from_millis(100)).await;
        assert_eq!(relay.stats().dropped_packets, 0);

        relay.start().await.unwrap();
        assert_eq!(relay.phase(), RelayPhase::Listening);
        relay.shutdown().await;
    }

    #[tokio::test]
    async fn test_second_relay_cannot_share_udp_port() {
        let first = RelayServer::new(test_config()).unwrap();
        first.start().await.unwrap();

        let mut config = test_config();
        config.network.udp_port = first.udp_addr().unwrap().port();
        let second = RelayServer::new(config).unwrap();
        second.start().await.unwrap();

        assert!(second.udp_addr().is_none());
        assert!(second.tcp_addr().is_some());
        assert_eq!(second.phase(), RelayPhase::Listening);

        second.stop().await;
        first.stop().await;
    }
}
