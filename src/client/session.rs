//! TCP session against a cluster configuration endpoint
//!
//! A session owns exactly one socket. Dropping it shuts the socket down,
//! so every exit path of a resolution releases the connection.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::context::{GuardedStream, ResolveContext};
use crate::utils::TransportError;

/// Request line asking the endpoint for its current cluster config
pub const CONFIG_GET_CLUSTER: &[u8] = b"config get cluster\n";

/// Smallest per-address share of the dial timeout
const MIN_DIAL_ATTEMPT: Duration = Duration::from_secs(2);

/// Open connection to a configuration endpoint
pub struct ConfigSession {
    writer: BufWriter<TcpStream>,
    reader: BufReader<GuardedStream>,
    peer: SocketAddr,
}

impl ConfigSession {
    /// Connect to `address` (`host:port`) within `dial_timeout`
    ///
    /// The dial timeout covers the whole dial: the hostname lookup and every
    /// connect attempt. Resolved addresses are tried in order, each attempt
    /// getting a share of the time left, and the context's deadline bounds
    /// all of it.
    pub fn open(
        address: &str,
        dial_timeout: Duration,
        ctx: &ResolveContext,
    ) -> Result<Self, TransportError> {
        ctx.check()?;
        let dial_deadline = Instant::now() + dial_timeout;

        let addrs = lookup(address, dial_deadline, ctx)?;
        if addrs.is_empty() {
            return Err(TransportError::NoAddresses(address.to_string()));
        }

        let (stream, peer) = dial_any(address, &addrs, dial_deadline, ctx)?;
        Self::from_stream(stream, peer, ctx)
    }

    fn from_stream(
        stream: TcpStream,
        peer: SocketAddr,
        ctx: &ResolveContext,
    ) -> Result<Self, TransportError> {
        let connect_err = |e: io::Error| TransportError::Connect {
            address: peer.to_string(),
            source: e,
        };

        stream.set_nodelay(true).ok();
        // Zero is rejected by set_write_timeout; an expired context is
        // caught before the request is written.
        let write_timeout = ctx.remaining().map(|d| d.max(Duration::from_millis(1)));
        stream.set_write_timeout(write_timeout).map_err(connect_err)?;

        let writer = BufWriter::new(stream.try_clone().map_err(connect_err)?);
        let reader = BufReader::new(GuardedStream::new(stream, ctx.clone()));

        Ok(Self {
            writer,
            reader,
            peer,
        })
    }

    /// Address the session is connected to
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Write and flush the `config get cluster` request
    pub fn send_request(&mut self) -> Result<(), TransportError> {
        trace!("Sending config request to {}", self.peer);
        self.writer
            .write_all(CONFIG_GET_CLUSTER)
            .map_err(TransportError::Write)?;
        self.writer.flush().map_err(TransportError::Write)
    }

    /// Buffered reader over the response
    pub fn reader(&mut self) -> &mut impl BufRead {
        &mut self.reader
    }
}

impl Drop for ConfigSession {
    fn drop(&mut self) {
        trace!("Closing session to {}", self.peer);
        // Closes both handles of the cloned socket at once
        self.reader.get_ref().get_ref().shutdown(Shutdown::Both).ok();
    }
}

/// Resolve `address` before `dial_deadline`
///
/// Literal socket addresses skip the resolver. Hostnames are looked up on a
/// helper thread since `ToSocketAddrs` has no timeout of its own; a lookup
/// that outlives the deadline is abandoned and its thread exits when the
/// system resolver returns.
fn lookup(
    address: &str,
    dial_deadline: Instant,
    ctx: &ResolveContext,
) -> Result<Vec<SocketAddr>, TransportError> {
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(vec![addr]);
    }

    let resolve_err = |e: io::Error| TransportError::Resolve {
        address: address.to_string(),
        source: e,
    };

    let (tx, rx) = mpsc::channel();
    let host = address.to_string();
    thread::Builder::new()
        .name("dns-lookup".to_string())
        .spawn(move || {
            let result = host.to_socket_addrs().map(|addrs| addrs.collect::<Vec<_>>());
            // The caller may have given up already
            let _ = tx.send(result);
        })
        .map_err(resolve_err)?;

    let limit = ctx.clamp(dial_deadline.saturating_duration_since(Instant::now()));
    match rx.recv_timeout(limit) {
        Ok(result) => result.map_err(resolve_err),
        Err(RecvTimeoutError::Timeout) => {
            ctx.check()?;
            Err(resolve_err(io::Error::new(
                io::ErrorKind::TimedOut,
                "hostname lookup exceeded the dial timeout",
            )))
        }
        Err(RecvTimeoutError::Disconnected) => Err(resolve_err(io::Error::new(
            io::ErrorKind::Other,
            "hostname lookup thread exited without a result",
        ))),
    }
}

/// Connect to the first reachable address in `addrs` before `dial_deadline`
///
/// Each attempt gets an even share of the time left, and at least
/// [`MIN_DIAL_ATTEMPT`] when that much remains.
fn dial_any(
    address: &str,
    addrs: &[SocketAddr],
    dial_deadline: Instant,
    ctx: &ResolveContext,
) -> Result<(TcpStream, SocketAddr), TransportError> {
    let mut last_err = None;
    for (i, addr) in addrs.iter().enumerate() {
        ctx.check()?;
        let left = ctx.clamp(dial_deadline.saturating_duration_since(Instant::now()));
        if left.is_zero() {
            break;
        }
        let share = left / (addrs.len() - i) as u32;
        let timeout = share.max(MIN_DIAL_ATTEMPT.min(left));

        debug!("Dialing {} ({}) with timeout {:?}", address, addr, timeout);
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => return Ok((stream, *addr)),
            Err(e) => {
                debug!("Dial to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    // Out of time before any attempt completed
    ctx.check()?;

    Err(TransportError::Connect {
        address: address.to_string(),
        source: last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::TimedOut, "dial timeout elapsed")
        }),
    })
}
