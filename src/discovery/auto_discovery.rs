//! Auto discovery through a cluster configuration endpoint

use std::time::Duration;

use tracing::{debug, warn};

use super::resolver::Resolver;
use crate::client::{ConfigSession, ResolveContext};
use crate::cluster::{parse_config, ClusterTopology};
use crate::config::ResolverConfig;
use crate::utils::Result;

/// Resolver speaking `config get cluster` to a configuration endpoint
#[derive(Debug, Clone, Default)]
pub struct AutoDiscovery {
    config: ResolverConfig,
}

impl AutoDiscovery {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn with_dial_timeout(dial_timeout: Duration) -> Self {
        Self::new(ResolverConfig::with_dial_timeout(dial_timeout))
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn resolve_once(&self, ctx: &ResolveContext, address: &str) -> Result<ClusterTopology> {
        let mut session = ConfigSession::open(address, self.config.dial_timeout, ctx)?;
        debug!("Connected to configuration endpoint {}", session.peer_addr());

        session.send_request()?;
        parse_config(session.reader())
        // session drops here and closes the socket
    }
}

impl Resolver for AutoDiscovery {
    fn resolve(&self, ctx: &ResolveContext, address: &str) -> Result<ClusterTopology> {
        match self.resolve_once(ctx, address) {
            Ok(topology) => {
                debug!(
                    "Resolved {} to config version {} ({} node(s))",
                    address,
                    topology.version,
                    topology.len()
                );
                Ok(topology)
            }
            Err(e) => {
                warn!("Cluster discovery via {} failed ({}): {}", address, e.kind(), e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CancelHandle;
    use crate::utils::{
        ContextError, DiscoveryError, FramingError, NodeFormatError, ResponseLine,
        TransportError,
    };
    use std::io::{BufRead, BufReader, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::thread::{self, JoinHandle};
    use std::time::Instant;

    /// Fake configuration endpoint serving one connection
    ///
    /// Returns the request line it received. When `reply` is `None` the
    /// server holds the connection open without answering until the client
    /// goes away.
    fn serve_once(reply: Option<&'static [u8]>) -> (SocketAddr, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(socket.try_clone().unwrap());
            let mut request = String::new();
            reader.read_line(&mut request).unwrap();

            match reply {
                Some(bytes) => {
                    let mut writer = socket;
                    writer.write_all(bytes).unwrap();
                    writer.flush().unwrap();
                }
                None => {
                    // Blocks until the client closes its end
                    let mut rest = String::new();
                    let _ = reader.read_line(&mut rest);
                }
            }
            request
        });

        (addr, handle)
    }

    fn resolver() -> AutoDiscovery {
        AutoDiscovery::with_dial_timeout(Duration::from_secs(2))
    }

    #[test]
    fn test_resolve_topology() {
        let (addr, server) = serve_once(Some(
            b"CONFIG cluster 0 44\r\n2\nnode1|10.0.0.1|11211 node2|10.0.0.2|11211\n\r\nEND\r\n",
        ));

        let topology = resolver()
            .resolve(&ResolveContext::background(), &addr.to_string())
            .unwrap();

        assert_eq!(topology.version, 2);
        assert_eq!(topology.addresses(), vec!["10.0.0.1:11211", "10.0.0.2:11211"]);
        assert_eq!(server.join().unwrap(), "config get cluster\n");
    }

    #[test]
    fn test_resolve_size_mismatch() {
        let (addr, server) = serve_once(Some(
            b"CONFIG cluster 0 50\n2\nnode1|10.0.0.1|11211 node2|10.0.0.2|11211\n",
        ));

        let err = resolver()
            .resolve(&ResolveContext::background(), &addr.to_string())
            .unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::Consistency {
                expected: 50,
                actual: 44
            }
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_resolve_malformed_node() {
        let (addr, server) = serve_once(Some(b"CONFIG cluster 0 23\n2\nnode3-10.0.0.3-11211\n"));

        let err = resolver()
            .resolve(&ResolveContext::background(), &addr.to_string())
            .unwrap_err();
        match err {
            DiscoveryError::NodeFormat(NodeFormatError::FieldCount { entry, .. }) => {
                assert_eq!(entry, "node3-10.0.0.3-11211")
            }
            other => panic!("unexpected: {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_resolve_peer_closes_without_reply() {
        let (addr, server) = serve_once(Some(b""));

        let err = resolver()
            .resolve(&ResolveContext::background(), &addr.to_string())
            .unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::Framing(FramingError::Unreadable {
                line: ResponseLine::Header
            })
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_resolve_nothing_listening() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let started = Instant::now();
        let err = AutoDiscovery::with_dial_timeout(Duration::from_millis(500))
            .resolve(&ResolveContext::background(), &addr.to_string())
            .unwrap_err();

        assert!(matches!(
            err,
            DiscoveryError::Transport(TransportError::Connect { .. })
        ));
        assert!(err.is_transient());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_resolve_deadline_while_reading() {
        let (addr, server) = serve_once(None);

        let started = Instant::now();
        let ctx = ResolveContext::with_timeout(Duration::from_millis(200));
        let err = resolver().resolve(&ctx, &addr.to_string()).unwrap_err();

        assert!(matches!(
            err,
            DiscoveryError::Transport(TransportError::Context(ContextError::DeadlineExceeded))
        ));
        assert!(started.elapsed() < Duration::from_secs(2));
        // The server only returns once the resolver has closed the socket
        server.join().unwrap();
    }

    #[test]
    fn test_resolve_cancelled_while_reading() {
        let (addr, server) = serve_once(None);

        let handle = CancelHandle::new();
        let ctx = ResolveContext::background().cancelled_by(handle.clone());
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            handle.cancel();
        });

        let err = resolver().resolve(&ctx, &addr.to_string()).unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::Transport(TransportError::Context(ContextError::Cancelled))
        ));

        canceller.join().unwrap();
        server.join().unwrap();
    }

    #[test]
    fn test_resolver_as_trait_object() {
        let (addr, server) = serve_once(Some(b"CONFIG cluster 0 23\n7\nnode1|10.0.0.1|11211\n"));

        let boxed: Box<dyn Resolver> = Box::new(resolver());
        let topology = boxed
            .resolve(&ResolveContext::background(), &addr.to_string())
            .unwrap();
        assert_eq!(topology.version, 7);
        assert_eq!(topology.len(), 1);
        server.join().unwrap();
    }

    #[test]
    fn test_resolver_by_reference() {
        fn resolve_with<R: Resolver>(resolver: R, address: &str) -> Result<ClusterTopology> {
            resolver.resolve(&ResolveContext::background(), address)
        }

        let (addr, server) = serve_once(Some(b"CONFIG cluster 0 23\n3\nnode1|10.0.0.1|11211\n"));

        let resolver = resolver();
        let topology = resolve_with(&resolver, &addr.to_string()).unwrap();
        assert_eq!(topology.version, 3);
        assert_eq!(topology.addresses(), vec!["10.0.0.1:11211"]);
        // Still usable after being lent out
        assert_eq!(resolver.config().dial_timeout, Duration::from_secs(2));
        server.join().unwrap();
    }

    #[test]
    fn test_resolve_oversized_payload() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            socket.write_all(b"CONFIG cluster 0 23\n").unwrap();
            // Keeps streaming until the resolver hangs up
            let chunk = [b'7'; 4096];
            let mut sent = 0usize;
            while socket.write_all(&chunk).is_ok() {
                sent += chunk.len();
            }
            sent
        });

        let err = resolver()
            .resolve(&ResolveContext::background(), &addr.to_string())
            .unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::Consistency {
                expected: 23,
                actual: 24
            }
        ));
        server.join().unwrap();
    }
}
