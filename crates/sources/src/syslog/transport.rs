//! Listening sockets
//!
//! One stream listener or one datagram socket per receiver, chosen by scheme
//! at startup. Filesystem sockets remove their path when dropped.

use std::io;
use std::net::SocketAddr;
#[cfg(unix)]
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
#[cfg(unix)]
use tokio::net::{UnixDatagram, UnixListener, UnixStream};

use super::address::{Address, Endpoint, IpVersion, Scheme};

/// Listen backlog for seqpacket sockets
#[cfg(unix)]
const SEQPACKET_BACKLOG: i32 = 1024;

/// Removes a socket path on drop
///
/// Always the last field of its owner so the socket closes first.
#[cfg(unix)]
#[derive(Debug)]
pub(crate) struct UnixPathGuard(PathBuf);

#[cfg(unix)]
impl Drop for UnixPathGuard {
    fn drop(&mut self) {
        // Best effort; the path may already be gone
        let _ = std::fs::remove_file(&self.0);
    }
}

#[cfg(not(unix))]
fn unsupported_platform() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "unix sockets are not supported on this platform",
    )
}

// =============================================================================
// Stream
// =============================================================================

/// Listener for stream schemes
#[derive(Debug)]
pub(crate) enum StreamListener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener, UnixPathGuard),
}

impl StreamListener {
    /// Bind the listener for a stream address
    pub(crate) async fn bind(address: &Address) -> io::Result<Self> {
        match address.endpoint() {
            Endpoint::Network { host, port } => {
                let addrs = lookup(address.scheme(), host, *port).await?;
                Ok(Self::Tcp(TcpListener::bind(&addrs[..]).await?))
            }
            #[cfg(unix)]
            Endpoint::Path(path) => {
                remove_stale(path);
                let listener = match address.scheme() {
                    Scheme::UnixPacket => bind_seqpacket(path)?,
                    _ => UnixListener::bind(path)?,
                };
                Ok(Self::Unix(listener, UnixPathGuard(path.clone())))
            }
            #[cfg(not(unix))]
            Endpoint::Path(_) => Err(unsupported_platform()),
        }
    }

    /// Bound address for network listeners
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            Self::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            Self::Unix(..) => None,
        }
    }

    /// Accept one connection and a printable peer label
    pub(crate) async fn accept(&self) -> io::Result<(StreamConn, String)> {
        match self {
            Self::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                Ok((StreamConn::Tcp(stream), peer.to_string()))
            }
            #[cfg(unix)]
            Self::Unix(listener, _) => {
                let (stream, peer) = listener.accept().await?;
                let peer = peer
                    .as_pathname()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "@".to_owned());
                Ok((StreamConn::Unix(stream), peer))
            }
        }
    }
}

/// SOCK_SEQPACKET listener; tokio has no constructor for one
#[cfg(unix)]
fn bind_seqpacket(path: &Path) -> io::Result<UnixListener> {
    use socket2::{Domain, SockAddr, Socket, Type};

    let socket = Socket::new(Domain::UNIX, Type::SEQPACKET, None)?;
    socket.bind(&SockAddr::unix(path)?)?;
    socket.listen(SEQPACKET_BACKLOG)?;
    socket.set_nonblocking(true)?;
    UnixListener::from_std(socket.into())
}

/// An accepted stream connection
#[derive(Debug)]
pub(crate) enum StreamConn {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl StreamConn {
    /// The TCP socket, for keep-alive
    pub(crate) fn as_tcp(&self) -> Option<&TcpStream> {
        match self {
            Self::Tcp(stream) => Some(stream),
            #[cfg(unix)]
            Self::Unix(_) => None,
        }
    }
}

impl AsyncRead for StreamConn {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for StreamConn {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Apply a keep-alive period: zero disables probes
pub(crate) fn set_keep_alive(stream: &TcpStream, period: Duration) -> io::Result<()> {
    let socket = SockRef::from(stream);
    if period.is_zero() {
        return socket.set_keepalive(false);
    }
    socket.set_tcp_keepalive(&TcpKeepalive::new().with_time(period))
}

// =============================================================================
// Datagram
// =============================================================================

/// Socket for datagram schemes
#[derive(Debug)]
pub(crate) enum DatagramSocket {
    Udp(UdpSocket),
    #[cfg(unix)]
    Unix(UnixDatagram, UnixPathGuard),
}

impl DatagramSocket {
    /// Bind the socket for a datagram address
    pub(crate) async fn bind(address: &Address) -> io::Result<Self> {
        match address.endpoint() {
            Endpoint::Network { .. }
                if matches!(address.scheme(), Scheme::Ip | Scheme::Ip4 | Scheme::Ip6) =>
            {
                Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "raw ip sockets require a protocol number",
                ))
            }
            Endpoint::Network { host, port } => {
                let addrs = lookup(address.scheme(), host, *port).await?;
                Ok(Self::Udp(UdpSocket::bind(&addrs[..]).await?))
            }
            #[cfg(unix)]
            Endpoint::Path(path) => {
                remove_stale(path);
                let socket = UnixDatagram::bind(path)?;
                Ok(Self::Unix(socket, UnixPathGuard(path.clone())))
            }
            #[cfg(not(unix))]
            Endpoint::Path(_) => Err(unsupported_platform()),
        }
    }

    /// Bound address for network sockets
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            Self::Udp(socket) => socket.local_addr().ok(),
            #[cfg(unix)]
            Self::Unix(..) => None,
        }
    }

    /// Receive one datagram and a printable sender label
    pub(crate) async fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, String)> {
        match self {
            Self::Udp(socket) => {
                let (len, peer) = socket.recv_from(buf).await?;
                Ok((len, peer.to_string()))
            }
            #[cfg(unix)]
            Self::Unix(socket, _) => {
                let (len, peer) = socket.recv_from(buf).await?;
                let peer = peer
                    .as_pathname()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "@".to_owned());
                Ok((len, peer))
            }
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Resolve a network endpoint, honoring the scheme's IP version
async fn lookup(scheme: Scheme, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    let version = scheme.ip_version();
    let host = match (host, version) {
        ("", IpVersion::V6) => "::",
        ("", _) => "0.0.0.0",
        (host, _) => host,
    };

    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await?
        .filter(|addr| match version {
            IpVersion::Any => true,
            IpVersion::V4 => addr.is_ipv4(),
            IpVersion::V6 => addr.is_ipv6(),
        })
        .collect();

    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no {scheme} address for '{host}'"),
        ));
    }
    Ok(addrs)
}

/// Remove a leftover socket file from a previous run
#[cfg(unix)]
fn remove_stale(path: &Path) {
    if std::fs::remove_file(path).is_ok() {
        tracing::debug!(path = %path.display(), "removed stale socket file");
    }
}
