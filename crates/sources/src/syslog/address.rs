//! Listen address resolution
//!
//! `scheme://host[:port]` for network schemes, `scheme://path` for
//! filesystem sockets. Network endpoints default to bind-all on port 6514
//! (RFC5425 section 4.1).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use sluice_protocol::DEFAULT_PORT;

/// Address resolution errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    /// Malformed address, including a missing `://`
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },

    /// Scheme is not one of the supported transports
    #[error("unknown protocol '{scheme}' in '{address}'")]
    UnsupportedScheme { scheme: String, address: String },
}

/// Transport family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Connection-oriented byte stream
    Stream,
    /// One message per read
    Datagram,
}

/// Transport scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Tcp,
    Tcp4,
    Tcp6,
    Udp,
    Udp4,
    Udp6,
    Ip,
    Ip4,
    Ip6,
    Unix,
    UnixPacket,
    UnixGram,
}

/// IP version restriction of a network scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    Any,
    V4,
    V6,
}

impl Scheme {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "tcp" => Self::Tcp,
            "tcp4" => Self::Tcp4,
            "tcp6" => Self::Tcp6,
            "udp" => Self::Udp,
            "udp4" => Self::Udp4,
            "udp6" => Self::Udp6,
            "ip" => Self::Ip,
            "ip4" => Self::Ip4,
            "ip6" => Self::Ip6,
            "unix" => Self::Unix,
            "unixpacket" => Self::UnixPacket,
            "unixgram" => Self::UnixGram,
            _ => return None,
        })
    }

    /// Scheme as written in an address
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Tcp4 => "tcp4",
            Self::Tcp6 => "tcp6",
            Self::Udp => "udp",
            Self::Udp4 => "udp4",
            Self::Udp6 => "udp6",
            Self::Ip => "ip",
            Self::Ip4 => "ip4",
            Self::Ip6 => "ip6",
            Self::Unix => "unix",
            Self::UnixPacket => "unixpacket",
            Self::UnixGram => "unixgram",
        }
    }

    /// Stream or datagram
    pub fn family(self) -> Family {
        match self {
            Self::Tcp | Self::Tcp4 | Self::Tcp6 | Self::Unix | Self::UnixPacket => Family::Stream,
            Self::Udp
            | Self::Udp4
            | Self::Udp6
            | Self::Ip
            | Self::Ip4
            | Self::Ip6
            | Self::UnixGram => Family::Datagram,
        }
    }

    /// Whether the endpoint is a filesystem path
    pub fn is_filesystem(self) -> bool {
        matches!(self, Self::Unix | Self::UnixPacket | Self::UnixGram)
    }

    /// Address family restriction for network schemes
    pub fn ip_version(self) -> IpVersion {
        match self {
            Self::Tcp4 | Self::Udp4 | Self::Ip4 => IpVersion::V4,
            Self::Tcp6 | Self::Udp6 | Self::Ip6 => IpVersion::V6,
            _ => IpVersion::Any,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where to listen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Host (possibly empty for bind-all) and port
    Network { host: String, port: u16 },
    /// Filesystem socket path
    Path(PathBuf),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { host, port } if host.contains(':') => write!(f, "[{host}]:{port}"),
            Self::Network { host, port } => write!(f, "{host}:{port}"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A resolved listen address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    scheme: Scheme,
    endpoint: Endpoint,
}

impl Address {
    /// Parse and normalize an address string
    pub fn resolve(address: &str) -> Result<Self, AddressError> {
        let invalid = |reason| AddressError::InvalidAddress {
            address: address.to_owned(),
            reason,
        };

        let (scheme, rest) = address
            .split_once("://")
            .ok_or_else(|| invalid("missing protocol"))?;

        let scheme = Scheme::parse(scheme).ok_or_else(|| AddressError::UnsupportedScheme {
            scheme: scheme.to_owned(),
            address: address.to_owned(),
        })?;

        if scheme.is_filesystem() {
            if rest.is_empty() {
                return Err(invalid("missing socket path"));
            }
            return Ok(Self {
                scheme,
                endpoint: Endpoint::Path(PathBuf::from(rest)),
            });
        }

        // Anything after the authority is ignored
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let (host, port) = split_host_port(authority).ok_or_else(|| invalid("bad host or port"))?;

        Ok(Self {
            scheme,
            endpoint: Endpoint::Network {
                host: host.to_owned(),
                port: port.unwrap_or(DEFAULT_PORT),
            },
        })
    }

    /// Transport scheme
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Stream or datagram
    pub fn family(&self) -> Family {
        self.scheme.family()
    }

    /// Normalized endpoint
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.endpoint)
    }
}

/// Split `host[:port]`, accepting `[v6]` and `[v6]:port`
fn split_host_port(authority: &str) -> Option<(&str, Option<u16>)> {
    if let Some(bracketed) = authority.strip_prefix('[') {
        let (host, after) = bracketed.split_once(']')?;
        let port = match after {
            "" => None,
            _ => parse_port(after.strip_prefix(':')?)?,
        };
        return Some((host, port));
    }

    match authority.split_once(':') {
        None => Some((authority, None)),
        Some((host, port)) if !port.contains(':') => Some((host, parse_port(port)?)),
        // Unbracketed IPv6 literal
        Some(_) => None,
    }
}

/// `Some(None)` for an empty port, `None` when unparseable
fn parse_port(port: &str) -> Option<Option<u16>> {
    if port.is_empty() {
        return Some(None);
    }
    port.parse().ok().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(s: &str) -> (Scheme, String) {
        let address = Address::resolve(s).unwrap();
        (address.scheme(), address.endpoint().to_string())
    }

    #[test]
    fn test_missing_separator_is_invalid() {
        let err = Address::resolve(":6514").unwrap_err();
        assert!(matches!(err, AddressError::InvalidAddress { .. }));
        assert!(err.to_string().contains("missing protocol"));
    }

    #[test]
    fn test_default_server() {
        assert_eq!(resolve("tcp://:6514"), (Scheme::Tcp, ":6514".into()));
    }

    #[test]
    fn test_default_port_filled() {
        assert_eq!(resolve("tcp://host"), (Scheme::Tcp, "host:6514".into()));
        assert_eq!(resolve("udp://"), (Scheme::Udp, ":6514".into()));
        assert_eq!(resolve("tcp://host:"), (Scheme::Tcp, "host:6514".into()));
    }

    #[test]
    fn test_explicit_port_kept() {
        assert_eq!(
            resolve("udp4://127.0.0.1:1514"),
            (Scheme::Udp4, "127.0.0.1:1514".into())
        );
    }

    #[test]
    fn test_ipv6_literal() {
        assert_eq!(resolve("tcp6://[::1]"), (Scheme::Tcp6, "[::1]:6514".into()));
        assert_eq!(resolve("tcp6://[::1]:514"), (Scheme::Tcp6, "[::1]:514".into()));
        assert!(Address::resolve("tcp6://::1").is_err());
    }

    #[test]
    fn test_bad_port() {
        assert!(Address::resolve("tcp://host:http").is_err());
        assert!(Address::resolve("tcp://host:70000").is_err());
    }

    #[test]
    fn test_unix_path_verbatim() {
        assert_eq!(
            resolve("unix:///tmp/s.sock"),
            (Scheme::Unix, "/tmp/s.sock".into())
        );
        assert_eq!(
            resolve("unixgram://relative.sock"),
            (Scheme::UnixGram, "relative.sock".into())
        );
        assert!(Address::resolve("unix://").is_err());
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = Address::resolve("http://localhost").unwrap_err();
        assert_eq!(
            err,
            AddressError::UnsupportedScheme {
                scheme: "http".into(),
                address: "http://localhost".into(),
            }
        );
    }

    #[test]
    fn test_family_classification() {
        for scheme in ["tcp", "tcp4", "tcp6", "unix", "unixpacket"] {
            let address = Address::resolve(&format!("{scheme}://x")).unwrap();
            assert_eq!(address.family(), Family::Stream, "{scheme}");
        }
        for scheme in ["udp", "udp4", "udp6", "ip", "ip4", "ip6", "unixgram"] {
            let address = Address::resolve(&format!("{scheme}://x")).unwrap();
            assert_eq!(address.family(), Family::Datagram, "{scheme}");
        }
    }

    #[test]
    fn test_display_round_trips() {
        let address: Address = "tcp://example.org".parse().unwrap();
        assert_eq!(address.to_string(), "tcp://example.org:6514");
    }
}
