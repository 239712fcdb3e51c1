//! Local addresses and the keys derived from them.
//!
//! Every connection reports the local address it is bound to. The multiplexer
//! never compares addresses directly: it derives a [`ConnKey`] from the
//! network label and the textual socket address, so two addresses that render
//! the same way always land under the same key.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AddrParseError;

/// Separator between the network label and the socket address in a key.
const KEY_SEPARATOR: char = ' ';

/// Transport network a local address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Udp,
    Udp4,
    Udp6,
    Tcp,
    Tcp4,
    Tcp6,
}

impl Network {
    /// Lowercase label, as used in keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Udp => "udp",
            Network::Udp4 => "udp4",
            Network::Udp6 => "udp6",
            Network::Tcp => "tcp",
            Network::Tcp4 => "tcp4",
            Network::Tcp6 => "tcp6",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "udp" => Ok(Network::Udp),
            "udp4" => Ok(Network::Udp4),
            "udp6" => Ok(Network::Udp6),
            "tcp" => Ok(Network::Tcp),
            "tcp4" => Ok(Network::Tcp4),
            "tcp6" => Ok(Network::Tcp6),
            other => Err(AddrParseError::new(format!("unknown network '{}'", other))),
        }
    }
}

/// The local address a connection is bound to.
///
/// Renders and parses as `"<network> <socket addr>"`, e.g. `udp 0.0.0.0:1234`.
/// Serializes through the same string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenAddr {
    /// Transport network label
    pub network: Network,
    /// Bound socket address
    pub addr: SocketAddr,
}

impl ListenAddr {
    /// Create a new local address.
    pub fn new(network: Network, addr: SocketAddr) -> Self {
        Self { network, addr }
    }

    /// Shorthand for a `udp` address.
    pub fn udp(addr: SocketAddr) -> Self {
        Self::new(Network::Udp, addr)
    }

    /// Shorthand for a `tcp` address.
    pub fn tcp(addr: SocketAddr) -> Self {
        Self::new(Network::Tcp, addr)
    }

    /// Derive the registry key for this address.
    pub fn key(&self) -> ConnKey {
        ConnKey::from_addr(self)
    }
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.network, KEY_SEPARATOR, self.addr)
    }
}

impl FromStr for ListenAddr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (network, addr) = s
            .trim()
            .split_once(KEY_SEPARATOR)
            .ok_or_else(|| AddrParseError::new(format!("missing network in '{}'", s)))?;

        let network = network.parse::<Network>()?;
        let addr = addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| AddrParseError::new(format!("'{}': {}", addr, e)))?;

        Ok(Self { network, addr })
    }
}

impl Serialize for ListenAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ListenAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Normalized registry key: network label and socket address joined by a
/// single space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnKey(String);

impl ConnKey {
    /// Build a key from a network label and a textual address.
    pub fn new(network: &str, addr: impl fmt::Display) -> Self {
        Self(format!("{}{}{}", network, KEY_SEPARATOR, addr))
    }

    /// Derive the key for a local address.
    pub fn from_addr(addr: &ListenAddr) -> Self {
        Self::new(addr.network.as_str(), addr.addr)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConnKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&ListenAddr> for ConnKey {
    fn from(addr: &ListenAddr) -> Self {
        Self::from_addr(addr)
    }
}
