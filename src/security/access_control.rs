//! CIDR access filter.
//!
//! Gates every inbound connection on its peer address before any routing
//! happens. Ranges are compiled once at startup and never change.
//!
//! # Evaluation order
//! 1. `allowed` ranges: a match admits the address
//! 2. `blocked` ranges: first match rejects the address
//! 3. otherwise `block_by_default`
//!
//! IPv4-mapped IPv6 peers (`::ffff:a.b.c.d`) are evaluated as IPv4 so a
//! dual-stack listener cannot be used to sidestep an IPv4 block.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::config::AccessConfig;

/// A malformed CIDR entry. Always fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("invalid CIDR {0:?}: not an IPv4 or IPv6 address")]
    Address(String),

    #[error("invalid CIDR {entry:?}: prefix length must be between 0 and {max}")]
    Prefix { entry: String, max: u8 },

    #[error(
        "invalid CIDR {0:?}: IPv4-mapped prefixes must be between 96 and 128 \
         (/96+n covers the IPv4 range /n)"
    )]
    MappedPrefix(String),
}

/// A network prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cidr {
    V4 { network: u32, prefix_len: u8 },
    V6 { network: u128, prefix_len: u8 },
}

fn mask_v4(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_len))
    }
}

fn mask_v6(prefix_len: u8) -> u128 {
    if prefix_len == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(prefix_len))
    }
}

impl Cidr {
    /// Build a prefix, masking away host bits.
    pub fn new(addr: IpAddr, prefix_len: u8) -> Option<Self> {
        match addr.to_canonical() {
            IpAddr::V4(v4) if prefix_len <= 32 => Some(Cidr::V4 {
                network: u32::from(v4) & mask_v4(prefix_len),
                prefix_len,
            }),
            IpAddr::V6(v6) if prefix_len <= 128 => Some(Cidr::V6 {
                network: u128::from(v6) & mask_v6(prefix_len),
                prefix_len,
            }),
            _ => None,
        }
    }

    /// Check if an address is within this prefix.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (*self, addr.to_canonical()) {
            (Cidr::V4 { network, prefix_len }, IpAddr::V4(v4)) => {
                u32::from(v4) & mask_v4(prefix_len) == network
            }
            (Cidr::V6 { network, prefix_len }, IpAddr::V6(v6)) => {
                u128::from(v6) & mask_v6(prefix_len) == network
            }
            _ => false,
        }
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    /// Parse `addr/len`. A bare address is a single-host prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let entry = s.trim();
        let (addr_str, prefix_str) = match entry.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (entry, None),
        };

        let addr: IpAddr = addr_str
            .parse()
            .map_err(|_| CidrError::Address(entry.to_string()))?;
        let mapped = addr.is_ipv6() && addr.to_canonical().is_ipv4();
        let max = match addr.to_canonical() {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        let prefix_len = match prefix_str {
            Some(p) => p.parse::<u8>().map_err(|_| {
                if mapped {
                    CidrError::MappedPrefix(entry.to_string())
                } else {
                    CidrError::Prefix {
                        entry: entry.to_string(),
                        max,
                    }
                }
            })?,
            None => max,
        };
        // `::ffff:a.b.c.d/len` is written against the 128-bit address.
        let prefix_len = match (mapped, prefix_str) {
            (true, Some(_)) if (96..=128).contains(&prefix_len) => prefix_len - 96,
            (true, Some(_)) => return Err(CidrError::MappedPrefix(entry.to_string())),
            _ => prefix_len,
        };

        Cidr::new(addr, prefix_len).ok_or(CidrError::Prefix {
            entry: entry.to_string(),
            max,
        })
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Cidr::V4 { network, prefix_len } => {
                write!(f, "{}/{}", std::net::Ipv4Addr::from(network), prefix_len)
            }
            Cidr::V6 { network, prefix_len } => {
                write!(f, "{}/{}", std::net::Ipv6Addr::from(network), prefix_len)
            }
        }
    }
}

/// Immutable allow/deny decision over peer addresses.
#[derive(Debug, Clone, Default)]
pub struct AccessFilter {
    allowed: Vec<Cidr>,
    blocked: Vec<Cidr>,
    block_by_default: bool,
}

impl AccessFilter {
    pub fn new(blocked: Vec<Cidr>, allowed: Vec<Cidr>, block_by_default: bool) -> Self {
        Self {
            allowed,
            blocked,
            block_by_default,
        }
    }

    /// Compile the configured ranges. Any malformed entry fails the whole filter.
    pub fn from_config(config: &AccessConfig) -> Result<Self, CidrError> {
        let blocked = parse_all(&config.blocked)?;
        let allowed = parse_all(&config.allowed)?;

        if blocked.is_empty() && !config.block_by_default {
            tracing::warn!("Access filter has no blocked ranges and admits all traffic");
        }

        Ok(Self::new(blocked, allowed, config.block_by_default))
    }

    /// Decide whether a peer address is rejected.
    pub fn is_blocked(&self, addr: IpAddr) -> bool {
        if self.allowed.iter().any(|c| c.contains(addr)) {
            return false;
        }
        if self.blocked.iter().any(|c| c.contains(addr)) {
            return true;
        }
        self.block_by_default
    }

    /// Textual variant: anything that does not parse as an address is let
    /// through for downstream layers to deal with.
    pub fn is_blocked_str(&self, addr: &str) -> bool {
        match addr.trim().parse::<IpAddr>() {
            Ok(ip) => self.is_blocked(ip),
            Err(_) => false,
        }
    }

    pub fn blocked_ranges(&self) -> &[Cidr] {
        &self.blocked
    }

    pub fn allowed_ranges(&self) -> &[Cidr] {
        &self.allowed
    }

    pub fn block_by_default(&self) -> bool {
        self.block_by_default
    }
}

fn parse_all(entries: &[String]) -> Result<Vec<Cidr>, CidrError> {
    entries.iter().map(|e| e.parse()).collect()
}
