use crate::error::RouterError;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Routing cost. Lower is better; the configured sentinel means unreachable.
pub type Metric = u32;

/// Number of bits in an IPv4 address, and so the longest valid prefix.
pub const MAX_PREFIX_LEN: u8 = 32;

/// An IPv4 network prefix (CIDR block).
///
/// Only the `len` most significant bits of the address are kept; the rest
/// are zeroed on construction, so two prefixes that differ only in host
/// bits compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Prefix {
    addr: u32,
    len: u8,
}

impl Prefix {
    pub fn new(addr: u32, len: u8) -> Result<Self, RouterError> {
        if len > MAX_PREFIX_LEN {
            return Err(RouterError::InvalidPrefixLength(len));
        }
        Ok(Self {
            addr: addr & Self::mask_for(len),
            len,
        })
    }

    /// Prefix covering the whole address space.
    pub const fn default_route() -> Self {
        Self { addr: 0, len: 0 }
    }

    pub fn addr(&self) -> u32 {
        self.addr
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn address(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.addr)
    }

    pub fn mask(&self) -> u32 {
        Self::mask_for(self.len)
    }

    /// Whether `addr` falls inside this network. A /0 prefix contains everything.
    pub fn contains(&self, addr: u32) -> bool {
        addr & self.mask() == self.addr
    }

    /// Value of the significant bit at `depth` (0 is the most significant).
    pub fn bit(&self, depth: u8) -> bool {
        debug_assert!(depth < self.len);
        address_bit(self.addr, depth)
    }

    fn mask_for(len: u8) -> u32 {
        if len == 0 {
            0
        } else {
            u32::MAX << (MAX_PREFIX_LEN - len)
        }
    }
}

/// Bit of `addr` at `depth`, counting from the most significant bit.
pub fn address_bit(addr: u32, depth: u8) -> bool {
    (addr >> (MAX_PREFIX_LEN - 1 - depth)) & 1 == 1
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address(), self.len)
    }
}

impl From<Ipv4Net> for Prefix {
    fn from(net: Ipv4Net) -> Self {
        Self {
            addr: u32::from(net.network()),
            len: net.prefix_len(),
        }
    }
}

impl FromStr for Prefix {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, len) = s
            .split_once('/')
            .ok_or_else(|| RouterError::parse(0, format!("missing prefix length in `{}`", s)))?;
        let len: u8 = len
            .parse()
            .map_err(|_| RouterError::parse(0, format!("invalid prefix length `{}`", len)))?;
        // Out-of-range lengths are a caller error, not a syntax error.
        if len > MAX_PREFIX_LEN {
            return Err(RouterError::InvalidPrefixLength(len));
        }
        let net: Ipv4Net = s
            .parse()
            .map_err(|e| RouterError::parse(0, format!("invalid prefix `{}`: {}", s, e)))?;
        Ok(net.into())
    }
}

impl From<Prefix> for String {
    fn from(prefix: Prefix) -> Self {
        prefix.to_string()
    }
}

impl TryFrom<String> for Prefix {
    type Error = RouterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(a: u8, b: u8, c: u8, d: u8) -> u32 {
        u32::from(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_prefix_is_canonical() {
        let p = Prefix::new(ip(10, 1, 2, 3), 8).unwrap();
        assert_eq!(p.addr(), ip(10, 0, 0, 0));
        assert_eq!(p, Prefix::new(ip(10, 255, 0, 1), 8).unwrap());
        assert_eq!(p.to_string(), "10.0.0.0/8");
    }

    #[test]
    fn test_prefix_length_bounds() {
        assert!(Prefix::new(0, 32).is_ok());
        assert_eq!(
            Prefix::new(0, 33),
            Err(RouterError::InvalidPrefixLength(33))
        );
    }

    #[test]
    fn test_default_route_contains_everything() {
        let p = Prefix::new(ip(1, 2, 3, 4), 0).unwrap();
        assert_eq!(p, Prefix::default_route());
        assert!(p.contains(0));
        assert!(p.contains(u32::MAX));
        assert!(p.contains(ip(192, 168, 1, 1)));
    }

    #[test]
    fn test_contains_and_bits() {
        let p = Prefix::new(ip(192, 168, 0, 0), 16).unwrap();
        assert!(p.contains(ip(192, 168, 77, 1)));
        assert!(!p.contains(ip(192, 169, 0, 0)));
        assert!(p.bit(0));
        assert!(p.bit(1));
        assert!(!p.bit(2));
        assert!(address_bit(1, 31));
        assert!(!address_bit(1, 30));
    }

    #[test]
    fn test_parse_prefix() {
        let p: Prefix = "172.16.5.4/12".parse().unwrap();
        assert_eq!(p.to_string(), "172.16.0.0/12");

        assert_eq!(
            "10.0.0.0/40".parse::<Prefix>(),
            Err(RouterError::InvalidPrefixLength(40))
        );
        assert!("10.0.0.0".parse::<Prefix>().unwrap_err().is_parse_error());
        assert!("10.0.0/8".parse::<Prefix>().unwrap_err().is_parse_error());
        assert!("10.0.0.0/x".parse::<Prefix>().unwrap_err().is_parse_error());
    }

    #[test]
    fn test_prefix_serde_as_string() {
        let p: Prefix = "192.168.1.0/24".parse().unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"192.168.1.0/24\"");
        let back: Prefix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
