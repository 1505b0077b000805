//! CIDR address types and parsing.
//!
//! A [`Cidr`] is a fixed-width numeric address plus a prefix length. The two
//! concrete families are [`Cidr4`] (`u32`) and [`Cidr6`] (`u128`); [`IpCidr`]
//! tags a value with its family so callers can work family-agnostically.
//! Textual parsing goes through `std::net`, which already accepts the
//! IPv4-mapped forms `::ffff:a.b.c.d` and `::ffff:hhhh:hhhh`.

use std::fmt;
use std::hash::Hash;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use thiserror::Error;

/// The only error this crate produces: a literal that parses under neither
/// address family (or not under the family-specific parser it was given to).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address {0:?}")]
pub struct InvalidAddress(String);

impl InvalidAddress {
    pub(crate) fn new(literal: impl Into<String>) -> Self {
        Self(literal.into())
    }

    /// The offending input, verbatim.
    pub fn literal(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Address families
// =============================================================================

/// Fixed-width unsigned representation of one address family.
///
/// Implemented for `u32` (IPv4) and `u128` (IPv6); the prefix-keyed store is
/// generic over this so both families share one implementation.
pub trait AddressBits: Copy + Eq + Ord + Hash + fmt::Debug {
    /// Address width in bits (32 or 128). Named to stay clear of the
    /// primitives' inherent `BITS` constants, which would otherwise shadow a
    /// trait constant inside the impls.
    const WIDTH: u8;

    /// Clears all bits below the prefix boundary, yielding the network
    /// (start) address of an `addr/prefix_len` range.
    fn network(self, prefix_len: u8) -> Self;
}

impl AddressBits for u32 {
    const WIDTH: u8 = 32;

    #[inline]
    fn network(self, prefix_len: u8) -> Self {
        debug_assert!(prefix_len <= Self::WIDTH);
        if prefix_len == 0 {
            0
        } else {
            self & (u32::MAX << (Self::WIDTH - prefix_len))
        }
    }
}

impl AddressBits for u128 {
    const WIDTH: u8 = 128;

    #[inline]
    fn network(self, prefix_len: u8) -> Self {
        debug_assert!(prefix_len <= Self::WIDTH);
        if prefix_len == 0 {
            0
        } else {
            self & (u128::MAX << (Self::WIDTH - prefix_len))
        }
    }
}

// =============================================================================
// CIDR value types
// =============================================================================

/// A single-family CIDR range: address plus prefix length.
///
/// The stored address is kept as given; [`Cidr::network`] derives the masked
/// start address on demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cidr<A> {
    addr: A,
    prefix: u8,
}

/// IPv4 CIDR range.
pub type Cidr4 = Cidr<u32>;
/// IPv6 CIDR range.
pub type Cidr6 = Cidr<u128>;

impl<A: AddressBits> Cidr<A> {
    /// Constructs a range, checking that `prefix` fits the family width.
    /// Returns `None` when `prefix > A::WIDTH`.
    #[inline]
    pub fn new(addr: A, prefix: u8) -> Option<Self> {
        if prefix > A::WIDTH {
            None
        } else {
            Some(Self { addr, prefix })
        }
    }

    /// The address exactly as supplied (not masked).
    #[inline]
    pub fn addr(&self) -> A {
        self.addr
    }

    /// Significant high-order bits of this range.
    #[inline]
    pub fn prefix_len(&self) -> u8 {
        self.prefix
    }

    /// Start address of the range: `addr` with the low `WIDTH - prefix` bits
    /// cleared.
    #[inline]
    pub fn network(&self) -> A {
        self.addr.network(self.prefix)
    }

    /// Whether `addr` falls inside this range.
    #[inline]
    pub fn contains(&self, addr: A) -> bool {
        addr.network(self.prefix) == self.network()
    }
}

/// Number of leading bits fixed by the IPv4-mapped IPv6 embedding
/// (80 zero bits followed by 16 one bits).
pub const MAPPED_PREFIX_LEN: u8 = 96;

impl Cidr4 {
    /// Host range (`/32`) for a single IPv4 address.
    #[inline]
    pub fn host(ip: Ipv4Addr) -> Self {
        Self {
            addr: u32::from(ip),
            prefix: 32,
        }
    }

    /// The address as `std::net::Ipv4Addr`.
    #[inline]
    pub fn ip(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.addr)
    }

    /// This range expressed in IPv4-mapped IPv6 notation
    /// (`::ffff:a.b.c.d/(prefix + 96)`). Display/interop helper only; entries
    /// are stored in their canonical V4 form.
    pub fn to_mapped_v6(&self) -> Cidr6 {
        Cidr {
            addr: (0xFFFFu128 << 32) | u128::from(self.addr),
            prefix: self.prefix + MAPPED_PREFIX_LEN,
        }
    }
}

impl Cidr6 {
    /// Host range (`/128`) for a single IPv6 address.
    #[inline]
    pub fn host(ip: Ipv6Addr) -> Self {
        Self {
            addr: u128::from(ip),
            prefix: 128,
        }
    }

    /// The address as `std::net::Ipv6Addr`.
    #[inline]
    pub fn ip(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.addr)
    }

    /// Whether the address carries the IPv4-mapped embedding: top 80 bits
    /// zero and bits 80..96 all ones.
    #[inline]
    pub fn is_mapped_v4(&self) -> bool {
        self.addr >> 32 == 0xFFFF
    }

    /// The embedded IPv4 range, if the address is IPv4-mapped. The derived
    /// prefix length is `prefix - 96`, saturating at 0 for prefixes that do
    /// not reach the embedded address bits.
    pub fn mapped_v4(&self) -> Option<Cidr4> {
        if !self.is_mapped_v4() {
            return None;
        }
        Some(Cidr {
            addr: self.addr as u32,
            prefix: self.prefix.saturating_sub(MAPPED_PREFIX_LEN),
        })
    }
}

impl fmt::Display for Cidr4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip(), self.prefix)
    }
}

impl fmt::Display for Cidr6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip(), self.prefix)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Prefix part of a literal: decimal digits only, within the family width.
fn parse_prefix_len(s: &str, max: u8) -> Option<u8> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let len: u8 = s.parse().ok()?;
    (len <= max).then_some(len)
}

fn split_literal(s: &str) -> (&str, Option<&str>) {
    match s.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (s, None),
    }
}

impl FromStr for Cidr4 {
    type Err = InvalidAddress;

    /// Dotted-quad with optional `/prefixlen`; a bare address is `/32`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_part, prefix_part) = split_literal(s);
        let ip: Ipv4Addr = addr_part.parse().map_err(|_| InvalidAddress::new(s))?;
        let prefix = match prefix_part {
            Some(p) => parse_prefix_len(p, 32).ok_or_else(|| InvalidAddress::new(s))?,
            None => 32,
        };
        Ok(Self {
            addr: u32::from(ip),
            prefix,
        })
    }
}

impl FromStr for Cidr6 {
    type Err = InvalidAddress;

    /// Colon-hex with optional `/prefixlen`; a bare address is `/128`.
    /// IPv4-mapped literals parse but are not collapsed here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_part, prefix_part) = split_literal(s);
        let ip: Ipv6Addr = addr_part.parse().map_err(|_| InvalidAddress::new(s))?;
        let prefix = match prefix_part {
            Some(p) => parse_prefix_len(p, 128).ok_or_else(|| InvalidAddress::new(s))?,
            None => 128,
        };
        Ok(Self {
            addr: u128::from(ip),
            prefix,
        })
    }
}

// =============================================================================
// Family-tagged union
// =============================================================================

/// A CIDR range tagged with its address family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IpCidr {
    /// IPv4 range.
    V4(Cidr4),
    /// IPv6 range.
    V6(Cidr6),
}

impl IpCidr {
    #[inline]
    pub fn is_v4(&self) -> bool {
        matches!(self, Self::V4(_))
    }

    #[inline]
    pub fn is_v6(&self) -> bool {
        matches!(self, Self::V6(_))
    }

    #[inline]
    pub fn prefix_len(&self) -> u8 {
        match self {
            Self::V4(c) => c.prefix_len(),
            Self::V6(c) => c.prefix_len(),
        }
    }

    /// Collapses an IPv4-mapped IPv6 range to its plain IPv4 equivalent.
    ///
    /// A V6 range is eligible when its prefix length is at least 96 and the
    /// address carries the mapped embedding; the result drops 96 from the
    /// prefix and keeps the low 32 address bits. Everything else passes
    /// through unchanged. All set operations canonicalize through this, so a
    /// mapped literal and its plain-V4 spelling always denote the same entry.
    pub fn canonical(self) -> Self {
        match self {
            Self::V6(c) if c.prefix_len() >= MAPPED_PREFIX_LEN => match c.mapped_v4() {
                Some(v4) => Self::V4(v4),
                None => Self::V6(c),
            },
            other => other,
        }
    }
}

impl FromStr for IpCidr {
    type Err = InvalidAddress;

    /// Attempts the V4 grammar first, then V6; only both failing is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(v4) = s.parse::<Cidr4>() {
            return Ok(Self::V4(v4));
        }
        s.parse::<Cidr6>()
            .map(Self::V6)
            .map_err(|_| InvalidAddress::new(s))
    }
}

impl fmt::Display for IpCidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4(c) => c.fmt(f),
            Self::V6(c) => c.fmt(f),
        }
    }
}

impl From<Cidr4> for IpCidr {
    fn from(c: Cidr4) -> Self {
        Self::V4(c)
    }
}

impl From<Cidr6> for IpCidr {
    fn from(c: Cidr6) -> Self {
        Self::V6(c)
    }
}

impl From<Ipv4Addr> for IpCidr {
    fn from(ip: Ipv4Addr) -> Self {
        Self::V4(Cidr4::host(ip))
    }
}

impl From<Ipv6Addr> for IpCidr {
    fn from(ip: Ipv6Addr) -> Self {
        Self::V6(Cidr6::host(ip))
    }
}

impl From<IpAddr> for IpCidr {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => v4.into(),
            IpAddr::V6(v6) => v6.into(),
        }
    }
}

// =============================================================================
// Input polymorphism
// =============================================================================

/// Anything a set operation accepts as an address: a literal, an `std::net`
/// address, or an already-structured range. Modeled on `ToSocketAddrs`.
pub trait ToCidr {
    fn to_cidr(&self) -> Result<IpCidr, InvalidAddress>;
}

impl ToCidr for str {
    fn to_cidr(&self) -> Result<IpCidr, InvalidAddress> {
        self.parse()
    }
}

impl ToCidr for String {
    fn to_cidr(&self) -> Result<IpCidr, InvalidAddress> {
        self.parse()
    }
}

impl ToCidr for IpCidr {
    fn to_cidr(&self) -> Result<IpCidr, InvalidAddress> {
        Ok(*self)
    }
}

impl ToCidr for Cidr4 {
    fn to_cidr(&self) -> Result<IpCidr, InvalidAddress> {
        Ok((*self).into())
    }
}

impl ToCidr for Cidr6 {
    fn to_cidr(&self) -> Result<IpCidr, InvalidAddress> {
        Ok((*self).into())
    }
}

impl ToCidr for IpAddr {
    fn to_cidr(&self) -> Result<IpCidr, InvalidAddress> {
        Ok((*self).into())
    }
}

impl ToCidr for Ipv4Addr {
    fn to_cidr(&self) -> Result<IpCidr, InvalidAddress> {
        Ok((*self).into())
    }
}

impl ToCidr for Ipv6Addr {
    fn to_cidr(&self) -> Result<IpCidr, InvalidAddress> {
        Ok((*self).into())
    }
}

impl<T: ToCidr + ?Sized> ToCidr for &T {
    fn to_cidr(&self) -> Result<IpCidr, InvalidAddress> {
        (**self).to_cidr()
    }
}
