//! Dual-stack CIDR set: one prefix store per family behind a family-agnostic
//! interface.

use crate::addr::{InvalidAddress, IpCidr, ToCidr};
use crate::index::PrefixMap;

/// A set of IPv4 and IPv6 CIDR ranges mapped to values, queried by
/// longest-prefix match.
///
/// Every operation accepts a literal, an `std::net` address, or a structured
/// [`IpCidr`] (see [`ToCidr`]), and canonicalizes it before touching storage:
/// an IPv4-mapped IPv6 range with prefix length ≥ 96 collapses to its plain
/// IPv4 equivalent. Canonicalizing on write keeps every such range in exactly
/// one index, so a query can never get different answers depending on which
/// literal form it uses.
///
/// ```
/// use cidrset::CidrSet;
///
/// let mut set = CidrSet::new();
/// set.insert("10.0.0.0/8", "private").unwrap();
/// set.insert("::ffff:104.192.136.0/117", "hybrid").unwrap();
///
/// assert_eq!(set.longest_match("10.1.2.3").unwrap(), Some(&"private"));
/// // The mapped-IPv6 entry is stored as plain IPv4 and matches both forms.
/// assert_eq!(set.longest_match("104.192.142.193").unwrap(), Some(&"hybrid"));
/// assert_eq!(
///     set.longest_match("::ffff:104.192.142.193").unwrap(),
///     Some(&"hybrid"),
/// );
/// ```
#[derive(Clone, Debug)]
pub struct CidrSet<V> {
    v4: PrefixMap<u32, V>,
    v6: PrefixMap<u128, V>,
}

impl<V> Default for CidrSet<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CidrSet<V> {
    pub fn new() -> Self {
        Self {
            v4: PrefixMap::new(),
            v6: PrefixMap::new(),
        }
    }

    /// Total number of stored entries across both families.
    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }

    /// The IPv4-side store. Mapped-V6 entries live here after
    /// canonicalization.
    pub fn v4(&self) -> &PrefixMap<u32, V> {
        &self.v4
    }

    /// The IPv6-side store.
    pub fn v6(&self) -> &PrefixMap<u128, V> {
        &self.v6
    }

    /// Parses `addr` into its structured, family-tagged form without
    /// canonicalizing. Compose with [`IpCidr::canonical`] to collapse mapped
    /// ranges.
    pub fn convert_address(addr: impl ToCidr) -> Result<IpCidr, InvalidAddress> {
        addr.to_cidr()
    }

    /// Inserts `addr → value`, replacing and returning any existing value for
    /// the same canonical range.
    pub fn insert(&mut self, addr: impl ToCidr, value: V) -> Result<Option<V>, InvalidAddress> {
        Ok(match addr.to_cidr()?.canonical() {
            IpCidr::V4(c) => self.v4.insert(c, value),
            IpCidr::V6(c) => self.v6.insert(c, value),
        })
    }

    /// Removes the entry for `addr`'s canonical range, returning its value.
    /// Removing an absent entry is `Ok(None)`; only an unparsable `addr` is
    /// an error.
    pub fn remove(&mut self, addr: impl ToCidr) -> Result<Option<V>, InvalidAddress> {
        Ok(match addr.to_cidr()?.canonical() {
            IpCidr::V4(c) => self.v4.remove(c),
            IpCidr::V6(c) => self.v6.remove(c),
        })
    }

    /// The value of the most specific stored range covering `addr`, or
    /// `Ok(None)` when nothing covers it. The prefix length of the query
    /// itself is ignored; only stored prefix lengths drive the walk.
    pub fn longest_match(&self, addr: impl ToCidr) -> Result<Option<&V>, InvalidAddress> {
        Ok(match addr.to_cidr()?.canonical() {
            IpCidr::V4(c) => self.v4.longest_match(c.addr()),
            IpCidr::V6(c) => self.v6.longest_match(c.addr()),
        })
    }

    /// Like [`longest_match`](Self::longest_match), but entries rejected by
    /// `accept` are skipped and the walk falls through to shorter prefixes.
    pub fn longest_match_with(
        &self,
        addr: impl ToCidr,
        accept: impl Fn(&V) -> bool,
    ) -> Result<Option<&V>, InvalidAddress> {
        Ok(match addr.to_cidr()?.canonical() {
            IpCidr::V4(c) => self.v4.longest_match_with(c.addr(), accept),
            IpCidr::V6(c) => self.v6.longest_match_with(c.addr(), accept),
        })
    }

    /// All entries: V4 ranges first, then V6, each in descending
    /// prefix-length order. Ranges are yielded in canonical network form.
    pub fn iter(&self) -> impl Iterator<Item = (IpCidr, &V)> {
        self.v4
            .iter()
            .map(|(c, v)| (IpCidr::V4(c), v))
            .chain(self.v6.iter().map(|(c, v)| (IpCidr::V6(c), v)))
    }
}
