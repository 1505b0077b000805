//! # cidrset
//!
//! A dual-stack set of CIDR network ranges, each associated with a value,
//! answering "which range contains this address" by longest-prefix match.
//! IPv4 and IPv6 are handled transparently: IPv4-mapped IPv6 literals such as
//! `::ffff:1.2.3.4/119` are canonicalized to their plain IPv4 equivalent on
//! every operation, so either spelling reads and writes the same entry.
//!
//! ## Example
//!
//! ```rust
//! use cidrset::CidrSet;
//!
//! let mut set = CidrSet::new();
//! set.insert("1.2.3.4/23", "office").unwrap();
//! set.insert("0203:123::1/30", "lab").unwrap();
//!
//! assert_eq!(set.longest_match("1.2.3.3").unwrap(), Some(&"office"));
//! assert_eq!(set.longest_match("0203:123::2").unwrap(), Some(&"lab"));
//! assert_eq!(set.longest_match("2.2.3.3").unwrap(), None);
//! ```
//!
//! The per-family store is [`PrefixMap`], which buckets entries by prefix
//! length and probes lengths longest-first; [`CidrSet`] owns one per family
//! and routes each operation after canonicalization. All operations are
//! synchronous and allocation only grows with the number of entries.

#![forbid(unsafe_code)]

mod addr;
mod index;
mod set;

pub use addr::{AddressBits, Cidr, Cidr4, Cidr6, InvalidAddress, IpCidr, ToCidr, MAPPED_PREFIX_LEN};
pub use index::PrefixMap;
pub use set::CidrSet;

#[cfg(test)]
mod proptests;
