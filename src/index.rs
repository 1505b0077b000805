//! Single-family prefix-length-bucketed store with longest-prefix matching.

use std::collections::{BTreeMap, HashMap};

use crate::addr::{AddressBits, Cidr};

/// Maps CIDR ranges of one address family to values, answering
/// longest-prefix-match queries.
///
/// Entries are bucketed by prefix length; within a bucket the key is the
/// masked network address, so there is at most one entry per distinct range.
/// The bucket map is a `BTreeMap`, which keeps the set of stored prefix
/// lengths ordered by construction; a match walks it in reverse (longest
/// first). A bucket is dropped as soon as its last entry is removed, so the
/// walk never visits an empty length.
#[derive(Clone, Debug)]
pub struct PrefixMap<A, V> {
    buckets: BTreeMap<u8, HashMap<A, V>>,
    len: usize,
}

impl<A: AddressBits, V> Default for PrefixMap<A, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AddressBits, V> PrefixMap<A, V> {
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
            len: 0,
        }
    }

    /// Number of stored entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct prefix lengths currently present. This bounds the
    /// per-query work of [`longest_match`](Self::longest_match).
    #[inline]
    pub fn prefix_len_count(&self) -> usize {
        self.buckets.len()
    }

    /// Inserts `cidr → value`, keyed by the range's network address.
    /// Re-inserting an existing `(prefix_len, network)` pair replaces the
    /// value and returns the old one.
    pub fn insert(&mut self, cidr: Cidr<A>, value: V) -> Option<V> {
        let old = self
            .buckets
            .entry(cidr.prefix_len())
            .or_default()
            .insert(cidr.network(), value);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    /// Removes the entry for `cidr`'s exact `(prefix_len, network)` pair,
    /// returning its value. Removing an absent entry is a no-op. The bucket
    /// is dropped when it empties.
    pub fn remove(&mut self, cidr: Cidr<A>) -> Option<V> {
        let bucket = self.buckets.get_mut(&cidr.prefix_len())?;
        let old = bucket.remove(&cidr.network())?;
        if bucket.is_empty() {
            self.buckets.remove(&cidr.prefix_len());
        }
        self.len -= 1;
        Some(old)
    }

    /// Exact-entry probe: the value stored for precisely this range, ignoring
    /// any covering range.
    pub fn get(&self, cidr: Cidr<A>) -> Option<&V> {
        self.buckets.get(&cidr.prefix_len())?.get(&cidr.network())
    }

    /// Longest-prefix match: the value of the most specific stored range
    /// covering `addr`, or `None` when no range covers it.
    ///
    /// O(L) bucket probes for L distinct stored prefix lengths, each an O(1)
    /// hash lookup on the query masked to that length.
    pub fn longest_match(&self, addr: A) -> Option<&V> {
        self.buckets
            .iter()
            .rev()
            .find_map(|(&prefix_len, bucket)| bucket.get(&addr.network(prefix_len)))
    }

    /// Longest-prefix match that skips entries rejected by `accept`, falling
    /// through to shorter prefixes (and to `None` past the last one).
    ///
    /// [`longest_match`](Self::longest_match) is equivalent to passing an
    /// always-true predicate. The filtered walk exists for callers that treat
    /// sentinel values (zero, empty) as absent.
    pub fn longest_match_with(&self, addr: A, accept: impl Fn(&V) -> bool) -> Option<&V> {
        self.buckets
            .iter()
            .rev()
            .filter_map(|(&prefix_len, bucket)| bucket.get(&addr.network(prefix_len)))
            .find(|&value| accept(value))
    }

    /// Entries in descending prefix-length order; order within one length is
    /// unspecified. Yielded ranges are in network (masked) form.
    pub fn iter(&self) -> impl Iterator<Item = (Cidr<A>, &V)> {
        self.buckets.iter().rev().flat_map(|(&prefix_len, bucket)| {
            bucket.iter().map(move |(&network, value)| {
                let cidr =
                    Cidr::new(network, prefix_len).expect("stored prefix length fits the family");
                (cidr, value)
            })
        })
    }
}
