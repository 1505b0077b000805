use super::*;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Naive reference model: every entry kept flat, longest-prefix match by
/// linear scan over all covering entries.
struct Model<A> {
    entries: BTreeMap<(u8, A), u64>,
}

impl<A: AddressBits> Model<A> {
    fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    fn insert(&mut self, cidr: Cidr<A>, value: u64) -> Option<u64> {
        self.entries
            .insert((cidr.prefix_len(), cidr.network()), value)
    }

    fn remove(&mut self, cidr: Cidr<A>) -> Option<u64> {
        self.entries.remove(&(cidr.prefix_len(), cidr.network()))
    }

    fn longest_match(&self, addr: A) -> Option<&u64> {
        self.entries
            .iter()
            .filter(|((prefix_len, network), _)| addr.network(*prefix_len) == *network)
            .max_by_key(|((prefix_len, _), _)| *prefix_len)
            .map(|(_, value)| value)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn distinct_prefix_lens(&self) -> usize {
        let mut lens: Vec<u8> = self.entries.keys().map(|(p, _)| *p).collect();
        lens.dedup();
        lens.len()
    }
}

#[derive(Clone, Debug)]
enum Op<A> {
    Insert(Cidr<A>, u64),
    Remove(Cidr<A>),
    Match(A),
}

/// Mix full-range addresses with a clustered 10.0.0.0/24-ish block so that
/// random queries actually land inside stored ranges.
fn addr4_strategy() -> impl Strategy<Value = u32> + Clone {
    prop_oneof![
        any::<u32>(),
        (0u32..=255).prop_map(|low| (10u32 << 24) | low),
    ]
}

fn cidr4_strategy() -> impl Strategy<Value = Cidr4> + Clone {
    (addr4_strategy(), 0u8..=32)
        .prop_map(|(addr, prefix)| Cidr4::new(addr, prefix).expect("prefix within width"))
}

fn ops4_strategy() -> impl Strategy<Value = Vec<Op<u32>>> {
    let op = prop_oneof![
        50 => (cidr4_strategy(), any::<u64>()).prop_map(|(c, v)| Op::Insert(c, v)),
        25 => cidr4_strategy().prop_map(Op::Remove),
        25 => addr4_strategy().prop_map(Op::Match),
    ];
    prop::collection::vec(op, 0..=1000)
}

fn addr6_strategy() -> impl Strategy<Value = u128> + Clone {
    prop_oneof![
        any::<u128>(),
        (0u128..=255).prop_map(|low| (0x2001_0db8u128 << 96) | low),
    ]
}

fn cidr6_strategy() -> impl Strategy<Value = Cidr6> + Clone {
    (addr6_strategy(), 0u8..=128)
        .prop_map(|(addr, prefix)| Cidr6::new(addr, prefix).expect("prefix within width"))
}

fn ops6_strategy() -> impl Strategy<Value = Vec<Op<u128>>> {
    let op = prop_oneof![
        50 => (cidr6_strategy(), any::<u64>()).prop_map(|(c, v)| Op::Insert(c, v)),
        25 => cidr6_strategy().prop_map(Op::Remove),
        25 => addr6_strategy().prop_map(Op::Match),
    ];
    prop::collection::vec(op, 0..=1000)
}

fn run_ops<A: AddressBits>(ops: Vec<Op<A>>) -> Result<(), TestCaseError> {
    let mut pm: PrefixMap<A, u64> = PrefixMap::new();
    let mut model: Model<A> = Model::new();

    for op in ops {
        match op {
            Op::Insert(cidr, value) => {
                prop_assert_eq!(pm.insert(cidr, value), model.insert(cidr, value));
            }
            Op::Remove(cidr) => {
                prop_assert_eq!(pm.remove(cidr), model.remove(cidr));
            }
            Op::Match(addr) => {
                prop_assert_eq!(pm.longest_match(addr), model.longest_match(addr));
            }
        }

        prop_assert_eq!(pm.len(), model.len());
        prop_assert_eq!(pm.prefix_len_count(), model.distinct_prefix_lens());
    }

    // The iterator visits every live entry exactly once, longest first.
    let mut seen = 0usize;
    let mut last_len = u8::MAX;
    for (cidr, value) in pm.iter() {
        prop_assert!(cidr.prefix_len() <= last_len);
        last_len = cidr.prefix_len();
        prop_assert_eq!(
            model.entries.get(&(cidr.prefix_len(), cidr.network())),
            Some(value)
        );
        seen += 1;
    }
    prop_assert_eq!(seen, model.len());

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_prefix_map_matches_model_v4(ops in ops4_strategy()) {
        run_ops(ops)?;
    }

    #[test]
    fn prop_prefix_map_matches_model_v6(ops in ops6_strategy()) {
        run_ops(ops)?;
    }

    /// Writing through either literal spelling of a V4 range and querying
    /// through either spelling of an address always agree with the model.
    #[test]
    fn prop_mapped_and_plain_literals_agree(
        entries in prop::collection::vec((cidr4_strategy(), any::<u64>(), any::<bool>()), 0..=64),
        queries in prop::collection::vec((addr4_strategy(), any::<bool>()), 0..=64),
    ) {
        let mut set: CidrSet<u64> = CidrSet::new();
        let mut model: Model<u32> = Model::new();

        for (cidr, value, as_mapped) in entries {
            let literal = if as_mapped {
                cidr.to_mapped_v6().to_string()
            } else {
                cidr.to_string()
            };
            prop_assert_eq!(
                set.insert(literal.as_str(), value).expect("literal parses"),
                model.insert(cidr, value)
            );
        }

        // Everything canonicalized into the V4 index.
        prop_assert_eq!(set.v6().len(), 0);
        prop_assert_eq!(set.len(), model.len());

        for (addr, as_mapped) in queries {
            let ip = Ipv4Addr::from(addr);
            let literal = if as_mapped {
                format!("::ffff:{ip}")
            } else {
                ip.to_string()
            };
            prop_assert_eq!(
                set.longest_match(literal.as_str()).expect("literal parses"),
                model.longest_match(addr)
            );
        }
    }
}

#[test]
fn randomized_set_ops_against_model() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(7);
    let mut set: CidrSet<u64> = CidrSet::new();
    let mut model: Model<u32> = Model::new();

    for _ in 0..20_000 {
        let addr: u32 = if rng.gen_bool(0.5) {
            rng.gen()
        } else {
            (10u32 << 24) | rng.gen_range(0..1024)
        };
        let prefix: u8 = rng.gen_range(0..=32);
        let cidr = Cidr4::new(addr, prefix).expect("prefix within width");

        match rng.gen_range(0..100) {
            0..=49 => {
                let value: u64 = rng.gen();
                assert_eq!(
                    set.insert(cidr, value).expect("structured input"),
                    model.insert(cidr, value)
                );
            }
            50..=74 => {
                assert_eq!(
                    set.remove(cidr).expect("structured input"),
                    model.remove(cidr)
                );
            }
            _ => {
                assert_eq!(
                    set.longest_match(Ipv4Addr::from(addr)).expect("structured input"),
                    model.longest_match(addr)
                );
            }
        }

        assert_eq!(set.len(), model.len());
    }
}
