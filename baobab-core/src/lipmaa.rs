// SPDX-License-Identifier: AGPL-3.0-or-later

//! Lipmaa link arithmetic.
//!
//! Entries in a Bamboo log carry a skip-link to the entry at `lipmaa(seqnum)`
//! in addition to the backlink at `seqnum - 1`. The skip targets are laid out
//! along a ternary tree whose subtree sizes are `(3^k - 1) / 2` (1, 4, 13,
//! 40, 121, ...), which keeps the path from any entry back to the log root at
//! logarithmic length.
use std::collections::BTreeSet;

/// Sequence number of the entry which `n` skip-links to.
///
/// Sequence numbers start at 1. The first entry has no predecessor; its own
/// number is returned as the no-link sentinel.
pub fn lipmaa(n: u64) -> u64 {
    if n <= 1 {
        return 1;
    }

    // Work in u128 so the tree-size search cannot overflow near u64::MAX
    let n = n as u128;
    let mut m: u128 = 1;
    let mut po3: u128 = 3;

    // Find the smallest tree size (3^k - 1) / 2 which covers n
    while m < n {
        po3 *= 3;
        m = (po3 - 1) / 2;
    }
    po3 /= 3;

    // Entries off the tree spine jump by the largest subtree that fits
    if m != n {
        let mut x = n;
        while x != 0 {
            m = (po3 - 1) / 2;
            po3 /= 3;
            x %= m;
        }
        if m != po3 {
            po3 = m;
        }
    }

    (n - po3) as u64
}

/// Whether the entry at `n` must carry a distinct lipmaa link.
///
/// The link is omitted from the wire format whenever it would duplicate the
/// backlink, and for the first entry of a log.
pub fn is_lipmaa_required(n: u64) -> bool {
    n > 1 && lipmaa(n) != n - 1
}

/// The sequence numbers required to verify entry `n` back to entry 1,
/// deduplicated and sorted descending.
///
/// The pool is the lipmaa chain from `n` down to 1, unioned with the link
/// path from the smallest tree size `(3^k - 1) / 2 >= n` down to `n`. The
/// upper part is what future entries hop through when certifying `n`; callers
/// holding a log of known height simply drop the numbers beyond it.
pub fn cert_pool(n: u64) -> Vec<u64> {
    let mut pool = BTreeSet::new();

    if n == 0 {
        return Vec::new();
    }

    // Smallest tree size covering n
    let mut anchor: u128 = 1;
    while anchor < n as u128 {
        anchor = anchor * 3 + 1;
    }

    // Walk down from the anchor, preferring lipmaa hops that stay at or
    // above n
    let mut at = anchor as u64;
    pool.insert(at);
    while at > n {
        let skip = lipmaa(at);
        at = if skip >= n { skip } else { at - 1 };
        pool.insert(at);
    }

    // Lipmaa chain from n to the log root
    let mut at = n;
    while at > 1 {
        at = lipmaa(at);
        pool.insert(at);
    }

    pool.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{cert_pool, is_lipmaa_required, lipmaa};

    // Reference values for the first forty sequence numbers, anchors
    // included: 4 -> 1, 13 -> 4, 40 -> 13.
    const REFERENCE: [u64; 40] = [
        1, 1, 2, 1, 4, 5, 6, 4, 8, 9, 10, 8, 4, 13, 14, 15, 13, 17, 18, 19, 17, 21, 22, 23, 21,
        13, 26, 27, 28, 26, 30, 31, 32, 30, 34, 35, 36, 34, 26, 13,
    ];

    #[test]
    fn reference_sequence() {
        for (i, expected) in REFERENCE.iter().enumerate() {
            let n = i as u64 + 1;
            assert_eq!(lipmaa(n), *expected, "lipmaa({n})");
        }
    }

    #[test]
    fn chains_terminate_at_one() {
        for n in 2..=10_000u64 {
            let mut at = n;
            let mut hops = 0;
            while at > 1 {
                let next = lipmaa(at);
                assert!(next < at, "lipmaa({at}) must decrease");
                at = next;
                hops += 1;
            }
            // Logarithmic certificate paths are the whole point
            assert!(hops <= 32, "chain from {n} took {hops} hops");
        }
    }

    #[rstest]
    #[case(1, false)]
    #[case(2, false)]
    #[case(3, false)]
    #[case(4, true)]
    #[case(5, false)]
    #[case(8, true)]
    #[case(13, true)]
    #[case(40, true)]
    fn lipmaa_requirement(#[case] n: u64, #[case] required: bool) {
        assert_eq!(is_lipmaa_required(n), required);
    }

    #[test]
    fn pool_of_first_entry() {
        assert_eq!(cert_pool(1), vec![1]);
    }

    #[test]
    fn pool_of_five() {
        assert_eq!(cert_pool(5), vec![13, 12, 8, 7, 6, 5, 4, 1]);
    }

    #[test]
    fn pool_of_fourteen() {
        let pool = cert_pool(14);
        let below: Vec<u64> = pool.iter().copied().filter(|n| *n <= 14).collect();
        assert_eq!(below, vec![14, 13, 4, 1]);
    }

    #[test]
    fn pools_connect_to_the_root() {
        for n in 1..=200u64 {
            let pool = cert_pool(n);
            assert!(pool.contains(&n));
            assert!(pool.contains(&1));
            // Descending and unique
            assert!(pool.windows(2).all(|pair| pair[0] > pair[1]));
        }
    }
}
