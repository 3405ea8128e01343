//! Key construction for the flat keyspace. Every persisted family gets a
//! prefix ending in 0x00, a byte view names may not contain, so families and
//! views can never bleed into each other's scan ranges.

pub const CATALOG_KEY: &[u8] = b"catalog";

const VIEW_PREFIX: &[u8] = b"view\x00";
const PENDING_PREFIX: &[u8] = b"pending\x00";
const PRIVATE_PREFIX: &[u8] = b"txnprv\x00";

pub fn view_key(name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(VIEW_PREFIX.len() + name.len());
    key.extend_from_slice(VIEW_PREFIX);
    key.extend_from_slice(name.as_bytes());
    key
}

pub fn private_arg_key(txn_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(PRIVATE_PREFIX.len() + txn_id.len());
    key.extend_from_slice(PRIVATE_PREFIX);
    key.extend_from_slice(txn_id.as_bytes());
    key
}

/// Pending-log key for one recorded transaction. The timestamp is encoded as
/// 8 big-endian bytes: fixed width, so byte-lexicographic key order is
/// chronological order. Decimal formatting would not be: once the counter
/// crosses a digit-count boundary, shorter strings of larger digits sort
/// after longer strings of smaller ones.
pub fn pending_key(name: &str, ts_ns: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(PENDING_PREFIX.len() + name.len() + 1 + 8);
    key.extend_from_slice(PENDING_PREFIX);
    key.extend_from_slice(name.as_bytes());
    key.push(0x00);
    key.extend_from_slice(&ts_ns.to_be_bytes());
    key
}

/// Scan bounds selecting pending records of `name` with
/// `from_ns <= ts < to_ns`.
pub fn pending_range(name: &str, from_ns: u64, to_ns: u64) -> (Vec<u8>, Vec<u8>) {
    (pending_key(name, from_ns), pending_key(name, to_ns))
}

#[test]
fn test_timestamp_keys_sort_chronologically() {
    // Straddle several power-of-ten digit boundaries.
    let boundaries: &[u64] = &[
        9,
        10,
        999_999_999,
        1_000_000_000,
        999_999_999_999_999_999,
        1_000_000_000_000_000_000,
    ];
    for w in boundaries.windows(2) {
        let (lo, hi) = (w[0], w[1]);
        assert!(pending_key("v", lo) < pending_key("v", hi), "{} vs {}", lo, hi);
    }
}

#[test]
fn test_naive_decimal_keys_do_not() {
    // The encoding this scheme exists to avoid: "999999999" sorts after
    // "1000000000" byte-wise even though it is numerically smaller.
    let lo: u64 = 999_999_999;
    let hi: u64 = 1_000_000_000;
    assert!(lo < hi);
    assert!(lo.to_string().as_bytes() > hi.to_string().as_bytes());
    assert!(pending_key("v", lo) < pending_key("v", hi));
}

#[test]
fn test_views_do_not_share_ranges() {
    // Keys of view "ab" never land inside a scan over view "a", even across
    // the full timestamp range.
    let (start, end) = pending_range("a", 0, u64::MAX);
    let other = pending_key("ab", 0);
    assert!(!(start <= other && other < end));
}
