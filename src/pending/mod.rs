use tracing::trace;

use crate::{
    encoding,
    error::{Error, Result},
    store::KeyedStore,
};

/// Records a transaction in the pending log, keyed by `(view, timestamp)`.
/// Records are write-once: nothing ever mutates or deletes them, a later
/// consolidation just moves the scan lower bound past them.
pub fn append<S: KeyedStore>(
    store: &mut S,
    name: &str,
    ts_ns: u64,
    txn_id: &str,
) -> Result<()> {
    let key = encoding::pending_key(name, ts_ns);
    store
        .put(&key, txn_id.as_bytes())
        .map_err(|e| Error::store_write(&key, e))?;
    trace!(view = name, txn = txn_id, ts_ns, "appended pending record");
    Ok(())
}

/// Chronological scan of pending ids with `from_ns <= ts < to_ns`. Both the
/// merge path and the read path window the log through here, so the two can
/// never disagree about what the tail is.
pub fn scan_window<S: KeyedStore>(
    store: &mut S,
    name: &str,
    from_ns: u64,
    to_ns: u64,
) -> Result<Vec<String>> {
    if from_ns >= to_ns {
        return Ok(Vec::new());
    }
    let (start, end) = encoding::pending_range(name, from_ns, to_ns);
    let entries = store
        .range_scan(&start, &end)
        .map_err(|e| Error::store_read(&start, e))?;
    let mut ids = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        ids.push(String::from_utf8(value).map_err(|e| Error::decode(&key, e.into()))?);
    }
    Ok(ids)
}

#[cfg(test)]
mod test {
    use crate::store::MemoryStore;

    use super::{append, scan_window};

    #[test]
    fn test_window_is_chronological_and_half_open() {
        let mut store = MemoryStore::new();
        append(&mut store, "V", 30, "t3").unwrap();
        append(&mut store, "V", 10, "t1").unwrap();
        append(&mut store, "V", 20, "t2").unwrap();

        assert_eq!(scan_window(&mut store, "V", 0, 100).unwrap(), vec!["t1", "t2", "t3"]);
        // Lower bound inclusive, upper exclusive.
        assert_eq!(scan_window(&mut store, "V", 10, 30).unwrap(), vec!["t1", "t2"]);
        assert_eq!(scan_window(&mut store, "V", 11, 31).unwrap(), vec!["t2", "t3"]);
        // Empty and inverted windows.
        assert!(scan_window(&mut store, "V", 20, 20).unwrap().is_empty());
        assert!(scan_window(&mut store, "V", 30, 10).unwrap().is_empty());
    }

    #[test]
    fn test_views_are_isolated() {
        let mut store = MemoryStore::new();
        append(&mut store, "V", 10, "t1").unwrap();
        append(&mut store, "W", 10, "u1").unwrap();

        assert_eq!(scan_window(&mut store, "V", 0, 100).unwrap(), vec!["t1"]);
        assert_eq!(scan_window(&mut store, "W", 0, 100).unwrap(), vec!["u1"]);
    }
}
