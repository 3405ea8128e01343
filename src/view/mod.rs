//! The merge machinery. There is no scheduler and no timer anywhere: the
//! only thing that ever consolidates a view is a satisfying transaction
//! arriving after the view's merge period has elapsed, checked inline on the
//! write path.

use tracing::debug;

use crate::{
    catalog::{self, View},
    error::Result,
    pending,
    store::KeyedStore,
};

pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Handles one transaction that satisfied `view`'s predicate. Within the
/// merge period the id goes to the pending log; past it, the whole pending
/// window is folded into the durable index. Returns whether a consolidation
/// happened.
pub fn record_txn<S: KeyedStore>(
    store: &mut S,
    name: &str,
    view: &View,
    txn_id: &str,
    now_ns: u64,
) -> Result<bool> {
    let threshold_ns = view.merge_period_secs.saturating_mul(NANOS_PER_SEC);
    let elapsed_ns = now_ns.saturating_sub(view.last_merged_ns);
    // Exactly-equal elapsed time is not yet due; only strictly crossing the
    // period triggers, which keeps same-nanosecond calls deterministic.
    if elapsed_ns <= threshold_ns {
        pending::append(store, name, now_ns, txn_id)?;
        debug!(
            view = name,
            txn = txn_id,
            elapsed_ns,
            threshold_ns,
            "within merge period, txn left pending"
        );
        Ok(false)
    } else {
        consolidate(store, name, view, txn_id, now_ns)?;
        Ok(true)
    }
}

/// Folds the pending window `[last_merged_ns, now)` into the merged index in
/// scan (i.e. chronological) order, with the triggering id appended last,
/// and advances the boundary. The index and the boundary live in one record,
/// so a single put publishes both; a failure before that put leaves the view
/// exactly as it was.
fn consolidate<S: KeyedStore>(
    store: &mut S,
    name: &str,
    view: &View,
    extra_txn_id: &str,
    now_ns: u64,
) -> Result<()> {
    let tail = pending::scan_window(store, name, view.last_merged_ns, now_ns)?;

    let mut updated = view.clone();
    updated.merged_txn_ids.extend(tail);
    updated.merged_txn_ids.push(extra_txn_id.to_owned());
    updated.last_merged_ns = now_ns;
    catalog::store_view(store, name, &updated)?;

    debug!(
        view = name,
        merged_total = updated.merged_txn_ids.len(),
        last_merged_ns = now_ns,
        "consolidated pending window"
    );
    Ok(())
}

/// Point-in-time read: the merged index followed by the live pending window,
/// in that order. Performs no write. A view that was never registered reads
/// as empty.
pub fn retrieve<S: KeyedStore>(store: &mut S, name: &str, now_ns: u64) -> Result<Vec<String>> {
    let view = match catalog::load_view(store, name)? {
        Some(view) => view,
        None => return Ok(Vec::new()),
    };
    let mut ids = view.merged_txn_ids;
    ids.extend(pending::scan_window(store, name, view.last_merged_ns, now_ns)?);
    Ok(ids)
}

#[cfg(test)]
mod test {
    use crate::{
        catalog::{self, View},
        error::Error,
        store::{Event, MemoryStore},
    };

    use super::{record_txn, retrieve, NANOS_PER_SEC};

    fn test_view(last_merged_ns: u64, period_secs: u64) -> View {
        View {
            predicate: "tagA".into(),
            merge_period_secs: period_secs,
            last_merged_ns,
            merged_txn_ids: Vec::new(),
        }
    }

    fn setup(store: &mut MemoryStore, view: &View) {
        catalog::create_view(store, view.last_merged_ns, "V", &view.predicate, "5").unwrap();
        catalog::store_view(store, "V", view).unwrap();
    }

    #[test]
    fn test_within_period_goes_pending() {
        let mut store = MemoryStore::new();
        let view = test_view(0, 5);
        setup(&mut store, &view);

        let merged = record_txn(&mut store, "V", &view, "t1", NANOS_PER_SEC).unwrap();
        assert!(!merged);

        // Index untouched, id served from the tail.
        let stored = catalog::load_view(&mut store, "V").unwrap().unwrap();
        assert!(stored.merged_txn_ids.is_empty());
        assert_eq!(stored.last_merged_ns, 0);
        assert_eq!(retrieve(&mut store, "V", 2 * NANOS_PER_SEC).unwrap(), vec!["t1"]);
    }

    #[test]
    fn test_exactly_equal_elapsed_is_not_due() {
        let mut store = MemoryStore::new();
        let view = test_view(0, 5);
        setup(&mut store, &view);

        assert!(!record_txn(&mut store, "V", &view, "t1", 5 * NANOS_PER_SEC).unwrap());
        assert!(record_txn(&mut store, "V", &view, "t2", 5 * NANOS_PER_SEC + 1).unwrap());
    }

    #[test]
    fn test_consolidation_folds_window_in_order() {
        let mut store = MemoryStore::new();
        let view = test_view(0, 5);
        setup(&mut store, &view);

        assert!(!record_txn(&mut store, "V", &view, "t1", 1).unwrap());
        assert!(!record_txn(&mut store, "V", &view, "t2", 2).unwrap());

        let now = 6 * NANOS_PER_SEC;
        assert!(record_txn(&mut store, "V", &view, "t3", now).unwrap());

        let stored = catalog::load_view(&mut store, "V").unwrap().unwrap();
        assert_eq!(stored.merged_txn_ids, vec!["t1", "t2", "t3"]);
        assert_eq!(stored.last_merged_ns, now);

        // Everything is now sourced from the index; the tail is empty.
        assert_eq!(
            retrieve(&mut store, "V", now + 1).unwrap(),
            vec!["t1", "t2", "t3"]
        );
    }

    #[test]
    fn test_retrieve_performs_no_writes() {
        let mut store = MemoryStore::new();
        let view = test_view(0, 5);
        setup(&mut store, &view);
        record_txn(&mut store, "V", &view, "t1", 1).unwrap();

        store.take_events();
        retrieve(&mut store, "V", 2).unwrap();
        let events = store.take_events();
        assert!(!events.is_empty());
        assert!(events
            .iter()
            .all(|e| !matches!(e, Event::Put(_, _))));
    }

    #[test]
    fn test_store_failure_propagates() {
        let mut store = MemoryStore::new();
        let view = test_view(0, 5);
        setup(&mut store, &view);
        record_txn(&mut store, "V", &view, "t1", 1).unwrap();

        // The consolidation's window scan fails outright.
        store.fail_after(0);
        let err = record_txn(&mut store, "V", &view, "t2", 6 * NANOS_PER_SEC).unwrap_err();
        assert!(matches!(err, Error::StoreRead(_, _)));

        // Nothing was half-applied.
        store.heal();
        let stored = catalog::load_view(&mut store, "V").unwrap().unwrap();
        assert!(stored.merged_txn_ids.is_empty());
        assert_eq!(stored.last_merged_ns, 0);
    }
}
