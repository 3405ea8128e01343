use std::{cell::RefCell, collections::BTreeMap, ops::Bound, rc::Rc};

use anyhow::bail;

/// The ordered keyed substrate everything runs against. Hosts adapt their
/// store to this; `MemoryStore` below is the embedded reference
/// implementation. There is deliberately no delete: dead records are made
/// unreachable by moving scan bounds, never erased.
pub trait KeyedStore {
    fn get(&mut self, key: &[u8]) -> anyhow::Result<Option<Vec<u8>>>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> anyhow::Result<()>;

    /// Entries with `start <= key < end`, in lexicographic byte order.
    fn range_scan(&mut self, start: &[u8], end: &[u8])
        -> anyhow::Result<Vec<(Vec<u8>, Vec<u8>)>>;
}

#[derive(Debug, Clone)]
pub enum Event {
    Get(Vec<u8>),
    Put(Vec<u8>, usize),
    Scan(Vec<u8>, Vec<u8>, usize),
}

#[derive(Debug, Default)]
struct StoreInner {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    events: Vec<Event>,

    // After this many operations, every operation fails until `heal`.
    ops_until_outage: Option<usize>,
}

impl StoreInner {
    fn perform_op(&mut self) -> anyhow::Result<()> {
        match self.ops_until_outage {
            Some(0) => bail!("store is down"),
            Some(n) => {
                self.ops_until_outage = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn record(&mut self, e: Event) {
        self.events.push(e);
    }
}

/// In-memory ordered store. Clones share state, so a test can keep a handle
/// while the core owns another, and inspect the recorded operation events.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every operation after `ops` more have succeeded.
    pub fn fail_after(&self, ops: usize) {
        (*self.inner).borrow_mut().ops_until_outage = Some(ops);
    }

    pub fn heal(&self) {
        (*self.inner).borrow_mut().ops_until_outage = None;
    }

    pub fn take_events(&self) -> Vec<Event> {
        std::mem::take(&mut (*self.inner).borrow_mut().events)
    }

    pub fn len(&self) -> usize {
        (*self.inner).borrow().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyedStore for MemoryStore {
    fn get(&mut self, key: &[u8]) -> anyhow::Result<Option<Vec<u8>>> {
        let mut inner = (*self.inner).borrow_mut();
        inner.perform_op()?;
        inner.record(Event::Get(key.to_vec()));
        Ok(inner.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> anyhow::Result<()> {
        let mut inner = (*self.inner).borrow_mut();
        inner.perform_op()?;
        inner.record(Event::Put(key.to_vec(), value.len()));
        inner.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn range_scan(
        &mut self,
        start: &[u8],
        end: &[u8],
    ) -> anyhow::Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut inner = (*self.inner).borrow_mut();
        inner.perform_op()?;
        let out: Vec<_> = if start >= end {
            Vec::new()
        } else {
            inner
                .data
                .range::<[u8], _>((Bound::Included(start), Bound::Excluded(end)))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        inner.record(Event::Scan(start.to_vec(), end.to_vec(), out.len()));
        Ok(out)
    }
}

#[test]
fn test_scan_is_ordered_and_half_open() -> anyhow::Result<()> {
    let mut store = MemoryStore::new();

    store.put(b"b", b"2")?;
    store.put(b"a", b"1")?;
    store.put(b"c", b"3")?;

    let hits = store.range_scan(b"a", b"c")?;
    assert_eq!(
        hits,
        vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"2".to_vec())
        ]
    );

    // Inverted and empty windows scan nothing.
    assert!(store.range_scan(b"c", b"a")?.is_empty());
    assert!(store.range_scan(b"a", b"a")?.is_empty());

    Ok(())
}

#[test]
fn test_outage_injection() -> anyhow::Result<()> {
    let mut store = MemoryStore::new();
    store.put(b"k", b"v")?;

    store.fail_after(1);
    assert!(store.get(b"k").is_ok());
    assert!(store.get(b"k").is_err());
    assert!(store.put(b"k2", b"v").is_err());

    store.heal();
    assert_eq!(store.get(b"k")?, Some(b"v".to_vec()));

    Ok(())
}
