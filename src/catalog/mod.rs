use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;

use crate::{
    encoding,
    error::{Error, Result},
    store::KeyedStore,
};

/// Durable per-view record. Everything consolidation touches lives under one
/// key, so advancing the index and the merge boundary is a single put.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    pub predicate: String,
    /// Minimum interval between consolidations, parsed and validated once at
    /// creation.
    pub merge_period_secs: u64,
    /// Lower bound of the live pending window. Never decreases.
    pub last_merged_ns: u64,
    /// Consolidated ids, append-only, in consolidation order.
    pub merged_txn_ids: Vec<String>,
}

/// Registers a view. The name must be non-empty and free of NUL (the key
/// separator); the period arrives as a string from the host dispatcher and
/// is parsed here, once. Re-registering an existing name is rejected rather
/// than overwritten.
pub fn create_view<S: KeyedStore>(
    store: &mut S,
    now_ns: u64,
    name: &str,
    predicate: &str,
    period_secs: &str,
) -> Result<()> {
    if name.is_empty() || name.contains('\0') {
        return Err(Error::InvalidArgument(format!(
            "view name {:?} is empty or contains NUL",
            name
        )));
    }
    let period: u64 = period_secs.trim().parse().map_err(|_| {
        Error::InvalidArgument(format!("unparseable merge period {:?}", period_secs))
    })?;

    if load_view(store, name)?.is_some() {
        return Err(Error::AlreadyExists(name.to_owned()));
    }

    let mut names = list_views(store)?;
    names.push(name.to_owned());
    put_json(store, encoding::CATALOG_KEY, &names)?;

    let view = View {
        predicate: predicate.to_owned(),
        merge_period_secs: period,
        last_merged_ns: now_ns,
        merged_txn_ids: Vec::new(),
    };
    store_view(store, name, &view)?;

    info!(view = name, predicate, period_secs = period, "created view");
    Ok(())
}

/// All registered view names, in creation order.
pub fn list_views<S: KeyedStore>(store: &mut S) -> Result<Vec<String>> {
    Ok(get_json(store, encoding::CATALOG_KEY)?.unwrap_or_default())
}

pub fn load_view<S: KeyedStore>(store: &mut S, name: &str) -> Result<Option<View>> {
    get_json(store, &encoding::view_key(name))
}

/// Load of a view the catalog claims exists; a missing record here is a
/// store inconsistency, not an empty read.
pub fn must_load_view<S: KeyedStore>(store: &mut S, name: &str) -> Result<View> {
    load_view(store, name)?.ok_or_else(|| Error::NotFound(name.to_owned()))
}

pub fn store_view<S: KeyedStore>(store: &mut S, name: &str, view: &View) -> Result<()> {
    put_json(store, &encoding::view_key(name), view)
}

fn get_json<T: DeserializeOwned, S: KeyedStore>(store: &mut S, key: &[u8]) -> Result<Option<T>> {
    match store.get(key).map_err(|e| Error::store_read(key, e))? {
        None => Ok(None),
        Some(bytes) => Ok(Some(
            serde_json::from_slice(&bytes).map_err(|e| Error::decode(key, e.into()))?,
        )),
    }
}

fn put_json<T: Serialize, S: KeyedStore>(store: &mut S, key: &[u8], value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value).map_err(|e| Error::decode(key, e.into()))?;
    store.put(key, &bytes).map_err(|e| Error::store_write(key, e))
}

#[cfg(test)]
mod test {
    use crate::{error::Error, store::MemoryStore};

    use super::{create_view, list_views, load_view, must_load_view};

    #[test]
    fn test_create_and_load() {
        let mut store = MemoryStore::new();
        create_view(&mut store, 7, "V", "tagA", "5").unwrap();

        let view = load_view(&mut store, "V").unwrap().unwrap();
        assert_eq!(view.predicate, "tagA");
        assert_eq!(view.merge_period_secs, 5);
        assert_eq!(view.last_merged_ns, 7);
        assert!(view.merged_txn_ids.is_empty());

        assert!(load_view(&mut store, "W").unwrap().is_none());
    }

    #[test]
    fn test_recreation_is_rejected() {
        let mut store = MemoryStore::new();
        create_view(&mut store, 1, "V", "tagA", "5").unwrap();

        let err = create_view(&mut store, 2, "V", "tagB", "9").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        // The original record is untouched.
        let view = load_view(&mut store, "V").unwrap().unwrap();
        assert_eq!(view.predicate, "tagA");
        assert_eq!(view.last_merged_ns, 1);
    }

    #[test]
    fn test_invalid_arguments() {
        let mut store = MemoryStore::new();
        for (name, period) in [("V", "five"), ("V", ""), ("", "5"), ("a\0b", "5")] {
            let err = create_view(&mut store, 1, name, "tagA", period).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "{:?}", err);
        }
        assert!(list_views(&mut store).unwrap().is_empty());
    }

    #[test]
    fn test_catalog_keeps_creation_order() {
        let mut store = MemoryStore::new();
        for name in ["c", "a", "b"] {
            create_view(&mut store, 1, name, "tagA", "5").unwrap();
        }
        assert_eq!(list_views(&mut store).unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_must_load_missing_record() {
        let mut store = MemoryStore::new();
        let err = must_load_view(&mut store, "ghost").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
