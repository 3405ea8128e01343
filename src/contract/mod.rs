use tracing::debug;

use crate::{
    catalog, encoding,
    error::{Error, Result},
    predicate,
    store::KeyedStore,
    view,
};

/// Per-call inputs supplied by the host: its clock reading and the unique id
/// of the invocation being processed. Calls touching one view must be
/// serialized by the host and observe strictly increasing `now_ns`; two
/// concurrent threshold-crossing calls would otherwise race to publish
/// different supersets of the same index.
#[derive(Debug, Clone)]
pub struct CallEnv {
    pub now_ns: u64,
    pub txn_id: String,
}

/// What `invoke` did for one satisfied view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub view: String,
    pub merged: bool,
}

/// The operation surface the host dispatcher calls. Owns its handle to the
/// store; everything it does is a deterministic function of store content
/// and the call's `CallEnv`.
#[derive(Debug)]
pub struct ViewContract<S: KeyedStore> {
    store: S,
}

impl<S: KeyedStore> ViewContract<S> {
    pub fn new(store: S) -> Self {
        ViewContract { store }
    }

    pub fn create_view(
        &mut self,
        env: &CallEnv,
        name: &str,
        predicate: &str,
        period_secs: &str,
    ) -> Result<()> {
        catalog::create_view(&mut self.store, env.now_ns, name, predicate, period_secs)
    }

    /// Processes one transaction: stores its private argument opaquely, then
    /// evaluates every registered view's predicate against the public
    /// argument and records the txn id for each view it satisfies, either
    /// into the pending log or via a full consolidation once the view's
    /// merge period has elapsed.
    pub fn invoke(
        &mut self,
        env: &CallEnv,
        pub_arg: &str,
        priv_arg: &str,
    ) -> Result<Vec<MatchOutcome>> {
        let key = encoding::private_arg_key(&env.txn_id);
        self.store
            .put(&key, priv_arg.as_bytes())
            .map_err(|e| Error::store_write(&key, e))?;

        let mut outcomes = Vec::new();
        for name in catalog::list_views(&mut self.store)? {
            let view = catalog::must_load_view(&mut self.store, &name)?;
            if !predicate::satisfies(pub_arg, &view.predicate) {
                continue;
            }
            debug!(view = %name, txn = %env.txn_id, pub_arg, "predicate satisfied");
            let merged =
                view::record_txn(&mut self.store, &name, &view, &env.txn_id, env.now_ns)?;
            outcomes.push(MatchOutcome { view: name, merged });
        }
        Ok(outcomes)
    }

    /// Every id that ever satisfied the view's predicate, each exactly once:
    /// the merged index followed by the not-yet-merged tail. Absent views
    /// read as empty. Pure read, no store writes.
    pub fn retrieve_txn_ids_by_view(&mut self, env: &CallEnv, name: &str) -> Result<Vec<String>> {
        view::retrieve(&mut self.store, name, env.now_ns)
    }

    /// Pass-through read of the opaque payload stored by `invoke`. Whatever
    /// protection the payload carries (hashing, encryption) happened outside
    /// this core; it comes back exactly as stored.
    pub fn get_private_arg(&mut self, txn_id: &str) -> Result<Option<String>> {
        let key = encoding::private_arg_key(txn_id);
        match self.store.get(&key).map_err(|e| Error::store_read(&key, e))? {
            None => Ok(None),
            Some(bytes) => Ok(Some(
                String::from_utf8(bytes).map_err(|e| Error::decode(&key, e.into()))?,
            )),
        }
    }
}
