//! Per-view transaction indexes over an ordered keyed store.
//!
//! Each named view carries a predicate; every transaction whose public
//! argument satisfies it is recorded under the view, first in a time-keyed
//! pending log and eventually, once the view's merge period has elapsed,
//! folded into a durable merged index. There are no timers and no background
//! work: consolidation happens inline on the write path, and reads combine
//! the merged index with a range scan of the not-yet-merged tail. The store
//! itself only needs get, put, and lexicographic range scans, and no delete.
//!
//! The core is a deterministic function of (store content, call arguments).
//! The host supplies the clock and txn ids via [`CallEnv`], must serialize
//! calls touching one view, and owns per-call atomicity; see
//! [`contract::ViewContract`].

pub mod catalog;
pub mod contract;
pub mod encoding;
pub mod error;
pub mod pending;
pub mod predicate;
pub mod store;
pub mod view;

pub use contract::{CallEnv, MatchOutcome, ViewContract};
pub use error::{Error, Result};
pub use store::{KeyedStore, MemoryStore};
