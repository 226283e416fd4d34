//! # Storage Layer
//!
//! Three leaves, dependencies pointing downward:
//!
//! - [`atomic`]: crash-safe single-file replace (temp file + rename). Every
//!   other module persists through it.
//! - [`counter`]: named monotonic counters in one JSON object, used to mint
//!   document numbers.
//! - [`collection`]: a generic record collection in one JSON array file,
//!   with per-collection locking around the read-modify-write cycle.
//! - [`query`]: in-memory filter/sort/paginate over a loaded collection.
//!
//! ## Storage Format
//!
//! ```text
//! data/
//! ├── counters.json           # { "PO": 7, "IMR": 3 }
//! ├── purchase-orders.json    # [ { record }, ... ]
//! └── material-requests.json
//! artifacts/
//! ├── purchase-orders/
//! │   └── PO00007_Acme_Metals_12-03-2026.pdf
//! └── material-requests/
//! ```
//!
//! Durability is single-node, single-writer-per-file, provided purely by
//! atomic replace; there is no WAL and no cross-file transaction.

pub mod atomic;
pub mod collection;
pub mod counter;
pub mod query;

pub use collection::{ArtifactRecord, ArtifactSource, CollectionSpec, CollectionStore};
pub use counter::CounterStore;
pub use query::{ListQuery, Page, SortKey, SortOrder};
