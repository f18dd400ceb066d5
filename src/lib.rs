//! chain-hashmap: a single-threaded hash table using separate chaining,
//! FNV-1a hashing and power-of-two bucket arrays.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small string-keyed map whose structural invariants can be
//!   checked directly after every mutation.
//! - Pieces:
//!   - `fnv`: 32-bit FNV-1a over the canonical key bytes.
//!   - `key::CanonicalKey`: converts the table's declared key type into the
//!     string that is hashed and compared.
//!   - `ChainedHashMap<K, V>`: bucket array of chains; each entry stores its
//!     key text, cached hash and value.
//!   - `config::TableConfig`: initial capacity and growth threshold.
//!   - `search`: a line-matching helper with a fixed worker pool
//!     (`LineSearcher`, reusable across searches); it does not touch the
//!     table.
//!
//! Constraints
//! - Capacity is a power of two; the bucket index is `hash & (capacity - 1)`.
//! - Keys are unique; equality is cached-hash first, key text second.
//! - `len / capacity < threshold` after every operation returns.
//! - Growth only happens in `put` for a new key, and never shrinks.
//!
//! Growth
//! - The threshold is checked against the length the table would have
//!   after inserting the new key. If it would be reached, capacity doubles
//!   (repeatedly, if needed) before the insert.
//! - Rehashing uses each entry's cached hash; the key is never hashed again.
//! - Every allocation for the new bucket array is made before any entry
//!   moves. A failed allocation or capacity overflow leaves the table's
//!   entries untouched; `try_put` reports it, `put` panics.
//!
//! Key conversion
//! - Each table declares one key type. Non-string keys are stored under
//!   their canonical text, so distinct values with the same text are the
//!   same key (`1u8` and `1u64`, for example).
//!
//! Threading
//! - No internal synchronization. All mutation takes `&mut self`; to share
//!   a table between threads, wrap it in a lock.
//!
//! Notes and non-goals
//! - No persistence, no open addressing, no shrinking.
//! - Removal swaps the bucket's last entry into the hole; iteration order
//!   is unspecified and changes across growth and removal.

pub mod chained_hash_map;
mod chained_hash_map_proptest;
pub mod config;
pub mod fnv;
pub mod key;
pub mod search;

// Public surface
pub use chained_hash_map::{ChainedHashMap, TableError};
pub use config::{ConfigError, TableConfig, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR};
pub use fnv::hash_key;
pub use key::CanonicalKey;
pub use search::{
    search_file, search_lines, search_lines_parallel, LineSearcher, SearchConfig, SearchError,
};
