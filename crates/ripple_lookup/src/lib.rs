//! Recording of symbol lookups and the persistent index built from them.
//!
//! While a pass compiles, every name resolution is reported to a
//! [`LookupTracker`]. After the pass the recorded lookups replace the
//! previous entries of the compiled files in the [`LookupStorage`], an
//! inverted index from [`LookupSymbol`] to the files that referenced it.

#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod symbol;
pub mod tracker;

pub use error::LookupError;
pub use storage::LookupStorage;
pub use symbol::LookupSymbol;
pub use tracker::{make_lookup_tracker, DoNothingLookupTracker, LookupTracker, RecordingLookupTracker};
