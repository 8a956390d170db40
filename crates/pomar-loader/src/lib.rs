//! Fragment loader.
//!
//! Reads `fragments/index.txt` for a chunk count, fetches
//! `/fragments/fragment_<n>` strictly in order (each under a timeout, retried
//! on failure), then splices the reassembled HTML into a [`Document`].

pub mod assemble;
mod index;
mod loader;
mod page;
mod source;

pub use assemble::{AssembleError, ParsedDocument, ScriptElement};
pub use index::{FragmentIndex, IndexError};
pub use loader::{
    ContentLoader, FETCH_TIMEOUT, FRAGMENT_DELAY, INDEX_PATH, LAYOUT_REFRESH_DELAY, LoaderConfig,
    LoaderError, RETRY_DELAY, fragment_path,
};
pub use page::{Document, ERROR_PANEL, HeadNode};
pub use source::{FetchError, FragmentSource, HttpSource};
