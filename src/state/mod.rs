//! State module for tracking crawl progress
//!
//! Every item reference handed out by an enumerator walks a small state machine:
//!
//! ```text
//! Pending ──► Skipped                      (already in the ledger)
//! Pending ──► Fetching ──► Extracted       (fetched and extracted)
//!                     └──► FetchFailed     (transport failure)
//! ```

mod item_state;

pub use item_state::ItemState;
