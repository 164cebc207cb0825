//! Installed package bookkeeping
//!
//! Receipts record what an install placed under the prefix, so packages can be
//! listed, upgraded cleanly and uninstalled.

mod discovery;
mod receipt;

pub use discovery::find_all_receipts;
pub use receipt::Receipt;
