//! DNS resolution and record querying.
//!
//! This module provides the [`HostLookup`] seam and its implementations:
//! - [`HickoryLookup`]: async lookups through `hickory-resolver`
//! - [`FixedLookup`]: answers from an in-memory table
//!
//! plus helpers that pick SPF and DMARC records out of TXT answers.

mod extract;
mod fixed;
mod lookup;
mod records;

// Re-export public API
pub use extract::{
    dmarc_name, dmarc_policy, email_domain, extract_dmarc_records, extract_spf_records,
};
pub use fixed::FixedLookup;
pub use lookup::{HostLookup, LookupFuture};
pub use records::HickoryLookup;
