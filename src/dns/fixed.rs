//! Fixed-table lookup.
//!
//! Serves answers from an in-memory table. A host may be given a sequence of
//! answers, returned one per lookup (the last one repeats), which is how a
//! rebinding name behaves.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::lookup::{HostLookup, LookupFuture};
use crate::error_handling::ResolutionError;

/// [`HostLookup`] over a static name table.
#[derive(Default)]
pub struct FixedLookup {
    hosts: Mutex<HashMap<String, VecDeque<Vec<IpAddr>>>>,
    txt: HashMap<String, Vec<String>>,
    ip_lookups: AtomicUsize,
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

impl FixedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `host` to `addrs` for every lookup.
    pub fn with_host(self, host: &str, addrs: &[IpAddr]) -> Self {
        self.with_host_sequence(host, vec![addrs.to_vec()])
    }

    /// Maps `host` to a sequence of answers, one per lookup.
    pub fn with_host_sequence(self, host: &str, answers: Vec<Vec<IpAddr>>) -> Self {
        self.hosts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(normalize(host), answers.into());
        self
    }

    /// Adds TXT records for `name`.
    pub fn with_txt(mut self, name: &str, records: &[&str]) -> Self {
        self.txt.insert(
            normalize(name),
            records.iter().map(|r| r.to_string()).collect(),
        );
        self
    }

    /// Number of address lookups served so far.
    pub fn ip_lookup_count(&self) -> usize {
        self.ip_lookups.load(Ordering::SeqCst)
    }
}

impl HostLookup for FixedLookup {
    fn lookup_ip<'a>(&'a self, host: &'a str) -> LookupFuture<'a, Vec<IpAddr>> {
        Box::pin(async move {
            self.ip_lookups.fetch_add(1, Ordering::SeqCst);
            let mut hosts = self
                .hosts
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let answers = hosts
                .get_mut(&normalize(host))
                .ok_or_else(|| ResolutionError::NotFound(host.to_string()))?;
            let answer = if answers.len() > 1 {
                answers.pop_front().unwrap_or_default()
            } else {
                answers.front().cloned().unwrap_or_default()
            };
            if answer.is_empty() {
                return Err(ResolutionError::NotFound(host.to_string()));
            }
            Ok(answer)
        })
    }

    fn lookup_txt<'a>(&'a self, name: &'a str) -> LookupFuture<'a, Vec<String>> {
        Box::pin(async move {
            self.txt
                .get(&normalize(name))
                .cloned()
                .ok_or_else(|| ResolutionError::NotFound(name.to_string()))
        })
    }
}
