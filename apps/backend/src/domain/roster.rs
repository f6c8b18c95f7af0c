//! Splits a queue into confirmed and waitlisted entries.

use crate::domain::group::Entry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub confirmed: Vec<&'a Entry>,
    pub waitlisted: Vec<&'a Entry>,
}

/// Order entries by `(signup_time, seq)` and give the first `limit` a slot.
///
/// The sort is stable, so entries equal on both keys keep stored order.
pub fn resolve(entries: &[Entry], limit: usize) -> Resolution<'_> {
    let mut confirmed: Vec<&Entry> = entries.iter().collect();
    confirmed.sort_by_key(|e| (e.signup_time, e.seq));

    let waitlisted = confirmed.split_off(limit.min(confirmed.len()));
    Resolution {
        confirmed,
        waitlisted,
    }
}
