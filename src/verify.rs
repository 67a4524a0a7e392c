//! Exact re-encryption check over the final beam.

use crate::beam::{ranked, Candidate};
use crate::cipher::{keystream, Key};
use crate::observe::ObservationSet;

/// Walk the final beam best-score-first (ties to the smaller state) and
/// accept the first key that reproduces every observation bit-for-bit over
/// its full stored length. `None` means the table was too small, not that
/// anything went wrong.
pub fn first_match(uid: u32, obs: &ObservationSet, beam: &[Candidate]) -> Option<Key> {
    let mut order = beam.to_vec();
    order.sort_unstable_by(ranked);
    order
        .iter()
        .map(|c| Key::from_internal(c.bits))
        .find(|&key| matches_all(key, uid, obs))
}

/// Does this key replay every observed keystream exactly?
pub fn matches_all(key: Key, uid: u32, obs: &ObservationSet) -> bool {
    obs.iter()
        .all(|o| keystream(key, uid, o.iv, o.len()) == o.keystream())
}
