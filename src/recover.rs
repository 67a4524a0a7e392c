//! The attack entry point.

use tracing::{debug, info};

use crate::beam::BeamSearch;
use crate::cipher::Key;
use crate::error::Error;
use crate::observe::ObservationSet;
use crate::verify;

/// Attack tuning knobs.
///
/// `table_size` (T) is the main time/success trade-off: the true key is
/// recovered exactly when its prefix survives all 48 pruning rounds, and a
/// wider table survives more. 800k is a workable default; 2M is the
/// recommended setting for 16-nonce captures.
#[derive(Clone, Copy, Debug)]
pub struct AttackParams {
    /// Maximum candidates kept per beam step.
    pub table_size: u32,
    /// Worker threads; 0 means one per hardware thread.
    pub workers: u32,
    /// Assumed keystream error rate for the log-likelihood weights.
    pub epsilon: f64,
}

impl Default for AttackParams {
    fn default() -> Self {
        AttackParams {
            table_size: 800_000,
            workers: 0,
            epsilon: 0.25,
        }
    }
}

/// Recover the 48-bit key behind a set of eavesdropped (IV, keystream)
/// pairs from the tag `uid`.
///
/// `Err(NoKeyFound)` is a legitimate outcome for a table that is too small;
/// it is distinct from input errors by construction.
pub fn recover_key(
    uid: u32,
    observations: &ObservationSet,
    params: &AttackParams,
) -> Result<Key, Error> {
    let mut search = BeamSearch::new(uid, observations, params)?;
    let uid_hex = format!("{uid:08X}");
    info!(
        uid = %uid_hex,
        nonces = observations.len(),
        window = observations.window(),
        table_size = params.table_size,
        workers = search.workers(),
        epsilon = params.epsilon,
        "starting beam search"
    );

    let beam = search.run();
    debug!(final_beam = beam.len(), "search done, verifying candidates");

    let key = verify::first_match(uid, observations, beam).ok_or(Error::NoKeyFound)?;
    info!(key = %key, "key verified against all observations");
    Ok(key)
}
