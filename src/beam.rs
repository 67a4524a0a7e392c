//! Beam search over partial keys: fork, rescore, cap, repeat 48 times.

use std::cmp::Ordering;

use crate::cipher::STATE_BITS;
use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::observe::ObservationSet;
use crate::recover::AttackParams;
use crate::score::Scorer;

/// A partial key and its accumulated log-likelihood. The number of valid
/// low bits is carried by the beam, not the candidate: every candidate in a
/// beam has the same length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub bits: u64,
    pub score: f64,
}

impl Candidate {
    pub const EMPTY: Candidate = Candidate { bits: 0, score: 0.0 };
}

/// The deterministic comparator: better scores first, ties to the smaller
/// partial-key value. Total order, so the surviving top-T set is unique.
pub fn ranked(a: &Candidate, b: &Candidate) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.bits.cmp(&b.bits))
}

/// Keep the best `cap` candidates. Selection, not a full sort: only the
/// cap boundary needs placing.
fn prune(buf: &mut Vec<Candidate>, cap: usize) {
    if buf.len() > cap {
        buf.select_nth_unstable_by(cap - 1, ranked);
        buf.truncate(cap);
    }
}

/// One attack run's search state: scorer, worker pool, and the two
/// pre-allocated candidate buffers that swap roles every step.
pub struct BeamSearch<'a> {
    scorer: Scorer<'a>,
    dispatcher: Dispatcher,
    cur: Vec<Candidate>,
    next: Vec<Candidate>,
    cap: usize,
    depth: u32,
}

impl<'a> BeamSearch<'a> {
    pub fn new(uid: u32, obs: &'a ObservationSet, params: &AttackParams) -> Result<Self, Error> {
        if params.table_size < 2 {
            return Err(Error::invalid_input(format!(
                "table size must be at least 2, got {}",
                params.table_size
            )));
        }
        if !(0.0..0.5).contains(&params.epsilon) {
            return Err(Error::invalid_input(format!(
                "epsilon must be in [0, 0.5), got {}",
                params.epsilon
            )));
        }

        let cap = params.table_size as usize;
        let mut cur = Vec::new();
        let mut next = Vec::new();
        for buf in [&mut cur, &mut next] {
            buf.try_reserve_exact(2 * cap)
                .map_err(|e| Error::resource(format!("beam buffer of {} candidates: {e}", 2 * cap)))?;
        }
        cur.push(Candidate::EMPTY);

        Ok(BeamSearch {
            scorer: Scorer::new(uid, obs, params.epsilon),
            dispatcher: Dispatcher::new(params.workers)?,
            cur,
            next,
            cap,
            depth: 0,
        })
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn workers(&self) -> usize {
        self.dispatcher.workers()
    }

    /// Survivors of the last completed step.
    pub fn beam(&self) -> &[Candidate] {
        &self.cur
    }

    /// One step: fork every survivor into both extensions, rescore them in
    /// parallel, cap to the table size, swap buffers.
    pub fn advance(&mut self) {
        debug_assert!(self.depth < STATE_BITS);
        self.next.clear();
        self.next.resize(2 * self.cur.len(), Candidate::EMPTY);
        self.dispatcher
            .extend_into(&self.scorer, &self.cur, self.depth, &mut self.next);
        prune(&mut self.next, self.cap);
        std::mem::swap(&mut self.cur, &mut self.next);
        self.depth += 1;

        if tracing::enabled!(tracing::Level::DEBUG) {
            let best = self
                .cur
                .iter()
                .map(|c| c.score)
                .fold(f64::NEG_INFINITY, f64::max);
            tracing::debug!(
                depth = self.depth,
                survivors = self.cur.len(),
                best_score = best,
                "beam advanced"
            );
        }
    }

    /// Run the remaining steps and return the final 48-bit beam.
    pub fn run(&mut self) -> &[Candidate] {
        while self.depth < STATE_BITS {
            self.advance();
        }
        &self.cur
    }
}
