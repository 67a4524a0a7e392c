//! Work partitioning for one beam step.
//!
//! Parents are split into contiguous index ranges; parent `i`'s children
//! always land at output slots `2i` and `2i+1`, so every worker owns a
//! disjoint output slice and the step's result is byte-identical no matter
//! how many threads run it. The pool's implicit join is the only barrier.

use rayon::prelude::*;

use crate::beam::Candidate;
use crate::error::Error;
use crate::score::Scorer;

pub(crate) struct Dispatcher {
    pool: rayon::ThreadPool,
}

impl Dispatcher {
    /// `workers == 0` means one per hardware thread.
    pub fn new(workers: u32) -> Result<Self, Error> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers as usize)
            .thread_name(|i| format!("ht2-worker-{i}"))
            .build()
            .map_err(|e| Error::resource(format!("worker pool: {e}")))?;
        Ok(Dispatcher { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Fork and rescore every parent into `out` (length `2 * parents.len()`).
    pub fn extend_into(
        &self,
        scorer: &Scorer<'_>,
        parents: &[Candidate],
        depth: u32,
        out: &mut [Candidate],
    ) {
        debug_assert_eq!(out.len(), 2 * parents.len());
        let chunk = parents.len().div_ceil(self.workers()).max(1);
        self.pool.install(|| {
            parents
                .par_chunks(chunk)
                .zip(out.par_chunks_mut(2 * chunk))
                .for_each(|(src, dst)| {
                    for (j, parent) in src.iter().enumerate() {
                        let (c0, c1) = scorer.extend(parent, depth);
                        dst[2 * j] = c0;
                        dst[2 * j + 1] = c1;
                    }
                });
        });
    }
}
