//! Correlation scorer: log-likelihood of a partial key against observations.
//!
//! A candidate fixes the first `k` key bits in loading order. For each
//! observation those k bits pin down the low k bits of the post-init
//! register, because every bit the init schedule absorbs is
//! `iv_bit ^ key_bit ^ filter(previous window)` and the window only reaches
//! 46 positions back. We keep that per-observation knowledge as a "prefix
//! stream": uid (32 bits), the preloaded key half (16), then the derived
//! register bits, one per known key bit past the 16th.
//!
//! A keystream bit at position `t` reads 20 stream positions; the candidate
//! determines a *prefix* of them (the taps are consumed in ascending
//! position order). For every (known-count, known-values) pair we tabulate
//! the probability that the filter outputs 1 over the uniform completion of
//! the unknown inputs, fold in the assumed observation error rate ε, and
//! store the log-likelihood relative to a coin flip. Fully determined
//! positions therefore contribute exactly log(1-ε) or log(ε) on top of the
//! baseline, undetermined positions contribute exactly 0, and everything in
//! between contributes the correlation signal the attack lives on
//! (Garcia et al., USENIX Security 2016).

use crate::beam::Candidate;
use crate::cipher::{filter, FILTER_C, FILTER_GROUPS, GROUP_TABLES, STATE_MASK};
use crate::observe::ObservationSet;

/// The 20 filter taps flattened in ascending state-bit order.
const FLAT_TAPS: [u8; 20] = {
    let mut out = [0u8; 20];
    let mut g = 0;
    while g < 5 {
        let mut j = 0;
        while j < 4 {
            out[g * 4 + j] = FILTER_GROUPS[g][j];
            j += 1;
        }
        g += 1;
    }
    out
};

/// `TAPS_LE[x]` = number of taps at position <= x.
const TAPS_LE: [u8; 47] = {
    let mut out = [0u8; 47];
    let mut x = 0;
    while x < 47 {
        let mut c = 0u8;
        let mut j = 0;
        while j < 20 {
            if FLAT_TAPS[j] as usize <= x {
                c += 1;
            }
            j += 1;
        }
        out[x] = c;
        x += 1;
    }
    out
};

/// Replacement for log(0) when ε = 0 makes a determined mismatch impossible.
pub const SCORE_FLOOR: f32 = -1024.0;

/// Per-(known-count, known-values) log-likelihood contributions, one entry
/// pair per observed bit value. Built once per run; depends only on ε.
struct LlrTable {
    llr: Vec<[f32; 2]>,
    offset: [usize; 21],
}

impl LlrTable {
    fn build(epsilon: f64) -> Self {
        let mut offset = [0usize; 21];
        for m in 0..20 {
            offset[m + 1] = offset[m] + (1 << m);
        }
        let total = offset[20] + (1 << 20);

        // Count, for every prefix of known inputs, the completions on which
        // the filter outputs 1. Level 20 is the filter itself; each level
        // below merges the two values of its first unknown input.
        let mut ones = vec![0u32; total];
        for v in 0..1u32 << 20 {
            let mut idx = 0u32;
            for g in 0..5 {
                let nib = (v >> (4 * g)) & 0xF;
                idx |= ((u32::from(GROUP_TABLES[g]) >> nib) & 1) << g;
            }
            ones[offset[20] + v as usize] = (FILTER_C >> idx) & 1;
        }
        for m in (0..20).rev() {
            for v in 0..1usize << m {
                ones[offset[m] + v] = ones[offset[m + 1] + v] + ones[offset[m + 1] + v + (1 << m)];
            }
        }

        let mut llr = vec![[0f32; 2]; total];
        for m in 0..=20usize {
            let span = (1u64 << (20 - m)) as f64;
            for v in 0..1usize << m {
                let p1 = f64::from(ones[offset[m] + v]) / span;
                llr[offset[m] + v] = [contribution(1.0 - p1, epsilon), contribution(p1, epsilon)];
            }
        }
        LlrTable { llr, offset }
    }

    #[inline]
    fn get(&self, m: usize, v: u32) -> [f32; 2] {
        self.llr[self.offset[m] + v as usize]
    }
}

/// Log-likelihood of observing a bit whose clean probability is `p_clean`,
/// relative to the 50/50 baseline, under error rate ε.
fn contribution(p_clean: f64, epsilon: f64) -> f32 {
    let p = epsilon + (1.0 - 2.0 * epsilon) * p_clean;
    if p <= 0.0 {
        SCORE_FLOOR
    } else {
        (p.log2() + 1.0) as f32
    }
}

/// Scores candidates for one (uid, observation set, ε) run.
pub struct Scorer<'a> {
    obs: &'a ObservationSet,
    uid: u32,
    table: LlrTable,
}

impl<'a> Scorer<'a> {
    pub fn new(uid: u32, obs: &'a ObservationSet, epsilon: f64) -> Self {
        Scorer {
            obs,
            uid,
            table: LlrTable::build(epsilon),
        }
    }

    /// Number of filter inputs of keystream position `t` determined by `k`
    /// known key bits.
    #[inline]
    fn known_inputs(k: u32, t: u32) -> usize {
        match k.checked_sub(t + 2) {
            Some(avail) => TAPS_LE[avail.min(46) as usize] as usize,
            None => 0,
        }
    }

    /// The stream of bits this candidate determines for one observation:
    /// uid in 0..32, preloaded key half in 32..48, derived register bits
    /// from 48 on. Bit `32 + j` exists for every known key bit `j`.
    fn prefix_stream(&self, iv: u32, bits: u64, k: u32) -> u128 {
        let mut s = u128::from(self.uid) | (u128::from(bits & 0xFFFF) << 32);
        for i in 0..k.saturating_sub(16) {
            let fb = filter((s >> (i + 1)) as u64 & STATE_MASK);
            let b = ((u64::from(iv) >> i) ^ (bits >> (16 + i)) ^ fb) & 1;
            s |= u128::from(b) << (48 + i);
        }
        s
    }

    /// Pack the first `m` filter inputs of position `t` from a stream.
    #[inline]
    fn pack_inputs(stream: u128, t: u32, m: usize) -> u32 {
        let base = 33 + t;
        let mut v = 0u32;
        for (j, &tap) in FLAT_TAPS[..m].iter().enumerate() {
            v |= ((stream >> (base + u32::from(tap))) as u32 & 1) << j;
        }
        v
    }

    /// Fork a parent of `k` known bits into its two children, rescoring only
    /// the keystream positions whose input set the new bit extends. Earlier
    /// contributions ride along inside the parent's score.
    pub fn extend(&self, parent: &Candidate, k: u32) -> (Candidate, Candidate) {
        let w = self.obs.window();
        let mut d0 = 0.0f64;
        let mut d1 = 0.0f64;

        for ob in self.obs.iter() {
            let stream = self.prefix_stream(ob.iv, parent.bits, k);

            // Stream bit 32+k for the key-bit-0 child; the other child is
            // its complement. Past the preloaded half the incoming register
            // bit picks up the IV and the init-time filter output.
            let b0: u32 = if k < 16 {
                0
            } else {
                let i = k - 16;
                (((u64::from(ob.iv) >> i) & 1) ^ filter((stream >> (i + 1)) as u64 & STATE_MASK))
                    as u32
            };

            for (slot, &tap) in FLAT_TAPS.iter().enumerate() {
                let Some(t) = k.checked_sub(u32::from(tap) + 1) else {
                    continue;
                };
                if t >= w {
                    continue;
                }
                let bit = ob.bit(t) as usize;
                debug_assert_eq!(slot, Self::known_inputs(k, t));

                let v = Self::pack_inputs(stream, t, slot);
                let old = self.table.get(slot, v)[bit];
                let new0 = self.table.get(slot + 1, v | (b0 << slot))[bit];
                let new1 = self.table.get(slot + 1, v | ((b0 ^ 1) << slot))[bit];
                d0 += f64::from(new0) - f64::from(old);
                d1 += f64::from(new1) - f64::from(old);
            }
        }

        (
            Candidate {
                bits: parent.bits,
                score: parent.score + d0,
            },
            Candidate {
                bits: parent.bits | (1 << k),
                score: parent.score + d1,
            },
        )
    }

    /// Full (non-incremental) score of a partial key. The beam never calls
    /// this; it anchors the incremental path in tests.
    pub fn score_from_scratch(&self, bits: u64, k: u32) -> f64 {
        let w = self.obs.window();
        let mut total = 0.0f64;
        for ob in self.obs.iter() {
            let stream = self.prefix_stream(ob.iv, bits, k);
            for t in 0..w {
                let m = Self::known_inputs(k, t);
                if m == 0 {
                    continue;
                }
                let v = Self::pack_inputs(stream, t, m);
                total += f64::from(self.table.get(m, v)[ob.bit(t) as usize]);
            }
        }
        total
    }
}
