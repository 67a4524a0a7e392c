//! Eavesdropped (IV, keystream) observations.

use std::io::BufRead;

use crate::encoding::parse_nonce_line;
use crate::error::Error;

/// Default scoring window: the nonce-file format carries exactly 32
/// keystream bits per pair.
pub const DEFAULT_WINDOW: u32 = 32;

/// One captured interaction: the encrypted nonce and the keystream prefix it
/// produced. Keystream bits are packed LSB-first (bit `t` = `t`-th bit).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Observation {
    pub iv: u32,
    ks: u64,
    len: u32,
}

impl Observation {
    pub fn new(iv: u32, ks: u64, len: u32) -> Self {
        debug_assert!(len <= 64);
        Observation {
            iv,
            ks: if len == 64 { ks } else { ks & ((1 << len) - 1) },
            len,
        }
    }

    /// From a 32-bit keystream word in file convention (already de-inverted).
    pub fn from_word(iv: u32, ks: u32) -> Self {
        Observation::new(iv, u64::from(ks), 32)
    }

    #[inline]
    pub fn bit(&self, t: u32) -> u64 {
        (self.ks >> t) & 1
    }

    pub fn keystream(&self) -> u64 {
        self.ks
    }

    pub fn len(&self) -> u32 {
        self.len
    }
}

/// Immutable set of observations from a single tag, all scored over the
/// same window of their first `window` bits.
#[derive(Clone, Debug)]
pub struct ObservationSet {
    obs: Vec<Observation>,
    window: u32,
}

impl ObservationSet {
    pub fn new(obs: Vec<Observation>, window: u32) -> Result<Self, Error> {
        if obs.is_empty() {
            return Err(Error::invalid_input("need at least one observation"));
        }
        if window == 0 || window > 64 {
            return Err(Error::invalid_input(format!(
                "window must be 1..=64 bits, got {window}"
            )));
        }
        if let Some(short) = obs.iter().position(|o| o.len < window) {
            return Err(Error::invalid_input(format!(
                "observation {short} has {} keystream bits, window needs {window}",
                obs[short].len
            )));
        }
        Ok(ObservationSet { obs, window })
    }

    /// Parse the nonce-file format: one `<IV_HEX> <AUTH_HEX>` pair per line,
    /// authenticator = inverted keystream. `limit` keeps only the first N
    /// pairs, matching the driver's `-N` flag.
    pub fn from_reader<R: BufRead>(reader: R, limit: Option<usize>) -> Result<Self, Error> {
        let mut obs = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            if limit.is_some_and(|n| obs.len() >= n) {
                break;
            }
            let line =
                line.map_err(|e| Error::invalid_input(format!("line {}: {e}", idx + 1)))?;
            let (iv, ks) = parse_nonce_line(&line)
                .map_err(|e| Error::invalid_input(format!("line {}: {e}", idx + 1)))?;
            obs.push(Observation::from_word(iv, ks));
        }
        ObservationSet::new(obs, DEFAULT_WINDOW)
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    pub fn len(&self) -> usize {
        self.obs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obs.is_empty()
    }

    pub fn get(&self, i: usize) -> &Observation {
        &self.obs[i]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.obs.iter()
    }
}
