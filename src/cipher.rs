//! HiTag2 cipher core: 48-bit LFSR plus nonlinear output filter.
//!
//! Constants and the init schedule follow the reference `hitagcrypto.c`
//! exactly; the clocking uses the Galois register form, which is
//! output-identical to the textbook Fibonacci form but one branch per bit.

use std::fmt;
use std::str::FromStr;

use crate::encoding::{byte_swap6, rev64};
use crate::error::Error;

pub const STATE_BITS: u32 = 48;
pub const STATE_MASK: u64 = (1 << STATE_BITS) - 1;

/// Filter component tables: two 4-to-1 layers feeding a 5-to-1 combiner.
pub const FILTER_A: u16 = 0x2C79;
pub const FILTER_B: u16 = 0x6671;
pub const FILTER_C: u32 = 0x7907_287B;

/// Galois feedback polynomial of the reference implementation.
pub const LFSR_POLY: u64 = 0xB380_8322_0073;

/// The 20 state-bit positions the output filter reads, grouped by the
/// component table that consumes them (index bit 0 first within a group).
pub const FILTER_GROUPS: [[u8; 4]; 5] = [
    [1, 2, 4, 5],
    [7, 11, 13, 14],
    [16, 20, 22, 25],
    [27, 28, 30, 32],
    [33, 42, 43, 45],
];

/// Component table applied to each group: `fa`, `fb`, `fb`, `fb`, `fa`.
pub const GROUP_TABLES: [u16; 5] = [FILTER_A, FILTER_B, FILTER_B, FILTER_B, FILTER_A];

/// Nonlinear output filter: 48-bit state to one keystream bit.
#[inline]
pub fn filter(s: u64) -> u64 {
    let b0 = ((s >> 1) & 3) | ((s >> 2) & 0xC);
    let b1 = ((s >> 7) & 1) | ((s >> 10) & 2) | ((s >> 11) & 0xC);
    let b2 = ((s >> 16) & 1) | ((s >> 19) & 2) | ((s >> 20) & 4) | ((s >> 22) & 8);
    let b3 = ((s >> 27) & 3) | ((s >> 28) & 4) | ((s >> 29) & 8);
    let b4 = ((s >> 33) & 1) | ((s >> 41) & 6) | ((s >> 42) & 8);

    let mut idx = (u64::from(FILTER_A) >> b0) & 0x01;
    idx |= ((u64::from(FILTER_B) << 1) >> b1) & 0x02;
    idx |= ((u64::from(FILTER_B) << 2) >> b2) & 0x04;
    idx |= ((u64::from(FILTER_B) << 3) >> b3) & 0x08;
    idx |= ((u64::from(FILTER_A) << 4) >> b4) & 0x10;

    (u64::from(FILTER_C) >> idx) & 1
}

/// A 48-bit HiTag2 key in internal (cipher loading order) form.
///
/// The canonical external form is 12 hex chars; the two are related by
/// `display = byte_swap6(rev64(internal))`, same as the reference tools.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Key(u64);

impl Key {
    pub fn from_internal(v: u64) -> Self {
        Key(v & STATE_MASK)
    }

    pub fn internal(self) -> u64 {
        self.0
    }

    pub fn display_value(self) -> u64 {
        byte_swap6(rev64(self.0))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:012X}", self.display_value())
    }
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.len() != 12 {
            return Err(Error::invalid_input(format!(
                "key must be 12 hex chars, got {:?}",
                s
            )));
        }
        let display = u64::from_str_radix(s, 16)
            .map_err(|_| Error::invalid_input(format!("bad hex key {:?}", s)))?;
        Ok(Key(rev64(byte_swap6(display)) & STATE_MASK))
    }
}

/// Keystream generator state.
///
/// `state` is the shift register the filter reads; `lfsr` is the companion
/// Galois register that drives the feedback decision, derived from `state`
/// once at init.
#[derive(Clone, Copy)]
pub struct Hitag2 {
    state: u64,
    lfsr: u64,
}

impl Hitag2 {
    /// Load the cipher from (key, uid, iv).
    ///
    /// Schedule: UID and the low key half preload the register, then 32 bits
    /// of `iv ^ key_high` are absorbed while the filter output folds back in
    /// (16 rounds, the upper IV half, 15 rounds, one unshifted final round).
    pub fn init(key: Key, uid: u32, iv: u32) -> Self {
        let key = key.0;
        let mut state: u64 = ((key & 0xFFFF) << 32) | u64::from(uid);
        let mut iv = u64::from(iv ^ (key >> 16) as u32);

        state |= (iv & 0xFFFF) << 48;
        iv >>= 16;
        state >>= 1;

        for _ in 0..16 {
            state = (state >> 1) ^ (filter(state) << 46);
        }
        state |= (iv & 0xFFFF) << 47;
        for _ in 0..15 {
            state = (state >> 1) ^ (filter(state) << 46);
        }
        state ^= filter(state) << 47;
        state &= STATE_MASK;

        // Companion Galois register, from the reference derivation.
        let t = state ^ (state >> 1);
        let lfsr = (state
            ^ (state >> 6)
            ^ (state >> 16)
            ^ (state >> 26)
            ^ (state >> 30)
            ^ (state >> 41)
            ^ (t >> 2)
            ^ (t >> 7)
            ^ (t >> 22)
            ^ (t >> 42)
            ^ (t >> 46))
            & STATE_MASK;

        Hitag2 { state, lfsr }
    }

    /// Post-init register contents.
    pub fn state(&self) -> u64 {
        self.state
    }

    /// One clock: shift, feed back, emit one keystream bit.
    #[inline]
    pub fn step(&mut self) -> u64 {
        if self.lfsr & 1 != 0 {
            self.state = (self.state >> 1) | (1 << 47);
            self.lfsr = (self.lfsr >> 1) ^ LFSR_POLY;
        } else {
            self.state >>= 1;
            self.lfsr >>= 1;
        }
        filter(self.state)
    }

    /// Next 32 keystream bits, MSB-first (the reference test-vector order).
    pub fn word(&mut self) -> u32 {
        let mut w = 0u32;
        for _ in 0..32 {
            w = (w << 1) | self.step() as u32;
        }
        w
    }

    /// Next `n` keystream bits packed LSB-first: bit `t` of the result is
    /// the `t`-th output bit. This is the order observations are stored in.
    pub fn bits(&mut self, n: u32) -> u64 {
        debug_assert!(n <= 64);
        let mut w = 0u64;
        for t in 0..n {
            w |= self.step() << t;
        }
        w
    }
}

/// First `n` keystream bits for (key, uid, iv), LSB-first.
pub fn keystream(key: Key, uid: u32, iv: u32, n: u32) -> u64 {
    Hitag2::init(key, uid, iv).bits(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::rev32;

    // Reference vector from hitagcrypto.c: key "ONMIKR", 128 keystream bits.
    const MIKRON_KEY: &str = "4F4E4D494B52";

    #[test]
    fn mikron_key_parses_to_internal_form() {
        let key: Key = MIKRON_KEY.parse().unwrap();
        assert_eq!(key.internal(), 0x4AD2_92B2_72F2);
        assert_eq!(key.to_string(), MIKRON_KEY);
    }

    #[test]
    fn mikron_init_state() {
        let key: Key = MIKRON_KEY.parse().unwrap();
        let serial = rev32(0x6957_4349);
        let iv = rev32(0x7245_6E65);
        assert_eq!(serial, 0x96EA_C292);
        assert_eq!(iv, 0x4EA2_76A6);

        let cipher = Hitag2::init(key, serial, iv);
        assert_eq!(cipher.state(), 0x1AA0_AFDA_72F2);
    }

    #[test]
    fn mikron_keystream() {
        let key: Key = MIKRON_KEY.parse().unwrap();
        let mut cipher = Hitag2::init(key, rev32(0x6957_4349), rev32(0x7245_6E65));

        // Expected: D7 23 7F CE 8C D0 37 A9 57 49 C1 E6 48 00 8A B6
        assert_eq!(cipher.word(), 0xD723_7FCE);
        assert_eq!(cipher.word(), 0x8CD0_37A9);
        assert_eq!(cipher.word(), 0x5749_C1E6);
        assert_eq!(cipher.word(), 0x4800_8AB6);
    }

    #[test]
    fn bits_is_word_reversed() {
        let key: Key = MIKRON_KEY.parse().unwrap();
        let word = Hitag2::init(key, 0x1234_5678, 0).word();
        let bits = keystream(key, 0x1234_5678, 0, 32) as u32;
        assert_eq!(bits, word.reverse_bits());
    }

    #[test]
    fn keystream_is_deterministic() {
        let key = Key::from_internal(0x0123_4567_89AB);
        let a = keystream(key, 0xAABB_CCDD, 0xDEAD_BEEF, 64);
        let b = keystream(key, 0xAABB_CCDD, 0xDEAD_BEEF, 64);
        assert_eq!(a, b);
    }

    #[test]
    fn filter_tables_are_balanced() {
        assert_eq!(FILTER_A.count_ones(), 8);
        assert_eq!(FILTER_B.count_ones(), 8);
        assert_eq!(FILTER_C.count_ones(), 16);
    }

    #[test]
    fn key_display_round_trips() {
        for s in ["4F4E4D494B52", "AABBCCDDEEFF", "112233445566", "000000000001"] {
            let key: Key = s.parse().unwrap();
            assert_eq!(key.to_string(), s);
        }
    }
}
