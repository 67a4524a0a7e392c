//! Fast correlation attack on the HiTag2 stream cipher.
//!
//! Recovers the 48-bit key of a HiTag2 tag from a handful of eavesdropped
//! (encrypted nonce, authenticator) pairs, following the attack of Garcia,
//! Oswald, Kasper and Pavlides, "Lock It and Still Lose It" (USENIX
//! Security 2016): a bounded beam search over partial keys, ranked by a
//! correlation score the output filter leaks, finished by exact
//! re-encryption of every observation.
//!
//! ```no_run
//! use ht2crack::{recover_key, sim, AttackParams, Key, ObservationSet};
//!
//! let key: Key = "4F4E4D494B52".parse().unwrap();
//! let uid = 0xAABBCCDD;
//! let obs = ObservationSet::new(sim::generate_observations(key, uid, 16, 42), 32).unwrap();
//!
//! let params = AttackParams { table_size: 2_000_000, ..AttackParams::default() };
//! match recover_key(uid, &obs, &params) {
//!     Ok(found) => assert_eq!(found, key),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub mod beam;
pub mod cipher;
mod dispatch;
pub mod encoding;
pub mod error;
pub mod observe;
pub mod recover;
pub mod score;
pub mod sim;
pub mod verify;

pub use beam::{BeamSearch, Candidate};
pub use cipher::{keystream, Hitag2, Key};
pub use error::Error;
pub use observe::{Observation, ObservationSet};
pub use recover::{recover_key, AttackParams};
