//! Key schedule of one messaging session.
//!
//! A [`SessionKeys`] binds one local and one remote Diffie-Hellman key
//! generation and derives from them the per-direction cipher keys, MAC keys
//! and counters. [`KeyGrid`] holds the four bindings a session keeps while
//! key generations rotate.

mod counter;
pub mod crypto;
mod error;
mod grid;
pub mod kdf;
mod keys;
pub mod mpi;
mod role;

pub use counter::{CounterLayout, NonceCounters, COUNTER_LEN, TOP_HALF_LEN};
pub use error::Error;
pub use grid::KeyGrid;
pub use kdf::{CipherKey, Direction, MacKey};
pub use keys::{MacKeyUsage, SessionKeys, Slot};
pub use role::{resolve_role, Role};

pub type Result<T> = std::result::Result<T, Error>;
