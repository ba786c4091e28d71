//! Sequential constant groups in the spirit of Go's `iota`.
//!
//! A group is declared member by member. The first member built from the
//! [`iota`] counter leaf establishes a [`Formula`]; every following member
//! declared without a value is derived from that formula at the next counter
//! position:
//!
//! ```
//! use goconst::{const_group, iota};
//!
//! let sizes = const_group! {
//!     Size {
//!         KiB = 1 << (10 * (iota + 1)),
//!         MiB,
//!         GiB,
//!     }
//! }
//! .unwrap();
//!
//! assert_eq!(sizes["MiB"], 1 << 20);
//! ```
//!
//! This crate has no knowledge of records or methods; `gocore` composes it into
//! module activation.

pub mod formula;
pub mod group;
pub mod utils;
pub mod value;

pub use formula::{BinaryOp, Counter, Formula, Operand, iota};
pub use group::{COUNTER_SEED, ConstGroup, ConstSet};
pub use utils::{ConstResult, Error};
pub use value::Value;
