//! Linear algebra behind the encoders.
//!
//! - [interpolation]: Lagrange interpolation and Horner evaluation over a field, used by the
//!   polynomial and MegaBin codecs.
//! - `gaussian_eliminations`: elimination over GF(2) coefficients with field targets, used to
//!   solve the core left after peeling a garbled cuckoo table.

pub(crate) mod gaussian_eliminations;
pub mod interpolation;
pub use interpolation::{evaluate, interpolate};
