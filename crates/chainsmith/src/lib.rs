//! Enumerates straight-chain variants of functional-group templates written in SMILES-like line notation
//!
//! A template marks chain attachment points with an `R`. Substituting a run of `n` carbons for every `R` in `R-OH`
//! gives `C-OH`, `CC-OH`, `CCC-OH`, and so on for each `n` in a range of chain lengths.

pub mod enumerator;
pub mod errors;
pub mod group_database;
pub mod length_bound;
pub mod template;

pub use enumerator::{ChainEnumerator, Chains, enumerate};
pub use errors::{ChainError, Result};
pub use group_database::{FunctionalGroup, GroupDatabase, SyntaxRule};
pub use length_bound::LengthBound;
pub use template::Template;
