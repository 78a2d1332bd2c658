use std::{iter::FusedIterator, ops::RangeInclusive};

// External Crate Imports
use tracing::debug;

// Local Crate Imports
use crate::{
    LengthBound, Template,
    errors::{ChainError, Result},
};

/// The atom used to build chains unless told otherwise
pub const CARBON: &str = "C";

// Public API ==========================================================================================================

/// Generates every chain length in `min_length..=max_length` for a template, substituting a run of carbon atoms for
/// each placeholder. The template is checked before the range, and nothing is generated unless both are valid.
///
/// ```
/// # use chainsmith::enumerate;
/// let alcohols = enumerate("R-OH", 1, 3)?;
/// assert_eq!(alcohols, ["C-OH", "CC-OH", "CCC-OH"]);
/// # Ok::<(), Box<chainsmith::ChainError>>(())
/// ```
pub fn enumerate(template: &str, min_length: u32, max_length: u32) -> Result<Vec<String>> {
    let template = Template::new(template)?;
    let bound = LengthBound::new(min_length, max_length)?;
    Ok(ChainEnumerator::default().chains(&template, bound).collect())
}

/// Builds chains by repeating a single atom symbol
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ChainEnumerator {
    atom: String,
}

impl ChainEnumerator {
    pub fn new(atom: impl Into<String>) -> Result<Self> {
        let atom = atom.into();
        if atom.is_empty() {
            return Err(Box::new(ChainError::EmptyAtom));
        }

        Ok(Self { atom })
    }

    #[must_use]
    pub fn atom(&self) -> &str {
        &self.atom
    }

    #[must_use]
    pub fn chain(&self, length: u32) -> String {
        self.atom.repeat(length as usize)
    }

    /// Lazily renders `template` once for every length in `bound`, shortest chain first
    pub fn chains<'t>(&'t self, template: &'t Template, bound: LengthBound) -> Chains<'t> {
        debug!(%template, %bound, atom = %self.atom, "enumerating chains");
        Chains {
            enumerator: self,
            template,
            lengths: bound.lengths(),
        }
    }
}

impl Default for ChainEnumerator {
    fn default() -> Self {
        Self {
            atom: CARBON.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Chains<'t> {
    enumerator: &'t ChainEnumerator,
    template: &'t Template,
    lengths: RangeInclusive<u32>,
}

impl Chains<'_> {
    fn render(&self, length: u32) -> String {
        self.template.render(&self.enumerator.chain(length))
    }
}

impl Iterator for Chains<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.lengths.next().map(|length| self.render(length))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lengths.size_hint()
    }
}

impl DoubleEndedIterator for Chains<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.lengths.next_back().map(|length| self.render(length))
    }
}

impl ExactSizeIterator for Chains<'_> {}

impl FusedIterator for Chains<'_> {}

// Module Tests ========================================================================================================
