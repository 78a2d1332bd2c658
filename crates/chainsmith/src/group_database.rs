// Standard Library Imports
use std::collections::hash_map::Entry;

// External Crate Imports
use ahash::HashMap;
use knus::{Decode, span::Span};
use miette::{Diagnostic, LabeledSpan, NamedSource, Result};
use thiserror::Error;
use tracing::debug;

// Local Crate Imports
use crate::{ChainEnumerator, LengthBound, Template, errors::ChainError};

/// The functional groups and line-notation legend bundled with this crate
pub const DEFAULT_KDL: &str = include_str!("../data/functional_groups.kdl");

// Public API ==========================================================================================================

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct GroupDatabase {
    syntax: Vec<SyntaxRule>,
    groups: Vec<FunctionalGroup>,
    index: HashMap<String, usize>,
}

impl GroupDatabase {
    pub fn new(file_name: impl AsRef<str>, kdl_text: impl AsRef<str>) -> Result<Self> {
        let parsed_db: GroupDatabaseKdl = knus::parse(file_name.as_ref(), kdl_text.as_ref())?;
        parsed_db
            .validate()
            .map_err(|e| e.finalize(file_name, kdl_text).into())
    }

    /// Every group, in the order it was defined
    #[must_use]
    pub fn groups(&self) -> &[FunctionalGroup] {
        &self.groups
    }

    #[must_use]
    pub fn group(&self, name: &str) -> Option<&FunctionalGroup> {
        self.index.get(name).map(|&i| &self.groups[i])
    }

    pub fn enabled(&self) -> impl Iterator<Item = &FunctionalGroup> {
        self.groups.iter().filter(|group| group.enabled)
    }

    #[must_use]
    pub fn syntax(&self) -> &[SyntaxRule] {
        &self.syntax
    }

    #[must_use]
    pub fn enumerate_enabled(&self, enumerator: &ChainEnumerator) -> Vec<(&FunctionalGroup, Vec<String>)> {
        self.enumerate_where(enumerator, |group| group.enabled)
    }

    /// Enumerates every group with at least one template, ignoring whether it's enabled
    #[must_use]
    pub fn enumerate_all(&self, enumerator: &ChainEnumerator) -> Vec<(&FunctionalGroup, Vec<String>)> {
        self.enumerate_where(enumerator, |_| true)
    }

    fn enumerate_where(
        &self,
        enumerator: &ChainEnumerator,
        predicate: impl Fn(&FunctionalGroup) -> bool,
    ) -> Vec<(&FunctionalGroup, Vec<String>)> {
        self.groups
            .iter()
            .filter(|&group| predicate(group))
            .filter(|group| {
                let enumerable = group.is_enumerable();
                if !enumerable {
                    debug!(group = %group.name, "skipping group without templates");
                }
                enumerable
            })
            .map(|group| (group, group.enumerate(enumerator)))
            .collect()
    }
}

impl Default for GroupDatabase {
    fn default() -> Self {
        // SAFETY: The bundled database is checked by the tests below, so this can't fail at runtime
        Self::new("functional_groups.kdl", DEFAULT_KDL).unwrap()
    }
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FunctionalGroup {
    pub name: String,
    /// The general formula, like `R-CH=CH2` or `CnH2n+2`
    pub formula: String,
    pub examples: Vec<String>,
    pub feature: Option<String>,
    pub templates: Vec<Template>,
    pub lengths: LengthBound,
    pub enabled: bool,
}

impl FunctionalGroup {
    #[must_use]
    pub fn is_enumerable(&self) -> bool {
        !self.templates.is_empty()
    }

    /// Renders every template at every chain length. All templates are rendered for one length before moving on to
    /// the next, longer chain.
    #[must_use]
    pub fn enumerate(&self, enumerator: &ChainEnumerator) -> Vec<String> {
        debug!(group = %self.name, lengths = %self.lengths, "enumerating group");
        self.lengths
            .lengths()
            .flat_map(|length| {
                let chain = enumerator.chain(length);
                self.templates.iter().map(move |template| template.render(&chain))
            })
            .collect()
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SyntaxRule {
    pub feature: String,
    pub symbol: String,
    pub example: String,
    pub meaning: String,
}

// KDL File Schema =====================================================================================================

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct GroupDatabaseKdl {
    #[knus(child, unwrap(children))]
    syntax: Vec<SyntaxRuleKdl>,
    #[knus(child, unwrap(children))]
    groups: Vec<FunctionalGroupKdl>,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct SyntaxRuleKdl {
    #[knus(node_name)]
    feature: String,
    #[knus(property)]
    symbol: String,
    #[knus(property)]
    example: String,
    #[knus(property)]
    meaning: String,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct FunctionalGroupKdl {
    #[knus(span)]
    span: Span,
    #[knus(node_name)]
    name: String,
    #[knus(property)]
    formula: String,
    #[knus(property, default)]
    enabled: bool,
    #[knus(child, unwrap(arguments))]
    examples: Option<Vec<String>>,
    #[knus(child, unwrap(argument))]
    feature: Option<String>,
    #[knus(children(name = "template"))]
    templates: Vec<TemplateKdl>,
    #[knus(child)]
    lengths: LengthsKdl,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct TemplateKdl {
    #[knus(span)]
    span: Span,
    #[knus(argument)]
    text: String,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct LengthsKdl {
    #[knus(span)]
    span: Span,
    #[knus(argument)]
    min: u32,
    #[knus(argument)]
    max: u32,
}

// Validation Trait ====================================================================================================

type DatabaseResult<T> = std::result::Result<T, DatabaseErrorKind>;

// NOTE: This is essentially a `TryInto` implementation, but Rust's orphan rules mean I can't implement `TryInto` for
// `Vec<FunctionalGroupKdl>`, since `Vec<_>` is not a local type
trait ValidateInto<T> {
    fn validate(self) -> DatabaseResult<T>;
}

// Group Database Validation ===========================================================================================

impl ValidateInto<GroupDatabase> for GroupDatabaseKdl {
    fn validate(self) -> DatabaseResult<GroupDatabase> {
        let syntax = self.syntax.into_iter().map(SyntaxRule::from).collect();
        let (groups, index) = self.groups.validate()?;
        Ok(GroupDatabase {
            syntax,
            groups,
            index,
        })
    }
}

// ---------------------------------------------------------------------------------------------------------------------

type IndexedGroups = (Vec<FunctionalGroup>, HashMap<String, usize>);

impl ValidateInto<IndexedGroups> for Vec<FunctionalGroupKdl> {
    fn validate(self) -> DatabaseResult<IndexedGroups> {
        let mut seen_groups: HashMap<String, (Span, usize)> = HashMap::default();
        let mut groups = Vec::with_capacity(self.len());

        for group_kdl in self {
            match seen_groups.entry(group_kdl.name.clone()) {
                Entry::Occupied(e) => {
                    let (group_name, (first_defined_at, _)) = e.remove_entry();
                    return Err(DatabaseErrorKind::DuplicateGroup(
                        first_defined_at,
                        group_kdl.span,
                        group_name,
                    ));
                }
                Entry::Vacant(e) => e.insert((group_kdl.span, groups.len())),
            };
            groups.push(group_kdl.validate()?);
        }

        let index = seen_groups.into_iter().map(|(k, (_, i))| (k, i)).collect();
        Ok((groups, index))
    }
}

impl ValidateInto<FunctionalGroup> for FunctionalGroupKdl {
    fn validate(self) -> DatabaseResult<FunctionalGroup> {
        let templates = self
            .templates
            .into_iter()
            .map(|template| {
                Template::new(&template.text)
                    .map_err(|e| DatabaseErrorKind::Template(template.span, self.name.clone(), *e))
            })
            .collect::<DatabaseResult<Vec<_>>>()?;

        let lengths = LengthBound::new(self.lengths.min, self.lengths.max)
            .map_err(|e| DatabaseErrorKind::Lengths(self.lengths.span, self.name.clone(), *e))?;

        if self.enabled && templates.is_empty() {
            return Err(DatabaseErrorKind::NothingToEnumerate(self.span, self.name));
        }

        Ok(FunctionalGroup {
            name: self.name,
            formula: self.formula,
            examples: self.examples.unwrap_or_default(),
            feature: self.feature,
            templates,
            lengths,
            enabled: self.enabled,
        })
    }
}

// Infallible Conversions ==============================================================================================

impl From<SyntaxRuleKdl> for SyntaxRule {
    fn from(value: SyntaxRuleKdl) -> Self {
        Self {
            feature: value.feature,
            symbol: value.symbol,
            example: value.example,
            meaning: value.meaning,
        }
    }
}

// Validation Error Types and Trait Implementations  ===================================================================

#[derive(Debug, Error)]
#[error("failed to validate functional group database file")]
struct DatabaseError {
    kdl: NamedSource<String>,
    #[source]
    kind: DatabaseErrorKind,
}

// NOTE: This is manually implemented because the list of labels is dynamic and needs to be extracted from `self.kind`
impl Diagnostic for DatabaseError {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.kdl)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.kind.labels().into_iter().map(|(s, l)| {
            LabeledSpan::new_with_span(Some(l.to_owned()), *s)
        })))
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        Some(&self.kind)
    }
}

#[derive(Clone, Debug, Diagnostic, Error)]
enum DatabaseErrorKind {
    #[error("the functional group {2:?} has already been defined")]
    #[diagnostic(help("consider merging the duplicate groups or picking a new group name"))]
    DuplicateGroup(Span, Span, String),

    #[error("the functional group {1:?} contains an invalid template")]
    Template(
        Span,
        String,
        #[source]
        #[diagnostic_source]
        ChainError,
    ),

    #[error("the functional group {1:?} has an invalid range of chain lengths")]
    Lengths(
        Span,
        String,
        #[source]
        #[diagnostic_source]
        ChainError,
    ),

    #[error("the functional group {1:?} is enabled, but has no templates to enumerate")]
    #[diagnostic(help("add a template containing an R placeholder, or remove enabled=true"))]
    NothingToEnumerate(Span, String),
}

impl DatabaseErrorKind {
    fn labels(&self) -> Vec<(&Span, &'static str)> {
        match self {
            Self::DuplicateGroup(s1, s2, _) => {
                vec![(s1, "first defined here"), (s2, "then again here")]
            }
            Self::Template(s, ..) => vec![(s, "invalid template")],
            Self::Lengths(s, ..) => vec![(s, "invalid range")],
            Self::NothingToEnumerate(s, _) => vec![(s, "enabled without a template")],
        }
    }

    fn finalize(self, file_name: impl AsRef<str>, kdl: impl AsRef<str>) -> DatabaseError {
        let kdl = NamedSource::new(file_name, kdl.as_ref().to_owned());
        DatabaseError { kdl, kind: self }
    }
}

// Module Tests ========================================================================================================
