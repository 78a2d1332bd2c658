use std::str::FromStr;

// External Crate Imports
use derive_more::Display;
use itertools::Itertools;
use nom::{
    Finish, IResult,
    branch::alt,
    bytes::complete::{is_not, tag, take_till},
    character::complete::char,
    combinator::{all_consuming, map, recognize, value},
    multi::many0,
    sequence::delimited,
};
use tracing::trace;

// Local Crate Imports
use crate::errors::{ChainError, Result};

/// Marks a point in a template where a chain is attached
pub const PLACEHOLDER: char = 'R';

// Public API ==========================================================================================================

/// A line-notation string with one or more `R` placeholders, pre-split into the literal fragments that surround them
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[display("{text}")]
pub struct Template {
    text: String,
    fragments: Vec<String>,
}

impl Template {
    pub fn new(text: impl AsRef<str>) -> Result<Self> {
        let text = text.as_ref();
        let (_, tokens) = template(text)
            .finish()
            .map_err(|_| ChainError::invalid_template(text))?;

        let fragments: Vec<_> = tokens
            .split(|&token| token == Token::Placeholder)
            .map(|run| run.iter().map(|token| token.literal()).collect::<String>())
            .collect();

        // NOTE: N placeholders always split the tokens into N + 1 fragments, so a lone fragment means there is nowhere
        // to put a chain
        if fragments.len() < 2 {
            return Err(Box::new(ChainError::invalid_template(text)));
        }

        trace!(template = text, placeholders = fragments.len() - 1, "parsed template");
        Ok(Self {
            text: text.to_owned(),
            fragments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The literal text between (and around) placeholders, which never changes during substitution
    #[must_use]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    #[must_use]
    pub fn placeholders(&self) -> usize {
        self.fragments.len() - 1
    }

    /// Replaces every placeholder with the same `chain`
    #[must_use]
    pub fn render(&self, chain: &str) -> String {
        self.fragments.iter().join(chain)
    }
}

impl FromStr for Template {
    type Err = Box<ChainError>;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

// Template Parsers ====================================================================================================

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Token<'s> {
    Placeholder,
    Literal(&'s str),
}

impl<'s> Token<'s> {
    const fn literal(self) -> &'s str {
        match self {
            Self::Placeholder => "",
            Self::Literal(literal) => literal,
        }
    }
}

type ParseResult<'s, O> = IResult<&'s str, O>;

/// Template = { Placeholder | Bracket Atom | Literal } ;
fn template(i: &str) -> ParseResult<Vec<Token>> {
    all_consuming(many0(alt((placeholder, bracket_atom, literal))))(i)
}

/// Placeholder = "R" ;
fn placeholder(i: &str) -> ParseResult<Token> {
    value(Token::Placeholder, char(PLACEHOLDER))(i)
}

// NOTE: Anything in brackets is an atom specification, so the R in something like [Rb] or [Ru+2] is part of an
// element symbol and must be kept as-is
/// Bracket Atom = "[" , { any - "]" } , "]" ;
fn bracket_atom(i: &str) -> ParseResult<Token> {
    let contents = take_till(|c| c == ']');
    map(recognize(delimited(char('['), contents, char(']'))), Token::Literal)(i)
}

// NOTE: An unclosed '[' isn't validated here, and is passed through like any other literal character
/// Literal = ( any - "R" - "[" ) , { any - "R" - "[" } | "[" ;
fn literal(i: &str) -> ParseResult<Token> {
    map(alt((is_not("R["), tag("["))), Token::Literal)(i)
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_placeholder() {
        let template = Template::new("R-OH").unwrap();
        assert_eq!(template.as_str(), "R-OH");
        assert_eq!(template.fragments(), ["", "-OH"]);
        assert_eq!(template.placeholders(), 1);
    }

    #[test]
    fn multiple_placeholders() {
        let template = Template::new("RC(=O)OR").unwrap();
        assert_eq!(template.fragments(), ["", "C(=O)O", ""]);
        assert_eq!(template.placeholders(), 2);

        let template = Template::new("C=P(R)(R)R").unwrap();
        assert_eq!(template.fragments(), ["C=P(", ")(", ")", ""]);
        assert_eq!(template.placeholders(), 3);

        // Neighbouring placeholders leave an empty fragment between them
        let template = Template::new("RR").unwrap();
        assert_eq!(template.fragments(), ["", "", ""]);
    }

    #[test]
    fn bracket_atoms_are_literal() {
        let template = Template::new("R[Rb]").unwrap();
        assert_eq!(template.fragments(), ["", "[Rb]"]);

        let template = Template::new("[Ru+2]RC[Rn]R").unwrap();
        assert_eq!(template.fragments(), ["[Ru+2]", "C[Rn]", ""]);

        let template = Template::new("R[Si]R").unwrap();
        assert_eq!(template.fragments(), ["", "[Si]", ""]);

        // Bracket atoms aren't validated, just skipped over
        let template = Template::new("R[]").unwrap();
        assert_eq!(template.fragments(), ["", "[]"]);
    }

    #[test]
    fn unclosed_brackets_are_literal() {
        let template = Template::new("C[R").unwrap();
        assert_eq!(template.fragments(), ["C[", ""]);

        let template = Template::new("R[[Rb]").unwrap();
        assert_eq!(template.fragments(), ["", "[[Rb]"]);
    }

    #[test]
    fn missing_placeholder() {
        for text in ["", "CCCC", "CnH2n+2", "[Rb]Cl", "c1ccccc1"] {
            assert_eq!(
                Template::new(text),
                Err(Box::new(ChainError::InvalidTemplate {
                    template: text.to_owned()
                }))
            );
        }
    }

    #[test]
    fn render() {
        let template = Template::new("R-OH").unwrap();
        assert_eq!(template.render("C"), "C-OH");
        assert_eq!(template.render("CCC"), "CCC-OH");

        let template = Template::new("RC(=O)R").unwrap();
        assert_eq!(template.render("CC"), "CCC(=O)CC");

        let template = Template::new("[C+](R)(R)R").unwrap();
        assert_eq!(template.render("C"), "[C+](C)(C)C");
    }

    #[test]
    fn from_str() {
        let template: Template = "C1RC1".parse().unwrap();
        assert_eq!(template.to_string(), "C1RC1");
        assert!("C1CC1".parse::<Template>().is_err());
    }

    #[test]
    fn parse_tokens() {
        assert_eq!(
            template("R-[Rb]("),
            Ok((
                "",
                vec![
                    Token::Placeholder,
                    Token::Literal("-"),
                    Token::Literal("[Rb]"),
                    Token::Literal("(")
                ]
            ))
        );
        assert_eq!(placeholder("RC"), Ok(("C", Token::Placeholder)));
        assert!(placeholder("CR").is_err());
        assert_eq!(bracket_atom("[Rb]R"), Ok(("R", Token::Literal("[Rb]"))));
        assert!(bracket_atom("[Rb").is_err());
        assert_eq!(literal("C=CR"), Ok(("R", Token::Literal("C=C"))));
        assert_eq!(literal("[Rb"), Ok(("Rb", Token::Literal("["))));
        assert!(literal("R").is_err());
    }
}
