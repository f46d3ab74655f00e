//! Tokens and delimiter groups, the units of the reader's output.
//!
//! The reader hands the enforester a flat sequence of tokens in which matched
//! delimiters have already been folded into groups. Every token carries the
//! scope set used for hygienic resolution.

use crate::scope::{Scope, ScopeSet};
use crate::term::Term;

/// Lexical class of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Punctuator,
    /// `=` and the compound assignment operators.
    AssignOp,
    Number,
    String,
    Boolean,
    Null,
    Regex,
    /// A template literal, pre-split by the reader into chunks and
    /// substitution groups.
    Template(Vec<TemplateItem>),
    Eof,
}

/// One piece of a template literal.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateItem {
    /// Literal text between substitutions.
    Chunk(String),
    /// A `${ ... }` substitution group.
    Subst(Group),
}

/// A single token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The lexeme. For string literals this is the cooked value; for regex
    /// literals the full `/pattern/flags` form.
    pub value: String,
    /// 1-based source line, used for newline-sensitive grammar rules.
    pub line: u32,
    pub scopes: ScopeSet,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
            scopes: ScopeSet::new(),
        }
    }

    pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
        self.scopes = scopes;
        self
    }

    /// A synthetic identifier that inherits position and scopes from `like`.
    pub fn identifier_like(name: &str, like: &Token) -> Self {
        Self {
            kind: TokenKind::Identifier,
            value: name.to_string(),
            line: like.line,
            scopes: like.scopes.clone(),
        }
    }

    pub fn add_scope(&self, scope: Scope) -> Self {
        self.clone().with_scopes(self.scopes.with(scope))
    }

    pub fn flip_scope(&self, scope: Scope) -> Self {
        self.clone().with_scopes(self.scopes.flip(scope))
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier)
    }

    pub fn is_keyword(&self, value: &str) -> bool {
        matches!(self.kind, TokenKind::Keyword) && self.value == value
    }

    pub fn is_punctuator(&self, value: &str) -> bool {
        matches!(self.kind, TokenKind::Punctuator) && self.value == value
    }

    /// Whether this token participates in binding resolution at all.
    pub fn is_resolvable(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Identifier | TokenKind::Keyword | TokenKind::Punctuator | TokenKind::AssignOp
        )
    }
}

/// Matched-delimiter kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Parens,
    Braces,
    Brackets,
    /// The backtick-fenced syntax-template delimiter.
    Syntax,
}

/// A matched delimiter group. `inner` is the full ordered sequence including
/// the open and close delimiter tokens themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub kind: GroupKind,
    pub inner: Vec<Term>,
}

impl Group {
    pub fn new(kind: GroupKind, inner: Vec<Term>) -> Self {
        Self { kind, inner }
    }

    /// The contents between the delimiters.
    pub fn interior(&self) -> &[Term] {
        if self.inner.len() >= 2 {
            &self.inner[1..self.inner.len() - 1]
        } else {
            &[]
        }
    }

    /// Consume the group, dropping the delimiter tokens.
    pub fn into_interior(mut self) -> Vec<Term> {
        if self.inner.len() >= 2 {
            self.inner.pop();
            self.inner.remove(0);
            self.inner
        } else {
            Vec::new()
        }
    }

    /// Source line of the opening delimiter.
    pub fn line(&self) -> Option<u32> {
        self.inner.first().and_then(Term::line)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_strips_delimiters() {
        let g = Group::new(
            GroupKind::Parens,
            vec![
                Term::RawToken(Token::new(TokenKind::Punctuator, "(", 1)),
                Term::RawToken(Token::new(TokenKind::Identifier, "x", 1)),
                Term::RawToken(Token::new(TokenKind::Punctuator, ")", 1)),
            ],
        );
        assert_eq!(g.interior().len(), 1);
        assert_eq!(g.into_interior().len(), 1);
    }

    #[test]
    fn empty_group_has_empty_interior() {
        let g = Group::new(
            GroupKind::Parens,
            vec![
                Term::RawToken(Token::new(TokenKind::Punctuator, "(", 1)),
                Term::RawToken(Token::new(TokenKind::Punctuator, ")", 1)),
            ],
        );
        assert!(g.interior().is_empty());
    }

    #[test]
    fn add_and_flip_scope_are_nondestructive() {
        let t = Token::new(TokenKind::Identifier, "x", 1);
        let marked = t.add_scope(Scope(7));
        assert!(marked.scopes.contains(Scope(7)));
        assert!(t.scopes.is_empty());
        assert!(!marked.flip_scope(Scope(7)).scopes.contains(Scope(7)));
    }
}
