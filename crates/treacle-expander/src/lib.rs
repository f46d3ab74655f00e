//! An enforestation engine: incremental parsing with hygienic parse-time
//! macros.
//!
//! The engine consumes a delimiter-matched token stream and reduces it to
//! terms one statement at a time. Parsing is binding-driven: keywords are
//! ordinary names bound to grammar sentinels in a compile-time environment,
//! so macros can shadow or rebind them. When the next name resolves to a
//! callable compile-time value, the parse is suspended, the transformer runs
//! over the unconsumed stream, and parsing resumes over its output. Scope
//! sets on every token keep macro-introduced names and use-site names from
//! capturing each other.
//!
//! The reader (lexing and delimiter matching) and the host evaluator for
//! compile-time code both live outside this crate. Streams come in as
//! [`Term::RawToken`] and [`Term::RawGroup`] items; compile-time modules are
//! reached through the [`ModuleLoader`] trait.
//!
//! ```
//! use treacle_expander::{Context, CtValue, Enforester, MacroTransformer, Mode, Transform};
//! # use treacle_expander::{Term, Token, TokenKind};
//!
//! let cx = Context::shared();
//! cx.borrow_mut().env_set(
//!     "unless",
//!     0,
//!     Transform::Compiletime(CtValue::Fn(MacroTransformer::new(|mctx| {
//!         let test = mctx.expand_expression()?;
//!         Ok(CtValue::Syntax(test.into_iter().collect()))
//!     }))),
//! );
//! let stream = vec![
//!     Term::RawToken(Token::new(TokenKind::Identifier, "unless", 1)),
//!     Term::RawToken(Token::new(TokenKind::Identifier, "ready", 1)),
//! ];
//! let mut enforester = Enforester::new(stream, cx);
//! let term = enforester.enforest(Mode::Expression)?;
//! assert!(term.is_some());
//! # Ok::<(), treacle_expander::SyntaxError>(())
//! ```

mod enforester;
mod error;
mod expander;
mod loader;
mod operators;
mod scope;
mod term;
mod token;
mod transforms;

pub use enforester::{Enforester, Mode};
pub use error::SyntaxError;
pub use expander::MacroContext;
pub use loader::{split_phase, MapLoader, ModuleAddress, ModuleLoader};
pub use operators::{Assoc, UNARY_PREC};
pub use scope::{BindingTable, Phase, Scope, ScopeSet};
pub use term::{ArrowBody, ClassElement, Term, VarKind};
pub use token::{Group, GroupKind, TemplateItem, Token, TokenKind};
pub use transforms::{Context, CtValue, MacroTransformer, SharedContext, Transform};

/// Enforest a whole module stream into a term sequence.
pub fn parse_module(items: Vec<Term>, context: SharedContext) -> Result<Vec<Term>, SyntaxError> {
    let mut enforester = Enforester::new(items, context);
    let mut terms = Vec::new();
    while !enforester.is_done() {
        match enforester.enforest(Mode::Module)? {
            Some(Term::Eof) | None => break,
            Some(term) => terms.push(term),
        }
    }
    Ok(terms)
}

/// Enforest a single expression out of `items`.
pub fn parse_expression(
    items: Vec<Term>,
    context: SharedContext,
) -> Result<Option<Term>, SyntaxError> {
    let mut enforester = Enforester::new(items, context);
    enforester.enforest(Mode::Expression)
}
