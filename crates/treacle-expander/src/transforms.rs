//! Grammar-sentinel transforms and the shared compile-time context.
//!
//! Statement dispatch is binding-driven: a token starts an `if` statement
//! because it resolves to the `If` transform, not because it spells "if".
//! `Context::new` seeds the default keyword bindings; macros and renamings
//! rebind them like any other name.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::SyntaxError;
use crate::expander::MacroContext;
use crate::scope::{BindingTable, Phase, Scope};
use crate::term::Term;
use crate::token::Token;

/// A macro transformer: a host function from the macro's view of the stream
/// to a compile-time value.
#[derive(Clone)]
pub struct MacroTransformer(Rc<dyn Fn(&mut MacroContext) -> Result<CtValue, SyntaxError>>);

impl MacroTransformer {
    pub fn new(f: impl Fn(&mut MacroContext) -> Result<CtValue, SyntaxError> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn invoke(&self, cx: &mut MacroContext) -> Result<CtValue, SyntaxError> {
        (self.0)(cx)
    }
}

impl fmt::Debug for MacroTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MacroTransformer")
    }
}

impl PartialEq for MacroTransformer {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A value living in the compile-time environment.
#[derive(Debug, Clone, PartialEq)]
pub enum CtValue {
    Void,
    Boolean(bool),
    Number(f64),
    String(String),
    /// A sequence of terms to splice back into the stream. The only shape a
    /// macro invocation is allowed to return.
    Syntax(Vec<Term>),
    Fn(MacroTransformer),
}

/// What a resolved name means to the enforester.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    FunctionDecl,
    VariableDecl,
    LetDecl,
    ConstDecl,
    SyntaxDecl,
    SyntaxrecDecl,
    ReturnStatement,
    While,
    If,
    For,
    Switch,
    Break,
    Continue,
    Do,
    Debugger,
    With,
    Try,
    Throw,
    New,
    /// A compile-time binding; callable ones interrupt the parse.
    Compiletime(CtValue),
    /// A name renamed to a canonical identity; occurrences are substituted
    /// back into the stream.
    VarBinding(Token),
}

const KEYWORD_SENTINELS: &[(&str, Transform)] = &[
    ("function", Transform::FunctionDecl),
    ("var", Transform::VariableDecl),
    ("let", Transform::LetDecl),
    ("const", Transform::ConstDecl),
    ("syntax", Transform::SyntaxDecl),
    ("syntaxrec", Transform::SyntaxrecDecl),
    ("return", Transform::ReturnStatement),
    ("while", Transform::While),
    ("if", Transform::If),
    ("for", Transform::For),
    ("switch", Transform::Switch),
    ("break", Transform::Break),
    ("continue", Transform::Continue),
    ("do", Transform::Do),
    ("debugger", Transform::Debugger),
    ("with", Transform::With),
    ("try", Transform::Try),
    ("throw", Transform::Throw),
    ("new", Transform::New),
];

/// Shared compile-time state: the phase-indexed environment and store, the
/// binding table, and the scope counter. One context backs a whole expansion,
/// including every nested sub-parse.
#[derive(Debug, Default)]
pub struct Context {
    pub phase: Phase,
    env: FxHashMap<(String, Phase), Transform>,
    store: FxHashMap<(String, Phase), Transform>,
    pub bindings: BindingTable,
    /// Most recent use-site scope minted by a macro invocation.
    pub use_scope: Option<Scope>,
    next_scope: u32,
}

pub type SharedContext = Rc<RefCell<Context>>;

impl Context {
    /// A context with the default keyword sentinels bound at phase 0.
    pub fn new() -> Self {
        let mut cx = Self::default();
        cx.bind_keywords(0);
        cx
    }

    pub fn shared() -> SharedContext {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Seed the keyword sentinels at `phase`. Each keyword resolves to itself
    /// (an unbound name resolves to its own lexeme) so only the environment
    /// entry is needed.
    pub fn bind_keywords(&mut self, phase: Phase) {
        for (name, transform) in KEYWORD_SENTINELS {
            self.env
                .insert((name.to_string(), phase), transform.clone());
        }
    }

    pub fn fresh_scope(&mut self) -> Scope {
        let s = Scope(self.next_scope);
        self.next_scope += 1;
        s
    }

    pub fn env_set(&mut self, name: &str, phase: Phase, transform: Transform) {
        self.env.insert((name.to_string(), phase), transform);
    }

    pub fn store_set(&mut self, name: &str, phase: Phase, transform: Transform) {
        self.store.insert((name.to_string(), phase), transform);
    }

    /// Environment first, then the cross-phase store.
    pub fn lookup(&self, name: &str, phase: Phase) -> Option<&Transform> {
        self.env
            .get(&(name.to_string(), phase))
            .or_else(|| self.store.get(&(name.to_string(), phase)))
    }

    pub fn resolve(&self, token: &Token) -> String {
        self.bindings.resolve(token, self.phase)
    }

    /// The transform a token currently denotes, if any.
    pub fn transform_of(&self, token: &Token) -> Option<&Transform> {
        if !token.is_resolvable() {
            return None;
        }
        let name = self.resolve(token);
        self.lookup(&name, self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn keywords_resolve_to_sentinels() {
        let cx = Context::new();
        let tok = Token::new(TokenKind::Keyword, "if", 1);
        assert_eq!(cx.transform_of(&tok), Some(&Transform::If));
    }

    #[test]
    fn env_shadows_store() {
        let mut cx = Context::new();
        cx.store_set("m", 0, Transform::Compiletime(CtValue::Void));
        cx.env_set("m", 0, Transform::New);
        let tok = Token::new(TokenKind::Identifier, "m", 1);
        assert_eq!(cx.transform_of(&tok), Some(&Transform::New));
    }

    #[test]
    fn rebinding_changes_dispatch() {
        let mut cx = Context::new();
        // A user binding named "if" with no scopes shadows the sentinel once
        // the binding table maps it to a fresh identity.
        let tok = Token::new(TokenKind::Keyword, "if", 1);
        let id = cx.bindings.add(&tok, 0);
        cx.env_set(&id, 0, Transform::VarBinding(tok.clone()));
        assert_eq!(cx.transform_of(&tok), Some(&Transform::VarBinding(tok)));
    }

    #[test]
    fn fresh_scopes_are_distinct() {
        let mut cx = Context::new();
        assert_ne!(cx.fresh_scope(), cx.fresh_scope());
    }
}
