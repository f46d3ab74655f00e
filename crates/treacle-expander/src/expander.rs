//! Macro invocation: interrupting the parse, handing the transformer a view
//! of the unconsumed stream, and splicing the result back in hygienically.
//!
//! Every invocation mints two fresh scopes. The use-site scope marks items the
//! transformer pulls out of the stream; the introduced scope is flipped over
//! the returned syntax so that identifiers the macro introduces resolve in the
//! macro's own environment, not the call site's.

use std::mem;
use std::rc::Rc;

use tracing::debug;

use crate::enforester::{Enforester, Mode};
use crate::error::{context_window, SyntaxError};
use crate::scope::Scope;
use crate::term::Term;
use crate::token::Token;
use crate::transforms::{CtValue, SharedContext, Transform};

/// The transformer's window onto the invocation. Items are pulled lazily and
/// marked with the use-site scope as they cross the boundary.
pub struct MacroContext {
    name: Token,
    items: Vec<Term>,
    cursor: usize,
    use_scope: Scope,
    context: SharedContext,
}

impl MacroContext {
    fn new(name: Token, items: Vec<Term>, use_scope: Scope, context: SharedContext) -> Self {
        Self {
            name,
            items,
            cursor: 0,
            use_scope,
            context,
        }
    }

    /// The macro's own name at the call site, with the use-site scope.
    pub fn name(&self) -> Term {
        Term::RawToken(self.name.add_scope(self.use_scope))
    }

    /// Pull the next raw item out of the stream.
    pub fn next(&mut self) -> Option<Term> {
        let scope = self.use_scope;
        let item = self.items.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(item.map_tokens(&mut |tok| tok.add_scope(scope)))
    }

    /// Rewind to the start of the invocation's stream.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Parse one full expression out of the stream, consuming exactly the
    /// items the expression covered.
    pub fn expand_expression(&mut self) -> Result<Option<Term>, SyntaxError> {
        let scope = self.use_scope;
        let remaining: Vec<Term> = self.items[self.cursor..]
            .iter()
            .map(|t| t.clone().map_tokens(&mut |tok| tok.add_scope(scope)))
            .collect();
        let before = remaining.len();
        let mut enf = Enforester::new(remaining, Rc::clone(&self.context));
        let term = enf.enforest(Mode::Expression)?;
        self.cursor += before.saturating_sub(enf.rest.len());
        Ok(term)
    }

    /// The items the transformer did not consume.
    fn into_rest(mut self) -> Vec<Term> {
        self.items.split_off(self.cursor)
    }

    /// The whole invocation stream, for restoring after a failure.
    fn into_original(self) -> Vec<Term> {
        self.items
    }
}

impl Enforester {
    /// Expand macros at the head of the stream until none remain. On success
    /// `rest` holds the rewritten stream; on failure it is restored to the
    /// pre-invocation stream so diagnostics show the original source.
    pub(crate) fn expand_macro(&mut self) -> Result<(), SyntaxError> {
        while self.is_compiletime(self.peek()) {
            let name = self.match_any_token()?;
            let transformer = {
                let cx = self.context.borrow();
                match cx.transform_of(&name) {
                    Some(Transform::Compiletime(CtValue::Fn(f))) => f.clone(),
                    Some(Transform::Compiletime(_)) => {
                        return Err(SyntaxError::NonCallableMacro {
                            name: name.value.clone(),
                            context: context_window(&self.rest, self.peek()),
                        })
                    }
                    _ => {
                        return Err(SyntaxError::UnboundMacro {
                            name: name.value.clone(),
                            context: context_window(&self.rest, self.peek()),
                        })
                    }
                }
            };
            let (use_scope, intro_scope) = {
                let mut cx = self.context.borrow_mut();
                let u = cx.fresh_scope();
                let i = cx.fresh_scope();
                cx.use_scope = Some(u);
                (u, i)
            };
            debug!(name = %name.value, ?use_scope, ?intro_scope, "expanding macro");
            let items: Vec<Term> = mem::take(&mut self.rest).into();
            let mut mctx =
                MacroContext::new(name.clone(), items, use_scope, Rc::clone(&self.context));
            match transformer.invoke(&mut mctx) {
                Ok(CtValue::Syntax(terms)) => {
                    let mut rewritten: Vec<Term> = terms
                        .into_iter()
                        .map(|t| t.map_tokens(&mut |tok| tok.flip_scope(intro_scope)))
                        .collect();
                    debug!(name = %name.value, emitted = rewritten.len(), "macro produced syntax");
                    rewritten.extend(mctx.into_rest());
                    self.rest = rewritten.into();
                }
                Ok(_) => {
                    let mut restored = vec![Term::RawToken(name.clone())];
                    restored.extend(mctx.into_original());
                    let err = SyntaxError::MalformedMacroResult {
                        name: name.value,
                        context: context_window(&restored, None),
                    };
                    self.rest = restored.into();
                    return Err(err);
                }
                Err(e) => {
                    let mut restored = vec![Term::RawToken(name)];
                    restored.extend(mctx.into_original());
                    self.rest = restored.into();
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}
