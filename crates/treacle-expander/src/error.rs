//! The fatal error taxonomy. Every variant aborts the enclosing parse; there
//! is no recovery or resynchronization.

use thiserror::Error;

use crate::term::Term;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("unexpected token `{token}`, expected {expected}\n  {context}")]
    UnexpectedToken {
        token: String,
        expected: String,
        context: String,
    },

    #[error("the macro `{name}` has no bound compile-time value\n  {context}")]
    UnboundMacro { name: String, context: String },

    #[error("the macro `{name}` is bound to a non-callable compile-time value\n  {context}")]
    NonCallableMacro { name: String, context: String },

    #[error("the macro `{name}` must return syntax\n  {context}")]
    MalformedMacroResult { name: String, context: String },

    #[error("`{token}` is not a valid destructuring target\n  {context}")]
    InvalidDestructuringTarget { token: String, context: String },

    #[error("malformed module form at `{token}`\n  {context}")]
    MalformedModuleForm { token: String, context: String },

    #[error("a `try` statement requires a `catch` or `finally` clause\n  {context}")]
    UnterminatedTry { context: String },

    #[error("module specifier `{name}` is missing phase information")]
    MissingPhase { name: String },

    #[error("failed to fetch module at `{address}`: {message}")]
    Fetch { address: String, message: String },
}

const WINDOW: usize = 20;

/// Render a bounded window of the remaining stream for diagnostics, marking
/// the offending item.
pub(crate) fn context_window<'a>(
    rest: impl IntoIterator<Item = &'a Term>,
    offending: Option<&Term>,
) -> String {
    let mut parts = Vec::new();
    for item in rest.into_iter().take(WINDOW) {
        let mark = offending == Some(item) && parts.len() < WINDOW;
        let mut words = Vec::new();
        render(item, &mut words);
        for (i, word) in words.into_iter().enumerate() {
            if parts.len() >= WINDOW {
                break;
            }
            if mark && i == 0 {
                parts.push(format!("__{word}__"));
            } else {
                parts.push(word);
            }
        }
        if parts.len() >= WINDOW {
            break;
        }
    }
    parts.join(" ")
}

fn render(term: &Term, out: &mut Vec<String>) {
    match term {
        Term::RawToken(tok) => out.push(tok.value.clone()),
        Term::RawGroup(group) => {
            for item in &group.inner {
                render(item, out);
            }
        }
        _ => out.push("<term>".to_string()),
    }
}

/// A short printable description of a stream item, for error payloads.
pub(crate) fn describe(term: Option<&Term>) -> String {
    match term {
        Some(Term::RawToken(tok)) => tok.value.clone(),
        Some(Term::RawGroup(group)) => match group.inner.first() {
            Some(Term::RawToken(tok)) => tok.value.clone(),
            _ => "<group>".to_string(),
        },
        Some(_) => "<term>".to_string(),
        None => "<end of input>".to_string(),
    }
}
