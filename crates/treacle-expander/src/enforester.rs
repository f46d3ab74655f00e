//! The enforester: incremental, macro-interruptible parsing.
//!
//! Uses recursive descent for statements and an explicitly-reified
//! precedence-climbing loop for expressions. The expression loop is driven by
//! a stack of operator frames so that a macro expansion can interrupt parsing
//! at any point and the loop can resume over the rewritten stream.

use std::collections::VecDeque;
use std::mem;
use std::rc::Rc;

use tracing::trace;

use crate::error::{context_window, describe, SyntaxError};
use crate::operators::{self, UNARY_PREC};
use crate::term::{ArrowBody, ClassElement, Term, VarKind};
use crate::token::{Group, GroupKind, TemplateItem, Token, TokenKind};
use crate::transforms::{SharedContext, Transform};

/// What the driver is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Module,
    Expression,
}

/// Pending reduction for the expression to the right of an operator.
#[derive(Debug, Clone, Default)]
pub(crate) enum Combine {
    #[default]
    Id,
    Unary {
        op: Token,
    },
    Binary {
        left: Term,
        op: Token,
    },
}

/// The operator context: the current precedence floor, the pending
/// reduction, and the stack of interrupted frames beneath it.
#[derive(Debug, Clone, Default)]
pub(crate) struct OpCtx {
    pub(crate) prec: u8,
    pub(crate) combine: Combine,
    pub(crate) stack: Vec<(u8, Combine)>,
}

/// Outcome of one step of the expression loop.
#[derive(Debug)]
pub(crate) enum Climb {
    /// A (possibly partial) expression was produced.
    Term(Term),
    /// Nothing applied; unwind or stop.
    NoChange,
    /// An operator frame was pushed; keep climbing.
    Operator,
    /// The stream was rewritten (macro or binding substitution); re-read.
    Expansion,
}

pub struct Enforester {
    /// Unconsumed stream, consumed from the front.
    pub(crate) rest: VecDeque<Term>,
    /// Terms already committed by this enforester, in production order.
    pub(crate) prev: Vec<Term>,
    /// The expression register: the term the current loop step extends.
    pub(crate) term: Option<Term>,
    pub(crate) op_ctx: OpCtx,
    pub(crate) context: SharedContext,
    done: bool,
}

fn raw_token(term: Option<&Term>) -> Option<&Token> {
    match term {
        Some(Term::RawToken(tok)) => Some(tok),
        _ => None,
    }
}

fn raw_group(term: Option<&Term>) -> Option<&Group> {
    match term {
        Some(Term::RawGroup(group)) => Some(group),
        _ => None,
    }
}

impl Enforester {
    pub fn new(items: Vec<Term>, context: SharedContext) -> Self {
        Self {
            rest: items.into(),
            prev: Vec::new(),
            term: None,
            op_ctx: OpCtx::default(),
            context,
            done: false,
        }
    }

    pub(crate) fn resume(rest: VecDeque<Term>, context: SharedContext) -> Self {
        Self {
            rest,
            prev: Vec::new(),
            term: None,
            op_ctx: OpCtx::default(),
            context,
            done: false,
        }
    }

    /// A sub-enforester over `items` sharing this one's context.
    fn sub(&self, items: Vec<Term>) -> Enforester {
        Enforester::new(items, Rc::clone(&self.context))
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The terms committed so far, oldest first.
    pub fn accepted(&self) -> &[Term] {
        &self.prev
    }

    // =========================================================================
    // Driver
    // =========================================================================

    /// Produce the next term from the stream, or `None` at the end.
    pub fn enforest(&mut self, mode: Mode) -> Result<Option<Term>, SyntaxError> {
        self.term = None;
        if self.rest.is_empty() {
            self.done = true;
            return Ok(None);
        }
        trace!(remaining = self.rest.len(), ?mode, "enforest");
        if self.is_eof(self.peek()) {
            self.advance();
            self.done = true;
            return Ok(Some(Term::Eof));
        }
        let result = match mode {
            Mode::Expression => self.enforest_expression_loop()?,
            Mode::Module => Some(self.enforest_module_item()?),
        };
        if self.rest.is_empty() {
            self.done = true;
        }
        if let Some(term) = &result {
            self.prev.push(term.clone());
        }
        Ok(result)
    }

    // =========================================================================
    // Module items
    // =========================================================================

    fn enforest_module_item(&mut self) -> Result<Term, SyntaxError> {
        if self.is_keyword_named(self.peek(), "import") {
            self.advance();
            return self.enforest_import_declaration();
        }
        if self.is_keyword_named(self.peek(), "export") {
            self.advance();
            return self.enforest_export_declaration();
        }
        self.enforest_statement()
    }

    /// Parse an import, the `import` keyword already consumed.
    fn enforest_import_declaration(&mut self) -> Result<Term, SyntaxError> {
        let mut default_binding = None;

        // import "mod";
        if self.is_string(self.peek()) {
            let module_specifier = self.match_string_literal()?;
            self.consume_semicolon();
            return Ok(Term::Import {
                default_binding: None,
                named_imports: Vec::new(),
                module_specifier,
                for_syntax: false,
            });
        }

        if self.is_identifier(self.peek()) || self.is_keyword(self.peek()) {
            default_binding = Some(Box::new(self.enforest_binding_identifier()?));
            if !self.is_punctuator(self.peek(), ",") {
                let module_specifier = self.enforest_from_clause()?;
                let for_syntax = self.eat_for_syntax();
                self.consume_semicolon();
                return Ok(Term::Import {
                    default_binding,
                    named_imports: Vec::new(),
                    module_specifier,
                    for_syntax,
                });
            }
            self.consume_comma();
        }

        if self.is_punctuator(self.peek(), "*") {
            self.advance();
            self.match_identifier_named("as")?;
            let namespace_binding = Box::new(self.enforest_binding_identifier()?);
            let module_specifier = self.enforest_from_clause()?;
            let for_syntax = self.eat_for_syntax();
            self.consume_semicolon();
            return Ok(Term::ImportNamespace {
                default_binding,
                namespace_binding,
                module_specifier,
                for_syntax,
            });
        }

        if self.is_braces(self.peek()) {
            let interior = self.match_curlies()?;
            let named_imports = self.enforest_named_imports(interior)?;
            let module_specifier = self.enforest_from_clause()?;
            let for_syntax = self.eat_for_syntax();
            self.consume_semicolon();
            return Ok(Term::Import {
                default_binding,
                named_imports,
                module_specifier,
                for_syntax,
            });
        }

        Err(self.malformed_module())
    }

    fn enforest_named_imports(&mut self, interior: Vec<Term>) -> Result<Vec<Term>, SyntaxError> {
        let mut enf = self.sub(interior);
        let mut imports = Vec::new();
        while !enf.rest.is_empty() {
            imports.push(enf.enforest_import_specifier()?);
            enf.consume_comma();
        }
        Ok(imports)
    }

    fn enforest_import_specifier(&mut self) -> Result<Term, SyntaxError> {
        if !(self.is_identifier(self.peek()) || self.is_keyword(self.peek())) {
            return Err(self.malformed_module());
        }
        let name = self.match_any_token()?;
        if self.is_identifier_named(self.peek(), "as") {
            self.advance();
            let binding = Box::new(self.enforest_binding_identifier()?);
            return Ok(Term::ImportSpecifier {
                name: Some(name),
                binding,
            });
        }
        Ok(Term::ImportSpecifier {
            name: None,
            binding: Box::new(Term::BindingIdentifier { name }),
        })
    }

    fn enforest_from_clause(&mut self) -> Result<Token, SyntaxError> {
        self.match_identifier_named("from")?;
        self.match_string_literal()
    }

    /// Consume a trailing `for syntax`, reporting whether it was present.
    fn eat_for_syntax(&mut self) -> bool {
        if self.is_keyword_named(self.peek(), "for") && self.is_identifier_named(self.peek_n(1), "syntax")
        {
            self.advance();
            self.advance();
            true
        } else {
            false
        }
    }

    /// Parse an export, the `export` keyword already consumed.
    fn enforest_export_declaration(&mut self) -> Result<Term, SyntaxError> {
        if self.is_punctuator(self.peek(), "*") {
            self.advance();
            let module_specifier = self.enforest_from_clause()?;
            self.consume_semicolon();
            return Ok(Term::ExportAllFrom { module_specifier });
        }
        if self.is_braces(self.peek()) {
            let interior = self.match_curlies()?;
            let named_exports = self.enforest_named_exports(interior)?;
            let module_specifier = if self.is_identifier_named(self.peek(), "from") {
                Some(self.enforest_from_clause()?)
            } else {
                None
            };
            self.consume_semicolon();
            return Ok(Term::ExportFrom {
                named_exports,
                module_specifier,
            });
        }
        if self.is_keyword_named(self.peek(), "class") {
            return Ok(Term::Export {
                declaration: Box::new(self.enforest_class(false, false)?),
            });
        }
        if self.has_transform(self.peek(), &Transform::FunctionDecl) {
            return Ok(Term::Export {
                declaration: Box::new(self.enforest_function(false, false)?),
            });
        }
        if self.is_keyword_named(self.peek(), "default") {
            self.advance();
            if self.has_transform(self.peek(), &Transform::FunctionDecl) {
                return Ok(Term::ExportDefault {
                    body: Box::new(self.enforest_function(false, true)?),
                });
            }
            if self.is_keyword_named(self.peek(), "class") {
                return Ok(Term::ExportDefault {
                    body: Box::new(self.enforest_class(false, true)?),
                });
            }
            let body = match self.enforest_expression_loop()? {
                Some(t) => t,
                None => return Err(self.expected("an expression")),
            };
            self.consume_semicolon();
            return Ok(Term::ExportDefault {
                body: Box::new(body),
            });
        }
        if self.is_var_decl_head(self.peek()) {
            let declaration = self.enforest_variable_declaration()?;
            self.consume_semicolon();
            return Ok(Term::Export {
                declaration: Box::new(declaration),
            });
        }
        Err(self.malformed_module())
    }

    fn enforest_named_exports(&mut self, interior: Vec<Term>) -> Result<Vec<Term>, SyntaxError> {
        let mut enf = self.sub(interior);
        let mut exports = Vec::new();
        while !enf.rest.is_empty() {
            if !(enf.is_identifier(enf.peek()) || enf.is_keyword(enf.peek())) {
                return Err(enf.malformed_module());
            }
            let name = enf.match_any_token()?;
            if enf.is_identifier_named(enf.peek(), "as") {
                enf.advance();
                let exported_name = enf.match_any_token()?;
                exports.push(Term::ExportSpecifier {
                    name: Some(name),
                    exported_name,
                });
            } else {
                exports.push(Term::ExportSpecifier {
                    name: None,
                    exported_name: name,
                });
            }
            enf.consume_comma();
        }
        Ok(exports)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub(crate) fn enforest_statement(&mut self) -> Result<Term, SyntaxError> {
        if self.is_compiletime(self.peek()) {
            self.expand_macro()?;
        }

        // A finished statement already in the stream passes through.
        if matches!(self.peek(), Some(t) if t.is_statement()) {
            if let Some(term) = self.advance() {
                return Ok(term);
            }
        }

        if self.is_braces(self.peek()) {
            return self.enforest_block_statement();
        }
        if self.is_keyword_named(self.peek(), "class") {
            return self.enforest_class(false, false);
        }
        if self.has_transform(self.peek(), &Transform::FunctionDecl) {
            return self.enforest_function(false, false);
        }
        if self.is_identifier(self.peek()) && self.is_punctuator(self.peek_n(1), ":") {
            return self.enforest_labeled_statement();
        }

        if self.has_transform(self.peek(), &Transform::If) {
            return self.enforest_if_statement();
        }
        if self.has_transform(self.peek(), &Transform::For) {
            return self.enforest_for_statement();
        }
        if self.has_transform(self.peek(), &Transform::Switch) {
            return self.enforest_switch_statement();
        }
        if self.has_transform(self.peek(), &Transform::Break) {
            return self.enforest_break_statement();
        }
        if self.has_transform(self.peek(), &Transform::Continue) {
            return self.enforest_continue_statement();
        }
        if self.has_transform(self.peek(), &Transform::Do) {
            return self.enforest_do_statement();
        }
        if self.has_transform(self.peek(), &Transform::While) {
            return self.enforest_while_statement();
        }
        if self.has_transform(self.peek(), &Transform::Try) {
            return self.enforest_try_statement();
        }
        if self.has_transform(self.peek(), &Transform::With) {
            return self.enforest_with_statement();
        }
        if self.has_transform(self.peek(), &Transform::Debugger) {
            self.advance();
            return Ok(Term::Debugger);
        }
        if self.has_transform(self.peek(), &Transform::Throw) {
            return self.enforest_throw_statement();
        }
        if self.has_transform(self.peek(), &Transform::ReturnStatement) {
            return self.enforest_return_statement();
        }
        if self.is_var_decl_head(self.peek()) {
            let declaration = self.enforest_variable_declaration()?;
            self.consume_semicolon();
            return Ok(Term::VariableDeclarationStatement {
                declaration: Box::new(declaration),
            });
        }
        if self.is_punctuator(self.peek(), ";") {
            self.advance();
            return Ok(Term::EmptyStatement);
        }

        self.enforest_expression_statement()
    }

    fn enforest_expression_statement(&mut self) -> Result<Term, SyntaxError> {
        let expression = match self.enforest_expression()? {
            Some(t) => t,
            None => return Err(self.expected("a statement")),
        };
        self.consume_semicolon();
        Ok(Term::ExpressionStatement {
            expression: Box::new(expression),
        })
    }

    fn enforest_block_statement(&mut self) -> Result<Term, SyntaxError> {
        // Block bodies stay raw; the expander descends into them with the
        // bindings of the enclosing forms in place.
        let statements = self.match_curlies()?;
        Ok(Term::Block { statements })
    }

    fn enforest_labeled_statement(&mut self) -> Result<Term, SyntaxError> {
        let label = self.match_identifier()?;
        self.match_punctuator(":")?;
        let body = self.enforest_statement()?;
        Ok(Term::Labeled {
            label,
            body: Box::new(body),
        })
    }

    fn enforest_if_statement(&mut self) -> Result<Term, SyntaxError> {
        self.advance();
        let interior = self.match_parens()?;
        let mut enf = self.sub(interior);
        let test = match enf.enforest_expression()? {
            Some(t) => t,
            None => return Err(enf.expected("a test expression")),
        };
        let consequent = Box::new(self.enforest_statement()?);
        let mut alternate = None;
        if self.is_keyword_named(self.peek(), "else") {
            self.advance();
            alternate = Some(Box::new(self.enforest_statement()?));
        }
        Ok(Term::If {
            test: Box::new(test),
            consequent,
            alternate,
        })
    }

    fn enforest_while_statement(&mut self) -> Result<Term, SyntaxError> {
        self.advance();
        let interior = self.match_parens()?;
        let mut enf = self.sub(interior);
        let test = match enf.enforest_expression()? {
            Some(t) => t,
            None => return Err(enf.expected("a test expression")),
        };
        let body = Box::new(self.enforest_statement()?);
        Ok(Term::While {
            test: Box::new(test),
            body,
        })
    }

    fn enforest_do_statement(&mut self) -> Result<Term, SyntaxError> {
        self.advance();
        let body = Box::new(self.enforest_statement()?);
        self.match_keyword("while")?;
        let interior = self.match_parens()?;
        let mut enf = self.sub(interior);
        let test = match enf.enforest_expression()? {
            Some(t) => t,
            None => return Err(enf.expected("a test expression")),
        };
        self.consume_semicolon();
        Ok(Term::DoWhile {
            body,
            test: Box::new(test),
        })
    }

    fn enforest_for_statement(&mut self) -> Result<Term, SyntaxError> {
        self.advance();
        let interior = self.match_parens()?;
        let mut enf = self.sub(interior);

        // for ( ; test ; update )
        if enf.is_punctuator(enf.peek(), ";") {
            enf.advance();
            let (test, update) = enf.finish_c_style_head()?;
            let body = Box::new(self.enforest_statement()?);
            return Ok(Term::For {
                init: None,
                test,
                update,
                body,
            });
        }

        if enf.is_var_decl_head(enf.peek()) {
            let decl = enf.enforest_variable_declaration()?;
            if enf.is_keyword_named(enf.peek(), "in") || enf.is_identifier_named(enf.peek(), "of") {
                let is_in = enf.is_keyword_named(enf.peek(), "in");
                enf.advance();
                let right = match enf.enforest_expression()? {
                    Some(t) => t,
                    None => return Err(enf.expected("an expression")),
                };
                let body = Box::new(self.enforest_statement()?);
                let left = Box::new(decl);
                let right = Box::new(right);
                return Ok(if is_in {
                    Term::ForIn { left, right, body }
                } else {
                    Term::ForOf { left, right, body }
                });
            }
            enf.match_punctuator(";")?;
            let (test, update) = enf.finish_c_style_head()?;
            let body = Box::new(self.enforest_statement()?);
            return Ok(Term::For {
                init: Some(Box::new(decl)),
                test,
                update,
                body,
            });
        }

        // Bare binding target followed by in/of. The target itself may be a
        // single group (a destructuring pattern), so one lookahead suffices.
        if enf.is_keyword_named(enf.peek_n(1), "in") || enf.is_identifier_named(enf.peek_n(1), "of")
        {
            let left = Box::new(enf.enforest_binding_target(false)?);
            let is_in = enf.is_keyword_named(enf.peek(), "in");
            enf.advance();
            let right = match enf.enforest_expression()? {
                Some(t) => t,
                None => return Err(enf.expected("an expression")),
            };
            let body = Box::new(self.enforest_statement()?);
            let right = Box::new(right);
            return Ok(if is_in {
                Term::ForIn { left, right, body }
            } else {
                Term::ForOf { left, right, body }
            });
        }

        let init = match enf.enforest_expression()? {
            Some(t) => Some(Box::new(t)),
            None => None,
        };
        enf.match_punctuator(";")?;
        let (test, update) = enf.finish_c_style_head()?;
        let body = Box::new(self.enforest_statement()?);
        Ok(Term::For {
            init,
            test,
            update,
            body,
        })
    }

    /// Parse `test ; update` after the init clause of a C-style `for` head.
    fn finish_c_style_head(
        &mut self,
    ) -> Result<(Option<Box<Term>>, Option<Box<Term>>), SyntaxError> {
        let test = if self.is_punctuator(self.peek(), ";") {
            self.advance();
            None
        } else {
            let t = self.enforest_expression()?;
            self.match_punctuator(";")?;
            t.map(Box::new)
        };
        let update = if self.rest.is_empty() {
            None
        } else {
            self.enforest_expression()?.map(Box::new)
        };
        Ok((test, update))
    }

    fn enforest_switch_statement(&mut self) -> Result<Term, SyntaxError> {
        self.advance();
        let interior = self.match_parens()?;
        let mut enf = self.sub(interior);
        let discriminant = match enf.enforest_expression()? {
            Some(t) => Box::new(t),
            None => return Err(enf.expected("a discriminant expression")),
        };
        let body = self.match_curlies()?;
        let mut enf = self.sub(body);
        let mut pre = Vec::new();
        while !enf.rest.is_empty() {
            if enf.is_keyword_named(enf.peek(), "default") {
                enf.advance();
                enf.match_punctuator(":")?;
                let default_case = Term::SwitchDefault {
                    consequent: enf.enforest_switch_case_body()?,
                };
                let mut post = Vec::new();
                while !enf.rest.is_empty() {
                    post.push(enf.enforest_switch_case()?);
                }
                return Ok(Term::SwitchWithDefault {
                    discriminant,
                    pre_default_cases: pre,
                    default_case: Box::new(default_case),
                    post_default_cases: post,
                });
            }
            pre.push(enf.enforest_switch_case()?);
        }
        Ok(Term::Switch {
            discriminant,
            cases: pre,
        })
    }

    fn enforest_switch_case(&mut self) -> Result<Term, SyntaxError> {
        self.match_keyword("case")?;
        let test = match self.enforest_expression()? {
            Some(t) => Box::new(t),
            None => return Err(self.expected("a case test expression")),
        };
        self.match_punctuator(":")?;
        Ok(Term::SwitchCase {
            test,
            consequent: self.enforest_switch_case_body()?,
        })
    }

    /// Statements up to the next `case`/`default` or the end of the block.
    fn enforest_switch_case_body(&mut self) -> Result<Vec<Term>, SyntaxError> {
        let mut body = Vec::new();
        while !(self.rest.is_empty()
            || self.is_keyword_named(self.peek(), "default")
            || self.is_keyword_named(self.peek(), "case"))
        {
            body.push(self.enforest_statement()?);
        }
        Ok(body)
    }

    fn enforest_break_statement(&mut self) -> Result<Term, SyntaxError> {
        self.advance();
        if self.rest.is_empty() || self.is_punctuator(self.peek(), ";") {
            self.consume_semicolon();
            return Ok(Term::Break { label: None });
        }
        if self.is_identifier(self.peek())
            || self.is_keyword_named(self.peek(), "yield")
            || self.is_keyword_named(self.peek(), "let")
        {
            let label = self.match_any_token()?;
            self.consume_semicolon();
            return Ok(Term::Break { label: Some(label) });
        }
        self.consume_semicolon();
        Ok(Term::Break { label: None })
    }

    fn enforest_continue_statement(&mut self) -> Result<Term, SyntaxError> {
        let kw = self.match_any_token()?;
        if self.rest.is_empty() || self.is_punctuator(self.peek(), ";") {
            self.consume_semicolon();
            return Ok(Term::Continue { label: None });
        }
        if (self.is_identifier(self.peek())
            || self.is_keyword_named(self.peek(), "yield")
            || self.is_keyword_named(self.peek(), "let"))
            && self.token_line_eq(&kw, self.peek())
        {
            let label = self.match_any_token()?;
            self.consume_semicolon();
            return Ok(Term::Continue { label: Some(label) });
        }
        self.consume_semicolon();
        Ok(Term::Continue { label: None })
    }

    fn enforest_try_statement(&mut self) -> Result<Term, SyntaxError> {
        self.advance();
        let body = Box::new(self.enforest_block_statement()?);
        if self.is_keyword_named(self.peek(), "catch") {
            let catch_clause = Box::new(self.enforest_catch_clause()?);
            if self.is_keyword_named(self.peek(), "finally") {
                self.advance();
                let finalizer = Box::new(self.enforest_block_statement()?);
                return Ok(Term::TryFinally {
                    body,
                    catch_clause: Some(catch_clause),
                    finalizer,
                });
            }
            return Ok(Term::TryCatch { body, catch_clause });
        }
        if self.is_keyword_named(self.peek(), "finally") {
            self.advance();
            let finalizer = Box::new(self.enforest_block_statement()?);
            return Ok(Term::TryFinally {
                body,
                catch_clause: None,
                finalizer,
            });
        }
        Err(SyntaxError::UnterminatedTry {
            context: context_window(&self.rest, self.peek()),
        })
    }

    fn enforest_catch_clause(&mut self) -> Result<Term, SyntaxError> {
        self.match_keyword("catch")?;
        let interior = self.match_parens()?;
        let mut enf = self.sub(interior);
        let binding = Box::new(enf.enforest_binding_target(false)?);
        let body = Box::new(self.enforest_block_statement()?);
        Ok(Term::CatchClause { binding, body })
    }

    fn enforest_with_statement(&mut self) -> Result<Term, SyntaxError> {
        self.advance();
        let interior = self.match_parens()?;
        let mut enf = self.sub(interior);
        let object = match enf.enforest_expression()? {
            Some(t) => Box::new(t),
            None => return Err(enf.expected("an expression")),
        };
        let body = Box::new(self.enforest_statement()?);
        Ok(Term::With { object, body })
    }

    fn enforest_throw_statement(&mut self) -> Result<Term, SyntaxError> {
        self.advance();
        let expression = match self.enforest_expression()? {
            Some(t) => Box::new(t),
            None => return Err(self.expected("an expression")),
        };
        self.consume_semicolon();
        Ok(Term::Throw { expression })
    }

    fn enforest_return_statement(&mut self) -> Result<Term, SyntaxError> {
        let kw = self.match_any_token()?;
        // No argument on a later line: the return ends here.
        if self.rest.is_empty() || !self.token_line_eq(&kw, self.peek()) {
            self.consume_semicolon();
            return Ok(Term::Return { expression: None });
        }
        if self.is_punctuator(self.peek(), ";") {
            self.consume_semicolon();
            return Ok(Term::Return { expression: None });
        }
        let expression = match self.enforest_expression()? {
            Some(t) => Some(Box::new(t)),
            None => return Err(self.expected("an expression")),
        };
        self.consume_semicolon();
        Ok(Term::Return { expression })
    }

    // =========================================================================
    // Declarations and binding forms
    // =========================================================================

    fn enforest_variable_declaration(&mut self) -> Result<Term, SyntaxError> {
        let kind_tok = self.match_any_token()?;
        let kind = match self.transform_of_token(&kind_tok) {
            Some(Transform::VariableDecl) => VarKind::Var,
            Some(Transform::LetDecl) => VarKind::Let,
            Some(Transform::ConstDecl) => VarKind::Const,
            Some(Transform::SyntaxDecl) => VarKind::Syntax,
            Some(Transform::SyntaxrecDecl) => VarKind::Syntaxrec,
            _ => return Err(self.expected("a declaration keyword")),
        };
        let allow_punctuator = matches!(kind, VarKind::Syntax | VarKind::Syntaxrec);
        let mut declarators = Vec::new();
        loop {
            declarators.push(self.enforest_variable_declarator(allow_punctuator)?);
            if self.is_punctuator(self.peek(), ",") {
                self.advance();
            } else {
                break;
            }
        }
        Ok(Term::VariableDeclaration { kind, declarators })
    }

    fn enforest_variable_declarator(
        &mut self,
        allow_punctuator: bool,
    ) -> Result<Term, SyntaxError> {
        let binding = self.enforest_binding_target(allow_punctuator)?;
        let mut init = None;
        if self.is_assign_named(self.peek(), "=") {
            self.advance();
            let rest = mem::take(&mut self.rest);
            let mut enf = Enforester::resume(rest, Rc::clone(&self.context));
            let expr = enf.enforest(Mode::Expression)?;
            self.rest = mem::take(&mut enf.rest);
            init = expr.map(Box::new);
        }
        Ok(Term::VariableDeclarator {
            binding: Box::new(binding),
            init,
        })
    }

    pub(crate) fn enforest_binding_target(
        &mut self,
        allow_punctuator: bool,
    ) -> Result<Term, SyntaxError> {
        if self.is_identifier(self.peek())
            || self.is_keyword(self.peek())
            || (allow_punctuator && self.is_any_punctuator(self.peek()))
        {
            return self.enforest_binding_identifier();
        }
        if self.is_brackets(self.peek()) {
            return self.enforest_array_binding();
        }
        if self.is_braces(self.peek()) {
            return self.enforest_object_binding();
        }
        Err(SyntaxError::InvalidDestructuringTarget {
            token: describe(self.peek()),
            context: context_window(&self.rest, self.peek()),
        })
    }

    fn enforest_binding_identifier(&mut self) -> Result<Term, SyntaxError> {
        let name = self.match_any_token()?;
        Ok(Term::BindingIdentifier { name })
    }

    fn enforest_array_binding(&mut self) -> Result<Term, SyntaxError> {
        let interior = self.match_squares()?;
        let mut enf = self.sub(interior);
        let mut elements = Vec::new();
        let mut rest_element = None;
        while !enf.rest.is_empty() {
            if enf.is_punctuator(enf.peek(), ",") {
                enf.consume_comma();
                elements.push(None);
                continue;
            }
            if enf.is_punctuator(enf.peek(), "...") {
                enf.advance();
                rest_element = Some(Box::new(enf.enforest_binding_target(false)?));
                break;
            }
            elements.push(Some(enf.enforest_binding_element()?));
            enf.consume_comma();
        }
        Ok(Term::ArrayBinding {
            elements,
            rest: rest_element,
        })
    }

    fn enforest_object_binding(&mut self) -> Result<Term, SyntaxError> {
        let interior = self.match_curlies()?;
        let mut enf = self.sub(interior);
        let mut properties = Vec::new();
        while !enf.rest.is_empty() {
            properties.push(enf.enforest_binding_property()?);
            enf.consume_comma();
        }
        Ok(Term::ObjectBinding { properties })
    }

    fn enforest_binding_property(&mut self) -> Result<Term, SyntaxError> {
        let simple_name = self.is_identifier(self.peek())
            || self.is_keyword_named(self.peek(), "let")
            || self.is_keyword_named(self.peek(), "yield");
        let (name, binding) = self.enforest_property_name()?;
        if simple_name && !self.is_punctuator(self.peek(), ":") {
            let binding = match binding {
                Some(b) => b,
                None => return Err(self.expected("a binding identifier")),
            };
            let mut init = None;
            if self.is_assign_named(self.peek(), "=") {
                self.advance();
                init = self.enforest_expression_loop()?.map(Box::new);
            }
            return Ok(Term::BindingPropertyIdentifier {
                binding: Box::new(binding),
                init,
            });
        }
        self.match_punctuator(":")?;
        let binding = Box::new(self.enforest_binding_element()?);
        Ok(Term::BindingPropertyProperty {
            name: Box::new(name),
            binding,
        })
    }

    fn enforest_binding_element(&mut self) -> Result<Term, SyntaxError> {
        let binding = self.enforest_binding_target(false)?;
        if self.is_assign_named(self.peek(), "=") {
            self.advance();
            let init = match self.enforest_expression_loop()? {
                Some(t) => t,
                None => return Err(self.expected("a default expression")),
            };
            return Ok(Term::BindingWithDefault {
                binding: Box::new(binding),
                init: Box::new(init),
            });
        }
        Ok(binding)
    }

    /// Parse a property name. For plain identifier names the second element
    /// is the same name as a binding, for shorthand positions.
    fn enforest_property_name(&mut self) -> Result<(Term, Option<Term>), SyntaxError> {
        if self.is_string(self.peek()) || self.is_number(self.peek()) {
            let value = self.match_any_token()?;
            return Ok((Term::StaticPropertyName { value }, None));
        }
        if self.is_brackets(self.peek()) {
            let interior = self.match_squares()?;
            let mut enf = self.sub(interior);
            let expression = match enf.enforest_expression_loop()? {
                Some(t) => t,
                None => return Err(enf.expected("an expression")),
            };
            return Ok((
                Term::ComputedPropertyName {
                    expression: Box::new(expression),
                },
                None,
            ));
        }
        let name = self.match_any_token()?;
        Ok((
            Term::StaticPropertyName {
                value: name.clone(),
            },
            Some(Term::BindingIdentifier { name }),
        ))
    }

    fn enforest_function(&mut self, is_expr: bool, in_default: bool) -> Result<Term, SyntaxError> {
        let kw = self.match_any_token()?;
        let mut is_generator = false;
        if self.is_punctuator(self.peek(), "*") {
            is_generator = true;
            self.advance();
        }
        let name = if !self.is_parens(self.peek()) {
            Some(Box::new(self.enforest_binding_identifier()?))
        } else if in_default {
            Some(Box::new(Term::BindingIdentifier {
                name: Token::identifier_like("*default*", &kw),
            }))
        } else {
            None
        };
        let params = Box::new(self.enforest_formal_parameters()?);
        let body = self.match_curlies()?;
        if is_expr {
            return Ok(Term::FunctionExpression {
                name,
                is_generator,
                params,
                body,
            });
        }
        let name = match name {
            Some(n) => n,
            None => return Err(self.expected("a function name")),
        };
        Ok(Term::FunctionDeclaration {
            name,
            is_generator,
            params,
            body,
        })
    }

    fn enforest_formal_parameters(&mut self) -> Result<Term, SyntaxError> {
        let interior = self.match_parens()?;
        let mut enf = self.sub(interior);
        enf.formal_parameters_from_stream()
    }

    fn formal_parameters_from_stream(&mut self) -> Result<Term, SyntaxError> {
        let mut items = Vec::new();
        let mut rest_param = None;
        while !self.rest.is_empty() {
            if self.is_punctuator(self.peek(), "...") {
                self.advance();
                rest_param = Some(Box::new(self.enforest_binding_element()?));
                break;
            }
            items.push(self.enforest_binding_element()?);
            self.consume_comma();
        }
        Ok(Term::FormalParameters {
            items,
            rest: rest_param,
        })
    }

    fn enforest_class(&mut self, is_expr: bool, in_default: bool) -> Result<Term, SyntaxError> {
        let kw = self.match_any_token()?;
        let mut name = None;
        let mut super_class = None;
        if self.is_identifier(self.peek()) {
            name = Some(Box::new(self.enforest_binding_identifier()?));
        } else if in_default {
            name = Some(Box::new(Term::BindingIdentifier {
                name: Token::identifier_like("_default", &kw),
            }));
        }
        if self.is_keyword_named(self.peek(), "extends") {
            self.advance();
            super_class = self.enforest_expression_loop()?.map(Box::new);
        }
        let interior = self.match_curlies()?;
        let mut enf = self.sub(interior);
        let mut elements = Vec::new();
        while !enf.rest.is_empty() {
            if enf.is_punctuator(enf.peek(), ";") {
                enf.advance();
                continue;
            }
            let mut is_static = false;
            let mut head = enf.enforest_method_definition()?;
            if let PropHead::Identifier(Term::StaticPropertyName { value }) = &head {
                if value.value == "static" {
                    is_static = true;
                    head = enf.enforest_method_definition()?;
                }
            }
            match head {
                PropHead::Method(method) => elements.push(ClassElement { is_static, method }),
                _ => return Err(enf.expected("a method definition")),
            }
        }
        if is_expr {
            Ok(Term::ClassExpression {
                name,
                super_class,
                elements,
            })
        } else {
            Ok(Term::ClassDeclaration {
                name,
                super_class,
                elements,
            })
        }
    }

    fn enforest_method_definition(&mut self) -> Result<PropHead, SyntaxError> {
        let is_getter =
            self.is_identifier_named(self.peek(), "get") && self.is_property_name(self.peek_n(1));
        let is_setter =
            self.is_identifier_named(self.peek(), "set") && self.is_property_name(self.peek_n(1));
        let mut is_generator = false;
        if self.is_punctuator(self.peek(), "*") {
            is_generator = true;
            self.advance();
        }

        if is_getter {
            self.advance();
            let (name, _) = self.enforest_property_name()?;
            self.match_parens()?;
            let body = self.match_curlies()?;
            return Ok(PropHead::Method(Term::Getter {
                name: Box::new(name),
                body,
            }));
        }
        if is_setter {
            self.advance();
            let (name, _) = self.enforest_property_name()?;
            let interior = self.match_parens()?;
            let mut enf = self.sub(interior);
            let param = Box::new(enf.enforest_binding_element()?);
            let body = self.match_curlies()?;
            return Ok(PropHead::Method(Term::Setter {
                name: Box::new(name),
                param,
                body,
            }));
        }

        let (name, _) = self.enforest_property_name()?;
        if self.is_parens(self.peek()) {
            let params = Box::new(self.enforest_formal_parameters()?);
            let body = self.match_curlies()?;
            return Ok(PropHead::Method(Term::Method {
                name: Box::new(name),
                is_generator,
                params,
                body,
            }));
        }
        match name {
            n @ Term::StaticPropertyName { .. } => Ok(PropHead::Identifier(n)),
            n => Ok(PropHead::Property(n)),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// A full expression, folding comma sequences left-associatively.
    pub(crate) fn enforest_expression(&mut self) -> Result<Option<Term>, SyntaxError> {
        let mut left = match self.enforest_expression_loop()? {
            Some(t) => t,
            None => {
                self.term = None;
                return Ok(None);
            }
        };
        while self.is_punctuator(self.peek(), ",") {
            let op = self.match_any_token()?;
            let right = match self.enforest_expression_loop()? {
                Some(t) => t,
                None => return Err(self.expected("an expression after `,`")),
            };
            left = Term::BinaryExpression {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.term = None;
        Ok(Some(left))
    }

    /// One assignment-level expression, saving and restoring any operator
    /// context of the enclosing loop.
    pub(crate) fn enforest_expression_loop(&mut self) -> Result<Option<Term>, SyntaxError> {
        let saved_ctx = mem::take(&mut self.op_ctx);
        let saved_term = self.term.take();
        let result = self.expression_loop();
        self.op_ctx = saved_ctx;
        self.term = saved_term;
        result
    }

    /// The fixpoint loop: call the dispatcher until nothing changes, folding
    /// pending operator frames on the way out.
    fn expression_loop(&mut self) -> Result<Option<Term>, SyntaxError> {
        self.term = None;
        self.op_ctx = OpCtx::default();
        loop {
            match self.enforest_assignment_expression()? {
                Climb::NoChange => {
                    if self.op_ctx.stack.is_empty() {
                        break;
                    }
                    let combine = mem::replace(&mut self.op_ctx.combine, Combine::Id);
                    let term = match self.term.take() {
                        Some(t) => t,
                        None => return Err(self.expected("an expression")),
                    };
                    let term = self.apply_combine(combine, term)?;
                    self.term = Some(term);
                    self.pop_op_frame();
                }
                Climb::Operator | Climb::Expansion => {
                    self.term = None;
                }
                Climb::Term(t) => {
                    self.term = Some(t);
                }
            }
        }
        Ok(self.term.take())
    }

    /// One step: either extend `self.term`, push an operator frame, rewrite
    /// the stream, or report no progress.
    fn enforest_assignment_expression(&mut self) -> Result<Climb, SyntaxError> {
        if self.term.is_none() && self.is_compiletime(self.peek()) {
            self.expand_macro()?;
            // fall through and re-read the rewritten stream
        }

        if self.term.is_none() {
            if matches!(self.peek(), Some(t) if t.is_expression()) {
                if let Some(term) = self.advance() {
                    return Ok(Climb::Term(term));
                }
            }
            if self.is_keyword_named(self.peek(), "yield") {
                return Ok(Climb::Term(self.enforest_yield_expression()?));
            }
            if self.is_keyword_named(self.peek(), "class") {
                return Ok(Climb::Term(self.enforest_class(true, false)?));
            }
            if (self.is_identifier(self.peek()) || self.is_parens(self.peek()))
                && self.is_punctuator(self.peek_n(1), "=>")
                && self.lines_eq(self.peek(), self.peek_n(1))
            {
                return Ok(Climb::Term(self.enforest_arrow_expression()?));
            }
            if self.is_syntax_group(self.peek()) {
                return Ok(Climb::Term(self.enforest_syntax_template()?));
            }
            if self.is_parens(self.peek()) {
                let inner = self.match_parens()?;
                return Ok(Climb::Term(Term::Parenthesized { inner }));
            }
            if self.is_unary_op(self.peek()) {
                return self.enforest_unary_expression();
            }
            if self.is_var_binding(self.peek()) {
                return self.substitute_var_binding();
            }
            if self.has_transform(self.peek(), &Transform::New)
                || self.is_keyword_named(self.peek(), "super")
            {
                return Ok(Climb::Term(self.enforest_left_hand_side_expression(true)?));
            }
            if self.starts_primary() {
                return Ok(Climb::Term(self.enforest_primary_expression()?));
            }
        }

        if self.term.is_some() {
            if self.is_parens(self.peek())
                || self.is_brackets(self.peek())
                || (self.is_punctuator(self.peek(), ".")
                    && (self.is_identifier(self.peek_n(1)) || self.is_keyword(self.peek_n(1))))
            {
                return Ok(Climb::Term(self.enforest_left_hand_side_expression(true)?));
            }
            if self.is_template(self.peek()) {
                return Ok(Climb::Term(self.enforest_template_literal()?));
            }
            if self.is_update_op(self.peek()) {
                let operand = match self.term.take() {
                    Some(t) => t,
                    None => return Ok(Climb::NoChange),
                };
                let op = self.match_any_token()?;
                let operand = self.transform_destructuring(operand)?;
                return Ok(Climb::Term(Term::UpdateExpression {
                    op,
                    prefix: false,
                    operand: Box::new(operand),
                }));
            }
            if self.is_binary_op(self.peek()) {
                return self.enforest_binary_expression();
            }
            if self.is_assign(self.peek()) {
                return self.enforest_assignment();
            }
            if self.is_punctuator(self.peek(), "?") {
                return Ok(Climb::Term(self.enforest_conditional_expression()?));
            }
        }

        Ok(Climb::NoChange)
    }

    fn starts_primary(&self) -> bool {
        let t = self.peek();
        self.is_keyword_named(t, "this")
            || self.is_identifier(t)
            || self.is_keyword_named(t, "let")
            || self.is_number(t)
            || self.is_string(t)
            || self.is_template(t)
            || self.is_boolean(t)
            || self.is_null(t)
            || self.is_regex(t)
            || self.has_transform(t, &Transform::FunctionDecl)
            || self.is_braces(t)
            || self.is_brackets(t)
    }

    fn enforest_primary_expression(&mut self) -> Result<Term, SyntaxError> {
        if self.is_keyword_named(self.peek(), "this") {
            self.advance();
            return Ok(Term::This);
        }
        if self.has_transform(self.peek(), &Transform::FunctionDecl) {
            return self.enforest_function(true, false);
        }
        if self.is_number(self.peek()) {
            return self.enforest_numeric_literal();
        }
        if self.is_string(self.peek()) {
            let tok = self.match_any_token()?;
            return Ok(Term::LiteralString { value: tok.value });
        }
        if self.is_template(self.peek()) {
            return self.enforest_template_literal();
        }
        if self.is_boolean(self.peek()) {
            let tok = self.match_any_token()?;
            return Ok(Term::LiteralBoolean {
                value: tok.value == "true",
            });
        }
        if self.is_null(self.peek()) {
            self.advance();
            return Ok(Term::LiteralNull);
        }
        if self.is_regex(self.peek()) {
            return self.enforest_regex_literal();
        }
        if self.is_braces(self.peek()) {
            return self.enforest_object_expression();
        }
        if self.is_brackets(self.peek()) {
            return self.enforest_array_expression();
        }
        if self.is_identifier(self.peek())
            || self.is_keyword_named(self.peek(), "let")
            || self.is_keyword_named(self.peek(), "yield")
        {
            let name = self.match_any_token()?;
            return Ok(Term::Identifier { name });
        }
        Err(self.expected("a primary expression"))
    }

    fn enforest_numeric_literal(&mut self) -> Result<Term, SyntaxError> {
        let tok = self.match_any_token()?;
        let value: f64 = match tok.value.parse() {
            Ok(v) => v,
            Err(_) => {
                return Err(SyntaxError::UnexpectedToken {
                    token: tok.value,
                    expected: "a numeric literal".to_string(),
                    context: context_window(&self.rest, None),
                })
            }
        };
        if value.is_infinite() {
            Ok(Term::LiteralInfinity)
        } else {
            Ok(Term::LiteralNumber { value })
        }
    }

    fn enforest_regex_literal(&mut self) -> Result<Term, SyntaxError> {
        let tok = self.match_any_token()?;
        let body = tok.value.strip_prefix('/').unwrap_or(&tok.value);
        let (pattern, flags) = match body.rfind('/') {
            Some(i) => (&body[..i], &body[i + 1..]),
            None => (body, ""),
        };
        Ok(Term::LiteralRegex {
            pattern: pattern.to_string(),
            flags: flags.to_string(),
        })
    }

    fn enforest_object_expression(&mut self) -> Result<Term, SyntaxError> {
        let interior = self.match_curlies()?;
        let mut enf = self.sub(interior);
        let mut properties = Vec::new();
        while !enf.rest.is_empty() {
            let before = enf.rest.len();
            properties.push(enf.enforest_property_definition()?);
            enf.consume_comma();
            if enf.rest.len() == before {
                return Err(enf.expected("a property definition"));
            }
        }
        Ok(Term::ObjectExpression { properties })
    }

    fn enforest_property_definition(&mut self) -> Result<Term, SyntaxError> {
        match self.enforest_method_definition()? {
            PropHead::Method(method) => Ok(method),
            PropHead::Identifier(name) => {
                if self.is_assign_named(self.peek(), "=") {
                    // shorthand with default, only valid as a covered
                    // destructuring pattern
                    self.advance();
                    let init = match self.enforest_expression_loop()? {
                        Some(t) => t,
                        None => return Err(self.expected("a default expression")),
                    };
                    let binding = self.transform_destructuring(name)?;
                    return Ok(Term::BindingPropertyIdentifier {
                        binding: Box::new(binding),
                        init: Some(Box::new(init)),
                    });
                }
                if !self.is_punctuator(self.peek(), ":") {
                    let name_tok = match name {
                        Term::StaticPropertyName { value } => value,
                        _ => return Err(self.expected("a property name")),
                    };
                    return Ok(Term::ShorthandProperty { name: name_tok });
                }
                self.finish_data_property(name)
            }
            PropHead::Property(name) => self.finish_data_property(name),
        }
    }

    fn finish_data_property(&mut self, name: Term) -> Result<Term, SyntaxError> {
        self.match_punctuator(":")?;
        let expression = match self.enforest_expression_loop()? {
            Some(t) => t,
            None => return Err(self.expected("an expression")),
        };
        Ok(Term::DataProperty {
            name: Box::new(name),
            expression: Box::new(expression),
        })
    }

    fn enforest_array_expression(&mut self) -> Result<Term, SyntaxError> {
        let interior = self.match_squares()?;
        let mut enf = self.sub(interior);
        let mut elements = Vec::new();
        while !enf.rest.is_empty() {
            if enf.is_punctuator(enf.peek(), ",") {
                enf.advance();
                elements.push(None);
                continue;
            }
            if enf.is_punctuator(enf.peek(), "...") {
                enf.advance();
                let expression = match enf.enforest_expression_loop()? {
                    Some(t) => t,
                    None => return Err(enf.expected("an expression after `...`")),
                };
                elements.push(Some(Term::Spread {
                    expression: Box::new(expression),
                }));
                enf.consume_comma();
                continue;
            }
            let element = match enf.enforest_expression_loop()? {
                Some(t) => t,
                None => return Err(enf.expected("an expression")),
            };
            elements.push(Some(element));
            enf.consume_comma();
        }
        Ok(Term::ArrayExpression { elements })
    }

    fn enforest_yield_expression(&mut self) -> Result<Term, SyntaxError> {
        let kw = self.match_any_token()?;
        if self.rest.is_empty() || !self.token_line_eq(&kw, self.peek()) {
            return Ok(Term::Yield { expression: None });
        }
        let mut is_generator = false;
        if self.is_punctuator(self.peek(), "*") {
            is_generator = true;
            self.advance();
        }
        let expression = self.enforest_expression_loop()?.map(Box::new);
        if is_generator {
            Ok(Term::YieldGenerator { expression })
        } else {
            Ok(Term::Yield { expression })
        }
    }

    fn enforest_arrow_expression(&mut self) -> Result<Term, SyntaxError> {
        let params = if self.is_identifier(self.peek()) {
            let binding = self.enforest_binding_identifier()?;
            Term::FormalParameters {
                items: vec![binding],
                rest: None,
            }
        } else {
            let interior = self.match_parens()?;
            let mut enf = self.sub(interior);
            enf.formal_parameters_from_stream()?
        };
        self.match_punctuator("=>")?;
        let body = if self.is_braces(self.peek()) {
            ArrowBody::Block(self.match_curlies()?)
        } else {
            let rest = mem::take(&mut self.rest);
            let mut enf = Enforester::resume(rest, Rc::clone(&self.context));
            let expr = enf.enforest_expression_loop()?;
            self.rest = mem::take(&mut enf.rest);
            match expr {
                Some(e) => ArrowBody::Expression(Box::new(e)),
                None => return Err(self.expected("an arrow function body")),
            }
        };
        Ok(Term::ArrowExpression {
            params: Box::new(params),
            body,
        })
    }

    fn enforest_syntax_template(&mut self) -> Result<Term, SyntaxError> {
        let template = self.match_raw_group(GroupKind::Syntax)?;
        Ok(Term::SyntaxTemplate { template })
    }

    fn enforest_template_literal(&mut self) -> Result<Term, SyntaxError> {
        let tag = self.term.take().map(Box::new);
        let items = self.match_template()?;
        let mut elements = Vec::new();
        for item in items {
            match item {
                TemplateItem::Chunk(raw) => elements.push(Term::TemplateElement { raw }),
                TemplateItem::Subst(group) => {
                    let mut enf = self.sub(group.into_interior());
                    let expr = match enf.enforest_expression()? {
                        Some(t) => t,
                        None => return Err(enf.expected("an expression")),
                    };
                    elements.push(expr);
                }
            }
        }
        Ok(Term::Template { tag, elements })
    }

    /// Substitute a renamed binding's canonical identifier into the stream.
    fn substitute_var_binding(&mut self) -> Result<Climb, SyntaxError> {
        let canonical = {
            let tok = match raw_token(self.peek()) {
                Some(t) => t,
                None => return Ok(Climb::NoChange),
            };
            let cx = self.context.borrow();
            match cx.transform_of(tok) {
                Some(Transform::VarBinding(id)) if id != tok => Some(id.clone()),
                _ => None,
            }
        };
        match canonical {
            Some(id) => {
                self.advance();
                self.rest.push_front(Term::RawToken(id));
                Ok(Climb::Expansion)
            }
            // Already canonical: let the primary-expression path take it.
            None => Ok(Climb::Term(self.enforest_primary_expression()?)),
        }
    }

    fn enforest_left_hand_side_expression(
        &mut self,
        allow_call: bool,
    ) -> Result<Term, SyntaxError> {
        if self.term.is_none() {
            if self.is_keyword_named(self.peek(), "super") {
                self.advance();
                self.term = Some(Term::Super);
            } else if self.has_transform(self.peek(), &Transform::New) {
                let t = self.enforest_new_expression()?;
                self.term = Some(t);
            } else if self.is_keyword_named(self.peek(), "this") {
                self.advance();
                self.term = Some(Term::This);
            } else if !(self.is_parens(self.peek()) || self.is_brackets(self.peek())) {
                let t = self.enforest_primary_expression()?;
                self.term = Some(t);
            }
        }
        loop {
            if self.is_parens(self.peek()) {
                if !allow_call {
                    match &self.term {
                        // The parens are the constructor arguments; leave
                        // them for the new-expression to claim.
                        Some(Term::Identifier { .. })
                        | Some(Term::StaticMember { .. })
                        | Some(Term::ComputedMember { .. }) => break,
                        _ => {
                            let t = self.enforest_expression_loop()?;
                            self.term = t;
                        }
                    }
                } else {
                    let t = self.enforest_call_expression()?;
                    self.term = Some(t);
                }
            } else if self.is_brackets(self.peek()) {
                if self.term.is_some() {
                    let t = self.enforest_computed_member_expression()?;
                    self.term = Some(t);
                } else {
                    let t = self.enforest_expression_loop()?;
                    self.term = t;
                }
            } else if self.is_punctuator(self.peek(), ".")
                && (self.is_identifier(self.peek_n(1)) || self.is_keyword(self.peek_n(1)))
            {
                let t = self.enforest_static_member_expression()?;
                self.term = Some(t);
            } else if self.is_template(self.peek()) {
                let t = self.enforest_template_literal()?;
                self.term = Some(t);
            } else {
                break;
            }
            if self.term.is_none() {
                break;
            }
        }
        match self.term.take() {
            Some(t) => Ok(t),
            None => Err(self.expected("an expression")),
        }
    }

    fn enforest_new_expression(&mut self) -> Result<Term, SyntaxError> {
        self.advance();
        if self.is_punctuator(self.peek(), ".") && self.is_identifier_named(self.peek_n(1), "target")
        {
            self.advance();
            self.advance();
            return Ok(Term::NewTarget);
        }
        let callee = Box::new(self.enforest_left_hand_side_expression(false)?);
        let arguments = if self.is_parens(self.peek()) {
            self.match_parens()?
        } else {
            Vec::new()
        };
        Ok(Term::New { callee, arguments })
    }

    fn enforest_call_expression(&mut self) -> Result<Term, SyntaxError> {
        let callee = match self.term.take() {
            Some(t) => t,
            None => return Err(self.expected("a callee expression")),
        };
        // Arguments stay raw; they are expanded after enforestation.
        let arguments = self.match_parens()?;
        Ok(Term::Call {
            callee: Box::new(callee),
            arguments,
        })
    }

    fn enforest_computed_member_expression(&mut self) -> Result<Term, SyntaxError> {
        let object = match self.term.take() {
            Some(t) => t,
            None => return Err(self.expected("an expression")),
        };
        let interior = self.match_squares()?;
        let mut enf = self.sub(interior);
        let expression = match enf.enforest_expression()? {
            Some(t) => t,
            None => return Err(enf.expected("an expression")),
        };
        Ok(Term::ComputedMember {
            object: Box::new(object),
            expression: Box::new(expression),
        })
    }

    fn enforest_static_member_expression(&mut self) -> Result<Term, SyntaxError> {
        let object = match self.term.take() {
            Some(t) => t,
            None => return Err(self.expected("an expression")),
        };
        self.advance();
        let property = self.match_any_token()?;
        Ok(Term::StaticMember {
            object: Box::new(object),
            property,
        })
    }

    fn enforest_unary_expression(&mut self) -> Result<Climb, SyntaxError> {
        let op = self.match_unary_operator()?;
        let prev = mem::replace(&mut self.op_ctx.combine, Combine::Unary { op });
        self.op_ctx.stack.push((self.op_ctx.prec, prev));
        self.op_ctx.prec = UNARY_PREC;
        Ok(Climb::Operator)
    }

    fn enforest_binary_expression(&mut self) -> Result<Climb, SyntaxError> {
        let op = match raw_token(self.peek()) {
            Some(tok) => tok.clone(),
            None => return Ok(Climb::NoChange),
        };
        let left = match self.term.take() {
            Some(t) => t,
            None => return Err(self.expected("an expression")),
        };
        let tighter = operators::binary_precedence(&op.value)
            .map(|prec| operators::operator_lt(self.op_ctx.prec, prec, operators::associativity(&op.value)))
            .unwrap_or(false);
        if tighter {
            let prec = operators::binary_precedence(&op.value).unwrap_or(0);
            let prev = mem::replace(&mut self.op_ctx.combine, Combine::Binary { left, op });
            self.op_ctx.stack.push((self.op_ctx.prec, prev));
            self.op_ctx.prec = prec;
            self.advance();
            return Ok(Climb::Operator);
        }
        // Looser operator: fold the pending frame and hand the operator to
        // the resumed outer context.
        let combine = mem::replace(&mut self.op_ctx.combine, Combine::Id);
        let term = self.apply_combine(combine, left)?;
        self.pop_op_frame();
        Ok(Climb::Term(term))
    }

    fn enforest_assignment(&mut self) -> Result<Climb, SyntaxError> {
        let lhs = match self.term.take() {
            Some(t) => t,
            None => return Ok(Climb::NoChange),
        };
        let binding = self.transform_destructuring(lhs)?;
        let op = self.match_any_token()?;
        let rest = mem::take(&mut self.rest);
        let mut enf = Enforester::resume(rest, Rc::clone(&self.context));
        let init = enf.enforest(Mode::Expression)?;
        self.rest = mem::take(&mut enf.rest);
        let init = match init {
            Some(t) => t,
            None => return Err(self.expected("an expression after the assignment operator")),
        };
        let term = if op.value == "=" {
            Term::AssignmentExpression {
                binding: Box::new(binding),
                expression: Box::new(init),
            }
        } else {
            Term::CompoundAssignmentExpression {
                binding: Box::new(binding),
                op,
                expression: Box::new(init),
            }
        };
        Ok(Climb::Term(term))
    }

    fn enforest_conditional_expression(&mut self) -> Result<Term, SyntaxError> {
        // The test binds looser than any pending operator: fold one frame
        // before claiming it.
        let combine = mem::replace(&mut self.op_ctx.combine, Combine::Id);
        let term = match self.term.take() {
            Some(t) => t,
            None => return Err(self.expected("an expression")),
        };
        let test = self.apply_combine(combine, term)?;
        self.pop_op_frame();
        self.match_punctuator("?")?;

        let rest = mem::take(&mut self.rest);
        let mut enf = Enforester::resume(rest, Rc::clone(&self.context));
        let consequent = match enf.enforest_expression_loop()? {
            Some(t) => t,
            None => return Err(enf.expected("an expression")),
        };
        enf.match_punctuator(":")?;
        let rest = mem::take(&mut enf.rest);
        let mut enf = Enforester::resume(rest, Rc::clone(&self.context));
        let alternate = match enf.enforest_expression_loop()? {
            Some(t) => t,
            None => return Err(enf.expected("an expression")),
        };
        self.rest = mem::take(&mut enf.rest);
        Ok(Term::ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    // =========================================================================
    // Operator context
    // =========================================================================

    pub(crate) fn apply_combine(
        &self,
        combine: Combine,
        term: Term,
    ) -> Result<Term, SyntaxError> {
        Ok(match combine {
            Combine::Id => term,
            Combine::Unary { op } => {
                if op.value == "++" || op.value == "--" {
                    Term::UpdateExpression {
                        op,
                        prefix: true,
                        operand: Box::new(self.transform_destructuring(term)?),
                    }
                } else {
                    Term::UnaryExpression {
                        op,
                        operand: Box::new(term),
                    }
                }
            }
            Combine::Binary { left, op } => Term::BinaryExpression {
                op,
                left: Box::new(left),
                right: Box::new(term),
            },
        })
    }

    fn pop_op_frame(&mut self) {
        if let Some((prec, combine)) = self.op_ctx.stack.pop() {
            self.op_ctx.prec = prec;
            self.op_ctx.combine = combine;
        } else {
            self.op_ctx.prec = 0;
            self.op_ctx.combine = Combine::Id;
        }
    }

    // =========================================================================
    // Destructuring
    // =========================================================================

    /// Reinterpret an expression as a binding target.
    pub(crate) fn transform_destructuring(&self, term: Term) -> Result<Term, SyntaxError> {
        use Term::*;
        Ok(match term {
            Identifier { name } => BindingIdentifier { name },
            Parenthesized { inner } => {
                if inner.len() == 1 {
                    if let Some(RawToken(tok)) = inner.first() {
                        if tok.is_identifier() {
                            return Ok(BindingIdentifier { name: tok.clone() });
                        }
                    }
                }
                return Err(SyntaxError::InvalidDestructuringTarget {
                    token: "(".to_string(),
                    context: context_window(&self.rest, None),
                });
            }
            DataProperty { name, expression } => BindingPropertyProperty {
                name,
                binding: Box::new(self.transform_destructuring_with_default(*expression)?),
            },
            ShorthandProperty { name } => BindingPropertyIdentifier {
                binding: Box::new(BindingIdentifier { name }),
                init: None,
            },
            StaticPropertyName { value } => BindingIdentifier { name: value },
            ObjectExpression { properties } => ObjectBinding {
                properties: properties
                    .into_iter()
                    .map(|p| self.transform_destructuring(p))
                    .collect::<Result<_, _>>()?,
            },
            ArrayExpression { mut elements } => {
                let rest = match elements.last() {
                    Some(Some(Spread { .. })) => match elements.pop() {
                        Some(Some(Spread { expression })) => {
                            Some(Box::new(self.transform_destructuring_with_default(*expression)?))
                        }
                        _ => None,
                    },
                    _ => None,
                };
                ArrayBinding {
                    elements: elements
                        .into_iter()
                        .map(|e| {
                            e.map(|e| self.transform_destructuring_with_default(e)).transpose()
                        })
                        .collect::<Result<_, _>>()?,
                    rest,
                }
            }
            AssignmentExpression {
                binding,
                expression,
            } => BindingWithDefault {
                binding: Box::new(self.transform_destructuring(*binding)?),
                init: expression,
            },

            // Already-valid targets pass through.
            t @ (StaticMember { .. }
            | ComputedMember { .. }
            | BindingIdentifier { .. }
            | ObjectBinding { .. }
            | ArrayBinding { .. }
            | BindingWithDefault { .. }
            | BindingPropertyIdentifier { .. }
            | BindingPropertyProperty { .. }) => t,

            other => {
                return Err(SyntaxError::InvalidDestructuringTarget {
                    token: describe(Some(&other)),
                    context: context_window(&self.rest, None),
                })
            }
        })
    }

    fn transform_destructuring_with_default(&self, term: Term) -> Result<Term, SyntaxError> {
        if let Term::AssignmentExpression {
            binding,
            expression,
        } = term
        {
            return Ok(Term::BindingWithDefault {
                binding: Box::new(self.transform_destructuring(*binding)?),
                init: expression,
            });
        }
        self.transform_destructuring(term)
    }

    // =========================================================================
    // Stream access and matchers
    // =========================================================================

    pub(crate) fn peek(&self) -> Option<&Term> {
        self.rest.front()
    }

    pub(crate) fn peek_n(&self, n: usize) -> Option<&Term> {
        self.rest.get(n)
    }

    pub(crate) fn advance(&mut self) -> Option<Term> {
        self.rest.pop_front()
    }

    fn consume_semicolon(&mut self) {
        if self.is_punctuator(self.peek(), ";") {
            self.advance();
        }
    }

    fn consume_comma(&mut self) {
        if self.is_punctuator(self.peek(), ",") {
            self.advance();
        }
    }

    /// Consume the next item, which must be a raw token.
    pub(crate) fn match_any_token(&mut self) -> Result<Token, SyntaxError> {
        if raw_token(self.peek()).is_none() {
            return Err(self.expected("a token"));
        }
        match self.advance() {
            Some(Term::RawToken(tok)) => Ok(tok),
            _ => Err(self.expected("a token")),
        }
    }

    fn match_identifier(&mut self) -> Result<Token, SyntaxError> {
        if self.is_identifier(self.peek()) {
            return self.match_any_token();
        }
        Err(self.expected("an identifier"))
    }

    fn match_identifier_named(&mut self, name: &str) -> Result<Token, SyntaxError> {
        if self.is_identifier_named(self.peek(), name) {
            return self.match_any_token();
        }
        Err(self.expected(&format!("`{name}`")))
    }

    fn match_keyword(&mut self, name: &str) -> Result<Token, SyntaxError> {
        if self.is_keyword_named(self.peek(), name) {
            return self.match_any_token();
        }
        Err(self.expected(&format!("`{name}`")))
    }

    fn match_punctuator(&mut self, value: &str) -> Result<Token, SyntaxError> {
        if self.is_punctuator(self.peek(), value) {
            return self.match_any_token();
        }
        Err(self.expected(&format!("`{value}`")))
    }

    fn match_string_literal(&mut self) -> Result<Token, SyntaxError> {
        if self.is_string(self.peek()) {
            return self.match_any_token();
        }
        Err(self.expected("a string literal"))
    }

    fn match_unary_operator(&mut self) -> Result<Token, SyntaxError> {
        if self.is_unary_op(self.peek()) {
            return self.match_any_token();
        }
        Err(self.expected("a prefix operator"))
    }

    fn match_template(&mut self) -> Result<Vec<TemplateItem>, SyntaxError> {
        if !self.is_template(self.peek()) {
            return Err(self.expected("a template literal"));
        }
        match self.advance() {
            Some(Term::RawToken(Token {
                kind: TokenKind::Template(items),
                ..
            })) => Ok(items),
            _ => Err(self.expected("a template literal")),
        }
    }

    /// Consume a group of `kind`, returning its interior.
    fn match_group(&mut self, kind: GroupKind, what: &str) -> Result<Vec<Term>, SyntaxError> {
        Ok(self.match_raw_group_named(kind, what)?.into_interior())
    }

    fn match_raw_group(&mut self, kind: GroupKind) -> Result<Group, SyntaxError> {
        self.match_raw_group_named(kind, "a delimiter group")
    }

    fn match_raw_group_named(&mut self, kind: GroupKind, what: &str) -> Result<Group, SyntaxError> {
        if !matches!(raw_group(self.peek()), Some(g) if g.kind == kind) {
            return Err(self.expected(what));
        }
        match self.advance() {
            Some(Term::RawGroup(group)) => Ok(group),
            _ => Err(self.expected(what)),
        }
    }

    fn match_parens(&mut self) -> Result<Vec<Term>, SyntaxError> {
        self.match_group(GroupKind::Parens, "a parenthesized group")
    }

    fn match_curlies(&mut self) -> Result<Vec<Term>, SyntaxError> {
        self.match_group(GroupKind::Braces, "a brace-delimited block")
    }

    fn match_squares(&mut self) -> Result<Vec<Term>, SyntaxError> {
        self.match_group(GroupKind::Brackets, "a bracket-delimited group")
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    fn is_eof(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if matches!(tok.kind, TokenKind::Eof))
    }

    fn is_identifier(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if tok.is_identifier())
    }

    fn is_identifier_named(&self, t: Option<&Term>, name: &str) -> bool {
        matches!(raw_token(t), Some(tok) if tok.is_identifier() && tok.value == name)
    }

    fn is_keyword(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if matches!(tok.kind, TokenKind::Keyword))
    }

    fn is_keyword_named(&self, t: Option<&Term>, name: &str) -> bool {
        matches!(raw_token(t), Some(tok) if tok.is_keyword(name))
    }

    fn is_punctuator(&self, t: Option<&Term>, value: &str) -> bool {
        matches!(raw_token(t), Some(tok) if tok.is_punctuator(value))
    }

    fn is_any_punctuator(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if matches!(tok.kind, TokenKind::Punctuator))
    }

    fn is_assign(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if matches!(tok.kind, TokenKind::AssignOp))
    }

    fn is_assign_named(&self, t: Option<&Term>, value: &str) -> bool {
        matches!(raw_token(t), Some(tok) if matches!(tok.kind, TokenKind::AssignOp) && tok.value == value)
    }

    fn is_number(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if matches!(tok.kind, TokenKind::Number))
    }

    fn is_string(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if matches!(tok.kind, TokenKind::String))
    }

    fn is_boolean(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if matches!(tok.kind, TokenKind::Boolean))
    }

    fn is_null(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if matches!(tok.kind, TokenKind::Null))
    }

    fn is_regex(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if matches!(tok.kind, TokenKind::Regex))
    }

    fn is_template(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if matches!(tok.kind, TokenKind::Template(_)))
    }

    fn is_parens(&self, t: Option<&Term>) -> bool {
        matches!(raw_group(t), Some(g) if g.kind == GroupKind::Parens)
    }

    fn is_braces(&self, t: Option<&Term>) -> bool {
        matches!(raw_group(t), Some(g) if g.kind == GroupKind::Braces)
    }

    fn is_brackets(&self, t: Option<&Term>) -> bool {
        matches!(raw_group(t), Some(g) if g.kind == GroupKind::Brackets)
    }

    fn is_syntax_group(&self, t: Option<&Term>) -> bool {
        matches!(raw_group(t), Some(g) if g.kind == GroupKind::Syntax)
    }

    fn is_unary_op(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if operators::is_unary_operator(tok))
    }

    fn is_binary_op(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if operators::is_binary_operator(tok))
    }

    fn is_update_op(&self, t: Option<&Term>) -> bool {
        matches!(raw_token(t), Some(tok) if operators::is_update_operator(tok))
    }

    fn is_property_name(&self, t: Option<&Term>) -> bool {
        self.is_identifier(t)
            || self.is_keyword(t)
            || self.is_string(t)
            || self.is_number(t)
            || self.is_brackets(t)
    }

    fn transform_of_token(&self, tok: &Token) -> Option<Transform> {
        self.context.borrow().transform_of(tok).cloned()
    }

    pub(crate) fn has_transform(&self, t: Option<&Term>, which: &Transform) -> bool {
        let tok = match raw_token(t) {
            Some(tok) => tok,
            None => return false,
        };
        let cx = self.context.borrow();
        cx.transform_of(tok) == Some(which)
    }

    pub(crate) fn is_compiletime(&self, t: Option<&Term>) -> bool {
        let tok = match raw_token(t) {
            Some(tok) => tok,
            None => return false,
        };
        let cx = self.context.borrow();
        matches!(cx.transform_of(tok), Some(Transform::Compiletime(_)))
    }

    fn is_var_binding(&self, t: Option<&Term>) -> bool {
        let tok = match raw_token(t) {
            Some(tok) => tok,
            None => return false,
        };
        let cx = self.context.borrow();
        matches!(cx.transform_of(tok), Some(Transform::VarBinding(_)))
    }

    fn is_var_decl_head(&self, t: Option<&Term>) -> bool {
        let tok = match raw_token(t) {
            Some(tok) => tok,
            None => return false,
        };
        let cx = self.context.borrow();
        matches!(
            cx.transform_of(tok),
            Some(
                Transform::VariableDecl
                    | Transform::LetDecl
                    | Transform::ConstDecl
                    | Transform::SyntaxDecl
                    | Transform::SyntaxrecDecl
            )
        )
    }

    fn lines_eq(&self, a: Option<&Term>, b: Option<&Term>) -> bool {
        match (a.and_then(Term::line), b.and_then(Term::line)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    fn token_line_eq(&self, tok: &Token, t: Option<&Term>) -> bool {
        t.and_then(Term::line) == Some(tok.line)
    }

    // =========================================================================
    // Errors
    // =========================================================================

    pub(crate) fn expected(&self, what: &str) -> SyntaxError {
        SyntaxError::UnexpectedToken {
            token: describe(self.peek()),
            expected: what.to_string(),
            context: context_window(&self.rest, self.peek()),
        }
    }

    fn malformed_module(&self) -> SyntaxError {
        SyntaxError::MalformedModuleForm {
            token: describe(self.peek()),
            context: context_window(&self.rest, self.peek()),
        }
    }
}

/// Head of a property or method definition.
enum PropHead {
    /// A complete method, getter, or setter.
    Method(Term),
    /// A plain name that might still be shorthand or a key.
    Identifier(Term),
    /// A computed or literal key awaiting its `:`.
    Property(Term),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use crate::token::fixtures::*;
    use crate::transforms::{Context, CtValue, MacroTransformer};

    fn parse_expr(items: Vec<Term>) -> Term {
        let mut enf = Enforester::new(items, Context::shared());
        enf.enforest(Mode::Expression).unwrap().unwrap()
    }

    fn parse_stmt(items: Vec<Term>) -> Term {
        let mut enf = Enforester::new(items, Context::shared());
        enf.enforest_statement().unwrap()
    }

    fn binop(term: &Term) -> (&str, &Term, &Term) {
        match term {
            Term::BinaryExpression { op, left, right } => {
                (op.value.as_str(), left.as_ref(), right.as_ref())
            }
            other => panic!("expected a binary expression, got {other:?}"),
        }
    }

    fn ident_named(term: &Term, name: &str) -> bool {
        matches!(term, Term::Identifier { name: tok } if tok.value == name)
    }

    // ----- expressions -----

    #[test]
    fn multiplication_groups_before_addition() {
        let t = parse_expr(vec![ident("a"), punct("+"), ident("b"), punct("*"), ident("c")]);
        let (op, left, right) = binop(&t);
        assert_eq!(op, "+");
        assert!(ident_named(left, "a"));
        let (op, left, right) = binop(right);
        assert_eq!(op, "*");
        assert!(ident_named(left, "b"));
        assert!(ident_named(right, "c"));
    }

    #[test]
    fn exponent_nests_to_the_right() {
        let t = parse_expr(vec![ident("a"), punct("**"), ident("b"), punct("**"), ident("c")]);
        let (op, left, right) = binop(&t);
        assert_eq!(op, "**");
        assert!(ident_named(left, "a"));
        let (op, _, _) = binop(right);
        assert_eq!(op, "**");
    }

    #[test]
    fn unary_binds_tighter_than_binary() {
        let t = parse_expr(vec![punct("-"), ident("a"), punct("*"), ident("b")]);
        let (op, left, right) = binop(&t);
        assert_eq!(op, "*");
        assert!(matches!(left, Term::UnaryExpression { op, .. } if op.value == "-"));
        assert!(ident_named(right, "b"));
    }

    #[test]
    fn update_operators_produce_binding_operands() {
        let t = parse_expr(vec![ident("x"), punct("++")]);
        match t {
            Term::UpdateExpression {
                prefix, operand, ..
            } => {
                assert!(!prefix);
                assert!(matches!(*operand, Term::BindingIdentifier { .. }));
            }
            other => panic!("expected an update expression, got {other:?}"),
        }
        let t = parse_expr(vec![punct("--"), ident("x")]);
        assert!(matches!(t, Term::UpdateExpression { prefix: true, .. }));
    }

    #[test]
    fn conditional_claims_the_loose_test() {
        let t = parse_expr(vec![
            ident("a"),
            punct("+"),
            ident("b"),
            punct("?"),
            ident("c"),
            punct(":"),
            ident("d"),
        ]);
        match t {
            Term::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                let (op, _, _) = binop(&test);
                assert_eq!(op, "+");
                assert!(ident_named(&consequent, "c"));
                assert!(ident_named(&alternate, "d"));
            }
            other => panic!("expected a conditional, got {other:?}"),
        }
    }

    #[test]
    fn assignment_reinterprets_the_target() {
        let t = parse_expr(vec![ident("x"), assign("="), num("1")]);
        match t {
            Term::AssignmentExpression {
                binding,
                expression,
            } => {
                assert!(matches!(*binding, Term::BindingIdentifier { .. }));
                assert!(matches!(*expression, Term::LiteralNumber { value } if value == 1.0));
            }
            other => panic!("expected an assignment, got {other:?}"),
        }
        let t = parse_expr(vec![ident("x"), assign("+="), num("1")]);
        assert!(
            matches!(t, Term::CompoundAssignmentExpression { ref op, .. } if op.value == "+=")
        );
    }

    #[test]
    fn comma_sequences_fold_left() {
        let mut enf = Enforester::new(
            vec![ident("a"), punct(","), ident("b"), punct(","), ident("c")],
            Context::shared(),
        );
        let t = enf.enforest_expression().unwrap().unwrap();
        let (op, left, right) = binop(&t);
        assert_eq!(op, ",");
        assert!(ident_named(right, "c"));
        let (op, _, _) = binop(left);
        assert_eq!(op, ",");
    }

    #[test]
    fn parenthesized_interior_stays_raw() {
        let t = parse_expr(vec![parens(vec![ident("a"), punct("+"), ident("b")])]);
        match t {
            Term::Parenthesized { inner } => {
                assert_eq!(inner.len(), 3);
                assert!(inner.iter().all(|t| matches!(t, Term::RawToken(_))));
            }
            other => panic!("expected a parenthesized expression, got {other:?}"),
        }
    }

    #[test]
    fn call_arguments_stay_raw() {
        let t = parse_expr(vec![
            ident("f"),
            parens(vec![ident("a"), punct("+"), ident("b")]),
        ]);
        match t {
            Term::Call { callee, arguments } => {
                assert!(ident_named(&callee, "f"));
                assert_eq!(arguments.len(), 3);
            }
            other => panic!("expected a call, got {other:?}"),
        }
    }

    #[test]
    fn member_chains_nest_leftward() {
        let t = parse_expr(vec![ident("a"), punct("."), ident("b"), punct("."), ident("c")]);
        match t {
            Term::StaticMember { object, property } => {
                assert_eq!(property.value, "c");
                assert!(matches!(
                    *object,
                    Term::StaticMember { ref property, .. } if property.value == "b"
                ));
            }
            other => panic!("expected a member expression, got {other:?}"),
        }
    }

    #[test]
    fn computed_member_parses_its_interior() {
        let t = parse_expr(vec![ident("a"), brackets(vec![ident("b")])]);
        match t {
            Term::ComputedMember { object, expression } => {
                assert!(ident_named(&object, "a"));
                assert!(ident_named(&expression, "b"));
            }
            other => panic!("expected a computed member, got {other:?}"),
        }
    }

    #[test]
    fn new_keeps_the_arguments_raw() {
        let t = parse_expr(vec![kw("new"), ident("Foo"), parens(vec![ident("x")])]);
        match t {
            Term::New { callee, arguments } => {
                assert!(ident_named(&callee, "Foo"));
                assert_eq!(arguments.len(), 1);
            }
            other => panic!("expected a new expression, got {other:?}"),
        }
    }

    #[test]
    fn new_dot_target() {
        let t = parse_expr(vec![kw("new"), punct("."), ident("target")]);
        assert!(matches!(t, Term::NewTarget));
    }

    #[test]
    fn array_holes_and_spread() {
        let t = parse_expr(vec![brackets(vec![
            ident("a"),
            punct(","),
            punct(","),
            punct("..."),
            ident("b"),
        ])]);
        match t {
            Term::ArrayExpression { elements } => {
                assert_eq!(elements.len(), 3);
                assert!(ident_named(elements[0].as_ref().unwrap(), "a"));
                assert!(elements[1].is_none());
                assert!(matches!(elements[2], Some(Term::Spread { .. })));
            }
            other => panic!("expected an array expression, got {other:?}"),
        }
    }

    #[test]
    fn object_literal_shapes() {
        let t = parse_expr(vec![braces(vec![
            ident("a"),
            punct(":"),
            num("1"),
            punct(","),
            ident("b"),
            punct(","),
            ident("c"),
            parens(vec![]),
            braces(vec![]),
        ])]);
        match t {
            Term::ObjectExpression { properties } => {
                assert_eq!(properties.len(), 3);
                assert!(matches!(properties[0], Term::DataProperty { .. }));
                assert!(
                    matches!(properties[1], Term::ShorthandProperty { ref name } if name.value == "b")
                );
                assert!(matches!(properties[2], Term::Method { .. }));
            }
            other => panic!("expected an object expression, got {other:?}"),
        }
    }

    #[test]
    fn numeric_overflow_becomes_infinity() {
        assert!(matches!(parse_expr(vec![num("1e999")]), Term::LiteralInfinity));
        assert!(
            matches!(parse_expr(vec![num("4.25")]), Term::LiteralNumber { value } if value == 4.25)
        );
    }

    #[test]
    fn boolean_and_null_literals() {
        assert!(matches!(
            parse_expr(vec![boolean(true)]),
            Term::LiteralBoolean { value: true }
        ));
        assert!(matches!(
            parse_expr(vec![boolean(false)]),
            Term::LiteralBoolean { value: false }
        ));
        assert!(matches!(
            parse_expr(vec![tok(TokenKind::Null, "null", 1)]),
            Term::LiteralNull
        ));
    }

    #[test]
    fn regex_splits_pattern_and_flags() {
        let t = parse_expr(vec![tok(TokenKind::Regex, "/ab/g", 1)]);
        match t {
            Term::LiteralRegex { pattern, flags } => {
                assert_eq!(pattern, "ab");
                assert_eq!(flags, "g");
            }
            other => panic!("expected a regex literal, got {other:?}"),
        }
    }

    fn template_token() -> Term {
        Term::RawToken(Token::new(
            TokenKind::Template(vec![
                TemplateItem::Chunk("a".to_string()),
                TemplateItem::Subst(Group::new(
                    GroupKind::Braces,
                    vec![punct("{"), ident("b"), punct("}")],
                )),
                TemplateItem::Chunk("c".to_string()),
            ]),
            "",
            1,
        ))
    }

    #[test]
    fn template_substitutions_parse() {
        let t = parse_expr(vec![template_token()]);
        match t {
            Term::Template { tag, elements } => {
                assert!(tag.is_none());
                assert_eq!(elements.len(), 3);
                assert!(ident_named(&elements[1], "b"));
            }
            other => panic!("expected a template, got {other:?}"),
        }
    }

    #[test]
    fn tagged_template_keeps_its_tag() {
        let t = parse_expr(vec![ident("f"), template_token()]);
        assert!(matches!(t, Term::Template { tag: Some(ref tag), .. } if ident_named(tag, "f")));
    }

    #[test]
    fn syntax_templates_pass_through_whole() {
        let group = Group::new(
            GroupKind::Syntax,
            vec![punct("`"), ident("x"), punct("`")],
        );
        let t = parse_expr(vec![Term::RawGroup(group)]);
        match t {
            Term::SyntaxTemplate { template } => assert_eq!(template.interior().len(), 1),
            other => panic!("expected a syntax template, got {other:?}"),
        }
    }

    #[test]
    fn arrow_with_expression_body() {
        let t = parse_expr(vec![ident("x"), punct("=>"), ident("x")]);
        match t {
            Term::ArrowExpression { params, body } => {
                assert!(matches!(*params, Term::FormalParameters { ref items, .. } if items.len() == 1));
                assert!(matches!(body, ArrowBody::Expression(_)));
            }
            other => panic!("expected an arrow, got {other:?}"),
        }
    }

    #[test]
    fn arrow_block_body_stays_raw() {
        let t = parse_expr(vec![
            parens(vec![ident("a"), punct(","), ident("b")]),
            punct("=>"),
            braces(vec![ident("a"), punct(";")]),
        ]);
        match t {
            Term::ArrowExpression { body, .. } => match body {
                ArrowBody::Block(items) => assert_eq!(items.len(), 2),
                other => panic!("expected a raw block body, got {other:?}"),
            },
            other => panic!("expected an arrow, got {other:?}"),
        }
    }

    // ----- statements -----

    #[test]
    fn if_else_statement() {
        let t = parse_stmt(vec![
            kw("if"),
            parens(vec![ident("a")]),
            ident("b"),
            punct(";"),
            kw("else"),
            ident("c"),
            punct(";"),
        ]);
        match t {
            Term::If {
                test, alternate, ..
            } => {
                assert!(ident_named(&test, "a"));
                assert!(alternate.is_some());
            }
            other => panic!("expected an if statement, got {other:?}"),
        }
    }

    #[test]
    fn while_and_do_while() {
        let t = parse_stmt(vec![kw("while"), parens(vec![ident("a")]), braces(vec![])]);
        assert!(matches!(t, Term::While { .. }));
        let t = parse_stmt(vec![
            kw("do"),
            braces(vec![]),
            kw("while"),
            parens(vec![ident("a")]),
            punct(";"),
        ]);
        assert!(matches!(t, Term::DoWhile { .. }));
    }

    #[test]
    fn c_style_for_with_empty_clauses() {
        let t = parse_stmt(vec![
            kw("for"),
            parens(vec![punct(";"), ident("x"), punct(";")]),
            braces(vec![]),
        ]);
        match t {
            Term::For {
                init,
                test,
                update,
                ..
            } => {
                assert!(init.is_none());
                assert!(test.is_some());
                assert!(update.is_none());
            }
            other => panic!("expected a for statement, got {other:?}"),
        }
    }

    #[test]
    fn for_in_with_declaration() {
        let t = parse_stmt(vec![
            kw("for"),
            parens(vec![kw("var"), ident("x"), kw("in"), ident("y")]),
            braces(vec![]),
        ]);
        match t {
            Term::ForIn { left, right, .. } => {
                assert!(matches!(*left, Term::VariableDeclaration { .. }));
                assert!(ident_named(&right, "y"));
            }
            other => panic!("expected a for-in statement, got {other:?}"),
        }
    }

    #[test]
    fn for_of_with_bare_pattern() {
        let t = parse_stmt(vec![
            kw("for"),
            parens(vec![brackets(vec![ident("a")]), ident("of"), ident("y")]),
            braces(vec![]),
        ]);
        match t {
            Term::ForOf { left, .. } => assert!(matches!(*left, Term::ArrayBinding { .. })),
            other => panic!("expected a for-of statement, got {other:?}"),
        }
    }

    #[test]
    fn switch_partitions_around_default() {
        let t = parse_stmt(vec![
            kw("switch"),
            parens(vec![ident("x")]),
            braces(vec![
                kw("case"),
                ident("a"),
                punct(":"),
                ident("f"),
                punct(";"),
                kw("default"),
                punct(":"),
                ident("g"),
                punct(";"),
                kw("case"),
                ident("b"),
                punct(":"),
                ident("h"),
                punct(";"),
            ]),
        ]);
        match t {
            Term::SwitchWithDefault {
                pre_default_cases,
                post_default_cases,
                default_case,
                ..
            } => {
                assert_eq!(pre_default_cases.len(), 1);
                assert_eq!(post_default_cases.len(), 1);
                assert!(
                    matches!(*default_case, Term::SwitchDefault { ref consequent } if consequent.len() == 1)
                );
            }
            other => panic!("expected a partitioned switch, got {other:?}"),
        }
    }

    #[test]
    fn switch_without_default() {
        let t = parse_stmt(vec![
            kw("switch"),
            parens(vec![ident("x")]),
            braces(vec![kw("case"), ident("a"), punct(":"), ident("f"), punct(";")]),
        ]);
        assert!(matches!(t, Term::Switch { ref cases, .. } if cases.len() == 1));
    }

    #[test]
    fn try_requires_a_handler() {
        let mut enf = Enforester::new(vec![kw("try"), braces(vec![])], Context::shared());
        assert!(matches!(
            enf.enforest_statement(),
            Err(SyntaxError::UnterminatedTry { .. })
        ));
    }

    #[test]
    fn try_catch_finally() {
        let t = parse_stmt(vec![
            kw("try"),
            braces(vec![]),
            kw("catch"),
            parens(vec![ident("e")]),
            braces(vec![]),
            kw("finally"),
            braces(vec![]),
        ]);
        assert!(matches!(
            t,
            Term::TryFinally {
                catch_clause: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn return_stops_at_a_newline() {
        let mut enf = Enforester::new(
            vec![kw_at("return", 1), ident_at("x", 2)],
            Context::shared(),
        );
        let t = enf.enforest_statement().unwrap();
        assert!(matches!(t, Term::Return { expression: None }));
        assert_eq!(enf.rest.len(), 1);

        let t = parse_stmt(vec![kw("return"), ident("x"), punct(";")]);
        assert!(matches!(t, Term::Return { expression: Some(_) }));
    }

    #[test]
    fn labels_and_labeled_break() {
        let t = parse_stmt(vec![ident("loop"), punct(":"), ident("x"), punct(";")]);
        assert!(matches!(t, Term::Labeled { ref label, .. } if label.value == "loop"));
        let t = parse_stmt(vec![kw("break"), ident("loop"), punct(";")]);
        assert!(matches!(t, Term::Break { label: Some(ref l) } if l.value == "loop"));
    }

    // ----- declarations -----

    #[test]
    fn variable_declaration_with_multiple_declarators() {
        let t = parse_stmt(vec![
            kw("var"),
            ident("x"),
            assign("="),
            num("1"),
            punct(","),
            ident("y"),
            punct(";"),
        ]);
        match t {
            Term::VariableDeclarationStatement { declaration } => match *declaration {
                Term::VariableDeclaration { kind, declarators } => {
                    assert_eq!(kind, VarKind::Var);
                    assert_eq!(declarators.len(), 2);
                    assert!(matches!(
                        declarators[0],
                        Term::VariableDeclarator { init: Some(_), .. }
                    ));
                    assert!(matches!(
                        declarators[1],
                        Term::VariableDeclarator { init: None, .. }
                    ));
                }
                other => panic!("expected a variable declaration, got {other:?}"),
            },
            other => panic!("expected a declaration statement, got {other:?}"),
        }
    }

    #[test]
    fn syntax_declaration_kind() {
        let t = parse_stmt(vec![kw("syntax"), ident("m"), assign("="), ident("f"), punct(";")]);
        match t {
            Term::VariableDeclarationStatement { declaration } => {
                assert!(matches!(
                    *declaration,
                    Term::VariableDeclaration {
                        kind: VarKind::Syntax,
                        ..
                    }
                ));
            }
            other => panic!("expected a declaration statement, got {other:?}"),
        }
    }

    #[test]
    fn object_binding_in_declaration() {
        let t = parse_stmt(vec![
            kw("var"),
            braces(vec![ident("a"), punct(","), ident("b"), punct(":"), ident("c")]),
            assign("="),
            ident("d"),
            punct(";"),
        ]);
        match t {
            Term::VariableDeclarationStatement { declaration } => match *declaration {
                Term::VariableDeclaration { declarators, .. } => match &declarators[0] {
                    Term::VariableDeclarator { binding, .. } => match binding.as_ref() {
                        Term::ObjectBinding { properties } => {
                            assert_eq!(properties.len(), 2);
                            assert!(matches!(
                                properties[0],
                                Term::BindingPropertyIdentifier { .. }
                            ));
                            assert!(matches!(properties[1], Term::BindingPropertyProperty { .. }));
                        }
                        other => panic!("expected an object binding, got {other:?}"),
                    },
                    other => panic!("expected a declarator, got {other:?}"),
                },
                other => panic!("expected a variable declaration, got {other:?}"),
            },
            other => panic!("expected a declaration statement, got {other:?}"),
        }
    }

    #[test]
    fn destructuring_assignment_with_rest() {
        let t = parse_expr(vec![
            brackets(vec![ident("a"), punct(","), punct("..."), ident("b")]),
            assign("="),
            ident("c"),
        ]);
        match t {
            Term::AssignmentExpression { binding, .. } => match *binding {
                Term::ArrayBinding { elements, rest } => {
                    assert_eq!(elements.len(), 1);
                    assert!(rest.is_some());
                }
                other => panic!("expected an array binding, got {other:?}"),
            },
            other => panic!("expected an assignment, got {other:?}"),
        }
    }

    #[test]
    fn parenthesized_list_is_not_a_target() {
        let mut enf = Enforester::new(
            vec![
                parens(vec![ident("a"), punct(","), ident("b")]),
                assign("="),
                ident("c"),
            ],
            Context::shared(),
        );
        assert!(matches!(
            enf.enforest(Mode::Expression),
            Err(SyntaxError::InvalidDestructuringTarget { .. })
        ));
    }

    #[test]
    fn nested_object_patterns_in_destructuring_assignment() {
        let t = parse_expr(vec![
            braces(vec![ident("a"), punct(":"), braces(vec![ident("b")])]),
            assign("="),
            ident("f"),
            parens(vec![]),
        ]);
        match t {
            Term::AssignmentExpression { binding, .. } => match *binding {
                Term::ObjectBinding { properties } => match &properties[..] {
                    [Term::BindingPropertyProperty { binding, .. }] => match binding.as_ref() {
                        Term::ObjectBinding { properties } => {
                            assert!(matches!(
                                properties[..],
                                [Term::BindingPropertyIdentifier { .. }]
                            ));
                        }
                        other => panic!("expected a nested object binding, got {other:?}"),
                    },
                    other => panic!("expected a property binding, got {other:?}"),
                },
                other => panic!("expected an object binding, got {other:?}"),
            },
            other => panic!("expected an assignment, got {other:?}"),
        }
    }

    #[test]
    fn destructuring_errors_carry_a_context_window() {
        let mut enf = Enforester::new(
            vec![
                parens(vec![ident("a"), punct(","), ident("b")]),
                assign("="),
                ident("c"),
            ],
            Context::shared(),
        );
        match enf.enforest(Mode::Expression) {
            Err(SyntaxError::InvalidDestructuringTarget { token, context }) => {
                assert_eq!(token, "(");
                assert!(!context.is_empty());
            }
            other => panic!("expected a destructuring error, got {other:?}"),
        }
    }

    #[test]
    fn function_declaration_keeps_a_raw_body() {
        let t = parse_stmt(vec![
            kw("function"),
            ident("f"),
            parens(vec![ident("a"), punct(","), ident("b")]),
            braces(vec![kw("return"), ident("a"), punct(";")]),
        ]);
        match t {
            Term::FunctionDeclaration {
                is_generator,
                params,
                body,
                ..
            } => {
                assert!(!is_generator);
                assert!(matches!(*params, Term::FormalParameters { ref items, .. } if items.len() == 2));
                assert_eq!(body.len(), 3);
                assert!(body.iter().all(|t| matches!(t, Term::RawToken(_))));
            }
            other => panic!("expected a function declaration, got {other:?}"),
        }
    }

    #[test]
    fn generator_functions() {
        let t = parse_stmt(vec![
            kw("function"),
            punct("*"),
            ident("g"),
            parens(vec![]),
            braces(vec![]),
        ]);
        assert!(matches!(
            t,
            Term::FunctionDeclaration {
                is_generator: true,
                ..
            }
        ));
    }

    #[test]
    fn class_with_a_static_method() {
        let t = parse_stmt(vec![
            kw("class"),
            ident("A"),
            braces(vec![
                ident("static"),
                ident("m"),
                parens(vec![]),
                braces(vec![]),
                ident("n"),
                parens(vec![]),
                braces(vec![]),
            ]),
        ]);
        match t {
            Term::ClassDeclaration { name, elements, .. } => {
                assert!(name.is_some());
                assert_eq!(elements.len(), 2);
                assert!(elements[0].is_static);
                assert!(!elements[1].is_static);
            }
            other => panic!("expected a class declaration, got {other:?}"),
        }
    }

    // ----- modules -----

    fn parse_module_item(items: Vec<Term>) -> Term {
        let mut enf = Enforester::new(items, Context::shared());
        enf.enforest(Mode::Module).unwrap().unwrap()
    }

    #[test]
    fn named_import_with_alias() {
        let t = parse_module_item(vec![
            kw("import"),
            braces(vec![ident("a"), ident("as"), ident("b")]),
            ident("from"),
            string("m"),
            punct(";"),
        ]);
        match t {
            Term::Import { named_imports, module_specifier, for_syntax, .. } => {
                assert_eq!(named_imports.len(), 1);
                assert!(matches!(
                    named_imports[0],
                    Term::ImportSpecifier { name: Some(_), .. }
                ));
                assert_eq!(module_specifier.value, "m");
                assert!(!for_syntax);
            }
            other => panic!("expected an import, got {other:?}"),
        }
    }

    #[test]
    fn import_for_syntax_sets_the_flag() {
        let t = parse_module_item(vec![
            kw("import"),
            ident("m"),
            ident("from"),
            string("lib"),
            kw("for"),
            ident("syntax"),
            punct(";"),
        ]);
        assert!(matches!(t, Term::Import { for_syntax: true, .. }));
    }

    #[test]
    fn export_forms() {
        let t = parse_module_item(vec![
            kw("export"),
            braces(vec![ident("a")]),
            punct(";"),
        ]);
        assert!(matches!(
            t,
            Term::ExportFrom {
                module_specifier: None,
                ..
            }
        ));
        let t = parse_module_item(vec![
            kw("export"),
            kw("default"),
            ident("x"),
            punct(";"),
        ]);
        assert!(matches!(t, Term::ExportDefault { .. }));
        let t = parse_module_item(vec![
            kw("export"),
            kw("var"),
            ident("x"),
            assign("="),
            num("1"),
            punct(";"),
        ]);
        assert!(matches!(t, Term::Export { .. }));
    }

    // ----- binding-driven dispatch -----

    #[test]
    fn rebound_keyword_dispatches_to_its_macro() {
        let cx = Context::shared();
        cx.borrow_mut().env_set(
            "if",
            0,
            Transform::Compiletime(CtValue::Fn(MacroTransformer::new(|_| {
                Ok(CtValue::Syntax(vec![ident("expanded")]))
            }))),
        );
        let mut enf = Enforester::new(vec![kw("if"), punct(";")], cx);
        let t = enf.enforest_statement().unwrap();
        match t {
            Term::ExpressionStatement { expression } => {
                assert!(ident_named(&expression, "expanded"))
            }
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn renamed_bindings_substitute_their_canonical_token() {
        let cx = Context::shared();
        let canonical = Token::new(TokenKind::Identifier, "x", 1).add_scope(Scope(1));
        {
            let mut c = cx.borrow_mut();
            let plain = Token::new(TokenKind::Identifier, "x", 1);
            let id = c.bindings.add(&plain, 0);
            c.env_set(&id, 0, Transform::VarBinding(canonical.clone()));
        }
        let mut enf = Enforester::new(vec![ident("x")], cx);
        let t = enf.enforest(Mode::Expression).unwrap().unwrap();
        match t {
            Term::Identifier { name } => assert!(name.scopes.contains(Scope(1))),
            other => panic!("expected an identifier, got {other:?}"),
        }
    }

    #[test]
    fn eof_finishes_the_stream() {
        let mut enf = Enforester::new(vec![ident("x"), punct(";"), eof()], Context::shared());
        let first = enf.enforest(Mode::Module).unwrap();
        assert!(matches!(first, Some(Term::ExpressionStatement { .. })));
        let second = enf.enforest(Mode::Module).unwrap();
        assert!(matches!(second, Some(Term::Eof)));
        assert!(enf.is_done());
    }

    #[test]
    fn accepted_records_committed_terms_in_order() {
        let mut enf = Enforester::new(
            vec![
                kw("var"),
                ident("x"),
                assign("="),
                num("1"),
                punct(";"),
                ident("f"),
                parens(vec![ident("x")]),
                punct(";"),
            ],
            Context::shared(),
        );
        let first = enf.enforest(Mode::Module).unwrap().unwrap();
        assert_eq!(enf.accepted(), &[first.clone()]);
        let second = enf.enforest(Mode::Module).unwrap().unwrap();
        assert_eq!(enf.accepted(), &[first, second]);
    }

    #[test]
    fn repeated_parses_produce_identical_terms() {
        let stream = || {
            vec![
                ident("m"),
                punct(";"),
                kw("var"),
                ident("x"),
                assign("="),
                ident("a"),
                punct("+"),
                ident("b"),
                punct("*"),
                ident("c"),
                punct(";"),
                kw("if"),
                parens(vec![ident("x")]),
                braces(vec![ident("f"), parens(vec![]), punct(";")]),
            ]
        };
        let context = || {
            let cx = Context::shared();
            cx.borrow_mut().env_set(
                "m",
                0,
                Transform::Compiletime(CtValue::Fn(MacroTransformer::new(|_| {
                    Ok(CtValue::Syntax(vec![ident("y")]))
                }))),
            );
            cx
        };
        let first = crate::parse_module(stream(), context()).unwrap();
        let second = crate::parse_module(stream(), context()).unwrap();
        assert_eq!(first, second);
    }
}
