//! The `Term` union: the unit of the enforester's working stream.
//!
//! A term is either unparsed residue (`RawToken`/`RawGroup`, exactly as the
//! reader produced it) or a finished tree node. Enforestation rewrites a
//! sequence of raw terms into finished ones in place; macro output re-enters
//! the stream as raw terms and is consumed again by the same machinery.

use std::fmt;

use crate::token::{Group, TemplateItem, Token, TokenKind};

/// Variable-declaration flavor. `Syntax` and `Syntaxrec` declare compile-time
/// bindings; `Syntaxrec` puts the bound name in scope inside its own
/// definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
    Syntax,
    Syntaxrec,
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
            VarKind::Syntax => "syntax",
            VarKind::Syntaxrec => "syntaxrec",
        };
        f.write_str(s)
    }
}

/// Body of an arrow function. Block bodies stay raw until the expander
/// descends into them.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Block(Vec<Term>),
    Expression(Box<Term>),
}

/// One member of a class body.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassElement {
    pub is_static: bool,
    pub method: Term,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    // ----- residue -----
    RawToken(Token),
    RawGroup(Group),
    Eof,

    // ----- expressions -----
    Identifier {
        name: Token,
    },
    LiteralNumber {
        value: f64,
    },
    LiteralInfinity,
    LiteralString {
        value: String,
    },
    LiteralBoolean {
        value: bool,
    },
    LiteralNull,
    LiteralRegex {
        pattern: String,
        flags: String,
    },
    Template {
        tag: Option<Box<Term>>,
        elements: Vec<Term>,
    },
    TemplateElement {
        raw: String,
    },
    SyntaxTemplate {
        template: Group,
    },
    This,
    Super,
    NewTarget,
    Parenthesized {
        inner: Vec<Term>,
    },
    ArrayExpression {
        elements: Vec<Option<Term>>,
    },
    ObjectExpression {
        properties: Vec<Term>,
    },
    DataProperty {
        name: Box<Term>,
        expression: Box<Term>,
    },
    ShorthandProperty {
        name: Token,
    },
    StaticPropertyName {
        value: Token,
    },
    ComputedPropertyName {
        expression: Box<Term>,
    },
    Getter {
        name: Box<Term>,
        body: Vec<Term>,
    },
    Setter {
        name: Box<Term>,
        param: Box<Term>,
        body: Vec<Term>,
    },
    Method {
        name: Box<Term>,
        is_generator: bool,
        params: Box<Term>,
        body: Vec<Term>,
    },
    FunctionExpression {
        name: Option<Box<Term>>,
        is_generator: bool,
        params: Box<Term>,
        body: Vec<Term>,
    },
    ArrowExpression {
        params: Box<Term>,
        body: ArrowBody,
    },
    ClassExpression {
        name: Option<Box<Term>>,
        super_class: Option<Box<Term>>,
        elements: Vec<ClassElement>,
    },
    UnaryExpression {
        op: Token,
        operand: Box<Term>,
    },
    UpdateExpression {
        op: Token,
        prefix: bool,
        operand: Box<Term>,
    },
    BinaryExpression {
        op: Token,
        left: Box<Term>,
        right: Box<Term>,
    },
    ConditionalExpression {
        test: Box<Term>,
        consequent: Box<Term>,
        alternate: Box<Term>,
    },
    AssignmentExpression {
        binding: Box<Term>,
        expression: Box<Term>,
    },
    CompoundAssignmentExpression {
        binding: Box<Term>,
        op: Token,
        expression: Box<Term>,
    },
    StaticMember {
        object: Box<Term>,
        property: Token,
    },
    ComputedMember {
        object: Box<Term>,
        expression: Box<Term>,
    },
    Call {
        callee: Box<Term>,
        arguments: Vec<Term>,
    },
    New {
        callee: Box<Term>,
        arguments: Vec<Term>,
    },
    Spread {
        expression: Box<Term>,
    },
    Yield {
        expression: Option<Box<Term>>,
    },
    YieldGenerator {
        expression: Option<Box<Term>>,
    },

    // ----- statements -----
    Block {
        statements: Vec<Term>,
    },
    If {
        test: Box<Term>,
        consequent: Box<Term>,
        alternate: Option<Box<Term>>,
    },
    While {
        test: Box<Term>,
        body: Box<Term>,
    },
    DoWhile {
        body: Box<Term>,
        test: Box<Term>,
    },
    For {
        init: Option<Box<Term>>,
        test: Option<Box<Term>>,
        update: Option<Box<Term>>,
        body: Box<Term>,
    },
    ForIn {
        left: Box<Term>,
        right: Box<Term>,
        body: Box<Term>,
    },
    ForOf {
        left: Box<Term>,
        right: Box<Term>,
        body: Box<Term>,
    },
    Switch {
        discriminant: Box<Term>,
        cases: Vec<Term>,
    },
    SwitchWithDefault {
        discriminant: Box<Term>,
        pre_default_cases: Vec<Term>,
        default_case: Box<Term>,
        post_default_cases: Vec<Term>,
    },
    SwitchCase {
        test: Box<Term>,
        consequent: Vec<Term>,
    },
    SwitchDefault {
        consequent: Vec<Term>,
    },
    Break {
        label: Option<Token>,
    },
    Continue {
        label: Option<Token>,
    },
    Labeled {
        label: Token,
        body: Box<Term>,
    },
    TryCatch {
        body: Box<Term>,
        catch_clause: Box<Term>,
    },
    TryFinally {
        body: Box<Term>,
        catch_clause: Option<Box<Term>>,
        finalizer: Box<Term>,
    },
    CatchClause {
        binding: Box<Term>,
        body: Box<Term>,
    },
    Throw {
        expression: Box<Term>,
    },
    With {
        object: Box<Term>,
        body: Box<Term>,
    },
    Debugger,
    EmptyStatement,
    Return {
        expression: Option<Box<Term>>,
    },
    ExpressionStatement {
        expression: Box<Term>,
    },
    VariableDeclarationStatement {
        declaration: Box<Term>,
    },

    // ----- declarations -----
    FunctionDeclaration {
        name: Box<Term>,
        is_generator: bool,
        params: Box<Term>,
        body: Vec<Term>,
    },
    ClassDeclaration {
        name: Option<Box<Term>>,
        super_class: Option<Box<Term>>,
        elements: Vec<ClassElement>,
    },
    VariableDeclaration {
        kind: VarKind,
        declarators: Vec<Term>,
    },
    VariableDeclarator {
        binding: Box<Term>,
        init: Option<Box<Term>>,
    },

    // ----- binding targets -----
    BindingIdentifier {
        name: Token,
    },
    ObjectBinding {
        properties: Vec<Term>,
    },
    ArrayBinding {
        elements: Vec<Option<Term>>,
        rest: Option<Box<Term>>,
    },
    BindingWithDefault {
        binding: Box<Term>,
        init: Box<Term>,
    },
    BindingPropertyIdentifier {
        binding: Box<Term>,
        init: Option<Box<Term>>,
    },
    BindingPropertyProperty {
        name: Box<Term>,
        binding: Box<Term>,
    },
    FormalParameters {
        items: Vec<Term>,
        rest: Option<Box<Term>>,
    },

    // ----- modules -----
    Import {
        default_binding: Option<Box<Term>>,
        named_imports: Vec<Term>,
        module_specifier: Token,
        for_syntax: bool,
    },
    ImportNamespace {
        default_binding: Option<Box<Term>>,
        namespace_binding: Box<Term>,
        module_specifier: Token,
        for_syntax: bool,
    },
    ImportSpecifier {
        name: Option<Token>,
        binding: Box<Term>,
    },
    Export {
        declaration: Box<Term>,
    },
    ExportDefault {
        body: Box<Term>,
    },
    ExportFrom {
        named_exports: Vec<Term>,
        module_specifier: Option<Token>,
    },
    ExportAllFrom {
        module_specifier: Token,
    },
    ExportSpecifier {
        name: Option<Token>,
        exported_name: Token,
    },
}

impl Term {
    /// Source line, where one is recoverable. Only raw residue carries
    /// position; finished terms are located by their tokens.
    pub fn line(&self) -> Option<u32> {
        match self {
            Term::RawToken(tok) => Some(tok.line),
            Term::RawGroup(group) => group.line(),
            _ => None,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            Term::Block { .. }
                | Term::If { .. }
                | Term::While { .. }
                | Term::DoWhile { .. }
                | Term::For { .. }
                | Term::ForIn { .. }
                | Term::ForOf { .. }
                | Term::Switch { .. }
                | Term::SwitchWithDefault { .. }
                | Term::Break { .. }
                | Term::Continue { .. }
                | Term::Labeled { .. }
                | Term::TryCatch { .. }
                | Term::TryFinally { .. }
                | Term::Throw { .. }
                | Term::With { .. }
                | Term::Debugger
                | Term::EmptyStatement
                | Term::Return { .. }
                | Term::ExpressionStatement { .. }
                | Term::VariableDeclarationStatement { .. }
                | Term::FunctionDeclaration { .. }
                | Term::ClassDeclaration { .. }
        )
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            Term::Identifier { .. }
                | Term::LiteralNumber { .. }
                | Term::LiteralInfinity
                | Term::LiteralString { .. }
                | Term::LiteralBoolean { .. }
                | Term::LiteralNull
                | Term::LiteralRegex { .. }
                | Term::Template { .. }
                | Term::SyntaxTemplate { .. }
                | Term::This
                | Term::NewTarget
                | Term::Parenthesized { .. }
                | Term::ArrayExpression { .. }
                | Term::ObjectExpression { .. }
                | Term::FunctionExpression { .. }
                | Term::ArrowExpression { .. }
                | Term::ClassExpression { .. }
                | Term::UnaryExpression { .. }
                | Term::UpdateExpression { .. }
                | Term::BinaryExpression { .. }
                | Term::ConditionalExpression { .. }
                | Term::AssignmentExpression { .. }
                | Term::CompoundAssignmentExpression { .. }
                | Term::StaticMember { .. }
                | Term::ComputedMember { .. }
                | Term::Call { .. }
                | Term::New { .. }
                | Term::Yield { .. }
                | Term::YieldGenerator { .. }
        )
    }

    /// Rewrite every token in this term, bottom-up. Used by the expander to
    /// apply hygiene scopes over macro-produced syntax.
    pub fn map_tokens(self, f: &mut dyn FnMut(Token) -> Token) -> Term {
        use Term::*;

        fn tk(tok: Token, f: &mut dyn FnMut(Token) -> Token) -> Token {
            let tok = match tok.kind {
                TokenKind::Template(items) => {
                    let items = items
                        .into_iter()
                        .map(|item| match item {
                            TemplateItem::Chunk(s) => TemplateItem::Chunk(s),
                            TemplateItem::Subst(g) => TemplateItem::Subst(grp(g, f)),
                        })
                        .collect();
                    Token {
                        kind: TokenKind::Template(items),
                        ..tok
                    }
                }
                _ => tok,
            };
            f(tok)
        }

        fn grp(group: Group, f: &mut dyn FnMut(Token) -> Token) -> Group {
            Group {
                kind: group.kind,
                inner: group.inner.into_iter().map(|t| t.map_tokens(f)).collect(),
            }
        }

        fn bx(term: Box<Term>, f: &mut dyn FnMut(Token) -> Token) -> Box<Term> {
            Box::new(term.map_tokens(f))
        }

        fn obx(term: Option<Box<Term>>, f: &mut dyn FnMut(Token) -> Token) -> Option<Box<Term>> {
            term.map(|t| bx(t, f))
        }

        fn seq(terms: Vec<Term>, f: &mut dyn FnMut(Token) -> Token) -> Vec<Term> {
            terms.into_iter().map(|t| t.map_tokens(f)).collect()
        }

        fn oseq(
            terms: Vec<Option<Term>>,
            f: &mut dyn FnMut(Token) -> Token,
        ) -> Vec<Option<Term>> {
            terms
                .into_iter()
                .map(|t| t.map(|t| t.map_tokens(f)))
                .collect()
        }

        fn otk(tok: Option<Token>, f: &mut dyn FnMut(Token) -> Token) -> Option<Token> {
            tok.map(|t| tk(t, f))
        }

        fn elems(elements: Vec<ClassElement>, f: &mut dyn FnMut(Token) -> Token) -> Vec<ClassElement> {
            elements
                .into_iter()
                .map(|e| ClassElement {
                    is_static: e.is_static,
                    method: e.method.map_tokens(f),
                })
                .collect()
        }

        match self {
            RawToken(tok) => RawToken(tk(tok, f)),
            RawGroup(group) => RawGroup(grp(group, f)),
            Eof => Eof,

            Identifier { name } => Identifier { name: tk(name, f) },
            LiteralNumber { value } => LiteralNumber { value },
            LiteralInfinity => LiteralInfinity,
            LiteralString { value } => LiteralString { value },
            LiteralBoolean { value } => LiteralBoolean { value },
            LiteralNull => LiteralNull,
            LiteralRegex { pattern, flags } => LiteralRegex { pattern, flags },
            Template { tag, elements } => Template {
                tag: obx(tag, f),
                elements: seq(elements, f),
            },
            TemplateElement { raw } => TemplateElement { raw },
            SyntaxTemplate { template } => SyntaxTemplate {
                template: grp(template, f),
            },
            This => This,
            Super => Super,
            NewTarget => NewTarget,
            Parenthesized { inner } => Parenthesized { inner: seq(inner, f) },
            ArrayExpression { elements } => ArrayExpression {
                elements: oseq(elements, f),
            },
            ObjectExpression { properties } => ObjectExpression {
                properties: seq(properties, f),
            },
            DataProperty { name, expression } => DataProperty {
                name: bx(name, f),
                expression: bx(expression, f),
            },
            ShorthandProperty { name } => ShorthandProperty { name: tk(name, f) },
            StaticPropertyName { value } => StaticPropertyName { value: tk(value, f) },
            ComputedPropertyName { expression } => ComputedPropertyName {
                expression: bx(expression, f),
            },
            Getter { name, body } => Getter {
                name: bx(name, f),
                body: seq(body, f),
            },
            Setter { name, param, body } => Setter {
                name: bx(name, f),
                param: bx(param, f),
                body: seq(body, f),
            },
            Method {
                name,
                is_generator,
                params,
                body,
            } => Method {
                name: bx(name, f),
                is_generator,
                params: bx(params, f),
                body: seq(body, f),
            },
            FunctionExpression {
                name,
                is_generator,
                params,
                body,
            } => FunctionExpression {
                name: obx(name, f),
                is_generator,
                params: bx(params, f),
                body: seq(body, f),
            },
            ArrowExpression { params, body } => ArrowExpression {
                params: bx(params, f),
                body: match body {
                    ArrowBody::Block(stmts) => ArrowBody::Block(seq(stmts, f)),
                    ArrowBody::Expression(e) => ArrowBody::Expression(bx(e, f)),
                },
            },
            ClassExpression {
                name,
                super_class,
                elements,
            } => ClassExpression {
                name: obx(name, f),
                super_class: obx(super_class, f),
                elements: elems(elements, f),
            },
            UnaryExpression { op, operand } => UnaryExpression {
                op: tk(op, f),
                operand: bx(operand, f),
            },
            UpdateExpression {
                op,
                prefix,
                operand,
            } => UpdateExpression {
                op: tk(op, f),
                prefix,
                operand: bx(operand, f),
            },
            BinaryExpression { op, left, right } => BinaryExpression {
                op: tk(op, f),
                left: bx(left, f),
                right: bx(right, f),
            },
            ConditionalExpression {
                test,
                consequent,
                alternate,
            } => ConditionalExpression {
                test: bx(test, f),
                consequent: bx(consequent, f),
                alternate: bx(alternate, f),
            },
            AssignmentExpression {
                binding,
                expression,
            } => AssignmentExpression {
                binding: bx(binding, f),
                expression: bx(expression, f),
            },
            CompoundAssignmentExpression {
                binding,
                op,
                expression,
            } => CompoundAssignmentExpression {
                binding: bx(binding, f),
                op: tk(op, f),
                expression: bx(expression, f),
            },
            StaticMember { object, property } => StaticMember {
                object: bx(object, f),
                property: tk(property, f),
            },
            ComputedMember { object, expression } => ComputedMember {
                object: bx(object, f),
                expression: bx(expression, f),
            },
            Call { callee, arguments } => Call {
                callee: bx(callee, f),
                arguments: seq(arguments, f),
            },
            New { callee, arguments } => New {
                callee: bx(callee, f),
                arguments: seq(arguments, f),
            },
            Spread { expression } => Spread {
                expression: bx(expression, f),
            },
            Yield { expression } => Yield {
                expression: obx(expression, f),
            },
            YieldGenerator { expression } => YieldGenerator {
                expression: obx(expression, f),
            },

            Block { statements } => Block {
                statements: seq(statements, f),
            },
            If {
                test,
                consequent,
                alternate,
            } => If {
                test: bx(test, f),
                consequent: bx(consequent, f),
                alternate: obx(alternate, f),
            },
            While { test, body } => While {
                test: bx(test, f),
                body: bx(body, f),
            },
            DoWhile { body, test } => DoWhile {
                body: bx(body, f),
                test: bx(test, f),
            },
            For {
                init,
                test,
                update,
                body,
            } => For {
                init: obx(init, f),
                test: obx(test, f),
                update: obx(update, f),
                body: bx(body, f),
            },
            ForIn { left, right, body } => ForIn {
                left: bx(left, f),
                right: bx(right, f),
                body: bx(body, f),
            },
            ForOf { left, right, body } => ForOf {
                left: bx(left, f),
                right: bx(right, f),
                body: bx(body, f),
            },
            Switch {
                discriminant,
                cases,
            } => Switch {
                discriminant: bx(discriminant, f),
                cases: seq(cases, f),
            },
            SwitchWithDefault {
                discriminant,
                pre_default_cases,
                default_case,
                post_default_cases,
            } => SwitchWithDefault {
                discriminant: bx(discriminant, f),
                pre_default_cases: seq(pre_default_cases, f),
                default_case: bx(default_case, f),
                post_default_cases: seq(post_default_cases, f),
            },
            SwitchCase { test, consequent } => SwitchCase {
                test: bx(test, f),
                consequent: seq(consequent, f),
            },
            SwitchDefault { consequent } => SwitchDefault {
                consequent: seq(consequent, f),
            },
            Break { label } => Break { label: otk(label, f) },
            Continue { label } => Continue { label: otk(label, f) },
            Labeled { label, body } => Labeled {
                label: tk(label, f),
                body: bx(body, f),
            },
            TryCatch { body, catch_clause } => TryCatch {
                body: bx(body, f),
                catch_clause: bx(catch_clause, f),
            },
            TryFinally {
                body,
                catch_clause,
                finalizer,
            } => TryFinally {
                body: bx(body, f),
                catch_clause: obx(catch_clause, f),
                finalizer: bx(finalizer, f),
            },
            CatchClause { binding, body } => CatchClause {
                binding: bx(binding, f),
                body: bx(body, f),
            },
            Throw { expression } => Throw {
                expression: bx(expression, f),
            },
            With { object, body } => With {
                object: bx(object, f),
                body: bx(body, f),
            },
            Debugger => Debugger,
            EmptyStatement => EmptyStatement,
            Return { expression } => Return {
                expression: obx(expression, f),
            },
            ExpressionStatement { expression } => ExpressionStatement {
                expression: bx(expression, f),
            },
            VariableDeclarationStatement { declaration } => VariableDeclarationStatement {
                declaration: bx(declaration, f),
            },

            FunctionDeclaration {
                name,
                is_generator,
                params,
                body,
            } => FunctionDeclaration {
                name: bx(name, f),
                is_generator,
                params: bx(params, f),
                body: seq(body, f),
            },
            ClassDeclaration {
                name,
                super_class,
                elements,
            } => ClassDeclaration {
                name: obx(name, f),
                super_class: obx(super_class, f),
                elements: elems(elements, f),
            },
            VariableDeclaration { kind, declarators } => VariableDeclaration {
                kind,
                declarators: seq(declarators, f),
            },
            VariableDeclarator { binding, init } => VariableDeclarator {
                binding: bx(binding, f),
                init: obx(init, f),
            },

            BindingIdentifier { name } => BindingIdentifier { name: tk(name, f) },
            ObjectBinding { properties } => ObjectBinding {
                properties: seq(properties, f),
            },
            ArrayBinding { elements, rest } => ArrayBinding {
                elements: oseq(elements, f),
                rest: obx(rest, f),
            },
            BindingWithDefault { binding, init } => BindingWithDefault {
                binding: bx(binding, f),
                init: bx(init, f),
            },
            BindingPropertyIdentifier { binding, init } => BindingPropertyIdentifier {
                binding: bx(binding, f),
                init: obx(init, f),
            },
            BindingPropertyProperty { name, binding } => BindingPropertyProperty {
                name: bx(name, f),
                binding: bx(binding, f),
            },
            FormalParameters { items, rest } => FormalParameters {
                items: seq(items, f),
                rest: obx(rest, f),
            },

            Import {
                default_binding,
                named_imports,
                module_specifier,
                for_syntax,
            } => Import {
                default_binding: obx(default_binding, f),
                named_imports: seq(named_imports, f),
                module_specifier: tk(module_specifier, f),
                for_syntax,
            },
            ImportNamespace {
                default_binding,
                namespace_binding,
                module_specifier,
                for_syntax,
            } => ImportNamespace {
                default_binding: obx(default_binding, f),
                namespace_binding: bx(namespace_binding, f),
                module_specifier: tk(module_specifier, f),
                for_syntax,
            },
            ImportSpecifier { name, binding } => ImportSpecifier {
                name: otk(name, f),
                binding: bx(binding, f),
            },
            Export { declaration } => Export {
                declaration: bx(declaration, f),
            },
            ExportDefault { body } => ExportDefault { body: bx(body, f) },
            ExportFrom {
                named_exports,
                module_specifier,
            } => ExportFrom {
                named_exports: seq(named_exports, f),
                module_specifier: otk(module_specifier, f),
            },
            ExportAllFrom { module_specifier } => ExportAllFrom {
                module_specifier: tk(module_specifier, f),
            },
            ExportSpecifier {
                name,
                exported_name,
            } => ExportSpecifier {
                name: otk(name, f),
                exported_name: tk(exported_name, f),
            },
        }
    }

    /// Number of reader tokens contained in this term, delimiters included.
    /// Enforestation conserves this count across a stream.
    pub fn token_count(&self) -> usize {
        let mut n = 0;
        self.count_tokens(&mut n);
        n
    }

    fn count_tokens(&self, n: &mut usize) {
        // Reuse the structural visitor: cloning just to count would be
        // wasteful for big streams, so walk by reference.
        use Term::*;

        fn tok(t: &Token, n: &mut usize) {
            *n += 1;
            if let TokenKind::Template(items) = &t.kind {
                for item in items {
                    if let TemplateItem::Subst(g) = item {
                        group(g, n);
                    }
                }
            }
        }

        fn group(g: &Group, n: &mut usize) {
            for t in &g.inner {
                t.count_tokens(n);
            }
        }

        fn opt(t: &Option<Box<Term>>, n: &mut usize) {
            if let Some(t) = t {
                t.count_tokens(n);
            }
        }

        fn seq(ts: &[Term], n: &mut usize) {
            for t in ts {
                t.count_tokens(n);
            }
        }

        match self {
            RawToken(t) => tok(t, n),
            RawGroup(g) => group(g, n),
            Eof | LiteralNumber { .. } | LiteralInfinity | LiteralString { .. }
            | LiteralBoolean { .. } | LiteralNull | LiteralRegex { .. } | TemplateElement { .. }
            | This | Super | NewTarget | Debugger | EmptyStatement => {}

            Identifier { name } | ShorthandProperty { name } | BindingIdentifier { name } => {
                tok(name, n)
            }
            StaticPropertyName { value } => tok(value, n),
            Template { tag, elements } => {
                opt(tag, n);
                seq(elements, n);
            }
            SyntaxTemplate { template } => group(template, n),
            Parenthesized { inner } => seq(inner, n),
            ArrayExpression { elements } => {
                for e in elements.iter().flatten() {
                    e.count_tokens(n);
                }
            }
            ObjectExpression { properties } => seq(properties, n),
            DataProperty { name, expression } => {
                name.count_tokens(n);
                expression.count_tokens(n);
            }
            ComputedPropertyName { expression }
            | Spread { expression }
            | Throw { expression }
            | ExpressionStatement { expression } => expression.count_tokens(n),
            Getter { name, body } => {
                name.count_tokens(n);
                seq(body, n);
            }
            Setter { name, param, body } => {
                name.count_tokens(n);
                param.count_tokens(n);
                seq(body, n);
            }
            Method {
                name, params, body, ..
            } => {
                name.count_tokens(n);
                params.count_tokens(n);
                seq(body, n);
            }
            FunctionExpression {
                name, params, body, ..
            } => {
                opt(name, n);
                params.count_tokens(n);
                seq(body, n);
            }
            FunctionDeclaration {
                name, params, body, ..
            } => {
                name.count_tokens(n);
                params.count_tokens(n);
                seq(body, n);
            }
            ArrowExpression { params, body } => {
                params.count_tokens(n);
                match body {
                    ArrowBody::Block(stmts) => seq(stmts, n),
                    ArrowBody::Expression(e) => e.count_tokens(n),
                }
            }
            ClassExpression {
                name,
                super_class,
                elements,
            }
            | ClassDeclaration {
                name,
                super_class,
                elements,
            } => {
                opt(name, n);
                opt(super_class, n);
                for e in elements {
                    e.method.count_tokens(n);
                }
            }
            UnaryExpression { op, operand } => {
                tok(op, n);
                operand.count_tokens(n);
            }
            UpdateExpression { op, operand, .. } => {
                tok(op, n);
                operand.count_tokens(n);
            }
            BinaryExpression { op, left, right } => {
                tok(op, n);
                left.count_tokens(n);
                right.count_tokens(n);
            }
            ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                test.count_tokens(n);
                consequent.count_tokens(n);
                alternate.count_tokens(n);
            }
            AssignmentExpression {
                binding,
                expression,
            } => {
                binding.count_tokens(n);
                expression.count_tokens(n);
            }
            CompoundAssignmentExpression {
                binding,
                op,
                expression,
            } => {
                binding.count_tokens(n);
                tok(op, n);
                expression.count_tokens(n);
            }
            StaticMember { object, property } => {
                object.count_tokens(n);
                tok(property, n);
            }
            ComputedMember { object, expression } => {
                object.count_tokens(n);
                expression.count_tokens(n);
            }
            Call { callee, arguments } | New { callee, arguments } => {
                callee.count_tokens(n);
                seq(arguments, n);
            }
            Yield { expression } | YieldGenerator { expression } | Return { expression } => {
                opt(expression, n)
            }

            Block { statements } => seq(statements, n),
            If {
                test,
                consequent,
                alternate,
            } => {
                test.count_tokens(n);
                consequent.count_tokens(n);
                opt(alternate, n);
            }
            While { test, body } => {
                test.count_tokens(n);
                body.count_tokens(n);
            }
            DoWhile { body, test } => {
                body.count_tokens(n);
                test.count_tokens(n);
            }
            For {
                init,
                test,
                update,
                body,
            } => {
                opt(init, n);
                opt(test, n);
                opt(update, n);
                body.count_tokens(n);
            }
            ForIn { left, right, body } | ForOf { left, right, body } => {
                left.count_tokens(n);
                right.count_tokens(n);
                body.count_tokens(n);
            }
            Switch {
                discriminant,
                cases,
            } => {
                discriminant.count_tokens(n);
                seq(cases, n);
            }
            SwitchWithDefault {
                discriminant,
                pre_default_cases,
                default_case,
                post_default_cases,
            } => {
                discriminant.count_tokens(n);
                seq(pre_default_cases, n);
                default_case.count_tokens(n);
                seq(post_default_cases, n);
            }
            SwitchCase { test, consequent } => {
                test.count_tokens(n);
                seq(consequent, n);
            }
            SwitchDefault { consequent } => seq(consequent, n),
            Break { label } | Continue { label } => {
                if let Some(l) = label {
                    tok(l, n);
                }
            }
            Labeled { label, body } => {
                tok(label, n);
                body.count_tokens(n);
            }
            TryCatch { body, catch_clause } => {
                body.count_tokens(n);
                catch_clause.count_tokens(n);
            }
            TryFinally {
                body,
                catch_clause,
                finalizer,
            } => {
                body.count_tokens(n);
                opt(catch_clause, n);
                finalizer.count_tokens(n);
            }
            CatchClause { binding, body } => {
                binding.count_tokens(n);
                body.count_tokens(n);
            }
            With { object, body } => {
                object.count_tokens(n);
                body.count_tokens(n);
            }
            VariableDeclarationStatement { declaration } => declaration.count_tokens(n),
            VariableDeclaration { declarators, .. } => seq(declarators, n),
            VariableDeclarator { binding, init } => {
                binding.count_tokens(n);
                opt(init, n);
            }

            ObjectBinding { properties } => seq(properties, n),
            ArrayBinding { elements, rest } => {
                for e in elements.iter().flatten() {
                    e.count_tokens(n);
                }
                opt(rest, n);
            }
            BindingWithDefault { binding, init } => {
                binding.count_tokens(n);
                init.count_tokens(n);
            }
            BindingPropertyIdentifier { binding, init } => {
                binding.count_tokens(n);
                opt(init, n);
            }
            BindingPropertyProperty { name, binding } => {
                name.count_tokens(n);
                binding.count_tokens(n);
            }
            FormalParameters { items, rest } => {
                seq(items, n);
                opt(rest, n);
            }

            Import {
                default_binding,
                named_imports,
                module_specifier,
                ..
            } => {
                opt(default_binding, n);
                seq(named_imports, n);
                tok(module_specifier, n);
            }
            ImportNamespace {
                default_binding,
                namespace_binding,
                module_specifier,
                ..
            } => {
                opt(default_binding, n);
                namespace_binding.count_tokens(n);
                tok(module_specifier, n);
            }
            ImportSpecifier { name, binding } => {
                if let Some(t) = name {
                    tok(t, n);
                }
                binding.count_tokens(n);
            }
            Export { declaration } => declaration.count_tokens(n),
            ExportDefault { body } => body.count_tokens(n),
            ExportFrom {
                named_exports,
                module_specifier,
            } => {
                seq(named_exports, n);
                if let Some(t) = module_specifier {
                    tok(t, n);
                }
            }
            ExportAllFrom { module_specifier } => tok(module_specifier, n),
            ExportSpecifier {
                name,
                exported_name,
            } => {
                if let Some(t) = name {
                    tok(t, n);
                }
                tok(exported_name, n);
            }
        }
    }
}
