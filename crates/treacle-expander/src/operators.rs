//! Static operator-precedence data for the expression engine.

use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// Precedence applied to the operand of a prefix operator.
pub const UNARY_PREC: u8 = 14;

const UNARY_OPERATORS: &[&str] = &[
    "+", "-", "!", "~", "typeof", "void", "delete", "++", "--",
];

/// Binding precedence of a binary operator lexeme.
pub fn binary_precedence(op: &str) -> Option<u8> {
    let prec = match op {
        "**" => 14,
        "*" | "/" | "%" => 13,
        "+" | "-" => 12,
        "<<" | ">>" | ">>>" => 11,
        "<" | "<=" | ">" | ">=" | "in" | "instanceof" => 10,
        "==" | "!=" | "===" | "!==" => 9,
        "&" => 8,
        "^" => 7,
        "|" => 6,
        "&&" => 5,
        "||" | "??" => 4,
        _ => return None,
    };
    Some(prec)
}

pub fn associativity(op: &str) -> Assoc {
    if op == "**" {
        Assoc::Right
    } else {
        Assoc::Left
    }
}

fn operator_shaped(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Punctuator | TokenKind::Keyword | TokenKind::Identifier
    )
}

pub fn is_unary_operator(token: &Token) -> bool {
    operator_shaped(token) && UNARY_OPERATORS.contains(&token.value.as_str())
}

pub fn is_binary_operator(token: &Token) -> bool {
    operator_shaped(token) && binary_precedence(&token.value).is_some()
}

pub fn is_operator(token: &Token) -> bool {
    is_unary_operator(token) || is_binary_operator(token)
}

pub fn is_update_operator(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Punctuator) && (token.value == "++" || token.value == "--")
}

/// Does an operator at `prec`/`assoc` bind tighter than the frame to its
/// left? Right-associative operators also win ties.
pub fn operator_lt(left: u8, prec: u8, assoc: Assoc) -> bool {
    match assoc {
        Assoc::Left => left < prec,
        Assoc::Right => left <= prec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let add = binary_precedence("+").unwrap();
        let mul = binary_precedence("*").unwrap();
        assert!(operator_lt(add, mul, associativity("*")));
        assert!(!operator_lt(mul, add, associativity("+")));
    }

    #[test]
    fn exponent_is_right_associative() {
        let prec = binary_precedence("**").unwrap();
        assert!(operator_lt(prec, prec, associativity("**")));
        let add = binary_precedence("+").unwrap();
        assert!(!operator_lt(add, add, associativity("+")));
    }

    #[test]
    fn keyword_operators_classify() {
        let tok = Token::new(TokenKind::Keyword, "instanceof", 1);
        assert!(is_binary_operator(&tok));
        let tok = Token::new(TokenKind::Keyword, "typeof", 1);
        assert!(is_unary_operator(&tok));
        assert!(!is_binary_operator(&tok));
    }

    #[test]
    fn comma_is_not_an_operator() {
        let tok = Token::new(TokenKind::Punctuator, ",", 1);
        assert!(!is_operator(&tok));
    }
}
