//! Parsing assembly source code into an AST.
//!
//! This module is used to convert strings (which represent assembly source code)
//! into abstract syntax trees (`Vec<`[`Stmt`]`>`).
//!
//! The module notably consists of:
//! - [`parse_ast`]: the main function which parses source code into a list of statements
//! - [`lex`]: the tokenizer used by the parser
//!
//! Each non-empty line of source code follows the grammar
//! ```text
//! [label] mnemonic [operand] [// comment]
//! ```
//! where the operand is either a numeric literal or a label.
//! Lines which are empty or only hold a comment produce no statement.

pub mod lex;

use std::ops::Range;

use logos::Logos;

use crate::asm::{AsmErr, AsmErrKind};
use crate::ast::{Label, Operand, Stmt};
use self::lex::{Ident, Token};

/// Parses a string of assembly source code into a list of statements.
///
/// The returned statements are in source order, and each one
/// occupies one mailbox once assembled.
///
/// ## Example
/// ```
/// use lmc_ensemble::parse::parse_ast;
/// use lmc_ensemble::ast::{Mnemonic, Operand};
///
/// let src = "
///     // count down from 3
///     LOOP  SUB ONE
///           BRP LOOP
///           HLT
///     ONE   DAT 1
/// ";
/// let ast = parse_ast(src).unwrap();
/// assert_eq!(ast.len(), 4);
///
/// assert_eq!(ast[0].label.as_ref().map(|l| &*l.name), Some("LOOP"));
/// assert_eq!(ast[0].mnemonic, Mnemonic::SUB);
/// assert_eq!(ast[0].line, 3);
/// assert_eq!(ast[3].operand, Some(Operand::Literal(1)));
/// ```
pub fn parse_ast(src: &str) -> Result<Vec<Stmt>, AsmErr> {
    let mut stmts = vec![];
    let mut line_tokens: Vec<(Token, Range<usize>)> = vec![];
    let mut line = 1;

    for (m_token, span) in Token::lexer(src).spanned() {
        let token = m_token.map_err(|e| AsmErr::new(AsmErrKind::Lex(e), line, span.clone()))?;

        match token {
            Token::Comment => {},
            t if t.is_whitespace() => {
                if let Some(stmt) = parse_line(&line_tokens, line)? {
                    stmts.push(stmt);
                }
                line_tokens.clear();
                line += 1;
            },
            t => line_tokens.push((t, span)),
        }
    }
    if let Some(stmt) = parse_line(&line_tokens, line)? {
        stmts.push(stmt);
    }

    Ok(stmts)
}

/// Parses the tokens of a single line into a statement.
///
/// This returns `None` if the line has no tokens.
fn parse_line(tokens: &[(Token, Range<usize>)], line: usize) -> Result<Option<Stmt>, AsmErr> {
    let err = |kind: AsmErrKind, span: &Range<usize>| AsmErr::new(kind, line, span.clone());

    let mut it = tokens.iter();
    let Some((first, first_span)) = it.next() else {
        return Ok(None);
    };

    // Optional label, then mandatory mnemonic.
    let (label, mnemonic) = match first {
        Token::Ident(Ident::Mnemonic(m)) => (None, *m),
        Token::Ident(Ident::Label(name)) => {
            let label = Label::new(name.clone(), first_span.start);
            match it.next() {
                Some((Token::Ident(Ident::Mnemonic(m)), _)) => (Some(label), *m),
                // With two identifiers (`JMP LOOP`), the first is the unknown mnemonic.
                // With more (`LOOP JMP X`), the second is.
                Some((Token::Ident(Ident::Label(_)), span)) => {
                    let span = if tokens.len() == 2 { first_span } else { span };
                    return Err(err(AsmErrKind::UnknownMnemonic, span));
                },
                // An identifier followed by an operand is an (unknown) mnemonic.
                Some((Token::Unsigned(_) | Token::Signed(_), _)) => return Err(err(AsmErrKind::UnknownMnemonic, first_span)),
                Some((_, span)) => return Err(err(AsmErrKind::UnexpectedToken, span)),
                // A lone identifier is treated as an (unknown) mnemonic.
                None => return Err(err(AsmErrKind::UnknownMnemonic, first_span)),
            }
        },
        _ => return Err(err(AsmErrKind::UnexpectedToken, first_span)),
    };

    let operand = match it.next() {
        None => None,
        Some((Token::Unsigned(n), _)) => Some(Operand::Literal(i32::from(*n))),
        Some((Token::Signed(n), _)) => Some(Operand::Literal(i32::from(*n))),
        Some((Token::Ident(Ident::Label(name)), span)) => Some(Operand::Label(Label::new(name.clone(), span.start))),
        Some((_, span)) => return Err(err(AsmErrKind::InvalidOperand, span)),
    };

    if let Some((_, span)) = it.next() {
        return Err(err(AsmErrKind::UnexpectedToken, span));
    }

    let end = tokens.last().map_or(first_span.end, |(_, span)| span.end);
    Ok(Some(Stmt {
        label,
        mnemonic,
        operand,
        line,
        span: first_span.start..end,
    }))
}

#[cfg(test)]
mod tests {
    use super::parse_ast;
    use crate::asm::AsmErrKind;
    use crate::ast::{Label, Mnemonic, Operand, Stmt};
    use crate::err::{ErrSpan, LexErr};

    #[test]
    fn test_basic_lines() {
        let src = "INP\nSTORE STA 99\n  OUT // emit\nDAT -5";
        let ast = parse_ast(src).unwrap();

        assert_eq!(ast, vec![
            Stmt { label: None, mnemonic: Mnemonic::INP, operand: None, line: 1, span: 0..3 },
            Stmt {
                label: Some(Label::new("STORE".to_string(), 4)),
                mnemonic: Mnemonic::STA,
                operand: Some(Operand::Literal(99)),
                line: 2,
                span: 4..16
            },
            Stmt { label: None, mnemonic: Mnemonic::OUT, operand: None, line: 3, span: 19..22 },
            Stmt { label: None, mnemonic: Mnemonic::DAT, operand: Some(Operand::Literal(-5)), line: 4, span: 31..37 },
        ]);
    }

    #[test]
    fn test_blank_and_comment_lines() {
        let src = "\n\n   \n// only a comment\r\n\tHLT // stop\n\n";
        let ast = parse_ast(src).unwrap();
        assert_eq!(ast.len(), 1);
        assert_eq!(ast[0].mnemonic, Mnemonic::HLT);
        assert_eq!(ast[0].line, 5);

        assert_eq!(parse_ast("").unwrap(), vec![]);
        assert_eq!(parse_ast("// nothing").unwrap(), vec![]);
    }

    #[test]
    fn test_label_operand() {
        let ast = parse_ast("BRA end\nend HLT").unwrap();
        assert_eq!(ast[0].operand, Some(Operand::Label(Label::new("end".to_string(), 4))));
        assert_eq!(ast[1].label.as_ref().map(|l| l.span()), Some(8..11));
    }

    #[test]
    fn test_case_insensitive_mnemonics() {
        let ast = parse_ast("lda X\nLdA X\nX dat 5").unwrap();
        assert_eq!(ast[0].mnemonic, Mnemonic::LDA);
        assert_eq!(ast[1].mnemonic, Mnemonic::LDA);
        assert_eq!(ast[2].mnemonic, Mnemonic::DAT);
    }

    #[test]
    fn test_errors() {
        let err = parse_ast("HLT\nOTC").unwrap_err();
        assert_eq!(err.kind, AsmErrKind::UnknownMnemonic);
        assert_eq!(err.line, 2);
        assert_eq!(err.span, ErrSpan::One(4..7));

        let err = parse_ast("FOO BAR 1").unwrap_err();
        assert_eq!(err.kind, AsmErrKind::UnknownMnemonic);
        assert_eq!(err.span, ErrSpan::One(4..7));

        let err = parse_ast("HLT\nJMP LOOP").unwrap_err();
        assert_eq!(err.kind, AsmErrKind::UnknownMnemonic);
        assert_eq!(err.span, ErrSpan::One(4..7));

        let err = parse_ast("OTC 5").unwrap_err();
        assert_eq!(err.kind, AsmErrKind::UnknownMnemonic);
        assert_eq!(err.span, ErrSpan::One(0..3));

        let err = parse_ast("12 HLT").unwrap_err();
        assert_eq!(err.kind, AsmErrKind::UnexpectedToken);

        let err = parse_ast("ADD 1 2").unwrap_err();
        assert_eq!(err.kind, AsmErrKind::UnexpectedToken);
        assert_eq!(err.span, ErrSpan::One(6..7));

        let err = parse_ast("BRA HLT").unwrap_err();
        assert_eq!(err.kind, AsmErrKind::InvalidOperand);

        let err = parse_ast("\n\nADD $").unwrap_err();
        assert_eq!(err.kind, AsmErrKind::Lex(LexErr::InvalidSymbol));
        assert_eq!(err.line, 3);
    }
}
