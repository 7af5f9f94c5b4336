//! Tokenizing LMC assembly.
//!
//! This module holds the tokens that characterize LMC assembly ([`Token`]).
//! This module is used by the parser to facilitate the conversion of
//! assembly source code into an AST.
//!
//! The module's key data structure is the [`Token`] enum,
//! which lists all of the tokens of LMC assembly.

use std::num::IntErrorKind;

use logos::{Lexer, Logos};

use crate::ast::Mnemonic;

/// A unit of information in LMC source code.
#[derive(Debug, Logos, PartialEq, Eq, Clone)]
#[logos(skip r"[ \t]+", error = LexErr)]
pub enum Token {
    // Note, these regexes span over tokens that are technically invalid
    // (e.g., 23trst matches for unsigned even though it shouldn't).
    // This is intended.
    // These regexes collect what would be considered one discernable unit
    // and validates it using the validator function.

    /// An unsigned numeric value (e.g., `9`, `14`, `099`)
    #[regex(r"\d\w*", lex_unsigned_dec)]
    Unsigned(u16),

    /// A signed numeric value (e.g., `-9`, `-14`)
    #[regex(r"-\w*", lex_signed_dec)]
    Signed(i16),

    /// An identifier.
    ///
    /// This can refer to either:
    /// - a label (e.g., `LOOP`, `END`, `ONE`, `count`)
    /// - a mnemonic (e.g. `ADD`, `BRZ`, `DAT`)
    ///
    /// Mnemonics are case-insensitive, labels are not.
    #[regex(r"[A-Za-z_]\w*", lex_ident)]
    Ident(Ident),

    /// A comment, which starts with `//` and spans the remaining part of the line.
    #[regex(r"//[^\n]*")]
    Comment,

    /// A new line
    #[regex(r"\r?\n")]
    NewLine
}
impl Token {
    pub(crate) fn is_whitespace(&self) -> bool {
        matches!(self, Token::NewLine)
    }
}

/// An identifier.
///
/// This can refer to either:
/// - a label (e.g., `LOOP`, `END`, `ONE`, `count`)
/// - a mnemonic (e.g. `ADD`, `BRZ`, `DAT`)
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Ident {
    /// An identifier which matches a mnemonic (case-insensitively).
    Mnemonic(Mnemonic),
    /// Any other identifier.
    Label(String)
}
impl std::str::FromStr for Ident {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Mnemonic>() {
            Ok(m)   => Ok(Self::Mnemonic(m)),
            Err(()) => Ok(Self::Label(s.to_string())),
        }
    }
}
impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mnemonic(m) => m.fmt(f),
            Self::Label(id) => f.write_str(id)
        }
    }
}

/// Any errors raised in attempting to tokenize an input stream.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum LexErr {
    /// Numeric literal could not be parsed as a decimal literal because it has invalid digits (i.e., not 0-9)
    InvalidNumeric,
    /// Numeric literal could not be parsed as a decimal literal because there are no digits in it (it's just -)
    InvalidDecEmpty,
    /// Int parsing failed but the reason why is unknown
    UnknownIntErr,
    /// A symbol was used which is not allowed in LMC assembly files
    #[default]
    InvalidSymbol
}
impl std::fmt::Display for LexErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErr::InvalidNumeric  => f.write_str("invalid decimal literal"),
            LexErr::InvalidDecEmpty => f.write_str("invalid decimal literal"),
            LexErr::UnknownIntErr   => f.write_str("could not parse integer"),
            LexErr::InvalidSymbol   => f.write_str("unrecognized symbol"),
        }
    }
}
impl std::error::Error for LexErr {}
impl crate::err::Error for LexErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            LexErr::InvalidNumeric   => Some("a decimal literal only consists of digits 0-9".into()),
            LexErr::InvalidDecEmpty  => Some("there should be digits (0-9) here".into()),
            LexErr::UnknownIntErr    => None,
            LexErr::InvalidSymbol    => Some("this char does not occur in any token in LMC assembly".into()),
        }
    }
}
/// Helper that converts an int error kind to its corresponding LexErr, based on the provided inputs.
///
/// Overflowing literals made only of digits saturate instead (and are range checked by the assembler),
/// so an overflow here means the literal also had invalid digits.
fn convert_int_error(
    e: &std::num::IntErrorKind,
    invalid_digits_err: LexErr,
    empty_err: LexErr,
    src: &str
) -> LexErr {
    match e {
        IntErrorKind::Empty        => empty_err,
        IntErrorKind::InvalidDigit if src == "-" => empty_err,
        IntErrorKind::InvalidDigit => invalid_digits_err,
        IntErrorKind::PosOverflow  => invalid_digits_err,
        IntErrorKind::NegOverflow  => invalid_digits_err,
        IntErrorKind::Zero         => unreachable!("IntErrorKind::Zero should not be emitted in parsing u16"),
        _ => LexErr::UnknownIntErr,
    }
}
fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}
fn lex_unsigned_dec(lx: &Lexer<'_, Token>) -> Result<u16, LexErr> {
    let string = lx.slice();
    match string.parse::<u16>() {
        Ok(n) => Ok(n),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow && is_digits(string) => Ok(u16::MAX),
        Err(e) => Err(convert_int_error(e.kind(), LexErr::InvalidNumeric, LexErr::InvalidDecEmpty, string)),
    }
}
fn lex_signed_dec(lx: &Lexer<'_, Token>) -> Result<i16, LexErr> {
    let string = lx.slice();
    match string.parse::<i16>() {
        Ok(n) => Ok(n),
        Err(e) if *e.kind() == IntErrorKind::NegOverflow && is_digits(&string[1..]) => Ok(i16::MIN),
        Err(e) => Err(convert_int_error(e.kind(), LexErr::InvalidNumeric, LexErr::InvalidDecEmpty, string)),
    }
}
fn lex_ident(lx: &Lexer<'_, Token>) -> Ident {
    match lx.slice().parse::<Ident>() {
        Ok(id) => id,
        Err(e) => match e {},
    }
}

#[cfg(test)]
mod tests {
    use logos::Logos;

    use crate::ast::Mnemonic;
    use crate::err::LexErr;
    use crate::parse::lex::{Ident, Token};

    fn label(s: &str) -> Token {
        Token::Ident(Ident::Label(s.to_string()))
    }
    fn mnemonic(m: Mnemonic) -> Token {
        Token::Ident(Ident::Mnemonic(m))
    }

    #[test]
    fn test_numeric_dec_success() {
        // Basic
        let mut tokens = Token::lexer("0 123 456 789 099");
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(0))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(123))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(456))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(789))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(99))));
        assert_eq!(tokens.next(), None);

        // Negative
        let mut tokens = Token::lexer("-123 -456 -789 -0");
        assert_eq!(tokens.next(), Some(Ok(Token::Signed(-123))));
        assert_eq!(tokens.next(), Some(Ok(Token::Signed(-456))));
        assert_eq!(tokens.next(), Some(Ok(Token::Signed(-789))));
        assert_eq!(tokens.next(), Some(Ok(Token::Signed(0))));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_numeric_dec_overflow() {
        let mut tokens = Token::lexer("65535 -32768");
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(65535))));
        assert_eq!(tokens.next(), Some(Ok(Token::Signed(-32768))));
        assert_eq!(tokens.next(), None);

        // overflowing literals saturate
        assert_eq!(Token::lexer("65536").next(), Some(Ok(Token::Unsigned(u16::MAX))));
        assert_eq!(Token::lexer("999999999999999999999999999999").next(), Some(Ok(Token::Unsigned(u16::MAX))));
        assert_eq!(Token::lexer("-32769").next(), Some(Ok(Token::Signed(i16::MIN))));
    }

    #[test]
    fn test_numeric_dec_invalid() {
        assert_eq!(Token::lexer("3Q").next(), Some(Err(LexErr::InvalidNumeric)));
        assert_eq!(Token::lexer("12ab").next(), Some(Err(LexErr::InvalidNumeric)));
        assert_eq!(Token::lexer("-").next(), Some(Err(LexErr::InvalidDecEmpty)));
        assert_eq!(Token::lexer("-x1").next(), Some(Err(LexErr::InvalidNumeric)));
        assert_eq!(Token::lexer("99999999999999999999x").next(), Some(Err(LexErr::InvalidNumeric)));
    }

    #[test]
    fn test_keywords_labels() {
        let kws = "ADD SUB STA LDA BRA BRZ BRP INP OUT HLT DAT";
        for m_token in Token::lexer(kws) {
            let token = m_token.unwrap();
            assert!(
                matches!(token, Token::Ident(Ident::Mnemonic(_))),
                "Expected {token:?} to be keyword"
            );
        }

        // Case insensitivity
        let mut tokens = Token::lexer("LDA LDa LdA Lda lDA lDa ldA lda");
        for _ in 0..8 {
            assert_eq!(tokens.next(), Some(Ok(mnemonic(Mnemonic::LDA))));
        }
        assert_eq!(tokens.next(), None);

        // Labels (case-sensitive)
        let mut tokens = Token::lexer("LOOP loop _ COUNT1 OTC");
        assert_eq!(tokens.next(), Some(Ok(label("LOOP"))));
        assert_eq!(tokens.next(), Some(Ok(label("loop"))));
        assert_eq!(tokens.next(), Some(Ok(label("_"))));
        assert_eq!(tokens.next(), Some(Ok(label("COUNT1"))));
        assert_eq!(tokens.next(), Some(Ok(label("OTC"))));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_line() {
        let mut tokens = Token::lexer("LOOP  LDA COUNT // load\r\n\tHLT\n");
        assert_eq!(tokens.next(), Some(Ok(label("LOOP"))));
        assert_eq!(tokens.next(), Some(Ok(mnemonic(Mnemonic::LDA))));
        assert_eq!(tokens.next(), Some(Ok(label("COUNT"))));
        assert_eq!(tokens.next(), Some(Ok(Token::Comment)));
        assert_eq!(tokens.next(), Some(Ok(Token::NewLine)));
        assert_eq!(tokens.next(), Some(Ok(mnemonic(Mnemonic::HLT))));
        assert_eq!(tokens.next(), Some(Ok(Token::NewLine)));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_invalid_symbol() {
        for c in ['!', '@', '$', '%', '&', '*', '(', ')', '+', ',', '.', ':', ';', '<', '=', '>', '?', '[', ']', '^', '`', '{', '|', '}', '~', '"', '\''] {
            let string = c.to_string();
            assert_eq!(
                Token::lexer(&string).next(),
                Some(Err(LexErr::InvalidSymbol)),
                "Expected {string:?} to be an invalid symbol"
            );
        }
        // a single slash is not a comment
        assert_eq!(Token::lexer("/").next(), Some(Err(LexErr::InvalidSymbol)));
    }
}
