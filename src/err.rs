//! Error interface for this crate.
//!
//! This module notably holds:
//! - [`Error`]: the trait every error in this crate implements,
//! which exposes an optional source span and help message
//! - [`ErrSpan`]: the source positions an error is associated with
//! - [`report`]: a helper which renders an error alongside the source it came from

use std::borrow::Cow;
use std::ops::Range;

pub use crate::parse::lex::LexErr;
pub use crate::asm::{AsmErr, AsmErrKind};
pub use crate::sim::{SimErr, SimErrKind};

/// Unified error interface for all errors in this crate.
///
/// Note that the [`std::fmt::Display`] implementation is used for the brief message,
/// and [`Error::help`] for any extended explanation.
pub trait Error: std::error::Error {
    /// The range where this error occurs in source.
    ///
    /// If this is not known, this can be set to `None`.
    fn span(&self) -> Option<ErrSpan> {
        None
    }

    /// A clarifying message to help aid someone in how to fix the message.
    ///
    /// If there is none to add, this can be set to `None`.
    fn help(&self) -> Option<Cow<str>>;
}

/// The source positions an error is associated with.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrSpan {
    /// One contiguous range.
    One(Range<usize>),
    /// Two ranges (e.g., both definitions of a duplicated label).
    Two([Range<usize>; 2]),
    /// Any number of ranges.
    Many(Vec<Range<usize>>)
}
impl ErrSpan {
    /// Gets the first range of this span.
    ///
    /// This is `None` only if this is an empty [`ErrSpan::Many`].
    pub fn first(&self) -> Option<Range<usize>> {
        match self {
            ErrSpan::One(r) => Some(r.clone()),
            ErrSpan::Two([r, _]) => Some(r.clone()),
            ErrSpan::Many(rs) => rs.first().cloned(),
        }
    }

    /// Iterates over every range of this span.
    pub fn iter(&self) -> impl Iterator<Item=&Range<usize>> + '_ {
        match self {
            ErrSpan::One(r) => std::slice::from_ref(r).iter(),
            ErrSpan::Two(rs) => rs.iter(),
            ErrSpan::Many(rs) => rs.iter(),
        }
    }
}
impl From<Range<usize>> for ErrSpan {
    fn from(value: Range<usize>) -> Self {
        ErrSpan::One(value)
    }
}
impl From<[Range<usize>; 2]> for ErrSpan {
    fn from(value: [Range<usize>; 2]) -> Self {
        ErrSpan::Two(value)
    }
}
impl From<Vec<Range<usize>>> for ErrSpan {
    fn from(value: Vec<Range<usize>>) -> Self {
        match <[_; 1]>::try_from(value) {
            Ok([r]) => ErrSpan::One(r),
            Err(value) => match <[_; 2]>::try_from(value) {
                Ok(rs) => ErrSpan::Two(rs),
                Err(value) => ErrSpan::Many(value),
            }
        }
    }
}

/// Renders an error alongside the source code it originated from.
///
/// The output lists the error message, then each source line the error's span touches
/// (with the spanned characters underlined), then the help message, if any.
///
/// ## Example
/// ```
/// use lmc_ensemble::asm::assemble_src;
/// use lmc_ensemble::err::report;
///
/// let src = "LDA NOPE\nHLT";
/// let err = assemble_src(src).unwrap_err();
///
/// let rendered = report(&err, src);
/// assert!(rendered.starts_with("error: label was not defined"));
/// assert!(rendered.contains("1 | LDA NOPE"));
/// assert!(rendered.contains("^^^^"));
/// ```
pub fn report(err: &dyn Error, src: &str) -> String {
    use std::fmt::Write;

    let mut out = format!("error: {err}\n");
    let span = err.span();
    for range in span.iter().flat_map(|s| s.iter()) {
        let start = range.start.min(src.len());
        let end = range.end.clamp(start, src.len());

        let line_start = src[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = src[start..].find('\n').map_or(src.len(), |i| start + i);
        let lno = src[..start].matches('\n').count() + 1;
        let line = src[line_start..line_end].trim_end_matches('\r');

        let gutter = " ".repeat(lno.to_string().len());
        // tabs are kept so the carets line up with the source line
        let pad: String = src[line_start..start].chars()
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        let carets = "^".repeat(src[start..end.min(line_end)].chars().count().max(1));
        // writing into a String cannot fail
        let _ = writeln!(out, "{lno} | {line}");
        let _ = writeln!(out, "{gutter} | {pad}{carets}");
    }
    if let Some(help) = err.help() {
        let _ = writeln!(out, "help: {help}");
    }
    out
}
