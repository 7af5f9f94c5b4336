//! Formatters which can read and write machine images.
//!
//! The [`ImageFormat`] trait describes an implementation of reading/writing machine images.
//! This module provides an implementation of the trait:
//! - [`BinaryFormat`]: A binary representation of machine image data
//! - [`TextFormat`]: A text representation of machine image data
//!
//! Neither format preserves the symbol table.

use std::fmt::Write;

use crate::ast::MEM_SIZE;
use crate::sim::mem::{Memory, Word};

use super::MachineImage;

/// A trait defining machine image formats.
pub trait ImageFormat {
    /// Representation of the serialized format.
    ///
    /// For binary formats, `[u8]` should be used.
    /// For text-based formats,`str` should be used.
    type Stream: ToOwned + ?Sized;
    /// Serializes into the stream format.
    fn serialize(o: &MachineImage) -> <Self::Stream as ToOwned>::Owned;
    /// Deserializes from the stream format, returning `None`
    /// if an error occurred during deserialization.
    fn deserialize(i: &Self::Stream) -> Option<MachineImage>;
}

/// Builds an image out of its parts, checking that every cell holds a valid word
/// and that every cell at or past `len` is 0.
fn build_image(len: u16, words: impl IntoIterator<Item=u16>) -> Option<MachineImage> {
    if len > MEM_SIZE { return None; }

    let mut mem = Memory::new();
    let mut count = 0;
    for (addr, w) in (0..).zip(words) {
        if addr >= len && w != 0 { return None; }
        *mem.get_mut(addr)? = Word::new(w)?;
        count += 1;
    }
    if count != MEM_SIZE { return None; }

    Some(MachineImage { mem, len, sym: None })
}

// BINARY!
/// A binary format of machine image data.
pub struct BinaryFormat;

const BFMT_MAGIC: &[u8] = b"lmc\x21";
const BFMT_VER: &[u8] = b"\x00\x01";
impl ImageFormat for BinaryFormat {
    type Stream = [u8];

    fn serialize(o: &MachineImage) -> <Self::Stream as ToOwned>::Owned {
        // Image specification:
        //
        // The header consists of:
        // - The magic number (b"lmc\x21", which reads "lmc!")
        // - The version (2 bytes)
        // - The number of occupied mailboxes (2 bytes, LE)
        //
        // The header is followed by the value of every mailbox (100 x 2 bytes, LE).
        let mut bytes = BFMT_MAGIC.to_vec();
        bytes.extend_from_slice(BFMT_VER);
        bytes.extend(u16::to_le_bytes(o.len()));
        for w in o.words() {
            bytes.extend(u16::to_le_bytes(w));
        }

        bytes
    }

    fn deserialize(mut vec: &Self::Stream) -> Option<MachineImage> {
        vec = vec.strip_prefix(BFMT_MAGIC)?
            .strip_prefix(BFMT_VER)?;

        let len = u16::from_le_bytes(take::<2>(&mut vec)?);
        let words = take_slice(&mut vec, 2 * usize::from(MEM_SIZE))?;
        if !vec.is_empty() { return None; }

        build_image(len, words.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])))
    }
}

fn take<const N: usize>(data: &mut &[u8]) -> Option<[u8; N]> {
    take_slice(data, N)
        .and_then(|slice| <[_; N]>::try_from(slice).ok())
}
fn take_slice<'a>(data: &mut &'a [u8], n: usize) -> Option<&'a [u8]> {
    if n > data.len() { return None; }
    let (left, right) = data.split_at(n);
    *data = right;
    Some(left)
}

// TEXT!
/// A text-based format of machine image data.
pub struct TextFormat;

const TFMT_MAGIC: &str = "LMC IMAGE";
const TFMT_LEN: &str = "LEN";
const TABLE_DIV: &str = " | ";
const TABLE_HEADER: [&str; 2] = ["ADDR", "WORD"];

impl ImageFormat for TextFormat {
    type Stream = str;

    fn serialize(o: &MachineImage) -> <Self::Stream as ToOwned>::Owned {
        // Text format specification.
        //
        // The file consists of a header and a table:
        // ```text
        // LMC IMAGE
        // LEN 3
        // ADDR | WORD
        //   00 | 901
        //   01 | 902
        //   02 | 000
        //  ...
        //   99 | 000
        // ```
        // Blank lines and `//` comments are ignored when reading.
        fn _ser(o: &MachineImage) -> Result<String, std::fmt::Error> {
            let mut buf = String::new();
            writeln!(buf, "{TFMT_MAGIC}")?;
            writeln!(buf, "{TFMT_LEN} {}", o.len())?;
            writeln!(buf, "{}", TABLE_HEADER.join(TABLE_DIV))?;
            for (addr, w) in o.words().into_iter().enumerate() {
                writeln!(buf, "{addr:>4}{TABLE_DIV}{w:03}")?;
            }
            Ok(buf)
        }

        _ser(o).unwrap_or_else(|_| unreachable!("writing into a String should not fail"))
    }

    fn deserialize(string: &Self::Stream) -> Option<MachineImage> {
        let mut lines = string.lines()
            .map(|l| l.split_once("//").map_or(l, |(code, _)| code).trim())
            .filter(|l| !l.is_empty());

        if lines.next()? != TFMT_MAGIC { return None; }

        let len = lines.next()?
            .strip_prefix(TFMT_LEN)?
            .trim()
            .parse::<u16>().ok()?;

        let header = lines.next()?;
        if !header.split('|').map(str::trim).eq(TABLE_HEADER) { return None; }

        let words: Vec<u16> = lines.enumerate()
            .map(|(i, row)| {
                let (addr, word) = row.split_once('|')?;
                let addr = addr.trim().parse::<usize>().ok()?;
                let word = word.trim();
                (addr == i && word.len() == 3).then_some(())?;
                word.parse::<u16>().ok()
            })
            .collect::<Option<_>>()?;

        build_image(len, words)
    }
}
