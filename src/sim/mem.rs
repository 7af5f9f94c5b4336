//! Memory handling for the LMC simulator.
//!
//! This module consists of:
//! - [`Word`]: A single three-digit decimal value (a mailbox or the accumulator).
//! - [`Memory`]: The memory (100 mailboxes).

use crate::ast::MEM_SIZE;

/// The modulus all words are computed under.
pub const WORD_MODULUS: u16 = 1000;

/// A three-digit unsigned decimal value, always in `0..=999`.
///
/// # Arithmetic
///
/// Words can be added and subtracted with typical `+` and `-` operators.
/// All arithmetic is wrapping (modulo 1000):
/// ```
/// use lmc_ensemble::sim::mem::Word;
///
/// let a = Word::new(999).unwrap();
/// let b = Word::new(5).unwrap();
/// assert_eq!((a + b).get(), 4);
/// assert_eq!((b - a).get(), 6);
/// ```
///
/// If it needs to be known whether a subtraction went below zero
/// before wrapping, [`Word::overflowing_sub`] can be used.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u16", into = "u16"))]
pub struct Word(u16);

impl Word {
    /// The zero word.
    pub const ZERO: Word = Word(0);

    /// Creates a new word, returning `None` if the value is larger than 999.
    pub fn new(value: u16) -> Option<Self> {
        (value < WORD_MODULUS).then_some(Word(value))
    }
    /// Creates a new word by wrapping the given value into `0..=999`.
    ///
    /// Negative values wrap to the top of the range (e.g., `-1` becomes `999`).
    pub fn new_wrapping(value: i32) -> Self {
        // rem_euclid result is in 0..1000, which fits in u16
        Word(value.rem_euclid(i32::from(WORD_MODULUS)) as u16)
    }
    /// Reads the word's value.
    pub fn get(self) -> u16 {
        self.0
    }
    /// Subtracts `rhs` from this word (wrapping),
    /// also returning whether the unwrapped result was negative.
    ///
    /// ```
    /// use lmc_ensemble::sim::mem::Word;
    ///
    /// let two = Word::new(2).unwrap();
    /// let five = Word::new(5).unwrap();
    /// assert_eq!(two.overflowing_sub(five), (Word::new(997).unwrap(), true));
    /// assert_eq!(five.overflowing_sub(two), (Word::new(3).unwrap(), false));
    /// ```
    pub fn overflowing_sub(self, rhs: Word) -> (Word, bool) {
        let diff = i32::from(self.0) - i32::from(rhs.0);
        (Word::new_wrapping(diff), diff < 0)
    }
}
impl std::ops::Add for Word {
    type Output = Word;

    fn add(self, rhs: Self) -> Self::Output {
        Word::new_wrapping(i32::from(self.0) + i32::from(rhs.0))
    }
}
impl std::ops::AddAssign for Word {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl std::ops::Sub for Word {
    type Output = Word;

    fn sub(self, rhs: Self) -> Self::Output {
        self.overflowing_sub(rhs).0
    }
}
impl std::ops::SubAssign for Word {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
impl TryFrom<u16> for Word {
    type Error = WordRangeErr;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Word::new(value).ok_or(WordRangeErr(value))
    }
}
impl From<Word> for u16 {
    fn from(value: Word) -> Self {
        value.0
    }
}
impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// Error from trying to create a [`Word`] out of a value larger than 999.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct WordRangeErr(pub u16);
impl std::fmt::Display for WordRangeErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} does not fit in a word (0-999)", self.0)
    }
}
impl std::error::Error for WordRangeErr {}

/// The memory of the machine: 100 mailboxes, addressed `0..=99`.
///
/// Memory can be indexed directly with an address (which panics if the address is out of range)
/// or accessed with [`Memory::get`] and [`Memory::get_mut`] (which do not).
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Memory(
    #[cfg_attr(feature = "serde", serde(with = "serde_arrays"))]
    [Word; MEM_SIZE as usize]
);
impl Memory {
    /// Creates a new memory, with all mailboxes set to 0.
    pub fn new() -> Self {
        Memory([Word::ZERO; MEM_SIZE as usize])
    }
    /// Gets the word at the given address, returning `None` if the address is out of range.
    pub fn get(&self, addr: u16) -> Option<Word> {
        self.0.get(usize::from(addr)).copied()
    }
    /// Gets a mutable reference to the word at the given address, returning `None` if the address is out of range.
    pub fn get_mut(&mut self, addr: u16) -> Option<&mut Word> {
        self.0.get_mut(usize::from(addr))
    }
    /// Views the memory as a slice of words.
    pub fn as_slice(&self) -> &[Word] {
        &self.0
    }
    /// Gets the raw values of every mailbox.
    pub fn values(&self) -> [u16; MEM_SIZE as usize] {
        self.0.map(Word::get)
    }
}
impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
impl std::ops::Index<u16> for Memory {
    type Output = Word;

    fn index(&self, index: u16) -> &Self::Output {
        &self.0[usize::from(index)]
    }
}
impl std::ops::IndexMut<u16> for Memory {
    fn index_mut(&mut self, index: u16) -> &mut Self::Output {
        &mut self.0[usize::from(index)]
    }
}
