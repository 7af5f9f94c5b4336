//! Components relating to the abstract syntax trees (ASTs)
//! used in representing LMC source and machine instructions.
//!
//! These components together are used to construct...
//! - [`InstrDef`] (a row of the fixed instruction set table, [`INSTRUCTION_SET`]),
//! - [`Stmt`] (a data structure holding one line of assembly source code),
//! - and [`Instr`] (a data structure holding a decoded machine instruction).

use std::ops::Range;

/// The number of mailboxes (memory cells) in the machine.
pub const MEM_SIZE: u16 = 100;

/// The kind of operand a mnemonic accepts.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum OperandKind {
    /// No operand is allowed.
    None,
    /// A required mailbox address (`0..=99`), given as a literal or a label.
    Address,
    /// An optional data value (`-999..=999`) or label. Defaults to 0.
    Data,
}

/// A row of the instruction set table.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct InstrDef {
    /// The mnemonic this row describes.
    pub mnemonic: Mnemonic,
    /// The value the operand is added to when composing the machine word.
    ///
    /// For address-taking instructions, this is the opcode digit times 100.
    /// For operand-less instructions, this is the complete machine word.
    pub base: u16,
    /// The operand this mnemonic accepts.
    pub operand: OperandKind,
}

macro_rules! instruction_set {
    ($($(#[$doc:meta])* $name:ident = $base:literal, $operand:ident);+ $(;)?) => {
        /// The textual name of an instruction (or of the `DAT` directive).
        ///
        /// Mnemonics are case-insensitive when parsed.
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
        pub enum Mnemonic {
            $(
                $(#[$doc])*
                $name
            ),+
        }

        /// The fixed instruction set table, one row per mnemonic.
        ///
        /// Rows are in the same order as the [`Mnemonic`] variants.
        pub static INSTRUCTION_SET: &[InstrDef] = &[
            $(InstrDef { mnemonic: Mnemonic::$name, base: $base, operand: OperandKind::$operand }),+
        ];

        impl std::str::FromStr for Mnemonic {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case(stringify!($name)) {
                        return Ok(Self::$name);
                    }
                )+
                Err(())
            }
        }

        impl std::fmt::Display for Mnemonic {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$name => f.write_str(stringify!($name))),+
                }
            }
        }
    };
}
instruction_set! {
    /// `acc = wrap(acc + mem[addr])`
    ADD = 100, Address;
    /// `acc = wrap(acc - mem[addr])`
    SUB = 200, Address;
    /// `mem[addr] = acc`
    STA = 300, Address;
    /// `acc = mem[addr]`
    LDA = 500, Address;
    /// `pc = addr`
    BRA = 600, Address;
    /// `pc = addr` if `acc == 0`
    BRZ = 700, Address;
    /// `pc = addr` if the accumulator is considered positive (see [`crate::sim::BrpMode`])
    BRP = 800, Address;
    /// `acc = next input value`
    INP = 901, None;
    /// Emits `acc` to the output.
    OUT = 902, None;
    /// Halts the machine.
    HLT = 0, None;
    /// A data word, never executed by normal control flow.
    DAT = 0, Data;
}

impl Mnemonic {
    /// Gets this mnemonic's row in the instruction set table.
    pub fn def(self) -> &'static InstrDef {
        &INSTRUCTION_SET[self as usize]
    }
}

/// Looks up a mnemonic's row in the instruction set table by name (case-insensitive).
///
/// ## Example
/// ```
/// use lmc_ensemble::ast::{lookup_mnemonic, Mnemonic, OperandKind};
///
/// let def = lookup_mnemonic("lda").unwrap();
/// assert_eq!(def.mnemonic, Mnemonic::LDA);
/// assert_eq!(def.base, 500);
/// assert_eq!(def.operand, OperandKind::Address);
///
/// assert!(lookup_mnemonic("OTC").is_none());
/// ```
pub fn lookup_mnemonic(name: &str) -> Option<&'static InstrDef> {
    name.parse::<Mnemonic>().ok().map(Mnemonic::def)
}

/// Label used to refer to a specific mailbox.
///
/// Labels are case-sensitive.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Label {
    /// The label's name.
    pub name: String,

    /// The start of the label in source.
    start: usize
}
impl Label {
    /// Creates a new label with a given name and a given start position in the source.
    pub fn new(name: String, start: usize) -> Self {
        Label { name, start }
    }
    /// Gets the span of the label in the source.
    pub fn span(&self) -> Range<usize> {
        self.start .. (self.start + self.name.len())
    }
}
impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// The operand of a statement.
///
/// ## Examples
/// ```text
///      LDA 12
///          ~~
/// LOOP BRA LOOP
///          ~~~~
/// ZERO DAT -1
///          ~~
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Operand {
    /// A numeric literal.
    Literal(i32),
    /// A label referencing another line's mailbox.
    Label(Label),
}
impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Literal(n) => n.fmt(f),
            Operand::Label(l)   => l.fmt(f),
        }
    }
}

/// A single line of assembly source code.
///
/// Every statement occupies exactly one mailbox.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Stmt {
    /// The label defined on this line, if present.
    pub label: Option<Label>,
    /// The mnemonic of this line.
    pub mnemonic: Mnemonic,
    /// The operand of this line, if present.
    pub operand: Option<Operand>,
    /// The line number (1-indexed) this statement appears on.
    pub line: usize,
    /// The span of this statement in the source (excluding comments).
    pub span: Range<usize>,
}
impl std::fmt::Display for Stmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{label} ")?;
        }
        write!(f, "{}", self.mnemonic)?;
        if let Some(operand) = &self.operand {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

/// A decoded machine instruction.
///
/// This is what the simulator executes. An instruction
/// is encoded into a single three-digit word (see [`Instr::encode`])
/// and decoded from one (see [`Instr::decode`]).
///
/// Address operands are always in `0..=99`.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Instr {
    #[allow(missing_docs)]
    ADD(u16),
    #[allow(missing_docs)]
    SUB(u16),
    #[allow(missing_docs)]
    STA(u16),
    #[allow(missing_docs)]
    LDA(u16),
    #[allow(missing_docs)]
    BRA(u16),
    #[allow(missing_docs)]
    BRZ(u16),
    #[allow(missing_docs)]
    BRP(u16),
    #[allow(missing_docs)]
    INP,
    #[allow(missing_docs)]
    OUT,
    #[allow(missing_docs)]
    HLT,
}
impl Instr {
    /// Decodes a machine word into an instruction.
    ///
    /// Any word in `0..=99` decodes as `HLT`.
    /// This returns `None` if the word uses the reserved opcode 4,
    /// is a `9xx` word other than `901`/`902`, or is larger than 999.
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::ast::Instr;
    ///
    /// assert_eq!(Instr::decode(512), Some(Instr::LDA(12)));
    /// assert_eq!(Instr::decode(901), Some(Instr::INP));
    /// assert_eq!(Instr::decode(0),   Some(Instr::HLT));
    /// assert_eq!(Instr::decode(450), None);
    /// assert_eq!(Instr::decode(999), None);
    /// ```
    pub fn decode(word: u16) -> Option<Self> {
        let addr = word % 100;
        match word / 100 {
            0 => Some(Instr::HLT),
            1 => Some(Instr::ADD(addr)),
            2 => Some(Instr::SUB(addr)),
            3 => Some(Instr::STA(addr)),
            5 => Some(Instr::LDA(addr)),
            6 => Some(Instr::BRA(addr)),
            7 => Some(Instr::BRZ(addr)),
            8 => Some(Instr::BRP(addr)),
            9 => match word {
                901 => Some(Instr::INP),
                902 => Some(Instr::OUT),
                _ => None
            },
            _ => None
        }
    }

    /// Encodes this instruction into a machine word.
    pub fn encode(self) -> u16 {
        let def = self.mnemonic().def();
        match self.operand() {
            Some(addr) => {
                debug_assert!(addr < MEM_SIZE, "address operand should be in 0..=99");
                def.base + addr
            },
            None => def.base,
        }
    }

    /// The mnemonic of this instruction.
    pub fn mnemonic(self) -> Mnemonic {
        match self {
            Instr::ADD(_) => Mnemonic::ADD,
            Instr::SUB(_) => Mnemonic::SUB,
            Instr::STA(_) => Mnemonic::STA,
            Instr::LDA(_) => Mnemonic::LDA,
            Instr::BRA(_) => Mnemonic::BRA,
            Instr::BRZ(_) => Mnemonic::BRZ,
            Instr::BRP(_) => Mnemonic::BRP,
            Instr::INP    => Mnemonic::INP,
            Instr::OUT    => Mnemonic::OUT,
            Instr::HLT    => Mnemonic::HLT,
        }
    }

    /// The address operand of this instruction, if it has one.
    pub fn operand(self) -> Option<u16> {
        match self {
            | Instr::ADD(a)
            | Instr::SUB(a)
            | Instr::STA(a)
            | Instr::LDA(a)
            | Instr::BRA(a)
            | Instr::BRZ(a)
            | Instr::BRP(a) => Some(a),
            Instr::INP | Instr::OUT | Instr::HLT => None,
        }
    }
}
impl std::fmt::Display for Instr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.operand() {
            Some(addr) => write!(f, "{} {addr}", self.mnemonic()),
            None => self.mnemonic().fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{lookup_mnemonic, Instr, Mnemonic, OperandKind, INSTRUCTION_SET};

    #[test]
    fn test_table_order() {
        for (i, def) in INSTRUCTION_SET.iter().enumerate() {
            assert_eq!(def.mnemonic as usize, i, "{} is out of order", def.mnemonic);
            assert_eq!(def.mnemonic.def(), def);
        }
        assert_eq!(INSTRUCTION_SET.len(), 11);
    }

    #[test]
    fn test_lookup_case_insensitive() {
        for name in ["BRZ", "brz", "Brz", "bRZ"] {
            assert_eq!(lookup_mnemonic(name).map(|d| d.mnemonic), Some(Mnemonic::BRZ));
        }
        assert_eq!(lookup_mnemonic("dat").map(|d| d.operand), Some(OperandKind::Data));
        assert_eq!(lookup_mnemonic("OUT").map(|d| d.base), Some(902));
        assert!(lookup_mnemonic("LOOP").is_none());
    }

    #[test]
    fn test_decode_encode() {
        // every word that decodes re-encodes to itself, except for 1..=99 (all of which are HLT)
        for word in 0..1000 {
            match Instr::decode(word) {
                Some(Instr::HLT) => assert!(word < 100),
                Some(instr) => assert_eq!(instr.encode(), word, "{instr} did not re-encode"),
                None => assert!(word / 100 == 4 || (word >= 900 && word != 901 && word != 902)),
            }
        }
        assert_eq!(Instr::HLT.encode(), 0);
        assert_eq!(Instr::decode(1000), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Instr::ADD(7).to_string(), "ADD 7");
        assert_eq!(Instr::BRP(99).to_string(), "BRP 99");
        assert_eq!(Instr::OUT.to_string(), "OUT");
    }
}
