//! Assembling assembly source ASTs into machine images.
//!
//! This module is used to convert source ASTs (`Vec<`[`Stmt`]`>`) into machine images
//! that can be executed by the simulator.
//!
//! The assembler module notably consists of:
//! - [`assemble`] and [`assemble_debug`]: The main functions which assemble the statements into a machine image.
//! - [`SymbolTable`]: a struct holding the symbol table, which stores location information for labels after the first assembler pass
//! - [`MachineImage`]: a struct holding the machine image, which can be loaded into the simulator and executed
//! - [`disassemble`]: a function which converts a machine image back into assembly source
//!
//! Assembly happens in two passes. The first pass ([`SymbolTable::new`]) assigns
//! every statement a mailbox and binds labels to those mailboxes.
//! The second pass ([`MachineImage::new`]) encodes every statement, resolving
//! labels through the symbol table. Since all labels are bound before any are resolved,
//! a label can be used before the line which defines it.
//!
//! [`Stmt`]: crate::ast::Stmt

pub mod encoding;

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use crate::ast::{Instr, OperandKind, Operand, Stmt, MEM_SIZE};
use crate::err::{ErrSpan, LexErr};
use crate::parse::parse_ast;
use crate::sim::mem::{Memory, Word};

/// Assembles an assembly source code AST into a machine image.
///
/// This function assembles the source AST *without* including the symbol table
/// in the machine image.
///
/// # Example
/// ```
/// use lmc_ensemble::parse::parse_ast;
/// use lmc_ensemble::asm::assemble;
///
/// let src = "
///     LOOP BRA LOOP
/// ";
/// let ast = parse_ast(src).unwrap();
///
/// let image = assemble(ast);
/// assert!(image.is_ok());
///
/// // Symbol table doesn't exist in the image:
/// let image = image.unwrap();
/// assert!(image.symbol_table().is_none());
/// assert_eq!(image.words()[0], 600);
/// ```
pub fn assemble(ast: Vec<Stmt>) -> Result<MachineImage, AsmErr> {
    let sym = SymbolTable::new(&ast)?;
    MachineImage::new(ast, sym, false)
}
/// Assembles an assembly source code AST into a machine image.
///
/// This function assembles the source AST *and* includes the symbol table
/// in the machine image, which can be used to map labels and lines to addresses
/// while simulating (e.g., to set breakpoints on labels).
///
/// # Example
/// ```
/// use lmc_ensemble::parse::parse_ast;
/// use lmc_ensemble::asm::assemble_debug;
///
/// let src = "
///     LOOP BRA LOOP
/// ";
/// let ast = parse_ast(src).unwrap();
///
/// let image = assemble_debug(ast).unwrap();
/// let sym = image.symbol_table().unwrap();
/// assert_eq!(sym.lookup_label("LOOP"), Some(0));
/// ```
pub fn assemble_debug(ast: Vec<Stmt>) -> Result<MachineImage, AsmErr> {
    let sym = SymbolTable::new(&ast)?;
    MachineImage::new(ast, sym, true)
}
/// Parses and assembles assembly source code into a machine image.
///
/// This is a shorthand for [`parse_ast`] followed by [`assemble`].
///
/// # Example
/// ```
/// use lmc_ensemble::asm::assemble_src;
///
/// let image = assemble_src("INP\nOUT\nHLT").unwrap();
/// assert_eq!(&image.words()[..4], &[901, 902, 0, 0]);
/// ```
pub fn assemble_src(src: &str) -> Result<MachineImage, AsmErr> {
    assemble(parse_ast(src)?)
}

/// Kinds of errors that can occur from parsing and assembling given assembly code.
///
/// See [`AsmErr`] for this error type with line and span information included.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AsmErrKind {
    /// A token could not be lexed (parse).
    Lex(LexErr),
    /// The mnemonic of a line is not in the instruction set (parse).
    UnknownMnemonic,
    /// A token appeared where it was not expected (parse).
    UnexpectedToken,
    /// There were multiple labels of the same name (pass 1).
    DuplicateLabel,
    /// More statements were written than there are mailboxes (pass 1).
    ProgramTooLarge,
    /// An operand referred to a label which was never defined (pass 2).
    UndefinedLabel,
    /// An operand was out of range, present when forbidden, or absent when required (pass 2).
    InvalidOperand,
}
impl std::fmt::Display for AsmErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lex(e)          => e.fmt(f),
            Self::UnknownMnemonic => f.write_str("unknown mnemonic"),
            Self::UnexpectedToken => f.write_str("unexpected token"),
            Self::DuplicateLabel  => f.write_str("label was defined multiple times"),
            Self::ProgramTooLarge => f.write_str("program does not fit in memory"),
            Self::UndefinedLabel  => f.write_str("label was not defined"),
            Self::InvalidOperand  => f.write_str("invalid operand"),
        }
    }
}

/// Error from parsing or assembling given assembly code.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AsmErr {
    /// The value with a span.
    pub kind: AsmErrKind,
    /// The line (1-indexed) this error occurred on.
    pub line: usize,
    /// The span in the source associated with this value.
    pub span: ErrSpan
}
impl AsmErr {
    /// Creates a new [`AsmErr`].
    pub fn new<E: Into<ErrSpan>>(kind: AsmErrKind, line: usize, span: E) -> Self {
        AsmErr { kind, line, span: span.into() }
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
impl std::error::Error for AsmErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            AsmErrKind::Lex(e) => Some(e),
            _ => None
        }
    }
}
impl crate::err::Error for AsmErr {
    fn span(&self) -> Option<ErrSpan> {
        Some(self.span.clone())
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match &self.kind {
            AsmErrKind::Lex(e)          => crate::err::Error::help(e),
            AsmErrKind::UnknownMnemonic => Some("valid mnemonics are ADD, SUB, STA, LDA, BRA, BRZ, BRP, INP, OUT, HLT, and DAT".into()),
            AsmErrKind::UnexpectedToken => Some("a line consists of an optional label, a mnemonic, and an optional operand".into()),
            AsmErrKind::DuplicateLabel  => Some("labels must be unique within a program, try renaming one of the labels".into()),
            AsmErrKind::ProgramTooLarge => Some(format!("a program can have at most {MEM_SIZE} instructions and data words").into()),
            AsmErrKind::UndefinedLabel  => Some("try adding this label before an instruction or DAT".into()),
            AsmErrKind::InvalidOperand  => Some("addresses must be in 0-99, DAT values in -999-999, and INP, OUT, and HLT take no operand".into()),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
struct SymbolData {
    addr: u16,
    src_start: usize,
}
impl SymbolData {
    /// Calculates the source range of this symbol, given the name of the label.
    fn span(&self, label: &str) -> Range<usize> {
        self.src_start .. (self.src_start + label.len())
    }
}

/// The symbol table created in the first assembler pass
/// that encodes source code mappings to memory addresses in the machine image.
///
/// Here is a table of the mappings that the symbol table provides:
///
/// | from ↓, to →   | label                              | memory address                | source line/span                  |
/// |----------------|------------------------------------|-------------------------------|-----------------------------------|
/// | label          | -                                  | [`SymbolTable::lookup_label`] | [`SymbolTable::get_label_source`] |
/// | memory address | [`SymbolTable::rev_lookup_label`]  | -                             | [`SymbolTable::rev_lookup_line`]  |
/// | source line    | none                               | [`SymbolTable::lookup_line`]  | -                                 |
///
/// Labels are case-sensitive.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SymbolTable {
    /// A mapping from label to address and span of the label.
    label_map: HashMap<String, SymbolData>,

    /// A mapping from each line with a statement in the source to an address.
    line_map: BTreeMap<usize, u16>,
}

impl SymbolTable {
    /// Creates a new symbol table.
    ///
    /// This performs the first assembler pass, calculating the memory address of
    /// each provided statement and binding labels to those addresses.
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::parse::parse_ast;
    /// use lmc_ensemble::asm::SymbolTable;
    ///
    /// let src = "
    ///     START LDA ZERO
    ///           BRZ END
    ///     END   HLT
    ///     ZERO  DAT
    /// ";
    /// let ast = parse_ast(src).unwrap();
    ///
    /// let sym = SymbolTable::new(&ast).unwrap();
    /// assert_eq!(sym.lookup_label("START"), Some(0));
    /// assert_eq!(sym.lookup_label("END"), Some(2));
    /// assert_eq!(sym.lookup_label("ZERO"), Some(3));
    /// assert_eq!(sym.lookup_label("zero"), None);
    /// ```
    pub fn new(stmts: &[Stmt]) -> Result<Self, AsmErr> {
        let mut label_map: HashMap<String, SymbolData> = HashMap::new();
        let mut line_map = BTreeMap::new();

        for (addr, stmt) in (0..).zip(stmts) {
            if addr >= MEM_SIZE {
                return Err(AsmErr::new(AsmErrKind::ProgramTooLarge, stmt.line, stmt.span.clone()));
            }

            if let Some(label) = &stmt.label {
                match label_map.entry(label.name.clone()) {
                    Entry::Occupied(e) => {
                        let span1 = e.get().span(e.key());
                        let span2 = label.span();
                        return Err(AsmErr::new(AsmErrKind::DuplicateLabel, stmt.line, [span1, span2]));
                    },
                    Entry::Vacant(e) => {
                        e.insert(SymbolData { addr, src_start: label.span().start });
                    }
                }
            }

            line_map.insert(stmt.line, addr);
        }

        tracing::debug!(statements = stmts.len(), labels = label_map.len(), "assembler pass 1 complete");
        Ok(SymbolTable { label_map, line_map })
    }

    /// Gets the memory address of a given label (if it exists).
    pub fn lookup_label(&self, label: &str) -> Option<u16> {
        self.label_map.get(label).map(|sym_data| sym_data.addr)
    }

    /// Gets the label at a given memory address (if it exists).
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::parse::parse_ast;
    /// use lmc_ensemble::asm::SymbolTable;
    ///
    /// let ast = parse_ast("A HLT\nHLT\nC HLT").unwrap();
    ///
    /// let sym = SymbolTable::new(&ast).unwrap();
    /// assert_eq!(sym.rev_lookup_label(0), Some("A"));
    /// assert_eq!(sym.rev_lookup_label(1), None);
    /// assert_eq!(sym.rev_lookup_label(2), Some("C"));
    /// ```
    pub fn rev_lookup_label(&self, addr: u16) -> Option<&str> {
        let (label, _) = self.label_map.iter()
            .find(|&(_, sym_data)| sym_data.addr == addr)?;

        Some(label)
    }

    /// Gets the source span of a given label (if it exists).
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::parse::parse_ast;
    /// use lmc_ensemble::asm::SymbolTable;
    ///
    /// let src = "HLT\nLOOPY BRA LOOPY";
    /// let ast = parse_ast(src).unwrap();
    ///
    /// let sym = SymbolTable::new(&ast).unwrap();
    /// assert_eq!(sym.get_label_source("LOOPY"), Some(4..9));
    /// assert_eq!(sym.get_label_source("LOOP_DE_LOOP"), None);
    /// ```
    pub fn get_label_source(&self, label: &str) -> Option<Range<usize>> {
        self.label_map.get(label)
            .map(|data| data.span(label))
    }

    /// Gets the address of a given source line (1-indexed).
    ///
    /// Lines without a statement (e.g., blank or comment-only lines) have no address.
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::parse::parse_ast;
    /// use lmc_ensemble::asm::SymbolTable;
    ///
    /// let src = "INP       // 1
    ///            // 2
    ///            OUT       // 3
    ///            HLT       // 4
    /// ";
    /// let ast = parse_ast(src).unwrap();
    ///
    /// let sym = SymbolTable::new(&ast).unwrap();
    /// assert_eq!(sym.lookup_line(1), Some(0));
    /// assert_eq!(sym.lookup_line(2), None);
    /// assert_eq!(sym.lookup_line(3), Some(1));
    /// assert_eq!(sym.lookup_line(4), Some(2));
    /// assert_eq!(sym.rev_lookup_line(1), Some(3));
    /// ```
    pub fn lookup_line(&self, line: usize) -> Option<u16> {
        self.line_map.get(&line).copied()
    }

    /// Gets the source line (1-indexed) of a given memory address (if it exists).
    pub fn rev_lookup_line(&self, addr: u16) -> Option<usize> {
        self.line_map.iter()
            .find(|&(_, &a)| a == addr)
            .map(|(&line, _)| line)
    }

    /// Gets an iterable of the mapping from labels to addresses.
    pub fn label_iter(&self) -> impl Iterator<Item=(&str, u16)> + '_ {
        self.label_map.iter()
            .map(|(label, sym_data)| (&**label, sym_data.addr))
    }

    /// Gets an iterable of the mapping from lines to addresses.
    pub fn line_iter(&self) -> impl Iterator<Item=(usize, u16)> + '_ {
        self.line_map.iter()
            .map(|(&line, &addr)| (line, addr))
    }
}

/// Resolves an operand into the value added to the mnemonic's base value.
fn resolve_operand(stmt: &Stmt, sym: &SymbolTable) -> Result<u16, AsmErr> {
    let invalid = |span: Range<usize>| AsmErr::new(AsmErrKind::InvalidOperand, stmt.line, span);
    let lookup = |label: &crate::ast::Label| {
        sym.lookup_label(&label.name)
            .ok_or_else(|| AsmErr::new(AsmErrKind::UndefinedLabel, stmt.line, label.span()))
    };

    match (stmt.mnemonic.def().operand, &stmt.operand) {
        (OperandKind::None, None) => Ok(0),
        (OperandKind::None, Some(Operand::Label(l))) => Err(invalid(l.span())),
        (OperandKind::None, Some(Operand::Literal(_))) => Err(invalid(stmt.span.clone())),

        (OperandKind::Address, None) => Err(invalid(stmt.span.clone())),
        (OperandKind::Address, Some(Operand::Literal(n))) => match u16::try_from(*n) {
            Ok(addr) if addr < MEM_SIZE => Ok(addr),
            _ => Err(invalid(stmt.span.clone())),
        },
        (OperandKind::Address, Some(Operand::Label(l))) => lookup(l),

        (OperandKind::Data, None) => Ok(0),
        (OperandKind::Data, Some(Operand::Literal(n))) => match (-999..=999).contains(n) {
            true  => Ok(Word::new_wrapping(*n).get()),
            false => Err(invalid(stmt.span.clone())),
        },
        (OperandKind::Data, Some(Operand::Label(l))) => lookup(l),
    }
}

/// A machine image.
///
/// This is the final product after assembly source code is fully assembled.
/// It holds the contents of all 100 mailboxes (unused mailboxes are 0),
/// and can be loaded in the simulator to run the assembled code.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MachineImage {
    /// The contents of memory.
    mem: Memory,

    /// The number of mailboxes occupied by the program.
    len: u16,

    /// Debug symbols.
    #[cfg_attr(feature = "serde", serde(skip))]
    sym: Option<SymbolTable>
}
impl MachineImage {
    /// Creates an empty machine image (all mailboxes are 0).
    pub fn empty() -> Self {
        MachineImage { mem: Memory::new(), len: 0, sym: None }
    }

    /// Creates a new machine image from an assembly AST and a symbol table.
    ///
    /// This performs the second assembler pass.
    fn new(ast: Vec<Stmt>, sym: SymbolTable, debug: bool) -> Result<Self, AsmErr> {
        let mut mem = Memory::new();
        let mut len = 0;

        for (addr, stmt) in (0..).zip(&ast) {
            // Pass 1 checks that the program fits.
            let Some(cell) = mem.get_mut(addr) else {
                return Err(AsmErr::new(AsmErrKind::ProgramTooLarge, stmt.line, stmt.span.clone()));
            };

            let value = stmt.mnemonic.def().base + resolve_operand(stmt, &sym)?;
            *cell = Word::new(value)
                .unwrap_or_else(|| unreachable!("{} at line {} composed out-of-range word {value}", stmt.mnemonic, stmt.line));
            len = addr + 1;
        }

        tracing::debug!(words = len, "assembler pass 2 complete");
        Ok(Self {
            mem,
            len,
            sym: debug.then_some(sym),
        })
    }

    /// Creates a machine image out of a list of raw words, starting at mailbox 0.
    ///
    /// This returns `None` if there are more than 100 words, or if any word is larger than 999.
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::asm::MachineImage;
    ///
    /// let image = MachineImage::from_words(&[901, 902, 0]).unwrap();
    /// assert_eq!(image.len(), 3);
    ///
    /// assert!(MachineImage::from_words(&[1000]).is_none());
    /// assert!(MachineImage::from_words(&[0; 101]).is_none());
    /// ```
    pub fn from_words(words: &[u16]) -> Option<Self> {
        let len = u16::try_from(words.len()).ok()
            .filter(|&len| len <= MEM_SIZE)?;

        let mut mem = Memory::new();
        for (addr, &w) in (0..).zip(words) {
            *mem.get_mut(addr)? = Word::new(w)?;
        }
        Some(MachineImage { mem, len, sym: None })
    }

    /// Gets the raw values of all 100 mailboxes.
    pub fn words(&self) -> [u16; MEM_SIZE as usize] {
        self.mem.values()
    }
    /// Gets the memory of this image.
    pub fn memory(&self) -> &Memory {
        &self.mem
    }
    /// Gets the word at the given mailbox, returning `None` if the address is out of range.
    pub fn get(&self, addr: u16) -> Option<Word> {
        self.mem.get(addr)
    }
    /// The number of mailboxes occupied by the program.
    ///
    /// Every mailbox at or past this address is 0.
    pub fn len(&self) -> u16 {
        self.len
    }
    /// Whether this image occupies no mailboxes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    /// Gets the symbol table if it is present in the machine image.
    pub fn symbol_table(&self) -> Option<&SymbolTable> {
        self.sym.as_ref()
    }
}
impl Default for MachineImage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Converts a machine image back into assembly source code.
///
/// One line is emitted per mailbox, up to and including the last non-zero mailbox.
/// A word is written as an instruction if re-encoding that instruction reproduces the word,
/// and as a `DAT` otherwise. Labels and comments are not recovered,
/// but reassembling the output results in the same memory.
///
/// ## Example
/// ```
/// use lmc_ensemble::asm::{assemble_src, disassemble};
///
/// let image = assemble_src("
///     LOOP INP
///          BRZ END
///          OUT
///          BRA LOOP
///     END  HLT
///     X    DAT 450
/// ").unwrap();
///
/// assert_eq!(disassemble(&image), "INP\nBRZ 4\nOUT\nBRA 0\nHLT\nDAT 450\n");
/// ```
pub fn disassemble(image: &MachineImage) -> String {
    let words = image.words();
    let end = words.iter().rposition(|&w| w != 0).map_or(0, |i| i + 1);

    words[..end].iter()
        .map(|&w| match Instr::decode(w) {
            Some(instr) if instr.encode() == w => format!("{instr}\n"),
            _ => format!("DAT {w}\n"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::ast::{Operand, OperandKind, Stmt};
    use crate::err::ErrSpan;
    use crate::parse::parse_ast;

    use super::{assemble_debug, assemble_src, disassemble, AsmErr, AsmErrKind, MachineImage};

    fn assert_asm_fail<T: std::fmt::Debug>(r: Result<T, AsmErr>, kind: AsmErrKind) {
        assert_eq!(r.unwrap_err().kind, kind);
    }

    /// Assembles in a single pass, where labels can only be used once they are defined.
    fn assemble_single_pass(ast: &[Stmt]) -> Result<Vec<u16>, String> {
        let mut labels = HashMap::new();
        let mut words = vec![];
        for (addr, stmt) in (0u16..).zip(ast) {
            if let Some(l) = &stmt.label {
                labels.insert(l.name.clone(), addr);
            }
            let def = stmt.mnemonic.def();
            let operand = match (&stmt.operand, def.operand) {
                (None, _) => 0,
                (Some(Operand::Literal(n)), OperandKind::Data) => n.rem_euclid(1000) as u16,
                (Some(Operand::Literal(n)), _) => *n as u16,
                (Some(Operand::Label(l)), _) => *labels.get(&l.name)
                    .ok_or_else(|| format!("{} not yet defined", l.name))?,
            };
            words.push(def.base + operand);
        }
        Ok(words)
    }

    #[test]
    fn test_sym_basic() {
        let src = "
            A    LDA X
                 ADD Y
            C    STA Z
                 OUT
                 HLT
            X    DAT 1
            Y    DAT 2
            Z    DAT
        ";

        let image = assemble_debug(parse_ast(src).unwrap()).unwrap();
        let sym = image.symbol_table().unwrap();
        assert_eq!(sym.lookup_label("A"), Some(0));
        assert_eq!(sym.lookup_label("C"), Some(2));
        assert_eq!(sym.lookup_label("X"), Some(5));
        assert_eq!(sym.lookup_label("Y"), Some(6));
        assert_eq!(sym.lookup_label("Z"), Some(7));
        assert_eq!(sym.label_iter().count(), 5);
        assert_eq!(&image.words()[..8], &[505, 106, 307, 902, 0, 1, 2, 0]);
        assert_eq!(image.len(), 8);
    }

    #[test]
    fn test_encodings() {
        let src = "
            ADD 1
            SUB 2
            STA 3
            LDA 4
            BRA 5
            BRZ 6
            BRP 99
            INP
            OUT
            HLT
            DAT 999
            DAT
        ";
        let image = assemble_src(src).unwrap();
        assert_eq!(
            &image.words()[..12],
            &[101, 202, 303, 504, 605, 706, 899, 901, 902, 0, 999, 0]
        );
        assert!(image.words()[12..].iter().all(|&w| w == 0));
    }

    #[test]
    fn test_dat_extensions() {
        let image = assemble_src("DAT -1\nDAT -999\nDAT -0\nP DAT P\nDAT Q\nQ HLT").unwrap();
        assert_eq!(&image.words()[..6], &[999, 1, 0, 3, 5, 0]);
    }

    #[test]
    fn test_forward_reference() {
        let src = "
                  LDA ONE
                  BRA SKIP
                  HLT
            SKIP  OUT
                  HLT
            ONE   DAT 1
        ";
        let ast = parse_ast(src).unwrap();

        // A single pass cannot resolve labels defined after their use...
        assert!(assemble_single_pass(&ast).is_err());

        // ...but two passes can.
        let image = assemble_src(src).unwrap();
        assert_eq!(&image.words()[..6], &[505, 603, 0, 902, 0, 1]);

        // If every label is defined before use, both agree.
        let src = "
            ONE   DAT 1
            TOP   LDA ONE
                  BRZ TOP
                  HLT
        ";
        let ast = parse_ast(src).unwrap();
        let single = assemble_single_pass(&ast).unwrap();
        let image = assemble_src(src).unwrap();
        assert_eq!(&image.words()[..single.len()], &*single);
    }

    #[test]
    fn test_duplicate_label() {
        let r = assemble_src("A HLT\nB HLT\nA DAT 1");
        let err = r.unwrap_err();
        assert_eq!(err.kind, AsmErrKind::DuplicateLabel);
        assert_eq!(err.line, 3);
        assert_eq!(err.span, ErrSpan::Two([0..1, 12..13]));

        // Labels are case-sensitive.
        assemble_src("a HLT\nA HLT").unwrap();
    }

    #[test]
    fn test_undefined_label() {
        let err = assemble_src("LDA X\nBRA LOOP").unwrap_err();
        assert_eq!(err.kind, AsmErrKind::UndefinedLabel);
        assert_eq!(err.line, 1);
        assert_eq!(err.span, ErrSpan::One(4..5));

        assert_asm_fail(assemble_src("X HLT\nLDA x"), AsmErrKind::UndefinedLabel);
        assert_asm_fail(assemble_src("DAT NOWHERE"), AsmErrKind::UndefinedLabel);
    }

    #[test]
    fn test_invalid_operand() {
        // out of range addresses
        assert_asm_fail(assemble_src("LDA 100"), AsmErrKind::InvalidOperand);
        assert_asm_fail(assemble_src("BRA -1"), AsmErrKind::InvalidOperand);
        // missing address
        assert_asm_fail(assemble_src("ADD"), AsmErrKind::InvalidOperand);
        // forbidden operand
        assert_asm_fail(assemble_src("HLT 5"), AsmErrKind::InvalidOperand);
        assert_asm_fail(assemble_src("X OUT X"), AsmErrKind::InvalidOperand);
        // out of range data
        assert_asm_fail(assemble_src("DAT 1000"), AsmErrKind::InvalidOperand);
        assert_asm_fail(assemble_src("DAT -1000"), AsmErrKind::InvalidOperand);
        // literals too large for any word
        assert_asm_fail(assemble_src("LDA 70000"), AsmErrKind::InvalidOperand);
        assert_asm_fail(assemble_src("DAT 70000"), AsmErrKind::InvalidOperand);
        assert_asm_fail(assemble_src("BRA -40000"), AsmErrKind::InvalidOperand);
        assert_asm_fail(assemble_src("DAT 99999999999999999999"), AsmErrKind::InvalidOperand);

        // bounds are fine
        assemble_src("LDA 0\nLDA 99\nDAT 999\nDAT -999").unwrap();
    }

    #[test]
    fn test_lex_errors() {
        use std::collections::HashSet;

        use crate::err::LexErr;

        let kinds: HashSet<_> = ["LDA 3Q", "DAT -", "HLT $", "LDA 3Q"].into_iter()
            .map(|src| assemble_src(src).unwrap_err().kind)
            .collect();

        assert_eq!(kinds, HashSet::from([
            AsmErrKind::Lex(LexErr::InvalidNumeric),
            AsmErrKind::Lex(LexErr::InvalidDecEmpty),
            AsmErrKind::Lex(LexErr::InvalidSymbol),
        ]));
    }

    #[test]
    fn test_program_size() {
        let full = "HLT\n".repeat(100);
        let image = assemble_src(&full).unwrap();
        assert_eq!(image.len(), 100);

        let over = "HLT\n".repeat(101);
        let err = assemble_src(&over).unwrap_err();
        assert_eq!(err.kind, AsmErrKind::ProgramTooLarge);
        assert_eq!(err.line, 101);

        // blank and comment lines don't take up space
        let padded = "// comment\n\n".repeat(50) + &full;
        assemble_src(&padded).unwrap();
    }

    #[test]
    fn test_empty() {
        let image = assemble_src("").unwrap();
        assert!(image.is_empty());
        assert_eq!(image, MachineImage::empty());
        assert_eq!(disassemble(&image), "");
    }

    #[test]
    fn test_disassemble_roundtrip() {
        let src = "
                  INP
                  STA COUNT
            LOOP  LDA COUNT
                  OUT
                  SUB ONE
                  STA COUNT
                  BRP LOOP
                  HLT
            ONE   DAT 1
            COUNT DAT
            ODD   DAT 403
            BIG   DAT 999
            NEG   DAT -250
        ";
        let image = assemble_src(src).unwrap();
        let dis = disassemble(&image);
        let image2 = assemble_src(&dis).unwrap();
        assert_eq!(image.words(), image2.words(), "disassembly:\n{dis}");

        // every possible word survives a round trip
        let words: Vec<_> = (0..100).map(|i| i * 10 + 3).collect();
        let image = MachineImage::from_words(&words).unwrap();
        let image2 = assemble_src(&disassemble(&image)).unwrap();
        assert_eq!(image.words(), image2.words());

        let words: Vec<_> = (900..1000).collect();
        let image = MachineImage::from_words(&words).unwrap();
        let image2 = assemble_src(&disassemble(&image)).unwrap();
        assert_eq!(image.words(), image2.words());
    }

    #[test]
    fn test_disassemble_text() {
        let image = MachineImage::from_words(&[901, 450, 12, 0, 0, 999, 0]).unwrap();
        assert_eq!(disassemble(&image), "INP\nDAT 450\nDAT 12\nHLT\nHLT\nDAT 999\n");
    }
}
