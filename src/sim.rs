//! Simulating and execution for LMC machine images.
//!
//! This module is focused on executing fully assembled code (i.e., [`MachineImage`]).
//!
//! This module consists of:
//! - [`Simulator`]: The struct that simulates assembled code.
//! - [`run`]: A function which runs a machine image against a fixed input to completion.
//! - [`mem`]: The module handling memory and words.
//! - [`io`]: The module handling simulator IO (`INP` and `OUT`).
//! - [`debug`]: The module handling types of breakpoints for the simulator.
//!
//! # Usage
//!
//! To simulate some code, you need to instantiate a Simulator and load a machine image to it:
//!
//! ```
//! use lmc_ensemble::asm::assemble_src;
//! use lmc_ensemble::sim::Simulator;
//!
//! let image = assemble_src("HLT").unwrap();
//! let mut simulator = Simulator::new(Default::default());
//! simulator.load_image(&image);
//! simulator.run().unwrap();
//! assert!(simulator.hit_halt());
//! ```
//!
//! ## Flags
//!
//! Here, we define `simulator` to have the default flags.
//! We could also configure the simulator by editing the flags. For example,
//! if we wish to stop runaway programs, we can edit the flags like so:
//!
//! ```
//! # use lmc_ensemble::sim::{Simulator, SimFlags};
//! let mut simulator = Simulator::new(SimFlags { max_steps: Some(10_000), ..Default::default() });
//! ```
//!
//! All of the available flags can be found in [`SimFlags`].
//!
//! ## Execution
//!
//! Beyond the basic [`Simulator::run`] (which runs until halting),
//! there are also:
//! - [`Simulator::step_in`]: manual step-by-step simulation
//! - [`Simulator::run_while`], [`Simulator::run_with_limit`]: more advanced programmatic execution
//!
//! ```
//! use lmc_ensemble::asm::assemble_src;
//! use lmc_ensemble::sim::Simulator;
//!
//! let src = "
//!     LDA ONE
//!     ADD ONE
//!     ADD ONE
//!     HLT
//!     ONE DAT 1
//! ";
//! let image = assemble_src(src).unwrap();
//!
//! let mut sim = Simulator::new(Default::default());
//! sim.load_image(&image);
//!
//! // Running step by step:
//! sim.step_in().unwrap();
//! assert_eq!(sim.acc.get(), 1);
//! sim.step_in().unwrap();
//! assert_eq!(sim.acc.get(), 2);
//! sim.step_in().unwrap();
//! assert_eq!(sim.acc.get(), 3);
//! assert_eq!(sim.pc, 3);
//! ```
//!
//! ## Querying State
//!
//! The program counter, accumulator, and memory are all public fields of the [`Simulator`]
//! (`sim.pc`, `sim.acc`, and `sim.mem`), and can be read or set directly.
//! The machine's execution state (running, halted, or faulted) can be read with [`Simulator::state`].

pub mod mem;
pub mod io;
pub mod debug;

use std::collections::HashSet;

use crate::asm::MachineImage;
use crate::ast::Instr;
use debug::Breakpoint;

use self::io::{BufferedIO, IODevice, SimIO};
use self::mem::{Memory, Word};

/// Kinds of errors that can occur during simulation.
///
/// See [`SimErr`] for this error type with machine context included.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum SimErrKind {
    /// The PC left the memory (`0..=99`) without a `HLT` having been executed.
    AddressOutOfRange,
    /// `INP` was executed, but there was no more input.
    InputExhausted,
    /// The configured maximum number of steps was executed without halting.
    StepLimitExceeded,
    /// A word which is not a valid instruction was executed.
    IllegalOpcode,
}
impl std::fmt::Display for SimErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimErrKind::AddressOutOfRange => f.write_str("program counter left memory"),
            SimErrKind::InputExhausted    => f.write_str("input was exhausted"),
            SimErrKind::StepLimitExceeded => f.write_str("step limit exceeded"),
            SimErrKind::IllegalOpcode     => f.write_str("simulator executed illegal opcode"),
        }
    }
}

/// Errors that can occur during simulation.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct SimErr {
    /// The kind of error.
    pub kind: SimErrKind,
    /// The PC of the instruction that caused the error.
    pub pc: u16,
    /// The word at the PC, if the PC is in memory.
    pub word: Option<u16>,
}
impl std::fmt::Display for SimErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (PC = {:02}", self.kind, self.pc)?;
        if let Some(word) = self.word {
            write!(f, ", word = {word:03}")?;
        }
        f.write_str(")")
    }
}
impl std::error::Error for SimErr {}
impl crate::err::Error for SimErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self.kind {
            SimErrKind::AddressOutOfRange => Some("the program ran past mailbox 99; end the program with a HLT".into()),
            SimErrKind::InputExhausted    => Some("provide another input value for this INP".into()),
            SimErrKind::StepLimitExceeded => Some("the program may be in an infinite loop; check its branches or raise `max_steps`".into()),
            SimErrKind::IllegalOpcode     => Some("data words should not be executed; check that the program halts before reaching its DAT words".into()),
        }
    }
}

/// Anything that can cause a step to abruptly fail to finish.
enum StepBreak {
    /// A HLT was executed.
    Halt,
    /// A simulation error occurred.
    Err(SimErr),
}
impl From<SimErr> for StepBreak {
    fn from(value: SimErr) -> Self {
        Self::Err(value)
    }
}

/// Reason for why execution paused if it wasn't due to an error.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
enum PauseCondition {
    /// Program reached a halt.
    Halt,
    /// Program hit a breakpoint.
    Breakpoint,
    /// Program hit a tripwire condition.
    Tripwire,
    /// Program hit an error and did not pause successfully.
    #[default]
    Unsuccessful
}

/// How `BRP` decides whether the accumulator is "positive".
///
/// The accumulator is an unsigned three-digit value, so "positive" needs an interpretation.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum BrpMode {
    /// `BRP` branches when the accumulator is in `0..=499`.
    ///
    /// The upper half of the range (`500..=999`) is treated as negative,
    /// as in ten's complement.
    #[default]
    HalfRange,
    /// `BRP` branches unless the last `SUB` went below zero before wrapping.
    ///
    /// `ADD`, `LDA`, and `INP` clear this negative flag.
    NegativeFlag,
}

/// Configuration flags for [`Simulator`].
///
/// These can be modified after the `Simulator` is created with [`Simulator::new`]
/// and their effects should still apply.
///
/// Read the field descriptions for more details.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SimFlags {
    /// The maximum number of instructions to execute before faulting with
    /// [`SimErrKind::StepLimitExceeded`].
    ///
    /// This counts every instruction run since the last reset (see [`Simulator::instructions_run`]).
    ///
    /// By default, this flag is `None` (there is no limit).
    pub max_steps: Option<u64>,

    /// How `BRP` decides whether to branch.
    ///
    /// By default, this flag is [`BrpMode::HalfRange`].
    pub brp: BrpMode,
}

#[allow(clippy::derivable_impls)]
impl Default for SimFlags {
    fn default() -> Self {
        Self {
            max_steps: None,
            brp: BrpMode::default(),
        }
    }
}

/// The execution state of the machine.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub enum MachineState {
    /// The machine can execute more instructions.
    #[default]
    Running,
    /// The machine executed a `HLT`.
    Halted,
    /// The machine hit an error. Executing any further returns this error.
    Faulted(SimErr),
}

/// Executes assembled code.
#[derive(Debug)]
pub struct Simulator {
    // ------------------ SIMULATION STATE ------------------
    // Calling [`Simulator::reset`] resets these values.

    /// The simulator's memory.
    pub mem: Memory,

    /// The accumulator.
    pub acc: Word,

    /// The program counter.
    pub pc: u16,

    /// Whether the last `SUB` went below zero. See [`BrpMode::NegativeFlag`].
    negative: bool,

    /// Whether the machine is running, halted, or faulted.
    state: MachineState,

    /// The number of instructions successfully run since this `Simulator` was initialized.
    ///
    /// This can be set to 0 to reset the counter.
    pub instructions_run: u64,

    /// Indicates the reason why the last execution (via [`Simulator::run_while`] and adjacent)
    /// had paused.
    pause_condition: PauseCondition,

    // ------------------ CONFIG/DEBUG STATE ------------------
    // Calling [`Simulator::reset`] does not reset these values.

    /// Configuration settings for the simulator.
    ///
    /// These are preserved between resets.
    ///
    /// See [`SimFlags`] for more details on what configuration
    /// settings are available.
    pub flags: SimFlags,

    /// Breakpoints for the simulator.
    pub breakpoints: HashSet<Breakpoint>,

    /// The IO device `INP` and `OUT` use.
    pub io: SimIO
}
impl Simulator where Simulator: Send + Sync {}

impl Simulator {
    /// Creates a new simulator with empty memory and no IO.
    pub fn new(flags: SimFlags) -> Self {
        Self {
            mem: Memory::new(),
            acc: Word::ZERO,
            pc: 0,
            negative: false,
            state: MachineState::Running,
            instructions_run: 0,
            pause_condition: Default::default(),

            flags,
            breakpoints: Default::default(),
            io: Default::default(),
        }
    }

    /// Resets the simulator.
    ///
    /// This resets the state of the `Simulator` back to before any execution calls,
    /// while preserving configuration and debug state.
    ///
    /// Note that this function preserves:
    /// - Flags
    /// - Breakpoints
    /// - IO (however, note that it does not reset IO state, which must be manually reset)
    ///
    /// This also clears memory. Any machine image has to be reloaded into the Simulator.
    pub fn reset(&mut self) {
        let flags = self.flags;
        let breakpoints = std::mem::take(&mut self.breakpoints);
        let io = std::mem::take(&mut self.io);

        *self = Simulator::new(flags);
        self.breakpoints = breakpoints;
        self.io = io;
    }

    /// Loads a machine image into this simulator.
    ///
    /// This resets the simulator (see [`Simulator::reset`]) and then copies the image into memory,
    /// so execution starts from PC 0 with an accumulator of 0.
    pub fn load_image(&mut self, image: &MachineImage) {
        self.reset();
        self.mem = image.memory().clone();
    }

    /// The execution state of the machine.
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Indicates whether the last execution of the simulator hit a breakpoint.
    pub fn hit_breakpoint(&self) -> bool {
        matches!(self.pause_condition, PauseCondition::Breakpoint)
    }

    /// Indicates whether the last execution of the simulator resulted in a HLT successfully occurring.
    pub fn hit_halt(&self) -> bool {
        matches!(self.pause_condition, PauseCondition::Halt)
    }

    /// Runs until the tripwire condition returns false (or any of the typical breaks occur).
    ///
    /// The typical break conditions are:
    /// - `HLT` is executed
    /// - A breakpoint matches
    /// - An error occurs
    pub fn run_while(&mut self, mut tripwire: impl FnMut(&mut Simulator) -> bool) -> Result<(), SimErr> {
        std::mem::take(&mut self.pause_condition);

        // event loop
        // run until:
        // 1. the tripwire condition returns false
        // 2. a HLT is executed
        // 3. any of the breakpoints are hit
        let result = loop {
            // Tripwire turned off:
            if !tripwire(self) {
                break Ok(PauseCondition::Tripwire);
            }

            // Run a step:
            match self.step() {
                Ok(_) => {},
                Err(StepBreak::Halt) => break Ok(PauseCondition::Halt),
                Err(StepBreak::Err(e)) => break Err(e)
            }

            // After executing, check that any breakpoints were hit.
            if self.breakpoints.iter().any(|bp| bp.check(self)) {
                break Ok(PauseCondition::Breakpoint);
            }
        };

        self.pause_condition = result?;
        Ok(())
    }

    /// Execute the program.
    ///
    /// This blocks until the program ends.
    /// If you would like to limit the maximum number of steps to execute, consider [`Simulator::run_with_limit`]
    /// or [`SimFlags::max_steps`].
    pub fn run(&mut self) -> Result<(), SimErr> {
        self.run_while(|_| true)
    }

    /// Execute the program with a limit on how many steps to execute.
    ///
    /// This blocks until the program ends or until the number of steps to execute has been hit.
    /// Unlike [`SimFlags::max_steps`], hitting this limit only pauses the simulator.
    pub fn run_with_limit(&mut self, max_steps: u64) -> Result<(), SimErr> {
        let i = self.instructions_run;
        self.run_while(|sim| sim.instructions_run.wrapping_sub(i) < max_steps)
    }

    /// Creates an error of the given kind at the current PC.
    fn fault(&self, kind: SimErrKind) -> SimErr {
        SimErr {
            kind,
            pc: self.pc,
            word: self.mem.get(self.pc).map(Word::get)
        }
    }

    /// Whether `BRP` should branch, according to [`SimFlags::brp`].
    fn is_positive(&self) -> bool {
        match self.flags.brp {
            BrpMode::HalfRange => self.acc.get() < 500,
            BrpMode::NegativeFlag => !self.negative,
        }
    }

    /// Simulate one step, executing one instruction.
    ///
    /// This does not update the machine state. That is done by [`Simulator::step`].
    fn _step_inner(&mut self) -> Result<(), StepBreak> {
        if self.flags.max_steps.is_some_and(|max| self.instructions_run >= max) {
            return Err(self.fault(SimErrKind::StepLimitExceeded).into());
        }

        let word = self.mem.get(self.pc)
            .ok_or_else(|| self.fault(SimErrKind::AddressOutOfRange))?
            .get();
        let instr = Instr::decode(word)
            .ok_or_else(|| self.fault(SimErrKind::IllegalOpcode))?;

        tracing::trace!(pc = self.pc, word, acc = self.acc.get(), "executing {instr}");

        // Operand addresses are always in 0..=99 after decoding, so indexing memory is fine.
        let mut next_pc = self.pc + 1;
        match instr {
            Instr::ADD(addr) => {
                self.acc += self.mem[addr];
                self.negative = false;
            },
            Instr::SUB(addr) => {
                let (result, negative) = self.acc.overflowing_sub(self.mem[addr]);
                self.acc = result;
                self.negative = negative;
            },
            Instr::STA(addr) => {
                self.mem[addr] = self.acc;
            },
            Instr::LDA(addr) => {
                self.acc = self.mem[addr];
                self.negative = false;
            },
            Instr::BRA(addr) => {
                next_pc = addr;
            },
            Instr::BRZ(addr) => if self.acc == Word::ZERO {
                next_pc = addr;
            },
            Instr::BRP(addr) => if self.is_positive() {
                next_pc = addr;
            },
            Instr::INP => {
                let value = self.io.read_input()
                    .ok_or_else(|| self.fault(SimErrKind::InputExhausted))?;
                self.acc = Word::new_wrapping(value);
                self.negative = false;
            },
            Instr::OUT => {
                if !self.io.write_output(self.acc.get()) {
                    tracing::warn!(pc = self.pc, acc = self.acc.get(), "output was not accepted by the IO device");
                }
            },
            Instr::HLT => {},
        }

        self.pc = next_pc;
        self.instructions_run = self.instructions_run.wrapping_add(1);

        match instr {
            Instr::HLT => Err(StepBreak::Halt),
            _ => Ok(())
        }
    }

    /// Simulate one step, executing one instruction and updating the machine state.
    ///
    /// If the machine is already halted or faulted, this does not execute anything,
    /// and instead returns the halt or the fault again.
    fn step(&mut self) -> Result<(), StepBreak> {
        match &self.state {
            MachineState::Running => {},
            MachineState::Halted => return Err(StepBreak::Halt),
            MachineState::Faulted(e) => return Err(StepBreak::Err(e.clone())),
        }

        let result = self._step_inner();
        match &result {
            Ok(()) => {},
            Err(StepBreak::Halt) => {
                tracing::debug!(pc = self.pc, acc = self.acc.get(), steps = self.instructions_run, "machine halted");
                self.state = MachineState::Halted;
            },
            Err(StepBreak::Err(e)) => {
                tracing::debug!(pc = e.pc, word = e.word, steps = self.instructions_run, "machine faulted: {}", e.kind);
                self.state = MachineState::Faulted(e.clone());
            },
        }
        result
    }

    /// Simulate one step, executing one instruction.
    ///
    /// Stepping a halted machine does nothing.
    /// Stepping a faulted machine returns its error again.
    pub fn step_in(&mut self) -> Result<(), SimErr> {
        match self.step() {
            Ok(()) => Ok(()),
            Err(StepBreak::Halt) => Ok(()),
            Err(StepBreak::Err(e)) => Err(e)
        }
    }
}
impl Default for Simulator {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

/// The final state of a machine which ran to completion with [`run`].
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunOutput {
    /// The final memory.
    pub memory: Memory,
    /// The final accumulator.
    pub accumulator: Word,
    /// Every value written by `OUT`, in order.
    pub output: Vec<u16>,
    /// The number of instructions executed (including the `HLT`).
    pub steps: u64,
}

/// Runs a machine image until it halts.
///
/// Input values are consumed by `INP` in order, and output values are collected in the order `OUT` produces them.
///
/// ## Example
/// ```
/// use lmc_ensemble::asm::assemble_src;
/// use lmc_ensemble::sim::{run, SimErrKind};
///
/// let image = assemble_src("INP\nOUT\nHLT").unwrap();
///
/// let result = run(&image, [7], Default::default()).unwrap();
/// assert_eq!(result.output, vec![7]);
/// assert_eq!(result.accumulator.get(), 7);
/// assert_eq!(result.steps, 3);
///
/// let err = run(&image, [], Default::default()).unwrap_err();
/// assert_eq!(err.kind, SimErrKind::InputExhausted);
/// assert_eq!(err.pc, 0);
/// ```
pub fn run(image: &MachineImage, input: impl IntoIterator<Item=i32>, flags: SimFlags) -> Result<RunOutput, SimErr> {
    let io = BufferedIO::with_input(input);

    let mut sim = Simulator::new(flags);
    sim.load_image(image);
    sim.io = io.clone().into();
    sim.run()?;

    let output = std::mem::take(&mut *io.get_output().write().unwrap_or_else(|e| e.into_inner()));
    Ok(RunOutput {
        memory: sim.mem,
        accumulator: sim.acc,
        output,
        steps: sim.instructions_run,
    })
}
