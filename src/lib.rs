//! A Little Man Computer (LMC) parser, assembler, and virtual machine.
//!
//! The LMC is a teaching computer with 100 decimal mailboxes, each holding a
//! value from 0 to 999, and a single accumulator.
//!
//! # Usage
//!
//! To convert LMC source code into a machine image, it must be parsed and assembled:
//! ```
//! use lmc_ensemble::parse::parse_ast;
//! use lmc_ensemble::asm::{assemble, MachineImage};
//!
//! let code = "
//!         INP
//!         ADD ONE
//!         OUT
//!         HLT
//!     ONE DAT 1
//! ";
//! let ast = parse_ast(code).unwrap();
//!
//! let image: MachineImage = assemble(ast).unwrap();
//! assert_eq!(&image.words()[..5], &[901, 104, 902, 0, 1]);
//! ```
//!
//! Once a machine image has been created, it can be executed with the simulator:
//! ```
//! # use lmc_ensemble::asm::assemble_src;
//! # let image = assemble_src("INP\nADD ONE\nOUT\nHLT\nONE DAT 1").unwrap();
//! use lmc_ensemble::sim::Simulator;
//! use lmc_ensemble::sim::io::BufferedIO;
//!
//! let io = BufferedIO::new();
//! io.get_input().write().unwrap().push_back(41);
//!
//! let mut simulator = Simulator::new(Default::default());
//! simulator.load_image(&image);
//! simulator.io = io.clone().into();
//! simulator.run().unwrap(); // <-- Result can be handled accordingly
//!
//! assert_eq!(&*io.get_output().read().unwrap(), &[42]);
//! ```
//!
//! If a program only needs to be run once against a fixed input, [`sim::run`] does all of the above:
//! ```
//! # use lmc_ensemble::asm::assemble_src;
//! # let image = assemble_src("INP\nADD ONE\nOUT\nHLT\nONE DAT 1").unwrap();
//! let result = lmc_ensemble::sim::run(&image, [41], Default::default()).unwrap();
//! assert_eq!(result.output, vec![42]);
//! assert_eq!(result.accumulator.get(), 42);
//! ```
//!
//! If more granularity is needed for simulation, there are also step and breakpoint functions.
//! See the [`sim`] module for more details.
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod asm;
pub mod sim;
pub mod err;
