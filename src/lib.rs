//! # vmasm
//!
//! Assembler for a small stack VM. Source text declares a typed constant
//! pool, then lists instructions:
//!
//! ```text
//! const 1
//! M "run" I 0 0
//! run: noop stop
//! ```
//!
//! The output module is the magic number, a one-byte pool count, the pool
//! entries and the fixed-width instruction bytes. A `name:` label does not
//! produce code; it appends the current instruction index to the pool entry of
//! method `name`.

pub mod assembler;
pub mod disasm;
pub mod emit;
pub mod error;
pub mod lexer;
pub mod module;
pub mod opcode;
pub mod pool;
pub mod token;
pub mod types;

pub use assembler::Assembler;
pub use error::{AsmError, Result};
pub use module::{MAGIC_NUMBER, Module, ModuleHeader};
pub use opcode::Opcode;
pub use types::VmType;
