// This module defines error types for the table generator using the thiserror
// crate for idiomatic Rust error handling. TableGenError is the main error
// enum covering the failure scenarios of the pipeline: record text that does
// not parse, record entries whose fields do not match the expected shape for
// their descriptor type, duplicate opcodes within a non-mask section or an
// instruction set, capability or operand references that do not resolve to an
// existing descriptor, storage classes that break the per-environment
// address-space bijection, and driver I/O. Every kind is detected before any
// output is produced; the emitted artifact is all-or-nothing. The module also
// provides TableGenResult<T> as a convenience alias.

//! Error types for the table generator.
//!
//! Using thiserror for more idiomatic error handling.

use crate::grammar::{InstructionSet, Section, TargetEnv};
use thiserror::Error;

/// Main error type for table compilation.
#[derive(Error, Debug)]
pub enum TableGenError {
    #[error("grammar parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("malformed grammar entry `{entry}`: {reason}")]
    MalformedEntry { entry: String, reason: String },

    #[error("duplicate enum value {opcode} in section {section}")]
    DuplicateEnumValue { section: Section, opcode: u32 },

    #[error("duplicate opcode ({opcode}, {opcode2}) in {set} instruction set")]
    DuplicateInstruction {
        set: InstructionSet,
        opcode: u32,
        opcode2: u32,
    },

    #[error("unresolved capability reference `{name}`")]
    UnresolvedCapability { name: String },

    #[error("unresolved operand reference `{name}`")]
    UnresolvedOperand { name: String },

    #[error("storage classes {first} and {second} both map to {env} address space {space}")]
    DuplicateAddressSpace {
        env: TargetEnv,
        space: u32,
        first: u32,
        second: u32,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for table generation operations.
pub type TableGenResult<T> = Result<T, TableGenError>;
