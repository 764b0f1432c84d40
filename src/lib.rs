//! spirv-tablegen - SPIR-V instruction table compilation.
//!
//! This crate compiles a declarative description of the SPIR-V
//! instruction-set grammar into compact, queryable Rust lookup tables for a
//! compiler backend: per-section enumerations, capability lookups,
//! followed-literal lookups, binary-searchable instruction tables, and
//! storage-class/address-space correspondence tables.
//!
//! # Primary Usage
//!
//! ```ignore
//! use bumpalo::Bump;
//! use spirv_tablegen::GrammarSession;
//!
//! let arena = Bump::new();
//! let session = GrammarSession::new(&arena);
//! let artifact = spirv_tablegen::compile(&grammar_text, &session)?;
//! ```
//!
//! # Architecture
//!
//! - [`records`] - The record-store collaborator: typed grammar entries and
//!   their text parser.
//! - [`grammar`] - The descriptor data model (operands, enum values,
//!   instructions, sections).
//! - [`populate`] - Record store to raw descriptor marshalling.
//! - [`tables`] - The table builder: validation, canonical ordering and
//!   cross-reference resolution.
//! - [`emit`] - The table emitter producing the generated source artifact.
//! - [`core`] - Shared infrastructure (errors, arena session).

pub mod core;
pub mod emit;
pub mod grammar;
pub mod populate;
pub mod records;
pub mod tables;

// Re-export common types from organized modules
pub use crate::core::{GrammarSession, SessionStats, TableGenError, TableGenResult};
pub use crate::grammar::{
    CapabilitySet, EnumValue, Instruction, InstructionClass, InstructionSet, Operand, OperandKind,
    Section, TargetEnv,
};
pub use crate::tables::{GrammarTables, TableBuilder};

/// Run the full pipeline: parse grammar text, populate descriptors, build
/// the tables, emit the artifact. Any failure aborts before emission; the
/// returned artifact is complete or absent.
pub fn compile<'arena>(
    text: &str,
    session: &GrammarSession<'arena>,
) -> TableGenResult<String> {
    let store = records::parse_records(text)?;
    let raw = populate::populate(&store, session)?;
    let tables = TableBuilder::build(raw)?;
    Ok(emit::generate(&tables))
}
