// This module provides arena-based session management for one table
// generation run using the bumpalo crate. GrammarSession owns a reference to
// the arena allocator; every descriptor name parsed out of the record store
// is interned here so that descriptors carry plain &str references with the
// session lifetime instead of owned strings, eliminating clone churn across
// the populate/build/emit pipeline. The session also tracks run statistics
// (operands, enum values per section, instructions) which the driver logs
// after a successful run. All interned data lives until the arena is dropped
// at the end of the batch pass; there is no reset or reuse across runs.

//! Arena-based grammar session management.
//!
//! All descriptor names are tied to the session lifetime, eliminating
//! complex lifetime propagation through the pipeline.

use bumpalo::Bump;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use crate::grammar::Section;

/// Arena-backed state for one table generation run.
pub struct GrammarSession<'arena> {
    /// Arena allocator for interned names.
    arena: &'arena Bump,

    /// String interning for efficient storage.
    interned_strings: RefCell<HashMap<String, &'arena str>>,

    /// Run statistics for debugging.
    stats: RefCell<SessionStats>,
}

impl<'arena> GrammarSession<'arena> {
    /// Create a new session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            interned_strings: RefCell::new(HashMap::new()),
            stats: RefCell::new(SessionStats::default()),
        }
    }

    /// Get access to the arena allocator.
    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    /// Intern a string in the arena.
    pub fn intern_str(&self, s: &str) -> &'arena str {
        let mut strings = self.interned_strings.borrow_mut();
        if let Some(&interned) = strings.get(s) {
            return interned;
        }

        let interned = self.arena.alloc_str(s);
        strings.insert(s.to_string(), interned);
        interned
    }

    /// Record that an operand descriptor was read.
    pub fn record_operand(&self) {
        self.stats.borrow_mut().operands_read += 1;
    }

    /// Record that an enum value descriptor was read.
    pub fn record_enum_value(&self, section: Section) {
        let mut stats = self.stats.borrow_mut();
        stats.enum_values_read += 1;
        *stats
            .section_counts
            .entry(section.name().to_string())
            .or_insert(0) += 1;
    }

    /// Record that an instruction descriptor was read.
    pub fn record_instruction(&self) {
        self.stats.borrow_mut().instructions_read += 1;
    }

    /// Get run statistics.
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }
}

/// Statistics for one table generation run.
#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    /// Operand descriptors read from the record store.
    pub operands_read: usize,

    /// Enum value descriptors read from the record store.
    pub enum_values_read: usize,

    /// Instruction descriptors read from the record store.
    pub instructions_read: usize,

    /// Enum values per section.
    pub section_counts: HashMap<String, usize>,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grammar Session Statistics:")?;
        writeln!(f, "  Operands read: {}", self.operands_read)?;
        writeln!(f, "  Enum values read: {}", self.enum_values_read)?;
        writeln!(f, "  Instructions read: {}", self.instructions_read)?;

        if !self.section_counts.is_empty() {
            writeln!(f, "  Section breakdown:")?;
            let mut sorted: Vec<_> = self.section_counts.iter().collect();
            sorted.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

            for (section, count) in sorted.into_iter().take(10) {
                writeln!(f, "    {}: {}", section, count)?;
            }
        }

        Ok(())
    }
}
