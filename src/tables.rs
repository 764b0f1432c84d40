// This module implements the table builder: it takes the raw descriptor
// collections from population and produces the validated, sorted, fully
// cross-referenced model the emitter walks. Enum values are grouped per
// section and sorted ascending by opcode; non-mask sections reject duplicate
// opcodes. The Capabilities section is built first so that every capability
// name on enum values and instructions can be resolved against it; a missing
// name aborts the run. Followed-operand and instruction-operand references
// resolve against the operand descriptors read at population. Instructions
// are grouped per set and sorted by (opcode, opcode2) with duplicate pairs
// rejected; that order is what makes the emitted tables binary-searchable.
// StorageClass address-space claims are checked to form a partial bijection
// per target environment. The result, GrammarTables, is immutable for the
// remainder of the run.

//! Table builder: validation, canonical ordering and cross-reference
//! resolution over the populated grammar.

use hashbrown::HashMap;

use crate::core::{TableGenError, TableGenResult};
use crate::grammar::{
    CapabilityShape, CapabilitySet, EnumValue, Instruction, InstructionSet, Operand, Section,
    TargetEnv,
};
use crate::populate::{RawEnumValue, RawGrammar, RawInstruction};

/// The validated, sorted grammar model. Read-only after build.
#[derive(Debug)]
pub struct GrammarTables<'a> {
    sections: [Vec<EnumValue<'a>>; Section::SLOTS],
    instructions: [Vec<Instruction<'a>>; InstructionSet::COUNT],
    capability_names: HashMap<u32, &'a str>,
}

impl<'a> GrammarTables<'a> {
    /// Values of one section, ascending by opcode.
    pub fn section(&self, section: Section) -> &[EnumValue<'a>] {
        &self.sections[section.index()]
    }

    /// Instructions of one set, ascending by (opcode, opcode2).
    pub fn instructions(&self, set: InstructionSet) -> &[Instruction<'a>] {
        &self.instructions[set.index()]
    }

    /// Binary search for a value by opcode. For mask sections, where
    /// duplicate opcodes are legal, this returns the first match.
    pub fn lookup_enum(&self, section: Section, opcode: u32) -> Option<&EnumValue<'a>> {
        let values = self.section(section);
        let idx = values.partition_point(|v| v.opcode < opcode);
        values.get(idx).filter(|v| v.opcode == opcode)
    }

    /// Binary search for an instruction by opcode pair.
    pub fn lookup_instruction(
        &self,
        set: InstructionSet,
        opcode: u32,
        opcode2: u32,
    ) -> Option<&Instruction<'a>> {
        let insts = self.instructions(set);
        insts
            .binary_search_by_key(&(opcode, opcode2), |i| i.sort_key())
            .ok()
            .map(|idx| &insts[idx])
    }

    /// All instructions sharing a primary opcode, as a contiguous run.
    /// Extended sets fan out over the secondary opcode under one primary.
    pub fn lookup_instructions_by_primary(
        &self,
        set: InstructionSet,
        opcode: u32,
    ) -> &[Instruction<'a>] {
        let insts = self.instructions(set);
        let start = insts.partition_point(|i| i.opcode < opcode);
        let end = insts.partition_point(|i| i.opcode <= opcode);
        &insts[start..end]
    }

    /// Name of a resolved capability opcode.
    pub fn capability_name(&self, opcode: u32) -> Option<&'a str> {
        self.capability_names.get(&opcode).copied()
    }
}

/// Groups, validates and sorts the raw grammar into [`GrammarTables`].
pub struct TableBuilder<'a> {
    operands: HashMap<&'a str, Operand<'a>>,
    capability_opcodes: HashMap<&'a str, u32>,
    capability_names: HashMap<u32, &'a str>,
}

impl<'a> TableBuilder<'a> {
    pub fn build(raw: RawGrammar<'a>) -> TableGenResult<GrammarTables<'a>> {
        let RawGrammar {
            operands,
            enums,
            instructions,
        } = raw;

        let mut builder = TableBuilder {
            operands,
            capability_opcodes: HashMap::new(),
            capability_names: HashMap::new(),
        };

        let raw_sections = builder.group_enums(enums)?;
        builder.index_capabilities(&raw_sections);

        let mut sections: [Vec<EnumValue<'a>>; Section::SLOTS] =
            std::array::from_fn(|_| Vec::new());
        for raw_values in raw_sections {
            for raw_value in raw_values {
                let value = builder.resolve_enum(raw_value)?;
                sections[value.section.index()].push(value);
            }
        }

        builder.check_fixed_capabilities(&sections)?;
        builder.check_address_spaces(&sections[Section::StorageClass.index()])?;

        let instructions = builder.build_instructions(instructions)?;

        for section in Section::ALL {
            let count = sections[section.index()].len();
            if count > 0 {
                log::debug!("section {section}: {count} values");
            }
        }
        for set in InstructionSet::ALL {
            let count = instructions[set.index()].len();
            if count > 0 {
                log::debug!("{set} instruction set: {count} instructions");
            }
        }

        Ok(GrammarTables {
            sections,
            instructions,
            capability_names: builder.capability_names,
        })
    }

    /// Group raw enum values per section, sort by opcode and reject
    /// duplicates in non-mask sections.
    fn group_enums(
        &self,
        enums: Vec<RawEnumValue<'a>>,
    ) -> TableGenResult<[Vec<RawEnumValue<'a>>; Section::SLOTS]> {
        let mut raw_sections: [Vec<RawEnumValue<'a>>; Section::SLOTS] =
            std::array::from_fn(|_| Vec::new());
        for raw in enums {
            raw_sections[raw.value.section.index()].push(raw);
        }

        for values in raw_sections.iter_mut() {
            values.sort_by_key(|r| r.value.opcode);
        }

        for section in Section::ALL {
            if section.is_mask() {
                continue;
            }
            for pair in raw_sections[section.index()].windows(2) {
                if pair[0].value.opcode == pair[1].value.opcode {
                    return Err(TableGenError::DuplicateEnumValue {
                        section,
                        opcode: pair[0].value.opcode,
                    });
                }
            }
        }

        Ok(raw_sections)
    }

    /// The Capabilities section must be indexed before any reference to a
    /// capability name can resolve — including references from capability
    /// values themselves.
    fn index_capabilities(&mut self, raw_sections: &[Vec<RawEnumValue<'a>>; Section::SLOTS]) {
        for raw in &raw_sections[Section::Capabilities.index()] {
            self.capability_opcodes.insert(raw.value.name, raw.value.opcode);
            self.capability_names.insert(raw.value.opcode, raw.value.name);
        }
    }

    fn resolve_capability(&self, name: &'a str) -> TableGenResult<u32> {
        self.capability_opcodes
            .get(name)
            .copied()
            .ok_or_else(|| TableGenError::UnresolvedCapability {
                name: name.to_string(),
            })
    }

    fn resolve_operand(&self, name: &'a str) -> TableGenResult<Operand<'a>> {
        self.operands
            .get(name)
            .copied()
            .ok_or_else(|| TableGenError::UnresolvedOperand {
                name: name.to_string(),
            })
    }

    fn resolve_enum(&self, raw: RawEnumValue<'a>) -> TableGenResult<EnumValue<'a>> {
        let RawEnumValue {
            mut value,
            capability_names,
            followed_names,
        } = raw;

        let mut capabilities = CapabilitySet::new();
        for name in capability_names {
            capabilities.push(self.resolve_capability(name)?);
        }
        value.capabilities = capabilities;

        let mut followed = Vec::with_capacity(followed_names.len());
        for name in followed_names {
            followed.push(self.resolve_operand(name)?);
        }
        value.followed = followed;

        Ok(value)
    }

    /// Sections emitted with a fixed capability shape hard-reference one
    /// capability by name; if such a section is populated, the name must
    /// exist or the emitted lookup would dangle.
    fn check_fixed_capabilities(
        &self,
        sections: &[Vec<EnumValue<'a>>; Section::SLOTS],
    ) -> TableGenResult<()> {
        for section in Section::ALL {
            if sections[section.index()].is_empty() {
                continue;
            }
            if let Some(CapabilityShape::Fixed(name)) = section.capability_shape() {
                if !self.capability_opcodes.contains_key(name) {
                    return Err(TableGenError::UnresolvedCapability {
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Each target environment's mapping must stay a partial bijection: one
    /// native address space per StorageClass value and vice versa.
    fn check_address_spaces(&self, storage_classes: &[EnumValue<'a>]) -> TableGenResult<()> {
        for env in TargetEnv::ALL {
            let mut claimed: HashMap<u32, u32> = HashMap::new();
            for value in storage_classes {
                if let Some(space) = value.address_space(env) {
                    if let Some(&first) = claimed.get(&space) {
                        return Err(TableGenError::DuplicateAddressSpace {
                            env,
                            space,
                            first,
                            second: value.opcode,
                        });
                    }
                    claimed.insert(space, value.opcode);
                }
            }
        }
        Ok(())
    }

    fn build_instructions(
        &self,
        instructions: Vec<RawInstruction<'a>>,
    ) -> TableGenResult<[Vec<Instruction<'a>>; InstructionSet::COUNT]> {
        let mut sets: [Vec<RawInstruction<'a>>; InstructionSet::COUNT] =
            std::array::from_fn(|_| Vec::new());
        for raw in instructions {
            sets[raw.inst.iset.index()].push(raw);
        }

        for raw_set in sets.iter_mut() {
            raw_set.sort_by_key(|r| r.inst.sort_key());
        }

        for set in InstructionSet::ALL {
            for pair in sets[set.index()].windows(2) {
                if pair[0].inst.sort_key() == pair[1].inst.sort_key() {
                    return Err(TableGenError::DuplicateInstruction {
                        set,
                        opcode: pair[0].inst.opcode,
                        opcode2: pair[0].inst.opcode2,
                    });
                }
            }
        }

        let mut resolved: [Vec<Instruction<'a>>; InstructionSet::COUNT] =
            std::array::from_fn(|_| Vec::new());
        for (idx, raw_set) in sets.into_iter().enumerate() {
            for raw in raw_set {
                let RawInstruction {
                    mut inst,
                    capability_names,
                    operand_names,
                } = raw;

                for name in capability_names {
                    inst.capabilities.push(self.resolve_capability(name)?);
                }
                for name in operand_names {
                    inst.operands.push(self.resolve_operand(name)?);
                }
                resolved[idx].push(inst);
            }
        }

        Ok(resolved)
    }
}
