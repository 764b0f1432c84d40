// This module defines the instruction descriptor: one instance per opcode in
// one of the recognized instruction sets (core, and extended sets addressed
// through a secondary opcode). An instruction carries its base encoded word
// count, the position of its result id, a structural class used for
// downstream routing, its full operand list, and the capability opcodes it
// requires. Instructions order totally by (opcode, opcode2); within one
// instruction set that order is unique, which is what makes the emitted
// tables binary-searchable.

use crate::grammar::Operand;
use std::fmt;

/// Instruction sets addressed by the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum InstructionSet {
    Core = 0,
    OpenClExt = 1,
    /// Reserved: accepted by the model, no grammar data yet.
    GlslExt = 2,
}

impl InstructionSet {
    pub const COUNT: usize = 3;

    pub const ALL: [InstructionSet; InstructionSet::COUNT] = [
        InstructionSet::Core,
        InstructionSet::OpenClExt,
        InstructionSet::GlslExt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InstructionSet::Core => "Core",
            InstructionSet::OpenClExt => "OpenCL",
            InstructionSet::GlslExt => "GLSL",
        }
    }

    /// Prefix for the emitted per-set static table.
    pub fn static_prefix(self) -> &'static str {
        match self {
            InstructionSet::Core => "CORE",
            InstructionSet::OpenClExt => "OPENCL",
            InstructionSet::GlslExt => "GLSL",
        }
    }

    pub fn parse(name: &str) -> Option<InstructionSet> {
        InstructionSet::ALL.iter().copied().find(|s| s.name() == name)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for InstructionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural category of an instruction, used for downstream routing.
/// Follows the instruction groupings of the SPIR-V specification; fits in
/// five bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InstructionClass {
    Miscellaneous = 0,
    Debug = 1,
    Annotation = 2,
    Extension = 3,
    ModeSetting = 4,
    TypeDeclaration = 5,
    ConstantCreation = 6,
    Memory = 7,
    Function = 8,
    Image = 9,
    Conversion = 10,
    Composite = 11,
    Arithmetic = 12,
    Bit = 13,
    Relational = 14,
    Derivative = 15,
    ControlFlow = 16,
    Atomic = 17,
    Primitive = 18,
    Barrier = 19,
    Group = 20,
    DeviceSideEnqueue = 21,
    Pipe = 22,
}

impl InstructionClass {
    pub const ALL: [InstructionClass; 23] = [
        InstructionClass::Miscellaneous,
        InstructionClass::Debug,
        InstructionClass::Annotation,
        InstructionClass::Extension,
        InstructionClass::ModeSetting,
        InstructionClass::TypeDeclaration,
        InstructionClass::ConstantCreation,
        InstructionClass::Memory,
        InstructionClass::Function,
        InstructionClass::Image,
        InstructionClass::Conversion,
        InstructionClass::Composite,
        InstructionClass::Arithmetic,
        InstructionClass::Bit,
        InstructionClass::Relational,
        InstructionClass::Derivative,
        InstructionClass::ControlFlow,
        InstructionClass::Atomic,
        InstructionClass::Primitive,
        InstructionClass::Barrier,
        InstructionClass::Group,
        InstructionClass::DeviceSideEnqueue,
        InstructionClass::Pipe,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InstructionClass::Miscellaneous => "Miscellaneous",
            InstructionClass::Debug => "Debug",
            InstructionClass::Annotation => "Annotation",
            InstructionClass::Extension => "Extension",
            InstructionClass::ModeSetting => "ModeSetting",
            InstructionClass::TypeDeclaration => "TypeDeclaration",
            InstructionClass::ConstantCreation => "ConstantCreation",
            InstructionClass::Memory => "Memory",
            InstructionClass::Function => "Function",
            InstructionClass::Image => "Image",
            InstructionClass::Conversion => "Conversion",
            InstructionClass::Composite => "Composite",
            InstructionClass::Arithmetic => "Arithmetic",
            InstructionClass::Bit => "Bit",
            InstructionClass::Relational => "Relational",
            InstructionClass::Derivative => "Derivative",
            InstructionClass::ControlFlow => "ControlFlow",
            InstructionClass::Atomic => "Atomic",
            InstructionClass::Primitive => "Primitive",
            InstructionClass::Barrier => "Barrier",
            InstructionClass::Group => "Group",
            InstructionClass::DeviceSideEnqueue => "DeviceSideEnqueue",
            InstructionClass::Pipe => "Pipe",
        }
    }

    pub fn parse(name: &str) -> Option<InstructionClass> {
        InstructionClass::ALL.iter().copied().find(|c| c.name() == name)
    }
}

/// One instruction of one instruction set.
#[derive(Debug, Clone)]
pub struct Instruction<'a> {
    pub opcode: u32,
    /// Secondary opcode; meaningful only for extended sets, 0 for core.
    pub opcode2: u32,
    pub name: &'a str,
    /// Minimum encoded word length excluding variable trailing operands.
    pub base_word_count: u32,
    /// Position in `operands` producing the result id; `None` means the
    /// instruction has no result.
    pub result_id_index: Option<u32>,
    pub is_terminator: bool,
    pub variable_length: bool,
    pub class: InstructionClass,
    pub iset: InstructionSet,
    pub operands: Vec<Operand<'a>>,
    /// Capability opcodes, resolved by name against the Capabilities section.
    pub capabilities: Vec<u32>,
}

impl<'a> Instruction<'a> {
    /// Sort by opcode then secondary opcode.
    pub fn sort_key(&self) -> (u32, u32) {
        (self.opcode, self.opcode2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_roundtrip() {
        for set in InstructionSet::ALL {
            assert_eq!(InstructionSet::parse(set.name()), Some(set));
        }
        assert_eq!(InstructionSet::parse("Vulkan"), None);
    }

    #[test]
    fn test_class_fits_five_bits() {
        for class in InstructionClass::ALL {
            assert!((class as u8) < 32);
            assert_eq!(InstructionClass::parse(class.name()), Some(class));
        }
    }

    #[test]
    fn test_sort_key_orders_by_pair() {
        let mk = |op, op2| Instruction {
            opcode: op,
            opcode2: op2,
            name: "",
            base_word_count: 1,
            result_id_index: None,
            is_terminator: false,
            variable_length: false,
            class: InstructionClass::Miscellaneous,
            iset: InstructionSet::OpenClExt,
            operands: Vec::new(),
            capabilities: Vec::new(),
        };
        assert!(mk(12, 0).sort_key() < mk(12, 1).sort_key());
        assert!(mk(12, 9).sort_key() < mk(13, 0).sort_key());
    }
}
