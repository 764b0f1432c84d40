// This module defines the grammar data model for the SPIR-V table generator:
// the 31 enumeration sections of the SPIR-V specification, the operand
// descriptor (kind, qualifier, shape extension, referenced-type payload), the
// per-section enum value descriptor (capability requirements, mask and id
// flags, followed operands, address-space correspondence), and the instruction
// descriptor (opcode pair, word count, structural class, operand list). All
// descriptors are created once per run during population, become immutable,
// and are grouped and sorted by the table builder. Section-intrinsic
// properties (mask combinability, capability-lookup shape, followed-literal
// support) live here so that the builder and emitter share one authority.

//! Grammar data model.
//!
//! The descriptor types populated from the record store and compiled into
//! lookup tables. Nothing in this module performs I/O or allocation beyond
//! the vectors inside descriptors; names are interned `&str` references tied
//! to the session arena.

pub mod enums;
pub mod instruction;
pub mod operand;

pub use enums::{CapabilitySet, EnumValue, TargetEnv};
pub use instruction::{Instruction, InstructionClass, InstructionSet};
pub use operand::{IdQualifier, Operand, OperandKind, ReferencedType, ShapeExt};

use std::fmt;

/// Enumeration sections of the SPIR-V specification.
///
/// Discriminants match the specification's section numbering; section 0 is
/// unused, which is why per-section storage reserves [`Section::SLOTS`]
/// slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Section {
    MagicNumber = 1,
    SourceLanguage = 2,
    ExecutionModel = 3,
    AddressModel = 4,
    MemoryModel = 5,
    ExecutionMode = 6,
    StorageClass = 7,
    Dim = 8,
    SamplerAddressingMode = 9,
    SamplerFilterMode = 10,
    ImageFormat = 11,
    ImageChannelOrder = 12,
    ImageChannelDataType = 13,
    ImageOperand = 14,
    FpFastMathMode = 15,
    RoundingMode = 16,
    LinkageType = 17,
    AccessQualifier = 18,
    FunctionParameterAttribute = 19,
    Decoration = 20,
    BuiltIn = 21,
    SelectionControl = 22,
    LoopControl = 23,
    FunctionControl = 24,
    MemorySemantics = 25,
    MemoryAccess = 26,
    Scope = 27,
    GroupOperation = 28,
    KernelEnqueueFlags = 29,
    KernelProfilingInfo = 30,
    Capabilities = 31,
}

/// How the capability-lookup routine for a section is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityShape {
    /// Every value in the section requires the same named capability.
    Fixed(&'static str),
    /// Values in the section never require a capability.
    None,
    /// The requirement varies per value; dispatch on the value.
    PerValue,
}

impl Section {
    /// Number of per-section storage slots (discriminants are 1-based).
    pub const SLOTS: usize = 32;

    pub const ALL: [Section; 31] = [
        Section::MagicNumber,
        Section::SourceLanguage,
        Section::ExecutionModel,
        Section::AddressModel,
        Section::MemoryModel,
        Section::ExecutionMode,
        Section::StorageClass,
        Section::Dim,
        Section::SamplerAddressingMode,
        Section::SamplerFilterMode,
        Section::ImageFormat,
        Section::ImageChannelOrder,
        Section::ImageChannelDataType,
        Section::ImageOperand,
        Section::FpFastMathMode,
        Section::RoundingMode,
        Section::LinkageType,
        Section::AccessQualifier,
        Section::FunctionParameterAttribute,
        Section::Decoration,
        Section::BuiltIn,
        Section::SelectionControl,
        Section::LoopControl,
        Section::FunctionControl,
        Section::MemorySemantics,
        Section::MemoryAccess,
        Section::Scope,
        Section::GroupOperation,
        Section::KernelEnqueueFlags,
        Section::KernelProfilingInfo,
        Section::Capabilities,
    ];

    /// Section name as spelled in the SPIR-V specification, used both by the
    /// record format and by emitted type names.
    pub fn name(self) -> &'static str {
        match self {
            Section::MagicNumber => "MagicNumber",
            Section::SourceLanguage => "SourceLanguage",
            Section::ExecutionModel => "ExecutionModel",
            Section::AddressModel => "AddressModel",
            Section::MemoryModel => "MemoryModel",
            Section::ExecutionMode => "ExecutionMode",
            Section::StorageClass => "StorageClass",
            Section::Dim => "Dim",
            Section::SamplerAddressingMode => "SamplerAddressingMode",
            Section::SamplerFilterMode => "SamplerFilterMode",
            Section::ImageFormat => "ImageFormat",
            Section::ImageChannelOrder => "ImageChannelOrder",
            Section::ImageChannelDataType => "ImageChannelDataType",
            Section::ImageOperand => "ImageOperand",
            Section::FpFastMathMode => "FPFastMathMode",
            Section::RoundingMode => "RoundingMode",
            Section::LinkageType => "LinkageType",
            Section::AccessQualifier => "AccessQualifier",
            Section::FunctionParameterAttribute => "FunctionParameterAttribute",
            Section::Decoration => "Decoration",
            Section::BuiltIn => "BuiltIn",
            Section::SelectionControl => "SelectionControl",
            Section::LoopControl => "LoopControl",
            Section::FunctionControl => "FunctionControl",
            Section::MemorySemantics => "MemorySemantics",
            Section::MemoryAccess => "MemoryAccess",
            Section::Scope => "Scope",
            Section::GroupOperation => "GroupOperation",
            Section::KernelEnqueueFlags => "KernelEnqueueFlags",
            Section::KernelProfilingInfo => "KernelProfilingInfo",
            Section::Capabilities => "Capabilities",
        }
    }

    /// Parse a section name as produced by [`Section::name`].
    pub fn parse(name: &str) -> Option<Section> {
        Section::ALL.iter().copied().find(|s| s.name() == name)
    }

    /// Index into per-section storage arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether values of this section combine as a bitmask. Mask sections
    /// permit duplicate opcodes; mutually-exclusive sections do not.
    pub fn is_mask(self) -> bool {
        matches!(
            self,
            Section::ImageOperand
                | Section::FpFastMathMode
                | Section::SelectionControl
                | Section::LoopControl
                | Section::FunctionControl
                | Section::MemorySemantics
                | Section::MemoryAccess
                | Section::KernelProfilingInfo
        )
    }

    /// Shape of the emitted capability-lookup routine, or `None` for
    /// sections that get no such routine at all.
    pub fn capability_shape(self) -> Option<CapabilityShape> {
        match self {
            Section::SamplerAddressingMode
            | Section::SamplerFilterMode
            | Section::ImageChannelOrder
            | Section::ImageChannelDataType
            | Section::FpFastMathMode
            | Section::RoundingMode
            | Section::AccessQualifier
            | Section::FunctionParameterAttribute
            | Section::GroupOperation
            | Section::KernelEnqueueFlags
            | Section::KernelProfilingInfo => Some(CapabilityShape::Fixed("Kernel")),
            Section::LinkageType => Some(CapabilityShape::Fixed("Linkage")),
            Section::SelectionControl
            | Section::LoopControl
            | Section::FunctionControl
            | Section::MemoryAccess
            | Section::Scope => Some(CapabilityShape::None),
            Section::ExecutionModel
            | Section::AddressModel
            | Section::MemoryModel
            | Section::ExecutionMode
            | Section::StorageClass
            | Section::Dim
            | Section::ImageFormat
            | Section::ImageOperand
            | Section::Decoration
            | Section::BuiltIn
            | Section::MemorySemantics => Some(CapabilityShape::PerValue),
            Section::MagicNumber | Section::SourceLanguage | Section::Capabilities => None,
        }
    }

    /// Sections whose values can mandate trailing literal operands.
    pub fn has_followed_literals(self) -> bool {
        matches!(
            self,
            Section::ExecutionMode
                | Section::Decoration
                | Section::LoopControl
                | Section::MemoryAccess
        )
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_roundtrip() {
        for section in Section::ALL {
            assert_eq!(Section::parse(section.name()), Some(section));
        }
        assert_eq!(Section::parse("NoSuchSection"), None);
    }

    #[test]
    fn test_section_indices_are_unique_and_in_range() {
        let mut seen = [false; Section::SLOTS];
        for section in Section::ALL {
            let idx = section.index();
            assert!(idx >= 1 && idx < Section::SLOTS);
            assert!(!seen[idx], "duplicate index {idx}");
            seen[idx] = true;
        }
    }

    #[test]
    fn test_capability_shape_partition() {
        // Every section is classified exactly once; the three unclassified
        // sections get no lookup routine.
        let mut fixed = 0;
        let mut none = 0;
        let mut per_value = 0;
        let mut unclassified = 0;
        for section in Section::ALL {
            match section.capability_shape() {
                Some(CapabilityShape::Fixed(_)) => fixed += 1,
                Some(CapabilityShape::None) => none += 1,
                Some(CapabilityShape::PerValue) => per_value += 1,
                None => unclassified += 1,
            }
        }
        assert_eq!(fixed, 12);
        assert_eq!(none, 5);
        assert_eq!(per_value, 11);
        assert_eq!(unclassified, 3);
    }

    #[test]
    fn test_mask_sections() {
        assert!(Section::LoopControl.is_mask());
        assert!(Section::MemorySemantics.is_mask());
        assert!(!Section::StorageClass.is_mask());
        assert!(!Section::Capabilities.is_mask());
    }
}
