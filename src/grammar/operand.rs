// This module defines the operand descriptor: an immutable, compact value
// describing one operand slot's shape. An operand is either an id reference
// (with a qualifier saying whether the id names a type, variable, constant or
// specialization constant, and a referenced-type payload), an immediate
// literal, or an enumerated value drawn from one of the grammar sections. A
// shape extension modifier (scalar, pointer, vector, matrix, array, ...) is
// orthogonal to the kind. Accessors that depend on the kind panic on
// mismatched access; querying an operand for the interpretation that does not
// match its kind is a programming-contract violation, not a recoverable
// run-time outcome. Bit packing is confined to packed_bits(), which produces
// the two-byte encoding used by the emitted tables.

use crate::grammar::Section;

/// What an operand slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// An id reference to another instruction's result.
    Id {
        qualifier: IdQualifier,
        ty: ReferencedType,
    },
    /// An immediate literal encoded directly in the instruction words.
    Immediate,
    /// A value of one of the grammar's enumeration sections.
    Enumerated { section: Section },
}

impl OperandKind {
    /// Two-bit tag used in the packed table encoding.
    pub fn tag_bits(self) -> u8 {
        match self {
            OperandKind::Id { .. } => 1,
            OperandKind::Immediate => 2,
            OperandKind::Enumerated { .. } => 3,
        }
    }
}

/// Role of an id operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IdQualifier {
    /// The id names a type.
    TypeRef = 0,
    /// The id names a variable.
    Variable = 1,
    /// The id names a compile-time constant.
    Constant = 2,
    /// The id names a specialization constant.
    SpecConstant = 3,
}

impl IdQualifier {
    pub const ALL: [IdQualifier; 4] = [
        IdQualifier::TypeRef,
        IdQualifier::Variable,
        IdQualifier::Constant,
        IdQualifier::SpecConstant,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IdQualifier::TypeRef => "TypeRef",
            IdQualifier::Variable => "Variable",
            IdQualifier::Constant => "Constant",
            IdQualifier::SpecConstant => "SpecConstant",
        }
    }

    pub fn parse(name: &str) -> Option<IdQualifier> {
        IdQualifier::ALL.iter().copied().find(|q| q.name() == name)
    }
}

/// Orthogonal shape modifier on an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ShapeExt {
    #[default]
    Scalar = 0,
    AliasesExist = 1,
    Pointer = 2,
    VectorOfScalars = 3,
    Vector = 4,
    Matrix = 5,
    PointerVector = 6,
    Array = 7,
    RuntimeArray = 8,
    StructOfVectorScalar = 9,
}

impl ShapeExt {
    pub const ALL: [ShapeExt; 10] = [
        ShapeExt::Scalar,
        ShapeExt::AliasesExist,
        ShapeExt::Pointer,
        ShapeExt::VectorOfScalars,
        ShapeExt::Vector,
        ShapeExt::Matrix,
        ShapeExt::PointerVector,
        ShapeExt::Array,
        ShapeExt::RuntimeArray,
        ShapeExt::StructOfVectorScalar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeExt::Scalar => "Scalar",
            ShapeExt::AliasesExist => "AliasesExist",
            ShapeExt::Pointer => "Pointer",
            ShapeExt::VectorOfScalars => "VectorOfScalars",
            ShapeExt::Vector => "Vector",
            ShapeExt::Matrix => "Matrix",
            ShapeExt::PointerVector => "PointerVector",
            ShapeExt::Array => "Array",
            ShapeExt::RuntimeArray => "RuntimeArray",
            ShapeExt::StructOfVectorScalar => "StructOfVectorScalar",
        }
    }

    pub fn parse(name: &str) -> Option<ShapeExt> {
        ShapeExt::ALL.iter().copied().find(|s| s.name() == name)
    }
}

/// Catalog of types an id operand can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReferencedType {
    Any = 1,
    Void = 2,
    // Fundamental types
    Bool = 3,
    Int = 4,
    Float = 5,
    // Specialised fundamental types
    Int32 = 6,
    Float16 = 7,
    Float32 = 8,
    Sint = 9,
    Uint = 10,
    // Heterogeneous composites
    Struct = 11,
    Function = 12,
    // Opaque
    Forward = 13,
    Opaque = 14,
    // Image
    Image = 15,
    Sampler = 16,
    SampledImage = 17,
    // Pipes
    Pipe = 18,
    PipeStorage = 19,
    ReserveId = 20,
    // Host
    Event = 21,
    DeviceEvent = 22,
    Queue = 23,
    NamedBarrier = 24,
    InstructionSet = 25,
    Label = 26,
    String = 27,
    DecorationGroup = 28,
    NdRange = 29,
}

impl ReferencedType {
    pub const ALL: [ReferencedType; 29] = [
        ReferencedType::Any,
        ReferencedType::Void,
        ReferencedType::Bool,
        ReferencedType::Int,
        ReferencedType::Float,
        ReferencedType::Int32,
        ReferencedType::Float16,
        ReferencedType::Float32,
        ReferencedType::Sint,
        ReferencedType::Uint,
        ReferencedType::Struct,
        ReferencedType::Function,
        ReferencedType::Forward,
        ReferencedType::Opaque,
        ReferencedType::Image,
        ReferencedType::Sampler,
        ReferencedType::SampledImage,
        ReferencedType::Pipe,
        ReferencedType::PipeStorage,
        ReferencedType::ReserveId,
        ReferencedType::Event,
        ReferencedType::DeviceEvent,
        ReferencedType::Queue,
        ReferencedType::NamedBarrier,
        ReferencedType::InstructionSet,
        ReferencedType::Label,
        ReferencedType::String,
        ReferencedType::DecorationGroup,
        ReferencedType::NdRange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReferencedType::Any => "Any",
            ReferencedType::Void => "Void",
            ReferencedType::Bool => "Bool",
            ReferencedType::Int => "Int",
            ReferencedType::Float => "Float",
            ReferencedType::Int32 => "Int32",
            ReferencedType::Float16 => "Float16",
            ReferencedType::Float32 => "Float32",
            ReferencedType::Sint => "Sint",
            ReferencedType::Uint => "Uint",
            ReferencedType::Struct => "Struct",
            ReferencedType::Function => "Function",
            ReferencedType::Forward => "Forward",
            ReferencedType::Opaque => "Opaque",
            ReferencedType::Image => "Image",
            ReferencedType::Sampler => "Sampler",
            ReferencedType::SampledImage => "SampledImage",
            ReferencedType::Pipe => "Pipe",
            ReferencedType::PipeStorage => "PipeStorage",
            ReferencedType::ReserveId => "ReserveId",
            ReferencedType::Event => "Event",
            ReferencedType::DeviceEvent => "DeviceEvent",
            ReferencedType::Queue => "Queue",
            ReferencedType::NamedBarrier => "NamedBarrier",
            ReferencedType::InstructionSet => "InstructionSet",
            ReferencedType::Label => "Label",
            ReferencedType::String => "String",
            ReferencedType::DecorationGroup => "DecorationGroup",
            ReferencedType::NdRange => "NdRange",
        }
    }

    pub fn parse(name: &str) -> Option<ReferencedType> {
        ReferencedType::ALL.iter().copied().find(|t| t.name() == name)
    }
}

/// One operand slot of an instruction or an enum value's trailing operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand<'a> {
    pub kind: OperandKind,
    pub shape: ShapeExt,
    pub name: &'a str,
    /// Literal text, for string-literal immediates only.
    pub literal: Option<&'a str>,
}

impl<'a> Operand<'a> {
    pub fn id(name: &'a str, qualifier: IdQualifier, ty: ReferencedType) -> Self {
        Operand {
            kind: OperandKind::Id { qualifier, ty },
            shape: ShapeExt::Scalar,
            name,
            literal: None,
        }
    }

    pub fn immediate(name: &'a str) -> Self {
        Operand {
            kind: OperandKind::Immediate,
            shape: ShapeExt::Scalar,
            name,
            literal: None,
        }
    }

    pub fn enumerated(name: &'a str, section: Section) -> Self {
        Operand {
            kind: OperandKind::Enumerated { section },
            shape: ShapeExt::Scalar,
            name,
            literal: None,
        }
    }

    pub fn with_shape(mut self, shape: ShapeExt) -> Self {
        self.shape = shape;
        self
    }

    pub fn is_id(&self) -> bool {
        matches!(self.kind, OperandKind::Id { .. })
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self.kind, OperandKind::Immediate)
    }

    pub fn is_enumerated(&self) -> bool {
        matches!(self.kind, OperandKind::Enumerated { .. })
    }

    /// Qualifier of an id operand. Panics if the operand is not an id.
    pub fn qualifier(&self) -> IdQualifier {
        match self.kind {
            OperandKind::Id { qualifier, .. } => qualifier,
            _ => panic!("qualifier() on non-id operand `{}`", self.name),
        }
    }

    /// Referenced type of an id operand. Panics if the operand is not an id.
    pub fn referenced_type(&self) -> ReferencedType {
        match self.kind {
            OperandKind::Id { ty, .. } => ty,
            _ => panic!("referenced_type() on non-id operand `{}`", self.name),
        }
    }

    /// Section of an enumerated operand. Panics if the operand is not
    /// enumerated.
    pub fn section(&self) -> Section {
        match self.kind {
            OperandKind::Enumerated { section } => section,
            _ => panic!("section() on non-enum operand `{}`", self.name),
        }
    }

    /// Two-byte encoding used by the emitted tables: low byte packs tag,
    /// qualifier and shape extension; high byte is the referenced-type or
    /// section payload.
    pub fn packed_bits(&self) -> (u8, u8) {
        let (qual, payload) = match self.kind {
            OperandKind::Id { qualifier, ty } => (qualifier as u8, ty as u8),
            OperandKind::Immediate => (0, 0),
            OperandKind::Enumerated { section } => (0, section as u8),
        };
        let packed = self.kind.tag_bits() | (qual << 2) | ((self.shape as u8) << 4);
        (packed, payload)
    }
}
