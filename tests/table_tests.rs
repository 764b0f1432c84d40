//! Integration tests for the full table generation pipeline.
//!
//! Each test runs parse -> populate -> build -> generate over a realistic
//! grammar subset and checks the built tables and the generated artifact.

use bumpalo::Bump;

use spirv_tablegen::populate::populate;
use spirv_tablegen::records::parse_records;
use spirv_tablegen::{
    GrammarSession, GrammarTables, InstructionSet, Section, TableBuilder, TableGenError, TargetEnv,
};

/// A realistic grammar subset: capabilities, operands, several enumeration
/// sections of each capability shape, storage classes with OpenCL address
/// spaces, and core plus OpenCL-extended instructions.
const GRAMMAR: &str = r#"
; capabilities
def enum Cap_Matrix { section Capabilities name "Matrix" opcode 0 }
def enum Cap_Shader { section Capabilities name "Shader" opcode 1 caps [Matrix] }
def enum Cap_Addresses { section Capabilities name "Addresses" opcode 4 }
def enum Cap_Linkage { section Capabilities name "Linkage" opcode 5 }
def enum Cap_Kernel { section Capabilities name "Kernel" opcode 6 }

; operand descriptors
def operand IdResultType { kind Id qualifier TypeRef type Any }
def operand IdResult { kind Id qualifier Variable type Any }
def operand IdPointer { kind Id qualifier Variable type Any shape Pointer }
def operand LiteralNumber { kind Imm }
def operand LinkageName { kind Imm literal "Name" }
def operand MemAccess { kind Enum section MemoryAccess }
def operand StorageClassOperand { kind Enum section StorageClass }
def operand LinkageTypeOperand { kind Enum section LinkageType }

; storage classes
def enum SC_UniformConstant { section StorageClass name "UniformConstant" opcode 0 ocl_as 3 }
def enum SC_Input { section StorageClass name "Input" opcode 1 caps [Shader] }
def enum SC_Uniform { section StorageClass name "Uniform" opcode 2 caps [Shader] }
def enum SC_Workgroup { section StorageClass name "Workgroup" opcode 4 ocl_as 2 }
def enum SC_CrossWorkgroup { section StorageClass name "CrossWorkgroup" opcode 5 ocl_as 1 }
def enum SC_Function { section StorageClass name "Function" opcode 7 ocl_as 0 }
def enum SC_Generic { section StorageClass name "Generic" opcode 8 caps [Kernel] ocl_as 4 }

; sampler filter modes: fixed Kernel capability shape
def enum SFM_Nearest { section SamplerFilterMode name "Nearest" opcode 0 }
def enum SFM_Linear { section SamplerFilterMode name "Linear" opcode 1 }

; linkage types: fixed Linkage capability shape
def enum LT_Export { section LinkageType name "Export" opcode 0 }
def enum LT_Import { section LinkageType name "Import" opcode 1 }

; loop control: mask, none capability shape even when values carry data
def enum LC_None { section LoopControl name "None" opcode 0 }
def enum LC_Unroll { section LoopControl name "Unroll" opcode 1 caps [Kernel] }
def enum LC_DontUnroll { section LoopControl name "DontUnroll" opcode 2 }

; memory access: mask with a followed literal on Aligned
def enum MA_None { section MemoryAccess name "None" opcode 0 }
def enum MA_Volatile { section MemoryAccess name "Volatile" opcode 1 }
def enum MA_Aligned { section MemoryAccess name "Aligned" opcode 2 followed [LiteralNumber] }

; execution modes with followed literals
def enum EM_Invocations { section ExecutionMode name "Invocations" opcode 0 caps [Shader] followed [LiteralNumber] }
def enum EM_LocalSize { section ExecutionMode name "LocalSize" opcode 17 followed [LiteralNumber LiteralNumber LiteralNumber] }

; decorations
def enum D_RelaxedPrecision { section Decoration name "RelaxedPrecision" opcode 0 caps [Shader] }
def enum D_SpecId { section Decoration name "SpecId" opcode 1 caps [Shader Kernel] }
def enum D_LinkageAttributes { section Decoration name "LinkageAttributes" opcode 41 caps [Linkage] followed [LinkageName LinkageTypeOperand] }

; scopes: none capability shape, not a mask
def enum S_CrossDevice { section Scope name "CrossDevice" opcode 0 }
def enum S_Device { section Scope name "Device" opcode 1 }

; core instructions
def inst OpNop { set Core opcode 0 word_count 1 class Miscellaneous }
def inst OpTypeVoid { set Core opcode 19 word_count 2 result_index 0 class TypeDeclaration operands [IdResult] }
def inst OpVariable { set Core opcode 59 word_count 4 result_index 1 class Memory operands [IdResultType IdResult StorageClassOperand] variable_length 1 }
def inst OpLoad { set Core opcode 61 word_count 4 result_index 1 class Memory operands [IdResultType IdResult IdPointer MemAccess] variable_length 1 caps [Addresses] }
def inst OpStore { set Core opcode 62 word_count 3 class Memory operands [IdPointer IdResult MemAccess] variable_length 1 }
def inst OpBranch { set Core opcode 249 word_count 2 terminator 1 class ControlFlow operands [IdResult] }

; OpenCL extended instructions, secondary opcode selects the function
def inst CL_acos { set OpenCL name "acos" opcode 12 opcode2 0 word_count 5 result_index 1 class Arithmetic operands [IdResultType IdResult] caps [Kernel] }
def inst CL_acosh { set OpenCL name "acosh" opcode 12 opcode2 1 word_count 5 result_index 1 class Arithmetic operands [IdResultType IdResult] caps [Kernel] }
"#;

fn build_tables<'a>(session: &GrammarSession<'a>, text: &str) -> GrammarTables<'a> {
    let store = parse_records(text).unwrap_or_else(|e| panic!("parse failed: {e}"));
    let raw = populate(&store, session).unwrap_or_else(|e| panic!("populate failed: {e}"));
    TableBuilder::build(raw).unwrap_or_else(|e| panic!("build failed: {e}"))
}

/// Helper to check that output contains expected patterns.
fn check_output_contains(output: &str, patterns: &[&str]) {
    for pattern in patterns {
        assert!(
            output.contains(pattern),
            "Output missing expected pattern: '{pattern}'\nFull output:\n{output}"
        );
    }
}

#[test]
fn test_sections_strictly_ascending() {
    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let tables = build_tables(&session, GRAMMAR);

    for section in Section::ALL {
        let values = tables.section(section);
        for pair in values.windows(2) {
            if section.is_mask() {
                assert!(
                    pair[0].opcode <= pair[1].opcode,
                    "{section} not ascending"
                );
            } else {
                assert!(
                    pair[0].opcode < pair[1].opcode,
                    "{section} not strictly ascending"
                );
            }
        }
    }
}

#[test]
fn test_instruction_binary_search() {
    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let tables = build_tables(&session, GRAMMAR);

    for set in InstructionSet::ALL {
        let instructions = tables.instructions(set);
        for pair in instructions.windows(2) {
            assert!(pair[0].sort_key() < pair[1].sort_key());
        }
        // Every inserted pair is found and returns exactly that descriptor.
        for inst in instructions {
            let found = tables
                .lookup_instruction(set, inst.opcode, inst.opcode2)
                .unwrap_or_else(|| panic!("({}, {}) not found", inst.opcode, inst.opcode2));
            assert_eq!(found.name, inst.name);
        }
    }

    assert_eq!(tables.instructions(InstructionSet::Core).len(), 6);
    assert_eq!(tables.instructions(InstructionSet::OpenClExt).len(), 2);
    assert!(tables.instructions(InstructionSet::GlslExt).is_empty());

    // Absent pairs return not-found.
    assert!(tables.lookup_instruction(InstructionSet::Core, 60, 0).is_none());
    assert!(tables
        .lookup_instruction(InstructionSet::OpenClExt, 12, 2)
        .is_none());
    assert!(tables.lookup_instruction(InstructionSet::GlslExt, 12, 0).is_none());

    // Lookup by primary opcode alone returns the contiguous run.
    let ext = tables.lookup_instructions_by_primary(InstructionSet::OpenClExt, 12);
    assert_eq!(ext.len(), 2);
    assert_eq!(ext[0].name, "acos");
    assert_eq!(ext[1].name, "acosh");
    assert!(tables
        .lookup_instructions_by_primary(InstructionSet::Core, 60)
        .is_empty());
}

#[test]
fn test_capability_model_roundtrip() {
    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let tables = build_tables(&session, GRAMMAR);

    // Declared capability comes back out of the model.
    let input = tables.lookup_enum(Section::StorageClass, 1).unwrap();
    assert_eq!(tables.capability_name(input.capabilities.primary().unwrap()), Some("Shader"));

    // All three alternatives are preserved even though only the first is
    // consulted downstream.
    let spec_id = tables.lookup_enum(Section::Decoration, 1).unwrap();
    assert_eq!(spec_id.capabilities.len(), 2);
    assert_eq!(spec_id.capabilities.primary(), Some(1));
}

#[test]
fn test_generated_artifact_structure() {
    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let output = spirv_tablegen::compile(GRAMMAR, &session).unwrap();

    check_output_contains(
        &output,
        &[
            "Automatically generated by spirv-tablegen",
            "pub struct Operand(pub u8, pub u8);",
            "pub type OperandList = &'static [Operand];",
            "pub enum StorageClass {",
            "    UniformConstant = 0,",
            "    Generic = 8,",
            "pub struct LoopControl(pub u32);",
            "pub const DONT_UNROLL: LoopControl = LoopControl(0x2);",
            "pub enum Capabilities {",
            "pub type CapVec = &'static [Capabilities];",
            "pub trait RequiredCapabilities {",
            "pub trait FollowedLiterals {",
            "pub enum InstructionClass {",
            "pub struct InstructionInfo {",
            "pub fn find_instruction(",
            "pub static CORE_INSTRUCTIONS: &[InstructionInfo]",
            "pub static OPENCL_INSTRUCTIONS: &[InstructionInfo]",
            "pub static INSTRUCTION_SETS",
        ],
    );
}

#[test]
fn test_sampler_filter_mode_requires_kernel() {
    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let output = spirv_tablegen::compile(GRAMMAR, &session).unwrap();

    // Fixed shape: any SamplerFilterMode value maps to the Kernel capability.
    check_output_contains(
        &output,
        &[
            "impl RequiredCapabilities for SamplerFilterMode {\n    fn required_capabilities(self) -> CapVec {\n        &[Capabilities::Kernel]\n    }\n}",
            "impl RequiredCapabilities for LinkageType {\n    fn required_capabilities(self) -> CapVec {\n        &[Capabilities::Linkage]\n    }\n}",
        ],
    );
}

#[test]
fn test_loop_control_shape_overrides_value_data() {
    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let output = spirv_tablegen::compile(GRAMMAR, &session).unwrap();

    // LC_Unroll declares a Kernel capability, but LoopControl is a
    // none-shape section: the emitted lookup returns the empty set.
    check_output_contains(
        &output,
        &["impl RequiredCapabilities for LoopControl {\n    fn required_capabilities(self) -> CapVec {\n        &[]\n    }\n}"],
    );
    assert!(!output.contains("LoopControl(0x1) => &[Capabilities::Kernel]"));

    // Scope gets the same shape without being a mask.
    check_output_contains(
        &output,
        &["impl RequiredCapabilities for Scope {\n    fn required_capabilities(self) -> CapVec {\n        &[]\n    }\n}"],
    );
}

#[test]
fn test_per_value_capability_dispatch() {
    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let output = spirv_tablegen::compile(GRAMMAR, &session).unwrap();

    check_output_contains(
        &output,
        &[
            "StorageClass::Input => &[Capabilities::Shader],",
            "StorageClass::Generic => &[Capabilities::Kernel],",
            "StorageClass::UniformConstant => &[],",
            "Decoration::SpecId => &[Capabilities::Shader],",
            "Decoration::LinkageAttributes => &[Capabilities::Linkage],",
        ],
    );
}

#[test]
fn test_followed_literal_lookup() {
    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let tables = build_tables(&session, GRAMMAR);

    // Scenario: an ExecutionMode value declared with three immediate-integer
    // operands comes back exactly, in order.
    let local_size = tables.lookup_enum(Section::ExecutionMode, 17).unwrap();
    assert_eq!(local_size.followed.len(), 3);
    for op in &local_size.followed {
        assert!(op.is_immediate());
        assert_eq!(op.name, "LiteralNumber");
    }

    // Values without declared followed operands return the empty sequence.
    let volatile = tables.lookup_enum(Section::MemoryAccess, 1).unwrap();
    assert!(volatile.followed.is_empty());

    let output = spirv_tablegen::compile(GRAMMAR, &session).unwrap();
    check_output_contains(
        &output,
        &[
            "ExecutionMode::LocalSize => &[Operand(0x02, 0), Operand(0x02, 0), Operand(0x02, 0)],",
            // Aligned carries one literal; the enum-operand payload is the
            // LinkageType section number.
            "0x2 => &[Operand(0x02, 0)],",
            "Decoration::LinkageAttributes => &[Operand(0x02, 0), Operand(0x03, 17)],",
            "impl FollowedLiterals for Scope {}",
        ],
    );
}

#[test]
fn test_address_space_correspondence() {
    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let tables = build_tables(&session, GRAMMAR);

    // Model side: the mapping is a partial bijection over the listed pairs.
    let expected = [
        ("Function", 0u32),
        ("CrossWorkgroup", 1),
        ("Workgroup", 2),
        ("UniformConstant", 3),
        ("Generic", 4),
    ];
    for (name, space) in expected {
        let value = tables
            .section(Section::StorageClass)
            .iter()
            .find(|v| v.name == name)
            .unwrap();
        assert_eq!(value.address_space(TargetEnv::OpenCl), Some(space));
    }
    let input = tables.lookup_enum(Section::StorageClass, 1).unwrap();
    assert_eq!(input.address_space(TargetEnv::OpenCl), None);

    // Artifact side: forward and inverse functions, total with a
    // not-applicable fallback, and the reserved GLSL enum with no mappings.
    let output = spirv_tablegen::compile(GRAMMAR, &session).unwrap();
    check_output_contains(
        &output,
        &[
            "pub fn ocl_address_space(sc: StorageClass) -> OclAddressSpace {",
            "StorageClass::Function => OclAddressSpace::Private,",
            "StorageClass::UniformConstant => OclAddressSpace::Constant,",
            "StorageClass::Generic => OclAddressSpace::Generic,",
            "_ => OclAddressSpace::NotApplicable,",
            "pub fn storage_class_from_ocl(addr: OclAddressSpace) -> Option<StorageClass> {",
            "OclAddressSpace::Private => Some(StorageClass::Function),",
            "OclAddressSpace::Constant => Some(StorageClass::UniformConstant),",
            "_ => None,",
            "pub enum GlslAddressSpace {",
        ],
    );
    assert!(!output.contains("glsl_address_space("));
    assert!(!output.contains("StorageClass::Input => OclAddressSpace"));
}

#[test]
fn test_duplicate_instruction_pair_aborts_run() {
    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let mut grammar = GRAMMAR.to_string();
    grammar.push_str(
        "def inst OpLoadAgain { set Core opcode 61 word_count 4 class Memory }\n",
    );

    // Scenario: two instructions with the same (opcode, opcode2) pair in the
    // same set abort the build; no artifact is produced.
    let err = spirv_tablegen::compile(&grammar, &session).unwrap_err();
    match err {
        TableGenError::DuplicateInstruction { set, opcode, opcode2 } => {
            assert_eq!(set, InstructionSet::Core);
            assert_eq!((opcode, opcode2), (61, 0));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_duplicate_enum_value_aborts_run() {
    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let mut grammar = GRAMMAR.to_string();
    grammar.push_str(
        "def enum SC_FunctionAgain { section StorageClass name \"FunctionAgain\" opcode 7 }\n",
    );

    let err = spirv_tablegen::compile(&grammar, &session).unwrap_err();
    match err {
        TableGenError::DuplicateEnumValue { section, opcode } => {
            assert_eq!(section, Section::StorageClass);
            assert_eq!(opcode, 7);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_session_statistics_after_compile() {
    let arena = Bump::new();
    let session = GrammarSession::new(&arena);
    let _ = spirv_tablegen::compile(GRAMMAR, &session).unwrap();

    let stats = session.stats();
    assert_eq!(stats.operands_read, 8);
    assert_eq!(stats.instructions_read, 8);
    assert_eq!(stats.section_counts["StorageClass"], 7);
    assert_eq!(stats.section_counts["Capabilities"], 5);
}
