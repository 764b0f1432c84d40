// This module walks the validated grammar tables and produces the generated
// Rust source artifact consumed by the backend: per-section enumeration
// definitions (mask sections become bit-constant newtypes, since duplicate
// discriminants are legal there), capability-lookup routines in three shapes
// (fixed, none, per-value), followed-literal lookup routines for the four
// sections whose values mandate trailing operands, sorted per-set instruction
// tables with a binary-search helper and a unified set index, and the
// storage-class/address-space correspondence tables per target environment.
// Emission is a pure transform over an already-validated model; it has no
// failure mode of its own. The per-section repetition of the original
// generator is replaced by iteration over the section catalog.

//! Table emitter: generated Rust source from the built grammar tables.

use crate::grammar::{
    CapabilityShape, EnumValue, Instruction, InstructionClass, InstructionSet, Operand, Section,
    TargetEnv,
};
use crate::tables::GrammarTables;

const PRELUDE: &str = r#"// Automatically generated by spirv-tablegen. Do not edit.

/// One operand slot, bit-packed for table density.
///
/// Low byte: tag (2 bits) | id qualifier (2 bits) | shape extension (4
/// bits). High byte: referenced-type payload for id operands, section number
/// for enumerated operands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Operand(pub u8, pub u8);

impl Operand {
    /// 1 = id, 2 = immediate, 3 = enumerated.
    pub const fn tag(self) -> u8 {
        self.0 & 0x3
    }

    pub const fn qualifier(self) -> u8 {
        (self.0 >> 2) & 0x3
    }

    pub const fn ext(self) -> u8 {
        self.0 >> 4
    }

    pub const fn payload(self) -> u8 {
        self.1
    }
}

pub type OperandList = &'static [Operand];
"#;

/// Produce the full generated source artifact.
pub fn generate(tables: &GrammarTables) -> String {
    let mut out = String::with_capacity(16 * 1024);
    out.push_str(PRELUDE);
    emit_enums(tables, &mut out);
    emit_capabilities(tables, &mut out);
    emit_followed_literals(tables, &mut out);
    emit_instruction_tables(tables, &mut out);
    emit_address_space_tables(tables, &mut out);
    log::debug!("generated {} bytes of table source", out.len());
    out
}

/// Sections that materialize as a type in the artifact: populated, and not
/// the magic-number pseudo-section.
fn emitted_sections(tables: &GrammarTables) -> Vec<Section> {
    Section::ALL
        .into_iter()
        .filter(|&s| s != Section::MagicNumber && !tables.section(s).is_empty())
        .collect()
}

/// Emitted variant name for a value. SPIR-V value names may start with a
/// digit (the Dim section); those get the section name prefixed, as the
/// reference headers do.
fn variant_name(section: Section, name: &str) -> String {
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{}{}", section.name(), name)
    } else {
        name.to_string()
    }
}

/// CamelCase value name to SCREAMING_SNAKE bit-constant name.
fn const_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::new();
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase()
            && i > 0
            && (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit())
        {
            out.push('_');
        }
        out.push(ch.to_ascii_uppercase());
    }
    out
}

fn operand_literal(op: &Operand) -> String {
    let (packed, payload) = op.packed_bits();
    format!("Operand({packed:#04x}, {payload})")
}

fn operand_list_literal(ops: &[Operand]) -> String {
    let items: Vec<String> = ops.iter().map(operand_literal).collect();
    format!("&[{}]", items.join(", "))
}

/// Walk a section's values skipping duplicated opcodes; mask sections allow
/// them, but one match arm per opcode is all a lookup can have.
fn distinct_by_opcode<'t, 'a>(values: &'t [EnumValue<'a>]) -> Vec<&'t EnumValue<'a>> {
    let mut out: Vec<&EnumValue> = Vec::with_capacity(values.len());
    for value in values {
        if out.last().map(|v| v.opcode) != Some(value.opcode) {
            out.push(value);
        }
    }
    out
}

fn emit_enums(tables: &GrammarTables, out: &mut String) {
    out.push_str("\n// Enumeration definitions, one per populated section.\n");
    for section in Section::ALL {
        if section == Section::MagicNumber {
            continue;
        }
        let values = tables.section(section);
        if values.is_empty() {
            if section == Section::Capabilities {
                out.push_str(
                    "\n// No capabilities declared by this grammar.\n\
                     pub type CapVec = &'static [u32];\n",
                );
            }
            continue;
        }

        if section.is_mask() {
            emit_mask_section(section, values, out);
        } else {
            emit_enum_section(section, values, out);
        }

        if section == Section::Capabilities {
            out.push_str("\npub type CapVec = &'static [Capabilities];\n");
        }
    }
}

fn emit_enum_section(section: Section, values: &[EnumValue], out: &mut String) {
    out.push_str(&format!(
        "\n#[repr(u32)]\n#[derive(Clone, Copy, PartialEq, Eq, Debug)]\npub enum {} {{\n",
        section.name()
    ));
    for value in values {
        out.push_str(&format!(
            "    {} = {},\n",
            variant_name(section, value.name),
            value.opcode
        ));
    }
    out.push_str("}\n");
}

fn emit_mask_section(section: Section, values: &[EnumValue], out: &mut String) {
    let name = section.name();
    out.push_str(&format!(
        "\n/// Bitmask section; values combine by union.\n\
         #[derive(Clone, Copy, PartialEq, Eq, Debug)]\npub struct {name}(pub u32);\n\n\
         impl {name} {{\n"
    ));
    for value in values {
        out.push_str(&format!(
            "    pub const {}: {name} = {name}({:#x});\n",
            const_name(value.name),
            value.opcode
        ));
    }
    out.push_str("}\n");
}

fn capability_ref(tables: &GrammarTables, opcode: u32) -> String {
    let name = tables
        .capability_name(opcode)
        .expect("unresolved capability escaped the builder");
    format!("Capabilities::{}", variant_name(Section::Capabilities, name))
}

fn emit_capabilities(tables: &GrammarTables, out: &mut String) {
    out.push_str(
        "\n// Capability lookup, one routine per section.\n\n\
         pub trait RequiredCapabilities {\n\
         \x20   /// Capabilities a module must declare to use this value; the set\n\
         \x20   /// is alternative (any one suffices), empty means none required.\n\
         \x20   fn required_capabilities(self) -> CapVec;\n\
         }\n",
    );

    for section in emitted_sections(tables) {
        let Some(shape) = section.capability_shape() else {
            continue;
        };
        let name = section.name();
        match shape {
            CapabilityShape::Fixed(cap) => {
                let cap = format!(
                    "Capabilities::{}",
                    variant_name(Section::Capabilities, cap)
                );
                out.push_str(&format!(
                    "\nimpl RequiredCapabilities for {name} {{\n\
                     \x20   fn required_capabilities(self) -> CapVec {{\n\
                     \x20       &[{cap}]\n\
                     \x20   }}\n}}\n"
                ));
            }
            CapabilityShape::None => {
                out.push_str(&format!(
                    "\nimpl RequiredCapabilities for {name} {{\n\
                     \x20   fn required_capabilities(self) -> CapVec {{\n\
                     \x20       &[]\n\
                     \x20   }}\n}}\n"
                ));
            }
            CapabilityShape::PerValue => {
                emit_per_value_capabilities(tables, section, out);
            }
        }
    }
}

fn emit_per_value_capabilities(tables: &GrammarTables, section: Section, out: &mut String) {
    let name = section.name();
    let values = tables.section(section);

    out.push_str(&format!(
        "\nimpl RequiredCapabilities for {name} {{\n\
         \x20   fn required_capabilities(self) -> CapVec {{\n"
    ));
    if section.is_mask() {
        out.push_str("        match self.0 {\n");
        for value in distinct_by_opcode(values) {
            if let Some(primary) = value.capabilities.primary() {
                out.push_str(&format!(
                    "            {:#x} => &[{}],\n",
                    value.opcode,
                    capability_ref(tables, primary)
                ));
            }
        }
        out.push_str("            _ => &[],\n        }\n");
    } else {
        out.push_str("        match self {\n");
        for value in values {
            let body = match value.capabilities.primary() {
                Some(primary) => format!("&[{}]", capability_ref(tables, primary)),
                None => "&[]".to_string(),
            };
            out.push_str(&format!(
                "            {name}::{} => {body},\n",
                variant_name(section, value.name)
            ));
        }
        out.push_str("        }\n");
    }
    out.push_str("    }\n}\n");
}

fn emit_followed_literals(tables: &GrammarTables, out: &mut String) {
    out.push_str(
        "\n// Followed-literal lookup: operands mandated after a value.\n\n\
         pub trait FollowedLiterals {\n\
         \x20   /// Operands that must immediately follow this value when used.\n\
         \x20   fn followed_literals(self) -> OperandList\n\
         \x20   where\n\
         \x20       Self: Sized,\n\
         \x20   {\n\
         \x20       &[]\n\
         \x20   }\n\
         }\n",
    );

    for section in emitted_sections(tables) {
        let name = section.name();
        if !section.has_followed_literals() {
            out.push_str(&format!("\nimpl FollowedLiterals for {name} {{}}\n"));
            continue;
        }

        let values = tables.section(section);
        out.push_str(&format!(
            "\nimpl FollowedLiterals for {name} {{\n\
             \x20   fn followed_literals(self) -> OperandList {{\n"
        ));
        if section.is_mask() {
            out.push_str("        match self.0 {\n");
            for value in distinct_by_opcode(values) {
                if !value.followed.is_empty() {
                    out.push_str(&format!(
                        "            {:#x} => {},\n",
                        value.opcode,
                        operand_list_literal(&value.followed)
                    ));
                }
            }
            out.push_str("            _ => &[],\n        }\n");
        } else {
            out.push_str("        match self {\n");
            for value in values {
                out.push_str(&format!(
                    "            {name}::{} => {},\n",
                    variant_name(section, value.name),
                    operand_list_literal(&value.followed)
                ));
            }
            out.push_str("        }\n");
        }
        out.push_str("    }\n}\n");
    }
}

fn emit_instruction_tables(tables: &GrammarTables, out: &mut String) {
    out.push_str("\n// Instruction tables, sorted by (opcode, opcode2) per set.\n");

    out.push_str("\n#[repr(u8)]\n#[derive(Clone, Copy, PartialEq, Eq, Debug)]\npub enum InstructionClass {\n");
    for class in InstructionClass::ALL {
        out.push_str(&format!("    {} = {},\n", class.name(), class as u8));
    }
    out.push_str("}\n");

    out.push_str(
        "\n#[derive(Clone, Copy, Debug)]\npub struct InstructionInfo {\n\
         \x20   pub opcode: u32,\n\
         \x20   pub opcode2: u32,\n\
         \x20   pub base_word_count: u32,\n\
         \x20   /// Operand index producing the result id, -1 for no result.\n\
         \x20   pub result_id_index: i32,\n\
         \x20   pub terminator: bool,\n\
         \x20   pub variable_length: bool,\n\
         \x20   pub class: InstructionClass,\n\
         \x20   pub name: &'static str,\n\
         \x20   pub operands: OperandList,\n\
         \x20   pub capabilities: CapVec,\n\
         }\n",
    );

    out.push_str(
        "\npub fn find_instruction(\n\
         \x20   table: &'static [InstructionInfo],\n\
         \x20   opcode: u32,\n\
         \x20   opcode2: u32,\n\
         ) -> Option<&'static InstructionInfo> {\n\
         \x20   table\n\
         \x20       .binary_search_by_key(&(opcode, opcode2), |inst| (inst.opcode, inst.opcode2))\n\
         \x20       .ok()\n\
         \x20       .map(|idx| &table[idx])\n\
         }\n",
    );

    out.push_str(
        "\n/// All instructions sharing a primary opcode, as a contiguous run.\n\
         pub fn find_instructions_by_opcode(\n\
         \x20   table: &'static [InstructionInfo],\n\
         \x20   opcode: u32,\n\
         ) -> &'static [InstructionInfo] {\n\
         \x20   let start = table.partition_point(|inst| inst.opcode < opcode);\n\
         \x20   let end = table.partition_point(|inst| inst.opcode <= opcode);\n\
         \x20   &table[start..end]\n\
         }\n",
    );

    let mut emitted_sets = Vec::new();
    for set in InstructionSet::ALL {
        let instructions = tables.instructions(set);
        if instructions.is_empty() {
            continue;
        }
        let static_name = format!("{}_INSTRUCTIONS", set.static_prefix());
        out.push_str(&format!(
            "\npub static {static_name}: &[InstructionInfo] = &[\n"
        ));
        for inst in instructions {
            out.push_str(&format!("    {},\n", instruction_literal(tables, inst)));
        }
        out.push_str("];\n");
        emitted_sets.push((set, static_name));
    }

    out.push_str("\npub static INSTRUCTION_SETS: &[(&str, &[InstructionInfo])] = &[\n");
    for (set, static_name) in &emitted_sets {
        out.push_str(&format!("    (\"{}\", {static_name}),\n", set.name()));
    }
    out.push_str("];\n");
}

fn instruction_literal(tables: &GrammarTables, inst: &Instruction) -> String {
    let caps: Vec<String> = inst
        .capabilities
        .iter()
        .map(|&cap| capability_ref(tables, cap))
        .collect();
    format!(
        "InstructionInfo {{ opcode: {}, opcode2: {}, base_word_count: {}, \
         result_id_index: {}, terminator: {}, variable_length: {}, \
         class: InstructionClass::{}, name: \"{}\", operands: {}, capabilities: &[{}] }}",
        inst.opcode,
        inst.opcode2,
        inst.base_word_count,
        inst.result_id_index.map(|i| i as i32).unwrap_or(-1),
        inst.is_terminator,
        inst.variable_length,
        inst.class.name(),
        inst.name,
        operand_list_literal(&inst.operands),
        caps.join(", ")
    )
}

fn emit_address_space_tables(tables: &GrammarTables, out: &mut String) {
    out.push_str("\n// Storage-class/address-space correspondence per target environment.\n");

    for env in TargetEnv::ALL {
        let type_name = env.type_name();
        out.push_str(&format!(
            "\n#[repr(u32)]\n#[derive(Clone, Copy, PartialEq, Eq, Debug)]\npub enum {type_name} {{\n"
        ));
        for &(space_name, value) in env.native_spaces() {
            out.push_str(&format!("    {space_name} = {value},\n"));
        }
        out.push_str("    NotApplicable = 0xffff_ffff,\n}\n");

        let pairs: Vec<(&EnumValue, u32)> = tables
            .section(Section::StorageClass)
            .iter()
            .filter_map(|v| v.address_space(env).map(|space| (v, space)))
            .collect();
        if pairs.is_empty() {
            // Reserved environment: native enum only, no mapping data yet.
            continue;
        }

        let suffix = env.fn_suffix();
        out.push_str(&format!(
            "\npub fn {suffix}_address_space(sc: StorageClass) -> {type_name} {{\n    match sc {{\n"
        ));
        for &(value, space) in &pairs {
            out.push_str(&format!(
                "        StorageClass::{} => {type_name}::{},\n",
                variant_name(Section::StorageClass, value.name),
                space_variant(env, space)
            ));
        }
        out.push_str(&format!(
            "        _ => {type_name}::NotApplicable,\n    }}\n}}\n"
        ));

        out.push_str(&format!(
            "\npub fn storage_class_from_{suffix}(addr: {type_name}) -> Option<StorageClass> {{\n    match addr {{\n"
        ));
        for &(value, space) in &pairs {
            out.push_str(&format!(
                "        {type_name}::{} => Some(StorageClass::{}),\n",
                space_variant(env, space),
                variant_name(Section::StorageClass, value.name)
            ));
        }
        out.push_str("        _ => None,\n    }\n}\n");
    }
}

fn space_variant(env: TargetEnv, space: u32) -> &'static str {
    env.space_name(space)
        .expect("unmapped address space escaped population")
}
