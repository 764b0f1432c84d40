// This module marshals record-store entries into raw descriptor collections.
// One reader per record class: operand records become Operand descriptors
// keyed by name, enum records become EnumValue descriptors tagged with their
// still-unresolved capability and followed-operand names, and inst records
// become Instruction descriptors with unresolved operand and capability
// names. Field-shape violations (missing fields, wrong types, unknown
// section/class/qualifier names, out-of-range opcodes, too many capability
// alternatives, address spaces outside the target environment's model) are
// MalformedEntry errors and abort the run here, at population time. Name
// resolution is deliberately left to the table builder, which owns the
// cross-reference pass.

//! Record store to raw descriptor marshalling.

use hashbrown::HashMap;

use crate::core::{GrammarSession, TableGenResult};
use crate::grammar::{
    CapabilitySet, EnumValue, IdQualifier, Instruction, InstructionClass, InstructionSet, Operand,
    OperandKind, ReferencedType, Section, ShapeExt, TargetEnv,
};
use crate::records::{FieldValue, Record, RecordSource};

/// Everything read from the record store, before cross-reference resolution.
#[derive(Debug)]
pub struct RawGrammar<'a> {
    /// Operand descriptors by name.
    pub operands: HashMap<&'a str, Operand<'a>>,
    pub enums: Vec<RawEnumValue<'a>>,
    pub instructions: Vec<RawInstruction<'a>>,
}

/// An enum value with unresolved references.
#[derive(Debug)]
pub struct RawEnumValue<'a> {
    pub value: EnumValue<'a>,
    pub capability_names: Vec<&'a str>,
    pub followed_names: Vec<&'a str>,
}

/// An instruction with unresolved references.
#[derive(Debug)]
pub struct RawInstruction<'a> {
    pub inst: Instruction<'a>,
    pub capability_names: Vec<&'a str>,
    pub operand_names: Vec<&'a str>,
}

/// Read all grammar records into raw descriptor collections.
pub fn populate<'a>(
    source: &dyn RecordSource,
    session: &GrammarSession<'a>,
) -> TableGenResult<RawGrammar<'a>> {
    let operands = populate_operands(source, session)?;
    let enums = populate_enums(source, session)?;
    let instructions = populate_instructions(source, session)?;

    log::debug!(
        "populated {} operands, {} enum values, {} instructions",
        operands.len(),
        enums.len(),
        instructions.len()
    );

    Ok(RawGrammar {
        operands,
        enums,
        instructions,
    })
}

/// The descriptor name: an explicit `name` string field, or the entry name.
/// Record names must be store-unique, while value names only need to be
/// distinct within their section, so sections reusing names (the `None` bits
/// of several mask sections, say) use prefixed entry names plus `name`.
fn entry_name<'a>(rec: &Record, session: &GrammarSession<'a>) -> TableGenResult<&'a str> {
    Ok(session.intern_str(rec.get_str_opt("name")?.unwrap_or(&rec.name)))
}

/// A list field whose items must all be entry references.
fn ref_list<'a>(
    rec: &Record,
    field: &str,
    session: &GrammarSession<'a>,
) -> TableGenResult<Vec<&'a str>> {
    let mut out = Vec::new();
    for item in rec.get_list(field)? {
        match item {
            FieldValue::Ref(name) => out.push(session.intern_str(name)),
            other => {
                return Err(rec.malformed(format!(
                    "field `{field}` holds a {}, expected references",
                    other.type_name()
                )))
            }
        }
    }
    Ok(out)
}

fn populate_operands<'a>(
    source: &dyn RecordSource,
    session: &GrammarSession<'a>,
) -> TableGenResult<HashMap<&'a str, Operand<'a>>> {
    let mut operands = HashMap::new();
    for rec in source.records_of("operand") {
        let operand = read_operand(rec, session)?;
        operands.insert(session.intern_str(&rec.name), operand);
        session.record_operand();
    }
    Ok(operands)
}

fn read_operand<'a>(rec: &Record, session: &GrammarSession<'a>) -> TableGenResult<Operand<'a>> {
    let name = entry_name(rec, session)?;

    let kind_name = rec.get_ref("kind")?;
    let kind = match kind_name {
        "Id" => {
            let q = rec.get_ref("qualifier")?;
            let qualifier = IdQualifier::parse(q)
                .ok_or_else(|| rec.malformed(format!("unknown id qualifier `{q}`")))?;
            let t = rec.get_ref("type")?;
            let ty = ReferencedType::parse(t)
                .ok_or_else(|| rec.malformed(format!("unknown referenced type `{t}`")))?;
            OperandKind::Id { qualifier, ty }
        }
        "Imm" => OperandKind::Immediate,
        "Enum" => {
            let s = rec.get_ref("section")?;
            let section = Section::parse(s)
                .ok_or_else(|| rec.malformed(format!("unknown section `{s}`")))?;
            OperandKind::Enumerated { section }
        }
        other => return Err(rec.malformed(format!("unknown operand kind `{other}`"))),
    };

    let shape = match rec.get_ref_opt("shape")? {
        Some(s) => ShapeExt::parse(s)
            .ok_or_else(|| rec.malformed(format!("unknown shape extension `{s}`")))?,
        None => ShapeExt::Scalar,
    };

    let literal = match rec.get_str_opt("literal")? {
        Some(s) => {
            if !matches!(kind, OperandKind::Immediate) {
                return Err(rec.malformed("literal text on a non-immediate operand"));
            }
            Some(session.intern_str(s))
        }
        None => None,
    };

    Ok(Operand {
        kind,
        shape,
        name,
        literal,
    })
}

fn populate_enums<'a>(
    source: &dyn RecordSource,
    session: &GrammarSession<'a>,
) -> TableGenResult<Vec<RawEnumValue<'a>>> {
    let mut enums = Vec::new();
    for rec in source.records_of("enum") {
        let raw = read_enum_value(rec, session)?;
        session.record_enum_value(raw.value.section);
        enums.push(raw);
    }
    Ok(enums)
}

fn read_enum_value<'a>(
    rec: &Record,
    session: &GrammarSession<'a>,
) -> TableGenResult<RawEnumValue<'a>> {
    let s = rec.get_ref("section")?;
    let section =
        Section::parse(s).ok_or_else(|| rec.malformed(format!("unknown section `{s}`")))?;
    let opcode = rec.get_u32("opcode")?;

    let capability_names = ref_list(rec, "caps", session)?;
    if capability_names.len() > CapabilitySet::MAX {
        return Err(rec.malformed(format!(
            "{} capability alternatives, at most {} supported",
            capability_names.len(),
            CapabilitySet::MAX
        )));
    }
    let followed_names = ref_list(rec, "followed", session)?;

    let mut address_spaces = [None; TargetEnv::COUNT];
    for env in TargetEnv::ALL {
        if let Some(space) = rec.get_u32_opt(env.field_name())? {
            if section != Section::StorageClass {
                return Err(rec.malformed(format!(
                    "address-space mapping on a {section} value, only StorageClass values map"
                )));
            }
            if env.space_name(space).is_none() {
                return Err(rec.malformed(format!("{env} has no address space {space}")));
            }
            address_spaces[env.index()] = Some(space);
        }
    }

    let value = EnumValue {
        opcode,
        section,
        name: entry_name(rec, session)?,
        capabilities: CapabilitySet::new(),
        is_mask: section.is_mask(),
        is_id: rec.get_flag("id_ref")?,
        followed: Vec::new(),
        address_spaces,
    };

    Ok(RawEnumValue {
        value,
        capability_names,
        followed_names,
    })
}

fn populate_instructions<'a>(
    source: &dyn RecordSource,
    session: &GrammarSession<'a>,
) -> TableGenResult<Vec<RawInstruction<'a>>> {
    let mut instructions = Vec::new();
    for rec in source.records_of("inst") {
        instructions.push(read_instruction(rec, session)?);
        session.record_instruction();
    }
    Ok(instructions)
}

fn read_instruction<'a>(
    rec: &Record,
    session: &GrammarSession<'a>,
) -> TableGenResult<RawInstruction<'a>> {
    let set_name = rec.get_ref("set")?;
    let iset = InstructionSet::parse(set_name)
        .ok_or_else(|| rec.malformed(format!("unknown instruction set `{set_name}`")))?;

    let opcode = rec.get_u32("opcode")?;
    let opcode2 = rec.get_u32_opt("opcode2")?.unwrap_or(0);
    if iset == InstructionSet::Core && opcode2 != 0 {
        return Err(rec.malformed("secondary opcode on a core instruction"));
    }

    let class_name = rec.get_ref("class")?;
    let class = InstructionClass::parse(class_name)
        .ok_or_else(|| rec.malformed(format!("unknown instruction class `{class_name}`")))?;

    let inst = Instruction {
        opcode,
        opcode2,
        name: entry_name(rec, session)?,
        base_word_count: rec.get_u32("word_count")?,
        result_id_index: rec.get_u32_opt("result_index")?,
        is_terminator: rec.get_flag("terminator")?,
        variable_length: rec.get_flag("variable_length")?,
        class,
        iset,
        operands: Vec::new(),
        capabilities: Vec::new(),
    };

    Ok(RawInstruction {
        inst,
        capability_names: ref_list(rec, "caps", session)?,
        operand_names: ref_list(rec, "operands", session)?,
    })
}
