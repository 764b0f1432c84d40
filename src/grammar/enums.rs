// This module defines the enum value descriptor: one instance per named value
// of an enumeration section. A value carries its section-local opcode, an
// alternative set of up to three required capabilities (at least one of which
// must be enabled), mask and id-reference flags, the ordered operands that
// must follow the value when it is used, and, for StorageClass values, the
// optional correspondence to a target execution environment's native address
// space. The capability set preserves all three alternatives for fidelity
// even though emitted lookups consult only the first.

use crate::grammar::{Operand, Section};
use std::fmt;

/// Alternative set of required capabilities, at most three.
///
/// Semantics are "at least one of these must be enabled", not conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet {
    caps: [u32; Self::MAX],
    len: u8,
}

impl CapabilitySet {
    /// A given enum value only ever has three leaf capabilities.
    pub const MAX: usize = 3;

    pub fn new() -> Self {
        Self::default()
    }

    /// Append a capability opcode. Panics when the set is full; callers
    /// validate the alternative count before resolution.
    pub fn push(&mut self, cap: u32) {
        assert!((self.len as usize) < Self::MAX, "capability set overflow");
        self.caps[self.len as usize] = cap;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The first alternative, the only one consulted by emitted lookups.
    pub fn primary(&self) -> Option<u32> {
        self.as_slice().first().copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.caps[..self.len as usize]
    }
}

/// Target execution environments with a native address-space model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum TargetEnv {
    OpenCl = 0,
    /// Reserved: the native enum is emitted, mapping data is not yet defined.
    Glsl = 1,
}

impl TargetEnv {
    pub const COUNT: usize = 2;

    pub const ALL: [TargetEnv; TargetEnv::COUNT] = [TargetEnv::OpenCl, TargetEnv::Glsl];

    pub fn name(self) -> &'static str {
        match self {
            TargetEnv::OpenCl => "OpenCL",
            TargetEnv::Glsl => "GLSL",
        }
    }

    /// Emitted native address-space type name.
    pub fn type_name(self) -> &'static str {
        match self {
            TargetEnv::OpenCl => "OclAddressSpace",
            TargetEnv::Glsl => "GlslAddressSpace",
        }
    }

    /// Suffix used in emitted correspondence function names.
    pub fn fn_suffix(self) -> &'static str {
        match self {
            TargetEnv::OpenCl => "ocl",
            TargetEnv::Glsl => "glsl",
        }
    }

    /// Record field naming the native space of a StorageClass value.
    pub fn field_name(self) -> &'static str {
        match self {
            TargetEnv::OpenCl => "ocl_as",
            TargetEnv::Glsl => "glsl_as",
        }
    }

    /// The environment's native address spaces, name and numeric value.
    pub fn native_spaces(self) -> &'static [(&'static str, u32)] {
        match self {
            TargetEnv::OpenCl => &[
                ("Private", 0),
                ("Global", 1),
                ("Local", 2),
                ("Constant", 3),
                ("Generic", 4),
            ],
            TargetEnv::Glsl => &[("Private", 0), ("Constant", 3)],
        }
    }

    pub fn space_name(self, space: u32) -> Option<&'static str> {
        self.native_spaces()
            .iter()
            .find(|&&(_, v)| v == space)
            .map(|&(name, _)| name)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TargetEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One named value of an enumeration section.
#[derive(Debug, Clone)]
pub struct EnumValue<'a> {
    /// Section-local numeric value.
    pub opcode: u32,
    pub section: Section,
    pub name: &'a str,
    pub capabilities: CapabilitySet,
    /// Derived from the section: bitmask-combinable rather than exclusive.
    pub is_mask: bool,
    /// The value's accompanying operand is an id rather than a literal.
    pub is_id: bool,
    /// Operands mandated to immediately follow this value when used.
    pub followed: Vec<Operand<'a>>,
    /// Native address space per target environment, indexed by
    /// [`TargetEnv::index`]. Populated only for StorageClass values with a
    /// native counterpart.
    pub address_spaces: [Option<u32>; TargetEnv::COUNT],
}

impl<'a> EnumValue<'a> {
    pub fn address_space(&self, env: TargetEnv) -> Option<u32> {
        self.address_spaces[env.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set_push_and_primary() {
        let mut caps = CapabilitySet::new();
        assert!(caps.is_empty());
        assert_eq!(caps.primary(), None);

        caps.push(6);
        caps.push(11);
        assert_eq!(caps.len(), 2);
        assert_eq!(caps.primary(), Some(6));
        assert_eq!(caps.as_slice(), &[6, 11]);
    }

    #[test]
    #[should_panic(expected = "capability set overflow")]
    fn test_capability_set_overflow_panics() {
        let mut caps = CapabilitySet::new();
        caps.push(1);
        caps.push(2);
        caps.push(3);
        caps.push(4);
    }

    #[test]
    fn test_target_env_spaces() {
        assert_eq!(TargetEnv::OpenCl.space_name(0), Some("Private"));
        assert_eq!(TargetEnv::OpenCl.space_name(4), Some("Generic"));
        assert_eq!(TargetEnv::OpenCl.space_name(9), None);
        assert_eq!(TargetEnv::Glsl.native_spaces().len(), 2);
    }
}
