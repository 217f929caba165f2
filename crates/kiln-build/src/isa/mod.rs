//! Instruction sets
//!
//! An instruction set is a set of capability tags plus the flag family that
//! turns the tags into compiler flags. Tags of one family are combined before
//! flags are generated, so the generator can emit the minimal flag list
//! (`{sse3, avx2}` yields only the AVX2 flags).

pub mod arm;
pub mod x86;

use crate::error::{BuildError, BuildResult};
use crate::toolchain::CompilerKind;
use std::collections::BTreeSet;
use std::fmt;

/// Flag-generation function shared by a group of instruction sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagFamily {
    X86Simd,
    X86Crypto,
    X86Scalar,
    Arm,
}

impl FlagFamily {
    /// Generate compiler flags for a tag set
    pub fn generate(self, tags: &BTreeSet<&'static str>, compiler: CompilerKind) -> Vec<String> {
        match self {
            FlagFamily::X86Simd => x86::simd_flags(tags, compiler),
            FlagFamily::X86Crypto => x86::crypto_flags(tags, compiler),
            FlagFamily::X86Scalar => x86::scalar_flags(tags, compiler),
            FlagFamily::Arm => arm::flags(tags, compiler),
        }
    }
}

/// A set of instruction-set tags sharing one flag family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionSet {
    tags: BTreeSet<&'static str>,
    family: Option<FlagFamily>,
}

impl InstructionSet {
    /// Empty instruction set without a flag family
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-tag instruction set
    pub fn tag(tag: &'static str, family: FlagFamily) -> Self {
        Self {
            tags: BTreeSet::from([tag]),
            family: Some(family),
        }
    }

    /// Instruction set from several tags of one family
    pub fn from_tags<I>(tags: I, family: FlagFamily) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        Self {
            tags: tags.into_iter().collect(),
            family: Some(family),
        }
    }

    pub fn tags(&self) -> &BTreeSet<&'static str> {
        &self.tags
    }

    pub fn family(&self) -> Option<FlagFamily> {
        self.family
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Union of two instruction sets
    ///
    /// Fails when both sets have a flag family and the families differ.
    pub fn merge(&self, other: &InstructionSet) -> BuildResult<InstructionSet> {
        let family = match (self.family, other.family) {
            (Some(a), Some(b)) if a != b => {
                return Err(BuildError::IncompatibleInstructionSets {
                    left: self.to_string(),
                    right: other.to_string(),
                })
            }
            (a, b) => a.or(b),
        };
        Ok(InstructionSet {
            tags: self.tags.union(&other.tags).copied().collect(),
            family,
        })
    }

    /// Compiler flags enabling this instruction set
    pub fn flags(&self, compiler: CompilerKind) -> Vec<String> {
        match self.family {
            Some(family) => family.generate(&self.tags, compiler),
            None => Vec::new(),
        }
    }
}

impl fmt::Display for InstructionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.tags.iter().copied().collect();
        f.write_str(&tags.join("+"))
    }
}

/// Instruction sets of different flag families used together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionSets {
    sets: Vec<InstructionSet>,
}

impl InstructionSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instruction set, merging it into an existing set of the same family
    pub fn add(&mut self, isa: InstructionSet) {
        match self
            .sets
            .iter_mut()
            .find(|existing| existing.family == isa.family)
        {
            Some(existing) => existing.tags.extend(isa.tags),
            None => self.sets.push(isa),
        }
    }

    /// Builder form of [`InstructionSets::add`]
    pub fn with(mut self, isa: InstructionSet) -> Self {
        self.add(isa);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sets.iter().all(InstructionSet::is_empty)
    }

    /// Concatenated flags of every contained set
    pub fn flags(&self, compiler: CompilerKind) -> Vec<String> {
        self.sets.iter().flat_map(|isa| isa.flags(compiler)).collect()
    }
}

impl From<InstructionSet> for InstructionSets {
    fn from(isa: InstructionSet) -> Self {
        InstructionSets::new().with(isa)
    }
}

impl fmt::Display for InstructionSets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sets: Vec<String> = self.sets.iter().map(ToString::to_string).collect();
        f.write_str(&sets.join("+"))
    }
}
