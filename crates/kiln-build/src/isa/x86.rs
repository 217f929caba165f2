//! x86 instruction sets
//!
//! Three flag families: SIMD extensions (SSE3 through AVX2), crypto
//! extensions, and scalar bit-manipulation extensions.

use super::{FlagFamily, InstructionSet};
use crate::toolchain::CompilerKind;
use std::collections::BTreeSet;

/// SIMD tags from widest to narrowest, with the flags each one emits
const SIMD_FLAGS: &[(&str, &[&str])] = &[
    ("avx2", &["-mf16c", "-mfma", "-mavx2"]),
    ("fma4", &["-mavx", "-mfma4"]),
    ("fma3", &["-mavx", "-mf16c", "-mfma"]),
    ("xop", &["-mavx", "-mxop"]),
    ("f16c", &["-mavx", "-mf16c"]),
    ("avx", &["-mavx"]),
    ("sse4.2", &["-msse4.2"]),
    ("sse4.1", &["-msse4.1"]),
    ("ssse3", &["-mssse3"]),
    ("sse3", &["-msse3"]),
];

/// Tags implied by each wider SIMD tag
const SIMD_SUBSETS: &[(&str, &[&str])] = &[
    ("avx2", &["sse3", "ssse3", "sse4.1", "sse4.2", "avx", "fma3", "f16c"]),
    ("fma4", &["sse3", "ssse3", "sse4.1", "sse4.2", "avx"]),
    ("fma3", &["sse3", "ssse3", "sse4.1", "sse4.2", "avx", "f16c"]),
    ("xop", &["sse3", "ssse3", "sse4.1", "sse4.2", "avx"]),
    ("f16c", &["sse3", "ssse3", "sse4.1", "sse4.2", "avx"]),
    ("avx", &["sse3", "ssse3", "sse4.1", "sse4.2"]),
    ("sse4.2", &["sse3", "ssse3", "sse4.1"]),
    ("sse4.1", &["sse3", "ssse3"]),
    ("ssse3", &["sse3"]),
];

/// Every SIMD tag
pub const SIMD_TAGS: &[&str] = &[
    "sse3", "ssse3", "sse4.1", "sse4.2", "avx", "f16c", "fma3", "fma4", "xop", "avx2",
];

/// Tags implied by `tag`
pub fn simd_subsets(tag: &str) -> &'static [&'static str] {
    SIMD_SUBSETS
        .iter()
        .find(|(wide, _)| *wide == tag)
        .map(|(_, subsets)| *subsets)
        .unwrap_or(&[])
}

pub(crate) fn simd_flags(tags: &BTreeSet<&'static str>, _compiler: CompilerKind) -> Vec<String> {
    let mut remaining = tags.clone();
    let mut flags: Vec<String> = Vec::new();
    for (tag, tag_flags) in SIMD_FLAGS {
        if !remaining.contains(tag) {
            continue;
        }
        for flag in *tag_flags {
            if !flags.iter().any(|f| f.as_str() == *flag) {
                flags.push(flag.to_string());
            }
        }
        for subset in simd_subsets(tag) {
            remaining.remove(subset);
        }
    }
    flags
}

pub(crate) fn crypto_flags(tags: &BTreeSet<&'static str>, _compiler: CompilerKind) -> Vec<String> {
    [("aes", "-maes"), ("pclmulqdq", "-mpclmul"), ("sha", "-msha")]
        .iter()
        .filter(|(tag, _)| tags.contains(tag))
        .map(|(_, flag)| flag.to_string())
        .collect()
}

pub(crate) fn scalar_flags(tags: &BTreeSet<&'static str>, _compiler: CompilerKind) -> Vec<String> {
    let mut flags = Vec::new();
    if tags.contains("bmi2") {
        flags.push("-mbmi2".to_string());
    } else if tags.contains("bmi") {
        flags.push("-mbmi".to_string());
    }
    for (tag, flag) in [("tbm", "-mtbm"), ("popcnt", "-mpopcnt"), ("lzcnt", "-mlzcnt")] {
        if tags.contains(tag) {
            flags.push(flag.to_string());
        }
    }
    flags
}

fn simd(tag: &'static str) -> InstructionSet {
    InstructionSet::tag(tag, FlagFamily::X86Simd)
}

pub fn sse3() -> InstructionSet {
    simd("sse3")
}

pub fn ssse3() -> InstructionSet {
    simd("ssse3")
}

pub fn sse4_1() -> InstructionSet {
    simd("sse4.1")
}

pub fn sse4_2() -> InstructionSet {
    simd("sse4.2")
}

pub fn avx() -> InstructionSet {
    simd("avx")
}

pub fn f16c() -> InstructionSet {
    simd("f16c")
}

pub fn fma3() -> InstructionSet {
    simd("fma3")
}

pub fn fma4() -> InstructionSet {
    simd("fma4")
}

pub fn xop() -> InstructionSet {
    simd("xop")
}

pub fn avx2() -> InstructionSet {
    simd("avx2")
}

pub fn aes() -> InstructionSet {
    InstructionSet::tag("aes", FlagFamily::X86Crypto)
}

pub fn pclmulqdq() -> InstructionSet {
    InstructionSet::tag("pclmulqdq", FlagFamily::X86Crypto)
}

pub fn sha() -> InstructionSet {
    InstructionSet::tag("sha", FlagFamily::X86Crypto)
}

pub fn lzcnt() -> InstructionSet {
    InstructionSet::tag("lzcnt", FlagFamily::X86Scalar)
}

pub fn popcnt() -> InstructionSet {
    InstructionSet::tag("popcnt", FlagFamily::X86Scalar)
}

pub fn tbm() -> InstructionSet {
    InstructionSet::tag("tbm", FlagFamily::X86Scalar)
}

pub fn bmi() -> InstructionSet {
    InstructionSet::tag("bmi", FlagFamily::X86Scalar)
}

pub fn bmi2() -> InstructionSet {
    InstructionSet::tag("bmi2", FlagFamily::X86Scalar)
}
