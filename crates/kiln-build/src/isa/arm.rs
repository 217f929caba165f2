//! ARM instruction sets
//!
//! All ARM tags share one flag family: a decision tree that picks exactly one
//! `-march=` and at most one `-mfpu=` for the combined tag set.

use super::{FlagFamily, InstructionSet};
use crate::toolchain::CompilerKind;
use std::collections::BTreeSet;

/// Every ARM tag
pub const TAGS: &[&str] = &["v8", "crypto", "neon", "d32", "fma", "fp16"];

pub(crate) fn flags(tags: &BTreeSet<&'static str>, _compiler: CompilerKind) -> Vec<String> {
    if tags.is_empty() {
        return Vec::new();
    }
    let has = |tag: &str| tags.contains(tag);

    let march = if has("crypto") {
        "armv8-a+crypto"
    } else if has("v8") {
        "armv8-a"
    } else {
        "armv7-a"
    };

    let fpu = if has("crypto") {
        Some("crypto-neon-fp-armv8")
    } else if has("v8") {
        Some(if has("neon") { "neon-fp-armv8" } else { "fp-armv8" })
    } else if has("neon") {
        Some(if has("fma") {
            "neon-vfpv4"
        } else if has("fp16") {
            "neon-fp16"
        } else {
            "neon"
        })
    } else if has("d32") {
        Some(if has("fma") {
            "vfpv4"
        } else if has("fp16") {
            "vfpv3-fp16"
        } else {
            "vfpv3"
        })
    } else if has("fma") {
        Some("vfpv4-d16")
    } else if has("fp16") {
        Some("vfpv3-d16-fp16")
    } else {
        None
    };

    let mut flags = vec![format!("-march={}", march)];
    if let Some(fpu) = fpu {
        flags.push(format!("-mfpu={}", fpu));
        flags.push("-mfp16-format=ieee".to_string());
    }
    flags
}

fn arm(tag: &'static str) -> InstructionSet {
    InstructionSet::tag(tag, FlagFamily::Arm)
}

/// ARMv8 base architecture
pub fn v8() -> InstructionSet {
    arm("v8")
}

/// ARMv8 crypto extensions (implies ARMv8)
pub fn crypto() -> InstructionSet {
    arm("crypto")
}

/// Advanced SIMD
pub fn neon() -> InstructionSet {
    arm("neon")
}

/// 32 double-precision VFP registers
pub fn d32() -> InstructionSet {
    arm("d32")
}

/// Fused multiply-add (VFPv4)
pub fn fma() -> InstructionSet {
    arm("fma")
}

/// Half-precision conversions
pub fn fp16() -> InstructionSet {
    arm("fp16")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn arm_flags(tags: &[&'static str]) -> Vec<String> {
        InstructionSet::from_tags(tags.iter().copied(), FlagFamily::Arm).flags(CompilerKind::Gnu)
    }

    #[test]
    fn test_neon_fma() {
        let isa = neon().merge(&fma()).unwrap();
        assert_eq!(
            isa.flags(CompilerKind::Gnu),
            vec!["-march=armv7-a", "-mfpu=neon-vfpv4", "-mfp16-format=ieee"]
        );
    }

    #[rstest]
    #[case(&["neon"], &["-march=armv7-a", "-mfpu=neon", "-mfp16-format=ieee"])]
    #[case(&["neon", "fp16"], &["-march=armv7-a", "-mfpu=neon-fp16", "-mfp16-format=ieee"])]
    #[case(&["d32"], &["-march=armv7-a", "-mfpu=vfpv3", "-mfp16-format=ieee"])]
    #[case(&["d32", "fma"], &["-march=armv7-a", "-mfpu=vfpv4", "-mfp16-format=ieee"])]
    #[case(&["fp16"], &["-march=armv7-a", "-mfpu=vfpv3-d16-fp16", "-mfp16-format=ieee"])]
    #[case(&["v8"], &["-march=armv8-a", "-mfpu=fp-armv8", "-mfp16-format=ieee"])]
    #[case(&["v8", "neon"], &["-march=armv8-a", "-mfpu=neon-fp-armv8", "-mfp16-format=ieee"])]
    #[case(&["crypto"], &["-march=armv8-a+crypto", "-mfpu=crypto-neon-fp-armv8", "-mfp16-format=ieee"])]
    fn test_arm_flags(#[case] tags: &[&'static str], #[case] expected: &[&str]) {
        assert_eq!(arm_flags(tags), expected);
    }

    #[test]
    fn test_empty_set() {
        assert!(arm_flags(&[]).is_empty());
    }
}
