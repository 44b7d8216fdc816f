//! Static kernel tables and variant selection.
//!
//! [`KERNEL_NAMES`] fixes the numeric index of every kernel function, with
//! the interpreter versions in which that index exists. [`KERNEL_FUNCTIONS`]
//! lists implementations; a name may have several variants for different
//! versions or platforms. When more than one variant applies, the one with
//! the narrowest version range wins, then the one with the narrowest
//! platform mask. Two variants equally narrow on both is a table defect.

use std::fmt::Write;
use std::sync::Arc;

use types::{Platform, PlatformMask, SciVersion, VersionRange};

use super::functions::{lists, misc, objects};
use super::signature::{self, Signature};
use super::KernelHandler;
use crate::error::KernelTableError;

pub const KERNEL_CLONE: u16 = 0;
pub const KERNEL_DISPOSE_CLONE: u16 = 1;
pub const KERNEL_IS_OBJECT: u16 = 2;
pub const KERNEL_SCRIPT_ID: u16 = 3;
pub const KERNEL_DISPOSE_SCRIPT: u16 = 4;
pub const KERNEL_NEW_LIST: u16 = 5;
pub const KERNEL_DISPOSE_LIST: u16 = 6;
pub const KERNEL_NEW_NODE: u16 = 7;
pub const KERNEL_FIRST_NODE: u16 = 8;
pub const KERNEL_LAST_NODE: u16 = 9;
pub const KERNEL_NEXT_NODE: u16 = 10;
pub const KERNEL_PREV_NODE: u16 = 11;
pub const KERNEL_NODE_VALUE: u16 = 12;
pub const KERNEL_ADD_TO_END: u16 = 13;
pub const KERNEL_ADD_TO_FRONT: u16 = 14;
pub const KERNEL_DELETE_KEY: u16 = 15;
pub const KERNEL_FIND_KEY: u16 = 16;
pub const KERNEL_ABS: u16 = 17;
pub const KERNEL_RANDOM: u16 = 18;
pub const KERNEL_STR_LEN: u16 = 19;
pub const KERNEL_MEMORY: u16 = 20;
pub const KERNEL_DO_SOUND: u16 = 21;
pub const KERNEL_GRAPH: u16 = 22;
pub const KERNEL_PLATFORM: u16 = 23;
pub const KERNEL_DO_AVOIDER: u16 = 24;

#[derive(Debug, Clone, Copy)]
pub struct KernelName {
    pub name: &'static str,
    pub versions: VersionRange,
}

const fn name(name: &'static str) -> KernelName {
    KernelName { name, versions: VersionRange::ALL }
}

const fn name_in(name: &'static str, versions: VersionRange) -> KernelName {
    KernelName { name, versions }
}

/// Kernel function names by index.
pub static KERNEL_NAMES: &[KernelName] = &[
    name("Clone"),
    name("DisposeClone"),
    name("IsObject"),
    name("ScriptID"),
    name("DisposeScript"),
    name("NewList"),
    name("DisposeList"),
    name("NewNode"),
    name("FirstNode"),
    name("LastNode"),
    name("NextNode"),
    name("PrevNode"),
    name("NodeValue"),
    name("AddToEnd"),
    name("AddToFront"),
    name("DeleteKey"),
    name("FindKey"),
    name("Abs"),
    name("Random"),
    name("StrLen"),
    name_in("Memory", VersionRange::from(SciVersion::Sci1Early)),
    name("DoSound"),
    name("Graph"),
    name_in("Platform", VersionRange::from(SciVersion::Sci1Middle)),
    name_in("DoAvoider", VersionRange::until(SciVersion::Sci01)),
];

#[derive(Debug, Clone, Copy)]
pub struct KernelFunctionDef {
    pub name: &'static str,
    pub signature: &'static str,
    pub versions: VersionRange,
    pub platforms: PlatformMask,
    /// `None` for functions this build knows about but does not implement.
    pub handler: Option<KernelHandler>,
}

const fn def(name: &'static str, signature: &'static str, handler: KernelHandler) -> KernelFunctionDef {
    KernelFunctionDef {
        name,
        signature,
        versions: VersionRange::ALL,
        platforms: PlatformMask::ALL,
        handler: Some(handler),
    }
}

pub static KERNEL_FUNCTIONS: &[KernelFunctionDef] = &[
    def("Clone", "o", objects::k_clone),
    def("DisposeClone", "o", objects::k_dispose_clone),
    def("IsObject", ".", objects::k_is_object),
    def("ScriptID", "i(i)", objects::k_script_id),
    def("DisposeScript", "i(i*)", objects::k_dispose_script),
    def("NewList", "", lists::k_new_list),
    def("DisposeList", "l", lists::k_dispose_list),
    def("NewNode", ".(.)", lists::k_new_node),
    def("FirstNode", "[l0]", lists::k_first_node),
    def("LastNode", "[l0]", lists::k_last_node),
    def("NextNode", "n", lists::k_next_node),
    def("PrevNode", "n", lists::k_prev_node),
    def("NodeValue", "[n0]", lists::k_node_value),
    def("AddToEnd", "ln", lists::k_add_to_end),
    def("AddToFront", "ln", lists::k_add_to_front),
    def("DeleteKey", "l.", lists::k_delete_key),
    def("FindKey", "l.", lists::k_find_key),
    def("Abs", "i", misc::k_abs),
    def("Random", "i(i)", misc::k_random),
    def("StrLen", "[r0]", misc::k_str_len),
    def("Memory", "i(.*)", misc::k_memory),
    KernelFunctionDef {
        name: "DoSound",
        signature: "i(.*)",
        versions: VersionRange::ALL,
        platforms: PlatformMask::ALL,
        handler: None,
    },
    def("Platform", "(.*)", misc::k_platform),
    KernelFunctionDef {
        name: "Platform",
        signature: "(.*)",
        versions: VersionRange::ALL,
        platforms: PlatformMask::only(Platform::Macintosh),
        handler: Some(misc::k_platform_mac),
    },
    KernelFunctionDef {
        name: "Platform",
        signature: "(.*)",
        versions: VersionRange::from(SciVersion::Sci2),
        platforms: PlatformMask::ALL,
        handler: Some(misc::k_platform_32),
    },
];

/// The variant chosen for one kernel index.
#[derive(Debug, Clone)]
pub struct KernelEntry {
    pub name: &'static str,
    /// `None` when no definition exists for the name at all.
    pub signature: Option<Arc<Signature>>,
    pub handler: Option<KernelHandler>,
    pub versions: VersionRange,
    pub platforms: PlatformMask,
}

/// Resolves every index of `names` against `functions` for one build.
/// Indices whose name does not exist in `version` come back as `None`.
pub fn select(
    names: &[KernelName],
    functions: &[KernelFunctionDef],
    version: SciVersion,
    platform: Platform,
) -> Result<Vec<Option<KernelEntry>>, KernelTableError> {
    let mut entries = Vec::with_capacity(names.len());
    for kernel in names {
        if !kernel.versions.contains(version) {
            entries.push(None);
            continue;
        }
        let defined: Vec<&KernelFunctionDef> =
            functions.iter().filter(|def| def.name == kernel.name).collect();
        if defined.is_empty() {
            entries.push(Some(KernelEntry {
                name: kernel.name,
                signature: None,
                handler: None,
                versions: kernel.versions,
                platforms: PlatformMask::ALL,
            }));
            continue;
        }

        let candidates: Vec<&KernelFunctionDef> = defined
            .into_iter()
            .filter(|def| def.versions.contains(version) && def.platforms.contains(platform))
            .collect();
        let Some(best) = candidates.iter().map(|def| specificity(def)).min() else {
            return Err(KernelTableError::NoMatchingVariant {
                name: kernel.name,
                version: version.to_string(),
                platform: platform.to_string(),
            });
        };
        let winners: Vec<&KernelFunctionDef> = candidates
            .into_iter()
            .filter(|def| specificity(def) == best)
            .collect();
        if winners.len() > 1 {
            return Err(KernelTableError::AmbiguousVariant {
                name: kernel.name,
                count: winners.len(),
                version: version.to_string(),
                platform: platform.to_string(),
            });
        }
        let chosen = winners[0];
        let compiled = signature::compiled(chosen.signature)
            .map_err(|source| KernelTableError::BadSignature { name: chosen.name, source })?;
        entries.push(Some(KernelEntry {
            name: chosen.name,
            signature: Some(compiled),
            handler: chosen.handler,
            versions: chosen.versions,
            platforms: chosen.platforms,
        }));
    }
    Ok(entries)
}

/// Sort key for variant selection; smaller is more specific.
fn specificity(def: &KernelFunctionDef) -> (u8, u32) {
    (def.versions.width(), def.platforms.width())
}

/// One line per index: name, signature and whether a handler exists.
pub fn describe(entries: &[Option<KernelEntry>]) -> String {
    let mut out = String::new();
    for (index, entry) in entries.iter().enumerate() {
        let _ = match entry {
            None => writeln!(out, "{:3}  -", index),
            Some(entry) => writeln!(
                out,
                "{:3}  {:<14} {:<8} {}",
                index,
                entry.name,
                entry.signature.as_ref().map_or("?", |sig| sig.text()),
                if entry.handler.is_some() { "native" } else { "stub" }
            ),
        };
    }
    out
}
