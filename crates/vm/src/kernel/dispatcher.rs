use tracing::{debug, info};
use types::{Platform, Reg, SciVersion};

use super::table::{self, KernelEntry, KernelFunctionDef, KernelName, KERNEL_FUNCTIONS, KERNEL_NAMES};
use crate::error::{ArgumentMismatch, DispatchError, KernelTableError};
use crate::vm_state::VmState;

/// Index-to-handler table for one interpreter version and platform.
#[derive(Debug, Clone)]
pub struct KernelDispatcher {
    version: SciVersion,
    platform: Platform,
    entries: Vec<Option<KernelEntry>>,
    tolerate_extra_args: bool,
}

impl KernelDispatcher {
    /// Builds the built-in table. Fails if the table is inconsistent for
    /// this build; callers treat that as fatal.
    pub fn new(version: SciVersion, platform: Platform) -> Result<Self, KernelTableError> {
        Self::from_tables(KERNEL_NAMES, KERNEL_FUNCTIONS, version, platform)
    }

    pub fn from_tables(
        names: &[KernelName],
        functions: &[KernelFunctionDef],
        version: SciVersion,
        platform: Platform,
    ) -> Result<Self, KernelTableError> {
        let entries = table::select(names, functions, version, platform)?;
        info!(
            %version,
            %platform,
            kernels = entries.iter().flatten().count(),
            "kernel table ready"
        );
        Ok(Self {
            version,
            platform,
            entries,
            tolerate_extra_args: false,
        })
    }

    /// With tolerance on, surplus trailing arguments are dropped instead of
    /// failing the call. The handler still only sees validated arguments.
    pub fn set_tolerate_extra_args(&mut self, tolerate: bool) {
        self.tolerate_extra_args = tolerate;
    }

    pub fn version(&self) -> SciVersion {
        self.version
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: u16) -> Option<&KernelEntry> {
        self.entries.get(index as usize).and_then(Option::as_ref)
    }

    pub fn find(&self, name: &str) -> Option<u16> {
        self.entries
            .iter()
            .position(|entry| entry.as_ref().is_some_and(|entry| entry.name == name))
            .map(|index| index as u16)
    }

    pub fn describe(&self) -> String {
        table::describe(&self.entries)
    }

    /// Validates `args` against the entry's signature, then runs its handler.
    pub fn call(&self, state: &mut VmState, index: u16, args: &[Reg]) -> Result<Reg, DispatchError> {
        let entry = self.entry(index).ok_or(DispatchError::UnknownIndex { index })?;
        let name = entry.name;
        let mut args = args;
        if let Some(signature) = &entry.signature {
            match signature.check(&state.heap, args) {
                Ok(()) => {}
                Err(ArgumentMismatch::TooMany { expected, found }) if self.tolerate_extra_args => {
                    debug!(kernel = name, expected, found, "dropping surplus kernel arguments");
                    args = &args[..expected];
                }
                Err(mismatch) => return Err(DispatchError::SignatureMismatch { name, mismatch }),
            }
        }
        let handler = entry.handler.ok_or(DispatchError::HandlerNotMapped { name })?;
        handler(state, args).map_err(|source| DispatchError::HandlerFailed { name, source })
    }
}
