use std::io::{Read, Write};
use std::rc::Rc;

use state::SaveMetadata;
use storage::GameResources;
use tracing::{debug, info, warn};
use types::{Reg, SegmentId};
use vm::{DispatchError, KernelDispatcher, KernelError, ScriptState, VmState};

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Session orchestrator: owns the live [`VmState`], the kernel table built
/// for the configured interpreter, and the game data both draw from.
///
/// ARCHITECTURE:
/// - State: segment heap, script manager with its class table, operand
///   stack and system strings
/// - Kernel: index-to-handler table fixed at construction
/// - Resources: read-only game data, shared with every state this engine
///   builds
///
/// SAVE AND RESTORE:
/// Restore decodes and rebuilds a complete replacement state next to the
/// live one. Only when that succeeds does the replacement take its place;
/// any failure leaves the running session exactly as it was.
#[derive(Debug)]
pub struct Engine {
    resources: Rc<dyn GameResources>,
    config: EngineConfig,
    kernel: KernelDispatcher,
    state: VmState,
    /// Play time in ticks, carried in save headers.
    play_time: u32,
}

impl Engine {
    /// Builds a session for `config`. An inconsistent kernel table for the
    /// configured version and platform is fatal here.
    pub fn new(resources: Rc<dyn GameResources>, config: EngineConfig) -> Result<Self, EngineError> {
        let version = config.version()?;
        let platform = config.platform()?;
        let mut kernel = KernelDispatcher::new(version, platform)?;
        kernel.set_tolerate_extra_args(!config.strict_signatures);
        let state = VmState::new(resources.clone(), config.stack_size);
        info!(
            game = %resources.game_id(),
            content = %resources.content_version(),
            %version,
            %platform,
            "engine ready"
        );
        Ok(Self {
            resources,
            config,
            kernel,
            state,
            play_time: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn kernel(&self) -> &KernelDispatcher {
        &self.kernel
    }

    pub fn resources(&self) -> &Rc<dyn GameResources> {
        &self.resources
    }

    pub fn state(&self) -> &VmState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut VmState {
        &mut self.state
    }

    pub fn play_time(&self) -> u32 {
        self.play_time
    }

    pub fn tick(&mut self, ticks: u32) {
        self.play_time = self.play_time.saturating_add(ticks);
    }

    /// Allocates a new object as a clone of `template`.
    pub fn allocate_object(&mut self, template: Reg) -> Result<Reg, EngineError> {
        self.state.clone_object(template).map_err(|err| match err {
            KernelError::OutOfMemory => EngineError::OutOfMemory,
            other => other.into(),
        })
    }

    pub fn allocate_list(&mut self) -> Result<Reg, EngineError> {
        self.state.new_list().ok_or(EngineError::OutOfMemory)
    }

    pub fn allocate_node(&mut self, value: Reg, key: Reg) -> Result<Reg, EngineError> {
        self.state.new_node(value, key).ok_or(EngineError::OutOfMemory)
    }

    pub fn instantiate_script(&mut self, number: u16) -> Result<SegmentId, EngineError> {
        Ok(self.state.instantiate_script(number)?)
    }

    pub fn release_script(&mut self, number: u16) -> Result<ScriptState, EngineError> {
        Ok(self.state.release_script(number)?)
    }

    /// Runs a kernel call the way byte-code sees it: a failed call is
    /// logged and evaluates to null.
    pub fn invoke_kernel_call(&mut self, index: u16, args: &[Reg]) -> Reg {
        match self.try_kernel_call(index, args) {
            Ok(result) => result,
            Err(err) => {
                warn!(index, args = args.len(), error = %err, "kernel call failed");
                Reg::NULL
            }
        }
    }

    pub fn try_kernel_call(&mut self, index: u16, args: &[Reg]) -> Result<Reg, DispatchError> {
        let result = self.kernel.call(&mut self.state, index, args);
        if let Ok(value) = &result {
            debug!(index, result = ?value, "kernel call");
        }
        result
    }

    pub fn save_game<W: Write>(&self, out: &mut W, name: &str) -> Result<SaveMetadata, EngineError> {
        let metadata = SaveMetadata::new(
            name,
            self.resources.as_ref(),
            self.kernel.version(),
            self.play_time,
        );
        state::save_game(out, &self.state, &metadata)?;
        Ok(metadata)
    }

    /// Replaces the live state with the one stored in `input`. On error
    /// nothing observable changes.
    pub fn restore_game<R: Read>(&mut self, input: &mut R) -> Result<SaveMetadata, EngineError> {
        let (restored, metadata) = match state::restore_game(input, self.resources.clone()) {
            Ok(restored) => restored,
            Err(err) => {
                warn!(error = %err, "restore failed, keeping the running session");
                return Err(err.into());
            }
        };
        self.state = restored;
        self.play_time = metadata.play_time;
        Ok(metadata)
    }

    pub fn query_save_metadata<R: Read>(input: &mut R) -> Result<SaveMetadata, EngineError> {
        Ok(state::query_save_metadata(input)?)
    }

    pub fn describe_heap(&self) -> String {
        self.state.heap.describe()
    }
}
