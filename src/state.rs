//! Global pipeline state helpers with a redundant-change filter.
//!
//! The context keeps a table of what it believes each capability is set to. A capability may be
//! `Unknown`, e.g. after foreign code touched the driver or after an indexed change, in which
//! case the next non-forced call always reaches the driver.

use crate::context::Context;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Cap {
    Blend,
    ClipDistance0,
    ClipDistance1,
    ClipDistance2,
    ClipDistance3,
    ClipDistance4,
    ClipDistance5,
    ColorLogicOp,
    CullFace,
    DebugOutput,
    DebugOutputSynchronous,
    DepthClamp,
    DepthTest,
    Dither,
    FramebufferSrgb,
    LineSmooth,
    Multisample,
    PolygonOffsetFill,
    PolygonOffsetLine,
    PolygonOffsetPoint,
    PolygonSmooth,
    PrimitiveRestart,
    PrimitiveRestartFixedIndex,
    RasterizerDiscard,
    SampleAlphaToCoverage,
    SampleAlphaToOne,
    SampleCoverage,
    SampleShading,
    SampleMask,
    ScissorTest,
    StencilTest,
    TextureCubeMapSeamless,
    ProgramPointSize,
}

impl Cap {
    pub const ALL: [Cap; 33] = [
        Cap::Blend,
        Cap::ClipDistance0,
        Cap::ClipDistance1,
        Cap::ClipDistance2,
        Cap::ClipDistance3,
        Cap::ClipDistance4,
        Cap::ClipDistance5,
        Cap::ColorLogicOp,
        Cap::CullFace,
        Cap::DebugOutput,
        Cap::DebugOutputSynchronous,
        Cap::DepthClamp,
        Cap::DepthTest,
        Cap::Dither,
        Cap::FramebufferSrgb,
        Cap::LineSmooth,
        Cap::Multisample,
        Cap::PolygonOffsetFill,
        Cap::PolygonOffsetLine,
        Cap::PolygonOffsetPoint,
        Cap::PolygonSmooth,
        Cap::PrimitiveRestart,
        Cap::PrimitiveRestartFixedIndex,
        Cap::RasterizerDiscard,
        Cap::SampleAlphaToCoverage,
        Cap::SampleAlphaToOne,
        Cap::SampleCoverage,
        Cap::SampleShading,
        Cap::SampleMask,
        Cap::ScissorTest,
        Cap::StencilTest,
        Cap::TextureCubeMapSeamless,
        Cap::ProgramPointSize,
    ];

    /// The state of a freshly created context.
    pub fn initial_state(self) -> CapState {
        match self {
            Cap::Dither | Cap::Multisample => CapState::Enabled,
            _ => CapState::Disabled,
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CapState {
    Unknown,
    Disabled,
    Enabled,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

impl Context {
    pub fn enable(&self, cap: Cap, force: bool) {
        self.set_cap(cap, CapState::Enabled, force)
    }

    pub fn disable(&self, cap: Cap, force: bool) {
        self.set_cap(cap, CapState::Disabled, force)
    }

    fn set_cap(&self, cap: Cap, to: CapState, force: bool) {
        let mut state = self.state();
        if !force && state.caps[cap.index()] == to {
            return;
        }

        if to == CapState::Enabled {
            self.device().enable(cap.into());
        } else {
            self.device().disable(cap.into());
        }

        state.caps[cap.index()] = to;

        // A global change applies to every index.
        match cap {
            Cap::Blend => {
                for v in state.blend_per_draw_buffer.iter_mut() {
                    *v = to;
                }
            }
            Cap::ScissorTest => {
                for v in state.scissor_per_viewport.iter_mut() {
                    *v = to;
                }
            }
            _ => {}
        }
    }

    /// Enables `Blend` for a single draw buffer or `ScissorTest` for a single viewport.
    pub fn enable_indexed(&self, cap: Cap, index: usize, force: bool) {
        self.set_cap_indexed(cap, index, CapState::Enabled, force)
    }

    /// Disables `Blend` for a single draw buffer or `ScissorTest` for a single viewport.
    pub fn disable_indexed(&self, cap: Cap, index: usize, force: bool) {
        self.set_cap_indexed(cap, index, CapState::Disabled, force)
    }

    fn set_cap_indexed(&self, cap: Cap, index: usize, to: CapState, force: bool) {
        // Everything else has no indexed state.
        if cap != Cap::Blend && cap != Cap::ScissorTest {
            return self.set_cap(cap, to, force);
        }

        let mut state = self.state();
        let global = state.caps[cap.index()];

        let current = {
            let table = match cap {
                Cap::Blend => &state.blend_per_draw_buffer,
                _ => &state.scissor_per_viewport,
            };

            debug_assert!(
                index < table.len(),
                "{:?} index {} exceeds the tracked range of {}.",
                cap,
                index,
                table.len()
            );

            table.get(index).cloned().unwrap_or(CapState::Unknown)
        };

        let redundant = global == to || (global == CapState::Unknown && current == to);
        if !force && redundant {
            return;
        }

        if to == CapState::Enabled {
            self.device().enable_i(cap.into(), index as u32);
        } else {
            self.device().disable_i(cap.into(), index as u32);
        }

        if global != to {
            state.caps[cap.index()] = CapState::Unknown;
        }

        let table = match cap {
            Cap::Blend => &mut state.blend_per_draw_buffer,
            _ => &mut state.scissor_per_viewport,
        };

        if global != CapState::Unknown {
            for v in table.iter_mut() {
                *v = global;
            }
        }

        if let Some(v) = table.get_mut(index) {
            *v = to;
        }
    }

    /// The state the wrapper believes `cap` is in.
    pub fn cap_state(&self, cap: Cap) -> CapState {
        self.state().caps[cap.index()]
    }

    /// The state of `cap` at `index`, only meaningful for `Blend` and `ScissorTest`.
    pub fn cap_state_indexed(&self, cap: Cap, index: usize) -> CapState {
        let state = self.state();
        let table = match cap {
            Cap::Blend => &state.blend_per_draw_buffer,
            Cap::ScissorTest => &state.scissor_per_viewport,
            _ => return state.caps[cap.index()],
        };

        match state.caps[cap.index()] {
            CapState::Unknown => table.get(index).cloned().unwrap_or(CapState::Unknown),
            global => global,
        }
    }

    /// Reads every capability back from the driver.
    pub fn reset_cap_states_from_driver(&self) {
        let mut state = self.state();
        for &cap in Cap::ALL.iter() {
            state.caps[cap.index()] = if self.device().is_enabled(cap.into()) {
                CapState::Enabled
            } else {
                CapState::Disabled
            };
        }

        let blend = state.caps[Cap::Blend.index()];
        for v in state.blend_per_draw_buffer.iter_mut() {
            *v = CapState::Unknown;
        }

        let scissor = state.caps[Cap::ScissorTest.index()];
        for v in state.scissor_per_viewport.iter_mut() {
            *v = CapState::Unknown;
        }

        // glIsEnabled only reports index 0 of indexed capabilities.
        if let Some(v) = state.blend_per_draw_buffer.first_mut() {
            *v = blend;
        }

        if let Some(v) = state.scissor_per_viewport.first_mut() {
            *v = scissor;
        }

        state.caps[Cap::Blend.index()] = CapState::Unknown;
        state.caps[Cap::ScissorTest.index()] = CapState::Unknown;
    }

    /// Forgets everything, the next call of each capability reaches the driver.
    pub fn reset_cap_states_unknown(&self) {
        let mut state = self.state();
        for v in state.caps.iter_mut() {
            *v = CapState::Unknown;
        }

        for v in state.blend_per_draw_buffer.iter_mut() {
            *v = CapState::Unknown;
        }

        for v in state.scissor_per_viewport.iter_mut() {
            *v = CapState::Unknown;
        }
    }

    pub fn set_depth_write(&self, write: bool, force: bool) {
        let mut state = self.state();
        if force || state.depth_write != write {
            self.device().depth_mask(write);
            state.depth_write = write;
        }
    }

    #[inline]
    pub fn depth_write(&self) -> bool {
        self.state().depth_write
    }

    pub fn set_depth_func(&self, func: DepthFunc, force: bool) {
        let mut state = self.state();
        if force || state.depth_func != func {
            self.device().depth_func(func.into());
            state.depth_func = func;
        }
    }

    #[inline]
    pub fn depth_func(&self) -> DepthFunc {
        self.state().depth_func
    }
}
