//! The shared context handle. It owns the driver, the settings and the per-slot record of what
//! is currently bound, which lets wrappers skip redundant driver calls.

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use gl::types::*;

use crate::device::{DebugSeverity, Device, Limits};
use crate::errors::*;
use crate::settings::Settings;
use crate::state::{Cap, CapState, DepthFunc};

/// A buffer range bound to an indexed slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) struct BufferRange {
    pub buffer: GLuint,
    pub offset: usize,
    pub size: usize,
}

/// A vertex buffer bound to a binding index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) struct VertexBinding {
    pub buffer: GLuint,
    pub offset: usize,
    pub stride: u32,
}

pub(crate) struct BindingState {
    pub vertex_buffers: Vec<VertexBinding>,
    pub index_buffer: GLuint,
    pub indirect_draw_buffer: GLuint,
    pub indirect_dispatch_buffer: GLuint,
    pub uniform_buffers: Vec<BufferRange>,
    pub storage_buffers: Vec<BufferRange>,
    pub textures: Vec<GLuint>,
    pub samplers: Vec<GLuint>,
    pub draw_framebuffer: GLuint,
    pub program: GLuint,
    pub vertex_array: GLuint,
    pub caps: Vec<CapState>,
    pub blend_per_draw_buffer: Vec<CapState>,
    pub scissor_per_viewport: Vec<CapState>,
    pub depth_write: bool,
    pub depth_func: DepthFunc,
}

impl BindingState {
    fn new(settings: &Settings) -> Self {
        BindingState {
            vertex_buffers: vec![VertexBinding::default(); settings.num_vertex_buffer_bindings],
            index_buffer: 0,
            indirect_draw_buffer: 0,
            indirect_dispatch_buffer: 0,
            uniform_buffers: vec![BufferRange::default(); settings.num_uniform_buffer_bindings],
            storage_buffers: vec![
                BufferRange::default();
                settings.num_shader_storage_buffer_bindings
            ],
            textures: vec![0; settings.num_texture_bindings],
            samplers: vec![0; settings.num_sampler_bindings],
            draw_framebuffer: 0,
            program: 0,
            vertex_array: 0,
            caps: Cap::ALL.iter().map(|v| v.initial_state()).collect(),
            blend_per_draw_buffer: vec![CapState::Disabled; settings.max_draw_buffers],
            scissor_per_viewport: vec![CapState::Disabled; settings.max_viewports],
            depth_write: true,
            depth_func: DepthFunc::Less,
        }
    }

    /// Forgets every binding of the buffer.
    pub fn forget_buffer(&mut self, buffer: GLuint) {
        for v in self.vertex_buffers.iter_mut().filter(|v| v.buffer == buffer) {
            *v = VertexBinding::default();
        }

        for v in self.uniform_buffers.iter_mut().filter(|v| v.buffer == buffer) {
            *v = BufferRange::default();
        }

        for v in self.storage_buffers.iter_mut().filter(|v| v.buffer == buffer) {
            *v = BufferRange::default();
        }

        if self.index_buffer == buffer {
            self.index_buffer = 0;
        }

        if self.indirect_draw_buffer == buffer {
            self.indirect_draw_buffer = 0;
        }

        if self.indirect_dispatch_buffer == buffer {
            self.indirect_dispatch_buffer = 0;
        }
    }

    /// Forgets every texture unit the texture is bound to.
    pub fn forget_texture(&mut self, texture: GLuint) {
        for v in self.textures.iter_mut().filter(|v| **v == texture) {
            *v = 0;
        }
    }

    pub fn forget_sampler(&mut self, sampler: GLuint) {
        for v in self.samplers.iter_mut().filter(|v| **v == sampler) {
            *v = 0;
        }
    }
}

struct ContextInner {
    device: Rc<dyn Device>,
    settings: Settings,
    limits: Limits,
    state: RefCell<BindingState>,
}

/// A cheap, cloneable handle to the driver and its redundant-state record.
///
/// Every wrapper keeps a clone, so the context lives as long as its longest living object. The
/// handle is bound to the thread of the underlying driver context.
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.inner.settings)
            .field("limits", &self.inner.limits)
            .finish()
    }
}

impl Context {
    pub fn new(device: Rc<dyn Device>, settings: Settings) -> Self {
        let limits = device.limits();
        Context::check_limits(&settings, &limits);

        let state = RefCell::new(BindingState::new(&settings));
        Context {
            inner: Rc::new(ContextInner {
                device,
                settings,
                limits,
                state,
            }),
        }
    }

    fn check_limits(settings: &Settings, limits: &Limits) {
        let checks = [
            (
                "texture",
                settings.num_texture_bindings,
                limits.max_combined_texture_image_units,
            ),
            (
                "uniform buffer",
                settings.num_uniform_buffer_bindings,
                limits.max_uniform_buffer_bindings,
            ),
            (
                "shader storage buffer",
                settings.num_shader_storage_buffer_bindings,
                limits.max_shader_storage_buffer_bindings,
            ),
            (
                "vertex buffer",
                settings.num_vertex_buffer_bindings,
                limits.max_vertex_attrib_bindings,
            ),
            ("draw buffer", settings.max_draw_buffers, limits.max_draw_buffers),
            ("viewport", settings.max_viewports, limits.max_viewports),
        ];

        for &(name, configured, available) in &checks {
            if configured > available {
                warn!(
                    "Tracking {} {} bindings but the context only exposes {}.",
                    configured, name, available
                );
            }
        }
    }

    #[inline]
    pub fn device(&self) -> &dyn Device {
        &*self.inner.device
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    #[inline]
    pub fn limits(&self) -> &Limits {
        &self.inner.limits
    }

    #[inline]
    pub(crate) fn state(&self) -> RefMut<BindingState> {
        self.inner.state.borrow_mut()
    }

    /// Queries the driver error flag after `function` and logs it.
    pub fn check(&self, function: &'static str) -> Result<()> {
        if !self.inner.settings.check_errors {
            return Ok(());
        }

        match self.inner.device.get_error() {
            gl::NO_ERROR => Ok(()),
            code => {
                let description = describe(code);
                error!("[GL] {} failed with {:#x}: {}", function, code, description);
                Err(Error::Driver(function, description))
            }
        }
    }

    /// Enables synchronous driver debug output and forwards it to the log.
    pub fn activate_debug_output(&self, severity: DebugSeverity) -> Result<()> {
        self.device().debug_output(severity);
        self.check("glDebugMessageCallback")
    }
}
