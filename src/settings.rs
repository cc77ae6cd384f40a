//! Functions for loading wrapper settings.

use serde::{Deserialize, Serialize};

use crate::errors::*;

/// A structure containing configuration data for the wrappers, which are used to size the
/// redundant-binding tables and to tune diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of texture units tracked by the binding cache.
    pub num_texture_bindings: usize,
    /// Number of sampler stages tracked by the binding cache.
    pub num_sampler_bindings: usize,
    pub num_vertex_buffer_bindings: usize,
    pub num_uniform_buffer_bindings: usize,
    pub num_shader_storage_buffer_bindings: usize,
    /// Number of draw buffers that can have an individual blend state.
    pub max_draw_buffers: usize,
    /// Number of viewports that can have an individual scissor state.
    pub max_viewports: usize,
    /// Queries `glGetError` after every driver call group.
    pub check_errors: bool,
    /// Logs shader compiler and linker output.
    pub shader_compile_logs: bool,
    /// Default fence wait timeout of persistent ring buffers, in nanoseconds.
    pub ring_buffer_timeout_ns: u64,
    /// Whether persistent ring buffers warn when they had to wait for the GPU.
    pub ring_buffer_warn_on_sync: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            num_texture_bindings: 192,
            num_sampler_bindings: 192,
            num_vertex_buffer_bindings: 16,
            num_uniform_buffer_bindings: 64,
            num_shader_storage_buffer_bindings: 16,
            max_draw_buffers: 8,
            max_viewports: 16,
            check_errors: cfg!(debug_assertions),
            shader_compile_logs: true,
            ring_buffer_timeout_ns: 1_000_000_000,
            ring_buffer_warn_on_sync: true,
        }
    }
}

impl Settings {
    /// Parses settings from a json document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Settings> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
