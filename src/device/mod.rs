//! The driver seam. Every wrapper talks to the graphics driver exclusively through `Device`,
//! which is a plain function table of the OpenGL 4.5 direct-state-access entry points we use.
//!
//! `gl::GLDevice` forwards to the loaded OpenGL functions, `headless::HeadlessDevice` simulates
//! them in memory and records every call.

pub mod gl;
pub mod headless;

use ::gl::types::*;

/// Opaque driver fence object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Fence(pub usize);

/// Minimum severity of driver debug messages forwarded to the log.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugSeverity {
    Notification,
    Low,
    Medium,
    High,
}

/// Implementation-dependent limits that never change during the lifetime of a context.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Limits {
    pub max_combined_texture_image_units: usize,
    pub max_uniform_buffer_bindings: usize,
    pub max_shader_storage_buffer_bindings: usize,
    pub max_vertex_attrib_bindings: usize,
    pub max_color_attachments: usize,
    pub max_draw_buffers: usize,
    pub max_viewports: usize,
    pub uniform_buffer_offset_alignment: usize,
    pub shader_storage_buffer_offset_alignment: usize,
    pub max_texture_max_anisotropy: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_combined_texture_image_units: 192,
            max_uniform_buffer_bindings: 84,
            max_shader_storage_buffer_bindings: 16,
            max_vertex_attrib_bindings: 16,
            max_color_attachments: 8,
            max_draw_buffers: 8,
            max_viewports: 16,
            uniform_buffer_offset_alignment: 256,
            shader_storage_buffer_offset_alignment: 256,
            max_texture_max_anisotropy: 16.0,
        }
    }
}

/// The driver entry points used by the wrappers.
///
/// Implementations are bound to a single thread and a single current context. Sizes and
/// offsets are in bytes.
///
/// # Safety
///
/// Buffers hand out the memory returned by `map_buffer_range` as slices. A non-null pointer
/// must be valid for reads and writes of `len` bytes until the buffer is unmapped or deleted.
pub unsafe trait Device {
    fn limits(&self) -> Limits;

    /// Returns and clears the oldest recorded error flag, `NO_ERROR` if there is none.
    fn get_error(&self) -> GLenum;

    fn create_buffer(&self) -> GLuint;
    fn buffer_storage(&self, buffer: GLuint, size: usize, data: Option<&[u8]>, flags: GLbitfield);
    /// Maps a range of the buffer store, returns null on failure.
    fn map_buffer_range(
        &self,
        buffer: GLuint,
        offset: usize,
        len: usize,
        access: GLbitfield,
    ) -> *mut u8;
    fn unmap_buffer(&self, buffer: GLuint) -> bool;
    fn flush_mapped_buffer_range(&self, buffer: GLuint, offset: usize, len: usize);
    fn clear_buffer_data(&self, buffer: GLuint, internal_format: GLenum, format: GLenum, ty: GLenum);
    fn buffer_sub_data(&self, buffer: GLuint, offset: usize, data: &[u8]);
    fn get_buffer_sub_data(&self, buffer: GLuint, offset: usize, out: &mut [u8]);
    fn bind_buffer(&self, target: GLenum, buffer: GLuint);
    fn bind_buffer_base(&self, target: GLenum, index: GLuint, buffer: GLuint);
    fn bind_buffer_range(
        &self,
        target: GLenum,
        index: GLuint,
        buffer: GLuint,
        offset: usize,
        size: usize,
    );
    fn bind_vertex_buffer(&self, binding: GLuint, buffer: GLuint, offset: usize, stride: GLsizei);
    fn delete_buffer(&self, buffer: GLuint);

    fn create_texture(&self, target: GLenum) -> GLuint;
    /// Reserves a texture name without creating the object, used for views.
    fn gen_texture(&self) -> GLuint;
    fn texture_storage_2d(&self, texture: GLuint, levels: u32, format: GLenum, w: u32, h: u32);
    fn texture_storage_2d_multisample(
        &self,
        texture: GLuint,
        samples: u32,
        format: GLenum,
        w: u32,
        h: u32,
    );
    fn texture_storage_3d(
        &self,
        texture: GLuint,
        levels: u32,
        format: GLenum,
        w: u32,
        h: u32,
        d: u32,
    );
    fn texture_sub_image_2d(
        &self,
        texture: GLuint,
        level: u32,
        offset: [u32; 2],
        size: [u32; 2],
        format: GLenum,
        ty: GLenum,
        data: &[u8],
    );
    fn texture_sub_image_3d(
        &self,
        texture: GLuint,
        level: u32,
        offset: [u32; 3],
        size: [u32; 3],
        format: GLenum,
        ty: GLenum,
        data: &[u8],
    );
    fn texture_view(
        &self,
        texture: GLuint,
        target: GLenum,
        original: GLuint,
        format: GLenum,
        levels: (u32, u32),
        layers: (u32, u32),
    );
    fn texture_buffer_range(
        &self,
        texture: GLuint,
        format: GLenum,
        buffer: GLuint,
        offset: usize,
        size: usize,
    );
    fn generate_texture_mipmap(&self, texture: GLuint);
    fn clear_tex_image(&self, texture: GLuint, level: u32, format: GLenum, ty: GLenum);
    fn get_texture_image(
        &self,
        texture: GLuint,
        level: u32,
        format: GLenum,
        ty: GLenum,
        out: &mut [u8],
    );
    fn bind_texture_unit(&self, unit: GLuint, texture: GLuint);
    fn bind_image_texture(
        &self,
        unit: GLuint,
        texture: GLuint,
        level: u32,
        layer: Option<u32>,
        access: GLenum,
        format: GLenum,
    );
    fn delete_texture(&self, texture: GLuint);

    fn create_sampler(&self) -> GLuint;
    fn sampler_parameter_i(&self, sampler: GLuint, pname: GLenum, value: GLint);
    fn sampler_parameter_f(&self, sampler: GLuint, pname: GLenum, value: GLfloat);
    fn sampler_parameter_fv(&self, sampler: GLuint, pname: GLenum, value: &[GLfloat]);
    fn bind_sampler(&self, unit: GLuint, sampler: GLuint);
    fn delete_sampler(&self, sampler: GLuint);

    fn create_framebuffer(&self) -> GLuint;
    fn framebuffer_texture(&self, fbo: GLuint, attachment: GLenum, texture: GLuint, level: u32);
    fn framebuffer_texture_layer(
        &self,
        fbo: GLuint,
        attachment: GLenum,
        texture: GLuint,
        level: u32,
        layer: u32,
    );
    fn framebuffer_draw_buffers(&self, fbo: GLuint, buffers: &[GLenum]);
    fn framebuffer_read_buffer(&self, fbo: GLuint, buffer: GLenum);
    fn check_framebuffer_status(&self, fbo: GLuint, target: GLenum) -> GLenum;
    fn bind_framebuffer(&self, target: GLenum, fbo: GLuint);
    fn blit_framebuffer(
        &self,
        src: GLuint,
        dst: GLuint,
        src_rect: [i32; 4],
        dst_rect: [i32; 4],
        mask: GLbitfield,
        filter: GLenum,
    );
    fn clear_framebuffer_color(&self, fbo: GLuint, draw_buffer: i32, rgba: [f32; 4]);
    fn clear_framebuffer_depth_stencil(&self, fbo: GLuint, depth: f32, stencil: i32);
    fn viewport(&self, x: i32, y: i32, w: u32, h: u32);
    fn delete_framebuffer(&self, fbo: GLuint);

    fn create_shader(&self, ty: GLenum) -> GLuint;
    fn shader_source(&self, shader: GLuint, source: &str);
    fn compile_shader(&self, shader: GLuint);
    fn shader_iv(&self, shader: GLuint, pname: GLenum) -> GLint;
    fn shader_info_log(&self, shader: GLuint) -> String;
    fn delete_shader(&self, shader: GLuint);

    fn create_program(&self) -> GLuint;
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    fn program_parameter_i(&self, program: GLuint, pname: GLenum, value: GLint);
    fn link_program(&self, program: GLuint);
    fn program_iv(&self, program: GLuint, pname: GLenum) -> GLint;
    fn program_info_log(&self, program: GLuint) -> String;
    fn program_interface_iv(&self, program: GLuint, interface: GLenum, pname: GLenum) -> GLint;
    fn program_resource_iv(
        &self,
        program: GLuint,
        interface: GLenum,
        index: GLuint,
        props: &[GLenum],
        out: &mut [GLint],
    );
    fn program_resource_name(&self, program: GLuint, interface: GLenum, index: GLuint) -> String;
    /// Returns the binary format and the binary blob of a linked program.
    fn get_program_binary(&self, program: GLuint) -> Option<(GLenum, Vec<u8>)>;
    fn program_binary(&self, program: GLuint, format: GLenum, data: &[u8]);
    fn use_program(&self, program: GLuint);
    fn dispatch_compute(&self, x: u32, y: u32, z: u32);
    fn delete_program(&self, program: GLuint);

    fn create_vertex_array(&self) -> GLuint;
    fn enable_vertex_array_attrib(&self, vao: GLuint, index: GLuint);
    fn vertex_array_attrib_binding(&self, vao: GLuint, index: GLuint, binding: GLuint);
    fn vertex_array_attrib_format(
        &self,
        vao: GLuint,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        offset: GLuint,
    );
    fn vertex_array_attrib_i_format(
        &self,
        vao: GLuint,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        offset: GLuint,
    );
    fn vertex_array_attrib_l_format(
        &self,
        vao: GLuint,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        offset: GLuint,
    );
    fn vertex_array_binding_divisor(&self, vao: GLuint, binding: GLuint, divisor: GLuint);
    fn bind_vertex_array(&self, vao: GLuint);
    fn draw_arrays(&self, mode: GLenum, first: i32, count: i32);
    fn delete_vertex_array(&self, vao: GLuint);

    fn enable(&self, cap: GLenum);
    fn disable(&self, cap: GLenum);
    fn enable_i(&self, cap: GLenum, index: GLuint);
    fn disable_i(&self, cap: GLenum, index: GLuint);
    fn is_enabled(&self, cap: GLenum) -> bool;
    fn depth_mask(&self, write: bool);
    fn depth_func(&self, func: GLenum);

    fn fence_sync(&self) -> Fence;
    /// Returns one of `ALREADY_SIGNALED`, `CONDITION_SATISFIED`, `TIMEOUT_EXPIRED` or
    /// `WAIT_FAILED`.
    fn client_wait_sync(&self, fence: Fence, flags: GLbitfield, timeout_ns: u64) -> GLenum;
    fn delete_sync(&self, fence: Fence);

    /// Routes driver debug messages of at least `severity` into the log.
    fn debug_output(&self, severity: DebugSeverity);
}
