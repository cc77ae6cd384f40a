use std::ffi::CStr;
use std::os::raw::c_void;
use std::ptr;
use std::slice;

use gl::types::*;

use super::capabilities::Capabilities;
use crate::device::{DebugSeverity, Device, Fence, Limits};
use crate::errors::*;

/// Forwards every call to the OpenGL context current on this thread.
pub struct GLDevice {
    capabilities: Capabilities,
}

impl GLDevice {
    /// Wraps the context that is current on the calling thread. The `gl` function pointers
    /// must have been loaded before.
    ///
    /// # Unsafe
    ///
    /// An OpenGL context must be current on the calling thread for the whole life time of the
    /// device, and the device must not be used from other threads.
    pub unsafe fn new() -> Result<Self> {
        let capabilities = Capabilities::parse()?;

        info!(
            "OpenGL {:?} ({}, {}), profile {:?}, debug context: {}.",
            capabilities.version,
            capabilities.vendor,
            capabilities.renderer,
            capabilities.profile,
            capabilities.debug
        );

        capabilities.check()?;
        Ok(GLDevice { capabilities })
    }

    /// Loads the `gl` function pointers with `loader` and wraps the current context.
    ///
    /// # Unsafe
    ///
    /// See `GLDevice::new`.
    pub unsafe fn load_with<F>(loader: F) -> Result<Self>
    where
        F: FnMut(&str) -> *const c_void,
    {
        gl::load_with(loader);
        GLDevice::new()
    }

    #[inline]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}

#[inline]
fn gl_bool(v: bool) -> GLboolean {
    if v {
        gl::TRUE
    } else {
        gl::FALSE
    }
}

#[inline]
fn data_ptr(data: &[u8]) -> *const c_void {
    data.as_ptr() as *const c_void
}

unsafe fn info_log(len: GLint, fetch: impl FnOnce(GLsizei, *mut GLsizei, *mut GLchar)) -> String {
    if len <= 0 {
        return String::new();
    }

    let mut buf = vec![0u8; len as usize];
    let mut written = 0;
    fetch(len, &mut written, buf.as_mut_ptr() as *mut GLchar);
    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

unsafe impl Device for GLDevice {
    fn limits(&self) -> Limits {
        self.capabilities.limits
    }

    fn get_error(&self) -> GLenum {
        unsafe { gl::GetError() }
    }

    fn create_buffer(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::CreateBuffers(1, &mut id) };
        id
    }

    fn buffer_storage(&self, buffer: GLuint, size: usize, data: Option<&[u8]>, flags: GLbitfield) {
        let data = data.map(data_ptr).unwrap_or(ptr::null());
        unsafe { gl::NamedBufferStorage(buffer, size as GLsizeiptr, data, flags) };
    }

    fn map_buffer_range(
        &self,
        buffer: GLuint,
        offset: usize,
        len: usize,
        access: GLbitfield,
    ) -> *mut u8 {
        unsafe {
            gl::MapNamedBufferRange(buffer, offset as GLintptr, len as GLsizeiptr, access) as *mut u8
        }
    }

    fn unmap_buffer(&self, buffer: GLuint) -> bool {
        unsafe { gl::UnmapNamedBuffer(buffer) == gl::TRUE }
    }

    fn flush_mapped_buffer_range(&self, buffer: GLuint, offset: usize, len: usize) {
        unsafe { gl::FlushMappedNamedBufferRange(buffer, offset as GLintptr, len as GLsizeiptr) };
    }

    fn clear_buffer_data(&self, buffer: GLuint, internal_format: GLenum, format: GLenum, ty: GLenum) {
        unsafe { gl::ClearNamedBufferData(buffer, internal_format, format, ty, ptr::null()) };
    }

    fn buffer_sub_data(&self, buffer: GLuint, offset: usize, data: &[u8]) {
        unsafe {
            gl::NamedBufferSubData(
                buffer,
                offset as GLintptr,
                data.len() as GLsizeiptr,
                data_ptr(data),
            )
        };
    }

    fn get_buffer_sub_data(&self, buffer: GLuint, offset: usize, out: &mut [u8]) {
        unsafe {
            gl::GetNamedBufferSubData(
                buffer,
                offset as GLintptr,
                out.len() as GLsizeiptr,
                out.as_mut_ptr() as *mut c_void,
            )
        };
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        unsafe { gl::BindBuffer(target, buffer) };
    }

    fn bind_buffer_base(&self, target: GLenum, index: GLuint, buffer: GLuint) {
        unsafe { gl::BindBufferBase(target, index, buffer) };
    }

    fn bind_buffer_range(
        &self,
        target: GLenum,
        index: GLuint,
        buffer: GLuint,
        offset: usize,
        size: usize,
    ) {
        unsafe {
            gl::BindBufferRange(target, index, buffer, offset as GLintptr, size as GLsizeiptr)
        };
    }

    fn bind_vertex_buffer(&self, binding: GLuint, buffer: GLuint, offset: usize, stride: GLsizei) {
        unsafe { gl::BindVertexBuffer(binding, buffer, offset as GLintptr, stride) };
    }

    fn delete_buffer(&self, buffer: GLuint) {
        unsafe { gl::DeleteBuffers(1, &buffer) };
    }

    fn create_texture(&self, target: GLenum) -> GLuint {
        let mut id = 0;
        unsafe { gl::CreateTextures(target, 1, &mut id) };
        id
    }

    fn gen_texture(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenTextures(1, &mut id) };
        id
    }

    fn texture_storage_2d(&self, texture: GLuint, levels: u32, format: GLenum, w: u32, h: u32) {
        unsafe {
            gl::TextureStorage2D(texture, levels as GLsizei, format, w as GLsizei, h as GLsizei)
        };
    }

    fn texture_storage_2d_multisample(
        &self,
        texture: GLuint,
        samples: u32,
        format: GLenum,
        w: u32,
        h: u32,
    ) {
        unsafe {
            gl::TextureStorage2DMultisample(
                texture,
                samples as GLsizei,
                format,
                w as GLsizei,
                h as GLsizei,
                gl::FALSE,
            )
        };
    }

    fn texture_storage_3d(
        &self,
        texture: GLuint,
        levels: u32,
        format: GLenum,
        w: u32,
        h: u32,
        d: u32,
    ) {
        unsafe {
            gl::TextureStorage3D(
                texture,
                levels as GLsizei,
                format,
                w as GLsizei,
                h as GLsizei,
                d as GLsizei,
            )
        };
    }

    fn texture_sub_image_2d(
        &self,
        texture: GLuint,
        level: u32,
        offset: [u32; 2],
        size: [u32; 2],
        format: GLenum,
        ty: GLenum,
        data: &[u8],
    ) {
        unsafe {
            gl::TextureSubImage2D(
                texture,
                level as GLint,
                offset[0] as GLint,
                offset[1] as GLint,
                size[0] as GLsizei,
                size[1] as GLsizei,
                format,
                ty,
                data_ptr(data),
            )
        };
    }

    fn texture_sub_image_3d(
        &self,
        texture: GLuint,
        level: u32,
        offset: [u32; 3],
        size: [u32; 3],
        format: GLenum,
        ty: GLenum,
        data: &[u8],
    ) {
        unsafe {
            gl::TextureSubImage3D(
                texture,
                level as GLint,
                offset[0] as GLint,
                offset[1] as GLint,
                offset[2] as GLint,
                size[0] as GLsizei,
                size[1] as GLsizei,
                size[2] as GLsizei,
                format,
                ty,
                data_ptr(data),
            )
        };
    }

    fn texture_view(
        &self,
        texture: GLuint,
        target: GLenum,
        original: GLuint,
        format: GLenum,
        levels: (u32, u32),
        layers: (u32, u32),
    ) {
        unsafe {
            gl::TextureView(
                texture, target, original, format, levels.0, levels.1, layers.0, layers.1,
            )
        };
    }

    fn texture_buffer_range(
        &self,
        texture: GLuint,
        format: GLenum,
        buffer: GLuint,
        offset: usize,
        size: usize,
    ) {
        unsafe {
            gl::TextureBufferRange(
                texture,
                format,
                buffer,
                offset as GLintptr,
                size as GLsizeiptr,
            )
        };
    }

    fn generate_texture_mipmap(&self, texture: GLuint) {
        unsafe { gl::GenerateTextureMipmap(texture) };
    }

    fn clear_tex_image(&self, texture: GLuint, level: u32, format: GLenum, ty: GLenum) {
        unsafe { gl::ClearTexImage(texture, level as GLint, format, ty, ptr::null()) };
    }

    fn get_texture_image(
        &self,
        texture: GLuint,
        level: u32,
        format: GLenum,
        ty: GLenum,
        out: &mut [u8],
    ) {
        unsafe {
            gl::GetTextureImage(
                texture,
                level as GLint,
                format,
                ty,
                out.len() as GLsizei,
                out.as_mut_ptr() as *mut c_void,
            )
        };
    }

    fn bind_texture_unit(&self, unit: GLuint, texture: GLuint) {
        unsafe { gl::BindTextureUnit(unit, texture) };
    }

    fn bind_image_texture(
        &self,
        unit: GLuint,
        texture: GLuint,
        level: u32,
        layer: Option<u32>,
        access: GLenum,
        format: GLenum,
    ) {
        unsafe {
            gl::BindImageTexture(
                unit,
                texture,
                level as GLint,
                gl_bool(layer.is_none()),
                layer.unwrap_or(0) as GLint,
                access,
                format,
            )
        };
    }

    fn delete_texture(&self, texture: GLuint) {
        unsafe { gl::DeleteTextures(1, &texture) };
    }

    fn create_sampler(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::CreateSamplers(1, &mut id) };
        id
    }

    fn sampler_parameter_i(&self, sampler: GLuint, pname: GLenum, value: GLint) {
        unsafe { gl::SamplerParameteri(sampler, pname, value) };
    }

    fn sampler_parameter_f(&self, sampler: GLuint, pname: GLenum, value: GLfloat) {
        unsafe { gl::SamplerParameterf(sampler, pname, value) };
    }

    fn sampler_parameter_fv(&self, sampler: GLuint, pname: GLenum, value: &[GLfloat]) {
        unsafe { gl::SamplerParameterfv(sampler, pname, value.as_ptr()) };
    }

    fn bind_sampler(&self, unit: GLuint, sampler: GLuint) {
        unsafe { gl::BindSampler(unit, sampler) };
    }

    fn delete_sampler(&self, sampler: GLuint) {
        unsafe { gl::DeleteSamplers(1, &sampler) };
    }

    fn create_framebuffer(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::CreateFramebuffers(1, &mut id) };
        id
    }

    fn framebuffer_texture(&self, fbo: GLuint, attachment: GLenum, texture: GLuint, level: u32) {
        unsafe { gl::NamedFramebufferTexture(fbo, attachment, texture, level as GLint) };
    }

    fn framebuffer_texture_layer(
        &self,
        fbo: GLuint,
        attachment: GLenum,
        texture: GLuint,
        level: u32,
        layer: u32,
    ) {
        unsafe {
            gl::NamedFramebufferTextureLayer(
                fbo,
                attachment,
                texture,
                level as GLint,
                layer as GLint,
            )
        };
    }

    fn framebuffer_draw_buffers(&self, fbo: GLuint, buffers: &[GLenum]) {
        unsafe { gl::NamedFramebufferDrawBuffers(fbo, buffers.len() as GLsizei, buffers.as_ptr()) };
    }

    fn framebuffer_read_buffer(&self, fbo: GLuint, buffer: GLenum) {
        unsafe { gl::NamedFramebufferReadBuffer(fbo, buffer) };
    }

    fn check_framebuffer_status(&self, fbo: GLuint, target: GLenum) -> GLenum {
        unsafe { gl::CheckNamedFramebufferStatus(fbo, target) }
    }

    fn bind_framebuffer(&self, target: GLenum, fbo: GLuint) {
        unsafe { gl::BindFramebuffer(target, fbo) };
    }

    fn blit_framebuffer(
        &self,
        src: GLuint,
        dst: GLuint,
        src_rect: [i32; 4],
        dst_rect: [i32; 4],
        mask: GLbitfield,
        filter: GLenum,
    ) {
        unsafe {
            gl::BlitNamedFramebuffer(
                src,
                dst,
                src_rect[0],
                src_rect[1],
                src_rect[2],
                src_rect[3],
                dst_rect[0],
                dst_rect[1],
                dst_rect[2],
                dst_rect[3],
                mask,
                filter,
            )
        };
    }

    fn clear_framebuffer_color(&self, fbo: GLuint, draw_buffer: i32, rgba: [f32; 4]) {
        unsafe { gl::ClearNamedFramebufferfv(fbo, gl::COLOR, draw_buffer, rgba.as_ptr()) };
    }

    fn clear_framebuffer_depth_stencil(&self, fbo: GLuint, depth: f32, stencil: i32) {
        unsafe { gl::ClearNamedFramebufferfi(fbo, gl::DEPTH_STENCIL, 0, depth, stencil) };
    }

    fn viewport(&self, x: i32, y: i32, w: u32, h: u32) {
        unsafe { gl::Viewport(x, y, w as GLsizei, h as GLsizei) };
    }

    fn delete_framebuffer(&self, fbo: GLuint) {
        unsafe { gl::DeleteFramebuffers(1, &fbo) };
    }

    fn create_shader(&self, ty: GLenum) -> GLuint {
        unsafe { gl::CreateShader(ty) }
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        let ptr = source.as_ptr() as *const GLchar;
        let len = source.len() as GLint;
        unsafe { gl::ShaderSource(shader, 1, &ptr, &len) };
    }

    fn compile_shader(&self, shader: GLuint) {
        unsafe { gl::CompileShader(shader) };
    }

    fn shader_iv(&self, shader: GLuint, pname: GLenum) -> GLint {
        let mut v = 0;
        unsafe { gl::GetShaderiv(shader, pname, &mut v) };
        v
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        let len = self.shader_iv(shader, gl::INFO_LOG_LENGTH);
        unsafe {
            info_log(len, |len, written, buf| {
                gl::GetShaderInfoLog(shader, len, written, buf)
            })
        }
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) };
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) };
    }

    fn program_parameter_i(&self, program: GLuint, pname: GLenum, value: GLint) {
        unsafe { gl::ProgramParameteri(program, pname, value) };
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) };
    }

    fn program_iv(&self, program: GLuint, pname: GLenum) -> GLint {
        let mut v = 0;
        unsafe { gl::GetProgramiv(program, pname, &mut v) };
        v
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let len = self.program_iv(program, gl::INFO_LOG_LENGTH);
        unsafe {
            info_log(len, |len, written, buf| {
                gl::GetProgramInfoLog(program, len, written, buf)
            })
        }
    }

    fn program_interface_iv(&self, program: GLuint, interface: GLenum, pname: GLenum) -> GLint {
        let mut v = 0;
        unsafe { gl::GetProgramInterfaceiv(program, interface, pname, &mut v) };
        v
    }

    fn program_resource_iv(
        &self,
        program: GLuint,
        interface: GLenum,
        index: GLuint,
        props: &[GLenum],
        out: &mut [GLint],
    ) {
        debug_assert!(out.len() >= props.len());
        unsafe {
            gl::GetProgramResourceiv(
                program,
                interface,
                index,
                props.len() as GLsizei,
                props.as_ptr(),
                out.len() as GLsizei,
                ptr::null_mut(),
                out.as_mut_ptr(),
            )
        };
    }

    fn program_resource_name(&self, program: GLuint, interface: GLenum, index: GLuint) -> String {
        let mut len = [0];
        self.program_resource_iv(program, interface, index, &[gl::NAME_LENGTH], &mut len);

        unsafe {
            info_log(len[0] + 1, |len, written, buf| {
                gl::GetProgramResourceName(program, interface, index, len, written, buf)
            })
        }
    }

    fn get_program_binary(&self, program: GLuint) -> Option<(GLenum, Vec<u8>)> {
        let len = self.program_iv(program, gl::PROGRAM_BINARY_LENGTH);
        if len <= 0 {
            return None;
        }

        let mut data = vec![0u8; len as usize];
        let mut written = 0;
        let mut format = 0;
        unsafe {
            gl::GetProgramBinary(
                program,
                len,
                &mut written,
                &mut format,
                data.as_mut_ptr() as *mut c_void,
            )
        };

        data.truncate(written.max(0) as usize);
        Some((format, data))
    }

    fn program_binary(&self, program: GLuint, format: GLenum, data: &[u8]) {
        unsafe { gl::ProgramBinary(program, format, data_ptr(data), data.len() as GLsizei) };
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) };
    }

    fn dispatch_compute(&self, x: u32, y: u32, z: u32) {
        unsafe { gl::DispatchCompute(x, y, z) };
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) };
    }

    fn create_vertex_array(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::CreateVertexArrays(1, &mut id) };
        id
    }

    fn enable_vertex_array_attrib(&self, vao: GLuint, index: GLuint) {
        unsafe { gl::EnableVertexArrayAttrib(vao, index) };
    }

    fn vertex_array_attrib_binding(&self, vao: GLuint, index: GLuint, binding: GLuint) {
        unsafe { gl::VertexArrayAttribBinding(vao, index, binding) };
    }

    fn vertex_array_attrib_format(
        &self,
        vao: GLuint,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        offset: GLuint,
    ) {
        unsafe { gl::VertexArrayAttribFormat(vao, index, size, ty, gl_bool(normalized), offset) };
    }

    fn vertex_array_attrib_i_format(
        &self,
        vao: GLuint,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        offset: GLuint,
    ) {
        unsafe { gl::VertexArrayAttribIFormat(vao, index, size, ty, offset) };
    }

    fn vertex_array_attrib_l_format(
        &self,
        vao: GLuint,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        offset: GLuint,
    ) {
        unsafe { gl::VertexArrayAttribLFormat(vao, index, size, ty, offset) };
    }

    fn vertex_array_binding_divisor(&self, vao: GLuint, binding: GLuint, divisor: GLuint) {
        unsafe { gl::VertexArrayBindingDivisor(vao, binding, divisor) };
    }

    fn bind_vertex_array(&self, vao: GLuint) {
        unsafe { gl::BindVertexArray(vao) };
    }

    fn draw_arrays(&self, mode: GLenum, first: i32, count: i32) {
        unsafe { gl::DrawArrays(mode, first, count) };
    }

    fn delete_vertex_array(&self, vao: GLuint) {
        unsafe { gl::DeleteVertexArrays(1, &vao) };
    }

    fn enable(&self, cap: GLenum) {
        unsafe { gl::Enable(cap) };
    }

    fn disable(&self, cap: GLenum) {
        unsafe { gl::Disable(cap) };
    }

    fn enable_i(&self, cap: GLenum, index: GLuint) {
        unsafe { gl::Enablei(cap, index) };
    }

    fn disable_i(&self, cap: GLenum, index: GLuint) {
        unsafe { gl::Disablei(cap, index) };
    }

    fn is_enabled(&self, cap: GLenum) -> bool {
        unsafe { gl::IsEnabled(cap) == gl::TRUE }
    }

    fn depth_mask(&self, write: bool) {
        unsafe { gl::DepthMask(gl_bool(write)) };
    }

    fn depth_func(&self, func: GLenum) {
        unsafe { gl::DepthFunc(func) };
    }

    fn fence_sync(&self) -> Fence {
        let sync = unsafe { gl::FenceSync(gl::SYNC_GPU_COMMANDS_COMPLETE, 0) };
        Fence(sync as usize)
    }

    fn client_wait_sync(&self, fence: Fence, flags: GLbitfield, timeout_ns: u64) -> GLenum {
        unsafe { gl::ClientWaitSync(fence.0 as GLsync, flags, timeout_ns) }
    }

    fn delete_sync(&self, fence: Fence) {
        unsafe { gl::DeleteSync(fence.0 as GLsync) };
    }

    fn debug_output(&self, severity: DebugSeverity) {
        let filtered = [
            (DebugSeverity::Notification, gl::DEBUG_SEVERITY_NOTIFICATION),
            (DebugSeverity::Low, gl::DEBUG_SEVERITY_LOW),
            (DebugSeverity::Medium, gl::DEBUG_SEVERITY_MEDIUM),
            (DebugSeverity::High, gl::DEBUG_SEVERITY_HIGH),
        ];

        unsafe {
            gl::Enable(gl::DEBUG_OUTPUT);
            gl::Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
            gl::DebugMessageCallback(Some(debug_callback), ptr::null());

            for &(level, value) in &filtered {
                gl::DebugMessageControl(
                    gl::DONT_CARE,
                    gl::DONT_CARE,
                    value,
                    0,
                    ptr::null(),
                    gl_bool(level >= severity),
                );
            }
        }
    }
}

extern "system" fn debug_callback(
    source: GLenum,
    ty: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    _: *mut c_void,
) {
    if message.is_null() {
        return;
    }

    let message = unsafe {
        if length >= 0 {
            let bytes = slice::from_raw_parts(message as *const u8, length as usize);
            String::from_utf8_lossy(bytes).into_owned()
        } else {
            CStr::from_ptr(message).to_string_lossy().into_owned()
        }
    };

    let source = match source {
        gl::DEBUG_SOURCE_API => "API",
        gl::DEBUG_SOURCE_WINDOW_SYSTEM => "window system",
        gl::DEBUG_SOURCE_SHADER_COMPILER => "shader compiler",
        gl::DEBUG_SOURCE_THIRD_PARTY => "third party",
        gl::DEBUG_SOURCE_APPLICATION => "application",
        _ => "other",
    };

    let ty = match ty {
        gl::DEBUG_TYPE_ERROR => "error",
        gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "deprecated behavior",
        gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "undefined behavior",
        gl::DEBUG_TYPE_PORTABILITY => "portability",
        gl::DEBUG_TYPE_PERFORMANCE => "performance",
        _ => "other",
    };

    match severity {
        gl::DEBUG_SEVERITY_HIGH => error!("[GL] {} {} #{}: {}", source, ty, id, message),
        gl::DEBUG_SEVERITY_MEDIUM => warn!("[GL] {} {} #{}: {}", source, ty, id, message),
        gl::DEBUG_SEVERITY_LOW => info!("[GL] {} {} #{}: {}", source, ty, id, message),
        _ => debug!("[GL] {} {} #{}: {}", source, ty, id, message),
    }
}
