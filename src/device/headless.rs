//! A driver simulation without any window or GPU.
//!
//! `HeadlessDevice` keeps buffer storage in memory, hands out object names, answers queries
//! with scripted values and records every call it receives. Tests create a `Context` on top of
//! it and assert on the recorded calls.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::ptr;

use gl::types::*;

use super::{DebugSeverity, Device, Fence, Limits};

/// Heap memory of a simulated buffer. Only ever accessed through raw pointers, since mapped
/// ranges are handed out to the caller as mutable slices.
struct Storage {
    ptr: *mut u8,
    len: usize,
}

impl Storage {
    fn new(len: usize) -> Self {
        let memory = vec![0u8; len].into_boxed_slice();
        Storage {
            ptr: Box::into_raw(memory) as *mut u8,
            len,
        }
    }

    fn write(&self, offset: usize, data: &[u8]) {
        let len = data.len().min(self.len.saturating_sub(offset));
        unsafe { ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.add(offset), len) };
    }

    fn read(&self, offset: usize, out: &mut [u8]) {
        let len = out.len().min(self.len.saturating_sub(offset));
        unsafe { ptr::copy_nonoverlapping(self.ptr.add(offset), out.as_mut_ptr(), len) };
    }

    fn fill(&self, value: u8) {
        unsafe { ptr::write_bytes(self.ptr, value, self.len) };
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        unsafe {
            let memory = ptr::slice_from_raw_parts_mut(self.ptr, self.len);
            drop(Box::from_raw(memory));
        }
    }
}

/// A program resource reported by the reflection queries.
#[derive(Debug, Clone, Default)]
pub struct Resource {
    pub name: String,
    pub props: HashMap<GLenum, GLint>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum Kind {
    Buffer,
    Texture,
    Sampler,
    Framebuffer,
    Shader,
    Program,
    VertexArray,
}

struct Inner {
    next_name: GLuint,
    next_fence: usize,
    calls: Vec<String>,
    errors: VecDeque<GLenum>,
    wait_results: VecDeque<GLenum>,
    fail_next_map: bool,

    live: HashSet<(Kind, GLuint)>,
    fences: HashSet<usize>,
    buffers: HashMap<GLuint, Storage>,
    mapped: HashSet<GLuint>,

    last_source: Option<String>,
    compiled: HashSet<GLuint>,
    linked: HashSet<GLuint>,
    compile_result: (bool, String),
    link_result: (bool, String),
    accept_binaries: bool,
    program_binary: (GLenum, Vec<u8>),
    resources: HashMap<GLenum, Vec<Resource>>,

    enabled: HashSet<GLenum>,
    framebuffer_status: GLenum,
}

pub struct HeadlessDevice {
    limits: Limits,
    inner: RefCell<Inner>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        HeadlessDevice::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        HeadlessDevice::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        let mut enabled = HashSet::new();
        enabled.insert(gl::DITHER);
        enabled.insert(gl::MULTISAMPLE);

        HeadlessDevice {
            limits,
            inner: RefCell::new(Inner {
                next_name: 1,
                next_fence: 1,
                calls: Vec::new(),
                errors: VecDeque::new(),
                wait_results: VecDeque::new(),
                fail_next_map: false,
                live: HashSet::new(),
                fences: HashSet::new(),
                buffers: HashMap::new(),
                mapped: HashSet::new(),
                last_source: None,
                compiled: HashSet::new(),
                linked: HashSet::new(),
                compile_result: (true, String::new()),
                link_result: (true, String::new()),
                accept_binaries: true,
                program_binary: (0x8E21, b"headless program".to_vec()),
                resources: HashMap::new(),
                enabled,
                framebuffer_status: gl::FRAMEBUFFER_COMPLETE,
            }),
        }
    }

    /// Every call received so far, formatted as `glName(args)`.
    pub fn calls(&self) -> Vec<String> {
        self.inner.borrow().calls.clone()
    }

    /// Number of recorded calls of the entry point `name`, e.g. `glBindBufferBase`.
    pub fn count(&self, name: &str) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|v| v.split('(').next() == Some(name))
            .count()
    }

    pub fn clear_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }

    /// Queues an error code returned by the next `get_error`.
    pub fn push_error(&self, code: GLenum) {
        self.inner.borrow_mut().errors.push_back(code);
    }

    /// Queues the result of the next fence wait. Waits return `ALREADY_SIGNALED` once the
    /// queue is empty.
    pub fn push_wait_result(&self, status: GLenum) {
        self.inner.borrow_mut().wait_results.push_back(status);
    }

    /// The next buffer mapping returns null.
    pub fn fail_next_map(&self) {
        self.inner.borrow_mut().fail_next_map = true;
    }

    pub fn set_compile_result(&self, success: bool, log: &str) {
        self.inner.borrow_mut().compile_result = (success, log.to_owned());
    }

    pub fn set_link_result(&self, success: bool, log: &str) {
        self.inner.borrow_mut().link_result = (success, log.to_owned());
    }

    /// Whether programs loaded from a binary report a successful link.
    pub fn set_accept_binaries(&self, accept: bool) {
        self.inner.borrow_mut().accept_binaries = accept;
    }

    pub fn set_program_binary(&self, format: GLenum, data: &[u8]) {
        self.inner.borrow_mut().program_binary = (format, data.to_vec());
    }

    pub fn set_framebuffer_status(&self, status: GLenum) {
        self.inner.borrow_mut().framebuffer_status = status;
    }

    /// Adds a resource to the reflection results of every linked program.
    pub fn add_resource(&self, interface: GLenum, name: &str, props: &[(GLenum, GLint)]) {
        let resource = Resource {
            name: name.to_owned(),
            props: props.iter().cloned().collect(),
        };

        self.inner
            .borrow_mut()
            .resources
            .entry(interface)
            .or_insert_with(Vec::new)
            .push(resource);
    }

    pub fn clear_resources(&self) {
        self.inner.borrow_mut().resources.clear();
    }

    /// A copy of the storage of `buffer`.
    pub fn buffer_content(&self, buffer: GLuint) -> Option<Vec<u8>> {
        let inner = self.inner.borrow();
        inner.buffers.get(&buffer).map(|v| {
            let mut out = vec![0; v.len];
            v.read(0, &mut out);
            out
        })
    }

    pub fn is_mapped(&self, buffer: GLuint) -> bool {
        self.inner.borrow().mapped.contains(&buffer)
    }

    /// The source passed to the last `shader_source` call.
    pub fn last_shader_source(&self) -> Option<String> {
        self.inner.borrow().last_source.clone()
    }

    /// Number of driver objects that have been created but not deleted yet.
    pub fn live_objects(&self) -> usize {
        self.inner.borrow().live.len()
    }

    /// Number of fences that have been created but not deleted yet.
    pub fn live_fences(&self) -> usize {
        self.inner.borrow().fences.len()
    }

    fn record(&self, call: String) {
        trace!("[Headless] {}", call);
        self.inner.borrow_mut().calls.push(call);
    }

    fn create(&self, kind: Kind) -> GLuint {
        let mut inner = self.inner.borrow_mut();
        let name = inner.next_name;
        inner.next_name += 1;
        inner.live.insert((kind, name));
        name
    }

    fn delete(&self, kind: Kind, name: GLuint) {
        if name != 0 {
            self.inner.borrow_mut().live.remove(&(kind, name));
        }
    }

    fn resource_prop(&self, interface: GLenum, index: GLuint, prop: GLenum) -> GLint {
        let inner = self.inner.borrow();
        let resource = inner
            .resources
            .get(&interface)
            .and_then(|v| v.get(index as usize));

        match resource.and_then(|v| v.props.get(&prop)) {
            Some(v) => *v,
            None if prop == gl::NAME_LENGTH => {
                resource.map(|v| v.name.len() as GLint + 1).unwrap_or(0)
            }
            None if prop == gl::BLOCK_INDEX || prop == gl::LOCATION => -1,
            None => 0,
        }
    }
}

unsafe impl Device for HeadlessDevice {
    fn limits(&self) -> Limits {
        self.limits
    }

    fn get_error(&self) -> GLenum {
        self.inner
            .borrow_mut()
            .errors
            .pop_front()
            .unwrap_or(gl::NO_ERROR)
    }

    fn create_buffer(&self) -> GLuint {
        let id = self.create(Kind::Buffer);
        self.record(format!("glCreateBuffers({})", id));
        id
    }

    fn buffer_storage(&self, buffer: GLuint, size: usize, data: Option<&[u8]>, flags: GLbitfield) {
        self.record(format!(
            "glNamedBufferStorage({}, {}, {}, {:#x})",
            buffer,
            size,
            data.is_some(),
            flags
        ));

        let storage = Storage::new(size);
        if let Some(data) = data {
            storage.write(0, data);
        }

        self.inner.borrow_mut().buffers.insert(buffer, storage);
    }

    fn map_buffer_range(
        &self,
        buffer: GLuint,
        offset: usize,
        len: usize,
        access: GLbitfield,
    ) -> *mut u8 {
        self.record(format!(
            "glMapNamedBufferRange({}, {}, {}, {:#x})",
            buffer, offset, len, access
        ));

        let mut inner = self.inner.borrow_mut();
        if inner.fail_next_map {
            inner.fail_next_map = false;
            return ptr::null_mut();
        }

        let mapped = inner
            .buffers
            .get(&buffer)
            .filter(|v| offset + len <= v.len)
            .map(|v| unsafe { v.ptr.add(offset) });

        match mapped {
            Some(ptr) => {
                inner.mapped.insert(buffer);
                ptr
            }
            None => {
                inner.errors.push_back(gl::INVALID_VALUE);
                ptr::null_mut()
            }
        }
    }

    fn unmap_buffer(&self, buffer: GLuint) -> bool {
        self.record(format!("glUnmapNamedBuffer({})", buffer));
        self.inner.borrow_mut().mapped.remove(&buffer)
    }

    fn flush_mapped_buffer_range(&self, buffer: GLuint, offset: usize, len: usize) {
        self.record(format!(
            "glFlushMappedNamedBufferRange({}, {}, {})",
            buffer, offset, len
        ));
    }

    fn clear_buffer_data(&self, buffer: GLuint, internal_format: GLenum, format: GLenum, ty: GLenum) {
        self.record(format!(
            "glClearNamedBufferData({}, {:#x}, {:#x}, {:#x})",
            buffer, internal_format, format, ty
        ));

        if let Some(v) = self.inner.borrow().buffers.get(&buffer) {
            v.fill(0);
        }
    }

    fn buffer_sub_data(&self, buffer: GLuint, offset: usize, data: &[u8]) {
        self.record(format!(
            "glNamedBufferSubData({}, {}, {})",
            buffer,
            offset,
            data.len()
        ));

        if let Some(v) = self.inner.borrow().buffers.get(&buffer) {
            v.write(offset, data);
        }
    }

    fn get_buffer_sub_data(&self, buffer: GLuint, offset: usize, out: &mut [u8]) {
        self.record(format!(
            "glGetNamedBufferSubData({}, {}, {})",
            buffer,
            offset,
            out.len()
        ));

        if let Some(v) = self.inner.borrow().buffers.get(&buffer) {
            v.read(offset, out);
        }
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        self.record(format!("glBindBuffer({:#x}, {})", target, buffer));
    }

    fn bind_buffer_base(&self, target: GLenum, index: GLuint, buffer: GLuint) {
        self.record(format!(
            "glBindBufferBase({:#x}, {}, {})",
            target, index, buffer
        ));
    }

    fn bind_buffer_range(
        &self,
        target: GLenum,
        index: GLuint,
        buffer: GLuint,
        offset: usize,
        size: usize,
    ) {
        self.record(format!(
            "glBindBufferRange({:#x}, {}, {}, {}, {})",
            target, index, buffer, offset, size
        ));
    }

    fn bind_vertex_buffer(&self, binding: GLuint, buffer: GLuint, offset: usize, stride: GLsizei) {
        self.record(format!(
            "glBindVertexBuffer({}, {}, {}, {})",
            binding, buffer, offset, stride
        ));
    }

    fn delete_buffer(&self, buffer: GLuint) {
        self.record(format!("glDeleteBuffers({})", buffer));
        self.delete(Kind::Buffer, buffer);

        let mut inner = self.inner.borrow_mut();
        inner.mapped.remove(&buffer);
        inner.buffers.remove(&buffer);
    }

    fn create_texture(&self, target: GLenum) -> GLuint {
        let id = self.create(Kind::Texture);
        self.record(format!("glCreateTextures({:#x}, {})", target, id));
        id
    }

    fn gen_texture(&self) -> GLuint {
        let id = self.create(Kind::Texture);
        self.record(format!("glGenTextures({})", id));
        id
    }

    fn texture_storage_2d(&self, texture: GLuint, levels: u32, format: GLenum, w: u32, h: u32) {
        self.record(format!(
            "glTextureStorage2D({}, {}, {:#x}, {}, {})",
            texture, levels, format, w, h
        ));
    }

    fn texture_storage_2d_multisample(
        &self,
        texture: GLuint,
        samples: u32,
        format: GLenum,
        w: u32,
        h: u32,
    ) {
        self.record(format!(
            "glTextureStorage2DMultisample({}, {}, {:#x}, {}, {})",
            texture, samples, format, w, h
        ));
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
        self.record(format!(
            "glTextureStorage3D({}, {}, {:#x}, {}, {}, {})",
            texture, levels, format, w, h, d
        ));
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
        self.record(format!(
            "glTextureSubImage2D({}, {}, {:?}, {:?}, {:#x}, {:#x}, {})",
            texture,
            level,
            offset,
            size,
            format,
            ty,
            data.len()
        ));
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
        self.record(format!(
            "glTextureSubImage3D({}, {}, {:?}, {:?}, {:#x}, {:#x}, {})",
            texture,
            level,
            offset,
            size,
            format,
            ty,
            data.len()
        ));
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
        self.record(format!(
            "glTextureView({}, {:#x}, {}, {:#x}, {:?}, {:?})",
            texture, target, original, format, levels, layers
        ));
    }

    fn texture_buffer_range(
        &self,
        texture: GLuint,
        format: GLenum,
        buffer: GLuint,
        offset: usize,
        size: usize,
    ) {
        self.record(format!(
            "glTextureBufferRange({}, {:#x}, {}, {}, {})",
            texture, format, buffer, offset, size
        ));
    }

    fn generate_texture_mipmap(&self, texture: GLuint) {
        self.record(format!("glGenerateTextureMipmap({})", texture));
    }

    fn clear_tex_image(&self, texture: GLuint, level: u32, format: GLenum, ty: GLenum) {
        self.record(format!(
            "glClearTexImage({}, {}, {:#x}, {:#x})",
            texture, level, format, ty
        ));
    }

    fn get_texture_image(
        &self,
        texture: GLuint,
        level: u32,
        format: GLenum,
        ty: GLenum,
        out: &mut [u8],
    ) {
        self.record(format!(
            "glGetTextureImage({}, {}, {:#x}, {:#x}, {})",
            texture,
            level,
            format,
            ty,
            out.len()
        ));

        for v in out.iter_mut() {
            *v = 0;
        }
    }

    fn bind_texture_unit(&self, unit: GLuint, texture: GLuint) {
        self.record(format!("glBindTextureUnit({}, {})", unit, texture));
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
        self.record(format!(
            "glBindImageTexture({}, {}, {}, {:?}, {:#x}, {:#x})",
            unit, texture, level, layer, access, format
        ));
    }

    fn delete_texture(&self, texture: GLuint) {
        self.record(format!("glDeleteTextures({})", texture));
        self.delete(Kind::Texture, texture);
    }

    fn create_sampler(&self) -> GLuint {
        let id = self.create(Kind::Sampler);
        self.record(format!("glCreateSamplers({})", id));
        id
    }

    fn sampler_parameter_i(&self, sampler: GLuint, pname: GLenum, value: GLint) {
        self.record(format!(
            "glSamplerParameteri({}, {:#x}, {:#x})",
            sampler, pname, value
        ));
    }

    fn sampler_parameter_f(&self, sampler: GLuint, pname: GLenum, value: GLfloat) {
        self.record(format!(
            "glSamplerParameterf({}, {:#x}, {})",
            sampler, pname, value
        ));
    }

    fn sampler_parameter_fv(&self, sampler: GLuint, pname: GLenum, value: &[GLfloat]) {
        self.record(format!(
            "glSamplerParameterfv({}, {:#x}, {:?})",
            sampler, pname, value
        ));
    }

    fn bind_sampler(&self, unit: GLuint, sampler: GLuint) {
        self.record(format!("glBindSampler({}, {})", unit, sampler));
    }

    fn delete_sampler(&self, sampler: GLuint) {
        self.record(format!("glDeleteSamplers({})", sampler));
        self.delete(Kind::Sampler, sampler);
    }

    fn create_framebuffer(&self) -> GLuint {
        let id = self.create(Kind::Framebuffer);
        self.record(format!("glCreateFramebuffers({})", id));
        id
    }

    fn framebuffer_texture(&self, fbo: GLuint, attachment: GLenum, texture: GLuint, level: u32) {
        self.record(format!(
            "glNamedFramebufferTexture({}, {:#x}, {}, {})",
            fbo, attachment, texture, level
        ));
    }

    fn framebuffer_texture_layer(
        &self,
        fbo: GLuint,
        attachment: GLenum,
        texture: GLuint,
        level: u32,
        layer: u32,
    ) {
        self.record(format!(
            "glNamedFramebufferTextureLayer({}, {:#x}, {}, {}, {})",
            fbo, attachment, texture, level, layer
        ));
    }

    fn framebuffer_draw_buffers(&self, fbo: GLuint, buffers: &[GLenum]) {
        self.record(format!(
            "glNamedFramebufferDrawBuffers({}, {:?})",
            fbo, buffers
        ));
    }

    fn framebuffer_read_buffer(&self, fbo: GLuint, buffer: GLenum) {
        self.record(format!(
            "glNamedFramebufferReadBuffer({}, {:#x})",
            fbo, buffer
        ));
    }

    fn check_framebuffer_status(&self, fbo: GLuint, target: GLenum) -> GLenum {
        self.record(format!(
            "glCheckNamedFramebufferStatus({}, {:#x})",
            fbo, target
        ));
        self.inner.borrow().framebuffer_status
    }

    fn bind_framebuffer(&self, target: GLenum, fbo: GLuint) {
        self.record(format!("glBindFramebuffer({:#x}, {})", target, fbo));
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
        self.record(format!(
            "glBlitNamedFramebuffer({}, {}, {:?}, {:?}, {:#x}, {:#x})",
            src, dst, src_rect, dst_rect, mask, filter
        ));
    }

    fn clear_framebuffer_color(&self, fbo: GLuint, draw_buffer: i32, rgba: [f32; 4]) {
        self.record(format!(
            "glClearNamedFramebufferfv({}, {}, {:?})",
            fbo, draw_buffer, rgba
        ));
    }

    fn clear_framebuffer_depth_stencil(&self, fbo: GLuint, depth: f32, stencil: i32) {
        self.record(format!(
            "glClearNamedFramebufferfi({}, {}, {})",
            fbo, depth, stencil
        ));
    }

    fn viewport(&self, x: i32, y: i32, w: u32, h: u32) {
        self.record(format!("glViewport({}, {}, {}, {})", x, y, w, h));
    }

    fn delete_framebuffer(&self, fbo: GLuint) {
        self.record(format!("glDeleteFramebuffers({})", fbo));
        self.delete(Kind::Framebuffer, fbo);
    }

    fn create_shader(&self, ty: GLenum) -> GLuint {
        let id = self.create(Kind::Shader);
        self.record(format!("glCreateShader({:#x}) = {}", ty, id));
        id
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        self.record(format!("glShaderSource({}, {})", shader, source.len()));
        self.inner.borrow_mut().last_source = Some(source.to_owned());
    }

    fn compile_shader(&self, shader: GLuint) {
        self.record(format!("glCompileShader({})", shader));

        let mut inner = self.inner.borrow_mut();
        if inner.compile_result.0 {
            inner.compiled.insert(shader);
        }
    }

    fn shader_iv(&self, shader: GLuint, pname: GLenum) -> GLint {
        let inner = self.inner.borrow();
        match pname {
            gl::COMPILE_STATUS => {
                if inner.compiled.contains(&shader) {
                    GLint::from(gl::TRUE)
                } else {
                    GLint::from(gl::FALSE)
                }
            }
            gl::INFO_LOG_LENGTH => inner.compile_result.1.len() as GLint,
            _ => 0,
        }
    }

    fn shader_info_log(&self, _: GLuint) -> String {
        self.inner.borrow().compile_result.1.clone()
    }

    fn delete_shader(&self, shader: GLuint) {
        self.record(format!("glDeleteShader({})", shader));
        self.delete(Kind::Shader, shader);

        self.inner.borrow_mut().compiled.remove(&shader);
    }

    fn create_program(&self) -> GLuint {
        let id = self.create(Kind::Program);
        self.record(format!("glCreateProgram() = {}", id));
        id
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        self.record(format!("glAttachShader({}, {})", program, shader));
    }

    fn program_parameter_i(&self, program: GLuint, pname: GLenum, value: GLint) {
        self.record(format!(
            "glProgramParameteri({}, {:#x}, {})",
            program, pname, value
        ));
    }

    fn link_program(&self, program: GLuint) {
        self.record(format!("glLinkProgram({})", program));

        let mut inner = self.inner.borrow_mut();
        if inner.link_result.0 {
            inner.linked.insert(program);
        }
    }

    fn program_iv(&self, program: GLuint, pname: GLenum) -> GLint {
        let inner = self.inner.borrow();
        match pname {
            gl::LINK_STATUS => {
                if inner.linked.contains(&program) {
                    GLint::from(gl::TRUE)
                } else {
                    GLint::from(gl::FALSE)
                }
            }
            gl::INFO_LOG_LENGTH => inner.link_result.1.len() as GLint,
            gl::PROGRAM_BINARY_LENGTH => inner.program_binary.1.len() as GLint,
            _ => 0,
        }
    }

    fn program_info_log(&self, _: GLuint) -> String {
        self.inner.borrow().link_result.1.clone()
    }

    fn program_interface_iv(&self, program: GLuint, interface: GLenum, pname: GLenum) -> GLint {
        let inner = self.inner.borrow();
        if pname != gl::ACTIVE_RESOURCES || !inner.linked.contains(&program) {
            return 0;
        }

        inner
            .resources
            .get(&interface)
            .map(|v| v.len() as GLint)
            .unwrap_or(0)
    }

    fn program_resource_iv(
        &self,
        _: GLuint,
        interface: GLenum,
        index: GLuint,
        props: &[GLenum],
        out: &mut [GLint],
    ) {
        for (prop, v) in props.iter().zip(out.iter_mut()) {
            *v = self.resource_prop(interface, index, *prop);
        }
    }

    fn program_resource_name(&self, _: GLuint, interface: GLenum, index: GLuint) -> String {
        self.inner
            .borrow()
            .resources
            .get(&interface)
            .and_then(|v| v.get(index as usize))
            .map(|v| v.name.clone())
            .unwrap_or_default()
    }

    fn get_program_binary(&self, program: GLuint) -> Option<(GLenum, Vec<u8>)> {
        self.record(format!("glGetProgramBinary({})", program));

        let inner = self.inner.borrow();
        if inner.linked.contains(&program) {
            Some(inner.program_binary.clone())
        } else {
            None
        }
    }

    fn program_binary(&self, program: GLuint, format: GLenum, data: &[u8]) {
        self.record(format!(
            "glProgramBinary({}, {:#x}, {})",
            program,
            format,
            data.len()
        ));

        let mut inner = self.inner.borrow_mut();
        if inner.accept_binaries {
            inner.linked.insert(program);
        }
    }

    fn use_program(&self, program: GLuint) {
        self.record(format!("glUseProgram({})", program));
    }

    fn dispatch_compute(&self, x: u32, y: u32, z: u32) {
        self.record(format!("glDispatchCompute({}, {}, {})", x, y, z));
    }

    fn delete_program(&self, program: GLuint) {
        self.record(format!("glDeleteProgram({})", program));
        self.delete(Kind::Program, program);
        self.inner.borrow_mut().linked.remove(&program);
    }

    fn create_vertex_array(&self) -> GLuint {
        let id = self.create(Kind::VertexArray);
        self.record(format!("glCreateVertexArrays({})", id));
        id
    }

    fn enable_vertex_array_attrib(&self, vao: GLuint, index: GLuint) {
        self.record(format!("glEnableVertexArrayAttrib({}, {})", vao, index));
    }

    fn vertex_array_attrib_binding(&self, vao: GLuint, index: GLuint, binding: GLuint) {
        self.record(format!(
            "glVertexArrayAttribBinding({}, {}, {})",
            vao, index, binding
        ));
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
        self.record(format!(
            "glVertexArrayAttribFormat({}, {}, {}, {:#x}, {}, {})",
            vao, index, size, ty, normalized, offset
        ));
    }

    fn vertex_array_attrib_i_format(
        &self,
        vao: GLuint,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        offset: GLuint,
    ) {
        self.record(format!(
            "glVertexArrayAttribIFormat({}, {}, {}, {:#x}, {})",
            vao, index, size, ty, offset
        ));
    }

    fn vertex_array_attrib_l_format(
        &self,
        vao: GLuint,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        offset: GLuint,
    ) {
        self.record(format!(
            "glVertexArrayAttribLFormat({}, {}, {}, {:#x}, {})",
            vao, index, size, ty, offset
        ));
    }

    fn vertex_array_binding_divisor(&self, vao: GLuint, binding: GLuint, divisor: GLuint) {
        self.record(format!(
            "glVertexArrayBindingDivisor({}, {}, {})",
            vao, binding, divisor
        ));
    }

    fn bind_vertex_array(&self, vao: GLuint) {
        self.record(format!("glBindVertexArray({})", vao));
    }

    fn draw_arrays(&self, mode: GLenum, first: i32, count: i32) {
        self.record(format!("glDrawArrays({:#x}, {}, {})", mode, first, count));
    }

    fn delete_vertex_array(&self, vao: GLuint) {
        self.record(format!("glDeleteVertexArrays({})", vao));
        self.delete(Kind::VertexArray, vao);
    }

    fn enable(&self, cap: GLenum) {
        self.record(format!("glEnable({:#x})", cap));
        self.inner.borrow_mut().enabled.insert(cap);
    }

    fn disable(&self, cap: GLenum) {
        self.record(format!("glDisable({:#x})", cap));
        self.inner.borrow_mut().enabled.remove(&cap);
    }

    fn enable_i(&self, cap: GLenum, index: GLuint) {
        self.record(format!("glEnablei({:#x}, {})", cap, index));
        if index == 0 {
            self.inner.borrow_mut().enabled.insert(cap);
        }
    }

    fn disable_i(&self, cap: GLenum, index: GLuint) {
        self.record(format!("glDisablei({:#x}, {})", cap, index));
        if index == 0 {
            self.inner.borrow_mut().enabled.remove(&cap);
        }
    }

    fn is_enabled(&self, cap: GLenum) -> bool {
        self.inner.borrow().enabled.contains(&cap)
    }

    fn depth_mask(&self, write: bool) {
        self.record(format!("glDepthMask({})", write));
    }

    fn depth_func(&self, func: GLenum) {
        self.record(format!("glDepthFunc({:#x})", func));
    }

    fn fence_sync(&self) -> Fence {
        let fence = {
            let mut inner = self.inner.borrow_mut();
            let fence = inner.next_fence;
            inner.next_fence += 1;
            inner.fences.insert(fence);
            fence
        };

        self.record(format!("glFenceSync() = {}", fence));
        Fence(fence)
    }

    fn client_wait_sync(&self, fence: Fence, flags: GLbitfield, timeout_ns: u64) -> GLenum {
        self.record(format!(
            "glClientWaitSync({}, {:#x}, {})",
            fence.0, flags, timeout_ns
        ));

        self.inner
            .borrow_mut()
            .wait_results
            .pop_front()
            .unwrap_or(gl::ALREADY_SIGNALED)
    }

    fn delete_sync(&self, fence: Fence) {
        self.record(format!("glDeleteSync({})", fence.0));
        self.inner.borrow_mut().fences.remove(&fence.0);
    }

    fn debug_output(&self, severity: DebugSeverity) {
        self.record(format!("glDebugMessageCallback({:?})", severity));

        let mut inner = self.inner.borrow_mut();
        inner.enabled.insert(gl::DEBUG_OUTPUT);
        inner.enabled.insert(gl::DEBUG_OUTPUT_SYNCHRONOUS);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn storage_is_shared_with_mappings() {
        let device = HeadlessDevice::new();
        let id = device.create_buffer();
        device.buffer_storage(id, 8, Some(&[1, 2, 3, 4, 5, 6, 7, 8]), 0);

        let ptr = device.map_buffer_range(id, 4, 4, gl::MAP_WRITE_BIT);
        assert!(!ptr.is_null());
        unsafe { *ptr = 42 };

        assert!(device.is_mapped(id));
        assert_eq!(device.buffer_content(id), Some(vec![1, 2, 3, 4, 42, 6, 7, 8]));

        assert!(device.unmap_buffer(id));
        assert!(!device.unmap_buffer(id));

        device.delete_buffer(id);
        assert_eq!(device.live_objects(), 0);
        assert_eq!(device.buffer_content(id), None);
    }

    #[test]
    fn invalid_maps() {
        let device = HeadlessDevice::new();
        let id = device.create_buffer();
        device.buffer_storage(id, 8, None, 0);

        assert!(device.map_buffer_range(id, 4, 8, gl::MAP_WRITE_BIT).is_null());
        assert_eq!(device.get_error(), gl::INVALID_VALUE);
        assert_eq!(device.get_error(), gl::NO_ERROR);

        device.fail_next_map();
        assert!(device.map_buffer_range(id, 0, 8, gl::MAP_WRITE_BIT).is_null());
        assert!(!device.map_buffer_range(id, 0, 8, gl::MAP_WRITE_BIT).is_null());
    }

    #[test]
    fn call_log() {
        let device = HeadlessDevice::new();
        device.bind_buffer_base(gl::UNIFORM_BUFFER, 0, 1);
        device.bind_buffer_range(gl::UNIFORM_BUFFER, 0, 1, 0, 16);
        device.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, 1);

        assert_eq!(device.count("glBindBufferBase"), 1);
        assert_eq!(device.count("glBindBuffer"), 1);
        assert_eq!(device.calls().len(), 3);

        device.clear_calls();
        assert!(device.calls().is_empty());
    }

    #[test]
    fn fences() {
        let device = HeadlessDevice::new();
        device.push_wait_result(gl::TIMEOUT_EXPIRED);

        let fence = device.fence_sync();
        assert_eq!(device.live_fences(), 1);
        assert_eq!(device.client_wait_sync(fence, 0, 1), gl::TIMEOUT_EXPIRED);
        assert_eq!(device.client_wait_sync(fence, 0, 1), gl::ALREADY_SIGNALED);

        device.delete_sync(fence);
        assert_eq!(device.live_fences(), 0);
    }
}
