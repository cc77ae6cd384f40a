//! Shader programs with include handling, hot reload and reflected block layouts.

pub mod include;
pub mod meta;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use gl::types::*;
use serde::{Deserialize, Serialize};

use self::meta::*;
use crate::buffer::Buffer;
use crate::context::Context;
use crate::errors::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderType {
    Vertex,
    Fragment,
    TessEvaluation,
    TessControl,
    Geometry,
    Compute,
}

impl ShaderType {
    pub const ALL: [ShaderType; 6] = [
        ShaderType::Vertex,
        ShaderType::Fragment,
        ShaderType::TessEvaluation,
        ShaderType::TessControl,
        ShaderType::Geometry,
        ShaderType::Compute,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderType::Vertex => "vertex",
            ShaderType::Fragment => "fragment",
            ShaderType::TessEvaluation => "tessellation evaluation",
            ShaderType::TessControl => "tessellation control",
            ShaderType::Geometry => "geometry",
            ShaderType::Compute => "compute",
        }
    }
}

/// A linked program in the driver's binary format, for on-disk program caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramBinary {
    pub format: u32,
    pub data: Vec<u8>,
}

impl ProgramBinary {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<ProgramBinary> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[derive(Debug)]
struct Shader {
    id: GLuint,
    origin: String,
    prefix: String,
    /// Main file of file based shaders.
    path: Option<PathBuf>,
    /// Every file that contributed to the source.
    files: HashSet<PathBuf>,
}

/// A set of shaders and the program linked from them.
///
/// Failing to compile or link never destroys what was there before, so a broken hot reload
/// leaves the last working program in place.
#[derive(Debug)]
pub struct ShaderObject {
    ctx: Context,
    name: String,
    shaders: [Option<Shader>; 6],
    program: GLuint,

    global_uniforms: HashMap<String, UniformVariableInfo>,
    uniform_blocks: HashMap<String, BufferInfo<UniformVariableInfo>>,
    storage_blocks: HashMap<String, BufferInfo<BufferVariableInfo>>,
    num_inputs: i32,
    num_outputs: i32,
}

impl ShaderObject {
    pub fn new<T: Into<String>>(ctx: &Context, name: T) -> Self {
        ShaderObject {
            ctx: ctx.clone(),
            name: name.into(),
            shaders: [None, None, None, None, None, None],
            program: 0,
            global_uniforms: HashMap::new(),
            uniform_blocks: HashMap::new(),
            storage_blocks: HashMap::new(),
            num_inputs: 0,
            num_outputs: 0,
        }
    }

    /// Compiles a shader from a file, expanding `#include "file"` directives relative to the
    /// including file. `prefix` is inserted right after the `#version` line.
    pub fn add_shader_from_file<P: AsRef<Path>>(
        &mut self,
        ty: ShaderType,
        path: P,
        prefix: &str,
    ) -> Result<()> {
        let path = include::normalize(path.as_ref());
        let expanded = include::expand_file(&path, prefix)?;
        let origin = path.display().to_string();

        self.add_shader(ty, &expanded.source, origin, prefix, Some(path), expanded.files)
    }

    /// Compiles a shader from source. `origin` names the shader in log messages.
    pub fn add_shader_from_source(&mut self, ty: ShaderType, source: &str, origin: &str) -> Result<()> {
        self.add_shader(ty, source, origin.to_owned(), "", None, HashSet::new())
    }

    fn add_shader(
        &mut self,
        ty: ShaderType,
        source: &str,
        origin: String,
        prefix: &str,
        path: Option<PathBuf>,
        files: HashSet<PathBuf>,
    ) -> Result<()> {
        debug_assert!(!source.is_empty(), "Shader source code is empty!");

        let device = self.ctx.device();
        let id = device.create_shader(ty.into());
        device.shader_source(id, source);
        device.compile_shader(id);

        if let Err(err) = self.ctx.check("glCompileShader") {
            device.delete_shader(id);
            return Err(err);
        }

        // The error flag is not reliable for compilation.
        let compiled = device.shader_iv(id, gl::COMPILE_STATUS) == GLint::from(gl::TRUE);
        if !compiled {
            let log = device.shader_info_log(id);
            error!(
                "ShaderObject \"{}\": failed to compile {} shader {}:\n{}",
                self.name,
                ty.name(),
                origin,
                log
            );

            device.delete_shader(id);
            return Err(Error::ShaderCompile(ty.name(), self.name.clone(), origin, log));
        }

        if self.ctx.settings().shader_compile_logs {
            let log = device.shader_info_log(id);
            if log.trim().is_empty() {
                info!(
                    "ShaderObject \"{}\": {} shader {} compiled successfully.",
                    self.name,
                    ty.name(),
                    origin
                );
            } else {
                warn!(
                    "ShaderObject \"{}\": {} shader {} compiled. Output:\n{}",
                    self.name,
                    ty.name(),
                    origin,
                    log
                );
            }
        }

        if let Some(old) = self.shaders[ty.index()].take() {
            device.delete_shader(old.id);
        }

        self.shaders[ty.index()] = Some(Shader {
            id,
            origin,
            prefix: prefix.to_owned(),
            path,
            files,
        });

        Ok(())
    }

    /// Links all compiled shaders into a new program and queries its layout information.
    pub fn create_program(&mut self) -> Result<()> {
        let device = self.ctx.device();

        if self.shaders.iter().all(|v| v.is_none()) {
            error!("ShaderObject \"{}\": no shaders to link.", self.name);
            return Err(Error::NoShaderAttached(self.name.clone()));
        }

        let program = device.create_program();
        device.program_parameter_i(
            program,
            gl::PROGRAM_BINARY_RETRIEVABLE_HINT,
            GLint::from(gl::TRUE),
        );

        for shader in self.shaders.iter().flatten() {
            device.attach_shader(program, shader.id);
        }

        device.link_program(program);
        if let Err(err) = self.ctx.check("glLinkProgram") {
            device.delete_program(program);
            return Err(err);
        }

        let linked = device.program_iv(program, gl::LINK_STATUS) == GLint::from(gl::TRUE);
        if !linked {
            let log = device.program_info_log(program);
            error!("Program \"{}\" failed to link:\n{}", self.name, log);

            device.delete_program(program);
            return Err(Error::ProgramLink(self.name.clone(), log));
        }

        if self.ctx.settings().shader_compile_logs {
            let log = device.program_info_log(program);
            if log.trim().is_empty() {
                info!("Program \"{}\" linked successfully.", self.name);
            } else {
                warn!("Program \"{}\" linked. Output:\n{}", self.name, log);
            }
        }

        self.replace_program(program);
        Ok(())
    }

    fn replace_program(&mut self, program: GLuint) {
        if self.program != 0 {
            {
                let mut state = self.ctx.state();
                if state.program == self.program {
                    state.program = 0;
                }
            }

            self.ctx.device().delete_program(self.program);
        }

        self.program = program;
        self.reflect();
    }

    fn reflect(&mut self) {
        let device = self.ctx.device();
        let program = self.program;

        self.uniform_blocks = self.query_blocks(gl::UNIFORM_BLOCK);
        self.storage_blocks = self.query_blocks(gl::SHADER_STORAGE_BLOCK);
        self.global_uniforms.clear();

        const UNIFORM_PROPS: [GLenum; 9] = [
            gl::TYPE,
            gl::ARRAY_SIZE,
            gl::OFFSET,
            gl::BLOCK_INDEX,
            gl::ARRAY_STRIDE,
            gl::MATRIX_STRIDE,
            gl::IS_ROW_MAJOR,
            gl::ATOMIC_COUNTER_BUFFER_INDEX,
            gl::LOCATION,
        ];

        let num = device.program_interface_iv(program, gl::UNIFORM, gl::ACTIVE_RESOURCES);
        for i in 0..num.max(0) as GLuint {
            let mut v = [0; 9];
            device.program_resource_iv(program, gl::UNIFORM, i, &UNIFORM_PROPS, &mut v);
            let name = device.program_resource_name(program, gl::UNIFORM, i);

            let info = UniformVariableInfo {
                ty: ShaderVariableType::from_gl(v[0] as GLenum),
                array_size: v[1],
                block_offset: v[2],
                array_stride: v[4],
                matrix_stride: v[5],
                row_major: v[6] > 0,
                atomic_counter_buffer_index: v[7],
                location: v[8],
            };

            if v[3] < 0 {
                self.global_uniforms.insert(name, info);
            } else if let Some(block) = self.uniform_blocks.values_mut().find(|b| b.index == v[3]) {
                block.variables.insert(name, info);
            }
        }

        const BUFFER_VARIABLE_PROPS: [GLenum; 9] = [
            gl::TYPE,
            gl::ARRAY_SIZE,
            gl::OFFSET,
            gl::BLOCK_INDEX,
            gl::ARRAY_STRIDE,
            gl::MATRIX_STRIDE,
            gl::IS_ROW_MAJOR,
            gl::TOP_LEVEL_ARRAY_SIZE,
            gl::TOP_LEVEL_ARRAY_STRIDE,
        ];

        let num = device.program_interface_iv(program, gl::BUFFER_VARIABLE, gl::ACTIVE_RESOURCES);
        for i in 0..num.max(0) as GLuint {
            let mut v = [0; 9];
            device.program_resource_iv(program, gl::BUFFER_VARIABLE, i, &BUFFER_VARIABLE_PROPS, &mut v);
            let name = device.program_resource_name(program, gl::BUFFER_VARIABLE, i);

            let info = BufferVariableInfo {
                ty: ShaderVariableType::from_gl(v[0] as GLenum),
                array_size: v[1],
                block_offset: v[2],
                array_stride: v[4],
                matrix_stride: v[5],
                row_major: v[6] > 0,
                top_level_array_size: v[7],
                top_level_array_stride: v[8],
            };

            if let Some(block) = self.storage_blocks.values_mut().find(|b| b.index == v[3]) {
                block.variables.insert(name, info);
            }
        }

        self.num_inputs = device.program_interface_iv(program, gl::PROGRAM_INPUT, gl::ACTIVE_RESOURCES);
        self.num_outputs = device.program_interface_iv(program, gl::PROGRAM_OUTPUT, gl::ACTIVE_RESOURCES);

        debug!(
            "Program \"{}\": {} uniform blocks, {} storage blocks, {} global uniforms.",
            self.name,
            self.uniform_blocks.len(),
            self.storage_blocks.len(),
            self.global_uniforms.len()
        );
    }

    fn query_blocks<V>(&self, interface: GLenum) -> HashMap<String, BufferInfo<V>> {
        const BLOCK_PROPS: [GLenum; 2] = [gl::BUFFER_BINDING, gl::BUFFER_DATA_SIZE];

        let device = self.ctx.device();
        let num = device.program_interface_iv(self.program, interface, gl::ACTIVE_RESOURCES);

        let mut blocks = HashMap::new();
        for i in 0..num.max(0) as GLuint {
            let mut v = [0; 2];
            device.program_resource_iv(self.program, interface, i, &BLOCK_PROPS, &mut v);
            let name = device.program_resource_name(self.program, interface, i);

            let mut info = BufferInfo::new(v[0], v[1].max(0) as usize);
            info.index = i as i32;
            blocks.insert(name, info);
        }

        blocks
    }

    /// Makes the program current if it is not already.
    pub fn activate(&self) {
        debug_assert!(
            self.program != 0,
            "No shader program ready yet for ShaderObject \"{}\". Call create_program first!",
            self.name
        );

        let mut state = self.ctx.state();
        if state.program != self.program {
            self.ctx.device().use_program(self.program);
            state.program = self.program;
        }
    }

    /// Activates the program and dispatches a compute workload.
    pub fn dispatch_compute(&self, x: u32, y: u32, z: u32) {
        debug_assert!(
            self.has_shader(ShaderType::Compute),
            "The program must contain a compute shader to be dispatched!"
        );

        self.activate();
        self.ctx.device().dispatch_compute(x, y, z);
    }

    /// Binds `buffer` to the binding point of the uniform block `block`.
    pub fn bind_uniform_buffer(&self, buffer: &Buffer, block: &str) -> Result<()> {
        match self.uniform_blocks.get(block) {
            Some(info) => {
                buffer.bind_uniform_buffer_whole(info.binding as usize);
                Ok(())
            }
            None => Err(self.unknown_block(block)),
        }
    }

    /// Binds `buffer` to the binding point of the shader storage block `block`.
    pub fn bind_shader_storage_buffer(&self, buffer: &Buffer, block: &str) -> Result<()> {
        match self.storage_blocks.get(block) {
            Some(info) => {
                buffer.bind_shader_storage_buffer_whole(info.binding as usize);
                Ok(())
            }
            None => Err(self.unknown_block(block)),
        }
    }

    fn unknown_block(&self, block: &str) -> Error {
        error!(
            "Shader \"{}\" doesn't contain a block named \"{}\".",
            self.name, block
        );
        Error::UnknownBlock(self.name.clone(), block.to_owned())
    }

    /// Retrieves the linked program in the driver's binary format.
    pub fn program_binary(&self) -> Result<ProgramBinary> {
        if self.program == 0 {
            return Err(Error::ProgramNotLinked(self.name.clone()));
        }

        let binary = self.ctx.device().get_program_binary(self.program);
        self.ctx.check("glGetProgramBinary")?;

        match binary {
            Some((format, data)) => Ok(ProgramBinary { format, data }),
            None => Err(Error::ProgramBinary(format!(
                "driver returned no binary for program \"{}\"",
                self.name
            ))),
        }
    }

    /// Replaces the program with one loaded from a binary. The compiled shaders are left
    /// untouched, a rejected binary keeps the previous program.
    pub fn load_program_binary(&mut self, binary: &ProgramBinary) -> Result<()> {
        let device = self.ctx.device();
        let program = device.create_program();
        device.program_binary(program, binary.format, &binary.data);

        if let Err(err) = self.ctx.check("glProgramBinary") {
            device.delete_program(program);
            return Err(err);
        }

        if device.program_iv(program, gl::LINK_STATUS) != GLint::from(gl::TRUE) {
            let log = device.program_info_log(program);
            warn!("Program \"{}\" rejected its binary:\n{}", self.name, log);

            device.delete_program(program);
            return Err(Error::ProgramLink(self.name.clone(), log));
        }

        self.replace_program(program);
        Ok(())
    }

    /// Recompiles every shader that read `path` and relinks the program if there was one.
    ///
    /// Returns whether anything was reloaded.
    pub fn on_file_changed<P: AsRef<Path>>(&mut self, path: P) -> Result<bool> {
        let path = include::normalize(path.as_ref());

        let affected: Vec<_> = ShaderType::ALL
            .iter()
            .filter_map(|&ty| {
                let shader = self.shaders[ty.index()].as_ref()?;
                if shader.files.contains(&path) {
                    Some((ty, shader.path.clone()?, shader.prefix.clone()))
                } else {
                    None
                }
            })
            .collect();

        if affected.is_empty() {
            return Ok(false);
        }

        info!(
            "ShaderObject \"{}\": reloading after {} changed.",
            self.name,
            path.display()
        );

        for (ty, file, prefix) in affected {
            self.add_shader_from_file(ty, file, &prefix)?;
        }

        if self.program != 0 {
            self.create_program()?;
        }

        Ok(true)
    }

    /// Recompiles every file based shader with new prefix code and relinks the program if
    /// there was one.
    pub fn reload_with_prefix(&mut self, prefix: &str) -> Result<()> {
        let files: Vec<_> = ShaderType::ALL
            .iter()
            .filter_map(|&ty| {
                let path = self.shaders[ty.index()].as_ref()?.path.clone()?;
                Some((ty, path))
            })
            .collect();

        for (ty, path) in files {
            self.add_shader_from_file(ty, path, prefix)?;
        }

        if self.program != 0 {
            self.create_program()?;
        }

        Ok(())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The program handle, zero if no program has been linked yet.
    #[inline]
    pub fn program(&self) -> GLuint {
        self.program
    }

    #[inline]
    pub fn has_shader(&self, ty: ShaderType) -> bool {
        self.shaders[ty.index()].is_some()
    }

    /// Origin of the shader of type `ty`, the path for file based shaders.
    pub fn shader_origin(&self, ty: ShaderType) -> Option<&str> {
        self.shaders[ty.index()].as_ref().map(|v| v.origin.as_str())
    }

    #[inline]
    pub fn num_program_inputs(&self) -> i32 {
        self.num_inputs
    }

    #[inline]
    pub fn num_program_outputs(&self) -> i32 {
        self.num_outputs
    }

    #[inline]
    pub fn uniform_buffer_info(&self) -> &HashMap<String, BufferInfo<UniformVariableInfo>> {
        &self.uniform_blocks
    }

    #[inline]
    pub fn shader_storage_buffer_info(&self) -> &HashMap<String, BufferInfo<BufferVariableInfo>> {
        &self.storage_blocks
    }

    #[inline]
    pub fn global_uniform_info(&self) -> &HashMap<String, UniformVariableInfo> {
        &self.global_uniforms
    }
}

impl Drop for ShaderObject {
    fn drop(&mut self) {
        let device = self.ctx.device();

        if self.program != 0 {
            let mut state = self.ctx.state();
            if state.program == self.program {
                // A program can only be deleted once it is no longer in use.
                device.use_program(0);
                state.program = 0;
            }
        }

        for shader in self.shaders.iter().flatten() {
            device.delete_shader(shader.id);
        }

        if self.program != 0 {
            device.delete_program(self.program);
        }
    }
}
