//! Sampler objects, deduplicated by their description.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use gl::types::*;

use crate::context::Context;
use crate::device::gl::types::TEXTURE_MAX_ANISOTROPY;
use crate::errors::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Handling of texture coordinates outside of [0, 1].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Border {
    Repeat,
    Mirror,
    Clamp,
    Border,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CompareMode {
    None,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
    Equal,
    NotEqual,
    Always,
    Never,
}

/// Describes a sampler object. Two descriptions are equal if all fields are bitwise equal.
#[derive(Debug, Copy, Clone)]
pub struct SamplerDesc {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mip_filter: Filter,
    pub border_u: Border,
    pub border_v: Border,
    pub border_w: Border,
    pub max_anisotropy: f32,
    pub border_color: [f32; 4],
    pub compare_mode: CompareMode,
    pub min_lod: f32,
    pub max_lod: f32,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        SamplerDesc {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            mip_filter: Filter::Linear,
            border_u: Border::Repeat,
            border_v: Border::Repeat,
            border_w: Border::Repeat,
            max_anisotropy: 1.0,
            border_color: [1.0, 1.0, 1.0, 1.0],
            compare_mode: CompareMode::None,
            min_lod: -1000.0,
            max_lod: 1000.0,
        }
    }
}

impl SamplerDesc {
    /// A description with the same border handling on all axes.
    pub fn new(min: Filter, mag: Filter, mip: Filter, border: Border) -> Self {
        SamplerDesc {
            min_filter: min,
            mag_filter: mag,
            mip_filter: mip,
            border_u: border,
            border_v: border,
            border_w: border,
            ..SamplerDesc::default()
        }
    }

    fn float_bits(&self) -> [u32; 7] {
        [
            self.max_anisotropy.to_bits(),
            self.border_color[0].to_bits(),
            self.border_color[1].to_bits(),
            self.border_color[2].to_bits(),
            self.border_color[3].to_bits(),
            self.min_lod.to_bits(),
            self.max_lod.to_bits(),
        ]
    }
}

impl PartialEq for SamplerDesc {
    fn eq(&self, other: &SamplerDesc) -> bool {
        self.min_filter == other.min_filter
            && self.mag_filter == other.mag_filter
            && self.mip_filter == other.mip_filter
            && self.border_u == other.border_u
            && self.border_v == other.border_v
            && self.border_w == other.border_w
            && self.compare_mode == other.compare_mode
            && self.float_bits() == other.float_bits()
    }
}

impl Eq for SamplerDesc {}

impl Hash for SamplerDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.min_filter.hash(state);
        self.mag_filter.hash(state);
        self.mip_filter.hash(state);
        self.border_u.hash(state);
        self.border_v.hash(state);
        self.border_w.hash(state);
        self.compare_mode.hash(state);
        self.float_bits().hash(state);
    }
}

#[derive(Debug)]
pub struct SamplerObject {
    ctx: Context,
    id: GLuint,
}

impl SamplerObject {
    pub fn new(ctx: &Context, desc: &SamplerDesc) -> Result<Self> {
        debug_assert!(
            desc.max_anisotropy >= 1.0,
            "Anisotropy level below 1 is invalid."
        );

        let device = ctx.device();
        let id = device.create_sampler();
        let sampler = SamplerObject {
            ctx: ctx.clone(),
            id,
        };

        device.sampler_parameter_i(id, gl::TEXTURE_WRAP_S, GLenum::from(desc.border_u) as GLint);
        device.sampler_parameter_i(id, gl::TEXTURE_WRAP_T, GLenum::from(desc.border_v) as GLint);
        device.sampler_parameter_i(id, gl::TEXTURE_WRAP_R, GLenum::from(desc.border_w) as GLint);

        let min_filter = match (desc.min_filter, desc.mip_filter) {
            (Filter::Nearest, Filter::Nearest) => gl::NEAREST_MIPMAP_NEAREST,
            (Filter::Nearest, Filter::Linear) => gl::NEAREST_MIPMAP_LINEAR,
            (Filter::Linear, Filter::Nearest) => gl::LINEAR_MIPMAP_NEAREST,
            (Filter::Linear, Filter::Linear) => gl::LINEAR_MIPMAP_LINEAR,
        };

        let mag_filter = match desc.mag_filter {
            Filter::Nearest => gl::NEAREST,
            Filter::Linear => gl::LINEAR,
        };

        device.sampler_parameter_i(id, gl::TEXTURE_MIN_FILTER, min_filter as GLint);
        device.sampler_parameter_i(id, gl::TEXTURE_MAG_FILTER, mag_filter as GLint);
        device.sampler_parameter_f(id, gl::TEXTURE_MIN_LOD, desc.min_lod);
        device.sampler_parameter_f(id, gl::TEXTURE_MAX_LOD, desc.max_lod);

        let anisotropy = desc
            .max_anisotropy
            .min(ctx.limits().max_texture_max_anisotropy.max(1.0));
        device.sampler_parameter_f(id, TEXTURE_MAX_ANISOTROPY, anisotropy);

        device.sampler_parameter_fv(id, gl::TEXTURE_BORDER_COLOR, &desc.border_color);

        if desc.compare_mode != CompareMode::None {
            device.sampler_parameter_i(
                id,
                gl::TEXTURE_COMPARE_MODE,
                gl::COMPARE_REF_TO_TEXTURE as GLint,
            );

            device.sampler_parameter_i(
                id,
                gl::TEXTURE_COMPARE_FUNC,
                GLenum::from(desc.compare_mode) as GLint,
            );
        }

        ctx.check("glSamplerParameter")?;
        Ok(sampler)
    }

    #[inline]
    pub fn handle(&self) -> GLuint {
        self.id
    }

    /// Binds the sampler to a texture stage if it is not bound there already.
    pub fn bind(&self, stage: usize) {
        let mut state = self.ctx.state();
        debug_assert!(
            stage < state.samplers.len(),
            "Can't bind sampler to stage {}. Maximum number of stages is {}.",
            stage,
            state.samplers.len()
        );

        if state.samplers.get(stage) != Some(&self.id) {
            self.ctx.device().bind_sampler(stage as GLuint, self.id);
            if let Some(v) = state.samplers.get_mut(stage) {
                *v = self.id;
            }
        }
    }

    pub fn reset_binding(ctx: &Context, stage: usize) {
        let mut state = ctx.state();
        ctx.device().bind_sampler(stage as GLuint, 0);
        if let Some(v) = state.samplers.get_mut(stage) {
            *v = 0;
        }
    }
}

impl Drop for SamplerObject {
    fn drop(&mut self) {
        self.ctx.state().forget_sampler(self.id);
        self.ctx.device().delete_sampler(self.id);
    }
}

/// Creates every distinct sampler description only once.
#[derive(Debug)]
pub struct SamplerCache {
    ctx: Context,
    samplers: HashMap<SamplerDesc, SamplerObject>,
}

impl SamplerCache {
    pub fn new(ctx: &Context) -> Self {
        SamplerCache {
            ctx: ctx.clone(),
            samplers: HashMap::new(),
        }
    }

    /// Returns the sampler of `desc`, creating it on first use.
    pub fn get(&mut self, desc: &SamplerDesc) -> Result<&SamplerObject> {
        if !self.samplers.contains_key(desc) {
            let sampler = SamplerObject::new(&self.ctx, desc)?;
            self.samplers.insert(*desc, sampler);
        }

        Ok(&self.samplers[desc])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samplers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
    }

    /// Destroys all cached samplers.
    pub fn destroy_all(&mut self) {
        self.samplers.clear();
    }
}
