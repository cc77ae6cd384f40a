use std::cmp;
use std::ffi;

use gl::types::*;

use crate::device::Limits;
use crate::errors::*;

/// Describes the OpenGL context profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Profile {
    /// The context uses only future-compatible functions and definitions.
    Core,
    /// The context includes all immediate mode functions and definitions.
    Compatibility,
}

/// Describes a version.
///
/// A version can only be compared to another version if they belong to the same API.
/// For example, both `Version::GL(3, 0) >= Version::ES(3, 0)` and `Version::ES(3, 0) >=
/// Version::GL(3, 0)` return `false`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// Regular OpenGL.
    GL(u8, u8),
    /// OpenGL embedded system.
    ES(u8, u8),
}

impl PartialOrd for Version {
    #[inline]
    fn partial_cmp(&self, other: &Version) -> Option<cmp::Ordering> {
        let (es1, major1, minor1) = match *self {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        let (es2, major2, minor2) = match *other {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        if es1 != es2 {
            None
        } else {
            match major1.cmp(&major2) {
                cmp::Ordering::Equal => Some(minor1.cmp(&minor2)),
                v => Some(v),
            }
        }
    }
}

impl Version {
    /// Obtains the OpenGL version of the current context using the loaded functions.
    ///
    /// # Unsafe
    ///
    /// You must ensure that the functions belong to the current context, otherwise you will get
    /// an undefined behavior.
    pub unsafe fn parse() -> Result<Version> {
        let desc = parse_str(gl::VERSION)?;
        Version::from_str_desc(&desc)
    }

    /// Parses a `GL_VERSION` string, e.g. `4.6.0 NVIDIA 430.50` or `OpenGL ES 3.2 Mesa`.
    pub fn from_str_desc(desc: &str) -> Result<Version> {
        let malformed = || Error::Requirement(format!("a parsable version string ({})", desc));

        let (es, desc) = if desc.starts_with("OpenGL ES-") {
            (true, &desc[13..])
        } else if desc.starts_with("OpenGL ES ") {
            (true, &desc[10..])
        } else {
            (false, desc)
        };

        let desc = desc.split(' ').next().ok_or_else(malformed)?;
        let mut iter = desc.split('.');

        let major = iter
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(malformed)?;

        let minor = iter
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(malformed)?;

        if es {
            Ok(Version::ES(major, minor))
        } else {
            Ok(Version::GL(major, minor))
        }
    }
}

macro_rules! extensions {
    ($($string:expr => $field:ident,)+) => {
        /// Contains data about the list of extensions.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct Extensions {
            $(
                pub $field: bool,
            )+
        }

        impl Extensions {
            /// Returns the list of extensions supported by the current context.
            ///
            /// *Safety*: the OpenGL context corresponding to `gl` must be current in the thread.
            pub unsafe fn parse() -> Result<Extensions> {
                let mut num_extensions = 0;
                gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut num_extensions);

                let mut strings = Vec::with_capacity(num_extensions as usize);
                for i in 0..num_extensions {
                    let ext = gl::GetStringi(gl::EXTENSIONS, i as GLuint);
                    if !ext.is_null() {
                        let ext = ffi::CStr::from_ptr(ext as *const _);
                        strings.push(ext.to_string_lossy().into_owned());
                    }
                }

                Ok(Extensions::from_names(strings.iter().map(|v| v.as_str())))
            }

            pub fn from_names<'a, T>(names: T) -> Extensions
            where
                T: IntoIterator<Item = &'a str>,
            {
                let mut extensions = Extensions::default();
                for extension in names {
                    match extension {
                        $(
                            $string => extensions.$field = true,
                        )+
                        _ => ()
                    }
                }

                extensions
            }
        }
    }
}

extensions! {
    "GL_ARB_direct_state_access" => gl_arb_direct_state_access,
    "GL_ARB_buffer_storage" => gl_arb_buffer_storage,
    "GL_ARB_texture_view" => gl_arb_texture_view,
    "GL_ARB_texture_storage" => gl_arb_texture_storage,
    "GL_ARB_clear_texture" => gl_arb_clear_texture,
    "GL_ARB_program_interface_query" => gl_arb_program_interface_query,
    "GL_ARB_shader_storage_buffer_object" => gl_arb_shader_storage_buffer_object,
    "GL_ARB_compute_shader" => gl_arb_compute_shader,
    "GL_ARB_get_program_binary" => gl_arb_get_program_binary,
    "GL_ARB_texture_filter_anisotropic" => gl_arb_texture_filter_anisotropic,
    "GL_EXT_texture_filter_anisotropic" => gl_ext_texture_filter_anisotropic,
    "GL_KHR_debug" => gl_khr_debug,
}

/// Represents the capabilities of the context.
///
/// Contrary to the state, these values never change.
#[derive(Debug, Clone)]
pub struct Capabilities {
    /// Returns a version or release number. Vendor-specific information may follow the version
    /// number.
    pub version: Version,
    /// The company responsible for this GL implementation.
    pub vendor: String,
    /// The name of the renderer. This name is typically specific to a particular
    /// configuration of a hardware platform.
    pub renderer: String,
    /// The list of OpenGL extensions support by this implementation.
    pub extensions: Extensions,
    /// The OpenGL context profile if available.
    pub profile: Option<Profile>,
    /// The context is in debug mode, which may have additional error and performance issue
    /// reporting functionality.
    pub debug: bool,
    pub limits: Limits,
}

impl Capabilities {
    pub unsafe fn parse() -> Result<Capabilities> {
        let version = Version::parse()?;
        let extensions = Extensions::parse()?;

        let flags = get_integer(gl::CONTEXT_FLAGS) as GLenum;
        let debug = (flags & gl::CONTEXT_FLAG_DEBUG_BIT) != 0;

        Ok(Capabilities {
            version,
            extensions,
            vendor: parse_str(gl::VENDOR)?,
            renderer: parse_str(gl::RENDERER)?,
            profile: Capabilities::parse_profile(),
            debug,
            limits: Capabilities::parse_limits(&extensions),
        })
    }

    /// Checks whether the direct-state-access object model is usable.
    pub fn check(&self) -> Result<()> {
        let core = self.version >= Version::GL(4, 5);

        if !core && !self.extensions.gl_arb_direct_state_access {
            return Err(Error::Requirement("direct state access".into()));
        }

        if !core && !self.extensions.gl_arb_buffer_storage {
            return Err(Error::Requirement("immutable buffer storage".into()));
        }

        if !core && !self.extensions.gl_arb_texture_view {
            return Err(Error::Requirement("texture views".into()));
        }

        if !core && !self.extensions.gl_arb_program_interface_query {
            return Err(Error::Requirement("program interface queries".into()));
        }

        Ok(())
    }

    #[inline]
    pub fn has_anisotropic_filtering(&self) -> bool {
        self.version >= Version::GL(4, 6)
            || self.extensions.gl_arb_texture_filter_anisotropic
            || self.extensions.gl_ext_texture_filter_anisotropic
    }

    #[inline]
    unsafe fn parse_profile() -> Option<Profile> {
        let val = get_integer(gl::CONTEXT_PROFILE_MASK) as GLenum;
        if (val & gl::CONTEXT_COMPATIBILITY_PROFILE_BIT) != 0 {
            Some(Profile::Compatibility)
        } else if (val & gl::CONTEXT_CORE_PROFILE_BIT) != 0 {
            Some(Profile::Core)
        } else {
            None
        }
    }

    unsafe fn parse_limits(exts: &Extensions) -> Limits {
        let anisotropy = if exts.gl_arb_texture_filter_anisotropic
            || exts.gl_ext_texture_filter_anisotropic
        {
            let mut val = 1.0;
            gl::GetFloatv(super::types::MAX_TEXTURE_MAX_ANISOTROPY, &mut val);
            val
        } else {
            1.0
        };

        Limits {
            max_combined_texture_image_units: get_integer(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS)
                as usize,
            max_uniform_buffer_bindings: get_integer(gl::MAX_UNIFORM_BUFFER_BINDINGS) as usize,
            max_shader_storage_buffer_bindings: get_integer(
                gl::MAX_SHADER_STORAGE_BUFFER_BINDINGS,
            ) as usize,
            max_vertex_attrib_bindings: get_integer(gl::MAX_VERTEX_ATTRIB_BINDINGS) as usize,
            max_color_attachments: get_integer(gl::MAX_COLOR_ATTACHMENTS) as usize,
            max_draw_buffers: get_integer(gl::MAX_DRAW_BUFFERS) as usize,
            max_viewports: get_integer(gl::MAX_VIEWPORTS) as usize,
            uniform_buffer_offset_alignment: get_integer(gl::UNIFORM_BUFFER_OFFSET_ALIGNMENT)
                as usize,
            shader_storage_buffer_offset_alignment: get_integer(
                gl::SHADER_STORAGE_BUFFER_OFFSET_ALIGNMENT,
            ) as usize,
            max_texture_max_anisotropy: anisotropy,
        }
    }
}

#[inline]
unsafe fn get_integer(pname: GLenum) -> GLint {
    let mut val = 0;
    gl::GetIntegerv(pname, &mut val);
    val
}

#[inline]
unsafe fn parse_str(id: GLenum) -> Result<String> {
    let s = gl::GetString(id);
    if s.is_null() {
        return Err(Error::Requirement(format!("a readable string {:#x}", id)));
    }

    Ok(ffi::CStr::from_ptr(s as *const _)
        .to_string_lossy()
        .into_owned())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version() {
        assert_eq!(
            Version::from_str_desc("4.6.0 NVIDIA 430.50").unwrap(),
            Version::GL(4, 6)
        );

        assert_eq!(
            Version::from_str_desc("OpenGL ES 3.2 Mesa 19.0").unwrap(),
            Version::ES(3, 2)
        );

        assert_eq!(
            Version::from_str_desc("OpenGL ES-CM 1.1").unwrap(),
            Version::ES(1, 1)
        );

        assert!(Version::from_str_desc("garbage").is_err());
        assert!(Version::GL(4, 5) >= Version::GL(4, 5));
        assert!(Version::GL(4, 5) > Version::GL(3, 3));
        assert!(!(Version::GL(4, 5) >= Version::ES(3, 0)));
    }

    #[test]
    fn extensions() {
        let exts = Extensions::from_names(vec!["GL_KHR_debug", "GL_ARB_texture_view", "GL_FOO"]);
        assert!(exts.gl_khr_debug);
        assert!(exts.gl_arb_texture_view);
        assert!(!exts.gl_arb_buffer_storage);
    }

    #[test]
    fn requirements() {
        let mut caps = Capabilities {
            version: Version::GL(4, 1),
            vendor: String::new(),
            renderer: String::new(),
            extensions: Extensions::default(),
            profile: Some(Profile::Core),
            debug: false,
            limits: Limits::default(),
        };

        assert!(caps.check().is_err());

        caps.extensions = Extensions::from_names(vec![
            "GL_ARB_direct_state_access",
            "GL_ARB_buffer_storage",
            "GL_ARB_texture_view",
            "GL_ARB_program_interface_query",
        ]);
        assert!(caps.check().is_ok());

        caps.extensions = Extensions::default();
        caps.version = Version::GL(4, 5);
        assert!(caps.check().is_ok());
        assert!(!caps.has_anisotropic_filtering());
    }
}
