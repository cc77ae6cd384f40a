use gl::types::GLenum;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "[GL] {} failed: {}", _0, _1)]
    Driver(&'static str, &'static str),
    #[fail(display = "OpenGL implementation doesn\'t support {}.", _0)]
    Requirement(String),
    #[fail(display = "Failed to map buffer {} range [{}, {}).", _0, _1, _2)]
    MapFailed(u32, usize, usize),
    #[fail(display = "Invalid buffer usage: {}", _0)]
    Usage(&'static str),
    #[fail(display = "Framebuffer needs at least one attachment.")]
    EmptyFramebuffer,
    #[fail(display = "Framebuffer is incomplete: {}", _0)]
    IncompleteFramebuffer(&'static str),
    #[fail(display = "Failed to compile {} shader of {} ({}), errors: \n{}", _0, _1, _2, _3)]
    ShaderCompile(&'static str, String, String, String),
    #[fail(display = "Failed to link program {}, errors: \n{}", _0, _1)]
    ProgramLink(String, String),
    #[fail(display = "Program {} has no shaders attached.", _0)]
    NoShaderAttached(String),
    #[fail(display = "Program {} is not linked.", _0)]
    ProgramNotLinked(String),
    #[fail(display = "Program {} has no block named \'{}\'.", _0, _1)]
    UnknownBlock(String, String),
    #[fail(display = "No shader variable named \'{}\' in the mapped block.", _0)]
    UnknownVariable(String),
    #[fail(display = "Failed to read shader file {}: {}", _0, _1)]
    ShaderFile(String, String),
    #[fail(display = "Malformed include directive in {}: {}", _0, _1)]
    ShaderInclude(String, String),
    #[fail(display = "Initial data of {} bytes doesn't fill a buffer of {} bytes.", _0, _1)]
    DataTooSmall(usize, usize),
    #[fail(display = "Buffer is still borrowed by a mapped view.")]
    BufferInUse,
    #[fail(display = "Ring buffer is too small to hold a single frame.")]
    RingBufferTooSmall,
    #[fail(display = "Timed out waiting for fence after {}ns.", _0)]
    SyncTimeout(u64),
    #[fail(display = "Waiting for fence failed.")]
    SyncFailed,
    #[fail(display = "Failed to parse settings: {}", _0)]
    Settings(String),
    #[fail(display = "Failed to (de)serialize program binary: {}", _0)]
    ProgramBinary(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Settings(format!("{}", err))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Error {
        Error::ProgramBinary(format!("{}", err))
    }
}

/// Describes an error code returned by `glGetError`.
pub fn describe(code: GLenum) -> &'static str {
    match code {
        gl::INVALID_ENUM => "An unacceptable value is specified for an enumerated argument.",
        gl::INVALID_VALUE => "A numeric argument is out of range.",
        gl::INVALID_OPERATION => "The specified operation is not allowed in the current state.",
        gl::INVALID_FRAMEBUFFER_OPERATION => {
            "The command is trying to render to or read from the framebuffer while the \
             currently bound framebuffer is not framebuffer complete."
        }
        gl::OUT_OF_MEMORY => "There is not enough memory left to execute the command.",
        gl::STACK_UNDERFLOW => "An internal stack underflow occurred.",
        gl::STACK_OVERFLOW => "An internal stack overflow occurred.",
        _ => "Oops, Unknown OpenGL error.",
    }
}
