extern crate byteorder;
extern crate env_logger;
extern crate glhelper;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use byteorder::{ByteOrder, NativeEndian};

use glhelper::cgmath::{Matrix4, Vector3};
use glhelper::gl;
use glhelper::prelude::*;

const VERTEX: &str = "#version 450\nvoid main() { gl_Position = vec4(0.0); }\n";
const FRAGMENT: &str = "#version 450\nout vec4 color;\nvoid main() { color = vec4(1.0); }\n";

fn setup() -> (Rc<HeadlessDevice>, Context) {
    let _ = env_logger::try_init();

    let device = Rc::new(HeadlessDevice::new());
    let mut settings = Settings::default();
    settings.check_errors = true;

    let ctx = Context::new(device.clone(), settings);
    (device, ctx)
}

fn scratch(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("glhelper-shader-{}-{}", name, process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn linked(ctx: &Context, name: &str) -> ShaderObject {
    let mut shader = ShaderObject::new(ctx, name);
    shader
        .add_shader_from_source(ShaderType::Vertex, VERTEX, "vs")
        .unwrap();
    shader
        .add_shader_from_source(ShaderType::Fragment, FRAGMENT, "fs")
        .unwrap();
    shader.create_program().unwrap();
    shader
}

fn add_camera_block(device: &HeadlessDevice) {
    device.add_resource(
        gl::UNIFORM_BLOCK,
        "Camera",
        &[(gl::BUFFER_BINDING, 2), (gl::BUFFER_DATA_SIZE, 128)],
    );
    device.add_resource(
        gl::UNIFORM,
        "position",
        &[
            (gl::TYPE, gl::FLOAT_VEC3 as i32),
            (gl::OFFSET, 0),
            (gl::BLOCK_INDEX, 0),
        ],
    );
    device.add_resource(
        gl::UNIFORM,
        "view_projection",
        &[
            (gl::TYPE, gl::FLOAT_MAT4 as i32),
            (gl::OFFSET, 64),
            (gl::BLOCK_INDEX, 0),
            (gl::MATRIX_STRIDE, 16),
        ],
    );
}

#[test]
fn compile_and_link() {
    let (device, ctx) = setup();

    let shader = linked(&ctx, "blit");
    assert_ne!(shader.program(), 0);
    assert!(shader.has_shader(ShaderType::Vertex));
    assert!(shader.has_shader(ShaderType::Fragment));
    assert!(!shader.has_shader(ShaderType::Compute));
    assert_eq!(shader.shader_origin(ShaderType::Fragment), Some("fs"));
    assert_eq!(device.last_shader_source().as_ref().map(|v| v.as_str()), Some(FRAGMENT));

    shader.activate();
    shader.activate();
    assert_eq!(device.count("glUseProgram"), 1);

    // An active program is deactivated before it is deleted.
    drop(shader);
    assert_eq!(
        device.calls().last(),
        Some(&"glDeleteProgram(3)".to_owned())
    );
    assert!(device
        .calls()
        .contains(&"glUseProgram(0)".to_owned()));
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn compile_errors() {
    let (device, ctx) = setup();
    let mut shader = ShaderObject::new(&ctx, "broken");

    device.set_compile_result(false, "0(1) : error C0000: syntax error");
    match shader.add_shader_from_source(ShaderType::Vertex, "#version 450\nvoid main() {", "vs") {
        Err(Error::ShaderCompile(ty, name, origin, log)) => {
            assert_eq!(ty, "vertex");
            assert_eq!(name, "broken");
            assert_eq!(origin, "vs");
            assert!(log.contains("syntax error"));
        }
        v => panic!("unexpected result {:?}", v),
    }

    assert!(!shader.has_shader(ShaderType::Vertex));
    assert_eq!(device.live_objects(), 0);

    // A failed recompilation keeps the previous shader.
    device.set_compile_result(true, "");
    shader
        .add_shader_from_source(ShaderType::Vertex, VERTEX, "vs")
        .unwrap();
    device.set_compile_result(false, "error");
    assert!(shader
        .add_shader_from_source(ShaderType::Vertex, VERTEX, "vs2")
        .is_err());
    assert_eq!(shader.shader_origin(ShaderType::Vertex), Some("vs"));
}

#[test]
fn link_errors() {
    let (device, ctx) = setup();

    let mut empty = ShaderObject::new(&ctx, "empty");
    match empty.create_program() {
        Err(Error::NoShaderAttached(name)) => assert_eq!(name, "empty"),
        v => panic!("unexpected result {:?}", v),
    }

    let mut shader = linked(&ctx, "relink");
    let program = shader.program();

    device.set_link_result(false, "unresolved symbol");
    match shader.create_program() {
        Err(Error::ProgramLink(name, log)) => {
            assert_eq!(name, "relink");
            assert_eq!(log, "unresolved symbol");
        }
        v => panic!("unexpected result {:?}", v),
    }

    // The last working program stays in place.
    assert_eq!(shader.program(), program);
    assert_eq!(device.count("glDeleteProgram"), 1);
}

#[test]
fn reflection() {
    let (device, ctx) = setup();

    add_camera_block(&device);
    device.add_resource(
        gl::UNIFORM,
        "exposure",
        &[(gl::TYPE, gl::FLOAT as i32), (gl::LOCATION, 3)],
    );
    device.add_resource(
        gl::SHADER_STORAGE_BLOCK,
        "Particles",
        &[(gl::BUFFER_BINDING, 1), (gl::BUFFER_DATA_SIZE, 1024)],
    );
    device.add_resource(
        gl::BUFFER_VARIABLE,
        "particles[0].position",
        &[
            (gl::TYPE, gl::FLOAT_VEC4 as i32),
            (gl::BLOCK_INDEX, 0),
            (gl::TOP_LEVEL_ARRAY_STRIDE, 32),
        ],
    );

    let shader = linked(&ctx, "particles");

    let camera = &shader.uniform_buffer_info()["Camera"];
    assert_eq!(camera.binding, 2);
    assert_eq!(camera.data_size, 128);
    assert_eq!(camera.variables.len(), 2);
    assert_eq!(camera.variables["view_projection"].ty, ShaderVariableType::FloatMat4);
    assert_eq!(camera.variables["view_projection"].block_offset, 64);
    assert_eq!(camera.variables["view_projection"].matrix_stride, 16);

    let exposure = &shader.global_uniform_info()["exposure"];
    assert_eq!(exposure.ty, ShaderVariableType::Float);
    assert_eq!(exposure.location, 3);
    assert_eq!(shader.global_uniform_info().len(), 1);

    let particles = &shader.shader_storage_buffer_info()["Particles"];
    assert_eq!(particles.binding, 1);
    assert_eq!(particles.data_size, 1024);
    assert_eq!(
        particles.variables["particles[0].position"].top_level_array_stride,
        32
    );

    let buffer = Buffer::new(&ctx, 128, BufferUsage::IMMUTABLE, None).unwrap();
    shader.bind_uniform_buffer(&buffer, "Camera").unwrap();
    shader.bind_shader_storage_buffer(&buffer, "Particles").unwrap();

    let calls = device.calls();
    assert!(calls.contains(&format!(
        "glBindBufferBase({:#x}, 2, {})",
        gl::UNIFORM_BUFFER,
        buffer.handle()
    )));
    assert!(calls.contains(&format!(
        "glBindBufferBase({:#x}, 1, {})",
        gl::SHADER_STORAGE_BUFFER,
        buffer.handle()
    )));

    match shader.bind_uniform_buffer(&buffer, "Lights") {
        Err(Error::UnknownBlock(name, block)) => {
            assert_eq!(name, "particles");
            assert_eq!(block, "Lights");
        }
        v => panic!("unexpected result {:?}", v),
    }
}

#[test]
fn uniform_buffer_from_shader() {
    let (device, ctx) = setup();

    add_camera_block(&device);
    let shader = linked(&ctx, "camera");

    let ubo = UniformBufferView::from_shader(&ctx, &shader, "Camera", BufferUsage::IMMUTABLE)
        .unwrap();
    assert_eq!(ubo.name(), "Camera");
    assert_eq!(ubo.buffer().borrow().size(), 128);
    assert!(ubo.contains_variable("position"));

    {
        let mut view = ubo.map_view().unwrap();
        view.set("position", Vector3::new(1.0f32, 2.0, 3.0)).unwrap();
        view.set("view_projection", Matrix4::from_scale(2.0f32))
            .unwrap();

        match view.set("missing", 1.0f32) {
            Err(Error::UnknownVariable(name)) => assert_eq!(name, "missing"),
            v => panic!("unexpected result {:?}", v),
        }
    }

    ubo.bind(4).unwrap();
    let id = ubo.buffer().borrow().handle();
    assert!(!device.is_mapped(id));
    assert_eq!(
        device.calls().last(),
        Some(&format!("glBindBufferBase({:#x}, 4, {})", gl::UNIFORM_BUFFER, id))
    );

    let content = device.buffer_content(id).unwrap();
    assert_eq!(NativeEndian::read_f32(&content[4..]), 2.0);
    assert_eq!(NativeEndian::read_f32(&content[8..]), 3.0);
    assert_eq!(NativeEndian::read_f32(&content[64..]), 2.0);
    assert_eq!(NativeEndian::read_f32(&content[84..]), 2.0);
    assert_eq!(NativeEndian::read_f32(&content[124..]), 1.0);
}

#[test]
fn uniform_buffer_of_several_shaders() {
    let (device, ctx) = setup();

    add_camera_block(&device);
    let a = linked(&ctx, "a");

    device.clear_resources();
    let b = linked(&ctx, "b");
    assert!(b.uniform_buffer_info().is_empty());

    // Shaders without the block are skipped.
    let ubo = UniformBufferView::from_shaders(&ctx, &[&b, &a], "Camera", BufferUsage::IMMUTABLE)
        .unwrap();
    assert_eq!(ubo.info().data_size, 128);
    assert_eq!(ubo.variables().count(), 2);

    match UniformBufferView::from_shaders(&ctx, &[&b], "Camera", BufferUsage::IMMUTABLE) {
        Err(Error::UnknownBlock(_, block)) => assert_eq!(block, "Camera"),
        v => panic!("unexpected result {:?}", v.map(|v| v.name().to_owned())),
    }
}

#[test]
fn program_binaries() {
    let (device, ctx) = setup();

    let unlinked = ShaderObject::new(&ctx, "unlinked");
    match unlinked.program_binary() {
        Err(Error::ProgramNotLinked(_)) => {}
        v => panic!("unexpected result {:?}", v),
    }

    let mut shader = linked(&ctx, "cached");
    let binary = shader.program_binary().unwrap();
    assert_eq!(binary.format, 0x8E21);
    assert_eq!(binary.data, b"headless program".to_vec());

    let bytes = binary.to_bytes().unwrap();
    assert_eq!(ProgramBinary::from_bytes(&bytes).unwrap(), binary);
    assert!(ProgramBinary::from_bytes(&[1, 2, 3]).is_err());

    let program = shader.program();
    shader.load_program_binary(&binary).unwrap();
    assert_ne!(shader.program(), program);
    assert_eq!(device.count("glProgramBinary"), 1);

    device.set_accept_binaries(false);
    let program = shader.program();
    assert!(shader.load_program_binary(&binary).is_err());
    assert_eq!(shader.program(), program);

    drop(shader);
    drop(unlinked);
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn file_shaders_and_hot_reload() {
    let (device, ctx) = setup();

    let dir = scratch("reload");
    let main = dir.join("main.comp");
    let common = dir.join("common.glsl");
    fs::write(
        &main,
        "#version 450\n#include \"common.glsl\"\nvoid main() {}\n",
    )
    .unwrap();
    fs::write(&common, "layout(local_size_x = 8) in;\n").unwrap();

    let mut shader = ShaderObject::new(&ctx, "compute");
    shader
        .add_shader_from_file(ShaderType::Compute, &main, "#define GROUPS 4")
        .unwrap();
    shader.create_program().unwrap();

    let source = device.last_shader_source().unwrap();
    assert!(source.starts_with("#version 450\n"));
    assert!(source.contains("#define GROUPS 4"));
    assert!(source.contains("local_size_x = 8"));
    assert!(shader
        .shader_origin(ShaderType::Compute)
        .unwrap()
        .ends_with("main.comp"));

    assert!(!shader.on_file_changed(dir.join("unrelated.glsl")).unwrap());
    assert_eq!(device.count("glLinkProgram"), 1);

    fs::write(&common, "layout(local_size_x = 16) in;\n").unwrap();
    assert!(shader.on_file_changed(dir.join(".").join("common.glsl")).unwrap());
    assert!(device.last_shader_source().unwrap().contains("local_size_x = 16"));
    assert_eq!(device.count("glLinkProgram"), 2);

    shader.reload_with_prefix("#define GROUPS 8").unwrap();
    let source = device.last_shader_source().unwrap();
    assert!(source.contains("#define GROUPS 8"));
    assert!(!source.contains("#define GROUPS 4"));
    assert_eq!(device.count("glLinkProgram"), 3);

    // A broken file leaves the working program in place.
    let program = shader.program();
    device.set_compile_result(false, "error");
    assert!(shader.on_file_changed(&main).is_err());
    assert_eq!(shader.program(), program);

    shader.dispatch_compute(4, 2, 1);
    assert_eq!(
        device.calls().last(),
        Some(&"glDispatchCompute(4, 2, 1)".to_owned())
    );
    assert_eq!(device.count("glUseProgram"), 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_files() {
    let (_, ctx) = setup();

    let dir = scratch("missing");
    let mut shader = ShaderObject::new(&ctx, "missing");
    match shader.add_shader_from_file(ShaderType::Vertex, dir.join("nope.vert"), "") {
        Err(Error::ShaderFile(path, _)) => assert!(path.ends_with("nope.vert")),
        v => panic!("unexpected result {:?}", v),
    }

    let _ = fs::remove_dir_all(&dir);
}
