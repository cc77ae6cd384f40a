extern crate env_logger;
extern crate glhelper;

use std::rc::Rc;

use glhelper::gl;
use glhelper::prelude::*;

fn setup() -> (Rc<HeadlessDevice>, Context) {
    let _ = env_logger::try_init();

    let device = Rc::new(HeadlessDevice::new());
    let mut settings = Settings::default();
    settings.check_errors = true;

    let ctx = Context::new(device.clone(), settings);
    (device, ctx)
}

#[test]
fn texture_2d() {
    let (device, ctx) = setup();

    let texture = Texture2D::new(&ctx, 256, 128, TextureFormat::RGBA8, 0, 0).unwrap();
    assert_eq!(texture.width(), 256);
    assert_eq!(texture.height(), 128);
    assert_eq!(texture.depth(), 1);
    assert_eq!(texture.num_mip_levels(), 9);
    assert_eq!(texture.mip_size(3), [32, 16, 1]);
    assert_eq!(texture.mip_size(8), [1, 1, 1]);

    let calls = device.calls();
    assert!(calls.contains(&format!(
        "glTextureStorage2D({}, 9, {:#x}, 256, 128)",
        texture.handle(),
        gl::RGBA8
    )));

    let data = vec![0u8; 16 * 8 * 4];
    texture
        .set_data(
            2,
            TextureSetDataFormat::RGBA,
            TextureSetDataType::UnsignedByte,
            &data,
            [8, 8],
            [16, 8],
        )
        .unwrap();
    assert_eq!(device.count("glTextureSubImage2D"), 1);

    drop(texture);
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn uploads_need_enough_data() {
    let (device, ctx) = setup();

    let texture = Texture2D::new(&ctx, 64, 64, TextureFormat::RGBA8, 1, 0).unwrap();
    let data = vec![0u8; 16 * 16 * 4 - 1];

    match texture.set_data(
        0,
        TextureSetDataFormat::RGBA,
        TextureSetDataType::UnsignedByte,
        &data,
        [0, 0],
        [16, 16],
    ) {
        Err(Error::DataTooSmall(1023, 1024)) => {}
        v => panic!("unexpected result {:?}", v),
    }

    assert_eq!(device.count("glTextureSubImage2D"), 0);
}

#[test]
fn texture_with_data() {
    let (device, ctx) = setup();

    let data = vec![255u8; 4 * 4 * 4];
    let texture = Texture2D::with_data(
        &ctx,
        4,
        4,
        TextureFormat::SRGB8Alpha8,
        0,
        TextureSetDataFormat::RGBA,
        TextureSetDataType::UnsignedByte,
        &data,
    )
    .unwrap();

    assert_eq!(texture.num_mip_levels(), 3);
    assert_eq!(device.count("glTextureSubImage2D"), 1);
    assert_eq!(device.count("glGenerateTextureMipmap"), 1);

    let mut out = vec![1u8; 2 * 2 * 4];
    texture
        .read_image(1, TextureSetDataFormat::RGBA, TextureSetDataType::UnsignedByte, &mut out)
        .unwrap();
    assert_eq!(device.count("glGetTextureImage"), 1);

    texture.clear_to_zero(0).unwrap();
    assert_eq!(device.count("glClearTexImage"), 1);

    // A single level does not need mip maps.
    Texture2D::with_data(
        &ctx,
        4,
        4,
        TextureFormat::R32F,
        1,
        TextureSetDataFormat::Red,
        TextureSetDataType::Float,
        &data,
    )
    .unwrap();
    assert_eq!(device.count("glGenerateTextureMipmap"), 1);
}

#[test]
fn multisampled() {
    let (device, ctx) = setup();

    let texture = Texture2D::new(&ctx, 64, 64, TextureFormat::RGBA16F, 1, 4).unwrap();
    assert_eq!(texture.num_msaa_samples(), 4);
    assert_eq!(texture.num_mip_levels(), 1);
    assert_eq!(device.count("glTextureStorage2DMultisample"), 1);
    assert_eq!(device.count("glTextureStorage2D"), 0);
}

#[test]
fn texture_3d_and_views() {
    let (device, ctx) = setup();

    let volume = Texture3D::new(&ctx, 32, 16, 8, TextureFormat::R16F, 0).unwrap();
    assert_eq!(volume.num_mip_levels(), 6);
    assert_eq!(device.count("glTextureStorage3D"), 1);

    let data = vec![0u8; 16 * 8 * 4 * 2];
    volume
        .set_level(1, TextureSetDataFormat::Red, TextureSetDataType::HalfFloat, &data)
        .unwrap();
    assert_eq!(device.count("glTextureSubImage3D"), 1);

    let texture = Texture2D::new(&ctx, 256, 128, TextureFormat::RGBA8, 0, 0).unwrap();
    let view = TextureView::new(
        &ctx,
        &texture,
        TextureTarget::Texture2D,
        TextureFormat::SRGB8Alpha8,
        (1, 2),
        (0, 1),
    )
    .unwrap();

    assert_eq!(view.original(), texture.handle());
    assert_eq!(view.width(), 128);
    assert_eq!(view.height(), 64);
    assert_eq!(view.num_mip_levels(), 2);
    assert_eq!(device.count("glGenTextures"), 1);
    assert_eq!(device.count("glTextureView"), 1);

    // Views keep working after the original is gone.
    drop(texture);
    view.bind(0);
    assert_eq!(device.count("glBindTextureUnit"), 1);
}

#[test]
fn bindings() {
    let (device, ctx) = setup();

    let a = Texture2D::new(&ctx, 4, 4, TextureFormat::RGBA8, 1, 0).unwrap();
    let b = Texture2D::new(&ctx, 4, 4, TextureFormat::RGBA8, 1, 0).unwrap();

    a.bind(0);
    a.bind(0);
    b.bind(1);
    a.bind(1);
    assert_eq!(device.count("glBindTextureUnit"), 3);

    Texture::reset_binding(&ctx, 0);
    Texture::reset_binding(&ctx, 0);
    assert_eq!(device.count("glBindTextureUnit"), 4);

    // Dropping a bound texture forgets the binding.
    drop(a);
    device.clear_calls();
    Texture::reset_binding(&ctx, 1);
    assert!(device.calls().is_empty());

    b.bind_image(2, ImageAccess::Write, TextureFormat::RGBA8);
    b.bind_image(2, ImageAccess::Write, TextureFormat::RGBA8);
    b.bind_image_level(3, ImageAccess::ReadWrite, TextureFormat::R32UI, 0, Some(0));
    Texture::reset_image_binding(&ctx, 2);
    assert_eq!(device.count("glBindImageTexture"), 4);
}

#[test]
fn samplers() {
    let (device, ctx) = setup();

    let mut cache = SamplerCache::new(&ctx);
    let desc = SamplerDesc::new(Filter::Linear, Filter::Linear, Filter::Nearest, Border::Clamp);

    let first = cache.get(&desc).unwrap().handle();
    let second = cache.get(&desc).unwrap().handle();
    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);
    assert_eq!(device.count("glCreateSamplers"), 1);

    // Descriptions are compared bitwise.
    let mut negative_zero = desc;
    negative_zero.min_lod = -0.0;
    let mut positive_zero = desc;
    positive_zero.min_lod = 0.0;
    cache.get(&negative_zero).unwrap();
    cache.get(&positive_zero).unwrap();
    assert_eq!(cache.len(), 3);

    let calls = device.calls();
    assert!(calls.contains(&format!(
        "glSamplerParameteri({}, {:#x}, {:#x})",
        first,
        gl::TEXTURE_MIN_FILTER,
        gl::LINEAR_MIPMAP_NEAREST
    )));
    assert!(calls.contains(&format!(
        "glSamplerParameteri({}, {:#x}, {:#x})",
        first,
        gl::TEXTURE_WRAP_S,
        gl::CLAMP_TO_EDGE
    )));

    cache.destroy_all();
    assert!(cache.is_empty());
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn sampler_options() {
    let (device, ctx) = setup();

    let mut desc = SamplerDesc::default();
    desc.max_anisotropy = 32.0;
    desc.compare_mode = CompareMode::LessEqual;

    let sampler = SamplerObject::new(&ctx, &desc).unwrap();
    let calls = device.calls();

    // Clamped to the limit of the device.
    assert!(calls.contains(&format!(
        "glSamplerParameterf({}, {:#x}, 16)",
        sampler.handle(),
        0x84FE
    )));
    assert!(calls.contains(&format!(
        "glSamplerParameteri({}, {:#x}, {:#x})",
        sampler.handle(),
        gl::TEXTURE_COMPARE_FUNC,
        gl::LEQUAL
    )));

    sampler.bind(4);
    sampler.bind(4);
    assert_eq!(device.count("glBindSampler"), 1);

    drop(sampler);
    SamplerObject::reset_binding(&ctx, 4);
    assert_eq!(device.count("glBindSampler"), 2);
}

#[test]
fn framebuffers() {
    let (device, ctx) = setup();

    let color = Texture2D::new(&ctx, 64, 32, TextureFormat::RGBA8, 1, 0).unwrap();
    let depth = Texture2D::new(&ctx, 64, 32, TextureFormat::Depth24Stencil8, 1, 0).unwrap();

    let fbo = FramebufferObject::new(
        &ctx,
        &[Attachment::new(&color)],
        Some(Attachment::new(&depth)),
        true,
    )
    .unwrap();

    assert_eq!(fbo.num_color_attachments(), 1);
    assert_eq!(fbo.color_attachment(0), Some(color.handle()));
    assert_eq!(fbo.depth_stencil_attachment(), Some(depth.handle()));
    assert_eq!(fbo.viewport_size(), (64, 32));

    let calls = device.calls();
    assert!(calls.contains(&format!(
        "glNamedFramebufferTexture({}, {:#x}, {}, 0)",
        fbo.handle(),
        gl::DEPTH_STENCIL_ATTACHMENT,
        depth.handle()
    )));
    assert!(calls.contains(&format!(
        "glNamedFramebufferDrawBuffers({}, [{}])",
        fbo.handle(),
        gl::COLOR_ATTACHMENT0
    )));

    device.clear_calls();
    fbo.bind(true);
    fbo.bind(true);
    assert_eq!(
        device.calls(),
        vec![
            format!("glBindFramebuffer({:#x}, {})", gl::DRAW_FRAMEBUFFER, fbo.handle()),
            "glViewport(0, 0, 64, 32)".to_owned(),
        ]
    );

    fbo.blit_to(
        None,
        Rect::new(0, 0, 64, 32),
        Rect::new(0, 0, 32, 16),
        true,
        false,
        false,
        true,
    )
    .unwrap();
    assert_eq!(
        device.calls().last(),
        Some(&format!(
            "glBlitNamedFramebuffer({}, 0, [0, 0, 64, 32], [0, 0, 32, 16], {:#x}, {:#x})",
            fbo.handle(),
            gl::COLOR_BUFFER_BIT,
            gl::LINEAR
        ))
    );

    fbo.clear_color(0, [1.0, 0.0, 0.0, 1.0]).unwrap();
    fbo.clear_depth_stencil(1.0, 0).unwrap();
    assert_eq!(device.count("glClearNamedFramebufferfv"), 1);
    assert_eq!(device.count("glClearNamedFramebufferfi"), 1);

    // Deleting a bound framebuffer falls back to the default one.
    drop(fbo);
    device.clear_calls();
    FramebufferObject::bind_back_buffer(&ctx);
    assert!(device.calls().is_empty());
}

#[test]
fn layered_attachments() {
    let (device, ctx) = setup();

    let volume = Texture3D::new(&ctx, 16, 16, 4, TextureFormat::RGBA16F, 0).unwrap();
    let fbo = FramebufferObject::new(&ctx, &[Attachment::with_level(&volume, 1, 2)], None, false)
        .unwrap();

    assert_eq!(fbo.viewport_size(), (8, 8));
    assert_eq!(device.count("glNamedFramebufferTextureLayer"), 1);
    assert!(device.calls().contains(&format!(
        "glNamedFramebufferReadBuffer({}, {:#x})",
        fbo.handle(),
        gl::COLOR_ATTACHMENT0
    )));

    fbo.bind(false);
    assert_eq!(device.count("glViewport"), 0);
    FramebufferObject::bind_back_buffer(&ctx);
    FramebufferObject::bind_back_buffer(&ctx);
    assert_eq!(device.count("glBindFramebuffer"), 2);
}

#[test]
fn invalid_framebuffers() {
    let (device, ctx) = setup();

    match FramebufferObject::new(&ctx, &[], None, false) {
        Err(Error::EmptyFramebuffer) => {}
        v => panic!("unexpected result {:?}", v),
    }

    let color = Texture2D::new(&ctx, 64, 32, TextureFormat::RGBA8, 1, 0).unwrap();
    device.set_framebuffer_status(gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT);

    match FramebufferObject::new(&ctx, &[Attachment::new(&color)], None, false) {
        Err(Error::IncompleteFramebuffer(_)) => {}
        v => panic!("unexpected result {:?}", v),
    }

    assert_eq!(device.count("glDeleteFramebuffers"), 1);
}
