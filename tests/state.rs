extern crate env_logger;
extern crate glhelper;

use std::rc::Rc;

use glhelper::gl;
use glhelper::prelude::*;

fn setup() -> (Rc<HeadlessDevice>, Context) {
    let _ = env_logger::try_init();

    let device = Rc::new(HeadlessDevice::new());
    let ctx = Context::new(device.clone(), Settings::default());
    (device, ctx)
}

#[test]
fn redundant_changes_are_skipped() {
    let (device, ctx) = setup();

    ctx.enable(Cap::DepthTest, false);
    ctx.enable(Cap::DepthTest, false);
    assert_eq!(device.count("glEnable"), 1);
    assert_eq!(ctx.cap_state(Cap::DepthTest), CapState::Enabled);

    ctx.enable(Cap::DepthTest, true);
    assert_eq!(device.count("glEnable"), 2);

    // Dithering is enabled in a fresh context.
    ctx.enable(Cap::Dither, false);
    assert_eq!(device.count("glEnable"), 2);

    ctx.disable(Cap::CullFace, false);
    assert_eq!(device.count("glDisable"), 0);
    ctx.disable(Cap::Dither, false);
    assert_eq!(device.calls().last(), Some(&format!("glDisable({:#x})", gl::DITHER)));
}

#[test]
fn indexed_changes() {
    let (device, ctx) = setup();

    ctx.enable(Cap::Blend, false);
    ctx.disable_indexed(Cap::Blend, 2, false);
    assert_eq!(device.count("glDisablei"), 1);

    assert_eq!(ctx.cap_state(Cap::Blend), CapState::Unknown);
    assert_eq!(ctx.cap_state_indexed(Cap::Blend, 0), CapState::Enabled);
    assert_eq!(ctx.cap_state_indexed(Cap::Blend, 2), CapState::Disabled);

    ctx.disable_indexed(Cap::Blend, 2, false);
    ctx.enable_indexed(Cap::Blend, 1, false);
    assert_eq!(device.count("glDisablei"), 1);
    assert_eq!(device.count("glEnablei"), 0);

    // A global change after an indexed one always reaches the driver.
    ctx.enable(Cap::Blend, false);
    assert_eq!(device.count("glEnable"), 2);
    assert_eq!(ctx.cap_state_indexed(Cap::Blend, 2), CapState::Enabled);

    ctx.enable_indexed(Cap::ScissorTest, 3, false);
    assert_eq!(device.count("glEnablei"), 1);
    assert_eq!(ctx.cap_state_indexed(Cap::ScissorTest, 3), CapState::Enabled);
    assert_eq!(ctx.cap_state_indexed(Cap::ScissorTest, 4), CapState::Disabled);
}

#[test]
fn indexed_changes_of_global_caps() {
    let (device, ctx) = setup();

    ctx.enable_indexed(Cap::DepthTest, 1, false);
    ctx.enable_indexed(Cap::DepthTest, 1, false);
    assert_eq!(device.count("glEnable"), 1);
    assert_eq!(device.count("glEnablei"), 0);
    assert_eq!(device.calls().last(), Some(&format!("glEnable({:#x})", gl::DEPTH_TEST)));

    assert_eq!(ctx.cap_state(Cap::DepthTest), CapState::Enabled);
    assert_eq!(ctx.cap_state(Cap::ScissorTest), CapState::Disabled);
    assert_eq!(ctx.cap_state_indexed(Cap::ScissorTest, 1), CapState::Disabled);

    ctx.disable_indexed(Cap::DepthTest, 0, false);
    assert_eq!(device.count("glDisable"), 1);
    assert_eq!(device.count("glDisablei"), 0);
}

#[test]
fn unknown_states() {
    let (device, ctx) = setup();

    ctx.disable(Cap::StencilTest, false);
    assert_eq!(device.count("glDisable"), 0);

    ctx.reset_cap_states_unknown();
    assert_eq!(ctx.cap_state(Cap::StencilTest), CapState::Unknown);

    ctx.disable(Cap::StencilTest, false);
    ctx.disable(Cap::StencilTest, false);
    assert_eq!(device.count("glDisable"), 1);
}

#[test]
fn states_from_driver() {
    let (device, ctx) = setup();

    // Changed behind the back of the context.
    device.enable(gl::CULL_FACE);
    device.disable(gl::DITHER);

    ctx.reset_cap_states_from_driver();
    assert_eq!(ctx.cap_state(Cap::CullFace), CapState::Enabled);
    assert_eq!(ctx.cap_state(Cap::Dither), CapState::Disabled);
    assert_eq!(ctx.cap_state(Cap::Blend), CapState::Unknown);
    assert_eq!(ctx.cap_state_indexed(Cap::Blend, 0), CapState::Disabled);
    assert_eq!(ctx.cap_state_indexed(Cap::Blend, 1), CapState::Unknown);

    device.clear_calls();
    ctx.enable(Cap::CullFace, false);
    ctx.disable(Cap::Dither, false);
    assert!(device.calls().is_empty());
}

#[test]
fn depth_state() {
    let (device, ctx) = setup();

    assert!(ctx.depth_write());
    ctx.set_depth_write(true, false);
    assert_eq!(device.count("glDepthMask"), 0);
    ctx.set_depth_write(false, false);
    ctx.set_depth_write(false, false);
    assert_eq!(device.count("glDepthMask"), 1);
    assert!(!ctx.depth_write());

    assert_eq!(ctx.depth_func(), DepthFunc::Less);
    ctx.set_depth_func(DepthFunc::GreaterOrEqual, false);
    ctx.set_depth_func(DepthFunc::GreaterOrEqual, false);
    ctx.set_depth_func(DepthFunc::GreaterOrEqual, true);
    assert_eq!(device.count("glDepthFunc"), 2);
    assert_eq!(ctx.depth_func(), DepthFunc::GreaterOrEqual);
}

#[test]
fn debug_output() {
    let (device, ctx) = setup();

    ctx.activate_debug_output(DebugSeverity::Medium).unwrap();
    assert_eq!(device.count("glDebugMessageCallback"), 1);
    assert!(device.is_enabled(gl::DEBUG_OUTPUT));
}

#[test]
fn driver_errors() {
    let _ = env_logger::try_init();

    let device = Rc::new(HeadlessDevice::new());
    let mut settings = Settings::default();

    settings.check_errors = false;
    let ctx = Context::new(device.clone(), settings.clone());
    device.push_error(gl::INVALID_ENUM);
    assert!(ctx.check("glFoo").is_ok());

    settings.check_errors = true;
    let ctx = Context::new(device.clone(), settings);
    match ctx.check("glFoo") {
        Err(Error::Driver("glFoo", _)) => {}
        v => panic!("unexpected result {:?}", v),
    }

    assert!(ctx.check("glFoo").is_ok());
}
