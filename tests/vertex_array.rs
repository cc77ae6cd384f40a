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
fn layout() {
    let (device, ctx) = setup();

    let attributes = [
        Attribute::new(AttributeType::Float, 3),
        Attribute::new(AttributeType::UInt8, 4).normalized(),
        Attribute::new(AttributeType::UInt16, 2)
            .with_binding(1)
            .with_integer_handling(IntegerHandling::Integer),
        Attribute::new(AttributeType::Float, 1).with_binding(1).unused(),
        Attribute::new(AttributeType::Double, 2).with_binding(1),
    ];

    let vao = VertexArrayObject::with_divisors(&ctx, &attributes, &[0, 1]);
    assert_eq!(vao.vertex_stride(0), 16);
    assert_eq!(vao.vertex_stride(1), 24);
    assert_eq!(vao.vertex_stride(2), 0);
    assert_eq!(vao.attributes().len(), 5);

    let id = vao.handle();
    let calls = device.calls();
    assert!(calls.contains(&format!(
        "glVertexArrayAttribFormat({}, 0, 3, {:#x}, false, 0)",
        id,
        gl::FLOAT
    )));
    assert!(calls.contains(&format!(
        "glVertexArrayAttribFormat({}, 1, 4, {:#x}, true, 12)",
        id,
        gl::UNSIGNED_BYTE
    )));
    assert!(calls.contains(&format!(
        "glVertexArrayAttribIFormat({}, 2, 2, {:#x}, 0)",
        id,
        gl::UNSIGNED_SHORT
    )));
    assert!(calls.contains(&format!(
        "glVertexArrayAttribLFormat({}, 4, 2, {:#x}, 8)",
        id,
        gl::DOUBLE
    )));
    assert!(calls.contains(&format!("glVertexArrayAttribBinding({}, 2, 1)", id)));

    // Padding is skipped.
    assert_eq!(device.count("glEnableVertexArrayAttrib"), 4);
    assert_eq!(device.count("glVertexArrayBindingDivisor"), 2);
    assert!(calls.contains(&format!("glVertexArrayBindingDivisor({}, 1, 1)", id)));
}

#[test]
fn packed_attributes() {
    let (device, ctx) = setup();

    let vao = VertexArrayObject::new(
        &ctx,
        &[
            Attribute::new(AttributeType::Float, 3),
            Attribute::new(AttributeType::Int2_10_10_10, 1).normalized(),
            Attribute::new(AttributeType::UInt10F11F11F, 1),
        ],
    );

    assert_eq!(vao.vertex_stride(0), 20);

    let calls = device.calls();
    assert!(calls.contains(&format!(
        "glVertexArrayAttribFormat({}, 1, 4, {:#x}, true, 12)",
        vao.handle(),
        gl::INT_2_10_10_10_REV
    )));
    assert!(calls.contains(&format!(
        "glVertexArrayAttribFormat({}, 2, 3, {:#x}, false, 16)",
        vao.handle(),
        gl::UNSIGNED_INT_10F_11F_11F_REV
    )));
}

#[test]
fn bindings() {
    let (device, ctx) = setup();

    let a = VertexArrayObject::new(&ctx, &[Attribute::new(AttributeType::Float, 4)]);
    let b = VertexArrayObject::new(&ctx, &[Attribute::new(AttributeType::Half, 2)]);

    a.bind();
    a.bind();
    b.bind();
    assert_eq!(device.count("glBindVertexArray"), 2);

    // Dropping the bound vertex array unbinds it.
    drop(b);
    assert_eq!(
        device.calls()[device.calls().len() - 2],
        "glBindVertexArray(0)"
    );

    a.bind();
    drop(a);
    assert_eq!(device.live_objects(), 0);

    VertexArrayObject::reset_binding(&ctx);
    assert_eq!(device.count("glBindVertexArray"), 6);
}

#[test]
fn screen_aligned_triangle() {
    let (device, ctx) = setup();

    let triangle = ScreenAlignedTriangle::new(&ctx).unwrap();
    triangle.draw();
    triangle.draw();

    assert_eq!(device.count("glBindVertexArray"), 1);
    assert_eq!(device.count("glBindVertexBuffer"), 1);
    assert_eq!(device.count("glDrawArrays"), 2);
    assert_eq!(
        device.calls().last(),
        Some(&format!("glDrawArrays({:#x}, 0, 3)", gl::TRIANGLES))
    );

    let calls = device.calls();
    let binding = calls
        .iter()
        .find(|v| v.starts_with("glBindVertexBuffer"))
        .unwrap();
    assert!(binding.starts_with("glBindVertexBuffer(0, "));
    assert!(binding.ends_with(", 0, 8)"));

    drop(triangle);
    assert_eq!(device.live_objects(), 0);
}
