extern crate env_logger;
extern crate glhelper;

use std::rc::Rc;

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
fn create_with_data() {
    let (device, ctx) = setup();

    let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
    let buffer = Buffer::new(&ctx, 8, BufferUsage::IMMUTABLE, Some(&data)).unwrap();

    assert_eq!(buffer.size(), 8);
    assert!(!buffer.is_mapped());
    assert_eq!(device.buffer_content(buffer.handle()), Some(data.to_vec()));
    assert_eq!(device.count("glNamedBufferStorage"), 1);

    drop(buffer);
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn initial_data_must_fill_the_buffer() {
    let (device, ctx) = setup();

    match Buffer::new(&ctx, 8, BufferUsage::IMMUTABLE, Some(&[1, 2, 3])) {
        Err(Error::DataTooSmall(3, 8)) => {}
        v => panic!("unexpected result {:?}", v),
    }

    assert_eq!(device.count("glCreateBuffers"), 0);

    // Longer data is cut to the buffer size.
    let buffer = Buffer::new(&ctx, 2, BufferUsage::IMMUTABLE, Some(&[1, 2, 3])).unwrap();
    assert_eq!(device.buffer_content(buffer.handle()), Some(vec![1, 2]));
}

#[test]
fn driver_errors_are_reported() {
    let (device, ctx) = setup();

    device.push_error(glhelper::gl::OUT_OF_MEMORY);
    match Buffer::new(&ctx, 64, BufferUsage::IMMUTABLE, None) {
        Err(Error::Driver(function, _)) => assert_eq!(function, "glNamedBufferStorage"),
        v => panic!("unexpected result {:?}", v),
    }

    // The handle is released even if the creation failed.
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn sub_data() {
    let (device, ctx) = setup();

    let buffer = Buffer::new(&ctx, 16, BufferUsage::SUB_DATA_UPDATE, None).unwrap();
    buffer.set(&[9, 8, 7, 6], 4).unwrap();

    let mut out = [0u8; 6];
    buffer.get(2, &mut out).unwrap();
    assert_eq!(out, [0, 0, 9, 8, 7, 6]);
    assert_eq!(device.count("glNamedBufferSubData"), 1);

    let immutable = Buffer::new(&ctx, 16, BufferUsage::IMMUTABLE, None).unwrap();
    assert!(immutable.set(&[1], 0).is_err());
    assert!(immutable.get(0, &mut out).is_err());
}

#[test]
fn map_and_unmap() {
    let (device, ctx) = setup();

    let mut buffer = Buffer::new(&ctx, 32, BufferUsage::MAP_WRITE, None).unwrap();
    {
        let memory = buffer.map(8, 8, MapType::Write, MapWriteFlags::NONE).unwrap();
        assert_eq!(memory.len(), 8);
        memory.copy_from_slice(&[1, 1, 1, 1, 2, 2, 2, 2]);
    }

    assert!(buffer.is_mapped());

    // A covered range reuses the mapping.
    {
        let memory = buffer.map(12, 4, MapType::Write, MapWriteFlags::NONE).unwrap();
        assert_eq!(memory, &[2, 2, 2, 2]);
    }

    assert_eq!(device.count("glMapNamedBufferRange"), 1);

    // An incompatible range remaps.
    buffer
        .map(16, 16, MapType::Write, MapWriteFlags::INVALIDATE_RANGE)
        .unwrap();
    assert_eq!(device.count("glMapNamedBufferRange"), 2);
    assert_eq!(device.count("glUnmapNamedBuffer"), 1);

    buffer.unmap().unwrap();
    assert!(!buffer.is_mapped());
    assert!(!device.is_mapped(buffer.handle()));

    // Unmapping twice is ignored.
    buffer.unmap().unwrap();
    assert_eq!(device.count("glUnmapNamedBuffer"), 2);

    let content = device.buffer_content(buffer.handle()).unwrap();
    assert_eq!(&content[8..16], &[1, 1, 1, 1, 2, 2, 2, 2]);
}

#[test]
fn map_failure() {
    let (device, ctx) = setup();

    let mut buffer = Buffer::new(&ctx, 32, BufferUsage::MAP_WRITE, None).unwrap();
    device.fail_next_map();

    match buffer.map_whole(MapType::Write, MapWriteFlags::NONE) {
        Err(Error::MapFailed(_, 0, 32)) => {}
        v => panic!("unexpected result {:?}", v.map(|v| v.len())),
    }

    assert!(!buffer.is_mapped());
}

#[test]
fn persistent_mapping() {
    let (device, ctx) = setup();

    let usage = BufferUsage::MAP_WRITE | BufferUsage::MAP_PERSISTENT | BufferUsage::EXPLICIT_FLUSH;
    let mut buffer = Buffer::new(&ctx, 64, usage, None).unwrap();
    assert!(buffer.is_mapped());
    assert!(buffer.is_persistent());

    // Persistent buffers stay mapped.
    buffer.unmap().unwrap();
    assert!(buffer.is_mapped());
    assert_eq!(device.count("glUnmapNamedBuffer"), 0);

    buffer.flush(16, 8);
    buffer.flush_mapped();
    let calls = device.calls();
    let flushes: Vec<_> = calls
        .iter()
        .filter(|v| v.starts_with("glFlushMappedNamedBufferRange"))
        .collect();

    assert_eq!(flushes.len(), 2);
    assert!(flushes[0].ends_with(", 16, 8)"));
    assert!(flushes[1].ends_with(", 0, 64)"));

    // Binding a persistently mapped buffer is fine.
    buffer.bind_uniform_buffer_whole(0);
    assert_eq!(device.count("glBindBufferBase"), 1);
}

#[test]
fn flush_without_explicit_flush_is_ignored() {
    let (device, ctx) = setup();

    let usage = BufferUsage::MAP_WRITE | BufferUsage::MAP_PERSISTENT | BufferUsage::MAP_COHERENT;
    let buffer = Buffer::new(&ctx, 64, usage, None).unwrap();
    buffer.flush(0, 64);
    assert_eq!(device.count("glFlushMappedNamedBufferRange"), 0);
}

#[test]
fn clear_to_zero() {
    let (device, ctx) = setup();

    let buffer = Buffer::new(&ctx, 4, BufferUsage::IMMUTABLE, Some(&[1, 2, 3, 4])).unwrap();
    buffer.clear_to_zero().unwrap();
    assert_eq!(device.buffer_content(buffer.handle()), Some(vec![0; 4]));
}

#[test]
fn redundant_bindings() {
    let (device, ctx) = setup();

    let a = Buffer::new(&ctx, 256, BufferUsage::IMMUTABLE, None).unwrap();
    let b = Buffer::new(&ctx, 256, BufferUsage::IMMUTABLE, None).unwrap();

    a.bind_uniform_buffer_whole(1);
    a.bind_uniform_buffer_whole(1);
    assert_eq!(device.count("glBindBufferBase"), 1);

    a.bind_uniform_buffer(1, 0, 128);
    a.bind_uniform_buffer(1, 0, 128);
    assert_eq!(device.count("glBindBufferRange"), 1);

    b.bind_uniform_buffer_whole(1);
    assert_eq!(device.count("glBindBufferBase"), 2);

    // Uniform and storage slots are tracked independently.
    b.bind_shader_storage_buffer_whole(1);
    assert_eq!(device.count("glBindBufferBase"), 3);

    a.bind_vertex_buffer(0, 0, 12);
    a.bind_vertex_buffer(0, 0, 12);
    a.bind_vertex_buffer(0, 0, 16);
    assert_eq!(device.count("glBindVertexBuffer"), 2);

    a.bind_index_buffer();
    a.bind_index_buffer();
    a.bind_indirect_draw_buffer();
    a.bind_indirect_dispatch_buffer();
    a.bind_indirect_dispatch_buffer();
    assert_eq!(device.count("glBindBuffer"), 3);

    Buffer::reset_uniform_buffer_binding(&ctx, 1);
    Buffer::reset_uniform_buffer_binding(&ctx, 1);
    Buffer::reset_index_buffer_binding(&ctx);
    assert_eq!(device.count("glBindBufferBase"), 4);
    assert_eq!(device.count("glBindBuffer"), 4);
}

#[test]
fn dropping_forgets_bindings() {
    let (device, ctx) = setup();

    let a = Buffer::new(&ctx, 256, BufferUsage::IMMUTABLE, None).unwrap();
    a.bind_uniform_buffer_whole(2);
    a.bind_vertex_buffer(3, 0, 16);
    drop(a);

    device.clear_calls();
    Buffer::reset_uniform_buffer_binding(&ctx, 2);
    Buffer::reset_vertex_buffer_binding(&ctx, 3);
    assert!(device.calls().is_empty());
}
