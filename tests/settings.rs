extern crate glhelper;

use glhelper::prelude::*;

#[test]
fn defaults() {
    let settings = Settings::default();
    assert_eq!(settings.max_draw_buffers, 8);
    assert_eq!(settings.ring_buffer_timeout_ns, 1_000_000_000);
    assert!(settings.shader_compile_logs);
}

#[test]
fn partial_json() {
    let settings = Settings::from_json(
        r#"{
            "check_errors": true,
            "num_texture_bindings": 32,
            "ring_buffer_warn_on_sync": false
        }"#,
    )
    .unwrap();

    assert!(settings.check_errors);
    assert!(!settings.ring_buffer_warn_on_sync);
    assert_eq!(settings.num_texture_bindings, 32);
    assert_eq!(settings.num_sampler_bindings, Settings::default().num_sampler_bindings);

    let json = settings.to_json().unwrap();
    assert_eq!(Settings::from_json(&json).unwrap(), settings);
}

#[test]
fn malformed_json() {
    match Settings::from_json("{ \"check_errors\": 3 }") {
        Err(Error::Settings(_)) => {}
        v => panic!("unexpected result {:?}", v),
    }

    assert!(Settings::from_json("check_errors = true").is_err());
}
