use std::time::Duration;

use village_ngin::{
    camera::{Bounds, CameraSettings, MovementKeys},
    cgmath::{Deg, InnerSpace, Point3, Vector3},
};
use winit::{event::ElementState, keyboard::KeyCode};

const FRAME: Duration = Duration::from_millis(16);

#[test]
fn wasd_and_qe_are_the_only_navigation_keys() {
    let mut controller = CameraSettings::default().controller();
    for key in [
        KeyCode::KeyW,
        KeyCode::KeyS,
        KeyCode::KeyA,
        KeyCode::KeyD,
        KeyCode::KeyQ,
        KeyCode::KeyE,
    ] {
        assert!(controller.handle_key(key, ElementState::Pressed));
    }
    assert!(!controller.handle_key(KeyCode::Space, ElementState::Pressed));
    assert!(!controller.handle_key(KeyCode::ArrowUp, ElementState::Pressed));
    assert_eq!(
        controller.keys,
        MovementKeys {
            forward: true,
            back: true,
            left: true,
            right: true,
            yaw_left: true,
            yaw_right: true,
        }
    );

    controller.handle_key(KeyCode::KeyW, ElementState::Released);
    assert!(!controller.keys.forward);
    assert!(controller.keys.back);
}

#[test]
fn walking_forever_stops_at_the_road_end() {
    let settings = CameraSettings::default();
    let mut camera = settings.camera();
    let mut controller = settings.controller();
    controller.handle_key(KeyCode::KeyW, ElementState::Pressed);
    for _ in 0..2_000 {
        controller.update(&mut camera, FRAME);
    }
    assert_eq!(camera.position, Point3::new(5.0, 1.0, 0.0));
}

#[test]
fn sidestepping_is_clamped_per_axis() {
    let settings = CameraSettings::default();
    let mut camera = settings.camera();
    let mut controller = settings.controller();
    controller.handle_key(KeyCode::KeyW, ElementState::Pressed);
    controller.handle_key(KeyCode::KeyA, ElementState::Pressed);
    let mut last_x = camera.position.x;
    for _ in 0..100 {
        controller.update(&mut camera, FRAME);
        assert!(controller.bounds().contains(camera.position));
        assert!(camera.position.x >= last_x);
        last_x = camera.position.x;
    }
    // the blocked z axis does not stop progress along x
    assert_eq!(camera.position.z, -3.0);
    assert!(camera.position.x > -15.0);
}

#[test]
fn mixed_input_stays_inside_the_limits_every_frame() {
    let settings = CameraSettings::default();
    let mut camera = settings.camera();
    let mut controller = settings.controller();
    let keys = [
        KeyCode::KeyW,
        KeyCode::KeyA,
        KeyCode::KeyS,
        KeyCode::KeyD,
        KeyCode::KeyQ,
        KeyCode::KeyE,
    ];
    for step in 0..3_000usize {
        // a cheap scramble so each key is held for varying runs of frames
        let key = keys[(step * 7 + step / 13) % keys.len()];
        let state = if (step / 5) % 3 == 0 {
            ElementState::Released
        } else {
            ElementState::Pressed
        };
        controller.handle_key(key, state);
        controller.update(&mut camera, FRAME);

        assert!((-45.0..=45.0).contains(&camera.yaw().0), "yaw {:?} at step {step}", camera.yaw());
        assert!(
            controller.bounds().contains(camera.position),
            "{:?} at step {step}",
            camera.position
        );
    }
}

#[test]
fn height_never_leaves_eye_level() {
    let settings = CameraSettings {
        pitch: Deg(30.0),
        ..Default::default()
    };
    let mut camera = settings.camera();
    let mut controller = settings.controller();
    controller.handle_key(KeyCode::KeyW, ElementState::Pressed);
    for _ in 0..50 {
        controller.update(&mut camera, FRAME);
        assert_eq!(camera.position.y, 1.0);
    }
}

#[test]
fn turning_stops_at_the_yaw_limit() {
    let settings = CameraSettings::default();
    let mut camera = settings.camera();
    let mut controller = settings.controller();
    controller.handle_key(KeyCode::KeyQ, ElementState::Pressed);
    for _ in 0..1_000 {
        controller.update(&mut camera, FRAME);
        assert!((-45.0..=45.0).contains(&camera.yaw().0));
    }
    assert_eq!(camera.yaw(), Deg(-45.0));

    controller.handle_key(KeyCode::KeyQ, ElementState::Released);
    controller.handle_key(KeyCode::KeyE, ElementState::Pressed);
    for _ in 0..1_000 {
        controller.update(&mut camera, FRAME);
        assert!((-45.0..=45.0).contains(&camera.yaw().0));
    }
    assert_eq!(camera.yaw(), Deg(45.0));
}

#[test]
fn front_follows_yaw() {
    let settings = CameraSettings::default();
    let mut camera = settings.camera();
    let mut controller = settings.controller();
    controller.handle_key(KeyCode::KeyE, ElementState::Pressed);
    for _ in 0..1_000 {
        controller.update(&mut camera, FRAME);
    }
    let front = camera.front();
    assert!((front.magnitude() - 1.0).abs() < 1e-5);
    let diagonal = Vector3::new(1.0, 0.0, 1.0).normalize();
    assert!((front - diagonal).magnitude() < 1e-5);
}

#[test]
fn losing_focus_releases_every_key() {
    let mut controller = CameraSettings::default().controller();
    controller.handle_key(KeyCode::KeyW, ElementState::Pressed);
    controller.handle_key(KeyCode::KeyE, ElementState::Pressed);
    controller.handle_window_events(&winit::event::WindowEvent::Focused(false));
    assert_eq!(controller.keys, MovementKeys::default());
}

#[test]
fn start_outside_the_bounds_is_pulled_in_on_first_update() {
    let settings = CameraSettings {
        start: Point3::new(-40.0, 3.0, 9.0),
        ..Default::default()
    };
    let mut camera = settings.camera();
    let mut controller = settings.controller();
    controller.update(&mut camera, FRAME);
    assert_eq!(camera.position, Point3::new(-15.0, 1.0, 3.0));
}

#[test]
fn bounds_clamp_each_axis() {
    let bounds = Bounds::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    assert_eq!(bounds.clamp(Point3::new(-1.0, 0.5, 2.0)), Point3::new(0.0, 0.5, 1.0));
    assert!(!bounds.contains(Point3::new(1.5, 0.5, 0.5)));
}
