extern crate transp;

use transp::prelude::*;
use transp::scene::entity;
use transp::scene::Objects;

const CUBE: &str = "
o cube
v -1 -1 -1
v  1 -1 -1
v  1  1 -1
v -1  1 -1
v -1 -1  1
v  1 -1  1
v  1  1  1
v -1  1  1
g cube
f 1 4 3 2
f 5 6 7 8
f 1 2 6 5
f 2 3 7 6
f 3 4 8 7
f 4 1 5 8
";

fn setup(settings: &Settings) -> (VideoSystem, WindowSystem, Demo) {
    let mut video = VideoSystem::soft(Vector2::new(16, 8), Features { image_load_store: true });
    let window = WindowSystem::headless(Vector2::new(16, 8));

    let data = entity::parse(CUBE.as_bytes()).unwrap();
    let groups = entity::triangulate(&data, settings.gradient).unwrap();

    let mut params = TextureParams::default();
    params.dimensions = Vector2::new(2, 2);
    let texture = video.create_texture(params, &[128; 16]).unwrap();

    let demo = Demo::new(&mut video, settings, &groups, texture).unwrap();
    (video, window, demo)
}

/// Feeds every pending event to the demo. Returns false if it quits.
fn pump(video: &mut VideoSystem, window: &mut WindowSystem, demo: &mut Demo) -> bool {
    for v in window.poll_events() {
        if !demo.on(video, v).unwrap() {
            return false;
        }
    }

    true
}

#[test]
fn key_bindings() {
    assert_eq!(Action::from_key(Key::Space), Some(Action::NextTechnique));
    assert_eq!(Action::from_key(Key::Back), Some(Action::PreviousTechnique));
    assert_eq!(Action::from_key(Key::Return), Some(Action::ToggleObjects));
    assert_eq!(Action::from_key(Key::P), Some(Action::TogglePause));
    assert_eq!(Action::from_key(Key::L), Some(Action::AdvanceLayer));
    assert_eq!(Action::from_key(Key::Escape), Some(Action::Quit));
}

#[test]
fn controls() {
    let (mut video, mut window, mut demo) = setup(&Settings::default());
    assert_eq!(demo.technique(), TechniqueId::Alpha);
    assert_eq!(demo.title(), "transp - plain alpha blending");

    window.push_event(Event::KeyPressed(Key::Space));
    assert!(pump(&mut video, &mut window, &mut demo));
    assert_eq!(demo.technique(), TechniqueId::Alpha);

    window.push_event(Event::KeyReleased(Key::Space));
    assert!(pump(&mut video, &mut window, &mut demo));
    assert_eq!(demo.technique(), TechniqueId::AlphaDp);
    assert_eq!(demo.title(), "transp - alpha blending with depth peeling");

    window.push_event(Event::KeyReleased(Key::L));
    window.push_event(Event::KeyReleased(Key::L));
    assert!(pump(&mut video, &mut window, &mut demo));
    assert_eq!(demo.layer(), 1);

    window.push_event(Event::KeyReleased(Key::Back));
    assert!(pump(&mut video, &mut window, &mut demo));
    assert_eq!(demo.technique(), TechniqueId::Alpha);
    assert_eq!(demo.layer(), -1);

    window.push_event(Event::KeyReleased(Key::Back));
    assert!(pump(&mut video, &mut window, &mut demo));
    assert_eq!(demo.technique(), TechniqueId::Multiplicative);

    window.push_event(Event::KeyReleased(Key::Return));
    assert!(pump(&mut video, &mut window, &mut demo));
    assert_eq!(demo.scene().objects(), Objects::Quads);
    assert_eq!(demo.scene().sections().len(), 6);

    window.push_event(Event::KeyReleased(Key::Escape));
    assert!(!pump(&mut video, &mut window, &mut demo));

    window.push_event(Event::Window(WindowEvent::Closed));
    assert!(!pump(&mut video, &mut window, &mut demo));

    demo.delete(&mut video).unwrap();
}

#[test]
fn frames() {
    let (mut video, mut window, mut demo) = setup(&Settings::default());
    let count = TechniqueId::ALL.len();

    for _ in 0..count {
        let info = demo.frame(&mut video, 0.016).unwrap();
        assert!(info.drawcalls > 0, "{} draws nothing", demo.technique());
        assert!(info.triangles > 0);
        demo.perform(Action::NextTechnique);
    }

    let view = demo.scene().camera().view();
    window.push_event(Event::KeyReleased(Key::P));
    assert!(pump(&mut video, &mut window, &mut demo));
    demo.frame(&mut video, 0.016).unwrap();
    assert_eq!(demo.scene().camera().view(), view);

    window.push_event(Event::Window(WindowEvent::Resized(8, 8)));
    assert!(pump(&mut video, &mut window, &mut demo));
    assert_eq!(video.dimensions(), Vector2::new(8, 8));
    assert_eq!(demo.driver().pool().dimensions(), Vector2::new(8, 8));
    assert_eq!(demo.scene().camera().aspect(), 1.0);

    demo.frame(&mut video, 0.016).unwrap();
    assert_eq!(video.read_pixels(Target::Window, 0).unwrap().len(), 64);
    demo.delete(&mut video).unwrap();
}

#[test]
fn configured_techniques() {
    let json = br#"{ "techniques": ["abuffer", "adaptive"], "two_objects": false, "opacity": 1.0 }"#;
    let settings = Settings::parse(json).unwrap();
    let (mut video, _, mut demo) = setup(&settings);

    assert_eq!(demo.driver().controller().len(), 2);
    assert_eq!(demo.driver().opacity(), Some(1.0));
    assert_eq!(demo.technique(), TechniqueId::ABuffer);
    assert_eq!(demo.scene().sections().len(), 1);

    demo.perform(Action::NextTechnique);
    demo.perform(Action::NextTechnique);
    assert_eq!(demo.technique(), TechniqueId::ABuffer);

    demo.frame(&mut video, 0.016).unwrap();
    demo.delete(&mut video).unwrap();
}
