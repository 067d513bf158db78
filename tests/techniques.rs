extern crate transp;

use transp::oit::abuffer::HEAD_SENTINEL;
use transp::oit::mix;
use transp::prelude::*;
use transp::techniques::{depth_peel, refract};
use transp::video::system::FrameInfo;

const SIZE: u32 = 4;
const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const RED: [f32; 3] = [1.0, 0.0, 0.0];
const GREEN: [f32; 3] = [0.0, 1.0, 0.0];
const BLUE: [f32; 3] = [0.0, 0.0, 1.0];

/// The painter's result of a half transparent red plane in front of a half
/// transparent blue one, over white.
const RED_OVER_BLUE: [f32; 3] = [0.75, 0.25, 0.5];

/// The horizontal extent of a plane covering the whole view.
const FULL: (f32, f32) = (-4.0, 4.0);
/// The horizontal extent of a plane covering the left half of the view.
const LEFT: (f32, f32) = (-4.0, 0.0);

fn video(image_load_store: bool) -> VideoSystem {
    VideoSystem::soft(Vector2::new(SIZE, SIZE), Features { image_load_store })
}

fn background(video: &mut VideoSystem) -> TextureHandle {
    let mut params = TextureParams::default();
    params.dimensions = Vector2::new(1, 1);
    video.create_texture(params, &[255, 255, 255, 255]).unwrap()
}

/// A rectangle at height `z` spanning `x` horizontally and the whole view
/// vertically. Larger `z` is nearer. It faces the camera unless `back`.
fn rect(video: &mut VideoSystem, color: [f32; 3], z: f32, x: (f32, f32), back: bool) -> Section {
    let (x0, x1, nz) = if back { (x.1, x.0, -1.0) } else { (x.0, x.1, 1.0) };
    let vertices: Vec<_> = [[x0, 3.7], [x0, -3.7], [x1, 3.7], [x1, -3.7]]
        .iter()
        .map(|p: &[f32; 2]| Vertex::new([p[0], p[1], 0.0], [0.0, 0.0, nz], color))
        .collect();

    let mesh = video
        .create_mesh(MeshPrimitive::TriangleStrip, &vertices)
        .unwrap();

    Section::new(mesh, Matrix4::from_translation(Vector3::new(0.0, 0.0, z)))
}

/// A plane covering the whole view at height `z`.
fn plane(video: &mut VideoSystem, color: [f32; 3], z: f32) -> Section {
    rect(video, color, z, FULL, false)
}

fn driver(video: &mut VideoSystem, ids: &[TechniqueId]) -> FrameDriver {
    let texture = background(video);
    let params = PoolParams {
        dimensions: Vector2::new(SIZE, SIZE),
        list_dimensions: Vector2::new(64, 64),
    };

    FrameDriver::new(video, params, ids, texture).unwrap()
}

/// Renders one frame of `id`, inspecting `layer`, and reads the window back.
fn render(
    video: &mut VideoSystem,
    id: TechniqueId,
    sections: &[Section],
    layer: i32,
) -> Vec<Color<f32>> {
    render_with(video, id, sections, layer, None).0
}

/// Renders one frame of `id` with fragments of `opacity`, inspecting `layer`.
fn render_with(
    video: &mut VideoSystem,
    id: TechniqueId,
    sections: &[Section],
    layer: i32,
    opacity: Option<f32>,
) -> (Vec<Color<f32>>, FrameInfo) {
    let mut driver = driver(video, &[id]);
    driver.set_opacity(opacity);
    for _ in 0..=layer {
        driver.controller_mut().advance_layer();
    }

    assert_eq!(driver.controller().layer(), layer);

    let camera = Camera::new(Vector2::new(SIZE, SIZE), false);
    let info = driver.frame(video, sections, &camera).unwrap();
    let pixels = video.read_pixels(Target::Window, 0).unwrap();
    driver.delete(video).unwrap();
    (pixels, info)
}

/// Renders opaque `sections` over white with a plain depth test.
fn depth_tested(video: &mut VideoSystem, sections: &[Section]) -> Vec<Color<f32>> {
    let state = RenderState::default().with_depth(Comparison::Less, true);
    let shader = video
        .create_shader(ShaderParams::new(Program::Simple, state))
        .unwrap();

    let camera = Camera::new(Vector2::new(SIZE, SIZE), false);
    video.bind(Target::Window).unwrap();
    video.clear(Color::white(), Some(1.0)).unwrap();

    for v in sections {
        let dc = Draw::new(shader, v.mesh)
            .with("mat_mvp", camera.mvp(&v.transform))
            .with("alpha", 1.0f32);
        video.draw(&dc).unwrap();
    }

    let pixels = video.read_pixels(Target::Window, 0).unwrap();
    video.delete_shader(shader).unwrap();
    pixels
}

fn assert_pixels(pixels: &[Color<f32>], expected: [f32; 3], tolerance: f32) {
    assert_eq!(pixels.len(), (SIZE * SIZE) as usize);
    for v in pixels {
        let rgb = v.rgb();
        for i in 0..3 {
            assert!(
                (rgb[i] - expected[i]).abs() < tolerance,
                "{:?} is not {:?}",
                rgb,
                expected
            );
        }
    }
}

/// Checks the left half of the view is `left` and the right half `right`.
fn assert_halves(pixels: &[Color<f32>], left: [f32; 3], right: [f32; 3], tolerance: f32) {
    assert_eq!(pixels.len(), (SIZE * SIZE) as usize);
    for (i, v) in pixels.iter().enumerate() {
        let expected = if (i as u32 % SIZE) < SIZE / 2 { left } else { right };
        let rgb = v.rgb();
        for c in 0..3 {
            assert!(
                (rgb[c] - expected[c]).abs() < tolerance,
                "pixel {}: {:?} is not {:?}",
                i,
                rgb,
                expected
            );
        }
    }
}

fn assert_same(lhs: &[Color<f32>], rhs: &[Color<f32>], tolerance: f32) {
    assert_eq!(lhs.len(), rhs.len());
    for (lhs, rhs) in lhs.iter().zip(rhs) {
        assert!(lhs.distance_rgb(rhs) < tolerance, "{:?} is not {:?}", lhs, rhs);
    }
}

fn red_over_blue(video: &mut VideoSystem) -> (Vec<Section>, Vec<Section>) {
    let red = plane(video, RED, 1.0);
    let blue = plane(video, BLUE, 0.0);
    (vec![red, blue], vec![blue, red])
}

/// A red plane over the left half of a blue plane.
fn half_red_over_blue(video: &mut VideoSystem) -> (Vec<Section>, Vec<Section>) {
    let red = rect(video, RED, 1.0, LEFT, false);
    let blue = plane(video, BLUE, 0.0);
    (vec![red, blue], vec![blue, red])
}

#[test]
fn alpha_depends_on_order() {
    let mut video = video(false);
    let (front_to_back, back_to_front) = red_over_blue(&mut video);

    let sorted = render(&mut video, TechniqueId::Alpha, &back_to_front, -1);
    assert_pixels(&sorted, RED_OVER_BLUE, 0.01);

    let unsorted = render(&mut video, TechniqueId::Alpha, &front_to_back, -1);
    assert_pixels(&unsorted, [0.5, 0.25, 0.75], 0.01);
}

#[test]
fn exact_techniques_match_painter() {
    let mut video = video(true);
    let (front_to_back, back_to_front) = red_over_blue(&mut video);

    for &id in &[
        TechniqueId::AlphaDp,
        TechniqueId::ABuffer,
        TechniqueId::Adaptive,
    ] {
        for sections in &[&front_to_back, &back_to_front] {
            let pixels = render(&mut video, id, sections, -1);
            assert_pixels(&pixels, RED_OVER_BLUE, 0.015);
        }
    }
}

#[test]
fn weighted_techniques_are_order_independent() {
    let mut video = video(false);
    let (front_to_back, back_to_front) = red_over_blue(&mut video);

    for &id in &[
        TechniqueId::Meshkin,
        TechniqueId::BavoilMyers,
        TechniqueId::BavoilMcGuire,
        TechniqueId::BavoilMcGuireWeighted,
    ] {
        let lhs = render(&mut video, id, &front_to_back, -1);
        let rhs = render(&mut video, id, &back_to_front, -1);
        for (lhs, rhs) in lhs.iter().zip(&rhs) {
            assert!(lhs.distance_rgb(rhs) < 0.01, "{} depends on order", id);
        }
    }
}

#[test]
fn weighted_techniques_are_exact_for_one_fragment() {
    let mut video = video(false);
    let red = plane(&mut video, RED, 0.5);
    let expected = mix(WHITE, RED, 0.5);

    for &id in &[
        TechniqueId::Meshkin,
        TechniqueId::BavoilMyers,
        TechniqueId::BavoilMcGuire,
        TechniqueId::BavoilMcGuireWeighted,
    ] {
        let pixels = render(&mut video, id, &[red], -1);
        assert_pixels(&pixels, expected, 0.01);
    }
}

#[test]
fn forward_blending() {
    let mut video = video(false);
    let gray = plane(&mut video, [0.5, 0.5, 0.5], 0.0);

    // 0.2 * color + white, saturated.
    let pixels = render(&mut video, TechniqueId::Additive, &[gray], -1);
    assert_pixels(&pixels, WHITE, 0.01);

    // color * alpha * white.
    let pixels = render(&mut video, TechniqueId::Multiplicative, &[gray], -1);
    assert_pixels(&pixels, [0.4, 0.4, 0.4], 0.01);
}

#[test]
fn inspect_layers_back_to_front() {
    let mut video = video(true);
    let (front_to_back, _) = red_over_blue(&mut video);

    for &id in &[TechniqueId::AlphaDp, TechniqueId::ABuffer] {
        let farthest = render(&mut video, id, &front_to_back, 0);
        assert_pixels(&farthest, BLUE, 0.01);

        let nearest = render(&mut video, id, &front_to_back, 1);
        assert_pixels(&nearest, RED, 0.01);
    }
}

#[test]
fn abuffer_stores_every_fragment() {
    let mut video = video(true);
    let (front_to_back, _) = red_over_blue(&mut video);
    let mut driver = driver(&mut video, &[TechniqueId::ABuffer]);
    let camera = Camera::new(Vector2::new(SIZE, SIZE), false);

    driver.frame(&mut video, &front_to_back, &camera).unwrap();

    let lists = driver.pool().lists().unwrap();
    assert_eq!(video.read_counter(lists.counter).unwrap(), 2 * SIZE * SIZE);

    let heads = video.read_image(lists.head).unwrap();
    assert_eq!(heads.len(), (SIZE * SIZE) as usize);
    assert!(heads.iter().all(|&v| v != HEAD_SENTINEL && v < 2 * SIZE * SIZE));

    // The lists are truncated every frame.
    driver.frame(&mut video, &front_to_back[..1], &camera).unwrap();
    assert_eq!(video.read_counter(lists.counter).unwrap(), SIZE * SIZE);
}

#[test]
fn storage_techniques_without_storage_images() {
    let mut video = video(false);
    let (front_to_back, _) = red_over_blue(&mut video);

    assert!(driver(&mut video, &[TechniqueId::ABuffer])
        .pool()
        .lists()
        .is_none());

    for &id in &[TechniqueId::ABuffer, TechniqueId::Adaptive] {
        let pixels = render(&mut video, id, &front_to_back, -1);
        assert_pixels(&pixels, WHITE, 0.01);
    }
}

#[test]
fn refraction_keeps_background_without_faces() {
    let mut video = video(false);
    let sections: Vec<Section> = Vec::new();

    for &id in &[TechniqueId::Refract, TechniqueId::RefractDp] {
        let pixels = render(&mut video, id, &sections, -1);
        assert_pixels(&pixels, WHITE, 0.01);
    }
}

#[test]
fn every_technique_renders() {
    let mut video = video(true);
    let (front_to_back, _) = red_over_blue(&mut video);
    let mut driver = driver(&mut video, &TechniqueId::ALL);
    let camera = Camera::new(Vector2::new(SIZE, SIZE), false);

    for &id in &TechniqueId::ALL {
        assert_eq!(driver.controller().id(), id);

        let info = driver.frame(&mut video, &front_to_back, &camera).unwrap();
        assert!(info.drawcalls > 0, "{} draws nothing", id);

        driver.controller_mut().next();
    }

    assert_eq!(driver.controller().id(), TechniqueId::Alpha);
    driver.delete(&mut video).unwrap();
}

#[test]
fn resize() {
    let mut video = video(true);
    let (front_to_back, back_to_front) = red_over_blue(&mut video);
    let mut driver = driver(&mut video, &[TechniqueId::AlphaDp]);

    driver.resize(&mut video, Vector2::new(8, 2)).unwrap();
    assert_eq!(driver.pool().dimensions(), Vector2::new(8, 2));

    let camera = Camera::new(Vector2::new(8, 2), false);
    driver.frame(&mut video, &front_to_back, &camera).unwrap();
    let pixels = video.read_pixels(Target::Window, 0).unwrap();
    assert_eq!(pixels.len(), 16);

    driver.frame(&mut video, &back_to_front, &camera).unwrap();
    let other = video.read_pixels(Target::Window, 0).unwrap();
    assert_eq!(pixels, other);
}

#[test]
fn uncovered_pixels_keep_the_previous_layer() {
    let mut video = video(true);
    let (front_to_back, back_to_front) = half_red_over_blue(&mut video);
    let blue = mix(WHITE, BLUE, 0.5);

    for &id in &[
        TechniqueId::AlphaDp,
        TechniqueId::ABuffer,
        TechniqueId::Adaptive,
    ] {
        for sections in &[&front_to_back, &back_to_front] {
            let pixels = render(&mut video, id, sections, -1);
            assert_halves(&pixels, RED_OVER_BLUE, blue, 0.015);
        }
    }
}

#[test]
fn depth_peeling_keeps_the_farthest_layers() {
    let mut video = video(false);
    let colors = [RED, GREEN, BLUE];
    let count = 10;

    let planes: Vec<_> = (0..count)
        .map(|i| plane(&mut video, colors[i % 3], i as f32 * 0.1))
        .collect();

    let painter = |n: usize| (0..n).fold(WHITE, |acc, i| mix(acc, colors[i % 3], 0.5));
    let expected = painter(depth_peel::LAYERS);
    let every = painter(count);
    assert!((0..3).any(|c| (expected[c] - every[c]).abs() > 0.05));

    let back_to_front = render(&mut video, TechniqueId::AlphaDp, &planes, -1);
    assert_pixels(&back_to_front, expected, 0.015);

    let reversed: Vec<_> = planes.iter().rev().cloned().collect();
    let front_to_back = render(&mut video, TechniqueId::AlphaDp, &reversed, -1);
    assert_same(&back_to_front, &front_to_back, 0.005);
}

#[test]
fn opaque_scenes_match_depth_testing() {
    let mut video = video(true);
    let (front_to_back, back_to_front) = half_red_over_blue(&mut video);
    let reference = depth_tested(&mut video, &back_to_front);
    assert_halves(&reference, RED, BLUE, 0.01);

    for &id in &[
        TechniqueId::AlphaDp,
        TechniqueId::ABuffer,
        TechniqueId::Adaptive,
    ] {
        for sections in &[&front_to_back, &back_to_front] {
            let (pixels, _) = render_with(&mut video, id, sections, -1, Some(1.0));
            assert_same(&pixels, &reference, 0.01);
        }
    }

    let (pixels, _) = render_with(&mut video, TechniqueId::Alpha, &back_to_front, -1, Some(1.0));
    assert_same(&pixels, &reference, 0.01);

    // The weighted family averages overlapping fragments, so only a single
    // layer is exact.
    let single = [front_to_back[0]];
    let reference = depth_tested(&mut video, &single);
    assert_halves(&reference, RED, WHITE, 0.01);

    for &id in &[
        TechniqueId::Meshkin,
        TechniqueId::BavoilMyers,
        TechniqueId::BavoilMcGuire,
        TechniqueId::BavoilMcGuireWeighted,
    ] {
        let (pixels, _) = render_with(&mut video, id, &single, -1, Some(1.0));
        assert_same(&pixels, &reference, 0.01);
    }
}

/// Two nested volumes, each a back face behind a white front face. The far
/// back face is red, the near one blue.
fn nested_volumes(video: &mut VideoSystem) -> Vec<Section> {
    vec![
        rect(video, BLUE, 0.4, FULL, true),
        rect(video, WHITE, 0.2, FULL, false),
        rect(video, RED, 0.0, FULL, true),
        rect(video, WHITE, 0.6, FULL, false),
    ]
}

#[test]
fn refraction_peels_back_and_front_faces_per_layer() {
    let mut video = video(false);
    let sections = nested_volumes(&mut video);

    // Back faces tint what is behind them by `0.5 + 0.5 * color`, and white
    // front faces absorb nothing.
    let far = [1.0, 0.5, 0.5];
    let near = [0.5, 0.5, 1.0];
    let both = [0.5, 0.25, 0.5];

    let passes = 2 * refract::LAYERS as u32 * sections.len() as u32;
    let (pixels, info) = render_with(&mut video, TechniqueId::RefractDp, &sections, -1, None);
    assert_eq!(info.drawcalls, 1 + passes);
    assert_pixels(&pixels, both, 0.01);

    let (pixels, info) = render_with(&mut video, TechniqueId::RefractDp, &sections, 0, None);
    assert_eq!(info.drawcalls, 1 + 2 * sections.len() as u32);
    assert_pixels(&pixels, far, 0.01);

    let (pixels, info) = render_with(&mut video, TechniqueId::RefractDp, &sections, 1, None);
    assert_eq!(info.drawcalls, 1 + 4 * sections.len() as u32);
    assert_pixels(&pixels, near, 0.01);

    let (pixels, _) = render_with(&mut video, TechniqueId::RefractDp, &sections, 2, None);
    assert_pixels(&pixels, WHITE, 0.01);
}
