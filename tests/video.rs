extern crate transp;

use transp::prelude::*;
use transp::techniques::pool::PingPong;
use transp::video::errors::Error as VideoError;

fn pool(video: &mut VideoSystem) -> FramebufferPool {
    let params = PoolParams {
        dimensions: Vector2::new(4, 4),
        list_dimensions: Vector2::new(16, 16),
    };

    FramebufferPool::new(video, params).unwrap()
}

fn shader(video: &mut VideoSystem, program: Program, state: RenderState) -> ShaderHandle {
    video
        .create_shader(ShaderParams::new(program, state))
        .unwrap()
}

#[test]
fn feedback_loop() {
    let mut video = VideoSystem::soft(Vector2::new(4, 4), Features::default());
    let pool = pool(&mut video);
    let (a, b) = (pool.ping_pong_a(), pool.ping_pong_b());
    let peel = shader(&mut video, Program::DepthPeel, RenderState::default());

    let dc = |src: PingPong| {
        Draw::new(peel, pool.quad())
            .with("mat_mvp", Matrix4::<f32>::identity())
            .with("alpha", 0.5f32)
            .with("fb", src.color)
            .with("depth", src.depth)
    };

    video.bind(a.surface).unwrap();
    let err = video.draw(&dc(a)).unwrap_err();
    match err.downcast_ref::<VideoError>() {
        Some(VideoError::FeedbackLoop(rt)) => assert_eq!(*rt, a.color),
        _ => panic!("unexpected {}", err),
    }

    assert!(video.draw(&dc(b)).is_ok());
}

#[test]
fn missing_barrier() {
    let mut video = VideoSystem::soft(Vector2::new(4, 4), Features { image_load_store: true });
    let pool = pool(&mut video);
    let lists = pool.lists().unwrap();

    let build = shader(
        &mut video,
        Program::ABufferBuild,
        RenderState::default().with_color_write(false),
    );
    let resolve = shader(&mut video, Program::ABufferResolve, RenderState::default());

    lists.reset(&mut video).unwrap();
    video.bind(Target::Window).unwrap();

    let dc = Draw::new(build, pool.quad())
        .with("mat_mvp", Matrix4::<f32>::identity())
        .with("alpha", 0.5f32)
        .with("head", lists.head)
        .with("list", lists.list)
        .with("counter", lists.counter);
    video.draw(&dc).unwrap();
    assert_eq!(video.read_counter(lists.counter).unwrap(), 16);

    let dc = Draw::new(resolve, pool.quad())
        .with("head", lists.head)
        .with("list", lists.list);

    let err = video.draw(&dc).unwrap_err();
    match err.downcast_ref::<VideoError>() {
        Some(VideoError::MissingBarrier(_)) => {}
        _ => panic!("unexpected {}", err),
    }

    video.memory_barrier(Barrier::ImageAccess).unwrap();
    video.draw(&dc).unwrap();

    // One half transparent white fragment over black.
    for v in video.read_pixels(Target::Window, 0).unwrap() {
        assert!((v.r - 0.5).abs() < 0.01);
    }
}

#[test]
fn storage_images_are_optional() {
    let mut video = VideoSystem::soft(Vector2::new(4, 4), Features::default());
    assert!(!video.features().image_load_store);

    let params = ImageParams {
        format: ImageFormat::R32UI,
        dimensions: Vector2::new(4, 4),
    };

    assert!(video.create_image(params).is_err());

    let params = ShaderParams::new(Program::AdaptiveVisibility, RenderState::default());
    assert!(video.create_shader(params).is_err());

    let params = ShaderParams::new(Program::Meshkin, RenderState::default());
    assert!(video.create_shader(params).is_ok());
}
