use gl;
use glutin;
use glutin::GlContext;

use crate::errors::*;
use crate::math::prelude::Vector2;

use super::super::super::events::Event;
use super::super::super::WindowParams;
use super::super::Visitor;
use super::types;

/// The requested version of the OpenGL core profile.
const GL_VERSION: (u8, u8) = (4, 3);

pub struct GlutinVisitor {
    window: glutin::GlWindow,
    events_loop: glutin::EventsLoop,
    queue: Vec<Event>,
}

impl GlutinVisitor {
    pub fn from(params: WindowParams) -> Result<Self> {
        let builder = glutin::WindowBuilder::new()
            .with_title(params.title)
            .with_dimensions(glutin::dpi::LogicalSize::new(
                f64::from(params.size.x),
                f64::from(params.size.y),
            ))
            .with_decorations(!params.borderless)
            .with_resizable(!params.borderless);

        let context = glutin::ContextBuilder::new()
            .with_gl_profile(glutin::GlProfile::Core)
            .with_gl(glutin::GlRequest::Specific(glutin::Api::OpenGl, GL_VERSION))
            .with_depth_buffer(24)
            .with_vsync(params.vsync);

        let events_loop = glutin::EventsLoop::new();
        let window = glutin::GlWindow::new(builder, context, &events_loop)
            .map_err(|err| format_err!("Failed to create OpenGL context: {}", err))?;

        let mut visitor = GlutinVisitor {
            window,
            events_loop,
            queue: Vec::new(),
        };

        visitor.events_loop.poll_events(|_| {});

        unsafe {
            visitor.window.make_current()?;
            gl::load_with(|symbol| visitor.window.get_proc_address(symbol) as *const _);
        }

        let dims = visitor.dimensions();
        visitor.resize(dims);
        Ok(visitor)
    }
}

impl Visitor for GlutinVisitor {
    #[inline]
    fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    fn dimensions(&self) -> Vector2<u32> {
        let dpr = self.window.get_hidpi_factor();
        match self.window.get_inner_size() {
            Some(size) => {
                let size = size.to_physical(dpr);
                Vector2::new(size.width as u32, size.height as u32)
            }
            None => Vector2::new(0, 0),
        }
    }

    #[inline]
    fn device_pixel_ratio(&self) -> f32 {
        self.window.get_hidpi_factor() as f32
    }

    #[inline]
    fn resize(&self, dimensions: Vector2<u32>) {
        let size = glutin::dpi::PhysicalSize::new(f64::from(dimensions.x), f64::from(dimensions.y));
        self.window.resize(size)
    }

    fn poll_events(&mut self, events: &mut Vec<Event>) {
        events.extend(self.queue.drain(..));

        let dpr = self.window.get_hidpi_factor();
        self.events_loop.poll_events(|v| {
            if let Some(e) = types::from_event(v, dpr) {
                events.push(e);
            }
        });
    }

    #[inline]
    fn push_event(&mut self, event: Event) {
        self.queue.push(event);
    }

    #[inline]
    fn is_current(&self) -> bool {
        self.window.is_current()
    }

    #[inline]
    fn make_current(&self) -> Result<()> {
        unsafe {
            self.window.make_current()?;
            Ok(())
        }
    }

    #[inline]
    fn swap_buffers(&self) -> Result<()> {
        self.window.swap_buffers()?;
        Ok(())
    }
}
