//! Represents an OpenGL context and the window or environment around it.

pub mod events;

mod backends;

pub mod prelude {
    pub use super::events::{Event, Key, WindowEvent};
    pub use super::{WindowParams, WindowSystem};
}

use crate::errors::*;
use crate::math::prelude::Vector2;

use self::backends::Visitor;
use self::events::Event;

#[derive(Debug, Clone)]
pub struct WindowParams {
    /// Sets the title of window.
    pub title: String,
    /// Sets the size in pixels of the client area of the window.
    pub size: Vector2<u32>,
    /// Removes the decorations of the window.
    pub borderless: bool,
    /// Specifies whether should we have vsync.
    pub vsync: bool,
}

impl Default for WindowParams {
    fn default() -> Self {
        WindowParams {
            title: "transp".to_owned(),
            size: Vector2::new(1280, 720),
            borderless: false,
            vsync: true,
        }
    }
}

/// Represents an OpenGL context and the window or environment around it.
pub struct WindowSystem {
    visitor: Box<dyn Visitor>,
    events: Vec<Event>,
}

impl WindowSystem {
    /// Creates a window with an OpenGL 4.3 core context, and makes the context
    /// current in this thread.
    pub fn from(params: WindowParams) -> Result<Self> {
        info!(
            "Creates window of {}x{} (borderless: {}, vsync: {}).",
            params.size.x, params.size.y, params.borderless, params.vsync
        );

        Ok(WindowSystem {
            visitor: backends::new(params)?,
            events: Vec::new(),
        })
    }

    /// Creates a window without any OpenGL context, whose events are pushed by
    /// hand.
    pub fn headless(dimensions: Vector2<u32>) -> Self {
        WindowSystem {
            visitor: backends::new_headless(dimensions),
            events: Vec::new(),
        }
    }

    /// Polls the events happened since the last call.
    pub fn poll_events(&mut self) -> &[Event] {
        self.events.clear();
        self.visitor.poll_events(&mut self.events);
        &self.events
    }

    /// Queues an event, which will be returned by the next poll.
    pub fn push_event(&mut self, event: Event) {
        self.visitor.push_event(event);
    }

    #[inline]
    pub fn set_title(&self, title: &str) {
        self.visitor.set_title(title);
    }

    /// Returns the size in pixels of the client area of the window.
    #[inline]
    pub fn dimensions(&self) -> Vector2<u32> {
        self.visitor.dimensions()
    }

    /// Returns the ratio between the backing framebuffer resolution and the window size in
    /// screen pixels. This is typically one for a normal display and two for a retina display.
    #[inline]
    pub fn device_pixel_ratio(&self) -> f32 {
        self.visitor.device_pixel_ratio()
    }

    /// Resize the GL context.
    #[inline]
    pub fn resize(&self, dimensions: Vector2<u32>) {
        self.visitor.resize(dimensions);
    }

    /// Set the context as the active context in this thread.
    #[inline]
    pub fn make_current(&self) -> Result<()> {
        self.visitor.make_current()
    }

    /// Returns true if this context is the current one in this thread.
    #[inline]
    pub fn is_current(&self) -> bool {
        self.visitor.is_current()
    }

    /// Swaps the buffers in case of double or triple buffering.
    ///
    /// **Warning**: if you enabled vsync, this function will block until the next time the screen
    /// is refreshed.
    #[inline]
    pub fn swap_buffers(&self) -> Result<()> {
        self.visitor.swap_buffers()
    }
}

#[cfg(test)]
mod test {
    use super::events::*;
    use super::*;

    #[test]
    fn headless() {
        let mut window = WindowSystem::headless(Vector2::new(64, 32));
        assert_eq!(window.dimensions(), Vector2::new(64, 32));
        assert!(window.poll_events().is_empty());

        window.push_event(Event::KeyReleased(Key::Space));
        window.push_event(Event::Window(WindowEvent::Resized(32, 16)));
        assert_eq!(
            window.poll_events(),
            &[
                Event::KeyReleased(Key::Space),
                Event::Window(WindowEvent::Resized(32, 16))
            ]
        );

        assert_eq!(window.dimensions(), Vector2::new(32, 16));
        assert!(window.poll_events().is_empty());
        assert!(window.make_current().is_ok());
        assert!(window.swap_buffers().is_ok());
    }
}
