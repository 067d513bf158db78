use std::cell::Cell;

use crate::errors::*;
use crate::math::prelude::Vector2;

use super::super::events::{Event, WindowEvent};
use super::Visitor;

pub struct HeadlessVisitor {
    dimensions: Cell<Vector2<u32>>,
    queue: Vec<Event>,
}

impl HeadlessVisitor {
    pub fn new(dimensions: Vector2<u32>) -> Self {
        HeadlessVisitor {
            dimensions: Cell::new(dimensions),
            queue: Vec::new(),
        }
    }
}

impl Visitor for HeadlessVisitor {
    #[inline]
    fn set_title(&self, _: &str) {}

    #[inline]
    fn dimensions(&self) -> Vector2<u32> {
        self.dimensions.get()
    }

    #[inline]
    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }

    #[inline]
    fn resize(&self, dimensions: Vector2<u32>) {
        self.dimensions.set(dimensions);
    }

    fn poll_events(&mut self, events: &mut Vec<Event>) {
        for v in self.queue.drain(..) {
            if let Event::Window(WindowEvent::Resized(width, height)) = v {
                self.dimensions.set(Vector2::new(width, height));
            }

            events.push(v);
        }
    }

    #[inline]
    fn push_event(&mut self, event: Event) {
        self.queue.push(event);
    }

    #[inline]
    fn is_current(&self) -> bool {
        true
    }

    #[inline]
    fn make_current(&self) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn swap_buffers(&self) -> Result<()> {
        Ok(())
    }
}
