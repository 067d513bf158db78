use glutin;

use super::super::super::events::{Event, Key, WindowEvent};

/// Converts a glutin event. Sizes are scaled by `dpr` into pixels.
pub fn from_event(source: glutin::Event, dpr: f64) -> Option<Event> {
    match source {
        glutin::Event::WindowEvent { event, .. } => from_window_event(&event, dpr),
        _ => None,
    }
}

fn from_window_event(source: &glutin::WindowEvent, dpr: f64) -> Option<Event> {
    match *source {
        glutin::WindowEvent::CloseRequested | glutin::WindowEvent::Destroyed => {
            Some(Event::Window(WindowEvent::Closed))
        }

        glutin::WindowEvent::Focused(v) => if v {
            Some(Event::Window(WindowEvent::GainFocus))
        } else {
            Some(Event::Window(WindowEvent::LostFocus))
        },

        glutin::WindowEvent::Resized(size) => {
            let size = size.to_physical(dpr);
            Some(Event::Window(WindowEvent::Resized(
                size.width as u32,
                size.height as u32,
            )))
        }

        glutin::WindowEvent::KeyboardInput {
            input:
                glutin::KeyboardInput {
                    state: glutin::ElementState::Pressed,
                    virtual_keycode: Some(key),
                    ..
                },
            ..
        } => from_virtual_key_code(key).map(Event::KeyPressed),

        glutin::WindowEvent::KeyboardInput {
            input:
                glutin::KeyboardInput {
                    state: glutin::ElementState::Released,
                    virtual_keycode: Some(key),
                    ..
                },
            ..
        } => from_virtual_key_code(key).map(Event::KeyReleased),

        _ => None,
    }
}

fn from_virtual_key_code(key: glutin::VirtualKeyCode) -> Option<Key> {
    match key {
        glutin::VirtualKeyCode::Space => Some(Key::Space),
        glutin::VirtualKeyCode::Back => Some(Key::Back),
        glutin::VirtualKeyCode::Return => Some(Key::Return),
        glutin::VirtualKeyCode::Escape => Some(Key::Escape),
        glutin::VirtualKeyCode::L => Some(Key::L),
        glutin::VirtualKeyCode::P => Some(Key::P),
        _ => None,
    }
}
