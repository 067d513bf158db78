/// The status of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// The window has been closed.
    Closed,
    /// The window gained focus of user input.
    GainFocus,
    /// The window lost focus of user input.
    LostFocus,
    /// The size in pixels of the window has changed.
    Resized(u32, u32),
}

/// The keys the demo reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    Back,
    Return,
    Escape,
    L,
    P,
}

/// The enumerations of all events that come from the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Window(WindowEvent),
    KeyPressed(Key),
    KeyReleased(Key),
}
