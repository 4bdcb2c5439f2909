#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! This module defines the standard event types used throughout ftui for
//! input handling. All events derive `Clone`, `PartialEq`, and `Eq` for
//! use in tests and pattern matching.
//!
//! # Design Notes
//!
//! - Mouse coordinates are 0-indexed (terminal is 1-indexed internally)
//! - `KeyEventKind` defaults to `Press` when not available from the terminal
//! - `Modifiers` use bitflags for easy combination
//! - Clipboard events are optional and feature-gated in the future

use bitflags::bitflags;
#[cfg(not(target_arch = "wasm32"))]
use crossterm::event as cte;

/// Canonical input event.
///
/// This enum represents all possible input events that ftui can receive
/// from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A mouse event.
    Mouse(MouseEvent),

    /// Terminal was resized.
    Resize {
        /// New terminal width in columns.
        width: u16,
        /// New terminal height in rows.
        height: u16,
    },

    /// Paste event (from bracketed paste mode).
    Paste(PasteEvent),

    /// Focus gained or lost.
    ///
    /// `true` = focus gained, `false` = focus lost.
    Focus(bool),

    /// Clipboard content received (optional, from OSC 52 response).
    Clipboard(ClipboardEvent),

    /// A tick event from the runtime.
    ///
    /// Fired when a scheduled tick interval elapses. Applications use this
    /// for periodic updates (animations, polling, timers). The model's `update`
    /// method receives the tick and can respond with state changes.
    Tick,

    /// An application-defined event injected directly into the event queue,
    /// bypassing terminal-input parsing entirely (e.g. from a background
    /// task). Broadcast the same way `Resize`/`Focus`/`Tick` are, since it
    /// has no meaningful screen position.
    Custom(String),
}

impl Event {
    /// Convert a Crossterm event into an ftui [`Event`].
    #[must_use]
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_crossterm(event: cte::Event) -> Option<Self> {
        map_crossterm_event_internal(event)
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt modifier is held.
    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Check if Super/Meta/Cmd modifier is held.
    #[must_use]
    pub const fn super_key(&self) -> bool {
        self.modifiers.contains(Modifiers::SUPER)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),

    /// Enter/Return key.
    Enter,

    /// Escape key.
    Escape,

    /// Backspace key.
    Backspace,

    /// Tab key.
    Tab,

    /// Shift+Tab (back-tab).
    BackTab,

    /// Delete key.
    Delete,

    /// Insert key.
    Insert,

    /// Home key.
    Home,

    /// End key.
    End,

    /// Page Up key.
    PageUp,

    /// Page Down key.
    PageDown,

    /// Up arrow key.
    Up,

    /// Down arrow key.
    Down,

    /// Left arrow key.
    Left,

    /// Right arrow key.
    Right,

    /// Function key (F1-F24).
    F(u8),

    /// Null character (Ctrl+Space or Ctrl+@).
    Null,

    /// Media key: Play/Pause.
    MediaPlayPause,

    /// Media key: Stop.
    MediaStop,

    /// Media key: Next track.
    MediaNextTrack,

    /// Media key: Previous track.
    MediaPrevTrack,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// The type of mouse event.
    pub kind: MouseEventKind,

    /// X coordinate (0-indexed, leftmost column is 0).
    pub x: u16,

    /// Y coordinate (0-indexed, topmost row is 0).
    pub y: u16,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Create a new mouse event.
    #[must_use]
    pub const fn new(kind: MouseEventKind, x: u16, y: u16) -> Self {
        Self {
            kind,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a mouse event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Get the position as a tuple.
    #[must_use]
    pub const fn position(&self) -> (u16, u16) {
        (self.x, self.y)
    }
}

/// The type of mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Mouse button pressed down.
    Down(MouseButton),

    /// Mouse button released.
    Up(MouseButton),

    /// Mouse dragged while button held.
    Drag(MouseButton),

    /// Mouse moved (no button pressed).
    Moved,

    /// Mouse wheel scrolled up.
    ScrollUp,

    /// Mouse wheel scrolled down.
    ScrollDown,

    /// Mouse wheel scrolled left (horizontal scroll).
    ScrollLeft,

    /// Mouse wheel scrolled right (horizontal scroll).
    ScrollRight,
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button.
    Left,

    /// Right mouse button.
    Right,

    /// Middle mouse button (scroll wheel click).
    Middle,
}

/// A paste event from bracketed paste mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    /// The pasted text content.
    pub text: String,

    /// True if this came from bracketed paste mode.
    ///
    /// When true, the text was received atomically and should be
    /// treated as a single paste operation rather than individual
    /// key presses.
    pub bracketed: bool,
}

impl PasteEvent {
    /// Create a new paste event.
    #[must_use]
    pub fn new(text: impl Into<String>, bracketed: bool) -> Self {
        Self {
            text: text.into(),
            bracketed,
        }
    }

    /// Create a bracketed paste event (the common case).
    #[must_use]
    pub fn bracketed(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }
}

/// A clipboard event from OSC 52 response.
///
/// This is optional and may not be supported by all terminals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardEvent {
    /// The clipboard content (decoded from base64).
    pub content: String,

    /// The source of the clipboard content.
    pub source: ClipboardSource,
}

impl ClipboardEvent {
    /// Create a new clipboard event.
    #[must_use]
    pub fn new(content: impl Into<String>, source: ClipboardSource) -> Self {
        Self {
            content: content.into(),
            source,
        }
    }
}

/// The source of clipboard content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClipboardSource {
    /// Clipboard content from OSC 52 protocol.
    Osc52,

    /// Unknown or unspecified source.
    #[default]
    Unknown,
}

#[cfg(not(target_arch = "wasm32"))]
fn map_crossterm_event_internal(event: cte::Event) -> Option<Event> {
    match event {
        cte::Event::Key(key) => map_key_event(key).map(Event::Key),
        cte::Event::Mouse(mouse) => Some(Event::Mouse(map_mouse_event(mouse))),
        cte::Event::Resize(width, height) => Some(Event::Resize { width, height }),
        cte::Event::Paste(text) => Some(Event::Paste(PasteEvent::bracketed(text))),
        cte::Event::FocusGained => Some(Event::Focus(true)),
        cte::Event::FocusLost => Some(Event::Focus(false)),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn map_key_event(event: cte::KeyEvent) -> Option<KeyEvent> {
    let code = map_key_code(event.code)?;
    let modifiers = map_modifiers(event.modifiers);
    let kind = map_key_kind(event.kind);
    Some(KeyEvent {
        code,
        modifiers,
        kind,
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn map_key_kind(kind: cte::KeyEventKind) -> KeyEventKind {
    match kind {
        cte::KeyEventKind::Press => KeyEventKind::Press,
        cte::KeyEventKind::Repeat => KeyEventKind::Repeat,
        cte::KeyEventKind::Release => KeyEventKind::Release,
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn map_key_code(code: cte::KeyCode) -> Option<KeyCode> {
    match code {
        cte::KeyCode::Backspace => Some(KeyCode::Backspace),
        cte::KeyCode::Enter => Some(KeyCode::Enter),
        cte::KeyCode::Left => Some(KeyCode::Left),
        cte::KeyCode::Right => Some(KeyCode::Right),
        cte::KeyCode::Up => Some(KeyCode::Up),
        cte::KeyCode::Down => Some(KeyCode::Down),
        cte::KeyCode::Home => Some(KeyCode::Home),
        cte::KeyCode::End => Some(KeyCode::End),
        cte::KeyCode::PageUp => Some(KeyCode::PageUp),
        cte::KeyCode::PageDown => Some(KeyCode::PageDown),
        cte::KeyCode::Tab => Some(KeyCode::Tab),
        cte::KeyCode::BackTab => Some(KeyCode::BackTab),
        cte::KeyCode::Delete => Some(KeyCode::Delete),
        cte::KeyCode::Insert => Some(KeyCode::Insert),
        cte::KeyCode::F(n) => Some(KeyCode::F(n)),
        cte::KeyCode::Char(c) => Some(KeyCode::Char(c)),
        cte::KeyCode::Null => Some(KeyCode::Null),
        cte::KeyCode::Esc => Some(KeyCode::Escape),
        cte::KeyCode::Media(media) => map_media_key(media),
        _ => None,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn map_media_key(code: cte::MediaKeyCode) -> Option<KeyCode> {
    match code {
        cte::MediaKeyCode::Play | cte::MediaKeyCode::Pause | cte::MediaKeyCode::PlayPause => {
            Some(KeyCode::MediaPlayPause)
        }
        cte::MediaKeyCode::Stop => Some(KeyCode::MediaStop),
        cte::MediaKeyCode::TrackNext => Some(KeyCode::MediaNextTrack),
        cte::MediaKeyCode::TrackPrevious => Some(KeyCode::MediaPrevTrack),
        _ => None,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn map_modifiers(modifiers: cte::KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(cte::KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(cte::KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(cte::KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.contains(cte::KeyModifiers::SUPER)
        || modifiers.contains(cte::KeyModifiers::HYPER)
        || modifiers.contains(cte::KeyModifiers::META)
    {
        mapped |= Modifiers::SUPER;
    }
    mapped
}

#[cfg(not(target_arch = "wasm32"))]
fn map_mouse_event(event: cte::MouseEvent) -> MouseEvent {
    let kind = match event.kind {
        cte::MouseEventKind::Down(button) => MouseEventKind::Down(map_mouse_button(button)),
        cte::MouseEventKind::Up(button) => MouseEventKind::Up(map_mouse_button(button)),
        cte::MouseEventKind::Drag(button) => MouseEventKind::Drag(map_mouse_button(button)),
        cte::MouseEventKind::Moved => MouseEventKind::Moved,
        cte::MouseEventKind::ScrollUp => MouseEventKind::ScrollUp,
        cte::MouseEventKind::ScrollDown => MouseEventKind::ScrollDown,
        cte::MouseEventKind::ScrollLeft => MouseEventKind::ScrollLeft,
        cte::MouseEventKind::ScrollRight => MouseEventKind::ScrollRight,
    };

    MouseEvent::new(kind, event.column, event.row).with_modifiers(map_modifiers(event.modifiers))
}

#[cfg(not(target_arch = "wasm32"))]
fn map_mouse_button(button: cte::MouseButton) -> MouseButton {
    match button {
        cte::MouseButton::Left => MouseButton::Left,
        cte::MouseButton::Right => MouseButton::Right,
        cte::MouseButton::Middle => MouseButton::Middle,
    }
}
