//! Raw input events delivered by the host surface.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held (Option on macOS).
    pub alt: bool,
    /// The Meta key is held (Cmd on macOS).
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Meta modifier only.
    pub const META: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: true,
    };

    /// Control + Shift modifiers.
    pub const CTRL_SHIFT: Self = Self {
        shift: true,
        control: true,
        alt: false,
        meta: false,
    };

    /// Control or Meta: the platform "command" modifier.
    pub fn command(&self) -> bool {
        self.control || self.meta
    }

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum MouseButton {
    /// Primary button (usually left).
    #[default]
    Left = 0,
    /// Secondary button (usually right).
    Right = 1,
    /// Middle button.
    Middle = 2,
}

/// Kind of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    Press,
    Move,
    Release,
    /// A double-click delivered by the host. Ignored when it duplicates one
    /// the grid already detected from two presses.
    DoubleClick,
    /// A context menu request (right-click or the platform menu key).
    ContextMenu,
    /// The pointer left the surface.
    Leave,
}

/// A pointer event in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Point,
    #[serde(default)]
    pub button: MouseButton,
    #[serde(default)]
    pub modifiers: KeyboardModifiers,
    /// Monotonic timestamp in milliseconds.
    pub timestamp_ms: f64,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f32, y: f32, timestamp_ms: f64) -> Self {
        Self {
            kind,
            position: Point::new(x, y),
            button: MouseButton::Left,
            modifiers: KeyboardModifiers::NONE,
            timestamp_ms,
        }
    }

    pub fn press(x: f32, y: f32, timestamp_ms: f64) -> Self {
        Self::new(PointerKind::Press, x, y, timestamp_ms)
    }

    pub fn moved(x: f32, y: f32, timestamp_ms: f64) -> Self {
        Self::new(PointerKind::Move, x, y, timestamp_ms)
    }

    pub fn release(x: f32, y: f32, timestamp_ms: f64) -> Self {
        Self::new(PointerKind::Release, x, y, timestamp_ms)
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: KeyboardModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Unit of a wheel delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelUnit {
    #[default]
    Pixel,
    Line,
}

/// A scroll wheel or trackpad event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub delta_x: f32,
    pub delta_y: f32,
    #[serde(default)]
    pub unit: WheelUnit,
    #[serde(default)]
    pub modifiers: KeyboardModifiers,
}

impl WheelEvent {
    pub fn pixels(delta_x: f32, delta_y: f32) -> Self {
        Self {
            delta_x,
            delta_y,
            unit: WheelUnit::Pixel,
            modifiers: KeyboardModifiers::NONE,
        }
    }
}

/// Keys the grid reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
    Tab,
    Enter,
    F2,
    Escape,
    Delete,
    Backspace,
    /// A printable character (letters are matched case-insensitively for
    /// shortcuts).
    Char(char),
    /// Anything else.
    Other,
}

/// A key press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub modifiers: KeyboardModifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: KeyboardModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether this is `command`+`letter` (control or meta).
    pub fn is_shortcut(&self, letter: char) -> bool {
        self.modifiers.command()
            && matches!(self.key, Key::Char(c) if c.eq_ignore_ascii_case(&letter))
    }
}

/// Pointer cursor the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorHint {
    #[default]
    Default,
    /// Over a column edge.
    ColumnResize,
    /// Over something draggable.
    Grab,
    /// While dragging.
    Grabbing,
    /// Over the fill handle.
    Crosshair,
    /// Over a cell-type action.
    Pointer,
}
