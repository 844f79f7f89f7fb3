//! Input interpretation: raw events, gestures and the intents they produce.

mod autofit;
mod click;
mod events;
mod fill;
mod gesture;
mod reorder;
mod state_machine;

pub use autofit::{ApproxTextMeasurer, TextMeasurer, auto_fit_width};
pub use click::ClickTracker;
pub use events::{
    CursorHint, Key, KeyEvent, KeyboardModifiers, MouseButton, PointerEvent, PointerKind,
    WheelEvent, WheelUnit,
};
pub use fill::{fill_target, tile_fill};
pub use gesture::{DragOverlay, GestureState};
pub use reorder::{column_spans, compute_reorder_target};
pub use state_machine::{GridIntent, InputContext, InputOutcome, InputStateMachine, wheel_delta};
