use bezel_core::{EnumConversionError, LandmarkId};
use bezel_graph::Vec2;
use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four independently scheduled timers of the navigation controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimerKind {
    Stop,
    Hover,
    Dimmer,
    Flight,
}

impl TimerKind {
    pub const ALL: [TimerKind; 4] = [
        TimerKind::Stop,
        TimerKind::Hover,
        TimerKind::Dimmer,
        TimerKind::Flight,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Keys the controller reacts to. Integer codes follow the DOM `keyCode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum Key {
    Escape = 27,
    Left = 37,
    Right = 39,
}

impl TryFrom<i32> for Key {
    type Error = EnumConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            27 => Ok(Key::Escape),
            37 => Ok(Key::Left),
            39 => Ok(Key::Right),
            _ => Err(EnumConversionError::InvalidKeyCode(value)),
        }
    }
}

/// Input delivered by the host event loop. Positions are display pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerMove { position: Vec2 },
    PointerLeave,
    ButtonPress { button: MouseButton, position: Vec2 },
    Wheel { position: Vec2, delta: f64 },
    KeyPress { key: Key },
    Timer { kind: TimerKind },
}

impl InputEvent {
    pub fn position(&self) -> Option<Vec2> {
        match self {
            InputEvent::PointerMove { position }
            | InputEvent::ButtonPress { position, .. }
            | InputEvent::Wheel { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Coarse controller state, as reported in notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NavPhase {
    #[default]
    Start,
    Stopped,
    Moving,
    Hovering,
    Flying,
}

impl fmt::Display for NavPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NavPhase::Start => "start",
            NavPhase::Stopped => "stopped",
            NavPhase::Moving => "moving",
            NavPhase::Hovering => "hovering",
            NavPhase::Flying => "flying",
        };
        f.write_str(name)
    }
}

/// Notifications published by the navigation controller for the host to render
/// or log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // State machine
    StateChanged {
        from: NavPhase,
        to: NavPhase,
    },

    // Hover feedback
    LabelShown {
        landmark: LandmarkId,
        label: String,
        position: Vec2,
    },
    LabelHidden,
    /// All proxy shapes of `landmark` are highlighted; `None` clears it.
    HighlightChanged {
        landmark: Option<LandmarkId>,
    },

    // Overlay
    ProxiesUpdated {
        count: usize,
    },
    /// Current bezel opacity and the factor applied to proxy alphas.
    OpacityChanged {
        bezel: f32,
        proxy_factor: f32,
    },

    // Flight
    /// Draw the flight path; hosts render unconnected paths dashed.
    FlightPathHighlighted {
        points: Vec<Vec2>,
        connected: bool,
    },
    FlightPathCleared,
    FlightStarted {
        landmark: LandmarkId,
        points: usize,
        connected: bool,
    },
    FlightCompleted,
    FlightCancelled,
    CameraMoved {
        x: f64,
        y: f64,
        zoom: f64,
    },
    HistoryMoved {
        index: usize,
        len: usize,
    },

    /// A skipped operation (missing flight map, zero-size viewport, ...).
    Diagnostic {
        message: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn publish(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event bus has no receivers");
        }
    }

    /// Take every pending event without blocking.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }

    /// Dispatch all pending events to a listener.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }
}

/// Trait for components that respond to navigation notifications.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}
