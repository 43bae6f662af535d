//! Interactive off-screen landmark navigation: the controller state machine,
//! its flight history, settings and the host-side seams (camera and timers).

pub mod controller;
pub mod history;
pub mod host;
pub mod settings;
pub mod timers;

pub use controller::{Flight, Model, NavState, NavigationController};
pub use history::{DEFAULT_HISTORY_LENGTH, FlightHistory, MAX_HISTORY_LENGTH};
pub use host::ViewportHost;
pub use settings::NavigatorSettings;
pub use timers::{ManualTimers, TimerHost};
