//! Automatic window-overlap arbitration.
//!
//! When a window becomes active, every window it covers is minimized. When a
//! window the engine minimized is no longer covered by anything visible, it
//! is restored. If that leaves nothing meaningful focused, the most recently
//! active eligible window is activated again.
//!
//! The engine never talks to a window manager directly: a [`Host`] exposes
//! the live window set and accepts [`Directive`]s, and an [`EventAdapter`]
//! feeds host notifications through the [`PolicyEngine`].

pub mod adapter;
pub mod config;
pub mod constants;
pub mod event;
pub mod geometry;
pub mod host;
pub mod policy;
pub mod sim;
pub mod tracing_sub;
pub mod window;

pub use adapter::EventAdapter;
pub use config::{AppClassList, Config, ConfigError, RoleFilter};
pub use event::{Directive, EventSource, WmEvent};
pub use geometry::{WindowRect, rect_overlap};
pub use host::{Host, HostId, LiveSet, Scope, WindowSnapshot};
pub use policy::{PolicyEngine, RecencyStack};
pub use window::{Desktop, Window, WindowKind};
