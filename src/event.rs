use std::fmt;

/// Host notifications, translated by the event adapter into one enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmEvent<Id> {
    WindowAdded(Id),
    WindowRemoved(Id),
    Activated(Id),
    Minimized(Id),
    /// The window was shown again after being minimized.
    Unminimized(Id),
    /// Move, resize, maximize, fullscreen, screen, desktop or activity change.
    Geometrized(Id),
    /// Workspace-wide change: screen count or size, virtual desktop geometry,
    /// desktop or activity switch.
    Relayouted,
    MoveResizeStarted(Id),
    MoveResizeFinished(Id),
}

impl<Id: Copy> WmEvent<Id> {
    pub fn window(&self) -> Option<Id> {
        match *self {
            WmEvent::WindowAdded(id)
            | WmEvent::WindowRemoved(id)
            | WmEvent::Activated(id)
            | WmEvent::Minimized(id)
            | WmEvent::Unminimized(id)
            | WmEvent::Geometrized(id)
            | WmEvent::MoveResizeStarted(id)
            | WmEvent::MoveResizeFinished(id) => Some(id),
            WmEvent::Relayouted => None,
        }
    }
}

/// State change the engine asks the host to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<Id> {
    Minimize(Id),
    Restore(Id),
    Activate(Id),
}

impl<Id: Copy> Directive<Id> {
    pub fn window(&self) -> Id {
        match *self {
            Directive::Minimize(id) | Directive::Restore(id) | Directive::Activate(id) => id,
        }
    }
}

impl<Id: fmt::Debug> fmt::Display for Directive<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Minimize(id) => write!(f, "minimize {:?}", id),
            Directive::Restore(id) => write!(f, "restore {:?}", id),
            Directive::Activate(id) => write!(f, "activate {:?}", id),
        }
    }
}

/// Serialized queue of host notifications.
///
/// Hosts that deliver events from several sources must funnel them through
/// one source so the engine sees them one at a time.
pub trait EventSource<Id> {
    fn next_event(&mut self) -> Option<WmEvent<Id>>;
}

impl<Id, T: EventSource<Id> + ?Sized> EventSource<Id> for &mut T {
    fn next_event(&mut self) -> Option<WmEvent<Id>> {
        (**self).next_event()
    }
}
