use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::WindowRect;

/// Virtual desktop placement of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Desktop {
    All,
    Number(u32),
}

impl Desktop {
    pub fn contains(self, desktop: u32) -> bool {
        match self {
            Desktop::All => true,
            Desktop::Number(n) => n == desktop,
        }
    }
}

/// Classification flags reported by the host. Several may be set at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowKind {
    pub normal: bool,
    pub desktop: bool,
    pub dock: bool,
    pub on_screen_display: bool,
    pub notification: bool,
    pub critical_notification: bool,
    pub dnd_icon: bool,
    pub tooltip: bool,
}

impl WindowKind {
    pub fn normal() -> Self {
        Self {
            normal: true,
            ..Self::default()
        }
    }

    /// Desktop backgrounds, panels and transient shell surfaces. These never
    /// take part in occlusion and are never candidates for reactivation.
    pub fn is_special(&self) -> bool {
        self.desktop
            || self.dock
            || self.dnd_icon
            || self.tooltip
            || self.on_screen_display
            || self.notification
            || self.critical_notification
    }
}

/// Capability interface over a host-owned window.
///
/// Identity is carried by [`Window::Id`]; two handles denote the same window
/// iff their ids compare equal, regardless of the other attributes.
pub trait Window {
    type Id: Copy + Eq + Ord + fmt::Debug;

    fn id(&self) -> Self::Id;
    fn geometry(&self) -> WindowRect;
    fn kind(&self) -> WindowKind;
    fn transient_for(&self) -> Option<Self::Id>;
    fn desktop(&self) -> Desktop;
    /// Activities the window belongs to. Empty means all activities.
    fn activities(&self) -> &[String];
    fn screen(&self) -> usize;
    /// Lowercased application class (the resource class on X11).
    fn application_class(&self) -> &str;
    /// Resource name (X11 `WM_CLASS` instance or app id).
    fn application_name(&self) -> &str;
    fn caption(&self) -> &str;
    fn is_minimized(&self) -> bool;
    fn is_minimizable(&self) -> bool;
    fn is_being_moved(&self) -> bool;
    fn is_being_resized(&self) -> bool;

    fn is_transient(&self) -> bool {
        self.transient_for().is_some()
    }

    fn on_all_activities(&self) -> bool {
        self.activities().is_empty()
    }

    fn in_move_resize(&self) -> bool {
        self.is_being_moved() || self.is_being_resized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_contains() {
        assert!(Desktop::All.contains(7));
        assert!(Desktop::Number(2).contains(2));
        assert!(!Desktop::Number(2).contains(3));
    }

    #[test]
    fn special_kinds() {
        assert!(!WindowKind::normal().is_special());
        assert!(!WindowKind::default().is_special());
        let dock = WindowKind {
            dock: true,
            ..WindowKind::default()
        };
        assert!(dock.is_special());
        let critical = WindowKind {
            critical_notification: true,
            ..WindowKind::default()
        };
        assert!(critical.is_special());
    }
}
