//! Host window manager contract and the per-event view of its window set.

use std::collections::BTreeMap;

use crate::geometry::WindowRect;
use crate::window::{Desktop, Window, WindowKind};

pub type HostId<H> = <<H as Host>::Window as Window>::Id;

/// The host window manager as seen by the policy engine.
///
/// The host owns every window. The engine reads the live set and ambient
/// state, and only writes through [`Host::set_minimized`] and
/// [`Host::set_active`]. Applying either is expected to produce the matching
/// notification (`Minimized`, `Unminimized`, `Activated`) on the host's
/// event source.
pub trait Host {
    type Window: Window;

    /// Live windows in the host's natural enumeration order.
    fn windows(&self) -> Vec<&Self::Window>;
    fn current_desktop(&self) -> u32;
    /// `None` when the host has no notion of activities.
    fn current_activity(&self) -> Option<&str>;
    fn current_screen(&self) -> usize;
    fn screen_geometry(&self, screen: usize) -> Option<WindowRect>;
    fn active_window(&self) -> Option<<Self::Window as Window>::Id>;
    fn set_minimized(&mut self, id: <Self::Window as Window>::Id, minimized: bool);
    fn set_active(&mut self, id: <Self::Window as Window>::Id);
}

/// Ambient placement the eligibility rules are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub desktop: u32,
    pub activity: Option<String>,
    pub screen: usize,
    screens: BTreeMap<usize, WindowRect>,
}

impl Scope {
    pub fn new(desktop: u32, activity: Option<&str>, screen: usize) -> Self {
        Self {
            desktop,
            activity: activity.map(str::to_owned),
            screen,
            screens: BTreeMap::new(),
        }
    }

    pub fn with_screen(mut self, screen: usize, area: WindowRect) -> Self {
        self.screens.insert(screen, area);
        self
    }

    pub fn screen_area(&self, screen: usize) -> Option<WindowRect> {
        self.screens.get(&screen).copied()
    }

    pub fn on_current_desktop<W: Window>(&self, window: &W) -> bool {
        window.desktop().contains(self.desktop)
    }

    pub fn on_current_activity<W: Window>(&self, window: &W) -> bool {
        match &self.activity {
            None => true,
            Some(current) => {
                window.on_all_activities() || window.activities().iter().any(|a| a == current)
            }
        }
    }

    /// On the current desktop and the current activity.
    pub fn contains<W: Window>(&self, window: &W) -> bool {
        self.on_current_desktop(window) && self.on_current_activity(window)
    }
}

/// Owned copy of one window's attributes, taken at the start of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot<Id> {
    pub id: Id,
    pub geometry: WindowRect,
    pub kind: WindowKind,
    pub transient_for: Option<Id>,
    pub desktop: Desktop,
    pub activities: Vec<String>,
    pub screen: usize,
    pub application_class: String,
    pub application_name: String,
    pub caption: String,
    pub minimized: bool,
    pub minimizable: bool,
    pub moving: bool,
    pub resizing: bool,
}

impl<Id: Copy + Eq + Ord + std::fmt::Debug> WindowSnapshot<Id> {
    pub fn capture<W: Window<Id = Id>>(window: &W) -> Self {
        Self {
            id: window.id(),
            geometry: window.geometry(),
            kind: window.kind(),
            transient_for: window.transient_for(),
            desktop: window.desktop(),
            activities: window.activities().to_vec(),
            screen: window.screen(),
            application_class: window.application_class().to_lowercase(),
            application_name: window.application_name().to_owned(),
            caption: window.caption().to_owned(),
            minimized: window.is_minimized(),
            minimizable: window.is_minimizable(),
            moving: window.is_being_moved(),
            resizing: window.is_being_resized(),
        }
    }
}

impl<Id: Copy + Eq + Ord + std::fmt::Debug> Window for WindowSnapshot<Id> {
    type Id = Id;

    fn id(&self) -> Id {
        self.id
    }

    fn geometry(&self) -> WindowRect {
        self.geometry
    }

    fn kind(&self) -> WindowKind {
        self.kind
    }

    fn transient_for(&self) -> Option<Id> {
        self.transient_for
    }

    fn desktop(&self) -> Desktop {
        self.desktop
    }

    fn activities(&self) -> &[String] {
        &self.activities
    }

    fn screen(&self) -> usize {
        self.screen
    }

    fn application_class(&self) -> &str {
        &self.application_class
    }

    fn application_name(&self) -> &str {
        &self.application_name
    }

    fn caption(&self) -> &str {
        &self.caption
    }

    fn is_minimized(&self) -> bool {
        self.minimized
    }

    fn is_minimizable(&self) -> bool {
        self.minimizable
    }

    fn is_being_moved(&self) -> bool {
        self.moving
    }

    fn is_being_resized(&self) -> bool {
        self.resizing
    }
}

/// The reconciled live window set every pass of one event works on.
///
/// Directives issued during the event are mirrored into the snapshot so
/// later passes observe them before the host has applied anything.
#[derive(Debug, Clone)]
pub struct LiveSet<Id> {
    windows: Vec<WindowSnapshot<Id>>,
    scope: Scope,
    active: Option<Id>,
}

impl<Id: Copy + Eq + Ord + std::fmt::Debug> LiveSet<Id> {
    /// Snapshot the host. `departed` is left out even if the host still
    /// enumerates it, which happens while a removal is being delivered.
    pub fn capture<H>(host: &H, departed: Option<Id>) -> Self
    where
        H: Host,
        H::Window: Window<Id = Id>,
    {
        let windows: Vec<WindowSnapshot<Id>> = host
            .windows()
            .into_iter()
            .filter(|window| Some(window.id()) != departed)
            .map(WindowSnapshot::capture)
            .collect();

        let mut scope = Scope::new(
            host.current_desktop(),
            host.current_activity(),
            host.current_screen(),
        );
        let screens = windows
            .iter()
            .map(|window| window.screen)
            .chain(std::iter::once(scope.screen));
        for screen in screens {
            if scope.screen_area(screen).is_none()
                && let Some(area) = host.screen_geometry(screen)
            {
                scope = scope.with_screen(screen, area);
            }
        }

        let active = host.active_window().filter(|id| Some(*id) != departed);
        Self::from_parts(windows, scope, active)
    }

    pub fn from_parts(windows: Vec<WindowSnapshot<Id>>, scope: Scope, active: Option<Id>) -> Self {
        Self {
            windows,
            scope,
            active,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn active(&self) -> Option<Id> {
        self.active
    }

    pub fn get(&self, id: Id) -> Option<&WindowSnapshot<Id>> {
        self.windows.iter().find(|window| window.id == id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WindowSnapshot<Id>> {
        self.windows.iter()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn set_minimized(&mut self, id: Id, minimized: bool) {
        if let Some(window) = self.windows.iter_mut().find(|window| window.id == id) {
            window.minimized = minimized;
        }
        if minimized && self.active == Some(id) {
            self.active = None;
        }
    }

    pub fn set_active(&mut self, id: Id) {
        self.active = Some(id);
    }
}
