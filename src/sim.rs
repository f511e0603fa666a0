//! Deterministic in-memory host.
//!
//! [`SimHost`] behaves like a small stacking window manager: user actions
//! mutate its state and queue the notifications a real compositor would
//! send, and directives applied by the engine queue their echoes the same
//! way. [`Scenario`] is the JSON form used by `tiles-replay`.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::event::{Directive, EventSource, WmEvent};
use crate::geometry::WindowRect;
use crate::host::Host;
use crate::window::{Desktop, Window, WindowKind};

pub type SimId = u32;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("scenario is not valid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("scenario refers to unknown window {0}")]
    UnknownWindow(SimId),
    #[error("scenario opens window {0} twice")]
    DuplicateWindow(SimId),
}

fn default_desktop() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimWindow {
    pub id: SimId,
    #[serde(default)]
    pub caption: String,
    #[serde(default, rename = "class")]
    pub application_class: String,
    #[serde(default, rename = "name")]
    pub application_name: String,
    #[serde(flatten)]
    pub geometry: WindowRect,
    #[serde(default = "WindowKind::normal")]
    pub kind: WindowKind,
    #[serde(default)]
    pub transient_for: Option<SimId>,
    #[serde(default = "default_desktop")]
    pub desktop: u32,
    #[serde(default)]
    pub on_all_desktops: bool,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub screen: usize,
    #[serde(default)]
    pub minimized: bool,
    #[serde(default = "default_true")]
    pub minimizable: bool,
    #[serde(skip)]
    moving: bool,
    #[serde(skip)]
    resizing: bool,
}

impl SimWindow {
    pub fn new(id: SimId, class: &str, geometry: WindowRect) -> Self {
        Self {
            id,
            caption: format!("{class} #{id}"),
            application_class: class.to_lowercase(),
            application_name: class.to_owned(),
            geometry,
            kind: WindowKind::normal(),
            transient_for: None,
            desktop: default_desktop(),
            on_all_desktops: false,
            activities: Vec::new(),
            screen: 0,
            minimized: false,
            minimizable: true,
            moving: false,
            resizing: false,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.application_name = name.to_owned();
        self
    }

    pub fn with_kind(mut self, kind: WindowKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn transient_for(mut self, parent: SimId) -> Self {
        self.transient_for = Some(parent);
        self
    }

    pub fn on_desktop(mut self, desktop: u32) -> Self {
        self.desktop = desktop;
        self
    }

    pub fn on_all_desktops(mut self) -> Self {
        self.on_all_desktops = true;
        self
    }

    pub fn in_activities(mut self, activities: &[&str]) -> Self {
        self.activities = activities.iter().map(|a| (*a).to_owned()).collect();
        self
    }

    pub fn on_screen(mut self, screen: usize) -> Self {
        self.screen = screen;
        self
    }

    pub fn minimized(mut self) -> Self {
        self.minimized = true;
        self
    }

    pub fn unminimizable(mut self) -> Self {
        self.minimizable = false;
        self
    }
}

impl Window for SimWindow {
    type Id = SimId;

    fn id(&self) -> SimId {
        self.id
    }

    fn geometry(&self) -> WindowRect {
        self.geometry
    }

    fn kind(&self) -> WindowKind {
        self.kind
    }

    fn transient_for(&self) -> Option<SimId> {
        self.transient_for
    }

    fn desktop(&self) -> Desktop {
        if self.on_all_desktops {
            Desktop::All
        } else {
            Desktop::Number(self.desktop)
        }
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

/// In-memory stacking window manager. `windows` is kept bottom to top.
#[derive(Debug, Clone)]
pub struct SimHost {
    windows: Vec<SimWindow>,
    desktop: u32,
    activity: Option<String>,
    screen: usize,
    screens: Vec<WindowRect>,
    active: Option<SimId>,
    queue: VecDeque<WmEvent<SimId>>,
    journal: Vec<Directive<SimId>>,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new(vec![WindowRect::new(0, 0, 1920, 1080)])
    }
}

impl SimHost {
    pub fn new(screens: Vec<WindowRect>) -> Self {
        Self {
            windows: Vec::new(),
            desktop: default_desktop(),
            activity: None,
            screen: 0,
            screens,
            active: None,
            queue: VecDeque::new(),
            journal: Vec::new(),
        }
    }

    pub fn with_activity(mut self, activity: &str) -> Self {
        self.activity = Some(activity.to_owned());
        self
    }

    /// Place a window without notifying anyone, as if it existed before the
    /// engine started.
    pub fn insert(&mut self, window: SimWindow) {
        self.windows.push(window);
    }

    pub fn window(&self, id: SimId) -> Option<&SimWindow> {
        self.windows.iter().find(|window| window.id == id)
    }

    fn window_mut(&mut self, id: SimId) -> Result<&mut SimWindow, ScenarioError> {
        self.windows
            .iter_mut()
            .find(|window| window.id == id)
            .ok_or(ScenarioError::UnknownWindow(id))
    }

    pub fn is_minimized(&self, id: SimId) -> bool {
        self.window(id).is_some_and(|window| window.minimized)
    }

    pub fn active(&self) -> Option<SimId> {
        self.active
    }

    pub fn desktop(&self) -> u32 {
        self.desktop
    }

    pub fn all_windows(&self) -> &[SimWindow] {
        &self.windows
    }

    /// Directives applied so far, in order.
    pub fn journal(&self) -> &[Directive<SimId>] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<Directive<SimId>> {
        std::mem::take(&mut self.journal)
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    fn raise(&mut self, id: SimId) {
        if let Some(pos) = self.windows.iter().position(|window| window.id == id) {
            let window = self.windows.remove(pos);
            self.windows.push(window);
        }
    }

    fn focus(&mut self, id: SimId) {
        if self.active != Some(id) {
            self.active = Some(id);
            self.raise(id);
            self.queue.push_back(WmEvent::Activated(id));
        }
    }

    fn change_minimized(&mut self, id: SimId, minimized: bool) -> Result<(), ScenarioError> {
        let window = self.window_mut(id)?;
        if window.minimized == minimized {
            return Ok(());
        }
        window.minimized = minimized;
        if minimized {
            if self.active == Some(id) {
                self.active = None;
            }
            self.queue.push_back(WmEvent::Minimized(id));
        } else {
            self.queue.push_back(WmEvent::Unminimized(id));
        }
        Ok(())
    }

    /// A new window appears and, unless it is a shell surface, takes focus.
    pub fn open(&mut self, window: SimWindow) -> Result<(), ScenarioError> {
        if self.window(window.id).is_some() {
            return Err(ScenarioError::DuplicateWindow(window.id));
        }
        let id = window.id;
        let focusable = !window.kind.is_special() && !window.minimized;
        self.windows.push(window);
        self.queue.push_back(WmEvent::WindowAdded(id));
        if focusable {
            self.focus(id);
        }
        Ok(())
    }

    pub fn close(&mut self, id: SimId) -> Result<(), ScenarioError> {
        let pos = self
            .windows
            .iter()
            .position(|window| window.id == id)
            .ok_or(ScenarioError::UnknownWindow(id))?;
        self.windows.remove(pos);
        if self.active == Some(id) {
            self.active = None;
        }
        self.queue.push_back(WmEvent::WindowRemoved(id));
        Ok(())
    }

    /// User click or task switcher: show the window if needed and focus it.
    pub fn activate(&mut self, id: SimId) -> Result<(), ScenarioError> {
        self.change_minimized(id, false)?;
        self.focus(id);
        Ok(())
    }

    pub fn minimize(&mut self, id: SimId) -> Result<(), ScenarioError> {
        self.change_minimized(id, true)
    }

    pub fn unminimize(&mut self, id: SimId) -> Result<(), ScenarioError> {
        self.change_minimized(id, false)
    }

    /// Interactive move: start, geometry change, finish.
    pub fn move_to(&mut self, id: SimId, x: i32, y: i32) -> Result<(), ScenarioError> {
        let window = self.window_mut(id)?;
        window.geometry.x = x;
        window.geometry.y = y;
        self.queue.extend([
            WmEvent::MoveResizeStarted(id),
            WmEvent::Geometrized(id),
            WmEvent::MoveResizeFinished(id),
        ]);
        Ok(())
    }

    pub fn resize(&mut self, id: SimId, width: u32, height: u32) -> Result<(), ScenarioError> {
        let window = self.window_mut(id)?;
        window.geometry.width = width;
        window.geometry.height = height;
        self.queue.extend([
            WmEvent::MoveResizeStarted(id),
            WmEvent::Geometrized(id),
            WmEvent::MoveResizeFinished(id),
        ]);
        Ok(())
    }

    /// Programmatic geometry change (maximize, snap), no interactive phase.
    pub fn set_geometry(&mut self, id: SimId, geometry: WindowRect) -> Result<(), ScenarioError> {
        self.window_mut(id)?.geometry = geometry;
        self.queue.push_back(WmEvent::Geometrized(id));
        Ok(())
    }

    /// Flag a window as mid-move without finishing, for gate tests.
    pub fn begin_move(&mut self, id: SimId) -> Result<(), ScenarioError> {
        self.window_mut(id)?.moving = true;
        self.queue.push_back(WmEvent::MoveResizeStarted(id));
        Ok(())
    }

    pub fn finish_move(&mut self, id: SimId) -> Result<(), ScenarioError> {
        self.window_mut(id)?.moving = false;
        self.queue.push_back(WmEvent::MoveResizeFinished(id));
        Ok(())
    }

    pub fn send_to_desktop(&mut self, id: SimId, desktop: u32) -> Result<(), ScenarioError> {
        self.window_mut(id)?.desktop = desktop;
        self.queue.push_back(WmEvent::Geometrized(id));
        Ok(())
    }

    pub fn switch_desktop(&mut self, desktop: u32) {
        self.desktop = desktop;
        self.drop_focus_if_hidden();
        self.queue.push_back(WmEvent::Relayouted);
    }

    pub fn switch_activity(&mut self, activity: &str) {
        self.activity = Some(activity.to_owned());
        self.drop_focus_if_hidden();
        self.queue.push_back(WmEvent::Relayouted);
    }

    fn drop_focus_if_hidden(&mut self) {
        let Some(active) = self.active.and_then(|id| self.window(id)) else {
            return;
        };
        let visible_desktop = active.desktop().contains(self.desktop);
        let visible_activity = match &self.activity {
            None => true,
            Some(current) => {
                active.on_all_activities() || active.activities.iter().any(|a| a == current)
            }
        };
        if !(visible_desktop && visible_activity) {
            self.active = None;
        }
    }
}

impl Host for SimHost {
    type Window = SimWindow;

    fn windows(&self) -> Vec<&SimWindow> {
        self.windows.iter().collect()
    }

    fn current_desktop(&self) -> u32 {
        self.desktop
    }

    fn current_activity(&self) -> Option<&str> {
        self.activity.as_deref()
    }

    fn current_screen(&self) -> usize {
        self.screen
    }

    fn screen_geometry(&self, screen: usize) -> Option<WindowRect> {
        self.screens.get(screen).copied()
    }

    fn active_window(&self) -> Option<SimId> {
        self.active
    }

    fn set_minimized(&mut self, id: SimId, minimized: bool) {
        self.journal.push(if minimized {
            Directive::Minimize(id)
        } else {
            Directive::Restore(id)
        });
        if let Err(err) = self.change_minimized(id, minimized) {
            tracing::debug!(%err, "ignoring directive for missing window");
        }
    }

    fn set_active(&mut self, id: SimId) {
        self.journal.push(Directive::Activate(id));
        if let Err(err) = self.activate(id) {
            tracing::debug!(%err, "ignoring directive for missing window");
        }
    }
}

impl EventSource<SimId> for SimHost {
    fn next_event(&mut self) -> Option<WmEvent<SimId>> {
        self.queue.pop_front()
    }
}

/// One user action in a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Open { window: SimWindow },
    Close { window: SimId },
    Activate { window: SimId },
    Minimize { window: SimId },
    Unminimize { window: SimId },
    Move { window: SimId, x: i32, y: i32 },
    Resize { window: SimId, width: u32, height: u32 },
    SendToDesktop { window: SimId, desktop: u32 },
    SwitchDesktop { desktop: u32 },
    SwitchActivity { activity: String },
}

impl Step {
    pub fn apply(&self, host: &mut SimHost) -> Result<(), ScenarioError> {
        match self {
            Step::Open { window } => host.open(window.clone()),
            Step::Close { window } => host.close(*window),
            Step::Activate { window } => host.activate(*window),
            Step::Minimize { window } => host.minimize(*window),
            Step::Unminimize { window } => host.unminimize(*window),
            Step::Move { window, x, y } => host.move_to(*window, *x, *y),
            Step::Resize {
                window,
                width,
                height,
            } => host.resize(*window, *width, *height),
            Step::SendToDesktop { window, desktop } => host.send_to_desktop(*window, *desktop),
            Step::SwitchDesktop { desktop } => {
                host.switch_desktop(*desktop);
                Ok(())
            }
            Step::SwitchActivity { activity } => {
                host.switch_activity(activity);
                Ok(())
            }
        }
    }
}

fn default_screens() -> Vec<WindowRect> {
    vec![WindowRect::new(0, 0, 1920, 1080)]
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_desktop")]
    pub desktop: u32,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default = "default_screens")]
    pub screens: Vec<WindowRect>,
    /// Windows open before the engine starts, bottom of the stack first.
    #[serde(default)]
    pub windows: Vec<SimWindow>,
    #[serde(default)]
    pub active: Option<SimId>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json_str(source: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let source = fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    /// Host in the scenario's initial state, with no queued notifications.
    pub fn host(&self) -> Result<SimHost, ScenarioError> {
        let mut host = SimHost::new(self.screens.clone());
        host.desktop = self.desktop;
        host.activity = self.activity.clone();
        for window in &self.windows {
            if host.window(window.id).is_some() {
                return Err(ScenarioError::DuplicateWindow(window.id));
            }
            host.insert(window.clone());
        }
        if let Some(active) = self.active {
            if host.window(active).is_none() {
                return Err(ScenarioError::UnknownWindow(active));
            }
            host.active = Some(active);
        }
        Ok(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_queues_added_then_activated() {
        let mut host = SimHost::default();
        host.open(SimWindow::new(1, "konsole", WindowRect::new(0, 0, 10, 10)))
            .unwrap();
        assert_eq!(host.next_event(), Some(WmEvent::WindowAdded(1)));
        assert_eq!(host.next_event(), Some(WmEvent::Activated(1)));
        assert_eq!(host.next_event(), None);
        assert_eq!(host.active(), Some(1));
        assert!(matches!(
            host.open(SimWindow::new(1, "konsole", WindowRect::default())),
            Err(ScenarioError::DuplicateWindow(1))
        ));
    }

    #[test]
    fn directives_are_journaled_and_echoed() {
        let mut host = SimHost::default();
        host.insert(SimWindow::new(1, "kate", WindowRect::new(0, 0, 10, 10)));
        host.set_minimized(1, true);
        host.set_minimized(1, true);
        host.set_active(1);
        assert_eq!(
            host.journal(),
            &[
                Directive::Minimize(1),
                Directive::Minimize(1),
                Directive::Activate(1)
            ]
        );
        let events: Vec<_> = std::iter::from_fn(|| host.next_event()).collect();
        assert_eq!(
            events,
            vec![
                WmEvent::Minimized(1),
                WmEvent::Unminimized(1),
                WmEvent::Activated(1)
            ]
        );
    }

    #[test]
    fn switching_desktop_drops_hidden_focus() {
        let mut host = SimHost::default();
        host.open(SimWindow::new(1, "kate", WindowRect::new(0, 0, 10, 10)))
            .unwrap();
        host.switch_desktop(2);
        assert_eq!(host.active(), None);
        host.open(
            SimWindow::new(2, "yakuake", WindowRect::new(0, 0, 10, 10)).on_all_desktops(),
        )
        .unwrap();
        host.switch_desktop(1);
        assert_eq!(host.active(), Some(2));
    }

    #[test]
    fn scenario_parses_windows_and_steps() {
        let scenario = Scenario::from_json_str(
            r#"{
                "windows": [
                    {"id": 1, "class": "firefox", "x": 0, "y": 0, "width": 1920, "height": 1080},
                    {"id": 2, "class": "plasmashell", "x": 0, "y": 1040, "width": 1920, "height": 40,
                     "kind": {"dock": true}, "on_all_desktops": true}
                ],
                "active": 1,
                "steps": [
                    {"action": "open", "window": {"id": 3, "class": "konsole", "x": 10, "y": 10, "width": 300, "height": 200}},
                    {"action": "move", "window": 3, "x": 500, "y": 10},
                    {"action": "switch_desktop", "desktop": 2}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(scenario.windows.len(), 2);
        assert!(scenario.windows[0].kind.normal);
        assert!(scenario.windows[1].kind.dock);
        assert!(!scenario.windows[1].kind.normal);
        assert_eq!(scenario.steps.len(), 3);
        assert_eq!(
            scenario.steps[1],
            Step::Move {
                window: 3,
                x: 500,
                y: 10
            }
        );
        let host = scenario.host().unwrap();
        assert_eq!(host.active(), Some(1));
        assert_eq!(host.pending_events(), 0);
    }

    #[test]
    fn scenario_rejects_unknown_active_window() {
        let scenario = Scenario::from_json_str(r#"{"active": 7}"#).unwrap();
        assert!(matches!(
            scenario.host(),
            Err(ScenarioError::UnknownWindow(7))
        ));
    }
}
