use std::collections::BTreeSet;
use std::fmt;

use crate::config::Config;
use crate::event::{Directive, WmEvent};
use crate::host::{Host, LiveSet};
use crate::window::Window;

use super::eligibility::ignore_window;
use super::occlusion::{entangled, occludes};
use super::stack::RecencyStack;

/// Live set plus the directives issued so far for one event.
///
/// Every directive is mirrored into the live set so later passes of the same
/// event see the state the host is about to reach.
#[derive(Debug)]
pub struct Evaluation<Id> {
    live: LiveSet<Id>,
    directives: Vec<Directive<Id>>,
}

impl<Id: Copy + Eq + Ord + fmt::Debug> Evaluation<Id> {
    pub fn new(live: LiveSet<Id>) -> Self {
        Self {
            live,
            directives: Vec::new(),
        }
    }

    pub fn live(&self) -> &LiveSet<Id> {
        &self.live
    }

    pub fn directives(&self) -> &[Directive<Id>] {
        &self.directives
    }

    pub fn into_directives(self) -> Vec<Directive<Id>> {
        self.directives
    }

    fn minimize(&mut self, id: Id) {
        self.live.set_minimized(id, true);
        self.directives.push(Directive::Minimize(id));
    }

    fn restore(&mut self, id: Id) {
        self.live.set_minimized(id, false);
        self.directives.push(Directive::Restore(id));
    }

    fn activate(&mut self, id: Id) {
        self.live.set_active(id);
        self.directives.push(Directive::Activate(id));
    }
}

/// Decides which windows to minimize, restore and activate.
///
/// The engine owns its bookkeeping: the recency of activations, the ledger
/// of windows it minimized itself, windows in an interactive move/resize,
/// and minimize directives whose host notification has not arrived yet.
#[derive(Debug, Clone)]
pub struct PolicyEngine<Id: Copy + Eq + Ord> {
    config: Config,
    active: RecencyStack<Id>,
    minimized: RecencyStack<Id>,
    awaiting_echo: BTreeSet<Id>,
    gated: BTreeSet<Id>,
}

impl<Id: Copy + Eq + Ord + fmt::Debug> PolicyEngine<Id> {
    pub fn new(config: Config) -> Self {
        tracing::debug!(?config, "initializing policy engine");
        Self {
            config,
            active: RecencyStack::new(),
            minimized: RecencyStack::new(),
            awaiting_echo: BTreeSet::new(),
            gated: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Activation recency, most recent first.
    pub fn active_stack(&self) -> &RecencyStack<Id> {
        &self.active
    }

    /// Windows minimized by the engine, most recent first.
    pub fn minimized_stack(&self) -> &RecencyStack<Id> {
        &self.minimized
    }

    pub fn is_gated(&self, id: Id) -> bool {
        self.gated.contains(&id)
    }

    /// Snapshot `host` and evaluate `event` against it.
    pub fn handle<H>(&mut self, host: &H, event: WmEvent<Id>) -> Vec<Directive<Id>>
    where
        H: Host,
        H::Window: Window<Id = Id>,
    {
        let departed = match event {
            WmEvent::WindowRemoved(id) => Some(id),
            _ => None,
        };
        self.evaluate(LiveSet::capture(host, departed), event)
    }

    /// Seed the active stack with windows that existed before the engine
    /// started. Enumeration order is taken as stacking order, bottom first.
    pub fn adopt<H>(&mut self, host: &H)
    where
        H: Host,
        H::Window: Window<Id = Id>,
    {
        let live = LiveSet::capture(host, None);
        for window in live.iter() {
            if !window.minimized && !window.kind.is_special() {
                self.active.push(window.id);
            }
        }
        tracing::debug!(tracked = self.active.len(), "adopted existing windows");
    }

    pub fn evaluate(&mut self, live: LiveSet<Id>, event: WmEvent<Id>) -> Vec<Directive<Id>> {
        let mut eval = Evaluation::new(live);
        self.reconcile(eval.live(), event);
        match event {
            WmEvent::WindowAdded(id) => {
                tracing::debug!(window_id = ?id, "added");
                self.settle(&mut eval, id);
                self.remember_active(&eval, id);
                self.keep_added_active(&mut eval, id);
            }
            WmEvent::Activated(id) => {
                tracing::debug!(window_id = ?id, "activated");
                self.minimized.remove(id);
                self.awaiting_echo.remove(&id);
                self.settle(&mut eval, id);
                self.remember_active(&eval, id);
            }
            WmEvent::Unminimized(id) => {
                tracing::debug!(window_id = ?id, "unminimized");
                self.minimized.remove(id);
                self.awaiting_echo.remove(&id);
                self.settle(&mut eval, id);
            }
            WmEvent::Minimized(id) => self.on_minimized(&mut eval, id),
            WmEvent::WindowRemoved(id) => self.on_removed(&mut eval, id),
            WmEvent::Geometrized(id) => self.on_geometrized(&mut eval, id),
            WmEvent::Relayouted => self.on_relayouted(&mut eval),
            WmEvent::MoveResizeStarted(id) => {
                tracing::debug!(window_id = ?id, "move/resize started, deferring evaluation");
                self.gated.insert(id);
            }
            WmEvent::MoveResizeFinished(id) => {
                tracing::debug!(window_id = ?id, "move/resize finished");
                self.gated.remove(&id);
                self.settle(&mut eval, id);
            }
        }
        eval.into_directives()
    }

    /// Drop bookkeeping for windows that are gone, and ledger entries that
    /// contradict the host's state. The window `event` reports as shown is
    /// expected to contradict its entry and is dropped quietly.
    fn reconcile(&mut self, live: &LiveSet<Id>, event: WmEvent<Id>) {
        for id in self.active.retain(|id| live.contains(id)) {
            tracing::debug!(window_id = ?id, "pruned stale window from active stack");
        }
        for id in self.minimized.retain(|id| live.contains(id)) {
            tracing::debug!(window_id = ?id, "pruned stale window from minimized stack");
        }
        self.gated.retain(|id| live.contains(*id));
        self.awaiting_echo.retain(|id| live.contains(*id));

        let awaiting = &self.awaiting_echo;
        let contradicting = self.minimized.retain(|id| {
            awaiting.contains(&id) || live.get(id).is_some_and(|window| window.minimized)
        });
        let shown = match event {
            WmEvent::Activated(id) | WmEvent::Unminimized(id) => Some(id),
            _ => None,
        };
        for id in contradicting {
            if Some(id) == shown {
                tracing::debug!(window_id = ?id, "engine-minimized window shown again");
            } else {
                tracing::warn!(window_id = ?id, "minimized stack entry is not minimized, dropping");
            }
        }
    }

    /// Treat a minimize the engine did not just issue as manual: unless the
    /// window is the most recent entry of the minimized stack, forget it.
    /// Returns whether the window is still tracked as automatically minimized.
    pub fn reset_minimized(&mut self, id: Id) -> bool {
        if self.minimized.top() != Some(id) {
            self.minimized.remove(id);
        }
        self.minimized.contains(id)
    }

    fn on_minimized(&mut self, eval: &mut Evaluation<Id>, id: Id) {
        let automatic = self.awaiting_echo.remove(&id) || self.reset_minimized(id);
        if automatic {
            tracing::debug!(window_id = ?id, "minimized by policy");
        } else {
            tracing::debug!(window_id = ?id, "minimized manually");
            self.active.remove(id);
        }
        self.restore_minimized(eval);
        self.reactivate_recent(eval);
    }

    fn on_removed(&mut self, eval: &mut Evaluation<Id>, id: Id) {
        tracing::debug!(window_id = ?id, "closed");
        self.active.remove(id);
        self.minimized.remove(id);
        self.awaiting_echo.remove(&id);
        self.gated.remove(&id);
        self.restore_minimized(eval);
        self.reactivate_recent(eval);
    }

    fn on_geometrized(&mut self, eval: &mut Evaluation<Id>, id: Id) {
        let Some(window) = eval.live().get(id) else {
            return;
        };
        if window.kind.dock {
            // a panel resize changes the usable area for everyone
            self.on_relayouted(eval);
            return;
        }
        self.settle(eval, id);
    }

    fn on_relayouted(&mut self, eval: &mut Evaluation<Id>) {
        tracing::debug!(active = ?eval.live().active(), "workspace relayouted");
        match eval.live().active() {
            Some(active) => self.settle(eval, active),
            None => self.restore_minimized(eval),
        }
    }

    /// Minimize then restore around `id`, unless it is mid move/resize.
    fn settle(&mut self, eval: &mut Evaluation<Id>, id: Id) {
        let Some(window) = eval.live().get(id) else {
            tracing::debug!(window_id = ?id, "window vanished before evaluation");
            return;
        };
        if self.gated.contains(&id) || window.in_move_resize() {
            tracing::debug!(window_id = ?id, "geometry unstable, deferring");
            return;
        }
        self.minimize_overlapping(eval, id);
        self.restore_minimized(eval);
    }

    fn remember_active(&mut self, eval: &Evaluation<Id>, id: Id) {
        if eval
            .live()
            .get(id)
            .is_some_and(|window| !window.kind.is_special())
        {
            self.active.push(id);
        }
    }

    /// A freshly opened window keeps focus even if the passes above stole it.
    fn keep_added_active(&mut self, eval: &mut Evaluation<Id>, id: Id) {
        if !self.config.auto_reactivate || eval.live().active() == Some(id) {
            return;
        }
        let Some(window) = eval.live().get(id) else {
            return;
        };
        if window.minimized || ignore_window(window, eval.live().scope(), &self.config) {
            return;
        }
        tracing::debug!(window_id = ?id, "reactivating recently added window");
        eval.activate(id);
    }

    /// Minimize every unminimized window that `front` covers.
    pub fn minimize_overlapping(&mut self, eval: &mut Evaluation<Id>, front: Id) {
        let live = eval.live();
        let Some(front_window) = live.get(front) else {
            return;
        };
        if front_window.minimized || front_window.in_move_resize() || self.gated.contains(&front)
        {
            return;
        }
        let covered: Vec<Id> = live
            .iter()
            .filter(|other| {
                !other.minimized && occludes(front_window, *other, live.scope(), &self.config)
            })
            .map(|other| other.id)
            .collect();

        for id in covered {
            tracing::debug!(window_id = ?id, covered_by = ?front, "minimizing covered window");
            self.minimized.push(id);
            self.awaiting_echo.insert(id);
            eval.minimize(id);
        }
    }

    /// Restore engine-minimized windows that no longer overlap any visible
    /// window, nor any window restored earlier in the same pass.
    pub fn restore_minimized(&mut self, eval: &mut Evaluation<Id>) {
        if !self.config.auto_restore {
            return;
        }
        let live = eval.live();
        let scope = live.scope();
        let mut pending: Vec<Id> = Vec::new();

        for id in self.minimized.iter() {
            let Some(inactive) = live.get(id) else {
                continue;
            };
            if !scope.contains(inactive) {
                continue;
            }
            let blocker = live.iter().find(|other| {
                (!other.minimized || pending.contains(&other.id))
                    && entangled(inactive, *other, scope, &self.config)
            });
            match blocker {
                Some(other) => {
                    tracing::debug!(window_id = ?id, blocked_by = ?other.id, "not restoring");
                }
                None => pending.push(id),
            }
        }

        for id in pending {
            tracing::debug!(window_id = ?id, "restoring uncovered window");
            self.minimized.remove(id);
            self.awaiting_echo.remove(&id);
            eval.restore(id);
        }
    }

    /// When nothing meaningful is active, activate the most recent visible
    /// window on the current desktop, activity and screen. Returns whether
    /// an activation was issued.
    pub fn reactivate_recent(&mut self, eval: &mut Evaluation<Id>) -> bool {
        if !self.config.auto_reactivate {
            return false;
        }
        let live = eval.live();
        let has_active = live
            .active()
            .and_then(|id| live.get(id))
            .is_some_and(|window| !window.kind.desktop && !window.minimized);
        if has_active {
            return false;
        }
        let scope = live.scope();
        let candidate = self.active.iter().find(|id| {
            live.get(*id).is_some_and(|window| {
                !window.minimized && window.screen == scope.screen && scope.contains(window)
            })
        });
        match candidate {
            Some(id) => {
                tracing::debug!(window_id = ?id, "reactivating recent window");
                eval.activate(id);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::geometry::WindowRect;
    use crate::host::{Scope, WindowSnapshot};
    use crate::window::{Desktop, WindowKind};

    fn window(id: u32, geometry: WindowRect) -> WindowSnapshot<u32> {
        WindowSnapshot {
            id,
            geometry,
            kind: WindowKind::normal(),
            transient_for: None,
            desktop: Desktop::Number(1),
            activities: Vec::new(),
            screen: 0,
            application_class: format!("app{id}"),
            application_name: format!("app{id}"),
            caption: format!("window {id}"),
            minimized: false,
            minimizable: true,
            moving: false,
            resizing: false,
        }
    }

    fn live(windows: Vec<WindowSnapshot<u32>>, active: Option<u32>) -> LiveSet<u32> {
        let scope = Scope::new(1, None, 0).with_screen(0, WindowRect::new(0, 0, 1920, 1080));
        LiveSet::from_parts(windows, scope, active)
    }

    const FULL: WindowRect = WindowRect::new(0, 0, 1920, 1080);
    const SMALL: WindowRect = WindowRect::new(0, 0, 800, 600);

    #[test]
    fn activation_minimizes_covered_window() {
        let mut engine = PolicyEngine::new(Config::default());
        let directives = engine.evaluate(
            live(vec![window(1, FULL), window(2, SMALL)], Some(1)),
            WmEvent::Activated(1),
        );
        assert_eq!(directives, vec![Directive::Minimize(2)]);
        assert_eq!(engine.minimized_stack().top(), Some(2));
        assert_eq!(engine.active_stack().top(), Some(1));
    }

    #[test]
    fn minimize_pass_is_idempotent() {
        let mut engine = PolicyEngine::new(Config::default());
        let mut eval = Evaluation::new(live(vec![window(1, FULL), window(2, SMALL)], Some(1)));
        engine.minimize_overlapping(&mut eval, 1);
        assert_eq!(eval.directives().len(), 1);
        engine.minimize_overlapping(&mut eval, 1);
        assert_eq!(eval.directives().len(), 1);
    }

    #[test]
    fn minimized_front_covers_nothing() {
        let mut engine = PolicyEngine::new(Config::default());
        let mut front = window(1, FULL);
        front.minimized = true;
        let directives = engine.evaluate(
            live(vec![front, window(2, SMALL)], None),
            WmEvent::Geometrized(1),
        );
        assert!(directives.is_empty());
    }

    #[test]
    fn gated_window_defers_until_move_finishes() {
        let mut engine = PolicyEngine::new(Config::default());
        let windows = vec![window(1, FULL), window(2, SMALL)];
        let started = engine.evaluate(live(windows.clone(), Some(1)), WmEvent::MoveResizeStarted(1));
        assert!(started.is_empty());
        assert!(engine.is_gated(1));
        let moving = engine.evaluate(live(windows.clone(), Some(1)), WmEvent::Geometrized(1));
        assert!(moving.is_empty());
        let finished = engine.evaluate(live(windows, Some(1)), WmEvent::MoveResizeFinished(1));
        assert_eq!(finished, vec![Directive::Minimize(2)]);
        assert!(!engine.is_gated(1));
    }

    #[test]
    fn reset_minimized_keeps_only_the_top_entry() {
        let mut engine = PolicyEngine::<u32>::new(Config::default());
        engine.minimized.push(2);
        engine.minimized.push(1);
        assert!(!engine.reset_minimized(2));
        assert!(engine.reset_minimized(1));
        assert_eq!(engine.minimized_stack().as_slice(), &[1]);
    }

    #[test]
    fn restore_blocks_mutually_overlapping_pair() {
        let mut engine = PolicyEngine::new(Config::default());
        let mut d = window(4, SMALL);
        let mut e = window(5, WindowRect::new(100, 100, 800, 600));
        d.minimized = true;
        e.minimized = true;
        engine.minimized.push(5);
        engine.minimized.push(4);
        let mut eval = Evaluation::new(live(vec![d, e], None));
        engine.restore_minimized(&mut eval);
        assert_eq!(eval.directives(), &[Directive::Restore(4)]);
        assert_eq!(engine.minimized_stack().as_slice(), &[5]);
    }

    #[test]
    fn auto_restore_disabled_restores_nothing() {
        let config = Config {
            auto_restore: false,
            ..Config::default()
        };
        let mut engine = PolicyEngine::new(config);
        let mut b = window(2, SMALL);
        b.minimized = true;
        engine.minimized.push(2);
        let mut eval = Evaluation::new(live(vec![b], None));
        engine.restore_minimized(&mut eval);
        assert!(eval.directives().is_empty());
    }

    #[test]
    fn reactivation_skips_minimized_and_offscreen() {
        let mut engine = PolicyEngine::new(Config::default());
        let mut minimized = window(1, SMALL);
        minimized.minimized = true;
        let mut elsewhere = window(2, SMALL);
        elsewhere.screen = 1;
        let mut other_desktop = window(3, SMALL);
        other_desktop.desktop = Desktop::Number(2);
        let fallback = window(4, SMALL);
        for id in [4, 3, 2, 1] {
            engine.active.push(id);
        }
        let mut eval = Evaluation::new(live(
            vec![minimized, elsewhere, other_desktop, fallback],
            None,
        ));
        assert!(engine.reactivate_recent(&mut eval));
        assert_eq!(eval.directives(), &[Directive::Activate(4)]);
    }

    #[test]
    fn reactivation_respects_existing_active_window() {
        let mut engine = PolicyEngine::new(Config::default());
        engine.active.push(1);
        let mut eval = Evaluation::new(live(vec![window(1, SMALL), window(2, FULL)], Some(2)));
        assert!(!engine.reactivate_recent(&mut eval));

        let mut desktop = window(3, FULL);
        desktop.kind = WindowKind {
            desktop: true,
            ..WindowKind::default()
        };
        let mut eval = Evaluation::new(live(vec![window(1, SMALL), desktop], Some(3)));
        assert!(engine.reactivate_recent(&mut eval));
        assert_eq!(eval.directives(), &[Directive::Activate(1)]);
    }

    #[test]
    fn reconcile_prunes_stale_and_contradicting_entries() {
        let mut engine = PolicyEngine::new(Config::default());
        engine.active.push(9);
        engine.active.push(1);
        engine.minimized.push(9);
        engine.minimized.push(1);
        // window 1 is live but not minimized and no echo is pending
        engine.evaluate(live(vec![window(1, SMALL)], Some(1)), WmEvent::Relayouted);
        assert_eq!(engine.active_stack().as_slice(), &[1]);
        assert!(engine.minimized_stack().is_empty());
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        fn warnings_during(&self, f: impl FnOnce()) -> String {
            let writer = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::WARN)
                .with_writer(move || writer.clone())
                .finish();
            tracing::subscriber::with_default(subscriber, f);
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn shown_again(event: WmEvent<u32>) -> String {
        let mut engine = PolicyEngine::new(Config::default());
        engine.minimized.push(2);
        CapturedLog::default().warnings_during(|| {
            engine.evaluate(live(vec![window(2, SMALL)], Some(2)), event);
            assert!(engine.minimized_stack().is_empty());
        })
    }

    #[test]
    fn showing_an_engine_minimized_window_is_not_a_warning() {
        assert!(shown_again(WmEvent::Unminimized(2)).is_empty());
        assert!(shown_again(WmEvent::Activated(2)).is_empty());
        assert!(shown_again(WmEvent::Relayouted).contains("not minimized"));
    }

    #[test]
    fn special_windows_never_enter_active_stack() {
        let mut engine = PolicyEngine::new(Config::default());
        let mut dock = window(1, WindowRect::new(0, 1040, 1920, 40));
        dock.kind = WindowKind {
            dock: true,
            ..WindowKind::default()
        };
        engine.evaluate(live(vec![dock], Some(1)), WmEvent::Activated(1));
        assert!(engine.active_stack().is_empty());
    }
}
