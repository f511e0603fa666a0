//! Exemptions from occlusion. Every predicate answers "leave this out".

use crate::config::Config;
use crate::host::Scope;
use crate::window::Window;

/// Windows that take no part in occlusion in either role.
pub fn ignore_window<W: Window>(window: &W, scope: &Scope, config: &Config) -> bool {
    if !scope.contains(window) {
        return true;
    }
    let kind = window.kind();
    if kind.is_special() {
        return true;
    }
    if config.ignore_nonnormal && !kind.normal {
        return true;
    }
    config.ignore_shell && is_shell_popup(window, scope, config)
}

/// Launcher or panel surface that does not fill its screen.
fn is_shell_popup<W: Window>(window: &W, scope: &Scope, config: &Config) -> bool {
    if !config.shell_classes.contains(window.application_class()) {
        return false;
    }
    match scope.screen_area(window.screen()) {
        Some(area) => !window.geometry().covers(&area),
        None => true,
    }
}

pub fn ignore_as_foreground<W: Window>(front: &W, config: &Config) -> bool {
    config.foreground.rejects(front.application_class()) || is_file_operation_progress(front)
}

/// Copy/move progress windows. They pop up over the file manager that
/// spawned them and must never hide it, whatever their window type.
fn is_file_operation_progress<W: Window>(window: &W) -> bool {
    let name = window.application_name();
    name.starts_with("Progress Dialog")
        || (window.application_class().eq_ignore_ascii_case("dolphin")
            && (name.starts_with("Copying") || name.starts_with("Moving")))
}

pub fn ignore_as_background<W: Window>(back: &W, config: &Config) -> bool {
    !back.is_minimizable() || config.background.rejects(back.application_class())
}

/// Pairs that never occlude each other: a window and itself, and, with
/// transient suppression, dialogs and their parents or siblings.
pub fn ignore_pair_relation<F, B>(front: &F, back: &B, config: &Config) -> bool
where
    F: Window,
    B: Window<Id = F::Id>,
{
    if front.id() == back.id() {
        return true;
    }
    if !config.ignore_transient {
        return false;
    }
    transient_related(front, back) || auxiliary_of(front, back)
}

fn transient_related<F, B>(front: &F, back: &B) -> bool
where
    F: Window,
    B: Window<Id = F::Id>,
{
    let (front_parent, back_parent) = (front.transient_for(), back.transient_for());
    front_parent == Some(back.id())
        || back_parent == Some(front.id())
        || (front_parent.is_some() && front_parent == back_parent)
}

/// A non-normal window (progress popup, utility palette) belonging to the
/// same application as `back`.
fn auxiliary_of<F, B>(front: &F, back: &B) -> bool
where
    F: Window,
    B: Window<Id = F::Id>,
{
    let class = front.application_class();
    !front.kind().normal && !class.is_empty() && class.eq_ignore_ascii_case(back.application_class())
}
