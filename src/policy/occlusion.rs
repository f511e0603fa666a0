use crate::config::Config;
use crate::host::Scope;
use crate::window::Window;

use super::eligibility::{
    ignore_as_background, ignore_as_foreground, ignore_pair_relation, ignore_window,
};

/// Whether `front` covers `back` once every exemption is accounted for.
///
/// Not symmetric: the foreground and background filters depend on the role.
pub fn occludes<W: Window>(front: &W, back: &W, scope: &Scope, config: &Config) -> bool {
    !ignore_window(front, scope, config)
        && !ignore_window(back, scope, config)
        && !ignore_as_foreground(front, config)
        && !ignore_as_background(back, config)
        && !ignore_pair_relation(front, back, config)
        && front.geometry().overlaps(&back.geometry())
}

/// Occlusion in either direction, as used when deciding restores.
pub fn entangled<W: Window>(a: &W, b: &W, scope: &Scope, config: &Config) -> bool {
    occludes(a, b, scope, config) || occludes(b, a, scope, config)
}
