//! Shared crate-wide constants.

/// Launcher and panel popups consulted by `ignoreShell`. Comma separated,
/// same form as the configuration lists.
pub const DEFAULT_SHELL_CLASSES: &str = "krunner, plasmashell";

/// Applications that never cover anything by default: screen rulers and
/// video call overlays are meant to float above other windows.
pub const DEFAULT_EXCLUDED_FOREGROUND: &str = "zoom, kruler";

/// Upper bound on host notifications drained by a single
/// [`EventAdapter::pump`](crate::adapter::EventAdapter::pump) call.
///
/// Every pass is idempotent, so a well-behaved host converges after a
/// handful of echoes. The cap only protects against a host that keeps
/// emitting notifications without changing state.
pub const MAX_PUMPED_EVENTS: usize = 4096;
