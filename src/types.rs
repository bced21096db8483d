use std::fmt;
use std::time::Duration;

/// Canonical unit identifier (the manifest's `slug`).
pub type UnitId = String;

/// Counters reported with `AllDone`.
///
/// None of these take part in scheduling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Units handed to the registry at session start.
    pub units_registered: usize,
    /// Units whose completion was accepted.
    pub units_completed: usize,
    /// Non-gated resources (styles, head scripts) fetched before the session.
    pub preloaded: usize,
    /// Wall-clock time from coordinator construction to the terminal event.
    pub elapsed: Duration,
}

impl SessionStats {
    /// Everything that was loaded, gated or not.
    pub fn files_loaded(&self) -> usize {
        self.units_completed + self.preloaded
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files loaded in {}ms",
            self.files_loaded(),
            self.elapsed.as_millis()
        )
    }
}
