//! Per-interaction request lifecycle.

/// Where a user-triggered request currently stands.
///
/// `Succeeded` and `Failed` only live until the front-end has shown the
/// outcome and calls `acknowledge`; neither blocks a new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestLifecycle {
    /// Nothing pending.
    #[default]
    Idle,
    /// A request has been dispatched and not yet applied.
    InFlight,
    /// The last request's result was applied.
    Succeeded,
    /// The last request failed; prior state was kept.
    Failed,
}

impl RequestLifecycle {
    /// Returns true while a request is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }

    /// Marks a new request as dispatched. Returns false if one already is.
    pub(crate) fn try_begin(&mut self) -> bool {
        if self.is_in_flight() {
            return false;
        }
        *self = Self::InFlight;
        true
    }

    pub(crate) fn finish(&mut self, ok: bool) {
        *self = if ok { Self::Succeeded } else { Self::Failed };
    }

    /// Returns a settled lifecycle to idle. In-flight stays in flight.
    pub fn acknowledge(&mut self) {
        if !self.is_in_flight() {
            *self = Self::Idle;
        }
    }
}

impl std::fmt::Display for RequestLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::InFlight => write!(f, "in-flight"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
