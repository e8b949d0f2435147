/// Lifecycle phase of a broadcast session.
///
/// Derived ordering is the only legal transition order: a session moves
/// `Upcoming -> Live -> Ended` and never regresses. `Ended` is terminal and
/// means "recording playback": controls become user-operable and forced
/// synchronization is disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Upcoming,
    Live,
    Ended,
}

impl Phase {
    /// `true` while the live-lock (drift correction, pause/seek suppression)
    /// is in force.
    #[must_use]
    pub fn is_live(self) -> bool {
        self == Self::Live
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upcoming => write!(f, "upcoming"),
            Self::Live => write!(f, "live"),
            Self::Ended => write!(f, "ended"),
        }
    }
}
