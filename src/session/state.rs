/// Session state definitions
///
/// The session moves through a small state machine:
///
/// ```text
/// Unauthenticated --login ok--> Authenticated --expiry--> Expired
/// Expired --re-login ok--> Authenticated
/// Expired --re-login failed--> Unauthenticated
/// ```
use std::fmt;

/// Authentication state of the web UI session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No usable session; the next request logs in first
    Unauthenticated,

    /// Cookies and anti-forgery token are believed valid
    Authenticated,

    /// The appliance signalled that the session is gone
    Expired,
}

impl SessionState {
    /// Returns true if requests can be sent without logging in first
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// Checks whether moving to `next` follows the state machine
    ///
    /// Staying in the same state is allowed, as is an explicit logout from
    /// any state.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;

        if *self == next || next == Unauthenticated {
            return true;
        }

        matches!(
            (self, next),
            (Unauthenticated, Authenticated) | (Authenticated, Expired) | (Expired, Authenticated)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
