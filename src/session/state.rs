//! Session transition table

use super::types::SessionState;

/// Events that move a session between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// `start_session` accepted
    Begin,
    /// Device acquired, or nothing to acquire
    Ready,
    /// A candidate code arrived (live hit, submitted image, simulated delay elapsed)
    Decode,
    /// The candidate produced a result
    Decoded,
    Fail,
    Cancel,
}

/// Next state for `trigger`, or `None` when the transition is not allowed
pub fn next_state(state: SessionState, trigger: Trigger) -> Option<SessionState> {
    use SessionState::*;
    use Trigger::*;

    match (state, trigger) {
        (Idle, Begin) => Some(Initializing),
        (Initializing, Ready) => Some(Active),
        (Active, Decode) => Some(Decoding),
        (Decoding, Decoded) => Some(Succeeded),
        (Initializing | Active | Decoding, Fail) => Some(Failed),
        (s, Cancel) if !s.is_terminal() => Some(Cancelled),
        _ => None,
    }
}
