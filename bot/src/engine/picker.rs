use std::time::Duration;

use rand::Rng;

use super::GameCandidate;

/// Re-rolls available after the first pick.
pub const REROLL_BUDGET: u8 = 3;

/// How long a picker stays interactive after its last interaction.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(300);

/// Why a picker interaction was refused. Rendered by the UI as a private
/// notice; the session itself is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerDenied {
    /// The candidate list is empty.
    NoCandidates,
    /// Pick requested after a game was already picked.
    AlreadyPicked,
    /// Re-roll requested before anything was picked.
    NothingPicked,
    /// Re-roll requested with the budget spent.
    OutOfRerolls,
    /// Any action after expiry.
    SessionExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Idle,
    Selected,
    Exhausted,
    Expired,
}

/// Interactive random-pick session over a fixed candidate list.
///
/// State machine: `Idle → Selected → Exhausted`, with `Expired` reachable
/// from every state via [`PickerSession::expire`]. Transitions happen only
/// through the methods here; the UI layer renders state, it never owns it.
/// The RNG is injected so tests can seed it.
#[derive(Debug)]
pub struct PickerSession {
    candidates: Vec<GameCandidate>,
    state: PickerState,
    rerolls_left: u8,
    current: Option<usize>,
}

impl PickerSession {
    /// Candidates are fixed for the life of the session, never refreshed.
    pub fn new(candidates: Vec<GameCandidate>) -> Self {
        Self {
            candidates,
            state: PickerState::Idle,
            rerolls_left: REROLL_BUDGET,
            current: None,
        }
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn rerolls_left(&self) -> u8 {
        self.rerolls_left
    }

    pub fn current(&self) -> Option<&GameCandidate> {
        self.current.map(|index| &self.candidates[index])
    }

    /// First pick: uniformly random over the candidates. Valid only before
    /// anything was picked.
    pub fn pick<R: Rng>(&mut self, rng: &mut R) -> Result<&GameCandidate, PickerDenied> {
        match self.state {
            PickerState::Idle => {}
            PickerState::Selected | PickerState::Exhausted => {
                return Err(PickerDenied::AlreadyPicked);
            }
            PickerState::Expired => return Err(PickerDenied::SessionExpired),
        }
        if self.candidates.is_empty() {
            return Err(PickerDenied::NoCandidates);
        }

        let index = rng.gen_range(0..self.candidates.len());
        self.current = Some(index);
        self.state = PickerState::Selected;
        Ok(&self.candidates[index])
    }

    /// Re-roll the selection. May land on the same title again; the
    /// previous pick is not excluded.
    pub fn reroll<R: Rng>(&mut self, rng: &mut R) -> Result<&GameCandidate, PickerDenied> {
        match self.state {
            PickerState::Selected => {}
            PickerState::Idle => return Err(PickerDenied::NothingPicked),
            PickerState::Exhausted => return Err(PickerDenied::OutOfRerolls),
            PickerState::Expired => return Err(PickerDenied::SessionExpired),
        }

        // Selected implies a non-empty candidate list and budget left.
        self.rerolls_left -= 1;
        let index = rng.gen_range(0..self.candidates.len());
        self.current = Some(index);
        if self.rerolls_left == 0 {
            self.state = PickerState::Exhausted;
        }
        Ok(&self.candidates[index])
    }

    /// Timer-driven transition: disable everything, keep the last
    /// selection visible.
    pub fn expire(&mut self) {
        self.state = PickerState::Expired;
    }
}
