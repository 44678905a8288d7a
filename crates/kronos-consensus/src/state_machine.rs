use kronos_core::constants::QUARANTINE_SECONDS;
use kronos_core::types::Timestamp;
use kronos_reputation::ReputationRecord;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A participant's lifecycle state, driven entirely by reputation events
/// and heartbeat presence — never set directly by an operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantState {
    /// Just registered; has not yet sent a first heartbeat.
    Registered,
    /// Sending heartbeats, still within the new-node probation ramp.
    Probationary,
    Active,
    Offline,
    /// Under a timed quarantine following an equivocation. Expires back to
    /// `Active` with integrity reset to a low positive baseline.
    Quarantined,
}

/// Drives a single participant's state through `Registered → Probationary
/// → Active ↔ Offline`, with `Quarantined` pre-empting all of the above
/// for the duration of an equivocation penalty.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ParticipantStateMachine {
    state: ParticipantState,
}

impl Default for ParticipantStateMachine {
    fn default() -> Self {
        Self {
            state: ParticipantState::Registered,
        }
    }
}

impl ParticipantStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParticipantState {
        self.state
    }

    /// Advance the state machine to reflect `record` as of `now`, given
    /// whether this window's expected heartbeat was observed.
    pub fn advance(&mut self, record: &ReputationRecord, now: Timestamp, heartbeat_seen: bool) {
        if record.is_quarantined(now) {
            if self.state != ParticipantState::Quarantined {
                info!(participant = %record.participant, "participant entered quarantine");
            }
            self.state = ParticipantState::Quarantined;
            return;
        }

        if self.state == ParticipantState::Quarantined {
            info!(participant = %record.participant, "quarantine expired, returning to active");
            self.state = ParticipantState::Active;
        }

        if self.state == ParticipantState::Registered && heartbeat_seen {
            self.state = ParticipantState::Probationary;
        }

        if self.state == ParticipantState::Probationary
            && now - record.first_seen >= QUARANTINE_SECONDS
        {
            self.state = ParticipantState::Active;
        }

        match (self.state, heartbeat_seen) {
            (ParticipantState::Active | ParticipantState::Probationary, false) => {
                self.state = ParticipantState::Offline;
            }
            (ParticipantState::Offline, true) => {
                self.state = ParticipantState::Active;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kronos_core::types::ParticipantId;
    use kronos_reputation::EventKind;

    fn record() -> ReputationRecord {
        ReputationRecord::new(ParticipantId::from_bytes([1u8; 32]), 0)
    }

    #[test]
    fn new_participant_starts_registered() {
        let sm = ParticipantStateMachine::new();
        assert_eq!(sm.state(), ParticipantState::Registered);
    }

    #[test]
    fn first_heartbeat_moves_to_probationary() {
        let mut sm = ParticipantStateMachine::new();
        sm.advance(&record(), 10, true);
        assert_eq!(sm.state(), ParticipantState::Probationary);
    }

    #[test]
    fn probation_completes_into_active() {
        let mut sm = ParticipantStateMachine::new();
        let rec = record();
        sm.advance(&rec, 10, true);
        sm.advance(&rec, QUARANTINE_SECONDS + 1, true);
        assert_eq!(sm.state(), ParticipantState::Active);
    }

    #[test]
    fn missed_heartbeat_goes_offline_then_recovers() {
        let mut sm = ParticipantStateMachine::new();
        let rec = record();
        sm.advance(&rec, 10, true);
        sm.advance(&rec, QUARANTINE_SECONDS + 1, true);
        sm.advance(&rec, QUARANTINE_SECONDS + 61, false);
        assert_eq!(sm.state(), ParticipantState::Offline);
        sm.advance(&rec, QUARANTINE_SECONDS + 121, true);
        assert_eq!(sm.state(), ParticipantState::Active);
    }

    #[test]
    fn equivocation_forces_quarantine_then_expires() {
        let mut sm = ParticipantStateMachine::new();
        let mut rec = record();
        sm.advance(&rec, 10, true);
        rec.apply_event(EventKind::Equivocation, 100);
        sm.advance(&rec, 150, true);
        assert_eq!(sm.state(), ParticipantState::Quarantined);
        sm.advance(&rec, 100 + QUARANTINE_SECONDS + 1, true);
        assert_eq!(sm.state(), ParticipantState::Active);
    }
}
