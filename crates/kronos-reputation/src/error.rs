use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReputationError {
    #[error("participant {0} is not registered")]
    UnknownParticipant(String),

    #[error("participant {0} is under quarantine until {until}", until = .1)]
    Quarantined(String, i64),

    #[error("handshake bond requirements not met for participant {0}")]
    HandshakeIneligible(String),

    #[error("handshake bonds require participants to be registered in different countries")]
    SameCountryBond,
}
