use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use kronos_core::constants::{
    GEOGRAPHY_CITY_WEIGHT, GEOGRAPHY_COUNTRY_WEIGHT, GEOGRAPHY_COVERAGE_WEIGHT,
    GEOGRAPHY_DENSITY_WEIGHT, GEOGRAPHY_FIRST_CITY_BONUS, GEOGRAPHY_FIRST_COUNTRY_BONUS,
    GEOGRAPHY_REGIONS_TARGET, HANDSHAKE_BOND_SATURATION, HANDSHAKE_MIN_GEOGRAPHY,
    HANDSHAKE_MIN_INTEGRITY, HANDSHAKE_MIN_STORAGE, HANDSHAKE_MIN_UPTIME_FRACTION,
    INTEGRITY_EVENT_BLOCK_PRODUCED, INTEGRITY_EVENT_BLOCK_VALIDATED, INTEGRITY_EVENT_EQUIVOCATION,
    INTEGRITY_EVENT_INVALID_BLOCK, PROBATION_START_MULTIPLIER, QUARANTINE_INTEGRITY_BASELINE,
    QUARANTINE_SECONDS,
    REPUTATION_WEIGHT_GEOGRAPHY, REPUTATION_WEIGHT_HANDSHAKE, REPUTATION_WEIGHT_INTEGRITY,
    REPUTATION_WEIGHT_STORAGE, REPUTATION_WEIGHT_UPTIME, UPTIME_SATURATION_SECONDS,
};
use kronos_core::types::{ParticipantId, Timestamp};

/// An event that moves the integrity dimension up or down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    BlockProduced,
    BlockValidated,
    InvalidBlock,
    Equivocation,
}

impl EventKind {
    fn integrity_delta(self) -> f64 {
        match self {
            EventKind::BlockProduced => INTEGRITY_EVENT_BLOCK_PRODUCED,
            EventKind::BlockValidated => INTEGRITY_EVENT_BLOCK_VALIDATED,
            EventKind::InvalidBlock => INTEGRITY_EVENT_INVALID_BLOCK,
            EventKind::Equivocation => INTEGRITY_EVENT_EQUIVOCATION,
        }
    }
}

/// One entry in a participant's permanent event log.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ReputationEvent {
    pub kind: EventKind,
    pub at: Timestamp,
}

/// Country + city location metadata self-declared (and peer-attested) at
/// registration, used only for the geography dimension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
    pub city: String,
}

/// The five-dimensional reputation record tracked per participant.
///
/// `uptime_seconds` and the size of `mutual_bonds` are raw counters that
/// saturate at their configured caps when turned into score fractions;
/// `integrity` and `geography` are already held as `[0, 1]` fractions,
/// while `stored_blocks` is a raw count turned into a fraction of the
/// network's `total_blocks` at scoring time (the storage dimension is a
/// network-relative measure, not a fixed cap).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReputationRecord {
    pub participant: ParticipantId,

    /// Timestamp of this participant's first recognized heartbeat.
    pub first_seen: Timestamp,

    pub uptime_seconds: u64,
    pub integrity: f64,
    pub stored_blocks: u64,
    pub location: Option<Location>,
    pub geography: f64,

    /// Other participants with a reciprocal mutual-trust declaration.
    pub mutual_bonds: BTreeSet<ParticipantId>,

    pub quarantine_until: Option<Timestamp>,

    /// Full history of recognized reputation events, oldest first.
    pub event_log: Vec<ReputationEvent>,
}

impl ReputationRecord {
    /// A freshly registered participant: zeroed dimensions except integrity,
    /// which starts at 1.0 per `clamp(1 + Σ signed_events, 0, 1)` with an
    /// empty event log, and full probation.
    pub fn new(participant: ParticipantId, first_seen: Timestamp) -> Self {
        Self {
            participant,
            first_seen,
            uptime_seconds: 0,
            integrity: 1.0,
            stored_blocks: 0,
            location: None,
            geography: 0.0,
            mutual_bonds: BTreeSet::new(),
            quarantine_until: None,
            event_log: Vec::new(),
        }
    }

    fn uptime_fraction(&self) -> f64 {
        (self.uptime_seconds.min(UPTIME_SATURATION_SECONDS) as f64)
            / (UPTIME_SATURATION_SECONDS as f64)
    }

    /// Storage dimension: this participant's share of the network's total
    /// accepted blocks, saturating at 1.0.
    fn storage_fraction(&self, total_blocks: u64) -> f64 {
        if total_blocks == 0 {
            return 0.0;
        }
        (self.stored_blocks as f64 / total_blocks as f64).min(1.0)
    }

    fn handshake_fraction(&self) -> f64 {
        (self.mutual_bonds.len() as u32).min(HANDSHAKE_BOND_SATURATION) as f64
            / (HANDSHAKE_BOND_SATURATION as f64)
    }

    /// Probation multiplier in effect at `now`: ramps linearly from
    /// `PROBATION_START_MULTIPLIER` at registration to `1.0` once
    /// `QUARANTINE_SECONDS` (the probation period) has elapsed.
    pub fn probation_multiplier(&self, now: Timestamp) -> f64 {
        let elapsed = (now - self.first_seen).max(0) as f64;
        let period = QUARANTINE_SECONDS as f64;
        if elapsed >= period {
            1.0
        } else {
            let t = elapsed / period;
            PROBATION_START_MULTIPLIER + (1.0 - PROBATION_START_MULTIPLIER) * t
        }
    }

    pub fn is_quarantined(&self, now: Timestamp) -> bool {
        matches!(self.quarantine_until, Some(until) if now < until)
    }

    /// If a quarantine set by a past equivocation has expired as of `now`,
    /// clear it and reset integrity to the low positive baseline rather
    /// than leaving it at whatever the equivocation penalty left behind.
    /// A no-op if no quarantine is pending or it has not yet expired.
    pub fn maybe_expire_quarantine(&mut self, now: Timestamp) {
        if matches!(self.quarantine_until, Some(until) if now >= until) {
            self.quarantine_until = None;
            self.integrity = QUARANTINE_INTEGRITY_BASELINE;
        }
    }

    /// Composite reputation score, evaluated in a fixed dimension order
    /// (uptime, integrity, storage, geography, handshake) so repeated
    /// evaluation over the same record is bit-for-bit reproducible across
    /// participants running different hardware.
    pub fn composite_score(&self, now: Timestamp, total_blocks: u64) -> f64 {
        if self.is_quarantined(now) {
            return 0.0;
        }

        let mut score = 0.0f64;
        score += self.uptime_fraction() * REPUTATION_WEIGHT_UPTIME;
        score += self.integrity.clamp(0.0, 1.0) * REPUTATION_WEIGHT_INTEGRITY;
        score += self.storage_fraction(total_blocks) * REPUTATION_WEIGHT_STORAGE;
        score += self.geography.clamp(0.0, 1.0) * REPUTATION_WEIGHT_GEOGRAPHY;
        score += self.handshake_fraction() * REPUTATION_WEIGHT_HANDSHAKE;

        score * self.probation_multiplier(now)
    }

    /// Whether this participant currently qualifies to form a new mutual
    /// trust (handshake) bond with a peer, ignoring the "different
    /// country" pairing requirement (a two-party condition evaluated by
    /// the caller, since it is not derivable from a single record).
    pub fn handshake_eligible(&self) -> bool {
        self.uptime_fraction() >= HANDSHAKE_MIN_UPTIME_FRACTION
            && self.integrity >= HANDSHAKE_MIN_INTEGRITY
            && self.geography >= HANDSHAKE_MIN_GEOGRAPHY
    }

    /// Whether this participant's storage dimension clears the handshake
    /// bar, given the network's current total block count.
    pub fn handshake_storage_eligible(&self, total_blocks: u64) -> bool {
        self.storage_fraction(total_blocks) >= HANDSHAKE_MIN_STORAGE
    }

    /// Apply an integrity-affecting event, clamping the result to `[0, 1]`
    /// and recording it in the event log. An equivocation also opens a
    /// quarantine window starting at `now`.
    pub fn apply_event(&mut self, kind: EventKind, now: Timestamp) {
        self.integrity = (self.integrity + kind.integrity_delta()).clamp(0.0, 1.0);
        self.event_log.push(ReputationEvent { kind, at: now });
        if kind == EventKind::Equivocation {
            self.quarantine_until = Some(now + QUARANTINE_SECONDS);
        }
    }

    /// Advance the uptime counter by `delta_seconds` of observed presence.
    pub fn record_uptime(&mut self, delta_seconds: u64) {
        self.uptime_seconds = self.uptime_seconds.saturating_add(delta_seconds);
    }

    /// Credit one more block stored locally.
    pub fn record_stored_block(&mut self) {
        self.stored_blocks = self.stored_blocks.saturating_add(1);
    }

    /// Form a reciprocal mutual-trust bond with `other`. Idempotent: bonding
    /// twice with the same peer has no further effect. The different-
    /// country pairing requirement is enforced by the caller.
    pub fn bond_with(&mut self, other: ParticipantId) {
        self.mutual_bonds.insert(other);
    }
}

/// Attempt to form a mutual-trust bond between two participants, enforcing
/// the handshake eligibility thresholds on both sides plus the
/// different-country pairing requirement. On success both records gain
/// each other in `mutual_bonds`.
pub fn try_bond(
    a: &mut ReputationRecord,
    a_location: &Location,
    b: &mut ReputationRecord,
    b_location: &Location,
    total_blocks: u64,
) -> Result<(), crate::error::ReputationError> {
    if a_location.country == b_location.country {
        return Err(crate::error::ReputationError::SameCountryBond);
    }
    if !a.handshake_eligible() || !a.handshake_storage_eligible(total_blocks) {
        return Err(crate::error::ReputationError::HandshakeIneligible(
            a.participant.to_string(),
        ));
    }
    if !b.handshake_eligible() || !b.handshake_storage_eligible(total_blocks) {
        return Err(crate::error::ReputationError::HandshakeIneligible(
            b.participant.to_string(),
        ));
    }
    a.bond_with(b.participant.clone());
    b.bond_with(a.participant.clone());
    Ok(())
}

/// One sub-score (country or city) of the geography dimension:
/// `0.7·(1/(1+log10(peers_in_region))) + 0.3·(regions_seen/target)`,
/// plus a first-mover bonus if this participant was first to register in
/// the region.
fn region_sub_score(peers_in_region: u32, regions_seen: u32, is_first: bool, bonus: f64) -> f64 {
    let density =
        GEOGRAPHY_DENSITY_WEIGHT * (1.0 / (1.0 + (peers_in_region.max(1) as f64).log10()));
    let coverage =
        GEOGRAPHY_COVERAGE_WEIGHT * (regions_seen as f64 / GEOGRAPHY_REGIONS_TARGET).min(1.0);
    let mut score = density + coverage;
    if is_first {
        score += bonus;
    }
    score.min(1.0)
}

/// Combine country and city sub-scores into the geography dimension value,
/// per the 0.6/0.4 split.
pub fn geography_score(
    peers_in_country: u32,
    countries_seen: u32,
    is_first_in_country: bool,
    peers_in_city: u32,
    cities_seen: u32,
    is_first_in_city: bool,
) -> f64 {
    let country_score = region_sub_score(
        peers_in_country,
        countries_seen,
        is_first_in_country,
        GEOGRAPHY_FIRST_COUNTRY_BONUS,
    );
    let city_score = region_sub_score(
        peers_in_city,
        cities_seen,
        is_first_in_city,
        GEOGRAPHY_FIRST_CITY_BONUS,
    );
    (GEOGRAPHY_COUNTRY_WEIGHT * country_score + GEOGRAPHY_CITY_WEIGHT * city_score).clamp(0.0, 1.0)
}
