//! Prometheus metrics of the validator.

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, register_int_gauge_vec,
    IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
};

lazy_static! {
    /// Output submissions confirmed on L1.
    pub static ref OUTPUTS_SUBMITTED: IntCounter = register_int_counter!(
        "kroma_validator_outputs_submitted",
        "Number of output submissions confirmed on L1"
    ).expect("Outputs submitted failed to register");

    /// Challenges opened by this validator.
    pub static ref CHALLENGES_CREATED: IntCounter = register_int_counter!(
        "kroma_validator_challenges_created",
        "Number of challenges opened against invalid outputs"
    ).expect("Challenges created failed to register");

    /// Resolved challenges by final status.
    pub static ref CHALLENGE_OUTCOMES: IntCounterVec = register_int_counter_vec!(
        "kroma_validator_challenge_outcomes",
        "Number of resolved challenges by status",
        &["status"]
    ).expect("Challenge outcomes failed to register");

    /// Outputs flagged as submitted outside their proposer window.
    pub static ref LATE_OUTPUTS: IntCounter = register_int_counter!(
        "kroma_validator_late_outputs",
        "Number of outputs submitted outside their proposer window"
    ).expect("Late outputs failed to register");

    /// Consistency faults observed on the output ledger.
    pub static ref CONSISTENCY_FAULTS: IntCounterVec = register_int_counter_vec!(
        "kroma_validator_consistency_faults",
        "Number of output ledger consistency faults by kind",
        &["kind"]
    ).expect("Consistency faults failed to register");

    /// Bond intents by final result.
    pub static ref INTENTS: IntCounterVec = register_int_counter_vec!(
        "kroma_validator_intents",
        "Number of bond intents by command and result",
        &["intent", "result"]
    ).expect("Intents failed to register");

    /// The L2 block of the next output the engine processes.
    pub static ref EXPECTED_L2_BLOCK: IntGauge = register_int_gauge!(
        "kroma_validator_expected_l2_block",
        "L2 block of the next output to process"
    ).expect("Expected L2 block failed to register");

    /// The latest observed chain heads.
    pub static ref CHAIN_HEADS: IntGaugeVec = register_int_gauge_vec!(
        "kroma_validator_chain_heads",
        "Latest observed head block number by chain",
        &["chain"]
    ).expect("Chain heads failed to register");
}
