use thiserror::Error;

use crate::types::ContractRole;

/// Coarse error classes surfaced to callers of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    NotFound,
    Validation,
    RemoteCall,
    Encoding,
}

/// Typed error hierarchy for the leverage client.
///
/// Library-internal errors use specific variants; application code wraps with
/// `anyhow::Context` for propagation.
#[derive(Error, Debug)]
pub enum LeverageError {
    // -- Configuration ------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -- Not found ----------------------------------------------------------
    #[error("contract {role} not found in registry for chain {chain_id}")]
    ContractNotFound { role: ContractRole, chain_id: u64 },

    #[error("no route found from {token_in} to {token_out}")]
    RouteNotFound { token_in: String, token_out: String },

    // -- Validation ---------------------------------------------------------
    #[error("slippage {bps} bps outside [0, 10000]")]
    SlippageOutOfRange { bps: u32 },

    #[error("invalid asset: {reason}")]
    InvalidAsset { reason: String },

    #[error("validation error: {0}")]
    Validation(String),

    // -- Remote calls -------------------------------------------------------
    #[error("contract read {function} failed: {reason}")]
    ReadFailed { function: String, reason: String },

    #[error("transaction simulation failed: {reason}")]
    SimulationFailed { reason: String },

    #[error("transaction submission failed: {reason}")]
    SubmissionFailed { reason: String },

    #[error("transaction reverted: {reason} (tx: {tx_hash})")]
    TxReverted { tx_hash: String, reason: String },

    #[error("receipt lookup failed: {reason} (tx: {tx_hash})")]
    ReceiptFailed { tx_hash: String, reason: String },

    #[error("transaction timed out after {timeout_seconds}s (tx: {tx_hash})")]
    TxTimeout { tx_hash: String, timeout_seconds: u64 },

    #[error("routing engine error: {reason}")]
    Routing { reason: String },

    #[error("registry fetch failed: {reason}")]
    Registry { reason: String },

    // -- Encoding -----------------------------------------------------------
    #[error("encoding error: {0}")]
    Encoding(String),

    // -- Forwarded errors ---------------------------------------------------
    #[error(transparent)]
    Alloy(#[from] alloy::transports::TransportError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LeverageError {
    /// Map the variant onto its error class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::ContractNotFound { .. } | Self::RouteNotFound { .. } => ErrorKind::NotFound,
            Self::SlippageOutOfRange { .. } | Self::InvalidAsset { .. } | Self::Validation(_) => {
                ErrorKind::Validation
            }
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::ReadFailed { .. }
            | Self::SimulationFailed { .. }
            | Self::SubmissionFailed { .. }
            | Self::TxReverted { .. }
            | Self::ReceiptFailed { .. }
            | Self::TxTimeout { .. }
            | Self::Routing { .. }
            | Self::Registry { .. }
            | Self::Alloy(_)
            | Self::Reqwest(_)
            | Self::SerdeJson(_)
            | Self::Io(_) => ErrorKind::RemoteCall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            LeverageError::Config("no chain".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            LeverageError::ContractNotFound {
                role: ContractRole::PositionLedger,
                chain_id: 1
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            LeverageError::SlippageOutOfRange { bps: 10_001 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            LeverageError::Encoding("hop count".into()).kind(),
            ErrorKind::Encoding
        );
        assert_eq!(
            LeverageError::SimulationFailed { reason: "revert".into() }.kind(),
            ErrorKind::RemoteCall
        );
    }

    #[test]
    fn contract_not_found_message_names_role() {
        let err = LeverageError::ContractNotFound {
            role: ContractRole::ExpiredVault,
            chain_id: 1,
        };
        assert_eq!(
            err.to_string(),
            "contract ExpiredVault not found in registry for chain 1"
        );
    }
}
