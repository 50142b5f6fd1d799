//! Request lifecycle state machine
//!
//! `RequestStatus` is the single source of truth for the legal transition
//! graph. Every mutation path in the crate routes through
//! [`check_transition`], so the audit trail can only ever record legal
//! edges. The six Spanish-named states are the canonical set.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{AppError, Result};

/// Status of a certificate request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Initial state, set at submission
    Recibido,
    EnValidacion,
    Observado,
    Aprobado,
    /// Terminal: rejected by an administrator or cancelled by the user
    Rechazado,
    /// Terminal: certificate eligible for generation
    Emitido,
}

impl RequestStatus {
    /// All states, in lifecycle order
    pub const ALL: [RequestStatus; 6] = [
        RequestStatus::Recibido,
        RequestStatus::EnValidacion,
        RequestStatus::Observado,
        RequestStatus::Aprobado,
        RequestStatus::Rechazado,
        RequestStatus::Emitido,
    ];

    /// Canonical database/API representation
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Recibido => "RECIBIDO",
            RequestStatus::EnValidacion => "EN_VALIDACION",
            RequestStatus::Observado => "OBSERVADO",
            RequestStatus::Aprobado => "APROBADO",
            RequestStatus::Rechazado => "RECHAZADO",
            RequestStatus::Emitido => "EMITIDO",
        }
    }

    /// Strict parse of the canonical representation. Unknown values
    /// (including the legacy English vocabulary) are rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "RECIBIDO" => Some(RequestStatus::Recibido),
            "EN_VALIDACION" => Some(RequestStatus::EnValidacion),
            "OBSERVADO" => Some(RequestStatus::Observado),
            "APROBADO" => Some(RequestStatus::Aprobado),
            "RECHAZADO" => Some(RequestStatus::Rechazado),
            "EMITIDO" => Some(RequestStatus::Emitido),
            _ => None,
        }
    }

    /// Legal transition targets from this state
    pub fn allowed_targets(self) -> &'static [RequestStatus] {
        match self {
            RequestStatus::Recibido => {
                &[RequestStatus::EnValidacion, RequestStatus::Rechazado]
            }
            RequestStatus::EnValidacion => &[
                RequestStatus::Observado,
                RequestStatus::Aprobado,
                RequestStatus::Rechazado,
            ],
            RequestStatus::Observado => &[
                RequestStatus::EnValidacion,
                RequestStatus::Aprobado,
                RequestStatus::Rechazado,
            ],
            RequestStatus::Aprobado => &[RequestStatus::Emitido],
            RequestStatus::Rechazado | RequestStatus::Emitido => &[],
        }
    }

    /// Check whether `target` is a legal next state
    pub fn can_transition_to(self, target: RequestStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// A terminal state has no outgoing edges
    pub fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate a transition against the legal-edge table
pub fn check_transition(from: RequestStatus, to: RequestStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_edges() {
        assert!(RequestStatus::Recibido.can_transition_to(RequestStatus::EnValidacion));
        assert!(RequestStatus::Recibido.can_transition_to(RequestStatus::Rechazado));
        assert!(RequestStatus::EnValidacion.can_transition_to(RequestStatus::Observado));
        assert!(RequestStatus::EnValidacion.can_transition_to(RequestStatus::Aprobado));
        assert!(RequestStatus::Observado.can_transition_to(RequestStatus::EnValidacion));
        assert!(RequestStatus::Observado.can_transition_to(RequestStatus::Aprobado));
        assert!(RequestStatus::Aprobado.can_transition_to(RequestStatus::Emitido));
    }

    #[test]
    fn test_illegal_edges() {
        assert!(!RequestStatus::Recibido.can_transition_to(RequestStatus::Emitido));
        assert!(!RequestStatus::Recibido.can_transition_to(RequestStatus::Aprobado));
        assert!(!RequestStatus::Aprobado.can_transition_to(RequestStatus::Rechazado));
        assert!(!RequestStatus::EnValidacion.can_transition_to(RequestStatus::Emitido));
        // No self loops after intake
        for status in RequestStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(RequestStatus::Emitido.is_terminal());
        assert!(RequestStatus::Rechazado.is_terminal());
        assert!(!RequestStatus::Recibido.is_terminal());
        assert!(!RequestStatus::Aprobado.is_terminal());
    }

    #[test]
    fn test_check_transition_reports_both_states() {
        let err = check_transition(RequestStatus::Recibido, RequestStatus::Emitido).unwrap_err();
        match err {
            AppError::InvalidTransition { from, to } => {
                assert_eq!(from, RequestStatus::Recibido);
                assert_eq!(to, RequestStatus::Emitido);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_round_trip() {
        for status in RequestStatus::ALL {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_parse_rejects_legacy_english_names() {
        for legacy in ["PENDING", "IN_REVIEW", "APPROVED", "ISSUED", "NEEDS_CORRECTION", "REJECTED"] {
            assert_eq!(RequestStatus::parse(legacy), None, "{legacy} must not parse");
        }
        assert_eq!(RequestStatus::parse("recibido"), None);
    }
}
