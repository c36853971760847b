use super::domain::{DocumentRequest, PickupOption, RequestStatus};
use super::issuance;

/// Who is attempting a transition. Authentication happens upstream; the
/// policy only cares about the privilege tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Resident,
    Admin,
}

/// Operations that may move a request between lifecycle states.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestAction {
    /// Generic admin move to any canonical status.
    AdvanceTo(RequestStatus),
    /// Shorthand for the payment review outcome on an uploaded proof.
    ApprovePayment,
    RejectPayment,
    /// Resident attaches proof of an online payment.
    SubmitPaymentProof { url: String },
    /// Download or over-the-counter claim of the generated certificate.
    IssueDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("request is {0} and accepts no further changes")]
    Terminal(RequestStatus),
    #[error("{actor:?} may not perform this action")]
    ActorNotPermitted { actor: Actor },
    #[error("'{0}' is not a recognized status")]
    InvalidTarget(String),
    #[error("request carries unrecognized status '{0}' and must be repaired first")]
    UnrecognizedStatus(String),
    #[error("expected status {expected}, found {found}")]
    PreconditionFailed {
        expected: RequestStatus,
        found: RequestStatus,
    },
    #[error("payment proof applies only to online delivery")]
    OnlineDeliveryRequired,
    #[error("document is not ready for pickup")]
    NotReadyForClaim,
}

/// Decide the next status for `(current request, actor, action)`.
///
/// Pure rule evaluation: no persistence and no audit emission happens here.
/// The service layer applies the returned status and records side effects.
pub fn evaluate(
    request: &DocumentRequest,
    actor: Actor,
    action: &RequestAction,
) -> Result<RequestStatus, TransitionError> {
    match action {
        RequestAction::AdvanceTo(target) => {
            if actor != Actor::Admin {
                return Err(TransitionError::ActorNotPermitted { actor });
            }
            if let RequestStatus::Unknown(raw) = target {
                return Err(TransitionError::InvalidTarget(raw.clone()));
            }
            if let RequestStatus::Unknown(raw) = &request.status {
                return Err(TransitionError::UnrecognizedStatus(raw.clone()));
            }
            if request.status.is_terminal() {
                return Err(TransitionError::Terminal(request.status.clone()));
            }
            Ok(target.clone())
        }
        RequestAction::ApprovePayment => {
            require_admin(actor)?;
            require_status(request, RequestStatus::PaymentSent)?;
            Ok(RequestStatus::ReadyToClaim)
        }
        RequestAction::RejectPayment => {
            require_admin(actor)?;
            require_status(request, RequestStatus::PaymentSent)?;
            Ok(RequestStatus::Rejected)
        }
        RequestAction::SubmitPaymentProof { .. } => {
            if actor != Actor::Resident {
                return Err(TransitionError::ActorNotPermitted { actor });
            }
            if request.pickup_option != PickupOption::Online {
                return Err(TransitionError::OnlineDeliveryRequired);
            }
            require_status(request, RequestStatus::Approved)?;
            Ok(RequestStatus::PaymentSent)
        }
        RequestAction::IssueDocument => {
            // Re-downloading a completed certificate is an idempotent no-op.
            if request.status == RequestStatus::Completed {
                return Ok(RequestStatus::Completed);
            }
            if request.status == RequestStatus::Rejected {
                return Err(TransitionError::Terminal(request.status.clone()));
            }
            if let RequestStatus::Unknown(raw) = &request.status {
                return Err(TransitionError::UnrecognizedStatus(raw.clone()));
            }
            if !issuance::can_download(request.pickup_option, &request.status) {
                return Err(TransitionError::NotReadyForClaim);
            }
            Ok(RequestStatus::Completed)
        }
    }
}

fn require_admin(actor: Actor) -> Result<(), TransitionError> {
    if actor == Actor::Admin {
        Ok(())
    } else {
        Err(TransitionError::ActorNotPermitted { actor })
    }
}

fn require_status(
    request: &DocumentRequest,
    expected: RequestStatus,
) -> Result<(), TransitionError> {
    if request.status == expected {
        Ok(())
    } else {
        Err(TransitionError::PreconditionFailed {
            expected,
            found: request.status.clone(),
        })
    }
}
