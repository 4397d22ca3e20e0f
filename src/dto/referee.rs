//! DTO definitions used by the referee REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{TeamId, Violation},
    dto::validation::validate_team_number,
};

/// Violation as submitted by and echoed back to the referee page.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct ViolationRequest {
    #[validate(custom(function = "validate_team_number"))]
    pub team: TeamId,
    #[validate(length(min = 1, message = "Rule must not be empty"))]
    pub rule: String,
    #[validate(length(min = 1, message = "Severity must not be empty"))]
    pub severity: String,
}

impl From<ViolationRequest> for Violation {
    fn from(request: ViolationRequest) -> Self {
        Self {
            number: request.team,
            rule_id: request.rule,
            severity: request.severity,
        }
    }
}

impl From<Violation> for ViolationRequest {
    fn from(violation: Violation) -> Self {
        Self {
            team: violation.number,
            rule: violation.rule_id,
            severity: violation.severity,
        }
    }
}
