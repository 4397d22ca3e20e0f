//! Referee violation log operations.

use tracing::info;

use crate::{dao::models::Violation, error::ServiceError, state::SharedState};

/// Append a violation and notify clients.
pub async fn add_violation(
    state: &SharedState,
    violation: Violation,
) -> Result<Violation, ServiceError> {
    state.referee().add(violation.clone()).await?;
    info!(
        team = %violation.number,
        rule = %violation.rule_id,
        severity = %violation.severity,
        "violation logged"
    );
    state.broadcast_current().await;
    Ok(violation)
}

/// Remove the first violation matching team, rule and severity exactly.
pub async fn remove_violation(
    state: &SharedState,
    violation: Violation,
) -> Result<Violation, ServiceError> {
    if !state.referee().remove(&violation).await? {
        return Err(ServiceError::NotFound("violation not found".into()));
    }
    info!(
        team = %violation.number,
        rule = %violation.rule_id,
        severity = %violation.severity,
        "violation removed"
    );
    state.broadcast_current().await;
    Ok(violation)
}

/// All logged violations in the order they were reported.
pub async fn list_violations(state: &SharedState) -> Vec<Violation> {
    state.referee().violations().await
}
