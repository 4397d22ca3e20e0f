//! DTO definitions used by the queue REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{QueueEntry, SettingsPatch, TeamId},
    dto::validation::validate_team_number,
};

/// Kiosk registration or operator removal of a team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TeamRequest {
    #[validate(custom(function = "validate_team_number"))]
    pub team: TeamId,
}

/// Call the next team, optionally onto a specific field.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ServeRequest {
    #[serde(default)]
    pub field: Option<u32>,
}

/// Send a team back from a field into the waiting line.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UnserveRequest {
    #[validate(custom(function = "validate_team_number"))]
    pub team: TeamId,
    /// 1-based position to reinsert at; the head of the line when omitted.
    #[serde(default)]
    pub amount: Option<usize>,
}

/// Acknowledgement echoing the team number.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamResponse {
    pub team: TeamId,
}

/// Entry just moved onto a field.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServedResponse {
    pub team: QueueEntry,
}

/// Partial update of the registration settings.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub skills_cutoff_time: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, message = "Turnover time must be >= 1"))]
    pub skills_turnover_time: Option<u32>,
    #[serde(default)]
    pub skills_queue_manually_open: Option<bool>,
    #[serde(default)]
    pub skills_queue_closed: Option<bool>,
    #[serde(default)]
    #[validate(range(min = 1, message = "Number of fields must be >= 1"))]
    pub number_of_fields: Option<u32>,
}

impl From<UpdateSettingsRequest> for SettingsPatch {
    fn from(request: UpdateSettingsRequest) -> Self {
        Self {
            skills_cutoff_time: request.skills_cutoff_time,
            skills_turnover_time: request.skills_turnover_time,
            skills_queue_manually_open: request.skills_queue_manually_open,
            skills_queue_closed: request.skills_queue_closed,
            number_of_fields: request.number_of_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_request_rejects_zero_turnover_and_fields() {
        let request: UpdateSettingsRequest =
            serde_json::from_str(r#"{ "skillsTurnoverTime": 0, "numberOfFields": 0 }"#).unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("skills_turnover_time"));
        assert!(fields.contains_key("number_of_fields"));
    }

    #[test]
    fn settings_request_converts_into_patch() {
        let request: UpdateSettingsRequest = serde_json::from_str(
            r#"{ "skillsCutoffTime": "2/6 3:00 PM", "skillsQueueManuallyOpen": true }"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());

        let patch = SettingsPatch::from(request);
        assert_eq!(patch.skills_cutoff_time.as_deref(), Some("2/6 3:00 PM"));
        assert_eq!(patch.skills_queue_manually_open, Some(true));
        assert_eq!(patch.skills_turnover_time, None);
    }

    #[test]
    fn team_request_validates_number() {
        let ok: TeamRequest = serde_json::from_str(r#"{ "team": "502A" }"#).unwrap();
        assert!(ok.validate().is_ok());
        let blank: TeamRequest = serde_json::from_str(r#"{ "team": "" }"#).unwrap();
        assert!(blank.validate().is_err());
    }
}
