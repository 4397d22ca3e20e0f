//! Team roster for the kiosk's team picker.

use tracing::{debug, info};

use crate::{
    dao::{json_file, models::TeamInfo},
    error::ServiceError,
    services::auto_dequeue::skills_scraper::TournamentClient,
    state::SharedState,
};

/// Teams registered for the event.
///
/// Offline mode reads `teams_offline.json` from the data directory; otherwise the
/// tournament manager's division team list is scraped on every call.
pub async fn list_teams(state: &SharedState) -> Result<Vec<TeamInfo>, ServiceError> {
    let config = state.config();
    if config.tournament.offline_mode {
        let path = config.offline_teams_path();
        debug!(path = %path.display(), "reading offline roster");
        return Ok(json_file::read(&path).await?);
    }

    let client = TournamentClient::new(&config.tournament.base_url)?;
    let teams = client.fetch_roster().await?;
    info!(count = teams.len(), "fetched roster from tournament manager");
    Ok(teams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[tokio::test]
    async fn offline_roster_comes_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::with_data_dir(dir.path());
        config.tournament.offline_mode = true;
        tokio::fs::write(
            config.offline_teams_path(),
            r#"[{ "number": "502A", "organization": "Hilltop High" }]"#,
        )
        .await
        .unwrap();

        let state = AppState::load(config).await.unwrap();
        let teams = list_teams(&state).await.unwrap();
        assert_eq!(
            teams,
            vec![TeamInfo {
                number: "502A".into(),
                organization: "Hilltop High".into(),
            }]
        );
    }

    #[tokio::test]
    async fn missing_offline_roster_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::with_data_dir(dir.path());
        config.tournament.offline_mode = true;

        let state = AppState::load(config).await.unwrap();
        assert!(matches!(
            list_teams(&state).await,
            Err(ServiceError::Storage(_))
        ));
    }
}
