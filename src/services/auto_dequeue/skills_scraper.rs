//! Client for the tournament manager's public web pages.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode, header};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{dao::models::TeamInfo, services::auto_dequeue::tracker::TeamSkills};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const USER_AGENT: &str = "Skills-Queue-Back/0.3";
const SKILLS_PATH: &str = "skills";
const ROSTER_PATH: &str = "division1/teams";
const SKILLS_ROW_SELECTOR: &str =
    "table.table-striped.table-bordered.table-condensed.table-centered tbody tr";
const ROSTER_ROW_SELECTOR: &str = "tbody tr";
const CELL_SELECTOR: &str = "td";

/// Convenient result alias returning [`ScrapeError`] failures.
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Failures while fetching or reading a tournament manager page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Nothing is listening at the configured address.
    #[error("connection to `{url}` refused; is the tournament manager running?")]
    ConnectionRefused {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The page did not answer within the request timeout.
    #[error("request to `{url}` timed out")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("`{url}` answered with HTTP {status}")]
    HttpStatus { url: String, status: StatusCode },
    /// Any other transport failure.
    #[error("request to `{url}` failed")]
    Other {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The page could not be interpreted.
    #[error("failed to parse page: {0}")]
    Parse(String),
}

impl ScrapeError {
    fn from_request(url: &str, source: reqwest::Error) -> Self {
        let url = url.to_string();
        if source.is_timeout() {
            ScrapeError::Timeout { url, source }
        } else if source.is_connect() {
            ScrapeError::ConnectionRefused { url, source }
        } else if let Some(status) = source.status() {
            ScrapeError::HttpStatus { url, status }
        } else {
            ScrapeError::Other { url, source }
        }
    }
}

/// Source of per-team attempt counts polled by the auto-dequeue engine.
pub trait SkillsSource: Send + Sync {
    /// Fetch the current skills table. No retries; the caller decides what to do on failure.
    fn fetch_skills(&self) -> BoxFuture<'static, ScrapeResult<Vec<TeamSkills>>>;
}

/// HTTP client bound to one tournament manager instance.
#[derive(Clone)]
pub struct TournamentClient {
    client: Client,
    base_url: Arc<str>,
}

impl TournamentClient {
    /// Build a client for `base_url` (e.g. `http://10.0.0.3`).
    pub fn new(base_url: &str) -> ScrapeResult<Self> {
        let base_url = Arc::<str>::from(base_url.trim_end_matches('/'));
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| ScrapeError::Other {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self { client, base_url })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and parse the skills results page.
    pub async fn fetch_skills_table(&self) -> ScrapeResult<Vec<TeamSkills>> {
        let html = self.get_page(SKILLS_PATH).await?;
        let rows = parse_skills_table(&html)?;
        info!(teams = rows.len(), "scraped skills table");
        Ok(rows)
    }

    /// Fetch and parse the division team list.
    pub async fn fetch_roster(&self) -> ScrapeResult<Vec<TeamInfo>> {
        let html = self.get_page(ROSTER_PATH).await?;
        parse_roster(&html)
    }

    async fn get_page(&self, path: &str) -> ScrapeResult<String> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "fetching tournament manager page");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "text/html")
            .send()
            .await
            .map_err(|err| ScrapeError::from_request(&url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus { url, status });
        }

        response
            .text()
            .await
            .map_err(|err| ScrapeError::from_request(&url, err))
    }
}

impl SkillsSource for TournamentClient {
    fn fetch_skills(&self) -> BoxFuture<'static, ScrapeResult<Vec<TeamSkills>>> {
        let client = self.clone();
        Box::pin(async move { client.fetch_skills_table().await })
    }
}

fn selector(raw: &str) -> ScrapeResult<Selector> {
    Selector::parse(raw).map_err(|err| ScrapeError::Parse(format!("selector `{raw}`: {err}")))
}

fn cell_texts(row: ElementRef<'_>, cells: &Selector) -> Vec<String> {
    row.select(cells)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

/// Extract `(team, autonomous, driving)` from the skills results table.
///
/// Rows with fewer than three cells are ignored; rows with an empty team or
/// non-integer counts are skipped with a warning.
pub fn parse_skills_table(html: &str) -> ScrapeResult<Vec<TeamSkills>> {
    let rows_selector = selector(SKILLS_ROW_SELECTOR)?;
    let cells_selector = selector(CELL_SELECTOR)?;
    let document = Html::parse_document(html);

    let mut teams = Vec::new();
    for row in document.select(&rows_selector) {
        let cells = cell_texts(row, &cells_selector);
        if cells.len() < 3 {
            continue;
        }

        let (team, autonomous, driving) = (&cells[0], &cells[1], &cells[2]);
        match (autonomous.parse::<i64>(), driving.parse::<i64>()) {
            (Ok(autonomous), Ok(driving)) if !team.is_empty() => teams.push(TeamSkills {
                team: team.clone(),
                autonomous,
                driving,
            }),
            _ => warn!(
                team = %team,
                autonomous = %autonomous,
                driving = %driving,
                "skipping malformed skills row"
            ),
        }
    }

    Ok(teams)
}

/// Extract `(number, organization)` from the division teams page.
pub fn parse_roster(html: &str) -> ScrapeResult<Vec<TeamInfo>> {
    let rows_selector = selector(ROSTER_ROW_SELECTOR)?;
    let cells_selector = selector(CELL_SELECTOR)?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&rows_selector)
        .filter_map(|row| {
            let mut cells = cell_texts(row, &cells_selector);
            if cells.first().is_none_or(|number| number.is_empty()) {
                return None;
            }
            let organization = if cells.len() > 3 {
                cells.swap_remove(3)
            } else {
                String::new()
            };
            Some(TeamInfo {
                number: cells.swap_remove(0),
                organization,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills_page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table class="table table-striped table-bordered table-condensed table-centered">
              <thead><tr><th>Team</th><th>Programming</th><th>Driver</th></tr></thead>
              <tbody>{rows}</tbody>
            </table></body></html>"#
        )
    }

    #[test]
    fn parses_well_formed_rows_in_order() {
        let html = skills_page(
            "<tr><td>502A</td><td>1</td><td>2</td><td>Extra</td></tr>
             <tr><td> 78X </td><td> 0 </td><td>3</td></tr>",
        );

        let rows = parse_skills_table(&html).unwrap();
        assert_eq!(
            rows,
            vec![
                TeamSkills {
                    team: "502A".into(),
                    autonomous: 1,
                    driving: 2
                },
                TeamSkills {
                    team: "78X".into(),
                    autonomous: 0,
                    driving: 3
                },
            ]
        );
    }

    #[test]
    fn skips_malformed_and_short_rows() {
        let html = skills_page(
            "<tr><td>1A</td><td>n/a</td><td>2</td></tr>
             <tr><td></td><td>1</td><td>2</td></tr>
             <tr><td>2B</td><td>1</td></tr>
             <tr><td>3C</td><td>4</td><td>5</td></tr>",
        );

        let rows = parse_skills_table(&html).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team, "3C");
    }

    #[test]
    fn ignores_tables_without_the_expected_classes() {
        let html = "<table><tbody><tr><td>1A</td><td>1</td><td>1</td></tr></tbody></table>";
        assert!(parse_skills_table(html).unwrap().is_empty());
    }

    #[test]
    fn roster_reads_number_and_organization() {
        let html = "<table><tbody>
            <tr><td>502A</td><td>Name</td><td>City</td><td>North High</td></tr>
            <tr><td></td><td></td></tr>
            <tr><td>7B</td></tr>
        </tbody></table>";

        let roster = parse_roster(html).unwrap();
        assert_eq!(
            roster,
            vec![
                TeamInfo {
                    number: "502A".into(),
                    organization: "North High".into()
                },
                TeamInfo {
                    number: "7B".into(),
                    organization: String::new()
                },
            ]
        );
    }

    #[tokio::test]
    async fn unreachable_host_maps_to_transport_error() {
        let client = TournamentClient::new("http://127.0.0.1:9/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9");

        let err = client.fetch_skills_table().await.unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::ConnectionRefused { .. } | ScrapeError::Other { .. } | ScrapeError::Timeout { .. }
        ));
    }
}
