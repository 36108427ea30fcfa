// Live-match feed HTTP client.
//
// Two read operations against the third-party feed: fixture lineups
// (per-team formation string + starting eleven) and fixture detail
// (score, status, elapsed minutes, event list). Only the fields the
// reconciler consumes are modeled; everything else in the provider's
// payload is ignored by serde.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::config::FeedConfig;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed returned a malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("fixture {fixture_id} not present in feed response")]
    MissingFixture { fixture_id: u64 },
}

// ---------------------------------------------------------------------------
// Wire payloads (consumed fields only)
// ---------------------------------------------------------------------------

/// One starter as reported by the lineup endpoint. Feeds are not
/// guaranteed to supply a stable id or number for every player.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedPlayer {
    pub id: Option<u64>,
    pub name: String,
    pub number: Option<u32>,
}

/// One team's half of a fixture lineup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineupSide {
    pub team_id: Option<u64>,
    pub team_name: String,
    /// Feed formation string, e.g. "4-2-3-1". Absent or unparseable
    /// strings fall back to the default formation downstream.
    pub formation: Option<String>,
    pub starters: Vec<FeedPlayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixtureLineups {
    pub home: LineupSide,
    pub away: LineupSide,
}

/// A scoring or disciplinary event from the fixture detail endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedEvent {
    /// Event class, e.g. "Goal" or "Card".
    pub kind: String,
    /// Provider detail string, e.g. "Normal Goal", "Missed Penalty",
    /// "Yellow Card".
    pub detail: String,
    pub player_id: Option<u64>,
    pub player_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixtureDetail {
    pub score_home: u32,
    pub score_away: u32,
    /// Short status code, e.g. "NS", "1H", "FT".
    pub status_code: String,
    pub elapsed: Option<u32>,
    pub events: Vec<FeedEvent>,
}

/// Provider responses arrive wrapped in a `response` array; a fixture
/// that the feed doesn't know yields an empty array rather than an error
/// status.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "Vec::new")]
    response: Vec<T>,
}

// ---------------------------------------------------------------------------
// FeedApi
// ---------------------------------------------------------------------------

/// The two feed reads the reconciler depends on. A trait seam so tests
/// substitute a stub without network access.
#[async_trait]
pub trait FeedApi: Send + Sync {
    async fn fixture_lineups(&self, fixture_id: u64) -> Result<FixtureLineups, FeedError>;
    async fn fixture_detail(&self, fixture_id: u64) -> Result<FixtureDetail, FeedError>;
}

/// Fetch both halves of a fixture. Either failure aborts the pair, so a
/// reconcile never sees a lineup without its matching detail.
pub async fn fetch_fixture(
    api: &dyn FeedApi,
    fixture_id: u64,
) -> Result<(FixtureLineups, FixtureDetail), FeedError> {
    let lineups = api.fixture_lineups(fixture_id).await?;
    let detail = api.fixture_detail(fixture_id).await?;
    Ok((lineups, detail))
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

pub struct HttpFeedClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpFeedClient {
    pub fn from_config(feed: &FeedConfig) -> Self {
        HttpFeedClient {
            http: reqwest::Client::new(),
            base_url: feed.base_url.trim_end_matches('/').to_string(),
            api_key: feed.api_key.clone(),
        }
    }

    async fn get_first<T: DeserializeOwned>(
        &self,
        path: &str,
        fixture_id: u64,
    ) -> Result<T, FeedError> {
        let url = format!("{}/{path}?fixture={fixture_id}", self.base_url);
        let body = self
            .http
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        envelope
            .response
            .into_iter()
            .next()
            .ok_or(FeedError::MissingFixture { fixture_id })
    }
}

#[async_trait]
impl FeedApi for HttpFeedClient {
    async fn fixture_lineups(&self, fixture_id: u64) -> Result<FixtureLineups, FeedError> {
        self.get_first("fixtures/lineups", fixture_id).await
    }

    async fn fixture_detail(&self, fixture_id: u64) -> Result<FixtureDetail, FeedError> {
        self.get_first("fixtures", fixture_id).await
    }
}
