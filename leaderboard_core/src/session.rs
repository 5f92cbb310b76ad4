use crate::{LeaderboardError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a live-stream session: a 24 character hex object id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() == 24 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(trimmed.to_ascii_lowercase()))
        } else {
            Err(LeaderboardError::InvalidSessionId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionId {
    type Err = LeaderboardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inclusive range of unix seconds; an open end means "until now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: Option<i64>,
}

impl TimeWindow {
    pub fn new(start: i64, end: Option<i64>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: i64, now: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end.unwrap_or(now)
    }
}

/// Session as held by the session store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub token_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_burns: Decimal,
    pub participant_count: u64,
}

impl SessionRecord {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(
            self.start_time.timestamp(),
            self.end_time.map(|end| end.timestamp()),
        )
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.to_string(),
            start_time: self.start_time,
            end_time: self.end_time,
            is_active: self.is_active,
            total_burns: self.total_burns,
            participant_count: self.participant_count,
        }
    }
}

/// Session block embedded in a leaderboard response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_burns: Decimal,
    pub participant_count: u64,
}
