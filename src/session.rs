use crate::daterange::{DateRange, RangePreset, RangeSelection};
use crate::errors::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::error;

/// The selection that survives across requests: the chosen ad account and
/// reporting window. This is the whole persistence surface; insight rows are
/// refetched on every change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub account_id: Option<String>,
    pub preset: RangePreset,
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl SessionState {
    /// State emitted when nothing is stored yet: no account, last 30 days.
    pub fn default_at(today: NaiveDate) -> Self {
        Self::from_selection(None, RangeSelection::default_at(today))
    }

    pub fn from_selection(account_id: Option<String>, selection: RangeSelection) -> Self {
        Self {
            account_id,
            preset: selection.preset,
            since: selection.range.since,
            until: selection.range.until,
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            since: self.since,
            until: self.until,
        }
    }
}

pub fn resolve_session_path() -> PathBuf {
    env::var("ADBOARD_SESSION_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/session.json"))
}

pub async fn load_session(path: &Path, today: NaiveDate) -> SessionState {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<SessionState>(&bytes) {
            // A hand-edited or corrupted file can hold an inverted window
            // that no PUT would have accepted.
            Ok(session) if session.since <= session.until => session,
            Ok(_) => {
                error!("stored session has an inverted date range");
                SessionState::default_at(today)
            }
            Err(err) => {
                error!("failed to parse session file: {err}");
                SessionState::default_at(today)
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => SessionState::default_at(today),
        Err(err) => {
            error!("failed to read session file: {err}");
            SessionState::default_at(today)
        }
    }
}

pub async fn persist_session(path: &Path, session: &SessionState) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(session).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("adboard_session_{tag}_{}_{nanos}.json", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_yields_default_selection() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let session = load_session(&scratch_path("missing"), today).await;
        assert_eq!(session.preset, RangePreset::Last30Days);
        assert_eq!(session.account_id, None);
    }

    #[tokio::test]
    async fn inverted_stored_range_falls_back_to_default() {
        let path = scratch_path("inverted");
        fs::write(
            &path,
            r#"{"account_id":"act_1","preset":"custom","since":"2026-03-10","until":"2026-03-01"}"#,
        )
        .await
        .unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let session = load_session(&path, today).await;
        assert_eq!(session.preset, RangePreset::Last30Days);
        assert!(session.since <= session.until);

        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn stored_session_round_trips() {
        let path = scratch_path("roundtrip");
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let stored = SessionState::from_selection(
            Some("act_1".to_string()),
            RangeSelection::default_at(today),
        );

        persist_session(&path, &stored).await.unwrap();
        let loaded = load_session(&path, today).await;
        assert_eq!(loaded.account_id.as_deref(), Some("act_1"));
        assert_eq!(loaded.preset, stored.preset);
        assert_eq!(loaded.range(), stored.range());

        let _ = fs::remove_file(&path).await;
    }
}
