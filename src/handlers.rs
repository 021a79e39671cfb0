use crate::daterange::{DateRange, RangePreset, RangeSelection};
use crate::errors::AppError;
use crate::export::{export_filename, write_placements_csv};
use crate::graph::{Breakdown, InsightsQuery};
use crate::metrics::{
    aggregate_all, aggregate_by, aggregate_placements, normalize_series, percent_change,
    sum_actions, top_by, ActionTotal, Direction, GroupedMetrics, MetricKind, PlacementGroup,
};
use crate::models::{AdAccount, AdSet, AggregateMetrics, Campaign, InsightRow};
use crate::session::{persist_session, SessionState};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

pub async fn index() -> Html<&'static str> {
    Html(render_index())
}

pub async fn get_accounts(State(state): State<AppState>) -> Result<Json<Vec<AdAccount>>, AppError> {
    Ok(Json(state.client.list_ad_accounts().await?))
}

#[derive(Debug, Deserialize)]
pub struct AccountParam {
    account: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CampaignParam {
    campaign: Option<String>,
}

/// Query for the insight views. `since`/`until` must come together; with
/// neither present the stored session window applies. `top` truncates a
/// grouped view to the N biggest spenders.
#[derive(Debug, Deserialize)]
pub struct InsightParams {
    account: Option<String>,
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
    top: Option<usize>,
}

pub async fn get_campaigns(
    State(state): State<AppState>,
    Query(params): Query<AccountParam>,
) -> Result<Json<Vec<Campaign>>, AppError> {
    let account = params
        .account
        .ok_or_else(|| AppError::bad_request("account query parameter is required"))?;

    // Serve the cached list once the one-shot refetch has completed it; an
    // incomplete or stale cache goes back upstream.
    {
        let cache = state.campaigns.lock().await;
        if cache.account_id.as_deref() == Some(account.as_str())
            && !cache.campaigns.is_empty()
            && cache.campaigns.iter().all(|c| c.creative.is_some())
        {
            return Ok(Json(cache.campaigns.clone()));
        }
    }

    // A new fetch supersedes any refetch still pending.
    if let Some(pending) = state.creative_refetch.lock().await.take() {
        pending.abort();
    }

    let campaigns = state.client.list_campaigns(&account).await?;
    {
        let mut cache = state.campaigns.lock().await;
        cache.account_id = Some(account.clone());
        cache.campaigns = campaigns.clone();
    }

    if campaigns.iter().any(|c| c.creative.is_none()) {
        schedule_creative_refetch(&state, account).await;
    }

    Ok(Json(campaigns))
}

/// One delayed re-request when the upstream returned campaigns without
/// creative data yet. Single shot, no backoff; aborted by the next
/// selection change.
async fn schedule_creative_refetch(state: &AppState, account: String) {
    let client = state.client.clone();
    let cache = Arc::clone(&state.campaigns);
    let delay = state.creative_refetch_delay;

    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match client.list_campaigns(&account).await {
            Ok(campaigns) => {
                let mut cache = cache.lock().await;
                if cache.account_id.as_deref() == Some(account.as_str()) {
                    cache.campaigns = campaigns;
                }
            }
            Err(err) => warn!("creative refetch for {account} failed: {err}"),
        }
    });

    // Replacing a still-pending task aborts it; otherwise a racing request
    // could leave behind a handle nothing can cancel.
    if let Some(previous) = state.creative_refetch.lock().await.replace(task) {
        previous.abort();
    }
}

/// Ad-set fetches are deliberately retry-free: a failure surfaces
/// immediately rather than being re-attempted.
pub async fn get_ad_sets(
    State(state): State<AppState>,
    Query(params): Query<CampaignParam>,
) -> Result<Json<Vec<AdSet>>, AppError> {
    let campaign = params
        .campaign
        .ok_or_else(|| AppError::bad_request("campaign query parameter is required"))?;
    Ok(Json(state.client.list_ad_sets(&campaign).await?))
}

#[derive(Debug, Serialize)]
pub struct MetricChange {
    /// Raw signed change; `null` when the previous period was zero.
    pub pct: Option<f64>,
    /// Previous period zero, current positive: shown as "new", not a number.
    pub new: bool,
    /// Display hint derived from the metric's direction; `null` when the
    /// change is undefined or exactly zero.
    pub favorable: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ChangeSet {
    pub impressions: MetricChange,
    pub clicks: MetricChange,
    pub spend: MetricChange,
    pub reach: MetricChange,
    pub ctr: MetricChange,
    pub cpc: MetricChange,
    pub cpm: MetricChange,
    pub frequency: MetricChange,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub since: NaiveDate,
    pub until: NaiveDate,
    pub metrics: AggregateMetrics,
    pub changes: ChangeSet,
    pub has_data: bool,
    pub degraded: bool,
}

pub async fn get_summary(
    State(state): State<AppState>,
    Query(params): Query<InsightParams>,
) -> Result<Json<SummaryResponse>, AppError> {
    let (account, range) = resolve_query(&state, params).await?;

    let (current_rows, current_degraded) =
        fetch_or_empty(&state, &account, &InsightsQuery::totals(range)).await;
    let (previous_rows, previous_degraded) =
        fetch_or_empty(&state, &account, &InsightsQuery::totals(range.preceding())).await;

    let current = aggregate_all(&current_rows);
    let previous = aggregate_all(&previous_rows);

    Ok(Json(SummaryResponse {
        since: range.since,
        until: range.until,
        metrics: current,
        changes: ChangeSet {
            impressions: change_for(MetricKind::Impressions, &previous, &current),
            clicks: change_for(MetricKind::Clicks, &previous, &current),
            spend: change_for(MetricKind::Spend, &previous, &current),
            reach: change_for(MetricKind::Reach, &previous, &current),
            ctr: change_for(MetricKind::Ctr, &previous, &current),
            cpc: change_for(MetricKind::Cpc, &previous, &current),
            cpm: change_for(MetricKind::Cpm, &previous, &current),
            frequency: change_for(MetricKind::Frequency, &previous, &current),
        },
        has_data: !current.is_zero(),
        degraded: current_degraded || previous_degraded,
    }))
}

fn change_for(kind: MetricKind, previous: &AggregateMetrics, current: &AggregateMetrics) -> MetricChange {
    let prev = previous.value(kind);
    let cur = current.value(kind);
    let pct = percent_change(prev, cur);
    let favorable = pct.filter(|p| *p != 0.0).map(|p| match kind.direction() {
        Direction::LowerIsBetter => p < 0.0,
        Direction::HigherIsBetter => p > 0.0,
    });

    MetricChange {
        pct,
        new: prev == 0.0 && cur > 0.0,
        favorable,
    }
}

/// Insight-view payload. `degraded` marks an upstream failure the view
/// rendered as an empty data set instead of an error.
#[derive(Debug, Serialize)]
pub struct ViewResponse<T> {
    pub data: T,
    pub degraded: bool,
}

pub async fn get_series(
    State(state): State<AppState>,
    Query(params): Query<InsightParams>,
) -> Result<Json<ViewResponse<Vec<InsightRow>>>, AppError> {
    let (account, range) = resolve_query(&state, params).await?;
    let (rows, degraded) = fetch_or_empty(&state, &account, &InsightsQuery::daily(range)).await;
    Ok(Json(ViewResponse {
        data: normalize_series(rows),
        degraded,
    }))
}

#[derive(Debug, Serialize)]
pub struct DemographicsView {
    pub by_age: Vec<GroupedMetrics>,
    pub by_gender: Vec<GroupedMetrics>,
}

pub async fn get_demographics(
    State(state): State<AppState>,
    Query(params): Query<InsightParams>,
) -> Result<Json<ViewResponse<DemographicsView>>, AppError> {
    let (account, range) = resolve_query(&state, params).await?;
    let (rows, degraded) = fetch_or_empty(
        &state,
        &account,
        &InsightsQuery::breakdown(range, Breakdown::Demographics),
    )
    .await;
    Ok(Json(ViewResponse {
        data: DemographicsView {
            by_age: aggregate_by(&rows, |r| r.age.clone()),
            by_gender: aggregate_by(&rows, |r| r.gender.clone()),
        },
        degraded,
    }))
}

pub async fn get_placements(
    State(state): State<AppState>,
    Query(params): Query<InsightParams>,
) -> Result<Json<ViewResponse<Vec<PlacementGroup>>>, AppError> {
    let (account, range) = resolve_query(&state, params).await?;
    let (rows, degraded) = fetch_or_empty(
        &state,
        &account,
        &InsightsQuery::breakdown(range, Breakdown::Placements),
    )
    .await;
    Ok(Json(ViewResponse {
        data: aggregate_placements(&rows),
        degraded,
    }))
}

pub async fn get_devices(
    State(state): State<AppState>,
    Query(params): Query<InsightParams>,
) -> Result<Json<ViewResponse<Vec<GroupedMetrics>>>, AppError> {
    let top = params.top;
    let (account, range) = resolve_query(&state, params).await?;
    let (rows, degraded) = fetch_or_empty(
        &state,
        &account,
        &InsightsQuery::breakdown(range, Breakdown::Devices),
    )
    .await;

    let mut groups = aggregate_by(&rows, |r| r.device.clone());
    if let Some(limit) = top {
        groups = top_by(groups, MetricKind::Spend, limit);
    }

    Ok(Json(ViewResponse {
        data: groups,
        degraded,
    }))
}

pub async fn get_actions(
    State(state): State<AppState>,
    Query(params): Query<InsightParams>,
) -> Result<Json<ViewResponse<Vec<ActionTotal>>>, AppError> {
    let (account, range) = resolve_query(&state, params).await?;
    let (rows, degraded) = fetch_or_empty(&state, &account, &InsightsQuery::actions(range)).await;
    Ok(Json(ViewResponse {
        data: sum_actions(&rows),
        degraded,
    }))
}

pub async fn export_placements(
    State(state): State<AppState>,
    Query(params): Query<InsightParams>,
) -> Result<Response, AppError> {
    let (account, range) = resolve_query(&state, params).await?;
    let (rows, _) = fetch_or_empty(
        &state,
        &account,
        &InsightsQuery::breakdown(range, Breakdown::Placements),
    )
    .await;

    let body = write_placements_csv(&aggregate_placements(&rows))?;
    let filename = export_filename(Local::now().date_naive());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub account_id: Option<String>,
    pub preset: RangePreset,
    pub since: NaiveDate,
    pub until: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct SessionUpdate {
    pub account_id: Option<String>,
    pub preset: Option<RangePreset>,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.session.lock().await.clone();
    Json(to_session_response(session))
}

pub async fn put_session(
    State(state): State<AppState>,
    Json(payload): Json<SessionUpdate>,
) -> Result<Json<SessionResponse>, AppError> {
    let today = Local::now().date_naive();
    let mut session = state.session.lock().await;

    let selection = match (payload.preset, payload.since, payload.until) {
        (_, Some(since), Some(until)) if since <= until => {
            // Calendar pick: re-enters the matching preset when the window
            // equals its boundaries exactly.
            RangeSelection::custom(since, until, today)
        }
        (_, Some(_), Some(_)) => {
            return Err(AppError::bad_request("since must not be after until"));
        }
        (_, Some(_), None) | (_, None, Some(_)) => {
            return Err(AppError::bad_request("since and until must be supplied together"));
        }
        (Some(preset), None, None) => RangeSelection::preset_at(preset, today)
            .ok_or_else(|| AppError::bad_request("custom preset requires since and until"))?,
        (None, None, None) => RangeSelection {
            preset: session.preset,
            range: session.range(),
        },
    };

    let account_id = payload.account_id.or_else(|| session.account_id.clone());
    *session = SessionState::from_selection(account_id, selection);
    persist_session(&state.session_path, &session).await?;

    Ok(Json(to_session_response(session.clone())))
}

fn to_session_response(session: SessionState) -> SessionResponse {
    SessionResponse {
        account_id: session.account_id,
        preset: session.preset,
        since: session.since,
        until: session.until,
    }
}

/// Resolves which account and window an insight view targets. No account in
/// the query or the session is the "nothing selected" state: the request is
/// rejected before any upstream call.
async fn resolve_query(
    state: &AppState,
    params: InsightParams,
) -> Result<(String, DateRange), AppError> {
    let session = state.session.lock().await.clone();

    let account = params
        .account
        .or(session.account_id.clone())
        .ok_or_else(|| AppError::bad_request("no ad account selected"))?;

    let range = match (params.since, params.until) {
        (Some(since), Some(until)) if since <= until => DateRange { since, until },
        (None, None) => session.range(),
        _ => {
            return Err(AppError::bad_request(
                "since and until must be supplied together, with since <= until",
            ));
        }
    };

    Ok((account, range))
}

/// An upstream failure degrades the view to an empty data set; nothing here
/// is fatal.
async fn fetch_or_empty(
    state: &AppState,
    account: &str,
    query: &InsightsQuery,
) -> (Vec<InsightRow>, bool) {
    match state.client.insights(account, query).await {
        Ok(rows) => (rows, false),
        Err(err) => {
            warn!("insights fetch for {account} failed: {err}");
            (Vec::new(), true)
        }
    }
}
