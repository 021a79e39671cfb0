use crate::daterange::DateRange;
use crate::models::{AdAccount, AdSet, Campaign, DataEnvelope, InsightRow};
use serde::de::DeserializeOwned;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

const INSIGHT_FIELDS: &str = "date_start,impressions,clicks,spend,reach,actions";

/// Dimension sets the insights endpoint can break rows down by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakdown {
    Demographics,
    Placements,
    Devices,
}

impl Breakdown {
    pub fn as_param(self) -> &'static str {
        match self {
            Breakdown::Demographics => "age,gender",
            Breakdown::Placements => "publisher_platform,platform_position,impression_device",
            Breakdown::Devices => "impression_device",
        }
    }
}

/// Query for one insights fetch: the calendar window plus how to slice it.
#[derive(Debug, Clone, Copy)]
pub struct InsightsQuery {
    pub range: DateRange,
    pub daily: bool,
    pub breakdown: Option<Breakdown>,
    pub actions: bool,
}

impl InsightsQuery {
    pub fn totals(range: DateRange) -> Self {
        Self {
            range,
            daily: false,
            breakdown: None,
            actions: false,
        }
    }

    pub fn daily(range: DateRange) -> Self {
        Self {
            daily: true,
            ..Self::totals(range)
        }
    }

    pub fn breakdown(range: DateRange, breakdown: Breakdown) -> Self {
        Self {
            breakdown: Some(breakdown),
            ..Self::totals(range)
        }
    }

    pub fn actions(range: DateRange) -> Self {
        Self {
            actions: true,
            ..Self::totals(range)
        }
    }
}

/// Client for the Graph-style insights REST API. Requests carry no retry
/// policy beyond reqwest's defaults; failures surface to the caller.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GraphClient {
    pub fn new(base_url: String, access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    pub async fn list_ad_accounts(&self) -> Result<Vec<AdAccount>, reqwest::Error> {
        self.get_data("me/adaccounts", &[("fields", "id,name")]).await
    }

    pub async fn list_campaigns(&self, account_id: &str) -> Result<Vec<Campaign>, reqwest::Error> {
        self.get_data(
            &format!("{account_id}/campaigns"),
            &[("fields", "id,name,status,creative{id,thumbnail_url}")],
        )
        .await
    }

    pub async fn list_ad_sets(&self, campaign_id: &str) -> Result<Vec<AdSet>, reqwest::Error> {
        self.get_data(&format!("{campaign_id}/adsets"), &[("fields", "id,name,status")])
            .await
    }

    pub async fn insights(
        &self,
        account_id: &str,
        query: &InsightsQuery,
    ) -> Result<Vec<InsightRow>, reqwest::Error> {
        let since = query.range.since.to_string();
        let until = query.range.until.to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("fields", INSIGHT_FIELDS),
            ("since", &since),
            ("until", &until),
        ];
        if query.daily {
            params.push(("time_increment", "1"));
        }
        if let Some(breakdown) = query.breakdown {
            params.push(("breakdowns", breakdown.as_param()));
        }
        if query.actions {
            params.push(("action_breakdowns", "action_type"));
        }

        self.get_data(&format!("{account_id}/insights"), &params).await
    }

    async fn get_data<T>(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<T>, reqwest::Error>
    where
        T: DeserializeOwned,
    {
        let envelope: DataEnvelope<T> = self
            .http
            .get(format!("{}/{path}", self.base_url))
            .query(&[("access_token", self.access_token.as_str())])
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(envelope.data)
    }
}
