use crate::graph::GraphClient;
use crate::models::Campaign;
use crate::session::SessionState;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::{sync::Mutex, task::JoinHandle};

/// Last campaign list fetched per account. The one-shot creative refetch
/// writes its result here, guarded by the account id so a stale task cannot
/// clobber a newer selection; once complete, the campaigns route serves the
/// cached list instead of going upstream again.
#[derive(Debug, Default)]
pub struct CampaignCache {
    pub account_id: Option<String>,
    pub campaigns: Vec<Campaign>,
}

#[derive(Clone)]
pub struct AppState {
    pub client: GraphClient,
    pub session_path: PathBuf,
    pub session: Arc<Mutex<SessionState>>,
    pub campaigns: Arc<Mutex<CampaignCache>>,
    pub creative_refetch: Arc<Mutex<Option<JoinHandle<()>>>>,
    pub creative_refetch_delay: Duration,
}

impl AppState {
    pub fn new(
        client: GraphClient,
        session_path: PathBuf,
        session: SessionState,
        creative_refetch_delay: Duration,
    ) -> Self {
        Self {
            client,
            session_path,
            session: Arc::new(Mutex::new(session)),
            campaigns: Arc::new(Mutex::new(CampaignCache::default())),
            creative_refetch: Arc::new(Mutex::new(None)),
            creative_refetch_delay,
        }
    }
}
