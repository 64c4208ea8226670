//! In-memory agent store

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use crowd_core::{AgentResult, AgentRunner, RunStatus};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

/// Listing view of an agent; never carries the api key
#[derive(Clone, Debug, Serialize)]
pub struct AgentInfo {
    pub agent_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub agent_type: String,
    pub provider: String,
    pub model: String,
    pub creation_time: DateTime<Utc>,
    pub running: bool,
}

#[derive(Clone, Debug)]
struct Profile {
    provider: String,
    model: String,
}

/// One stored agent. The runner mutex serializes runs and model switches;
/// the status and the profile and last-result snapshots can be read while
/// something holds it.
pub struct AgentEntry {
    pub id: String,
    pub name: String,
    pub agent_type: String,
    pub created_at: DateTime<Utc>,
    pub runner: Mutex<AgentRunner>,
    status: RunStatus,
    profile: RwLock<Profile>,
    last_result: RwLock<Option<AgentResult>>,
}

impl AgentEntry {
    fn new(id: String, runner: AgentRunner) -> Self {
        let agent = runner.agent();
        Self {
            name: agent.name.clone(),
            agent_type: agent.agent_type.clone(),
            created_at: Utc::now(),
            status: runner.status(),
            profile: RwLock::new(Profile {
                provider: agent.provider.clone(),
                model: runner.model().full_name(),
            }),
            last_result: RwLock::new(runner.last_result().cloned()),
            runner: Mutex::new(runner),
            id,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Refresh the snapshots after a run or a model switch
    pub async fn sync(&self, runner: &AgentRunner) {
        {
            let mut profile = self.profile.write().await;
            profile.provider.clone_from(&runner.agent().provider);
            profile.model = runner.model().full_name();
        }
        *self.last_result.write().await = runner.last_result().cloned();
    }

    pub async fn info(&self) -> AgentInfo {
        let profile = self.profile.read().await.clone();
        AgentInfo {
            agent_id: self.id.clone(),
            name: self.name.clone(),
            agent_type: self.agent_type.clone(),
            provider: profile.provider,
            model: profile.model,
            creation_time: self.created_at,
            running: self.is_running(),
        }
    }

    /// Last result as of the latest sync; never waits for the runner
    pub async fn last_result(&self) -> Option<AgentResult> {
        self.last_result.read().await.clone()
    }
}

/// Agent id: lowercased name with every char outside `[a-z0-9_-]` replaced
/// by `_`, plus 8 random hex chars. Ids are used as file names.
pub fn create_agent_id(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => c,
            _ => '_',
        })
        .collect();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{slug}_{}", &suffix[..8])
}

#[derive(Default)]
pub struct AgentStore {
    agents: RwLock<HashMap<String, Arc<AgentEntry>>>,
}

impl AgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a runner under a fresh id
    pub async fn insert(&self, runner: AgentRunner) -> Arc<AgentEntry> {
        let mut agents = self.agents.write().await;
        let mut id = create_agent_id(&runner.agent().name);
        while agents.contains_key(&id) {
            id = create_agent_id(&runner.agent().name);
        }

        let entry = Arc::new(AgentEntry::new(id.clone(), runner));
        agents.insert(id, Arc::clone(&entry));
        entry
    }

    pub async fn get(&self, id: &str) -> Option<Arc<AgentEntry>> {
        self.agents.read().await.get(id).cloned()
    }

    /// All agents, oldest first
    pub async fn list(&self) -> Vec<Arc<AgentEntry>> {
        let mut entries: Vec<_> = self.agents.read().await.values().cloned().collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        entries
    }

    pub async fn remove(&self, id: &str) -> Option<Arc<AgentEntry>> {
        self.agents.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }
}
