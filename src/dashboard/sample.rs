//! In-memory provider with a small canned repository history.

use crate::config::Config;
use crate::dashboard::provider::{
    Commit, Deployment, DeploymentProvider, DeploymentRequest, DeploymentState, DeploymentStatus,
    Repository,
};
use crate::error::{GhdError, Result};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Repository selected by [`SampleProvider::demo`].
pub const DEMO_REPOSITORY: &str = "acme/webhooks";

#[derive(Default)]
struct History {
    deployments: Vec<Deployment>,
    statuses: HashMap<u64, Vec<DeploymentStatus>>,
    commits: Vec<Commit>,
}

impl History {
    fn insert(&mut self, mut deployment: Deployment) -> u64 {
        deployment.id = self.deployments.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let id = deployment.id;
        self.deployments.push(deployment);
        id
    }

    fn push_status(&mut self, id: u64, state: DeploymentState, created_at: &str) {
        let list = self.statuses.entry(id).or_default();
        let status_id = id * 100 + list.len() as u64;
        // Newest first, like the deployments list
        list.insert(
            0,
            DeploymentStatus {
                id: status_id,
                state,
                creator: "ghd".to_string(),
                created_at: created_at.to_string(),
                description: format!("Deployment {}", state.as_str().replace('_', " ")),
            },
        );
    }

    /// Record a deployment of `commit` with a queued status followed by `state`.
    fn record(
        &mut self,
        commit: &Commit,
        environment: String,
        production: bool,
        created_at: &str,
        state: DeploymentState,
    ) {
        let id = self.insert(Deployment {
            id: 0,
            git_ref: commit.sha.clone(),
            environment,
            task: "deploy".to_string(),
            description: commit.summary().to_string(),
            creator: commit.author.clone(),
            created_at: created_at.to_string(),
            transient: Some(false),
            production: Some(production),
            payload: None,
        });
        self.push_status(id, DeploymentState::Queued, created_at);
        self.push_status(id, state, created_at);
    }
}

pub struct SampleProvider {
    environments: Vec<String>,
    repositories: Vec<Repository>,
    histories: RefCell<HashMap<String, History>>,
    current: RefCell<Option<String>>,
    fail_next: RefCell<Option<String>>,
    calls: Cell<usize>,
}

impl SampleProvider {
    /// Provider without repositories, deploying along `environments`.
    pub fn new(environments: Vec<String>) -> Self {
        Self {
            environments,
            repositories: Vec::new(),
            histories: RefCell::new(HashMap::new()),
            current: RefCell::new(None),
            fail_next: RefCell::new(None),
            calls: Cell::new(0),
        }
    }

    /// Add an empty repository; the first one added becomes current.
    pub fn with_repository(mut self, full_name: &str, private: bool) -> Self {
        self.repositories.push(Repository {
            full_name: full_name.to_string(),
            private,
        });
        self.histories
            .get_mut()
            .insert(full_name.to_string(), History::default());
        let current = self.current.get_mut();
        if current.is_none() {
            *current = Some(full_name.to_string());
        }
        self
    }

    /// Forget the current repository, as if none was given on start.
    pub fn without_selection(mut self) -> Self {
        *self.current.get_mut() = None;
        self
    }

    /// Two repositories with a short history across the configured environments.
    ///
    /// [`DEMO_REPOSITORY`] is current.
    pub fn demo(config: &Config) -> Self {
        let provider = Self::new(config.environments.clone())
            .with_repository(DEMO_REPOSITORY, false)
            .with_repository("acme/infrastructure", true);

        {
            let mut histories = provider.histories.borrow_mut();
            if let Some(history) = histories.get_mut(DEMO_REPOSITORY) {
                history.commits = vec![
                    commit("9f2c41d0a6b3e8f1c2d4a5b6c7d8e9f0a1b2c3d4", "mia", "2024-05-03T09:12:00Z", "Add retry to webhook delivery"),
                    commit("4be7a9c1d2e3f4a5b6c7d8e9f0a1b2c3d4e5f6a7", "jon", "2024-05-02T16:40:00Z", "Bump dependencies\n\nRoutine update."),
                    commit("1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b", "mia", "2024-05-01T11:05:00Z", "Initial dashboard"),
                ];
                let commits = history.commits.clone();
                let deployed = [
                    (&commits[2], 0, "2024-05-01T12:00:00Z", DeploymentState::Inactive),
                    (&commits[2], 1, "2024-05-01T15:30:00Z", DeploymentState::Success),
                    (&commits[1], 0, "2024-05-02T17:00:00Z", DeploymentState::Success),
                    (&commits[0], 0, "2024-05-03T09:30:00Z", DeploymentState::InProgress),
                ];
                for (commit, env_index, created_at, state) in deployed {
                    let Some(environment) = config.environments.get(env_index).cloned() else {
                        continue;
                    };
                    let production = config.is_production(&environment);
                    history.record(commit, environment, production, created_at, state);
                }
            }

            if let Some(history) = histories.get_mut("acme/infrastructure") {
                history.commits = vec![commit(
                    "c0ffee0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e",
                    "ops",
                    "2024-04-28T08:00:00Z",
                    "Provision webhook workers",
                )];
                let first = history.commits[0].clone();
                if let Some(environment) = config.environments.first().cloned() {
                    let production = config.is_production(&environment);
                    history.record(
                        &first,
                        environment,
                        production,
                        "2024-04-28T08:30:00Z",
                        DeploymentState::Failure,
                    );
                }
            }
        }
        provider
    }

    /// Make the next provider call fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.fail_next.borrow_mut() = Some(message.into());
    }

    /// Number of provider calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn enter(&self) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        match self.fail_next.borrow_mut().take() {
            Some(message) => Err(GhdError::provider(message)),
            None => Ok(()),
        }
    }

    /// Run `f` on the history of the current repository.
    fn with_history<T>(&self, f: impl FnOnce(&mut History) -> Result<T>) -> Result<T> {
        let current = self.current.borrow();
        let Some(name) = current.as_deref() else {
            return Err(GhdError::provider("no repository selected"));
        };
        let mut histories = self.histories.borrow_mut();
        match histories.get_mut(name) {
            Some(history) => f(history),
            None => Err(GhdError::provider(format!("repository {name} not found"))),
        }
    }

    fn check_constraints(&self, history: &History, request: &DeploymentRequest) -> Result<()> {
        let index = self
            .environments
            .iter()
            .position(|env| *env == request.environment);
        let previous = match index {
            Some(index) if index > 0 => &self.environments[index - 1],
            _ => return Ok(()),
        };

        let deployed = history
            .deployments
            .iter()
            .any(|d| d.environment == *previous && d.git_ref == request.git_ref);
        if deployed {
            Ok(())
        } else {
            Err(GhdError::provider(format!(
                "{} is not deployed in {previous}",
                request.git_ref
            )))
        }
    }
}

fn commit(sha: &str, author: &str, date: &str, message: &str) -> Commit {
    Commit {
        sha: sha.to_string(),
        author: author.to_string(),
        date: date.to_string(),
        message: message.to_string(),
    }
}

#[async_trait(?Send)]
impl DeploymentProvider for SampleProvider {
    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.enter()?;
        Ok(self.repositories.clone())
    }

    fn repository(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    fn set_repository(&self, full_name: &str) {
        log::debug!("switching to repository {full_name}");
        *self.current.borrow_mut() = Some(full_name.to_string());
    }

    async fn list_deployments(&self, environment: Option<&str>) -> Result<Vec<Deployment>> {
        self.enter()?;
        self.with_history(|history| {
            let mut deployments: Vec<Deployment> = history
                .deployments
                .iter()
                .filter(|d| environment.map_or(true, |env| d.environment == env))
                .cloned()
                .collect();
            deployments.sort_by(|a, b| b.id.cmp(&a.id));
            Ok(deployments)
        })
    }

    async fn deployment_statuses(&self, deployment_id: u64) -> Result<Vec<DeploymentStatus>> {
        self.enter()?;
        self.with_history(|history| {
            Ok(history
                .statuses
                .get(&deployment_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    async fn list_commits(&self) -> Result<Vec<Commit>> {
        self.enter()?;
        self.with_history(|history| Ok(history.commits.clone()))
    }

    async fn create_deployment(&self, request: DeploymentRequest) -> Result<u64> {
        self.enter()?;
        self.with_history(|history| {
            if request.check_constraints && !request.force {
                self.check_constraints(history, &request)?;
            }

            let created_at = history
                .deployments
                .iter()
                .map(|d| d.created_at.clone())
                .max()
                .unwrap_or_default();
            let id = history.insert(Deployment {
                id: 0,
                git_ref: request.git_ref,
                environment: request.environment,
                task: request.task,
                description: request.description,
                creator: "you".to_string(),
                created_at: created_at.clone(),
                transient: Some(request.transient),
                production: Some(request.production),
                payload: request.payload,
            });
            history.push_status(id, DeploymentState::Queued, &created_at);
            log::info!("created deployment {id}");
            Ok(id)
        })
    }
}
