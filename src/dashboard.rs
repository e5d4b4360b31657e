//! Deployments dashboard built on the widget toolkit.
//!
//! [`MainWindow`] is the root widget: a status line under a [`MainView`] that
//! switches between the deployments list, the repository and environment
//! pickers, the commit list and the promote/deploy confirmations. Data comes
//! from a [`DeploymentProvider`].

pub mod provider;
pub mod sample;
pub mod views;

pub use provider::{
    bool_cell, next_environment, short_sha, Commit, Deployment, DeploymentKind,
    DeploymentPayload, DeploymentProvider, DeploymentRequest, DeploymentState, DeploymentStatus,
    Repository,
};
pub use sample::{SampleProvider, DEMO_REPOSITORY};
pub use views::{
    format_timestamp, summarize_changes, ChangeSummary, DeploymentsView, EnvironmentFilter,
    MainView, MainWindow, SelectionTable, ViewMode,
};
