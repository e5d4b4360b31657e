//! Screens of the deployments dashboard and the controller wiring them together.

use crate::config::Config;
use crate::dashboard::provider::{
    bool_cell, next_environment, short_sha, Commit, Deployment, DeploymentKind, DeploymentPayload,
    DeploymentProvider, DeploymentRequest, DeploymentStatus, Repository,
};
use crate::error::{GhdError, Result};
use crate::input::Key;
use crate::render::{ColorTheme, Console};
use crate::signal::{merge_flows, merge_results, AsyncSignal, EventFlow, Signal, Subscription};
use crate::timer::Timer;
use crate::widget::{
    attach, breadcrumbs, bullet_join, popover, popover_confirm, truncate, Column, Container,
    MessageBox, MultiView, PopoverKind, StatusBar, Table, Widget, WidgetRef,
};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Longest change list shown in a confirmation before it is suppressed.
const MAX_LOG_COMMITS: usize = 10;

const LABEL_WIDTH: usize = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewMode {
    Deployments,
    Repositories,
    Environments,
    Commits,
    Promote,
    Deploy,
}

/// Row of the environment filter list. `value` is `None` for "all environments".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentFilter {
    pub name: String,
    pub value: Option<String>,
}

impl EnvironmentFilter {
    pub fn all() -> Self {
        Self {
            name: "<all>".to_string(),
            value: None,
        }
    }

    pub fn only(environment: impl Into<String>) -> Self {
        let environment = environment.into();
        Self {
            name: environment.clone(),
            value: Some(environment),
        }
    }
}

/// `2024-05-03T09:30:00Z` as `2024-05-03 09:30`.
pub fn format_timestamp(timestamp: &str) -> String {
    let readable = timestamp.trim_end_matches('Z').replacen('T', " ", 1);
    truncate(&readable, 16)
}

/// A table whose rows are picked with Enter and dismissed with Esc or `q`.
///
/// Cancel handlers answer with an [`EventFlow`], so dismissing a list can end
/// the application.
pub struct SelectionTable<R> {
    table: Rc<RefCell<Table<R>>>,
    item_selected: AsyncSignal<usize, Result<()>>,
    canceled: AsyncSignal<(), Result<EventFlow>>,
}

impl<R: 'static> SelectionTable<R> {
    pub fn new(columns: Vec<Column<R>>) -> Result<Self> {
        let table = Table::new(columns);
        let item_selected: AsyncSignal<usize, Result<()>> = AsyncSignal::new();
        let canceled: AsyncSignal<(), Result<EventFlow>> = AsyncSignal::new();

        let (enter, esc, quit) = {
            let mut widget = table.borrow_mut();
            let core = widget.core_mut();
            (core.on(Key::Enter), core.on(Key::Esc), core.on('q'))
        };

        let selected = item_selected.clone();
        enter.connect_weak(&table, move |table, _| {
            let index = {
                let table = table.borrow();
                (!table.is_empty()).then(|| table.selected_index())
            };
            let selected = selected.clone();
            async move {
                let Some(index) = index else {
                    return Ok(EventFlow::Unhandled);
                };
                merge_results(selected.emit(index).await)?;
                Ok(EventFlow::Handled)
            }
        });

        let cancel = canceled.clone();
        esc.connect(move |_| {
            let pending = cancel.emit(());
            async move {
                let flow = merge_flows(pending.await)?;
                Ok(flow.max(EventFlow::Handled))
            }
        });
        quit.forward(&esc)?;

        Ok(Self {
            table,
            item_selected,
            canceled,
        })
    }

    pub fn table(&self) -> &Rc<RefCell<Table<R>>> {
        &self.table
    }

    pub fn widget(&self) -> WidgetRef {
        self.table.clone()
    }

    /// Raised with the selected index when Enter is pressed on a non-empty table.
    pub fn item_selected(&self) -> &AsyncSignal<usize, Result<()>> {
        &self.item_selected
    }

    pub fn canceled(&self) -> &AsyncSignal<(), Result<EventFlow>> {
        &self.canceled
    }
}

impl<R> Clone for SelectionTable<R> {
    fn clone(&self) -> Self {
        Self {
            table: Rc::clone(&self.table),
            item_selected: self.item_selected.clone(),
            canceled: self.canceled.clone(),
        }
    }
}

fn ref_highlight() -> Style {
    Style::default().fg(Color::Black).bg(Color::Yellow)
}

/// Deployments next to the status history of the selected one.
pub struct DeploymentsView {
    container: Rc<RefCell<Container>>,
    deployments: Rc<RefCell<Table<Deployment>>>,
    statuses: Rc<RefCell<Table<DeploymentStatus>>>,
    selected_ref: Rc<RefCell<Option<String>>>,
}

impl DeploymentsView {
    pub fn new() -> Self {
        let selected_ref: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
        let highlighted = Rc::clone(&selected_ref);

        let deployments = Table::new(vec![
            Column::text("Created", |d: &Deployment| format_timestamp(&d.created_at)),
            Column::text("Creator", |d: &Deployment| d.creator.clone()),
            Column::text("Env", |d: &Deployment| d.environment.clone()),
            Column::new("Trans", |d: &Deployment, _| Line::from(bool_cell(d.transient))),
            Column::new("Prod", |d: &Deployment, _| Line::from(bool_cell(d.production))),
            Column::new("Ref", move |d: &Deployment, max_width| {
                let text = short_sha(&d.git_ref, max_width).to_string();
                if highlighted.borrow().as_deref() == Some(d.git_ref.as_str()) {
                    Line::styled(text, ref_highlight())
                } else {
                    Line::raw(text)
                }
            }),
            Column::text("Task", |d: &Deployment| d.task.clone()),
            Column::text("Description", |d: &Deployment| d.description.clone()),
        ]);
        deployments.borrow_mut().core_mut().set_flex(2);

        let statuses = Table::new(vec![
            Column::text("Created", |s: &DeploymentStatus| format_timestamp(&s.created_at)),
            Column::text("Creator", |s: &DeploymentStatus| s.creator.clone()),
            Column::new("State", |s: &DeploymentStatus, max_width| {
                Line::styled(truncate(s.state.as_str(), max_width), s.state.style())
            }),
            Column::text("Description", |s: &DeploymentStatus| s.description.clone()),
        ]);

        let container = Container::horizontal();
        attach(&deployments, &container);
        attach(&statuses, &container);

        container
            .borrow_mut()
            .core_mut()
            .on(Key::Tab)
            .connect_weak(&container, |container, _| {
                container.borrow_mut().core_mut().focus_next();
                async { Ok(EventFlow::Handled) }
            });
        container
            .borrow_mut()
            .core_mut()
            .on(Key::BackTab)
            .connect_weak(&container, |container, _| {
                container.borrow_mut().core_mut().focus_prev();
                async { Ok(EventFlow::Handled) }
            });

        Self {
            container,
            deployments,
            statuses,
            selected_ref,
        }
    }

    pub fn container(&self) -> &Rc<RefCell<Container>> {
        &self.container
    }

    pub fn widget(&self) -> WidgetRef {
        self.container.clone()
    }

    pub fn deployments(&self) -> &Rc<RefCell<Table<Deployment>>> {
        &self.deployments
    }

    pub fn statuses(&self) -> &Rc<RefCell<Table<DeploymentStatus>>> {
        &self.statuses
    }

    /// Ref highlighted in the deployments table.
    pub fn selected_ref(&self) -> Option<String> {
        self.selected_ref.borrow().clone()
    }

    fn set_selected_ref(&self, git_ref: Option<String>) {
        *self.selected_ref.borrow_mut() = git_ref;
    }
}

impl Default for DeploymentsView {
    fn default() -> Self {
        Self::new()
    }
}

fn repository_columns() -> Vec<Column<Repository>> {
    vec![
        Column::new("Private", |repo: &Repository, _| Line::from(bool_cell(Some(repo.private)))),
        Column::text("Name", |repo: &Repository| repo.full_name.clone()),
    ]
}

fn commit_columns(
    deployments: Rc<RefCell<Table<Deployment>>>,
    environments: Vec<String>,
    theme: Rc<Cell<ColorTheme>>,
) -> Vec<Column<Commit>> {
    vec![
        Column::new("Ref", move |commit: &Commit, max_width| {
            let sha = short_sha(&commit.sha, max_width);
            // Skipped while the deployments table is busy
            let deployed: Vec<&str> = match deployments.try_borrow() {
                Ok(table) => environments
                    .iter()
                    .filter(|env| {
                        table
                            .rows()
                            .iter()
                            .any(|d| d.git_ref == commit.sha && d.environment == **env)
                    })
                    .map(String::as_str)
                    .collect(),
                Err(_) => Vec::new(),
            };
            if deployed.is_empty() {
                Line::raw(sha.to_string())
            } else {
                Line::styled(format!("{sha} ({})", deployed.join(", ")), theme.get().success)
            }
        }),
        Column::text("Created", |commit: &Commit| format_timestamp(&commit.date)),
        Column::text("Author", |commit: &Commit| commit.author.clone()),
        Column::text("Message", |commit: &Commit| commit.summary().to_string()),
    ]
}

fn yes_no() -> Rc<RefCell<MessageBox<bool>>> {
    MessageBox::new(
        "",
        vec![("Yes".to_string(), true), ("No".to_string(), false)],
    )
}

fn commit_oneline(commit: &Commit) -> Line<'static> {
    Line::raw(format!(
        "[{}  {}  {}]  {}",
        short_sha(&commit.sha, 7),
        format_timestamp(&commit.date),
        commit.author,
        commit.summary()
    ))
}

fn field(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::raw(format!("{label:<LABEL_WIDTH$}{}", value.into()))
}

fn flag(label: &str, value: bool) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{label:<LABEL_WIDTH$}")),
        bool_cell(Some(value)),
    ])
}

fn confirmation(
    title: String,
    details: Vec<Line<'static>>,
    request: &DeploymentRequest,
    changes: Vec<Line<'static>>,
) -> Text<'static> {
    let mut lines = vec![Line::raw(title), Line::default()];
    lines.extend(details);
    lines.push(field("Ref", short_sha(&request.git_ref, 7)));
    lines.push(field("Description", request.description.as_str()));
    lines.push(field("Task", request.task.as_str()));
    lines.push(flag("Transient", request.transient));
    lines.push(flag("Production", request.production));
    lines.push(flag("Check constraints", request.check_constraints));
    lines.push(Line::default());
    lines.extend(changes);
    Text::from(lines)
}

/// Kind of a pending deployment plus the lines describing it.
#[derive(Debug, Clone)]
pub struct ChangeSummary {
    pub payload: DeploymentPayload,
    pub lines: Vec<Line<'static>>,
}

/// Classify deploying `git_ref` to an environment that currently runs
/// `recent`, using `commits` (newest first) to find the direction.
pub fn summarize_changes(
    git_ref: &str,
    recent: Option<&Deployment>,
    commits: &[Commit],
    theme: &ColorTheme,
) -> ChangeSummary {
    let summary = |kind, from_ref: &str, lines| ChangeSummary {
        payload: DeploymentPayload::new(kind, from_ref, git_ref),
        lines,
    };

    let Some(recent) = recent else {
        return summary(
            DeploymentKind::Initial,
            "",
            vec![Line::styled("First deployment to this environment", theme.info)],
        );
    };
    if recent.git_ref == git_ref {
        return summary(
            DeploymentKind::Redeploy,
            git_ref,
            vec![Line::styled("No changes. This is a re-deployment.", theme.info)],
        );
    }

    let position = |sha: &str| commits.iter().position(|commit| commit.sha == sha);
    let Some(target) = position(git_ref) else {
        return summary(
            DeploymentKind::Undefined,
            "",
            vec![Line::styled(
                "The commit was not found in the repository.",
                theme.error,
            )],
        );
    };
    let Some(current) = position(&recent.git_ref) else {
        return summary(
            DeploymentKind::Undefined,
            &recent.git_ref,
            vec![
                Line::styled("Commit list suppressed, too many commits to show.", theme.info),
                Line::styled(
                    "Due to this, the update type (rollback or roll forward) could not be determined.",
                    Style::default().fg(Color::Yellow),
                ),
            ],
        );
    };

    let mut lines = Vec::new();
    // Newest first: a target above the running commit moves forward
    let (kind, range) = if target < current {
        (DeploymentKind::Forward, target..current)
    } else {
        lines.push(Line::styled(
            "This is a rollback! The following commits will be REMOVED!",
            Style::default().fg(Color::Yellow),
        ));
        lines.push(Line::default());
        (DeploymentKind::Rollback, current..target)
    };
    if range.len() <= MAX_LOG_COMMITS {
        lines.extend(commits[range].iter().rev().map(commit_oneline));
    } else {
        lines.push(Line::styled(
            "Commit list suppressed, too many commits to show.",
            theme.info,
        ));
    }
    summary(kind, &recent.git_ref, lines)
}

fn help(mode: ViewMode, watching: bool) -> String {
    match mode {
        ViewMode::Deployments => bullet_join(&[
            "[d]eploy",
            "[p]romote",
            "[e]nv filter",
            "[r]eload",
            "[s]witch repo",
            if watching { "[w]atch: on" } else { "[w]atch" },
            "[q]uit",
        ]),
        ViewMode::Commits => bullet_join(&["[enter] select", "[q] abort", "[r]eload"]),
        ViewMode::Repositories
        | ViewMode::Environments
        | ViewMode::Promote
        | ViewMode::Deploy => {
            bullet_join(&["[enter] select", "[q] abort"])
        }
    }
}

/// Controller of the dashboard screens.
///
/// Owns the [`MultiView`] switching between screens and reacts to their
/// signals. Handlers hold the controller weakly, so dropping the last `Rc`
/// tears the wiring down.
pub struct MainView {
    multiview: Rc<RefCell<MultiView<ViewMode>>>,
    provider: Rc<dyn DeploymentProvider>,
    config: Config,
    theme: Rc<Cell<ColorTheme>>,
    deployments_view: DeploymentsView,
    repo_list: SelectionTable<Repository>,
    env_list: SelectionTable<EnvironmentFilter>,
    commits: SelectionTable<Commit>,
    promote: Rc<RefCell<MessageBox<bool>>>,
    deploy: Rc<RefCell<MessageBox<bool>>>,
    watch: Timer,
    /// Keyed by repository and deployment id
    status_cache: RefCell<HashMap<(String, u64), Vec<DeploymentStatus>>>,
    pending: RefCell<Option<DeploymentRequest>>,
    context: RefCell<Vec<String>>,
    status_changed: Signal<String>,
}

impl MainView {
    pub fn new(provider: Rc<dyn DeploymentProvider>, config: &Config) -> Result<Rc<Self>> {
        let deployments_view = DeploymentsView::new();
        let theme = Rc::new(Cell::new(ColorTheme::named(config.theme)));
        let repo_list = SelectionTable::new(repository_columns())?;
        let env_list = SelectionTable::new(vec![Column::text(
            "Environment",
            |filter: &EnvironmentFilter| filter.name.clone(),
        )])?;
        let commits = SelectionTable::new(commit_columns(
            Rc::clone(deployments_view.deployments()),
            config.environments.clone(),
            Rc::clone(&theme),
        ))?;

        let multiview = MultiView::new();
        MultiView::add(&multiview, ViewMode::Deployments, deployments_view.widget());
        MultiView::add(&multiview, ViewMode::Repositories, repo_list.widget());
        MultiView::add(&multiview, ViewMode::Environments, env_list.widget());
        MultiView::add(&multiview, ViewMode::Commits, commits.widget());
        let promote = yes_no();
        let deploy = yes_no();
        MultiView::add(&multiview, ViewMode::Promote, promote.clone());
        MultiView::add(&multiview, ViewMode::Deploy, deploy.clone());

        let interval = config.watch_interval();
        let this = Rc::new_cyclic(|weak: &Weak<MainView>| {
            let target = weak.clone();
            let watch = Timer::new(interval, move || {
                let target = target.clone();
                async move {
                    match target.upgrade() {
                        Some(view) => view.update_statuses(true).await,
                        None => Ok(()),
                    }
                }
            });

            MainView {
                multiview,
                provider,
                config: config.clone(),
                theme,
                deployments_view,
                repo_list,
                env_list,
                commits,
                promote,
                deploy,
                watch,
                status_cache: RefCell::new(HashMap::new()),
                pending: RefCell::new(None),
                context: RefCell::new(Vec::new()),
                status_changed: Signal::new(),
            }
        });
        Self::wire(&this);
        Ok(this)
    }

    fn wire(this: &Rc<Self>) {
        let keys = |key: char| this.deployments_view.container().borrow_mut().core_mut().on(key);
        keys('d').connect_weak(this, |view, _| async move {
            view.show_commits().await?;
            Ok(EventFlow::Handled)
        });
        keys('e').connect_weak(this, |view, _| async move {
            view.show(ViewMode::Environments).await?;
            Ok(EventFlow::Handled)
        });
        keys('p').connect_weak(this, |view, _| async move {
            view.show_promote_confirmation().await?;
            Ok(EventFlow::Handled)
        });
        keys('r').connect_weak(this, |view, _| async move {
            view.reload_deployments().await?;
            Ok(EventFlow::Handled)
        });
        keys('s').connect_weak(this, |view, _| async move {
            view.show_repositories().await?;
            Ok(EventFlow::Handled)
        });
        keys('w').connect_weak(this, |view, _| {
            view.toggle_watch();
            async { Ok(EventFlow::Handled) }
        });
        keys('q').connect(|_| async { Ok(EventFlow::Exit) });

        this.deployments_view
            .deployments()
            .borrow()
            .selection_changed()
            .connect_weak(this, |view, _| async move { view.update_statuses(false).await });

        this.env_list
            .item_selected()
            .connect_weak(this, |view, _| async move {
                view.show(ViewMode::Deployments).await?;
                view.reload_deployments().await
            });
        this.env_list.canceled().connect_weak(this, |view, _| async move {
            view.show(ViewMode::Deployments).await?;
            Ok(EventFlow::Handled)
        });

        this.repo_list
            .item_selected()
            .connect_weak(this, |view, index| async move { view.apply_repository(index).await });
        this.repo_list
            .canceled()
            .connect_weak(this, |view, _| async move { view.cancel_repository_selection().await });

        this.commits
            .item_selected()
            .connect_weak(this, |view, _| async move { view.show_deploy_confirmation().await });
        this.commits.canceled().connect_weak(this, |view, _| async move {
            view.show(ViewMode::Deployments).await?;
            Ok(EventFlow::Handled)
        });
        this.commits
            .table()
            .borrow_mut()
            .core_mut()
            .on('r')
            .connect_weak(this, |view, _| async move {
                view.reload_commits().await?;
                Ok(EventFlow::Handled)
            });

        this.promote
            .borrow()
            .selected()
            .connect_weak(this, |view, confirmed| async move { view.do_promote(confirmed).await });
        this.promote
            .borrow()
            .aborted()
            .connect_weak(this, |view, _| async move { view.do_promote(false).await });
        this.deploy
            .borrow()
            .selected()
            .connect_weak(this, |view, confirmed| async move { view.do_deploy(confirmed).await });
        this.deploy
            .borrow()
            .aborted()
            .connect_weak(this, |view, _| async move { view.do_deploy(false).await });

        this.multiview
            .borrow()
            .view_switched()
            .connect_weak(this, |view, mode| {
                view.view_switched(mode);
                async { Ok(()) }
            });
    }

    pub fn multiview(&self) -> &Rc<RefCell<MultiView<ViewMode>>> {
        &self.multiview
    }

    pub fn deployments_view(&self) -> &DeploymentsView {
        &self.deployments_view
    }

    pub fn repository_list(&self) -> &SelectionTable<Repository> {
        &self.repo_list
    }

    pub fn environments_list(&self) -> &SelectionTable<EnvironmentFilter> {
        &self.env_list
    }

    pub fn commits(&self) -> &SelectionTable<Commit> {
        &self.commits
    }

    pub fn promote_box(&self) -> &Rc<RefCell<MessageBox<bool>>> {
        &self.promote
    }

    pub fn deploy_box(&self) -> &Rc<RefCell<MessageBox<bool>>> {
        &self.deploy
    }

    /// Raised with the new status line whenever it changes.
    pub fn status_changed(&self) -> &Signal<String> {
        &self.status_changed
    }

    pub fn current_view(&self) -> Option<ViewMode> {
        self.multiview.borrow().current().copied()
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_running()
    }

    /// Show the deployments screen and load the first data set, or the
    /// repository list when the provider has no current repository.
    ///
    /// Must run inside the `LocalSet` driving the application, after the root
    /// is attached to the console.
    pub async fn init(&self) -> Result<()> {
        if let Some(console) = self.console() {
            self.watch.report_errors_to(console.fault_sender());
            self.theme.set(*console.theme());
        }
        self.env_list
            .table()
            .borrow_mut()
            .set_rows(vec![EnvironmentFilter::all()]);
        if self.provider.repository().is_none() {
            return self.show_repositories().await;
        }
        self.show(ViewMode::Deployments).await?;
        self.reload_deployments().await?;
        self.update_environments();
        Ok(())
    }

    fn console(&self) -> Option<Rc<Console>> {
        self.multiview.borrow().core().console().cloned()
    }

    fn host(&self) -> WidgetRef {
        self.multiview.clone()
    }

    fn request_redraw(&self) {
        if let Some(console) = self.console() {
            console.request_redraw();
        }
    }

    fn loading(&self, text: &str) -> Result<()> {
        popover(self.multiview.borrow().core(), text)
    }

    async fn show(&self, mode: ViewMode) -> Result<()> {
        MultiView::show(&self.multiview, mode).await
    }

    fn view_switched(&self, mode: ViewMode) {
        if mode != ViewMode::Deployments {
            self.watch.stop();
        }
        self.emit_status();
    }

    fn emit_status(&self) {
        let Some(mode) = self.current_view() else {
            return;
        };
        let mut text = help(mode, self.watch.is_running());
        if mode == ViewMode::Deployments {
            text.push_str(&breadcrumbs(&self.context.borrow()));
        }
        self.status_changed.emit(text);
    }

    fn set_context(&self, context: Vec<String>) {
        *self.context.borrow_mut() = context;
        self.emit_status();
    }

    fn toggle_watch(&self) {
        if self.watch.is_running() {
            self.watch.stop();
        } else {
            self.watch.start();
        }
        self.emit_status();
    }

    fn environment_filter(&self) -> Option<String> {
        self.env_list
            .table()
            .borrow()
            .selected_row()
            .and_then(|filter| filter.value.clone())
    }

    // Replaces the deployment rows without announcing a selection change.
    async fn fetch_deployments(&self) -> Result<()> {
        self.status_cache.borrow_mut().clear();
        self.deployments_view.statuses().borrow_mut().set_rows(Vec::new());
        let filter = self.environment_filter();
        let deployments = self.provider.list_deployments(filter.as_deref()).await?;
        log::debug!(
            "loaded {} deployment(s) for {}",
            deployments.len(),
            filter.as_deref().unwrap_or("all environments")
        );
        self.deployments_view
            .deployments()
            .borrow_mut()
            .set_rows(deployments);
        self.request_redraw();
        Ok(())
    }

    pub async fn reload_deployments(&self) -> Result<()> {
        self.loading("Loading")?;
        self.fetch_deployments().await?;
        let table = self.deployments_view.deployments();
        let index = table.borrow().selected_index();
        Table::select(table, index).await
    }

    /// Load the statuses of the selected deployment, from the cache unless `force`.
    pub async fn update_statuses(&self, force: bool) -> Result<()> {
        let selected = self
            .deployments_view
            .deployments()
            .borrow()
            .selected_row()
            .cloned();
        self.deployments_view
            .set_selected_ref(selected.as_ref().map(|d| d.git_ref.clone()));

        let Some(deployment) = selected else {
            self.deployments_view.statuses().borrow_mut().set_rows(Vec::new());
            self.set_context(vec!["No deployments".to_string()]);
            self.request_redraw();
            return Ok(());
        };
        self.set_context(vec![
            format!("Deployment {}", deployment.id),
            deployment.description.clone(),
        ]);

        let key = (self.provider.repository().unwrap_or_default(), deployment.id);
        let cached = if force {
            None
        } else {
            self.status_cache.borrow().get(&key).cloned()
        };
        let statuses = match cached {
            Some(statuses) => statuses,
            None => {
                popover(self.deployments_view.statuses().borrow().core(), "Loading")?;
                let statuses = self.provider.deployment_statuses(deployment.id).await?;
                self.status_cache.borrow_mut().insert(key, statuses.clone());
                statuses
            }
        };
        self.deployments_view.statuses().borrow_mut().set_rows(statuses);
        self.request_redraw();
        Ok(())
    }

    fn update_environments(&self) {
        let mut seen: Vec<String> = self
            .deployments_view
            .deployments()
            .borrow()
            .rows()
            .iter()
            .map(|d| d.environment.clone())
            .collect();
        seen.sort();
        seen.dedup();

        let rows = std::iter::once(EnvironmentFilter::all())
            .chain(seen.into_iter().map(EnvironmentFilter::only))
            .collect();
        self.env_list.table().borrow_mut().set_rows(rows);
    }

    async fn show_repositories(&self) -> Result<()> {
        self.show(ViewMode::Repositories).await?;
        self.loading("Loading repository list")?;
        let repositories = self.provider.list_repositories().await?;
        let current = self.provider.repository();
        let index = repositories
            .iter()
            .position(|repo| Some(&repo.full_name) == current.as_ref())
            .unwrap_or(0);
        {
            let mut table = self.repo_list.table().borrow_mut();
            table.set_rows(repositories);
            let _ = table.set_selected_index(index);
        }
        self.request_redraw();
        Ok(())
    }

    async fn apply_repository(&self, index: usize) -> Result<()> {
        let Some(name) = self
            .repo_list
            .table()
            .borrow()
            .rows()
            .get(index)
            .map(|repo| repo.full_name.clone())
        else {
            return Ok(());
        };
        log::info!("switching to {name}");
        self.provider.set_repository(&name);

        self.show(ViewMode::Deployments).await?;
        {
            let mut filters = self.env_list.table().borrow_mut();
            filters.set_rows(vec![EnvironmentFilter::all()]);
            let _ = filters.set_selected_index(0);
        }
        let _ = self
            .deployments_view
            .deployments()
            .borrow_mut()
            .set_selected_index(0);
        self.reload_deployments().await?;
        self.update_environments();
        Ok(())
    }

    // Without a repository there is nothing to go back to.
    async fn cancel_repository_selection(&self) -> Result<EventFlow> {
        if self.provider.repository().is_none() {
            return Ok(EventFlow::Exit);
        }
        self.show(ViewMode::Deployments).await?;
        Ok(EventFlow::Handled)
    }

    async fn load_commits(&self) -> Result<()> {
        let commits = self.provider.list_commits().await?;
        self.commits.table().borrow_mut().set_rows(commits);
        self.request_redraw();
        Ok(())
    }

    async fn show_commits(&self) -> Result<()> {
        self.loading("Loading commits")?;
        self.load_commits().await?;
        self.show(ViewMode::Commits).await
    }

    async fn reload_commits(&self) -> Result<()> {
        self.loading("Loading commits")?;
        self.fetch_deployments().await?;
        self.load_commits().await
    }

    /// Describe and classify deploying `git_ref` to `environment`.
    async fn change_summary(&self, environment: &str, git_ref: &str) -> Result<ChangeSummary> {
        let recent = self.provider.list_deployments(Some(environment)).await?;
        let recent = recent.into_iter().next();
        let commits = match &recent {
            Some(recent) if recent.git_ref != git_ref => self.provider.list_commits().await?,
            _ => Vec::new(),
        };
        Ok(summarize_changes(
            git_ref,
            recent.as_ref(),
            &commits,
            &self.theme.get(),
        ))
    }

    async fn show_promote_confirmation(&self) -> Result<()> {
        let Some(deployment) = self
            .deployments_view
            .deployments()
            .borrow()
            .selected_row()
            .cloned()
        else {
            return Ok(());
        };
        let Some(next) = next_environment(&self.config.environments, &deployment.environment) else {
            log::debug!("{} is the last environment", deployment.environment);
            return Ok(());
        };

        let changes = self.change_summary(next, &deployment.git_ref).await?;
        let request = DeploymentRequest {
            git_ref: deployment.git_ref.clone(),
            environment: next.to_string(),
            task: deployment.task.clone(),
            description: deployment.description.clone(),
            transient: false,
            production: self.config.is_production(next),
            // Promoting from a deployment means the previous environment has it
            check_constraints: true,
            force: false,
            payload: Some(changes.payload),
        };
        let message = confirmation(
            format!("Promote from {} to {next}?", deployment.environment),
            vec![
                field("Creator", deployment.creator.as_str()),
                field("Created", format_timestamp(&deployment.created_at)),
            ],
            &request,
            changes.lines,
        );

        {
            let mut promote = self.promote.borrow_mut();
            promote.set_message(message);
            // Default to "No"
            promote.set_choice_index(1);
        }
        *self.pending.borrow_mut() = Some(request);
        self.show(ViewMode::Promote).await
    }

    async fn show_deploy_confirmation(&self) -> Result<()> {
        let Some(commit) = self.commits.table().borrow().selected_row().cloned() else {
            return Ok(());
        };
        let Some(environment) = self.config.environments.first().cloned() else {
            return Err(GhdError::config("no environments configured"));
        };

        let changes = self.change_summary(&environment, &commit.sha).await?;
        let request = DeploymentRequest {
            git_ref: commit.sha.clone(),
            production: self.config.is_production(&environment),
            environment,
            task: "deploy".to_string(),
            description: commit.summary().to_string(),
            transient: false,
            check_constraints: false,
            force: false,
            payload: Some(changes.payload),
        };
        let message = confirmation(
            format!(
                "Deploy {} to {}?",
                short_sha(&commit.sha, 7),
                request.environment
            ),
            vec![
                field("Author", commit.author.as_str()),
                field("Created", format_timestamp(&commit.date)),
            ],
            &request,
            changes.lines,
        );

        {
            let mut deploy = self.deploy.borrow_mut();
            deploy.set_message(message);
            deploy.set_choice_index(1);
        }
        *self.pending.borrow_mut() = Some(request);
        self.show(ViewMode::Deploy).await
    }

    async fn do_promote(&self, confirmed: bool) -> Result<()> {
        let request = self.pending.borrow_mut().take();
        if let (true, Some(request)) = (confirmed, request) {
            self.try_or_force_deploy(request).await?;
            self.show(ViewMode::Deployments).await?;
            return self.reload_deployments().await;
        }
        self.show(ViewMode::Deployments).await
    }

    async fn do_deploy(&self, confirmed: bool) -> Result<()> {
        let request = self.pending.borrow_mut().take();
        if let (true, Some(request)) = (confirmed, request) {
            self.try_or_force_deploy(request).await?;
            self.show(ViewMode::Deployments).await?;
            return self.reload_deployments().await;
        }
        self.show(ViewMode::Commits).await
    }

    /// Create the deployment; on a provider failure offer to force it.
    async fn try_or_force_deploy(&self, request: DeploymentRequest) -> Result<()> {
        let error = match self.provider.create_deployment(request.clone()).await {
            Ok(id) => {
                log::info!(
                    "deployment {id} of {} to {} created",
                    request.git_ref,
                    request.environment
                );
                return Ok(());
            }
            Err(err @ GhdError::Provider { .. }) => err,
            Err(err) => return Err(err),
        };
        log::warn!("deployment to {} failed: {error}", request.environment);

        let host = self.host();
        let text = format!(
            "Failed to create deployment\n\n{error}\n\n(press shift+Y to force deployment, any other key to abort)"
        );
        if popover_confirm(&host, &text, PopoverKind::Error).await? != Key::Char('Y') {
            return Ok(());
        }

        let forced = DeploymentRequest {
            force: true,
            ..request
        };
        match self.provider.create_deployment(forced).await {
            Ok(id) => {
                log::info!("deployment {id} forcefully created");
                let text = format!("Deployment {id} forcefully created\n\n(press any key to continue)");
                popover_confirm(&host, &text, PopoverKind::Info).await?;
            }
            Err(err @ GhdError::Provider { .. }) => {
                let text = format!(
                    "Failed to force-create deployment\n\n{err}\n\n(press any key to continue)"
                );
                popover_confirm(&host, &text, PopoverKind::Error).await?;
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }
}

/// Root of the dashboard: the screens above a status line.
pub struct MainWindow {
    root: Rc<RefCell<StatusBar>>,
    main_view: Rc<MainView>,
    _status: Subscription,
}

impl MainWindow {
    pub fn new(provider: Rc<dyn DeploymentProvider>, config: &Config) -> Result<Self> {
        let root = StatusBar::new();
        let main_view = MainView::new(provider, config)?;
        attach(main_view.multiview(), &root);

        let bar = Rc::downgrade(&root);
        let status = main_view.status_changed().subscribe(move |text: String| {
            if let Some(bar) = bar.upgrade() {
                bar.borrow_mut().set_text(text);
            }
        });

        root.borrow_mut()
            .core_mut()
            .on(Key::Ctrl('c'))
            .connect(|_| async { Ok(EventFlow::Exit) });

        Ok(Self {
            root,
            main_view,
            _status: status,
        })
    }

    pub fn root(&self) -> WidgetRef {
        self.root.clone()
    }

    pub fn main_view(&self) -> Rc<MainView> {
        Rc::clone(&self.main_view)
    }

    pub fn status_text(&self) -> String {
        self.root.borrow().text().to_string()
    }

    pub async fn init(&self) -> Result<()> {
        self.main_view.init().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::sample::SampleProvider;
    use crate::input::InputEvent;
    use crate::widget::test_support::console;
    use crate::widget::{attach_ref, handle_input, Host};
    use crate::dashboard::provider::DeploymentState;
    use crate::render::{ThemeName, VirtualTerminal};
    use std::time::Duration;
    use tokio::sync::mpsc::{self, UnboundedSender};
    use tokio::task::LocalSet;

    struct Harness {
        window: MainWindow,
        view: Rc<MainView>,
        provider: Rc<SampleProvider>,
        console: Rc<Console>,
        term: VirtualTerminal,
        input: UnboundedSender<InputEvent>,
    }

    impl Harness {
        async fn new() -> Self {
            let config = Config::default();
            Self::with_provider(SampleProvider::demo(&config), console(100, 20)).await
        }

        async fn with_theme(theme: ThemeName) -> Self {
            let term = VirtualTerminal::new(100, 20);
            let (input, rx) = mpsc::unbounded_channel();
            let console = Console::new(Box::new(term.clone()), rx, theme);
            let config = Config::default();
            Self::with_provider(SampleProvider::demo(&config), (console, term, input)).await
        }

        async fn with_provider(
            provider: SampleProvider,
            (console, term, input): (Rc<Console>, VirtualTerminal, UnboundedSender<InputEvent>),
        ) -> Self {
            let config = Config::default();
            let provider = Rc::new(provider);
            let window = MainWindow::new(provider.clone(), &config).unwrap();
            attach_ref(&window.root(), Host::Console(Rc::clone(&console)));
            window.root().borrow_mut().resize(100, 20);
            window.init().await.unwrap();
            let view = window.main_view();
            Self {
                window,
                view,
                provider,
                console,
                term,
                input,
            }
        }

        async fn press(&self, key: impl Into<Key>) -> EventFlow {
            handle_input(self.window.root(), key.into()).await.unwrap()
        }

        fn render(&self) {
            self.window.root().borrow_mut().paint();
            self.console.flush().unwrap();
        }

        fn deployment_count(&self) -> usize {
            self.view.deployments_view().deployments().borrow().len()
        }
    }

    #[test]
    fn timestamps_are_shortened() {
        assert_eq!(format_timestamp("2024-05-03T09:30:00Z"), "2024-05-03 09:30");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[tokio::test]
    async fn selection_table_reports_enter_and_cancel() {
        let list = SelectionTable::new(vec![Column::text("Name", |name: &String| name.clone())])
            .unwrap();
        let picked = Rc::new(RefCell::new(Vec::new()));
        let canceled = Rc::new(RefCell::new(0));

        let sink = Rc::clone(&picked);
        list.item_selected().connect(move |index| {
            sink.borrow_mut().push(index);
            async { Ok(()) }
        });
        let counter = Rc::clone(&canceled);
        list.canceled().connect(move |_| {
            *counter.borrow_mut() += 1;
            async { Ok(EventFlow::Handled) }
        });

        let widget = list.widget();
        let flow = handle_input(widget.clone(), Key::Enter).await.unwrap();
        assert_eq!(flow, EventFlow::Unhandled);

        list.table()
            .borrow_mut()
            .set_rows(vec!["dev".to_string(), "live".to_string()]);
        handle_input(widget.clone(), Key::Down).await.unwrap();
        handle_input(widget.clone(), Key::Enter).await.unwrap();
        let flow = handle_input(widget.clone(), Key::Char('q')).await.unwrap();
        assert_eq!(flow, EventFlow::Handled);
        handle_input(widget, Key::Esc).await.unwrap();

        assert_eq!(*picked.borrow(), vec![1]);
        assert_eq!(*canceled.borrow(), 2);
    }

    #[tokio::test]
    async fn init_shows_deployments_with_statuses() {
        let h = Harness::new().await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Deployments));
        assert_eq!(h.deployment_count(), 4);

        let statuses = h.view.deployments_view().statuses().borrow();
        assert_eq!(statuses.len(), 2);
        assert_eq!(
            statuses.rows()[0].state,
            crate::dashboard::provider::DeploymentState::InProgress
        );
        drop(statuses);

        let status = h.window.status_text();
        assert!(status.starts_with("[d]eploy"));
        assert!(status.contains("Deployment 4"));
        assert_eq!(
            h.view.deployments_view().selected_ref().as_deref(),
            Some("9f2c41d0a6b3e8f1c2d4a5b6c7d8e9f0a1b2c3d4")
        );

        h.render();
        assert!(h.term.line(0).contains("Created"));
        assert!(h.term.lines().iter().any(|line| line.contains("9f2c41d")));
        assert!(h.term.line(19).starts_with("[d]eploy"));
    }

    #[tokio::test]
    async fn statuses_are_cached_per_deployment() {
        let h = Harness::new().await;
        assert_eq!(h.provider.calls(), 2);

        h.press(Key::Down).await;
        assert_eq!(h.provider.calls(), 3);
        assert!(h.window.status_text().contains("Deployment 3"));

        h.press(Key::Up).await;
        assert_eq!(h.provider.calls(), 3);

        h.press('r').await;
        // Reload drops the cache
        assert_eq!(h.provider.calls(), 5);
    }

    #[tokio::test]
    async fn environment_filter_reloads_the_list() {
        let h = Harness::new().await;
        h.press('e').await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Environments));

        let names: Vec<String> = h
            .view
            .environments_list()
            .table()
            .borrow()
            .rows()
            .iter()
            .map(|filter| filter.name.clone())
            .collect();
        assert_eq!(names, vec!["<all>", "dev", "test"]);

        h.press(Key::Down).await;
        h.press(Key::Enter).await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Deployments));
        assert_eq!(h.deployment_count(), 3);

        h.press('e').await;
        h.press('q').await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Deployments));
    }

    #[tokio::test]
    async fn promote_defaults_to_no_and_creates_on_yes() {
        let h = Harness::new().await;

        h.press('p').await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Promote));
        assert_eq!(h.view.promote_box().borrow().choice_index(), 1);
        assert_eq!(h.window.status_text(), "[enter] select \u{2022} [q] abort");

        h.render();
        let screen = h.term.lines().join("\n");
        assert!(screen.contains("Promote from dev to test?"));
        assert!(screen.contains("Bump dependencies"));

        h.press(Key::Left).await;
        h.press(Key::Enter).await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Deployments));
        assert_eq!(h.deployment_count(), 5);
        let newest = h.view.deployments_view().deployments().borrow().rows()[0].clone();
        assert_eq!(newest.environment, "test");
        assert_eq!(newest.production, Some(false));

        // test ran the initial commit, so this moves it forward
        let payload = newest.payload.unwrap();
        assert_eq!(payload.kind, DeploymentKind::Forward);
        assert_eq!(payload.from_ref, "1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b");
        assert_eq!(payload.to_ref, newest.git_ref);
    }

    #[tokio::test]
    async fn declining_a_promotion_changes_nothing() {
        let h = Harness::new().await;
        h.press('p').await;
        h.press(Key::Enter).await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Deployments));
        assert_eq!(h.deployment_count(), 4);
    }

    #[tokio::test]
    async fn failed_deploy_can_be_forced() {
        let h = Harness::new().await;

        h.press('d').await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Commits));
        assert_eq!(h.view.commits().table().borrow().len(), 3);

        h.press(Key::Enter).await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Deploy));

        h.provider.fail_next("constraint check failed");
        // Force, then acknowledge the result
        h.input.send(InputEvent::Key(Key::Char('Y'))).unwrap();
        h.input.send(InputEvent::Key(Key::Char('x'))).unwrap();
        h.press(Key::Left).await;
        h.press(Key::Enter).await;

        assert_eq!(h.view.current_view(), Some(ViewMode::Deployments));
        assert_eq!(h.deployment_count(), 5);
        let newest = h.view.deployments_view().deployments().borrow().rows()[0].clone();
        assert_eq!(
            newest.payload.map(|payload| payload.kind),
            Some(DeploymentKind::Redeploy)
        );
    }

    #[tokio::test]
    async fn aborting_a_deploy_returns_to_commits() {
        let h = Harness::new().await;
        h.press('d').await;
        h.press(Key::Enter).await;
        h.press(Key::Esc).await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Commits));

        h.press('q').await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Deployments));
    }

    #[tokio::test]
    async fn commit_refs_list_their_environments() {
        let h = Harness::new().await;
        h.press('d').await;
        h.render();
        let screen = h.term.lines().join("\n");
        assert!(screen.contains("1a2b3c4 (dev, test)"));
        assert!(screen.contains("9f2c41d (dev)"));
    }

    #[tokio::test]
    async fn commit_refs_follow_the_console_theme() {
        let h = Harness::with_theme(ThemeName::HighContrast).await;
        h.press('d').await;
        h.render();

        let lines = h.term.lines();
        let (y, line) = lines
            .iter()
            .enumerate()
            .find(|(_, line)| line.contains("1a2b3c4 (dev, test)"))
            .unwrap();
        let x = line[..line.find("1a2b3c4").unwrap()].chars().count();
        let style = h.term.style_at(x as u16, y as u16);
        assert_eq!(style.fg, Some(Color::LightGreen));
    }

    #[tokio::test]
    async fn switching_repositories_reloads_everything() {
        let h = Harness::new().await;
        h.press('e').await;
        h.press(Key::Down).await;
        h.press(Key::Enter).await;
        assert_eq!(h.deployment_count(), 3);

        h.press('s').await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Repositories));
        assert_eq!(h.window.status_text(), "[enter] select \u{2022} [q] abort");
        h.render();
        let screen = h.term.lines().join("\n");
        assert!(screen.contains("acme/infrastructure"));

        h.press(Key::Down).await;
        h.press(Key::Enter).await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Deployments));
        assert_eq!(
            h.provider.repository().as_deref(),
            Some("acme/infrastructure")
        );
        // The environment filter starts over at <all>
        assert_eq!(h.view.environments_list().table().borrow().len(), 2);
        assert_eq!(h.deployment_count(), 1);

        let statuses = h.view.deployments_view().statuses().borrow();
        assert_eq!(statuses.rows()[0].state, DeploymentState::Failure);
        drop(statuses);

        // Both repositories have a deployment 1
        let cache = h.view.status_cache.borrow();
        let keys: Vec<_> = cache.keys().cloned().collect();
        assert_eq!(keys, vec![("acme/infrastructure".to_string(), 1)]);
    }

    #[tokio::test]
    async fn aborting_the_repository_list_returns_when_one_is_set() {
        let h = Harness::new().await;
        h.press('s').await;
        assert_eq!(h.press('q').await, EventFlow::Handled);
        assert_eq!(h.view.current_view(), Some(ViewMode::Deployments));
        assert_eq!(h.deployment_count(), 4);
    }

    #[tokio::test]
    async fn without_a_repository_the_list_comes_first() {
        let config = Config::default();
        let provider = SampleProvider::demo(&config).without_selection();
        let h = Harness::with_provider(provider, console(100, 20)).await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Repositories));
        assert_eq!(h.view.repository_list().table().borrow().len(), 2);
        assert_eq!(h.deployment_count(), 0);

        assert_eq!(h.press(Key::Esc).await, EventFlow::Exit);

        h.press(Key::Enter).await;
        assert_eq!(h.view.current_view(), Some(ViewMode::Deployments));
        assert_eq!(h.deployment_count(), 4);
    }

    fn deployment(git_ref: &str) -> Deployment {
        Deployment {
            id: 1,
            git_ref: git_ref.to_string(),
            environment: "test".to_string(),
            task: "deploy".to_string(),
            description: String::new(),
            creator: "mia".to_string(),
            created_at: "2024-05-01T15:30:00Z".to_string(),
            transient: Some(false),
            production: Some(false),
            payload: None,
        }
    }

    fn history(count: usize) -> Vec<Commit> {
        (0..count)
            .map(|i| Commit {
                sha: format!("{:040x}", count - i),
                author: "mia".to_string(),
                date: "2024-05-01T11:05:00Z".to_string(),
                message: format!("Change {}", count - i),
            })
            .collect()
    }

    fn text(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn first_deployment_is_initial() {
        let commits = history(3);
        let summary = summarize_changes(&commits[0].sha, None, &commits, &ColorTheme::default());
        assert_eq!(summary.payload.kind, DeploymentKind::Initial);
        assert_eq!(summary.payload.from_ref, "");
        assert_eq!(summary.payload.to_ref, commits[0].sha);
    }

    #[test]
    fn same_ref_is_a_redeploy() {
        let commits = history(3);
        let recent = deployment(&commits[1].sha);
        let summary =
            summarize_changes(&commits[1].sha, Some(&recent), &commits, &ColorTheme::default());
        assert_eq!(summary.payload.kind, DeploymentKind::Redeploy);
        assert_eq!(summary.payload.from_ref, commits[1].sha);
        assert_eq!(summary.payload.to_ref, commits[1].sha);
    }

    #[test]
    fn newer_ref_moves_forward() {
        let commits = history(4);
        let recent = deployment(&commits[3].sha);
        let summary =
            summarize_changes(&commits[0].sha, Some(&recent), &commits, &ColorTheme::default());
        assert_eq!(summary.payload.kind, DeploymentKind::Forward);
        assert_eq!(summary.payload.from_ref, commits[3].sha);
        // Oldest new commit first, the running one excluded
        let text = text(&summary.lines);
        assert!(text.contains("Change 4"));
        assert!(text.contains("Change 2"));
        assert!(!text.contains("Change 1"));
        assert!(text.find("Change 2") < text.find("Change 4"));
    }

    #[test]
    fn older_ref_is_a_rollback() {
        let commits = history(4);
        let recent = deployment(&commits[0].sha);
        let summary =
            summarize_changes(&commits[2].sha, Some(&recent), &commits, &ColorTheme::default());
        assert_eq!(summary.payload.kind, DeploymentKind::Rollback);
        assert_eq!(summary.payload.from_ref, commits[0].sha);
        let text = text(&summary.lines);
        assert!(text.starts_with("This is a rollback!"));
        assert!(text.contains("Change 4"));
        assert!(text.contains("Change 3"));
        assert!(!text.contains("Change 2"));
    }

    #[test]
    fn unknown_refs_are_undefined() {
        let commits = history(3);
        let recent = deployment(&commits[1].sha);
        let missing = summarize_changes("deadbeef", Some(&recent), &commits, &ColorTheme::default());
        assert_eq!(missing.payload.kind, DeploymentKind::Undefined);
        assert_eq!(missing.payload.from_ref, "");
        assert_eq!(missing.payload.to_ref, "deadbeef");

        let recent = deployment("cafebabe");
        let unknown =
            summarize_changes(&commits[0].sha, Some(&recent), &commits, &ColorTheme::default());
        assert_eq!(unknown.payload.kind, DeploymentKind::Undefined);
        assert_eq!(unknown.payload.from_ref, "cafebabe");
        assert!(text(&unknown.lines).contains("could not be determined"));
    }

    #[test]
    fn long_histories_keep_the_kind() {
        let commits = history(MAX_LOG_COMMITS + 5);
        let recent = deployment(&commits[MAX_LOG_COMMITS + 2].sha);
        let summary =
            summarize_changes(&commits[0].sha, Some(&recent), &commits, &ColorTheme::default());
        assert_eq!(summary.payload.kind, DeploymentKind::Forward);
        assert_eq!(
            text(&summary.lines),
            "Commit list suppressed, too many commits to show."
        );
    }

    #[tokio::test]
    async fn quit_keys_exit() {
        let h = Harness::new().await;
        assert_eq!(h.press('q').await, EventFlow::Exit);

        h.press('d').await;
        assert_eq!(h.press(Key::Ctrl('c')).await, EventFlow::Exit);
    }

    #[tokio::test]
    async fn tab_moves_focus_to_the_statuses() {
        let h = Harness::new().await;
        let view = h.view.deployments_view();
        assert!(view.deployments().borrow().core().has_focus());

        h.press(Key::Tab).await;
        assert!(view.statuses().borrow().core().has_focus());
        h.press(Key::BackTab).await;
        assert!(view.deployments().borrow().core().has_focus());
    }

    #[tokio::test(start_paused = true)]
    async fn watch_polls_until_leaving_the_view() {
        LocalSet::new()
            .run_until(async {
                let h = Harness::new().await;
                let before = h.provider.calls();

                h.press('w').await;
                assert!(h.view.is_watching());
                assert!(h.window.status_text().contains("[w]atch: on"));
                tokio::time::sleep(Duration::from_millis(10)).await;
                assert_eq!(h.provider.calls(), before + 1);

                tokio::time::sleep(Duration::from_secs(5)).await;
                assert_eq!(h.provider.calls(), before + 2);

                h.press('e').await;
                assert!(!h.view.is_watching());
                tokio::time::sleep(Duration::from_secs(20)).await;
                assert_eq!(h.provider.calls(), before + 2);
            })
            .await;
    }
}
