use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

// Polling (seconds)
pub const LOG_REFRESH_SECS: u64 = 5;

// UI constants
pub const ERROR_TTL_SECS: u64 = 10;
pub const SPINNER_FRAME_COUNT: usize = 8;
pub const QUICK_SELECT_MAX: usize = 9;
pub const NARROW_WIDTH_THRESHOLD: u16 = 60;

// Log overlay constants
pub const LOG_MAX_LINES: usize = 1000;

/// Lifecycle state of one ephemeral deployment.
///
/// `Pending` is a purely local sentinel: it is set when an action request is
/// dispatched and is only ever cleared by the next builds-list refresh
/// replacing the whole `Build` value. It never comes from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildStatus {
    #[default]
    Undeployed,
    Stopped,
    Started,
    Failed,
    Pending,
}

impl BuildStatus {
    pub fn label(self) -> &'static str {
        match self {
            BuildStatus::Undeployed => "undeployed",
            BuildStatus::Stopped => "stopped",
            BuildStatus::Started => "started",
            BuildStatus::Failed => "failed",
            BuildStatus::Pending => "pending",
        }
    }

    /// An init log exists for any build the service has deployed at least
    /// once. A Pending card was deployed before the click, so it counts.
    pub fn is_deployed(self) -> bool {
        !matches!(self, BuildStatus::Undeployed)
    }
}

fn status_from_wire<'de, D>(de: D) -> Result<BuildStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(de)?;
    match raw.as_deref() {
        None => Ok(BuildStatus::Undeployed),
        Some("stopped") => Ok(BuildStatus::Stopped),
        Some("started") => Ok(BuildStatus::Started),
        Some("failed") => Ok(BuildStatus::Failed),
        Some(other) => Err(serde::de::Error::unknown_variant(
            other,
            &["stopped", "started", "failed"],
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitInfo {
    pub repo: String,
    pub target_branch: String,
    #[serde(default)]
    pub pr: Option<u64>,
    #[serde(default)]
    pub git_commit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Build {
    /// Unique build name. Empty means "not found": the card renders a bare
    /// placeholder and offers no actions.
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "status_from_wire")]
    pub status: BuildStatus,
    #[serde(default)]
    pub commit_info: Option<CommitInfo>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub repo_target_branch_link: Option<String>,
    #[serde(default)]
    pub repo_pr_link: Option<String>,
    #[serde(default)]
    pub repo_commit_link: Option<String>,
    #[serde(default)]
    pub deploy_link: Option<String>,
    #[serde(default)]
    pub deploy_link_mailhog: Option<String>,
}

/// A lifecycle action the user can request against the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildAction {
    Start,
    Stop,
    Reset,
    Delete,
}

impl BuildAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildAction::Start => "start",
            BuildAction::Stop => "stop",
            BuildAction::Reset => "reset",
            BuildAction::Delete => "delete",
        }
    }

    /// Control enablement: start only from Stopped, stop only from Started,
    /// reset/delete from anything that is not already Pending. Pending
    /// disables everything until the next refresh overwrites it.
    pub fn allowed_for(self, status: BuildStatus) -> bool {
        match self {
            BuildAction::Start => status == BuildStatus::Stopped,
            BuildAction::Stop => status == BuildStatus::Started,
            BuildAction::Reset | BuildAction::Delete => status != BuildStatus::Pending,
        }
    }
}

/// Which of the two log streams a viewer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Deploy,
    Init,
}

impl LogKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            LogKind::Deploy => "log",
            LogKind::Init => "init-log",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            LogKind::Deploy => "Build Log",
            LogKind::Init => "Init Log",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LogKind::Deploy => "log",
            LogKind::Init => "init log",
        }
    }

    pub fn empty_placeholder(self) -> &'static str {
        match self {
            LogKind::Deploy => "Log is empty",
            LogKind::Init => "Init log is empty",
        }
    }
}

/// Result of one fetch-and-render cycle, already reduced to display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutcome {
    Text(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogContent {
    Loading,
    Text(Vec<String>),
    Error(String),
}

/// State machine for one log modal: Closed -> Open(Loading) ->
/// Open(Displaying) -> Closed.
///
/// `epoch` is the liveness token for in-flight fetches. It is bumped on
/// every open *and* close, so a fetch that started before a close (or
/// before a reopen) carries a stale epoch and its result is discarded.
#[derive(Debug)]
pub struct LogViewer {
    pub visible: bool,
    pub epoch: u64,
    pub content: LogContent,
    pub scroll: usize,
    pub follow: bool,
    /// Build whose log this viewer shows, fixed at open time.
    pub build_name: String,
}

impl LogViewer {
    pub fn new() -> Self {
        Self {
            visible: false,
            epoch: 0,
            content: LogContent::Loading,
            scroll: 0,
            follow: true,
            build_name: String::new(),
        }
    }

    /// Opens the viewer and returns the epoch under which the polling task
    /// must run. Returns None if already open: a second poll task must
    /// never be started for the same viewer.
    pub fn open(&mut self, build_name: &str) -> Option<u64> {
        if self.visible {
            return None;
        }
        self.visible = true;
        self.epoch += 1;
        self.content = LogContent::Loading;
        self.scroll = 0;
        self.follow = true;
        self.build_name = build_name.to_string();
        Some(self.epoch)
    }

    /// Closes the viewer. Idempotent: closing an already-closed viewer does
    /// nothing and reports false so the caller skips timer cancellation.
    pub fn close(&mut self) -> bool {
        if !self.visible {
            return false;
        }
        self.visible = false;
        self.epoch += 1;
        self.content = LogContent::Loading;
        true
    }

    /// Applies a fetch result. Stale results (viewer closed or reopened
    /// since the fetch started) are silently dropped.
    pub fn apply_fetch(&mut self, epoch: u64, outcome: LogOutcome) -> bool {
        if !self.visible || epoch != self.epoch {
            return false;
        }
        self.content = match outcome {
            LogOutcome::Text(text) => {
                let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
                if lines.len() > LOG_MAX_LINES {
                    lines.drain(..lines.len() - LOG_MAX_LINES);
                }
                LogContent::Text(lines)
            }
            LogOutcome::Error(msg) => LogContent::Error(msg),
        };
        true
    }

    pub fn line_count(&self) -> usize {
        match &self.content {
            LogContent::Text(lines) => lines.len(),
            LogContent::Loading | LogContent::Error(_) => 1,
        }
    }

    fn max_scroll(&self, visible_height: usize) -> usize {
        self.line_count().saturating_sub(visible_height)
    }

    /// Effective scroll offset: pinned to the tail while following.
    pub fn display_scroll(&self, visible_height: usize) -> usize {
        if self.follow {
            self.max_scroll(visible_height)
        } else {
            self.scroll
        }
    }

    pub fn scroll_up(&mut self, amount: usize, visible_height: usize) {
        self.scroll = self.display_scroll(visible_height).saturating_sub(amount);
        self.follow = false;
    }

    pub fn scroll_down(&mut self, amount: usize, visible_height: usize) {
        let max = self.max_scroll(visible_height);
        self.scroll = (self.display_scroll(visible_height) + amount).min(max);
        if self.scroll == max {
            self.follow = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.follow = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
    }
}

impl Default for LogViewer {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable configuration set at startup.
pub struct AppConfig {
    pub server_url: String,
    pub repo: Option<String>,
    pub interval: u64,
}

pub struct AppState {
    pub config: AppConfig,

    // Card grid
    pub builds: Vec<Build>,
    pub cursor: usize,

    // Log viewers; open_order tracks stacking, last entry is on top
    pub deploy_log: LogViewer,
    pub init_log: LogViewer,
    pub open_order: Vec<LogKind>,

    // Polling
    pub is_loading: bool,
    pub last_poll: Option<std::time::Instant>,
    pub next_poll_in: u64,

    // Transient UI
    pub error: Option<(String, std::time::Instant)>,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            builds: Vec::new(),
            cursor: 0,
            deploy_log: LogViewer::new(),
            init_log: LogViewer::new(),
            open_order: Vec::new(),
            is_loading: false,
            last_poll: None,
            next_poll_in: 0,
            error: None,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    pub fn viewer(&self, kind: LogKind) -> &LogViewer {
        match kind {
            LogKind::Deploy => &self.deploy_log,
            LogKind::Init => &self.init_log,
        }
    }

    pub fn viewer_mut(&mut self, kind: LogKind) -> &mut LogViewer {
        match kind {
            LogKind::Deploy => &mut self.deploy_log,
            LogKind::Init => &mut self.init_log,
        }
    }

    pub fn selected(&self) -> Option<&Build> {
        self.builds.get(self.cursor)
    }

    fn selected_mut(&mut self) -> Option<&mut Build> {
        self.builds.get_mut(self.cursor)
    }

    // --- Card grid ---

    /// Replaces the build list wholesale with fresh data from the service.
    /// This is the only path that clears Pending: the external refresh
    /// always wins over the local sentinel.
    pub fn apply_builds(&mut self, builds: Vec<Build>) {
        self.builds = builds;
        self.is_loading = false;
        if self.cursor >= self.builds.len() {
            self.cursor = self.builds.len().saturating_sub(1);
        }
        self.last_poll = Some(std::time::Instant::now());
    }

    /// Marks a build as torn down without any network call.
    pub fn mark_undeployed(&mut self, name: &str) {
        if let Some(build) = self.builds.iter_mut().find(|b| b.name == name) {
            build.status = BuildStatus::Undeployed;
        }
    }

    /// Validates an action against the selected card, flips it to Pending
    /// and returns the build name for exactly one outbound request. Returns
    /// None (and sends nothing) when the control is disabled, which is what
    /// makes a second trigger while Pending impossible.
    pub fn begin_action(&mut self, action: BuildAction) -> Option<String> {
        let build = self.selected_mut()?;
        if build.name.is_empty() || !action.allowed_for(build.status) {
            return None;
        }
        build.status = BuildStatus::Pending;
        Some(build.name.clone())
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if !self.builds.is_empty() && self.cursor < self.builds.len() - 1 {
            self.cursor += 1;
        }
    }

    pub fn move_cursor_up(&mut self, columns: usize) {
        self.cursor = self.cursor.saturating_sub(columns.max(1));
    }

    pub fn move_cursor_down(&mut self, columns: usize) {
        if self.builds.is_empty() {
            return;
        }
        let next = self.cursor + columns.max(1);
        if next < self.builds.len() {
            self.cursor = next;
        }
    }

    pub fn quick_select(&mut self, n: usize) {
        if n >= 1 && n <= self.builds.len() {
            self.cursor = n - 1;
        }
    }

    // --- Log viewers ---

    /// Opens a viewer for the selected build if its status exposes that log
    /// stream. Returns the build name and polling epoch on an actual
    /// Closed -> Open transition.
    pub fn open_log(&mut self, kind: LogKind) -> Option<(String, u64)> {
        let build = self.selected()?;
        if build.name.is_empty() {
            return None;
        }
        let available = match kind {
            LogKind::Deploy => build.status == BuildStatus::Started,
            LogKind::Init => build.status.is_deployed(),
        };
        if !available {
            return None;
        }
        let name = build.name.clone();
        let epoch = self.viewer_mut(kind).open(&name)?;
        self.open_order.push(kind);
        Some((name, epoch))
    }

    /// Closes the topmost open viewer, returning its kind so the caller can
    /// cancel the matching poll task.
    pub fn close_top_log(&mut self) -> Option<LogKind> {
        let kind = self.open_order.pop()?;
        self.viewer_mut(kind).close();
        Some(kind)
    }

    pub fn close_log(&mut self, kind: LogKind) -> bool {
        self.open_order.retain(|k| *k != kind);
        self.viewer_mut(kind).close()
    }

    pub fn top_log(&self) -> Option<LogKind> {
        self.open_order.last().copied()
    }

    pub fn has_overlay(&self) -> bool {
        !self.open_order.is_empty()
    }

    pub fn apply_log_fetch(&mut self, kind: LogKind, epoch: u64, outcome: LogOutcome) -> bool {
        self.viewer_mut(kind).apply_fetch(epoch, outcome)
    }

    // --- Transient UI ---

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }

    pub fn set_error(&mut self, msg: String) {
        self.error = Some((msg, std::time::Instant::now()));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn prune_error(&mut self) {
        if let Some((_, ts)) = &self.error {
            if ts.elapsed().as_secs() >= ERROR_TTL_SECS {
                self.error = None;
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }
}
