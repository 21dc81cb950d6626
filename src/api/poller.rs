use crate::api::client::{ApiClient, LogResponse};
use crate::api::parser;
use crate::app::{BuildAction, LogKind, LogOutcome, LOG_REFRESH_SECS};
use crate::events::AppEvent;
use tokio::sync::{mpsc, watch};
use tokio::time;

/// Periodically fetches the builds list and pushes it into the event loop.
/// This push channel is the only thing that overwrites a Pending card.
pub struct Poller {
    client: ApiClient,
    repo: Option<String>,
    interval: u64,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl Poller {
    pub fn new(
        client: ApiClient,
        repo: Option<String>,
        interval: u64,
        tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            client,
            repo,
            interval,
            tx,
        }
    }

    pub async fn run(self) {
        // Initial fetch
        self.poll_once().await;

        loop {
            time::sleep(time::Duration::from_secs(self.interval)).await;
            self.poll_once().await;
        }
    }

    async fn poll_once(&self) {
        fetch_builds_once(&self.client, self.repo.as_deref(), &self.tx).await;
    }
}

/// One builds-list fetch, shared by the poller and the manual refresh key.
pub async fn fetch_builds_once(
    client: &ApiClient,
    repo: Option<&str>,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match client.fetch_builds(repo).await {
        Ok(builds) => {
            let _ = tx.send(AppEvent::BuildsResult(builds));
        }
        Err(e) => {
            let _ = tx.send(AppEvent::Error(format!("Refresh failed: {e}")));
        }
    }
}

/// Reduces a log-endpoint response to viewer display text. Every branch
/// yields something printable; errors never abort the polling cycle.
pub fn log_outcome(kind: LogKind, result: reqwest::Result<LogResponse>) -> LogOutcome {
    match result {
        Ok(resp) if resp.status.is_success() => {
            LogOutcome::Text(parser::log_display_text(&resp.body, kind))
        }
        Ok(resp) => LogOutcome::Error(format!(
            "Error loading {}: {} {}",
            kind.label(),
            resp.status.as_u16(),
            resp.status.canonical_reason().unwrap_or("Unknown"),
        )),
        Err(e) => LogOutcome::Error(format!("Error loading {}: {e}", kind.label())),
    }
}

/// Polling loop for one open viewer: immediate fetch, then one fetch every
/// `LOG_REFRESH_SECS` until the cancel handle fires. Results carry the
/// epoch the viewer was opened under, so a result that lands after close
/// is dropped by the state machine rather than here.
pub async fn watch_log(
    client: ApiClient,
    name: String,
    kind: LogKind,
    epoch: u64,
    tx: mpsc::UnboundedSender<AppEvent>,
    mut cancel: watch::Receiver<bool>,
) {
    loop {
        let outcome = log_outcome(kind, client.fetch_log(&name, kind).await);
        if tx.send(AppEvent::LogFetched { kind, epoch, outcome }).is_err() {
            tracing::warn!("watch_log: channel closed");
            return;
        }
        tokio::select! {
            () = time::sleep(time::Duration::from_secs(LOG_REFRESH_SECS)) => {}
            _ = cancel.changed() => return,
        }
    }
}

/// Owns the cancel handles of the (at most two) running log poll tasks.
/// Each viewer owns at most one task; both close paths — explicit close
/// and app teardown via `stop_all` — release it.
pub struct LogPollers {
    slots: [Option<watch::Sender<bool>>; 2],
}

impl LogPollers {
    pub fn new() -> Self {
        Self { slots: [None, None] }
    }

    fn idx(kind: LogKind) -> usize {
        match kind {
            LogKind::Deploy => 0,
            LogKind::Init => 1,
        }
    }

    pub fn start(
        &mut self,
        kind: LogKind,
        client: &ApiClient,
        name: String,
        epoch: u64,
        tx: &mpsc::UnboundedSender<AppEvent>,
    ) {
        // LogViewer::open refuses a second open, but a stale handle must
        // never leak a running task
        self.stop(kind);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let client = client.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            watch_log(client, name, kind, epoch, tx, cancel_rx).await;
        });
        self.slots[Self::idx(kind)] = Some(cancel_tx);
    }

    pub fn stop(&mut self, kind: LogKind) {
        if let Some(cancel) = self.slots[Self::idx(kind)].take() {
            let _ = cancel.send(true);
        }
    }

    pub fn stop_all(&mut self) {
        self.stop(LogKind::Deploy);
        self.stop(LogKind::Init);
    }

    pub fn is_running(&self, kind: LogKind) -> bool {
        self.slots[Self::idx(kind)].is_some()
    }
}

impl Default for LogPollers {
    fn default() -> Self {
        Self::new()
    }
}

/// Fire-and-forget lifecycle request. Failure leaves the card Pending
/// until the next refresh corrects it; only the trace log records it.
pub fn dispatch_action(client: &ApiClient, name: String, action: BuildAction) {
    let client = client.clone();
    tokio::spawn(async move {
        if let Err(e) = client.send_action(&name, action).await {
            tracing::warn!("{} {name} failed: {e}", action.as_str());
        }
    });
}
