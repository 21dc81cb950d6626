use bdw::api::client::{self, ApiClient};
use bdw::api::poller::{self, LogPollers, Poller};
use bdw::app::{AppConfig, AppState, BuildAction, BuildStatus, LogKind, LogViewer};
use bdw::cli::Cli;
use bdw::events::{AppEvent, EventHandler};
use bdw::input::{self, Action, InputContext};
use bdw::tui;
use clap::Parser;
use color_eyre::eyre::Result;
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    // Trace output goes to a file on request; stderr would corrupt the TUI
    if let Ok(path) = std::env::var("BDW_LOG") {
        let file = std::fs::File::create(path)?;
        tracing_subscriber::fmt()
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .init();
    }

    let client = ApiClient::new(&args.url);
    let mut state = AppState::new(AppConfig {
        server_url: args.url.clone(),
        repo: args.repo.clone(),
        interval: args.interval,
    });
    state.is_loading = true;

    // Setup terminal with panic hook
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Event handler
    let events = EventHandler::new(Duration::from_millis(100));
    let tx = events.sender();

    // Start builds-list poller
    let poller_client = client.clone();
    let poller_repo = args.repo.clone();
    let poller_interval = args.interval;
    let poller_tx = tx.clone();
    tokio::spawn(async move {
        let poller = Poller::new(poller_client, poller_repo, poller_interval, poller_tx);
        poller.run().await;
    });

    let result = run_app(&mut terminal, &mut state, events, &tx, &client).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut events: EventHandler,
    tx: &UnboundedSender<AppEvent>,
    client: &ApiClient,
) -> Result<()> {
    let mut pollers = LogPollers::new();
    let mut last_tick = Instant::now();
    let mut poll_start = Instant::now();

    loop {
        // Render
        terminal.draw(|f| tui::render::render(f, state))?;

        // Update countdown and prune stale errors
        let elapsed = poll_start.elapsed().as_secs();
        state.next_poll_in = state.config.interval.saturating_sub(elapsed);
        state.prune_error();

        // Process events
        if let Some(event) = events.next().await {
            match event {
                AppEvent::Key(key) => {
                    let ctx = InputContext {
                        has_error: state.error.is_some(),
                        has_overlay: state.has_overlay(),
                    };
                    match input::map_key(key, ctx) {
                        Action::Quit => state.should_quit = true,
                        Action::DismissError => state.clear_error(),
                        Action::MoveLeft => state.move_cursor_left(),
                        Action::MoveRight => state.move_cursor_right(),
                        Action::MoveUp => {
                            let cols = grid_columns(terminal);
                            state.move_cursor_up(cols);
                        }
                        Action::MoveDown => {
                            let cols = grid_columns(terminal);
                            state.move_cursor_down(cols);
                        }
                        Action::QuickSelect(n) => state.quick_select(n),
                        Action::Refresh => {
                            state.is_loading = true;
                            let client2 = client.clone();
                            let repo2 = state.config.repo.clone();
                            let tx2 = tx.clone();
                            tokio::spawn(async move {
                                poller::fetch_builds_once(&client2, repo2.as_deref(), &tx2).await;
                            });
                            poll_start = Instant::now();
                        }
                        Action::Start => begin_action(state, client, BuildAction::Start),
                        Action::Stop => begin_action(state, client, BuildAction::Stop),
                        Action::Reset => begin_action(state, client, BuildAction::Reset),
                        Action::Delete => begin_action(state, client, BuildAction::Delete),
                        Action::ViewLog => {
                            open_viewer(state, &mut pollers, client, tx, LogKind::Deploy);
                        }
                        Action::ViewInitLog => {
                            open_viewer(state, &mut pollers, client, tx, LogKind::Init);
                        }
                        Action::OpenDeploy => open_link(state, false),
                        Action::OpenMailhog => open_link(state, true),
                        Action::CloseOverlay => {
                            if let Some(kind) = state.close_top_log() {
                                pollers.stop(kind);
                            }
                        }
                        Action::ScrollUp => scroll_top_viewer(state, terminal, |v, h| v.scroll_up(1, h)),
                        Action::ScrollDown => scroll_top_viewer(state, terminal, |v, h| v.scroll_down(1, h)),
                        Action::PageUp => scroll_top_viewer(state, terminal, |v, h| v.scroll_up(20, h)),
                        Action::PageDown => scroll_top_viewer(state, terminal, |v, h| v.scroll_down(20, h)),
                        Action::ScrollToTop => scroll_top_viewer(state, terminal, |v, _| v.scroll_to_top()),
                        Action::ScrollToBottom => scroll_top_viewer(state, terminal, |v, _| v.scroll_to_bottom()),
                        Action::None => {}
                    }
                }
                AppEvent::Tick => {
                    if last_tick.elapsed() >= Duration::from_millis(100) {
                        state.advance_spinner();
                        last_tick = Instant::now();
                    }
                }
                AppEvent::BuildsResult(builds) => {
                    state.apply_builds(builds);
                    state.clear_error();
                    poll_start = Instant::now();
                }
                AppEvent::LogFetched { kind, epoch, outcome } => {
                    state.apply_log_fetch(kind, epoch, outcome);
                }
                AppEvent::Error(e) => {
                    state.is_loading = false;
                    state.set_error(e);
                }
            }
        }

        if state.should_quit {
            // Owner teardown: both poll tasks are released here as well as
            // on explicit close
            pollers.stop_all();
            return Ok(());
        }
    }
}

fn begin_action(state: &mut AppState, client: &ApiClient, action: BuildAction) {
    if let Some(name) = state.begin_action(action) {
        poller::dispatch_action(client, name, action);
    }
}

fn open_viewer(
    state: &mut AppState,
    pollers: &mut LogPollers,
    client: &ApiClient,
    tx: &UnboundedSender<AppEvent>,
    kind: LogKind,
) {
    if let Some((name, epoch)) = state.open_log(kind) {
        pollers.start(kind, client, name, epoch, tx);
    }
}

fn open_link(state: &AppState, mailhog: bool) {
    let Some(build) = state.selected() else { return };
    if build.status != BuildStatus::Started {
        return;
    }
    let link = if mailhog {
        build.deploy_link_mailhog.clone()
    } else {
        build.deploy_link.clone()
    };
    if let Some(url) = link {
        tokio::spawn(async move {
            let _ = client::open_in_browser(&url).await;
        });
    }
}

fn grid_columns(terminal: &Terminal<CrosstermBackend<io::Stdout>>) -> usize {
    terminal
        .size()
        .map(|s| tui::cards::columns_for_width(s.width))
        .unwrap_or(1)
}

fn scroll_top_viewer(
    state: &mut AppState,
    terminal: &Terminal<CrosstermBackend<io::Stdout>>,
    op: impl FnOnce(&mut LogViewer, usize),
) {
    let Some(kind) = state.top_log() else { return };
    let height = terminal
        .size()
        .map(|s| (s.height as usize * 8 / 10).max(6))
        .unwrap_or(20)
        .saturating_sub(2);
    op(state.viewer_mut(kind), height);
}
