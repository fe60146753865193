mod app;
mod cli;
mod config;
mod fields;
mod input;
mod item;
mod k8s;
mod logs;
mod panel;
mod router;
mod search;
mod table;
mod tabs;
mod theme;
mod ui;

use anyhow::{Context, Result, bail};
use app::{App, AppCommand};
use clap::Parser;
use cli::{CliArgs, Command};
use config::{Dashboard, PanelDef};
use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use item::ItemPanel;
use k8s::KubeGateway;
use logs::LogsPanel;
use panel::Panel;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use table::TablePanel;
use theme::Theme;
use tokio::time::{Duration, MissedTickBehavior, interval, timeout};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

const RENDER_TICK: Duration = Duration::from_millis(250);
const DETAIL_FETCH_TIMEOUT: Duration = Duration::from_secs(4);

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    if let Some(Command::Version) = args.command {
        println!("skiff {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_tracing(&args.log_filter)?;

    let source = args
        .config
        .as_deref()
        .context("a dashboard config path or URL is required")?;
    let dashboard = config::load_dashboard(source).await?;
    if dashboard.panels.is_empty() {
        bail!("dashboard config {source} declares no panels");
    }

    let theme = match &args.theme {
        Some(path) => Theme::load(path)?,
        None => Theme::default(),
    };

    let gateway = KubeGateway::new().await?;
    let panels = build_panels(&gateway, dashboard).await;
    let mut app = App::new(panels);

    run(&mut app, &gateway, &theme).await
}

fn init_tracing(level_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::sink)
        .try_init();

    Ok(())
}

/// Builds one panel per config entry and starts its event router. A panel
/// whose kind fails to resolve still appears, showing the resolution error
/// in place of content.
async fn build_panels(gateway: &KubeGateway, dashboard: Dashboard) -> Vec<Panel> {
    let mut panels = Vec::new();
    for def in dashboard.panels {
        match def {
            PanelDef::Table(def) => {
                let mut panel = TablePanel::new(def.clone());
                let writer = panel.writer();
                match gateway
                    .resolve_kind(&def.group, &def.version, &def.kind)
                    .await
                {
                    Ok(binding) => {
                        panel.set_binding(binding.clone());
                        router::spawn_table_router(gateway.clone(), binding, def, writer);
                    }
                    Err(error) => {
                        warn!("table panel setup failed: {error:#}");
                        writer.set_error(format!("{error:#}"));
                    }
                }
                panels.push(Panel::Table(panel));
            }
            PanelDef::Item(def) => {
                let panel = ItemPanel::new(def.clone());
                let writer = panel.writer();
                match gateway
                    .resolve_kind(&def.group, &def.version, &def.kind)
                    .await
                {
                    Ok(binding) => {
                        router::spawn_item_router(gateway.clone(), binding, def, writer);
                    }
                    Err(error) => {
                        warn!("item panel setup failed: {error:#}");
                        writer.set_error(format!("{error:#}"));
                    }
                }
                panels.push(Panel::Item(panel));
            }
            PanelDef::Logs(def) => {
                let panel = LogsPanel::new(def.clone());
                let writer = panel.writer();
                match gateway
                    .resolve_kind(&def.group, &def.version, &def.kind)
                    .await
                {
                    Ok(binding) => {
                        router::spawn_logs_router(gateway.clone(), binding, def, writer);
                    }
                    Err(error) => {
                        warn!("logs panel setup failed: {error:#}");
                        writer.set_error(format!("{error:#}"));
                    }
                }
                panels.push(Panel::Logs(panel));
            }
        }
    }
    panels
}

async fn run(app: &mut App, gateway: &KubeGateway, theme: &Theme) -> Result<()> {
    let mut terminal = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, gateway, theme).await;
    let restore_result = restore_terminal(&mut terminal);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<TuiTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    gateway: &KubeGateway,
    theme: &Theme,
) -> Result<()> {
    let size = terminal.size().context("failed to read terminal size")?;
    app.resize(size.width, size.height);

    let mut reader = EventStream::new();
    let mut ticker = interval(RENDER_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        app.prepare_render();
        terminal
            .draw(|frame| ui::render(frame, app, theme))
            .context("failed to render terminal frame")?;

        if !app.running {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.input_context(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action, theme);
                            execute_app_command(app, gateway, command).await;
                        }
                    }
                    Some(Ok(Event::Resize(width, height))) => {
                        app.resize(width, height);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        warn!("terminal event error: {error}");
                    }
                    None => break,
                }
            }
            _ = ticker.tick() => {}
        }
    }

    Ok(())
}

async fn execute_app_command(app: &mut App, gateway: &KubeGateway, command: AppCommand) {
    match command {
        AppCommand::None | AppCommand::Quit => {}
        AppCommand::FetchDetail { panel, identity } => {
            let binding = match app.panels.get(panel) {
                Some(Panel::Table(table)) => table.binding().cloned(),
                _ => None,
            };
            let Some(binding) = binding else {
                return;
            };

            let fetch = gateway.get_object(&binding, identity.namespace.as_deref(), &identity.name);
            let content = match timeout(DETAIL_FETCH_TIMEOUT, fetch).await {
                Ok(Ok(object)) => k8s::to_yaml(&object).unwrap_or_else(|error| format!("{error:#}")),
                Ok(Err(error)) => format!("{error:#}"),
                Err(_) => format!("timed out fetching {}", identity.name),
            };
            app.complete_detail(panel, content);
        }
    }
}
