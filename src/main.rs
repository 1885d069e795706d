use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::sync::Mutex;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use newsdesk::api::HttpBackend;
use newsdesk::app::{App, AppEvent, Effect};
use newsdesk::config::Config;
use newsdesk::preview::FsReader;
use newsdesk::{input, page, preview, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(&config)?;
    info!(api = %config.api_url, "starting newsdesk");

    let backend = HttpBackend::new(config).context("failed to build HTTP client")?;

    let mut terminal = setup_terminal()?;
    let res = run(&mut terminal, backend).await;
    restore_terminal(&mut terminal)?;
    res
}

fn init_logging(config: &Config) -> Result<()> {
    // The terminal belongs to the UI, so logs go to a file.
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsdesk=info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

async fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, backend: HttpBackend) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<AppEvent>(16);
    let mut app = App::new();

    perform(Effect::Load, &mut app, &backend, &tx);

    loop {
        // Handle background results
        while let Ok(event) = rx.try_recv() {
            if let Some(effect) = app.on_event(event) {
                perform(effect, &mut app, &backend, &tx);
            }
        }

        app.tick = app.tick.wrapping_add(1);
        terminal.draw(|f| ui::draw(f, &app))?;

        let action = input::poll_action(app.input_mode())?;
        if let Some(effect) = app.handle(action) {
            if !perform(effect, &mut app, &backend, &tx) {
                break;
            }
        }
    }

    Ok(())
}

/// Start the work an effect asks for. Returns `false` when the app should exit.
fn perform(effect: Effect, app: &mut App, backend: &HttpBackend, tx: &mpsc::Sender<AppEvent>) -> bool {
    match effect {
        Effect::Quit => return false,
        Effect::Load => {
            let (tx, backend) = (tx.clone(), backend.clone());
            tokio::spawn(async move {
                let done = page::fetch_articles(&backend).await;
                let _ = tx.send(AppEvent::Completed(done)).await;
            });
        }
        Effect::Submit(submission) => {
            let (tx, backend) = (tx.clone(), backend.clone());
            tokio::spawn(async move {
                let done = page::submit(&backend, submission).await;
                let _ = tx.send(AppEvent::Completed(done)).await;
            });
        }
        Effect::Delete(request) => {
            let (tx, backend) = (tx.clone(), backend.clone());
            tokio::spawn(async move {
                let done = page::delete_article(&backend, request).await;
                let _ = tx.send(AppEvent::Completed(done)).await;
            });
        }
        Effect::BuildPreviews(request) => {
            let tx = tx.clone();
            tokio::spawn(async move {
                let batch = preview::build_previews(&FsReader, request.files).await;
                let _ = tx
                    .send(AppEvent::Previews {
                        generation: request.generation,
                        batch,
                    })
                    .await;
            });
        }
        Effect::ProbeImages(urls) => {
            for url in urls {
                let (tx, backend) = (tx.clone(), backend.clone());
                tokio::spawn(async move {
                    let available = backend.image_available(&url).await;
                    let _ = tx.send(AppEvent::ImageChecked { url, available }).await;
                });
            }
        }
        Effect::OpenImage(url) => {
            if let Err(e) = open::that(&url) {
                warn!(%url, error = %e, "could not open image");
                app.page.set_status(format!("Could not open image: {}", e));
            } else {
                app.page.set_status("Opened image.");
            }
        }
    }
    true
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
