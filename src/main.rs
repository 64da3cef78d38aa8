mod app;
mod config;
mod store;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use config::{AppConfig, Credentials};
use store::registry::Registry;
use store::StoreClient;

#[derive(Parser, Debug)]
#[command(name = "friendmap")]
#[command(author = "Sean Fournier")]
#[command(version = "0.1.0")]
#[command(about = "A terminal-friendly map of friends' houses")]
struct Args {
    /// Print all friends as JSON (for scripting)
    #[arg(short, long)]
    list: bool,

    /// Add a friend and exit
    #[arg(short, long, num_args = 3, value_names = ["NAME", "X", "Y"], allow_hyphen_values = true)]
    add: Option<Vec<String>>,

    /// Remove a friend by id and exit. Store-generated ids start with '-',
    /// so hyphen values must be accepted here.
    #[arg(short, long, value_name = "ID", allow_hyphen_values = true)]
    remove: Option<String>,

    /// Credential file (default: ~/.config/friendmap/credentials.json)
    #[arg(long, value_name = "PATH")]
    credentials: Option<PathBuf>,

    /// Override the database URL from the config
    #[arg(long, value_name = "URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Handle CLI-only commands
    if args.list {
        return print_friends(&args).await;
    }

    if let Some(ref add) = args.add {
        return add_friend(&args, add).await;
    }

    if let Some(ref id) = args.remove {
        return remove_friend(&args, id).await;
    }

    // Run TUI
    run_tui(&args).await
}

/// Build the store client from config + credential file. Any failure here
/// is a startup-halting config problem.
fn build_client(args: &Args) -> Result<(StoreClient, AppConfig)> {
    let mut config = AppConfig::load();
    if let Some(ref url) = args.database_url {
        config.database_url = url.clone();
    }
    if let Some(ref path) = args.credentials {
        config.credential_file = Some(path.clone());
    }

    let creds = Credentials::load(&config.credential_path())?;
    let client = StoreClient::new(&config, &creds)?;
    Ok((client, config))
}

async fn print_friends(args: &Args) -> Result<()> {
    let (client, _) = build_client(args)?;
    let mut registry = Registry::new(client);

    let friends = registry.list().await;
    if let Some(e) = registry.take_error() {
        anyhow::bail!("{e}");
    }

    println!("{}", serde_json::to_string_pretty(&friends)?);
    Ok(())
}

async fn add_friend(args: &Args, add: &[String]) -> Result<()> {
    let (client, _) = build_client(args)?;
    let mut registry = Registry::new(client);

    let name = &add[0];
    let x: i64 = add[1].parse().context("X must be an integer")?;
    let y: i64 = add[2].parse().context("Y must be an integer")?;

    let id = registry.add(name, x, y).await?;
    println!("{id}");
    Ok(())
}

async fn remove_friend(args: &Args, id: &str) -> Result<()> {
    let (client, _) = build_client(args)?;
    let mut registry = Registry::new(client);

    registry.remove(id).await?;
    println!("Removed {id}");
    Ok(())
}

async fn run_tui(args: &Args) -> Result<()> {
    let (client, config) = build_client(args)?;

    // Surface a bad endpoint or rejected credentials before the terminal
    // goes into raw mode
    client
        .ping()
        .await
        .context("Could not reach the database")?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(Registry::new(client), config.refresh_secs).await;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c')
                            if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                        {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key).await {
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
            }
        }

        // Periodic refresh + status message expiry
        app.tick().await;
    }
}
