//! skycast - current weather and forecast in the terminal
//!
//! Runs the interactive terminal UI by default, or a single lookup printed as
//! JSON with `--json`.

use std::io;
use std::panic;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use skycast::app::App;
use skycast::cli::{Cli, OutputMode, StartupConfig};
use skycast::config::Config;
use skycast::data::ViewModel;
use skycast::dispatch::QueryDispatcher;
use skycast::logging;
use skycast::session::{Presenter, QueryOutcome, Session, WeatherService};
use skycast::ui;

type BoxError = Box<dyn std::error::Error>;

/// Sets up a panic hook that restores the terminal before printing the panic message.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// Collects the single result of a `--json` lookup
#[derive(Default)]
struct JsonPresenter {
    rendered: Option<Result<String, serde_json::Error>>,
}

impl Presenter for JsonPresenter {
    fn present(&mut self, view: &ViewModel) {
        self.rendered = Some(serde_json::to_string_pretty(view));
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

async fn run_json(service: WeatherService, startup: StartupConfig) -> Result<ExitCode, BoxError> {
    let mut session = Session::new(startup.units);
    let mut presenter = JsonPresenter::default();

    let outcome = service
        .execute(&mut session, startup.target, &mut presenter)
        .await;

    match (outcome, presenter.rendered) {
        (QueryOutcome::Displayed, Some(rendered)) => {
            println!("{}", rendered?);
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::FAILURE),
    }
}

fn run_tui(service: WeatherService, startup: StartupConfig) -> Result<ExitCode, BoxError> {
    setup_panic_hook();

    let mut app = App::new(
        Session::new(startup.units),
        QueryDispatcher::new(Arc::new(service)),
    );
    app.start(startup.target);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.map(|_| ExitCode::SUCCESS)
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), BoxError> {
    loop {
        app.poll_results();
        terminal.draw(|f| ui::render(f, app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            tracing::info!("quitting");
            return Ok(());
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, BoxError> {
    logging::init(if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Interactive
    });

    let config = Config::load(cli.config.as_deref())?;
    let startup = StartupConfig::from_cli(&cli, &config)?;
    let service = config.build_service()?;

    match startup.output {
        OutputMode::Json => run_json(service, startup).await,
        OutputMode::Interactive => run_tui(service, startup),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
