use autotype::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    desktop::{NativeDesktop, WindowLister},
    engine::{Engine, Status},
    runtime::{enter_screen, leave_screen, CrosstermEventSource, FixedTicker, Runner},
    session::check_rates,
    timer::{Clock, SystemClock},
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode},
    tty::IsTty,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Read, Write},
    path::PathBuf,
    process,
    sync::Mutex,
    thread,
    time::Duration,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 100;

/// types a block of text at a human pace, typos and all
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Types a block of text one character at a time at a human pace, injecting and correcting typos, into a preview pane and optionally into another window."
)]
pub struct Cli {
    /// text to type
    #[clap(short = 't', long, conflicts_with = "file")]
    text: Option<String>,

    /// read the text to type from a file (or from stdin with --headless)
    #[clap(short = 'f', long)]
    file: Option<PathBuf>,

    /// typing speed in words per minute (10-300)
    #[clap(short = 'w', long)]
    wpm: Option<f64>,

    /// percentage of characters typed right the first time (70-100)
    #[clap(short = 'a', long)]
    accuracy: Option<f64>,

    /// id of a window to type into, as printed by --list-windows
    #[clap(long)]
    window: Option<String>,

    /// list windows that can be typed into and exit
    #[clap(long)]
    list_windows: bool,

    /// type without the interactive screen, streaming the result to stdout
    #[clap(long)]
    headless: bool,

    /// seed for the random source, for reproducible runs
    #[clap(long)]
    seed: Option<u64>,

    /// remember --wpm and --accuracy as the new defaults
    #[clap(long)]
    save: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("autotype: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let interactive = !cli.headless && !cli.list_windows;

    if interactive && !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::Io,
            "stdin must be a tty (use --headless to pipe text in)",
        )
        .exit();
    }

    init_logging(interactive);

    let store = FileConfigStore::new();
    let mut config = store.load();
    config.wpm = cli.wpm.unwrap_or(config.wpm);
    config.accuracy = cli.accuracy.unwrap_or(config.accuracy);
    // saved values are range-checked on load, so a failure here is a flag
    if let Err(err) = check_rates(config.wpm, config.accuracy) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, err).exit();
    }
    if cli.save {
        store.save(&config)?;
        info!(path = %store.path().display(), "saved defaults");
    }

    let desktop = NativeDesktop::detect();

    if cli.list_windows {
        return list_windows(&desktop, &config);
    }

    let text = read_text(&cli)?;
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let engine = Engine::new(rng, desktop);

    if cli.headless {
        return run_headless(engine, &text, &config, cli.window);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    enter_screen(&mut stdout, &config.exclude_title)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(
        engine,
        text,
        config.wpm,
        config.accuracy,
        config.exclude_title.clone(),
    );
    app.refresh_windows();
    if let Some(id) = &cli.window {
        app.selected = app.windows.iter().position(|w| &w.id == id);
    }
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    leave_screen(terminal.backend_mut())?;
    terminal.show_cursor()?;

    result
}

/// Interactive mode logs to a file; everything else logs to stderr.
fn init_logging(to_file: bool) {
    let default_filter = if to_file { "autotype=info" } else { "autotype=warn" };
    let filter = EnvFilter::try_from_env("AUTOTYPE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    if to_file {
        let file = AppDirs::log_path().and_then(|path| {
            fs::create_dir_all(path.parent()?).ok()?;
            OpenOptions::new().create(true).append(true).open(path).ok()
        });
        if let Some(file) = file {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_text(cli: &Cli) -> io::Result<String> {
    if let Some(text) = &cli.text {
        return Ok(text.clone());
    }
    if let Some(path) = &cli.file {
        return fs::read_to_string(path);
    }
    let mut text = String::new();
    if cli.headless && !stdin().is_tty() {
        stdin().read_to_string(&mut text)?;
    }
    Ok(text)
}

fn list_windows(desktop: &NativeDesktop, config: &Config) -> Result<(), Box<dyn Error>> {
    let windows = desktop.list_windows(&config.exclude_title)?;
    let mut out = io::stdout().lock();
    for w in windows {
        writeln!(out, "{}\t{}", w.id, w.title)?;
    }
    Ok(())
}

/// Drive the engine on the wall clock, printing characters as they are
/// committed (typos never reach stdout).
fn run_headless(
    mut engine: Engine<StdRng, NativeDesktop>,
    text: &str,
    config: &Config,
    window: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let clock = SystemClock::new();
    engine.start(clock.now(), text, config.wpm, config.accuracy, window)?;

    let mut out = io::stdout().lock();
    let mut printed = 0;
    let mut last_status = None;

    loop {
        let committed: String = engine
            .output()
            .chars()
            .take(engine.cursor())
            .skip(printed)
            .collect();
        printed += committed.chars().count();
        out.write_all(committed.as_bytes())?;
        out.flush()?;

        if last_status.as_ref() != Some(engine.status()) {
            if let Status::Countdown(_) = engine.status() {
                eprintln!("{}", engine.status());
            }
            last_status = Some(engine.status().clone());
        }

        let Some(deadline) = engine.next_deadline() else {
            break;
        };
        let now = clock.now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
        engine.poll(clock.now());
    }

    match engine.status() {
        Status::FocusFailed(reason) => Err(reason.clone().into()),
        _ => Ok(()),
    }
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<StdRng, NativeDesktop>,
) -> Result<(), Box<dyn Error>> {
    let clock = SystemClock::new();
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        if app.should_quit {
            break;
        }

        let until_due = app
            .engine
            .next_deadline()
            .map(|d| d.saturating_sub(clock.now()));
        let event = runner.step(until_due);
        app.on_event(event, clock.now());
    }

    app.stop();
    Ok(())
}
