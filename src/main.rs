use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

use pacemap::{
    app::{Action, App},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    coordinator::ViewCoordinator,
    export::{write_csv, write_list},
    geolocation::{request_in_background, StaticGeolocator},
    map::MAX_ZOOM,
    persistence::{SqliteBlobStore, WorkoutPersistence},
    runtime::{AppEvent, CrosstermEventSource, Runner},
    ui,
    workout::Location,
};

const TICK_RATE_MS: u64 = 250;

/// map-pinned running and cycling log
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Log runs and rides on a terminal map. Pick a spot, enter distance and duration, and pacemap keeps pace or speed for every workout across sessions."
)]
pub struct Cli {
    /// latitude to report as your position at startup
    #[clap(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// longitude to report as your position at startup
    #[clap(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,

    /// map zoom level used on startup and when jumping to a workout
    #[clap(short = 'z', long, value_parser = clap::value_parser!(u8).range(1..=MAX_ZOOM as i64))]
    zoom: Option<u8>,

    /// workouts database file
    #[clap(long)]
    db: Option<PathBuf>,

    /// config file to read (and write with --save-config)
    #[clap(long)]
    config: Option<PathBuf>,

    /// print stored workouts and exit
    #[clap(long)]
    list: bool,

    /// write stored workouts as CSV to PATH ("-" for stdout) and exit
    #[clap(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,

    /// remember --lat/--lng/--zoom/--db as defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command line values win over the stored config
    fn apply_to(&self, cfg: &mut Config) {
        if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
            cfg.home = Some(Location::new(lat, lng));
        }
        if let Some(zoom) = self.zoom {
            cfg.zoom_level = zoom;
        }
        if let Some(db) = &self.db {
            cfg.database = Some(db.clone());
        }
    }
}

fn init_logging() {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pacemap=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = cli
        .config
        .as_ref()
        .map(FileConfigStore::with_path)
        .unwrap_or_default();
    let mut cfg = config_store.load();
    cli.apply_to(&mut cfg);
    if cli.save_config {
        config_store.save(&cfg)?;
        tracing::info!(path = %config_store.path().display(), "config saved");
    }

    let db_path = cfg.database_path();

    if cli.list || cli.export_csv.is_some() {
        let persistence = WorkoutPersistence::new(SqliteBlobStore::open(&db_path)?);
        let workouts = persistence.load()?;
        if cli.list {
            write_list(&workouts, io::stdout().lock())?;
        }
        match cli.export_csv.as_deref() {
            Some(path) if path.as_os_str() == "-" => write_csv(&workouts, io::stdout().lock())?,
            Some(path) => write_csv(&workouts, File::create(path)?)?,
            None => {}
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = SqliteBlobStore::open(&db_path)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, store, &cfg);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    mut store: SqliteBlobStore,
    cfg: &Config,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    let mut notice = None;

    // each pass is one session; a reset starts the next one from empty storage
    loop {
        let coordinator = ViewCoordinator::start(WorkoutPersistence::new(store), cfg.zoom_level);
        let mut app = App::new(coordinator).with_status(notice.take());
        request_in_background(
            StaticGeolocator::new(cfg.home),
            runner.event_source().sender(),
            AppEvent::Located,
        );

        let action = loop {
            terminal.draw(|f| ui::draw(&app, f))?;
            match app.on_event(runner.step()) {
                Action::Continue => {}
                other => break other,
            }
        };

        match action {
            Action::Reset => {
                store = match app.into_coordinator().reset() {
                    Ok(store) => store,
                    Err(err) => {
                        tracing::error!(%err, "could not clear stored workouts");
                        notice = Some(format!("Workouts not erased: {err}"));
                        SqliteBlobStore::open(cfg.database_path())?
                    }
                };
            }
            Action::Quit | Action::Continue => return Ok(()),
        }
    }
}
