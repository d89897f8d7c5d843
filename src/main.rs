use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vitalwatch::export::{build_report, write_report};
use vitalwatch::ingest::MergePolicy;
use vitalwatch::monitor::AlertMonitor;
use vitalwatch::notify::NotifierKind;
use vitalwatch::ui::{self, Theme, ROSTER_FIRST_ROW};
use vitalwatch::{events, App, FileSource, PatientId, Session, Settings};

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "vitalwatch=info";

#[derive(Parser, Debug)]
#[command(name = "vitalwatch")]
#[command(about = "Terminal dashboard for ICU vital-sign time series and clinical alerts")]
struct Args {
    /// Path to the patient CSV upload
    #[arg(short, long, default_value = "patients.csv")]
    file: PathBuf,

    /// Settings file (TOML). Defaults to vitalwatch.toml if present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Source refresh interval (e.g. "1s", "500ms")
    #[arg(short, long)]
    refresh: Option<String>,

    /// Alert re-check interval for the selected patient (e.g. "60s")
    #[arg(long)]
    alert_interval: Option<String>,

    /// How a re-uploaded patient combines with stored data: replace | append
    #[arg(long)]
    merge_policy: Option<MergePolicy>,

    /// Points per sparkline in the vitals view
    #[arg(long)]
    window: Option<usize>,

    /// Alert notifications: bell | log | off
    #[arg(long)]
    notifier: Option<NotifierKind>,

    /// O2 saturation at or below which an alert fires (%)
    #[arg(long)]
    o2_critical: Option<f64>,

    /// Respiratory rate above which an alert fires (breaths/min)
    #[arg(long)]
    resp_rate_high: Option<f64>,

    /// Decompensation risk above which an alert fires (%)
    #[arg(long)]
    decompensation_pct: Option<f64>,

    /// Length-of-stay estimate above which an alert fires (days)
    #[arg(long)]
    los_days: Option<f64>,

    /// Patient to select on startup
    #[arg(long)]
    select: Option<String>,

    /// Write logs to this file while the TUI is running
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Export the evaluated roster to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of loaded settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(ref refresh) = self.refresh {
            settings.refresh = refresh.clone();
        }
        if let Some(ref interval) = self.alert_interval {
            settings.alert_interval = interval.clone();
        }
        if let Some(policy) = self.merge_policy {
            settings.merge_policy = policy;
        }
        if let Some(window) = self.window {
            settings.window = window;
        }
        if let Some(notifier) = self.notifier {
            settings.notifier = notifier;
        }
        if let Some(v) = self.o2_critical {
            settings.alerts.o2_critical = v;
        }
        if let Some(v) = self.resp_rate_high {
            settings.alerts.resp_rate_high = v;
        }
        if let Some(v) = self.decompensation_pct {
            settings.alerts.decompensation_pct = v;
        }
        if let Some(v) = self.los_days {
            settings.alerts.los_days = v;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        init_logging(None)?;
        return export_to_file(&args.file, export_path, &settings);
    }

    if let Some(ref log_file) = args.log_file {
        init_logging(Some(log_file))?;
    }

    run_tui(&args, settings)
}

/// Install the tracing subscriber, writing to `log_file` or stderr.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

/// Run the TUI against a CSV file source
fn run_tui(args: &Args, settings: Settings) -> Result<()> {
    // The alert monitor's tick task runs here while the TUI owns the main thread
    let rt = tokio::runtime::Runtime::new()?;

    let session = Session::new(
        settings.alerts.clone(),
        settings.merge_policy,
        settings.notifier.build(),
    );
    let monitor = AlertMonitor::new(rt.handle().clone(), settings.alert_interval()?);
    let source = Box::new(FileSource::new(&args.file));

    info!(
        file = %args.file.display(),
        policy = %settings.merge_policy,
        alert_interval = %settings.alert_interval,
        "Starting dashboard"
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = App::new(source, session)
        .with_monitor(monitor)
        .with_theme(Theme::auto_detect())
        .with_window(settings.window);
    let _ = app.reload_data();

    if let Some(ref id) = args.select {
        app.select_patient(&PatientId::from(id.as_str()));
        app.set_view(vitalwatch::app::View::Vitals);
    }

    let result = run_app(&mut terminal, &mut app, settings.refresh_interval()?);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Dropping the app aborts the tick task before the runtime goes away
    drop(app);
    rt.shutdown_timeout(Duration::from_millis(100));

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse, ROSTER_FIRST_ROW),
                _ => {}
            }
        }

        app.process_ticks();

        if last_refresh.elapsed() >= refresh_interval {
            if let Err(e) = app.reload_data() {
                warn!("Reload failed: {}", e);
            }
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Evaluate every patient in a CSV file and write the JSON report
fn export_to_file(csv_path: &Path, export_path: &Path, settings: &Settings) -> Result<()> {
    let content = std::fs::read_to_string(csv_path)
        .with_context(|| format!("Failed to read {}", csv_path.display()))?;

    let mut session = Session::new(
        settings.alerts.clone(),
        settings.merge_policy,
        NotifierKind::Off.build(),
    );
    let summary = session.ingest(&content)?;
    info!(%summary, "Loaded {}", csv_path.display());

    let report = build_report(&session);
    write_report(&report, export_path)?;

    println!(
        "Exported {} patients ({} alerting) to: {}",
        report.summary.total_patients,
        report.summary.alerting,
        export_path.display()
    );
    Ok(())
}
