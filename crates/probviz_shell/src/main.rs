//! `probviz`: browse probability topics and run their experiments in a
//! terminal.
//!
//! Examples:
//!   probviz topics
//!   probviz browse coin_tossing_experiment experiment
//!   probviz show coin_tossing_experiment --n 500 --set p=0.3
//!   probviz show dice_rolling_experiment experiment --mode expectation
//!   probviz show continuous_pdf --dist gamma --set alpha=3
//!   probviz show poisson_theorem description --html
//!   probviz theme dark
//!
//! Settings live in the OS data directory; `probviz paths` prints it.

mod app;
mod browse;
mod error;
mod markdown;
mod pages;
mod paths;
mod settings;
mod term_plot;

use std::fs;
use std::io::{self, IsTerminal};
use std::process;
use std::sync::Mutex;

use probviz::context::{Theme, UiScale};
use probviz::driver::TICK_INTERVAL;
use probviz::router::PageKey;
use probviz_experiments::catalog::TopicKind;
use probviz_experiments::dice::DiceView;
use probviz_experiments::params::parse_assignment;
use tracing::{info, warn};

use crate::app::{App, PageHandle};
use crate::browse::Browser;
use crate::error::ShellError;
use crate::paths::AppPaths;
use crate::settings::{load_settings, save_settings};
use crate::term_plot::TextPlot;

const DEFAULT_SEED: u64 = 0x5eed_2024;

fn usage() -> ! {
    eprintln!("probviz (probability experiments in the terminal)");
    eprintln!("Usage: probviz [--seed N] <command> [args]\n");
    eprintln!("Commands:");
    eprintln!("  topics                          List topics and their route keys");
    eprintln!("  browse [topic] [description|experiment]");
    eprintln!("                                  Interactive session (q to quit)");
    eprintln!("  show <topic> [description|experiment]");
    eprintln!("       [--n N]                    Sample count of a coin or dice run");
    eprintln!("       [--mode frequency|expectation]  Dice view");
    eprintln!("       [--dist <family>]          Family of continuous_pdf / discrete_pdf");
    eprintln!("       [--set key=value]...       Any other control");
    eprintln!("       [--html]                   Write the description as an HTML page");
    eprintln!("       [--json]                   Print the final plot frame as JSON");
    eprintln!("  theme <light|dark|auto>         Persist the color theme");
    eprintln!("  scale <100|125|150|175|200|auto>  Persist the interface scale");
    eprintln!("  paths                           Show data directory and settings file");
    process::exit(1);
}

#[derive(Debug, Default)]
struct ShowArgs {
    topic: String,
    page: Option<PageKey>,
    n: Option<f64>,
    mode: Option<DiceView>,
    dist: Option<String>,
    assignments: Vec<(String, f64)>,
    html: bool,
    json: bool,
}

fn parse_args() -> (u64, Vec<String>) {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let mut seed = DEFAULT_SEED;
    if args.len() >= 2 && args[0] == "--seed" {
        seed = args[1].parse().unwrap_or_else(|_| {
            eprintln!("Invalid seed: {}", args[1]);
            process::exit(1);
        });
        args.drain(0..2);
    }
    if args.is_empty() {
        usage();
    }
    (seed, args)
}

fn parse_show(args: &[String]) -> Result<ShowArgs, ShellError> {
    let mut it = args.iter();
    let topic = it
        .next()
        .ok_or_else(|| ShellError::Usage("show: missing topic".into()))?;
    let mut show = ShowArgs {
        topic: topic.clone(),
        ..ShowArgs::default()
    };

    let value = |flag: &str, v: Option<&String>| {
        v.cloned()
            .ok_or_else(|| ShellError::Usage(format!("{flag} expects a value")))
    };
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--n" => {
                let raw = value("--n", it.next())?;
                show.n = Some(raw.parse().map_err(|_| {
                    ShellError::Usage(format!("--n expects a number, got `{raw}`"))
                })?);
            }
            "--mode" => show.mode = Some(value("--mode", it.next())?.parse()?),
            "--dist" => show.dist = Some(value("--dist", it.next())?),
            "--set" => show.assignments.push(parse_assignment(&value("--set", it.next())?)?),
            "--html" => show.html = true,
            "--json" => show.json = true,
            other if show.page.is_none() && !other.starts_with("--") => {
                show.page = Some(other.parse().map_err(ShellError::Usage)?);
            }
            other => return Err(ShellError::Usage(format!("unexpected argument `{other}`"))),
        }
    }
    Ok(show)
}

fn list_topics() {
    for topic in TopicKind::all() {
        println!("{:<34} {}", topic.label(), topic.display_name());
        println!("{:<34} {}", "", topic.summary());
    }
}

fn show_description(
    app: &mut App,
    topic: TopicKind,
    args: &ShowArgs,
    paths: &AppPaths,
) -> Result<(), ShellError> {
    let handle = app.navigate(topic, PageKey::Description)?;
    let page = handle.borrow();
    let Some(desc) = page.as_description() else {
        return Ok(());
    };

    if args.html {
        let dir = paths.pages_dir();
        fs::create_dir_all(&dir).map_err(|e| ShellError::io(&dir, e))?;
        let file = dir.join(format!("{}.html", topic.label()));
        fs::write(&file, desc.html()).map_err(|e| ShellError::io(&file, e))?;
        info!("Description written ({:?})", file);
        println!("{}", file.display());
    } else {
        println!("{}", desc.markdown().trim());
    }
    Ok(())
}

/// Applies the command-line controls to the visible experiment page.
///
/// Rejected values keep the page's previous setting and are reported as
/// notices, exactly as an edit in the interactive controls would be.
fn configure(app: &mut App, args: &ShowArgs) -> Result<(), ShellError> {
    if let Some(dist) = &args.dist {
        app.with_experiment(|exp, _| exp.set_distribution(dist))
            .transpose()?;
    }
    let updates = args
        .assignments
        .iter()
        .map(|(k, v)| (k.as_str(), *v))
        .chain(args.n.map(|n| ("n", n)));
    for (key, value) in updates {
        if let Some(notice) = app.update_param(key, value) {
            warn!(suppressed = notice.suppressed, "{}", notice.message);
        }
    }
    // The clock does not move here, so later rejections fall inside the
    // debounce window of the first.
    let dropped = app.suppressed_notices();
    if dropped > 0 {
        warn!(dropped, "{dropped} more value(s) rejected; previous settings kept");
    }
    if let Some(view) = args.mode {
        app.with_experiment(|exp, sched| exp.set_view(view, sched))
            .transpose()?;
    }
    Ok(())
}

fn paint(handle: &PageHandle, plot: &mut TextPlot<io::Stdout>) {
    if let Some(exp) = handle.borrow_mut().as_experiment_mut() {
        exp.paint(plot);
    }
}

fn print_params(handle: &PageHandle) {
    let page = handle.borrow();
    let Some(exp) = page.as_experiment() else {
        return;
    };
    if let Some(family) = exp.distribution() {
        println!("family: {family}");
    }
    for (spec, value) in exp.params().iter() {
        println!("  {}", spec.describe(value));
    }
}

fn print_json(handle: &PageHandle) -> Result<(), ShellError> {
    let page = handle.borrow();
    if let Some(frame) = page.as_experiment().and_then(|e| e.frame()) {
        println!("{}", serde_json::to_string_pretty(frame)?);
    }
    Ok(())
}

/// Ticks the visible run in real time until it completes or Ctrl-C.
/// Returns whether the run completed.
async fn animate(
    app: &mut App,
    handle: &PageHandle,
    mut plot: Option<&mut TextPlot<io::Stdout>>,
) -> bool {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(TICK_INTERVAL);

    loop {
        let running = handle
            .borrow()
            .as_experiment()
            .is_some_and(|e| e.is_running());
        if !running {
            return true;
        }
        tokio::select! {
            _ = ticker.tick() => {
                if app.pump(TICK_INTERVAL) > 0 {
                    if let Some(plot) = plot.as_deref_mut() {
                        paint(handle, plot);
                    }
                }
            }
            _ = &mut ctrl_c => {
                app.stop();
                return false;
            }
        }
    }
}

async fn show(seed: u64, args: &[String]) -> Result<(), ShellError> {
    let args = parse_show(args)?;
    let topic: TopicKind = args.topic.parse().map_err(ShellError::Usage)?;
    let paths = AppPaths::new().map_err(ShellError::Usage)?;
    let settings = load_settings(&paths.settings_file());
    let mut app = App::new(settings, seed, false)?;

    let page = args.page.unwrap_or(if args.html {
        PageKey::Description
    } else {
        PageKey::Experiment
    });
    if page == PageKey::Description {
        return show_description(&mut app, topic, &args, &paths);
    }

    let handle = app.navigate(topic, page)?;
    configure(&mut app, &args)?;

    let stdout = io::stdout();
    let ansi = stdout.is_terminal() && !args.json;
    let mut plot = TextPlot::new(stdout)
        .with_scale(settings.ui_scale)
        .with_ansi(ansi);
    let animated = handle
        .borrow()
        .as_experiment()
        .is_some_and(|e| e.is_animated());

    if animated {
        let surface = if args.json {
            None
        } else {
            paint(&handle, &mut plot);
            Some(&mut plot)
        };
        if !animate(&mut app, &handle, surface).await {
            warn!("Run cancelled");
        }
    }

    if args.json {
        print_json(&handle)?;
    } else {
        if !animated {
            paint(&handle, &mut plot);
        }
        print_params(&handle);
    }
    info!(
        route = ?app.current_route().map(|r| r.to_string()),
        pages = app.constructed_count(),
        frames = plot.frames(),
        "done"
    );
    Ok(())
}

async fn browse(seed: u64, args: &[String]) -> Result<(), ShellError> {
    let topic = match args.first() {
        Some(raw) => raw.parse().map_err(ShellError::Usage)?,
        None => TopicKind::all()[0],
    };
    let page = match args.get(1) {
        Some(raw) => raw.parse().map_err(ShellError::Usage)?,
        None => PageKey::Description,
    };
    let paths = AppPaths::new().map_err(ShellError::Usage)?;
    let file = paths.settings_file();
    let settings = load_settings(&file);

    let browser = Browser::open(App::new(settings, seed, false)?, topic, page)?;
    let settings = browser.run(settings.ui_scale).await?;
    save_settings(&file, &settings)?;
    Ok(())
}

fn init_logging(interactive: bool) {
    if !interactive {
        // Logs go to stderr so they never interleave with the plot.
        tracing_subscriber::fmt().with_writer(io::stderr).init();
        return;
    }
    // The session owns the terminal.
    let file = AppPaths::new().ok().and_then(|paths| {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths.log_file())
            .ok()
    });
    match file {
        Some(file) => tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init(),
        None => tracing_subscriber::fmt().with_writer(io::sink).init(),
    }
}

fn persist(update: impl FnOnce(&mut probviz::context::Settings)) -> Result<(), ShellError> {
    let paths = AppPaths::new().map_err(ShellError::Usage)?;
    let file = paths.settings_file();
    let mut settings = load_settings(&file);
    update(&mut settings);
    save_settings(&file, &settings)?;
    println!(
        "theme: {}, scale: {}",
        settings.theme.label(),
        settings.ui_scale.label()
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (seed, args) = parse_args();
    let cmd = args[0].as_str();
    init_logging(cmd == "browse");
    let rest = &args[1..];

    let result = match cmd {
        "topics" => {
            list_topics();
            Ok(())
        }
        "show" => show(seed, rest).await,
        "browse" => browse(seed, rest).await,
        "theme" => match rest.first().map(|s| s.parse::<Theme>()) {
            Some(Ok(theme)) => persist(|s| s.theme = theme),
            Some(Err(e)) => Err(ShellError::Usage(e)),
            None => usage(),
        },
        "scale" => match rest.first().map(|s| s.parse::<UiScale>()) {
            Some(Ok(scale)) => persist(|s| s.ui_scale = scale),
            Some(Err(e)) => Err(ShellError::Usage(e)),
            None => usage(),
        },
        "paths" => {
            let paths = AppPaths::new()?;
            println!("Data dir: {}", paths.data_dir().display());
            println!("Settings: {}", paths.settings_file().display());
            println!("Pages:    {}", paths.pages_dir().display());
            println!("Log:      {}", paths.log_file().display());
            Ok(())
        }
        _ => usage(),
    };

    if let Err(ShellError::Usage(msg)) = &result {
        eprintln!("{msg}");
        usage();
    }
    result?;
    Ok(())
}
