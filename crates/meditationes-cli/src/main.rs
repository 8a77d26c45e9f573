mod app;
mod ui;

use std::fs::File;
use std::io::{Stdout, stdout};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use meditationes_config::{Config, Preferences};
use meditationes_engine::{
    DirSource, Language, Library, ReaderState, Resolution, SegmentId, convert, io, load_all_texts,
    load_index_set,
};
use ratatui::{Terminal, backend::CrosstermBackend};

#[derive(Parser, Debug)]
#[command(
    name = "meditationes",
    about = "Parallel Latin, French and Ukrainian reader for Descartes' Meditations",
    version
)]
struct Cli {
    /// Directory with la.json, la-ua.json, fr.json, fr-ua.json (overrides config)
    #[arg(long, global = true)]
    texts: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the reader (default)
    Read {
        /// Page to open instead of the last one read
        #[arg(long)]
        page: Option<i64>,
    },
    /// Convert a line-numbered text export into page JSON
    Convert {
        input: PathBuf,
        /// Defaults to <input>-converted.json
        output: Option<PathBuf>,
        /// Number of the first page
        #[arg(default_value_t = 1)]
        start_page: u32,
    },
    /// Replace Cyrillic lookalike letters inside parentheses with Latin ones
    FixCyrillic {
        /// A JSON file or a directory of them (defaults to the texts directory)
        path: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Print the segments a Latin line belongs to, in every language
    Lookup {
        page: i64,
        line: u32,
        /// Only the segment active at the end of the line
        #[arg(long, default_value_t = false)]
        single: bool,
    },
}

fn init_logging(log_file: Option<&Path>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    // The reader owns the terminal, so its log goes to a file
    if let Some(path) = log_file
        && path.parent().is_none_or(|dir| std::fs::create_dir_all(dir).is_ok())
        && let Ok(file) = File::create(path)
    {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
}

fn resolution_from(config: Option<&Config>) -> Resolution {
    match config.and_then(|c| c.resolution.as_deref()) {
        Some("single") => Resolution::Single,
        Some("multi") | None => Resolution::Multi,
        Some(other) => {
            log::warn!("Unknown resolution '{other}', using multi");
            Resolution::Multi
        }
    }
}

/// Texts directory from the flag, else the config file. Exits with usage
/// help when neither is available or the directory is unusable.
fn texts_source(cli_texts: Option<PathBuf>, config: Option<&Config>) -> DirSource {
    let config_path = Config::config_path();
    let (texts_path, from_config) = match cli_texts {
        Some(path) => (path, false),
        None => match config {
            Some(config) => (config.texts_path.clone(), true),
            None => {
                eprintln!("Error: No texts path provided and no config file found");
                eprintln!("Usage: meditationes --texts <texts-folder-path>");
                eprintln!("Or create a config file at {}", config_path.display());
                process::exit(1);
            }
        },
    };

    if let Err(e) = io::validate_texts_dir(&texts_path) {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!(
            "Error: Texts path '{}'{} is invalid: {e}",
            texts_path.display(),
            source
        );
        process::exit(1);
    }

    let source = DirSource::new(texts_path);
    match config.and_then(|c| c.index_path.clone()) {
        Some(index_path) => source.with_index_dir(index_path),
        None => source,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let reading = matches!(cli.command, None | Some(Commands::Read { .. }));
    let log_file = Config::config_path().with_file_name("reader.log");
    init_logging(reading.then_some(log_file.as_path()));

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Read { page: None }) {
        Commands::Read { page } => {
            let source = texts_source(cli.texts, config.as_ref());
            run_reader(&source, config.as_ref(), page)
        }
        Commands::Convert {
            input,
            output,
            start_page,
        } => {
            let output = output.unwrap_or_else(|| convert::default_output_path(&input));
            let pages = convert::convert_file(&input, &output, start_page)?;
            println!("Converted {pages} pages to {}", output.display());
            Ok(())
        }
        Commands::FixCyrillic { path, dry_run } => {
            let path = match path {
                Some(path) => path,
                None => texts_source(cli.texts, config.as_ref()).texts_dir().to_path_buf(),
            };
            fix_cyrillic(&path, dry_run)
        }
        Commands::Lookup { page, line, single } => {
            let source = texts_source(cli.texts, config.as_ref());
            let resolution = if single {
                Resolution::Single
            } else {
                Resolution::Multi
            };
            lookup(&source, page, line, resolution)
        }
    }
}

fn fix_cyrillic(path: &Path, dry_run: bool) -> Result<()> {
    let results = if path.is_dir() {
        convert::fix_cyrillic_dir(path, dry_run)?
    } else {
        vec![(path.to_path_buf(), convert::fix_cyrillic_file(path, dry_run)?)]
    };

    let mut total = 0;
    for (file, changes) in &results {
        if changes.is_empty() {
            continue;
        }
        println!("{}: {} changes", file.display(), changes.len());
        for change in changes {
            println!("  {} -> {}", change.original, change.fixed);
        }
        total += changes.len();
    }

    let verb = if dry_run { "Would fix" } else { "Fixed" };
    println!("{verb} {total} markers in {} files", results.len());
    Ok(())
}

fn lookup(source: &DirSource, page: i64, line: u32, resolution: Resolution) -> Result<()> {
    let library = Library::from(load_all_texts(source)?);
    let state = ReaderState::new(&library)
        .with_resolution(resolution)
        .navigate_to(&library, page, line, None);
    let view = library
        .process_page(state.current_page)
        .with_context(|| format!("Page {} is missing", state.current_page))?;

    let segments: Vec<SegmentId> = state
        .highlighted
        .map(|h| h.segments)
        .unwrap_or_default();
    if segments.is_empty() {
        println!("Line {line} of page {} has no segment", state.current_page);
        return Ok(());
    }

    for id in segments {
        println!("{}", id.marker());
        let Some(segment) = view.segment(id) else {
            continue;
        };
        for language in Language::ALL {
            if let Some(text) = segment.text(language) {
                println!("  [{language}] {}", text.replace('\n', " "));
            }
        }
    }
    Ok(())
}

fn run_reader(source: &DirSource, config: Option<&Config>, page: Option<i64>) -> Result<()> {
    let loaded = load_all_texts(source)?;
    for warning in loaded.warnings() {
        eprintln!("Warning: {warning}");
    }
    let library = Library::from(loaded);

    let (indices, index_error) = match load_index_set(source) {
        Ok(indices) => (Some(indices), None),
        Err(e) => {
            log::warn!("Term index unavailable: {e}");
            (None, Some(e.to_string()))
        }
    };

    let preferences = Preferences::load_or_default();
    let state = ReaderState::new(&library)
        .with_layout(app::layout_from_codes(&preferences.language_layout))
        .with_resolution(resolution_from(config));
    let start = page.unwrap_or(i64::from(preferences.current_page));
    let state = state.go_to_page(&library, start);

    let mut app = App::new(library, indices, state);
    app.index_error = index_error;
    if let Some(color) = config.and_then(|c| c.highlight.as_deref()) {
        app.highlight = app::parse_color(color);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = app.preferences().save() {
        log::warn!("Failed to save reader preferences: {e}");
    }

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
                && app.handle_key(key.code)
            {
                return Ok(());
            }
        } else {
            app.tick(Instant::now());
        }
    }
}
