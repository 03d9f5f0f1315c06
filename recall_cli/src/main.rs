use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use recall_core::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "recall")]
#[command(about = "Fixed-interval flashcard review", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override card store path
    #[arg(long, global = true)]
    cards: Option<PathBuf>,

    /// Override results store path
    #[arg(long, global = true)]
    results: Option<PathBuf>,

    /// Study as if today were this date (for testing)
    #[arg(long, global = true, hide = true)]
    today: Option<NaiveDate>,

    /// Seed the shuffle (for testing)
    #[arg(long, global = true, hide = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Study the cards due today, saving results at the end (default)
    Study,

    /// Study with randomize/start-over controls, saving after every card
    Drill,

    /// List the cards due today without starting a session
    Due,

    /// Export the study log as CSV
    Export {
        /// Destination CSV file
        #[arg(long, short)]
        output: PathBuf,
    },
}

struct Paths {
    cards: PathBuf,
    results: PathBuf,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the study prompts
    recall_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let mut data = config.data.clone();
    if let Some(dir) = cli.data_dir.clone() {
        data.data_dir = dir;
    }
    let paths = Paths {
        cards: cli.cards.clone().unwrap_or_else(|| data.cards_path()),
        results: cli.results.clone().unwrap_or_else(|| data.results_path()),
    };

    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    tracing::debug!(
        "Using cards {:?}, results {:?}, today {}",
        paths.cards,
        paths.results,
        today
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut input = stdin.lock();
    let mut out = stdout.lock();

    match cli.command.unwrap_or(Commands::Study) {
        Commands::Study => cmd_study(&paths, today, rng, &mut input, &mut out),
        Commands::Drill => cmd_drill(&paths, today, rng, &mut input, &mut out),
        Commands::Due => cmd_due(&paths, today, &mut out),
        Commands::Export { output } => cmd_export(&paths, &output, &mut out),
    }
}

fn cmd_study<I: BufRead, O: Write>(
    paths: &Paths,
    today: NaiveDate,
    mut rng: StdRng,
    input: &mut I,
    out: &mut O,
) -> Result<()> {
    let cards = load_cards(&paths.cards)?;
    let mut store = JsonResultStore::new(&paths.results);
    let log = store.load()?;

    let due = compute_due(&cards, &log, today);
    if due.is_empty() {
        writeln!(out, "No cards are due for study today. Great job!")?;
        return Ok(());
    }
    writeln!(out, "{} card(s) are due for study.", due.len())?;

    let mut session = Session::start(due, today, &mut rng);

    while !session.is_complete() {
        display_card(&session, out)?;
        writeln!(out)?;
        writeln!(out, "Commands: [f]lip, [p]ass, [d]fail, [s]kip, [q]uit session")?;

        let Some(line) = prompt(input, out)? else {
            // End of input ends the session like a quit
            session.apply(Command::Quit);
            writeln!(out, "Quitting session early.")?;
            break;
        };

        match session.apply_token(&line) {
            Ok(event) => report_event(&event, out)?,
            Err(e) if e.is_recoverable() => {
                writeln!(out, "Invalid command. Please try again.")?;
            }
            Err(e) => return Err(e),
        }
    }

    let summary = session.finish(&mut store)?;
    if summary.recorded() > 0 {
        writeln!(out)?;
        writeln!(
            out,
            "Session complete. {} result(s) recorded.",
            summary.recorded()
        )?;
        writeln!(out, "  Passed: {}  Failed: {}", summary.passed, summary.failed)?;
    } else {
        writeln!(out)?;
        writeln!(out, "No results recorded this session.")?;
    }

    Ok(())
}

fn cmd_drill<I: BufRead, O: Write>(
    paths: &Paths,
    today: NaiveDate,
    rng: StdRng,
    input: &mut I,
    out: &mut O,
) -> Result<()> {
    let cards = load_cards(&paths.cards)?;
    let store = JsonResultStore::new(&paths.results);
    let mut desk = Desk::open(cards, store, today, rng)?;

    loop {
        if desk.session().is_complete() {
            writeln!(out)?;
            writeln!(out, "All due cards have been reviewed!")?;
            writeln!(out, "Commands: start [o]ver, [q]uit")?;
        } else {
            display_card(desk.session(), out)?;
            writeln!(out)?;
            writeln!(
                out,
                "Commands: [f]lip, [p]ass, [d]fail, [s]kip, [r]andomize, start [o]ver, [q]uit"
            )?;
        }

        let Some(line) = prompt(input, out)? else {
            break;
        };

        if line.trim().eq_ignore_ascii_case("q") {
            break;
        }
        let action = match line.parse::<Action>() {
            Ok(action) => action,
            Err(e) if e.is_recoverable() => {
                writeln!(out, "Invalid command. Please try again.")?;
                continue;
            }
            Err(e) => return Err(e),
        };

        let event = desk.perform(action)?;
        report_event(&event, out)?;
    }

    let summary = SessionSummary::from_records(desk.session().results());
    writeln!(out)?;
    writeln!(
        out,
        "Drill finished. {} result(s) saved in this round.",
        summary.recorded()
    )?;
    Ok(())
}

fn cmd_due<O: Write>(paths: &Paths, today: NaiveDate, out: &mut O) -> Result<()> {
    let cards = load_cards(&paths.cards)?;
    let log = JsonResultStore::new(&paths.results).load()?;

    let due = compute_due(&cards, &log, today);
    if due.is_empty() {
        writeln!(out, "No cards are due for study today. Great job!")?;
        return Ok(());
    }

    writeln!(out, "{} card(s) due on {}:", due.len(), today)?;
    for card in &due {
        writeln!(out, "  - {}", card.front)?;
    }
    Ok(())
}

fn cmd_export<O: Write>(paths: &Paths, output: &Path, out: &mut O) -> Result<()> {
    let log = JsonResultStore::new(&paths.results).load()?;
    let count = export_csv(&log, output)?;

    writeln!(out, "✓ Exported {} result(s)", count)?;
    writeln!(out, "  CSV: {}", output.display())?;
    Ok(())
}

fn display_card<O: Write>(session: &Session, out: &mut O) -> Result<()> {
    let (Some(card), (position, total)) = (session.current(), session.progress()) else {
        return Ok(());
    };

    writeln!(out)?;
    writeln!(out, "Card {} of {}", position, total)?;
    match session.face() {
        Face::Front => writeln!(out, "Question: {}", card.front)?,
        Face::Back => writeln!(out, "Answer: {}", card.back)?,
    }
    Ok(())
}

fn report_event<O: Write>(event: &Event, out: &mut O) -> Result<()> {
    match event {
        Event::Recorded(record) => {
            writeln!(out, "Recorded {}.", record.outcome.to_string().to_uppercase())?
        }
        Event::Skipped => writeln!(out, "Card skipped. It will come up later.")?,
        Event::Quit => writeln!(out, "Quitting session early.")?,
        Event::Randomized => writeln!(out, "Remaining cards shuffled.")?,
        Event::Restarted { due } => writeln!(out, "Started over with {} due card(s).", due)?,
        Event::Ignored => writeln!(out, "Nothing left to review.")?,
        Event::Flipped(_) => {}
    }
    Ok(())
}

/// Print the prompt and read one line. `None` at end of input.
fn prompt<I: BufRead, O: Write>(input: &mut I, out: &mut O) -> Result<Option<String>> {
    write!(out, "Your choice: ")?;
    out.flush()?;

    // Bytes that are not UTF-8 become replacement characters and then fail
    // to parse as a command, instead of aborting the session
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf)? == 0 {
        writeln!(out)?;
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}
