use clap::{Args, Parser, Subcommand, ValueEnum};
use std::{
    error::Error,
    io::{self, BufRead, Write},
    path::PathBuf,
};
use time_humanize::HumanTime;
use wordmatch::{
    catalog::Catalog,
    config::{Config, ConfigStore, FileConfigStore, StoreBackend},
    mark::MarkedItem,
    session::{MatchOutcome, Round, RoundConfig, RoundMode},
    store::{JsonFileStatStore, MemoryStatStore, SqliteStatStore, StatStore},
    summary::SummaryReport,
    tracker::StatTracker,
};

type Tracker = StatTracker<Box<dyn StatStore>>;

/// Board rows are labelled `a` to `z`
const MAX_BOARD_PAIRS: u8 = 26;

/// adaptive word-pair matching trainer
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A word-pair matching trainer that shows the words you miss more often, the words you master less often, and keeps words you mark as difficult in rotation until you prove you know them."
)]
pub struct Cli {
    /// bundled catalog to practice
    #[clap(short = 'c', long)]
    catalog: Option<String>,

    /// load a catalog from a CSV (front,back) or JSON file instead
    #[clap(long, conflicts_with = "catalog")]
    catalog_file: Option<PathBuf>,

    /// where to keep statistics
    #[clap(long, value_enum)]
    store: Option<StoreBackend>,

    /// override the statistics file location
    #[clap(long)]
    db: Option<PathBuf>,

    /// config file to read instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// print the pairs the next round would show
    Round {
        #[clap(flatten)]
        selection: Selection,
        /// pairs per round
        #[clap(short = 'n', long)]
        count: Option<usize>,
    },
    /// play one matching round on the terminal
    Play {
        #[clap(flatten)]
        selection: Selection,
        /// pairs on the board
        #[clap(
            short = 'n',
            long,
            value_parser = clap::value_parser!(u8).range(1..=MAX_BOARD_PAIRS as i64)
        )]
        count: Option<u8>,
    },
    /// record one answer for a word
    Answer { id: String, outcome: Outcome },
    /// record an attempt to match FRONT with BACK
    Match { front: String, back: String },
    /// mark a word as difficult
    Mark { id: String },
    /// remove one difficulty mark from a word
    Unmark {
        id: String,
        /// remove every mark at once
        #[clap(long)]
        all: bool,
    },
    /// show the statistics of one word
    Stat { id: String },
    /// show accuracy and rankings
    Summary {
        /// print the report as JSON
        #[clap(long)]
        json: bool,
    },
    /// list words marked as difficult
    Marked,
    /// list bundled catalogs
    Catalogs,
    /// show the effective settings
    Config {
        /// write them to the config file
        #[clap(long)]
        save: bool,
    },
    /// forget all statistics
    Reset,
}

#[derive(Args, Debug, Clone, Copy)]
struct Selection {
    /// which words to draw
    #[clap(long, value_enum, default_value_t = RoundMode::All)]
    mode: RoundMode,
    /// shorthand for --mode marked-only
    #[clap(long, conflicts_with = "mode")]
    marked: bool,
}

impl Selection {
    fn mode(self) -> RoundMode {
        if self.marked {
            RoundMode::MarkedOnly
        } else {
            self.mode
        }
    }
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Outcome {
    Correct,
    Incorrect,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn load_config(&self) -> Config {
        let mut config = self.config_store().load();
        if let Some(name) = &self.catalog {
            config.catalog = name.clone();
        }
        if let Some(store) = self.store {
            config.store = store;
        }
        config
    }

    fn load_catalog(&self, config: &Config) -> Result<Catalog, Box<dyn Error>> {
        Ok(match &self.catalog_file {
            Some(path) => Catalog::from_path(path)?,
            None => Catalog::bundled(&config.catalog)?,
        })
    }

    fn open_store(&self, config: &Config) -> Result<Box<dyn StatStore>, Box<dyn Error>> {
        log::debug!("Opening {} stat store", config.store);
        Ok(match (config.store, &self.db) {
            (StoreBackend::Memory, _) => Box::new(MemoryStatStore::new()),
            (StoreBackend::Sqlite, Some(path)) => Box::new(SqliteStatStore::open(path)?),
            (StoreBackend::Sqlite, None) => Box::new(SqliteStatStore::new()?),
            (StoreBackend::Json, Some(path)) => Box::new(JsonFileStatStore::with_path(path)),
            (StoreBackend::Json, None) => Box::new(JsonFileStatStore::new()),
        })
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if let Command::Catalogs = cli.command {
        for name in Catalog::bundled_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let config = cli.load_config();
    if let Command::Config { save } = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        if save {
            cli.config_store().save(&config)?;
        }
        return Ok(());
    }

    let catalog = cli.load_catalog(&config)?;
    let store = cli.open_store(&config)?;
    let mut tracker = StatTracker::new(store, catalog, config.bounds());

    let round_config = |count: Option<usize>| RoundConfig {
        round_size: count.unwrap_or(config.round_size),
        marked_mode_min: config.marked_mode_min,
    };

    match cli.command {
        Command::Round { selection, count } => {
            let round = Round::start(&tracker, selection.mode(), round_config(count));
            print_fallback_notice(&round, &config);
            for pair in &round.pairs {
                println!("{}\t{}", pair.front, pair.back);
            }
        }
        Command::Play { selection, count } => {
            let size = count
                .map(usize::from)
                .unwrap_or(config.round_size)
                .min(MAX_BOARD_PAIRS as usize);
            let round = Round::start(&tracker, selection.mode(), round_config(Some(size)));
            print_fallback_notice(&round, &config);
            play(&mut tracker, round)?;
        }
        Command::Answer { id, outcome } => {
            tracker.record_answer(&id, matches!(outcome, Outcome::Correct));
            print_stat(&tracker, &id);
        }
        Command::Match { front, back } => {
            let matched = tracker
                .catalog()
                .pairs
                .iter()
                .any(|p| p.front == front && p.back == back);
            tracker.record_pair_attempt(&front, &back, matched);
            println!("{}", if matched { "correct" } else { "incorrect" });
        }
        Command::Mark { id } => {
            let weight = tracker.mark_difficult(&id);
            println!("marked {id} (weight {weight:.2})");
        }
        Command::Unmark { id, all } => {
            let removed = if all {
                tracker.clear_marks(&id)
            } else {
                tracker.remove_mark(&id) as u32
            };
            if removed == 0 {
                println!("{id} is not marked");
            } else {
                println!("removed {removed} mark(s) from {id} (weight {:.2})", tracker.weight_of(&id));
            }
        }
        Command::Stat { id } => print_stat(&tracker, &id),
        Command::Summary { json } => {
            let report = tracker.get_summary_limited(config.report_limit);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_summary(&report);
            }
        }
        Command::Marked => print_marked(&tracker.get_marked_list()),
        Command::Reset => {
            tracker.reset_all();
            println!("statistics cleared");
        }
        Command::Catalogs | Command::Config { .. } => {}
    }

    Ok(())
}

fn print_fallback_notice(round: &Round, config: &Config) {
    if round.fell_back {
        eprintln!(
            "not enough marked words for a marked-only round (need {}); using the full catalog",
            config.marked_mode_min
        );
    }
}

/// Line-based board: enter `<number><letter>` to match, `q` to stop
fn play(tracker: &mut Tracker, mut round: Round) -> Result<(), Box<dyn Error>> {
    println!("{} round, {} pairs", round.mode, round.pairs.len());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while !round.is_complete() {
        for (i, front) in round.fronts.iter().enumerate() {
            let back = &round.backs[i];
            let mark = |done: bool| if done { "✓" } else { " " };
            println!(
                "{}{:>2}. {:<20} {}{}) {}",
                mark(round.is_matched(front)),
                i + 1,
                front,
                mark(round.is_matched(back)),
                (b'a' + i as u8) as char,
                back
            );
        }
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            break;
        }
        let Some((front, back)) = parse_choice(line, &round) else {
            println!("enter a number and a letter, e.g. 1b");
            continue;
        };

        match round.attempt(tracker, &front, &back) {
            MatchOutcome::Matched => println!("correct!"),
            MatchOutcome::Mismatched => println!("try again"),
            MatchOutcome::AlreadyMatched => println!("already matched"),
            MatchOutcome::Unknown => println!("not on the board"),
        }
    }

    if round.is_complete() {
        println!("round complete!");
    }
    Ok(())
}

fn parse_choice(line: &str, round: &Round) -> Option<(String, String)> {
    let letter = line.chars().last()?.to_ascii_lowercase();
    let number: usize = line[..line.len() - letter.len_utf8()].trim().parse().ok()?;
    let front = round.fronts.get(number.checked_sub(1)?)?;
    let back = round.backs.get((letter as usize).checked_sub('a' as usize)?)?;
    Some((front.clone(), back.clone()))
}

fn print_stat(tracker: &Tracker, id: &str) {
    match tracker.stat(id) {
        Some(stat) => {
            println!("{id}");
            println!("  correct:   {}", stat.correct_count);
            println!("  incorrect: {}", stat.incorrect_count);
            println!("  accuracy:  {}%", stat.accuracy_percent());
            println!("  weight:    {:.2}", stat.weight);
            if let Some(count) = stat.marked_count {
                println!("  marked:    {count}x, {}", humanize(stat.last_marked_at));
            }
        }
        None => println!("{id}: no statistics yet"),
    }
}

fn print_summary(report: &SummaryReport) {
    println!(
        "{} of {} words played, {} attempts, {}% accuracy",
        report.items_played,
        report.total_pairs_in_catalog,
        report.total_attempts,
        report.overall_accuracy
    );

    if !report.most_incorrect.is_empty() {
        println!("\nmost incorrect:");
        for e in &report.most_incorrect {
            println!("  {:<20} {} wrong, {}%", e.word, e.incorrect_count, e.accuracy);
        }
    }
    if !report.least_accurate.is_empty() {
        println!("\nleast accurate:");
        for e in &report.least_accurate {
            println!("  {:<20} {}% over {} attempts", e.word, e.accuracy, e.attempts);
        }
    }
    if !report.needs_practice.is_empty() {
        println!("\nneeds practice:");
        for e in &report.needs_practice {
            println!("  {:<20} {}% (weight {:.2})", e.word, e.accuracy, e.weight);
        }
    }
    if !report.marked_difficult.is_empty() {
        println!("\nmarked difficult:");
        print_marked(&report.marked_difficult);
    }
}

fn print_marked(items: &[MarkedItem]) {
    if items.is_empty() {
        println!("no words marked as difficult");
        return;
    }
    for m in items {
        println!(
            "  {:<20} {:<20} {}x  weight {:.2}  {}% over {}  {}",
            m.front,
            m.back,
            m.marked_count,
            m.weight,
            m.accuracy,
            m.attempts,
            humanize(m.last_marked)
        );
    }
}

fn humanize(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    match at {
        Some(t) => {
            let elapsed = (chrono::Utc::now() - t).num_seconds().max(0);
            HumanTime::from_seconds(-elapsed).to_string()
        }
        None => "never".to_string(),
    }
}
