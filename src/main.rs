//! roster-sort command-line front end
//!
//! Validates, de-duplicates and sorts a delimited file of personal records and
//! writes the result as `name|dob|ssn` lines.

use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use std::thread;

use clap::{Arg, ArgAction, ArgMatches, Command};
use crossbeam_channel::bounded;
use tracing::{info, warn};

use roster_sort::{
    config::{DelimiterMode, GroupKey, RosterConfig, RosterConfigBuilder, SortPolicy},
    error::{RosterError, RosterResult},
    input::{read_input, write_output_atomic, write_stdout},
    logging::{init_logging, Verbosity},
    pipeline::{ChannelProgress, Pipeline, ProgressUpdate, RunContext, ThreadYield},
    render,
    serialize::{preview_line, suggested_output_name},
    EXIT_SUCCESS,
};

/// Progress messages buffered before updates start being dropped
const PROGRESS_BUFFER: usize = 64;

fn main() {
    let result = run();
    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("roster-sort: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn run() -> RosterResult<i32> {
    let matches = build_cli().get_matches();
    let config = parse_config_from_matches(&matches)?;

    let quiet = matches.get_flag("quiet");
    let verbosity = if config.debug {
        Verbosity::Debug
    } else if quiet {
        Verbosity::Quiet
    } else {
        Verbosity::Normal
    };
    init_logging(verbosity);

    let input_file = matches.get_one::<String>("file").map(String::as_str);
    let data = read_input(input_file)?;

    let (sender, receiver) = bounded::<ProgressUpdate>(PROGRESS_BUFFER);
    let renderer = thread::spawn(move || {
        for update in receiver {
            if !quiet {
                eprintln!("[{:>3}%] {}", update.percent, update.message);
            }
        }
    });

    let ctx = RunContext::new(config.clone())?.with_progress(ChannelProgress(sender));
    let outcome = Pipeline::new(&ctx, data.as_bytes()).run(&mut ThreadYield)?;
    drop(ctx);
    if renderer.join().is_err() {
        warn!("progress renderer thread panicked");
    }

    let output = render(&outcome, &config);
    match output_path(&config, input_file) {
        Some(path) => {
            write_output_atomic(&path, &output)?;
            info!(path = %path.display(), "output written");
        }
        None => write_stdout(&output)?,
    }

    if !quiet {
        eprintln!("Done: {}", outcome.statistics);
    }

    if config.preview_rows > 0 {
        eprintln!("Preview (first {} rows)", config.preview_rows);
        for record in outcome.records.iter().take(config.preview_rows) {
            eprintln!("{}", preview_line(record));
        }
    }

    Ok(EXIT_SUCCESS)
}

/// Explicit `-o`, else a name derived from the input file, else stdout
fn output_path(config: &RosterConfig, input_file: Option<&str>) -> Option<PathBuf> {
    if let Some(output) = &config.output_file {
        return Some(PathBuf::from(output));
    }
    match input_file {
        None | Some("-") => None,
        Some(input) => Some(PathBuf::from(suggested_output_name(
            input,
            config.include_separators,
        ))),
    }
}

fn build_cli() -> Command {
    Command::new("roster-sort")
        .version(env!("CARGO_PKG_VERSION"))
        .override_usage("roster-sort [OPTION]... [FILE]")
        .about("Validate, de-duplicate and sort personal-record files")
        .long_about("Validate, de-duplicate and sort personal-record files.\n\nEach input line is tab- or pipe-delimited and carries a name, a date of birth (YYYY-MM-DD) and an SSN (DDD-DD-DDDD). Invalid lines are counted and dropped, duplicates keep their first occurrence, and the survivors are written as name|dob|ssn.")

        // Input
        .arg(Arg::new("file")
            .help("Input file (use '-' or omit for stdin)")
            .value_name("FILE"))
        .arg(Arg::new("delimiter")
            .short('d')
            .long("delimiter")
            .help("Column delimiter")
            .value_name("MODE")
            .value_parser(["auto", "tab", "pipe"])
            .default_value("auto"))

        // Ordering and grouping
        .arg(Arg::new("sort")
            .short('s')
            .long("sort")
            .help("Sort policy")
            .value_name("POLICY")
            .value_parser(["first-last", "last-first", "dob"])
            .default_value("first-last"))
        .arg(Arg::new("unique-only")
            .short('u')
            .long("unique-only")
            .help("Treat records as duplicates only when name, dob and SSN all match")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("group-by")
            .long("group-by")
            .help("Field whose change starts a new separator group")
            .value_name("KEY")
            .value_parser(["full-name", "last-name", "dob"])
            .default_value("full-name"))
        .arg(Arg::new("separators")
            .long("separators")
            .help("Insert a separator line between groups")
            .action(ArgAction::SetTrue))

        // Validation
        .arg(Arg::new("min-year")
            .long("min-year")
            .help("Earliest accepted birth year")
            .value_name("YEAR"))
        .arg(Arg::new("max-year")
            .long("max-year")
            .help("Latest accepted birth year (defaults to the current year)")
            .value_name("YEAR"))

        // Processing
        .arg(Arg::new("chunk-size")
            .long("chunk-size")
            .help("Lines processed between yields")
            .value_name("LINES"))
        .arg(Arg::new("progress-every")
            .long("progress-every")
            .help("Report progress every N chunks")
            .value_name("N"))
        .arg(Arg::new("parallel")
            .long("parallel")
            .help("Number of threads for sorting large inputs")
            .value_name("N"))

        // Output
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .help("Write result to FILE (default: <input>_sorted.txt, or stdout for stdin)")
            .value_name("FILE"))
        .arg(Arg::new("preview")
            .long("preview")
            .help("Print the first N output rows to stderr")
            .value_name("N"))
        .arg(Arg::new("quiet")
            .short('q')
            .long("quiet")
            .help("Only report warnings and errors")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("debug")
            .long("debug")
            .help("Log every chunk and phase to stderr")
            .action(ArgAction::SetTrue))
}

/// Parse an optional numeric option
fn parse_number<T: FromStr>(matches: &ArgMatches, id: &str) -> RosterResult<Option<T>> {
    matches
        .get_one::<String>(id)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| RosterError::invalid_option(id, raw))
        })
        .transpose()
}

/// Parse configuration from command line matches
fn parse_config_from_matches(matches: &ArgMatches) -> RosterResult<RosterConfig> {
    let mut builder = RosterConfigBuilder::new();

    if let Some(mode) = matches.get_one::<String>("delimiter") {
        builder = builder.delimiter(mode.parse::<DelimiterMode>()?);
    }
    if let Some(policy) = matches.get_one::<String>("sort") {
        builder = builder.sort_policy(policy.parse::<SortPolicy>()?);
    }
    if let Some(key) = matches.get_one::<String>("group-by") {
        builder = builder.group_key(key.parse::<GroupKey>()?);
    }

    if matches.get_flag("unique-only") {
        builder = builder.unique_only();
    }
    if matches.get_flag("separators") {
        builder = builder.separators();
    }
    if matches.get_flag("debug") {
        builder = builder.debug();
    }

    if let Some(year) = parse_number::<i32>(matches, "min-year")? {
        builder = builder.min_year(year);
    }
    if let Some(year) = parse_number::<i32>(matches, "max-year")? {
        builder = builder.max_year(year);
    }
    if let Some(size) = parse_number::<usize>(matches, "chunk-size")? {
        builder = builder.chunk_size(size);
    }
    if let Some(chunks) = parse_number::<usize>(matches, "progress-every")? {
        builder = builder.progress_interval(chunks);
    }
    if let Some(threads) = parse_number::<usize>(matches, "parallel")? {
        builder = builder.parallel_threads(threads);
    }
    if let Some(rows) = parse_number::<usize>(matches, "preview")? {
        builder = builder.preview_rows(rows);
    }

    if let Some(output) = matches.get_one::<String>("output") {
        builder = builder.output_file(output.clone());
    }

    builder.build()
}
