use clap::{builder::PossibleValuesParser, Arg, ArgAction, ArgMatches, Command};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use claspar::{
    parse_sample, ClasparError, FilterConfig, GenusRankMode, SampleTables, Server, TaxDb,
};

fn cli() -> Command {
    Command::new("claspar")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse and filter Kraken, Sylph and viral aligner classifications for one sample")
        .arg(
            Arg::new("sample_id")
                .short('i')
                .long("sample_id")
                .value_name("ID")
                .help("Sample identifier used in headlines and output file names")
                .required(true),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output_dir")
                .value_name("DIR")
                .help("Directory for result files, created if missing")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Filter thresholds YAML (defaults to the bundled thresholds)"),
        )
        .arg(
            Arg::new("server")
                .short('s')
                .long("server")
                .value_name("SERVER")
                .help("Server the analysis records are tagged with")
                .value_parser(PossibleValuesParser::new(Server::NAMES))
                .required(true),
        )
        .arg(
            Arg::new("samplesheet")
                .short('t')
                .long("samplesheet")
                .value_name("FILE")
                .help("Tab-separated samplesheet holding the sample record JSON, or the JSON record itself")
                .required(true),
        )
        .arg(
            Arg::new("taxdb")
                .short('x')
                .long("taxdb")
                .value_name("FILE")
                .help("taxDB file: <taxid>\\t<parentid>\\t<name>\\t<rank> (plain or .gz)")
                .required(true),
        )
        .arg(
            Arg::new("log-file")
                .short('l')
                .long("log-file")
                .value_name("FILE")
                .help("Log file (default <output_dir>/<sample_id>_<timestamp>_claspar_log.txt)"),
        )
        .arg(
            Arg::new("zero-based-rank")
                .long("zero-based-rank")
                .help("Rank the top species of each genus 0 instead of leaving it unranked")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log debug messages")
                .action(ArgAction::SetTrue),
        )
}

fn spinner(colour: &str, message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = format!("{{spinner:.{}}} {{msg}}", colour);
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template(&template)
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner
}

fn init_logging(path: &Path, verbose: bool) -> std::io::Result<()> {
    let file = File::create(path)?;
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
    Ok(())
}

fn required_path(matches: &ArgMatches, id: &str) -> PathBuf {
    matches
        .get_one::<String>(id)
        .map(PathBuf::from)
        .unwrap_or_default()
}

fn read_tables(path: &Path) -> Result<SampleTables, ClasparError> {
    let name = path.to_string_lossy().to_lowercase();
    if name.ends_with(".json") || name.ends_with(".json.gz") {
        SampleTables::from_json_file(path)
    } else {
        SampleTables::from_samplesheet(path)
    }
}

fn run(matches: &ArgMatches, sample_id: &str, output_dir: &Path) -> Result<(), ClasparError> {
    // 1) Filter thresholds
    let config = match matches.get_one::<String>("config") {
        Some(path) => {
            log::info!("Reading filter thresholds from {}", path);
            FilterConfig::from_file(path)?
        }
        None => {
            log::info!("Using the bundled filter thresholds");
            FilterConfig::bundled()?
        }
    };

    // 2) Sample record and taxonomy
    let stage = spinner("blue", "Reading sample record and taxonomy...");
    let tables = read_tables(&required_path(matches, "samplesheet"))?;
    let taxdb = TaxDb::open(required_path(matches, "taxdb"))?;
    stage.finish_with_message(format!("Loaded {} taxa.", taxdb.len()));

    // 3) Pipelines
    let stage = spinner("green", "Parsing classifications...");
    // Checked against Server::NAMES by clap
    let server = matches
        .get_one::<String>("server")
        .and_then(|s| s.parse::<Server>().ok())
        .unwrap_or(Server::Mscape);
    let rank_mode = if matches.get_flag("zero-based-rank") {
        GenusRankMode::ZeroBased
    } else {
        GenusRankMode::Shifted
    };
    let results = parse_sample(sample_id, &tables, &config, &taxdb, rank_mode, server)?;
    stage.finish_with_message("Classifications parsed.");

    // 4) Outputs
    let stage = spinner("yellow", "Writing output files...");
    let written = results.write_outputs(output_dir)?;
    stage.finish_with_message(format!("Wrote {} files.", written.len()));

    for summary in [
        &results.kraken_summary,
        &results.sylph_summary,
        &results.viral_aligner_summary,
    ] {
        println!("{}", summary.headline);
    }
    Ok(())
}

fn main() {
    let matches = cli().get_matches();

    let sample_id = matches
        .get_one::<String>("sample_id")
        .cloned()
        .unwrap_or_default();
    let output_dir = required_path(&matches, "output_dir");

    if let Err(e) = fs::create_dir_all(&output_dir) {
        eprintln!("Cannot create output directory {}: {}", output_dir.display(), e);
        process::exit(1);
    }

    let log_file = match matches.get_one::<String>("log-file") {
        Some(path) => PathBuf::from(path),
        None => output_dir.join(format!(
            "{}_{}_claspar_log.txt",
            sample_id,
            chrono::Local::now().format("%Y-%m-%d-%H%M")
        )),
    };
    if let Err(e) = init_logging(&log_file, matches.get_flag("verbose")) {
        eprintln!("Cannot open log file {}: {}", log_file.display(), e);
        process::exit(1);
    }
    log::info!("Starting claspar {} for sample {}", env!("CARGO_PKG_VERSION"), sample_id);

    if let Err(e) = run(&matches, &sample_id, &output_dir) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    log::info!("Finished sample {}", sample_id);
}
