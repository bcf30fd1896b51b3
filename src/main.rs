use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use garden_survey::cadastre::NswCadastre;
use garden_survey::capture::StaticMapClient;
use garden_survey::classify::OpenAiClassifier;
use garden_survey::config::{ApiKeys, SurveyConfig};
use garden_survey::domain::{Candidate, Summary, retain_valid};
use garden_survey::pipeline::Survey;
use garden_survey::session::{JsonResultStore, ResultStore, paths, report};

const USAGE: &str = "\
Usage:
  garden-survey --candidates <file.json> [--out <dir>] [--config <file>]
  garden-survey compile [--out <dir>] [--config <file>]

  --candidates  JSON array of {\"address\", \"lat\", \"lng\"} objects
  --out         Output root (default from config: garden_analysis)
  --config      Config file (default: <config dir>/garden-survey/config.json)

compile merges every <out>/*/results.json into <out>/master_analysis/";

enum Command {
    Survey { candidates: PathBuf },
    Compile,
}

struct Args {
    command: Command,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        println!("{USAGE}");
        std::process::exit(0);
    }

    let command = match args.subcommand()?.as_deref() {
        Some("compile") => Command::Compile,
        Some(other) => anyhow::bail!("Unknown command {other:?}\n\n{USAGE}"),
        None => Command::Survey {
            candidates: args
                .value_from_str("--candidates")
                .with_context(|| format!("Missing --candidates\n\n{USAGE}"))?,
        },
    };
    let parsed = Args {
        command,
        out: args.opt_value_from_str("--out")?,
        config: args.opt_value_from_str("--config")?,
    };

    let rest = args.finish();
    if !rest.is_empty() {
        log::warn!("Ignoring unexpected arguments: {rest:?}");
    }
    Ok(parsed)
}

fn load_candidates(path: &Path) -> Result<Vec<Candidate>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read candidates: {}", path.display()))?;
    let candidates: Vec<Candidate> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse candidates: {}", path.display()))?;

    Ok(retain_valid(candidates))
}

fn run_survey(candidates_path: &Path, root: &Path, config: &SurveyConfig) -> Result<()> {
    let keys = ApiKeys::from_env()?;

    let candidates = load_candidates(candidates_path)?;
    if candidates.is_empty() {
        log::warn!("No candidates to analyze");
        return Ok(());
    }

    let survey_name = candidates_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("survey");
    let folder = paths::survey_folder(root, survey_name);

    let provider = NswCadastre::new(&config.endpoints.cadastre_url)?;
    let images = StaticMapClient::new(&config.endpoints.static_map_url, &keys.google_maps)?;
    let classifier = OpenAiClassifier::new(
        &config.endpoints.openai_url,
        &config.endpoints.openai_model,
        &keys.openai,
    )?;
    let mut store = JsonResultStore::open(folder.join(paths::RESULTS_FILE))?;

    log::info!(
        "Surveying {} addresses into {}",
        candidates.len(),
        folder.display()
    );
    let survey = Survey::new(&provider, &images, &classifier, &folder)
        .with_options(config.render)
        .with_request_delay(Duration::from_millis(config.request_delay_ms));
    let analyzed = survey.run(&candidates, &mut store)?;

    let overall = Summary::from_records(store.records());
    println!("Analyzed this run: {}", analyzed.len());
    println!(
        "Results in {}: {} high, {} medium, {} low",
        store.path().display(),
        overall.high,
        overall.medium,
        overall.low
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let config = SurveyConfig::load(args.config.as_deref());
    let root = args.out.unwrap_or_else(|| config.output_dir.clone());

    match args.command {
        Command::Survey { candidates } => run_survey(&candidates, &root, &config),
        Command::Compile => {
            let output = report::compile(&root)?;
            println!("{}", output.report);
            println!("Master results: {}", output.master_path.display());
            println!("Report: {}", output.report_path.display());
            Ok(())
        }
    }
}
