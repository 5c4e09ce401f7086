//! Seedgraph CLI
//!
//! Synthetic question/answer datasets from seed queries:
//! - `generate`: co-occurrence graph per domain, sampled into new Q/A pairs
//! - `expand`: per-seed question expansion with optional answer sources
//! - `documents`: Q/A pairs grounded in a directory of text files
//! - `graph`: build and render the co-occurrence graph only

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use seedgraph_dataset::{
    document_qa_table, generate_domain_dataset, load_documents, render_text_report,
    results_table, ChunkOptions, DocumentQaGenerator, GoldenDatasetGenerator, OutputFormat,
    QueryExpander, RunConfig, SeedQuery, SeedSet, GOLDEN_QA_FILE, QUERY_RESULTS_FILE,
};
use seedgraph_extract::{CommandExtractor, ElementExtractor, HeuristicExtractor};
use seedgraph_graph::{graph_stats, render, GraphFormat};
use seedgraph_llm::{
    AnswerGenerator, AnswerSelection, AnswerSourceKind, GroundedAnswerer, LlmAnswerer,
    LlmBackend, LlmClient, LlmSettings, TextGenerator,
};
use std::fs;
use std::path::{Path, PathBuf};

mod logging;

#[derive(Parser)]
#[command(name = "seedgraph")]
#[command(
    author,
    version,
    about = "Seedgraph: synthetic QA datasets from a weighted co-occurrence graph"
)]
struct Cli {
    #[command(flatten)]
    log: logging::LogArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one co-occurrence graph per domain and sample new question/answer pairs.
    ///
    /// Writes `<domain>_dataset.csv` and `<domain>_graph.dot` per domain.
    Generate {
        #[command(flatten)]
        seeds: SeedArgs,
        #[command(flatten)]
        run: RunArgs,
        /// Questions to generate per domain.
        #[arg(short, long)]
        num_questions: Option<usize>,
        /// Minimum edge weight for a pair to count as related.
        #[arg(long)]
        min_weight: Option<f64>,
        #[command(flatten)]
        extractor: ExtractorArgs,
        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Expand each seed into related questions and answer them.
    Expand {
        #[command(flatten)]
        seeds: SeedArgs,
        #[command(flatten)]
        run: RunArgs,
        /// Questions per seed.
        #[arg(short, long)]
        num_questions: Option<usize>,
        /// Answer source: llm|datastore|google|all|none.
        #[arg(long)]
        answers: Option<String>,
        /// Output: text|csv|both.
        #[arg(long, default_value = "both")]
        format: String,
        #[command(flatten)]
        extractor: ExtractorArgs,
        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Generate question/answer pairs from a directory of text documents.
    Documents {
        /// Directory to scan recursively.
        #[arg(short, long)]
        input: PathBuf,
        #[command(flatten)]
        run: RunArgs,
        /// Target number of pairs across all chunks.
        #[arg(long)]
        total_questions: Option<usize>,
        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Build the co-occurrence graph from seeds and render it (no generation).
    Graph {
        #[command(flatten)]
        seeds: SeedArgs,
        /// Output format: dot|json.
        #[arg(long, default_value = "dot")]
        format: String,
        /// Output file (stdout when omitted).
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        extractor: ExtractorArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct SeedArgs {
    /// Seed file: JSON list, JSON object of domains, or one query per line.
    #[arg(short, long)]
    seeds: Option<PathBuf>,
    /// Inline seed query (repeatable). Ids are assigned `q1..qN`.
    #[arg(short, long = "query", value_name = "TEXT")]
    queries: Vec<String>,
    /// Domain for seeds without domain grouping.
    #[arg(long)]
    domain: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// JSON run configuration; flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output directory.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Sampler seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
struct ExtractorArgs {
    /// Element extractor: heuristic|command.
    #[arg(long, default_value = "heuristic")]
    extractor: String,
    /// Program speaking `seedgraph_extract_v1` (implies `--extractor command`).
    #[arg(long, value_name = "PROGRAM")]
    extractor_command: Option<PathBuf>,
    /// Argument for the extractor program (repeatable).
    #[arg(long = "extractor-arg", value_name = "ARG", allow_hyphen_values = true)]
    extractor_args: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct LlmArgs {
    /// Backend: mock|ollama|openai|anthropic|gemini|disabled.
    #[arg(long, env = "SEEDGRAPH_LLM", default_value = "mock")]
    llm: String,
    /// Model name (falls back to the backend's env var).
    #[arg(long)]
    model: Option<String>,
    /// Program speaking `seedgraph_llm_v1` (overrides `--llm`).
    #[arg(long, value_name = "PROGRAM")]
    llm_command: Option<PathBuf>,
    /// Argument for the LLM program (repeatable).
    #[arg(long = "llm-arg", value_name = "ARG", allow_hyphen_values = true)]
    llm_args: Vec<String>,
    /// Request timeout in seconds; `0` disables.
    #[arg(long)]
    llm_timeout_secs: Option<u64>,
    /// Gemini model for grounded (datastore/google) answers.
    #[arg(long)]
    answer_model: Option<String>,
}

// ============================================================================
// Wiring
// ============================================================================

const SAMPLE_SEEDS: &[&str] = &[
    "What are some popular attractions to visit in Seattle?",
    "What restaurants serve vegan food in Austin?",
    "What would be a good teambuilding outdoor activity in Manhattan?",
    "Where is the nearest local coffee shop to my hotel?",
];

fn resolve_config(run: &RunArgs) -> Result<RunConfig> {
    let mut config = match &run.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(dir) = &run.output_dir {
        config.output_dir = dir.clone();
    }
    if run.seed.is_some() {
        config.seed = run.seed;
    }
    Ok(config)
}

fn resolve_seeds(args: &SeedArgs, config: &RunConfig) -> Result<SeedSet> {
    let domain = args.domain.as_deref().unwrap_or(&config.domain);
    if let Some(path) = &args.seeds {
        return Ok(SeedSet::load(path, domain)?);
    }
    let queries: Vec<&str> = if args.queries.is_empty() {
        eprintln!(
            "{} no --seeds/--query given, using built-in sample seeds",
            "info:".yellow().bold()
        );
        SAMPLE_SEEDS.to_vec()
    } else {
        args.queries.iter().map(String::as_str).collect()
    };
    let seeds = queries
        .iter()
        .enumerate()
        .map(|(i, q)| SeedQuery::new(format!("q{}", i + 1), *q))
        .collect();
    Ok(SeedSet::single(domain, seeds))
}

fn build_extractor(args: &ExtractorArgs, settings: &LlmSettings) -> Result<Box<dyn ElementExtractor>> {
    if let Some(program) = &args.extractor_command {
        return Ok(Box::new(
            CommandExtractor::new(program, args.extractor_args.clone()).with_timeout(settings.timeout),
        ));
    }
    match args.extractor.trim().to_ascii_lowercase().as_str() {
        "heuristic" => Ok(Box::new(HeuristicExtractor::new()?)),
        "command" => Err(anyhow!("--extractor command needs --extractor-command <PROGRAM>")),
        other => Err(anyhow!("unknown extractor `{other}` (expected heuristic|command)")),
    }
}

fn build_llm(args: &LlmArgs) -> Result<LlmClient> {
    let settings = LlmSettings::from_env()?.with_timeout_secs(args.llm_timeout_secs);
    let backend = match &args.llm_command {
        Some(program) => LlmBackend::Command {
            program: program.clone(),
            args: args.llm_args.clone(),
        },
        None => LlmBackend::from_name(&args.llm, &settings)?,
    };
    Ok(LlmClient::new(backend, args.model.clone(), settings))
}

/// Register exactly the sources `selection` asks for.
fn build_answers<'a>(
    selection: AnswerSelection,
    generator: &'a dyn TextGenerator,
    settings: &LlmSettings,
    answer_model: Option<&str>,
) -> AnswerGenerator<'a> {
    let mut answers = AnswerGenerator::new();
    for kind in selection.sources() {
        let model = answer_model.map(str::to_string);
        answers = match kind {
            AnswerSourceKind::Llm => answers.with_source(LlmAnswerer::new(generator)),
            AnswerSourceKind::Datastore => {
                answers.with_source(GroundedAnswerer::datastore(settings.clone(), model))
            }
            AnswerSourceKind::Google => {
                answers.with_source(GroundedAnswerer::google(settings.clone(), model))
            }
        };
    }
    answers
}

fn print_written(path: &Path) {
    println!("  {} {}", "→".cyan(), path.display());
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_generate(
    seeds: &SeedArgs,
    run: &RunArgs,
    num_questions: Option<usize>,
    min_weight: Option<f64>,
    extractor: &ExtractorArgs,
    llm: &LlmArgs,
) -> Result<()> {
    let mut config = resolve_config(run)?;
    if let Some(n) = num_questions {
        config.num_questions = n;
    }
    if let Some(w) = min_weight {
        config.plan.min_weight = w;
    }
    config.validate().map_err(|e| anyhow!(e))?;
    let seeds = resolve_seeds(seeds, &config)?;
    let client = build_llm(llm)?;
    let extractor = build_extractor(extractor, &client.settings)?;
    eprintln!("{}", client.status_line().dimmed());

    for (domain, domain_seeds) in &seeds.domains {
        println!(
            "{} {} domain ({} seeds)",
            "Processing".green().bold(),
            domain.bold(),
            domain_seeds.len()
        );
        let report = generate_domain_dataset(
            extractor.as_ref(),
            &client,
            domain,
            domain_seeds,
            &config,
            &config.output_dir,
        )
        .with_context(|| format!("domain `{domain}` failed"))?;
        println!(
            "  graph: {} nodes, {} edges; {} pairs generated",
            report.stats.nodes,
            report.stats.edges,
            report.dataset.len()
        );
        print_written(&report.dataset_path);
        print_written(&report.graph_path);
    }
    Ok(())
}

fn cmd_expand(
    seeds: &SeedArgs,
    run: &RunArgs,
    num_questions: Option<usize>,
    answers: Option<&str>,
    format: &str,
    extractor: &ExtractorArgs,
    llm: &LlmArgs,
) -> Result<()> {
    let mut config = resolve_config(run)?;
    if let Some(n) = num_questions {
        config.questions_per_seed = n;
    }
    if let Some(source) = answers {
        config.answer_source = source.to_string();
    }
    let format = OutputFormat::parse(format)
        .ok_or_else(|| anyhow!("unknown format `{format}` (expected text|csv|both)"))?;
    let seeds = resolve_seeds(seeds, &config)?.all();
    let client = build_llm(llm)?;
    let extractor = build_extractor(extractor, &client.settings)?;
    eprintln!("{}", client.status_line().dimmed());

    let selection = config.answer_selection();
    let answer_sources = build_answers(
        selection,
        &client,
        &client.settings,
        llm.answer_model.as_deref(),
    );
    let expander = QueryExpander::new(extractor.as_ref(), &client, answer_sources);
    let results = expander.process_queries(&seeds, config.questions_per_seed, selection)?;

    if format.wants_text() {
        print!("{}", render_text_report(&results));
    }
    if format.wants_csv() {
        let table = results_table(&results);
        let path = config.output_dir.join(QUERY_RESULTS_FILE);
        table.write_csv(&path)?;
        println!("\n{} {} rows", "Saved".green().bold(), table.len());
        print_written(&path);
        let sources = selection.sources();
        if !sources.is_empty() {
            println!("\nAnswer sources in dataset:");
            for kind in &sources {
                println!("- {kind}");
            }
        }
    }
    Ok(())
}

fn cmd_documents(
    input: &Path,
    run: &RunArgs,
    total_questions: Option<usize>,
    llm: &LlmArgs,
) -> Result<()> {
    let mut config = resolve_config(run)?;
    if let Some(n) = total_questions {
        config.total_document_questions = n;
    }
    config.validate().map_err(|e| anyhow!(e))?;
    let client = build_llm(llm)?;
    eprintln!("{}", client.status_line().dimmed());

    println!("{} documents from {}", "Loading".green().bold(), input.display());
    let documents = load_documents(input)?;
    println!("  {} documents", documents.len());

    let generator = DocumentQaGenerator::new(&client, ChunkOptions::from(&config));
    let pairs = generator.generate_dataset(&documents, config.total_document_questions);
    let path = config.output_dir.join(GOLDEN_QA_FILE);
    document_qa_table(&pairs).write_csv(&path)?;
    println!("{} {} question-answer pairs", "Created".green().bold(), pairs.len());
    print_written(&path);
    Ok(())
}

fn cmd_graph(
    seeds: &SeedArgs,
    format: &str,
    out: Option<&Path>,
    extractor: &ExtractorArgs,
) -> Result<()> {
    let format = GraphFormat::parse(format)?;
    let config = RunConfig::default();
    let seeds = resolve_seeds(seeds, &config)?;
    let settings = LlmSettings::from_env()?;
    let extractor = build_extractor(extractor, &settings)?;
    // Graph building never reaches the model.
    let client = LlmClient::default();

    let mut rendered = Vec::new();
    for (domain, domain_seeds) in &seeds.domains {
        let mut golden = GoldenDatasetGenerator::new(extractor.as_ref(), &client, &config);
        for seed in domain_seeds {
            golden.add_seed_query(&seed.query, &seed.id)?;
        }
        let graph = golden.build_graph()?;
        let stats = graph_stats(graph);
        eprintln!(
            "{} {}: {} nodes, {} edges",
            "graph".green().bold(),
            domain,
            stats.nodes,
            stats.edges
        );
        rendered.push((domain.clone(), render(graph, format, Some(domain))?));
    }

    match out {
        Some(path) if rendered.len() == 1 => {
            fs::write(path, &rendered[0].1)
                .with_context(|| format!("failed to write {}", path.display()))?;
            print_written(path);
        }
        Some(path) => {
            fs::create_dir_all(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            for (domain, text) in &rendered {
                let file = path.join(format!(
                    "{}_graph.{}",
                    seedgraph_dataset::domain_file_stem(domain),
                    format.extension()
                ));
                fs::write(&file, text)
                    .with_context(|| format!("failed to write {}", file.display()))?;
                print_written(&file);
            }
        }
        None => {
            for (_, text) in &rendered {
                println!("{text}");
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = logging::init(&cli.log)? {
        eprintln!("{} {}", "logging to".dimmed(), path.display());
    }

    match &cli.command {
        Commands::Generate {
            seeds,
            run,
            num_questions,
            min_weight,
            extractor,
            llm,
        } => cmd_generate(seeds, run, *num_questions, *min_weight, extractor, llm),
        Commands::Expand {
            seeds,
            run,
            num_questions,
            answers,
            format,
            extractor,
            llm,
        } => cmd_expand(
            seeds,
            run,
            *num_questions,
            answers.as_deref(),
            format,
            extractor,
            llm,
        ),
        Commands::Documents {
            input,
            run,
            total_questions,
            llm,
        } => cmd_documents(input, run, *total_questions, llm),
        Commands::Graph {
            seeds,
            format,
            out,
            extractor,
        } => cmd_graph(seeds, format, out.as_deref(), extractor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "seedgraph",
            "expand",
            "-q",
            "Where is the Space Needle?",
            "--answers",
            "all",
            "--format",
            "csv",
            "--llm",
            "mock",
        ])
        .unwrap();
        match cli.command {
            Commands::Expand {
                seeds, answers, ..
            } => {
                assert_eq!(seeds.queries, vec!["Where is the Space Needle?"]);
                assert_eq!(answers.as_deref(), Some("all"));
            }
            _ => panic!("expected expand"),
        }

        let cli = Cli::try_parse_from(["seedgraph", "graph", "--format", "json", "-v"]).unwrap();
        assert!(cli.log.verbose);
    }

    #[test]
    fn inline_seeds_get_sequential_ids() {
        let args = SeedArgs {
            seeds: None,
            queries: vec!["a".to_string(), "b".to_string()],
            domain: Some("demo".to_string()),
        };
        let set = resolve_seeds(&args, &RunConfig::default()).unwrap();
        assert_eq!(set.domains["demo"][1], SeedQuery::new("q2", "b"));
    }

    #[test]
    fn answers_register_only_selected_sources() {
        let client = LlmClient::mock();
        let settings = LlmSettings::default();
        let answers = build_answers(
            AnswerSelection::parse("google"),
            &client,
            &settings,
            None,
        );
        assert!(answers.has_source(AnswerSourceKind::Google));
        assert!(!answers.has_source(AnswerSourceKind::Llm));
    }

    #[test]
    fn unknown_extractor_is_rejected() {
        let args = ExtractorArgs {
            extractor: "spacy".to_string(),
            extractor_command: None,
            extractor_args: vec![],
        };
        assert!(build_extractor(&args, &LlmSettings::default()).is_err());
    }
}
