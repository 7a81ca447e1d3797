mod settings;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use wtf_converter_core::analytics::{
    ConsistencyAnalyzer, PerformanceBenchmark, ProviderSamples, QualityComparator,
};
use wtf_converter_core::{validate_wtf_document, ConverterRegistry, Document, Validator};

use settings::Settings;

/// Convert speech-recognition provider output to and from the canonical transcript format.
#[derive(Parser)]
#[command(name = "wtf-convert", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a provider response to a canonical document.
    ToWtf {
        /// Provider JSON file.
        input: PathBuf,

        /// Source provider, or `auto` to detect it from the file's shape.
        #[arg(long, short, default_value = "auto")]
        provider: String,

        /// Output file (stdout when omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Report validation errors for the converted document.
        #[arg(long)]
        validate: bool,
    },

    /// Convert a canonical document to a provider's response shape.
    FromWtf {
        /// Canonical document JSON file.
        input: PathBuf,

        /// Target provider.
        #[arg(long, short)]
        provider: String,

        /// Output file (stdout when omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Check a canonical document against the built-in rules.
    Validate {
        input: PathBuf,
    },

    /// List supported providers.
    Providers,

    /// Convert the same audio through several providers and diff the results.
    Consistency {
        #[command(flatten)]
        samples: SampleArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Time repeated conversions per provider.
    Performance {
        #[command(flatten)]
        samples: SampleArgs,

        /// Conversions per provider (settings default when omitted).
        #[arg(long)]
        iterations: Option<usize>,

        /// Benchmark providers on separate threads.
        #[arg(long)]
        parallel: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Rank providers by self-reported confidence.
    Quality {
        #[command(flatten)]
        samples: SampleArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the settings file, optionally writing the defaults to it.
    Config {
        /// Write default settings if no settings file exists.
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
struct SampleArgs {
    /// One provider response run through every provider in --providers.
    #[arg(long, conflicts_with = "inputs")]
    sample: Option<PathBuf>,

    /// Providers to exercise with --sample (comma-separated; settings default when omitted).
    #[arg(long, value_delimiter = ',')]
    providers: Option<Vec<String>>,

    /// A per-provider response as provider=path. Repeat for each provider.
    #[arg(long = "input", value_parser = parse_provider_input)]
    inputs: Vec<(String, PathBuf)>,
}

#[derive(Args)]
struct OutputArgs {
    /// Emit the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Write the report to a file (stdout when omitted).
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let registry = ConverterRegistry::global();
    let settings = Settings::load();

    match cli.command {
        Command::ToWtf {
            input,
            provider,
            output,
            validate,
        } => run_to_wtf(registry, &input, &provider, output.as_deref(), validate),
        Command::FromWtf {
            input,
            provider,
            output,
        } => {
            let doc = Document::from_value(&read_json(&input)?)?;
            let raw = registry.get(&provider)?.convert_from_canonical(&doc)?;
            write_json(&raw, output.as_deref())
        }
        Command::Validate { input } => {
            let doc = Document::from_value(&read_json(&input)?)?;
            let report = Validator::new().validate(&doc);
            for error in report.errors() {
                println!("- {error}");
            }
            report.into_result()?;
            println!("{} is valid", input.display());
            Ok(())
        }
        Command::Providers => {
            for name in registry.names() {
                println!("{name}");
            }
            Ok(())
        }
        Command::Consistency { samples, output } => {
            let samples = load_samples(samples, &settings, registry)?;
            let report = ConsistencyAnalyzer::new(registry).analyze(&samples)?;
            emit_report(&report, &output)
        }
        Command::Performance {
            samples,
            iterations,
            parallel,
            output,
        } => {
            let samples = load_samples(samples, &settings, registry)?;
            let iterations = iterations.unwrap_or(settings.benchmark_iterations);
            let report = PerformanceBenchmark::new(registry, iterations)?
                .parallel(parallel || settings.parallel_benchmark)
                .run(&samples)?;
            emit_report(&report, &output)
        }
        Command::Quality { samples, output } => {
            let samples = load_samples(samples, &settings, registry)?;
            let report = QualityComparator::new(registry).compare(&samples)?;
            emit_report(&report, &output)
        }
        Command::Config { init } => run_config(&settings, init),
    }
}

fn run_to_wtf(
    registry: &ConverterRegistry,
    input: &Path,
    provider: &str,
    output: Option<&Path>,
    validate: bool,
) -> Result<(), Box<dyn Error>> {
    let raw = read_json(input)?;
    let converter = if provider.eq_ignore_ascii_case("auto") {
        let detected = registry
            .detect_provider(&raw)
            .ok_or("could not detect the provider; pass --provider")?;
        log::info!("Detected provider: {detected}");
        registry.get(detected)?
    } else {
        registry.get(provider)?
    };

    let doc = converter.convert_to_canonical(&raw)?;
    if validate {
        let (valid, errors) = validate_wtf_document(&doc);
        if valid {
            log::info!("Document is valid");
        }
        for error in errors {
            log::warn!("validation: {error}");
        }
    }
    write_json(&doc.to_value()?, output)
}

fn run_config(settings: &Settings, init: bool) -> Result<(), Box<dyn Error>> {
    let path = Settings::config_path().ok_or("no configuration directory on this platform")?;
    if init && !path.exists() {
        Settings::default().save_to(&path)?;
        log::info!("Wrote default settings to {}", path.display());
    }
    println!("{}", path.display());
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

fn load_samples(
    args: SampleArgs,
    settings: &Settings,
    registry: &ConverterRegistry,
) -> Result<ProviderSamples, Box<dyn Error>> {
    if let Some(path) = args.sample {
        let providers = args
            .providers
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| default_providers(settings, registry));
        return Ok(ProviderSamples::shared(read_json(&path)?, providers));
    }
    if args.inputs.is_empty() {
        return Err("pass --sample or at least one --input provider=path".into());
    }
    let samples = args
        .inputs
        .into_iter()
        .map(|(provider, path)| read_json(&path).map(|raw| (provider, raw)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ProviderSamples::per_provider(samples))
}

fn default_providers(settings: &Settings, registry: &ConverterRegistry) -> Vec<String> {
    if settings.providers.is_empty() {
        registry.names().into_iter().map(String::from).collect()
    } else {
        settings.providers.clone()
    }
}

fn parse_provider_input(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((provider, path)) if !provider.is_empty() && !path.is_empty() => {
            Ok((provider.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected provider=path, got `{s}`")),
    }
}

fn read_json(path: &Path) -> Result<Value, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&text)
        .map_err(|e| format!("{} is not valid JSON: {e}", path.display()))?;
    Ok(value)
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    write_text(&serde_json::to_string_pretty(value)?, output)
}

fn emit_report<T>(report: &T, args: &OutputArgs) -> Result<(), Box<dyn Error>>
where
    T: Serialize + std::fmt::Display,
{
    if args.json {
        write_json(report, args.output.as_deref())
    } else {
        write_text(&report.to_string(), args.output.as_deref())
    }
}

fn write_text(text: &str, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match output {
        Some(path) => {
            fs::write(path, text).map_err(|e| format!("cannot write {}: {e}", path.display()))?;
            log::info!("Output written to {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
