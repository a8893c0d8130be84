use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use storm_etl::config::ConfigLoader;
use storm_etl::converters::Source;
use storm_etl::dir::DataDir;
use storm_etl::error::EtlError;
use storm_etl::genes::GeneCatalog;
use storm_etl::item::NdjsonSink;
use storm_etl::resolver::{FileSymbolSource, GeneResolver, SymbolSource};
use storm_etl::run::Run;

#[derive(Parser)]
#[command(name = "storm-etl")]
#[command(about = "Batch loader for biological flat files into typed record graphs")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Convert one data source directory into a record file")]
    Run(RunArgs),
    #[command(about = "List the supported data sources")]
    Sources,
}

#[derive(Args)]
struct RunArgs {
    #[arg(long, value_enum)]
    source: Source,

    #[arg(long)]
    data_dir: Utf8PathBuf,

    /// Output file; defaults to `<source>.ndjson` in the working directory.
    #[arg(long)]
    out: Option<Utf8PathBuf>,

    #[arg(long)]
    config: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(etl) = report.downcast_ref::<EtlError>() {
            return ExitCode::from(map_exit_code(etl));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &EtlError) -> u8 {
    match error {
        EtlError::ConfigRead(_)
        | EtlError::ConfigParse(_)
        | EtlError::MissingFile { .. }
        | EtlError::MissingColumn { .. }
        | EtlError::Table { .. }
        | EtlError::Json { .. } => 2,
        EtlError::Store(_)
        | EtlError::Filesystem(_)
        | EtlError::SymbolDictionary(_)
        | EtlError::GeneList(_) => 3,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_convert(args),
        Commands::Sources => {
            for source in Source::ALL {
                println!("{}\t{}", source.name(), source.dataset_title());
            }
            Ok(())
        }
    }
}

fn run_convert(args: RunArgs) -> miette::Result<()> {
    let resolved = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
    let out = args
        .out
        .unwrap_or_else(|| Utf8PathBuf::from(format!("{}.ndjson", args.source.name())));

    let dictionary: Option<Box<dyn SymbolSource>> = match &resolved.symbol_dictionary {
        Some(path) => Some(Box::new(
            FileSymbolSource::load(path).into_diagnostic()?,
        )),
        None => None,
    };
    let resolver = GeneResolver::new(&resolved.taxon, dictionary, resolved.resolution);
    let mut genes = GeneCatalog::new(resolver);
    if let Some(path) = &resolved.gene_list {
        genes.load_allow_list(path).into_diagnostic()?;
    }

    let sink = NdjsonSink::create(
        out.as_std_path(),
        args.source.name(),
        args.source.dataset_title(),
        &resolved.taxon,
    )
    .into_diagnostic()?;

    let dir = DataDir::scan(args.data_dir.as_std_path()).into_diagnostic()?;
    let mut run = Run::new(sink, genes, &resolved.taxon);

    info!(
        source = args.source.name(),
        data_dir = %args.data_dir,
        "starting conversion"
    );
    args.source.convert(&mut run, &dir).into_diagnostic()?;

    let stored = run.into_sink().finish().into_diagnostic()?;
    info!(records = stored, out = %out, "conversion finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use camino::Utf8Path;

    use super::*;

    #[test]
    fn out_flag_is_optional() {
        let cli = Cli::try_parse_from([
            "storm-etl",
            "run",
            "--source",
            "dgidb",
            "--data-dir",
            "/data/dgidb",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.source, Source::Dgidb);
        assert!(args.out.is_none());
    }

    #[test]
    fn out_flag_overrides_the_default() {
        let cli = Cli::try_parse_from([
            "storm-etl",
            "run",
            "--source",
            "dgidb",
            "--data-dir",
            "/data/dgidb",
            "--out",
            "records.ndjson",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.out.as_deref(), Some(Utf8Path::new("records.ndjson")));
    }
}
