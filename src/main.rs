// Entrypoint for the command line.
// - Loads `.env`, sets up logging, resolves the Fairspace connection and
//   dispatches to one command.
// - Any error ends the process with exit status 1.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use fairspace_testdata::model::MetadataFormat;
use fairspace_testdata::queries::{catalogue, run_queries};
use fairspace_testdata::rdf::webdav_iri;
use fairspace_testdata::seed::TestData;
use fairspace_testdata::views::retrieve_view;
use fairspace_testdata::{logger, ui, ApiConfig, ApiOverrides, FairspaceApi, TestDataConfig};

#[derive(Parser, Debug)]
#[command(name = "fairspace-testdata", version, about = "Fairspace test data and query tools")]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Fairspace base URL (overrides FAIRSPACE_URL).
    #[arg(long, global = true)]
    url: Option<String>,

    /// Keycloak username (overrides KEYCLOAK_USERNAME).
    #[arg(long, global = true)]
    username: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed the instance with taxonomies, subjects, events, samples and files.
    UploadTestData {
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
        /// Seed for reproducible data.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run the SPARQL query catalogue and print timings.
    SparqlQuery {
        /// Collection used by the path-prefix queries.
        #[arg(long, default_value = "collection 2020-11-16-2")]
        collection: String,
        /// Only run queries whose name contains this text.
        #[arg(long)]
        only: Option<String>,
    },
    /// Print the view configuration, or the first page and count of a view.
    RetrieveView { view: Option<String> },
    /// Upload a metadata file.
    UploadMetadata {
        /// `turtle` or `ld+json`.
        #[arg(long, default_value = "turtle")]
        format: String,
        file: PathBuf,
    },
    /// Rebuild the view index.
    Reindex,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logger::init(&cli.log_level)?;

    let overrides = ApiOverrides {
        url: cli.url.clone(),
        username: cli.username.clone(),
        ..Default::default()
    };
    let config = ApiConfig::resolve(overrides).context("Failed to resolve Fairspace settings")?;
    let mut api = FairspaceApi::new(config).context("Failed to build HTTP client")?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Command::UploadTestData { yes, seed } => {
            let settings = TestDataConfig::from_env().context("Invalid test data settings")?;
            if !yes && io::stdin().is_terminal() {
                let prompt = format!(
                    "Upload {} subjects, {} events, {} samples and {} x {} x {} files to {}?",
                    ui::thousands(settings.subject_count),
                    ui::thousands(settings.event_count),
                    ui::thousands(settings.sample_count),
                    settings.collection_count,
                    settings.dirs_per_collection,
                    settings.files_per_dir,
                    api.url()
                );
                if !ui::confirm(&prompt)? {
                    info!("Aborted.");
                    return Ok(());
                }
            }
            let mut test_data = TestData::new(api, settings);
            let progress = ui::progress_bar(test_data.directory_count(), io::stderr().is_terminal());
            test_data = test_data.with_progress(progress);
            if let Some(seed) = seed {
                test_data = test_data.with_seed(seed);
            }
            test_data.run().context("Uploading test data failed")?;
        }
        Command::SparqlQuery { collection, only } => {
            let collection_iri = webdav_iri(&api.config().webdav_root(), &collection)?;
            let queries: Vec<_> = catalogue(collection_iri.as_str())
                .into_iter()
                .filter(|q| only.as_deref().map_or(true, |text| q.name.contains(text)))
                .collect();
            run_queries(&mut api, &queries, &mut stdout)?;
        }
        Command::RetrieveView { view } => {
            retrieve_view(&mut api, view.as_deref(), &mut stdout)?;
        }
        Command::UploadMetadata { format, file } => {
            let format: MetadataFormat = format.parse()?;
            info!("Uploading {} as {format} ...", file.display());
            api.upload_metadata_file(format, &file)
                .with_context(|| format!("Failed to upload {}", file.display()))?;
        }
        Command::Reindex => {
            info!("Reindexing ...");
            api.reindex()?;
            info!("Reindex requested.");
        }
    }
    Ok(())
}
