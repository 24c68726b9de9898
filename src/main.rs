use blog_index::collection::{self, BuiltCollection};
use blog_index::config::{self, PipelineConfig};
use blog_index::lookup::{FilePayloadLoader, LookupError, LookupService};
use blog_index::output;
use blog_index::scan::DirectorySource;
use blog_index::split::split_for_delivery;
use blog_index::store::{self, OutputLayout};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blog-index")]
#[command(about = "Build a slim post index and per-post payloads from frontmatter content")]
#[command(long_about = "\
Build a slim post index and per-post payloads from frontmatter content

Every Markdown/MDX file under the content directory is a post. Its YAML
frontmatter must carry title, publishedAt, author and summary; files that
don't are reported and left out.

Content structure:

  content/
  ├── config.toml                  # Pipeline config (optional)
  ├── hello-world.md               # Post
  ├── 2024/
  │   └── year-in-review.mdx       # Nested post
  └── bundles/launch/index.md      # Directory post

Output structure:

  dist/content/
  ├── index.json                   # Metadata for every post, newest first
  ├── diagnostics.json             # Rejected posts, slug collisions, drafts
  └── posts/<slug>.json            # { \"body\": ... } per post

Run 'blog-index gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist/content", global = true)]
    output: PathBuf,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate content and report problems without writing anything
    Check,
    /// Run the full pipeline: scan → collect → split → write
    Build,
    /// List every entry in a built index
    List,
    /// Show one entry from a built index
    Get {
        /// Slug of the entry
        slug: String,
        /// Also load and print the body
        #[arg(long)]
        body: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command {
        Command::Check => {
            let config = config::load_config(&cli.source)?;
            println!("==> Checking {}", cli.source.display());
            let built = collect(&cli.source, &config)?;
            output::print_check_output(&built.collection, &built.report);
            if built.report.is_clean() {
                println!("==> Content is valid");
            } else {
                println!("==> Content has problems (see above)");
            }
        }
        Command::Build => {
            let config = config::load_config(&cli.source)?;
            let layout = OutputLayout::new(&cli.output, &config.output);

            println!("==> Stage 1: Scanning {}", cli.source.display());
            let built = collect(&cli.source, &config)?;
            output::print_check_output(&built.collection, &built.report);

            println!("==> Stage 2: Writing {}", cli.output.display());
            let (index, payloads) = split_for_delivery(built.collection);
            let stats = store::write_all(&index, &payloads, &built.report, &layout)?;
            output::print_build_output(&index, &stats, &layout);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::List => {
            let layout = output_layout(&cli.source, &cli.output)?;
            let index = store::read_index(&layout)?;
            output::print_index_listing(&index);
        }
        Command::Get { slug, body, json } => {
            let layout = output_layout(&cli.source, &cli.output)?;
            let index = store::read_index(&layout)?;
            let service = LookupService::new(index, FilePayloadLoader::new(layout.payload_dir()));
            return get(&service, &slug, body, json);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Scan and build with the thread pool sized from config.
fn collect(
    source: &Path,
    config: &PipelineConfig,
) -> Result<BuiltCollection, Box<dyn std::error::Error>> {
    init_thread_pool(&config.processing);
    let source = DirectorySource::from_config(source, &config.content);
    Ok(collection::build_from_source(&source, &config.collection)?)
}

/// Output names come from the content root's config, so `list` and `get`
/// read the same files `build` wrote.
fn output_layout(source: &Path, output: &Path) -> Result<OutputLayout, config::ConfigError> {
    let config = config::load_config(source)?;
    Ok(OutputLayout::new(output, &config.output))
}

/// Resolve one slug. Misses get their own exit codes: 2 for an unknown slug,
/// 3 for an indexed slug whose payload is gone.
fn get(
    service: &LookupService<FilePayloadLoader>,
    slug: &str,
    with_body: bool,
    json: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let result = if with_body {
        service.get_full(slug).map(|entry| {
            if json {
                serde_json::to_string_pretty(&entry).map(|j| vec![j])
            } else {
                Ok(output::format_entry(&entry.meta, Some(&entry.body)))
            }
        })
    } else {
        service.get_meta(slug).map(|meta| {
            if json {
                serde_json::to_string_pretty(meta).map(|j| vec![j])
            } else {
                Ok(output::format_entry(meta, None))
            }
        })
    };

    match result {
        Ok(lines) => {
            for line in lines? {
                println!("{}", line);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ LookupError::NotFound(_)) => {
            eprintln!("{err}");
            Ok(ExitCode::from(2))
        }
        Err(err @ LookupError::PayloadMissing(_)) => {
            eprintln!("{err}");
            Ok(ExitCode::from(3))
        }
        Err(err) => Err(err.into()),
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. Config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
