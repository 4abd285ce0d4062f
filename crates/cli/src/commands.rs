use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use prerna_app::app::prepare_database;
use prerna_app::maintenance::{
    seed_catalog, HttpImageSource, ImageFetcher, ImageRewriter, LocalFileIndex, UrlMapping,
};
use prerna_app::utils::media::MediaStore;
use prerna_kernel::Settings;

/// How many unresolved URLs are echoed after a rewrite or fetch.
const UNRESOLVED_PREVIEW: usize = 50;

#[derive(Debug, Parser)]
#[command(name = "prerna", about = "Prerna storefront operations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Insert a sample catalog into an empty database
    Seed,
    /// Print a random admin token for `PRERNA_AUTH__ADMIN_TOKEN`
    Token(TokenArgs),
    /// Point hosted image URLs at files under the public root
    RewriteImages(RewriteArgs),
    /// Download hosted product and category images into the public root
    FetchImages(FetchArgs),
}

#[derive(Debug, Args)]
struct TokenArgs {
    /// Random bytes in the token (printed as hex)
    #[arg(long, default_value_t = 32, value_parser = clap::value_parser!(u8).range(16..))]
    bytes: u8,
}

#[derive(Debug, Args)]
struct RewriteArgs {
    /// JSON file mapping old URLs to local paths
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// Write changes instead of reporting them
    #[arg(long)]
    apply: bool,

    /// Only use explicit mappings, never match by file name
    #[arg(long)]
    strict: bool,

    /// Public root to scan; defaults to `media.public_root`
    #[arg(long)]
    public_root: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct FetchArgs {
    /// Download files and update rows instead of reporting them
    #[arg(long)]
    apply: bool,

    /// Public root to write into; defaults to `media.public_root`
    #[arg(long)]
    public_root: Option<PathBuf>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Token(args) => {
                println!("{}", generate_token(args.bytes));
                Ok(())
            }
            Commands::Migrate => {
                let settings = load_settings()?;
                let (_, applied) = prepare_database(settings).await?;
                println!("applied {applied} migration(s)");
                Ok(())
            }
            Commands::Seed => {
                let settings = load_settings()?;
                let (state, _) = prepare_database(settings).await?;
                let report = seed_catalog(&state.pool)
                    .await
                    .context("failed to seed catalog")?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(())
            }
            Commands::RewriteImages(args) => rewrite_images(args).await,
            Commands::FetchImages(args) => fetch_images(args).await,
        }
    }
}

fn load_settings() -> anyhow::Result<Settings> {
    let settings = Settings::load().context("failed to load settings")?;
    prerna_telemetry::init(&settings.telemetry)?;
    Ok(settings)
}

fn generate_token(bytes: u8) -> String {
    let mut buf = vec![0u8; usize::from(bytes)];
    rand::fill(buf.as_mut_slice());
    hex::encode(buf)
}

async fn rewrite_images(args: RewriteArgs) -> anyhow::Result<()> {
    let settings = load_settings()?;
    let public_root = args
        .public_root
        .unwrap_or_else(|| settings.media.public_root.clone());

    let mapping = match &args.mapping {
        Some(path) => UrlMapping::from_file(path)?,
        None => UrlMapping::default(),
    };
    let index = LocalFileIndex::scan(&public_root)?;
    tracing::info!(
        mappings = mapping.len(),
        local_files = index.len(),
        public_root = %public_root.display(),
        strict = args.strict,
        "starting image url rewrite"
    );

    let (state, _) = prepare_database(settings).await?;
    let rewriter = ImageRewriter::new(mapping, index, args.strict);
    let report = rewriter.run(&state.pool, args.apply).await?;

    println!("mode: {}", if report.applied { "apply" } else { "dry-run" });
    println!("hosted urls seen: {}", report.hosted_urls_seen);
    println!("urls replaced: {}", report.urls_replaced);
    println!(
        "updated: products={} categories={} reviews={} site_content={}",
        report.products_updated,
        report.categories_updated,
        report.reviews_updated,
        report.site_content_updated
    );

    if !report.unresolved.is_empty() {
        println!("unresolved: {}", report.unresolved.len());
        for entry in report.unresolved.iter().take(UNRESOLVED_PREVIEW) {
            println!(
                "  {}:{} {} [{}] {}",
                entry.table, entry.id, entry.field, entry.reason, entry.url
            );
        }
    }
    if !report.applied {
        println!("dry run only; pass --apply to write changes");
    }

    Ok(())
}

async fn fetch_images(args: FetchArgs) -> anyhow::Result<()> {
    let settings = load_settings()?;
    let public_root = args
        .public_root
        .unwrap_or_else(|| settings.media.public_root.clone());
    tracing::info!(
        public_root = %public_root.display(),
        apply = args.apply,
        "starting hosted image fetch"
    );

    let (state, _) = prepare_database(settings).await?;
    let source = HttpImageSource::new().context("failed to build http client")?;
    let fetcher = ImageFetcher::new(source, MediaStore::new(public_root));
    let report = fetcher.run(&state.pool, args.apply).await?;

    println!("mode: {}", if report.applied { "apply" } else { "dry-run" });
    println!("hosted urls seen: {}", report.hosted_urls_seen);
    println!("urls updated: {}", report.urls_updated);
    println!("files downloaded: {}", report.files_downloaded);
    println!(
        "updated: products={} categories={}",
        report.products_updated, report.categories_updated
    );

    if !report.unresolved.is_empty() {
        println!("unresolved: {}", report.unresolved.len());
        for entry in report.unresolved.iter().take(UNRESOLVED_PREVIEW) {
            println!(
                "  {}:{} {} [{}] {}",
                entry.table, entry.id, entry.field, entry.reason, entry.url
            );
        }
    }
    if !report.applied {
        println!("dry run only; pass --apply to download files and update rows");
    }

    Ok(())
}
