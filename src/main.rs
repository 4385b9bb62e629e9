use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use pixhaul::config::{DbConfig, StoreConfig, StoreCredentials};
use pixhaul::driver::{MigrationPolicy, Migrator, TableReport};
use pixhaul::fetch::HttpFetcher;
use pixhaul::imaging::{Quality, ResizeMode, Sharpening, TransformPolicy};
use pixhaul::naming::NamingStrategy;
use pixhaul::sink::{ArtifactSink, LocalDirSink, ObjectStoreSink};
use pixhaul::source::{MySqlRowSource, RowSource, TableSpec};
use pixhaul::thumbs::ThumbOptions;
use pixhaul::{output, report, thumbs};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pixhaul")]
#[command(about = "Migrate database-referenced images from a CDN to self-hosted object storage")]
#[command(long_about = "\
Migrate database-referenced images from a CDN to self-hosted object storage

Rows are selected per table by a URL pattern; each asset is downloaded from
its extracted origin URL (falling back to the proxy URL once), optionally
resized and re-encoded, and written to a local staging directory or uploaded
straight to the object store. The database itself is never modified: the run
produces mapping.json and update_urls.sql, and you apply the statements after
verifying the uploaded assets.

Re-running is safe and cheap — items whose destination already exists are
skipped without any network traffic and still appear in the rewrite output.

Connection settings come from the environment:

  DB_HOST, DB_PORT, DB_USER, DB_PASSWORD, DB_NAME
  STORE_ENDPOINT, STORE_REGION, STORE_BUCKET, STORE_PUBLIC_BASE
  STORE_ACCESS_KEY, STORE_SECRET_KEY     (only needed with --upload)

Examples:

  # Stage locally, resized to fit 2600x2600
  pixhaul run --spec accommodation_image:image_id:image_url:accommodation_image \\
              --spec room:room_id:main_image_url:room \\
              --url-pattern '%cdn.example.net%'

  # Re-process store-hosted originals into 1600px copies, preserving filenames
  pixhaul run --spec room:room_id:main_image_url:resizing_room \\
              --url-pattern '%objstore.example.com%' \\
              --naming origin --max-width 1600 --max-height 1600 \\
              --quality 95 --no-sharpen

  # Square 400px thumbnails for everything migrated into ./migrated/room
  pixhaul thumbs --source migrated/room")]
struct Cli {
    /// Verbose diagnostic output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum NamingMode {
    /// Filenames mirror database ids: {id}.{ext}
    Identity,
    /// Filenames keep the origin URL's basename
    Origin,
}

impl From<NamingMode> for NamingStrategy {
    fn from(mode: NamingMode) -> Self {
        match mode {
            NamingMode::Identity => NamingStrategy::Identity,
            NamingMode::Origin => NamingStrategy::Origin,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run the migration pipeline over one or more tables
    Run {
        /// Table to migrate, as table:id_column:url_column:folder (repeatable)
        #[arg(long = "spec", required = true)]
        specs: Vec<TableSpec>,

        /// SQL LIKE pattern selecting rows whose URL still needs migrating
        #[arg(long, default_value = "%")]
        url_pattern: String,

        /// Local staging directory (also receives mapping.json / update_urls.sql)
        #[arg(long, default_value = "migrated_images")]
        out_dir: PathBuf,

        /// Upload directly to the object store instead of staging locally
        #[arg(long)]
        upload: bool,

        /// Filename derivation strategy
        #[arg(long, value_enum, default_value_t = NamingMode::Identity)]
        naming: NamingMode,

        /// Maximum output width in pixels
        #[arg(long, default_value_t = 2600)]
        max_width: u32,

        /// Maximum output height in pixels
        #[arg(long, default_value_t = 2600)]
        max_height: u32,

        /// Store bytes exactly as fetched (no resize/re-encode stage)
        #[arg(long)]
        no_resize: bool,

        /// Center-crop to a square before scaling
        #[arg(long)]
        crop_square: bool,

        /// JPEG encoding quality (1-100)
        #[arg(long, default_value_t = 98)]
        quality: u32,

        /// Skip post-resize sharpening
        #[arg(long)]
        no_sharpen: bool,

        /// Pause after each successful download, in milliseconds
        #[arg(long, default_value_t = 100)]
        delay_ms: u64,
    },
    /// Generate square thumbnails for a directory of migrated images
    Thumbs {
        /// Directory of full-size images
        #[arg(long)]
        source: PathBuf,

        /// Output directory (defaults to {source}_thumb)
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Thumbnail side in pixels
        #[arg(long, default_value_t = 400)]
        size: u32,

        /// JPEG encoding quality (1-100)
        #[arg(long, default_value_t = 90)]
        quality: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match cli.command {
        Command::Run {
            specs,
            url_pattern,
            out_dir,
            upload,
            naming,
            max_width,
            max_height,
            no_resize,
            crop_square,
            quality,
            no_sharpen,
            delay_ms,
        } => {
            let db = DbConfig::from_env()?;
            let store = StoreConfig::from_env()?;

            let transform = if no_resize {
                None
            } else {
                Some(TransformPolicy {
                    max_width,
                    max_height,
                    mode: if crop_square {
                        ResizeMode::CropSquare
                    } else {
                        ResizeMode::Bound
                    },
                    sharpen: if no_sharpen {
                        None
                    } else {
                        Some(Sharpening::light())
                    },
                    quality: Quality::new(quality),
                })
            };

            let policy = MigrationPolicy {
                transform,
                naming: naming.into(),
                public_base: store.public_base.clone(),
                url_pattern,
                throttle: Duration::from_millis(delay_ms),
            };

            let source = MySqlRowSource::connect(&db)?;
            let fetcher = HttpFetcher::new()?;

            let reports = if upload {
                let creds = StoreCredentials::from_env()?;
                let sink = ObjectStoreSink::connect(&store, &creds)?;
                execute(source, fetcher, sink, policy, &specs)?
            } else {
                let sink = LocalDirSink::new(&out_dir);
                execute(source, fetcher, sink, policy, &specs)?
            };

            let (mapping_path, sql_path) = report::write_artifacts(&reports, &out_dir)?;
            output::print_run_summary(&reports, &mapping_path, &sql_path);
        }
        Command::Thumbs {
            source,
            dest,
            size,
            quality,
        } => {
            let dest = dest.unwrap_or_else(|| default_thumb_dest(&source));
            let stats = thumbs::generate(
                &source,
                &dest,
                &ThumbOptions {
                    size,
                    quality: Quality::new(quality),
                },
            )?;
            println!(
                "Thumbnails: {} generated, {} already present, {} failed -> {}",
                stats.generated,
                stats.skipped,
                stats.failed,
                dest.display()
            );
        }
    }

    Ok(())
}

fn execute<S, K>(
    source: S,
    fetcher: HttpFetcher,
    sink: K,
    policy: MigrationPolicy,
    specs: &[TableSpec],
) -> Result<Vec<TableReport>, pixhaul::source::SourceError>
where
    S: RowSource,
    K: ArtifactSink,
{
    Migrator::new(source, fetcher, sink, policy).run(specs)
}

/// `{source}_thumb` next to the source directory.
fn default_thumb_dest(source: &std::path::Path) -> PathBuf {
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("images");
    source.with_file_name(format!("{name}_thumb"))
}
