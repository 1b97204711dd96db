//! nd2-metadata - print the metadata of ND2 microscopy files.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nd2_metadata::{
    config::{Cli, Command, InspectConfig, OutputFormat, SectionsConfig, SourceConfig},
    create_s3_client, BlockCache, FileRangeReader, Metadata, Nd2Reader, RangeReader,
    S3RangeReader,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.into_command();

    init_logging(command.source().verbose);

    if let Err(e) = command.source().validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    match command {
        Command::Inspect(config) => run_inspect(config).await,
        Command::Sections(config) => run_sections(config).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "nd2_metadata=debug"
    } else {
        "nd2_metadata=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Open the configured file, from S3 or the local disk.
async fn open_source(config: &SourceConfig) -> Result<Arc<dyn RangeReader>, String> {
    match &config.s3_bucket {
        Some(bucket) => {
            debug!(bucket = %bucket, key = %config.path, "Reading from S3");
            let client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
            let reader = S3RangeReader::new(client, bucket.clone(), config.path.clone())
                .await
                .map_err(|e| e.to_string())?;
            Ok(Arc::new(BlockCache::with_capacity(
                reader,
                config.block_size,
                config.cache_blocks,
            )))
        }
        None => {
            let reader = FileRangeReader::open(&config.path)
                .await
                .map_err(|e| e.to_string())?;
            Ok(Arc::new(reader))
        }
    }
}

async fn open_reader(config: &SourceConfig) -> Result<Nd2Reader<Arc<dyn RangeReader>>, String> {
    let source = open_source(config).await?;
    Nd2Reader::open(source).await.map_err(|e| e.to_string())
}

// =============================================================================
// Inspect Command
// =============================================================================

async fn run_inspect(config: InspectConfig) -> ExitCode {
    let reader = match open_reader(&config.source).await {
        Ok(reader) => reader,
        Err(e) => {
            error!("Failed to open {}: {}", config.source.path, e);
            return ExitCode::FAILURE;
        }
    };

    let metadata = reader.metadata().await;

    match config.format {
        OutputFormat::Json => match serde_json::to_string_pretty(metadata) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize metadata: {}", e);
                return ExitCode::FAILURE;
            }
        },
        OutputFormat::Summary => print_summary(&reader, metadata),
    }

    ExitCode::SUCCESS
}

fn print_summary<R: RangeReader>(reader: &Nd2Reader<R>, metadata: &Metadata) {
    let (major, minor) = reader.version();
    let size = match (metadata.width, metadata.height) {
        (Some(w), Some(h)) => format!("{} x {} px", w, h),
        _ => "unknown".to_string(),
    };

    println!("File:        {}", reader.identifier());
    println!("Version:     {}.{}", major, minor);
    println!("Image size:  {}", size);
    if let Some(microns) = metadata.pixel_microns {
        println!("Pixel size:  {} µm", microns);
    }
    if let Some(date) = metadata.date {
        println!("Acquired:    {}", date);
    }
    println!("Channels:    {}", metadata.channels.join(", "));
    println!("Fields:      {}", metadata.fields_of_view.len());
    println!("Frames:      {}", metadata.num_frames);
    println!("Z levels:    {}", metadata.z_levels.len());
    if let Some(total) = metadata.total_images_per_channel {
        println!("Images/ch:   {}", total);
    }
    println!("ROIs:        {}", metadata.rois.as_ref().map_or(0, Vec::len));
    println!("Experiment:  {}", metadata.experiment.description);
    for (i, l) in metadata.experiment.loops.iter().enumerate() {
        println!(
            "  loop {}: start {} ms, duration {} ms, interval {} ms{}",
            i,
            l.start,
            l.duration,
            l.sampling_interval,
            if l.stimulation { ", stimulation" } else { "" }
        );
    }
}

// =============================================================================
// Sections Command
// =============================================================================

async fn run_sections(config: SectionsConfig) -> ExitCode {
    let reader = match open_reader(&config.source).await {
        Ok(reader) => reader,
        Err(e) => {
            error!("Failed to open {}: {}", config.source.path, e);
            return ExitCode::FAILURE;
        }
    };

    let (major, minor) = reader.version();
    println!("{} (ND2 {}.{})", reader.identifier(), major, minor);
    println!();

    for (section, offset) in reader.sections() {
        println!("  {:<45} {:>12}  {}", section.label(), offset, section);
    }
    println!();
    println!("Image chunks: {}", reader.image_count());

    ExitCode::SUCCESS
}
