//! Command-line configuration for the `nd2-metadata` binary.
//!
//! Options can also be set through environment variables with the `ND2_`
//! prefix:
//!
//! - `ND2_S3_BUCKET` - Read files from this bucket instead of the local disk
//! - `ND2_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `ND2_S3_REGION` - AWS region (default: us-east-1)
//! - `ND2_BLOCK_SIZE` - Block size for remote reads (default: 256KB)
//! - `ND2_CACHE_BLOCKS` - Max blocks cached per file (default: 100)

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::io::{DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_CAPACITY};

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Smallest accepted block size.
const MIN_BLOCK_SIZE: usize = 1024;

/// Largest accepted block size.
const MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

/// ND2 metadata reader.
///
/// Reads the metadata of Nikon ND2 microscopy files from local disk or from
/// S3-compatible object storage, without reading image data.
#[derive(Parser, Debug, Clone)]
#[command(name = "nd2-metadata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the canonical metadata of a file.
    Inspect(InspectConfig),

    /// List the sections present in a file.
    Sections(SectionsConfig),
}

impl Command {
    pub fn source(&self) -> &SourceConfig {
        match self {
            Command::Inspect(config) => &config.source,
            Command::Sections(config) => &config.source,
        }
    }
}

/// Output format of the `inspect` command.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Short human-readable summary
    Summary,
}

#[derive(Args, Debug, Clone)]
pub struct InspectConfig {
    #[command(flatten)]
    pub source: SourceConfig,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct SectionsConfig {
    #[command(flatten)]
    pub source: SourceConfig,
}

/// Where the file is read from, shared by every command.
#[derive(Args, Debug, Clone)]
pub struct SourceConfig {
    /// Local path, or object key when a bucket is set.
    pub path: String,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// S3 bucket to read the file from. Reads the local disk if unset.
    #[arg(long, env = "ND2_S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "ND2_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "ND2_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Block size in bytes for remote reads.
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE, env = "ND2_BLOCK_SIZE")]
    pub block_size: usize,

    /// Maximum number of blocks to cache per file.
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY, env = "ND2_CACHE_BLOCKS")]
    pub cache_blocks: usize,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl SourceConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.path.is_empty() {
            return Err("A file path is required".to_string());
        }

        if let Some(bucket) = &self.s3_bucket {
            if bucket.is_empty() {
                return Err("S3 bucket name is empty. Unset ND2_S3_BUCKET to read local files"
                    .to_string());
            }
        }

        if self.s3_endpoint.is_some() && self.s3_bucket.is_none() {
            return Err("--s3-endpoint requires --s3-bucket".to_string());
        }

        if self.cache_blocks == 0 {
            return Err("cache_blocks must be greater than 0".to_string());
        }

        if self.block_size < MIN_BLOCK_SIZE || self.block_size > MAX_BLOCK_SIZE {
            return Err("block_size must be between 1KB and 16MB".to_string());
        }

        Ok(())
    }

    /// Whether the file is read from S3.
    pub fn is_remote(&self) -> bool {
        self.s3_bucket.is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
