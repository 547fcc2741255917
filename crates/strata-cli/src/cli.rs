use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Content-defined chunking, deduplicating storage",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Split input streams into content-defined chunks and store them
    Split(SplitArgs),
    /// Reassemble stored objects and write their bytes to stdout
    Join(JoinArgs),
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Print the hash of every stored chunk, one per line
    #[arg(short = 'b', long)]
    pub blobs: bool,

    /// Print the root tree hash
    #[arg(short = 't', long)]
    pub tree: bool,

    /// Create a commit and print its hash
    #[arg(short = 'c', long)]
    pub commit: bool,

    /// Create or advance this ref to point at the new commit
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Local store directory
    #[arg(long, default_value = ".strata")]
    pub store: PathBuf,

    /// Write to a remote store at this location instead of the local store
    #[arg(short = 'r', long)]
    pub remote: Option<PathBuf>,

    /// Commit timestamp: unix seconds or RFC 3339 (default: now)
    #[arg(long)]
    pub date: Option<String>,

    /// Force a chunk boundary at the end of every input
    #[arg(long)]
    pub keep_boundaries: bool,

    /// Inputs are hex object IDs; re-chunk their stored content
    #[arg(long)]
    pub stored_ids: bool,

    /// Chunk and hash, but store nothing
    #[arg(long)]
    pub noop: bool,

    /// Pass input through to stdout unmodified, storing nothing
    #[arg(long)]
    pub copy: bool,

    /// Boundary bit width; mean chunk size is 2^BITS bytes
    #[arg(long, default_value_t = strata_chunk::DEFAULT_SPLIT_BITS)]
    pub bits: u32,

    /// Max entries per tree node (0 disables tree synthesis)
    #[arg(long, default_value_t = 128)]
    pub fanout: usize,

    /// Max bytes per pack segment
    #[arg(long)]
    pub max_pack_size: Option<u64>,

    /// Max objects per pack segment
    #[arg(long)]
    pub max_pack_objects: Option<usize>,

    /// Upload rate ceiling in bytes per second (remote only)
    #[arg(long)]
    pub bwlimit: Option<u64>,

    /// Skip dedup against packs sealed by earlier runs
    #[arg(long)]
    pub no_sealed_dedup: bool,

    /// Input files ("-" or none: stdin); with --stored-ids, hex object IDs
    pub inputs: Vec<String>,
}

#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Local store directory
    #[arg(long, default_value = ".strata")]
    pub store: PathBuf,

    /// Hex object IDs or ref names (none: read names from stdin)
    pub ids: Vec<String>,
}
