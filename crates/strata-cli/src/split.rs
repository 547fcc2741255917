//! The `strata split` command: chunk input streams, build the fanout tree,
//! store everything, and report or record the result.

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{bail, Context};
use strata_chunk::{ChunkConfig, SourceEntry, StreamChunker, DEFAULT_FAN_BITS};
use strata_pack::{PackAssembler, PackDirStore, PackLimits};
use strata_refs::{FileRefStore, RefStore};
use strata_remote::{LoopbackTransport, RemoteClient};
use strata_store::{object_id, Commit, EntryMode, ObjectKind, ObjectReader, StoreError, Tree};
use strata_tree::{TreeBuilder, TreeSink};
use strata_types::ObjectId;
use tracing::{info, warn};

use crate::cli::SplitArgs;
use crate::progress::Progress;

/// Where split output goes: a local pack directory, a remote store, or
/// nowhere (hash-only runs).
enum Destination {
    Local {
        assembler: PackAssembler,
        refs: FileRefStore,
    },
    Remote(RemoteClient<LoopbackTransport>),
    Noop,
}

impl Destination {
    fn put_chunk(&mut self, data: &[u8]) -> anyhow::Result<ObjectId> {
        Ok(match self {
            Self::Local { assembler, .. } => assembler.put(ObjectKind::Chunk, data)?,
            Self::Remote(client) => client.put(ObjectKind::Chunk, data)?,
            Self::Noop => object_id(ObjectKind::Chunk, data),
        })
    }

    fn new_commit(
        &mut self,
        tree: ObjectId,
        parent: Option<ObjectId>,
        timestamp: i64,
        message: &str,
    ) -> anyhow::Result<ObjectId> {
        Ok(match self {
            Self::Local { assembler, .. } => {
                assembler.new_commit(tree, parent, timestamp, message)?
            }
            Self::Remote(client) => client.new_commit(tree, parent, timestamp, message)?,
            Self::Noop => Commit::new(tree, parent, timestamp, message)
                .to_stored_object()?
                .compute_id(),
        })
    }

    fn read_ref(&mut self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        Ok(match self {
            Self::Local { refs, .. } => refs.read_ref(name)?,
            Self::Remote(client) => client.read_ref(name)?,
            Self::Noop => None,
        })
    }

    /// Make everything durable, then apply the ref update (if any). The
    /// order matters: a ref must never point at objects that are not yet
    /// sealed (locally) or acknowledged (remotely).
    fn complete(
        self,
        ref_update: Option<(&str, ObjectId, Option<ObjectId>)>,
    ) -> anyhow::Result<()> {
        match self {
            Self::Local { assembler, refs } => {
                let packs = assembler.finish()?;
                info!(packs = packs.len(), "sealed packs");
                if let Some((name, new, expected)) = ref_update {
                    refs.update_ref(name, new, expected)?;
                }
            }
            Self::Remote(mut client) => {
                let packs = client.finish()?;
                info!(packs, "shipped packs");
                if let Some((name, new, expected)) = ref_update {
                    client.update_ref(name, new, expected)?;
                }
            }
            Self::Noop => {}
        }
        Ok(())
    }
}

impl TreeSink for Destination {
    type Error = anyhow::Error;

    fn put_tree(&mut self, tree: &Tree) -> anyhow::Result<ObjectId> {
        Ok(match self {
            Self::Local { assembler, .. } => assembler.new_tree(tree)?,
            Self::Remote(client) => client.new_tree(tree)?,
            Self::Noop => tree.to_stored_object()?.compute_id(),
        })
    }
}

pub fn cmd_split(args: SplitArgs, quiet: bool, out: &mut dyn Write) -> anyhow::Result<i32> {
    validate(&args)?;
    let config = chunk_config(&args)?;
    let timestamp = match &args.date {
        Some(s) => parse_date(s)?,
        None => chrono::Utc::now().timestamp(),
    };

    let mut chunker = StreamChunker::new(config, args.keep_boundaries);
    let progress = if quiet || args.copy {
        None
    } else {
        Some(Rc::new(RefCell::new(Progress::new("split"))))
    };
    if let Some(progress) = &progress {
        let progress = Rc::clone(progress);
        chunker = chunker
            .with_progress(Box::new(move |_source, total| progress.borrow_mut().tick(total)));
    }

    let mut skipped = 0usize;
    if args.stored_ids {
        let source_store = Arc::new(PackDirStore::open(&args.store.join("packs"))?);
        for token in input_tokens(&args.inputs)? {
            let id = match ObjectId::from_hex(token.trim()) {
                Ok(id) => id,
                Err(err) => {
                    warn!(token = token.as_str(), %err, "unparseable object id, skipping");
                    skipped += 1;
                    continue;
                }
            };
            match ObjectReader::open(Arc::clone(&source_store), &id) {
                Ok(reader) => {
                    chunker.push_source(SourceEntry::new(id.to_hex(), Box::new(reader)));
                }
                Err(StoreError::ObjectNotFound(_)) => {
                    warn!(%id, "object not found, skipping");
                    skipped += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    } else if args.inputs.is_empty() {
        chunker.push_source(SourceEntry::new("<stdin>", Box::new(std::io::stdin())));
    } else {
        for input in &args.inputs {
            if input == "-" {
                chunker.push_source(SourceEntry::new("<stdin>", Box::new(std::io::stdin())));
            } else {
                let file =
                    File::open(input).with_context(|| format!("cannot open {input}"))?;
                chunker.push_source(SourceEntry::new(
                    input.clone(),
                    Box::new(BufReader::new(file)),
                ));
            }
        }
    }

    let mut dest = open_destination(&args)?;
    let mut builder = TreeBuilder::new(args.fanout);
    let mut chunk_count = 0u64;

    while let Some(item) = chunker.next() {
        let chunk = item?;
        chunk_count += 1;
        if args.copy {
            out.write_all(&chunk.data)?;
            continue;
        }
        let size = chunk.data.len() as u64;
        let id = dest.put_chunk(&chunk.data)?;
        builder.push(&mut dest, EntryMode::Blob, id, size, chunk.level)?;
        if args.blobs {
            writeln!(out, "{}", id.to_hex())?;
        }
    }
    let total = chunker.total_bytes();
    if let Some(progress) = &progress {
        progress.borrow_mut().finish(total);
    }

    if args.copy {
        info!(chunks = chunk_count, bytes = total, "copy finished");
        return Ok(exit_code(skipped));
    }

    let outcome = builder.finish(&mut dest)?;
    let root = outcome.root().map(|entry| entry.id);

    if args.tree {
        // Validation guarantees fanout > 0 here, so a root exists.
        let root = root.context("no tree was built")?;
        writeln!(out, "{}", root.to_hex())?;
    }

    let mut ref_update = None;
    let ref_name = args.name.clone();
    if args.commit || ref_name.is_some() {
        let root = root.context("no tree was built")?;
        let parent = match &ref_name {
            Some(name) => dest.read_ref(name)?,
            None => None,
        };
        let message = run_provenance();
        let commit = dest.new_commit(root, parent, timestamp, &message)?;
        if args.commit {
            writeln!(out, "{}", commit.to_hex())?;
        }
        if let Some(name) = &ref_name {
            ref_update = Some((name.as_str(), commit, parent));
        }
    }
    dest.complete(ref_update)?;

    info!(chunks = chunk_count, bytes = total, skipped, "split finished");
    if skipped > 0 {
        eprintln!("strata: {skipped} requested object(s) could not be read, skipped");
    }
    Ok(exit_code(skipped))
}

fn validate(args: &SplitArgs) -> anyhow::Result<()> {
    let stores = args.blobs || args.tree || args.commit || args.name.is_some();
    if !(stores || args.noop || args.copy) {
        bail!("use one of -b, -t, -c, -n, --noop or --copy");
    }
    if (args.noop || args.copy) && stores {
        bail!("--noop and --copy are incompatible with -b, -t, -c and -n");
    }
    if args.noop && args.copy {
        bail!("--noop is incompatible with --copy");
    }
    if args.fanout == 1 {
        bail!("--fanout must be 0 or at least 2");
    }
    if args.fanout == 0 && (args.tree || args.commit || args.name.is_some()) {
        bail!("-t, -c and -n require a non-zero --fanout");
    }
    if args.bwlimit.is_some() && args.remote.is_none() {
        bail!("--bwlimit requires --remote");
    }
    Ok(())
}

fn chunk_config(args: &SplitArgs) -> anyhow::Result<ChunkConfig> {
    let fan_bits = if args.fanout >= 2 {
        args.fanout.ilog2()
    } else {
        DEFAULT_FAN_BITS
    };
    Ok(ChunkConfig::new(args.bits)?.with_fan_bits(fan_bits))
}

fn open_destination(args: &SplitArgs) -> anyhow::Result<Destination> {
    if args.noop || args.copy {
        return Ok(Destination::Noop);
    }
    let defaults = PackLimits::default();
    let limits = PackLimits {
        max_pack_size: args.max_pack_size.unwrap_or(defaults.max_pack_size),
        max_pack_objects: args.max_pack_objects.unwrap_or(defaults.max_pack_objects),
    };
    if let Some(remote) = &args.remote {
        let mut client = RemoteClient::new(LoopbackTransport::open(remote)?, limits);
        if let Some(bwlimit) = args.bwlimit {
            client = client.with_rate_limit(bwlimit);
        }
        return Ok(Destination::Remote(client));
    }
    let mut assembler = PackAssembler::create(args.store.join("packs"), limits)?;
    if !args.no_sealed_dedup {
        assembler = assembler.with_dedup_sealed()?;
    }
    let refs = FileRefStore::open(args.store.join("refs"))?;
    Ok(Destination::Local { assembler, refs })
}

fn parse_date(s: &str) -> anyhow::Result<i64> {
    if let Ok(secs) = s.parse::<i64>() {
        return Ok(secs);
    }
    let dt = chrono::DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("unrecognized date: {s}"))?;
    Ok(dt.timestamp())
}

/// The commit message records how the commit was produced.
fn run_provenance() -> String {
    let argv: Vec<String> = std::env::args().collect();
    argv.join(" ")
}

fn input_tokens(inputs: &[String]) -> anyhow::Result<Vec<String>> {
    if !inputs.is_empty() {
        return Ok(inputs.to_vec());
    }
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(text.split_whitespace().map(str::to_string).collect())
}

fn exit_code(skipped: usize) -> i32 {
    if skipped > 0 {
        1
    } else {
        0
    }
}
