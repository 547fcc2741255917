//! The `strata join` command: stream stored content back out.

use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::Context;
use strata_pack::PackDirStore;
use strata_refs::{FileRefStore, RefError, RefStore};
use strata_store::{unwrap_store_error, ObjectReader, StoreError};
use strata_types::ObjectId;
use tracing::warn;

use crate::cli::JoinArgs;

pub fn cmd_join(args: JoinArgs, out: &mut dyn Write) -> anyhow::Result<i32> {
    let packs = Arc::new(PackDirStore::open(&args.store.join("packs"))?);
    let refs = FileRefStore::open(args.store.join("refs"))?;

    let tokens = if args.ids.is_empty() {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text.split_whitespace().map(str::to_string).collect()
    } else {
        args.ids.clone()
    };

    let mut skipped = 0usize;
    for token in &tokens {
        let Some(id) = resolve(&refs, token)? else {
            warn!(token = token.as_str(), "not a known id or ref, skipping");
            skipped += 1;
            continue;
        };
        match ObjectReader::open(Arc::clone(&packs), &id) {
            Ok(mut reader) => {
                std::io::copy(&mut reader, out)
                    .map_err(unwrap_store_error)
                    .with_context(|| format!("reading {token}"))?;
            }
            Err(StoreError::ObjectNotFound(_)) => {
                warn!(%id, "object not found, skipping");
                skipped += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    if skipped > 0 {
        eprintln!("strata: {skipped} requested object(s) could not be read, skipped");
        return Ok(1);
    }
    Ok(0)
}

/// A token is either a full hex object ID or a ref name.
fn resolve(refs: &FileRefStore, token: &str) -> anyhow::Result<Option<ObjectId>> {
    if let Ok(id) = ObjectId::from_hex(token) {
        return Ok(Some(id));
    }
    match refs.read_ref(token) {
        Ok(target) => Ok(target),
        Err(RefError::InvalidName { .. }) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SplitArgs;
    use crate::split::cmd_split;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::path::Path;

    fn split_file(dir: &Path, store: &Path, len: usize, seed: u64) -> (Vec<u8>, String) {
        let mut rng = StdRng::seed_from_u64(seed);
        let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let path = dir.join("input.bin");
        std::fs::write(&path, &data).unwrap();

        let args = SplitArgs {
            blobs: false,
            tree: true,
            commit: false,
            name: Some("series".into()),
            store: store.to_path_buf(),
            remote: None,
            date: None,
            keep_boundaries: false,
            stored_ids: false,
            noop: false,
            copy: false,
            bits: 13,
            fanout: 128,
            max_pack_size: None,
            max_pack_objects: None,
            bwlimit: None,
            no_sealed_dedup: false,
            inputs: vec![path.to_string_lossy().into_owned()],
        };
        let mut out = Vec::new();
        cmd_split(args, true, &mut out).unwrap();
        (data, String::from_utf8(out).unwrap().trim().to_string())
    }

    #[test]
    fn join_by_tree_hash() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join(".strata");
        let (data, root) = split_file(dir.path(), &store, 400 * 1024, 1);

        let args = JoinArgs {
            store: store.clone(),
            ids: vec![root],
        };
        let mut out = Vec::new();
        let code = cmd_join(args, &mut out).unwrap();
        assert_eq!(code, 0);
        assert_eq!(out, data);
    }

    #[test]
    fn join_by_ref_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join(".strata");
        let (data, _root) = split_file(dir.path(), &store, 100 * 1024, 2);

        let args = JoinArgs {
            store: store.clone(),
            ids: vec!["series".into()],
        };
        let mut out = Vec::new();
        let code = cmd_join(args, &mut out).unwrap();
        assert_eq!(code, 0);
        assert_eq!(out, data);
    }

    #[test]
    fn unknown_hash_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join(".strata");
        let (data, root) = split_file(dir.path(), &store, 50 * 1024, 3);

        let args = JoinArgs {
            store: store.clone(),
            ids: vec![ObjectId::from_bytes(b"ghost").to_hex(), root],
        };
        let mut out = Vec::new();
        let code = cmd_join(args, &mut out).unwrap();
        assert_eq!(code, 1);
        // The known object still streams after the miss.
        assert_eq!(out, data);
    }
}
