//! Whole-pipeline tests: chunk a stream, fold it into a fanout tree, seal
//! everything into bounded packs, and read the bytes back.

use std::io::Cursor;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_chunk::{ChunkConfig, SourceEntry, StreamChunker};
use strata_pack::{PackAssembler, PackDirStore, PackLimits};
use strata_store::{EntryMode, ObjectKind, ObjectRead, ObjectReader, Tree};
use strata_tree::TreeBuilder;
use strata_types::ObjectId;

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    data
}

fn store_stream(dir: &Path, data: &[u8], limits: PackLimits) -> ObjectId {
    let mut assembler = PackAssembler::create(dir, limits).unwrap();
    let mut builder = TreeBuilder::new(128);
    let mut chunker = StreamChunker::new(ChunkConfig::default(), false);
    chunker.push_source(SourceEntry::new(
        "input",
        Box::new(Cursor::new(data.to_vec())),
    ));
    for item in chunker {
        let chunk = item.unwrap();
        let size = chunk.data.len() as u64;
        let id = assembler.put(ObjectKind::Chunk, &chunk.data).unwrap();
        builder
            .push(&mut assembler, EntryMode::Blob, id, size, chunk.level)
            .unwrap();
    }
    let outcome = builder.finish(&mut assembler).unwrap();
    let root = outcome.root().unwrap().id;
    assembler.finish().unwrap();
    root
}

#[test]
fn ten_megabytes_round_trip_bit_for_bit() {
    let data = random_bytes(10 * 1024 * 1024, 42);
    let dir = tempfile::tempdir().unwrap();
    let root = store_stream(dir.path(), &data, PackLimits::default());

    let store = PackDirStore::open(dir.path()).unwrap();

    // ~1280 expected chunks against fanout 128: the root must be an
    // internal node over subtrees, not a flat chunk list.
    let root_obj = store.read(&root).unwrap().unwrap();
    let root_tree = Tree::from_stored_object(&root_obj).unwrap();
    assert!(root_tree.entries.iter().any(|e| e.mode.is_tree()));

    let out = ObjectReader::read_to_vec(&store, &root).unwrap();
    assert_eq!(out, data);
}

#[test]
fn pack_segmentation_does_not_change_the_root_hash() {
    let data = random_bytes(2 * 1024 * 1024, 7);

    let coarse_dir = tempfile::tempdir().unwrap();
    let coarse = store_stream(coarse_dir.path(), &data, PackLimits::default());

    let fine_dir = tempfile::tempdir().unwrap();
    let fine_limits = PackLimits {
        max_pack_objects: 7,
        ..PackLimits::default()
    };
    let fine = store_stream(fine_dir.path(), &data, fine_limits);

    assert_eq!(coarse, fine);
    let coarse_packs = PackDirStore::open(coarse_dir.path()).unwrap().pack_count();
    let fine_packs = PackDirStore::open(fine_dir.path()).unwrap().pack_count();
    assert!(fine_packs > coarse_packs);

    let store = PackDirStore::open(fine_dir.path()).unwrap();
    assert_eq!(ObjectReader::read_to_vec(&store, &fine).unwrap(), data);
}

#[test]
fn empty_stream_has_a_defined_stored_form() {
    let dir = tempfile::tempdir().unwrap();
    let root = store_stream(dir.path(), &[], PackLimits::default());

    let store = PackDirStore::open(dir.path()).unwrap();
    assert!(ObjectReader::read_to_vec(&store, &root).unwrap().is_empty());
}
