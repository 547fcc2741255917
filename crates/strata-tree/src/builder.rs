use strata_store::{EntryMode, Tree, TreeEntry};
use strata_types::ObjectId;
use tracing::trace;

/// Receives sealed tree nodes from the builder.
///
/// The pack assembler and the remote client both implement this; tests use a
/// plain in-memory store behind it.
pub trait TreeSink {
    type Error;

    /// Store a tree node, returning its content-addressed ID.
    fn put_tree(&mut self, tree: &Tree) -> Result<ObjectId, Self::Error>;
}

/// Result of finishing a build.
#[derive(Clone, Debug)]
pub enum TreeOutcome {
    /// The root entry of the synthesized tree (fanout > 0).
    Root(TreeEntry),
    /// The ordered leaf entry list, no trees synthesized (fanout 0).
    Flat(Vec<TreeEntry>),
}

impl TreeOutcome {
    /// The root entry, if trees were synthesized.
    pub fn root(&self) -> Option<&TreeEntry> {
        match self {
            Self::Root(entry) => Some(entry),
            Self::Flat(_) => None,
        }
    }
}

/// Folds an ordered chunk sequence into a fanout tree.
///
/// Entries are named by the zero-padded decimal end offset of the byte span
/// they cover, so a node's entry list reads in stream order; insertion order
/// is part of each node's hashed content.
#[derive(Debug)]
pub struct TreeBuilder {
    fanout: usize,
    levels: Vec<Vec<TreeEntry>>,
    offset: u64,
}

impl TreeBuilder {
    /// Create a builder. `fanout` is the maximum entries per node before a
    /// forced seal; 0 disables tree synthesis entirely (flat mode).
    ///
    /// # Panics
    ///
    /// Panics if `fanout` is 1: every sealed single-entry node would hit
    /// the limit again one level up, so the fold can never terminate.
    pub fn new(fanout: usize) -> Self {
        assert!(fanout != 1, "fanout must be 0 (flat) or at least 2");
        Self {
            fanout,
            levels: vec![Vec::new()],
            offset: 0,
        }
    }

    fn span_name(&self) -> String {
        format!("{:016}", self.offset)
    }

    /// Append one chunk of `size` bytes whose trailing boundary has the
    /// given level.
    pub fn push<S: TreeSink>(
        &mut self,
        sink: &mut S,
        mode: EntryMode,
        id: ObjectId,
        size: u64,
        level: usize,
    ) -> Result<(), S::Error> {
        self.offset += size;
        let entry = TreeEntry::new(mode, self.span_name(), id);
        self.levels[0].push(entry);

        if self.fanout == 0 {
            return Ok(());
        }
        // A level-L boundary seals everything below it, bottom-up.
        for depth in 0..level {
            if self.levels[depth].is_empty() {
                break;
            }
            self.seal_level(sink, depth)?;
        }
        self.enforce_fanout(sink)
    }

    /// Seal all open accumulators bottom-up into a single root.
    pub fn finish<S: TreeSink>(mut self, sink: &mut S) -> Result<TreeOutcome, S::Error> {
        if self.fanout == 0 {
            return Ok(TreeOutcome::Flat(std::mem::take(&mut self.levels[0])));
        }
        let mut depth = 0;
        while depth + 1 < self.levels.len() {
            if !self.levels[depth].is_empty() {
                self.seal_level(sink, depth)?;
            }
            depth += 1;
        }
        // The top accumulator becomes the root node, even when it holds a
        // single flat run of chunks (the degenerate one-node tree).
        let root = self.make_node(sink, depth)?;
        Ok(TreeOutcome::Root(root))
    }

    /// Seal level `depth` into a node and append it one level up.
    fn seal_level<S: TreeSink>(&mut self, sink: &mut S, depth: usize) -> Result<(), S::Error> {
        let entry = self.make_node(sink, depth)?;
        if self.levels.len() <= depth + 1 {
            self.levels.push(Vec::new());
        }
        self.levels[depth + 1].push(entry);
        Ok(())
    }

    fn make_node<S: TreeSink>(&mut self, sink: &mut S, depth: usize) -> Result<TreeEntry, S::Error> {
        let entries = std::mem::take(&mut self.levels[depth]);
        trace!(depth, entries = entries.len(), "sealing tree node");
        let tree = Tree::new(entries);
        let id = sink.put_tree(&tree)?;
        Ok(TreeEntry::new(EntryMode::Tree, self.span_name(), id))
    }

    /// Force-seal any accumulator that reached the fanout limit. Sealing
    /// pushes an entry upward, so re-check until all levels are in bounds.
    fn enforce_fanout<S: TreeSink>(&mut self, sink: &mut S) -> Result<(), S::Error> {
        let mut depth = 0;
        while depth < self.levels.len() {
            if self.levels[depth].len() >= self.fanout {
                self.seal_level(sink, depth)?;
            }
            depth += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_store::{
        InMemoryObjectStore, ObjectKind, ObjectRead, ObjectReader, ObjectStore, StoreError,
        StoredObject,
    };

    /// Sink that writes trees into an in-memory store and records each
    /// sealed node's entry count.
    struct RecordingSink<'a> {
        store: &'a InMemoryObjectStore,
        sealed: Vec<usize>,
    }

    impl<'a> RecordingSink<'a> {
        fn new(store: &'a InMemoryObjectStore) -> Self {
            Self {
                store,
                sealed: Vec::new(),
            }
        }
    }

    impl TreeSink for RecordingSink<'_> {
        type Error = StoreError;

        fn put_tree(&mut self, tree: &Tree) -> Result<ObjectId, StoreError> {
            self.sealed.push(tree.entries.len());
            self.store.write(&tree.to_stored_object()?)
        }
    }

    fn put_chunk(store: &InMemoryObjectStore, data: &[u8]) -> ObjectId {
        store
            .write(&StoredObject::new(ObjectKind::Chunk, data.to_vec()))
            .unwrap()
    }

    fn tree_depth(store: &InMemoryObjectStore, id: &ObjectId) -> usize {
        let obj = store.read(id).unwrap().unwrap();
        if obj.kind != ObjectKind::Tree {
            return 0;
        }
        let tree = Tree::from_stored_object(&obj).unwrap();
        1 + tree
            .entries
            .iter()
            .map(|e| tree_depth(store, &e.id))
            .max()
            .unwrap_or(0)
    }

    #[test]
    #[should_panic(expected = "fanout must be 0 (flat) or at least 2")]
    fn fanout_of_one_is_rejected() {
        TreeBuilder::new(1);
    }

    #[test]
    fn small_list_degenerates_to_single_node() {
        let store = InMemoryObjectStore::new();
        let mut sink = RecordingSink::new(&store);
        let mut builder = TreeBuilder::new(128);
        for i in 0..5u8 {
            let id = put_chunk(&store, &[i; 10]);
            builder.push(&mut sink, EntryMode::Blob, id, 10, 0).unwrap();
        }
        let outcome = builder.finish(&mut sink).unwrap();
        let root = outcome.root().unwrap();
        assert_eq!(sink.sealed, vec![5]);
        assert_eq!(tree_depth(&store, &root.id), 1);
    }

    #[test]
    fn fanout_limit_bounds_every_node() {
        let store = InMemoryObjectStore::new();
        let mut sink = RecordingSink::new(&store);
        let mut builder = TreeBuilder::new(4);
        let mut expected = Vec::new();
        for i in 0..100u32 {
            let data = i.to_be_bytes().to_vec();
            expected.extend_from_slice(&data);
            let id = put_chunk(&store, &data);
            builder
                .push(&mut sink, EntryMode::Blob, id, data.len() as u64, 0)
                .unwrap();
        }
        let outcome = builder.finish(&mut sink).unwrap();
        let root = outcome.root().unwrap();

        for count in &sink.sealed {
            assert!(*count <= 4, "node holds {count} entries, fanout is 4");
        }
        // Depth is logarithmic: 100 entries at fanout 4 fit in depth 5.
        assert!(tree_depth(&store, &root.id) <= 5);
        // Order survives the fold.
        assert_eq!(ObjectReader::read_to_vec(&store, &root.id).unwrap(), expected);
    }

    #[test]
    fn stronger_boundary_seals_lower_levels() {
        let store = InMemoryObjectStore::new();
        let mut sink = RecordingSink::new(&store);
        let mut builder = TreeBuilder::new(128);
        let mut expected = Vec::new();
        for (i, level) in [0usize, 0, 1, 0, 0].into_iter().enumerate() {
            let data = vec![i as u8; 8];
            expected.extend_from_slice(&data);
            let id = put_chunk(&store, &data);
            builder.push(&mut sink, EntryMode::Blob, id, 8, level).unwrap();
        }
        let outcome = builder.finish(&mut sink).unwrap();
        let root = outcome.root().unwrap();

        // The level-1 boundary sealed the first three chunks into one node;
        // finish sealed the remaining two, then the root over both.
        assert_eq!(sink.sealed, vec![3, 2, 2]);
        assert_eq!(tree_depth(&store, &root.id), 2);
        assert_eq!(ObjectReader::read_to_vec(&store, &root.id).unwrap(), expected);
    }

    #[test]
    fn flat_mode_synthesizes_nothing() {
        let store = InMemoryObjectStore::new();
        let mut sink = RecordingSink::new(&store);
        let mut builder = TreeBuilder::new(0);
        let mut ids = Vec::new();
        for i in 0..10u8 {
            let id = put_chunk(&store, &[i]);
            ids.push(id);
            // Levels are ignored in flat mode.
            builder
                .push(&mut sink, EntryMode::Blob, id, 1, (i % 3) as usize)
                .unwrap();
        }
        match builder.finish(&mut sink).unwrap() {
            TreeOutcome::Flat(entries) => {
                assert_eq!(entries.len(), 10);
                let got: Vec<ObjectId> = entries.iter().map(|e| e.id).collect();
                assert_eq!(got, ids);
            }
            TreeOutcome::Root(_) => panic!("flat mode produced a root"),
        }
        assert!(sink.sealed.is_empty());
    }

    #[test]
    fn entry_names_are_end_offsets_in_order() {
        let store = InMemoryObjectStore::new();
        let mut sink = RecordingSink::new(&store);
        let mut builder = TreeBuilder::new(0);
        for (i, size) in [100u64, 50, 25].iter().enumerate() {
            let id = put_chunk(&store, &[i as u8]);
            builder.push(&mut sink, EntryMode::Blob, id, *size, 0).unwrap();
        }
        let TreeOutcome::Flat(entries) = builder.finish(&mut sink).unwrap() else {
            panic!("expected flat outcome");
        };
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["0000000000000100", "0000000000000150", "0000000000000175"]
        );
    }

    #[test]
    fn single_empty_chunk_builds_a_tree() {
        let store = InMemoryObjectStore::new();
        let mut sink = RecordingSink::new(&store);
        let mut builder = TreeBuilder::new(128);
        let id = put_chunk(&store, b"");
        builder.push(&mut sink, EntryMode::Blob, id, 0, 0).unwrap();
        let outcome = builder.finish(&mut sink).unwrap();
        let root = outcome.root().unwrap();
        assert!(ObjectReader::read_to_vec(&store, &root.id).unwrap().is_empty());
    }
}
