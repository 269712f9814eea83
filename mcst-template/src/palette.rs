use crate::info::BlockInfo;
use crate::jigsaw::{JigsawInfo, JIGSAW};
use crate::template::BlockBuckets;
use mcst_common::block_storage::BlockState;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// Two-way mapping between block states and the integer ids a structure file refers to them by.
#[derive(Clone, Debug, Default)]
pub struct StatePalette {
    ids: HashMap<BlockState, u32>,
    states: Vec<Option<BlockState>>,
    next_id: u32,
}

impl StatePalette {
    pub fn new() -> Self {
        Default::default()
    }

    /// Id of `state`, handing out the next free id the first time it is seen.
    pub fn id_for(&mut self, state: &BlockState) -> u32 {
        if let Some(id) = self.ids.get(state) {
            return *id;
        }
        let id = self.next_id;
        self.add_mapping(state.clone(), id);
        id
    }

    pub fn add_mapping(&mut self, state: BlockState, id: u32) {
        let idx = id as usize;
        if self.states.len() <= idx {
            self.states.resize(idx + 1, None);
        }
        self.states[idx] = Some(state.clone());
        self.ids.insert(state, id);
        if self.next_id <= id {
            self.next_id = id + 1;
        }
    }

    /// State for `id`. Unknown ids read as air so files from newer versions still load.
    pub fn state_for(&self, id: i32) -> BlockState {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.states.get(i))
            .and_then(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.states.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// States in id order, skipping unassigned ids
    pub fn iter(&self) -> impl Iterator<Item = &BlockState> {
        self.states.iter().flatten()
    }
}

/// One variant of a template's blocks. Immutable once built; the per-type views are computed on
/// first use and shared.
#[derive(Debug, Default)]
pub struct Palette {
    blocks: Vec<BlockInfo>,
    cache: RwLock<HashMap<String, Arc<[BlockInfo]>>>,
    jigsaws: OnceLock<Vec<JigsawInfo>>,
}

impl Palette {
    pub fn new(blocks: Vec<BlockInfo>) -> Self {
        Self {
            blocks,
            cache: Default::default(),
            jigsaws: OnceLock::new(),
        }
    }

    pub fn blocks(&self) -> &[BlockInfo] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// How many blocks fall in each placement bucket: full cubes, irregular shapes, payloads
    pub fn bucket_sizes(&self) -> [usize; 3] {
        let mut sizes = [0; 3];
        for b in &self.blocks {
            sizes[BlockBuckets::bucket_of(b)] += 1;
        }
        sizes
    }

    /// All blocks named `block`, in palette order
    pub fn blocks_of_type(&self, block: &str) -> Arc<[BlockInfo]> {
        if let Ok(cache) = self.cache.read() {
            if let Some(hit) = cache.get(block) {
                return hit.clone();
            }
        }

        let found: Arc<[BlockInfo]> = self
            .blocks
            .iter()
            .filter(|b| b.state.is(block))
            .cloned()
            .collect();
        // A poisoned lock only costs us the memoization
        if let Ok(mut cache) = self.cache.write() {
            cache
                .entry(block.to_owned())
                .or_insert_with(|| found.clone());
        }
        found
    }

    /// Jigsaw connectors in this palette. Jigsaws whose payload can't be read are left out.
    pub fn jigsaws(&self) -> &[JigsawInfo] {
        self.jigsaws.get_or_init(|| {
            self.blocks_of_type(JIGSAW)
                .iter()
                .filter_map(|b| match JigsawInfo::from_block_info(b.clone()) {
                    Ok(j) => Some(j),
                    Err(e) => {
                        log::warn!("Skipping unreadable jigsaw at {}: {}", b.pos, e);
                        None
                    }
                })
                .collect()
        })
    }
}

impl Clone for Palette {
    fn clone(&self) -> Self {
        Self::new(self.blocks.clone())
    }
}

impl PartialEq for Palette {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}
