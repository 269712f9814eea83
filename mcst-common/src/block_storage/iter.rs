use super::{BlockState, BlockStorage, Position};

/// Every cell of a [BlockStorage] with its state, x fastest, then z, then y
pub struct Blocks<'a> {
    storage: &'a BlockStorage,
    cells: std::iter::Enumerate<std::slice::Iter<'a, u32>>,
}

impl<'a> Blocks<'a> {
    pub(super) fn new(storage: &'a BlockStorage) -> Self {
        Self {
            storage,
            cells: storage.blocks.iter().enumerate(),
        }
    }

    fn position_of(&self, flat: usize) -> Position {
        let flat = flat as u32;
        let [sx, sy, sz] = self.storage.extents;
        Position::new(
            (flat % sx) as i32,
            ((flat / self.storage.ysi) % sy) as i32,
            ((flat / self.storage.zsi) % sz) as i32,
        )
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = (Position, &'a BlockState);

    fn next(&mut self) -> Option<Self::Item> {
        let (flat, &state) = self.cells.next()?;
        let storage = self.storage;
        Some((self.position_of(flat), &storage.palette[state as usize]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cells.size_hint()
    }
}

impl<'a> ExactSizeIterator for Blocks<'a> {}
