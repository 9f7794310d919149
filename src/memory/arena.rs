use bytemuck::Pod;

const MIN_BLOCK_SIZE: usize = 256;
/// Hard cap for one block, and therefore for the largest single allocation.
pub const MAX_BLOCK_SIZE: usize = 1 << 22;

/// Pointer-stable handle to memory handed out by [`Arena::fill`].
///
/// A handle stays valid until the arena is reset or closed; growing the arena
/// appends blocks and never moves existing ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArenaRef {
    block: u32,
    offset: u32,
}

impl ArenaRef {
    pub(crate) fn byte_add(self, bytes: usize) -> Self {
        Self {
            block: self.block,
            offset: self.offset + bytes as u32,
        }
    }

    /// Packs the handle into a non-zero word so `0` can mean "absent" inside
    /// arena-resident tables.
    pub(crate) fn pack(self) -> u64 {
        ((self.block as u64 + 1) << 32) | self.offset as u64
    }

    pub(crate) fn unpack(word: u64) -> Option<Self> {
        let block = (word >> 32) as u32;
        if block == 0 {
            return None;
        }
        Some(Self {
            block: block - 1,
            offset: word as u32,
        })
    }
}

struct Block {
    // u64 backing keeps every 8-byte offset naturally aligned.
    words: Vec<u64>,
    cursor: usize,
}

impl Block {
    fn new(size: usize) -> Self {
        Self {
            words: vec![0; size.div_ceil(8)],
            cursor: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.words.len() * 8
    }

    fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.words)
    }
}

/// Bump allocator made of a chain of blocks that are only ever freed together.
pub struct Arena {
    blocks: Vec<Block>,
    current: usize,
}

impl Arena {
    pub fn open(initial_size: usize) -> Self {
        let size = initial_size.clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE);
        Self {
            blocks: vec![Block::new(size)],
            current: 0,
        }
    }

    /// Reserves `size` zeroed bytes. Returns `None` for empty requests and for
    /// requests larger than [`MAX_BLOCK_SIZE`].
    pub fn fill(&mut self, size: usize) -> Option<ArenaRef> {
        if size == 0 || size > MAX_BLOCK_SIZE {
            return None;
        }
        let align = if size > 4 { 8 } else { 4 };
        loop {
            let block_count = self.blocks.len();
            let block = &mut self.blocks[self.current];
            let start = block.cursor.next_multiple_of(align);
            if start + size <= block.capacity() {
                block.cursor = start + size;
                block.bytes_mut()[start..start + size].fill(0);
                return Some(ArenaRef {
                    block: self.current as u32,
                    offset: start as u32,
                });
            }
            let capacity = block.capacity();

            // A reset chain keeps its blocks; walk them before growing.
            if self.current + 1 < block_count {
                self.current += 1;
                continue;
            }
            let next_size = (capacity * 2).min(MAX_BLOCK_SIZE).max(size);
            log::trace!(
                "[arena] grow block={} size={}",
                self.blocks.len(),
                next_size
            );
            self.blocks.push(Block::new(next_size));
            self.current = self.blocks.len() - 1;
        }
    }

    /// Rewinds every block cursor without releasing memory. Every handle issued
    /// before the reset is invalidated logically (its bytes get reused).
    pub fn reset(&mut self) {
        for block in &mut self.blocks {
            block.cursor = 0;
        }
        self.current = 0;
    }

    /// Frees the whole chain.
    pub fn close(self) {
        drop(self);
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn used_bytes(&self) -> usize {
        self.blocks.iter().map(|block| block.cursor).sum()
    }

    pub fn bytes(&self, at: ArenaRef, len: usize) -> Option<&[u8]> {
        let block = self.blocks.get(at.block as usize)?;
        let start = at.offset as usize;
        block.bytes().get(start..start.checked_add(len)?)
    }

    pub fn bytes_mut(&mut self, at: ArenaRef, len: usize) -> Option<&mut [u8]> {
        let block = self.blocks.get_mut(at.block as usize)?;
        let start = at.offset as usize;
        block.bytes_mut().get_mut(start..start.checked_add(len)?)
    }

    pub fn read<T: Pod>(&self, at: ArenaRef) -> Option<T> {
        let bytes = self.bytes(at, std::mem::size_of::<T>())?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    pub fn write<T: Pod>(&mut self, at: ArenaRef, value: &T) -> bool {
        let Some(bytes) = self.bytes_mut(at, std::mem::size_of::<T>()) else {
            return false;
        };
        bytes.copy_from_slice(bytemuck::bytes_of(value));
        true
    }

    pub fn alloc<T: Pod>(&mut self, value: &T) -> Option<ArenaRef> {
        let at = self.fill(std::mem::size_of::<T>())?;
        self.write(at, value);
        Some(at)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::open(64 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::{Arena, ArenaRef, MAX_BLOCK_SIZE};

    #[test]
    fn fill_rejects_empty_and_oversized_requests() {
        let mut arena = Arena::open(1024);
        assert!(arena.fill(0).is_none());
        assert!(arena.fill(MAX_BLOCK_SIZE + 1).is_none());
        assert!(arena.fill(MAX_BLOCK_SIZE).is_some());
    }

    #[test]
    fn small_requests_align_to_four_and_large_to_eight() {
        let mut arena = Arena::open(1024);
        let a = arena.fill(1).expect("a");
        let b = arena.fill(3).expect("b");
        let c = arena.fill(5).expect("c");
        assert_eq!(a.offset, 0);
        assert_eq!(b.offset, 4);
        assert_eq!(c.offset, 8);
        let d = arena.fill(2).expect("d");
        assert_eq!(d.offset, 16);
        let e = arena.fill(12).expect("e");
        assert_eq!(e.offset, 24);
    }

    #[test]
    fn full_block_appends_a_doubled_block() {
        let mut arena = Arena::open(256);
        for _ in 0..32 {
            arena.fill(8).expect("fits in first block");
        }
        assert_eq!(arena.block_count(), 1);
        let spill = arena.fill(8).expect("spills");
        assert_eq!(spill.block, 1);
        assert_eq!(arena.block_count(), 2);
        assert_eq!(arena.blocks[1].capacity(), 512);
    }

    #[test]
    fn earlier_handles_survive_growth() {
        let mut arena = Arena::open(256);
        let first = arena.alloc(&0xdead_beef_u32).expect("first");
        for i in 0..200u64 {
            arena.alloc(&i).expect("grow");
        }
        assert!(arena.block_count() > 1);
        assert_eq!(arena.read::<u32>(first), Some(0xdead_beef));
    }

    #[test]
    fn reset_rewinds_without_freeing_blocks() {
        let mut arena = Arena::open(256);
        for _ in 0..100 {
            arena.fill(8).expect("fill");
        }
        let blocks = arena.block_count();
        arena.reset();
        assert_eq!(arena.used_bytes(), 0);
        let again = arena.fill(8).expect("reuse");
        assert_eq!(again.block, 0);
        assert_eq!(again.offset, 0);
        assert_eq!(arena.block_count(), blocks);
    }

    #[test]
    fn fill_hands_out_zeroed_memory_after_reset() {
        let mut arena = Arena::open(256);
        let at = arena.alloc(&u64::MAX).expect("alloc");
        arena.reset();
        let reused = arena.fill(8).expect("fill");
        assert_eq!(reused, at);
        assert_eq!(arena.read::<u64>(reused), Some(0));
    }

    #[test]
    fn packed_refs_round_trip_and_zero_means_absent() {
        let at = ArenaRef { block: 3, offset: 40 };
        assert_eq!(ArenaRef::unpack(at.pack()), Some(at));
        assert_eq!(ArenaRef::unpack(0), None);
    }
}
