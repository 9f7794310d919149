use std::marker::PhantomData;

use bytemuck::Pod;

use super::{Arena, ArenaRef};

pub const DEFAULT_INDEX_WIDTH: usize = 16;
/// Child lists fan out less than general tables.
pub const CHILD_INDEX_WIDTH: usize = 4;

const WORD: usize = std::mem::size_of::<u64>();

/// Growable arena-resident sequence addressed through a digit tree.
///
/// Every node of the tree is `width + 1` packed [`ArenaRef`] words: slot 0 is
/// the leaf of the index that ends at this node, slots `1..=width` are the
/// children for the next base-`width` digit (least significant digit first).
/// Leaves are never moved once allocated, so a pop followed by an append
/// writes into the slot that was truncated.
#[derive(Debug)]
pub struct IndexedCollection<T: Pod> {
    width: usize,
    len: usize,
    capacity: usize,
    root: ArenaRef,
    _item: PhantomData<T>,
}

impl<T: Pod> IndexedCollection<T> {
    pub fn new(arena: &mut Arena) -> Option<Self> {
        Self::with_width(arena, DEFAULT_INDEX_WIDTH)
    }

    pub fn with_width(arena: &mut Arena, width: usize) -> Option<Self> {
        let width = width.max(2);
        let root = arena.fill((width + 1) * WORD)?;
        Some(Self {
            width,
            len: 0,
            capacity: 0,
            root,
            _item: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn index_width(&self) -> usize {
        self.width
    }

    /// Index of the last item, `None` when empty.
    pub fn last(&self) -> Option<usize> {
        self.len.checked_sub(1)
    }

    /// Appends `item` and returns its index. Returns `None` and drops the write
    /// when the arena cannot hold the new leaf.
    pub fn append(&mut self, arena: &mut Arena, item: T) -> Option<usize> {
        let index = self.len;
        if index < self.capacity {
            let leaf = self.leaf(arena, index)?;
            arena.write(leaf, &item);
            self.len += 1;
            return Some(index);
        }

        let Some(node) = self.node_or_create(arena, index) else {
            log::warn!("[collection] dropped append at index {index}: arena exhausted");
            return None;
        };
        let Some(leaf) = arena.alloc(&item) else {
            log::warn!("[collection] dropped append at index {index}: arena exhausted");
            return None;
        };
        arena.write(node, &leaf.pack());
        self.len += 1;
        self.capacity += 1;
        Some(index)
    }

    pub fn get(&self, arena: &Arena, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        arena.read(self.leaf(arena, index)?)
    }

    pub fn set(&self, arena: &mut Arena, index: usize, item: T) -> bool {
        if index >= self.len {
            return false;
        }
        match self.leaf(arena, index) {
            Some(leaf) => arena.write(leaf, &item),
            None => false,
        }
    }

    /// Shrinks by one and returns the item that fell out of range. The leaf
    /// keeps its storage for the next append.
    pub fn pop(&mut self, arena: &Arena) -> Option<T> {
        let index = self.last()?;
        self.len = index;
        arena.read(self.leaf(arena, index)?)
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    pub fn iter<'a>(&'a self, arena: &'a Arena) -> impl Iterator<Item = T> + 'a {
        (0..self.len).filter_map(move |index| self.get(arena, index))
    }

    pub fn position(&self, arena: &Arena, mut predicate: impl FnMut(T) -> bool) -> Option<usize> {
        (0..self.len).find(|&index| self.get(arena, index).is_some_and(&mut predicate))
    }

    fn slot(&self, arena: &Arena, node: ArenaRef, slot: usize) -> Option<ArenaRef> {
        ArenaRef::unpack(arena.read::<u64>(node.byte_add(slot * WORD))?)
    }

    fn leaf(&self, arena: &Arena, index: usize) -> Option<ArenaRef> {
        let mut node = self.root;
        let mut rest = index;
        while rest > 0 {
            let digit = rest % self.width;
            rest /= self.width;
            node = self.slot(arena, node, digit + 1)?;
        }
        self.slot(arena, node, 0)
    }

    /// Walks the digit path of `index`, creating missing nodes, and returns the
    /// address of the leaf word of the final node.
    fn node_or_create(&self, arena: &mut Arena, index: usize) -> Option<ArenaRef> {
        let mut node = self.root;
        let mut rest = index;
        while rest > 0 {
            let digit = rest % self.width;
            rest /= self.width;
            let child_word = node.byte_add((digit + 1) * WORD);
            node = match ArenaRef::unpack(arena.read::<u64>(child_word)?) {
                Some(child) => child,
                None => {
                    let child = arena.fill((self.width + 1) * WORD)?;
                    arena.write(child_word, &child.pack());
                    child
                }
            };
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::{CHILD_INDEX_WIDTH, IndexedCollection};
    use crate::memory::Arena;

    #[test]
    fn append_then_get_returns_last_value() {
        let mut arena = Arena::open(1024);
        let mut list = IndexedCollection::<u32>::with_width(&mut arena, CHILD_INDEX_WIDTH)
            .expect("collection");
        for value in 0..100u32 {
            let index = list.append(&mut arena, value * 3).expect("append");
            assert_eq!(index, value as usize);
            assert_eq!(list.get(&arena, list.len() - 1), Some(value * 3));
        }
        for value in 0..100u32 {
            assert_eq!(list.get(&arena, value as usize), Some(value * 3));
        }
    }

    #[test]
    fn length_tracks_appends_minus_pops() {
        let mut arena = Arena::open(1024);
        let mut list = IndexedCollection::<u64>::new(&mut arena).expect("collection");
        for value in 0..40 {
            list.append(&mut arena, value);
        }
        for expected in (30..40).rev() {
            assert_eq!(list.pop(&arena), Some(expected));
        }
        assert_eq!(list.len(), 30);
        assert_eq!(list.capacity(), 40);
        assert_eq!(list.last(), Some(29));
    }

    #[test]
    fn out_of_range_access_is_a_no_op() {
        let mut arena = Arena::open(1024);
        let mut list = IndexedCollection::<u32>::new(&mut arena).expect("collection");
        assert_eq!(list.get(&arena, 0), None);
        assert!(!list.set(&mut arena, 0, 1));
        assert_eq!(list.pop(&arena), None);
        assert_eq!(list.last(), None);

        list.append(&mut arena, 7);
        assert_eq!(list.get(&arena, 1), None);
        assert!(!list.set(&mut arena, 5, 1));
        assert!(list.set(&mut arena, 0, 8));
        assert_eq!(list.get(&arena, 0), Some(8));
    }

    #[test]
    fn append_after_pop_reuses_truncated_leaf() {
        let mut arena = Arena::open(1024);
        let mut list = IndexedCollection::<u32>::new(&mut arena).expect("collection");
        for value in 0..20 {
            list.append(&mut arena, value);
        }
        let used = arena.used_bytes();
        list.pop(&arena);
        list.pop(&arena);
        list.append(&mut arena, 100);
        list.append(&mut arena, 101);
        assert_eq!(arena.used_bytes(), used);
        assert_eq!(list.get(&arena, 18), Some(100));
        assert_eq!(list.get(&arena, 19), Some(101));

        list.clear();
        assert!(list.is_empty());
        list.append(&mut arena, 5);
        assert_eq!(arena.used_bytes(), used);
        assert_eq!(list.get(&arena, 0), Some(5));
    }

    #[test]
    fn digit_paths_do_not_collide_across_widths() {
        let mut arena = Arena::open(256);
        for width in [2, 3, 4, 16] {
            let mut list =
                IndexedCollection::<u32>::with_width(&mut arena, width).expect("collection");
            for value in 0..300u32 {
                list.append(&mut arena, value);
            }
            let collected: Vec<u32> = list.iter(&arena).collect();
            assert_eq!(collected, (0..300).collect::<Vec<_>>());
        }
    }

    #[test]
    fn large_items_stay_readable_across_block_growth() {
        let mut arena = Arena::open(256);
        let mut list = IndexedCollection::<[u8; 4096]>::new(&mut arena).expect("collection");
        for value in 0..8u8 {
            list.append(&mut arena, [value; 4096]).expect("append");
        }
        assert!(arena.block_count() > 1);
        for value in 0..8u8 {
            let item = list.get(&arena, value as usize).expect("item");
            assert!(item.iter().all(|byte| *byte == value));
        }
    }
}
