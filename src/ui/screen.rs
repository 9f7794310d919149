use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::view::base_component::{ElementId, ElementTree};

/// Lazily built screens keyed by identifier, all living in one tree.
///
/// Showing a screen swaps it into a parent's child list; the previous screen
/// stays alive detached and is reattached as-is the next time it is shown.
#[derive(Debug)]
pub struct ScreenRegistry<K> {
    screens: FxHashMap<K, ElementId>,
}

impl<K: Eq + Hash> ScreenRegistry<K> {
    pub fn new() -> Self {
        Self {
            screens: FxHashMap::default(),
        }
    }

    pub fn get(&self, key: &K) -> Option<ElementId> {
        self.screens.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Makes the screen for `key` the only child of `parent`, building it with
    /// `build` on first use. `build` must return a detached subtree root.
    pub fn show(
        &mut self,
        tree: &mut ElementTree,
        parent: ElementId,
        key: K,
        build: impl FnOnce(&mut ElementTree) -> ElementId,
    ) -> Option<ElementId> {
        let screen = match self.screens.get(&key) {
            Some(screen) => *screen,
            None => {
                let screen = build(tree);
                self.screens.insert(key, screen);
                screen
            }
        };
        tree.detach(screen);
        tree.replace_children(parent, &[screen]).then_some(screen)
    }
}

impl<K: Eq + Hash> Default for ScreenRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ScreenRegistry;
    use crate::view::base_component::ElementTree;

    #[test]
    fn screens_are_built_once_and_swapped_in() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let mut screens = ScreenRegistry::new();
        let mut builds = 0;

        let home = screens
            .show(&mut tree, root, "home", |tree| {
                builds += 1;
                tree.new_element()
            })
            .expect("home");
        let settings = screens
            .show(&mut tree, root, "settings", |tree| {
                builds += 1;
                tree.new_element()
            })
            .expect("settings");
        assert_eq!(tree.children(root), vec![settings]);
        assert_eq!(tree.parent_of(home), None);

        let again = screens
            .show(&mut tree, root, "home", |tree| {
                builds += 1;
                tree.new_element()
            })
            .expect("home again");
        assert_eq!(again, home);
        assert_eq!(builds, 2);
        assert_eq!(tree.children(root), vec![home]);
        assert_eq!(screens.len(), 2);
    }
}
