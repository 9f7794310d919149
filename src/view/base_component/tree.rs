use std::sync::OnceLock;

use glam::IVec2;

use super::{Element, ElementId};
use crate::memory::{Arena, CHILD_INDEX_WIDTH, IndexedCollection};

/// Two-finger scroll state accumulated between frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollGesture {
    pub active: bool,
    pub last: IVec2,
    /// Point the pending delta is routed from.
    pub anchor: IVec2,
    pub pending: IVec2,
}

impl ScrollGesture {
    pub fn accumulate(&mut self, anchor: IVec2, delta: IVec2) {
        self.anchor = anchor;
        self.pending += delta;
    }

    pub fn take_pending(&mut self) -> Option<(IVec2, IVec2)> {
        let delta = std::mem::take(&mut self.pending);
        (delta != IVec2::ZERO).then_some((self.anchor, delta))
    }
}

/// Owner of every element: a root tree, an optional overlay tree drawn on top,
/// focus and scroll-gesture state.
///
/// Child lists live in the tree's arena. Elements live in an append-only pool
/// and are addressed by [`ElementId`]; nothing is ever freed before the tree.
pub struct ElementTree {
    pub(crate) arena: Arena,
    pub(crate) nodes: Vec<Element>,
    root: ElementId,
    overlay: Option<ElementId>,
    active: Option<ElementId>,
    pub gesture: ScrollGesture,
    pub(crate) trace_layout: bool,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::with_arena(Arena::default())
    }

    pub fn with_arena(arena: Arena) -> Self {
        Self {
            arena,
            nodes: vec![Element::default()],
            root: ElementId(0),
            overlay: None,
            active: None,
            gesture: ScrollGesture::default(),
            trace_layout: trace_layout_enabled(),
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn overlay(&self) -> Option<ElementId> {
        self.overlay
    }

    /// Shows `overlay` above the root tree, or removes the current one.
    pub fn set_overlay(&mut self, overlay: Option<ElementId>) {
        if let Some(id) = overlay {
            self.detach(id);
        }
        self.overlay = overlay.filter(|id| self.contains(*id) && *id != self.root);
    }

    pub fn active(&self) -> Option<ElementId> {
        self.active
    }

    /// Moves focus. Both the previously and the newly active element repaint.
    pub fn set_active(&mut self, active: Option<ElementId>) {
        if self.active == active {
            return;
        }
        for id in [self.active, active].into_iter().flatten() {
            if let Some(element) = self.get_mut(id) {
                element.mark_changed();
            }
        }
        self.active = active;
    }

    /// Forces every element to repaint on the next frame.
    pub fn mark_all_changed(&mut self) {
        for element in &mut self.nodes {
            element.mark_changed();
        }
    }

    pub fn set_trace_layout(&mut self, enabled: bool) {
        self.trace_layout = enabled;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.nodes.get_mut(id.index())
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Creates a detached element with default fields.
    pub fn new_element(&mut self) -> ElementId {
        let id = ElementId(self.nodes.len() as u32);
        self.nodes.push(Element::default());
        id
    }

    /// Creates a default element as the last child of `parent`. Returns `None`
    /// when `parent` is unknown, holds content, or its child list cannot grow.
    pub fn append_child(&mut self, parent: ElementId) -> Option<ElementId> {
        if !self.accepts_children(parent) {
            return None;
        }
        let child = self.new_element();
        self.push_child(parent, child)?;
        Some(child)
    }

    /// Appends an existing detached subtree. Rejects elements that already have
    /// a parent, the root, the overlay, and anything that would close a cycle.
    pub fn attach_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        if !self.contains(child) || !self.accepts_children(parent) {
            return false;
        }
        if child == self.root
            || Some(child) == self.overlay
            || self.parent_of(child).is_some()
            || self.is_ancestor(child, parent)
        {
            log::debug!("[tree] rejected attach {child:?} -> {parent:?}");
            return false;
        }
        self.push_child(parent, child).is_some()
    }

    /// Removes `id` from its parent's child list. The subtree stays intact.
    pub fn detach(&mut self, id: ElementId) -> bool {
        let Some(parent) = self.parent_of(id) else {
            return false;
        };
        let siblings: Vec<ElementId> = self
            .children(parent)
            .into_iter()
            .filter(|child| *child != id)
            .collect();
        self.write_children(parent, &siblings)
    }

    /// Overwrites `parent`'s child list in place. Every new child must be
    /// detached (or already a child of `parent`); otherwise nothing changes.
    pub fn replace_children(&mut self, parent: ElementId, children: &[ElementId]) -> bool {
        if !self.accepts_children(parent) {
            return false;
        }
        let current = self.children(parent);
        for (i, child) in children.iter().enumerate() {
            let duplicate = children[..i].contains(child);
            let attached_elsewhere = !current.contains(child) && self.parent_of(*child).is_some();
            if !self.contains(*child)
                || duplicate
                || attached_elsewhere
                || *child == self.root
                || Some(*child) == self.overlay
                || self.is_ancestor(*child, parent)
            {
                log::debug!("[tree] rejected child list for {parent:?}");
                return false;
            }
        }
        self.write_children(parent, children)
    }

    pub fn child_count(&self, parent: ElementId) -> usize {
        self.get(parent)
            .and_then(|element| element.children.as_ref())
            .map_or(0, IndexedCollection::len)
    }

    pub fn child_at(&self, parent: ElementId, index: usize) -> Option<ElementId> {
        self.get(parent)?.children.as_ref()?.get(&self.arena, index)
    }

    pub fn children(&self, parent: ElementId) -> Vec<ElementId> {
        match self.get(parent).and_then(|element| element.children.as_ref()) {
            Some(list) => list.iter(&self.arena).collect(),
            None => Vec::new(),
        }
    }

    /// Depth-first pre-order search below and including `from`.
    pub fn find_by_tag(&self, from: ElementId, tag: u32) -> Option<ElementId> {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let element = self.get(id)?;
            if element.tag == tag {
                return Some(id);
            }
            stack.extend(self.children(id).into_iter().rev());
        }
        None
    }

    /// Direct parent of `target` within the subtree rooted at `from`.
    pub fn find_parent(&self, from: ElementId, target: ElementId) -> Option<ElementId> {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let children = self.children(id);
            if children.contains(&target) {
                return Some(id);
            }
            stack.extend(children.into_iter().rev());
        }
        None
    }

    /// Parent of `target` in either the root or the overlay tree.
    pub fn parent_of(&self, target: ElementId) -> Option<ElementId> {
        self.find_parent(self.root, target)
            .or_else(|| self.overlay.and_then(|overlay| self.find_parent(overlay, target)))
            .or_else(|| self.detached_parent(target))
    }

    fn detached_parent(&self, target: ElementId) -> Option<ElementId> {
        // Subtrees that are built but not shown still own their children.
        (0..self.nodes.len() as u32)
            .map(ElementId)
            .find(|id| self.children(*id).contains(&target))
    }

    fn is_ancestor(&self, ancestor: ElementId, of: ElementId) -> bool {
        ancestor == of || self.find_parent(ancestor, of).is_some()
    }

    fn accepts_children(&self, parent: ElementId) -> bool {
        self.get(parent)
            .is_some_and(|element| element.content.is_none())
    }

    fn push_child(&mut self, parent: ElementId, child: ElementId) -> Option<usize> {
        let arena = &mut self.arena;
        let element = self.nodes.get_mut(parent.index())?;
        if element.children.is_none() {
            element.children = IndexedCollection::with_width(arena, CHILD_INDEX_WIDTH);
        }
        let index = element.children.as_mut()?.append(arena, child)?;
        element.render.changed = true;
        Some(index)
    }

    pub(crate) fn write_children(&mut self, parent: ElementId, children: &[ElementId]) -> bool {
        let arena = &mut self.arena;
        let Some(element) = self.nodes.get_mut(parent.index()) else {
            return false;
        };
        if element.children.is_none() {
            if children.is_empty() {
                return true;
            }
            element.children = IndexedCollection::with_width(arena, CHILD_INDEX_WIDTH);
        }
        let Some(list) = element.children.as_mut() else {
            return false;
        };
        list.clear();
        let mut complete = true;
        for child in children {
            complete &= list.append(arena, *child).is_some();
        }
        element.render.changed = true;
        complete
    }
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn trace_layout_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("RFCORE_TRACE_LAYOUT").is_ok())
}
