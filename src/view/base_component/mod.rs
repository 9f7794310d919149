use glam::IVec2;

use crate::text::TextService;
use crate::ui::{EventContext, EventKind, UiEvent};

mod core;
mod element;
mod layout;
mod tree;

pub use self::core::*;
pub use element::*;
pub(crate) use layout::align_offset;
pub use tree::*;

/// Inclusive on both edges of the laid-out box.
pub fn point_in_element(tree: &ElementTree, id: ElementId, point: IVec2) -> bool {
    tree.get(id)
        .is_some_and(|element| element.layout.rect().contains(point))
}

/// Roots to search for pointer input, topmost first. A point over the overlay
/// never reaches the root tree.
fn pointer_root(tree: &ElementTree, point: IVec2) -> ElementId {
    match tree.overlay() {
        Some(overlay) if point_in_element(tree, overlay, point) => overlay,
        _ => tree.root(),
    }
}

/// Element whose handler should receive a click at `point`.
///
/// The first element on the way down that accepts clicks wins, even when
/// deeper elements would accept it too. Later siblings are drawn on top and
/// are tried first.
pub fn hit_test(tree: &ElementTree, point: IVec2) -> Option<ElementId> {
    fn walk(tree: &ElementTree, id: ElementId, point: IVec2) -> Option<ElementId> {
        if !point_in_element(tree, id, point) {
            return None;
        }
        if tree.get(id)?.accepts(EventKind::Click) {
            return Some(id);
        }
        tree.children(id)
            .into_iter()
            .rev()
            .find_map(|child| walk(tree, child, point))
    }

    walk(tree, pointer_root(tree, point), point)
}

/// Deepest-first chain of elements containing `point`.
fn pointer_path(tree: &ElementTree, point: IVec2) -> Vec<ElementId> {
    let mut path = Vec::new();
    let mut current = pointer_root(tree, point);
    if !point_in_element(tree, current, point) {
        return path;
    }
    loop {
        path.push(current);
        let next = tree
            .children(current)
            .into_iter()
            .rev()
            .find(|child| point_in_element(tree, *child, point));
        match next {
            Some(child) => current = child,
            None => break,
        }
    }
    path.reverse();
    path
}

/// Outcome of [`route_scroll`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollRoute {
    /// Delta that hit a scroll bound and was not applied.
    pub remaining: IVec2,
    /// Element that took the delta on each axis, `[x, y]`.
    pub targets: [Option<ElementId>; 2],
}

/// Applies `delta` to the deepest element under `point` that scrolls on each
/// axis and has content beyond its box. Only that element moves; whatever
/// would overshoot its bound comes back in [`ScrollRoute::remaining`].
pub fn route_scroll(tree: &mut ElementTree, point: IVec2, delta: IVec2) -> ScrollRoute {
    let path = pointer_path(tree, point);
    let mut route = ScrollRoute {
        remaining: delta,
        targets: [None, None],
    };
    for axis in 0..2 {
        if delta[axis] == 0 {
            continue;
        }
        let target = path.iter().copied().find(|id| {
            tree.get(*id).is_some_and(|element| {
                element.overflow.scroll_axes().scrolls(axis) && element.layout.overflow()[axis] > 0
            })
        });
        let Some(target) = target else {
            continue;
        };
        let Some(element) = tree.get_mut(target) else {
            continue;
        };
        let bound = -element.layout.overflow()[axis];
        let current = element.layout.scroll_offset[axis];
        let next = (current + delta[axis]).clamp(bound, 0);
        element.layout.scroll_offset[axis] = next;
        route.remaining[axis] = delta[axis] - (next - current);
        route.targets[axis] = Some(target);
    }
    route
}

/// Delivers `event` to the handler of `target`. Returns whether the handler
/// accepted the event and reported a change.
pub fn dispatch_event(
    tree: &mut ElementTree,
    target: ElementId,
    event: UiEvent,
    text: &dyn TextService,
) -> bool {
    let Some(mut handler) = tree.get_mut(target).and_then(|element| element.handler.take()) else {
        return false;
    };
    let changed = handler.accepts(event.kind()) && {
        let mut cx = EventContext {
            tree: &mut *tree,
            target,
            text,
        };
        handler.handle(&event, &mut cx)
    };
    if let Some(element) = tree.get_mut(target)
        && element.handler.is_none()
    {
        element.handler = Some(handler);
    }
    changed
}
