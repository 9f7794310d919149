use super::{EventKind, UiEvent};
use crate::text::TextService;
use crate::view::base_component::{ElementId, ElementTree};

/// Everything a handler may touch while reacting to an event.
pub struct EventContext<'a> {
    pub tree: &'a mut ElementTree,
    /// Element the handler is attached to.
    pub target: ElementId,
    pub text: &'a dyn TextService,
}

/// Behaviour of one interactive widget kind.
pub trait ElementHandler {
    fn accepts(&self, kind: EventKind) -> bool;

    /// Returns whether the event changed anything.
    fn handle(&mut self, event: &UiEvent, cx: &mut EventContext<'_>) -> bool;
}
