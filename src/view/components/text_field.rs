use crate::style::{Color, Edges, Paint};
use crate::text::TextInput;
use crate::ui::{ElementHandler, EventContext, EventKind, Key, UiEvent};
use crate::view::base_component::{ElementId, ElementTree};

/// Focus, click-to-position and key forwarding for an input element. The
/// editing itself belongs to the element's [`TextInput`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TextField;

impl ElementHandler for TextField {
    fn accepts(&self, _kind: EventKind) -> bool {
        true
    }

    fn handle(&mut self, event: &UiEvent, cx: &mut EventContext<'_>) -> bool {
        let target = cx.target;
        match *event {
            UiEvent::Click { point } => {
                cx.tree.set_active(Some(target));
                if let Some(index) = cx.tree.input_index_at(target, point, cx.text)
                    && let Some(input) = cx.tree.get_mut(target).and_then(|e| e.input_mut())
                {
                    input.set_selection(index, index);
                }
                true
            }
            UiEvent::KeyPress(press) if press.key == Key::Escape => {
                cx.tree.set_active(None);
                true
            }
            UiEvent::KeyPress(press) => cx
                .tree
                .get_mut(target)
                .and_then(|element| element.input_mut())
                .is_some_and(|input| input.key_press(press)),
            UiEvent::Blur => {
                let Some(input) = cx.tree.get_mut(target).and_then(|e| e.input_mut()) else {
                    return false;
                };
                let (_, caret) = input.selection();
                input.set_selection(caret, caret);
                true
            }
        }
    }
}

/// Appends a bordered text field editing `input` under `parent`.
pub fn build_text_field(
    tree: &mut ElementTree,
    parent: ElementId,
    input: Box<dyn TextInput>,
    width: i32,
) -> Option<ElementId> {
    let id = tree.append_child(parent)?;
    let field = tree.get_mut(id)?;
    field.set_width(width);
    field.set_padding(Edges::symmetric(8, 6));
    field.set_border(Edges::all(1), Color::rgb(0xBD, 0xBD, 0xBD));
    field.set_corner_radius(4);
    field.set_paint(Paint::Solid(Color::WHITE));
    field.set_input(input);
    field.set_handler(TextField);
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::build_text_field;
    use crate::style::Overflow;
    use crate::text::{MonoText, TextBuffer};
    use crate::ui::{Key, KeyPress, UiEvent};
    use crate::view::base_component::{ElementTree, dispatch_event};
    use glam::IVec2;

    fn field(text: &str) -> (ElementTree, crate::view::base_component::ElementId) {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let column = tree.append_child(root).expect("column");
        tree.get_mut(column).expect("column").set_overflow(Overflow::ScrollY);
        let field = build_text_field(&mut tree, column, Box::new(TextBuffer::new(text)), 200)
            .expect("field");
        (tree, field)
    }

    fn selection(tree: &ElementTree, id: crate::view::base_component::ElementId) -> (usize, usize) {
        tree.get(id).expect("field").input().expect("input").selection()
    }

    #[test]
    fn click_focuses_and_places_the_caret() {
        let (mut tree, field) = field("hello");
        let text = MonoText::new(10, 20);
        tree.layout(IVec2::new(300, 300), &text);
        // content starts after a 1px border and 8px padding
        let point = IVec2::new(9 + 21, 10);
        assert!(dispatch_event(&mut tree, field, UiEvent::Click { point }, &text));
        assert_eq!(tree.active(), Some(field));
        assert_eq!(selection(&tree, field), (2, 2));
    }

    #[test]
    fn key_presses_edit_the_input() {
        let (mut tree, field) = field("ab");
        let text = MonoText::new(10, 20);
        let typed = dispatch_event(
            &mut tree,
            field,
            UiEvent::KeyPress(KeyPress::new(Key::Char('c'))),
            &text,
        );
        assert!(typed);
        assert_eq!(tree.get(field).expect("field").text(), Some("abc"));

        tree.set_active(Some(field));
        dispatch_event(&mut tree, field, UiEvent::KeyPress(KeyPress::new(Key::Escape)), &text);
        assert_eq!(tree.active(), None);
    }

    #[test]
    fn blur_collapses_the_selection_onto_the_caret() {
        let (mut tree, field) = field("hello");
        tree.get_mut(field)
            .expect("field")
            .input_mut()
            .expect("input")
            .set_selection(0, 4);
        let text = MonoText::new(10, 20);
        assert!(dispatch_event(&mut tree, field, UiEvent::Blur, &text));
        assert_eq!(selection(&tree, field), (4, 4));
    }
}
