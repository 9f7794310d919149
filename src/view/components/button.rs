use crate::style::{Color, Edges, FlexAxis, Paint, TextAlign};
use crate::ui::{ElementHandler, EventContext, EventKind, UiEvent};
use crate::view::base_component::{ElementId, ElementTree};

const PRIMARY: Color = Color::rgb(0x19, 0x76, 0xD2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonVariant {
    Contained,
    Outlined,
}

pub struct ButtonProps {
    pub label: String,
    pub width: i32,
    pub height: i32,
    pub variant: ButtonVariant,
}

impl ButtonProps {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            width: 124,
            height: 36,
            variant: ButtonVariant::Contained,
        }
    }
}

/// Runs its action on every click.
pub struct Button {
    action: Box<dyn FnMut(&mut EventContext<'_>)>,
}

impl Button {
    pub fn new(action: impl FnMut(&mut EventContext<'_>) + 'static) -> Self {
        Self {
            action: Box::new(action),
        }
    }
}

impl ElementHandler for Button {
    fn accepts(&self, kind: EventKind) -> bool {
        kind == EventKind::Click
    }

    fn handle(&mut self, event: &UiEvent, cx: &mut EventContext<'_>) -> bool {
        if event.kind() != EventKind::Click {
            return false;
        }
        (self.action)(cx);
        true
    }
}

/// Appends a labelled button under `parent`. The label is a plain text child,
/// so clicks on it still land on the button.
pub fn build_button(
    tree: &mut ElementTree,
    parent: ElementId,
    props: ButtonProps,
    action: impl FnMut(&mut EventContext<'_>) + 'static,
) -> Option<ElementId> {
    let id = tree.append_child(parent)?;
    let label = tree.append_child(id)?;
    let (background, foreground) = match props.variant {
        ButtonVariant::Contained => (PRIMARY, Color::WHITE),
        ButtonVariant::Outlined => (Color::TRANSPARENT, PRIMARY),
    };

    let root = tree.get_mut(id)?;
    root.set_size(props.width, props.height);
    root.set_direction(FlexAxis::Vertical);
    root.set_padding(Edges::symmetric(16, 9));
    root.set_corner_radius(8);
    root.set_border(Edges::all(1), PRIMARY);
    if background.alpha() > 0 {
        root.set_paint(Paint::Solid(background));
    }
    root.set_handler(Button::new(action));

    let text = tree.get_mut(label)?;
    text.set_text(props.label);
    text.set_text_align(TextAlign::Center);
    text.set_text_color(foreground);
    Some(id)
}
