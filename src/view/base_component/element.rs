use bytemuck::{Pod, Zeroable};
use glam::IVec2;
use smol_str::SmolStr;

use super::{LayoutState, RenderCache};
use crate::memory::IndexedCollection;
use crate::style::{Color, Edges, FlexAxis, FontVariant, Overflow, Paint, TextAlign};
use crate::text::{LineSpan, TextInput};
use crate::ui::{ElementHandler, EventKind};

/// Stable handle of an element inside its [`ElementTree`](super::ElementTree).
///
/// Elements are never freed individually, so a handle stays valid for the
/// lifetime of the tree that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What an element shows instead of children.
#[derive(Default)]
pub enum Content {
    #[default]
    None,
    Text(SmolStr),
    /// Editable text. Layout turns it into one generated text child per
    /// display line.
    Input(Box<dyn TextInput>),
}

impl Content {
    pub fn is_none(&self) -> bool {
        matches!(self, Content::None)
    }
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Content::None => f.write_str("None"),
            Content::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Content::Input(input) => f.debug_tuple("Input").field(&input.text()).finish(),
        }
    }
}

/// Caret and selection of one generated input line, in characters relative
/// to the line start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) struct LineHighlight {
    pub caret: Option<u32>,
    pub selection: Option<(u32, u32)>,
}

/// Line split of an input element from the last layout pass.
pub(crate) struct InputCache {
    pub revision: u64,
    pub width: i32,
    pub selection: (usize, usize),
    pub active: bool,
    pub style: (FontVariant, Color, TextAlign),
    pub lines: IndexedCollection<LineSpan>,
    /// Generated line elements not currently attached, reused first.
    pub spare: Vec<ElementId>,
}

/// The single node type of the tree: box model, paint intent, content and
/// behaviour. Layout and render state are owned by the engine.
pub struct Element {
    pub(crate) tag: u32,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) min_width: i32,
    pub(crate) min_height: i32,
    pub(crate) padding: Edges,
    pub(crate) border: Edges,
    pub(crate) corner_radius: i32,
    pub(crate) paint: Paint,
    pub(crate) border_color: Color,
    pub(crate) text_color: Color,
    pub(crate) content: Content,
    pub(crate) direction: FlexAxis,
    pub(crate) gutter: i32,
    pub(crate) overflow: Overflow,
    pub(crate) text_align: TextAlign,
    pub(crate) font: FontVariant,
    pub(crate) handler: Option<Box<dyn ElementHandler>>,
    pub(crate) children: Option<IndexedCollection<ElementId>>,
    pub(crate) layout: LayoutState,
    pub(crate) render: RenderCache,
    pub(crate) input_cache: Option<InputCache>,
    pub(crate) highlight: Option<LineHighlight>,
}

impl Default for Element {
    fn default() -> Self {
        Self {
            tag: 0,
            width: 0,
            height: 0,
            min_width: 0,
            min_height: 0,
            padding: Edges::ZERO,
            border: Edges::ZERO,
            corner_radius: 0,
            paint: Paint::None,
            border_color: Color::TRANSPARENT,
            text_color: Color::BLACK,
            content: Content::None,
            direction: FlexAxis::Vertical,
            gutter: 0,
            overflow: Overflow::Clip,
            text_align: TextAlign::Left,
            font: FontVariant::Regular,
            handler: None,
            children: None,
            layout: LayoutState::default(),
            render: RenderCache::default(),
            input_cache: None,
            highlight: None,
        }
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("size", &(self.width, self.height))
            .field("content", &self.content)
            .field("layout", &self.layout)
            .field("changed", &self.render.changed)
            .finish_non_exhaustive()
    }
}

impl Element {
    fn touch(&mut self) {
        self.render.changed = true;
    }

    pub fn tag(&self) -> u32 {
        self.tag
    }

    pub fn set_tag(&mut self, tag: u32) {
        self.tag = tag;
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// `0` means flexible on that axis. Negative values are treated as `0`.
    pub fn set_size(&mut self, width: i32, height: i32) {
        self.width = width.max(0);
        self.height = height.max(0);
        self.touch();
    }

    pub fn set_width(&mut self, width: i32) {
        self.width = width.max(0);
        self.touch();
    }

    pub fn set_height(&mut self, height: i32) {
        self.height = height.max(0);
        self.touch();
    }

    pub fn set_min_size(&mut self, width: i32, height: i32) {
        self.min_width = width.max(0);
        self.min_height = height.max(0);
        self.touch();
    }

    pub fn padding(&self) -> Edges {
        self.padding
    }

    pub fn set_padding(&mut self, padding: Edges) {
        self.padding = padding;
        self.touch();
    }

    pub fn border(&self) -> Edges {
        self.border
    }

    pub fn set_border(&mut self, border: Edges, color: Color) {
        self.border = border;
        self.border_color = color;
        self.touch();
    }

    pub fn set_corner_radius(&mut self, radius: i32) {
        self.corner_radius = radius.max(0);
        self.touch();
    }

    pub fn paint(&self) -> &Paint {
        &self.paint
    }

    pub fn set_paint(&mut self, paint: Paint) {
        self.paint = paint;
        self.touch();
    }

    pub fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
        self.touch();
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text.as_str()),
            Content::Input(input) => Some(input.text()),
            Content::None => None,
        }
    }

    /// Content and children are exclusive: giving an element text drops its
    /// child list.
    pub fn set_text(&mut self, text: impl Into<SmolStr>) {
        self.content = Content::Text(text.into());
        self.drop_children();
        self.touch();
    }

    pub fn set_input(&mut self, input: Box<dyn TextInput>) {
        self.content = Content::Input(input);
        self.drop_children();
        self.input_cache = None;
        self.touch();
    }

    pub fn clear_content(&mut self) {
        if matches!(self.content, Content::Input(_)) {
            self.drop_children();
        }
        self.content = Content::None;
        self.input_cache = None;
        self.touch();
    }

    pub fn input(&self) -> Option<&dyn TextInput> {
        match &self.content {
            Content::Input(input) => Some(input.as_ref()),
            _ => None,
        }
    }

    pub fn input_mut(&mut self) -> Option<&mut (dyn TextInput + 'static)> {
        match &mut self.content {
            Content::Input(input) => Some(input.as_mut()),
            _ => None,
        }
    }

    pub fn direction(&self) -> FlexAxis {
        self.direction
    }

    pub fn set_direction(&mut self, direction: FlexAxis) {
        self.direction = direction;
        self.touch();
    }

    pub fn set_gutter(&mut self, gutter: i32) {
        self.gutter = gutter.max(0);
        self.touch();
    }

    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    pub fn set_overflow(&mut self, overflow: Overflow) {
        self.overflow = overflow;
        self.touch();
    }

    pub fn set_text_align(&mut self, align: TextAlign) {
        self.text_align = align;
        self.touch();
    }

    pub fn font(&self) -> FontVariant {
        self.font
    }

    pub fn set_font(&mut self, font: FontVariant) {
        self.font = font;
        self.touch();
    }

    pub fn set_handler(&mut self, handler: impl ElementHandler + 'static) {
        self.handler = Some(Box::new(handler));
    }

    pub fn clear_handler(&mut self) {
        self.handler = None;
    }

    pub fn accepts(&self, kind: EventKind) -> bool {
        self.handler
            .as_ref()
            .is_some_and(|handler| handler.accepts(kind))
    }

    pub fn layout(&self) -> &LayoutState {
        &self.layout
    }

    pub fn position(&self) -> IVec2 {
        self.layout.position
    }

    pub fn max_size(&self) -> IVec2 {
        self.layout.max_size
    }

    pub fn scroll_size(&self) -> IVec2 {
        self.layout.scroll_size
    }

    pub fn scroll_offset(&self) -> IVec2 {
        self.layout.scroll_offset
    }

    /// Direct user scroll. The next layout pass clamps the value. The cached
    /// bitmap holds no scrolled content, so scrolling never repaints.
    pub fn set_scroll_offset(&mut self, offset: IVec2) {
        self.layout.scroll_offset = offset;
    }

    pub fn render_cache(&self) -> &RenderCache {
        &self.render
    }

    pub fn is_changed(&self) -> bool {
        self.render.changed
    }

    pub fn mark_changed(&mut self) {
        self.touch();
    }

    /// Padding plus border.
    pub(crate) fn inset(&self) -> Edges {
        self.padding + self.border
    }

    pub(crate) fn fixed_size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    pub(crate) fn min_size(&self) -> IVec2 {
        IVec2::new(self.min_width, self.min_height)
    }

    fn drop_children(&mut self) {
        if let Some(children) = self.children.as_mut() {
            children.clear();
        }
    }
}
