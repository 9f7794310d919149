use glam::IVec2;

use super::{Content, ElementId, ElementTree, InputCache, LineHighlight};
use crate::memory::IndexedCollection;
use crate::style::{FlexAxis, TextAlign};
use crate::text::{LineSpan, TextService, char_slice};

impl ElementTree {
    /// Runs one full layout pass over the root tree and the overlay tree
    /// against a viewport of `viewport` pixels.
    ///
    /// Sizing is top-down for the max box and bottom-up for the scroll size,
    /// followed by scroll clamping and position assignment. Running it twice
    /// without mutation in between yields identical geometry.
    pub fn layout(&mut self, viewport: IVec2, text: &dyn TextService) {
        let viewport = viewport.max(IVec2::ZERO);
        for root in [Some(self.root()), self.overlay()].into_iter().flatten() {
            self.measure(root, viewport, text);
            self.place(root, IVec2::ZERO);
        }
    }

    fn measure(&mut self, id: ElementId, handed: IVec2, text: &dyn TextService) {
        let Some(element) = self.get(id) else {
            return;
        };
        let fixed = element.fixed_size();
        let min = element.min_size();
        let inset = element.inset().total();
        let axes = element.overflow.scroll_axes();
        let is_input = matches!(element.content, Content::Input(_));

        let mut max = IVec2::select(fixed.cmpgt(IVec2::ZERO), fixed, handed);
        max = IVec2::select(max.cmpgt(IVec2::ZERO), max.max(min), max);
        let inner = IVec2::select(max.cmpgt(IVec2::ZERO), (max - inset).max(IVec2::ZERO), IVec2::ZERO);

        if is_input {
            self.materialize_input(id, inner.x, text);
        }

        let Some(element) = self.get(id) else {
            return;
        };
        let direction = element.direction;
        let gutter = element.gutter;
        let children = self.children(id);
        let (main, cross) = (direction.main(), direction.cross());
        let gutters = gutter * (children.len() as i32 - 1).max(0);

        if !children.is_empty() {
            let mut fixed_main = 0;
            let mut flexible = 0;
            for child in &children {
                match self.get(*child).map(|child| child.fixed_size()[main]) {
                    Some(size) if size > 0 => fixed_main += size,
                    _ => flexible += 1,
                }
            }
            let share = if axes.scrolls(main) || inner[main] == 0 || flexible == 0 {
                0
            } else {
                (inner[main] - gutters - fixed_main).max(0) / flexible
            };
            let mut handed_child = IVec2::ZERO;
            handed_child[main] = share;
            handed_child[cross] = if axes.scrolls(cross) { 0 } else { inner[cross] };
            for child in &children {
                self.measure(*child, handed_child, text);
            }
        }

        let Some(element) = self.get(id) else {
            return;
        };
        let content = match &element.content {
            Content::Text(run) => {
                let wrap = if max.x > 0 { inner.x } else { 0 };
                let metrics = text.measure(element.font, run, wrap);
                IVec2::new(
                    metrics.width,
                    metrics.line_count() as i32 * text.line_height(element.font),
                )
            }
            Content::Input(_) | Content::None => {
                let mut sum = IVec2::ZERO;
                for child in &children {
                    let footprint = self.get(*child).map_or(IVec2::ZERO, |c| c.layout.max_size);
                    sum[main] += footprint[main];
                    sum[cross] = sum[cross].max(footprint[cross]);
                }
                if !children.is_empty() {
                    sum[main] += gutters;
                }
                sum
            }
        };
        let scroll = (content + inset).max(fixed).max(min);
        max = IVec2::select(max.cmpgt(IVec2::ZERO), max, scroll).max(min);

        let trace = self.trace_layout;
        let Some(element) = self.get_mut(id) else {
            return;
        };
        let bound = (max - scroll).min(IVec2::ZERO);
        let offset = element.layout.scroll_offset.clamp(bound, IVec2::ZERO);
        element.layout.max_size = max;
        element.layout.scroll_size = scroll;
        element.layout.scroll_offset = offset;
        if trace {
            log::trace!(
                "[layout] {id:?} handed=({},{}) max=({},{}) scroll=({},{}) offset=({},{})",
                handed.x,
                handed.y,
                max.x,
                max.y,
                scroll.x,
                scroll.y,
                offset.x,
                offset.y
            );
        }
    }

    fn place(&mut self, id: ElementId, position: IVec2) {
        let Some(element) = self.get_mut(id) else {
            return;
        };
        element.layout.position = position;
        let origin = position + element.layout.scroll_offset + element.inset().leading();
        let main = element.direction.main();
        let gutter = element.gutter;

        let mut running = 0;
        for child in self.children(id) {
            let mut at = origin;
            at[main] += running;
            self.place(child, at);
            running += self.get(child).map_or(0, |c| c.layout.max_size[main]) + gutter;
        }
    }

    /// Regenerates the line children of an input element when its text,
    /// selection, focus, style or wrap width changed since the last pass.
    fn materialize_input(&mut self, id: ElementId, wrap: i32, text: &dyn TextService) {
        let active = self.active() == Some(id);
        let Some(element) = self.get(id) else {
            return;
        };
        let Content::Input(input) = &element.content else {
            return;
        };
        let revision = input.revision();
        let selection = input.selection_range();
        let style = (element.font, element.text_color, element.text_align);
        if let Some(cache) = &element.input_cache
            && cache.revision == revision
            && cache.width == wrap
            && cache.selection == selection
            && cache.active == active
            && cache.style == style
        {
            return;
        }
        let source = input.text().to_owned();
        let (font, color, align) = style;
        let line_height = text.line_height(font);
        let spans = text.measure(font, &source, wrap).lines(&source);

        let mut cache = match self.get_mut(id).and_then(|element| element.input_cache.take()) {
            Some(cache) => cache,
            None => {
                let Some(lines) = IndexedCollection::new(&mut self.arena) else {
                    log::warn!("[layout] input {id:?} skipped: arena exhausted");
                    return;
                };
                InputCache {
                    revision,
                    width: wrap,
                    selection,
                    active,
                    style,
                    lines,
                    spare: Vec::new(),
                }
            }
        };
        cache.lines.clear();
        for span in &spans {
            cache.lines.append(&mut self.arena, *span);
        }

        let mut reusable = self.children(id);
        reusable.reverse();
        let mut line_ids = Vec::with_capacity(spans.len());
        for (index, span) in spans.iter().enumerate() {
            let line_id = match reusable.pop().or_else(|| cache.spare.pop()) {
                Some(line_id) => line_id,
                None => self.new_element(),
            };
            let highlight = active.then(|| line_highlight(&spans, index, selection));
            let run = char_slice(&source, span.start as usize, span.end as usize);
            if let Some(line) = self.get_mut(line_id) {
                let same_text = matches!(&line.content, Content::Text(old) if old == run);
                let same_style =
                    line.font == font && line.text_color == color && line.text_align == align;
                if !same_text || line.highlight != highlight || !same_style {
                    line.content = Content::Text(run.into());
                    line.highlight = highlight;
                    line.render.changed = true;
                }
                line.font = font;
                // fixed so flexible space in the input never stretches a line
                line.height = line_height;
                line.text_color = color;
                line.text_align = align;
            }
            line_ids.push(line_id);
        }
        cache.spare.extend(reusable);
        self.write_children(id, &line_ids);

        cache.revision = revision;
        cache.width = wrap;
        cache.selection = selection;
        cache.active = active;
        cache.style = style;
        if let Some(element) = self.get_mut(id) {
            element.direction = FlexAxis::Vertical;
            element.gutter = 0;
            element.input_cache = Some(cache);
        }
    }

    /// Display lines of an input element from the last layout pass.
    pub fn input_lines(&self, id: ElementId) -> Vec<LineSpan> {
        match self.get(id).and_then(|element| element.input_cache.as_ref()) {
            Some(cache) => cache.lines.iter(&self.arena).collect(),
            None => Vec::new(),
        }
    }

    /// Character index of the input under `point`, for click-to-position.
    /// Points above or below the text snap to the first or last line.
    pub fn input_index_at(
        &self,
        id: ElementId,
        point: IVec2,
        text: &dyn TextService,
    ) -> Option<usize> {
        let element = self.get(id)?;
        let source = element.input()?.text();
        let lines = self.input_lines(id);
        let line_ids = self.children(id);
        let mut hit = None;
        for (span, line_id) in lines.iter().zip(&line_ids) {
            let line = self.get(*line_id)?;
            hit = Some((span, line));
            if point.y < line.layout.position.y + line.layout.max_size.y {
                break;
            }
        }
        let (span, line) = hit?;
        let run = span.slice(source);
        let content_x = line.layout.position.x
            + line.inset().left
            + align_offset(line.text_align, line_inner_width(line), text.text_width(line.font, run));
        Some(span.start as usize + text.offset_to_index(line.font, run, point.x - content_x))
    }
}

fn line_inner_width(line: &super::Element) -> i32 {
    (line.layout.max_size.x - line.inset().total().x).max(0)
}

pub(crate) fn align_offset(align: TextAlign, available: i32, width: i32) -> i32 {
    match align {
        TextAlign::Left => 0,
        TextAlign::Center => ((available - width) / 2).max(0),
        TextAlign::Right => (available - width).max(0),
    }
}

/// Caret sits on the last line starting at or before it; a selection is cut
/// into the part overlapping each line.
fn line_highlight(spans: &[LineSpan], index: usize, selection: (usize, usize)) -> LineHighlight {
    let span = spans[index];
    let (start, end) = (selection.0 as u32, selection.1 as u32);
    if start == end {
        let owner = spans
            .iter()
            .rposition(|line| line.start <= start)
            .unwrap_or(0);
        return LineHighlight {
            caret: (owner == index).then(|| start.min(span.end) - span.start),
            selection: None,
        };
    }
    let from = start.max(span.start);
    let to = end.min(span.end);
    LineHighlight {
        caret: None,
        selection: (from < to).then(|| (from - span.start, to - span.start)),
    }
}

#[cfg(test)]
mod tests {
    use crate::style::{Color, Edges, FlexAxis, FontVariant, Overflow, TextAlign};
    use crate::text::{LineSpan, MonoText, TextBuffer};
    use crate::view::base_component::{ElementId, ElementTree, LayoutState};
    use glam::IVec2;

    const VIEWPORT: IVec2 = IVec2::new(640, 640);

    fn snapshot(tree: &ElementTree) -> Vec<LayoutState> {
        (0..tree.len() as u32)
            .map(|i| tree.get(ElementId(i)).expect("node").layout)
            .collect()
    }

    #[test]
    fn fixed_and_flexible_children_split_the_viewport() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let a = tree.append_child(root).expect("a");
        let b = tree.append_child(root).expect("b");
        tree.get_mut(a).expect("a").set_height(50);
        tree.layout(VIEWPORT, &MonoText::default());

        let a = tree.get(a).expect("a").layout;
        let b = tree.get(b).expect("b").layout;
        assert_eq!((a.position.y, a.max_size.y), (0, 50));
        assert_eq!((b.position.y, b.max_size.y), (50, 590));
        assert_eq!(a.max_size.x, 640);
    }

    #[test]
    fn flexible_share_floors_and_discards_remainder() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let row = tree.append_child(root).expect("row");
        {
            let row = tree.get_mut(row).expect("row");
            row.set_size(300, 40);
            row.set_padding(Edges::symmetric(10, 0));
            row.set_gutter(10);
            row.set_direction(FlexAxis::Horizontal);
        }
        let cells: Vec<_> = (0..3).map(|_| tree.append_child(row).expect("cell")).collect();
        tree.layout(VIEWPORT, &MonoText::default());

        let xs: Vec<i32> = cells
            .iter()
            .map(|id| tree.get(*id).expect("cell").layout.position.x)
            .collect();
        for id in &cells {
            assert_eq!(tree.get(*id).expect("cell").layout.max_size, IVec2::new(86, 40));
        }
        assert_eq!(xs, vec![10, 106, 202]);
    }

    #[test]
    fn overcommitted_fixed_children_leave_zero_for_flexible_ones() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let big = tree.append_child(root).expect("big");
        let flex = tree.append_child(root).expect("flex");
        tree.get_mut(big).expect("big").set_height(900);
        tree.layout(VIEWPORT, &MonoText::default());
        let flex = tree.get(flex).expect("flex").layout;
        assert_eq!(flex.max_size.y, 0);
        assert_eq!(flex.position.y, 900);
        assert_eq!(tree.get(root).expect("root").layout.scroll_size.y, 900);
    }

    #[test]
    fn scroll_offset_clamps_to_content_bounds() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let list = tree.append_child(root).expect("list");
        {
            let list = tree.get_mut(list).expect("list");
            list.set_height(100);
            list.set_overflow(Overflow::ScrollY);
        }
        for _ in 0..3 {
            let row = tree.append_child(list).expect("row");
            tree.get_mut(row).expect("row").set_height(100);
        }
        let text = MonoText::default();

        tree.get_mut(list).expect("list").set_scroll_offset(IVec2::new(0, -500));
        tree.layout(VIEWPORT, &text);
        assert_eq!(tree.get(list).expect("list").scroll_offset(), IVec2::new(0, -200));

        tree.get_mut(list).expect("list").set_scroll_offset(IVec2::new(7, 5));
        tree.layout(VIEWPORT, &text);
        assert_eq!(tree.get(list).expect("list").scroll_offset(), IVec2::ZERO);

        tree.get_mut(list).expect("list").set_scroll_offset(IVec2::new(0, -120));
        tree.layout(VIEWPORT, &text);
        let first_row = tree.child_at(list, 0).expect("row");
        assert_eq!(tree.get(first_row).expect("row").position().y, -120);
    }

    #[test]
    fn scrolling_parents_do_not_cap_children_on_the_scroll_axis() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let scroller = tree.append_child(root).expect("scroller");
        {
            let scroller = tree.get_mut(scroller).expect("scroller");
            scroller.set_size(200, 100);
            scroller.set_overflow(Overflow::ScrollY);
        }
        let label = tree.append_child(scroller).expect("label");
        tree.get_mut(label).expect("label").set_text("word ".repeat(30));
        tree.layout(VIEWPORT, &MonoText::new(10, 20));

        let label = tree.get(label).expect("label").layout;
        // width is capped by the non-scrolling axis, height grows with wrapping
        assert_eq!(label.max_size.x, 200);
        assert!(label.max_size.y > 100);
        let scroller = tree.get(scroller).expect("scroller").layout;
        assert_eq!(scroller.scroll_size.y, label.max_size.y);
        assert_eq!(scroller.max_size.y, 100);
    }

    #[test]
    fn containers_without_fixed_size_fit_their_content() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let scroller = tree.append_child(root).expect("scroller");
        tree.get_mut(scroller).expect("scroller").set_overflow(Overflow::Scroll);
        let boxed = tree.append_child(scroller).expect("box");
        {
            let boxed = tree.get_mut(boxed).expect("box");
            boxed.set_padding(Edges::all(5));
            boxed.set_border(Edges::all(1), crate::style::Color::BLACK);
        }
        let label = tree.append_child(boxed).expect("label");
        tree.get_mut(label).expect("label").set_text("abcd");
        tree.layout(VIEWPORT, &MonoText::new(10, 20));

        let boxed_layout = tree.get(boxed).expect("box").layout;
        assert_eq!(boxed_layout.max_size, IVec2::new(52, 32));
        assert_eq!(tree.get(label).expect("label").position(), IVec2::new(6, 6));
    }

    #[test]
    fn min_size_floors_box_and_scroll_size() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let scroller = tree.append_child(root).expect("scroller");
        tree.get_mut(scroller).expect("scroller").set_overflow(Overflow::Scroll);
        let small = tree.append_child(scroller).expect("small");
        tree.get_mut(small).expect("small").set_min_size(30, 40);
        tree.layout(VIEWPORT, &MonoText::default());
        let small = tree.get(small).expect("small").layout;
        assert_eq!(small.max_size, IVec2::new(30, 40));
        assert_eq!(small.scroll_size, IVec2::new(30, 40));
    }

    #[test]
    fn layout_is_idempotent() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        tree.get_mut(root).expect("root").set_padding(Edges::all(4));
        let list = tree.append_child(root).expect("list");
        {
            let list = tree.get_mut(list).expect("list");
            list.set_overflow(Overflow::Scroll);
            list.set_gutter(3);
        }
        for i in 0..10 {
            let row = tree.append_child(list).expect("row");
            tree.get_mut(row).expect("row").set_text(format!("row {i} with some words"));
        }
        let field = tree.append_child(root).expect("field");
        tree.get_mut(field)
            .expect("field")
            .set_input(Box::new(TextBuffer::new("editable text that wraps")));
        tree.set_active(Some(field));
        tree.get_mut(list).expect("list").set_scroll_offset(IVec2::new(-3, -1000));
        let text = MonoText::new(9, 17);

        tree.layout(VIEWPORT, &text);
        let first = snapshot(&tree);
        tree.layout(VIEWPORT, &text);
        assert_eq!(snapshot(&tree), first);
    }

    #[test]
    fn input_generates_one_line_child_per_display_line() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let column = tree.append_child(root).expect("column");
        tree.get_mut(column).expect("column").set_overflow(Overflow::ScrollY);
        let field = tree.append_child(column).expect("field");
        {
            let field = tree.get_mut(field).expect("field");
            field.set_width(75);
            field.set_input(Box::new(TextBuffer::new("aaa bbb ccc")));
        }
        let text = MonoText::new(10, 20);
        tree.layout(VIEWPORT, &text);

        assert_eq!(
            tree.input_lines(field),
            vec![
                LineSpan { start: 0, end: 4 },
                LineSpan { start: 4, end: 8 },
                LineSpan { start: 8, end: 11 }
            ]
        );
        let lines = tree.children(field);
        assert_eq!(lines.len(), 3);
        assert_eq!(tree.get(lines[2]).expect("line").text(), Some("ccc"));
        assert_eq!(tree.get(field).expect("field").max_size(), IVec2::new(75, 60));
        assert_eq!(tree.get(lines[1]).expect("line").position().y, 20);

        // shrinking the text reuses line elements instead of creating new ones
        let nodes = tree.len();
        tree.get_mut(field)
            .expect("field")
            .input_mut()
            .expect("input")
            .key_press(crate::ui::KeyPress::new(crate::ui::Key::Backspace));
        tree.layout(VIEWPORT, &text);
        assert_eq!(tree.len(), nodes);
        assert_eq!(tree.get(lines[2]).expect("line").text(), Some("cc"));
    }

    #[test]
    fn restyling_an_input_restyles_its_lines() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let field = tree.append_child(root).expect("field");
        {
            let field = tree.get_mut(field).expect("field");
            field.set_width(200);
            field.set_input(Box::new(TextBuffer::new("abc")));
        }
        let text = MonoText::new(10, 20);
        tree.layout(VIEWPORT, &text);
        let line = tree.children(field)[0];
        tree.get_mut(line).expect("line").render.changed = false;

        let red = Color::rgb(255, 0, 0);
        {
            let field = tree.get_mut(field).expect("field");
            field.set_text_color(red);
            field.set_text_align(TextAlign::Right);
            field.set_font(FontVariant::Bold);
        }
        tree.layout(VIEWPORT, &text);
        let line = tree.get(line).expect("line");
        assert_eq!(line.text_color, red);
        assert_eq!(line.text_align, TextAlign::Right);
        assert_eq!(line.font(), FontVariant::Bold);
        assert!(line.is_changed());
    }

    #[test]
    fn only_the_active_input_carries_a_caret() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let field = tree.append_child(root).expect("field");
        {
            let field = tree.get_mut(field).expect("field");
            field.set_width(75);
            field.set_input(Box::new(TextBuffer::new("aaa bbb")));
            field.input_mut().expect("input").set_selection(4, 4);
        }
        let text = MonoText::new(10, 20);
        tree.layout(VIEWPORT, &text);
        let lines = tree.children(field);
        assert!(lines.iter().all(|id| tree.get(*id).expect("line").highlight.is_none()));

        tree.set_active(Some(field));
        tree.layout(VIEWPORT, &text);
        let first = tree.get(lines[0]).expect("line").highlight.expect("highlight");
        let second = tree.get(lines[1]).expect("line").highlight.expect("highlight");
        assert_eq!(first.caret, None);
        assert_eq!(second.caret, Some(0));
    }

    #[test]
    fn selection_is_split_across_lines() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let field = tree.append_child(root).expect("field");
        {
            let field = tree.get_mut(field).expect("field");
            field.set_width(75);
            field.set_input(Box::new(TextBuffer::new("aaa bbb ccc")));
            field.input_mut().expect("input").set_selection(9, 2);
        }
        tree.set_active(Some(field));
        tree.layout(VIEWPORT, &MonoText::new(10, 20));
        let spans: Vec<_> = tree
            .children(field)
            .iter()
            .map(|id| tree.get(*id).expect("line").highlight.expect("highlight").selection)
            .collect();
        assert_eq!(spans, vec![Some((2, 4)), Some((0, 4)), Some((0, 1))]);
    }

    #[test]
    fn click_position_maps_to_character_index() {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let field = tree.append_child(root).expect("field");
        {
            let field = tree.get_mut(field).expect("field");
            field.set_width(75);
            field.set_input(Box::new(TextBuffer::new("aaa bbb ccc")));
        }
        let text = MonoText::new(10, 20);
        tree.layout(VIEWPORT, &text);
        assert_eq!(tree.input_index_at(field, IVec2::new(0, 0), &text), Some(0));
        assert_eq!(tree.input_index_at(field, IVec2::new(21, 25), &text), Some(6));
        assert_eq!(tree.input_index_at(field, IVec2::new(500, 500), &text), Some(11));
        assert_eq!(tree.input_index_at(root, IVec2::ZERO, &text), None);
        assert_eq!(
            tree.get(field).expect("field").input().expect("input").text(),
            "aaa bbb ccc"
        );
    }
}
