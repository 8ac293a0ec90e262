use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::core::fragment::{Element, Fragment, RenderNode};
use crate::tui::component::Component;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// A stateless component that renders one sanitized text message.
///
/// Literal runs keep their whitespace and line breaks. Entity spans are
/// styled by class: mentions are highlighted, other entities underlined.
/// Nothing in the fragment is ever interpreted as markup here; the
/// sanitizer has already decided what is live.
#[derive(Clone, Copy)]
pub struct TextBubble<'a> {
    pub fragment: &'a Fragment,
    /// Shown in the top border.
    pub sender: &'a str,
    /// Sent by the local user.
    pub outgoing: bool,
    /// Class that marks mention spans.
    pub mention_class: &'a str,
}

impl<'a> TextBubble<'a> {
    pub fn new(fragment: &'a Fragment, sender: &'a str, outgoing: bool, mention_class: &'a str) -> Self {
        Self {
            fragment,
            sender,
            outgoing,
            mention_class,
        }
    }

    /// Predicts the rendered height for `width` without rendering.
    ///
    /// Wrapping options match Ratatui's `Paragraph` so the prediction is 1:1.
    pub fn calculate_height(fragment: &Fragment, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }

        let content = expand_tabs(&fragment.text_content());
        if content.trim().is_empty() {
            return VERTICAL_OVERHEAD;
        }

        let options = textwrap::Options::new(content_width as usize)
            .break_words(true)
            .word_separator(textwrap::WordSeparator::AsciiSpace);

        let lines = textwrap::wrap(content.trim_end_matches('\n'), options);
        (lines.len() as u16).max(1) + VERTICAL_OVERHEAD
    }

    /// Width the bubble needs to fit its longest line, capped at `max_width`.
    pub fn preferred_width(fragment: &Fragment, max_width: u16) -> u16 {
        let content = expand_tabs(&fragment.text_content());
        let longest = content.lines().map(UnicodeWidthStr::width).max().unwrap_or(0);
        let wanted = (longest as u16).saturating_add(HORIZONTAL_OVERHEAD);
        wanted.min(max_width)
    }

    fn base_style(&self) -> Style {
        if self.outgoing {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Blue)
        }
    }
}

impl<'a> Widget for TextBubble<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let style = self.base_style();
        let block = Block::bordered()
            .title(self.sender)
            .border_type(BorderType::Rounded)
            .border_style(style.add_modifier(Modifier::DIM))
            .title_style(style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        let text = fragment_text(self.fragment, style, self.mention_class);
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .render(inner_area, buf);
    }
}

impl<'a> Component for TextBubble<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}

// ── Fragment → Text ─────────────────────────────────────────────────────────

/// Converts a fragment into styled lines. `base` styles literal text.
pub fn fragment_text(fragment: &Fragment, base: Style, mention_class: &str) -> Text<'static> {
    let mut lines = vec![Line::default()];
    for node in &fragment.nodes {
        push_node(&mut lines, node, base, mention_class);
    }
    Text::from(lines)
}

fn push_node(lines: &mut Vec<Line<'static>>, node: &RenderNode, style: Style, mention_class: &str) {
    match node {
        RenderNode::Text { text } | RenderNode::Literal { text } => push_text(lines, text, style),
        RenderNode::Element(el) => {
            let style = style.patch(entity_style(el, mention_class));
            for child in &el.children {
                push_node(lines, child, style, mention_class);
            }
        }
    }
}

fn push_text(lines: &mut Vec<Line<'static>>, text: &str, style: Style) {
    let text = expand_tabs(text);
    for (i, piece) in text.split('\n').enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        if !piece.is_empty()
            && let Some(line) = lines.last_mut()
        {
            line.push_span(Span::styled(piece.to_string(), style));
        }
    }
}

fn entity_style(el: &Element, mention_class: &str) -> Style {
    let classes = el.class_list();
    if classes.contains(mention_class) {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if !classes.is_empty() {
        Style::default().add_modifier(Modifier::UNDERLINED)
    } else {
        Style::default()
    }
}

/// Ratatui renders `\t` as zero-width.
fn expand_tabs(text: &str) -> String {
    if text.contains('\t') {
        text.replace('\t', "    ")
    } else {
        text.to_string()
    }
}
