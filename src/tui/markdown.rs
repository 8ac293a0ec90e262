//! Markdown → ratatui `Text` renderer for AI-assistant bubbles.
//!
//! Thin wrapper around `pulldown_cmark` that converts markdown events into
//! styled `Line`/`Span` values. Headings, bold, italic, strikethrough, inline
//! code, fenced code blocks (with syntect highlighting picked by theme),
//! lists, task lists, blockquotes, tables, links, and images.
//!
//! Images cannot be drawn inline; each one becomes an `[image: alt]` marker
//! and is reported in [`RenderedMarkdown::images`] so the host can open it
//! in a full-screen viewer.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::ThemeMode;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const DARK_CODE_THEME: &str = "base16-ocean.dark";
const LIGHT_CODE_THEME: &str = "base16-ocean.light";

/// An image referenced by the markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Default)]
pub struct RenderedMarkdown {
    pub text: Text<'static>,
    pub images: Vec<ImageRef>,
}

/// Parse markdown content into styled `Text`.
///
/// Returns owned text (`'static`) so callers aren't constrained by input lifetime.
pub fn render(content: &str, base_fg: Color, theme: ThemeMode) -> RenderedMarkdown {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts.insert(Options::ENABLE_TABLES);

    let mut w = Writer::new(base_fg, theme);
    for event in Parser::new_ext(content, opts) {
        w.handle(event);
    }
    RenderedMarkdown {
        text: w.text,
        images: w.images,
    }
}

fn code_theme_name(theme: ThemeMode) -> &'static str {
    match theme {
        ThemeMode::Dark => DARK_CODE_THEME,
        ThemeMode::Light => LIGHT_CODE_THEME,
    }
}

// ── Writer ──────────────────────────────────────────────────────────────────

struct Writer {
    text: Text<'static>,
    images: Vec<ImageRef>,
    base_fg: Color,
    theme: ThemeMode,
    /// Inline style stack. Styles compose via `patch` so nested bold+italic works.
    styles: Vec<Style>,
    /// Per-line prefix spans (blockquote `│`).
    line_prefixes: Vec<Span<'static>>,
    /// List nesting: None = unordered, Some(n) = ordered at index n.
    list_indices: Vec<Option<u64>>,
    highlighter: Option<HighlightLines<'static>>,
    /// Inside a code block without syntax highlighting.
    in_plain_code: bool,
    /// Stored link URL, appended after the link text closes.
    link_url: Option<String>,
    /// Image being read: (src, alt text so far).
    image: Option<(String, String)>,
    /// Cells emitted so far in the current table row.
    table_cells: usize,
    needs_newline: bool,
}

impl Writer {
    fn new(base_fg: Color, theme: ThemeMode) -> Self {
        Self {
            text: Text::default(),
            images: vec![],
            base_fg,
            theme,
            styles: vec![],
            line_prefixes: vec![],
            list_indices: vec![],
            highlighter: None,
            in_plain_code: false,
            link_url: None,
            image: None,
            table_cells: 0,
            needs_newline: false,
        }
    }

    // ── Style helpers ───────────────────────────────────────────────────

    fn style(&self) -> Style {
        self.styles
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    fn dim(&self) -> Style {
        match self.theme {
            ThemeMode::Dark => Style::default().fg(Color::DarkGray),
            ThemeMode::Light => Style::default().fg(Color::Gray),
        }
    }

    // ── Line/span helpers ───────────────────────────────────────────────

    fn push_line(&mut self, line: Line<'static>) {
        let mut out = line;
        for pfx in self.line_prefixes.iter().rev().cloned() {
            out.spans.insert(0, pfx);
        }
        self.text.lines.push(out);
    }

    fn push_span(&mut self, span: Span<'static>) {
        if let Some(line) = self.text.lines.last_mut() {
            line.push_span(span);
        } else {
            self.push_line(Line::from(vec![span]));
        }
    }

    fn blank_line_if_needed(&mut self) {
        if self.needs_newline {
            self.push_line(Line::default());
            self.needs_newline = false;
        }
    }

    // ── Event dispatch ──────────────────────────────────────────────────

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(t) => self.text(t),
            Event::Code(c) => self.inline_code(c),
            Event::SoftBreak => self.push_span(Span::raw(" ")),
            Event::HardBreak => self.push_line(Line::default()),
            Event::Rule => {
                self.blank_line_if_needed();
                let dim = self.dim();
                self.push_line(Line::from(Span::styled("─".repeat(40), dim)));
                self.needs_newline = true;
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_span(Span::raw(marker));
            }
            // Raw HTML is shown as typed; it is never interpreted here.
            Event::Html(html) | Event::InlineHtml(html) => self.text(html),
            _ => {} // footnotes, math
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            // ── Block elements ──────────────────────────────────────────
            Tag::Paragraph => {
                self.blank_line_if_needed();
                self.push_line(Line::default());
            }
            Tag::Heading { level, .. } => {
                self.blank_line_if_needed();
                let hs = heading_style(self.base_fg, level);
                let depth = heading_depth(level) as usize;
                self.push_line(Line::from(Span::styled(
                    format!("{} ", "#".repeat(depth)),
                    hs,
                )));
                self.push_style(hs);
            }
            Tag::BlockQuote(_) => {
                self.blank_line_if_needed();
                let dim = self.dim();
                self.line_prefixes.push(Span::styled("│ ", dim));
                self.push_style(
                    Style::default()
                        .fg(self.base_fg)
                        .add_modifier(Modifier::DIM | Modifier::ITALIC),
                );
            }
            Tag::CodeBlock(kind) => {
                if !self.text.lines.is_empty() {
                    self.push_line(Line::default());
                }
                let lang = match &kind {
                    CodeBlockKind::Fenced(l) => l.as_ref(),
                    CodeBlockKind::Indented => "",
                };

                let bs = self.dim();
                let top = if lang.is_empty() {
                    Line::from(Span::styled("╭──", bs))
                } else {
                    Line::from(vec![
                        Span::styled("╭── ", bs),
                        Span::styled(lang.to_owned(), bs.add_modifier(Modifier::BOLD)),
                        Span::styled(" ──", bs),
                    ])
                };
                self.push_line(top);
                self.line_prefixes.push(Span::styled("│ ", bs));

                if !lang.is_empty()
                    && let Some(syn) = SYNTAX_SET.find_syntax_by_token(lang)
                    && let Some(theme) = THEME_SET.themes.get(code_theme_name(self.theme))
                {
                    self.highlighter = Some(HighlightLines::new(syn, theme));
                }
                if self.highlighter.is_none() {
                    self.in_plain_code = true;
                }
            }
            Tag::List(start) => {
                if self.list_indices.is_empty() {
                    self.blank_line_if_needed();
                }
                self.list_indices.push(start);
            }
            Tag::Item => {
                self.push_line(Line::default());
                let depth = self.list_indices.len().saturating_sub(1);
                let indent = "  ".repeat(depth);
                let dim = self.dim();
                if let Some(idx) = self.list_indices.last_mut() {
                    let marker = match idx {
                        None => format!("{indent}- "),
                        Some(n) => {
                            let s = format!("{indent}{}. ", n);
                            *n += 1;
                            s
                        }
                    };
                    self.push_span(Span::styled(marker, dim));
                }
            }
            Tag::Table(_) => {
                self.blank_line_if_needed();
            }
            Tag::TableHead => {
                self.push_line(Line::default());
                self.table_cells = 0;
                self.push_style(Style::default().add_modifier(Modifier::BOLD));
            }
            Tag::TableRow => {
                self.push_line(Line::default());
                self.table_cells = 0;
            }
            Tag::TableCell => {
                if self.table_cells > 0 {
                    let dim = self.dim();
                    self.push_span(Span::styled(" │ ", dim));
                }
                self.table_cells += 1;
            }

            // ── Inline elements ─────────────────────────────────────────
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link_url = Some(dest_url.to_string());
                self.push_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            Tag::Image { dest_url, .. } => {
                self.image = Some((dest_url.to_string(), String::new()));
            }
            _ => {} // definitions, footnotes
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.needs_newline = true,
            TagEnd::Heading(_) => {
                self.pop_style();
                self.needs_newline = true;
            }
            TagEnd::BlockQuote(_) => {
                self.line_prefixes.pop();
                self.pop_style();
                self.needs_newline = true;
            }
            TagEnd::CodeBlock => {
                self.highlighter = None;
                self.in_plain_code = false;
                self.line_prefixes.pop(); // remove │ prefix before bottom border
                let bs = self.dim();
                self.push_line(Line::from(Span::styled("╰──", bs)));
                self.needs_newline = true;
            }
            TagEnd::List(_) => {
                self.list_indices.pop();
                self.needs_newline = true;
            }
            TagEnd::TableHead => self.pop_style(),
            TagEnd::Table => self.needs_newline = true,
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link_url.take() {
                    self.push_span(Span::raw(" ("));
                    self.push_span(Span::styled(
                        url,
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::UNDERLINED),
                    ));
                    self.push_span(Span::raw(")"));
                }
            }
            TagEnd::Image => {
                if let Some((src, alt)) = self.image.take() {
                    let label = if alt.is_empty() {
                        "[image]".to_string()
                    } else {
                        format!("[image: {alt}]")
                    };
                    self.push_span(Span::styled(
                        label,
                        Style::default()
                            .fg(Color::Magenta)
                            .add_modifier(Modifier::ITALIC),
                    ));
                    self.images.push(ImageRef { src, alt });
                }
            }
            _ => {}
        }
    }

    // ── Content handlers ────────────────────────────────────────────────

    fn text(&mut self, cow: CowStr<'_>) {
        // Alt text is collected, not drawn.
        if let Some((_, alt)) = self.image.as_mut() {
            alt.push_str(&cow);
            return;
        }

        // Expand tabs → 4 spaces (ratatui renders \t as zero-width)
        let raw = cow.to_string();
        let text = if raw.contains('\t') {
            raw.replace('\t', "    ")
        } else {
            raw
        };

        // Take the highlighter out so highlight_line and push_line don't both borrow self.
        if let Some(mut hl) = self.highlighter.take() {
            for line in LinesWithEndings::from(text.as_str()) {
                if let Ok(ranges) = hl.highlight_line(line, &SYNTAX_SET) {
                    let spans: Vec<Span<'static>> = ranges
                        .into_iter()
                        .filter_map(|(hl_style, frag)| {
                            let content = frag.trim_end_matches('\n').to_string();
                            if content.is_empty() {
                                return None;
                            }
                            let fg = Color::Rgb(
                                hl_style.foreground.r,
                                hl_style.foreground.g,
                                hl_style.foreground.b,
                            );
                            Some(Span::styled(content, Style::default().fg(fg)))
                        })
                        .collect();
                    if !spans.is_empty() {
                        self.push_line(Line::from(spans));
                    }
                }
            }
            self.highlighter = Some(hl);
            return;
        }

        if self.in_plain_code {
            let code_style = Style::default().fg(self.base_fg);
            for line in text.lines() {
                self.push_line(Line::from(Span::styled(line.to_owned(), code_style)));
            }
            return;
        }

        let style = self.style();
        self.push_span(Span::styled(text, style));
    }

    fn inline_code(&mut self, cow: CowStr<'_>) {
        let style = match self.theme {
            ThemeMode::Dark => Style::default().fg(Color::White).bg(Color::DarkGray),
            ThemeMode::Light => Style::default().fg(Color::Black).bg(Color::Gray),
        };
        self.push_span(Span::styled(cow.to_string(), style));
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn heading_style(base_fg: Color, level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default()
            .fg(base_fg)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        HeadingLevel::H2 => Style::default().fg(base_fg).add_modifier(Modifier::BOLD),
        _ => Style::default()
            .fg(base_fg)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Plain-text lines of rendered markdown, styles dropped.
pub fn to_plain_lines(text: &Text<'_>) -> Vec<String> {
    text.lines
        .iter()
        .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_dark(content: &str) -> RenderedMarkdown {
        render(content, Color::Blue, ThemeMode::Dark)
    }

    #[test]
    fn heading_text_inherits_heading_style() {
        let text = render_dark("## Hello").text;
        let line = &text.lines[0];
        assert!(line.spans.len() >= 2, "expected >= 2 spans, got {:?}", line);
        assert!(line.spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(line.spans[1].style.fg, Some(Color::Blue));
    }

    #[test]
    fn bold_text_is_bold() {
        let text = render_dark("Some **bold** text").text;
        let bold_span = text.lines[0].spans.iter().find(|s| s.content == "bold").unwrap();
        assert!(bold_span.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn inline_code_follows_theme() {
        let dark = render_dark("Use `foo()` here").text;
        let span = dark.lines[0].spans.iter().find(|s| s.content == "foo()").unwrap();
        assert_eq!(span.style.bg, Some(Color::DarkGray));

        let light = render("Use `foo()` here", Color::Blue, ThemeMode::Light).text;
        let span = light.lines[0].spans.iter().find(|s| s.content == "foo()").unwrap();
        assert_eq!(span.style.bg, Some(Color::Gray));
    }

    #[test]
    fn code_block_has_border_structure() {
        let lines = to_plain_lines(&render_dark("```\nline1\nline2\n```").text);
        assert!(lines[0].starts_with('╭'), "expected top border, got {:?}", lines[0]);
        assert!(lines[1].starts_with("│ ") && lines[1].contains("line1"));
        assert!(lines[2].starts_with("│ ") && lines[2].contains("line2"));
        assert!(lines.last().unwrap().starts_with('╰'));
    }

    #[test]
    fn fenced_rust_is_highlighted_in_both_themes() {
        for theme in [ThemeMode::Dark, ThemeMode::Light] {
            let text = render("```rust\nlet x = 1;\n```", Color::Blue, theme).text;
            let has_rgb = text
                .lines
                .iter()
                .flat_map(|l| l.spans.iter())
                .any(|s| matches!(s.style.fg, Some(Color::Rgb(..))));
            assert!(has_rgb, "expected highlighted spans for {:?}", theme);
        }
    }

    #[test]
    fn links_show_their_url() {
        let lines = to_plain_lines(&render_dark("[docs](https://example.com)").text);
        assert_eq!(lines[0], "docs (https://example.com)");
    }

    #[test]
    fn images_become_markers_and_are_collected() {
        let rendered = render_dark("look ![a cat](https://img.example/cat.png)");
        let lines = to_plain_lines(&rendered.text);
        assert_eq!(lines[0], "look [image: a cat]");
        assert_eq!(
            rendered.images,
            vec![ImageRef {
                src: "https://img.example/cat.png".to_string(),
                alt: "a cat".to_string(),
            }]
        );
    }

    #[test]
    fn tables_render_as_rows() {
        let lines = to_plain_lines(&render_dark("| a | b |\n|---|---|\n| 1 | 2 |").text);
        assert!(lines.contains(&"a │ b".to_string()), "got {:?}", lines);
        assert!(lines.contains(&"1 │ 2".to_string()), "got {:?}", lines);
    }

    #[test]
    fn task_list_markers_are_shown() {
        let lines = to_plain_lines(&render_dark("- [x] done\n- [ ] todo").text);
        assert!(lines.iter().any(|l| l.contains("[x] done")));
        assert!(lines.iter().any(|l| l.contains("[ ] todo")));
    }

    #[test]
    fn raw_html_is_shown_as_text() {
        let lines = to_plain_lines(&render_dark("hi <b>there</b>").text);
        assert_eq!(lines[0], "hi <b>there</b>");
    }

    #[test]
    fn tabs_expanded_to_spaces() {
        let text = render_dark("```\n\tindented\n```").text;
        let has_tabs = text
            .lines
            .iter()
            .any(|l| l.spans.iter().any(|s| s.content.contains('\t')));
        assert!(!has_tabs, "no raw tabs should remain");
    }
}
