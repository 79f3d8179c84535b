// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Converts the pre-rendered detail body into styled terminal lines.
//!
//! The server sends plain text with a handful of inline tags. Highlight
//! spans, `<em>` and `<strong>`/`<b>` get a style; `<br>` breaks the line;
//! every other tag is dropped. Common entities are decoded.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const MAX_ENTITY_LEN: usize = 8;

pub fn markup_lines(markup: &str) -> Vec<Line<'static>> {
    let mut builder = LineBuilder::default();
    let mut styles: Vec<Style> = Vec::new();
    let mut rest = markup;

    while let Some(ch) = rest.chars().next() {
        match ch {
            '<' => match rest.find('>') {
                Some(end) => {
                    apply_tag(&rest[1..end], &mut styles, &mut builder);
                    rest = &rest[end + 1..];
                    continue;
                }
                None => builder.push_char('<', current_style(&styles)),
            },
            '&' => {
                if let Some((decoded, consumed)) = decode_entity(rest) {
                    builder.push_char(decoded, current_style(&styles));
                    rest = &rest[consumed..];
                    continue;
                }
                builder.push_char('&', current_style(&styles));
            }
            '\n' => builder.break_line(),
            '\r' => {}
            other => builder.push_char(other, current_style(&styles)),
        }
        rest = &rest[ch.len_utf8()..];
    }

    builder.finish()
}

fn current_style(styles: &[Style]) -> Style {
    styles.last().copied().unwrap_or_default()
}

fn apply_tag(raw: &str, styles: &mut Vec<Style>, builder: &mut LineBuilder) {
    let tag = raw.trim().to_ascii_lowercase();
    let closing = tag.starts_with('/');
    let name = tag
        .trim_start_matches('/')
        .split(|ch: char| ch.is_whitespace() || ch == '/')
        .next()
        .unwrap_or_default();

    match (name, closing) {
        ("br", _) => builder.break_line(),
        ("span" | "em" | "i" | "strong" | "b", true) => {
            styles.pop();
        }
        ("span", false) => {
            let base = current_style(styles);
            let style = if tag.contains("highlight") {
                base.fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                base
            };
            styles.push(style);
        }
        ("em" | "i", false) => {
            let style = current_style(styles).add_modifier(Modifier::ITALIC);
            styles.push(style);
        }
        ("strong" | "b", false) => {
            let style = current_style(styles).add_modifier(Modifier::BOLD);
            styles.push(style);
        }
        _ => {}
    }
}

fn decode_entity(input: &str) -> Option<(char, usize)> {
    let end = input
        .char_indices()
        .take(MAX_ENTITY_LEN + 2)
        .find(|(_, ch)| *ch == ';')
        .map(|(index, _)| index)?;
    let name = &input[1..end];
    let decoded = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" | "#39" => '\'',
        "nbsp" => ' ',
        numeric if numeric.starts_with('#') => {
            let digits = &numeric[1..];
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)?
        }
        _ => return None,
    };
    Some((decoded, end + 1))
}

#[derive(Default)]
struct LineBuilder {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    text: String,
    style: Style,
}

impl LineBuilder {
    fn push_char(&mut self, ch: char, style: Style) {
        if style != self.style {
            self.flush_span();
            self.style = style;
        }
        self.text.push(ch);
    }

    fn flush_span(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.spans.push(Span::styled(text, self.style));
        }
    }

    fn break_line(&mut self) {
        self.flush_span();
        self.lines.push(Line::from(std::mem::take(&mut self.spans)));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_span();
        if !self.spans.is_empty() || self.lines.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
        self.lines
    }
}
