use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};
use shared::domain::{ChatEvent, EventKind, Timestamp};

/// Formats an epoch timestamp as `H:M:S` without zero padding.
pub fn format_clock<Tz>(timestamp: Timestamp, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(instant) => instant
            .with_timezone(tz)
            .format("%-H:%-M:%-S")
            .to_string(),
        None => timestamp.to_string(),
    }
}

pub fn participants_label(count: usize) -> String {
    if count == 1 {
        "1 participant online".to_string()
    } else {
        format!("{count} participants online")
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub trait Renderer {
    fn chat_event(&self, event: &ChatEvent) -> String;
    fn typing(&self, name: &str) -> String;
    fn participants(&self, count: usize) -> String;
}

/// Renders events as the HTML fragments appended to the page's output container.
#[derive(Debug, Clone)]
pub struct HtmlRenderer<Tz: TimeZone = Local> {
    tz: Tz,
}

impl HtmlRenderer<Local> {
    pub fn local() -> Self {
        Self { tz: Local }
    }
}

impl<Tz: TimeZone> HtmlRenderer<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl<Tz> Renderer for HtmlRenderer<Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    fn chat_event(&self, event: &ChatEvent) -> String {
        let time = format_clock(event.timestamp, &self.tz);
        let user = escape_html(&event.user);
        match event.evt_type {
            EventKind::Join => format!("<p>{user} joined <strong>({time})</strong></p>"),
            EventKind::Leave => format!("<p>{user} left <strong>({time})</strong></p>"),
            EventKind::Message => format!(
                "<p><strong>{user}: </strong>{} <strong>({time})</strong></p>",
                escape_html(&event.text)
            ),
        }
    }

    fn typing(&self, name: &str) -> String {
        format!("<p><em>{} is typing a message...</em></p>", escape_html(name))
    }

    fn participants(&self, count: usize) -> String {
        participants_label(count)
    }
}

/// Plain-text lines for terminals.
#[derive(Debug, Clone)]
pub struct TextRenderer<Tz: TimeZone = Local> {
    tz: Tz,
}

impl TextRenderer<Local> {
    pub fn local() -> Self {
        Self { tz: Local }
    }
}

impl<Tz: TimeZone> TextRenderer<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl<Tz> Renderer for TextRenderer<Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    fn chat_event(&self, event: &ChatEvent) -> String {
        let time = format_clock(event.timestamp, &self.tz);
        match event.evt_type {
            EventKind::Join => format!("* {} joined ({time})", event.user),
            EventKind::Leave => format!("* {} left ({time})", event.user),
            EventKind::Message => format!("[{time}] {}: {}", event.user, event.text),
        }
    }

    fn typing(&self, name: &str) -> String {
        format!("{name} is typing a message...")
    }

    fn participants(&self, count: usize) -> String {
        participants_label(count)
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
