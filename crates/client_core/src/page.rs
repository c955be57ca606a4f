//! The chat page as an explicit UI-state object: the two inputs, the output
//! container, the typing feedback line and the optional title element.

use std::{fmt, str::FromStr};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageVariant {
    #[default]
    Basic,
    Remembered,
    Presence,
}

impl PageVariant {
    pub fn remembers_user(self) -> bool {
        matches!(self, Self::Remembered | Self::Presence)
    }

    pub fn shows_participants(self) -> bool {
        matches!(self, Self::Presence)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Remembered => "remembered",
            Self::Presence => "presence",
        }
    }
}

impl fmt::Display for PageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageVariant {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "remembered" => Ok(Self::Remembered),
            "presence" => Ok(Self::Presence),
            other => Err(ClientError::UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub message: String,
    pub user: String,
    pub feedback: String,
    title: Option<String>,
    output: Vec<String>,
    alerts: Vec<String>,
}

impl Page {
    pub fn new(variant: PageVariant) -> Self {
        Self {
            title: variant.shows_participants().then(String::new),
            ..Self::default()
        }
    }

    /// Rendered entries in arrival order.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn output_html(&self) -> String {
        self.output.concat()
    }

    pub fn append_output(&mut self, entry: String) {
        self.output.push(entry);
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Sets the title text. Pages without a title element ignore this.
    pub fn set_title(&mut self, text: String) -> bool {
        match self.title.as_mut() {
            Some(title) => {
                *title = text;
                true
            }
            None => false,
        }
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn alert(&mut self, text: impl Into<String>) {
        self.alerts.push(text.into());
    }
}
