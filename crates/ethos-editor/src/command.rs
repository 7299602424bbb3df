//! The closed set of editing commands

use std::fmt;
use std::str::FromStr;

use ethos_core::{tags, Element, Fragment};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{EditorError, Result};

/// A formatting or insertion command applied to the current selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Bold,
    Italic,
    Underline,
    FontFamily(String),
    FontSize(FontSize),
    Align(Alignment),
    Color(Color),
    Link(Url),
    InsertFragment(Fragment),
}

impl Command {
    /// Build a command from a toolbar action name and its value
    ///
    /// Action names are matched ignoring case, `-` and `_`; the legacy names
    /// (`fontName`, `foreColor`, `justifyCenter`, `createLink`, `insertHTML`)
    /// are accepted alongside the short ones.
    pub fn parse(action: &str, value: Option<&str>) -> Result<Command> {
        let name: String = action
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        let value = value.map(str::trim).unwrap_or("");

        let command = match name.as_str() {
            "bold" => Command::Bold,
            "italic" => Command::Italic,
            "underline" => Command::Underline,
            "fontname" | "fontfamily" | "font" => {
                let family = value.trim_matches(|c| c == '"' || c == '\'').trim();
                if family.is_empty() {
                    return Err(EditorError::invalid("font family", value));
                }
                Command::FontFamily(family.to_string())
            }
            "fontsize" | "size" => Command::FontSize(value.parse()?),
            "justifyleft" | "alignleft" => Command::Align(Alignment::Left),
            "justifycenter" | "aligncenter" => Command::Align(Alignment::Center),
            "justifyright" | "alignright" => Command::Align(Alignment::Right),
            "justifyfull" | "alignjustify" => Command::Align(Alignment::Justify),
            "align" => Command::Align(value.parse()?),
            "forecolor" | "color" => Command::Color(value.parse()?),
            "createlink" | "link" => Command::Link(
                Url::parse(value).map_err(|_| EditorError::invalid("link", value))?,
            ),
            "inserthtml" | "insert" => Command::InsertFragment(Fragment::parse(value)?),
            _ => return Err(EditorError::invalid("action", action)),
        };
        Ok(command)
    }

    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Bold => "bold",
            Command::Italic => "italic",
            Command::Underline => "underline",
            Command::FontFamily(_) => "font-family",
            Command::FontSize(_) => "font-size",
            Command::Align(_) => "align",
            Command::Color(_) => "color",
            Command::Link(_) => "link",
            Command::InsertFragment(_) => "insert-fragment",
        }
    }

    /// Tags that count as this command's formatting when toggling
    pub(crate) fn toggle_tags(&self) -> Option<&'static [&'static str]> {
        match self {
            Command::Bold => Some(&[tags::B, tags::STRONG]),
            Command::Italic => Some(&[tags::I, tags::EM]),
            Command::Underline => Some(&[tags::U]),
            _ => None,
        }
    }

    /// Element wrapped around selected text by inline commands
    pub(crate) fn wrapper(&self) -> Option<Element> {
        let element = match self {
            Command::Bold => Element::new(tags::B),
            Command::Italic => Element::new(tags::I),
            Command::Underline => Element::new(tags::U),
            Command::FontFamily(family) => {
                let family = if family.contains(' ') {
                    format!("'{}'", family)
                } else {
                    family.clone()
                };
                Element::new(tags::SPAN).with_style("font-family", family)
            }
            Command::FontSize(size) => {
                Element::new(tags::SPAN).with_style("font-size", format!("{}pt", size.points()))
            }
            Command::Color(color) => Element::new(tags::SPAN).with_style("color", color.as_str()),
            Command::Link(url) => Element::new(tags::A).with_attr("href", url.as_str()),
            Command::Align(_) | Command::InsertFragment(_) => return None,
        };
        Some(element)
    }
}

/// Font size on the legacy 1-7 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FontSize(u8);

impl FontSize {
    const POINTS: [u8; 7] = [8, 10, 12, 14, 18, 24, 36];

    pub fn new(level: u8) -> Result<Self> {
        if (1..=7).contains(&level) {
            Ok(Self(level))
        } else {
            Err(EditorError::invalid("font size", level.to_string()))
        }
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    /// Point size this level renders at
    pub fn points(&self) -> u8 {
        Self::POINTS[usize::from(self.0 - 1)]
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for FontSize {
    type Error = EditorError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl From<FontSize> for u8 {
    fn from(size: FontSize) -> u8 {
        size.0
    }
}

impl FromStr for FontSize {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        let level = s
            .trim()
            .parse::<u8>()
            .map_err(|_| EditorError::invalid("font size", s))?;
        Self::new(level)
    }
}

/// Paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Value of the `text-align` property
    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

impl FromStr for Alignment {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            "justify" | "full" => Ok(Alignment::Justify),
            _ => Err(EditorError::invalid("alignment", s)),
        }
    }
}

/// A text color, normalized to lowercase `#rrggbb`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(String);

impl Color {
    /// Colors offered by the toolbar palette
    pub const PRESETS: [&'static str; 10] = [
        "#000000", "#334155", "#ef4444", "#f59e0b", "#10b981", "#3b82f6", "#8b5cf6", "#ec4899",
        "#64748b", "#ffffff",
    ];

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self("#000000".to_string())
    }
}

impl FromStr for Color {
    type Err = EditorError;

    /// Accepts `#rgb` and `#rrggbb`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EditorError::invalid("color", s);
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let full = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => hex.to_string(),
            _ => return Err(invalid()),
        };
        Ok(Self(format!("#{}", full.to_ascii_lowercase())))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!(Command::parse("bold", None).unwrap(), Command::Bold);
        assert_eq!(
            Command::parse("justifyCenter", None).unwrap(),
            Command::Align(Alignment::Center)
        );
        assert_eq!(
            Command::parse("align", Some("justify")).unwrap(),
            Command::Align(Alignment::Justify)
        );
        assert_eq!(
            Command::parse("fontName", Some("'Times New Roman'")).unwrap(),
            Command::FontFamily("Times New Roman".into())
        );
        assert!(matches!(
            Command::parse("strike", None),
            Err(EditorError::InvalidCommandValue { command: "action", .. })
        ));
    }

    #[test]
    fn test_font_size_scale() {
        assert_eq!(FontSize::new(1).unwrap().points(), 8);
        assert_eq!("7".parse::<FontSize>().unwrap().points(), 36);
        assert!(FontSize::new(0).is_err());
        assert!("8".parse::<FontSize>().is_err());
        assert!("big".parse::<FontSize>().is_err());
    }

    #[test]
    fn test_font_size_deserialize_checks_level() {
        let size: FontSize = serde_json::from_str("5").unwrap();
        assert_eq!(size.points(), 18);
        assert_eq!(serde_json::to_string(&size).unwrap(), "5");

        assert!(serde_json::from_str::<FontSize>("0").is_err());
        assert!(serde_json::from_str::<FontSize>("8").is_err());
    }

    #[test]
    fn test_color_normalization() {
        assert_eq!("#ABC".parse::<Color>().unwrap().as_str(), "#aabbcc");
        assert_eq!("#3B82F6".parse::<Color>().unwrap().to_string(), "#3b82f6");
        assert!("3b82f6".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
        assert!("#ggg".parse::<Color>().is_err());
        assert!(Color::PRESETS.iter().all(|c| c.parse::<Color>().is_ok()));
    }

    #[test]
    fn test_link_must_be_absolute() {
        assert!(matches!(
            Command::parse("createLink", Some("https://ethos.example/a")),
            Ok(Command::Link(_))
        ));
        assert!(Command::parse("createLink", Some("not a url")).is_err());
    }

    #[test]
    fn test_wrappers() {
        let span = Command::FontSize(FontSize::new(5).unwrap()).wrapper().unwrap();
        assert_eq!(span.style.get("font-size"), Some("18pt"));

        let family = Command::FontFamily("Times New Roman".into()).wrapper().unwrap();
        assert_eq!(family.style.get("font-family"), Some("'Times New Roman'"));

        assert!(Command::Align(Alignment::Left).wrapper().is_none());
    }
}
