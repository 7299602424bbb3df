//! Inline style declarations

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered inline style declarations (`property: value` pairs)
///
/// Insertion order is preserved so a serialized element reads the same way
/// it was built. Property names are stored lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    declarations: Vec<(String, String)>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `style` attribute value such as `"width: 10px; height: auto"`
    ///
    /// Malformed declarations (no colon, empty name) are skipped.
    pub fn parse(source: &str) -> Self {
        let mut style = Self::new();
        for declaration in source.split(';') {
            let Some((name, value)) = declaration.split_once(':') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() {
                continue;
            }
            style.set(name, value);
        }
        style
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        let property = property.to_ascii_lowercase();
        self.declarations
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value.as_str())
    }

    /// Set a property, replacing an existing value in place
    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        let property = property.into().to_ascii_lowercase();
        let value = value.into();
        match self.declarations.iter_mut().find(|(name, _)| *name == property) {
            Some(slot) => slot.1 = value,
            None => self.declarations.push((property, value)),
        }
    }

    /// Remove a property, returning its previous value
    pub fn remove(&mut self, property: &str) -> Option<String> {
        let property = property.to_ascii_lowercase();
        let pos = self.declarations.iter().position(|(name, _)| *name == property)?;
        Some(self.declarations.remove(pos).1)
    }

    pub fn contains(&self, property: &str) -> bool {
        self.get(property).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        Ok(())
    }
}

/// Parse a pixel length like `"240px"` or `"240"`
pub fn parse_px(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f32>().ok()
}

/// Format a pixel length the way the style writer expects
pub fn format_px(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}px", value as i64)
    } else {
        format!("{}px", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let style = Style::parse("border: 1px solid #cbd5e1;padding:12px; ;bogus");
        assert_eq!(style.len(), 2);
        assert_eq!(style.to_string(), "border: 1px solid #cbd5e1; padding: 12px");
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut style = Style::parse("width: 10px; height: 20px");
        style.set("WIDTH", "30px");
        assert_eq!(style.to_string(), "width: 30px; height: 20px");
        assert_eq!(style.remove("height").as_deref(), Some("20px"));
        assert!(!style.contains("height"));
    }

    #[test]
    fn test_px_helpers() {
        assert_eq!(parse_px("240px"), Some(240.0));
        assert_eq!(parse_px(" 12 "), Some(12.0));
        assert_eq!(parse_px("auto"), None);
        assert_eq!(format_px(120.0), "120px");
        assert_eq!(format_px(12.5), "12.5px");
    }
}
