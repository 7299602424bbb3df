//! Template keys - which document variant is being edited

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Writing mode chosen in the template picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Academic,
    Cv,
    Homework,
    Report,
    Custom,
    None,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Academic,
        Mode::Cv,
        Mode::Homework,
        Mode::Report,
        Mode::Custom,
        Mode::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Academic => "academic",
            Mode::Cv => "cv",
            Mode::Homework => "homework",
            Mode::Report => "report",
            Mode::Custom => "custom",
            Mode::None => "none",
        }
    }

    /// Default font offered by the font picker for this mode
    pub fn default_font(&self) -> &'static str {
        match self {
            Mode::Academic => "Lora",
            _ => "Inter",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownMode(s.to_string()))
    }
}

/// CV layout variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvLayout {
    #[default]
    Modern,
    Classic,
    Minimal,
    Executive,
    Creative,
}

impl CvLayout {
    pub const ALL: [CvLayout; 5] = [
        CvLayout::Modern,
        CvLayout::Classic,
        CvLayout::Minimal,
        CvLayout::Executive,
        CvLayout::Creative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CvLayout::Modern => "modern",
            CvLayout::Classic => "classic",
            CvLayout::Minimal => "minimal",
            CvLayout::Executive => "executive",
            CvLayout::Creative => "creative",
        }
    }
}

impl fmt::Display for CvLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CvLayout {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CvLayout::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownLayout(s.to_string()))
    }
}

/// Addresses exactly one persisted document: a mode plus an optional variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateKey {
    pub mode: Mode,
    pub variant: Option<String>,
}

impl TemplateKey {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            variant: None,
        }
    }

    pub fn with_variant(mode: Mode, variant: impl Into<String>) -> Self {
        let variant = variant.into();
        Self {
            mode,
            variant: (!variant.is_empty()).then_some(variant),
        }
    }

    /// Key for a CV in the given layout
    pub fn cv(layout: CvLayout) -> Self {
        Self::with_variant(Mode::Cv, layout.as_str())
    }

    /// Storage key in the `{mode}_{variant-or-empty}` format
    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.mode, self.variant.as_deref().unwrap_or(""))
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{} ({})", self.mode, variant),
            None => write!(f, "{}", self.mode),
        }
    }
}
