//! Static registry of supported languages and visual themes.
//!
//! The registry is pure data fixed at build time. Entry order is the display
//! order of the language picker and is part of the public contract.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::errors::{EditorError, Result};

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    #[default]
    Javascript,
    Python,
    Java,
    Cpp,
    Html,
    Css,
    Typescript,
    Json,
}

impl LanguageId {
    pub fn parse(s: &str) -> Option<LanguageId> {
        LanguageId::from_str(s).ok()
    }

    pub fn label(&self) -> &'static str {
        Registry::entry(*self).label
    }
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    #[default]
    Dark,
    Light,
}

impl ThemeId {
    pub fn toggled(self) -> ThemeId {
        match self {
            ThemeId::Dark => ThemeId::Light,
            ThemeId::Light => ThemeId::Dark,
        }
    }

    /// Theme name understood by the embedded editing widget.
    pub fn widget_theme(&self) -> &'static str {
        match self {
            ThemeId::Dark => "vs-dark",
            ThemeId::Light => "light",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEntry {
    pub id: LanguageId,
    pub label: &'static str,
    /// Toolchain that executes this language, `None` for markup and data formats.
    pub backend: Option<&'static str>,
    pub extensions: &'static [&'static str],
}

static LANGUAGES: [LanguageEntry; 8] = [
    LanguageEntry {
        id: LanguageId::Javascript,
        label: "JavaScript",
        backend: Some("node"),
        extensions: &["js", "mjs", "cjs"],
    },
    LanguageEntry {
        id: LanguageId::Python,
        label: "Python",
        backend: Some("python3"),
        extensions: &["py"],
    },
    LanguageEntry {
        id: LanguageId::Java,
        label: "Java",
        backend: Some("java"),
        extensions: &["java"],
    },
    LanguageEntry {
        id: LanguageId::Cpp,
        label: "C++",
        backend: Some("g++"),
        extensions: &["cpp", "cc", "cxx"],
    },
    LanguageEntry {
        id: LanguageId::Html,
        label: "HTML",
        backend: None,
        extensions: &["html", "htm"],
    },
    LanguageEntry {
        id: LanguageId::Css,
        label: "CSS",
        backend: None,
        extensions: &["css"],
    },
    LanguageEntry {
        id: LanguageId::Typescript,
        label: "TypeScript",
        backend: Some("tsx"),
        extensions: &["ts"],
    },
    LanguageEntry {
        id: LanguageId::Json,
        label: "JSON",
        backend: None,
        extensions: &["json"],
    },
];

static THEMES: [ThemeId; 2] = [ThemeId::Dark, ThemeId::Light];

pub struct Registry;

impl Registry {
    /// All languages in display order.
    pub fn languages() -> &'static [LanguageEntry] {
        &LANGUAGES
    }

    pub fn themes() -> &'static [ThemeId] {
        &THEMES
    }

    pub fn lookup(id: &str) -> Result<&'static LanguageEntry> {
        LANGUAGES
            .iter()
            .find(|entry| entry.id.to_string() == id)
            .ok_or_else(|| EditorError::UnknownLanguage(id.to_string()))
    }

    pub fn entry(id: LanguageId) -> &'static LanguageEntry {
        // LANGUAGES is declared in the same order as the LanguageId variants.
        &LANGUAGES[id as usize]
    }

    pub fn contains(id: &str) -> bool {
        Self::lookup(id).is_ok()
    }

    pub fn infer_from_path(path: &Path) -> Option<LanguageId> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        LanguageId::iter().find(|id| Registry::entry(*id).extensions.contains(&ext.as_str()))
    }
}
