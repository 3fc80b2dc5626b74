//! PPE categories, operator overrides and detector label vocabulary.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A required piece of protective equipment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PpeCategory {
    Helmet,
    Mask,
    Gloves,
    Shoes,
}

impl PpeCategory {
    pub const ALL: [PpeCategory; 4] = [
        PpeCategory::Helmet,
        PpeCategory::Mask,
        PpeCategory::Gloves,
        PpeCategory::Shoes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PpeCategory::Helmet => "helmet",
            PpeCategory::Mask => "mask",
            PpeCategory::Gloves => "gloves",
            PpeCategory::Shoes => "shoes",
        }
    }

    /// Default detector label substrings accepted as evidence of this category.
    pub fn default_keywords(self) -> &'static [&'static str] {
        match self {
            PpeCategory::Helmet => &["helmet", "hat", "hardhat"],
            PpeCategory::Mask => &["mask", "face_mask"],
            PpeCategory::Gloves => &["glove"],
            PpeCategory::Shoes => &["shoe", "boot", "safety"],
        }
    }
}

impl fmt::Display for PpeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PpeCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "helmet" => Ok(PpeCategory::Helmet),
            "mask" => Ok(PpeCategory::Mask),
            "gloves" => Ok(PpeCategory::Gloves),
            "shoes" => Ok(PpeCategory::Shoes),
            other => Err(anyhow!(
                "unknown PPE category '{}' (expected helmet, mask, gloves or shoes)",
                other
            )),
        }
    }
}

/// Joins categories the way the violation journal prints them.
pub fn join_categories(items: &[PpeCategory]) -> String {
    items
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Operator-toggled flags forcing a category to count as satisfied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DemoOverrides {
    forced: BTreeMap<PpeCategory, bool>,
}

impl DemoOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_forced(&self, category: PpeCategory) -> bool {
        self.forced.get(&category).copied().unwrap_or(false)
    }

    pub fn set(&mut self, category: PpeCategory, forced: bool) {
        self.forced.insert(category, forced);
    }

    /// Flips the flag and returns the new value.
    pub fn toggle(&mut self, category: PpeCategory) -> bool {
        let next = !self.is_forced(category);
        self.set(category, next);
        next
    }

    pub fn forced(&self) -> impl Iterator<Item = PpeCategory> + '_ {
        self.forced
            .iter()
            .filter(|(_, forced)| **forced)
            .map(|(category, _)| *category)
    }
}

impl FromIterator<(PpeCategory, bool)> for DemoOverrides {
    fn from_iter<I: IntoIterator<Item = (PpeCategory, bool)>>(iter: I) -> Self {
        Self {
            forced: iter.into_iter().collect(),
        }
    }
}

/// Mapping from PPE category to accepted (lower-case) detector label substrings.
///
/// Detector vocabularies differ between models; new label names are added here
/// rather than in the matcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelVocabulary {
    keywords: BTreeMap<PpeCategory, Vec<String>>,
}

impl LabelVocabulary {
    pub fn keywords(&self, category: PpeCategory) -> &[String] {
        self.keywords
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Adds keywords for a category, skipping blanks and duplicates.
    pub fn extend<I, S>(&mut self, category: PpeCategory, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.keywords.entry(category).or_default();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !entry.contains(&keyword) {
                entry.push(keyword);
            }
        }
    }

    /// Replaces the keyword set for a category.
    pub fn replace<I, S>(&mut self, category: PpeCategory, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords.insert(category, Vec::new());
        self.extend(category, keywords);
    }

    pub fn validate(&self) -> Result<()> {
        for category in PpeCategory::ALL {
            if self.keywords(category).is_empty() {
                return Err(anyhow!("label vocabulary for {} is empty", category));
            }
        }
        Ok(())
    }
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        let mut vocab = Self {
            keywords: BTreeMap::new(),
        };
        for category in PpeCategory::ALL {
            vocab.extend(category, category.default_keywords());
        }
        vocab
    }
}
