//! Analysis configuration.
//!
//! Every option of an analysis run lives in [`AnalysisConfig`], built once by
//! the CLI layer and passed by reference. Nothing here is global.

use crate::bed::{BedError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Sequence context recorded in a mutation file name (`..._<context>_context...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SequenceContext {
    /// Files combining several contexts. Cannot be normalized by context.
    Mixed,
    Singlenuc,
    Dinuc,
    Trinuc,
    Quadrunuc,
    Pentanuc,
    Hexanuc,
}

impl SequenceContext {
    const NAMED: [(&'static str, SequenceContext); 7] = [
        ("mixed", SequenceContext::Mixed),
        ("singlenuc", SequenceContext::Singlenuc),
        ("dinuc", SequenceContext::Dinuc),
        ("trinuc", SequenceContext::Trinuc),
        ("quadrunuc", SequenceContext::Quadrunuc),
        ("pentanuc", SequenceContext::Pentanuc),
        ("hexanuc", SequenceContext::Hexanuc),
    ];

    /// Number of bases in the context, 0 for mixed.
    pub fn width(self) -> u8 {
        match self {
            SequenceContext::Mixed => 0,
            SequenceContext::Singlenuc => 1,
            SequenceContext::Dinuc => 2,
            SequenceContext::Trinuc => 3,
            SequenceContext::Quadrunuc => 4,
            SequenceContext::Pentanuc => 5,
            SequenceContext::Hexanuc => 6,
        }
    }

    pub fn name(self) -> &'static str {
        Self::NAMED
            .iter()
            .find(|(_, ctx)| *ctx == self)
            .map(|(name, _)| *name)
            .unwrap_or("mixed")
    }

    /// Context named in a file name, if any.
    pub fn from_file_name(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy();
        Self::NAMED.iter().find_map(|(name, ctx)| {
            let marker = format!("_{}_context", name);
            file_name.contains(marker.as_str()).then_some(*ctx)
        })
    }
}

impl fmt::Display for SequenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How dyad position counts are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationMethod {
    #[default]
    None,
    /// Singlenuc/dinuc background.
    Singlenuc,
    /// Trinuc/quadrunuc background.
    Trinuc,
    /// Pentanuc/hexanuc background.
    Pentanuc,
    /// Raw counts from another dataset serve as the background.
    CustomBackground,
}

impl NormalizationMethod {
    /// Map a numeric context flag (1-6) to its normalization method.
    pub fn from_context_flag(flag: u8) -> Result<Self> {
        match flag {
            1 | 2 => Ok(NormalizationMethod::Singlenuc),
            3 | 4 => Ok(NormalizationMethod::Trinuc),
            5 | 6 => Ok(NormalizationMethod::Pentanuc),
            other => Err(BedError::Configuration(format!(
                "context normalization must be between 1 and 6, got {}",
                other
            ))),
        }
    }

    /// Context width a sequence-context background needs.
    pub fn context_number(self) -> Option<u8> {
        match self {
            NormalizationMethod::Singlenuc => Some(1),
            NormalizationMethod::Trinuc => Some(3),
            NormalizationMethod::Pentanuc => Some(5),
            NormalizationMethod::None | NormalizationMethod::CustomBackground => None,
        }
    }
}

impl fmt::Display for NormalizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NormalizationMethod::None => "No Normalization",
            NormalizationMethod::Singlenuc => "Singlenuc/Dinuc",
            NormalizationMethod::Trinuc => "Trinuc/Quadrunuc",
            NormalizationMethod::Pentanuc => "Pentanuc/Hexanuc",
            NormalizationMethod::CustomBackground => "Custom Background",
        };
        f.write_str(name)
    }
}

impl FromStr for NormalizationMethod {
    type Err = BedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "no normalization" => Ok(NormalizationMethod::None),
            "singlenuc" | "dinuc" | "singlenuc/dinuc" => Ok(NormalizationMethod::Singlenuc),
            "trinuc" | "quadrunuc" | "trinuc/quadrunuc" => Ok(NormalizationMethod::Trinuc),
            "pentanuc" | "hexanuc" | "pentanuc/hexanuc" => Ok(NormalizationMethod::Pentanuc),
            "custom" | "custom background" => Ok(NormalizationMethod::CustomBackground),
            _ => Err(BedError::Configuration(format!(
                "unknown normalization method '{}'",
                s
            ))),
        }
    }
}

/// Dyad radii and linker offset used when counting around nucleosomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DyadRadii {
    /// Single nucleosome radius, if selected.
    pub single_nuc: Option<u32>,
    /// Nucleosome group radius, if selected.
    pub nuc_group: Option<u32>,
    /// Linker DNA added on either side of the single nucleosome radius.
    pub linker_offset: u32,
}

impl DyadRadii {
    pub const SINGLE_NUC_RADIUS: u32 = 73;
    pub const NUC_GROUP_RADIUS: u32 = 1000;
    pub const LINKER_OFFSET: u32 = 30;
}

/// Options of one analysis suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub mutation_files: Vec<PathBuf>,
    pub nucleosome_maps: Vec<String>,
    pub normalization: NormalizationMethod,
    /// Directory holding the custom background mutation file or its counts.
    pub custom_background_dir: Option<PathBuf>,
    /// Run the suite on the custom background before the main run.
    pub generate_background_now: bool,
    pub single_nuc_radius: bool,
    pub include_linker: bool,
    pub nuc_group_radius: bool,
}

impl AnalysisConfig {
    /// Check the option combination before any stage runs.
    pub fn validate(&self) -> Result<()> {
        if !self.single_nuc_radius && !self.nuc_group_radius {
            return Err(BedError::Configuration(
                "Must select at least one radius.".into(),
            ));
        }
        if self.mutation_files.is_empty() {
            return Err(BedError::Configuration(
                "No valid input files given.".into(),
            ));
        }
        if self.nucleosome_maps.is_empty() {
            return Err(BedError::Configuration(
                "No nucleosome maps were given.".into(),
            ));
        }
        if self.normalization == NormalizationMethod::CustomBackground
            && self.custom_background_dir.is_none()
        {
            return Err(BedError::Configuration(
                "Custom background normalization requires a background directory.".into(),
            ));
        }
        if self.generate_background_now
            && self.normalization != NormalizationMethod::CustomBackground
        {
            return Err(BedError::Configuration(
                "Background generation requested, but no background given.".into(),
            ));
        }
        Ok(())
    }

    pub fn radii(&self) -> DyadRadii {
        DyadRadii {
            single_nuc: self.single_nuc_radius.then_some(DyadRadii::SINGLE_NUC_RADIUS),
            nuc_group: self.nuc_group_radius.then_some(DyadRadii::NUC_GROUP_RADIUS),
            linker_offset: if self.include_linker {
                DyadRadii::LINKER_OFFSET
            } else {
                0
            },
        }
    }
}
