//! Analysis suite orchestration.
//!
//! Turns mutation files into normalized dyad position counts by driving the
//! pipeline stages in order:
//!
//! 1. optional custom background generation (the suite run on the background
//!    mutations without normalization),
//! 2. sequence context expansion where a file's context is too narrow,
//! 3. dyad position counting,
//! 4. background generation and normalization.
//!
//! The stage bodies are supplied through [`AnalysisStages`]; this module only
//! decides which stages run, on which files, and in which order.

use crate::bed::{BedError, Result};
use crate::config::{AnalysisConfig, DyadRadii, NormalizationMethod, SequenceContext};
use crate::discover::{files_in_directory, MUTATIONS_SUFFIX};
use log::info;
use std::fmt;
use std::path::{Path, PathBuf};

/// What the normalization stage should normalize against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationRequest<'a> {
    /// Nucleosome mutation backgrounds computed in this run.
    Background { background_counts: &'a [PathBuf] },
    /// Raw counts of this run against counts already present in a directory.
    Custom {
        raw_counts: &'a [PathBuf],
        background_dir: &'a Path,
    },
}

/// The pipeline stages driven by [`run_analysis_suite`]. Each returns the files
/// it produced.
pub trait AnalysisStages {
    /// Expand a mutation file to at least `context` bases of sequence context.
    fn expand_context(&mut self, mutation_file: &Path, context: u8) -> Result<Vec<PathBuf>>;

    /// Count mutations at each dyad position.
    fn count_nucleosome_positions(
        &mut self,
        mutation_files: &[PathBuf],
        nucleosome_maps: &[String],
        radii: DyadRadii,
    ) -> Result<Vec<PathBuf>>;

    /// Genome-wide mutation background for the given context width.
    fn generate_mutation_background(
        &mut self,
        mutation_files: &[PathBuf],
        context: u8,
    ) -> Result<Vec<PathBuf>>;

    /// Expected mutations at each dyad position.
    fn generate_nucleosome_background(
        &mut self,
        mutation_backgrounds: &[PathBuf],
        nucleosome_maps: &[String],
        radii: DyadRadii,
    ) -> Result<Vec<PathBuf>>;

    fn normalize_counts(&mut self, request: NormalizationRequest<'_>) -> Result<Vec<PathBuf>>;
}

/// Files produced by one suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    /// Mutation files after context expansion.
    pub mutation_files: Vec<PathBuf>,
    pub dyad_counts: Vec<PathBuf>,
    pub mutation_backgrounds: Vec<PathBuf>,
    pub nucleosome_backgrounds: Vec<PathBuf>,
    pub normalized_counts: Vec<PathBuf>,
    /// Report of the custom background run, when one was generated first.
    pub background: Option<Box<AnalysisReport>>,
}

/// Run the analysis suite described by `config`.
pub fn run_analysis_suite<S: AnalysisStages + ?Sized>(
    config: &AnalysisConfig,
    stages: &mut S,
) -> Result<AnalysisReport> {
    config.validate()?;

    let background = if config.generate_background_now {
        Some(Box::new(generate_custom_background(config, stages)?))
    } else {
        None
    };

    let mut report = run_suite(config, stages)?;
    report.background = background;
    Ok(report)
}

/// Run the suite without normalization on the single mutation file of the
/// custom background directory.
fn generate_custom_background<S: AnalysisStages + ?Sized>(
    config: &AnalysisConfig,
    stages: &mut S,
) -> Result<AnalysisReport> {
    let dir = background_dir(config)?;
    info!("Generating background counts...");

    let mut found = files_in_directory(dir, MUTATIONS_SUFFIX, false)?;
    let background_file = match found.len() {
        1 => found.remove(0),
        0 => {
            return Err(BedError::Configuration(format!(
                "No parsed mutation file in the directory {}",
                dir.display()
            )))
        }
        n => {
            return Err(BedError::Configuration(format!(
                "Expected one parsed mutation file in {}, found {}",
                dir.display(),
                n
            )))
        }
    };

    let background_config = AnalysisConfig {
        mutation_files: vec![background_file],
        normalization: NormalizationMethod::None,
        custom_background_dir: None,
        generate_background_now: false,
        ..config.clone()
    };
    let report = run_suite(&background_config, stages)?;
    info!("Finished generating background!");
    Ok(report)
}

fn background_dir(config: &AnalysisConfig) -> Result<&Path> {
    config.custom_background_dir.as_deref().ok_or_else(|| {
        BedError::Configuration("Custom background normalization requires a background directory.".into())
    })
}

fn run_suite<S: AnalysisStages + ?Sized>(config: &AnalysisConfig, stages: &mut S) -> Result<AnalysisReport> {
    let radii = config.radii();
    let context = config.normalization.context_number();

    let mutation_files = match context {
        Some(context) => {
            info!("Expanding file context where necessary...");
            ensure_context(&config.mutation_files, context, stages)?
        }
        None => config.mutation_files.clone(),
    };

    info!("Counting mutations at each dyad position...");
    let dyad_counts =
        stages.count_nucleosome_positions(&mutation_files, &config.nucleosome_maps, radii)?;

    let mut report = AnalysisReport {
        dyad_counts,
        ..Default::default()
    };

    if let Some(context) = context {
        info!("Generating genome-wide mutation background...");
        report.mutation_backgrounds = stages.generate_mutation_background(&mutation_files, context)?;

        info!("Generating nucleosome mutation background...");
        report.nucleosome_backgrounds = stages.generate_nucleosome_background(
            &report.mutation_backgrounds,
            &config.nucleosome_maps,
            radii,
        )?;

        info!("Normalizing counts with nucleosome background data...");
        report.normalized_counts = stages.normalize_counts(NormalizationRequest::Background {
            background_counts: &report.nucleosome_backgrounds,
        })?;
    } else if config.normalization == NormalizationMethod::CustomBackground {
        info!("Normalizing counts using custom background data...");
        report.normalized_counts = stages.normalize_counts(NormalizationRequest::Custom {
            raw_counts: &report.dyad_counts,
            background_dir: background_dir(config)?,
        })?;
    }

    report.mutation_files = mutation_files;
    Ok(report)
}

/// Replace every file whose context is narrower than `context` with its
/// expanded counterpart.
fn ensure_context<S: AnalysisStages + ?Sized>(
    files: &[PathBuf],
    context: u8,
    stages: &mut S,
) -> Result<Vec<PathBuf>> {
    let mut updated = Vec::with_capacity(files.len());
    for file in files {
        let file_context = file_context(file)?;
        if file_context.width() < context {
            updated.extend(stages.expand_context(file, context)?);
        } else {
            updated.push(file.clone());
        }
    }
    Ok(updated)
}

fn file_context(file: &Path) -> Result<SequenceContext> {
    let display_name = || {
        file.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string())
    };
    match SequenceContext::from_file_name(file) {
        None => Err(BedError::Configuration(format!(
            "Malformed file name. Context is not clear for {}",
            display_name()
        ))),
        Some(SequenceContext::Mixed) => Err(BedError::Configuration(format!(
            "Mixed context files cannot be normalized by sequence context: {}",
            display_name()
        ))),
        Some(ctx) => Ok(ctx),
    }
}

/// A stage recorded by [`PlannedStages`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedStage {
    ExpandContext { file: PathBuf, context: u8 },
    CountNucleosomePositions { files: usize, maps: usize },
    GenerateMutationBackground { files: usize, context: u8 },
    GenerateNucleosomeBackground { files: usize, maps: usize },
    NormalizeCounts { custom: bool, files: usize },
}

impl fmt::Display for PlannedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedStage::ExpandContext { file, context } => write!(
                f,
                "expand context of {} to {}",
                file.display(),
                context_label(*context)
            ),
            PlannedStage::CountNucleosomePositions { files, maps } => write!(
                f,
                "count dyad positions for {} mutation file(s) over {} nucleosome map(s)",
                files, maps
            ),
            PlannedStage::GenerateMutationBackground { files, context } => write!(
                f,
                "generate {} mutation background for {} file(s)",
                context_label(*context),
                files
            ),
            PlannedStage::GenerateNucleosomeBackground { files, maps } => write!(
                f,
                "generate nucleosome background from {} background(s) over {} map(s)",
                files, maps
            ),
            PlannedStage::NormalizeCounts { custom: true, files } => {
                write!(f, "normalize {} count file(s) against custom background", files)
            }
            PlannedStage::NormalizeCounts { custom: false, files } => {
                write!(f, "normalize with {} nucleosome background(s)", files)
            }
        }
    }
}

fn context_label(context: u8) -> &'static str {
    match context {
        1 => "singlenuc",
        2 => "dinuc",
        3 => "trinuc",
        4 => "quadrunuc",
        5 => "pentanuc",
        6 => "hexanuc",
        _ => "mixed",
    }
}

/// Dry-run stages: each call is logged and recorded, and the file names the
/// real stage would produce are returned.
#[derive(Debug, Default)]
pub struct PlannedStages {
    stages: Vec<PlannedStage>,
}

impl PlannedStages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> &[PlannedStage] {
        &self.stages
    }

    fn record(&mut self, stage: PlannedStage) {
        info!("Planned: {}", stage);
        self.stages.push(stage);
    }
}

/// `<dir>/<stem>_<suffix>` where the stem drops a trailing `_mutations.bed`.
fn derived_path(file: &Path, suffix: &str) -> PathBuf {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name
        .strip_suffix(MUTATIONS_SUFFIX)
        .map(|s| s.trim_end_matches('_'))
        .unwrap_or_else(|| name.trim_end_matches(".bed"));
    file.with_file_name(format!("{}_{}", stem, suffix))
}

fn radius_labels(radii: DyadRadii) -> Vec<String> {
    let mut labels = Vec::new();
    if radii.single_nuc.is_some() {
        if radii.linker_offset > 0 {
            labels.push(format!("nuc-strand_{}bp_linker", radii.linker_offset));
        } else {
            labels.push("nuc-strand".to_string());
        }
    }
    if radii.nuc_group.is_some() {
        labels.push("nuc-group".to_string());
    }
    labels
}

impl AnalysisStages for PlannedStages {
    fn expand_context(&mut self, mutation_file: &Path, context: u8) -> Result<Vec<PathBuf>> {
        self.record(PlannedStage::ExpandContext {
            file: mutation_file.to_path_buf(),
            context,
        });
        let name = mutation_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let expanded = match SequenceContext::from_file_name(mutation_file) {
            Some(from) => name.replacen(
                &format!("_{}_context", from),
                &format!("_{}_context", context_label(context)),
                1,
            ),
            None => name,
        };
        Ok(vec![mutation_file.with_file_name(expanded)])
    }

    fn count_nucleosome_positions(
        &mut self,
        mutation_files: &[PathBuf],
        nucleosome_maps: &[String],
        radii: DyadRadii,
    ) -> Result<Vec<PathBuf>> {
        self.record(PlannedStage::CountNucleosomePositions {
            files: mutation_files.len(),
            maps: nucleosome_maps.len(),
        });
        let labels = radius_labels(radii);
        let mut outputs = Vec::new();
        for file in mutation_files {
            for map in nucleosome_maps {
                for label in &labels {
                    outputs.push(derived_path(
                        file,
                        &format!("{}_{}_raw_nucleosome_mutation_counts.tsv", map, label),
                    ));
                }
            }
        }
        Ok(outputs)
    }

    fn generate_mutation_background(
        &mut self,
        mutation_files: &[PathBuf],
        context: u8,
    ) -> Result<Vec<PathBuf>> {
        self.record(PlannedStage::GenerateMutationBackground {
            files: mutation_files.len(),
            context,
        });
        Ok(mutation_files
            .iter()
            .map(|f| derived_path(f, &format!("{}_mutation_background.tsv", context_label(context))))
            .collect())
    }

    fn generate_nucleosome_background(
        &mut self,
        mutation_backgrounds: &[PathBuf],
        nucleosome_maps: &[String],
        radii: DyadRadii,
    ) -> Result<Vec<PathBuf>> {
        self.record(PlannedStage::GenerateNucleosomeBackground {
            files: mutation_backgrounds.len(),
            maps: nucleosome_maps.len(),
        });
        let labels = radius_labels(radii);
        let mut outputs = Vec::new();
        for file in mutation_backgrounds {
            for map in nucleosome_maps {
                for label in &labels {
                    outputs.push(file.with_file_name(format!(
                        "{}_{}_{}_nucleosome_mutation_background.tsv",
                        file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
                        map,
                        label
                    )));
                }
            }
        }
        Ok(outputs)
    }

    fn normalize_counts(&mut self, request: NormalizationRequest<'_>) -> Result<Vec<PathBuf>> {
        let (custom, inputs) = match request {
            NormalizationRequest::Background { background_counts } => (false, background_counts),
            NormalizationRequest::Custom { raw_counts, .. } => (true, raw_counts),
        };
        self.record(PlannedStage::NormalizeCounts {
            custom,
            files: inputs.len(),
        });
        Ok(inputs
            .iter()
            .map(|f| {
                let stem = f.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
                f.with_file_name(format!("{}_normalized.tsv", stem))
            })
            .collect())
    }
}
