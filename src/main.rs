// Clippy allows
#![allow(clippy::too_many_arguments)]

//! mutperiod: mutation periodicity around nucleosomes
//!
//! Usage: mutperiod <COMMAND> [OPTIONS]

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use mutperiod::bed::{BedError, BedReader};
use mutperiod::commands::{
    read_counts_table, run_analysis_suite, KucabCommand, OverlapCountCommand, PlannedStages,
    SortCommand, StratifiedRewriter, StratifyCommand, UvdeCommand,
};
use mutperiod::config::{AnalysisConfig, NormalizationMethod};
use mutperiod::discover::{collect_files_with_suffix, nucleosome_map_names, MUTATIONS_SUFFIX};
use mutperiod::streaming::output::write_atomically;

#[derive(Parser)]
#[command(name = "mutperiod")]
#[command(version)]
#[command(about = "Mutation periodicity around nucleosomes - data preparation and analysis orchestration", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count the encompassing ranges containing each encompassed position
    Count {
        /// Sorted BED file of encompassing ranges
        #[arg(short = 'a', long)]
        encompassing: PathBuf,

        /// Sorted BED6 file of encompassed positions
        #[arg(short = 'b', long)]
        encompassed: PathBuf,

        /// Counts table to write (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Header of the identity column
        #[arg(long, default_value = "Encompassed_Feature")]
        label: String,

        /// Skip sorted validation (faster for pre-sorted input)
        #[arg(long)]
        assume_sorted: bool,

        /// Print counting statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Copy the original lines of positions with a nonzero count
    Rewrite {
        /// Sorted BED6 file the counts were computed for
        #[arg(long)]
        original: PathBuf,

        /// Counts table written by `count`
        #[arg(long)]
        counts: PathBuf,

        /// Output BED file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Stratify a nucleosome map by feature ranges
    Stratify {
        /// Base nucleosome map directory, or the map file inside it
        #[arg(short = 'm', long)]
        base_map: PathBuf,

        /// Feature range files, each in its own stratification directory
        #[arg(short, long, num_args = 1.., required = true)]
        features: Vec<PathBuf>,

        /// Skip sorted validation (faster for pre-sorted input)
        #[arg(long)]
        assume_sorted: bool,

        /// Print counting statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Sort a BED file by chromosome and position
    Sort {
        /// Input BED file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Replace the input file with its sorted version
        #[arg(long, requires = "input")]
        in_place: bool,
    },

    /// Convert Kucab et al. compendium substitutions to trinuc context bed files
    ParseKucab {
        /// Compendium files (*final.txt) or directories containing them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Keep every PAH designation instead of only the smoker-lung subset
        #[arg(long)]
        all_pahs: bool,
    },

    /// Split UVDE-seq 2-bp lesions into singlenuc context bed files
    ParseUvde {
        /// UVDE-seq bed files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Validate an analysis suite configuration and print its stage plan
    Analyze {
        /// Mutation files, or directories searched for *mutations.bed
        #[arg(short, long, num_args = 1.., required = true)]
        mutations: Vec<PathBuf>,

        /// Nucleosome map directories or map files
        #[arg(short, long, num_args = 1.., required = true)]
        nucleosome_maps: Vec<PathBuf>,

        /// Normalize by sequence context (1-2 singlenuc, 3-4 trinuc, 5-6 pentanuc)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=6))]
        context_normalization: Option<u8>,

        /// Custom background directory, or a file inside it
        #[arg(short, long, conflicts_with = "context_normalization")]
        background: Option<PathBuf>,

        /// Generate the custom background counts before the main run
        #[arg(short, long, requires = "background")]
        generate_background: bool,

        /// Count with a single nucleosome dyad radius (73 bp)
        #[arg(short, long)]
        singlenuc_radius: bool,

        /// Include 30 bp linker DNA on either side of the single nucleosome radius
        #[arg(short = 'l', long)]
        add_linker: bool,

        /// Count with a nucleosome group radius (1000 bp)
        #[arg(short = 'r', long)]
        nuc_group_radius: bool,
    },
}

fn set_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();
    set_logging(cli.verbose);

    // Configure thread pool if --threads specified
    if let Some(n) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(n).build_global() {
            eprintln!("Error: failed to initialize thread pool: {}", e);
            process::exit(1);
        }
    }

    let result = match cli.command {
        Commands::Count {
            encompassing,
            encompassed,
            output,
            label,
            assume_sorted,
            stats,
        } => run_count(encompassing, encompassed, output, label, assume_sorted, stats),

        Commands::Rewrite {
            original,
            counts,
            output,
        } => run_rewrite(original, counts, output),

        Commands::Stratify {
            base_map,
            features,
            assume_sorted,
            stats,
        } => run_stratify(base_map, features, assume_sorted, stats),

        Commands::Sort { input, in_place } => run_sort(input, in_place),

        Commands::ParseKucab { inputs, all_pahs } => run_parse_kucab(inputs, all_pahs),

        Commands::ParseUvde { inputs } => run_parse_uvde(inputs),

        Commands::Analyze {
            mutations,
            nucleosome_maps,
            context_normalization,
            background,
            generate_background,
            singlenuc_radius,
            add_linker,
            nuc_group_radius,
        } => run_analyze(
            mutations,
            nucleosome_maps,
            context_normalization,
            background,
            generate_background,
            singlenuc_radius,
            add_linker,
            nuc_group_radius,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_count(
    encompassing: PathBuf,
    encompassed: PathBuf,
    output: Option<PathBuf>,
    label: String,
    assume_sorted: bool,
    stats: bool,
) -> Result<(), BedError> {
    let cmd = OverlapCountCommand {
        assume_sorted,
        label,
    };

    let result = match output {
        Some(path) => cmd.run(&encompassing, &encompassed, &path)?.1,
        None => {
            let (counts, result) = cmd.count_files(&encompassing, &encompassed)?;
            let stdout = io::stdout();
            cmd.write_table(&counts, stdout.lock())?;
            result
        }
    };

    if stats {
        eprintln!("Overlap count stats: {}", result);
    }
    Ok(())
}

fn run_rewrite(original: PathBuf, counts: PathBuf, output: Option<PathBuf>) -> Result<(), BedError> {
    let counts = read_counts_table(&counts)?;
    let rewriter = StratifiedRewriter::new();

    match output {
        Some(path) => {
            write_atomically(&path, |file| {
                let records = BedReader::from_path(&original)?.positions();
                rewriter.rewrite_counts(records, &counts, file)
            })?;
        }
        None => {
            let records = BedReader::from_path(&original)?.positions();
            let stdout = io::stdout();
            rewriter.rewrite_counts(records, &counts, stdout.lock())?;
        }
    }
    Ok(())
}

fn run_stratify(
    base_map: PathBuf,
    features: Vec<PathBuf>,
    assume_sorted: bool,
    stats: bool,
) -> Result<(), BedError> {
    let cmd = StratifyCommand { assume_sorted };
    let outcomes = cmd.run(&base_map, &features)?;

    for outcome in &outcomes {
        println!(
            "{}\t{}",
            outcome.job.stratified_map.display(),
            outcome.retained
        );
        if stats {
            eprintln!(
                "{}: {}",
                outcome.job.features.display(),
                outcome.stats
            );
        }
    }
    Ok(())
}

fn run_sort(input: Option<PathBuf>, in_place: bool) -> Result<(), BedError> {
    let cmd = SortCommand::new();
    let stdout = io::stdout();
    let handle = stdout.lock();

    match input {
        Some(path) if in_place => {
            cmd.sort_file_in_place(&path)?;
        }
        Some(path) if path.to_string_lossy() != "-" => {
            let file = File::open(&path)?;
            cmd.run(file, handle, &path.display().to_string())?;
        }
        _ => {
            cmd.run(io::stdin().lock(), handle, "<stdin>")?;
        }
    }
    Ok(())
}

fn print_outputs(outputs: &[PathBuf]) -> Result<(), BedError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for path in outputs {
        writeln!(handle, "{}", path.display())?;
    }
    Ok(())
}

fn run_parse_kucab(inputs: Vec<PathBuf>, all_pahs: bool) -> Result<(), BedError> {
    let files = collect_files_with_suffix(&inputs, mutperiod::commands::kucab::INPUT_SUFFIX)?;
    if files.is_empty() {
        return Err(BedError::InputShape("No Kucab compendium files were found.".into()));
    }
    let outputs = KucabCommand::new(all_pahs).run_all(&files)?;
    print_outputs(&outputs)
}

fn run_parse_uvde(inputs: Vec<PathBuf>) -> Result<(), BedError> {
    let outputs = UvdeCommand::new().run_all(&inputs)?;
    print_outputs(&outputs)
}

/// Custom background directory: a file argument resolves to its directory.
fn background_dir(path: &Path) -> Result<PathBuf, BedError> {
    if path.is_dir() {
        Ok(std::path::absolute(path)?)
    } else {
        mutperiod::discover::parent_dir(path)
    }
}

fn run_analyze(
    mutations: Vec<PathBuf>,
    nucleosome_maps: Vec<PathBuf>,
    context_normalization: Option<u8>,
    background: Option<PathBuf>,
    generate_background: bool,
    singlenuc_radius: bool,
    add_linker: bool,
    nuc_group_radius: bool,
) -> Result<(), BedError> {
    let mutation_files = collect_files_with_suffix(&mutations, MUTATIONS_SUFFIX)?;
    if mutation_files.is_empty() {
        return Err(BedError::Configuration("No bed mutation files were found.".into()));
    }
    let nucleosome_maps = nucleosome_map_names(&nucleosome_maps)?;

    let (normalization, custom_background_dir) = match (context_normalization, background) {
        (Some(flag), _) => (NormalizationMethod::from_context_flag(flag)?, None),
        (None, Some(path)) => (
            NormalizationMethod::CustomBackground,
            Some(background_dir(&path)?),
        ),
        (None, None) => (NormalizationMethod::None, None),
    };

    let config = AnalysisConfig {
        mutation_files,
        nucleosome_maps,
        normalization,
        custom_background_dir,
        generate_background_now: generate_background,
        single_nuc_radius: singlenuc_radius,
        include_linker: add_linker,
        nuc_group_radius,
    };

    let mut stages = PlannedStages::new();
    let report = run_analysis_suite(&config, &mut stages)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "Normalization: {}", config.normalization)?;
    for (i, stage) in stages.stages().iter().enumerate() {
        writeln!(handle, "{}. {}", i + 1, stage)?;
    }
    for path in &report.normalized_counts {
        writeln!(handle, "{}", path.display())?;
    }
    Ok(())
}
