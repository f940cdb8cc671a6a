//! GenomeTrace CLI entry point
//!
//! Builds plot tables for a linear genome drawing or a 3D structural model
//! from an annotation database.

use clap::{Args, Parser, Subcommand, ValueEnum};
use genome_trace::core::{
    build_linear_plot, build_model_plot, resolve_model_segments, ColorConfig, ColorMode,
    FeatureQuery, GenomeLayout, LengthCache, PlotTable, ResolverConfig, SqliteSource,
    DEFAULT_EXCLUDED_TYPE,
};
use genome_trace::formats::{self, PlotFormat};
use genome_trace::StructuralModel;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Color policy (CLI enum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum ColorModeArg {
    /// Gradient between the observed minimum and maximum
    #[default]
    #[value(name = "continuous")]
    Continuous,
    /// Ten labelled bins capped by --threshold
    #[value(name = "semi_continuous")]
    SemiContinuous,
    /// Explicit --values colored by --colors
    #[value(name = "discreet", alias = "discrete")]
    Discrete,
}

impl From<ColorModeArg> for ColorMode {
    fn from(arg: ColorModeArg) -> Self {
        match arg {
            ColorModeArg::Continuous => ColorMode::Continuous,
            ColorModeArg::SemiContinuous => ColorMode::SemiContinuous,
            ColorModeArg::Discrete => ColorMode::Discrete,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum FormatArg {
    /// Tab-separated rows, breaks written as "none"
    #[default]
    #[value(name = "tsv")]
    Tsv,
    /// One JSON document with rows, color map and ticks
    #[value(name = "json")]
    Json,
}

impl From<FormatArg> for PlotFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Tsv => PlotFormat::Tsv,
            FormatArg::Json => PlotFormat::Json,
        }
    }
}

#[derive(Parser)]
#[command(name = "genome-trace")]
#[command(about = "Genome annotations and 3D structural models as plot traces")]
#[command(version)]
#[command(author = "GenomeTrace Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every colored plot
#[derive(Args)]
struct ColorArgs {
    /// Color policy
    #[arg(short = 'm', long, default_value = "continuous")]
    mode: ColorModeArg,
    /// Feature column to color by
    #[arg(short = 'p', long, default_value = "Feature_type")]
    parameter: String,
    /// Categories for discreet mode, comma separated
    #[arg(long, value_delimiter = ',')]
    values: Vec<String>,
    /// Colors for --values, same order
    #[arg(long, value_delimiter = ',')]
    colors: Vec<String>,
    /// Upper cap for semi_continuous bins
    #[arg(long)]
    threshold: Option<f64>,
    /// Extra feature columns shown on hover
    #[arg(long, value_delimiter = ',')]
    hover: Vec<String>,
}

impl ColorArgs {
    fn config(&self) -> ColorConfig {
        let mut config = ColorConfig::new(self.mode.into(), self.parameter.clone())
            .with_categories(self.values.clone(), self.colors.clone())
            .with_hover(self.hover.clone());
        if let Some(threshold) = self.threshold {
            config = config.with_threshold(threshold);
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Linear genome: chromosome bars with features on strand lanes
    Linear {
        /// Annotation database (SQLite)
        #[arg(long)]
        db: PathBuf,
        /// Feature table
        #[arg(short = 't', long, default_value = "loci")]
        table: String,
        #[command(flatten)]
        color: ColorArgs,
        /// Vertical distance between chromosomes
        #[arg(long, default_value = "6.0")]
        spacing: f64,
        /// Output format
        #[arg(short = 'f', long, default_value = "tsv")]
        format: FormatArg,
        /// Output file (stdout if not specified)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// 3D structural model colored by the features under each segment
    Model {
        /// Annotation database (SQLite)
        #[arg(long)]
        db: PathBuf,
        /// Feature table
        #[arg(short = 't', long, default_value = "loci")]
        table: String,
        /// Model coordinates: chrom, x, y, z per line (.gz/.bz2 accepted)
        #[arg(long)]
        model: PathBuf,
        #[command(flatten)]
        color: ColorArgs,
        /// Feature types never assigned to a segment
        #[arg(long = "exclude-type", value_delimiter = ',', default_value = DEFAULT_EXCLUDED_TYPE)]
        exclude_types: Vec<String>,
        /// Output format
        #[arg(short = 'f', long, default_value = "tsv")]
        format: FormatArg,
        /// Output file (stdout if not specified)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Genomic extent and feature of every model segment
    Segments {
        /// Annotation database (SQLite)
        #[arg(long)]
        db: PathBuf,
        /// Feature table
        #[arg(short = 't', long, default_value = "loci")]
        table: String,
        /// Model coordinates: chrom, x, y, z per line (.gz/.bz2 accepted)
        #[arg(long)]
        model: PathBuf,
        /// Feature types never assigned to a segment
        #[arg(long = "exclude-type", value_delimiter = ',', default_value = DEFAULT_EXCLUDED_TYPE)]
        exclude_types: Vec<String>,
        /// Output file (stdout if not specified)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

fn open_source(db: &Path) -> anyhow::Result<LengthCache<SqliteSource>> {
    let source = SqliteSource::open(db)
        .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;
    Ok(LengthCache::new(source))
}

fn load_model(path: &Path) -> anyhow::Result<StructuralModel> {
    let start = Instant::now();
    eprintln!("Loading structural model: {:?}", path);
    let model = formats::read_model_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load model file: {}", e))?;
    eprintln!(
        "Model loaded in {:.2}s ({} points)",
        start.elapsed().as_secs_f64(),
        model.total_points()
    );
    Ok(model)
}

fn write_plot(table: &PlotTable, format: FormatArg, output: Option<&Path>, start: Instant) -> anyhow::Result<()> {
    let out = formats::open_output(output)?;
    formats::write_table(table, format.into(), out)?;

    eprintln!("\n=== Plot Statistics ===");
    eprintln!("Rows:            {}", table.len());
    eprintln!("Break rows:      {}", table.rows.iter().filter(|r| r.is_break()).count());
    eprintln!("Color keys:      {}", table.color_map.len());
    eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::Linear { db, table, color, spacing, format, output } => {
            let source = open_source(&db)?;
            let layout = GenomeLayout::with_spacing(spacing);

            eprintln!("Building linear plot: {:?} table '{}'", db, table);
            let plot = build_linear_plot(&source, &FeatureQuery::new(table), &layout, &color.config())?;
            write_plot(&plot, format, output.as_deref(), start)?;
        }

        Commands::Model { db, table, model, color, exclude_types, format, output } => {
            let source = open_source(&db)?;
            let model = load_model(&model)?;
            let resolver = ResolverConfig { excluded_types: exclude_types };

            eprintln!("Building model plot: {:?} table '{}'", db, table);
            let plot = build_model_plot(
                &source,
                &FeatureQuery::new(table),
                &model,
                &resolver,
                &color.config(),
            )?;
            write_plot(&plot, format, output.as_deref(), start)?;
        }

        Commands::Segments { db, table, model, exclude_types, output } => {
            let source = open_source(&db)?;
            let model = load_model(&model)?;
            let resolver = ResolverConfig { excluded_types: exclude_types };

            let resolved = resolve_model_segments(&source, &FeatureQuery::new(table), &model, &resolver)?;
            formats::write_segments_tsv(&resolved, formats::open_output(output.as_deref())?)?;

            let segments: usize = resolved.iter().map(|c| c.segments.len()).sum();
            let hits: usize = resolved.iter().map(|c| c.resolved_count()).sum();
            eprintln!("\n=== Segment Statistics ===");
            eprintln!("Chromosomes:     {}", resolved.len());
            eprintln!("Segments:        {}", segments);
            eprintln!("Resolved:        {}", hits);
            eprintln!("Unresolved:      {}", segments - hits);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }
    }

    Ok(())
}
