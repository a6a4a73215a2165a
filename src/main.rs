use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use esaseek::{ApproxSearchParams, BuildConfig, CancellationToken, GenomeIndex, Hit, Sequence};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "esaseek", about = "Exact and approximate primer-site search with enhanced suffix arrays")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a genome index from a contigs file.
    Build {
        /// Contigs file, one contig per line (`<name> <sequence>` or `<sequence>`).
        contigs: PathBuf,
        /// Output index file.
        output: PathBuf,
        /// Prefix bucket depth (0 disables buckets).
        #[arg(long, default_value_t = 8)]
        bucket_depth: usize,
    },
    /// Report exact occurrences of a pattern on both strands.
    Find {
        /// Index file written by `build`.
        index: PathBuf,
        /// Pattern to search for.
        pattern: String,
    },
    /// Report approximate occurrences of a primer.
    Approx {
        /// Index file written by `build`.
        index: PathBuf,
        /// Query sequence.
        query: String,
        /// Seed window length.
        #[arg(long, default_value_t = 11)]
        word_size: usize,
        /// Distance between seed windows.
        #[arg(long, default_value_t = 1)]
        step_size: usize,
        /// Number of 3' bases aligned by the first filter.
        #[arg(long, default_value_t = 5)]
        three_prime_length: usize,
        /// Largest edit distance over the 3' bases.
        #[arg(long, default_value_t = 2)]
        three_prime_threshold: usize,
        /// Largest edit distance over the whole query.
        #[arg(long, default_value_t = 2)]
        whole_threshold: usize,
        /// Scan every seed window instead of stopping early.
        #[arg(long)]
        exhaustive: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            contigs,
            output,
            bucket_depth,
        } => run_build(&contigs, &output, bucket_depth)?,
        Commands::Find { index, pattern } => run_find(&index, &pattern)?,
        Commands::Approx {
            index,
            query,
            word_size,
            step_size,
            three_prime_length,
            three_prime_threshold,
            whole_threshold,
            exhaustive,
        } => {
            let params = ApproxSearchParams::new(
                word_size,
                step_size,
                three_prime_length,
                three_prime_threshold,
                whole_threshold,
            )?
            .with_early_stop(if exhaustive { None } else { Some(1) });
            run_approx(&index, &query, &params)?
        }
    }

    Ok(())
}

fn run_build(contigs_path: &Path, output: &Path, bucket_depth: usize) -> Result<()> {
    let contigs = read_contigs_file(contigs_path)
        .with_context(|| format!("failed to read contigs from {}", contigs_path.display()))?;
    let config = BuildConfig::default().with_bucket_depth(bucket_depth)?;
    let index = GenomeIndex::build_with(contigs, &config, &CancellationToken::new())
        .context("failed to build genome index")?;
    index
        .save(output)
        .with_context(|| format!("failed to write index to {}", output.display()))?;
    println!(
        "indexed {} contigs ({} bases) into {}",
        index.len(),
        index.total_bases(),
        output.display()
    );
    Ok(())
}

fn run_find(index_path: &Path, pattern: &str) -> Result<()> {
    let index = load_index(index_path)?;
    let hits = index
        .find_positions(pattern)
        .with_context(|| format!("search for '{pattern}' failed"))?;
    print_hits(&index, hits);
    Ok(())
}

fn run_approx(index_path: &Path, query: &str, params: &ApproxSearchParams) -> Result<()> {
    let index = load_index(index_path)?;
    let hits = index
        .approximate_matches(query, params)
        .with_context(|| format!("approximate search for '{query}' failed"))?;
    print_hits(&index, hits);
    Ok(())
}

fn load_index(path: &Path) -> Result<GenomeIndex> {
    GenomeIndex::load(path).with_context(|| format!("failed to load index {}", path.display()))
}

fn print_hits(index: &GenomeIndex, hits: impl IntoIterator<Item = Hit>) {
    let mut any = false;
    for hit in hits {
        any = true;
        let name = index.contig(hit.contig_id).map_or("?", |contig| contig.name());
        println!("{name}\t{}\t{}", hit.position, hit.strand.symbol());
    }
    if !any {
        println!("No occurrences found.");
    }
}

/// One contig per line: `<name> <sequence>`, or a bare sequence named by
/// its line number.
fn read_contigs_file(path: &Path) -> Result<Vec<(String, Sequence)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut contigs = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let (name, bases) = match (fields.next(), fields.next(), fields.next()) {
            (None, _, _) => continue,
            (Some(bases), None, _) => (format!("contig{}", line_no + 1), bases),
            (Some(name), Some(bases), None) => (name.to_string(), bases),
            _ => bail!("line {}: expected `<name> <sequence>`", line_no + 1),
        };
        let sequence = Sequence::new(bases)
            .with_context(|| format!("invalid sequence on line {}", line_no + 1))?;
        contigs.push((name, sequence));
    }

    Ok(contigs)
}
