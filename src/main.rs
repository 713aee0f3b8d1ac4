use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use ferrous_dband::align_opt::{AlignCliOptions, AlignOpt};
use ferrous_dband::alignment::utils::encode_sequence;
use ferrous_dband::alignment::{align_batch, align_pair, PairAlignment, Reservoir};
use ferrous_dband::defaults;
use ferrous_dband::io::FastaReader;

#[derive(Parser)]
#[command(name = "ferrous-dband")]
#[command(about = "Banded affine-gap global alignment with adaptive band widening", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Align two sequences given on the command line
    Pair {
        /// First sequence (rows of the DP matrix)
        #[arg(value_name = "U")]
        useq: String,

        /// Second sequence (columns of the DP matrix)
        #[arg(value_name = "V")]
        vseq: String,

        #[command(flatten)]
        opts: AlignCliOptions,

        /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
        #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY)]
        verbosity: i32,
    },

    /// Align consecutive FASTA records pairwise (1st vs 2nd, 3rd vs 4th, ...)
    Fasta {
        /// Input FASTA file, optionally gzip or bgzip compressed
        #[arg(value_name = "FILE")]
        fasta: PathBuf,

        #[command(flatten)]
        opts: AlignCliOptions,

        /// Number of threads (default: all available cores)
        #[arg(short = 't', long, value_name = "INT")]
        threads: Option<usize>,

        /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
        #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY)]
        verbosity: i32,
    },
}

fn init_logging(verbosity: i32) {
    let log_level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace, // 5+ = trace
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None) // Don't show timestamps
        .format_target(false) // Don't show module names
        .init();
}

fn checked_opt(cli: &AlignCliOptions) -> Result<AlignOpt> {
    let opt = cli.to_align_opt();
    if let Err(errors) = opt.validate() {
        for e in &errors {
            log::error!("{}", e);
        }
        anyhow::bail!("invalid alignment options ({} errors)", errors.len());
    }
    log::debug!(
        "Scoring: match {}, mismatch {}, wildcard {}, gap open {}, gap extend {}",
        opt.match_score,
        opt.mismatch_penalty,
        opt.wildcard_score,
        opt.gap_opening,
        opt.gap_extension
    );
    Ok(opt)
}

fn write_alignment<W: Write>(
    writer: &mut W,
    names: (&str, &str),
    useq: &[u8],
    vseq: &[u8],
    aln: &PairAlignment,
    opt: &AlignOpt,
) -> Result<()> {
    writeln!(writer, "{}\t{}\t{}\t{}", names.0, names.1, aln.score, aln.cigar)?;
    if opt.show_alignment {
        let text = aln.eoplist.format_alignment(useq, vseq, opt.line_width)?;
        writeln!(writer, "{}", text)?;
    }
    Ok(())
}

fn run_pair(useq: &str, vseq: &str, opt: &AlignOpt) -> Result<()> {
    let u = encode_sequence(useq.as_bytes());
    let v = encode_sequence(vseq.as_bytes());
    let mut reservoir = Reservoir::new(opt.encoding);
    let aln = align_pair(&mut reservoir, opt, &u, &v)
        .with_context(|| format!("aligning {} against {}", useq, vseq))?;
    log::info!(
        "Score {} in band [{},{}] after {} attempt(s)",
        aln.score,
        aln.left_dist,
        aln.right_dist,
        aln.iterations
    );

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    write_alignment(&mut writer, ("u", "v"), &u, &v, &aln, opt)?;
    writer.flush()?;
    Ok(())
}

fn configure_threads(threads: Option<usize>) -> usize {
    let mut num_threads = threads.unwrap_or_else(num_cpus::get);
    if num_threads < 1 {
        log::warn!("Invalid thread count {}, using 1", num_threads);
        num_threads = 1;
    }
    let max_threads = num_cpus::get() * 2;
    if num_threads > max_threads {
        log::warn!(
            "Thread count {} exceeds recommended maximum {}, capping at {}",
            num_threads,
            max_threads,
            max_threads
        );
        num_threads = max_threads;
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(_) => log::debug!("Built global Rayon thread pool with {} threads", num_threads),
        Err(e) => log::warn!(
            "Failed to configure thread pool: {} (may already be initialized)",
            e
        ),
    }
    rayon::current_num_threads()
}

fn run_fasta(path: &Path, opt: &AlignOpt, threads: Option<usize>) -> Result<()> {
    let num_threads = configure_threads(threads);
    log::info!("Using {} thread(s)", num_threads);

    let mut reader = FastaReader::new(path)
        .with_context(|| format!("opening FASTA file {}", path.display()))?;
    let (pairs, unpaired) = reader
        .read_pairs()
        .with_context(|| format!("reading FASTA file {}", path.display()))?;
    if let Some(name) = unpaired {
        log::warn!("Odd number of records; {} has no partner and is skipped", name);
    }
    log::info!("Read {} pair(s) from {}", pairs.len(), path.display());

    let results = align_batch(&pairs, opt)?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    let mut failed = 0usize;
    for (pair, result) in pairs.iter().zip(results) {
        match result {
            Ok(aln) => write_alignment(
                &mut writer,
                (&pair.u_name, &pair.v_name),
                &pair.useq,
                &pair.vseq,
                &aln,
                opt,
            )?,
            Err(e) => {
                failed += 1;
                log::error!("{} vs {}: {}", pair.u_name, pair.v_name, e);
            }
        }
    }
    writer.flush()?;

    if failed > 0 {
        anyhow::bail!("{} of {} pair(s) failed to align", failed, pairs.len());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Pair {
            useq,
            vseq,
            opts,
            verbosity,
        } => {
            init_logging(verbosity);
            checked_opt(&opts).and_then(|opt| run_pair(&useq, &vseq, &opt))
        }
        Commands::Fasta {
            fasta,
            opts,
            threads,
            verbosity,
        } => {
            init_logging(verbosity);
            checked_opt(&opts).and_then(|opt| run_fasta(&fasta, &opt, threads))
        }
    };

    if let Err(e) = outcome {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
