use anyhow::{Result, anyhow};
use clap::Parser;
use noticenorm::loader;
use noticenorm::output::{self, Entry};
use noticenorm::{KeyPolicy, NormalizerConfig, normalize_lenient, normalize_values};
use std::path::PathBuf;
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "stdout")]
    output: String,

    /// Notices as a JSON array, a feed page, or JSON Lines
    #[arg(value_name = "FILE")]
    file: PathBuf,

    #[arg(long, value_enum, default_value_t = KeyPolicy::Contiguous)]
    key_policy: KeyPolicy,

    /// Drop invalid notices instead of failing the whole batch
    #[arg(long)]
    skip_invalid: bool,

    #[arg(long, default_value = "10000")]
    batch_size: usize,

    #[arg(long)]
    benchmark: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let start_time = Instant::now();

    let notices = loader::load_notices(&args.file)?;
    let total_notices = notices.len();
    let config = NormalizerConfig::with_key_policy(args.key_policy);

    let records = if args.skip_invalid {
        let report = normalize_lenient(&notices, &config);
        for err in &report.rejected {
            warn!(error = %err, "skipped invalid notice");
        }
        report.records
    } else {
        normalize_values(&notices, &config)?
    };
    let total_records = records.len();

    // channel for sending batches to the writer
    let (tx, rx) = crossbeam::channel::unbounded::<Vec<Entry>>();
    let mut writer = output::create_writer(&args.output)?;
    let writer_handle = std::thread::spawn(move || -> Result<()> {
        for batch in rx {
            writer.write_batch(&batch)?;
        }
        writer.finish()
    });

    let mut entries = records.into_iter().peekable();
    while entries.peek().is_some() {
        let batch: Vec<Entry> = entries.by_ref().take(args.batch_size.max(1)).collect();
        if tx.send(batch).is_err() {
            // writer bailed out; its error is reported on join
            break;
        }
    }

    // close channel so writer thread can finish
    drop(tx);
    writer_handle
        .join()
        .map_err(|_| anyhow!("writer thread panicked"))??;

    if args.benchmark {
        print_benchmark_results(total_notices, total_records, start_time.elapsed());
    }

    Ok(())
}

fn print_benchmark_results(total_notices: usize, total_records: usize, duration: std::time::Duration) {
    let duration_secs = duration.as_secs_f64();
    let throughput = total_notices as f64 / duration_secs;

    eprintln!("\n=== BENCHMARK RESULTS ===");
    eprintln!("Input notices: {}", total_notices);
    eprintln!("Normalized records: {}", total_records);
    eprintln!("Processing time: {:.3}s", duration_secs);
    eprintln!("Throughput: {:.0} notices/s", throughput);
    if total_notices > 0 {
        eprintln!(
            "Kept: {:.1}%",
            (total_records as f64 / total_notices as f64) * 100.0
        );
    }
}
