use anyhow::Context;

use subject_browser::data::sample::{random_records, write_upstream};

const DEFAULT_SUBJECTS: usize = 250;
const SEED: u64 = 42;

/// Writes `sample_data.csv`, a synthetic full database export.
/// Usage: `generate_sample [subjects] [output]`.
fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let n = match args.next() {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("invalid subject count {raw:?}"))?,
        None => DEFAULT_SUBJECTS,
    };
    let output_path = args.next().unwrap_or_else(|| "sample_data.csv".to_string());

    let records = random_records(n, SEED);
    let file = std::fs::File::create(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    write_upstream(&records, file).context("writing sample records")?;

    println!("Wrote {} subjects to {output_path}", records.len());
    Ok(())
}
