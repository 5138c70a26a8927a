//! Benchmark store construction and sequential vs parallel slicing across
//! synthetic table collections of increasing table count and row count.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::TimeDelta;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use ts_cutter_core::synth::{SynthSpec, make_tables};
use ts_cutter_core::{SliceOptions, SlicedTables, TableStore, Window, slice_with};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Sequential,
    Parallel,
}

impl Mode {
    fn label(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        }
    }
}

#[derive(Debug)]
struct Args {
    tables: Vec<usize>,
    rows: Vec<usize>,
    columns: usize,
    iters: usize,
    warmup: usize,
    threads: Option<usize>,
    seed: u64,
    window_start_min: i64,
    window_end_min: i64,
    csv: Option<String>,
}

fn usage() -> String {
    [
        "usage: slice_bench [options]",
        "",
        "options:",
        "  --tables <n[,n...]>       table counts to sweep (default: 10,50,100,250)",
        "  --rows <n[,n...]>         rows per table to sweep (default: 150000)",
        "  --columns <n>             payload columns per table (default: 10)",
        "  --iters <n>               (default: 5)",
        "  --warmup <n>              (default: 1)",
        "  --threads <n>             parallel mode only; dedicated pool size",
        "  --seed <n>                RNG seed for table generation (default: 42)",
        "  --window-start-min <n>    window start, minutes after first row (default: 4)",
        "  --window-end-min <n>      window end, minutes after first row (default: 30)",
        "  --csv <path>              (optional CSV output)",
    ]
    .join("\n")
}

fn parse_value<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<T, String> {
    let value = args
        .next()
        .ok_or_else(|| format!("missing value for {flag}"))?;
    value
        .parse::<T>()
        .map_err(|_| format!("invalid {flag} value '{value}'"))
}

fn parse_counts(flag: &str, value: &str) -> Result<Vec<usize>, String> {
    let counts = value
        .split(',')
        .map(|v| v.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| format!("invalid {flag} value '{value}'"))?;
    if counts.is_empty() || counts.contains(&0) {
        return Err(format!("{flag} counts must be > 0"));
    }
    Ok(counts)
}

fn parse_args() -> Result<Args, String> {
    let mut tables = vec![10, 50, 100, 250];
    let mut rows = vec![150_000usize];
    let mut columns = 10usize;
    let mut iters = 5usize;
    let mut warmup = 1usize;
    let mut threads = None;
    let mut seed = 42u64;
    let mut window_start_min = 4i64;
    let mut window_end_min = 30i64;
    let mut csv = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--tables" => {
                let value = args.next().ok_or("missing value for --tables")?;
                tables = parse_counts("--tables", &value)?;
            }
            "--rows" => {
                let value = args.next().ok_or("missing value for --rows")?;
                rows = parse_counts("--rows", &value)?;
            }
            "--columns" => columns = parse_value(&mut args, "--columns")?,
            "--iters" => {
                iters = parse_value(&mut args, "--iters")?;
                if iters == 0 {
                    return Err("iters must be > 0".to_string());
                }
            }
            "--warmup" => warmup = parse_value(&mut args, "--warmup")?,
            "--threads" => {
                let parsed: usize = parse_value(&mut args, "--threads")?;
                if parsed == 0 {
                    return Err("threads must be > 0".to_string());
                }
                threads = Some(parsed);
            }
            "--seed" => seed = parse_value(&mut args, "--seed")?,
            "--window-start-min" => {
                window_start_min = parse_value(&mut args, "--window-start-min")?;
            }
            "--window-end-min" => window_end_min = parse_value(&mut args, "--window-end-min")?,
            "--csv" => {
                csv = Some(args.next().ok_or("missing value for --csv")?);
            }
            "--help" | "-h" => {
                return Err(usage());
            }
            other => {
                return Err(format!("unknown argument '{other}'\n\n{}", usage()));
            }
        }
    }

    Ok(Args {
        tables,
        rows,
        columns,
        iters,
        warmup,
        threads,
        seed,
        window_start_min,
        window_end_min,
        csv,
    })
}

fn write_csv_row(path: &str, header: &str, row: &str) -> std::io::Result<()> {
    let exists = Path::new(path).exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if !exists {
        writeln!(file, "{header}")?;
    }
    writeln!(file, "{row}")?;
    Ok(())
}

fn median_ms(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn run_mode(
    store: &TableStore,
    window: Window,
    options: &SliceOptions,
    warmup: usize,
    iters: usize,
) -> Result<(SlicedTables, Vec<Duration>), Box<dyn std::error::Error>> {
    for _ in 0..warmup {
        slice_with(store, window, options)?;
    }

    let mut durations = Vec::with_capacity(iters);
    let mut last = SlicedTables::new();
    for _ in 0..iters {
        let started = Instant::now();
        last = slice_with(store, window, options)?;
        durations.push(started.elapsed());
    }
    Ok((last, durations))
}

fn bench_point(
    args: &Args,
    spec: &SynthSpec,
    window: Window,
    count: usize,
    rng: &mut StdRng,
) -> Result<(), Box<dyn std::error::Error>> {
    let tables = make_tables(rng, count, spec)?;
    let expected_rows = (count as u64) * (spec.rows as u64);

    let started = Instant::now();
    let store = TableStore::new(tables)?;
    let build_ms = started.elapsed().as_secs_f64() * 1000.0;

    if store.total_row_count() != expected_rows {
        return Err(format!(
            "store holds {} rows, expected {expected_rows}",
            store.total_row_count()
        )
        .into());
    }
    info!(
        "built store with {count} tables x {} rows in {build_ms:.3} ms",
        spec.rows
    );

    let mut outputs = Vec::new();
    for mode in [Mode::Sequential, Mode::Parallel] {
        let options = match mode {
            Mode::Sequential => SliceOptions::sequential(),
            Mode::Parallel => match args.threads {
                Some(n) => SliceOptions::parallel().with_threads(n),
                None => SliceOptions::parallel(),
            },
        };
        let (out, durations) = run_mode(&store, window, &options, args.warmup, args.iters)?;

        let mut ms_values: Vec<f64> =
            durations.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        let avg_ms = ms_values.iter().sum::<f64>() / ms_values.len() as f64;
        let med_ms = median_ms(&mut ms_values);
        let sliced_rows: u64 = out.values().map(|t| t.num_rows() as u64).sum();

        println!(
            "{:<8} {:<10} {:<12} {:>10.3} {:>10.3} {:>10.3} {:>12}",
            count,
            spec.rows,
            mode.label(),
            build_ms,
            avg_ms,
            med_ms,
            sliced_rows
        );

        if let Some(csv_path) = &args.csv {
            let header =
                "tables,rows_per_table,columns,mode,iter,build_ms,elapsed_ms,sliced_rows";
            for (idx, duration) in durations.iter().enumerate() {
                let row = format!(
                    "{count},{rows},{columns},{mode},{iter},{build_ms:.3},{elapsed_ms:.3},{sliced_rows}",
                    rows = spec.rows,
                    columns = spec.columns,
                    mode = mode.label(),
                    iter = idx + 1,
                    elapsed_ms = duration.as_secs_f64() * 1000.0,
                );
                write_csv_row(csv_path, header, &row)?;
            }
        }

        outputs.push(out);
    }

    if outputs.windows(2).any(|pair| pair[0] != pair[1]) {
        return Err(format!(
            "parallel output differs from sequential for {count} tables x {} rows",
            spec.rows
        )
        .into());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    let base = SynthSpec::default().with_columns(args.columns);
    let window = Window::between(
        base.start + TimeDelta::minutes(args.window_start_min),
        base.start + TimeDelta::minutes(args.window_end_min),
    );
    let mut rng = StdRng::seed_from_u64(args.seed);

    println!(
        "{:<8} {:<10} {:<12} {:>10} {:>10} {:>10} {:>12}",
        "tables", "rows", "mode", "build_ms", "avg_ms", "med_ms", "sliced_rows"
    );

    for &rows in &args.rows {
        let spec = base.clone().with_rows(rows);
        for &count in &args.tables {
            bench_point(&args, &spec, window, count, &mut rng)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accept_comma_lists() {
        assert_eq!(parse_counts("--rows", "10, 1000,5").unwrap(), vec![10, 1000, 5]);
        assert_eq!(parse_counts("--tables", "7").unwrap(), vec![7]);
    }

    #[test]
    fn counts_reject_zero_and_garbage() {
        assert_eq!(
            parse_counts("--rows", "10,0").unwrap_err(),
            "--rows counts must be > 0"
        );
        assert!(parse_counts("--tables", "3,x").is_err());
        assert!(parse_counts("--rows", "").is_err());
    }

    #[test]
    fn one_point_builds_and_agrees_across_modes() {
        let args = Args {
            tables: vec![3],
            rows: vec![40],
            columns: 2,
            iters: 1,
            warmup: 0,
            threads: Some(2),
            seed: 1,
            window_start_min: 4,
            window_end_min: 30,
            csv: None,
        };
        let spec = SynthSpec::default().with_rows(40).with_columns(2);
        let window = Window::between(
            spec.start + TimeDelta::minutes(4),
            spec.start + TimeDelta::minutes(30),
        );
        bench_point(&args, &spec, window, 3, &mut StdRng::seed_from_u64(1)).unwrap();
    }
}
