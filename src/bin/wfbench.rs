//! Workload program executed by every benchmark task.
//!
//! Reads its inputs, burns CPU (optionally pinned to a core slot shared through a lock file), starts the GPU and
//! memory helpers when asked to, and finally writes the outputs listed in `--out` with random content.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::hint::black_box;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;

use wfsynth::domain::executor::OUTPUT_DIR_ENV;
use wfsynth::logger;

/// Iterations of the busy loop per unit of CPU work.
const CPU_UNIT_ITERATIONS: u64 = 100_000;
const WRITE_CHUNK: usize = 1 << 20;
const CORE_POLL: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "wfbench")]
#[command(about = "Synthetic benchmark task")]
struct Args {
    /// Task name
    name: String,

    /// Share of the ten worker slots used for CPU threads; the rest run the memory helper
    #[arg(long, default_value_t = 0.5)]
    percent_cpu: f64,

    #[arg(long, value_name = "PATH")]
    path_lock: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    path_cores: Option<PathBuf>,

    #[arg(long)]
    cpu_work: Option<u64>,

    #[arg(long)]
    gpu_work: Option<u64>,

    /// JSON map of output file name to size in bytes
    #[arg(long, value_name = "JSON")]
    out: Option<String>,

    /// Input files
    inputs: Vec<PathBuf>,
}

/// A claimed core slot, released on drop.
struct CoreSlot {
    lock: PathBuf,
    cores: PathBuf,
    core: usize,
}

impl CoreSlot {
    fn acquire(lock: &Path, cores: &Path) -> Result<Self> {
        let all_cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        loop {
            let claimed = with_cores_file(lock, cores, |taken| {
                let free = (0..all_cores).find(|core| !taken.contains(core));
                if let Some(core) = free {
                    taken.push(core);
                }
                free
            })?;

            if let Some(core) = claimed {
                return Ok(CoreSlot { lock: lock.to_path_buf(), cores: cores.to_path_buf(), core });
            }
            log::info!("All cores are taken");
            thread::sleep(CORE_POLL);
        }
    }
}

impl Drop for CoreSlot {
    fn drop(&mut self) {
        let core = self.core;
        if let Err(e) = with_cores_file(&self.lock, &self.cores, |taken| taken.retain(|&c| c != core)) {
            log::error!("Could not release core {}: {}", core, e);
        }
    }
}

/// Runs `update` on the list of taken cores while holding the exclusive lock, then writes the list back.
fn with_cores_file<T>(lock: &Path, cores: &Path, update: impl FnOnce(&mut Vec<usize>) -> T) -> Result<T> {
    let lock_file = OpenOptions::new().create(true).append(true).open(lock)?;
    lock_file.lock()?;

    let result = (|| -> Result<T> {
        let mut file = OpenOptions::new().create(true).truncate(false).read(true).write(true).open(cores)?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;

        let mut taken: Vec<usize> = content.lines().filter_map(|line| line.trim().parse().ok()).collect();
        let value = update(&mut taken);

        let text = taken.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n");
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(text.as_bytes())?;
        Ok(value)
    })();

    lock_file.unlock()?;
    result
}

fn read_inputs(inputs: &[PathBuf]) -> Result<()> {
    log::info!("Starting IO read benchmark");
    for input in inputs {
        let data = fs::read(input).with_context(|| format!("Cannot read input '{}'", input.display()))?;
        log::info!("  read '{}' ({} bytes)", input.display(), data.len());
    }
    Ok(())
}

/// Starts a helper program found next to this executable or on the `PATH`. A missing helper is only logged.
fn start_helper(program: &str, args: &[String]) -> Option<Child> {
    let local = std::env::current_exe().ok().and_then(|exe| exe.parent().map(|dir| dir.join(program)));
    let program = local.filter(|p| p.is_file()).unwrap_or_else(|| PathBuf::from(program));

    match Command::new(&program).args(args).stdin(Stdio::null()).spawn() {
        Ok(child) => Some(child),
        Err(e) => {
            log::warn!("Could not start '{}': {}", program.display(), e);
            None
        }
    }
}

fn busy_work(units: u64) -> u64 {
    let mut x: u64 = 0x9E37_79B9_7F4A_7C15;
    for _ in 0..units.saturating_mul(CPU_UNIT_ITERATIONS) {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        x = black_box(x);
    }
    x
}

fn cpu_mem_benchmark(name: &str, percent_cpu: f64, cpu_work: u64, core: Option<usize>) {
    let cpu_threads = ((10.0 * percent_cpu) as u64).max(1);
    let mem_threads = (10.0 - 10.0 * percent_cpu) as u64;
    let work_per_thread = cpu_work / cpu_threads;

    if let Some(core) = core {
        log::info!("{} acquired core {}", name, core);
    }

    let mut memory_helper = if mem_threads > 0 {
        let cpus = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let bytes = format!("{}%", 100.0 / cpus as f64);
        start_helper("stress-ng", &["--vm".into(), mem_threads.to_string(), "--vm-bytes".into(), bytes, "--vm-keep".into()])
    } else {
        None
    };

    thread::scope(|scope| {
        for _ in 0..cpu_threads {
            scope.spawn(move || busy_work(work_per_thread));
        }
    });

    if let Some(helper) = memory_helper.as_mut() {
        let _ = helper.kill();
        let _ = helper.wait();
    }
}

fn write_outputs(out: &str, output_dir: &Path) -> Result<()> {
    let outputs: BTreeMap<String, u64> =
        serde_json::from_str(&out.replace('\'', "\"")).with_context(|| format!("Invalid --out map: {}", out))?;

    let mut rng = rand::rng();
    let mut buffer = vec![0u8; WRITE_CHUNK];
    for (name, size) in outputs {
        let path = output_dir.join(&name);
        log::info!("Writing output file '{}'", path.display());

        let mut writer = BufWriter::new(File::create(&path)?);
        let mut remaining = size;
        while remaining > 0 {
            let chunk = remaining.min(WRITE_CHUNK as u64) as usize;
            rng.fill(&mut buffer[..chunk]);
            writer.write_all(&buffer[..chunk])?;
            remaining -= chunk as u64;
        }
        writer.flush()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    logger::init();
    let args = Args::parse();

    let slot = match (&args.path_lock, &args.path_cores) {
        (Some(lock), Some(cores)) => Some(CoreSlot::acquire(lock, cores)?),
        _ => None,
    };

    log::info!("Starting {} benchmark", args.name);

    if args.out.is_some() {
        read_inputs(&args.inputs)?;
    }

    if let Some(gpu_work) = args.gpu_work {
        log::info!("Starting GPU benchmark");
        start_helper("gpu-benchmark", &[gpu_work.to_string()]);
    }

    if let Some(cpu_work) = args.cpu_work {
        log::info!("Starting CPU and memory benchmarks");
        cpu_mem_benchmark(&args.name, args.percent_cpu, cpu_work, slot.as_ref().map(|s| s.core));
        log::info!("Completed CPU and memory benchmarks");
    }

    if let Some(out) = &args.out {
        let output_dir = std::env::var_os(OUTPUT_DIR_ENV).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        write_outputs(out, &output_dir)?;
    }

    drop(slot);
    log::info!("{} benchmark completed", args.name);
    Ok(())
}
