//! fragcompute CLI - Run a fragment-shader computation from a JSON job file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use fragcompute::{
    compute::run_job,
    context::HeadlessContext,
    driver::GlDriver,
    schema::JobConfig,
    table::Table,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <job.json>", args[0]);
        eprintln!();
        eprintln!("Run a fragment shader over integer tables and write the output table.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  job.json  Path to the job configuration file");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let job_path = PathBuf::from(&args[1]);

    let job_str = fs::read_to_string(&job_path).unwrap_or_else(|e| {
        eprintln!("Error reading job file: {}", e);
        std::process::exit(1);
    });

    let mut config: JobConfig = serde_json::from_str(&job_str).unwrap_or_else(|e| {
        eprintln!("Error parsing job: {}", e);
        std::process::exit(1);
    });
    config.rebase(job_path.parent().unwrap_or(Path::new("")));
    if let Err(e) = config.validate() {
        eprintln!("Invalid job: {}", e);
        std::process::exit(1);
    }

    println!("fragcompute");
    println!("===========");
    println!("Output: {}x{}", config.width, config.height);
    println!("Fragment shader: {}", config.fragment.display());
    println!("Inputs: {}", config.inputs.len());
    println!();

    let context = HeadlessContext::new(config.width, config.height).unwrap_or_else(|e| {
        eprintln!("Error creating context: {}", e);
        std::process::exit(2);
    });
    log::debug!("Context size {}x{}", context.width(), context.height());
    let driver = GlDriver::new(&context).unwrap_or_else(|e| {
        eprintln!("Error loading OpenGL: {}", e);
        std::process::exit(2);
    });

    let start = Instant::now();
    let output = run_job(&driver, &config).unwrap_or_else(|e| {
        eprintln!("Failure during render: {}", e);
        std::process::exit(3);
    });
    let elapsed = start.elapsed();

    if let Err(e) = output.save_json(&config.output) {
        eprintln!("Error writing {}: {}", config.output.display(), e);
        std::process::exit(4);
    }

    println!("Wrote {} ({} cells)", config.output.display(), output.cells().len());
    println!("Time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
}

fn print_example_config() {
    let config = JobConfig::default();
    let table = Table::from_cells("two", vec![2, 3], 2, 1).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    println!("Example configuration (job.json):");
    println!("{}", serde_json::to_string_pretty(&config).unwrap());
    println!();
    println!("Example table (two.json):");
    println!("{}", serde_json::to_string_pretty(&table).unwrap());
}
