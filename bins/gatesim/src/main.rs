use std::fmt::Display;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chipdef::Catalog;
use clap::Parser as ClapParser;
use diagnostics::Diagnostic;
use gatesim::{SimOptions, Simulator};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    gatesim(args)
}

/// Arguments to [`gatesim`].
#[derive(ClapParser)]
#[command(
    version,
    about,
    long_about = "Assemble a gate netlist program, apply stimuli, and print the settled values"
)]
pub struct Args {
    /// The program to assemble.
    program: PathBuf,
    /// Extra TOML catalogs of composite chips, loaded over the builtins in order.
    #[arg(short, long)]
    catalog: Vec<PathBuf>,
    /// A TOML configuration file.
    ///
    /// Catalogs listed in the file are resolved relative to it and loaded
    /// before those given with `--catalog`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// INPUT instances to toggle after assembly, in order.
    #[arg(short, long)]
    toggle: Vec<String>,
    /// The number of clock ticks to run after toggling.
    #[arg(long, default_value_t = 0)]
    ticks: u64,
    /// Print a JSON snapshot of the final state instead of a table.
    #[arg(long)]
    json: bool,
    /// Increase log verbosity. Overridden by `RUST_LOG`.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    catalogs: Vec<PathBuf>,
    sim: SimOptions,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {:?}.", path))
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let mut config: Config = toml::from_str(&read(path)?)
        .with_context(|| format!("Failed to parse config file {:?}.", path))?;
    let base = path.parent().unwrap_or(Path::new(""));
    for catalog in config.catalogs.iter_mut() {
        if catalog.is_relative() {
            *catalog = base.join(&*catalog);
        }
    }
    Ok(config)
}

/// Assemble and simulate the given program.
pub fn gatesim(args: Args) -> anyhow::Result<()> {
    let mut config = match args.config {
        Some(ref path) => load_config(path)?,
        None => Config::default(),
    };
    config.catalogs.extend(args.catalog.iter().cloned());

    let mut catalog = Catalog::builtin();
    for path in config.catalogs.iter() {
        let added = catalog
            .extend_from_toml(&read(path)?)
            .with_context(|| format!("Failed to load catalog {:?}.", path))?;
        tracing::info!(path = ?path, added, "loaded catalog");
    }
    let issues = catalog.validate();
    for item in issues.iter() {
        print_issue(item);
    }
    if issues.has_error() {
        anyhow::bail!("One or more errors in chip catalog identified; aborting.")
    }

    let src = read(&args.program)?;
    let mut sim = Simulator::with_options(catalog, config.sim);
    sim.assemble(&src);
    report(&sim);
    for id in args.toggle.iter() {
        sim.toggle_input(id);
        report(&sim);
    }
    for _ in 0..args.ticks {
        sim.tick();
        report(&sim);
    }

    let mut stdout = io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &sim.snapshot())
            .with_context(|| "Failed to write snapshot to stdout.")?;
        writeln!(stdout)?;
    } else {
        print_table(&mut stdout, &sim).with_context(|| "Failed to write values to stdout.")?;
    }

    Ok(())
}

fn report(sim: &Simulator) {
    for item in sim.issues().iter() {
        print_issue(item);
    }
}

fn print_issue(item: &(impl Display + Diagnostic)) {
    eprintln!("{}: {item}", item.severity());
    if let Some(help) = item.help() {
        eprintln!("  help: {help}");
    }
}

fn print_table(out: &mut impl Write, sim: &Simulator) -> io::Result<()> {
    writeln!(out, "clock: {}", sim.clock())?;
    for instance in sim.instances() {
        write!(
            out,
            "{:<12} {:<16} {}",
            instance.id(),
            instance.chip(),
            u8::from(instance.value())
        )?;
        if instance.internals().is_some() {
            for (pin, value) in instance.outputs() {
                write!(out, " {pin}={}", u8::from(*value))?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
