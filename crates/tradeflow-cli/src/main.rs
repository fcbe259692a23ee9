use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use tradeflow_model::{Economy, EconomyConfig, Role, generate, read_toml};
use tradeflow_solver::{Glpsol, LpSolver, SolverConfig};

#[derive(Parser)]
#[command(name = "tradeflow")]
#[command(about = "Generate and solve the quarry/market/factory trade-flow LP", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// TOML file overriding the standard scenario
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the LP document
    Generate {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = Format::Lp)]
        format: Format,
    },
    /// Generate the LP, run the solver and print the optimal profit
    Solve {
        /// Also print every nonzero flow and energy value
        #[arg(long)]
        flows: bool,
    },
    /// Validate the configuration and summarize the generated LP
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Lp,
    Json,
}

/// Everything a config file may hold: the economy overrides plus `[solver]`
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    #[serde(flatten)]
    economy: EconomyConfig,
    #[serde(default)]
    solver: SolverConfig,
}

fn setup_logger(verbose: u8) -> Result<(), fern::InitError> {
    use fern::colors::{Color, ColoredLevelConfig};
    let colors = ColoredLevelConfig::new()
        .debug(Color::White)
        .info(Color::Green)
        .warn(Color::BrightYellow)
        .error(Color::BrightRed);

    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} | {:5} | {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                colors.color(record.level()),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> AppConfig {
    let Some(path) = path else {
        return AppConfig::default();
    };
    match read_toml(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

fn build_economy(config: EconomyConfig) -> Economy {
    match config.into_economy() {
        Ok(economy) => economy,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logger(cli.verbose) {
        eprintln!("Cannot set up logging: {}", e);
    }

    let config = load_config(cli.config.as_deref());
    let economy = build_economy(config.economy);

    match cli.command {
        Commands::Generate { output, format } => {
            let lp = generate(&economy);
            let text = match format {
                Format::Lp => tradeflow_lp::LpWriter::new()
                    .with_header("tradeflow economy LP")
                    .render(&lp),
                Format::Json => match serde_json::to_string_pretty(&lp) {
                    Ok(json) => json + "\n",
                    Err(e) => {
                        eprintln!("Error encoding JSON: {}", e);
                        std::process::exit(1);
                    }
                },
            };

            match output {
                Some(path) => {
                    if let Err(e) = std::fs::write(&path, text) {
                        eprintln!("Error writing {}: {}", path.display(), e);
                        std::process::exit(1);
                    }
                    log::info!("wrote {}", path.display());
                }
                None => print!("{}", text),
            }
        }
        Commands::Solve { flows } => {
            let lp = generate(&economy);
            let solver = Glpsol::new(config.solver);

            match solver.solve(&lp) {
                Ok(report) => {
                    if let Some(status) = &report.status {
                        println!("Status: {}", status);
                    }
                    println!("Profit: {}", report.objective);

                    if flows {
                        println!();
                        for (name, value) in &report.columns {
                            if value.abs() > 1e-9 {
                                println!("  {:12} {:12.4}", name, value);
                            }
                        }
                    }
                }
                Err(e) if e.is_unsolvable() => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Solver error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Check => {
            let lp = generate(&economy);
            let network = economy.network();

            println!("Nodes: {}", network.node_count());
            println!("Edges: {} ({} arcs)", network.edge_count(), network.arc_count());
            for role in Role::ALL {
                let nodes: Vec<String> = economy.roles().nodes(role).iter().map(|n| n.to_string()).collect();
                println!("  {:8} {}", role, nodes.join(", "));
            }
            println!();
            println!("Variables: {}", lp.num_variables());
            println!("Rows: {}", lp.num_constraints());
            for block in &lp.blocks {
                println!(
                    "  {:4}  {}",
                    block.constraints.len(),
                    block.comment.as_deref().unwrap_or("")
                );
            }
            println!("Bounds: {}", lp.bounds.len());

            // the written document must read back as the same problem
            let text = tradeflow_lp::LpWriter::new().render(&lp);
            match tradeflow_lp::parse(&text) {
                Ok(reread) if reread == lp => println!("\nOK"),
                Ok(_) => {
                    eprintln!("Written LP does not read back as the generated problem");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Written LP does not parse: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_with_solver_section() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/tradeflow.toml");
        let config: AppConfig = read_toml(&path).unwrap();
        assert_eq!(config.solver.program, PathBuf::from("glpsol"));
        assert!(!config.solver.keep_files);
        assert_eq!(config.economy.into_economy().unwrap(), Economy::standard());
    }

    #[test]
    fn test_unknown_solver_key_is_config_error() {
        let path = std::env::temp_dir().join(format!("tradeflow-cli-{}.toml", std::process::id()));
        std::fs::write(&path, "[solver]\nprogramm = \"glpsol\"\n").unwrap();
        let err = read_toml::<AppConfig>(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, tradeflow_model::ModelError::ParseConfig { .. }), "{:?}", err);
    }
}
