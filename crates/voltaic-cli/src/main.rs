use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use voltaic_core::prelude::SolverConfig;
use voltaic_parser::prelude::{parse_netlist_file, AnalysisDirective};
use voltaic_solver::prelude::{run_transient, solve_dc, TransientParams};

/// Voltaic is a SPICE-style time-domain circuit simulator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the netlist file to simulate.
    netlist: PathBuf,

    /// Path to a TOML file overriding `SolverConfig` defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force a DC operating-point solve, ignoring any `.tran` directive.
    #[arg(long)]
    dc: bool,

    /// Increase log verbosity (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).format_timestamp(None).init();
}

fn load_config(path: Option<&PathBuf>) -> SolverConfig {
    let Some(path) = path else {
        return SolverConfig::default();
    };
    let contents = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error reading config file '{}': {e}", path.display());
        std::process::exit(1);
    });
    toml::from_str(&contents).unwrap_or_else(|e| {
        eprintln!("error parsing config file '{}': {e}", path.display());
        std::process::exit(1);
    })
}

fn print_dc_result(result: &voltaic_solver::prelude::DcResult) {
    println!("operating point: {}", if result.converged { "converged" } else { "did not converge" });
    let mut nodes: Vec<_> = result.node_voltages.iter().collect();
    nodes.sort_by(|a, b| a.0.cmp(b.0));
    for (name, voltage) in nodes {
        println!("  V({name}) = {voltage:.6} V");
    }
    let mut currents: Vec<_> = result.branch_currents.iter().collect();
    currents.sort_by(|a, b| a.0.cmp(b.0));
    for (identifier, current) in currents {
        println!("  I({identifier}) = {current:.6} A");
    }
}

fn print_transient_result(result: &voltaic_solver::prelude::TransientResult) {
    let last = result.times.len() - 1;
    println!(
        "transient analysis complete: {} steps from t={:.6}s to t={:.6}s",
        last,
        result.times[0],
        result.times[last]
    );
    let mut nodes: Vec<_> = result.node_voltages.keys().collect();
    nodes.sort();
    println!("final node voltages:");
    for name in nodes {
        println!("  V({name}) = {:.6} V", result.node_voltages[name][last]);
    }
    let mut states: Vec<_> = result.state_variables.keys().collect();
    states.sort();
    println!("final state variables:");
    for name in states {
        println!("  x({name}) = {:.6}", result.state_variables[name][last]);
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_ref());

    let parsed = parse_netlist_file(&args.netlist, &config).unwrap_or_else(|e| {
        eprintln!("error parsing netlist '{}': {e}", args.netlist.display());
        std::process::exit(1);
    });

    let tran_directive = parsed.directives.iter().find_map(|d| match d {
        AnalysisDirective::Tran(t) => Some(*t),
        AnalysisDirective::Dc => None,
    });

    if args.dc || tran_directive.is_none() {
        info!("running DC operating point analysis on '{}'", args.netlist.display());
        let result = solve_dc(&parsed.circuit, &config).unwrap_or_else(|e| {
            eprintln!("error during DC analysis: {e}");
            std::process::exit(1);
        });
        print_dc_result(&result);
        return;
    }

    let tran = tran_directive.expect("checked above");
    info!(
        "running transient analysis on '{}' from t={}s to t={}s (h={}s)",
        args.netlist.display(),
        tran.start_time,
        tran.stop_time,
        tran.time_step
    );
    let mut circuit = parsed.circuit;
    let params = TransientParams {
        start_time: tran.start_time,
        stop_time: tran.stop_time,
        time_step: tran.time_step,
        max_time_step: None,
        method: voltaic_solver::prelude::IntegrationMethod::ForwardEuler,
    };
    let result = run_transient(&mut circuit, &config, &params, None, None).unwrap_or_else(|e| {
        eprintln!("error during transient analysis: {e}");
        let steps_recorded = e.trajectory.times.len();
        if steps_recorded > 0 {
            eprintln!("partial trajectory recorded before failure:");
            print_transient_result(&e.trajectory);
        } else {
            eprintln!("no trajectory recorded before failure");
        }
        std::process::exit(1);
    });
    print_transient_result(&result);
}
