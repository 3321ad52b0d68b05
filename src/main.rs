use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use netsim::config::Config;
use netsim::config_loader;
use netsim::exercise::{validate, ExerciseCatalog};
use netsim::session::{console, NetworkSession};
use netsim::store::{record_progress, TopologyStore};
use netsim::ip::{
    available_hosts, broadcast_address, cidr_to_mask, default_mask, ip_class, is_valid_ip,
    mask_to_cidr, network_address,
};
use netsim::topology::animation::DEFAULT_STEP;
use netsim::topology::{find_path, PacketAnimation, Topology};

const DEFAULT_CATALOG_PATH: &str = "catalog/exercises.yaml";

/// Educational network simulator: grade and exercise saved topologies
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulator configuration YAML file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grade a topology against one exercise
    Validate {
        /// Exercise id, e.g. ex1-basic-network
        #[arg(short, long)]
        exercise: String,
        /// Topology JSON file; the user's saved topology is used when omitted
        #[arg(short, long, required_unless_present = "user")]
        topology: Option<PathBuf>,
        /// Record the result in this user's stored progress
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Store a topology file as a user's work on an exercise
    Save {
        #[arg(short, long)]
        topology: PathBuf,
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        exercise: String,
    },
    /// Export a user's stored topology to a file
    Load {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        exercise: String,
        /// Destination JSON file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show a user's progress through the catalog
    Progress {
        #[arg(short, long)]
        user: String,
    },
    /// Ping an address from a device
    Ping {
        #[arg(short, long)]
        topology: PathBuf,
        /// Source device id
        #[arg(long)]
        from: String,
        /// Destination IP address
        #[arg(long)]
        to: String,
        /// Print the canvas waypoints of the echo request and reply
        #[arg(long)]
        route: bool,
    },
    /// Run DHCP discovery for a device
    Dhcp {
        #[arg(short, long)]
        topology: PathBuf,
        #[arg(short, long)]
        device: String,
        /// Write the updated topology back to the file
        #[arg(long)]
        write: bool,
    },
    /// Resolve a hostname from a device
    Dns {
        #[arg(short, long)]
        topology: PathBuf,
        #[arg(short, long)]
        device: String,
        /// Hostname to resolve
        #[arg(short, long)]
        name: String,
    },
    /// Print the shortest cable path between two devices
    Path {
        #[arg(short, long)]
        topology: PathBuf,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// List the exercise catalog in unlock order
    Exercises,
    /// Describe an address: class, network, broadcast and host count
    Ip {
        /// Dotted-decimal address
        address: String,
        /// Prefix length; the classful default is used when omitted
        #[arg(long)]
        cidr: Option<u8>,
    },
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let args = Args::parse();

    let config = config_loader::load_or_default(args.config.as_deref())?;
    let log_level = config.general.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("Starting NetSim");
    if let Some(path) = &args.config {
        info!("Configuration file: {:?}", path);
    }

    match args.command {
        Command::Validate {
            exercise,
            topology,
            user,
        } => {
            let catalog = load_catalog(&config)?;
            let exercise = catalog
                .get(&exercise)
                .ok_or_else(|| eyre!("Unknown exercise: {}", exercise))?;
            let store = config.storage.open();
            let topology = match (&topology, &user) {
                (Some(path), _) => read_topology(path)?,
                (None, Some(user)) => store
                    .load_topology(user, &exercise.id)
                    .wrap_err("Failed to read stored topology")?
                    .ok_or_else(|| eyre!("No stored topology for {} on {}", user, exercise.id))?,
                (None, None) => return Err(eyre!("Either --topology or --user is required")),
            };

            let result = validate(exercise, &topology);
            println!("Exercise {}: {}", exercise.number, exercise.title);
            for rule in &result.validation_results {
                let mark = if rule.passed { "PASS" } else { "FAIL" };
                println!(
                    "  [{}] {:<22} {:>3} pts  {}",
                    mark,
                    rule.rule.check.kind(),
                    rule.rule.points,
                    rule.message
                );
            }
            println!(
                "Score: {}/{} - {}",
                result.score,
                result.max_score,
                if result.passed { "passed" } else { "not passed" }
            );
            if let Some(user) = &user {
                let progress = record_progress(&store, user, exercise, &result)
                    .wrap_err("Failed to record progress")?;
                println!(
                    "Best score {}/{} after {} attempt(s){}",
                    progress.best_score,
                    progress.max_score,
                    progress.attempts,
                    if progress.completed { ", completed" } else { "" }
                );
            }
            Ok(exit_code(result.passed))
        }

        Command::Save {
            topology,
            user,
            exercise,
        } => {
            let session = session_with(&config, read_topology(&topology)?);
            let store = config.storage.open();
            if !session.save_topology(&store, &user, &exercise) {
                return Err(eyre!("Failed to save topology under {:?}", store.root()));
            }
            println!("Saved {:?} as {} / {}", topology, user, exercise);
            Ok(ExitCode::SUCCESS)
        }

        Command::Load {
            user,
            exercise,
            output,
        } => {
            let mut session = NetworkSession::from_config(&config.session);
            if !session.load_topology(&config.storage.open(), &user, &exercise) {
                println!("No stored topology for {} on {}", user, exercise);
                return Ok(ExitCode::FAILURE);
            }
            write_topology(&output, session.topology())?;
            println!("Wrote {:?}", output);
            Ok(ExitCode::SUCCESS)
        }

        Command::Progress { user } => {
            let catalog = load_catalog(&config)?;
            let tracker = config
                .storage
                .open()
                .load_progress(&user)
                .wrap_err("Failed to read stored progress")?
                .unwrap_or_default();
            for exercise in catalog.iter() {
                let state = match tracker.get(&exercise.id) {
                    Some(p) if p.completed => format!("completed {}/{}", p.best_score, p.max_score),
                    Some(p) => format!("attempted {}/{}", p.best_score, p.max_score),
                    None if tracker.is_unlocked(exercise.number) => "unlocked".to_string(),
                    None => "locked".to_string(),
                };
                println!("{:>2}. {:<24} {}", exercise.number, exercise.id, state);
            }
            let stats = tracker.overall_stats(&catalog);
            println!(
                "{}/{} completed ({}%), score {}/{}",
                stats.completed_count,
                stats.total_exercises,
                stats.completion_percentage,
                stats.total_score,
                stats.max_possible_score
            );
            Ok(ExitCode::SUCCESS)
        }

        Command::Ping {
            topology,
            from,
            to,
            route,
        } => {
            let mut session = session_with(&config, read_topology(&topology)?);
            let outcome = session.simulate_ping(&from, &to);
            print_console(&session);
            if route && outcome.is_success() {
                print_echo_route(session.topology(), &from, &to);
            }
            Ok(exit_code(outcome.is_success()))
        }

        Command::Dhcp {
            topology: path,
            device,
            write,
        } => {
            let mut session = session_with(&config, read_topology(&path)?);
            let outcome = session.run_dhcp_discovery(&device);
            print_console(&session);
            if write && outcome.is_success() {
                write_topology(&path, session.topology())?;
                info!("Updated topology written to {:?}", path);
            }
            Ok(exit_code(outcome.is_success()))
        }

        Command::Dns {
            topology,
            device,
            name,
        } => {
            let mut session = session_with(&config, read_topology(&topology)?);
            let outcome = session.resolve_dns(&device, &name);
            print_console(&session);
            Ok(exit_code(outcome.is_success()))
        }

        Command::Path { topology, from, to } => {
            let topology = read_topology(&topology)?;
            let path = find_path(&topology, &from, &to);
            if path.is_empty() {
                println!("No path from {} to {}", from, to);
                return Ok(ExitCode::FAILURE);
            }
            let names: Vec<&str> = path
                .iter()
                .map(|id| topology.device(id).map_or(id.as_str(), |d| d.name.as_str()))
                .collect();
            println!("{}", names.join(" -> "));
            Ok(ExitCode::SUCCESS)
        }

        Command::Exercises => {
            let catalog = load_catalog(&config)?;
            for exercise in catalog.iter() {
                println!(
                    "{:>2}. {:<24} {:<34} {:<12} {:<11} {:>3} min",
                    exercise.number,
                    exercise.id,
                    exercise.title,
                    exercise.difficulty.to_string(),
                    exercise.category.to_string(),
                    exercise.estimated_time
                );
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Ip { address, cidr } => {
            if !is_valid_ip(&address) {
                return Err(eyre!("Invalid IPv4 address: {}", address));
            }
            let mask = cidr.map_or_else(|| default_mask(&address).to_string(), cidr_to_mask);
            println!("Address:   {}", address);
            println!("Class:     {:?}", ip_class(&address));
            println!("Mask:      {} (/{})", mask, mask_to_cidr(&mask));
            println!("Network:   {}", network_address(&address, &mask));
            println!("Broadcast: {}", broadcast_address(&address, &mask));
            println!("Hosts:     {}", available_hosts(&mask));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_echo_route(topology: &Topology, source_id: &str, dest_ip: &str) {
    let Some(dest) = topology.device_with_ip(dest_ip) else {
        return;
    };
    let Some((mut request, mut reply)) =
        PacketAnimation::echo_pair(topology, source_id, &dest.id, "ping")
    else {
        return;
    };
    for packet in [&mut request, &mut reply] {
        while !packet.advance(DEFAULT_STEP) {}
        let waypoints: Vec<String> = packet
            .path
            .iter()
            .map(|p| format!("({:.0}, {:.0})", p.x, p.y))
            .collect();
        println!("{} via {}", packet.message, waypoints.join(" -> "));
    }
}

fn session_with(config: &Config, topology: Topology) -> NetworkSession {
    let mut session = NetworkSession::from_config(&config.session);
    session.replace_topology(topology);
    session
}

fn print_console(session: &NetworkSession) {
    let trace = session
        .console()
        .lines()
        .iter()
        .filter(|line| line.as_str() != console::WELCOME_BANNER);
    for line in trace {
        println!("{}", line);
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn load_catalog(config: &Config) -> Result<ExerciseCatalog> {
    let path = config
        .catalog
        .as_ref()
        .map_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH), |c| c.path.clone());
    ExerciseCatalog::load(&path)
        .wrap_err_with(|| format!("Failed to load exercise catalog {:?}", path))
}

fn read_topology(path: &Path) -> Result<Topology> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read topology file {:?}", path))?;
    serde_json::from_str(&content)
        .wrap_err_with(|| format!("Failed to parse topology file {:?}", path))
}

fn write_topology(path: &Path, topology: &Topology) -> Result<()> {
    let json = serde_json::to_string_pretty(topology)?;
    fs::write(path, json).wrap_err_with(|| format!("Failed to write topology file {:?}", path))
}
