use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ros_z_publisher::dynamic::SchemaRegistry;
use ros_z_publisher::qos::{QosDurability, QosReliability};
use ros_z_publisher::{
    BusClient, PublisherClient, PublisherConfig, PublisherExecutor, PublisherRegistry,
    QosProfile, RecordingBus, ZenohBus, settings,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "ros-z-publisher")]
#[command(about = "Publish ROS 2 messages filled from expressions")]
struct Cli {
    /// Publisher settings to load at start and save to by default
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Namespace relative topics expand under
    #[arg(long, default_value = "/")]
    namespace: String,

    /// Node name private (~) topics expand under
    #[arg(long, default_value = "rqt_publisher")]
    node_name: String,

    /// ROS domain ID
    #[arg(long, default_value = "0")]
    domain: usize,

    /// Zenoh endpoints to connect to (e.g. tcp/127.0.0.1:7447)
    #[arg(long = "connect", value_name = "ENDPOINT")]
    connect: Vec<String>,

    /// Zenoh session mode (peer, client, router)
    #[arg(long)]
    mode: Option<String>,

    /// Zenoh configuration file
    #[arg(long, value_name = "FILE")]
    zenoh_config: Option<PathBuf>,

    /// Drop samples under congestion instead of blocking
    #[arg(long)]
    best_effort: bool,

    /// Publish with transient-local durability
    #[arg(long)]
    transient_local: bool,

    /// Keep messages in memory instead of opening a zenoh session
    #[arg(long)]
    dry_run: bool,

    /// Enable publishers loaded from --settings
    #[arg(long)]
    enable: bool,

    /// Output structured JSON logs
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn init_logger(json_mode: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::new("ros_z_publisher=debug,zenoh=debug")
    } else {
        EnvFilter::new("ros_z_publisher=info,zenoh=warn")
    };

    // stdout belongs to the prompt
    if json_mode {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(false)
                    .with_writer(io::stderr)
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(io::stderr))
            .init();
    }
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    init_logger(cli.json, cli.debug);

    let mut qos = QosProfile::default();
    if cli.best_effort {
        qos.reliability = QosReliability::BestEffort;
    }
    if cli.transient_local {
        qos.durability = QosDurability::TransientLocal;
    }
    let config = PublisherConfig::default()
        .with_namespace(cli.namespace.clone())
        .with_node_name(cli.node_name.clone())
        .with_qos(qos);
    let schemas = Arc::new(SchemaRegistry::with_bundled());

    if cli.dry_run {
        let bus = RecordingBus::new();
        tracing::info!("Dry run: messages stay in memory");
        run(&cli, PublisherRegistry::new(bus, schemas, config)?)
    } else {
        let mut builder = ZenohBus::builder().with_domain_id(cli.domain);
        if let Some(path) = &cli.zenoh_config {
            builder = builder.with_config_file(path.clone());
        }
        if let Some(mode) = &cli.mode {
            builder = builder.with_mode(mode.as_str());
        }
        if !cli.connect.is_empty() {
            builder = builder.with_connect_endpoints(cli.connect.clone());
        }
        let bus = builder.build()?;
        tracing::info!(domain = cli.domain, "Connected to zenoh");
        run(&cli, PublisherRegistry::new(bus, schemas, config)?)
    }
}

fn run<B>(cli: &Cli, registry: PublisherRegistry<B>) -> Result<(), BoxError>
where
    B: BusClient + Send + 'static,
    B::Channel: Send,
{
    let executor = PublisherExecutor::spawn(registry);
    let client = executor.client();

    if let Some(path) = &cli.settings
        && path.exists()
    {
        let ids = client.import(settings::load(path)?)?;
        if cli.enable {
            for id in &ids {
                client.change(*id, "", "enabled", "true")?;
            }
        }
        println!("Loaded {} publishers from {}", ids.len(), path.display());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match execute(&client, cli, line.trim()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("error: {}", e),
        }
    }

    client.shutdown()?;
    executor.shutdown();
    Ok(())
}

const HELP: &str = "\
add <topic> <type> [rate] [on|off]   create a publisher
expr <id> <path> [expression]        set or clear a field expression
type <id> <path> <type>              change the type at a path ('.' is the root)
rate <id> <hz>                       set the publish rate (0 stops the timer)
enable <id> <on|off>                 start or stop periodic publishing
once <id>                            publish one message now
remove <id>                          delete a publisher
list                                 show all publishers
save [file] / load [file]            write or read publisher settings
clear                                delete every publisher
quit";

/// Run one REPL line. Returns false to quit.
fn execute(client: &PublisherClient, cli: &Cli, line: &str) -> Result<bool, BoxError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(true);
    };
    let args: Vec<&str> = words.collect();
    let id = |index: usize| -> Result<u64, BoxError> {
        let raw = args.get(index).ok_or("missing publisher id")?;
        Ok(raw.parse::<u64>()?)
    };

    match command {
        "add" => {
            let (Some(topic), Some(type_name)) = (args.first(), args.get(1)) else {
                return Err("usage: add <topic> <type> [rate] [on|off]".into());
            };
            let rate = args.get(2).map(|r| r.parse::<f64>()).transpose()?.unwrap_or(0.0);
            let enabled = matches!(args.get(3).copied(), Some("on" | "true" | "1" | "yes"));
            let id = client.add(topic, type_name, rate, enabled)?;
            println!("{}", id);
        }
        "expr" => {
            let path = args.get(1).ok_or("usage: expr <id> <path> [expression]")?;
            let expression = args.get(2..).map(|rest| rest.join(" ")).unwrap_or_default();
            match client.change(id(0)?, root_path(path), "expression", &expression)? {
                Some(echo) => println!("{}", echo),
                None => println!("(cleared)"),
            }
        }
        "type" => {
            let (Some(path), Some(type_name)) = (args.get(1), args.get(2)) else {
                return Err("usage: type <id> <path> <type>".into());
            };
            if let Some(echo) = client.change(id(0)?, root_path(path), "type", type_name)? {
                println!("{}", echo);
            }
        }
        "rate" | "enable" => {
            let value = args.get(1).ok_or("missing value")?;
            let value = match (command, *value) {
                ("enable", "on") => "true",
                ("enable", "off") => "false",
                (_, value) => value,
            };
            let field = if command == "rate" { "rate" } else { "enabled" };
            if let Some(echo) = client.change(id(0)?, "", field, value)? {
                println!("{}", echo);
            }
        }
        "once" => client.publish_once(id(0)?)?,
        "remove" => client.remove(id(0)?)?,
        "list" => {
            for summary in client.list()? {
                println!(
                    "[{}] {} ({}) {:.2}Hz {} #{}",
                    summary.id,
                    summary.topic_name,
                    summary.type_name,
                    summary.rate,
                    if summary.active { "publishing" } else { "stopped" },
                    summary.counter
                );
                for (path, expression) in &summary.expressions {
                    println!("    {} = {}", if path.is_empty() { "." } else { path }, expression);
                }
            }
        }
        "save" | "load" => {
            let path = args
                .first()
                .map(PathBuf::from)
                .or_else(|| cli.settings.clone())
                .ok_or("no settings file given")?;
            if command == "save" {
                settings::save(&path, &client.export()?)?;
            } else {
                let ids = client.import(settings::load(&path)?)?;
                println!("Loaded {} publishers", ids.len());
            }
        }
        "clear" => client.clear()?,
        "help" => println!("{}", HELP),
        "quit" | "exit" => return Ok(false),
        other => println!("unknown command '{}', try 'help'", other),
    }
    Ok(true)
}

fn root_path(path: &str) -> &str {
    if path == "." { "" } else { path }
}
