use serde::Serialize;
use serde_json::json;
use shoal::load::{self, Format};
use shoal::{
    ColumnStats, ColumnType, DissimilarityModel, DistanceTransform, Engine, EngineConfig, Flags,
    Metric, Point, SolverKind, StopReason,
};
use std::io::Read;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Shoal(shoal::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Shoal(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<shoal::Error> for CliError {
    fn from(value: shoal::Error) -> Self {
        Self::Shoal(value)
    }
}

impl From<shoal::ModelError> for CliError {
    fn from(value: shoal::ModelError) -> Self {
        Self::Shoal(value.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Describe,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    format: Format,
    solver: SolverKind,
    iterations: Option<u64>,
    threshold: Option<f64>,
    columns: Option<Vec<usize>>,
    normalise: bool,
    seed: Option<u64>,
    init: Option<String>,
    config: Option<String>,
    pretty: bool,
    out: Option<String>,
}

#[derive(Serialize)]
struct FieldOut<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: ColumnType,
    stats: &'a ColumnStats,
}

#[derive(Serialize)]
struct DescribeOut<'a> {
    records: usize,
    metric: Metric,
    transform: DistanceTransform,
    flags: Flags,
    fields: Vec<FieldOut<'a>>,
}

#[derive(Serialize)]
struct PositionOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    x: f64,
    y: f64,
}

#[derive(Serialize)]
struct LayoutOut<'a> {
    solver: SolverKind,
    iterations: u64,
    quantity: Option<f64>,
    stress: f64,
    reason: StopReason,
    positions: Vec<PositionOut<'a>>,
}

fn usage() -> &'static str {
    "shoal-cli\n\
\n\
USAGE:\n\
  shoal-cli describe [--format table|triangle|vectors|sequences] [--pretty] [<path>|-]\n\
  shoal-cli [layout] [--format table|triangle|vectors|sequences] [--solver spring|shepard] [--iterations <n> | --threshold <q>] [--columns <i,j,..>] [--normalise] [--seed <n>] [--init random|classical] [--config <file.json>] [--pretty] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - --config is deep-merged over the defaults; individual flags override it.\n\
  - layout prints JSON to stdout by default; use --out to write a file.\n\
  - Set SHOAL_LOG (for example SHOAL_LOG=debug) to log progress to stderr.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a str, CliError> {
    it.next()
        .map(String::as_str)
        .ok_or(CliError::Usage(usage()))
}

fn parse_columns(list: &str) -> Result<Vec<usize>, CliError> {
    list.split(',')
        .map(|c| c.trim().parse::<usize>().map_err(|_| CliError::Usage(usage())))
        .collect()
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "describe" => args.command = Command::Describe,
            "--pretty" => args.pretty = true,
            "--normalise" | "--normalize" => args.normalise = true,
            "--format" => {
                args.format = next_value(&mut it)?
                    .parse::<Format>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--solver" => {
                args.solver = next_value(&mut it)?
                    .parse::<SolverKind>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--iterations" => {
                let n = next_value(&mut it)?
                    .parse::<u64>()
                    .map_err(|_| CliError::Usage(usage()))?;
                args.iterations = Some(n);
            }
            "--threshold" => {
                let q = next_value(&mut it)?
                    .parse::<f64>()
                    .map_err(|_| CliError::Usage(usage()))?;
                if !(q.is_finite() && q >= 0.0) {
                    return Err(CliError::Usage(usage()));
                }
                args.threshold = Some(q);
            }
            "--columns" => args.columns = Some(parse_columns(next_value(&mut it)?)?),
            "--seed" => {
                let seed = next_value(&mut it)?
                    .parse::<u64>()
                    .map_err(|_| CliError::Usage(usage()))?;
                args.seed = Some(seed);
            }
            "--init" => {
                let init = next_value(&mut it)?;
                if !matches!(init, "random" | "classical") {
                    return Err(CliError::Usage(usage()));
                }
                args.init = Some(init.to_string());
            }
            "--config" => args.config = Some(next_value(&mut it)?.to_string()),
            "--out" => args.out = Some(next_value(&mut it)?.to_string()),
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    if args.iterations.is_some() && args.threshold.is_some() {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match out {
        None | Some("-") => println!("{text}"),
        Some(path) => std::fs::write(path, text)?,
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<EngineConfig, CliError> {
    let mut config = EngineConfig::default();
    if let Some(path) = args.config.as_deref() {
        let file = EngineConfig::from_json_str(&std::fs::read_to_string(path)?)?;
        config.deep_merge(file.as_value());
    }
    if let Some(seed) = args.seed {
        config.set_value("layout.seed", json!(seed));
    }
    if let Some(init) = args.init.as_deref() {
        config.set_value("layout.init", json!(init));
    }
    if let Some(n) = args.iterations {
        config.set_value("trigger", json!({ "kind": "iterations", "threshold": n }));
    }
    if let Some(q) = args.threshold {
        config.set_value("trigger", json!({ "kind": "quantity", "threshold": q }));
    }
    Ok(config)
}

fn describe(model: &DissimilarityModel) -> DescribeOut<'_> {
    let fields = model
        .fields()
        .iter()
        .zip(model.column_types())
        .zip(model.column_stats())
        .map(|((name, kind), stats)| FieldOut {
            name: name.as_str(),
            kind,
            stats,
        })
        .collect();
    DescribeOut {
        records: model.len(),
        metric: model.metric(),
        transform: model.transform(),
        flags: model.flags(),
        fields,
    }
}

fn positions<'a>(model: &'a DissimilarityModel, points: &[Point]) -> Vec<PositionOut<'a>> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| PositionOut {
            label: model.label(i),
            x: p.x,
            y: p.y,
        })
        .collect()
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let mut model = load::parse_str(&text, args.format)?;
    tracing::debug!(
        records = model.len(),
        metric = ?model.metric(),
        "input loaded"
    );

    match args.command {
        Command::Describe => write_json(&describe(&model), args.pretty, args.out.as_deref()),
        Command::Layout => {
            if args.normalise {
                model.set_normalised(true)?;
            }
            let config = build_config(&args)?;
            let engine = Engine::new(model).with_config(config);
            let outcome = engine.run(args.solver, args.columns.as_deref())?;
            tracing::info!(
                solver = %outcome.solver,
                iterations = outcome.iterations,
                stress = outcome.stress,
                "layout finished"
            );
            let out = LayoutOut {
                solver: outcome.solver,
                iterations: outcome.iterations,
                quantity: outcome.quantity,
                stress: outcome.stress,
                reason: outcome.reason,
                positions: positions(engine.model(), outcome.state.positions()),
            };
            write_json(&out, args.pretty, args.out.as_deref())
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("SHOAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
