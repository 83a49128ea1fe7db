use covswarm_core::state::Event;
use covswarm_core::{NodeId, VisualizationState, VizConfig};
use serde::Serialize;
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Core(covswarm_core::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Core(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<covswarm_core::Error> for CliError {
    fn from(value: covswarm_core::Error) -> Self {
        Self::Core(value)
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
    Scene,
    Sample,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<String>,
    pretty: bool,
    seed: Option<u64>,
    keyword: Option<String>,
    category: Option<String>,
    node: Option<String>,
    time: Option<f64>,
}

fn usage() -> &'static str {
    "covswarm-cli\n\
\n\
USAGE:\n\
  covswarm-cli [layout] [--pretty] [--seed <n>] [--config <path>] [<csv-path>|-]\n\
  covswarm-cli scene [--pretty] [--seed <n>] [--config <path>] [--keyword <kw>] [--category <type>] [--node <id>] [--time <0..1>] [<csv-path>|-]\n\
  covswarm-cli sample [--pretty] [--seed <n>] [--config <path>]\n\
\n\
NOTES:\n\
  - If <csv-path> is omitted or '-', CSV input is read from stdin.\n\
  - layout prints final marker positions and month bands as JSON.\n\
  - scene applies the given selections/scrub and prints the resulting scene.\n\
  - sample runs the pipeline on the generated demo dataset.\n\
  - --config points at a JSON file overriding any subset of the defaults.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "scene" => args.command = Command::Scene,
            "sample" => args.command = Command::Sample,
            "--pretty" => args.pretty = true,
            "--seed" => {
                let Some(seed) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.seed = Some(seed.parse::<u64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--keyword" => {
                let Some(kw) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.keyword = Some(kw.clone());
            }
            "--category" => {
                let Some(cat) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.category = Some(cat.clone());
            }
            "--node" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.node = Some(id.clone());
            }
            "--time" => {
                let Some(t) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.time = Some(t.parse::<f64>().map_err(|_| CliError::Usage(usage()))?);
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn load_config(args: &Args) -> Result<VizConfig, CliError> {
    let mut config = match args.config.as_deref() {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => VizConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.random_seed = seed;
    }
    Ok(config)
}

fn build_state(args: &Args, config: VizConfig) -> Result<VisualizationState, CliError> {
    if matches!(args.command, Command::Sample) {
        return Ok(VisualizationState::from_sample(config)?);
    }
    let csv = match args.input.as_deref() {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)?,
    };
    let rows = covswarm_core::ingest::read_csv(csv.as_bytes(), &config)?;
    Ok(VisualizationState::from_rows(&rows, config)?)
}

#[derive(Serialize)]
struct MarkerOut<'a> {
    id: &'a NodeId,
    group: &'a str,
    fill: &'a str,
    x: f64,
    y: f64,
    r: f64,
}

#[derive(Serialize)]
struct BandOut {
    year: i32,
    month: u32,
    count: usize,
    y_start: f64,
    y_end: f64,
}

#[derive(Serialize)]
struct LayoutOut<'a> {
    markers: Vec<MarkerOut<'a>>,
    bands: Vec<BandOut>,
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn parse_node_id(raw: &str) -> NodeId {
    match raw.parse::<i64>() {
        Ok(n) => NodeId::Num(n),
        Err(_) => NodeId::Gen(raw.to_string()),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(&args)?;
    let mut state = build_state(&args, config)?;

    match args.command {
        Command::Layout | Command::Sample => {
            let out = LayoutOut {
                markers: state
                    .dataset()
                    .records()
                    .iter()
                    .map(|rec| MarkerOut {
                        id: &rec.id,
                        group: rec.group.label(),
                        fill: rec.group.color(),
                        x: rec.display_x,
                        y: rec.display_y,
                        r: rec.radius,
                    })
                    .collect(),
                bands: state
                    .bands()
                    .iter()
                    .map(|b| BandOut {
                        year: b.year,
                        month: b.month,
                        count: b.count,
                        y_start: b.y_start,
                        y_end: b.y_end,
                    })
                    .collect(),
            };
            write_json(&out, args.pretty)
        }
        Command::Scene => {
            let mut scene = state.apply(Event::Tick { now_ms: 0 });
            if let Some(id) = args.node.as_deref() {
                scene = state.apply(Event::NodeClick {
                    id: parse_node_id(id),
                    now_ms: 0,
                });
            }
            if let Some(kw) = args.keyword.as_deref() {
                scene = state.apply(Event::KeywordClick {
                    keyword: kw.to_string(),
                    now_ms: 0,
                });
            }
            if let Some(cat) = args.category.as_deref() {
                scene = state.apply(Event::CategoryClick {
                    category: cat.to_string(),
                    now_ms: 0,
                });
            }
            if let Some(t) = args.time {
                scene = state.apply(Event::Scrub { time: t, now_ms: 0 });
            }
            write_json(&scene, args.pretty)
        }
    }
}

fn main() {
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

    match run(args) {
        Ok(()) => {}
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        std::iter::once("covswarm-cli")
            .chain(parts.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn default_command_is_layout_with_optional_path() {
        let args = parse_args(&argv(&["data.csv"])).unwrap();
        assert!(matches!(args.command, Command::Layout));
        assert_eq!(args.input.as_deref(), Some("data.csv"));
    }

    #[test]
    fn scene_flags_are_collected() {
        let args = parse_args(&argv(&[
            "scene", "--keyword", "lockdown", "--time", "0.5", "--pretty", "-",
        ]))
        .unwrap();
        assert!(matches!(args.command, Command::Scene));
        assert_eq!(args.keyword.as_deref(), Some("lockdown"));
        assert_eq!(args.time, Some(0.5));
        assert!(args.pretty);
        assert_eq!(args.input.as_deref(), Some("-"));
    }

    #[test]
    fn unknown_flags_are_usage_errors() {
        assert!(matches!(
            parse_args(&argv(&["--nope"])),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn two_positional_paths_are_rejected() {
        assert!(matches!(
            parse_args(&argv(&["a.csv", "b.csv"])),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn node_ids_parse_numeric_or_generated() {
        assert_eq!(parse_node_id("42"), NodeId::Num(42));
        assert!(matches!(parse_node_id("gen_1_2_abc"), NodeId::Gen(_)));
    }
}
