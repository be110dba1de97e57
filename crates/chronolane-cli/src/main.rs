use chrono::{DateTime, Utc};
use chronolane::layout::scale::{
    AxisOrientation, NarrativeScale, TickInterval, TimeScale, narrative_ticks, time_ticks,
};
use chronolane::layout::model::{GroupLayout, TickLayout};
use chronolane::layout::{
    ExpandState, HeadlessError, LaneAxis, LaneKind, LayoutOptions, View, ViewLayout, layout_view,
};
use chronolane::{Event, LayoutConfig};
use serde::Serialize;
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(String),
    Io(std::io::Error),
    Input(chronolane::Error),
    Layout(HeadlessError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Input(err) => write!(f, "{err}"),
            CliError::Layout(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<chronolane::Error> for CliError {
    fn from(value: chronolane::Error) -> Self {
        Self::Input(value)
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Layout(value)
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
    Lanes,
    Columns,
    Curve,
    Ticks,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    kind: LaneKind,
    axis: LaneAxis,
    config: Option<String>,
    state: Option<String>,
    state_out: Option<String>,
    expand: Vec<String>,
    select: Vec<usize>,
    collapse_all: bool,
    reference: Option<DateTime<Utc>>,
    out: Option<String>,
}

/// Output of the `ticks` command.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TicksOut {
    interval: Option<TickInterval>,
    time: Vec<TickLayout>,
    narrative: Vec<TickLayout>,
}

fn usage() -> String {
    "chronolane-cli\n\
\n\
USAGE:\n\
  chronolane-cli [lanes] [--by entity|topic|sentiment] [--axis real|narrative] [--state <path>] [--expand <key>]... [--select <index>]... [--collapse-all] [--state-out <path>] [COMMON] [<path>|-]\n\
  chronolane-cli columns [COMMON] [<path>|-]\n\
  chronolane-cli curve [COMMON] [<path>|-]\n\
  chronolane-cli ticks [COMMON] [<path>|-]\n\
\n\
COMMON:\n\
  --config <path>      JSON layout config overrides (deep-merged onto defaults)\n\
  --reference <date>   reference instant for the \"now\" line and undated placeholders\n\
  --pretty             pretty-print JSON\n\
  --out <path>         write JSON to a file instead of stdout\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', events are read from stdin.\n\
  - Expand flags apply in order: --collapse-all, then --expand, then --select.\n\
  - At most one group is expanded at a time.\n\
  - Set RUST_LOG=debug for layout diagnostics on stderr.\n\
"
    .to_string()
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or_else(|| CliError::Usage(usage()))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "lanes" => args.command = Command::Lanes,
            "columns" => args.command = Command::Columns,
            "curve" => args.command = Command::Curve,
            "ticks" => args.command = Command::Ticks,
            "--pretty" => args.pretty = true,
            "--collapse-all" => args.collapse_all = true,
            "--by" => {
                args.kind = next_value(&mut it)?
                    .parse::<LaneKind>()
                    .map_err(|msg| CliError::Usage(format!("{msg}\n\n{}", usage())))?;
            }
            "--axis" => {
                args.axis = next_value(&mut it)?
                    .parse::<LaneAxis>()
                    .map_err(|msg| CliError::Usage(format!("{msg}\n\n{}", usage())))?;
            }
            "--config" => args.config = Some(next_value(&mut it)?.clone()),
            "--state" => args.state = Some(next_value(&mut it)?.clone()),
            "--state-out" => args.state_out = Some(next_value(&mut it)?.clone()),
            "--expand" => args.expand.push(next_value(&mut it)?.clone()),
            "--select" => {
                let raw = next_value(&mut it)?;
                let index = raw.parse::<usize>().map_err(|_| {
                    CliError::Usage(format!("invalid event index: {raw}\n\n{}", usage()))
                })?;
                args.select.push(index);
            }
            "--reference" => {
                let raw = next_value(&mut it)?;
                let Some(at) = chronolane::time::parse_instant(raw) else {
                    return Err(CliError::Usage(format!(
                        "invalid reference date: {raw}\n\n{}",
                        usage()
                    )));
                };
                args.reference = Some(at);
            }
            "--out" => args.out = Some(next_value(&mut it)?.clone()),
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
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
    let mut text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    text.push('\n');
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn load_config(path: Option<&str>) -> Result<LayoutConfig, CliError> {
    match path {
        None => Ok(LayoutConfig::default()),
        Some(path) => Ok(LayoutConfig::from_json_str(&std::fs::read_to_string(path)?)?),
    }
}

/// A missing state file is an empty state; a present one must parse.
fn load_state(path: Option<&str>) -> Result<ExpandState, CliError> {
    let Some(path) = path else {
        return Ok(ExpandState::new());
    };
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path, "state file not found, starting collapsed");
            Ok(ExpandState::new())
        }
        Err(err) => Err(err.into()),
    }
}

fn build_ticks(events: &[Event], cfg: &LayoutConfig, options: &LayoutOptions) -> TicksOut {
    let measurer = options.text_measurer.as_ref();
    let time_scale = TimeScale::from_events(events, 0.0, cfg.scale.width, cfg.scale.exponent);
    let narrative_scale = NarrativeScale::from_events(
        events,
        cfg.columns.padding_top,
        cfg.scale.height - cfg.columns.padding_bottom,
    );
    TicksOut {
        interval: time_scale.as_ref().map(TimeScale::tick_interval),
        time: time_scale
            .as_ref()
            .map(|s| time_ticks(s, &cfg.scale, measurer))
            .unwrap_or_default(),
        narrative: narrative_scale
            .as_ref()
            .map(|s| narrative_ticks(s, &cfg.scale, measurer, AxisOrientation::Vertical))
            .unwrap_or_default(),
    }
}

fn unchanged_selection_reason(
    index: usize,
    groups: &[GroupLayout],
    state: &ExpandState,
) -> &'static str {
    match groups
        .iter()
        .find(|g| g.member_event_indexes.contains(&index))
    {
        None => "event is not part of any group",
        Some(g) if !g.is_aggregate() => "group has a single member",
        Some(g) if state.is_expanded(&g.key) => "group is already expanded",
        Some(_) => "group was not expanded",
    }
}

fn run_lanes(
    events: &[Event],
    args: &Args,
    cfg: &LayoutConfig,
    options: &LayoutOptions,
) -> Result<ViewLayout, CliError> {
    let view = View::Lanes {
        kind: args.kind,
        axis: args.axis,
    };
    let mut state = load_state(args.state.as_deref())?;

    let first = layout_view(events, view, cfg, &state, options).map_err(HeadlessError::from)?;
    let ViewLayout::Lanes(first_lanes) = &first else {
        return Ok(first);
    };

    let touched = args.collapse_all || !args.expand.is_empty() || !args.select.is_empty();
    if args.collapse_all {
        state.collapse_all();
    }
    for key in &args.expand {
        match first_lanes.groups.iter().find(|g| &g.key == key) {
            Some(group) => state.activate(key, group.member_event_indexes.len()),
            None => tracing::warn!(key = key.as_str(), "no group with this key"),
        }
    }
    for &index in &args.select {
        if state.select_event(index, &first_lanes.groups).is_none() {
            let reason = unchanged_selection_reason(index, &first_lanes.groups, &state);
            tracing::warn!(index, reason, "selection left the expand state unchanged");
        }
    }
    state.retain_keys(first_lanes.groups.iter().map(|g| g.key.as_str()));

    if let Some(path) = args.state_out.as_deref() {
        std::fs::write(path, serde_json::to_string(&state)?)?;
    }

    if !touched {
        return Ok(first);
    }
    Ok(layout_view(events, view, cfg, &state, options).map_err(HeadlessError::from)?)
}

fn run(args: Args) -> Result<(), CliError> {
    let cfg = load_config(args.config.as_deref())?;
    let text = read_input(args.input.as_deref())?;
    let events = chronolane::events_from_json_str(&text)?;

    let mut options = LayoutOptions::for_config(&cfg);
    options.reference = args.reference;

    tracing::debug!(events = events.len(), command = ?args.command, "laying out");

    match args.command {
        Command::Ticks => write_json(
            &build_ticks(&events, &cfg, &options),
            args.pretty,
            args.out.as_deref(),
        ),
        Command::Columns => {
            let layout = layout_view(&events, View::Columns, &cfg, &ExpandState::new(), &options)
                .map_err(HeadlessError::from)?;
            write_json(&layout, args.pretty, args.out.as_deref())
        }
        Command::Curve => {
            let layout =
                layout_view(&events, View::TimeCurve, &cfg, &ExpandState::new(), &options)
                    .map_err(HeadlessError::from)?;
            write_json(&layout, args.pretty, args.out.as_deref())
        }
        Command::Lanes => {
            let layout = run_lanes(&events, &args, &cfg, &options)?;
            write_json(&layout, args.pretty, args.out.as_deref())
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

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
