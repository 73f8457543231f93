use futures::executor::block_on;
use mermaid_block::{
    AssistError, BlockConfig, DiagramSource, Direction, MermaidCli, PageActivator,
    PreviewController, PreviewDisplay, PreviewState, Theme, WrapperStyle,
    extract_fenced_block, normalize_code, render_placeholder,
};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Block(mermaid_block::Error),
    Assist(AssistError),
    Json(serde_json::Error),
    Preview(String),
    EmptySource,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Block(err) => write!(f, "{err}"),
            CliError::Assist(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Preview(text) => write!(f, "{text}"),
            CliError::EmptySource => write!(f, "No diagram source"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<mermaid_block::Error> for CliError {
    fn from(value: mermaid_block::Error) -> Self {
        Self::Block(value)
    }
}

impl From<AssistError> for CliError {
    fn from(value: AssistError) -> Self {
        Self::Assist(value)
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
    Normalize,
    Extract,
    Render,
    Activate,
    Placeholder,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    out: Option<String>,
    config: Option<String>,
    theme: Theme,
    font_size: Option<i64>,
    direction: Direction,
    draggable: bool,
}

fn usage() -> &'static str {
    "mermaid-block-cli\n\
\n\
USAGE:\n\
  mermaid-block-cli [normalize] [<path>|-]\n\
  mermaid-block-cli extract [<path>|-]\n\
  mermaid-block-cli render [--theme default|forest|dark|neutral] [--font-size <12-24>] [--direction TB|BT|LR|RL] [--draggable] [--config <path>] [--out <path>] [<path>|-]\n\
  mermaid-block-cli activate [--config <path>] [--out <path>] [<path>|-]\n\
  mermaid-block-cli placeholder [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - normalize repairs arrow syntax mangled by HTML storage and prints the diagram source.\n\
  - extract prints the first fenced code block of an AI reply.\n\
  - render and activate drive the Mermaid CLI (`mmdc` unless configured otherwise).\n\
  - activate renders every diagram placeholder of an HTML page and prints the page.\n\
  - placeholder reads block attributes (JSON) and prints the server-side block markup.\n\
  - Set RUST_LOG (e.g. RUST_LOG=mermaid_block=debug) for diagnostics on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "normalize" => args.command = Command::Normalize,
            "extract" => args.command = Command::Extract,
            "render" => args.command = Command::Render,
            "activate" => args.command = Command::Activate,
            "placeholder" => args.command = Command::Placeholder,
            "--draggable" => args.draggable = true,
            "--theme" => {
                let Some(theme) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.theme = theme
                    .parse::<Theme>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--font-size" => {
                let Some(size) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.font_size = Some(size.parse::<i64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--direction" => {
                let Some(direction) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.direction = direction
                    .parse::<Direction>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
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

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
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

fn load_config(path: Option<&str>) -> Result<BlockConfig, CliError> {
    match path {
        None => Ok(BlockConfig::default()),
        Some(path) => Ok(BlockConfig::load(Path::new(path))?),
    }
}

fn render_diagram(args: &Args, text: &str) -> Result<String, CliError> {
    let config = load_config(args.config.as_deref())?;
    let gateway = MermaidCli::new(config.renderer);

    let mut source = DiagramSource::new(normalize_code(text))
        .with_theme(args.theme)
        .with_direction(args.direction)
        .with_draggable(args.draggable);
    if let Some(px) = args.font_size {
        source = source.with_font_size(px);
    }

    let mut controller = PreviewController::new(source).with_settings(&config.preview);
    block_on(controller.refresh(&gateway));

    match (controller.state(), controller.display()) {
        (PreviewState::Rendered, PreviewDisplay::Diagram { svg }) => {
            if args.draggable {
                Ok(mermaid_block::svg::enable_dragging(svg))
            } else {
                Ok(svg.clone())
            }
        }
        (PreviewState::Idle, _) => Err(CliError::EmptySource),
        (_, PreviewDisplay::Notice { text, .. }) => Err(CliError::Preview(text.clone())),
        (state, _) => Err(CliError::Preview(format!("Unexpected preview state: {state:?}"))),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let input = read_input(args.input.as_deref())?;

    match args.command {
        Command::Normalize => {
            let code = normalize_code(&input);
            if code.is_empty() {
                return Err(CliError::EmptySource);
            }
            write_text(&format!("{code}\n"), args.out.as_deref())
        }
        Command::Extract => {
            let code = extract_fenced_block(&input)?;
            write_text(&format!("{code}\n"), args.out.as_deref())
        }
        Command::Render => {
            let svg = render_diagram(&args, &input)?;
            write_text(&svg, args.out.as_deref())
        }
        Command::Activate => {
            let config = load_config(args.config.as_deref())?;
            let activator = PageActivator::new(MermaidCli::new(config.renderer))
                .with_concurrency(config.activation.max_concurrent_renders);
            let page = block_on(activator.activate(&input))?;
            tracing::info!(
                rendered = page.rendered_count(),
                failed = page.failed_count(),
                "page activated"
            );
            write_text(&page.html, args.out.as_deref())
        }
        Command::Placeholder => {
            let attrs: Value = serde_json::from_str(&input)?;
            let source = DiagramSource::from_attributes(&attrs);
            let markup = render_placeholder(&source, &WrapperStyle::from_attributes(&attrs));
            write_text(&format!("{markup}\n"), args.out.as_deref())
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
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

    init_tracing();

    match run(args) {
        Ok(()) => {}
        Err(CliError::EmptySource) => {
            eprintln!("{}", CliError::EmptySource);
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
