use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use chatbubble::core::config::{self, BubbleConfig, CliOverrides};
use chatbubble::core::formatter::{MentionsFormatter, TextFormatter};
use chatbubble::core::sanitizer::Sanitizer;
use chatbubble::tui::markdown;
use chatbubble::{OutputFormat, ThemeMode};
use clap::Parser;
use ratatui::style::Color;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "chatbubble", about = "Sanitize chat message markup for display")]
struct Args {
    /// File holding the message; reads stdin when omitted
    input: Option<PathBuf>,

    /// Output format for sanitized messages
    #[arg(short, long, default_value_t, value_enum)]
    format: OutputFormat,

    /// Treat input as assistant markdown instead of message markup
    #[arg(long)]
    markdown: bool,

    /// Deepest span nesting kept live
    #[arg(long)]
    max_depth: Option<usize>,

    /// Color theme for code highlighting
    #[arg(long, value_enum)]
    theme: Option<ThemeMode>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to chatbubble.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("chatbubble.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("chatbubble: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> io::Result<()> {
    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("Ignoring config file: {e}");
        BubbleConfig::default()
    });
    let cli = CliOverrides {
        max_depth: args.max_depth,
        theme: args.theme,
    };
    let resolved = config::resolve(&file_config, &cli);
    log::info!(
        "chatbubble starting: max_depth={}, theme={:?}",
        resolved.max_depth,
        resolved.theme
    );

    let input = read_input(args.input.as_deref())?;

    if args.markdown {
        let rendered = markdown::render(&input, Color::Reset, resolved.theme);
        for line in markdown::to_plain_lines(&rendered.text) {
            println!("{line}");
        }
        for image in &rendered.images {
            log::debug!("Image reference: {} ({})", image.src, image.alt);
        }
        return Ok(());
    }

    let sanitizer = Sanitizer::new(resolved.sanitizer_options());
    let formatters: Vec<Box<dyn TextFormatter>> =
        vec![Box::new(MentionsFormatter::new(resolved.mention_class.clone()))];
    let fragment = sanitizer.rebuild(&input, &formatters);

    match args.format {
        OutputFormat::Html => println!("{}", fragment.to_html()),
        OutputFormat::Text => println!("{}", fragment.text_content()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&fragment).map_err(io::Error::other)?;
            println!("{json}");
        }
    }
    Ok(())
}

fn read_input(path: Option<&std::path::Path>) -> io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
