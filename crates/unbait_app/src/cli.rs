//! Command-line surface of the `unbait` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use unbait_core::{Point, Size};
use unbait_engine::Provider;

#[derive(Parser)]
#[command(name = "unbait")]
#[command(about = "Answer clickbait links with a one-sentence summary")]
#[command(version)]
pub(crate) struct Cli {
    /// Settings file path
    #[arg(short, long, default_value = "unbait_settings.ron", global = true)]
    pub settings: PathBuf,

    /// Default prompt file (overrides the one next to the settings file)
    #[arg(long, global = true)]
    pub prompt_file: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogTarget::File, global = true)]
    pub log: LogTarget,

    /// Log debug detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogTarget {
    Terminal,
    File,
    Both,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Resolve one or more links and show the answers as popups
    Resolve {
        /// Links to resolve
        #[arg(required = true)]
        urls: Vec<String>,

        /// Right-click position in client coordinates
        #[arg(long, default_value = "0,0", value_parser = parse_point)]
        at: Point,

        /// Page scroll offset
        #[arg(long, default_value = "0,0", value_parser = parse_point)]
        scroll: Point,

        /// Viewport size
        #[arg(long, default_value = "1024x768", value_parser = parse_size)]
        viewport: Size,

        /// Press the dismiss control of this link's loading popup
        #[arg(long)]
        cancel: Vec<String>,
    },

    /// Show or edit settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Print the current settings with the API key masked
    Show,

    /// Change one or more settings
    Set {
        /// LLM provider (openai, anthropic)
        #[arg(long)]
        provider: Option<Provider>,

        /// Model id; empty selects the provider default
        #[arg(long)]
        model: Option<String>,

        /// API key for the selected provider
        #[arg(long)]
        api_key: Option<String>,

        /// System prompt; empty restores the default prompt
        #[arg(long)]
        system_prompt: Option<String>,
    },

    /// Restore the default system prompt
    ResetPrompt,
}

fn parse_point(text: &str) -> Result<Point, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{text}'"))?;
    Ok(Point {
        x: parse_coord(x)?,
        y: parse_coord(y)?,
    })
}

fn parse_size(text: &str) -> Result<Size, String> {
    let (width, height) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT but got '{text}'"))?;
    let size = Size {
        width: parse_coord(width)?,
        height: parse_coord(height)?,
    };
    if size.width <= 0 || size.height <= 0 {
        return Err(format!("viewport must be positive, got '{text}'"));
    }
    Ok(size)
}

fn parse_coord(text: &str) -> Result<i32, String> {
    text.trim()
        .parse()
        .map_err(|err| format!("invalid coordinate '{text}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_arguments_parse() {
        let cli = Cli::try_parse_from([
            "unbait",
            "resolve",
            "https://example.com/a",
            "--at",
            "800,20",
            "--viewport",
            "1000x800",
            "--cancel",
            "https://example.com/a",
        ])
        .unwrap();
        let Commands::Resolve {
            urls,
            at,
            viewport,
            cancel,
            ..
        } = cli.command
        else {
            panic!("expected resolve");
        };
        assert_eq!(urls, vec!["https://example.com/a"]);
        assert_eq!(at, Point { x: 800, y: 20 });
        assert_eq!(
            viewport,
            Size {
                width: 1000,
                height: 800
            }
        );
        assert_eq!(cancel, vec!["https://example.com/a"]);
    }

    #[test]
    fn provider_is_validated() {
        assert!(Cli::try_parse_from(["unbait", "config", "set", "--provider", "gemini"]).is_err());
        let cli =
            Cli::try_parse_from(["unbait", "config", "set", "--provider", "Anthropic"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Set {
                    provider: Some(Provider::Anthropic),
                    ..
                }
            }
        ));
    }

    #[test]
    fn malformed_geometry_is_rejected() {
        assert!(parse_point("12").is_err());
        assert!(parse_size("0x100").is_err());
        assert_eq!(parse_point(" 3, -4").unwrap(), Point { x: 3, y: -4 });
    }
}
