//! Command dispatch logic for stagewatch

use super::{DemoArgs, InitArgs, ValidateArgs, init_config, run_demo, validate_config};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "stagewatch", version, author, long_about = None)]
#[command(about = "Watch and steer a long-running, multi-stage job from the terminal")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: StagewatchSubcommand,
}

#[derive(Subcommand, Debug)]
enum StagewatchSubcommand {
    /// Run a simulated multi-stage job under the live display
    Demo(Box<DemoArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        StagewatchSubcommand::Demo(demo_args) => run_demo(host, demo_args).await,
        StagewatchSubcommand::Init(init_args) => init_config(host, init_args),
        StagewatchSubcommand::Validate(validate_args) => validate_config(host, validate_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_demo_flags() {
        let cli = Cli::parse_from(["stagewatch", "demo", "--style", "animated", "--fail-at", "reporting", "--no-time"]);
        let StagewatchSubcommand::Demo(args) = cli.command else {
            panic!("expected the demo command");
        };
        assert_eq!(args.style, Some(crate::render::RenderStyle::Animated));
        assert_eq!(args.fail_at, Some(crate::progress::Stage::Reporting));
        assert!(args.no_time);
    }
}
