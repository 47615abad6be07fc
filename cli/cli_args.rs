use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        long,
        global = true,
        help = "Specify the target project directory (default: $PROJECT_ROOT or current dir).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub project_root: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Config file name inside .context/, or an absolute path (default: ch_config.toml).",
        value_name = "CONFIG_FILE",
        help_heading = "Project Setup"
    )]
    pub config_file: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Harvest a directory tree, source contents and filtered logs into plain text.",
    long_about = "ctxharvest reads .context/ch_config.toml and renders the configured directory trees \nand file contents into .context/context.txt. It can also collect recent, filtered log \nlines from configured log directories into .context/channel_output.txt.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  ctxharvest\n  ctxharvest context --project-root ~/src/app\n  ctxharvest logs -v\n  ctxharvest debug --json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv, -vvv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(about = "Run every enabled task (the default when no command is given).")]
    Run,

    #[command(
        visible_alias = "c",
        about = "Generate the project context (trees and file contents) only."
    )]
    Context,

    #[command(visible_alias = "l", about = "Aggregate log files only.")]
    Logs,

    #[command(
        visible_alias = "d",
        about = "Show effective section settings and planned file inclusions."
    )]
    Debug(DebugArgs),

    #[command(about = "Show or save the default configuration file.")]
    Config(ConfigArgs),

    #[command(about = "Generate or save shell completion scripts.")]
    Completion(CompletionArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DebugArgs {
    #[arg(long, help = "Print the debug report as JSON.")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(
        long,
        value_name = "SHELL",
        help = "Shell to generate completions for (fish, bash, zsh) [default: fish]"
    )]
    pub shell: Option<String>,
    #[arg(
        long,
        help = "Save completion script to default location (prompts overwrite)."
    )]
    pub save: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        long,
        help = "Save the default config to the project's config path (prompts overwrite)."
    )]
    pub save: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["ctxharvest"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn project_options_work_after_a_subcommand() {
        let cli = Cli::try_parse_from([
            "ctxharvest",
            "l",
            "--project-root",
            "/tmp/proj",
            "--config-file",
            "alt.toml",
            "-vv",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Logs)));
        assert_eq!(
            cli.project_config.project_root,
            Some(PathBuf::from("/tmp/proj"))
        );
        assert_eq!(cli.project_config.config_file.as_deref(), Some("alt.toml"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn debug_accepts_json_flag() {
        let cli = Cli::try_parse_from(["ctxharvest", "debug", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Debug(args)) => assert!(args.json),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
