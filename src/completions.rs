//! Shell completions generation

use clap::{Arg, ArgAction, Command};
use clap_complete::{generate, Shell};
use std::io;

/// Build a clap Command for shell completions
/// This mirrors our custom parser's flags
fn build_cli() -> Command {
    Command::new("websearch")
        .about("Web search with AI-written answers, streamed to your terminal")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("endpoint")
                .short('e')
                .long("endpoint")
                .help("Websearch endpoint to query")
                .value_name("URL"),
        )
        .arg(
            Arg::new("raw")
                .long("raw")
                .help("Print the answer as plain text while it streams")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print one JSON document when done")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("html")
                .long("html")
                .help("Print a standalone HTML page when done")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("color")
                .long("color")
                .help("Enable colorized output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colorized output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("make-config")
                .long("make-config")
                .help("Export example config.toml to stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Debug logging on stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .help("Generate shell completions")
                .value_name("SHELL")
                .value_parser(["bash", "zsh", "fish", "powershell", "elvish"]),
        )
        .arg(
            Arg::new("query")
                .help("Your search query")
                .num_args(0..)
                .trailing_var_arg(true),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the websearch HTTP server")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .help("Listen address")
                        .value_name("HOST"),
                )
                .arg(
                    Arg::new("port")
                        .long("port")
                        .help("Listen port")
                        .value_name("PORT")
                        .value_parser(clap::value_parser!(u16)),
                ),
        )
}

fn parse_shell(shell: &str) -> Option<Shell> {
    match shell.to_lowercase().as_str() {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "powershell" | "pwsh" => Some(Shell::PowerShell),
        "elvish" => Some(Shell::Elvish),
        _ => None,
    }
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: &str) {
    let Some(shell) = parse_shell(shell) else {
        eprintln!(
            "Unknown shell: {}. Supported: bash, zsh, fish, powershell, elvish",
            shell
        );
        return;
    };

    let mut cmd = build_cli();
    generate(shell, &mut cmd, "websearch", &mut io::stdout());
}
