use clap::{Parser, Subcommand};
use kitty_pick::{logging, App, SshClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "Pick an ssh host or a kitty theme from a filterable list")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List hosts from ~/.ssh/config (or $SSH_CONFIG_ENV) and connect
    Host {
        /// Use plain `ssh` instead of `kitten ssh`
        #[arg(long, visible_alias = "plain")]
        ssh: bool,
    },
    /// List themes under ~/.config/kitty (or $KITTY_CONFIG_DIRECTORY) and apply one
    Theme {
        /// Stay open after applying a theme
        #[arg(long)]
        keep_open: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(path) = logging::init() {
        log::info!("logging to {}", path.display());
    }

    match cli.command {
        Command::Host { ssh } => {
            let client = if ssh {
                SshClient::Plain
            } else {
                SshClient::Kitten
            };
            App::hosts(client)?.run()
        }
        Command::Theme { keep_open } => App::themes(keep_open)?.run(),
    }
}
