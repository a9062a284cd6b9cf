use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pointsbot")]
#[command(author, version, about = "Webhook Telegram bot with points, referrals and withdrawals", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the webhook server (default)
    Serve {
        /// Listen port (defaults to PORT or 8080)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Register the webhook URL and the command menu with Telegram
    SetupWebhook {
        /// Public URL Telegram should deliver to; asked for when omitted
        #[arg(short, long)]
        url: Option<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["pointsbot"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_serve_with_port() {
        let cli = Cli::try_parse_from(["pointsbot", "serve", "--port", "9000"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Serve { port: Some(9000) }));
    }

    #[test]
    fn test_setup_webhook_url() {
        let cli = Cli::try_parse_from(["pointsbot", "setup-webhook", "--url", "https://h/bot"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::SetupWebhook {
                url: Some("https://h/bot".to_string())
            })
        );
    }
}
