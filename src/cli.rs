use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "family-notify", about = "Live notification feed for the family goals app")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<NotifyCommands>,
}

#[derive(Debug, Subcommand)]
pub enum NotifyCommands {
    /// Keep the feed live and log incoming notifications (default)
    Watch,
    /// Mark one notification as read
    MarkRead(MarkReadArgs),
    /// Mark every notification as read
    MarkAllRead,
    /// Show or change notification preferences
    Preferences(PreferencesArgs),
}

#[derive(Debug, Args)]
pub struct MarkReadArgs {
    /// Notification id
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct PreferencesArgs {
    /// Turn notifications on or off
    #[arg(long)]
    pub enabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["family-notify"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_mark_read_parsing() {
        let cli = Cli::try_parse_from(["family-notify", "mark-read", "42"]).unwrap();

        match cli.command {
            Some(NotifyCommands::MarkRead(args)) => assert_eq!(args.id, 42),
            other => panic!("Expected MarkRead command, got {:?}", other),
        }
    }

    #[test]
    fn test_preferences_parsing() {
        let cli = Cli::try_parse_from(["family-notify", "preferences", "--enabled", "false"]).unwrap();

        match cli.command {
            Some(NotifyCommands::Preferences(args)) => assert_eq!(args.enabled, Some(false)),
            other => panic!("Expected Preferences command, got {:?}", other),
        }
    }

    #[test]
    fn test_mark_read_requires_numeric_id() {
        assert!(Cli::try_parse_from(["family-notify", "mark-read", "abc"]).is_err());
    }
}
