use brokerkit::ApplicationType;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use declarative::Ensure;

use crate::descriptor::DesiredApplication;

#[derive(Parser)]
#[command(name = "xdapp")]
#[command(version)]
#[command(
    about = "Declarative management of Citrix published applications",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/xdapp/config.toml)
    #[arg(long, global = true, env = "XDAPP_CONFIG")]
    pub config: Option<String>,

    /// Delivery controller to administer (overrides the config file)
    #[arg(long, global = true)]
    pub admin_address: Option<String>,

    /// Run broker calls as this user (overrides the config file)
    #[arg(long, global = true)]
    pub username: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the current state of one application
    Get(GetArgs),

    /// Check whether one application is in its declared state (exit 1 if not)
    Test(ApplicationArgs),

    /// Make one application match its declaration
    Set(SetArgs),

    /// Preview what apply would change for configured applications
    Diff(DiffArgs),

    /// Converge every configured application
    Apply(ApplyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Single-resource commands
// ============================================================================

#[derive(Args)]
pub struct GetArgs {
    /// Application name
    #[arg(short, long)]
    pub name: String,

    /// Desktop group the application is published to
    #[arg(short = 'g', long = "desktop-group")]
    pub desktop_group: String,

    /// Executable path (informational only)
    #[arg(short, long)]
    pub path: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ApplicationArgs {
    /// Application name
    #[arg(short, long)]
    pub name: String,

    /// Executable path
    #[arg(short, long, default_value = "")]
    pub path: String,

    /// Desktop group the application is published to
    #[arg(short = 'g', long = "desktop-group")]
    pub desktop_group: String,

    /// HostedOnDesktop or InstalledOnClient
    #[arg(short = 't', long, value_parser = parse_application_type)]
    pub application_type: Option<ApplicationType>,

    /// Command-line arguments passed to the executable
    #[arg(short, long, allow_hyphen_values = true)]
    pub arguments: Option<String>,

    /// Working directory
    #[arg(short, long)]
    pub working_directory: Option<String>,

    /// Description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Name shown to end users
    #[arg(long)]
    pub display_name: Option<String>,

    /// Whether the application is enabled
    #[arg(long)]
    pub enabled: Option<bool>,

    /// Whether the application is visible to users
    #[arg(long)]
    pub visible: Option<bool>,

    /// Present or Absent
    #[arg(short, long, default_value_t = Ensure::Present, value_parser = parse_ensure)]
    pub ensure: Ensure,
}

impl ApplicationArgs {
    pub fn to_desired(&self) -> DesiredApplication {
        DesiredApplication {
            name: self.name.clone(),
            path: self.path.clone(),
            desktop_group: self.desktop_group.clone(),
            application_type: self.application_type,
            arguments: self.arguments.clone(),
            working_directory: self.working_directory.clone(),
            description: self.description.clone(),
            display_name: self.display_name.clone(),
            enabled: self.enabled,
            visible: self.visible,
            ensure: self.ensure,
        }
    }
}

#[derive(Args)]
pub struct SetArgs {
    #[command(flatten)]
    pub application: ApplicationArgs,

    /// Show what would change without touching the broker
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_application_type(value: &str) -> Result<ApplicationType, String> {
    value.parse()
}

fn parse_ensure(value: &str) -> Result<Ensure, String> {
    value.parse()
}

// ============================================================================
// Declarative commands
// ============================================================================

#[derive(Args)]
pub struct DiffArgs {
    /// Limit to a target, e.g. "application", "Sales" or "application.Sales/Notepad"
    pub target: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Limit to a target, e.g. "application", "Sales" or "application.Sales/Notepad"
    pub target: Option<String>,

    /// Show what would change without touching the broker
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_set_parses_every_field() {
        let cli = parse(&[
            "xdapp",
            "set",
            "-n",
            "Notepad",
            "-p",
            r"C:\Windows\notepad.exe",
            "-g",
            "Sales",
            "--application-type",
            "installedonclient",
            "--arguments",
            "-x /y",
            "--enabled",
            "false",
            "--ensure",
            "absent",
            "--dry-run",
        ]);

        let Command::Set(args) = cli.command else {
            panic!("expected set");
        };
        let desired = args.application.to_desired();
        assert!(args.dry_run);
        assert_eq!(desired.name, "Notepad");
        assert_eq!(desired.desktop_group, "Sales");
        assert_eq!(
            desired.application_type,
            Some(ApplicationType::InstalledOnClient)
        );
        assert_eq!(desired.arguments.as_deref(), Some("-x /y"));
        assert_eq!(desired.enabled, Some(false));
        assert_eq!(desired.visible, None);
        assert_eq!(desired.ensure, Ensure::Absent);
    }

    #[test]
    fn test_unset_fields_stay_unset() {
        let cli = parse(&["xdapp", "test", "-n", "Notepad", "-p", "n.exe", "-g", "Sales"]);

        let Command::Test(args) = cli.command else {
            panic!("expected test");
        };
        let desired = args.to_desired();
        assert_eq!(desired.ensure, Ensure::Present);
        assert!(desired.arguments.is_none());
        assert!(desired.description.is_none());
        assert!(desired.enabled.is_none());
    }

    #[test]
    fn test_global_overrides() {
        let cli = parse(&[
            "xdapp",
            "diff",
            "Sales",
            "--admin-address",
            "ddc01",
            "--username",
            r"CORP\svc",
        ]);

        assert_eq!(cli.admin_address.as_deref(), Some("ddc01"));
        assert_eq!(cli.username.as_deref(), Some(r"CORP\svc"));
        let Command::Diff(args) = cli.command else {
            panic!("expected diff");
        };
        assert_eq!(args.target.as_deref(), Some("Sales"));
    }

    #[test]
    fn test_bad_application_type_is_rejected() {
        let result = Cli::try_parse_from([
            "xdapp", "test", "-n", "a", "-g", "b", "--application-type", "Streamed",
        ]);
        assert!(result.is_err());
    }
}
