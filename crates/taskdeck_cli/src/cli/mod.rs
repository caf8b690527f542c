use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "taskdeck", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and start a session
    ///
    /// Example: taskdeck register a@x.com pw123456 "Ada"
    Register {
        email: String,
        password: String,
        name: String,
    },
    /// Log in with an existing account
    ///
    /// Example: taskdeck login a@x.com pw123456
    Login {
        email: String,
        password: String,
    },
    /// End the current session
    ///
    /// Example: taskdeck logout
    Logout,
    /// Show the account the current session belongs to
    ///
    /// Example: taskdeck whoami
    Whoami,
    /// List your tasks
    ///
    /// Example: taskdeck list
    /// Example: taskdeck list --pending
    List {
        /// Only completed tasks
        #[arg(long, conflicts_with = "pending")]
        completed: bool,
        /// Only tasks not yet completed
        #[arg(long)]
        pending: bool,
    },
    /// Add a new task
    ///
    /// Example: taskdeck add "Buy milk" -d "2 liters"
    Add {
        title: Option<String>,
        #[arg(short = 'd', long)]
        description: Option<String>,
    },
    /// Show details of a task
    ///
    /// Example: taskdeck show 1
    Show {
        id: String,
    },
    /// Edit a task's title or description
    ///
    /// Example: taskdeck edit 1 "Buy oat milk"
    /// Example: taskdeck edit 1 -d "from the corner shop"
    Edit {
        id: String,
        title: Option<String>,
        #[arg(short = 'd', long)]
        description: Option<String>,
    },
    /// Toggle a task's completion flag
    ///
    /// Example: taskdeck done 1
    Done {
        id: String,
    },
    /// Delete a task
    ///
    /// Example: taskdeck delete 1 --yes
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    ApiUrl,
    TimeoutSecs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    if value.is_empty() {
        return Err("override value cannot be empty".to_string());
    }

    let canonical_field = canonicalize_flag_name(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;

    match canonical_field.as_str() {
        "api_url" => Ok(ParsedConfigOverride {
            target: ConfigOverrideTarget::ApiUrl,
            value,
        }),
        "timeout" | "timeout_secs" => Ok(ParsedConfigOverride {
            target: ConfigOverrideTarget::TimeoutSecs,
            value,
        }),
        other => Err(format!("unknown config field '{other}'")),
    }
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
