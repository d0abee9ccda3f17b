//! Command-line definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "registry-lock")]
#[command(about = "Registry lock administration and relock worker", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "REGISTRY_LOCK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the database file
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load registrars and domains from a JSON fixture file
    LoadFixtures {
        file: PathBuf,
    },

    /// Registry-lock domains without email verification (admin)
    Lock {
        #[arg(required = true)]
        domains: Vec<String>,
        /// Requesting registrar; defaults to the registry admin registrar
        #[arg(long)]
        client: Option<String>,
    },

    /// Remove the registry lock of domains without email verification (admin)
    Unlock {
        #[arg(required = true)]
        domains: Vec<String>,
        #[arg(long)]
        client: Option<String>,
        /// Lock the domains again after this many seconds
        #[arg(long, value_name = "SECS")]
        relock_after: Option<u64>,
    },

    /// Submit a lock or unlock request on behalf of a console user
    Request(RequestArgs),

    /// Complete a pending request with its verification code
    Verify {
        #[command(flatten)]
        actor: ActorArgs,
        code: String,
    },

    /// Show whether a domain is locked, unlocked or pending
    Status {
        domain: String,
    },

    /// List the locked domains of a registrar as the console shows them
    Locks {
        #[command(flatten)]
        actor: ActorArgs,
        #[arg(long)]
        registrar: String,
    },

    /// Relock the domain of one verified unlock now
    Relock {
        revision_id: i64,
    },

    /// Run every due automatic relock once
    Sweep,

    /// Run the relock worker until interrupted
    Worker {
        /// Seconds between sweeps; overrides the configuration file
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },

    /// Show the lock history and billing events of a domain
    History {
        domain: String,
    },

    /// List queued outgoing emails
    Outbox {
        /// Mark the listed emails as delivered
        #[arg(long)]
        mark_sent: bool,
    },
}

/// Who is acting
#[derive(Args, Debug)]
pub struct ActorArgs {
    /// Console user email address
    #[arg(long = "as", value_name = "EMAIL")]
    pub email: String,

    /// Act as registry staff
    #[arg(long)]
    pub admin: bool,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    #[command(flatten)]
    pub actor: ActorArgs,

    #[arg(long)]
    pub registrar: String,

    #[arg(long)]
    pub domain: String,

    /// Request an unlock instead of a lock
    #[arg(long)]
    pub unlock: bool,

    /// Registry lock password of the contact
    #[arg(long, env = "REGISTRY_LOCK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Lock the domain again this many seconds after the unlock completes
    #[arg(long, value_name = "SECS", requires = "unlock")]
    pub relock_after: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn unlock_parses_relock_delay() {
        let cli = Cli::try_parse_from([
            "registry-lock",
            "unlock",
            "example.tld",
            "other.tld",
            "--relock-after",
            "3600",
        ])
        .unwrap();
        match cli.command {
            Command::Unlock {
                domains,
                client,
                relock_after,
            } => {
                assert_eq!(domains, ["example.tld", "other.tld"]);
                assert!(client.is_none());
                assert_eq!(relock_after, Some(3600));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn request_relock_requires_unlock() {
        let result = Cli::try_parse_from([
            "registry-lock",
            "request",
            "--as",
            "marla.singer@example.com",
            "--registrar",
            "TheRegistrar",
            "--domain",
            "example.tld",
            "--relock-after",
            "60",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn lock_requires_a_domain() {
        assert!(Cli::try_parse_from(["registry-lock", "lock"]).is_err());
    }
}
