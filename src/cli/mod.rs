use ballot::ballot::{EventKind, ProposalId};
use clap::{Parser, Subcommand, ValueEnum};
use ops::Mutation;

pub mod config;
pub mod init;
pub mod logging;
pub mod ops;
pub mod status;
pub mod version;

#[derive(Parser)]
#[command(name = "ballot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for a single-administrator plurality ballot", long_about = None)]
pub struct Cli {
    /// Path to config file (default: <data_dir>/ballot/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a config file and create the ballot
    Init {
        /// Administrator principal of the new ballot
        #[arg(long)]
        administrator: String,

        /// Path to the ballot state file (default: ballot.cbor next to the config)
        #[arg(long)]
        state_path: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Register a voter (administrator only)
    AddVoter {
        #[arg(long)]
        caller: String,

        /// Principal to register
        address: String,
    },

    /// Open proposal registration (administrator only)
    StartProposals {
        #[arg(long)]
        caller: String,
    },

    /// Close proposal registration (administrator only)
    EndProposals {
        #[arg(long)]
        caller: String,
    },

    /// Open the voting session (administrator only)
    StartVoting {
        #[arg(long)]
        caller: String,
    },

    /// Close the voting session (administrator only)
    EndVoting {
        #[arg(long)]
        caller: String,
    },

    /// Count votes and record the winner (administrator only)
    Tally {
        #[arg(long)]
        caller: String,
    },

    /// Submit a proposal (registered voters only)
    Propose {
        #[arg(long)]
        caller: String,

        /// Proposal text
        description: String,
    },

    /// Cast a vote (registered voters only)
    Vote {
        #[arg(long)]
        caller: String,

        /// Proposal id to vote for
        proposal_id: ProposalId,
    },

    /// Show a voter record (registered voters only)
    Voter {
        #[arg(long)]
        caller: String,

        /// Principal to look up
        address: String,
    },

    /// Show a proposal (registered voters only)
    Proposal {
        #[arg(long)]
        caller: String,

        /// Proposal id
        id: ProposalId,
    },

    /// Show the current phase and result
    Status,

    /// Show the audit log, most recent first
    Audit {
        /// Only records of this kind
        #[arg(long, value_enum)]
        kind: Option<AuditKind>,

        /// Only records by this actor
        #[arg(long)]
        actor: Option<String>,

        /// Maximum records to show (0 = all)
        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Only records after this sequence number
        #[arg(long)]
        after: Option<u64>,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}

/// Audit record kinds accepted by `--kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuditKind {
    VoterRegistered,
    WorkflowStatusChange,
    ProposalRegistered,
    Voted,
}

impl From<AuditKind> for EventKind {
    fn from(kind: AuditKind) -> Self {
        match kind {
            AuditKind::VoterRegistered => EventKind::VoterRegistered,
            AuditKind::WorkflowStatusChange => EventKind::WorkflowStatusChange,
            AuditKind::ProposalRegistered => EventKind::ProposalRegistered,
            AuditKind::Voted => EventKind::Voted,
        }
    }
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.config;

    match cli.command {
        Commands::Init {
            administrator,
            state_path,
            force,
        } => init::execute(config, administrator, state_path, force).await,
        Commands::AddVoter { caller, address } => {
            ops::execute(config, caller, Mutation::AddVoter(address)).await
        }
        Commands::StartProposals { caller } => {
            ops::execute(config, caller, Mutation::StartProposals).await
        }
        Commands::EndProposals { caller } => {
            ops::execute(config, caller, Mutation::EndProposals).await
        }
        Commands::StartVoting { caller } => {
            ops::execute(config, caller, Mutation::StartVoting).await
        }
        Commands::EndVoting { caller } => ops::execute(config, caller, Mutation::EndVoting).await,
        Commands::Tally { caller } => ops::execute(config, caller, Mutation::Tally).await,
        Commands::Propose {
            caller,
            description,
        } => ops::execute(config, caller, Mutation::Propose(description)).await,
        Commands::Vote {
            caller,
            proposal_id,
        } => ops::execute(config, caller, Mutation::Vote(proposal_id)).await,
        Commands::Voter { caller, address } => ops::show_voter(config, caller, address).await,
        Commands::Proposal { caller, id } => ops::show_proposal(config, caller, id).await,
        Commands::Status => status::execute(config).await,
        Commands::Audit {
            kind,
            actor,
            limit,
            after,
            json,
        } => {
            let query = status::build_query(kind.map(EventKind::from), actor, limit, after);
            status::audit(config, query, json).await
        }
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["ballot", "init", "--administrator", "chair"]);

        assert_eq!(cli.config, None);
        match cli.command {
            Commands::Init {
                administrator,
                state_path,
                force,
            } => {
                assert_eq!(administrator, "chair");
                assert_eq!(state_path, None);
                assert!(!force);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_cli_parse_global_config_after_subcommand() {
        let cli = Cli::parse_from([
            "ballot",
            "tally",
            "--caller",
            "chair",
            "--config",
            "/etc/ballot/config.toml",
        ]);

        assert_eq!(cli.config, Some("/etc/ballot/config.toml".to_string()));
        match cli.command {
            Commands::Tally { caller } => assert_eq!(caller, "chair"),
            _ => panic!("Expected Tally command"),
        }
    }

    #[test]
    fn test_cli_parse_add_voter() {
        let cli = Cli::parse_from(["ballot", "add-voter", "--caller", "chair", "alice"]);

        match cli.command {
            Commands::AddVoter { caller, address } => {
                assert_eq!(caller, "chair");
                assert_eq!(address, "alice");
            }
            _ => panic!("Expected AddVoter command"),
        }
    }

    #[test]
    fn test_cli_parse_propose() {
        let cli = Cli::parse_from(["ballot", "propose", "--caller", "alice", "Plant trees"]);

        match cli.command {
            Commands::Propose {
                caller,
                description,
            } => {
                assert_eq!(caller, "alice");
                assert_eq!(description, "Plant trees");
            }
            _ => panic!("Expected Propose command"),
        }
    }

    #[test]
    fn test_cli_parse_vote() {
        let cli = Cli::parse_from(["ballot", "vote", "--caller", "alice", "3"]);

        match cli.command {
            Commands::Vote {
                caller,
                proposal_id,
            } => {
                assert_eq!(caller, "alice");
                assert_eq!(proposal_id, 3);
            }
            _ => panic!("Expected Vote command"),
        }
    }

    #[test]
    fn test_cli_vote_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["ballot", "vote", "--caller", "alice", "first"]).is_err());
    }

    #[test]
    fn test_cli_ops_require_caller() {
        assert!(Cli::try_parse_from(["ballot", "start-voting"]).is_err());
        assert!(Cli::try_parse_from(["ballot", "proposal", "0"]).is_err());
    }

    #[test]
    fn test_cli_parse_audit_defaults() {
        let cli = Cli::parse_from(["ballot", "audit"]);

        match cli.command {
            Commands::Audit {
                kind,
                actor,
                limit,
                after,
                json,
            } => {
                assert_eq!(kind, None);
                assert_eq!(actor, None);
                assert_eq!(limit, 50);
                assert_eq!(after, None);
                assert!(!json);
            }
            _ => panic!("Expected Audit command"),
        }
    }

    #[test]
    fn test_cli_parse_audit_filters() {
        let cli = Cli::parse_from([
            "ballot",
            "audit",
            "--kind",
            "workflow-status-change",
            "--actor",
            "chair",
            "--limit",
            "5",
        ]);

        match cli.command {
            Commands::Audit {
                kind, actor, limit, ..
            } => {
                assert_eq!(kind, Some(AuditKind::WorkflowStatusChange));
                assert_eq!(actor, Some("chair".to_string()));
                assert_eq!(limit, 5);
            }
            _ => panic!("Expected Audit command"),
        }
    }

    #[test]
    fn test_cli_parse_status_and_version() {
        assert!(matches!(
            Cli::parse_from(["ballot", "status"]).command,
            Commands::Status
        ));
        assert!(matches!(
            Cli::parse_from(["ballot", "version"]).command,
            Commands::Version
        ));
    }

    #[test]
    fn test_audit_kind_maps_to_event_kind() {
        assert_eq!(EventKind::from(AuditKind::Voted), EventKind::Voted);
        assert_eq!(
            EventKind::from(AuditKind::VoterRegistered),
            EventKind::VoterRegistered
        );
    }
}
