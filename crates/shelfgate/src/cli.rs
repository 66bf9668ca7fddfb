use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use shelfgate_client::DEFAULT_API_URL;
use shelfgate_core::MemberId;
use url::Url;

/// Access gating of a subscription-based e-book service
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub cmd: OptsCmd,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Where the local session is kept
    #[arg(env = "SHELFGATE_DATA_DIR", long)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the backend API
    #[arg(env = "SHELFGATE_API_URL", long, default_value = DEFAULT_API_URL)]
    pub api_url: Url,

    /// Timeout of every request to the backend
    #[arg(env = "SHELFGATE_TIMEOUT_SECS", long, default_value = "10")]
    pub timeout_secs: u64,
}

static PROJECTS_DIR: LazyLock<directories::ProjectDirs> = LazyLock::new(|| {
    directories::ProjectDirs::from("org", "Shelfgate", "shelfgate")
        .expect("Unable to determine project's dir")
});

impl GlobalOpts {
    pub fn data_dir(&self) -> &Path {
        self.data_dir.as_deref().unwrap_or_else(|| {
            PROJECTS_DIR
                .state_dir()
                .unwrap_or_else(|| PROJECTS_DIR.data_local_dir())
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Subcommand)]
pub enum OptsCmd {
    /// Log in and store the session
    Login {
        #[arg(long)]
        username: String,

        #[arg(long, env = "SHELFGATE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the stored session
    Status,
    /// Show the route table
    Routes,
    /// Run the navigation guard on each path, in order
    Navigate {
        /// Act as if a payment has just succeeded
        #[arg(long)]
        payment_success: bool,

        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Development and debugging commands
    #[command(subcommand)]
    Dev(DevCmd),
}

#[derive(Debug, Subcommand)]
pub enum DevCmd {
    /// Decode the payload of a token and recover the member id from it
    DecodeToken { token: String },
    /// Resolve entitlement of a member, bypassing the guard
    Resolve { member_id: MemberId },
}
