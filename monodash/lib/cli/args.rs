use std::path::PathBuf;

use clap::Parser;

use crate::models::{InstanceKind, LifecycleAction};

use super::styles;

//-------------------------------------------------------------------------------------------------
// Types
//-------------------------------------------------------------------------------------------------

/// monodash - observe and control the virtual machines and containers of a hypervisor host
#[derive(Debug, Parser)]
#[command(name = "monodash", author, about, version, styles=styles::styles())]
pub struct MonodashArgs {
    /// The subcommand to run
    #[command(subcommand)]
    pub subcommand: Option<MonodashSubcommand>,

    /// Path to the configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands
#[derive(Debug, Parser)]
pub enum MonodashSubcommand {
    /// Run the HTTP server
    #[command(name = "serve")]
    Serve {
        /// Address to bind to, overrides the config
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overrides the config
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the dashboard overview
    #[command(name = "overview")]
    Overview,

    /// Print the latest host telemetry
    #[command(name = "host")]
    Host {
        /// Take and store a new sample first
        #[arg(short, long)]
        refresh: bool,
    },

    /// List all instances, newest first
    #[command(name = "list")]
    List,

    /// Show one instance
    #[command(name = "show")]
    Show {
        /// Handle of the instance
        handle: i64,
    },

    /// Create a stopped instance
    #[command(name = "create")]
    Create {
        /// Unique handle of the new instance
        #[arg(long)]
        handle: i64,

        /// Name of the instance
        #[arg(long)]
        name: String,

        /// `qemu` for a virtual machine, `lxc` for a container
        #[arg(long)]
        kind: InstanceKind,

        /// Number of CPU cores
        #[arg(long)]
        cores: Option<i64>,

        /// Allocated memory in MB
        #[arg(long)]
        memory: i64,

        /// Disk size in GB
        #[arg(long)]
        disk: i64,
    },

    /// Change the attributes of an instance
    #[command(name = "update")]
    Update {
        /// Row id of the instance
        #[arg(long)]
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New number of CPU cores
        #[arg(long)]
        cores: Option<i64>,

        /// New memory allocation in MB
        #[arg(long)]
        memory: Option<i64>,

        /// New disk size in GB
        #[arg(long)]
        disk: Option<i64>,

        /// Only apply the edit if the instance is still at this version
        #[arg(long)]
        expect_version: Option<i64>,
    },

    /// Apply a lifecycle action to an instance
    #[command(name = "action")]
    Action {
        /// Handle of the instance
        handle: i64,

        /// One of start, stop, reboot, pause, resume
        action: LifecycleAction,
    },

    /// Record a metric sample of a running instance
    #[command(name = "record")]
    Record {
        /// Handle of the instance
        handle: i64,
    },

    /// List the metric samples of an instance
    #[command(name = "metrics")]
    Metrics {
        /// Handle of the instance
        handle: i64,

        /// Lookback window in hours (1 to 24)
        #[arg(long)]
        hours: Option<i64>,
    },
}

//-------------------------------------------------------------------------------------------------
// Tests
//-------------------------------------------------------------------------------------------------
