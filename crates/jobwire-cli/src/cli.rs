//! Command-line interface definitions for the jobwire client.

use clap::{Args, Parser, Subcommand};

use jobwire_protocol::JobHandle;

/// Client for the jobwire job server.
#[derive(Parser, Debug)]
#[command(
    name = "jobwire",
    version,
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Operations understood by the client.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Submits a counting job that sums `0..ITERATIONS`.
    Foo {
        iterations: u64,
        #[command(flatten)]
        follow: FollowArgs,
    },
    /// Submits a job adding two integers.
    Add {
        #[arg(allow_negative_numbers = true)]
        lhs: i64,
        #[arg(allow_negative_numbers = true)]
        rhs: i64,
        #[command(flatten)]
        follow: FollowArgs,
    },
    /// Submits a job sorting the given integers.
    Sort {
        #[arg(num_args = 0.., allow_negative_numbers = true)]
        values: Vec<i64>,
        #[command(flatten)]
        follow: FollowArgs,
    },
    /// Asks once for the outcome of a job.
    Poll { handle: JobHandle },
    /// Polls a job until it finishes.
    Wait {
        handle: JobHandle,
        #[command(flatten)]
        polling: PollingArgs,
    },
    /// Sends body lines read from stdin as one batch request.
    Batch,
}

/// Options shared by the submitting subcommands.
#[derive(Args, Debug, Clone)]
pub(crate) struct FollowArgs {
    /// Waits for the outcome instead of printing the handle.
    #[arg(long)]
    pub(crate) wait: bool,
    /// Expects a server in sync mode and prints the outcome it replies with.
    #[arg(long, conflicts_with = "wait")]
    pub(crate) sync: bool,
    #[command(flatten)]
    pub(crate) polling: PollingArgs,
}

/// Polling cadence for `wait`.
#[derive(Args, Debug, Clone, Copy)]
pub(crate) struct PollingArgs {
    /// Milliseconds between polls.
    #[arg(long, default_value_t = 100)]
    pub(crate) interval_ms: u64,
    /// Polls made before giving up.
    #[arg(long, default_value_t = 100)]
    pub(crate) attempts: u32,
}
