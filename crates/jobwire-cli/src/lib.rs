//! Client library and command-line runtime for the jobwire job server.
//!
//! [`RpcClient`] submits jobs and polls for their outcomes over the RPC
//! endpoint; [`BatchClient`] sends a whole batch over the batch endpoint and
//! returns the aggregated result lines. [`run`] wraps both behind the
//! `jobwire` binary, resolving endpoints through the same layered
//! configuration the server uses. Against a server in sync mode,
//! [`RpcClient::execute`] (`--sync` on the command line) receives the outcome
//! in the reply itself.

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use clap::error::ErrorKind;

use jobwire_config::Config;
use jobwire_protocol::{Command, ERROR_PREFIX, JobHandle, NOT_READY, Operation};

mod cli;
mod client;
mod config;
mod errors;
mod transport;

use cli::{Cli, CliCommand, FollowArgs, PollingArgs};
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::AppError;

pub use client::{BatchClient, PollStatus, RpcClient};
pub use errors::ClientError;

/// Runs the CLI with the given arguments, batch input, and output streams.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdin, stdout, stderr, &OrthoConfigLoader)
}

fn run_with_loader<I, R, W, E, L>(
    args: I,
    stdin: R,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(&split.command_arguments) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = writeln!(stderr, "{}", AppError::CliUsage(error));
            return ExitCode::FAILURE;
        }
    };

    let result = loader
        .load(&split.config_arguments)
        .and_then(|config| execute(cli.command, &config, stdin, stdout));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<R, W>(command: CliCommand, config: &Config, stdin: R, stdout: &mut W) -> Result<(), AppError>
where
    R: BufRead,
    W: Write,
{
    let rpc = RpcClient::new(config.rpc_socket().clone());
    match command {
        CliCommand::Foo { iterations, follow } => {
            submit(&rpc, Operation::Count { iterations }, &follow, stdout)
        }
        CliCommand::Add { lhs, rhs, follow } => {
            submit(&rpc, Operation::Add { lhs, rhs }, &follow, stdout)
        }
        CliCommand::Sort { values, follow } => {
            submit(&rpc, Operation::Sort { values }, &follow, stdout)
        }
        CliCommand::Poll { handle } => {
            let text = match rpc.poll(handle)? {
                PollStatus::Ready(outcome) => checked_outcome(handle, outcome)?,
                PollStatus::NotReady => NOT_READY.to_owned(),
            };
            emit(stdout, &text)
        }
        CliCommand::Wait { handle, polling } => {
            let outcome = wait(&rpc, handle, polling)?;
            emit(stdout, &outcome)
        }
        CliCommand::Batch => {
            let body = stdin
                .lines()
                .collect::<Result<Vec<_>, _>>()
                .map_err(AppError::ReadInput)?;
            let body: Vec<&str> = body
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .collect();
            let batch = BatchClient::new(config.batch_socket().clone());
            for line in batch.send_lines(&body)? {
                emit(stdout, &line)?;
            }
            Ok(())
        }
    }
}

fn submit<W: Write>(
    rpc: &RpcClient,
    operation: Operation,
    follow: &FollowArgs,
    stdout: &mut W,
) -> Result<(), AppError> {
    if follow.sync {
        let outcome = rpc.execute(operation)?;
        return emit(stdout, &outcome);
    }
    let handle = rpc.submit(&Command::Submit(operation))?;
    if !follow.wait {
        return emit(stdout, &handle.to_string());
    }
    let outcome = wait(rpc, handle, follow.polling)?;
    emit(stdout, &outcome)
}

fn wait(rpc: &RpcClient, handle: JobHandle, polling: PollingArgs) -> Result<String, AppError> {
    let interval = Duration::from_millis(polling.interval_ms);
    let outcome = rpc.wait(handle, interval, polling.attempts)?;
    checked_outcome(handle, outcome)
}

fn checked_outcome(handle: JobHandle, outcome: String) -> Result<String, AppError> {
    match outcome.strip_prefix(ERROR_PREFIX) {
        Some(detail) => Err(AppError::JobFailed {
            handle,
            outcome: detail.to_owned(),
        }),
        None => Ok(outcome),
    }
}

fn emit<W: Write>(stdout: &mut W, text: &str) -> Result<(), AppError> {
    writeln!(stdout, "{text}").map_err(AppError::WriteOutput)?;
    stdout.flush().map_err(AppError::WriteOutput)
}
