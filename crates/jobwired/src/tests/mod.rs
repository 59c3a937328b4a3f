//! Test suites for the job server.

mod process_behaviour;
mod socket_behaviour;
mod support;
