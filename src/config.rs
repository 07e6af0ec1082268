//! Command line configuration for the server binary.

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// A personal finance tracking API.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Config {
    /// The address to listen on.
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub address: SocketAddr,

    /// The path to the SQLite database file. Created if it does not exist.
    #[arg(long, default_value = "financas.db")]
    pub database_path: PathBuf,
}
