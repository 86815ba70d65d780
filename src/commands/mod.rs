//! Subcommand implementations.

mod init;
mod update;
mod which;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use whence_brew::Brew;
use whence_config::Config;
use whence_fetch::{ClientOptions, HttpClient};

pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Command::Which(args) => which::run(&config, &args),
        Command::WhichUpdate(args) => update::run(&config, &args),
        Command::Init(args) => init::run(&args),
    }
}

fn http_client(config: &Config) -> Result<HttpClient> {
    let fetch = &config.fetch;
    let options = ClientOptions {
        timeout: fetch.timeout(),
        connect_timeout: fetch.connect_timeout(),
        retries: fetch.retries,
        low_speed_limit: fetch.low_speed_limit,
        low_speed_time: fetch.low_speed_time(),
        user_agent: fetch.user_agent.clone(),
        ..Default::default()
    };
    HttpClient::new(options).or_raise(|| ErrorKind::Fetch)
}

fn brew(config: &Config) -> Result<Brew> {
    Brew::locate(config.brew.executable.as_deref()).or_raise(|| ErrorKind::Brew)
}
