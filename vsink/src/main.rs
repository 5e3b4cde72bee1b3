/*
 * vSink mail capture server
 * Copyright (C) 2022 the vSink authors
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/
use vsink_config::{get_log4rs_config, Config};
use vsink_server::{Server, SimulationPolicy};
use vsink_store::MemoryStore;

#[derive(Debug, clap::Parser, PartialEq, Eq)]
#[clap(about, version, author)]
struct Args {
    /// Path of the TOML configuration, built-in defaults when omitted
    #[clap(short, long)]
    config: Option<String>,

    /// Also log to stdout
    #[clap(short, long)]
    no_daemon: bool,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, clap::Subcommand, PartialEq, Eq)]
enum Commands {
    /// Show the loaded config (as json)
    ConfigShow,
}

fn main() -> anyhow::Result<()> {
    let args = <Args as clap::Parser>::parse();

    let config = match &args.config {
        Some(path) => {
            println!("Loading configuration at path='{}'", path);
            Config::from_toml(&std::fs::read_to_string(path)?)?
        }
        None => Config::default(),
    };

    if let Some(Commands::ConfigShow) = args.command {
        let stringified = serde_json::to_string_pretty(&config)?;
        println!("Loaded configuration: {}", stringified);
        return Ok(());
    }

    log4rs::init_config(get_log4rs_config(&config, args.no_daemon)?)?;

    let socket = std::net::TcpListener::bind(config.server.addr)
        .map_err(|e| anyhow::anyhow!("{e}: '{}'", config.server.addr))?;

    let store = std::sync::Arc::new(MemoryStore::with_root(
        &config.app.root_username,
        &config.app.root_password,
        &config.app.root_email,
    ));
    let policy = std::sync::Arc::new(SimulationPolicy::new(config.app.simulation_mode));
    let thread_count = config.server.thread_count;

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(thread_count)
        .enable_all()
        .build()?
        .block_on(async move {
            let server = Server::new(
                std::sync::Arc::new(config),
                socket,
                store.clone(),
                store,
                policy,
            )?;
            log::warn!("Listening on: {}", server.addr());

            server.listen_and_serve().await
        })
}
