//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

mod config;

use std::path::Path;
use std::time::Duration;

use clap::{App, Arg};
use config::{Config, LoggingFmtStyle};
use maplit::btreemap;
use meshsim_endpoint::client::{Client, ClientCfg};
use meshsim_endpoint::server::{Server, ServerCfg};
use meshsim_endpoint::store::{Resource, ResourceStore};
use meshsim_packet::lsa::ReachabilityEntry;
use meshsim_router::instance::{Router, RouterCfg, RouterTimers};
use meshsim_utils::task::Task;
use tracing::level_filters::LevelFilter;
use tracing::{Instrument, debug_span, error, info};
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;

fn init_tracing(config: &config::Logging) {
    // Enable logging to stdout.
    let stdout = config.stdout.enabled.then(|| {
        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(config.stdout.colors);
        let layer = match config.stdout.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("meshsim=debug".parse().unwrap())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout)
        .init();
}

// Load the resource store, seeding a fresh one when the file doesn't
// exist yet.
fn init_store(path: &Path) -> Result<ResourceStore, meshsim_endpoint::error::Error> {
    match path.exists() {
        true => ResourceStore::load(path),
        false => {
            let data = "<html><body>Welcome to the simulated \
                        internetwork!</body></html>"
                .to_owned();
            ResourceStore::create(
                path,
                btreemap! {
                    "/index.html".to_owned() => Resource {
                        last_modified: "Wed, 21 Oct 2020 07:28:00 GMT"
                            .to_owned(),
                        file_size: data.len(),
                        etag: "abc123".to_owned(),
                        data,
                    },
                },
            )
        }
    }
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = App::new("Meshsim internetwork simulator")
        .version(clap::crate_version!())
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .arg(
            Arg::with_name("resource")
                .short("r")
                .long("resource")
                .value_name("path")
                .help("Resource the client requests."),
        )
        .arg(
            Arg::with_name("if-modified-since")
                .short("m")
                .long("if-modified-since")
                .value_name("timestamp")
                .help("Conditional request timestamp (RFC-1123)."),
        )
        .get_matches();

    // Read configuration file.
    let config_file = matches.value_of("config");
    let config = Config::load(config_file);
    let resource = matches.value_of("resource").unwrap_or("/index.html");
    let if_modified_since = matches.value_of("if-modified-since");

    // Initialize tracing.
    init_tracing(&config.logging);

    // We're ready to go!
    info!("starting up");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create async runtime")
        .block_on(run(config, resource, if_modified_since));
}

async fn run(config: Config, resource: &str, if_modified_since: Option<&str>) {
    let sim = &config.sim;
    let timers = RouterTimers {
        flood_delay: Duration::from_secs(sim.flood_delay),
        quiesce_interval: Duration::from_secs(sim.quiesce_interval),
        forward_timeout: Duration::from_secs(sim.forward_timeout),
    };

    // Create the routers, binding all of their sockets before any LSA is
    // sent.
    let mut routers = Vec::new();
    for router_config in &config.routers {
        let router_cfg = RouterCfg {
            router_id: router_config.router_id,
            interfaces: router_config
                .interfaces
                .iter()
                .map(|(name, iface)| {
                    (name.clone(), (iface.local, iface.peer))
                })
                .collect(),
            connections: router_config
                .connections
                .iter()
                .map(|(dest, connection)| {
                    ReachabilityEntry::new(
                        dest.parse().expect("invalid destination in config"),
                        connection.cost,
                        connection.interface.clone(),
                    )
                })
                .collect(),
            timers,
        };

        match Router::new(router_cfg) {
            Ok(router) => routers.push(router),
            Err(error) => {
                error!(router_id = %router_config.router_id, %error,
                    "failed to create router");
                return;
            }
        }
    }
    info!(count = routers.len(), "routers created");

    // Start the web server.
    let store = match init_store(Path::new(&config.resources_path)) {
        Ok(store) => store,
        Err(error) => {
            error!(%error, "failed to initialize the resource store");
            return;
        }
    };
    let server_cfg = ServerCfg {
        local_addr: config.server.address,
        gateway: config.server.gateway,
        port: config.server.port,
        frame_size: config.server.frame_size,
        window: config.server.window,
        timeout: Duration::from_secs(sim.endpoint_timeout),
        retransmit_budget: None,
    };
    let mut server = match Server::new(server_cfg, store) {
        Ok(server) => server,
        Err(error) => {
            error!(%error, "failed to create server");
            return;
        }
    };
    let server_task = Task::spawn(
        async move {
            if let Err(error) = server.run().await {
                error.log();
            }
        }
        .instrument(debug_span!("server")),
    );
    info!("web server running");

    // Start the routers; each one advertises its reachability list on
    // startup.
    let mut router_tasks = Vec::new();
    for router in routers {
        let span = debug_span!("router", id = %router.config.router_id);
        router_tasks.push(Task::spawn(router.run().instrument(span)));
    }

    // Give the mesh time to flood, quiesce and compute forwarding tables.
    tokio::time::sleep(Duration::from_secs(sim.convergence_wait)).await;
    info!("routers are ready");

    // Run the client request across the mesh.
    let client_cfg = ClientCfg {
        local_addr: config.client.address,
        server_addr: config.server.address,
        gateway: config.client.gateway,
        server_port: config.server.port,
        frame_size: config.client.frame_size,
        window: config.client.window,
        timeout: Duration::from_secs(sim.endpoint_timeout),
        response_budget: Duration::from_secs(sim.response_budget),
        retransmit_budget: None,
    };
    match Client::new(client_cfg) {
        Ok(mut client) => {
            let span = debug_span!("client");
            let result = client
                .request_resource(resource, if_modified_since)
                .instrument(span)
                .await;
            match result {
                Ok(response) => {
                    info!("client transfer complete");
                    println!("{}", response);
                }
                Err(error) => error.log(),
            }
        }
        Err(error) => {
            error!(%error, "failed to create client");
        }
    }

    // Wait for the routers to exhaust their forwarding budgets, then give
    // the server a moment to finish. If the client never reached it, the
    // server is still parked in its accept loop; dropping the task handle
    // cancels it.
    for task in router_tasks {
        let _ = task.await;
    }
    let _ =
        tokio::time::timeout(Duration::from_secs(1), server_task).await;

    info!("shutting down");
}
