//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub resources_path: String,
    pub logging: Logging,
    pub sim: Sim,
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub routers: Vec<RouterConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub stdout: LoggingStdout,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingStdout {
    pub enabled: bool,
    pub style: LoggingFmtStyle,
    pub colors: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFmtStyle {
    Compact,
    Full,
    Json,
    Pretty,
}

// Simulation-wide timing and transfer parameters. All durations are in
// seconds.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Sim {
    // Delay before a router floods an accepted LSA onward.
    pub flood_delay: u64,
    // LSA silence interval ending the flooding phase.
    pub quiesce_interval: u64,
    // Wall-clock budget of the forwarding phase.
    pub forward_timeout: u64,
    // How long the orchestrator waits for the mesh to converge before
    // starting the client.
    pub convergence_wait: u64,
    // Endpoint per-receive timeout (handshake liveness and Go-Back-N
    // retransmit trigger).
    pub endpoint_timeout: u64,
    // Client budget for receiving the whole response.
    pub response_budget: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub address: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub port: u16,
    pub frame_size: usize,
    pub window: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub address: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub frame_size: usize,
    pub window: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    pub router_id: Ipv4Addr,
    // Interface name -> addresses of the two ends of the link.
    pub interfaces: BTreeMap<String, InterfaceConfig>,
    // Destination (CIDR prefix or bare host) -> link cost and interface.
    pub connections: BTreeMap<String, ConnectionConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterfaceConfig {
    pub local: Ipv4Addr,
    pub peer: Ipv4Addr,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    pub cost: u32,
    pub interface: String,
}

// ===== impl Config =====

impl Config {
    const DFLT_FILEPATH: &'static str = "/etc/meshsim.toml";

    pub(crate) fn load(config_file: Option<&str>) -> Config {
        let config_file = config_file.unwrap_or(Config::DFLT_FILEPATH);

        match std::fs::read_to_string(config_file) {
            Ok(config_str) => toml::from_str(&config_str)
                .expect("Failed to parse configuration file"),
            Err(err) => {
                eprintln!("Failed to load configuration file: {err}");
                eprintln!("Falling back to default configuration...");
                Config::default()
            }
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            resources_path: "resources.json".to_owned(),
            logging: Default::default(),
            sim: Default::default(),
            server: Default::default(),
            client: Default::default(),
            routers: default_topology(),
        }
    }
}

// ===== impl LoggingStdout =====

impl Default for LoggingStdout {
    fn default() -> LoggingStdout {
        LoggingStdout {
            enabled: true,
            style: LoggingFmtStyle::Full,
            colors: false,
        }
    }
}

// ===== impl Sim =====

impl Default for Sim {
    fn default() -> Sim {
        Sim {
            flood_delay: 1,
            quiesce_interval: 5,
            forward_timeout: 10,
            convergence_wait: 15,
            endpoint_timeout: 5,
            response_budget: 15,
        }
    }
}

// ===== impl ServerConfig =====

impl Default for ServerConfig {
    fn default() -> ServerConfig {
        ServerConfig {
            address: Ipv4Addr::new(127, 128, 0, 1),
            gateway: Ipv4Addr::new(127, 128, 0, 254),
            port: 8080,
            frame_size: 1024,
            window: 4,
        }
    }
}

// ===== impl ClientConfig =====

impl Default for ClientConfig {
    fn default() -> ClientConfig {
        ClientConfig {
            address: Ipv4Addr::new(127, 0, 0, 1),
            gateway: Ipv4Addr::new(127, 0, 0, 254),
            frame_size: 2048,
            window: 5,
        }
    }
}

// ===== helper functions =====

// The built-in six-router topology: two stub subnets hosting the client
// and the server, four transit routers in between.
fn default_topology() -> Vec<RouterConfig> {
    let routers = [
        (
            "1.1.1.1",
            vec![
                ("Gi0/1", "127.0.0.254", "127.0.0.1"),
                ("Gi0/2", "127.248.0.1", "127.248.0.2"),
                ("Gi0/3", "127.248.4.1", "127.248.4.2"),
            ],
            vec![
                ("127.0.0.0/24", 0, "Gi0/1"),
                ("2.2.2.2", 3, "Gi0/2"),
                ("3.3.3.3", 9, "Gi0/3"),
            ],
        ),
        (
            "2.2.2.2",
            vec![
                ("Gi0/1", "127.248.0.2", "127.248.0.1"),
                ("Gi0/2", "127.30.0.254", "127.30.0.1"),
                ("Gi0/3", "127.248.12.1", "127.248.12.2"),
                ("Gi0/4", "127.248.8.1", "127.248.8.2"),
            ],
            vec![
                ("127.30.0.0/24", 0, "Gi0/2"),
                ("1.1.1.1", 3, "Gi0/1"),
                ("3.3.3.3", 5, "Gi0/4"),
                ("4.4.4.4", 12, "Gi0/3"),
            ],
        ),
        (
            "3.3.3.3",
            vec![
                ("Gi0/1", "127.248.4.2", "127.248.4.1"),
                ("Gi0/2", "127.248.8.2", "127.248.8.1"),
                ("Gi0/3", "127.248.16.1", "127.248.16.2"),
                ("Gi0/4", "127.10.0.254", "127.10.0.1"),
            ],
            vec![
                ("127.10.0.0/24", 0, "Gi0/4"),
                ("1.1.1.1", 9, "Gi0/1"),
                ("2.2.2.2", 5, "Gi0/2"),
                ("5.5.5.5", 10, "Gi0/3"),
            ],
        ),
        (
            "4.4.4.4",
            vec![
                ("Gi0/1", "127.248.12.2", "127.248.12.1"),
                ("Gi0/2", "127.40.0.254", "127.40.0.1"),
                ("Gi0/3", "127.248.24.1", "127.248.24.2"),
                ("Gi0/4", "127.248.20.1", "127.248.20.2"),
            ],
            vec![
                ("127.40.0.0/24", 0, "Gi0/2"),
                ("2.2.2.2", 12, "Gi0/1"),
                ("5.5.5.5", 4, "Gi0/4"),
                ("6.6.6.6", 10, "Gi0/3"),
            ],
        ),
        (
            "5.5.5.5",
            vec![
                ("Gi0/1", "127.248.16.2", "127.248.16.1"),
                ("Gi0/2", "127.248.20.2", "127.248.20.1"),
                ("Gi0/3", "127.248.28.1", "127.248.28.2"),
            ],
            vec![
                ("127.20.0.0/24", 0, "Gi0/4"),
                ("3.3.3.3", 10, "Gi0/1"),
                ("4.4.4.4", 4, "Gi0/2"),
                ("6.6.6.6", 5, "Gi0/3"),
            ],
        ),
        (
            "6.6.6.6",
            vec![
                ("Gi0/1", "127.248.24.2", "127.248.24.1"),
                ("Gi0/2", "127.248.28.2", "127.248.28.1"),
                ("Gi0/3", "127.128.0.254", "127.128.0.1"),
            ],
            vec![
                ("127.128.0.0/24", 0, "Gi0/3"),
                ("4.4.4.4", 10, "Gi0/1"),
                ("5.5.5.5", 5, "Gi0/2"),
            ],
        ),
    ];

    routers
        .into_iter()
        .map(|(router_id, interfaces, connections)| RouterConfig {
            router_id: router_id.parse().unwrap(),
            interfaces: interfaces
                .into_iter()
                .map(|(name, local, peer)| {
                    (
                        name.to_owned(),
                        InterfaceConfig {
                            local: local.parse().unwrap(),
                            peer: peer.parse().unwrap(),
                        },
                    )
                })
                .collect(),
            connections: connections
                .into_iter()
                .map(|(dest, cost, interface)| {
                    (
                        dest.to_owned(),
                        ConnectionConfig {
                            cost,
                            interface: interface.to_owned(),
                        },
                    )
                })
                .collect(),
        })
        .collect()
}
