use crate::subnets::Subnets;
use discv5::enr::{CombinedKey, Enr};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// The discovery-relevant slice of the core's structured configuration
/// value; `operator_id`/`batch_size` are shared with the registration
/// scheduler and live on the top-level runtime config that builds this one.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_ip: IpAddr,
    pub udp_port: u16,
    pub tcp_port: u16,
    pub bootnodes: Vec<Enr>,
    pub host_address: Option<IpAddr>,
    pub host_dns: Option<String>,
    pub operator_id: u64,
    pub subnets: Subnets,
    pub fork_version: String,
    pub storage_path: PathBuf,
    pub network_key: Option<CombinedKey>,
    pub k_min_shared_subnets: u32,
    pub publish_enr_timeout: Duration,
    pub discovery_interval: Duration,
}

impl Config {
    pub fn new(storage_path: PathBuf, bind_ip: IpAddr, udp_port: u16, tcp_port: u16) -> Self {
        Self {
            bind_ip,
            udp_port,
            tcp_port,
            bootnodes: Vec::new(),
            host_address: None,
            host_dns: None,
            operator_id: 0,
            subnets: Subnets::default(),
            fork_version: String::new(),
            storage_path,
            network_key: None,
            k_min_shared_subnets: 1,
            publish_enr_timeout: Duration::from_secs(60),
            discovery_interval: Duration::from_secs(1),
        }
    }
}
