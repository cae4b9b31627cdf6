//! Defensive system probes feeding the heartbeat document's `user`/
//! `system`/`network` fields. Grounded on
//! `original_source/modules/heartbeat/utils.py`'s `_safe_get_user_info`/
//! `_safe_get_system_info`/`_safe_get_network_info`: each probe is
//! independent and its own failure never takes down the other two, which
//! is why each returns a `Result` folded into [`fleet_wire::Probe`]
//! separately rather than one probe that can fail partway through.

use fleet_wire::{Loadavg, NetworkInterfaceInfo, SystemInfo, UserInfo};
use std::collections::BTreeMap;
use sysinfo::System;

pub fn probe_user() -> Result<UserInfo, String> {
    let user = std::env::var("USER").or_else(|_| std::env::var("USERNAME")).map_err(|_| "USER/USERNAME not set".to_string())?;
    let working_dir = std::env::current_dir().map_err(|e| e.to_string())?.display().to_string();
    let home_dir = std::env::var("HOME").unwrap_or_default();
    let shell = std::env::var("SHELL").unwrap_or_default();
    let uid = nix::unistd::Uid::current().as_raw();
    let gid = nix::unistd::Gid::current().as_raw();
    let groups = nix::unistd::getgroups().map(|gids| gids.iter().map(|g| g.as_raw().to_string()).collect()).unwrap_or_default();

    let loadavg = std::fs::read_to_string("/proc/loadavg").ok().and_then(|raw| parse_loadavg(&raw));

    Ok(UserInfo { user, working_dir, home_dir, shell, uid, gid, groups, loadavg })
}

fn parse_loadavg(raw: &str) -> Option<Loadavg> {
    let mut fields = raw.split_whitespace();
    let one_min = fields.next()?.parse().ok()?;
    let five_min = fields.next()?.parse().ok()?;
    let fifteen_min = fields.next()?.parse().ok()?;
    Some(Loadavg { one_min, five_min, fifteen_min })
}

pub fn probe_system() -> Result<SystemInfo, String> {
    Ok(SystemInfo {
        system: System::name().unwrap_or_default(),
        node_name: System::host_name().unwrap_or_default(),
        release: System::kernel_version().unwrap_or_default(),
        version: System::os_version().unwrap_or_default(),
        machine: std::env::consts::ARCH.to_string(),
        processor: std::env::consts::ARCH.to_string(),
        platform: System::long_os_version().unwrap_or_default(),
    })
}

pub fn probe_network() -> Result<BTreeMap<String, NetworkInterfaceInfo>, String> {
    let interfaces = if_addrs::get_if_addrs().map_err(|e| e.to_string())?;
    let mut by_name: BTreeMap<String, NetworkInterfaceInfo> = BTreeMap::new();
    for iface in interfaces {
        let entry = by_name.entry(iface.name.clone()).or_default();
        let ip = iface.ip();
        if ip.is_ipv4() {
            entry.ipv4.push(ip.to_string());
        } else {
            entry.ipv6.push(ip.to_string());
        }
    }
    Ok(by_name)
}

#[cfg(test)]
#[path = "probes_tests.rs"]
mod tests;
