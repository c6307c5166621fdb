// src/monitor/metrics.rs

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct Metrics {
    pub connected_clients: AtomicU64,
    pub total_connections: AtomicU64,
    pub command_count: AtomicU64,
    pub command_stats: DashMap<String, u64>,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics::default()
    }

    pub fn record_command(&self, command: &str) {
        self.command_count.fetch_add(1, Ordering::Relaxed);
        self.command_stats
            .entry(command.to_string())
            .and_modify(|c| *c += 1)
            .or_insert(1);
    }

    pub fn client_connected(&self) {
        self.connected_clients.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn client_disconnected(&self) {
        self.connected_clients.fetch_sub(1, Ordering::Relaxed);
    }

    /// Prometheus text exposition format.
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP crab_set_connected_clients Current number of client connections\n");
        output.push_str("# TYPE crab_set_connected_clients gauge\n");
        output.push_str(&format!(
            "crab_set_connected_clients {}\n",
            self.connected_clients.load(Ordering::Relaxed)
        ));

        output.push_str("# HELP crab_set_total_connections Total connections since startup\n");
        output.push_str("# TYPE crab_set_total_connections counter\n");
        output.push_str(&format!(
            "crab_set_total_connections {}\n",
            self.total_connections.load(Ordering::Relaxed)
        ));

        output.push_str("# HELP crab_set_command_count Total commands processed\n");
        output.push_str("# TYPE crab_set_command_count counter\n");
        output.push_str(&format!(
            "crab_set_command_count {}\n",
            self.command_count.load(Ordering::Relaxed)
        ));

        output.push_str("# HELP crab_set_command_stats Commands processed per command name\n");
        output.push_str("# TYPE crab_set_command_stats counter\n");
        let mut stats: Vec<(String, u64)> = self
            .command_stats
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        stats.sort();
        for (cmd, count) in stats {
            output.push_str(&format!(
                "crab_set_command_stats{{command=\"{}\"}} {}\n",
                cmd, count
            ));
        }

        output
    }
}
