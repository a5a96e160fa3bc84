use std::collections::HashMap;
use std::fmt;

/// A section of the `INFO` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Section {
    /// The default set of sections.
    #[default]
    Default,
    /// Every section.
    All,
    /// General information about the server.
    Server,
    /// Client connections.
    Clients,
    /// Memory consumption.
    Memory,
    /// RDB and AOF state.
    Persistence,
    /// General statistics.
    Stats,
    /// Master/replica replication.
    Replication,
    /// CPU consumption.
    Cpu,
    /// Per-command statistics.
    Commandstats,
    /// Cluster state.
    Cluster,
    /// Per-database key counts.
    Keyspace,
}

impl Section {
    /// The argument sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Default => "default",
            Section::All => "all",
            Section::Server => "server",
            Section::Clients => "clients",
            Section::Memory => "memory",
            Section::Persistence => "persistence",
            Section::Stats => "stats",
            Section::Replication => "replication",
            Section::Cpu => "cpu",
            Section::Commandstats => "commandstats",
            Section::Cluster => "cluster",
            Section::Keyspace => "keyspace",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the text of an `INFO` reply into a field map.
///
/// Blank lines and `# Section` headers are skipped, as is any line that does
/// not split into exactly two parts on `:`.
pub fn parse_info(text: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut kv = line.split(':');
        if let (Some(k), Some(v), None) = (kv.next(), kv.next(), kv.next()) {
            fields.insert(k.to_string(), v.to_string());
        }
    }
    fields
}
