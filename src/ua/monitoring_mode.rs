/// Mirrors `UA_MonitoringMode`. Only `Reporting` is produced by this core's
/// monitored-item builders (spec §4.6); the others exist for completeness
/// when decoding a server's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MonitoringMode {
    Disabled,
    Sampling,
    Reporting,
}
