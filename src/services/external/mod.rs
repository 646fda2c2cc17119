pub mod burp;

pub use burp::{BurpClient, RemoteScanMetrics, ScanProgress};
