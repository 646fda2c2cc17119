pub mod asset_service;
pub mod auth_service;
pub mod external;
pub mod node_service;
pub mod scan_builder;
pub mod scan_service;

// Re-export commonly used types
pub use asset_service::AssetService;
pub use auth_service::AuthService;
pub use node_service::NodeService;
pub use scan_builder::{build_scan_configuration, ScanConfiguration};
pub use scan_service::{DashboardSummary, ScanService};
