//! # Ledger Calc
//!
//! 庫存帳本運算：異動記錄、狀態分級、彙總、重播與報表

pub mod aggregator;
pub mod catalog;
pub mod classifier;
pub mod dashboard;
pub mod recorder;
pub mod replay;
pub mod report;

// Re-export 主要類型
pub use aggregator::{
    DailyUsage, FlowTotals, LedgerAggregator, LedgerSummary, RunningBalance, TimeWindow,
};
pub use catalog::{
    ensure_unique_category_name, ensure_unique_item_name, ensure_unique_supplier_name,
    CatalogFilter,
};
pub use classifier::{classify, StatusBreakdown, StockAlert, StockStatus, ThresholdClassifier};
pub use dashboard::{CategoryShare, Dashboard, DashboardBuilder, DashboardStats, RecentActivity};
pub use recorder::{MovementMetadata, MovementRecorder};
pub use replay::{LedgerReplay, ReplayCheck};
pub use report::{
    InventoryReportRow, PurchaseReportRow, ReportBuilder, ReportTable, UsageReportRow,
    UNCATEGORIZED,
};
