//! # Ledger Store
//!
//! 帳本儲存與服務層：版本檢查、物料鎖與狀態快取

pub mod dirty_tracking;
pub mod memory;
pub mod repository;
pub mod service;

// Re-export 主要類型
pub use dirty_tracking::DirtyTracker;
pub use memory::InMemoryRepository;
pub use repository::StockRepository;
pub use service::StockLedger;
