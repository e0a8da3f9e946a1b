//! # Stock Ledger
//!
//! 餐廳庫存帳本：入出庫異動、低庫存警示、彙總與報表
//!
//! - [`model`]：資料模型、數量運算與錯誤類型
//! - [`calc`]：異動記錄、狀態分級、彙總、重播與報表
//! - [`store`]：儲存介面與帳本服務

pub use ledger_calc as calc;
pub use ledger_core as model;
pub use ledger_store as store;

pub use ledger_calc::{MovementMetadata, StockStatus, TimeWindow};
pub use ledger_core::{
    Category, Counterparty, InventoryItem, LedgerConfig, LedgerError, Money, MovementType,
    Quantity, StockMovement, Supplier, Unit,
};
pub use ledger_store::{InMemoryRepository, StockLedger, StockRepository};
