//! # Ledger Core
//!
//! 庫存帳本核心資料模型與類型定義

pub mod category;
pub mod config;
pub mod ids;
pub mod inventory;
pub mod movement;
pub mod quantity;
pub mod supplier;
pub mod unit;

// Re-export 主要類型
pub use category::Category;
pub use config::{AlertPolicy, LedgerConfig};
pub use ids::{CategoryId, ItemId, MovementId, SupplierId};
pub use inventory::InventoryItem;
pub use movement::{Counterparty, MovementReason, MovementType, StockMovement};
pub use quantity::{Money, Quantity};
pub use supplier::Supplier;
pub use unit::Unit;

/// 帳本錯誤類型
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("輸入驗證失敗: {0}")]
    Validation(String),

    #[error("庫存不足：{name} 現有 {current}，需要 {requested}")]
    InsufficientStock {
        item_id: ItemId,
        name: String,
        current: Quantity,
        requested: Quantity,
    },

    #[error("精度溢出: {0}")]
    PrecisionOverflow(String),

    #[error("並發衝突：物料 {item_id} 預期版本 {expected}，實際版本 {found}")]
    ConcurrencyConflict {
        item_id: ItemId,
        expected: u64,
        found: u64,
    },

    #[error("找不到物料: {0}")]
    ItemNotFound(ItemId),

    #[error("物料已停用: {0}")]
    ItemInactive(ItemId),

    #[error("找不到供應商: {0}")]
    SupplierNotFound(SupplierId),

    #[error("供應商已停用: {0}")]
    SupplierInactive(SupplierId),

    #[error("找不到分類: {0}")]
    CategoryNotFound(CategoryId),

    #[error("名稱重複: {0}")]
    DuplicateName(String),

    #[error("無效的配置: {0}")]
    InvalidConfig(String),

    #[error("儲存層錯誤: {0}")]
    Storage(String),
}

/// 錯誤分類（供呼叫端決定重試或提示使用者）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InsufficientStock,
    PrecisionOverflow,
    ConcurrencyConflict,
    NotFound,
    Inactive,
    Duplicate,
    Config,
    Storage,
}

impl LedgerError {
    /// 獲取錯誤分類
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            LedgerError::PrecisionOverflow(_) => ErrorKind::PrecisionOverflow,
            LedgerError::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
            LedgerError::ItemNotFound(_)
            | LedgerError::SupplierNotFound(_)
            | LedgerError::CategoryNotFound(_) => ErrorKind::NotFound,
            LedgerError::ItemInactive(_) | LedgerError::SupplierInactive(_) => {
                ErrorKind::Inactive
            }
            LedgerError::DuplicateName(_) => ErrorKind::Duplicate,
            LedgerError::InvalidConfig(_) => ErrorKind::Config,
            LedgerError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// 只有並發衝突可以重新讀取後重試
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ConcurrencyConflict
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
