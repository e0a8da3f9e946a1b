//! 庫存異動模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ItemId, Money, MovementId, Quantity, Result, SupplierId};

/// 異動方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// 入庫
    In,
    /// 出庫
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
        }
    }
}

/// 異動原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    /// 供應商到貨
    Receipt,
    /// 廚房領用
    Consumption,
    /// 期初庫存
    OpeningBalance,
    /// 盤點調整
    Adjustment,
}

impl MovementReason {
    /// 檢查原因是否與異動方向一致
    pub fn allows(&self, movement_type: MovementType) -> bool {
        match self {
            MovementReason::Receipt | MovementReason::OpeningBalance => {
                movement_type == MovementType::In
            }
            MovementReason::Consumption => movement_type == MovementType::Out,
            MovementReason::Adjustment => true,
        }
    }
}

/// 交易對象
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Counterparty {
    /// 供應商（入庫）
    Supplier {
        supplier_id: SupplierId,
        name: String,
    },
    /// 廚房領用人與用途（出庫）
    Kitchen {
        used_by: String,
        purpose: Option<String>,
    },
    /// 內部（期初、盤點調整）
    Internal { reference: String },
}

impl Counterparty {
    pub fn supplier(supplier_id: SupplierId, name: impl Into<String>) -> Self {
        Counterparty::Supplier {
            supplier_id,
            name: name.into(),
        }
    }

    pub fn kitchen(used_by: impl Into<String>, purpose: Option<String>) -> Self {
        Counterparty::Kitchen {
            used_by: used_by.into(),
            purpose,
        }
    }

    pub fn internal(reference: impl Into<String>) -> Self {
        Counterparty::Internal {
            reference: reference.into(),
        }
    }

    /// 顯示名稱
    pub fn label(&self) -> &str {
        match self {
            Counterparty::Supplier { name, .. } => name,
            Counterparty::Kitchen { used_by, .. } => used_by,
            Counterparty::Internal { reference } => reference,
        }
    }

    pub fn supplier_id(&self) -> Option<SupplierId> {
        match self {
            Counterparty::Supplier { supplier_id, .. } => Some(*supplier_id),
            _ => None,
        }
    }
}

/// 庫存異動（寫入後不可修改）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    /// 異動ID
    pub id: MovementId,

    /// 物料ID
    pub item_id: ItemId,

    /// 異動方向
    pub movement_type: MovementType,

    /// 異動原因
    pub reason: MovementReason,

    /// 數量（必須大於 0）
    pub quantity: Quantity,

    /// 交易對象
    pub counterparty: Counterparty,

    /// 記錄當下的單價
    pub unit_cost: Option<Money>,

    /// 備註
    pub notes: Option<String>,

    /// 實際發生時間
    pub occurred_at: DateTime<Utc>,

    /// 記錄時間
    pub recorded_at: DateTime<Utc>,
}

impl StockMovement {
    /// 創建新的異動
    pub fn new(
        item_id: ItemId,
        movement_type: MovementType,
        reason: MovementReason,
        quantity: Quantity,
        counterparty: Counterparty,
        occurred_at: DateTime<Utc>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MovementId::new(),
            item_id,
            movement_type,
            reason,
            quantity,
            counterparty,
            unit_cost: None,
            notes: None,
            occurred_at,
            recorded_at,
        }
    }

    /// 建構器模式：設置單價
    pub fn with_unit_cost(mut self, unit_cost: Money) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    /// 建構器模式：設置備註
    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }

    /// 對庫存的帶號影響
    pub fn signed_quantity(&self) -> Quantity {
        match self.movement_type {
            MovementType::In => self.quantity,
            MovementType::Out => -self.quantity,
        }
    }

    /// 異動金額（數量 * 記錄當下單價）
    pub fn value(&self) -> Result<Option<Money>> {
        self.unit_cost
            .map(|cost| self.quantity.checked_mul_money(cost))
            .transpose()
    }

    pub fn is_inbound(&self) -> bool {
        self.movement_type == MovementType::In
    }

    pub fn is_outbound(&self) -> bool {
        self.movement_type == MovementType::Out
    }

    pub fn is_adjustment(&self) -> bool {
        self.reason == MovementReason::Adjustment
    }
}
