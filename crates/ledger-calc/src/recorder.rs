//! 異動記錄器
//!
//! 驗證單筆入庫/出庫並計算新的庫存。記錄器本身不碰儲存層，
//! 物料與異動必須由呼叫端在同一個交易內寫入。

use chrono::{DateTime, Duration, Utc};
use ledger_core::{
    Counterparty, InventoryItem, LedgerConfig, LedgerError, Money, MovementReason,
    MovementType, Quantity, Result, StockMovement,
};

/// 異動附帶資訊
#[derive(Debug, Clone)]
pub struct MovementMetadata {
    /// 交易對象
    pub counterparty: Counterparty,

    /// 異動原因（未指定時依方向推定）
    pub reason: Option<MovementReason>,

    /// 單價（未指定時使用物料目前單價）
    pub unit_cost: Option<Money>,

    /// 備註
    pub notes: Option<String>,

    /// 實際發生時間（未指定時等於記錄時間）
    pub occurred_at: Option<DateTime<Utc>>,
}

impl MovementMetadata {
    /// 創建新的附帶資訊
    pub fn new(counterparty: Counterparty) -> Self {
        Self {
            counterparty,
            reason: None,
            unit_cost: None,
            notes: None,
            occurred_at: None,
        }
    }

    /// 內部異動（期初、盤點）
    pub fn internal(reference: impl Into<String>) -> Self {
        Self::new(Counterparty::internal(reference))
    }

    /// 建構器模式：設置原因
    pub fn with_reason(mut self, reason: MovementReason) -> Self {
        self.reason = Some(reason);
        self
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

    /// 建構器模式：設置發生時間
    pub fn with_occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }
}

/// 異動記錄器
#[derive(Debug, Clone)]
pub struct MovementRecorder {
    max_clock_skew: Duration,
}

impl MovementRecorder {
    /// 創建新的記錄器
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            max_clock_skew: Duration::seconds(config.max_clock_skew_secs),
        }
    }

    /// 記錄一筆異動，回傳更新後的物料與新異動
    pub fn record(
        &self,
        item: &InventoryItem,
        movement_type: MovementType,
        quantity: Quantity,
        metadata: MovementMetadata,
        recorded_at: DateTime<Utc>,
    ) -> Result<(InventoryItem, StockMovement)> {
        if !item.active {
            return Err(LedgerError::ItemInactive(item.id));
        }
        if !quantity.is_positive() {
            return Err(LedgerError::Validation(format!(
                "異動數量必須大於 0，收到 {quantity}"
            )));
        }
        if !quantity.fits_unit(item.unit) {
            return Err(LedgerError::PrecisionOverflow(format!(
                "數量 {quantity} 不符合單位 {} 的精度",
                item.unit
            )));
        }

        let reason = metadata
            .reason
            .unwrap_or_else(|| Self::default_reason(movement_type));
        if !reason.allows(movement_type) {
            return Err(LedgerError::Validation(format!(
                "異動原因 {reason:?} 不適用於 {}",
                movement_type.as_str()
            )));
        }
        Self::check_counterparty(&metadata.counterparty, movement_type, reason)?;

        let occurred_at = metadata.occurred_at.unwrap_or(recorded_at);
        if occurred_at > recorded_at + self.max_clock_skew {
            return Err(LedgerError::Validation(format!(
                "發生時間 {occurred_at} 晚於記錄時間 {recorded_at}"
            )));
        }

        let unit_cost = metadata.unit_cost.or(item.unit_cost);
        if unit_cost.is_some_and(|cost| cost.is_negative()) {
            return Err(LedgerError::Validation("單價不可為負數".to_string()));
        }

        let mut movement = StockMovement::new(
            item.id,
            movement_type,
            reason,
            quantity,
            metadata.counterparty,
            occurred_at,
            recorded_at,
        );
        movement.unit_cost = unit_cost;
        movement.notes = metadata.notes;

        let updated = item.apply(&movement)?;

        tracing::debug!(
            "物料 {} {} {} {}：{} -> {}",
            item.name,
            movement_type.as_str(),
            quantity,
            item.unit,
            item.current_stock(),
            updated.current_stock()
        );

        Ok((updated, movement))
    }

    /// 盤點調整：把庫存校正到實際盤點數量
    pub fn adjust(
        &self,
        item: &InventoryItem,
        counted: Quantity,
        metadata: MovementMetadata,
        recorded_at: DateTime<Utc>,
    ) -> Result<(InventoryItem, StockMovement)> {
        if counted.is_negative() {
            return Err(LedgerError::Validation(format!(
                "盤點數量不可為負數，收到 {counted}"
            )));
        }

        let delta = counted.checked_sub(item.current_stock())?;
        if delta.is_zero() {
            return Err(LedgerError::Validation(format!(
                "{} 的盤點數量與現有庫存相同",
                item.name
            )));
        }

        let (movement_type, quantity) = if delta.is_positive() {
            (MovementType::In, delta)
        } else {
            (MovementType::Out, -delta)
        };

        tracing::info!(
            "盤點調整 {}：{} -> {}",
            item.name,
            item.current_stock(),
            counted
        );

        self.record(
            item,
            movement_type,
            quantity,
            metadata.with_reason(MovementReason::Adjustment),
            recorded_at,
        )
    }

    /// 設置期初庫存（只能在物料尚無異動時使用）
    pub fn open_balance(
        &self,
        item: &InventoryItem,
        quantity: Quantity,
        metadata: MovementMetadata,
        recorded_at: DateTime<Utc>,
    ) -> Result<(InventoryItem, StockMovement)> {
        if item.version() > 0 || !item.current_stock().is_zero() {
            return Err(LedgerError::Validation(format!(
                "{} 已有異動，不可再設置期初庫存",
                item.name
            )));
        }

        self.record(
            item,
            MovementType::In,
            quantity,
            metadata.with_reason(MovementReason::OpeningBalance),
            recorded_at,
        )
    }

    fn default_reason(movement_type: MovementType) -> MovementReason {
        match movement_type {
            MovementType::In => MovementReason::Receipt,
            MovementType::Out => MovementReason::Consumption,
        }
    }

    fn check_counterparty(
        counterparty: &Counterparty,
        movement_type: MovementType,
        reason: MovementReason,
    ) -> Result<()> {
        if counterparty.label().trim().is_empty() {
            return Err(LedgerError::Validation("交易對象不可為空".to_string()));
        }

        let allowed = match counterparty {
            Counterparty::Supplier { .. } => movement_type == MovementType::In,
            Counterparty::Kitchen { .. } => movement_type == MovementType::Out,
            Counterparty::Internal { .. } => matches!(
                reason,
                MovementReason::OpeningBalance | MovementReason::Adjustment
            ),
        };
        if !allowed {
            return Err(LedgerError::Validation(format!(
                "交易對象 {} 不適用於 {} ({reason:?})",
                counterparty.label(),
                movement_type.as_str()
            )));
        }
        Ok(())
    }
}

impl Default for MovementRecorder {
    fn default() -> Self {
        Self::new(&LedgerConfig::default())
    }
}
