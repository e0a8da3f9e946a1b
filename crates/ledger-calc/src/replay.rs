//! 帳本重播：從 0 依序套用異動並與物料現有庫存比對

use ledger_core::{InventoryItem, ItemId, Quantity, Result, StockMovement};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 重播比對結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCheck {
    pub item_id: ItemId,
    pub name: String,
    /// 物料記錄的庫存
    pub stored: Quantity,
    /// 重播得到的庫存
    pub replayed: Quantity,
    /// 重播過程中是否出現負庫存
    pub went_negative: bool,
}

impl ReplayCheck {
    pub fn is_consistent(&self) -> bool {
        self.stored == self.replayed && !self.went_negative
    }
}

/// 帳本重播
pub struct LedgerReplay;

impl LedgerReplay {
    /// 重播單一物料的異動，回傳最終庫存
    pub fn replay(item_id: ItemId, movements: &[StockMovement]) -> Result<Quantity> {
        Quantity::checked_sum(
            movements
                .iter()
                .filter(|m| m.item_id == item_id)
                .map(StockMovement::signed_quantity),
        )
    }

    /// 比對單一物料
    ///
    /// `movements` 依儲存層的寫入順序套用，不重新排序。
    /// 補登的異動可能帶有較早的記錄時間。
    pub fn verify(item: &InventoryItem, movements: &[StockMovement]) -> Result<ReplayCheck> {
        let mut balance = Quantity::ZERO;
        let mut went_negative = false;
        for movement in movements.iter().filter(|m| m.item_id == item.id) {
            balance = balance.checked_add(movement.signed_quantity())?;
            went_negative |= balance.is_negative();
        }

        Ok(ReplayCheck {
            item_id: item.id,
            name: item.name.clone(),
            stored: item.current_stock(),
            replayed: balance,
            went_negative,
        })
    }

    /// 比對所有物料，只回傳不一致者
    pub fn verify_all(
        items: &[InventoryItem],
        movements: &[StockMovement],
    ) -> Result<Vec<ReplayCheck>> {
        let mut by_item: HashMap<ItemId, Vec<StockMovement>> = HashMap::new();
        for movement in movements {
            by_item
                .entry(movement.item_id)
                .or_default()
                .push(movement.clone());
        }

        let mut mismatches = Vec::new();
        for item in items {
            let own = by_item.get(&item.id).map(Vec::as_slice).unwrap_or(&[]);
            let check = Self::verify(item, own)?;
            if !check.is_consistent() {
                tracing::warn!(
                    "物料 {} 帳本不一致：記錄 {}，重播 {}",
                    check.name,
                    check.stored,
                    check.replayed
                );
                mismatches.push(check);
            }
        }
        Ok(mismatches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{MovementMetadata, MovementRecorder};
    use chrono::{Duration, Utc};
    use ledger_core::{
        CategoryId, Counterparty, MovementReason, MovementType, SupplierId, Unit,
    };

    fn kg(value: i64) -> Quantity {
        Quantity::from_int(value)
    }

    fn history() -> (InventoryItem, Vec<StockMovement>) {
        let recorder = MovementRecorder::default();
        let start = Utc::now() - Duration::hours(1);
        let mut item = InventoryItem::new("Rice", CategoryId::new(), Unit::Kilogram, start);
        let mut movements = Vec::new();

        let (updated, m) = recorder
            .open_balance(&item, kg(30), MovementMetadata::internal("期初"), start)
            .unwrap();
        item = updated;
        movements.push(m);

        let supplier =
            MovementMetadata::new(Counterparty::supplier(SupplierId::new(), "City Market"));
        let (updated, m) = recorder
            .record(&item, MovementType::In, kg(10), supplier, start + Duration::minutes(5))
            .unwrap();
        item = updated;
        movements.push(m);

        let kitchen = MovementMetadata::new(Counterparty::kitchen("Chef Lisa", None));
        let (updated, m) = recorder
            .record(&item, MovementType::Out, kg(15), kitchen, start + Duration::minutes(10))
            .unwrap();
        item = updated;
        movements.push(m);

        (item, movements)
    }

    #[test]
    fn test_replay_matches_stored_stock() {
        let (item, movements) = history();
        assert_eq!(item.current_stock(), kg(25));
        assert_eq!(
            LedgerReplay::replay(item.id, &movements).unwrap(),
            item.current_stock()
        );

        let check = LedgerReplay::verify(&item, &movements).unwrap();
        assert!(check.is_consistent());
        assert!(LedgerReplay::verify_all(&[item], &movements).unwrap().is_empty());
    }

    #[test]
    fn test_late_entry_keeps_write_order() {
        let (item, mut movements) = history();
        // 補登：最後寫入，但記錄時間早於期初
        let backdated = movements[0].recorded_at - Duration::minutes(10);
        let kitchen = MovementMetadata::new(Counterparty::kitchen("Chef Ana", None));
        let (item, m) = MovementRecorder::default()
            .record(&item, MovementType::Out, kg(5), kitchen, backdated)
            .unwrap();
        movements.push(m);

        assert_eq!(item.current_stock(), kg(20));
        let check = LedgerReplay::verify(&item, &movements).unwrap();
        assert!(!check.went_negative);
        assert!(check.is_consistent());
    }

    #[test]
    fn test_detects_missing_movement() {
        let (item, mut movements) = history();
        movements.remove(1);

        let mismatches = LedgerReplay::verify_all(&[item], &movements).unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].replayed, kg(15));
        assert_eq!(mismatches[0].stored, kg(25));
    }

    #[test]
    fn test_detects_negative_running_balance() {
        let (item, mut movements) = history();
        // 偽造一筆寫在期初之前的出庫
        let mut early = movements[2].clone();
        early.id = ledger_core::MovementId::new();
        early.reason = MovementReason::Consumption;
        movements.insert(0, early);

        let check = LedgerReplay::verify(&item, &movements).unwrap();
        assert!(check.went_negative);
        assert!(!check.is_consistent());
    }
}
