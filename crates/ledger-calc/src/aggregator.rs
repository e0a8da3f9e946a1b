//! 帳本彙總
//!
//! 把一段期間內的異動折疊成入庫/出庫總量、分類與供應商小計。
//! 合併運算滿足交換律與結合律，所以可以平行計算且與輸入順序無關。

use chrono::{DateTime, Duration, NaiveDate, Utc};
use ledger_core::{
    CategoryId, InventoryItem, ItemId, LedgerError, Money, MovementId, MovementType,
    Quantity, Result, StockMovement, SupplierId,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 時間區間 [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// 起始（含），None 表示不設下限
    pub start: Option<DateTime<Utc>>,
    /// 結束（不含），None 表示不設上限
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// 創建新的時間區間，起始必須早於結束
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(LedgerError::Validation(format!(
                "時間區間起始 {start} 必須早於結束 {end}"
            )));
        }
        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// 不限時間
    pub fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// 截至 now 的最近 N 天
    pub fn trailing_days(now: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: Some(now - Duration::days(i64::from(days))),
            end: Some(now),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| at >= start) && self.end.map_or(true, |end| at < end)
    }
}

/// 數量與金額小計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTotals {
    pub quantity_in: Quantity,
    pub quantity_out: Quantity,
    pub value_in: Money,
    pub value_out: Money,
    /// 異動筆數
    pub movements: usize,
}

impl FlowTotals {
    fn absorb(&mut self, movement: &StockMovement) -> Result<()> {
        let value = movement.value()?.unwrap_or(Money::ZERO);
        match movement.movement_type {
            MovementType::In => {
                self.quantity_in = self.quantity_in.checked_add(movement.quantity)?;
                self.value_in = self.value_in.checked_add(value)?;
            }
            MovementType::Out => {
                self.quantity_out = self.quantity_out.checked_add(movement.quantity)?;
                self.value_out = self.value_out.checked_add(value)?;
            }
        }
        self.movements += 1;
        Ok(())
    }

    fn merge(self, other: FlowTotals) -> Result<FlowTotals> {
        Ok(FlowTotals {
            quantity_in: self.quantity_in.checked_add(other.quantity_in)?,
            quantity_out: self.quantity_out.checked_add(other.quantity_out)?,
            value_in: self.value_in.checked_add(other.value_in)?,
            value_out: self.value_out.checked_add(other.value_out)?,
            movements: self.movements + other.movements,
        })
    }

    /// 淨變化（入庫 - 出庫）
    pub fn net_quantity(&self) -> Result<Quantity> {
        self.quantity_in.checked_sub(self.quantity_out)
    }
}

/// 期間彙總
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub window: TimeWindow,
    pub total_in: Quantity,
    pub total_out: Quantity,
    pub net_change: Quantity,
    /// 入庫金額合計（依記錄當下單價）
    pub value_in: Money,
    /// 出庫金額合計
    pub value_out: Money,
    pub per_category: BTreeMap<CategoryId, FlowTotals>,
    pub per_supplier: BTreeMap<SupplierId, FlowTotals>,
    pub movement_count: usize,
    /// 沒有記錄單價的異動筆數
    pub unpriced_movements: usize,
}

impl LedgerSummary {
    /// 創建空的彙總
    pub fn empty(window: TimeWindow) -> Self {
        Self {
            window,
            total_in: Quantity::ZERO,
            total_out: Quantity::ZERO,
            net_change: Quantity::ZERO,
            value_in: Money::ZERO,
            value_out: Money::ZERO,
            per_category: BTreeMap::new(),
            per_supplier: BTreeMap::new(),
            movement_count: 0,
            unpriced_movements: 0,
        }
    }

    fn merge(mut self, other: LedgerSummary) -> Result<LedgerSummary> {
        self.total_in = self.total_in.checked_add(other.total_in)?;
        self.total_out = self.total_out.checked_add(other.total_out)?;
        self.value_in = self.value_in.checked_add(other.value_in)?;
        self.value_out = self.value_out.checked_add(other.value_out)?;
        self.movement_count += other.movement_count;
        self.unpriced_movements += other.unpriced_movements;
        merge_totals(&mut self.per_category, other.per_category)?;
        merge_totals(&mut self.per_supplier, other.per_supplier)?;
        Ok(self)
    }
}

fn merge_totals<K: Ord>(
    into: &mut BTreeMap<K, FlowTotals>,
    from: BTreeMap<K, FlowTotals>,
) -> Result<()> {
    for (key, totals) in from {
        let merged = match into.remove(&key) {
            Some(existing) => existing.merge(totals)?,
            None => totals,
        };
        into.insert(key, merged);
    }
    Ok(())
}

/// 單筆異動後的庫存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    pub movement_id: MovementId,
    pub occurred_at: DateTime<Utc>,
    pub balance: Quantity,
}

/// 每日用量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub category_id: CategoryId,
    pub quantity: Quantity,
}

/// 帳本彙總器
pub struct LedgerAggregator {
    categories: HashMap<ItemId, CategoryId>,
}

impl LedgerAggregator {
    /// 依物料清單建立彙總器（用於對應分類）
    pub fn new(items: &[InventoryItem]) -> Self {
        Self {
            categories: items
                .iter()
                .map(|item| (item.id, item.category_id))
                .collect(),
        }
    }

    fn category_of(&self, movement: &StockMovement) -> Result<CategoryId> {
        self.categories
            .get(&movement.item_id)
            .copied()
            .ok_or_else(|| {
                LedgerError::Validation(format!(
                    "異動 {} 參照未知物料 {}",
                    movement.id, movement.item_id
                ))
            })
    }

    fn absorb(&self, summary: &mut LedgerSummary, movement: &StockMovement) -> Result<()> {
        let category_id = self.category_of(movement)?;

        let value = movement.value()?.unwrap_or(Money::ZERO);
        match movement.movement_type {
            MovementType::In => {
                summary.total_in = summary.total_in.checked_add(movement.quantity)?;
                summary.value_in = summary.value_in.checked_add(value)?;
            }
            MovementType::Out => {
                summary.total_out = summary.total_out.checked_add(movement.quantity)?;
                summary.value_out = summary.value_out.checked_add(value)?;
            }
        }
        summary.movement_count += 1;
        if movement.unit_cost.is_none() {
            summary.unpriced_movements += 1;
        }

        summary
            .per_category
            .entry(category_id)
            .or_default()
            .absorb(movement)?;

        if movement.is_inbound() {
            if let Some(supplier_id) = movement.counterparty.supplier_id() {
                summary
                    .per_supplier
                    .entry(supplier_id)
                    .or_default()
                    .absorb(movement)?;
            }
        }
        Ok(())
    }

    /// 彙總區間內的異動
    pub fn summarize(
        &self,
        movements: &[StockMovement],
        window: TimeWindow,
    ) -> Result<LedgerSummary> {
        tracing::debug!("彙總異動：共 {} 筆", movements.len());

        let mut summary = movements
            .par_iter()
            .filter(|movement| window.contains(movement.occurred_at))
            .try_fold(
                || LedgerSummary::empty(window),
                |mut acc, movement| {
                    self.absorb(&mut acc, movement)?;
                    Ok::<_, LedgerError>(acc)
                },
            )
            .try_reduce(|| LedgerSummary::empty(window), |a, b| a.merge(b))?;

        summary.net_change = summary.total_in.checked_sub(summary.total_out)?;

        tracing::debug!(
            "彙總完成：{} 筆，入庫 {}，出庫 {}",
            summary.movement_count,
            summary.total_in,
            summary.total_out
        );
        Ok(summary)
    }

    /// 每日出庫用量（依 UTC 日期與分類）
    pub fn daily_usage(
        &self,
        movements: &[StockMovement],
        window: TimeWindow,
    ) -> Result<Vec<DailyUsage>> {
        let mut usage: BTreeMap<(NaiveDate, CategoryId), Quantity> = BTreeMap::new();

        for movement in movements
            .iter()
            .filter(|m| m.is_outbound() && window.contains(m.occurred_at))
        {
            let key = (movement.occurred_at.date_naive(), self.category_of(movement)?);
            let total = usage.entry(key).or_default();
            *total = total.checked_add(movement.quantity)?;
        }

        Ok(usage
            .into_iter()
            .map(|((date, category_id), quantity)| DailyUsage {
                date,
                category_id,
                quantity,
            })
            .collect())
    }

    /// 各物料逐筆累計庫存（依發生時間、記錄時間、ID 排序）
    pub fn running_balances(
        movements: &[StockMovement],
    ) -> Result<BTreeMap<ItemId, Vec<RunningBalance>>> {
        let mut ordered: Vec<&StockMovement> = movements.iter().collect();
        ordered.sort_by_key(|m| (m.occurred_at, m.recorded_at, m.id));

        let mut balances: BTreeMap<ItemId, Vec<RunningBalance>> = BTreeMap::new();
        for movement in ordered {
            let history = balances.entry(movement.item_id).or_default();
            let previous = history.last().map_or(Quantity::ZERO, |b| b.balance);
            history.push(RunningBalance {
                movement_id: movement.id,
                occurred_at: movement.occurred_at,
                balance: previous.checked_add(movement.signed_quantity())?,
            });
        }
        Ok(balances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{MovementMetadata, MovementRecorder};
    use chrono::TimeZone;
    use ledger_core::{Counterparty, MovementReason, Unit};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    struct Fixture {
        items: Vec<InventoryItem>,
        movements: Vec<StockMovement>,
        vegetables: CategoryId,
        meat: CategoryId,
        farm: SupplierId,
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn fixture() -> Fixture {
        let recorder = MovementRecorder::default();
        let vegetables = CategoryId::new();
        let meat = CategoryId::new();
        let farm = SupplierId::new();
        let prime = SupplierId::new();

        let onions = InventoryItem::new("Onions", vegetables, Unit::Kilogram, at(1, 0));
        let beef = InventoryItem::new("Beef", meat, Unit::Kilogram, at(1, 0));
        let mut movements = Vec::new();

        let steps: Vec<(&InventoryItem, MovementType, i64, MovementMetadata, DateTime<Utc>)> = vec![
            (
                &onions,
                MovementType::In,
                50,
                MovementMetadata::new(Counterparty::supplier(farm, "Fresh Farm Co."))
                    .with_unit_cost(Money::new(Decimal::new(250, 2))),
                at(14, 10),
            ),
            (
                &beef,
                MovementType::In,
                20,
                MovementMetadata::new(Counterparty::supplier(prime, "Prime Meats Ltd"))
                    .with_unit_cost(Money::new(Decimal::from(15))),
                at(14, 14),
            ),
            (
                &onions,
                MovementType::Out,
                8,
                MovementMetadata::new(Counterparty::kitchen("Chef Sarah", None)),
                at(15, 16),
            ),
            (
                &beef,
                MovementType::Out,
                5,
                MovementMetadata::new(Counterparty::kitchen("Chef Marco", None)),
                at(15, 11),
            ),
        ];

        let mut current: HashMap<ItemId, InventoryItem> = HashMap::new();
        for (item, movement_type, qty, metadata, when) in steps {
            let base = current.get(&item.id).cloned().unwrap_or_else(|| item.clone());
            let (updated, movement) = recorder
                .record(
                    &base,
                    movement_type,
                    Quantity::from_int(qty),
                    metadata.with_occurred_at(when),
                    when,
                )
                .unwrap();
            current.insert(updated.id, updated);
            movements.push(movement);
        }

        Fixture {
            items: vec![onions, beef],
            movements,
            vegetables,
            meat,
            farm,
        }
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let aggregator = LedgerAggregator::new(&[]);
        let summary = aggregator.summarize(&[], TimeWindow::unbounded()).unwrap();
        assert_eq!(summary, LedgerSummary::empty(TimeWindow::unbounded()));
        assert_eq!(summary.net_change, Quantity::ZERO);
    }

    #[test]
    fn test_summarize_totals() {
        let f = fixture();
        let aggregator = LedgerAggregator::new(&f.items);
        let summary = aggregator
            .summarize(&f.movements, TimeWindow::unbounded())
            .unwrap();

        assert_eq!(summary.total_in, Quantity::from_int(70));
        assert_eq!(summary.total_out, Quantity::from_int(13));
        assert_eq!(summary.net_change, Quantity::from_int(57));
        assert_eq!(summary.movement_count, 4);
        assert_eq!(summary.unpriced_movements, 2);
        assert_eq!(summary.value_in, Money::new(Decimal::from(425)));
        assert_eq!(summary.value_out, Money::ZERO);

        let veg = &summary.per_category[&f.vegetables];
        assert_eq!(veg.quantity_in, Quantity::from_int(50));
        assert_eq!(veg.quantity_out, Quantity::from_int(8));
        assert_eq!(veg.value_in, Money::new(Decimal::from(125)));

        let meat = &summary.per_category[&f.meat];
        assert_eq!(meat.value_in, Money::new(Decimal::from(300)));

        assert_eq!(summary.per_supplier.len(), 2);
        assert_eq!(summary.per_supplier[&f.farm].movements, 1);
        assert_eq!(summary.per_supplier[&f.farm].value_in, Money::new(Decimal::from(125)));
    }

    #[test]
    fn test_window_is_half_open() {
        let f = fixture();
        let aggregator = LedgerAggregator::new(&f.items);

        // [14日 14:00, 15日 16:00) 包含牛肉入庫與牛肉出庫，不含洋蔥出庫
        let window = TimeWindow::new(at(14, 14), at(15, 16)).unwrap();
        let summary = aggregator.summarize(&f.movements, window).unwrap();
        assert_eq!(summary.total_in, Quantity::from_int(20));
        assert_eq!(summary.total_out, Quantity::from_int(5));
        assert_eq!(summary.movement_count, 2);

        assert!(TimeWindow::new(at(15, 0), at(15, 0)).is_err());
    }

    #[test]
    fn test_unknown_item_is_rejected() {
        let f = fixture();
        let aggregator = LedgerAggregator::new(&f.items[..1]);
        let err = aggregator
            .summarize(&f.movements, TimeWindow::unbounded())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_daily_usage() {
        let f = fixture();
        let aggregator = LedgerAggregator::new(&f.items);
        let usage = aggregator
            .daily_usage(&f.movements, TimeWindow::unbounded())
            .unwrap();

        assert_eq!(usage.len(), 2);
        assert!(usage.iter().all(|u| u.date == at(15, 0).date_naive()));
        let total = Quantity::checked_sum(usage.iter().map(|u| u.quantity)).unwrap();
        assert_eq!(total, Quantity::from_int(13));
    }

    #[test]
    fn test_running_balances() {
        let f = fixture();
        let balances = LedgerAggregator::running_balances(&f.movements).unwrap();
        let onions = &balances[&f.items[0].id];
        let history: Vec<_> = onions.iter().map(|b| b.balance).collect();
        assert_eq!(history, vec![Quantity::from_int(50), Quantity::from_int(42)]);
    }

    /// (物料, 是否入庫, 數量 * 10, 單價 * 100, 供應商, 日)
    type MovementSeed = (usize, bool, i64, Option<i64>, usize, u32);

    fn movement_strategy() -> impl Strategy<Value = MovementSeed> {
        (
            0usize..3,
            any::<bool>(),
            1i64..=10_000,
            proptest::option::of(1i64..=100_000),
            0usize..2,
            1u32..=28,
        )
    }

    /// 產生異動清單與一個打亂後的順序
    fn shuffled_movements() -> impl Strategy<Value = (Vec<MovementSeed>, Vec<usize>)> {
        proptest::collection::vec(movement_strategy(), 0..40).prop_flat_map(|seeds| {
            let order: Vec<usize> = (0..seeds.len()).collect();
            (Just(seeds), Just(order).prop_shuffle())
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_summary_is_permutation_invariant((seeds, order) in shuffled_movements()) {
            let vegetables = CategoryId::new();
            let meat = CategoryId::new();
            let items = vec![
                InventoryItem::new("Onions", vegetables, Unit::Kilogram, at(1, 0)),
                InventoryItem::new("Tomatoes", vegetables, Unit::Kilogram, at(1, 0)),
                InventoryItem::new("Beef", meat, Unit::Kilogram, at(1, 0)),
            ];
            let suppliers = [SupplierId::new(), SupplierId::new()];

            let movements: Vec<StockMovement> = seeds
                .iter()
                .map(|&(item, inbound, qty, price, supplier, day)| {
                    let (movement_type, reason, counterparty) = if inbound {
                        (
                            MovementType::In,
                            MovementReason::Receipt,
                            Counterparty::supplier(suppliers[supplier], "Supplier"),
                        )
                    } else {
                        (
                            MovementType::Out,
                            MovementReason::Consumption,
                            Counterparty::kitchen("Chef", None),
                        )
                    };
                    let mut movement = StockMovement::new(
                        items[item].id,
                        movement_type,
                        reason,
                        Quantity::new(Decimal::new(qty, 1)).unwrap(),
                        counterparty,
                        at(day, 12),
                        at(day, 12),
                    );
                    movement.unit_cost = price.map(|p| Money::new(Decimal::new(p, 2)));
                    movement
                })
                .collect();
            let shuffled: Vec<StockMovement> =
                order.iter().map(|&i| movements[i].clone()).collect();

            let aggregator = LedgerAggregator::new(&items);
            let expected = aggregator.summarize(&movements, TimeWindow::unbounded()).unwrap();
            let actual = aggregator.summarize(&shuffled, TimeWindow::unbounded()).unwrap();

            let generated_in = Quantity::checked_sum(
                movements.iter().filter(|m| m.is_inbound()).map(|m| m.quantity),
            )
            .unwrap();
            prop_assert_eq!(expected.total_in, generated_in);
            prop_assert_eq!(expected.movement_count, seeds.len());

            prop_assert_eq!(actual.total_in, expected.total_in);
            prop_assert_eq!(actual.total_out, expected.total_out);
            prop_assert_eq!(actual.value_in, expected.value_in);
            prop_assert_eq!(&actual.per_category, &expected.per_category);
            prop_assert_eq!(&actual.per_supplier, &expected.per_supplier);
            prop_assert_eq!(actual, expected);
        }
    }
}
