//! 定點數量與金額運算
//!
//! 所有運算都在整數尾數上完成，結果無法精確表示時回傳
//! [`LedgerError::PrecisionOverflow`]，不做靜默捨入。

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

use crate::{LedgerError, Result, Unit};

/// 庫存數量最多小數位數（質量/體積）
pub const QUANTITY_MAX_SCALE: u32 = 3;

/// 金額顯示小數位數
pub const MONEY_DISPLAY_SCALE: u32 = 2;

/// `Decimal` 可表示的最大小數位數
const DECIMAL_MAX_SCALE: u32 = 28;

fn overflow(op: &str, a: Decimal, b: Decimal) -> LedgerError {
    LedgerError::PrecisionOverflow(format!("{a} {op} {b} 無法精確表示"))
}

fn rescaled_mantissa(value: Decimal, scale: u32) -> Option<i128> {
    10i128
        .checked_pow(scale - value.scale())
        .and_then(|factor| value.mantissa().checked_mul(factor))
}

/// 精確加法
pub fn add(a: Decimal, b: Decimal) -> Result<Decimal> {
    let scale = a.scale().max(b.scale());
    let lhs = rescaled_mantissa(a, scale).ok_or_else(|| overflow("+", a, b))?;
    let rhs = rescaled_mantissa(b, scale).ok_or_else(|| overflow("+", a, b))?;
    let sum = lhs.checked_add(rhs).ok_or_else(|| overflow("+", a, b))?;
    Decimal::try_from_i128_with_scale(sum, scale).map_err(|_| overflow("+", a, b))
}

/// 精確減法
pub fn subtract(a: Decimal, b: Decimal) -> Result<Decimal> {
    add(a, -b).map_err(|_| overflow("-", a, b))
}

/// 精確乘法
pub fn multiply(a: Decimal, b: Decimal) -> Result<Decimal> {
    let scale = a.scale() + b.scale();
    if scale > DECIMAL_MAX_SCALE {
        return Err(overflow("*", a, b));
    }
    let product = a
        .mantissa()
        .checked_mul(b.mantissa())
        .ok_or_else(|| overflow("*", a, b))?;
    Decimal::try_from_i128_with_scale(product, scale).map_err(|_| overflow("*", a, b))
}

/// 庫存數量（最多 3 位小數）
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    /// 創建數量，小數位數超過上限時失敗
    pub fn new(value: Decimal) -> Result<Self> {
        Self::with_max_scale(value, QUANTITY_MAX_SCALE)
    }

    /// 依計量單位的精度創建數量
    pub fn for_unit(value: Decimal, unit: Unit) -> Result<Self> {
        Self::with_max_scale(value, unit.max_scale())
    }

    fn with_max_scale(value: Decimal, max_scale: u32) -> Result<Self> {
        let normalized = value.normalize();
        if normalized.scale() > max_scale {
            return Err(LedgerError::PrecisionOverflow(format!(
                "數量 {value} 超過 {max_scale} 位小數"
            )));
        }
        Ok(Self(normalized))
    }

    pub fn from_int(value: i64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// 檢查是否符合指定單位的精度
    pub fn fits_unit(&self, unit: Unit) -> bool {
        self.0.scale() <= unit.max_scale()
    }

    pub fn checked_add(self, other: Quantity) -> Result<Quantity> {
        add(self.0, other.0).and_then(Quantity::new)
    }

    pub fn checked_sub(self, other: Quantity) -> Result<Quantity> {
        subtract(self.0, other.0).and_then(Quantity::new)
    }

    /// 數量乘以倍率（結果保留完整精度）
    pub fn checked_scale(self, factor: Decimal) -> Result<Decimal> {
        multiply(self.0, factor)
    }

    /// 數量乘以單價得到金額
    pub fn checked_mul_money(self, price: Money) -> Result<Money> {
        multiply(self.0, price.0).map(Money)
    }

    /// 加總一組數量
    pub fn checked_sum<I>(iter: I) -> Result<Quantity>
    where
        I: IntoIterator<Item = Quantity>,
    {
        iter.into_iter()
            .try_fold(Quantity::ZERO, |acc, q| acc.checked_add(q))
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Self::Output {
        Quantity(-self.0)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Quantity::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// 金額
///
/// 運算保留完整精度，只有顯示時才取 2 位小數。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value.normalize())
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn checked_add(self, other: Money) -> Result<Money> {
        add(self.0, other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Result<Money> {
        subtract(self.0, other.0).map(Money)
    }

    pub fn checked_mul(self, quantity: Quantity) -> Result<Money> {
        quantity.checked_mul_money(self)
    }

    /// 顯示用字串（2 位小數，四捨五入）
    pub fn display(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(MONEY_DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.2}")
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
