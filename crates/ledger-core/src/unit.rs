//! 計量單位

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::LedgerError;

/// 計量單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// 公斤
    #[serde(rename = "kg")]
    Kilogram,
    /// 公升
    #[serde(rename = "L")]
    Litre,
    /// 個
    #[serde(rename = "pcs")]
    Piece,
    /// 公克
    #[serde(rename = "g")]
    Gram,
    /// 毫升
    #[serde(rename = "ml")]
    Millilitre,
    /// 打
    #[serde(rename = "dozen")]
    Dozen,
}

impl Unit {
    pub const ALL: [Unit; 6] = [
        Unit::Kilogram,
        Unit::Litre,
        Unit::Piece,
        Unit::Gram,
        Unit::Millilitre,
        Unit::Dozen,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Kilogram => "kg",
            Unit::Litre => "L",
            Unit::Piece => "pcs",
            Unit::Gram => "g",
            Unit::Millilitre => "ml",
            Unit::Dozen => "dozen",
        }
    }

    /// 該單位允許的最大小數位數（件數必須為整數）
    pub fn max_scale(&self) -> u32 {
        match self {
            Unit::Piece => 0,
            _ => crate::quantity::QUANTITY_MAX_SCALE,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::ALL
            .into_iter()
            .find(|unit| unit.symbol().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LedgerError::validation(format!("未知的計量單位: {s}")))
    }
}
