//! 帳本配置

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result};

/// 帳本配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// 低庫存倍率（現有 <= 最低 * 倍率 視為偏低）
    pub low_stock_multiplier: Decimal,

    /// 警示範圍
    pub alert_policy: AlertPolicy,

    /// 用量統計天數
    pub usage_window_days: u32,

    /// 首頁最近異動筆數
    pub recent_activity_limit: usize,

    /// 發生時間允許超前記錄時間的秒數
    pub max_clock_skew_secs: i64,
}

impl LedgerConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            low_stock_multiplier: Decimal::new(15, 1),
            alert_policy: AlertPolicy::CriticalAndLow,
            usage_window_days: 30,
            recent_activity_limit: 5,
            max_clock_skew_secs: 300,
        }
    }

    /// 從 JSON 載入並檢查配置
    ///
    /// # 範例
    /// ```
    /// # use ledger_core::{AlertPolicy, LedgerConfig};
    /// let config = LedgerConfig::from_json(r#"{ "alert_policy": "critical_only" }"#).unwrap();
    /// assert_eq!(config.alert_policy, AlertPolicy::CriticalOnly);
    /// assert_eq!(config.usage_window_days, 30);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)
            .map_err(|e| LedgerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置低庫存倍率
    pub fn with_low_stock_multiplier(mut self, multiplier: Decimal) -> Self {
        self.low_stock_multiplier = multiplier;
        self
    }

    /// 建構器模式：設置警示範圍
    pub fn with_alert_policy(mut self, policy: AlertPolicy) -> Self {
        self.alert_policy = policy;
        self
    }

    /// 建構器模式：設置用量統計天數
    pub fn with_usage_window_days(mut self, days: u32) -> Self {
        self.usage_window_days = days;
        self
    }

    /// 建構器模式：設置最近異動筆數
    pub fn with_recent_activity_limit(mut self, limit: usize) -> Self {
        self.recent_activity_limit = limit;
        self
    }

    /// 建構器模式：設置允許的時鐘偏差
    pub fn with_max_clock_skew_secs(mut self, secs: i64) -> Self {
        self.max_clock_skew_secs = secs;
        self
    }

    /// 檢查配置是否合理
    pub fn validate(&self) -> Result<()> {
        if self.low_stock_multiplier < Decimal::ONE {
            return Err(LedgerError::InvalidConfig(format!(
                "低庫存倍率必須 >= 1，目前為 {}",
                self.low_stock_multiplier
            )));
        }
        if self.usage_window_days == 0 {
            return Err(LedgerError::InvalidConfig(
                "用量統計天數必須大於 0".to_string(),
            ));
        }
        if self.max_clock_skew_secs < 0 {
            return Err(LedgerError::InvalidConfig(
                "時鐘偏差不可為負數".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 低庫存警示範圍
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    /// 只警示危急
    CriticalOnly,
    /// 危急與偏低都警示
    CriticalAndLow,
}
