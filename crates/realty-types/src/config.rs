//! Configuration types for the ledger and its oracle link.

use ed25519_dalek::VerifyingKey;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{RealtyError, Result, constants};

/// Ledger-wide settlement parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Symbol of the stable currency shares are denominated in.
    pub currency: String,
    /// Decimal places kept on settlement amounts.
    pub currency_scale: u32,
    /// Collateral (and per-holder cap) in basis points of the principal.
    pub collateral_bps: u32,
    /// External price oracle parameters.
    pub oracle: OracleConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: constants::DEFAULT_CURRENCY.to_string(),
            currency_scale: constants::DEFAULT_CURRENCY_SCALE,
            collateral_bps: constants::DEFAULT_COLLATERAL_BPS,
            oracle: OracleConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.collateral_bps == 0 || self.collateral_bps > constants::BPS_DENOMINATOR {
            return Err(RealtyError::Configuration(format!(
                "collateral_bps must be in 1..={}, got {}",
                constants::BPS_DENOMINATOR,
                self.collateral_bps
            )));
        }
        if self.currency_scale > constants::MAX_CURRENCY_SCALE {
            return Err(RealtyError::Configuration(format!(
                "currency_scale must be <= {}, got {}",
                constants::MAX_CURRENCY_SCALE,
                self.currency_scale
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(RealtyError::Configuration("currency must not be empty".into()));
        }
        if self.oracle.fee.is_sign_negative() {
            return Err(RealtyError::Configuration("oracle fee must not be negative".into()));
        }
        self.oracle.verifying_key()?;
        Ok(())
    }

    /// Collateral fraction as a decimal (1000 bps → 0.1).
    #[must_use]
    pub fn collateral_rate(&self) -> Decimal {
        Decimal::from(self.collateral_bps) / Decimal::from(constants::BPS_DENOMINATOR)
    }

    /// Collateral the creator escrows for a pool of `total_amount`.
    #[must_use]
    pub fn collateral_for(&self, total_amount: Decimal) -> Decimal {
        self.round_down(total_amount * self.collateral_rate())
    }

    /// Round toward zero at the currency scale.
    #[must_use]
    pub fn round_down(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.currency_scale, RoundingStrategy::ToZero)
    }
}

/// Parameters of the external price oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Hex-encoded ed25519 public key allowed to sign valuation reports.
    /// `None` disables signed fulfillment.
    pub oracle_key: Option<String>,
    /// Job identifier attached to every outbound request.
    pub job_id: String,
    /// Fee paid to the oracle per request.
    pub fee: Decimal,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            oracle_key: None,
            job_id: constants::DEFAULT_ORACLE_JOB_ID.to_string(),
            fee: Decimal::new(constants::DEFAULT_ORACLE_FEE_MILLIS, 3),
        }
    }
}

impl OracleConfig {
    /// Decode the configured oracle public key.
    pub fn verifying_key(&self) -> Result<Option<VerifyingKey>> {
        let Some(key_hex) = &self.oracle_key else {
            return Ok(None);
        };
        let raw = hex::decode(key_hex.trim_start_matches("0x"))
            .map_err(|e| RealtyError::Configuration(format!("oracle_key is not hex: {e}")))?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| RealtyError::Configuration("oracle_key must be 32 bytes".into()))?;
        VerifyingKey::from_bytes(&bytes)
            .map(Some)
            .map_err(|e| RealtyError::Configuration(format!("oracle_key is invalid: {e}")))
    }
}
