//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use rust_decimal::Decimal;

/// Run one create → purchase → reconcile → claim cycle end to end.
#[derive(Parser, Debug, Clone)]
#[command(name = "realty-sim")]
#[command(about = "Simulates a tokenized realty pool against an in-process oracle")]
pub struct Args {
    /// JSON ledger config (defaults apply when omitted)
    #[arg(long, env = "REALTY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Property key of the simulated pool
    #[arg(long, default_value = "94103")]
    pub property: String,

    /// Total currency value offered
    #[arg(long, default_value = "5000")]
    pub total: Decimal,

    /// Number of holders splitting the offering
    #[arg(long, default_value_t = 3)]
    pub holders: usize,

    /// Valuation the oracle reports for the first purchase
    #[arg(long, default_value = "10000")]
    pub base_value: Decimal,

    /// Added to the reported valuation for each later purchase
    #[arg(long, default_value = "50")]
    pub value_step: Decimal,

    /// Valuation the oracle reports at maturity
    #[arg(long, default_value = "10200")]
    pub final_value: Decimal,

    /// Days until the pool matures
    #[arg(long, default_value_t = 30)]
    pub maturity_days: i64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "REALTY_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "REALTY_LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

impl Args {
    /// Check argument combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.holders == 0 {
            return Err("--holders must be at least 1".into());
        }
        if self.total <= Decimal::ZERO {
            return Err("--total must be positive".into());
        }
        if self.base_value <= Decimal::ZERO || self.final_value <= Decimal::ZERO {
            return Err("valuations must be positive".into());
        }
        if self.maturity_days <= 0 {
            return Err("--maturity-days must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_and_validate() {
        let args = Args::parse_from(["realty-sim"]);
        assert_eq!(args.total, Decimal::new(5000, 0));
        assert_eq!(args.holders, 3);
        assert!(args.config.is_none());
        args.validate().unwrap();
    }

    #[test]
    fn zero_holders_is_rejected() {
        let args = Args::parse_from(["realty-sim", "--holders", "0"]);
        assert!(args.validate().is_err());
    }
}
