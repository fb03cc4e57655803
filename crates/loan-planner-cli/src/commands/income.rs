use clap::Subcommand;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::store::{FileStore, INCOME_KEY};

#[derive(Subcommand)]
pub enum IncomeCommand {
    /// Save the monthly income used by portfolio and dashboard
    Set {
        /// Monthly income amount
        amount: Decimal,
    },
    /// Show the saved monthly income
    Show,
}

pub fn run_income(command: IncomeCommand, store: &FileStore) -> Result<Value, Box<dyn std::error::Error>> {
    match command {
        IncomeCommand::Set { amount } => {
            if amount < Decimal::ZERO {
                return Err("Monthly income cannot be negative".into());
            }
            store.save(INCOME_KEY, &amount, None)?;
            Ok(json!({ "result": { "monthly_income": amount } }))
        }
        IncomeCommand::Show => {
            let saved: Option<Decimal> = store.load_as(INCOME_KEY)?;
            Ok(json!({
                "result": {
                    "monthly_income": saved.unwrap_or(Decimal::ZERO),
                    "source": if saved.is_some() { "store" } else { "unset" },
                }
            }))
        }
    }
}

/// Income from the flag or environment, then the store, then zero.
pub fn resolve_income(flag: Option<Decimal>, store: &FileStore) -> Result<Decimal, Box<dyn std::error::Error>> {
    if let Some(income) = flag {
        return Ok(income);
    }
    Ok(store.load_as(INCOME_KEY)?.unwrap_or(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_income_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json"));

        let shown = run_income(IncomeCommand::Show, &store).unwrap();
        assert_eq!(shown["result"]["source"], "unset");

        run_income(IncomeCommand::Set { amount: dec!(4200.50) }, &store).unwrap();
        let shown = run_income(IncomeCommand::Show, &store).unwrap();
        assert_eq!(shown["result"]["monthly_income"], "4200.50");
        assert_eq!(shown["result"]["source"], "store");
    }

    #[test]
    fn test_flag_beats_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json"));
        assert_eq!(resolve_income(None, &store).unwrap(), Decimal::ZERO);

        run_income(IncomeCommand::Set { amount: dec!(3000) }, &store).unwrap();
        assert_eq!(resolve_income(None, &store).unwrap(), dec!(3000));
        assert_eq!(resolve_income(Some(dec!(10)), &store).unwrap(), dec!(10));
    }

    #[test]
    fn test_negative_income_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json"));
        assert!(run_income(IncomeCommand::Set { amount: dec!(-1) }, &store).is_err());
    }
}
