//! Presentation-ready numbers for the dashboard: income, expense and balance totals, the most
//! recent transactions, and progress towards goals, budgets and debts.
//!
//! Everything here is plain arithmetic on decoded records. Amounts stay `Decimal` until they are
//! formatted for display. Sums use checked arithmetic: a total that leaves the `Decimal` range is
//! an `Error::Overflow`, and a percentage that does is left out.

use crate::api::Gateway;
use crate::model::coerce::coerce_date;
use crate::model::schema::{
    AMOUNT_STR, CATEGORY_STR, CREDITOR_STR, CURRENT_AMOUNT_STR, CURRENT_BALANCE_STR, DATE_STR,
    CURRENT_VALUE_STR, GOAL_NAME_STR, INVESTED_AMOUNT_STR, MONTHLY_LIMIT_STR,
    REMAINING_BALANCE_STR, SPENT_STR, TARGET_AMOUNT_STR, TOTAL_AMOUNT_STR, TYPE_STR,
};
use crate::model::{Amount, CategoryMap, Record, Table, TransactionType};
use crate::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::debug;

/// The number of transactions shown as "recent" unless asked otherwise.
pub const RECENT_COUNT: usize = 5;

/// How the most recent transactions are chosen.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RecencyOrder {
    /// Greatest record identifier first. Identifiers are not guaranteed to grow over time in
    /// every store, so this is only an approximation.
    #[default]
    Identifier,
    /// Latest `Date` first. Transactions without a valid date come last.
    Date,
}

serde_plain::derive_display_from_serialize!(RecencyOrder);

/// How amounts are written for display.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// Chilean pesos: no decimals and `.` between thousands, e.g. `-$1.234.567`.
    #[default]
    Clp,
    /// US dollars: two decimals and `,` between thousands, e.g. `-$1,234,567.00`.
    Usd,
}

serde_plain::derive_display_from_serialize!(Currency);

impl Currency {
    pub fn format(&self, amount: Decimal) -> String {
        match self {
            Currency::Usd => Amount::new(amount).to_string(),
            Currency::Clp => {
                let sign = if amount.round().is_sign_negative() && !amount.round().is_zero() {
                    "-"
                } else {
                    ""
                };
                let whole = amount.abs().round().to_f64().unwrap_or_default();
                let digits = format_num::format_num!(",.0", whole).replace(',', ".");
                format!("{sign}${digits}")
            }
        }
    }
}

/// Income, expense and the balance between them. Both totals are non-negative.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

/// Adds `amount` to `total`, failing with `Error::Overflow` named after `what`.
fn add(total: Decimal, amount: Decimal, what: &str) -> Result<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| Error::Overflow(what.to_string()))
}

/// Adds up `transactions`. A transaction counts as income or expense by its type; when the type
/// is not recognized, by the sign of its amount. Transactions without an amount are skipped.
pub fn totals(transactions: &[Record]) -> Result<Totals> {
    let mut totals = Totals::default();
    for tx in transactions {
        let Some(amount) = tx.number(AMOUNT_STR) else {
            continue;
        };
        let kind = tx.text(TYPE_STR).and_then(TransactionType::recognize);
        let is_income = match kind {
            Some(TransactionType::Income) => true,
            Some(TransactionType::Expense) => false,
            None => !amount.is_sign_negative(),
        };
        if is_income {
            totals.income = add(totals.income, amount.abs(), "income")?;
        } else {
            totals.expense = add(totals.expense, amount.abs(), "expense")?;
        }
    }
    totals.balance = totals
        .income
        .checked_sub(totals.expense)
        .ok_or_else(|| Error::Overflow("balance".into()))?;
    Ok(totals)
}

/// The sum of the current balance of every account.
pub fn account_total(accounts: &[Record]) -> Result<Decimal> {
    accounts
        .iter()
        .filter_map(|a| a.number(CURRENT_BALANCE_STR))
        .try_fold(Decimal::ZERO, |total, balance| {
            add(total, balance, "account balance")
        })
}

/// What was put into the investments, what they are worth now, and the difference.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct InvestmentTotals {
    pub invested: Decimal,
    pub current: Decimal,
    pub gain: Decimal,
}

/// Adds up the invested amount and current value of `investments`. A missing number counts as
/// zero.
pub fn investment_totals(investments: &[Record]) -> Result<InvestmentTotals> {
    let mut totals = InvestmentTotals::default();
    for inv in investments {
        let invested = inv.number(INVESTED_AMOUNT_STR).unwrap_or_default();
        let current = inv.number(CURRENT_VALUE_STR).unwrap_or_default();
        totals.invested = add(totals.invested, invested, "invested")?;
        totals.current = add(totals.current, current, "investment value")?;
    }
    totals.gain = totals
        .current
        .checked_sub(totals.invested)
        .ok_or_else(|| Error::Overflow("investment gain".into()))?;
    Ok(totals)
}

/// The `n` most recent transactions, most recent first.
pub fn recent(transactions: &[Record], n: usize, order: RecencyOrder) -> Vec<Record> {
    let mut sorted = transactions.to_vec();
    match order {
        RecencyOrder::Identifier => sorted.sort_by(|a, b| b.id.cmp(&a.id)),
        RecencyOrder::Date => sorted.sort_by_key(|tx| {
            Reverse(
                tx.text(DATE_STR)
                    .and_then(|d| coerce_date(d).ok()),
            )
        }),
    }
    sorted.truncate(n);
    sorted
}

/// `current` as a percentage of `target`, or `None` when the target is zero or the percentage
/// does not fit in a `Decimal`.
pub fn progress(current: Decimal, target: Decimal) -> Option<Decimal> {
    if target.is_zero() {
        return None;
    }
    current
        .checked_div(target)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Progress towards one goal, budget or debt.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub current: Decimal,
    pub target: Decimal,
    /// `None` when the target is zero or the percentage is out of range.
    pub percent: Option<Decimal>,
}

impl Progress {
    fn new(record: &Record, name: &str, current: Decimal, target: Decimal) -> Self {
        Self {
            id: record.id.clone(),
            name: record.text(name).unwrap_or_default().to_string(),
            current,
            target,
            percent: progress(current, target),
        }
    }
}

/// Saved amount against the target amount of each goal.
pub fn goal_progress(goals: &[Record]) -> Vec<Progress> {
    goals
        .iter()
        .map(|g| {
            Progress::new(
                g,
                GOAL_NAME_STR,
                g.number(CURRENT_AMOUNT_STR).unwrap_or_default(),
                g.number(TARGET_AMOUNT_STR).unwrap_or_default(),
            )
        })
        .collect()
}

/// Amount spent against the monthly limit of each budget.
pub fn budget_usage(budgets: &[Record]) -> Vec<Progress> {
    budgets
        .iter()
        .map(|b| {
            Progress::new(
                b,
                CATEGORY_STR,
                b.number(SPENT_STR).unwrap_or_default(),
                b.number(MONTHLY_LIMIT_STR).unwrap_or_default(),
            )
        })
        .collect()
}

/// Amount repaid (total minus remaining balance) against the total amount of each debt.
pub fn debt_repayment(debts: &[Record]) -> Result<Vec<Progress>> {
    debts
        .iter()
        .map(|d| {
            let total = d.number(TOTAL_AMOUNT_STR).unwrap_or_default();
            let remaining = d.number(REMAINING_BALANCE_STR).unwrap_or_default();
            let repaid = total
                .checked_sub(remaining)
                .ok_or_else(|| Error::Overflow("debt repayment".into()))?;
            Ok(Progress::new(d, CREDITOR_STR, repaid, total))
        })
        .collect()
}

/// Settings for `summarize`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct SummaryOptions {
    pub recent: usize,
    pub order: RecencyOrder,
    pub currency: Currency,
}

/// One line of progress, formatted for display.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProgressLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub current: String,
    pub target: String,
    pub percent: Option<String>,
}

/// Everything the dashboard page shows, formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub income: String,
    pub expense: String,
    pub balance: String,
    pub account_balance: String,
    pub invested: String,
    pub investment_value: String,
    pub investment_gain: String,
    pub recent: Vec<Record>,
    pub goals: Vec<ProgressLine>,
    pub budgets: Vec<ProgressLine>,
    pub debts: Vec<ProgressLine>,
}

/// Reads the tables the dashboard needs through `gateway` and builds the `Summary`.
///
/// A failure on any table fails the whole summary, so nothing half-computed is ever shown.
pub async fn summarize(
    gateway: &mut (dyn Gateway + Send),
    options: SummaryOptions,
) -> Result<Summary> {
    let transactions = gateway.fetch_all(&Table::Transactions.to_string()).await?;
    let accounts = gateway.fetch_all(&Table::Accounts.to_string()).await?;
    let goals = gateway.fetch_all(&Table::Goals.to_string()).await?;
    let budgets = gateway.fetch_all(&Table::Budgets.to_string()).await?;
    let debts = gateway.fetch_all(&Table::Debts.to_string()).await?;
    let investments = gateway.fetch_all(&Table::Investments.to_string()).await?;
    debug!(
        "Summarizing {} transactions, {} accounts and {} investments",
        transactions.len(),
        accounts.len(),
        investments.len()
    );

    let currency = options.currency;
    let lines = |items: Vec<Progress>| -> Vec<ProgressLine> {
        items
            .into_iter()
            .map(|p| ProgressLine {
                id: p.id,
                name: p.name,
                current: currency.format(p.current),
                target: currency.format(p.target),
                percent: p.percent.map(|v| format!("{v:.1}%")),
            })
            .collect()
    };

    let totals = totals(&transactions)?;
    let investing = investment_totals(&investments)?;
    Ok(Summary {
        income: currency.format(totals.income),
        expense: currency.format(totals.expense),
        balance: currency.format(totals.balance),
        account_balance: currency.format(account_total(&accounts)?),
        invested: currency.format(investing.invested),
        investment_value: currency.format(investing.current),
        investment_gain: currency.format(investing.gain),
        recent: recent(&transactions, options.recent, options.order),
        goals: lines(goal_progress(&goals)),
        budgets: lines(budget_usage(&budgets)),
        debts: lines(debt_repayment(&debts)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{GatewayImpl, TestStore};
    use crate::model::{Fields, Value};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tx(id: &str, date: &str, amount: &str, kind: &str) -> Record {
        let mut fields = Fields::new();
        fields.insert(DATE_STR.into(), Value::Date(date.into()));
        fields.insert(AMOUNT_STR.into(), Value::Number(dec(amount)));
        fields.insert(TYPE_STR.into(), Value::Category(kind.into()));
        Record::new(id, fields)
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(Record::id).collect()
    }

    #[test]
    fn test_totals() {
        let transactions = vec![
            tx("1", "2025-10-01", "1000", "Ingreso"),
            tx("2", "2025-10-02", "-300", "Gasto"),
            tx("3", "2025-10-03", "-200.50", "gasto"),
            tx("4", "2025-10-04", "50", "Otro"),
            tx("5", "2025-10-05", "-25", "Otro"),
        ];
        let totals = totals(&transactions).unwrap();
        assert_eq!(totals.income, dec("1050"));
        assert_eq!(totals.expense, dec("525.50"));
        assert_eq!(totals.balance, dec("524.50"));
    }

    #[test]
    fn test_totals_skip_missing_amounts() {
        let mut fields = Fields::new();
        fields.insert(TYPE_STR.into(), Value::Category("Gasto".into()));
        let transactions = vec![Record::new("x", fields)];
        assert_eq!(totals(&transactions).unwrap(), Totals::default());
    }

    #[test]
    fn test_totals_overflow_is_an_error() {
        let transactions = vec![
            tx("1", "2025-10-01", "79228162514264337593543950335", "Ingreso"),
            tx("2", "2025-10-02", "1", "Ingreso"),
        ];
        let err = totals(&transactions).unwrap_err();
        assert_eq!(err.kind(), "Overflow");
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_account_total() {
        let mut a = Fields::new();
        a.insert(CURRENT_BALANCE_STR.into(), Value::Number(dec("100.25")));
        let mut b = Fields::new();
        b.insert(CURRENT_BALANCE_STR.into(), Value::Number(dec("-40")));
        let c = Fields::new();
        let accounts = vec![Record::new("a", a), Record::new("b", b), Record::new("c", c)];
        assert_eq!(account_total(&accounts).unwrap(), dec("60.25"));
    }

    #[test]
    fn test_account_total_overflow_is_an_error() {
        let accounts: Vec<Record> = (0..2)
            .map(|i| {
                let mut f = Fields::new();
                f.insert(CURRENT_BALANCE_STR.into(), Value::Number(Decimal::MAX));
                Record::new(format!("acc-{i}"), f)
            })
            .collect();
        assert!(matches!(account_total(&accounts), Err(Error::Overflow(_))));
    }

    #[test]
    fn test_investment_totals() {
        let inv = |id: &str, invested: &str, current: &str| {
            let mut f = Fields::new();
            f.insert(INVESTED_AMOUNT_STR.into(), Value::Number(dec(invested)));
            f.insert(CURRENT_VALUE_STR.into(), Value::Number(dec(current)));
            Record::new(id, f)
        };
        let totals =
            investment_totals(&[inv("a", "1000", "1100"), inv("b", "500", "450")]).unwrap();
        assert_eq!(totals.invested, dec("1500"));
        assert_eq!(totals.current, dec("1550"));
        assert_eq!(totals.gain, dec("50"));
    }

    #[test]
    fn test_recent_by_identifier() {
        let transactions = vec![
            tx("rec1", "2025-10-09", "1", "Gasto"),
            tx("rec3", "2025-10-01", "1", "Gasto"),
            tx("rec2", "2025-10-05", "1", "Gasto"),
        ];
        let recent = recent(&transactions, 2, RecencyOrder::Identifier);
        assert_eq!(ids(&recent), vec!["rec3", "rec2"]);
    }

    #[test]
    fn test_recent_by_date() {
        let transactions = vec![
            tx("a", "2025-10-01", "1", "Gasto"),
            tx("b", "not a date", "1", "Gasto"),
            tx("c", "10/20/2025", "1", "Gasto"),
            tx("d", "2025-10-05", "1", "Gasto"),
        ];
        let recent = recent(&transactions, 10, RecencyOrder::Date);
        assert_eq!(ids(&recent), vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress(dec("25"), dec("200")), Some(dec("12.5")));
        assert_eq!(progress(dec("25"), Decimal::ZERO), None);
        assert_eq!(progress(dec("300"), dec("200")), Some(dec("150")));
    }

    #[test]
    fn test_progress_out_of_range_is_none() {
        assert_eq!(progress(dec("10000000000000000000000000"), dec("0.001")), None);
        assert_eq!(progress(Decimal::MAX, dec("0.5")), None);

        let mut fields = Fields::new();
        fields.insert(GOAL_NAME_STR.into(), Value::Text("Moon".into()));
        fields.insert(CURRENT_AMOUNT_STR.into(), Value::Number(dec("10000000000000000000000000")));
        fields.insert(TARGET_AMOUNT_STR.into(), Value::Number(dec("0.001")));
        let goals = goal_progress(&[Record::new("goal-x", fields)]);
        assert_eq!(goals[0].percent, None);
    }

    #[test]
    fn test_debt_repayment() {
        let mut fields = Fields::new();
        fields.insert(CREDITOR_STR.into(), Value::Text("Banco".into()));
        fields.insert(TOTAL_AMOUNT_STR.into(), Value::Number(dec("2400000")));
        fields.insert(REMAINING_BALANCE_STR.into(), Value::Number(dec("1600000")));
        let debts = debt_repayment(&[Record::new("debt-1", fields)]).unwrap();
        assert_eq!(debts[0].name, "Banco");
        assert_eq!(debts[0].current, dec("800000"));
        assert_eq!(debts[0].percent.map(|p| p.round_dp(2)), Some(dec("33.33")));
    }

    #[test]
    fn test_currency_format() {
        assert_eq!(Currency::Clp.format(dec("1234567")), "$1.234.567");
        assert_eq!(Currency::Clp.format(dec("-15000")), "-$15.000");
        assert_eq!(Currency::Clp.format(dec("999.6")), "$1.000");
        assert_eq!(Currency::Clp.format(Decimal::ZERO), "$0");
        assert_eq!(Currency::Usd.format(dec("-1234.5")), "-$1,234.50");
    }

    #[tokio::test]
    async fn test_summarize_seeded_store() {
        let mut gateway = GatewayImpl::new(Box::new(TestStore::default()));
        let options = SummaryOptions {
            recent: RECENT_COUNT,
            order: RecencyOrder::Date,
            currency: Currency::Clp,
        };
        let summary = summarize(&mut gateway, options).await.unwrap();
        assert_eq!(summary.income, "$1.970.000");
        assert_eq!(summary.expense, "$677.720");
        assert_eq!(summary.balance, "$1.292.280");
        assert_eq!(summary.account_balance, "$1.114.410");
        assert_eq!(summary.invested, "$1.500.000");
        assert_eq!(summary.investment_value, "$1.541.400");
        assert_eq!(summary.investment_gain, "$41.400");
        assert_eq!(summary.recent.len(), RECENT_COUNT);
        assert_eq!(summary.recent[0].id(), Some("tx-007"));
        assert_eq!(summary.goals[0].percent.as_deref(), Some("40.0%"));
        assert_eq!(summary.budgets.len(), 3);
        assert_eq!(summary.debts[0].current, "$800.000");
    }
}
