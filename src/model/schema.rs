//! The registry of tables the dashboard knows about.
//!
//! Each table has an exact, ordered list of header labels. The store is schema-less (rows of
//! text), so comparing the observed header with these labels is the only structural check
//! available before data is served.

use crate::model::CategoryKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the values of a column are coerced.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Category(CategoryKind),
}

/// One column of a table: its header label and the kind of values it holds.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Column {
    label: &'static str,
    kind: FieldKind,
}

impl Column {
    const fn new(label: &'static str, kind: FieldKind) -> Self {
        Self { label, kind }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// Names the amount field whose sign follows the type field.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SignRule {
    pub amount: &'static str,
    pub kind: &'static str,
}

/// The logical tables.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Table {
    Accounts,
    Transactions,
    Budgets,
    Goals,
    Debts,
    Investments,
}

serde_plain::derive_display_from_serialize!(Table);
serde_plain::derive_fromstr_from_deserialize!(Table);

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Accounts,
        Table::Transactions,
        Table::Budgets,
        Table::Goals,
        Table::Debts,
        Table::Investments,
    ];

    pub fn schema(&self) -> &'static TableSchema {
        match self {
            Table::Accounts => &ACCOUNTS,
            Table::Transactions => &TRANSACTIONS,
            Table::Budgets => &BUDGETS,
            Table::Goals => &GOALS,
            Table::Debts => &DEBTS,
            Table::Investments => &INVESTMENTS,
        }
    }
}

/// The expected shape of one table. The first column always holds the record identifier.
#[derive(Debug, Eq, PartialEq)]
pub struct TableSchema {
    table: Table,
    locator: &'static str,
    columns: &'static [Column],
    sign_rule: Option<SignRule>,
}

impl TableSchema {
    pub fn table(&self) -> Table {
        self.table
    }

    /// The table name as the store knows it, e.g. `Transactions`.
    pub fn name(&self) -> String {
        self.table.to_string()
    }

    /// The opaque cell range handed to the store, e.g. `Accounts!A:C`.
    pub fn locator(&self) -> &'static str {
        self.locator
    }

    /// The sheet (tab) part of the locator.
    pub fn sheet_name(&self) -> &'static str {
        self.locator.split('!').next().unwrap_or(self.locator)
    }

    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    /// The expected header row.
    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.to_string()).collect()
    }

    pub fn column(&self, label: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.label == label)
    }

    /// The label of the column that holds the record identifier.
    pub fn id_label(&self) -> &'static str {
        self.columns[0].label
    }

    pub fn sign_rule(&self) -> Option<SignRule> {
        self.sign_rule
    }
}

/// Finds the schema registered under `name`.
pub fn lookup(name: &str) -> Result<&'static TableSchema> {
    Table::from_str(name)
        .map(|t| t.schema())
        .map_err(|_| Error::UnknownTable(name.to_string()))
}

pub const ACCOUNT_ID_STR: &str = "Account ID";
pub const ACCOUNT_NAME_STR: &str = "Account Name";
pub const CURRENT_BALANCE_STR: &str = "Current Balance";

pub const TRANSACTION_ID_STR: &str = "Transaction ID";
pub const DATE_STR: &str = "Date";
pub const DESCRIPTION_STR: &str = "Description";
pub const AMOUNT_STR: &str = "Amount";
pub const ACCOUNT_STR: &str = "Account";
pub const CATEGORY_STR: &str = "Category";
pub const TYPE_STR: &str = "Type";
pub const FREQUENCY_STR: &str = "Frequency";
pub const STATUS_STR: &str = "Status";
pub const NOTES_STR: &str = "Notes";

pub const BUDGET_ID_STR: &str = "Budget ID";
pub const MONTHLY_LIMIT_STR: &str = "Monthly Limit";
pub const SPENT_STR: &str = "Spent";
pub const PERIOD_STR: &str = "Period";

pub const GOAL_ID_STR: &str = "Goal ID";
pub const GOAL_NAME_STR: &str = "Goal Name";
pub const TARGET_AMOUNT_STR: &str = "Target Amount";
pub const CURRENT_AMOUNT_STR: &str = "Current Amount";
pub const TARGET_DATE_STR: &str = "Target Date";

pub const DEBT_ID_STR: &str = "Debt ID";
pub const CREDITOR_STR: &str = "Creditor";
pub const TOTAL_AMOUNT_STR: &str = "Total Amount";
pub const REMAINING_BALANCE_STR: &str = "Remaining Balance";
pub const INTEREST_RATE_STR: &str = "Interest Rate";
pub const DUE_DATE_STR: &str = "Due Date";

pub const INVESTMENT_ID_STR: &str = "Investment ID";
pub const ASSET_NAME_STR: &str = "Asset Name";
pub const ASSET_TYPE_STR: &str = "Asset Type";
pub const INVESTED_AMOUNT_STR: &str = "Invested Amount";
pub const CURRENT_VALUE_STR: &str = "Current Value";

use FieldKind::{Date, Number, Text};

static ACCOUNTS: TableSchema = TableSchema {
    table: Table::Accounts,
    locator: "Accounts!A:C",
    columns: &[
        Column::new(ACCOUNT_ID_STR, Text),
        Column::new(ACCOUNT_NAME_STR, Text),
        Column::new(CURRENT_BALANCE_STR, Number),
    ],
    sign_rule: None,
};

static TRANSACTIONS: TableSchema = TableSchema {
    table: Table::Transactions,
    locator: "Transactions!A:J",
    columns: &[
        Column::new(TRANSACTION_ID_STR, Text),
        Column::new(DATE_STR, Date),
        Column::new(DESCRIPTION_STR, Text),
        Column::new(AMOUNT_STR, Number),
        Column::new(ACCOUNT_STR, Text),
        Column::new(CATEGORY_STR, Text),
        Column::new(
            TYPE_STR,
            FieldKind::Category(CategoryKind::TransactionType),
        ),
        Column::new(FREQUENCY_STR, FieldKind::Category(CategoryKind::Frequency)),
        Column::new(STATUS_STR, Text),
        Column::new(NOTES_STR, Text),
    ],
    sign_rule: Some(SignRule {
        amount: AMOUNT_STR,
        kind: TYPE_STR,
    }),
};

static BUDGETS: TableSchema = TableSchema {
    table: Table::Budgets,
    locator: "Budgets!A:E",
    columns: &[
        Column::new(BUDGET_ID_STR, Text),
        Column::new(CATEGORY_STR, Text),
        Column::new(MONTHLY_LIMIT_STR, Number),
        Column::new(SPENT_STR, Number),
        Column::new(PERIOD_STR, Text),
    ],
    sign_rule: None,
};

static GOALS: TableSchema = TableSchema {
    table: Table::Goals,
    locator: "Goals!A:E",
    columns: &[
        Column::new(GOAL_ID_STR, Text),
        Column::new(GOAL_NAME_STR, Text),
        Column::new(TARGET_AMOUNT_STR, Number),
        Column::new(CURRENT_AMOUNT_STR, Number),
        Column::new(TARGET_DATE_STR, Date),
    ],
    sign_rule: None,
};

static DEBTS: TableSchema = TableSchema {
    table: Table::Debts,
    locator: "Debts!A:F",
    columns: &[
        Column::new(DEBT_ID_STR, Text),
        Column::new(CREDITOR_STR, Text),
        Column::new(TOTAL_AMOUNT_STR, Number),
        Column::new(REMAINING_BALANCE_STR, Number),
        Column::new(INTEREST_RATE_STR, Number),
        Column::new(DUE_DATE_STR, Date),
    ],
    sign_rule: None,
};

static INVESTMENTS: TableSchema = TableSchema {
    table: Table::Investments,
    locator: "Investments!A:E",
    columns: &[
        Column::new(INVESTMENT_ID_STR, Text),
        Column::new(ASSET_NAME_STR, Text),
        Column::new(ASSET_TYPE_STR, Text),
        Column::new(INVESTED_AMOUNT_STR, Number),
        Column::new(CURRENT_VALUE_STR, Number),
    ],
    sign_rule: None,
};
