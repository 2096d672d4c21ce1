//! Implements the `Store` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a remote store.

use crate::api::{find_row, not_found, Fetched, Store};
use crate::model::decode::{decode_row, encode_row, merge_row};
use crate::model::{Fields, RawTable, Record, Table, TableSchema};
use crate::Result;
use anyhow::Context;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{trace, warn};
use uuid::Uuid;

/// An implementation of the `Store` trait that keeps each table as a grid of cells, header row
/// first, just like a spreadsheet. By default it is seeded with sample data.
#[derive(Debug, Clone)]
pub struct TestStore {
    data: HashMap<Table, Vec<Vec<String>>>,
}

impl TestStore {
    /// Create a new `TestStore` using `data`. The map value is the grid of the table, header row
    /// first. A table with no entry reads as an empty grid.
    pub fn new(data: HashMap<Table, Vec<Vec<String>>>) -> Self {
        Self { data }
    }

    /// The current grid of `table`.
    pub fn grid(&self, table: Table) -> &[Vec<String>] {
        self.data.get(&table).map(Vec::as_slice).unwrap_or_default()
    }

    fn rows_mut(&mut self, schema: &TableSchema) -> &mut Vec<Vec<String>> {
        let grid = self
            .data
            .entry(schema.table())
            .or_insert_with(|| vec![schema.labels()]);
        if grid.is_empty() {
            grid.push(schema.labels());
        }
        grid
    }
}

#[async_trait::async_trait]
impl Store for TestStore {
    async fn fetch(&mut self, schema: &TableSchema) -> Result<Fetched> {
        trace!("fetch {}", schema.locator());
        let grid = self.grid(schema.table()).to_vec();
        Ok(Fetched::Rows(RawTable::from_grid(grid)))
    }

    async fn get(&mut self, schema: &TableSchema, id: &str) -> Result<Record> {
        let grid = self.grid(schema.table());
        let rows = grid.get(1..).unwrap_or_default();
        let ix = find_row(rows, id).ok_or_else(|| not_found(schema, id))?;
        decode_row(schema, rows[ix].clone())
    }

    async fn create(&mut self, schema: &TableSchema, fields: &Fields) -> Result<Record> {
        let id = Uuid::new_v4().to_string();
        let row = encode_row(schema, &id, fields)?;
        self.rows_mut(schema).push(row.clone());
        decode_row(schema, row)
    }

    async fn update(&mut self, schema: &TableSchema, id: &str, fields: &Fields) -> Result<Record> {
        let grid = self.rows_mut(schema);
        let ix = find_row(&grid[1..], id).ok_or_else(|| not_found(schema, id))?;
        let row = &mut grid[ix + 1];
        merge_row(schema, row, fields)?;
        decode_row(schema, row.clone())
    }

    async fn delete(&mut self, schema: &TableSchema, id: &str) -> Result<()> {
        let grid = self.rows_mut(schema);
        let ix = find_row(&grid[1..], id).ok_or_else(|| not_found(schema, id))?;
        grid.remove(ix + 1);
        Ok(())
    }
}

impl Default for TestStore {
    /// Loads seed data from this module.
    fn default() -> Self {
        Self::new(default_data())
    }
}

/// Provides the seed data from this module.
fn default_data() -> HashMap<Table, Vec<Vec<String>>> {
    let seeds = [
        (Table::Accounts, ACCOUNT_DATA),
        (Table::Transactions, TRANSACTION_DATA),
        (Table::Budgets, BUDGET_DATA),
        (Table::Goals, GOAL_DATA),
        (Table::Debts, DEBT_DATA),
        (Table::Investments, INVESTMENT_DATA),
    ];
    let mut map = HashMap::new();
    for (table, csv_data) in seeds {
        match load_csv(csv_data) {
            Ok(grid) => {
                map.insert(table, grid);
            }
            Err(e) => warn!("Unable to load seed data for {table}: {e:#}"),
        }
    }
    map
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> anyhow::Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.context("Unable to parse seed CSV")?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Seed account data.
const ACCOUNT_DATA: &str = r##"Account ID,Account Name,Current Balance
acc-001,Cuenta Corriente,"$1,250,000"
acc-002,Cuenta RUT,"$185,400"
acc-003,Tarjeta de Crédito,"-$320,990"
"##;

/// Seed transaction data.
const TRANSACTION_DATA: &str = r##"Transaction ID,Date,Description,Amount,Account,Category,Type,Frequency,Status,Notes
tx-001,2025-10-01,Sueldo,"1,850,000",Cuenta Corriente,Sueldo,Ingreso,Mensual,Cleared,
tx-002,2025-10-02,Arriendo,"-520,000",Cuenta Corriente,Vivienda,Gasto,Mensual,Cleared,
tx-003,2025-10-04,Supermercado Lider,"-87,430",Tarjeta de Crédito,Comida,Gasto,Sin periodicidad,Cleared,
tx-004,2025-10-06,Bencina Copec,"-45,000",Tarjeta de Crédito,Transporte,Gasto,Sin periodicidad,Cleared,
tx-005,2025-10-08,Netflix,"-9,990",Tarjeta de Crédito,Entretención,Gasto,Mensual,Cleared,
tx-006,2025-10-10,Venta bicicleta,"120,000",Cuenta RUT,Otros,Ingreso,Sin periodicidad,Pending,Marketplace
tx-007,2025-10-12,Farmacia,"-15,300",Cuenta RUT,Salud,Gasto,Sin periodicidad,Cleared,
"##;

/// Seed budget data.
const BUDGET_DATA: &str = r##"Budget ID,Category,Monthly Limit,Spent,Period
bud-001,Comida,"$300,000","$87,430",2025-10
bud-002,Transporte,"$80,000","$45,000",2025-10
bud-003,Entretención,"$30,000",$0,2025-10
"##;

/// Seed goal data.
const GOAL_DATA: &str = r##"Goal ID,Goal Name,Target Amount,Current Amount,Target Date
goal-001,Fondo de emergencia,"$3,000,000","$1,200,000",2026-06-30
goal-002,Vacaciones,"$900,000","$150,000",2026-01-15
"##;

/// Seed debt data.
const DEBT_DATA: &str = r##"Debt ID,Creditor,Total Amount,Remaining Balance,Interest Rate,Due Date
debt-001,Crédito de consumo,"$2,400,000","$1,600,000",1.2,2027-03-05
"##;

/// Seed investment data.
const INVESTMENT_DATA: &str = r##"Investment ID,Asset Name,Asset Type,Invested Amount,Current Value
inv-001,Fondo Mutuo Conservador,Fondo Mutuo,"$500,000","$523,400"
inv-002,Depósito a Plazo,Depósito,"$1,000,000","$1,018,000"
"##;
