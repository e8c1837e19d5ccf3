//! Open net positions.

use serde::{Deserialize, Serialize};

/// One open net position row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRow {
    #[serde(rename = "tradingsymbol")]
    pub trading_symbol: String,
    pub exchange: String,
    pub product: String,
    /// Signed quantity: positive for long, negative for short.
    pub quantity: i64,
}

impl PositionRow {
    /// Same instrument identity (symbol, exchange, product).
    pub fn is_instrument(&self, trading_symbol: &str, exchange: &str, product: &str) -> bool {
        self.trading_symbol == trading_symbol && self.exchange == exchange && self.product == product
    }

    /// Absolute open quantity.
    pub fn open_quantity(&self) -> u64 {
        self.quantity.unsigned_abs()
    }
}

/// Net positions for the account, fetched fresh for each watch invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionSnapshot {
    rows: Vec<PositionRow>,
}

impl PositionSnapshot {
    pub fn new(rows: Vec<PositionRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PositionRow] {
        &self.rows
    }

    /// First row for the instrument whose absolute quantity covers `min_quantity`.
    pub fn find_covering(
        &self,
        trading_symbol: &str,
        exchange: &str,
        product: &str,
        min_quantity: u64,
    ) -> Option<&PositionRow> {
        self.rows.iter().find(|row| {
            row.is_instrument(trading_symbol, exchange, product)
                && row.open_quantity() >= min_quantity
        })
    }
}

impl From<Vec<PositionRow>> for PositionSnapshot {
    fn from(rows: Vec<PositionRow>) -> Self {
        Self::new(rows)
    }
}
