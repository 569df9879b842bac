use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite};

/// Query-string filters for the coliving list. Only these exact keys are
/// recognized; anything else in the query string is ignored.
pub const LOCATION: &str = "location";
pub const ROOM_TYPE: &str = "room_type";
pub const MIN_PRICE: &str = "min_price";
pub const MAX_PRICE: &str = "max_price";
pub const OWNER: &str = "owner";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColivingFilter {
    pub location: Option<String>,
    pub room_type: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub owner: Option<i64>,
}

impl ColivingFilter {
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        ColivingFilter {
            location: text_param(params, LOCATION),
            // Compared verbatim; an unknown type simply matches nothing.
            room_type: text_param(params, ROOM_TYPE),
            min_price: int_param(params, MIN_PRICE),
            max_price: int_param(params, MAX_PRICE),
            owner: int_param(params, OWNER),
        }
    }

    /// Appends ` AND ...` clauses; the builder must already contain a WHERE.
    pub fn push_conditions(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(location) = &self.location {
            qb.push(" AND l.name = ").push_bind(location.clone());
        }
        if let Some(room_type) = &self.room_type {
            qb.push(" AND c.room_type = ").push_bind(room_type.clone());
        }
        if let Some(min_price) = self.min_price {
            qb.push(" AND c.price >= ").push_bind(min_price);
        }
        if let Some(max_price) = self.max_price {
            qb.push(" AND c.price <= ").push_bind(max_price);
        }
        if let Some(owner) = self.owner {
            qb.push(" AND u.telegram_id = ").push_bind(owner);
        }
    }
}

fn text_param(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn int_param(params: &HashMap<String, String>, key: &str) -> Option<i64> {
    let raw = text_param(params, key)?;
    match raw.parse::<i64>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::debug!("ignoring malformed {} filter: {:?}", key, raw);
            None
        }
    }
}
