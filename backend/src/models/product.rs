use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Core product entity. `name` is unique across the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    /// Current stock, in `unit`s (may be fractional, e.g. kilograms)
    pub quantity: f64,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.quantity > 0.0
    }

    /// Stock value at the current price.
    pub fn stock_value(&self) -> f64 {
        self.price * self.quantity
    }

    /// Overwrite the fields present in `changes`, leaving the rest untouched.
    pub fn apply(&mut self, changes: &UpdateProduct) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(description) = &changes.description {
            self.description = Some(description.clone());
        }
        if let Some(quantity) = changes.quantity {
            self.quantity = quantity;
        }
        if let Some(unit) = &changes.unit {
            self.unit = Some(unit.clone());
        }
        self.updated_at = Utc::now();
    }
}

// ── Request payloads ─────────────────────────────────────────────────────────

/// Create body as received; required fields are checked by [`CreateProduct::validate`].
#[derive(Debug, Default, Deserialize)]
pub struct CreateProduct {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub quantity: f64,
    pub unit: Option<String>,
}

impl CreateProduct {
    pub fn validate(self) -> AppResult<NewProduct> {
        let mut problems = Vec::new();

        match self.name.as_deref() {
            None => problems.push("name is required".to_string()),
            Some(name) if name.trim().is_empty() => {
                problems.push("name must not be empty".to_string())
            }
            Some(_) => {}
        }
        match self.price {
            None => problems.push("price is required".to_string()),
            Some(price) => problems.extend(check_amount("price", price)),
        }
        match self.quantity {
            None => problems.push("quantity is required".to_string()),
            Some(quantity) => problems.extend(check_amount("quantity", quantity)),
        }

        match (self.name, self.price, self.quantity) {
            (Some(name), Some(price), Some(quantity)) if problems.is_empty() => Ok(NewProduct {
                name,
                price,
                description: self.description,
                quantity,
                unit: self.unit,
            }),
            _ => Err(validation_failed(&problems)),
        }
    }
}

/// Partial update body; absent fields keep their stored values.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

impl UpdateProduct {
    pub fn validate(self) -> AppResult<Self> {
        let mut problems = Vec::new();

        if matches!(self.name.as_deref(), Some(name) if name.trim().is_empty()) {
            problems.push("name must not be empty".to_string());
        }
        if let Some(price) = self.price {
            problems.extend(check_amount("price", price));
        }
        if let Some(quantity) = self.quantity {
            problems.extend(check_amount("quantity", quantity));
        }

        if problems.is_empty() {
            Ok(self)
        } else {
            Err(validation_failed(&problems))
        }
    }
}

fn check_amount(field: &str, value: f64) -> Option<String> {
    if !value.is_finite() {
        Some(format!("{} must be a finite number", field))
    } else if value < 0.0 {
        Some(format!("{} must be >= 0", field))
    } else {
        None
    }
}

fn validation_failed(problems: &[String]) -> AppError {
    AppError::BadRequest(format!(
        "Product validation failed: {}",
        problems.join(", ")
    ))
}

// ── Query parameters ──────────────────────────────────────────────────────────

/// `GET /products` query string. Empty values are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub name: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

/// Exact-match constraints (ANDed) plus an optional sort.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub sort: Option<SortSpec>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.name.as_ref().map_or(true, |name| &product.name == name)
            && self.price.map_or(true, |price| product.price == price)
            && self.quantity.map_or(true, |quantity| product.quantity == quantity)
    }
}

impl TryFrom<ListQuery> for ProductFilter {
    type Error = AppError;

    fn try_from(query: ListQuery) -> AppResult<Self> {
        Ok(Self {
            name: non_empty(query.name),
            price: non_empty(query.price)
                .map(|raw| parse_number("price", &raw))
                .transpose()?,
            quantity: non_empty(query.quantity)
                .map(|raw| parse_number("quantity", &raw))
                .transpose()?,
            sort: non_empty(query.sort_by)
                .map(|raw| SortSpec::parse(&raw))
                .transpose()?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_number(field: &str, raw: &str) -> AppResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::BadRequest(format!("{} must be a number, got '{}'", field, raw)))
}

// ── Sorting ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Price,
    Description,
    Quantity,
    Unit,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn from_param(param: &str) -> Option<Self> {
        match param {
            "name" => Some(Self::Name),
            "price" => Some(Self::Price),
            "description" => Some(Self::Description),
            "quantity" => Some(Self::Quantity),
            "unit" => Some(Self::Unit),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Description => "description",
            Self::Quantity => "quantity",
            Self::Unit => "unit",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// Ascending comparison; a missing optional value sorts first.
    pub fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Name => a.name.cmp(&b.name),
            Self::Price => a.price.total_cmp(&b.price),
            Self::Description => a.description.cmp(&b.description),
            Self::Quantity => a.quantity.total_cmp(&b.quantity),
            Self::Unit => a.unit.cmp(&b.unit),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Single-field sort. `sortBy=price` is ascending, `sortBy=-price` descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        let (direction, name) = match raw.strip_prefix('-') {
            Some(rest) => (SortDirection::Descending, rest),
            None => (SortDirection::Ascending, raw),
        };
        let field = SortField::from_param(name)
            .ok_or_else(|| AppError::BadRequest(format!("Cannot sort by '{}'", raw)))?;
        Ok(Self { field, direction })
    }

    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ord = self.field.compare(a, b);
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }

    /// `ORDER BY` fragment built only from whitelisted column names.
    /// Text columns use the byte-wise `"C"` collation so Postgres orders
    /// them exactly like `String`'s `Ord`.
    pub fn order_by_sql(&self) -> String {
        let column = match self.field {
            SortField::Name | SortField::Description | SortField::Unit => {
                format!("{} COLLATE \"C\"", self.field.column())
            }
            _ => self.field.column().to_string(),
        };
        match self.direction {
            SortDirection::Ascending => format!("{} ASC NULLS FIRST", column),
            SortDirection::Descending => format!("{} DESC NULLS LAST", column),
        }
    }
}
