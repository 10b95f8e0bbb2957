use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Ne,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,

    #[serde(rename = "$like")] Like,
    #[serde(rename = "$ilike")] ILike,

    #[serde(rename = "$in")] In,
    #[serde(rename = "$nin")] NIn,

    #[serde(rename = "$any")] Any,

    #[serde(rename = "$between")] Between,

    #[serde(rename = "$null")] Null,

    /// Pre-rendered SQL from a logical operator
    #[serde(skip)] Raw,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    pub select: Option<Vec<String>>,
    #[serde(rename = "where")]
    pub where_clause: Option<serde_json::Value>,
    pub order: Option<serde_json::Value>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// Storage type of a filterable column; drives casts in generated SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Enum,
    Uuid,
    Integer,
    Numeric,
    Bool,
    Date,
    Time,
    Timestamp,
    TextArray,
}

impl ColumnKind {
    /// Column expression used on the left-hand side of a comparison
    pub fn column_expr(&self, quoted: &str) -> String {
        match self {
            ColumnKind::Enum => format!("{}::text", quoted),
            _ => quoted.to_string(),
        }
    }

    /// Cast appended to a bound parameter
    pub fn param_cast(&self) -> &'static str {
        match self {
            ColumnKind::Uuid => "::uuid",
            ColumnKind::Numeric => "::numeric",
            ColumnKind::Date => "::date",
            ColumnKind::Time => "::time",
            ColumnKind::Timestamp => "::timestamptz",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<serde_json::Value>,
}
