use serde_json::{json, Value};

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{Column, FilterData, FilterOrderInfo, SqlResult};

pub struct Filter {
    table_name: String,
    columns: &'static [Column],
    select_columns: Vec<String>,
    where_data: Vec<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>, columns: &'static [Column]) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_identifier(&table_name).map_err(FilterError::InvalidTableName)?;
        Ok(Self {
            table_name,
            columns,
            select_columns: vec![],
            where_data: vec![],
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select { self.select(select)?; }
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        match (data.limit, data.offset) {
            (Some(limit), offset) => { self.limit(limit, offset)?; }
            (None, Some(offset)) => {
                let default_limit = crate::config::CONFIG.filter.default_limit;
                self.limit(default_limit, Some(offset))?;
            }
            (None, None) => {}
        }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in &columns {
            if column == "*" { continue; }
            self.column(column)?;
        }
        self.select_columns = columns;
        Ok(self)
    }

    /// Add a condition; repeated calls are combined with AND
    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        if !conditions.is_null() {
            self.where_data.push(conditions);
        }
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        let order_info = FilterOrder::validate_and_parse(&order_spec)?;
        for info in &order_info {
            self.column(&info.column)?;
        }
        self.order_data = order_info;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        if let Some(off) = offset { if off < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }

        // Apply max limit from config
        let max_limit = crate::config::CONFIG.filter.max_limit.unwrap_or(i32::MAX);
        let applied_limit = if limit > max_limit {
            if crate::config::CONFIG.filter.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            }
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied_limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let select_clause = self.build_select_clause();
        let (where_clause, params) = self.build_where()?;
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        if crate::config::CONFIG.filter.debug_logging {
            tracing::debug!(query = %query, params = params.len(), "Filter SQL");
        }

        Ok(SqlResult { query, params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (query, params) = self.build_where()?;
        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = format!("SELECT COUNT(*) as count FROM \"{}\" WHERE {}", self.table_name, where_result.query);
        Ok(SqlResult { query, params: where_result.params })
    }

    fn build_where(&self) -> Result<(String, Vec<Value>), FilterError> {
        match self.where_data.len() {
            0 => Ok(FilterWhere::generate_empty()),
            1 => FilterWhere::generate(&self.where_data[0], 0, self.columns),
            _ => FilterWhere::generate(&json!({ "$and": self.where_data }), 0, self.columns),
        }
    }

    fn column(&self, name: &str) -> Result<&'static Column, FilterError> {
        Self::validate_identifier(name).map_err(FilterError::InvalidColumn)?;
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| FilterError::UnknownColumn(name.to_string()))
    }

    pub(crate) fn validate_identifier(name: &str) -> Result<(), String> {
        let mut chars = name.chars();
        match chars.next() {
            None => Err("Name cannot be empty".to_string()),
            Some(first) if !(first.is_ascii_alphabetic() || first == '_') => {
                Err(format!("Invalid name format: {}", name))
            }
            Some(_) if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                Err(format!("Invalid name format: {}", name))
            }
            Some(_) => Ok(()),
        }
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::ColumnKind;

    static COLUMNS: &[Column] = &[
        Column::new("id", ColumnKind::Uuid),
        Column::new("last_name", ColumnKind::Text),
        Column::new("status", ColumnKind::Enum),
        Column::new("hire_date", ColumnKind::Date),
    ];

    #[test]
    fn builds_select_with_order_and_limit() {
        let mut filter = Filter::new("employees", COLUMNS).unwrap();
        filter
            .where_clause(json!({ "status": "active" }))
            .unwrap()
            .order(json!("last_name asc"))
            .unwrap()
            .limit(10, Some(20))
            .unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"employees\" WHERE \"status\"::text = $1 ORDER BY \"last_name\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(sql.params, vec![json!("active")]);
    }

    #[test]
    fn repeated_where_clauses_are_anded() {
        let mut filter = Filter::new("employees", COLUMNS).unwrap();
        filter.where_clause(json!({ "status": "active" })).unwrap();
        filter.where_clause(json!({ "hire_date": { "$gte": "2024-01-01" } })).unwrap();

        let sql = filter.to_where_sql().unwrap();
        assert_eq!(sql.query, "(\"status\"::text = $1) AND (\"hire_date\" >= $2::date)");
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let mut filter = Filter::new("employees", COLUMNS).unwrap();
        assert!(matches!(filter.order(json!("salary desc")), Err(FilterError::UnknownColumn(_))));
        assert!(matches!(filter.select(vec!["password_hash".into()]), Err(FilterError::UnknownColumn(_))));
        assert!(matches!(
            filter.order(json!("last_name; DROP TABLE users")),
            Err(FilterError::InvalidColumn(_) | FilterError::UnknownColumn(_))
        ));
    }

    #[test]
    fn count_without_conditions_is_unrestricted() {
        let filter = Filter::new("employees", COLUMNS).unwrap();
        let sql = filter.to_count_sql().unwrap();
        assert_eq!(sql.query, "SELECT COUNT(*) as count FROM \"employees\" WHERE 1=1");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn rejects_bad_table_names() {
        assert!(Filter::new("employees;--", COLUMNS).is_err());
        assert!(Filter::new("", COLUMNS).is_err());
    }
}
