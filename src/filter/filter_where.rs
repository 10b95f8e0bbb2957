use serde_json::Value;

use super::error::FilterError;
use super::types::{Column, ColumnKind, FilterOp, FilterWhereInfo};

pub struct FilterWhere {
    columns: &'static [Column],
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<FilterWhereInfo>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize, columns: &'static [Column]) -> Self {
        Self {
            columns,
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        columns: &'static [Column],
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index, columns);
        filter_where.build(where_data)
    }

    pub fn generate_empty() -> (String, Vec<Value>) {
        ("1=1".to_string(), vec![])
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<(String, Vec<Value>), FilterError> {
        self.param_values.clear();
        self.conditions.clear();

        self.parse_where_data(where_data)?;

        let mut sql_conditions = vec![];
        let conditions_snapshot = self.conditions.clone();
        for condition in &conditions_snapshot {
            sql_conditions.push(self.build_sql_condition(condition)?);
        }
        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        Ok((where_clause, std::mem::take(&mut self.param_values)))
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null => Ok(()),
            Value::Object(obj) => {
                for (key, value) in obj {
                    if key.starts_with('$') {
                        self.parse_logical_operator(key, value)?;
                    } else {
                        self.parse_field_condition(key, value)?;
                    }
                }
                Ok(())
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<(), FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    return Err(FilterError::InvalidOperatorData(format!("{} requires at least one clause", op)));
                }
                let mut sql_parts = Vec::new();
                for v in arr {
                    let (sql, params) = Self::generate(v, self.param_index, self.columns)?;
                    self.param_index += params.len();
                    self.param_values.extend(params);
                    sql_parts.push(format!("({})", sql));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                let combined = sql_parts.join(joiner);
                let column = if op == "$or" && sql_parts.len() > 1 { format!("({})", combined) } else { combined };
                self.conditions.push(FilterWhereInfo { column, operator: FilterOp::Raw, data: Value::Null });
                Ok(())
            }
            "$not" => {
                let (sql, params) = Self::generate(value, self.param_index, self.columns)?;
                self.param_index += params.len();
                self.param_values.extend(params);
                self.conditions.push(FilterWhereInfo { column: format!("NOT ({})", sql), operator: FilterOp::Raw, data: Value::Null });
                Ok(())
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        if let Value::Object(obj) = value {
            for (op_key, op_val) in obj {
                let operator = Self::map_operator(op_key)?;
                self.conditions.push(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() });
            }
        } else {
            // Implicit equality: { field: value }
            self.conditions.push(FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() });
        }
        Ok(())
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$any" => FilterOp::Any,
            "$null" => FilterOp::Null,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn lookup(&self, name: &str) -> Result<Column, FilterError> {
        super::Filter::validate_identifier(name).map_err(FilterError::InvalidColumn)?;
        self.columns
            .iter()
            .find(|c| c.name == name)
            .copied()
            .ok_or_else(|| FilterError::UnknownColumn(name.to_string()))
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        // Logical operators arrive already rendered
        if condition.operator == FilterOp::Raw {
            return Ok(condition.column.clone());
        }

        let column = self.lookup(&condition.column)?;
        let quoted = format!("\"{}\"", column.name);
        let lhs = column.kind.column_expr(&quoted);
        let data = condition.data.clone();

        if column.kind == ColumnKind::TextArray {
            return self.build_array_condition(&quoted, condition.operator, data);
        }

        match condition.operator {
            FilterOp::Eq if data.is_null() => Ok(format!("{} IS NULL", quoted)),
            FilterOp::Ne if data.is_null() => Ok(format!("{} IS NOT NULL", quoted)),
            FilterOp::Eq => Ok(format!("{} = {}", lhs, self.param(column.kind, data))),
            FilterOp::Ne => Ok(format!("{} <> {}", lhs, self.param(column.kind, data))),
            FilterOp::Gt => Ok(format!("{} > {}", lhs, self.param(column.kind, data))),
            FilterOp::Gte => Ok(format!("{} >= {}", lhs, self.param(column.kind, data))),
            FilterOp::Lt => Ok(format!("{} < {}", lhs, self.param(column.kind, data))),
            FilterOp::Lte => Ok(format!("{} <= {}", lhs, self.param(column.kind, data))),
            FilterOp::Like | FilterOp::ILike => {
                if !matches!(column.kind, ColumnKind::Text | ColumnKind::Enum) {
                    return Err(FilterError::InvalidOperatorData(format!("Pattern match not supported on {}", column.name)));
                }
                if !data.is_string() {
                    return Err(FilterError::InvalidOperatorData("Pattern must be a string".to_string()));
                }
                let keyword = if condition.operator == FilterOp::Like { "LIKE" } else { "ILIKE" };
                Ok(format!("{} {} {}", lhs, keyword, self.param(ColumnKind::Text, data)))
            }
            FilterOp::In | FilterOp::NIn => {
                let negate = condition.operator == FilterOp::NIn;
                let values = match data {
                    Value::Array(values) => values,
                    single => vec![single],
                };
                if values.is_empty() {
                    return Ok(if negate { "1=1".to_string() } else { "1=0".to_string() });
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(column.kind, v)).collect();
                let keyword = if negate { "NOT IN" } else { "IN" };
                Ok(format!("{} {} ({})", lhs, keyword, params.join(", ")))
            }
            FilterOp::Between => {
                match data {
                    Value::Array(mut values) if values.len() == 2 => {
                        let upper = values.pop().unwrap_or(Value::Null);
                        let lower = values.pop().unwrap_or(Value::Null);
                        let lower = self.param(column.kind, lower);
                        let upper = self.param(column.kind, upper);
                        Ok(format!("{} BETWEEN {} AND {}", lhs, lower, upper))
                    }
                    _ => Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
                }
            }
            FilterOp::Null => match data {
                Value::Bool(true) => Ok(format!("{} IS NULL", quoted)),
                Value::Bool(false) => Ok(format!("{} IS NOT NULL", quoted)),
                _ => Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string())),
            },
            FilterOp::Any => Err(FilterError::InvalidOperatorData(format!("$any requires an array column, {} is not", column.name))),
            FilterOp::Raw => Ok(condition.column.clone()),
        }
    }

    fn build_array_condition(&mut self, quoted: &str, operator: FilterOp, data: Value) -> Result<String, FilterError> {
        match operator {
            FilterOp::Eq => Ok(format!("{} = ANY({})", self.param(ColumnKind::Text, data), quoted)),
            FilterOp::Any => {
                let values = match data {
                    Value::Array(values) => values,
                    single => vec![single],
                };
                if values.is_empty() { return Ok("1=0".to_string()); }
                let params: Vec<String> = values.into_iter().map(|v| self.param(ColumnKind::Text, v)).collect();
                Ok(format!("{} && ARRAY[{}]::text[]", quoted, params.join(", ")))
            }
            FilterOp::Null => match data {
                Value::Bool(true) => Ok(format!("({} IS NULL OR cardinality({}) = 0)", quoted, quoted)),
                Value::Bool(false) => Ok(format!("cardinality({}) > 0", quoted)),
                _ => Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string())),
            },
            other => Err(FilterError::UnsupportedOperator(format!("{:?} on array column", other))),
        }
    }

    fn param(&mut self, kind: ColumnKind, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}{}", self.param_index, kind.param_cast())
    }
}
