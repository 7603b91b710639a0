use chrono::NaiveDate;
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::{QueryAs, QueryScalar};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    U64(u64),
    Date(NaiveDate),
}

/// ===============================
/// Dynamic WHERE clause
/// ===============================
#[derive(Debug, Default)]
pub struct WhereClause {
    conditions: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition with exactly one `?` placeholder.
    pub fn push(&mut self, condition: &'static str, value: SqlValue) -> &mut Self {
        self.conditions.push(condition);
        self.values.push(value);
        self
    }

    pub fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn bind_as<'q, O>(
        &'q self,
        mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    ) -> QueryAs<'q, MySql, O, MySqlArguments> {
        for value in &self.values {
            query = match value {
                SqlValue::U64(v) => query.bind(*v),
                SqlValue::Date(v) => query.bind(*v),
            };
        }
        query
    }

    pub fn bind_scalar<'q, O>(
        &'q self,
        mut query: QueryScalar<'q, MySql, O, MySqlArguments>,
    ) -> QueryScalar<'q, MySql, O, MySqlArguments> {
        for value in &self.values {
            query = match value {
                SqlValue::U64(v) => query.bind(*v),
                SqlValue::Date(v) => query.bind(*v),
            };
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_clause_renders_nothing() {
        assert_eq!(WhereClause::new().sql(), "");
    }

    #[test]
    fn joins_conditions_in_order() {
        let from = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let mut clause = WhereClause::new();
        clause
            .push("employee_id = ?", SqlValue::U64(1001))
            .push("date >= ?", SqlValue::Date(from));

        assert_eq!(clause.sql(), "WHERE employee_id = ? AND date >= ?");
        assert_eq!(
            clause.values(),
            &[SqlValue::U64(1001), SqlValue::Date(from)]
        );
    }
}
