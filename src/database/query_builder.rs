use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{Encode, FromRow, PgConnection, Postgres, Type};

use crate::database::manager::DatabaseError;

type Binder<'a> = Box<dyn FnOnce(&mut PgArguments) + Send + 'a>;

/// Builds `UPDATE <table> SET a = $1, ... WHERE <key> = $n RETURNING *` from
/// the fields that are actually present, so PATCH-style handlers only touch
/// the columns the client sent.
pub struct UpdateBuilder<'a> {
    table_name: &'static str,
    key_column: &'static str,
    columns: Vec<&'static str>,
    binders: Vec<Binder<'a>>,
}

impl<'a> UpdateBuilder<'a> {
    pub fn new(table_name: &'static str, key_column: &'static str) -> Result<Self, DatabaseError> {
        validate_identifier(table_name)?;
        validate_identifier(key_column)?;
        Ok(Self {
            table_name,
            key_column,
            columns: Vec::new(),
            binders: Vec::new(),
        })
    }

    /// Add `column = value`
    pub fn set<T>(mut self, column: &'static str, value: T) -> Result<Self, DatabaseError>
    where
        T: 'a + Send + Encode<'a, Postgres> + Type<Postgres>,
    {
        validate_identifier(column)?;
        if self.columns.contains(&column) {
            return Err(DatabaseError::QueryError(format!("column '{}' set twice", column)));
        }
        self.columns.push(column);
        self.binders.push(Box::new(move |args: &mut PgArguments| {
            use sqlx::Arguments;
            args.add(value);
        }));
        Ok(self)
    }

    /// Add `column = value` only when the value is present
    pub fn set_opt<T>(self, column: &'static str, value: Option<T>) -> Result<Self, DatabaseError>
    where
        T: 'a + Send + Encode<'a, Postgres> + Type<Postgres>,
    {
        match value {
            Some(v) => self.set(column, v),
            None => Ok(self),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn to_sql(&self) -> String {
        let mut assignments: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("\"{}\" = ${}", column, i + 1))
            .collect();
        assignments.push("\"updated_at\" = NOW()".to_string());
        format!(
            "UPDATE \"{}\" SET {} WHERE \"{}\" = ${} RETURNING *",
            self.table_name,
            assignments.join(", "),
            self.key_column,
            self.columns.len() + 1
        )
    }

    /// Run the update; returns `None` when no row matched the key. Callers
    /// should check `is_empty()` first and re-read the row instead.
    pub async fn fetch_optional<T, K>(self, conn: &mut PgConnection, key: K) -> Result<Option<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        K: 'a + Send + Encode<'a, Postgres> + Type<Postgres>,
    {
        if self.is_empty() {
            return Err(DatabaseError::QueryError("update with no columns".to_string()));
        }

        let sql = self.to_sql();
        let mut args = PgArguments::default();
        for binder in self.binders {
            binder(&mut args);
        }
        {
            use sqlx::Arguments;
            args.add(key);
        }

        let query: QueryAs<'_, Postgres, T, PgArguments> = sqlx::query_as_with(&sql, args);
        let row = query.fetch_optional(conn).await?;
        Ok(row)
    }
}

fn validate_identifier(name: &str) -> Result<(), DatabaseError> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name.chars().next().is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DatabaseError::QueryError(format!("invalid identifier: {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_numbered_assignments() {
        let builder = UpdateBuilder::new("users", "user_id")
            .unwrap()
            .set("first_name", "Ana".to_string())
            .unwrap()
            .set_opt::<String>("last_name", None)
            .unwrap()
            .set("enable_notifications", false)
            .unwrap();

        assert_eq!(
            builder.to_sql(),
            "UPDATE \"users\" SET \"first_name\" = $1, \"enable_notifications\" = $2, \"updated_at\" = NOW() WHERE \"user_id\" = $3 RETURNING *"
        );
    }

    #[test]
    fn rejects_bad_identifiers_and_duplicates() {
        assert!(UpdateBuilder::new("users; DROP TABLE users", "user_id").is_err());

        let builder = UpdateBuilder::new("dates", "date_id").unwrap().set("status", 1i32).unwrap();
        assert!(builder.set("status", 2i32).is_err());
    }

    #[test]
    fn empty_builder_reports_empty() {
        let builder = UpdateBuilder::new("calendar_day", "calendar_id").unwrap();
        assert!(builder.is_empty());
    }
}
