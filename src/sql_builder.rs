//! SQL builder with parameterized query construction.
//!
//! All user-supplied values go through DuckDB's parameter binding (`?` placeholders),
//! never through string interpolation. Builder methods return `&mut Self` for chaining.
//!
//! # Example
//!
//! ```rust
//! use gas_cash::SqlBuilder;
//! let (sql, params) = SqlBuilder::new("observations")
//!     .where_eq("symbol", "XGF D1-IPG")
//!     .where_date_gte("trade_date", "2025-01-01")
//!     .order_by(&["trade_date ASC"])
//!     .limit(10)
//!     .build();
//! ```

/// Builds parameterized SQL queries safely.
///
/// Placeholders are numbered by position in the final SQL, so parameters are
/// emitted in clause order: CTEs, SELECT list, WHERE, HAVING.
pub struct SqlBuilder {
    ctes: Vec<String>,
    cte_params: Vec<String>,
    select_cols: Vec<String>,
    select_params: Vec<String>,
    is_distinct: bool,
    from_table: String,
    where_clauses: Vec<String>,
    where_params: Vec<String>,
    group_by_cols: Vec<String>,
    having_clauses: Vec<String>,
    having_params: Vec<String>,
    order_by_cols: Vec<String>,
    limit_val: Option<usize>,
}

impl SqlBuilder {
    /// Create a builder targeting the given table or view.
    pub fn new(table: &str) -> Self {
        Self {
            ctes: Vec::new(),
            cte_params: Vec::new(),
            select_cols: vec!["*".to_string()],
            select_params: Vec::new(),
            is_distinct: false,
            from_table: table.to_string(),
            where_clauses: Vec::new(),
            where_params: Vec::new(),
            group_by_cols: Vec::new(),
            having_clauses: Vec::new(),
            having_params: Vec::new(),
            order_by_cols: Vec::new(),
            limit_val: None,
        }
    }

    /// Create a builder selecting from a parenthesized subquery with an alias.
    ///
    /// The subquery must not contain placeholders; use [`with`](Self::with)
    /// for parameterized inputs.
    pub fn from_subquery(subquery: &str, alias: &str) -> Self {
        Self::new(&format!("({}) {}", subquery, alias))
    }

    /// Add a common table expression: `WITH {name} AS ({sql})`.
    ///
    /// `params` are the values bound by placeholders inside `sql`.
    pub fn with(&mut self, name: &str, sql: &str, params: &[String]) -> &mut Self {
        self.ctes.push(format!("{} AS (\n{}\n)", name, sql));
        self.cte_params.extend(params.iter().cloned());
        self
    }

    /// Set the columns to select (replaces the default `*`).
    pub fn select(&mut self, cols: &[&str]) -> &mut Self {
        self.select_cols = cols.iter().map(|c| c.to_string()).collect();
        self.select_params.clear();
        self
    }

    /// Append a select expression carrying its own `?` placeholders.
    ///
    /// The first call replaces the default `*`.
    pub fn select_expr(&mut self, expr: &str, params: &[&str]) -> &mut Self {
        if self.select_cols.len() == 1 && self.select_cols[0] == "*" && self.select_params.is_empty() {
            self.select_cols.clear();
        }
        self.select_cols.push(expr.to_string());
        self.select_params.extend(params.iter().map(|p| p.to_string()));
        self
    }

    /// Add DISTINCT to the SELECT clause.
    pub fn distinct(&mut self) -> &mut Self {
        self.is_distinct = true;
        self
    }

    /// Add a WHERE condition with `?` placeholders for each param.
    pub fn where_clause(&mut self, condition: &str, params: &[&str]) -> &mut Self {
        self.where_clauses.push(condition.to_string());
        self.where_params.extend(params.iter().map(|p| p.to_string()));
        self
    }

    /// Add a NOT IN condition with parameterized values.
    ///
    /// Empty values list adds no condition.
    pub fn where_not_in(&mut self, column: &str, values: &[&str]) -> &mut Self {
        if values.is_empty() {
            return self;
        }
        let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
        self.where_clauses
            .push(format!("{} NOT IN ({})", column, placeholders.join(", ")));
        self.where_params.extend(values.iter().map(|v| v.to_string()));
        self
    }

    /// Add an equality condition: `{column} = ?`.
    pub fn where_eq(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses.push(format!("{} = ?", column));
        self.where_params.push(value.to_string());
        self
    }

    /// Add a lower date bound: `{column} >= CAST(? AS DATE)`.
    pub fn where_date_gte(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses
            .push(format!("{} >= CAST(? AS DATE)", column));
        self.where_params.push(value.to_string());
        self
    }

    /// Add an upper date bound: `{column} <= CAST(? AS DATE)`.
    pub fn where_date_lte(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses
            .push(format!("{} <= CAST(? AS DATE)", column));
        self.where_params.push(value.to_string());
        self
    }

    /// Add GROUP BY columns.
    pub fn group_by(&mut self, cols: &[&str]) -> &mut Self {
        self.group_by_cols.extend(cols.iter().map(|c| c.to_string()));
        self
    }

    /// Add a HAVING condition with `?` placeholders.
    pub fn having(&mut self, condition: &str, params: &[&str]) -> &mut Self {
        self.having_clauses.push(condition.to_string());
        self.having_params.extend(params.iter().map(|p| p.to_string()));
        self
    }

    /// Add ORDER BY clauses (e.g. `"trade_date DESC"`).
    pub fn order_by(&mut self, clauses: &[&str]) -> &mut Self {
        self.order_by_cols.extend(clauses.iter().map(|c| c.to_string()));
        self
    }

    /// Set the maximum number of rows to return.
    pub fn limit(&mut self, n: usize) -> &mut Self {
        self.limit_val = Some(n);
        self
    }

    /// Build the final SQL string and parameter list.
    ///
    /// Returns a tuple of `(sql_string, params_list)` ready for execution.
    pub fn build(&self) -> (String, Vec<String>) {
        let distinct = if self.is_distinct { "DISTINCT " } else { "" };
        let cols = self.select_cols.join(", ");
        let mut parts = Vec::new();

        if !self.ctes.is_empty() {
            parts.push(format!("WITH {}", self.ctes.join(",\n")));
        }

        parts.push(format!("SELECT {}{}", distinct, cols));
        parts.push(format!("FROM {}", self.from_table));

        if !self.where_clauses.is_empty() {
            parts.push(format!("WHERE {}", self.where_clauses.join(" AND ")));
        }

        if !self.group_by_cols.is_empty() {
            parts.push(format!("GROUP BY {}", self.group_by_cols.join(", ")));
        }

        if !self.having_clauses.is_empty() {
            parts.push(format!("HAVING {}", self.having_clauses.join(" AND ")));
        }

        if !self.order_by_cols.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by_cols.join(", ")));
        }

        if let Some(n) = self.limit_val {
            parts.push(format!("LIMIT {}", n));
        }

        let mut params = Vec::with_capacity(
            self.cte_params.len()
                + self.select_params.len()
                + self.where_params.len()
                + self.having_params.len(),
        );
        params.extend(self.cte_params.iter().cloned());
        params.extend(self.select_params.iter().cloned());
        params.extend(self.where_params.iter().cloned());
        params.extend(self.having_params.iter().cloned());

        (parts.join("\n"), params)
    }
}
