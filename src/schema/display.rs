//! Spec preview tables for `--show-spec`

use crate::schema::spec::{ColumnSpec, NumericOrder, SqlType};

impl ColumnSpec {
    /// SQL type with lengths/precision for display.
    pub fn display_sql_type(&self) -> String {
        match self.sql_type {
            SqlType::Decimal => {
                if self.precision > 0 && self.scale > 0 {
                    format!("decimal({},{})", self.precision, self.scale)
                } else if self.precision > 0 {
                    format!("decimal({})", self.precision)
                } else {
                    "decimal".to_string()
                }
            }
            SqlType::Char | SqlType::Varchar | SqlType::Binary | SqlType::Varbinary => {
                if self.type_len > 0 {
                    format!("{}({})", self.sql_type.name(), self.type_len)
                } else {
                    self.sql_type.name().to_string()
                }
            }
            _ => self.sql_type.name().to_string(),
        }
    }
}

/// Render a human-readable table of derived column specs.
pub fn format_specs_table(specs: &[ColumnSpec]) -> String {
    let headers = ["Name", "Type", "Null%", "Unique", "Order", "Set"];
    let mut rows: Vec<[String; 6]> = Vec::with_capacity(specs.len());

    for spec in specs {
        let null_percent = if spec.null_percent > 0 {
            spec.null_percent.to_string()
        } else {
            "-".to_string()
        };

        let unique = if spec.is_unique { "yes" } else { "-" };

        let order = match spec.order {
            NumericOrder::Total => "total",
            NumericOrder::Partial => "partial",
            NumericOrder::Random => "random",
        };

        let set = if !spec.value_set.is_empty() {
            spec.value_set.join("|")
        } else if !spec.int_set.is_empty() {
            spec.int_set
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("|")
        } else {
            "-".to_string()
        };

        rows.push([
            spec.name.clone(),
            spec.display_sql_type(),
            null_percent,
            unique.to_string(),
            order.to_string(),
            set,
        ]);
    }

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    for (i, header) in headers.iter().enumerate() {
        out.push_str(&format!("{:<width$}  ", header, width = widths[i]));
    }
    out.push('\n');
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            out.push_str(&format!("{:<width$}  ", cell, width = widths[i]));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ddl::parse_create_table;
    use crate::schema::spec::build_specs;

    #[test]
    fn test_format_specs_table() {
        let specs = build_specs(
            &parse_create_table(
                "CREATE TABLE t (id BIGINT PRIMARY KEY, d DECIMAL(20,5), x INT COMMENT 'set=[1,2], null_percent=10');",
            )
            .unwrap(),
        )
        .unwrap();

        let table = format_specs_table(&specs);
        assert!(table.contains("Name"));
        assert!(table.contains("decimal(20,5)"));
        assert!(table.contains("yes"));
        assert!(table.contains("1|2"));
        assert_eq!(table.lines().count(), 4);
    }

    #[test]
    fn test_display_sql_type_varchar() {
        let specs =
            build_specs(&parse_create_table("CREATE TABLE t (v VARCHAR(12));").unwrap()).unwrap();
        assert_eq!(specs[0].display_sql_type(), "varchar(12)");
    }
}
