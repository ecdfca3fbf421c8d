pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Splits a SQL script on `;`, ignoring separators inside quoted text or identifiers.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut prev = '\0';

    for ch in sql.chars() {
        match ch {
            '\'' if !in_double_quote && prev != '\\' => {
                in_single_quote = !in_single_quote;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
            }
            ';' if !in_single_quote && !in_double_quote => {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
                prev = ch;
                continue;
            }
            _ => {}
        }

        current.push(ch);
        prev = ch;
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

/// Drops `--` comment lines so a statement that only carried comments becomes empty.
pub fn strip_comment_lines(statement: &str) -> String {
    statement
        .lines()
        .filter(|line| !line.trim().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolons_outside_quotes() {
        let sql = r#"CREATE TABLE "a;b" (x TEXT DEFAULT ';'); INSERT INTO t VALUES (1);"#;
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("\"a;b\""));
    }

    #[test]
    fn schema_contains_every_engine_table() {
        let statements = split_sql_statements(SCHEMA_SQL);
        for table in [
            "attempts",
            "knowledge_points",
            "questions",
            "study_plans",
            "challenge_progress",
            "class_notification_rules",
            "notifications",
            "notification_dispatches",
        ] {
            let needle = format!("\"{table}\"");
            assert!(
                statements.iter().any(|s| s.contains(&needle)),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn comment_only_statement_is_empty_after_strip() {
        assert!(strip_comment_lines("-- just a note\n  -- another").trim().is_empty());
    }
}
