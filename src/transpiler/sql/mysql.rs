use crate::ast::Value;
use crate::transpiler::traits::{IgnoreSpelling, SqlGenerator, quote_with};

pub struct MysqlGenerator;

impl SqlGenerator for MysqlGenerator {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '`', '`')
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn auto_increment(&self) -> &'static str {
        "auto_increment"
    }

    fn insert_ignore(&self) -> IgnoreSpelling {
        IgnoreSpelling::Prefix("insert ignore")
    }

    fn supports_returning(&self) -> bool {
        false
    }

    // Backslash is an escape character in MySQL string literals.
    fn literal(&self, value: &Value) -> String {
        match value {
            Value::String(s) => escape_string(s),
            Value::Json(json) => escape_string(&json.to_string()),
            Value::Bool(b) => self.bool_literal(*b).to_string(),
            other => other.to_string(),
        }
    }
}

fn escape_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}
