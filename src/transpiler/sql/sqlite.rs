use crate::transpiler::traits::{IgnoreSpelling, SqlGenerator};

pub struct SqliteGenerator;

impl SqlGenerator for SqliteGenerator {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn auto_increment(&self) -> &'static str {
        "autoincrement"
    }

    fn insert_ignore(&self) -> IgnoreSpelling {
        IgnoreSpelling::Prefix("insert or ignore")
    }

    // SQLite has no `default` keyword inside a values row.
    fn default_insert_value(&self) -> &'static str {
        "null"
    }
}
