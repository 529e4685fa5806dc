use crate::transpiler::traits::{IgnoreSpelling, SqlGenerator};

pub struct PostgresGenerator;

impl SqlGenerator for PostgresGenerator {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn auto_increment(&self) -> &'static str {
        "generated by default as identity"
    }

    fn insert_ignore(&self) -> IgnoreSpelling {
        IgnoreSpelling::OnConflictDoNothing
    }
}
