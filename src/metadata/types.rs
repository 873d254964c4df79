//! Row descriptor produced by schema metadata queries.

use serde::{Deserialize, Deserializer, Serialize};

/// One column of one table, as returned by a metadata query.
///
/// Field names match the aliases of the information-schema query, so a
/// JSON dump of its result deserializes directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRow {
    #[serde(default)]
    pub table_catalog: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    pub table_name: String,
    pub column_name: String,
    #[serde(default)]
    pub ordinal_position: u32,
    #[serde(default)]
    pub default_setting: Option<String>,
    pub data_type: String,
    #[serde(default)]
    pub max_length: Option<u64>,
    #[serde(default)]
    pub date_precision: Option<u32>,
    #[serde(default = "default_nullable", deserialize_with = "flag")]
    pub is_nullable: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_primary_key: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_unique: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_foreign_key: bool,
    #[serde(default)]
    pub foreign_key_name: Option<String>,
    #[serde(default)]
    pub referenced_table_name: Option<String>,
    #[serde(default)]
    pub referenced_column_name: Option<String>,
}

impl ColumnRow {
    /// A nullable, keyless column.
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            table_catalog: None,
            owner: None,
            table_name: table_name.into(),
            column_name: column_name.into(),
            ordinal_position: 0,
            default_setting: None,
            data_type: data_type.into(),
            max_length: None,
            date_precision: None,
            is_nullable: true,
            is_primary_key: false,
            is_unique: false,
            is_foreign_key: false,
            foreign_key_name: None,
            referenced_table_name: None,
            referenced_column_name: None,
        }
    }

    pub fn position(mut self, ordinal_position: u32) -> Self {
        self.ordinal_position = ordinal_position;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn max_length(mut self, max_length: u64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Mark the column as a foreign key to `table.column`.
    pub fn references(
        mut self,
        foreign_key_name: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        self.is_foreign_key = true;
        self.foreign_key_name = Some(foreign_key_name.into());
        self.referenced_table_name = Some(table.into());
        self.referenced_column_name = Some(column.into());
        self
    }
}

/// Order rows by (table_name, ordinal_position).
///
/// The row processor never regroups rows itself; sources that cannot
/// guarantee this order should call this first. The sort is stable.
pub fn sort_rows(rows: &mut [ColumnRow]) {
    rows.sort_by(|a, b| {
        a.table_name
            .cmp(&b.table_name)
            .then(a.ordinal_position.cmp(&b.ordinal_position))
    });
}

fn default_nullable() -> bool {
    true
}

/// Accept `true`/`false` as well as the 0/1 integers information-schema
/// queries return for flags.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    })
}
