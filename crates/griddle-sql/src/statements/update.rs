use super::{args_mismatch, write_table_ref};
use crate::{RenderContext, SqlWriter, Statement, StatementArgs, StatementId};

use griddle_core::{Result, Value};

/// How the dialect spells an existence-checked INSERT-or-UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStyle {
    /// `ON CONFLICT (...) DO UPDATE SET ...` (PostgreSQL, SQLite).
    OnConflict,
    /// `ON DUPLICATE KEY UPDATE ...` (MySQL).
    OnDuplicateKey,
}

/// Renders UPDATEs for a set of changed records.
///
/// Each record's changed columns are partitioned: standard fields yield
/// one UPDATE against the primary table; every modified locale yields one
/// upsert against the i18n side table.
pub struct Update {
    upsert: UpsertStyle,
}

impl Update {
    pub fn new(upsert: UpsertStyle) -> Self {
        Self { upsert }
    }
}

impl Statement for Update {
    fn render(
        &self,
        cx: &RenderContext<'_>,
        args: &StatementArgs<'_>,
        out: &mut SqlWriter,
    ) -> Result<()> {
        let StatementArgs::Records {
            schema,
            records,
            context,
        } = *args
        else {
            return Err(args_mismatch(StatementId::Update));
        };

        let id_column = schema.id_column(cx.schemas)?;
        let id_field = id_column.field(cx.syntax);
        let i18n_table = format!("{}_i18n", schema.dbname());
        let i18n_key = format!("{}_id", schema.dbname());

        for record in records {
            if !record.is_record() || !record.has_changes() {
                continue;
            }
            let id_value = record.id().cloned().unwrap_or(Value::Null);

            let mut fields: Vec<(String, Value)> = vec![];
            for name in record.changes() {
                let Some(column) = schema.column(name) else {
                    continue;
                };
                if column.is_virtual() || column.is_translatable() {
                    continue;
                }
                let value = record.get(name).cloned().unwrap_or(Value::Null);
                fields.push((column.field(cx.syntax), column.db_store(value)));
            }

            if !fields.is_empty() {
                out.push("UPDATE ");
                write_table_ref(out, context.namespace(), schema.dbname());
                out.push(" SET ");
                for (i, (field, value)) in fields.into_iter().enumerate() {
                    if i > 0 {
                        out.push(", ");
                    }
                    out.push_ident(&field);
                    out.push(" = ");
                    out.param(value);
                }
                out.push(" WHERE ");
                out.push_ident(&id_field);
                out.push(" = ");
                out.param(id_value.clone());
                out.end_statement();
            }

            for locale in record.changed_locales() {
                let mut fields: Vec<(String, Value)> = vec![];
                for (changed_locale, name) in record.translation_changes() {
                    if changed_locale != locale {
                        continue;
                    }
                    let Some(column) = schema.column(name) else {
                        continue;
                    };
                    if !column.is_translatable() {
                        continue;
                    }
                    let value = record
                        .translations()
                        .get(locale)
                        .and_then(|values| values.get(name))
                        .cloned()
                        .unwrap_or(Value::Null);
                    fields.push((column.field(cx.syntax), column.db_store(value)));
                }
                if fields.is_empty() {
                    continue;
                }

                out.push("INSERT INTO ");
                write_table_ref(out, context.namespace(), &i18n_table);
                out.push(" (");
                out.push_ident("locale");
                out.push(", ");
                out.push_ident(&i18n_key);
                for (field, _) in &fields {
                    out.push(", ");
                    out.push_ident(field);
                }
                out.push(") VALUES (");
                out.param(Value::String(locale.to_string()));
                out.push(", ");
                out.param(id_value.clone());
                for (_, value) in &fields {
                    out.push(", ");
                    out.param(value.clone());
                }
                out.push(")");

                match self.upsert {
                    UpsertStyle::OnConflict => {
                        out.push(" ON CONFLICT (");
                        out.push_ident("locale");
                        out.push(", ");
                        out.push_ident(&i18n_key);
                        out.push(") DO UPDATE SET ");
                        for (i, (field, _)) in fields.iter().enumerate() {
                            if i > 0 {
                                out.push(", ");
                            }
                            out.push_ident(field);
                            out.push(" = ");
                            out.push_qualified("excluded", field);
                        }
                    }
                    UpsertStyle::OnDuplicateKey => {
                        out.push(" ON DUPLICATE KEY UPDATE ");
                        for (i, (field, _)) in fields.iter().enumerate() {
                            if i > 0 {
                                out.push(", ");
                            }
                            out.push_ident(field);
                            out.push(" = VALUES(");
                            out.push_ident(field);
                            out.push(")");
                        }
                    }
                }
                out.end_statement();
            }
        }

        Ok(())
    }
}
