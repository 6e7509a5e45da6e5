//! Activity log migrations - embedded SQL files
//!
//! Applied in order by `LoggingService`; each entry is (name, sql).

/// Add new migrations at the end as `NNN_description.sql`.
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
