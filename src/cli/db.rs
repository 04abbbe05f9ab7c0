//! `webapp db`: migrations, seeding, and ad-hoc SQL from the terminal.

use crate::case;
use crate::config::ENV_DATABASE_URL;
use crate::db::Db;
use crate::store::UserStore;
use crate::web::auth::hash_password;
use anyhow::Context;
use axum::http::StatusCode;
use clap::Subcommand;
use serde_json::Value;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Subcommand)]
pub enum DbCommand {
    /// Run the database migrations
    #[command(visible_alias = "m")]
    Migrate,
    /// Seed the database with example data
    #[command(visible_alias = "sd")]
    Seed,
    /// Execute SQL commands from STDIN inside a transaction
    #[command(visible_aliases = ["exec", "e"])]
    Execute {
        /// Commit the transaction instead of rolling back
        #[arg(long)]
        commit: bool,
    },
    /// Print the results of a database query from STDIN to STDOUT
    #[command(visible_aliases = ["sel", "s"])]
    Select {
        /// Format the result set as CSV instead of JSON
        #[arg(short, long)]
        csv: bool,
        /// Separator to use for CSV output
        #[arg(short, long, default_value = ",")]
        sep: String,
    },
    /// Generate model definitions from the existing database structure
    #[command(visible_aliases = ["gen", "g"])]
    Generate {
        /// Directory receiving the generated files
        #[arg(long, default_value = "src/models")]
        out_dir: PathBuf,
    },
}

pub async fn run(command: DbCommand) -> anyhow::Result<()> {
    let db = connect().await?;
    match command {
        DbCommand::Migrate => Ok(db.migrate().await?),
        DbCommand::Seed => seed(&db).await,
        DbCommand::Execute { commit } => execute(&db, commit).await,
        DbCommand::Select { csv, sep } => select(&db, csv, &sep).await,
        DbCommand::Generate { out_dir } => generate(&db, &out_dir).await,
    }
}

async fn connect() -> anyhow::Result<Db> {
    let dburl = std::env::var(ENV_DATABASE_URL)
        .with_context(|| format!("{ENV_DATABASE_URL} is not set"))?;
    Ok(Db::connect(&dburl).await?)
}

async fn seed(db: &Db) -> anyhow::Result<()> {
    db.migrate().await?;

    let (name, password) = ("admin", "secret");
    tracing::info!("creating user {name}:{password}");
    let hash = hash_password(password)?;
    match UserStore::create(db, name, Some(hash.as_str())).await {
        Ok(_) => tracing::info!("successfully seeded database"),
        Err(e) if e.status() == StatusCode::CONFLICT => {
            tracing::warn!("user {name:?} already exists, nothing to do")
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn execute(db: &Db, commit: bool) -> anyhow::Result<()> {
    let query = read_stdin()?;
    tracing::info!("executing query:\n\n    {query}\n");

    let mut tx = db.pool.begin().await?;
    let t0 = Instant::now();
    let result = sqlx::raw_sql(&query).execute(&mut *tx).await?;
    tracing::info!("query affected {} row(s)", result.rows_affected());

    if commit {
        tx.commit().await?;
        tracing::info!("committed transaction in {:?}", t0.elapsed());
    } else {
        tx.rollback().await?;
        tracing::info!(
            "rolled back transaction in {:?} (use --commit to keep changes)",
            t0.elapsed()
        );
    }
    Ok(())
}

async fn select(db: &Db, output_csv: bool, sep: &str) -> anyhow::Result<()> {
    if output_csv && sep.len() != 1 {
        anyhow::bail!("CSV separator must be one byte long, got {sep:?}");
    }

    let query = read_stdin()?;
    tracing::info!("executing query:\n\n    {query}\n");
    let (columns, rows) = db.select_rows(&query).await?;

    if output_csv {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(sep.as_bytes()[0])
            .from_writer(std::io::stdout());
        writer.write_record(&columns)?;
        for row in &rows {
            writer.write_record(row.iter().map(csv_field))?;
        }
        writer.flush()?;
    } else {
        // One JSON object per row, keys in result-set column order.
        let mut out = std::io::stdout().lock();
        for row in &rows {
            let obj: serde_json::Map<String, Value> = columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect();
            serde_json::to_writer(&mut out, &Value::Object(obj))?;
            out.write_all(b"\n")?;
        }
    }

    tracing::info!("query returned {} row(s)", rows.len());
    Ok(())
}

fn csv_field(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn read_stdin() -> anyhow::Result<String> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf.trim().to_string())
}

/// Scaffold one model struct per public table, introspected from
/// information_schema.
async fn generate(db: &Db, out_dir: &Path) -> anyhow::Result<()> {
    let table_names: Vec<String> = sqlx::query_scalar(
        "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public'",
    )
    .fetch_all(&db.pool)
    .await?;

    std::fs::create_dir_all(out_dir)?;
    for table_name in &table_names {
        let columns: Vec<(String, String, bool)> = sqlx::query_as(
            "SELECT column_name, data_type, (is_nullable = 'YES') AS nullable \
             FROM information_schema.columns WHERE table_name = $1 ORDER BY ordinal_position",
        )
        .bind(table_name)
        .fetch_all(&db.pool)
        .await?;

        let singular = case::singularize(table_name);
        let code = model_source(&case::to_pascal_case(&singular), &columns)?;
        let filename = out_dir.join(format!("{singular}.rs"));
        std::fs::write(&filename, code)?;
        tracing::info!("wrote {:?}", filename);
    }
    Ok(())
}

fn model_source(type_name: &str, columns: &[(String, String, bool)]) -> anyhow::Result<String> {
    let mut fields = String::new();
    let mut uses_chrono = false;
    for (name, data_type, nullable) in columns {
        let rust_type = rust_type_for(data_type).with_context(|| {
            format!("unhandled postgres type {data_type:?} for column {name:?}")
        })?;
        if rust_type.contains("DateTime") {
            uses_chrono = true;
        }
        let ty = if *nullable {
            format!("Option<{rust_type}>")
        } else {
            rust_type.to_string()
        };
        fields.push_str(&format!("    pub {name}: {ty},\n"));
    }

    let chrono_use = if uses_chrono {
        "use chrono::{DateTime, Utc};\n"
    } else {
        ""
    };
    Ok(format!(
        "{chrono_use}use serde::{{Deserialize, Serialize}};\nuse sqlx::FromRow;\n\n\
         #[derive(Debug, Clone, Serialize, Deserialize, FromRow)]\n\
         pub struct {type_name} {{\n{fields}}}\n"
    ))
}

fn rust_type_for(postgres_type: &str) -> Option<&'static str> {
    match postgres_type {
        "smallint" => Some("i16"),
        "integer" => Some("i32"),
        "bigint" => Some("i64"),
        "text" | "character varying" => Some("String"),
        "boolean" => Some("bool"),
        "real" => Some("f32"),
        "double precision" => Some("f64"),
        t if t.starts_with("time") => Some("DateTime<Utc>"),
        _ => None,
    }
}
