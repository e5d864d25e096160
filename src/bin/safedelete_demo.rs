use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use lazy_static::lazy_static;
use safedelete::{
    Column, Database, DeletePolicy, DeletedFilter, MemoryStore, ModelMeta, OnDelete, Record,
    SafeDeleteAdmin, SafeDeleteConfig,
};
use serde_json::{Value, json};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

lazy_static! {
    static ref AUTHOR: ModelMeta = ModelMeta::new("author")
        .policy(DeletePolicy::SoftDeleteCascade)
        .display("name");
    static ref CATEGORY: ModelMeta = ModelMeta::new("category")
        .policy(DeletePolicy::SoftDelete)
        .unique("name")
        .display("name")
        .verbose_names("category", "categories");
    static ref ARTICLE: ModelMeta = ModelMeta::new("article")
        .policy(DeletePolicy::SoftDelete)
        .foreign_key("author_id", "author", OnDelete::Cascade)
        .foreign_key("category_id", "category", OnDelete::SetNull)
        .display("name");
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("safedelete=info".parse()?))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" => {
                println!("safedelete-demo [--config <file>]");
                println!("Runs a soft delete scenario against the in-memory store.");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = SafeDeleteConfig::load(config_path.as_deref())?;
    let db = Database::new(Arc::new(MemoryStore::new()), config);
    for meta in [&*AUTHOR, &*CATEGORY, &*ARTICLE] {
        db.register(meta.clone()).await?;
    }

    let authors = db.objects("author")?;
    let categories = db.objects("category")?;
    let articles = db.objects("article")?;

    let author = authors.create(record(json!({"name": "author 0"}))).await?;
    let category = categories.create(record(json!({"name": "category 0"}))).await?;
    for n in 0..3 {
        articles
            .create(record(json!({
                "name": format!("article {n}"),
                "author_id": author["id"],
                "category_id": category["id"],
            })))
            .await?;
    }

    db.delete("author", &author, None).await?;
    let after_delete = json!({
        "authors": authors.count().await?,
        "articles": articles.count().await?,
        "articles_with_deleted": articles.all_with_deleted().count().await?,
        "articles_deleted_only": articles.deleted_only().count().await?,
    });

    db.undelete("author", &author, None).await?;
    let after_undelete = json!({
        "authors": authors.count().await?,
        "articles": articles.count().await?,
    });

    db.delete("category", &category, None).await?;
    let admin = SafeDeleteAdmin::new(&db, "category")
        .await?
        .with_list_display(vec![Column::HighlightDeleted, Column::Deleted]);
    let listing = admin.changelist(DeletedFilter::All).await?;

    let summary = json!({
        "after_cascade_delete": after_delete,
        "after_cascade_undelete": after_undelete,
        "category_admin": listing,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
