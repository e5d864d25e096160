use crate::db::Record;
use crate::schema::ModelMeta;


pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Display value of the row, wrapped in `<span class="deleted">` when soft deleted.
pub fn highlight_deleted(meta: &ModelMeta, record: &Record) -> String {
    let shown = escape_html(&meta.display_value(record));
    if meta.is_deleted(record) {
        format!("<span class=\"deleted\">{shown}</span>")
    } else {
        shown
    }
}

/// Contents of the marker column: its timestamp, or `-` for alive rows.
pub fn deleted_column(meta: &ModelMeta, record: &Record) -> String {
    match meta.marker_of(record).as_str() {
        Some(at) => escape_html(at),
        None => "-".to_string(),
    }
}

pub fn field_column(record: &Record, field: &str) -> String {
    match record.get(field) {
        Some(serde_json::Value::String(s)) => escape_html(s),
        Some(serde_json::Value::Null) | None => "-".to_string(),
        Some(other) => escape_html(&other.to_string()),
    }
}
