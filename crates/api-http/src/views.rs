//! HTML Views
//!
//! Fixed page layouts for the search form and the results list. Every dynamic
//! value goes through [`escape`].

use ecommerce_search_core::application::{IndexPage, ResultsPage, SearchPage};
use ecommerce_search_core::domain::SearchHit;
use serde_json::Value;
use std::fmt::Write as _;

const TITLE: &str = "Ecommerce Search";

/// Columns shown per hit: (heading, dotted path inside `_source`)
const HIT_COLUMNS: [(&str, &str); 5] = [
    ("Customer", "customer_full_name"),
    ("Email", "email"),
    ("Products", "products.product_name"),
    ("Category", "category"),
    ("Manufacturer", "manufacturer"),
];

pub fn render_index(page: &IndexPage) -> String {
    let mut body = String::new();
    push_notice(&mut body, page.notice.as_deref());
    push_form(&mut body, "");
    layout(TITLE, &body)
}

pub fn render_results(page: &ResultsPage) -> String {
    let mut body = String::new();
    push_form(&mut body, &page.query);

    let _ = writeln!(
        body,
        "<h2>Results for &quot;{}&quot;</h2>",
        escape(&page.query)
    );

    if let Some(error) = &page.error {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", escape(error));
    } else if page.hits.is_empty() {
        body.push_str("<p class=\"empty\">No results found.</p>\n");
    } else {
        let _ = writeln!(body, "<p class=\"count\">{} result(s)</p>", page.hits.len());
        push_hits(&mut body, &page.hits);
    }

    body.push_str("<p><a href=\"/\">New search</a></p>\n");
    layout(&format!("{TITLE}: {}", page.query), &body)
}

pub fn render_search(page: &SearchPage) -> String {
    match page {
        SearchPage::Form(form) => render_index(form),
        SearchPage::Results(results) => render_results(results),
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n</head>\n<body>\n<h1>{TITLE}</h1>\n{body}</body>\n</html>\n",
        escape(title)
    )
}

fn push_notice(out: &mut String, notice: Option<&str>) {
    if let Some(notice) = notice {
        let _ = writeln!(out, "<p class=\"notice\">{}</p>", escape(notice));
    }
}

fn push_form(out: &mut String, query: &str) {
    let _ = writeln!(
        out,
        "<form action=\"/search\" method=\"get\">\
         <input type=\"text\" name=\"query\" value=\"{}\" placeholder=\"Search orders\">\
         <button type=\"submit\">Search</button></form>",
        escape(query)
    );
}

fn push_hits(out: &mut String, hits: &[SearchHit]) {
    out.push_str("<table class=\"results\">\n<tr><th>Score</th>");
    for (heading, _) in HIT_COLUMNS {
        let _ = write!(out, "<th>{heading}</th>");
    }
    out.push_str("</tr>\n");

    for hit in hits {
        let score = hit.get("_score").map(display_value).unwrap_or_default();
        let _ = write!(out, "<tr><td>{}</td>", escape(&score));
        let source = hit.get("_source").unwrap_or(&Value::Null);
        for (_, path) in HIT_COLUMNS {
            let _ = write!(out, "<td>{}</td>", escape(&field_text(source, path)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
}

/// Text of a dotted path inside a document
///
/// Arrays are traversed element-wise, so `products.product_name` yields every
/// product name joined with `, `.
pub fn field_text(doc: &Value, path: &str) -> String {
    let mut values = Vec::new();
    collect(doc, path.split('.').collect::<Vec<_>>().as_slice(), &mut values);
    values.join(", ")
}

fn collect(value: &Value, path: &[&str], out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect(item, path, out);
            }
        }
        Value::Object(map) => {
            if let Some((head, rest)) = path.split_first() {
                if let Some(next) = map.get(*head) {
                    collect(next, rest, out);
                }
            }
        }
        Value::Null => {}
        scalar if path.is_empty() => out.push(display_value(scalar)),
        _ => {}
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Escape text for HTML element content and attribute values
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
