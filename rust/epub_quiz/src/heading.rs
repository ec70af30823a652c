use crate::dom::{normalize_text, ClassFilter, Document};

/// All `<h2>` texts of a chapter joined into one `## ` line, followed by a
/// blank line. A chapter without headings yields a bare `##`.
pub fn chapter_heading(doc: &Document) -> String {
    let mut out = String::from("## ");
    for h2 in doc.find_all("h2", ClassFilter::Any) {
        out.push_str(&normalize_text(&h2.text()));
        out.push(' ');
    }
    format!("{}\n\n", out.trim())
}
