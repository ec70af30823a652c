//! Markup builders shared by the unit tests.

pub struct FixtureQuestion<'a> {
    pub number: &'a str,
    /// Target anchor id in the appendix; the question link carries it plus one character.
    pub anchor: &'a str,
    pub prompt: &'a str,
    pub choices: &'a [&'a str],
    pub answer: &'a str,
}

pub fn chapter_markup(headings: &[&str], questions: &[FixtureQuestion<'_>]) -> String {
    let mut body = String::new();
    for h in headings {
        body.push_str(&format!("<h2>{h}</h2>\n"));
    }
    for q in questions {
        body.push_str(&question_markup(q));
    }
    for (i, q) in questions.iter().enumerate() {
        body.push_str(&format!(
            "<p class=\"ans_key{}\"><a href=\"#q{}\">{}</a>. <span>{}</span></p>\n",
            i % 3 + 1,
            q.number,
            q.number,
            q.answer
        ));
    }
    wrap(&body)
}

pub fn question_markup(q: &FixtureQuestion<'_>) -> String {
    let mut out = format!(
        "<p class=\"quiz\"><a id=\"q{}\" href=\"vol_appc.xhtml#{}a\">{}</a>. {}</p>\n\
         <ol class=\"lower-alpha\">",
        q.number, q.anchor, q.number, q.prompt
    );
    for c in q.choices {
        out.push_str(&format!("<li>{c}</li>"));
    }
    out.push_str("</ol>\n");
    out
}

/// Appendix with one quiz paragraph per `(anchor id, explanation text)`.
pub fn appendix_markup(explanations: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (anchor, text) in explanations {
        body.push_str(&format!(
            "<p class=\"quiz\"><a id=\"{anchor}\" href=\"ch.xhtml#{anchor}q\">1.</a> {text}</p>\n"
        ));
    }
    wrap(&body)
}

pub fn wrap(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\">\n\
         <head><title>t</title></head>\n<body>\n{body}</body>\n</html>\n"
    )
}
