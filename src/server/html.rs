//! HTML rendering of a report.

use crate::core::Report;
use axum::http::StatusCode;

const PAGE_TEMPLATE: &str = include_str!("fund.html");

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn growth_class(raw: &str) -> &'static str {
    match raw.trim().parse::<f64>() {
        Ok(v) if v > 0.0 => "up",
        Ok(v) if v < 0.0 => "down",
        _ => "flat",
    }
}

fn page(title: &str, body: &str) -> String {
    PAGE_TEMPLATE
        .replace("{{title}}", &escape(title))
        .replace("{{body}}", body)
}

pub fn render_report(report: &Report) -> String {
    let mut body = String::from(
        "<table>\n<thead><tr><th>ID</th><th>Name</th><th>Time</th><th>Est. Growth</th><th>Weight</th></tr></thead>\n<tbody>\n",
    );

    for item in &report.items {
        let quote = &item.quote;
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{}%</td><td>{}</td></tr>\n",
            escape(&quote.identifier),
            escape(&quote.display_name),
            escape(&quote.as_of),
            growth_class(&quote.change_percent),
            escape(&quote.change_percent),
            item.weight
        ));
    }

    let average_class = if report.average > 0.0 {
        "up"
    } else if report.average < 0.0 {
        "down"
    } else {
        "flat"
    };
    body.push_str(&format!(
        "</tbody>\n<tfoot><tr><td>Avg</td><td></td><td></td><td class=\"{average_class}\">{:.6}%</td><td></td></tr></tfoot>\n</table>\n",
        report.average
    ));

    if !report.failures.is_empty() {
        body.push_str("<ul class=\"failures\">\n");
        for failure in &report.failures {
            body.push_str(&format!(
                "<li>{}: {}</li>\n",
                escape(&failure.identifier),
                escape(&failure.message)
            ));
        }
        body.push_str("</ul>\n");
    }

    page("Fund estimates", &body)
}

pub fn render_error(status: StatusCode, message: &str) -> String {
    let body = format!(
        "<p class=\"error\"><strong>{}</strong> {}</p>\n",
        status.as_u16(),
        escape(message)
    );
    page("Fund estimates unavailable", &body)
}
