use std::fmt::Write;

use crate::dashboard::{BarChart, Selection, Tab};
use crate::labels::Locale;
use crate::schema::SheetLayout;
use crate::table::TaxTable;

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

const STYLE: &str = "body{font-family:sans-serif;margin:2rem}\
nav a{margin-right:1rem;padding:.4rem .8rem;border-bottom:2px solid transparent;text-decoration:none}\
nav a.active{border-color:#1f77b4;font-weight:bold}\
form{margin:1rem 0}select[multiple]{min-width:20rem;min-height:10rem}\
.chart{height:480px;margin-bottom:2rem}.empty{color:#888}";

/// Escape text for element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// JSON that is safe to inline inside a `<script>` element.
fn script_json(charts: &[BarChart]) -> String {
    serde_json::to_string(charts)
        .unwrap_or_else(|_| "[]".to_string())
        .replace('<', "\\u003c")
}

fn tab_href(tab: Tab, locale: Locale) -> String {
    format!("?tab={}&lang={}", tab.as_str(), locale.as_str())
}

fn head(out: &mut String, locale: Locale) {
    let lang = match locale {
        Locale::Zh => "zh-CN",
        Locale::En => "en",
    };
    let _ = write!(
        out,
        "<!DOCTYPE html><html lang=\"{lang}\"><head><meta charset=\"utf-8\">\
         <title>{title}</title><style>{STYLE}</style>\
         <script src=\"{PLOTLY_JS}\"></script></head><body>",
        title = escape_html(locale.text().title),
    );
}

fn options<'a>(
    out: &mut String,
    values: impl IntoIterator<Item = &'a String>,
    selected: impl Fn(&str) -> bool,
    label: impl Fn(&str) -> String,
) {
    for v in values {
        let _ = write!(
            out,
            "<option value=\"{}\"{}>{}</option>",
            escape_html(v),
            if selected(v) { " selected" } else { "" },
            escape_html(&label(v)),
        );
    }
}

/// Full dashboard page for one selection.
pub fn render_page(table: &TaxTable, layout: &SheetLayout, sel: &Selection) -> String {
    let locale = sel.locale;
    let text = locale.text();
    let quarter = sel.quarter_or_first(table).unwrap_or_default();
    let charts = sel.charts(table, layout);

    let mut out = String::with_capacity(16 * 1024);
    head(&mut out, locale);
    let _ = write!(out, "<h1>{}</h1><nav>", escape_html(text.title));
    for (tab, name) in [
        (Tab::Category, text.tab_by_category),
        (Tab::State, text.tab_by_state),
    ] {
        let _ = write!(
            out,
            "<a href=\"{}\"{}>{}</a>",
            escape_html(&tab_href(tab, locale)),
            if tab == sel.tab { " class=\"active\"" } else { "" },
            escape_html(name),
        );
    }
    let other = match locale {
        Locale::Zh => Locale::En,
        Locale::En => Locale::Zh,
    };
    let _ = write!(
        out,
        "<a href=\"{}\">{}</a></nav>",
        escape_html(&tab_href(sel.tab, other)),
        match other {
            Locale::Zh => "中文",
            Locale::En => "English",
        },
    );

    let _ = write!(
        out,
        "<form method=\"get\"><input type=\"hidden\" name=\"tab\" value=\"{}\">\
         <input type=\"hidden\" name=\"lang\" value=\"{}\">\
         <label>{} <select name=\"quarter\">",
        sel.tab.as_str(),
        locale.as_str(),
        escape_html(text.pick_quarter),
    );
    options(&mut out, table.fiscal_quarters(), |q| q == quarter, str::to_string);
    out.push_str("</select></label> ");

    match sel.tab {
        Tab::Category => {
            let _ = write!(
                out,
                "<label>{} <select name=\"category\" multiple>",
                escape_html(text.pick_categories)
            );
            options(
                &mut out,
                table.tax_categories(),
                |c| sel.categories.iter().any(|s| s == c),
                |c| locale.tax_category(c),
            );
        }
        Tab::State => {
            let _ = write!(
                out,
                "<label>{} <select name=\"state\" multiple>",
                escape_html(text.pick_states)
            );
            options(
                &mut out,
                table.states(),
                |s| sel.states.iter().any(|x| x == s),
                |s| locale.state(s),
            );
        }
    }
    let _ = write!(
        out,
        "</select></label> <button type=\"submit\">{}</button></form>",
        escape_html(text.submit)
    );

    if charts.is_empty() {
        let _ = write!(out, "<p class=\"empty\">{}</p>", escape_html(text.nothing_selected));
    }
    for i in 0..charts.len() {
        let _ = write!(out, "<div class=\"chart\" id=\"chart-{i}\"></div>");
    }
    let _ = write!(
        out,
        "<script>const charts = {};\n\
         charts.forEach((c, i) => Plotly.newPlot('chart-' + i, [{{\
         type: 'bar', x: c.bars.map(b => b.label), y: c.bars.map(b => b.value),\
         text: c.bars.map(b => b.value.toFixed(2)), textposition: 'auto'}}], \
         {{title: c.title, xaxis: {{title: c.x_title}}, yaxis: {{title: c.y_title}}}}));\
         </script></body></html>",
        script_json(&charts),
    );
    out
}

/// Error page shown instead of a partial dashboard.
pub fn render_error(locale: Locale, detail: &str) -> String {
    let mut out = String::new();
    head(&mut out, locale);
    let _ = write!(
        out,
        "<h1>{}</h1><p>{}</p></body></html>",
        escape_html(locale.text().load_failed),
        escape_html(detail),
    );
    out
}
