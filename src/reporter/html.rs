//! HTML reporter: renders a [`ReportDocument`] as one self-contained page
//!
//! The stylesheet and the sort/filter script are embedded so the file opens
//! standalone. Rows are plain table rows; ordering and filtering in the
//! browser are left to the embedded script.

use super::document::{DebugPanel, LogLine, ReportDocument, ReportRow};
use super::markup::{el, to_document, Element, Node, ReportEncoding};
use super::{ensure_parent_dir, ReportError};
use std::fs;
use std::path::Path;
use tracing::info;

/// Marker class carried by every results row
const ROW_MARKER: &str = "results-table-row";

/// Outcome filters offered above the table, in display order
const FILTERS: [(&str, &str); 4] = [
    ("passed", "Passed"),
    ("skipped", "Skipped"),
    ("failure", "Failed"),
    ("error", "Errors"),
];

/// Reporter that renders the results page
pub struct HtmlReporter {
    encoding: ReportEncoding,
    filters: bool,
}

impl HtmlReporter {
    pub fn new() -> Self {
        Self {
            encoding: ReportEncoding::Utf8,
            filters: true,
        }
    }

    pub fn with_encoding(mut self, encoding: ReportEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Leave out the outcome checkboxes
    pub fn without_filters(mut self) -> Self {
        self.filters = false;
        self
    }

    /// Full page as a markup tree
    pub fn tree(&self, doc: &ReportDocument) -> Element {
        el("html")
            .child(
                el("head")
                    .child(el("meta").attr("charset", self.encoding.charset()))
                    .child(el("title").text("Test Report"))
                    .child(el("style").raw(STYLE)),
            )
            .child(self.body(doc))
    }

    /// Serialize the page
    pub fn render(&self, doc: &ReportDocument) -> String {
        to_document(&self.tree(doc), self.encoding)
    }

    /// Render to `path`, creating missing parent directories
    pub fn write(&self, doc: &ReportDocument, path: &Path) -> Result<(), ReportError> {
        ensure_parent_dir(path)?;
        let html = self.render(doc);
        fs::write(path, html).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            rows = doc.rows.len(),
            "html report written"
        );
        Ok(())
    }

    fn body(&self, doc: &ReportDocument) -> Element {
        let generated = format!(
            "Report generated on {} at {}",
            doc.generated.format("%d-%b-%Y"),
            doc.generated.format("%H:%M:%S")
        );
        let s = &doc.summary;

        let mut body = el("body")
            .child(el("p").text(generated))
            .child(el("h2").text("Summary"))
            .child(
                el("p")
                    .class("summary")
                    .text(format!(
                        "{} tests ran in {} seconds.",
                        s.tests,
                        s.elapsed.as_secs()
                    ))
                    .child(el("br"))
                    .child(el("span").class("passed").text(format!("{} passed", s.passed)))
                    .text(", ")
                    .child(el("span").class("failed").text(format!("{} failed", s.failed)))
                    .text(", ")
                    .child(el("span").class("skipped").text(format!("{} skipped", s.skipped)))
                    .text(", ")
                    .child(el("span").class("error").text(format!("{} error", s.errors)))
                    .child(el("br")),
            )
            .child(el("h2").text("Results"));

        if self.filters {
            body.push(filter_bar());
        }

        body.child(results_table(&doc.rows))
            .child(el("script").raw(SCRIPT))
    }
}

impl Default for HtmlReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_bar() -> Element {
    el("div").attr("id", "filters").children(FILTERS.iter().map(|(label, title)| {
        el("label")
            .child(
                el("input")
                    .attr("type", "checkbox")
                    .class("filter")
                    .attr("data-label", *label)
                    .attr("checked", "checked"),
            )
            .text(format!(" {}", title))
    }))
}

fn results_table(rows: &[ReportRow]) -> Element {
    let sortable = |title: &str, col: &str, numeric: bool| {
        el("th")
            .class(if numeric { "sortable numeric" } else { "sortable" })
            .attr("data-col", col)
            .text(title)
    };
    let head = el("thead").attr("id", "results-table-head").child(
        el("tr")
            .child(sortable("Result", "result", false))
            .child(sortable("Class", "class", false))
            .child(sortable("Test Name", "name", false))
            .child(sortable("Duration", "duration", true))
            .child(el("th").text("Links"))
            .child(el("th").text("Debug")),
    );
    el("table")
        .attr("id", "results-table")
        .child(head)
        .child(
            el("tbody")
                .attr("id", "results-table-body")
                .children(rows.iter().map(row)),
        )
}

fn row(row: &ReportRow) -> Element {
    let mut links = el("td").class("col-links");
    for (i, link) in row.links.iter().enumerate() {
        if i > 0 {
            links.push(" ");
        }
        links.push(el("a").attr("href", link.href.as_str()).text(link.name.as_str()));
    }

    let mut debug = el("td").class("debug");
    if let Some(ref panel) = row.debug {
        debug = debug.children(debug_panel(panel, row.label));
    }

    el("tr")
        .class(format!("{} {}", row.label, ROW_MARKER))
        .child(el("td").class("col-result").text(row.label))
        .child(el("td").class("col-class").text(row.class_name.as_str()))
        .child(el("td").class("col-name").text(row.name.as_str()))
        .child(
            el("td")
                .class("col-duration")
                .text(format!("{:.2}", row.duration.as_secs_f64())),
        )
        .child(links)
        .child(debug)
}

fn debug_panel(panel: &DebugPanel, label: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    if let Some(ref src) = panel.screenshot {
        nodes.push(
            el("div")
                .class("screenshot")
                .child(
                    el("a")
                        .attr("href", src.as_str())
                        .child(el("img").attr("src", src.as_str())),
                )
                .into(),
        );
    }

    let mut log = el("div").class(format!("log {}", label)).keep_inline();
    for line in &panel.log {
        match line {
            LogLine::Error(text) => log.push(el("span").class("error").text(text.as_str())),
            other => log.push(other.text()),
        }
        log.push(el("br"));
    }
    nodes.push(log.into());
    nodes
}

const STYLE: &str = r#"
body { font-family: Helvetica, Arial, sans-serif; font-size: 12px; color: #222; min-width: 1200px; }
h2 { font-size: 16px; color: #000; }
p { color: #000; }
a { color: #999; }
span.passed, tr.passed .col-result { color: green; }
span.skipped, tr.skipped .col-result { color: orange; }
span.failed, span.error, tr.failure .col-result, tr.error .col-result { color: red; }
#filters label { margin-right: 12px; }
#results-table { border: 1px solid #e6e6e6; border-collapse: collapse; color: #999; font-size: 12px; width: 100%; }
#results-table th, #results-table td { padding: 5px; border: 1px solid #e6e6e6; text-align: left; vertical-align: top; }
#results-table th { font-weight: bold; }
th.sortable { cursor: pointer; }
th.sortable.asc::after { content: " \25B2"; }
th.sortable.desc::after { content: " \25BC"; }
td.debug { max-width: 600px; }
div.log { font-family: "Courier New", Courier, monospace; white-space: pre-wrap; color: #000; }
div.log span.error { color: red; }
div.screenshot { float: right; margin-left: 5px; }
div.screenshot img { width: 320px; border: 1px solid #e6e6e6; }
tr.hidden { display: none; }
"#;

const SCRIPT: &str = r#"
(function () {
  var body = document.getElementById('results-table-body');
  if (!body) { return; }
  function rows() { return Array.prototype.slice.call(body.querySelectorAll('tr')); }
  function key(row, col, numeric) {
    var cell = row.querySelector('.col-' + col);
    var text = cell ? cell.textContent : '';
    return numeric ? (parseFloat(text) || 0) : text.toLowerCase();
  }
  var headers = document.querySelectorAll('#results-table-head th.sortable');
  Array.prototype.forEach.call(headers, function (th) {
    th.addEventListener('click', function () {
      var asc = !th.classList.contains('asc');
      Array.prototype.forEach.call(headers, function (h) { h.classList.remove('asc', 'desc'); });
      th.classList.add(asc ? 'asc' : 'desc');
      var col = th.getAttribute('data-col');
      var numeric = th.classList.contains('numeric');
      rows().sort(function (a, b) {
        var x = key(a, col, numeric), y = key(b, col, numeric);
        var order = x < y ? -1 : (x > y ? 1 : 0);
        return asc ? order : -order;
      }).forEach(function (row) { body.appendChild(row); });
    });
  });
  var filters = document.querySelectorAll('#filters input.filter');
  Array.prototype.forEach.call(filters, function (box) {
    box.addEventListener('change', function () {
      var label = box.getAttribute('data-label');
      rows().forEach(function (row) {
        if (row.classList.contains(label)) { row.classList.toggle('hidden', !box.checked); }
      });
    });
  });
})();
"#;
