//! Server-rendered single page: upload form on top, results below.

use crate::analyze::AnalysisReport;

pub enum PageContent<'a> {
    Upload,
    /// Replaces every downstream section with one error banner.
    Failed {
        original_image: Option<&'a str>,
        message: &'a str,
    },
    Report(&'a AnalysisReport),
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; color: #1f2d1f; }
h1 { text-align: center; }
figure { margin: 1rem 0; text-align: center; }
figure img { max-width: 100%; border-radius: 6px; }
figcaption { color: #5a6b5a; font-size: 0.9rem; }
.result { white-space: pre-wrap; background: #f3f8f1; padding: 1rem; border-radius: 6px; }
.warning { background: #fff6d6; border-left: 4px solid #e0b000; padding: 0.75rem 1rem; }
.error { background: #fde4e4; border-left: 4px solid #c62828; padding: 0.75rem 1rem; }
#busy { display: none; }
"#;

const SCRIPT: &str = r#"
document.getElementById('upload').addEventListener('submit', function () {
  document.getElementById('busy').style.display = 'block';
});
"#;

pub fn render(title: &str, content: PageContent<'_>) -> String {
    let title = escape_html(title);
    let body = match content {
        PageContent::Upload => String::new(),
        PageContent::Failed {
            original_image,
            message,
        } => {
            let mut out = String::new();
            if let Some(src) = original_image {
                out.push_str(&figure(src, "Uploaded Image"));
            }
            out.push_str(&format!(
                "<div class=\"error\">{}</div>\n",
                escape_html(message)
            ));
            out
        }
        PageContent::Report(report) => render_report(report),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<h1>🪴 Plant / Crop Disease Detection 🌾</h1>
<p>Upload an image of a plant, leaf, or crop, and get AI-powered disease detection.</p>
<form id="upload" method="post" action="/analyze" enctype="multipart/form-data">
<label for="file">Choose an image...</label>
<input id="file" type="file" name="file" accept=".jpg,.jpeg,.png" required>
<button type="submit">Analyze</button>
</form>
<p id="busy">Analyzing image...</p>
{body}<script>{SCRIPT}</script>
</body>
</html>
"#
    )
}

fn render_report(report: &AnalysisReport) -> String {
    let mut out = figure(&report.original_image, "Uploaded Image");

    out.push_str("<h3>🔍 Analysis Result:</h3>\n");
    out.push_str(&format!(
        "<div class=\"result\">{}</div>\n",
        escape_html(&report.diagnosis)
    ));

    if let Some(translation) = &report.translation {
        let language = report.translation_language.as_deref().unwrap_or("");
        out.push_str(&format!(
            "<h3>🌐 Translation ({}):</h3>\n<div class=\"result\">{}</div>\n",
            escape_html(language),
            escape_html(translation)
        ));
    }

    match (&report.bounding_box, &report.annotated_image) {
        (Some(bbox), Some(annotated)) => {
            out.push_str(&format!("<p>Bounding Box Coordinates: {}</p>\n", bbox));
            if report.within_bounds == Some(false) {
                out.push_str(&format!(
                    "<div class=\"warning\">The box extends outside the {}x{} image; only the visible part is drawn.</div>\n",
                    report.width, report.height
                ));
            }
            out.push_str(&figure(annotated, "Disease Area Highlighted"));
        }
        _ => {
            out.push_str("<div class=\"warning\">No bounding box coordinates found in the model's response.");
            if let Some(note) = &report.box_note {
                out.push_str(&format!(" ({})", escape_html(note)));
            }
            out.push_str("</div>\n");
            out.push_str(&figure(&report.original_image, "Disease Area Highlighted"));
        }
    }

    out
}

fn figure(src: &str, caption: &str) -> String {
    format!(
        "<figure><img src=\"{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>\n",
        escape_html(src),
        caption,
        caption
    )
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
