//! HTML pages.
//!
//! Every dynamic value goes through [`escape_html`] before it reaches the
//! markup.

use std::fmt::Write;

use nfe_ingest::Record;
use nfe_model::{FeatureContract, FeatureKind, IDENTIFIER_COLUMN};

/// Header of the column that receives the predicted label.
pub const RESULT_COLUMN: &str = "Tipo Imposto";

/// Client key attached to the `index`-th displayed row (1-based).
pub fn row_key(index: usize) -> String {
    format!("row-{index}")
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html lang=\"pt-BR\"><head><meta charset=\"utf-8\">\
<title>{title}</title>\
<style>body{{font-family:sans-serif;margin:2rem}}table{{border-collapse:collapse}}\
td,th{{border:1px solid #ccc;padding:2px 4px}}input{{width:7rem}}.error{{color:#b00}}</style>\
</head><body>{body}</body></html>",
        title = escape_html(title),
    )
}

/// Search page, optionally showing an error above the form.
pub fn search_form(error: Option<&str>) -> String {
    let mut body = String::from("<h1>Classificação de Tipo de Imposto</h1>");
    if let Some(message) = error {
        let _ = write!(body, "<p class=\"error\">{}</p>", escape_html(message));
    }
    body.push_str(
        "<form method=\"post\" action=\"/search\">\
<label for=\"seq_nfe\">SEQ_NFE</label> \
<input id=\"seq_nfe\" name=\"seq_nfe\" required> \
<button type=\"submit\">Buscar</button></form>",
    );
    layout("Buscar NF-e", &body)
}

pub fn error_page(message: &str) -> String {
    let body = format!(
        "<h1>Erro</h1><p class=\"error\">{}</p><p><a href=\"/\">Voltar</a></p>",
        escape_html(message)
    );
    layout("Erro", &body)
}

/// Editable table of the matched rows with an empty result column.
pub fn editable_rows(seq_nfe: &str, contract: FeatureContract, records: &[Record]) -> String {
    let mut body = format!(
        "<h1>SEQ_NFE {}</h1><p><a href=\"/\">Nova busca</a></p>\
<table id=\"features\"><thead><tr><th>{IDENTIFIER_COLUMN}</th>",
        escape_html(seq_nfe)
    );
    for name in contract.names() {
        let _ = write!(body, "<th>{name}</th>");
    }
    let _ = write!(body, "<th>{RESULT_COLUMN}</th></tr></thead><tbody>");

    for (idx, record) in records.iter().enumerate() {
        let _ = write!(
            body,
            "<tr data-key=\"{}\" data-seq=\"{}\"><td>{}</td>",
            row_key(idx + 1),
            record.identifier,
            record.identifier
        );
        for (name, value) in record.features.iter() {
            let kind = contract.get(name).map_or(FeatureKind::Categorical, |spec| spec.kind);
            let _ = write!(
                body,
                "<td><input name=\"{name}\" data-kind=\"{kind}\" value=\"{}\"></td>",
                escape_html(&value.to_string())
            );
        }
        body.push_str("<td class=\"result\"></td></tr>");
    }

    body.push_str(
        "</tbody></table>\
<p><button type=\"button\" id=\"classify\">Classificar</button> <span id=\"status\"></span></p>",
    );
    body.push_str(PREDICT_SCRIPT);
    layout(&format!("SEQ_NFE {seq_nfe}"), &body)
}

const PREDICT_SCRIPT: &str = r#"<script>
async function classify() {
  const rows = Array.from(document.querySelectorAll("tr[data-key]"));
  const data = rows.map((tr) => {
    const row = { key: tr.dataset.key, SEQ_NFE: Number(tr.dataset.seq) };
    tr.querySelectorAll("input[name]").forEach((input) => {
      const raw = input.value.trim();
      const numeric = input.dataset.kind === "numeric" && raw !== "" && !Number.isNaN(Number(raw));
      row[input.name] = numeric ? Number(raw) : raw;
    });
    return row;
  });
  const status = document.getElementById("status");
  status.textContent = "Classificando...";
  try {
    const response = await fetch("/predict", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ data }),
    });
    const body = await response.json();
    if (body.error) {
      status.textContent = body.error;
      return;
    }
    rows.forEach((tr) => {
      tr.querySelector("td.result").textContent = body.predictions[tr.dataset.key] ?? "";
    });
    status.textContent = "";
  } catch (err) {
    status.textContent = "Falha na comunicação com o servidor: " + err;
  }
}
document.getElementById("classify").addEventListener("click", classify);
</script>"#;

#[cfg(test)]
mod tests {
    use nfe_model::{FeatureRow, FeatureValue};

    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"a\" & 'b'</b>"),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_search_form_quotes_error() {
        let html = search_form(Some("O valor '<x>' não é um número válido para SEQ_NFE."));
        assert!(html.contains("&#39;&lt;x&gt;&#39;"));
        assert!(html.contains("name=\"seq_nfe\""));
        assert!(!search_form(None).contains("class=\"error\""));
    }

    #[test]
    fn test_editable_rows_layout() {
        let contract = FeatureContract::standard();
        let mut features = FeatureRow::new(contract, Vec::new());
        features.set("COD_UF_EMIT", FeatureValue::Text("PE".to_string()));
        features.set("NCM_COMPLETO", FeatureValue::Integer(94034000));
        let records = vec![
            Record {
                identifier: 1001,
                features: features.clone(),
            },
            Record {
                identifier: 1001,
                features,
            },
        ];

        let html = editable_rows("1001", contract, &records);
        assert!(html.contains("<th>SEQ_NFE</th><th>COD_UF_EMIT</th>"));
        assert!(html.contains("<th>CEST_ITEM</th><th>Tipo Imposto</th>"));
        assert!(html.contains("data-key=\"row-1\""));
        assert!(html.contains("data-key=\"row-2\""));
        assert!(html.contains(
            "<input name=\"NCM_COMPLETO\" data-kind=\"numeric\" value=\"94034000\">"
        ));
        assert!(html.contains(
            "<input name=\"CEST_ITEM\" data-kind=\"categorical\" value=\"\">"
        ));
        assert_eq!(html.matches("<td class=\"result\"></td>").count(), 2);
        assert!(html.contains("fetch(\"/predict\""));
    }
}
