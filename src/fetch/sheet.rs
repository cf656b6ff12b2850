use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::config::AppConfig;

const VALUES_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";
const GVIZ_BASE: &str = "https://docs.google.com/spreadsheets/d/";

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Extracts the JSON argument of the `setResponse(...)` wrapper the gviz
/// endpoint returns.
static GVIZ_ENVELOPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)setResponse\((.*)\)\s*;?\s*$").unwrap());

/// Fetches the demand table as a header-plus-rows grid of cell strings.
///
/// The official values endpoint is tried first; on any failure the public
/// gviz endpoint is used instead, the same order the spreadsheet is reachable
/// without special access. Errors only when both fail.
pub async fn fetch_rows(client: &Client, cfg: &AppConfig) -> Result<Vec<Vec<String>>> {
    match fetch_values_api(client, cfg).await {
        Ok(rows) => Ok(rows),
        Err(error) => {
            warn!(error = %error, "values API failed, falling back to gviz endpoint");
            fetch_gviz(client, cfg)
                .await
                .context("both sheet endpoints failed")
        }
    }
}

/// GET `.../v4/spreadsheets/{id}/values/{sheet}?key=...`; the payload is
/// `{ "values": [[...]] }` with string or numeric cells.
async fn fetch_values_api(client: &Client, cfg: &AppConfig) -> Result<Vec<Vec<String>>> {
    let mut url = Url::parse(VALUES_API_BASE).expect("static base URL");
    url.path_segments_mut()
        .expect("https URL has path segments")
        .push(&cfg.spreadsheet_id)
        .push("values")
        .push(&cfg.sheet_name);
    url.query_pairs_mut().append_pair("key", &cfg.google_api_key);

    let body = get_text_with_retry(client, &url).await?;
    let payload: Value = serde_json::from_str(&body).context("decoding values response")?;
    let values = payload
        .get("values")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("values response has no `values` array"))?;

    debug!(rows = values.len(), "values API returned table");
    Ok(values
        .iter()
        .map(|row| {
            row.as_array()
                .map(|cells| cells.iter().map(cell_text).collect())
                .unwrap_or_default()
        })
        .collect())
}

/// GET `.../d/{id}/gviz/tq?tqx=out:json&sheet=...` and rebuild the grid from
/// the column labels and row cells.
async fn fetch_gviz(client: &Client, cfg: &AppConfig) -> Result<Vec<Vec<String>>> {
    let mut url = Url::parse(GVIZ_BASE).expect("static base URL");
    url.path_segments_mut()
        .expect("https URL has path segments")
        .push(&cfg.spreadsheet_id)
        .push("gviz")
        .push("tq");
    url.query_pairs_mut()
        .append_pair("tqx", "out:json")
        .append_pair("sheet", &cfg.sheet_name);

    let body = get_text_with_retry(client, &url).await?;
    parse_gviz_payload(&body)
}

fn parse_gviz_payload(body: &str) -> Result<Vec<Vec<String>>> {
    let captures = GVIZ_ENVELOPE
        .captures(body)
        .ok_or_else(|| anyhow!("gviz response is not a setResponse payload"))?;
    let payload: Value = serde_json::from_str(&captures[1]).context("decoding gviz JSON")?;

    let table = payload
        .get("table")
        .ok_or_else(|| anyhow!("gviz payload has no table"))?;
    let cols = table
        .get("cols")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("gviz table has no columns"))?;
    let data_rows = table
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("gviz table has no rows"))?;

    let headers: Vec<String> = cols
        .iter()
        .map(|col| {
            col.get("label")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect();
    if headers.is_empty() {
        bail!("gviz table has no columns");
    }

    let mut rows = Vec::with_capacity(data_rows.len() + 1);
    rows.push(headers);
    for row in data_rows {
        let cells = row
            .get("c")
            .and_then(Value::as_array)
            .map(|cells| {
                cells
                    .iter()
                    .map(|cell| cell.get("v").map(cell_text).unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default();
        rows.push(cells);
    }

    debug!(rows = rows.len() - 1, "gviz endpoint returned table");
    Ok(rows)
}

/// Cells arrive as strings, numbers, booleans, or null; everything becomes a
/// string, null becomes empty.
fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

async fn get_text(client: &Client, url: &Url) -> Result<String> {
    Ok(client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {url} failed"))?
        .error_for_status()
        .with_context(|| format!("non-success status from {url}"))?
        .text()
        .await
        .with_context(|| format!("reading body from {url}"))?)
}

async fn get_text_with_retry(client: &Client, url: &Url) -> Result<String> {
    let mut attempts = 0;
    loop {
        match get_text(client, url).await {
            Ok(text) => return Ok(text),
            Err(error) if attempts < MAX_RETRIES => {
                attempts += 1;
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempts - 1);
                warn!(%url, attempt = attempts, delay_ms = backoff, error = %error, "retrying sheet fetch");
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gviz_envelope_is_unwrapped() {
        let body = concat!(
            "/*O_o*/\n",
            "google.visualization.Query.setResponse({\"table\":{",
            "\"cols\":[{\"label\":\"Адрес\"},{\"label\":\"Тариф\"}],",
            "\"rows\":[{\"c\":[{\"v\":\"Тестовая ул, 5\"},{\"v\":2000}]},",
            "{\"c\":[{\"v\":\"Другая ул, 7\"},null]}]",
            "}});"
        );
        let rows = parse_gviz_payload(body).unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["Адрес".to_string(), "Тариф".to_string()],
                vec!["Тестовая ул, 5".to_string(), "2000".to_string()],
                vec!["Другая ул, 7".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn gviz_without_table_is_an_error() {
        let body = "google.visualization.Query.setResponse({\"status\":\"error\"});";
        assert!(parse_gviz_payload(body).is_err());
    }

    #[test]
    fn non_jsonp_body_is_an_error() {
        assert!(parse_gviz_payload("<html>sign in</html>").is_err());
    }

    #[test]
    fn cell_text_coerces_scalars() {
        assert_eq!(cell_text(&Value::String("пять".into())), "пять");
        assert_eq!(cell_text(&serde_json::json!(5)), "5");
        assert_eq!(cell_text(&serde_json::json!(2.5)), "2.5");
        assert_eq!(cell_text(&Value::Bool(true)), "true");
        assert_eq!(cell_text(&Value::Null), "");
    }
}
