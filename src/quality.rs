use anyhow::{Context, Result, bail};
use duckdb::Connection;
use std::{collections::HashMap, fs, path::Path};

use crate::common::{commit_tmp, discard_tmp, ensure_parent_dir, tmp_path_for};
use crate::record::DataType;

const VIEW_NAME: &str = "unified";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFill {
    pub column: String,
    pub empty_count: i64,
    pub permitted: bool,
}

/// Fill rates of one data type's rows in the unified CSV.
#[derive(Debug, Clone)]
pub struct TypeAudit {
    pub data_type: String,
    pub rows_total: i64,
    pub columns: Vec<ColumnFill>,
}

impl TypeAudit {
    /// Non-empty cells outside the type's permitted columns.
    pub fn illegal_cells(&self) -> i64 {
        self.columns
            .iter()
            .filter(|c| !c.permitted)
            .map(|c| self.rows_total - c.empty_count)
            .sum()
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn sql_escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "''")
}

fn load_column_names(conn: &Connection) -> Result<Vec<String>> {
    let query = format!("SELECT name FROM pragma_table_info('{VIEW_NAME}') ORDER BY cid");
    let mut stmt = conn
        .prepare(&query)
        .context("Failed preparing DuckDB pragma_table_info")?;
    let mut rows = stmt
        .query([])
        .context("Failed querying DuckDB pragma_table_info")?;
    let mut names = Vec::new();
    while let Some(row) = rows
        .next()
        .context("Failed iterating pragma_table_info rows")?
    {
        let name: String = row.get(0).context("Failed reading column name")?;
        names.push(name);
    }
    Ok(names)
}

/// Counts empty cells per column and data type with DuckDB, reading every
/// column as text so blanks are never coerced.
pub fn audit_unified_csv(csv_path: &Path) -> Result<Vec<TypeAudit>> {
    if !csv_path.exists() {
        bail!("Unified CSV not found: {}", csv_path.display());
    }

    let conn = Connection::open_in_memory().context("Failed opening DuckDB in-memory database")?;
    let escaped = sql_escape_path(csv_path);
    conn.execute(
        &format!(
            "CREATE VIEW {VIEW_NAME} AS SELECT * FROM read_csv('{escaped}', header = true, all_varchar = true)"
        ),
        [],
    )
    .with_context(|| format!("Failed creating DuckDB view for {}", csv_path.display()))?;

    let columns = load_column_names(&conn)?;
    if !columns.iter().any(|c| c == "data_type") {
        bail!("{} has no data_type column", csv_path.display());
    }

    let mut select_exprs = Vec::with_capacity(2 + columns.len());
    select_exprs.push("data_type".to_string());
    select_exprs.push("COUNT(*)".to_string());
    for col in &columns {
        let ident = quote_ident(col);
        select_exprs.push(format!(
            "CAST(COALESCE(SUM(CASE WHEN {ident} IS NULL OR {ident} = '' THEN 1 ELSE 0 END), 0) AS BIGINT)"
        ));
    }
    let query = format!(
        "SELECT {} FROM {VIEW_NAME} GROUP BY data_type",
        select_exprs.join(", ")
    );
    let mut stmt = conn
        .prepare(&query)
        .context("Failed preparing DuckDB fill-rate query")?;
    let mut rows = stmt
        .query([])
        .context("Failed running DuckDB fill-rate query")?;

    let mut by_type: HashMap<String, TypeAudit> = HashMap::new();
    while let Some(row) = rows.next().context("Failed reading DuckDB fill-rate row")? {
        let data_type: Option<String> = row.get(0).context("Failed reading data_type")?;
        let data_type = data_type.unwrap_or_default();
        let rows_total: i64 = row.get(1).context("Failed reading rows_total")?;
        let permitted = DataType::from_label(&data_type).map(|t| t.permitted_columns());

        let mut fills = Vec::with_capacity(columns.len());
        for (idx, col) in columns.iter().enumerate() {
            let empty_count: i64 = row
                .get(2 + idx)
                .with_context(|| format!("Failed reading empty_count for {col}"))?;
            fills.push(ColumnFill {
                column: col.clone(),
                empty_count,
                permitted: permitted.is_some_and(|p| p.iter().any(|name| *name == col.as_str())),
            });
        }
        by_type.insert(
            data_type.clone(),
            TypeAudit {
                data_type,
                rows_total,
                columns: fills,
            },
        );
    }

    let mut audits: Vec<TypeAudit> = DataType::ALL
        .iter()
        .filter_map(|t| by_type.remove(t.as_str()))
        .collect();
    let mut unknown: Vec<TypeAudit> = by_type.into_values().collect();
    unknown.sort_by(|a, b| a.data_type.cmp(&b.data_type));
    audits.extend(unknown);
    Ok(audits)
}

fn fmt_pct(numer: i64, denom: i64) -> String {
    if denom <= 0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", (numer as f64) * 100.0 / (denom as f64))
}

pub fn render_markdown(source_label: &str, audits: &[TypeAudit]) -> String {
    let mut out = String::new();
    out.push_str("# Unified table fill-rate audit\n\n");
    out.push_str(&format!("Source: `{}`\n", source_label.replace('`', "\\`")));
    for audit in audits {
        out.push_str(&format!(
            "\n## {} ({} rows, {} illegal cells)\n\n",
            audit.data_type,
            audit.rows_total,
            audit.illegal_cells()
        ));
        out.push_str("| column | permitted | rows_total | empty_count | empty_pct |\n");
        out.push_str("| --- | :---: | ---: | ---: | ---: |\n");
        for col in &audit.columns {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                col.column,
                if col.permitted { "yes" } else { "no" },
                audit.rows_total,
                col.empty_count,
                fmt_pct(col.empty_count, audit.rows_total),
            ));
        }
    }
    out
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    let tmp_path = tmp_path_for(path);
    if let Err(err) = fs::write(&tmp_path, contents) {
        discard_tmp(&tmp_path);
        return Err(err).with_context(|| format!("Failed writing {}", tmp_path.display()));
    }
    commit_tmp(&tmp_path, path)
}

/// Audits the committed unified CSV and writes the Markdown report.
pub fn write_quality_report(csv_path: &Path, report_path: &Path) -> Result<Vec<TypeAudit>> {
    let audits = audit_unified_csv(csv_path)?;
    let label = csv_path
        .file_name()
        .map(|x| x.to_string_lossy().to_string())
        .unwrap_or_else(|| csv_path.display().to_string());
    write_atomic(report_path, &render_markdown(&label, &audits))?;
    tracing::info!(path = %report_path.display(), sections = audits.len(), "Wrote quality report");
    Ok(audits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MASTER_COLUMNS;

    fn write_fixture(path: &Path) {
        let mut text = MASTER_COLUMNS.join(",");
        text.push('\n');
        text.push_str("DISTRICT_REFERENCE,1,UDUPI,KA-UD,KARNATAKA,29,,,,,,,,,,,Official Karnataka District Reference - ID 1\n");
        text.push_str("HEALTHCARE_FACILITY,,,,KARNATAKA,29,HOSPITAL,City,12.9,77.5,,,,,,,\"OSM ID: 1, Type: node\"\n");
        text.push_str("HEALTHCARE_FACILITY,,,,KARNATAKA,29,CLINIC,Corner,,,,,,,,,\"OSM ID: 2, Type: way\"\n");
        fs::write(path, text).unwrap();
    }

    #[test]
    fn counts_blanks_per_type() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("master.csv");
        write_fixture(&csv_path);

        let audits = audit_unified_csv(&csv_path).unwrap();
        let types: Vec<&str> = audits.iter().map(|a| a.data_type.as_str()).collect();
        assert_eq!(types, ["HEALTHCARE_FACILITY", "DISTRICT_REFERENCE"]);

        let facilities = &audits[0];
        assert_eq!(facilities.rows_total, 2);
        let latitude = facilities.columns.iter().find(|c| c.column == "latitude").unwrap();
        assert_eq!(latitude.empty_count, 1);
        assert!(latitude.permitted);
        let degree = facilities.columns.iter().find(|c| c.column == "degree").unwrap();
        assert_eq!(degree.empty_count, 2);
        assert!(!degree.permitted);
        assert_eq!(facilities.illegal_cells(), 0);
    }

    #[test]
    fn report_is_markdown_per_type() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("master.csv");
        let report_path = dir.path().join("reports/quality.md");
        write_fixture(&csv_path);

        write_quality_report(&csv_path, &report_path).unwrap();
        let text = fs::read_to_string(&report_path).unwrap();
        assert!(text.contains("## HEALTHCARE_FACILITY (2 rows, 0 illegal cells)"));
        assert!(text.contains("| latitude | yes | 2 | 1 | 50.00% |"));
        assert!(!tmp_path_for(&report_path).exists());
    }

    #[test]
    fn missing_csv_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(audit_unified_csv(&dir.path().join("nope.csv")).is_err());
    }
}
