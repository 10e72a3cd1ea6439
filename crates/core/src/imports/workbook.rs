//! Minimal XLSX workbook reader.
//!
//! Broker exports only need cell text, so this walks the OOXML parts inside
//! the zip container (sheet catalog, relationships, shared strings,
//! worksheets) and materializes each sheet as header-keyed string rows.
//! Styles, formulas and number formats are ignored.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::Regex;
use zip::ZipArchive;

use super::imports_errors::ImportError;

static SHEET_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<sheet\b[^>]*>").expect("Invalid regex pattern"));
static NAME_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bname="([^"]*)""#).expect("Invalid regex pattern"));
static SHEET_RID_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\br:id="([^"]*)""#).expect("Invalid regex pattern"));
static REL_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Relationship\b[^>]*>").expect("Invalid regex pattern"));
static REL_ID_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bId="([^"]*)""#).expect("Invalid regex pattern"));
static REL_TARGET_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bTarget="([^"]*)""#).expect("Invalid regex pattern"));
static SHARED_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<si>(.*?)</si>").expect("Invalid regex pattern"));
static TEXT_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<t(?:\s[^>]*)?>(.*?)</t>").expect("Invalid regex pattern"));
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<row\b[^>]*>(.*?)</row>").expect("Invalid regex pattern"));
static CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<c\b([^>]*?)(?:/>|>(.*?)</c>)").expect("Invalid regex pattern")
});
static CELL_REF_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\br="([A-Z]+)\d+""#).expect("Invalid regex pattern"));
static CELL_TYPE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bt="([A-Za-z]+)""#).expect("Invalid regex pattern"));
static CELL_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<v[^>]*>(.*?)</v>").expect("Invalid regex pattern"));

/// A parsed XLSX workbook, sheet contents reduced to text.
pub struct Workbook {
    pub(crate) sheets: HashMap<String, Sheet>,
}

/// One worksheet. The first row supplies the column headers; every later
/// row becomes a header-keyed map holding only its non-empty cells.
pub struct Sheet {
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<HashMap<String, String>>,
}

impl Sheet {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[HashMap<String, String>] {
        &self.rows
    }
}

impl Workbook {
    /// Parses an XLSX file from its raw bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ImportError> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| ImportError::Workbook(format!("not a valid xlsx container: {}", e)))?;

        let catalog = read_part(&mut archive, "xl/workbook.xml")?;
        let rels = read_part(&mut archive, "xl/_rels/workbook.xml.rels")?;
        let shared = match read_part_optional(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => parse_shared_strings(&xml),
            None => Vec::new(),
        };

        let targets = parse_relationships(&rels);
        let mut sheets = HashMap::new();
        for (name, rid) in parse_sheet_catalog(&catalog) {
            let target = targets.get(&rid).ok_or_else(|| {
                ImportError::Workbook(format!("sheet '{}' has no relationship target", name))
            })?;
            let path = match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{}", target),
            };
            let xml = read_part(&mut archive, &path)?;
            sheets.insert(name, parse_sheet(&xml, &shared));
        }

        Ok(Workbook { sheets })
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    path: &str,
) -> Result<String, ImportError> {
    read_part_optional(archive, path)?
        .ok_or_else(|| ImportError::Workbook(format!("missing workbook part {}", path)))
}

fn read_part_optional(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    path: &str,
) -> Result<Option<String>, ImportError> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ImportError::Workbook(format!("cannot open {}: {}", path, e))),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| ImportError::Workbook(format!("cannot read {}: {}", path, e)))?;
    Ok(Some(content))
}

/// Sheet name to relationship id, in catalog order.
fn parse_sheet_catalog(xml: &str) -> Vec<(String, String)> {
    SHEET_TAG_RE
        .find_iter(xml)
        .filter_map(|tag| {
            let name = NAME_ATTR_RE.captures(tag.as_str())?;
            let rid = SHEET_RID_ATTR_RE.captures(tag.as_str())?;
            Some((unescape_xml(&name[1]), rid[1].to_string()))
        })
        .collect()
}

/// Relationship id to part target, from workbook.xml.rels.
fn parse_relationships(xml: &str) -> HashMap<String, String> {
    REL_TAG_RE
        .find_iter(xml)
        .filter_map(|tag| {
            let id = REL_ID_ATTR_RE.captures(tag.as_str())?;
            let target = REL_TARGET_ATTR_RE.captures(tag.as_str())?;
            Some((id[1].to_string(), target[1].to_string()))
        })
        .collect()
}

/// Shared string table. Each `<si>` may hold several formatting runs
/// whose text fragments are concatenated.
fn parse_shared_strings(xml: &str) -> Vec<String> {
    SHARED_ITEM_RE
        .captures_iter(xml)
        .map(|item| {
            TEXT_RUN_RE
                .captures_iter(&item[1])
                .map(|run| unescape_xml(&run[1]))
                .collect::<String>()
        })
        .collect()
}

fn parse_sheet(xml: &str, shared: &[String]) -> Sheet {
    let mut raw_rows: Vec<Vec<(usize, String)>> = Vec::new();
    for row in ROW_RE.captures_iter(xml) {
        let mut cells: Vec<(usize, String)> = Vec::new();
        let mut next_column = 0usize;
        for cell in CELL_RE.captures_iter(&row[1]) {
            let attrs = &cell[1];
            let column = CELL_REF_ATTR_RE
                .captures(attrs)
                .map(|r| column_index(&r[1]))
                .unwrap_or(next_column);
            next_column = column + 1;
            let body = cell.get(2).map(|m| m.as_str()).unwrap_or("");
            let value = cell_text(attrs, body, shared);
            if !value.is_empty() {
                cells.push((column, value));
            }
        }
        raw_rows.push(cells);
    }

    let mut raw_rows = raw_rows.into_iter();
    let headers = match raw_rows.next() {
        Some(first) => {
            let width = first.iter().map(|(c, _)| c + 1).max().unwrap_or(0);
            let mut headers = vec![String::new(); width];
            for (column, value) in first {
                headers[column] = value;
            }
            headers
        }
        None => Vec::new(),
    };

    let rows = raw_rows
        .filter_map(|cells| {
            let row: HashMap<String, String> = cells
                .into_iter()
                .filter_map(|(column, value)| {
                    let header = headers.get(column)?;
                    (!header.is_empty()).then(|| (header.clone(), value))
                })
                .collect();
            (!row.is_empty()).then_some(row)
        })
        .collect();

    Sheet { headers, rows }
}

/// Resolves one cell to its display text based on the `t` type attribute.
fn cell_text(attrs: &str, body: &str, shared: &[String]) -> String {
    let cell_type = CELL_TYPE_ATTR_RE
        .captures(attrs)
        .map(|t| t[1].to_string())
        .unwrap_or_default();

    if cell_type == "inlineStr" {
        return TEXT_RUN_RE
            .captures_iter(body)
            .map(|run| unescape_xml(&run[1]))
            .collect();
    }

    let raw = match CELL_VALUE_RE.captures(body) {
        Some(v) => unescape_xml(&v[1]),
        None => return String::new(),
    };
    if cell_type == "s" {
        return raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| shared.get(index))
            .cloned()
            .unwrap_or_default();
    }
    raw
}

/// "A" -> 0, "B" -> 1, "AA" -> 26.
fn column_index(letters: &str) -> usize {
    letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize)
        .saturating_sub(1)
}

fn unescape_xml(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
