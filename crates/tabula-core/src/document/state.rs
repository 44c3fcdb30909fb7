use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabula_engine::engine::Grid;

/// Column widths or row heights keyed by column letters / row number.
pub type Dimensions = BTreeMap<String, f64>;

/// A persisted spreadsheet document.
///
/// The engine only ever sees `data`; the remaining fields are carried for
/// the presentation layer and round-trip through JSON unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Grid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_widths: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_heights: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Fields accepted when creating a spreadsheet; the id is assigned by the store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpreadsheet {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Grid,
    #[serde(default)]
    pub column_widths: Option<Dimensions>,
    #[serde(default)]
    pub row_heights: Option<Dimensions>,
}

/// A partial update; only the fields that are set replace the stored ones.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Option<Grid>,
    #[serde(default)]
    pub column_widths: Option<Dimensions>,
    #[serde(default)]
    pub row_heights: Option<Dimensions>,
}

/// Listing entry: id plus a display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetSummary {
    pub id: u64,
    pub name: String,
}

impl Spreadsheet {
    /// Create an empty document with the given id.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new(id: u64) -> Self {
        Spreadsheet {
            id,
            ..Spreadsheet::default()
        }
    }

    pub fn from_new(id: u64, new: NewSpreadsheet) -> Self {
        Spreadsheet {
            id,
            name: new.name,
            data: new.data,
            column_widths: new.column_widths,
            row_heights: new.row_heights,
            last_modified: None,
        }
    }

    /// The name shown in listings.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("Spreadsheet {}", self.id),
        }
    }

    pub fn summary(&self) -> SpreadsheetSummary {
        SpreadsheetSummary {
            id: self.id,
            name: self.display_name(),
        }
    }

    /// Overlay the fields set in `patch`.
    pub fn apply_patch(&mut self, patch: SpreadsheetPatch) {
        if let Some(name) = patch.name {
            self.name = Some(name);
        }
        if let Some(data) = patch.data {
            self.data = data;
        }
        if let Some(widths) = patch.column_widths {
            self.column_widths = Some(widths);
        }
        if let Some(heights) = patch.row_heights {
            self.row_heights = Some(heights);
        }
        self.touch();
    }

    pub(crate) fn touch(&mut self) {
        self.last_modified = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_engine::engine::Cell;

    #[test]
    fn test_display_name_defaults_to_id() {
        let mut doc = Spreadsheet::new(7);
        assert_eq!(doc.display_name(), "Spreadsheet 7");
        doc.name = Some("Budget".into());
        assert_eq!(doc.summary().name, "Budget");
    }

    #[test]
    fn test_json_shape_is_camel_case() {
        let mut doc = Spreadsheet::new(1);
        doc.data.insert("A1".into(), Cell::from_input("42"));
        doc.column_widths = Some(Dimensions::from([("A".to_string(), 120.0)]));

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["data"]["A1"]["value"], "42");
        assert_eq!(json["data"]["A1"]["type"], "number");
        assert_eq!(json["columnWidths"]["A"], 120.0);
        assert!(json.get("name").is_none());
        assert!(json.get("rowHeights").is_none());
    }

    #[test]
    fn test_deserialize_minimal_document() {
        let doc: Spreadsheet = serde_json::from_str(
            r#"{"id": 3, "data": {"B2": {"value": "=SUM(A1)", "formula": "=SUM(A1)"}}}"#,
        )
        .unwrap();
        assert_eq!(doc.id, 3);
        assert!(doc.data["B2"].has_formula());
        assert_eq!(doc.last_modified, None);
    }

    #[test]
    fn test_patch_replaces_only_set_fields() {
        let mut doc = Spreadsheet::from_new(
            2,
            NewSpreadsheet {
                name: Some("Old".into()),
                ..NewSpreadsheet::default()
            },
        );
        doc.apply_patch(SpreadsheetPatch {
            row_heights: Some(Dimensions::from([("1".to_string(), 30.0)])),
            ..SpreadsheetPatch::default()
        });
        assert_eq!(doc.name.as_deref(), Some("Old"));
        assert!(doc.row_heights.is_some());
        assert!(doc.last_modified.is_some());
    }
}
