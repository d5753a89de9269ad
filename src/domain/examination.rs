//! Examination results (uploaded diagnostic files) attached to a visit.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Examination result as returned by `GET /v1/clinical/visits/{id}/examinations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: i64,
    pub examination_name: String,
    pub s3_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_text: Option<String>,

    /// Arbitrary structured payload produced by the server; any JSON value,
    /// `null` when absent.
    #[serde(default)]
    pub result_data: serde_json::Value,

    pub created_at: String,
}

/// Response of the multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExaminationUploaded {
    pub s3_path: String,
    pub visit_examination_id: i64,
}

/// Coarse file classification shown next to the selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Document,
}

impl FileKind {
    #[must_use]
    pub fn of(path: &Path) -> Self {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        if mime.type_() == mime_guess::mime::IMAGE {
            Self::Image
        } else {
            Self::Document
        }
    }
}

/// Validated multipart upload. Only obtainable through [`ExaminationDraft::ready`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExaminationUpload {
    pub examination_name: String,
    pub file: PathBuf,
    pub result_text: Option<String>,
    /// JSON document sent verbatim as the `result_data` part.
    pub result_data: Option<String>,
}

impl ExaminationUpload {
    /// File name sent in the multipart `file` part.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string())
    }
}

/// In-progress upload form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExaminationDraft {
    pub examination_name: String,
    pub file: Option<PathBuf>,
    pub result_text: String,
}

impl ExaminationDraft {
    /// Whether both the examination name and a file are present.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.examination_name.trim().is_empty() && self.file.is_some()
    }

    /// Convert into an upload, or explain what is still missing.
    ///
    /// # Errors
    /// Returns a message naming the missing field(s).
    pub fn ready(&self) -> Result<ExaminationUpload, String> {
        let name = self.examination_name.trim();
        match (name.is_empty(), &self.file) {
            (true, None) => Err("Examination type and file are required".to_string()),
            (true, Some(_)) => Err("Examination type is required".to_string()),
            (false, None) => Err("Examination file is required".to_string()),
            (false, Some(file)) => {
                let text = self.result_text.trim();
                Ok(ExaminationUpload {
                    examination_name: name.to_string(),
                    file: file.clone(),
                    result_text: (!text.is_empty()).then(|| text.to_string()),
                    result_data: None,
                })
            }
        }
    }
}

/// File size in megabytes with two decimals, as shown in the upload panel.
#[must_use]
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_blocked_without_file() {
        let draft = ExaminationDraft {
            examination_name: "MRI".into(),
            ..Default::default()
        };
        assert!(!draft.is_ready());
        assert_eq!(draft.ready().unwrap_err(), "Examination file is required");
    }

    #[test]
    fn test_upload_blocked_without_name() {
        let draft = ExaminationDraft {
            examination_name: "   ".into(),
            file: Some(PathBuf::from("/tmp/scan.png")),
            ..Default::default()
        };
        assert!(!draft.is_ready());
        assert!(draft.ready().is_err());
    }

    #[test]
    fn test_ready_draft_drops_blank_text() {
        let draft = ExaminationDraft {
            examination_name: " ECG ".into(),
            file: Some(PathBuf::from("/data/ecg.pdf")),
            result_text: "  ".into(),
        };
        let upload = draft.ready().unwrap();
        assert_eq!(upload.examination_name, "ECG");
        assert_eq!(upload.result_text, None);
        assert_eq!(upload.file_name(), "ecg.pdf");
    }

    #[test]
    fn test_file_kind() {
        assert_eq!(FileKind::of(Path::new("scan.jpeg")), FileKind::Image);
        assert_eq!(FileKind::of(Path::new("report.pdf")), FileKind::Document);
        assert_eq!(FileKind::of(Path::new("no_extension")), FileKind::Document);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size_mb(0), "0.00 MB");
        assert_eq!(format_size_mb(1024 * 1024 * 3 / 2), "1.50 MB");
    }

    #[test]
    fn test_result_data_defaults_to_null() {
        let r: ExamResult = serde_json::from_str(
            r#"{"id":1,"examination_name":"ECG","s3_path":"/x","created_at":"2024-01-15T11:00:00Z"}"#,
        )
        .unwrap();
        assert!(r.result_data.is_null());
        assert!(r.result_text.is_none());
    }

    #[test]
    fn test_result_data_accepts_any_json() {
        let rows: Vec<ExamResult> = serde_json::from_str(
            r#"[
                {"id":1,"examination_name":"ECG","s3_path":"/a","result_data":{"rate":78},"created_at":"2024-01-15T11:00:00Z"},
                {"id":2,"examination_name":"MRI","s3_path":"/b","result_data":null,"created_at":"2024-01-16T11:00:00Z"},
                {"id":3,"examination_name":"CT","s3_path":"/c","result_data":[1,2],"created_at":"2024-01-17T11:00:00Z"},
                {"id":4,"examination_name":"X-ray","s3_path":"/d","result_data":"normal","created_at":"2024-01-18T11:00:00Z"}
            ]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].result_data["rate"], 78);
        assert!(rows[1].result_data.is_null());
        assert_eq!(rows[2].result_data, serde_json::json!([1, 2]));
        assert_eq!(rows[3].result_data, "normal");
    }
}
