//! HTTP adapter: `ClinicalApi` over the remote REST service.
//!
//! Uses a blocking reqwest client; calls are made from the background worker,
//! never from the UI thread.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::{multipart, Client, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::domain::{
    Anamnesis, AnamnesisSaved, ExamResult, ExaminationUpload, ExaminationUploaded, Patient,
    PatientCreate, Predictions, Visit, VisitCreate, VisitCreated, VisitQuery,
};
use crate::ports::ClinicalApi;

/// Error type for HTTP operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Cannot reach the clinical API at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    Transport(String),

    /// Non-2xx answer. The server body is kept for diagnostics.
    #[error("API Error: {status} {reason}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Cannot read upload file {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// HTTP status of a rejected request, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Blocking client for the `/v1/clinical` endpoints.
pub struct HttpClinicalApi {
    base_url: String,
    client: Client,
    timeout_secs: u64,
}

impl HttpClinicalApi {
    /// Create a client for `base_url` (trailing slashes are ignored).
    ///
    /// # Errors
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_connect() {
            ApiError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            ApiError::Timeout(self.timeout_secs)
        } else {
            ApiError::Transport(e.to_string())
        }
    }

    /// Send a request and decode a JSON answer.
    fn request<T, F>(&self, method: Method, path: &str, build: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let url = self.url(path);
        tracing::debug!("Requesting: {} {}", method, url);

        let response = build(self.client.request(method, &url))
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(status = status.as_u16(), "API error response: {}", body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        response
            .json::<T>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn multipart_form(upload: &ExaminationUpload) -> Result<multipart::Form, ApiError> {
        let bytes = std::fs::read(&upload.file).map_err(|source| ApiError::File {
            path: upload.file.clone(),
            source,
        })?;
        let mime = mime_guess::from_path(&upload.file).first_or_octet_stream();

        let file_part = multipart::Part::bytes(bytes)
            .file_name(upload.file_name())
            .mime_str(mime.as_ref())
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let mut form = multipart::Form::new()
            .text("examination_name", upload.examination_name.clone())
            .part("file", file_part);
        if let Some(text) = &upload.result_text {
            form = form.text("result_text", text.clone());
        }
        if let Some(data) = &upload.result_data {
            form = form.text("result_data", data.clone());
        }
        Ok(form)
    }
}

impl ClinicalApi for HttpClinicalApi {
    type Error = ApiError;

    fn create_patient(&self, patient: &PatientCreate) -> Result<Patient, Self::Error> {
        self.request(Method::POST, "/v1/clinical/patients", |rb| rb.json(patient))
    }

    fn get_patient(&self, patient_id: i64) -> Result<Patient, Self::Error> {
        self.request(
            Method::GET,
            &format!("/v1/clinical/patients/{patient_id}"),
            |rb| rb,
        )
    }

    fn create_visit(&self, visit: &VisitCreate) -> Result<VisitCreated, Self::Error> {
        self.request(Method::POST, "/v1/clinical/visits", |rb| rb.json(visit))
    }

    fn list_visits(&self, query: &VisitQuery) -> Result<Vec<Visit>, Self::Error> {
        let pairs = query.to_pairs();
        self.request(Method::GET, "/v1/clinical/visits", |rb| rb.query(&pairs))
    }

    fn get_visit(&self, visit_id: i64) -> Result<Visit, Self::Error> {
        self.request(Method::GET, &format!("/v1/clinical/visits/{visit_id}"), |rb| rb)
    }

    fn upload_anamnesis(
        &self,
        visit_id: i64,
        anamnesis: &Anamnesis,
    ) -> Result<AnamnesisSaved, Self::Error> {
        self.request(
            Method::POST,
            &format!("/v1/clinical/visits/{visit_id}/anamnesis"),
            |rb| rb.json(anamnesis),
        )
    }

    fn get_anamnesis(&self, visit_id: i64) -> Result<Anamnesis, Self::Error> {
        self.request(
            Method::GET,
            &format!("/v1/clinical/visits/{visit_id}/anamnesis"),
            |rb| rb,
        )
    }

    fn upload_examination(
        &self,
        visit_id: i64,
        upload: &ExaminationUpload,
    ) -> Result<ExaminationUploaded, Self::Error> {
        // reqwest sets the multipart Content-Type with its boundary.
        let form = Self::multipart_form(upload)?;
        self.request(
            Method::POST,
            &format!("/v1/clinical/visits/{visit_id}/examinations"),
            |rb| rb.multipart(form),
        )
    }

    fn list_examinations(&self, visit_id: i64) -> Result<Vec<ExamResult>, Self::Error> {
        self.request(
            Method::GET,
            &format!("/v1/clinical/visits/{visit_id}/examinations"),
            |rb| rb,
        )
    }

    fn predict(&self, visit_id: i64) -> Result<Predictions, Self::Error> {
        self.request(
            Method::POST,
            &format!("/v1/clinical/visits/{visit_id}/predict"),
            |rb| rb,
        )
    }
}
