//! HTTP adapter against a local one-shot server.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clinicdesk::adapters::{ApiError, HttpClinicalApi};
use clinicdesk::domain::{ExaminationDraft, ExaminationUpload, PatientCreate, Sex, VisitQuery};
use clinicdesk::ports::ClinicalApi;

/// Serve exactly one request with a canned response and hand back the raw request.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Bind local port");
    let base = format!("http://{}/api", listener.local_addr().expect("Local addr"));

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("Accept connection");
        let request = read_request(&mut stream);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("Write response");
        request
    });

    (base, handle)
}

fn read_request(stream: &mut impl Read) -> String {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).expect("Read request");
        assert!(n > 0, "Connection closed before headers ended");
        data.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&data, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok());
    let chunked = headers.contains("transfer-encoding: chunked");

    loop {
        let body = &data[header_end..];
        let done = match content_length {
            Some(len) => body.len() >= len,
            None if chunked => find(body, b"0\r\n\r\n").is_some(),
            None => true,
        };
        if done {
            break;
        }
        let n = stream.read(&mut chunk).expect("Read body");
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8_lossy(&data).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn client(base: &str) -> HttpClinicalApi {
    HttpClinicalApi::new(base, Duration::from_secs(5)).expect("Build client")
}

#[test]
fn test_list_visits_omits_unset_filters() {
    let (base, server) = serve_once(
        "200 OK",
        r#"[{"id":7,"patient_id":3,"status":"pending","created_at":"2024-02-01T08:00:00Z"}]"#,
    );
    let query = VisitQuery {
        limit: Some(20),
        offset: Some(0),
        patient_id: Some(3),
    };

    let visits = client(&base).list_visits(&query).expect("Should list");
    let request = server.join().expect("Server thread");

    assert!(request.starts_with("GET /api/v1/clinical/visits?limit=20&patient_id=3 HTTP/1.1"));
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].id, 7);
    assert!(visits[0].doctor_id.is_none());
}

#[test]
fn test_create_patient_sends_only_set_fields() {
    let (base, server) = serve_once(
        "201 Created",
        r#"{"id":9,"recorded_age":40,"sex":"female","created_at":"2024-02-01T08:00:00Z"}"#,
    );
    let create = PatientCreate {
        date_of_birth: None,
        recorded_age: Some(40),
        sex: Some(Sex::Female),
    };

    let patient = client(&base).create_patient(&create).expect("Should create");
    let request = server.join().expect("Server thread");

    assert!(request.starts_with("POST /api/v1/clinical/patients HTTP/1.1"));
    assert!(request.ends_with(r#"{"recorded_age":40,"sex":"female"}"#));
    assert_eq!(patient.id, 9);
    assert_eq!(patient.sex, Some(Sex::Female));
    assert!(patient.date_of_birth.is_none());
}

#[test]
fn test_error_status_keeps_body() {
    let (base, server) = serve_once(
        "404 Not Found",
        r#"{"detail":"Anamnesis not found"}"#,
    );

    let err = client(&base).get_anamnesis(12).unwrap_err();
    let request = server.join().expect("Server thread");

    assert!(request.starts_with("GET /api/v1/clinical/visits/12/anamnesis HTTP/1.1"));
    assert_eq!(err.status(), Some(404));
    match err {
        ApiError::Status { body, reason, .. } => {
            assert_eq!(reason, "Not Found");
            assert!(body.contains("Anamnesis not found"));
        }
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[test]
fn test_predict_is_post_without_body() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"suggestions":[{"disease_name":"Migraine","probability":0.72}],"referrals":[]}"#,
    );

    let predictions = client(&base).predict(2).expect("Should predict");
    let request = server.join().expect("Server thread");

    assert!(request.starts_with("POST /api/v1/clinical/visits/2/predict HTTP/1.1"));
    assert_eq!(predictions.suggestions[0].disease_name, "Migraine");
    assert!(predictions.referrals.is_empty());
}

#[test]
fn test_examination_upload_is_multipart() {
    let dir = tempfile::tempdir().expect("Temp dir");
    let path = dir.path().join("chest.png");
    std::fs::write(&path, b"fake image bytes").expect("Write file");

    let draft = ExaminationDraft {
        examination_name: "Chest X-ray".to_string(),
        file: Some(path),
        result_text: "No findings".to_string(),
    };
    let upload = draft.ready().expect("Draft is complete");

    let (base, server) = serve_once(
        "200 OK",
        r#"{"s3_path":"visits/4/chest.png","visit_examination_id":11}"#,
    );

    let uploaded = client(&base)
        .upload_examination(4, &upload)
        .expect("Should upload");
    let request = server.join().expect("Server thread");

    assert!(request.starts_with("POST /api/v1/clinical/visits/4/examinations HTTP/1.1"));
    assert!(request
        .to_lowercase()
        .contains("content-type: multipart/form-data; boundary="));
    assert!(request.contains("name=\"examination_name\""));
    assert!(request.contains("Chest X-ray"));
    assert!(request.contains("filename=\"chest.png\""));
    assert!(request.contains("image/png"));
    assert!(request.contains("fake image bytes"));
    assert!(request.contains("name=\"result_text\""));
    assert_eq!(uploaded.visit_examination_id, 11);
}

#[test]
fn test_examination_upload_sends_result_data() {
    let dir = tempfile::tempdir().expect("Temp dir");
    let path = dir.path().join("spiro.csv");
    std::fs::write(&path, b"fev1,2.9").expect("Write file");

    let upload = ExaminationUpload {
        examination_name: "Spirometry".to_string(),
        file: path,
        result_text: None,
        result_data: Some(r#"{"fev1":2.9}"#.to_string()),
    };

    let (base, server) = serve_once(
        "200 OK",
        r#"{"s3_path":"visits/5/spiro.csv","visit_examination_id":12}"#,
    );

    let uploaded = client(&base)
        .upload_examination(5, &upload)
        .expect("Should upload");
    let request = server.join().expect("Server thread");

    assert!(request.contains("name=\"result_data\""));
    assert!(request.contains(r#"{"fev1":2.9}"#));
    assert!(!request.contains("name=\"result_text\""));
    assert_eq!(uploaded.visit_examination_id, 12);
}

#[test]
fn test_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Bind local port");
    let base = format!("http://{}", listener.local_addr().expect("Local addr"));
    drop(listener);

    let err = client(&base).get_patient(1).unwrap_err();
    assert!(matches!(err, ApiError::Connection(_)), "got {err:?}");
}
