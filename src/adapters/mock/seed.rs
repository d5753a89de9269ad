//! Demo records for the in-memory adapter.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::json;

use super::MockState;
use crate::domain::{
    Anamnesis, DiagnosisSuggestion, ExamResult, General, Genetic, Lifestyle, Patient,
    Predictions, ReferralSuggestion, Sex, Smoking, Visit,
};

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn strings(items: &[&str]) -> Option<Vec<String>> {
    Some(items.iter().map(|s| (*s).to_string()).collect())
}

fn patient(id: i64, dob: Option<NaiveDate>, age: u32, sex: Sex, created_at: &str) -> Patient {
    Patient {
        id,
        date_of_birth: dob,
        recorded_age: Some(age),
        sex: Some(sex),
        created_at: created_at.to_string(),
    }
}

fn visit(id: i64, patient_id: i64, doctor: &str, status: &str, created_at: &str) -> Visit {
    Visit {
        id,
        patient_id,
        doctor_id: Some(doctor.to_string()),
        status: status.to_string(),
        created_at: created_at.to_string(),
    }
}

fn suggestion(name: &str, probability: f64, rationale: &str) -> DiagnosisSuggestion {
    DiagnosisSuggestion {
        disease_name: name.to_string(),
        probability,
        rationale: Some(rationale.to_string()),
    }
}

fn referral(specialty: &str, note: &str) -> ReferralSuggestion {
    ReferralSuggestion {
        specialty: specialty.to_string(),
        note: Some(note.to_string()),
    }
}

fn exam(
    id: i64,
    name: &str,
    s3_path: &str,
    text: &str,
    data: serde_json::Value,
    created_at: &str,
) -> ExamResult {
    ExamResult {
        id,
        examination_name: name.to_string(),
        s3_path: s3_path.to_string(),
        result_text: Some(text.to_string()),
        result_data: data,
        created_at: created_at.to_string(),
    }
}

pub(super) fn state() -> MockState {
    let patients = vec![
        patient(1, date(1985, 3, 15), 39, Sex::Male, "2024-01-15T10:30:00Z"),
        patient(2, date(1992, 7, 22), 32, Sex::Female, "2024-01-16T14:20:00Z"),
        patient(3, date(1978, 11, 8), 46, Sex::Male, "2024-01-17T09:15:00Z"),
        patient(4, date(1995, 5, 30), 29, Sex::Female, "2024-01-18T16:45:00Z"),
    ];

    let visits = vec![
        visit(1, 1, "dr_001", "completed", "2024-01-15T10:30:00Z"),
        visit(2, 2, "dr_002", "in_progress", "2024-01-16T14:20:00Z"),
        visit(3, 3, "dr_001", "pending", "2024-01-17T09:15:00Z"),
        visit(4, 4, "dr_003", "in_progress", "2024-01-18T16:45:00Z"),
        visit(5, 1, "dr_002", "completed", "2024-01-20T11:00:00Z"),
    ];

    let mut anamnesis = HashMap::new();
    anamnesis.insert(
        1,
        Anamnesis {
            general: Some(General {
                age: Some(39),
                sex: Some(Sex::Male),
            }),
            genetic: Some(Genetic {
                has_family_history: Some(true),
                details: Some("Father had cardiovascular disease".to_string()),
            }),
            lifestyle: Some(Lifestyle {
                smoking: Some(Smoking {
                    yes: Some(true),
                    years: Some(15),
                }),
                alcohol: Some("Moderate".to_string()),
                activity: Some("Low physical activity".to_string()),
                diet: strings(&["High fat intake", "Few vegetables"]),
            }),
            past_conditions: strings(&["Arterial hypertension", "Gastritis"]),
            surgeries_traumas: strings(&["Appendectomy (2010)"]),
            medications: strings(&["Lisinopril 10 mg", "Atorvastatin 20 mg"]),
            allergies: strings(&["Penicillin"]),
            complaints: strings(&[
                "Chest pain on exertion",
                "Shortness of breath",
                "Fatigue",
            ]),
        },
    );
    anamnesis.insert(
        2,
        Anamnesis {
            general: Some(General {
                age: Some(32),
                sex: Some(Sex::Female),
            }),
            genetic: Some(Genetic {
                has_family_history: Some(false),
                details: Some(String::new()),
            }),
            lifestyle: Some(Lifestyle {
                smoking: Some(Smoking {
                    yes: Some(false),
                    years: Some(0),
                }),
                alcohol: Some("None".to_string()),
                activity: Some("Regular exercise".to_string()),
                diet: strings(&["Balanced diet"]),
            }),
            past_conditions: strings(&[]),
            surgeries_traumas: strings(&[]),
            medications: strings(&[]),
            allergies: strings(&[]),
            complaints: strings(&["Headaches", "Sleep disturbance", "Anxiety"]),
        },
    );

    let mut examinations = HashMap::new();
    examinations.insert(
        1,
        vec![
            exam(
                1,
                "ECG",
                "/mock/ecg_patient_1.pdf",
                "Sinus rhythm, signs of left ventricular hypertrophy",
                json!({ "heart_rate": 78, "rhythm": "sinus", "abnormalities": ["LVH"] }),
                "2024-01-15T11:00:00Z",
            ),
            exam(
                2,
                "Blood panel",
                "/mock/blood_test_patient_1.pdf",
                "Raised cholesterol, normal glucose",
                json!({ "cholesterol": 6.2, "glucose": 5.1, "hemoglobin": 145 }),
                "2024-01-15T11:30:00Z",
            ),
        ],
    );
    examinations.insert(
        2,
        vec![exam(
            3,
            "Brain MRI",
            "/mock/mri_brain_patient_2.dcm",
            "No structural changes",
            json!({ "findings": "normal", "contrast": false }),
            "2024-01-16T15:00:00Z",
        )],
    );

    let mut predictions = HashMap::new();
    predictions.insert(
        1,
        Predictions {
            suggestions: vec![
                suggestion(
                    "Coronary artery disease",
                    0.85,
                    "Family history of cardiovascular disease, 15 years of smoking, chest pain on exertion, LVH on ECG",
                ),
                suggestion(
                    "Arterial hypertension",
                    0.92,
                    "Hypertension already on record, takes Lisinopril, smoking and low activity",
                ),
                suggestion(
                    "Dyslipidemia",
                    0.78,
                    "Raised cholesterol (6.2 mmol/L), takes statins, high fat diet",
                ),
            ],
            referrals: vec![
                referral("Cardiologist", "Cardiovascular risk assessment and therapy review"),
                referral("Stress test", "Exercise test of cardiac function"),
                referral("Echocardiography", "Ultrasound of myocardial structure and function"),
            ],
        },
    );
    predictions.insert(
        2,
        Predictions {
            suggestions: vec![
                suggestion(
                    "Migraine",
                    0.72,
                    "Typical headaches in a young woman, normal MRI, accompanying sleep disturbance",
                ),
                suggestion(
                    "Anxiety disorder",
                    0.65,
                    "Raised anxiety, sleep disturbance, tension headaches",
                ),
                suggestion(
                    "Chronic fatigue syndrome",
                    0.45,
                    "Some symptoms overlap but no characteristic long-term fatigue",
                ),
            ],
            referrals: vec![
                referral("Neurologist", "Differential diagnosis of headaches"),
                referral("Psychotherapist", "Work on anxiety and sleep problems"),
                referral("Headache diary", "Keep a diary to find headache triggers"),
            ],
        },
    );

    MockState {
        patients,
        visits,
        anamnesis,
        examinations,
        predictions,
    }
}
