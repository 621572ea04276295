//! Output schema for marksheet extraction.
//!
//! Every extracted datum is a [`FieldValue`]: an optional string plus a
//! confidence in `[0, 1]`. The top-level [`MarksheetOutput`] is always fully
//! populated — a field that could not be read is `(None, 0.0)`, never absent
//! from the record. This keeps the JSON contract stable for downstream
//! consumers regardless of how badly the upstream stages went.
//!
//! The serde field names here *are* the wire format; renaming one is a
//! breaking API change.

use serde::{Deserialize, Serialize};

/// A single recognised word from the OCR engine.
///
/// Produced once per word by [`crate::pipeline::ocr::recognize`]; immutable
/// and scoped to a single extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Recognised word text, as reported by the engine (trimmed, non-empty).
    pub text: String,
    /// Confidence normalised to `[0, 1]`. The engine's native 0–100 score is
    /// divided by 100 and clamped; missing or unparseable scores become 0.0.
    pub conf: f64,
    /// Bounding box in pixels: `[left, top, width, height]`.
    pub bbox: [i64; 4],
    /// 1-indexed page the word was found on.
    pub page: u32,
}

/// An extracted value paired with a confidence score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub confidence: f64,
}

impl Default for FieldValue {
    fn default() -> Self {
        Self {
            value: None,
            confidence: 0.0,
        }
    }
}

impl FieldValue {
    /// Construct a field with a known value and confidence.
    pub fn new(value: impl Into<String>, confidence: f64) -> Self {
        Self {
            value: Some(value.into()),
            confidence,
        }
    }
}

/// Identity fields of the candidate. The set is closed — marksheets carry a
/// fixed vocabulary of identity data and downstream consumers index these by
/// name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateDetails {
    #[serde(default)]
    pub name: FieldValue,
    #[serde(default)]
    pub father_name: FieldValue,
    #[serde(default)]
    pub mother_name: FieldValue,
    #[serde(default)]
    pub roll_no: FieldValue,
    #[serde(default)]
    pub registration_no: FieldValue,
    #[serde(default)]
    pub dob: FieldValue,
    #[serde(default)]
    pub exam_year: FieldValue,
    #[serde(default)]
    pub board: FieldValue,
    #[serde(default)]
    pub institution: FieldValue,
}

/// One row of the subject/marks table.
///
/// `grade` is optional because many boards print marks-only tables; when the
/// model reports no grade the field stays absent rather than value-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectMark {
    #[serde(default)]
    pub subject: FieldValue,
    #[serde(default)]
    pub max_marks: FieldValue,
    #[serde(default)]
    pub obtained_marks: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<FieldValue>,
}

/// The complete extraction result — the only externally visible output type.
///
/// Constructed fresh per request by the structured parser (either from model
/// output or via [`MarksheetOutput::degraded`]), then updated field by field
/// by the fusion engine. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarksheetOutput {
    #[serde(default)]
    pub candidate: CandidateDetails,
    #[serde(default)]
    pub subjects: Vec<SubjectMark>,
    #[serde(default)]
    pub overall_result: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_place: Option<FieldValue>,
    #[serde(default)]
    pub confidence_explanation: Option<String>,
    #[serde(default)]
    pub raw_text: Option<String>,
}

/// Diagnostic strings carried in `confidence_explanation` when the parser
/// fails are capped at this many characters (after the `llm_error: ` prefix).
const DIAGNOSTIC_MAX_CHARS: usize = 200;

impl MarksheetOutput {
    /// The universal zero-confidence fallback returned whenever structured
    /// parsing cannot succeed.
    ///
    /// Every candidate field is `(None, 0.0)`, subjects are empty, and
    /// `confidence_explanation` carries an `llm_error:`-prefixed diagnostic
    /// truncated to 200 characters. `raw_text` keeps the OCR text so callers
    /// can still see what the document said.
    pub fn degraded(raw_text: &str, reason: &str) -> Self {
        let diagnostic: String = reason.chars().take(DIAGNOSTIC_MAX_CHARS).collect();
        Self {
            raw_text: Some(raw_text.to_string()),
            confidence_explanation: Some(format!("llm_error: {diagnostic}")),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_field_is_empty_zero_confidence() {
        let f = FieldValue::default();
        assert_eq!(f.value, None);
        assert_eq!(f.confidence, 0.0);
    }

    #[test]
    fn default_output_is_fully_populated() {
        let out = MarksheetOutput::default();
        assert_eq!(out.candidate.name, FieldValue::default());
        assert_eq!(out.candidate.institution, FieldValue::default());
        assert!(out.subjects.is_empty());
        assert_eq!(out.overall_result, FieldValue::default());
        assert!(out.issue_date.is_none());
        assert!(out.raw_text.is_none());
    }

    #[test]
    fn degraded_record_carries_prefixed_diagnostic() {
        let out = MarksheetOutput::degraded("some ocr text", "connection refused");
        assert_eq!(out.raw_text.as_deref(), Some("some ocr text"));
        assert_eq!(
            out.confidence_explanation.as_deref(),
            Some("llm_error: connection refused")
        );
        assert!(out.subjects.is_empty());
        assert_eq!(out.overall_result.confidence, 0.0);
    }

    #[test]
    fn degraded_diagnostic_truncates_to_200_chars() {
        let long = "x".repeat(500);
        let out = MarksheetOutput::degraded("", &long);
        let explanation = out.confidence_explanation.unwrap();
        assert_eq!(explanation, format!("llm_error: {}", "x".repeat(200)));
    }

    #[test]
    fn serde_field_names_are_stable() {
        let mut out = MarksheetOutput::default();
        out.candidate.roll_no = FieldValue::new("R-1024", 0.9);
        out.subjects.push(SubjectMark {
            subject: FieldValue::new("Physics", 0.8),
            grade: Some(FieldValue::new("A", 0.7)),
            ..SubjectMark::default()
        });

        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["candidate"]["roll_no"]["value"], "R-1024");
        assert_eq!(json["subjects"][0]["subject"]["value"], "Physics");
        assert_eq!(json["subjects"][0]["grade"]["value"], "A");
        assert_eq!(json["overall_result"]["confidence"], 0.0);
    }

    #[test]
    fn grade_absent_is_omitted_from_json() {
        let mark = SubjectMark::default();
        let json = serde_json::to_string(&mark).unwrap();
        assert!(!json.contains("grade"));
    }

    #[test]
    fn deserialises_partial_model_output() {
        // Models routinely omit fields they could not read; serde defaults
        // must fill the gaps so the record is always fully populated.
        let json = r#"{
            "candidate": { "name": { "value": "Priya Sharma", "confidence": 0.92 } },
            "subjects": [],
            "overall_result": { "value": "PASS", "confidence": 0.9 }
        }"#;
        let out: MarksheetOutput = serde_json::from_str(json).unwrap();
        assert_eq!(out.candidate.name.value.as_deref(), Some("Priya Sharma"));
        assert_eq!(out.candidate.father_name, FieldValue::default());
        assert_eq!(out.overall_result.value.as_deref(), Some("PASS"));
    }
}
