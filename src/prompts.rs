//! Instruction templates for LLM-based marksheet structuring.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tightening the schema instructions or the
//!    output rules requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the assembled request text
//!    without spinning up a real provider, making prompt regressions easy to
//!    catch.

/// System message for the chat-completion provider.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that extracts structured student marksheet data.";

/// Instruction template prepended to the raw OCR text.
///
/// The schema keys named here must stay in lockstep with
/// [`crate::schema::MarksheetOutput`] — the model's JSON is deserialised
/// directly into that type.
pub const EXTRACTION_PROMPT: &str = r#"You are given raw OCR text of an academic marksheet. Extract fields into a JSON object matching the schema described.
Return only valid JSON.
Schema keys: candidate (with name,father_name,mother_name,roll_no,registration_no,dob,exam_year,board,institution) each with value and confidence (0-1),
subjects: list of {subject, max_marks, obtained_marks, grade?} each with value+confidence,
overall_result {value, confidence}, issue_date {value, confidence}, issue_place {value, confidence}.
Also include raw_text and confidence_explanation."#;

/// Assemble the full request text for a document's OCR output.
pub fn build_prompt(raw_text: &str) -> String {
    format!("{EXTRACTION_PROMPT}\n\nOCR_TEXT:\n{raw_text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_ocr_text_after_marker() {
        let p = build_prompt("ROLL NO 1024");
        assert!(p.starts_with(EXTRACTION_PROMPT));
        assert!(p.ends_with("OCR_TEXT:\nROLL NO 1024"));
    }

    #[test]
    fn prompt_names_every_candidate_key() {
        for key in [
            "name",
            "father_name",
            "mother_name",
            "roll_no",
            "registration_no",
            "dob",
            "exam_year",
            "board",
            "institution",
        ] {
            assert!(EXTRACTION_PROMPT.contains(key), "missing key: {key}");
        }
    }
}
