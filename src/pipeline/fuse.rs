//! Confidence fusion: blend model-reported and OCR-derived confidence.
//!
//! The model and the OCR engine judge the same extraction from independent
//! evidence — the model from linguistic plausibility, the engine from pixel
//! quality. Blending the two punishes fields the model is sure about but
//! the page barely supports (a hallucinated roll number scores high model
//! confidence and near-zero OCR confidence), and vice versa.
//!
//! For each field: `final = round(w_model·model_conf + w_ocr·ocr_conf, 3)`,
//! where `ocr_conf` is recomputed here by matching the field's words
//! against the extracted tokens.
//!
//! Fusion is strictly single-pass: the pipeline invokes it exactly once per
//! record, after structured parsing, and the pre-fusion model confidences
//! are not retained. Running it twice would blend an already-fused score as
//! if it were the model's — callers composing the stages by hand must not
//! re-invoke it on a fused record.

use crate::config::FusionWeights;
use crate::schema::{FieldValue, MarksheetOutput, Token};
use tracing::debug;

/// Rewrite every field confidence in `record` as the weighted blend.
///
/// Applied to all nine candidate fields, each subject row (grade only when
/// present), `overall_result`, and `issue_date`/`issue_place` when present.
/// Absent optional fields are not touched. Afterwards
/// `confidence_explanation` is unconditionally overwritten with the blend
/// description — including on degraded records, whose `llm_error:` text has
/// served its purpose by then (the zeroed confidences carry the signal).
pub fn fuse_confidences(record: &mut MarksheetOutput, tokens: &[Token], weights: FusionWeights) {
    let candidate = &mut record.candidate;
    for field in [
        &mut candidate.name,
        &mut candidate.father_name,
        &mut candidate.mother_name,
        &mut candidate.roll_no,
        &mut candidate.registration_no,
        &mut candidate.dob,
        &mut candidate.exam_year,
        &mut candidate.board,
        &mut candidate.institution,
    ] {
        blend_field(field, tokens, weights);
    }

    for subject in &mut record.subjects {
        blend_field(&mut subject.subject, tokens, weights);
        blend_field(&mut subject.max_marks, tokens, weights);
        blend_field(&mut subject.obtained_marks, tokens, weights);
        if let Some(grade) = subject.grade.as_mut() {
            blend_field(grade, tokens, weights);
        }
    }

    blend_field(&mut record.overall_result, tokens, weights);
    if let Some(field) = record.issue_date.as_mut() {
        blend_field(field, tokens, weights);
    }
    if let Some(field) = record.issue_place.as_mut() {
        blend_field(field, tokens, weights);
    }

    record.confidence_explanation = Some(explanation(weights));
    debug!(tokens = tokens.len(), subjects = record.subjects.len(), "confidence fusion applied");
}

/// Blend one field in place.
fn blend_field(field: &mut FieldValue, tokens: &[Token], weights: FusionWeights) {
    let model_conf = field.confidence;
    let value = field.value.as_deref().unwrap_or("");
    let ocr_conf = ocr_confidence_for_value(value, tokens);
    field.confidence = round3(weights.model * model_conf + weights.ocr * ocr_conf);
}

/// OCR-derived confidence for a textual value.
///
/// Splits the value on whitespace and scores each word by matching it
/// against the token list: exact match on normalised text first, then
/// substring containment of the normalised word in the lowercased token
/// text. A word's score is the mean confidence of its matching tokens
/// (0.0 when nothing matches); the value's score is the mean over words.
/// An empty value, or an empty token list, scores 0.0.
pub fn ocr_confidence_for_value(value: &str, tokens: &[Token]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let words: Vec<&str> = value.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }

    let mut scores = Vec::with_capacity(words.len());
    for word in words {
        let normalized = normalize(word);

        let exact: Vec<f64> = tokens
            .iter()
            .filter(|t| normalize(&t.text) == normalized)
            .map(|t| t.conf)
            .collect();
        let matches = if exact.is_empty() {
            tokens
                .iter()
                .filter(|t| t.text.to_lowercase().contains(&normalized))
                .map(|t| t.conf)
                .collect()
        } else {
            exact
        };

        scores.push(if matches.is_empty() { 0.0 } else { mean(&matches) });
    }

    mean(&scores)
}

/// Lowercase and strip the punctuation OCR engines most often glue onto
/// words (trailing commas and periods, hyphenated line breaks).
fn normalize(word: &str) -> String {
    word.to_lowercase()
        .trim_matches(|c: char| matches!(c, ' ' | ',' | '.' | '-'))
        .to_string()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// The fixed description written into `confidence_explanation`.
fn explanation(weights: FusionWeights) -> String {
    format!(
        "Combined confidence = {}*LLM_conf + {}*OCR_conf. \
         OCR confidence is token-average for matched words (exact match on \
         normalised text, else substring containment); LLM_conf is from model output.",
        weights.model, weights.ocr
    )
}
