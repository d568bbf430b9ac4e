//! Rubric score validation and the weighted composite.
//!
//! Weights: urgency 30%, budget 30%, fit 25%, contactability 15%.

use prospector_shared::{ProspectorError, Result, Score};
use serde_json::{Map, Value};

const URGENCY_WEIGHT: u32 = 30;
const BUDGET_WEIGHT: u32 = 30;
const FIT_WEIGHT: u32 = 25;
const CONTACTABILITY_WEIGHT: u32 = 15;

const FIT_KEYS: &[&str] = &["fit", "fitScore", "fit_score"];
const COMPOSITE_KEYS: &[&str] = &["composite", "overallScore", "overall_score"];
const RATIONALE_KEYS: &[&str] = &["rationale", "reasoning"];

/// Weighted composite, rounded half up.
///
/// Integer arithmetic over percent weights, so the result is exact.
pub fn compute_composite(score: &Score) -> u8 {
    let weighted = URGENCY_WEIGHT * u32::from(score.urgency)
        + BUDGET_WEIGHT * u32::from(score.budget)
        + FIT_WEIGHT * u32::from(score.fit)
        + CONTACTABILITY_WEIGHT * u32::from(score.contactability);
    // Sub-scores are capped at 100, so this never exceeds 100.
    ((weighted + 50) / 100) as u8
}

/// Validate a raw oracle payload into a [`Score`].
///
/// The four sub-scores are required integers in `[0, 100]`. A present,
/// non-null composite must also be valid and is kept as given; otherwise the
/// composite is computed.
pub fn validate(raw: &Value) -> Result<Score> {
    let Value::Object(obj) = raw else {
        return Err(ProspectorError::schema(format!(
            "score payload must be a JSON object, got {}",
            kind_of(raw)
        )));
    };

    let urgency = required(obj, "urgency", &["urgency"])?;
    let budget = required(obj, "budget", &["budget"])?;
    let fit = required(obj, "fit", FIT_KEYS)?;
    let contactability = required(obj, "contactability", &["contactability"])?;

    let rationale = match lookup(obj, RATIONALE_KEYS) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    let mut score = Score {
        urgency,
        budget,
        fit,
        contactability,
        composite: 0,
        rationale,
    };

    score.composite = match lookup(obj, COMPOSITE_KEYS) {
        Some(value) => sub_score("composite", value)?,
        None => compute_composite(&score),
    };

    Ok(score)
}

/// First non-null value under any of `keys`.
fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn required(obj: &Map<String, Value>, name: &str, keys: &[&str]) -> Result<u8> {
    let value = lookup(obj, keys)
        .ok_or_else(|| ProspectorError::schema(format!("missing required field '{name}'")))?;
    sub_score(name, value)
}

fn sub_score(name: &str, value: &Value) -> Result<u8> {
    let Value::Number(n) = value else {
        return Err(ProspectorError::schema(format!(
            "'{name}' must be an integer, got {}",
            kind_of(value)
        )));
    };

    let int = match n.as_i64() {
        Some(i) => i,
        None => {
            // Integral floats such as 72.0 are accepted.
            let f = n.as_f64().unwrap_or(f64::NAN);
            if !f.is_finite() || f.fract() != 0.0 {
                return Err(ProspectorError::schema(format!(
                    "'{name}' must be an integer, got {n}"
                )));
            }
            if !(0.0..=100.0).contains(&f) {
                return Err(ProspectorError::schema(format!(
                    "'{name}' out of range [0, 100]: {n}"
                )));
            }
            f as i64
        }
    };

    u8::try_from(int)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| ProspectorError::schema(format!("'{name}' out of range [0, 100]: {int}")))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
