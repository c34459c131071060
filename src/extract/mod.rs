//! Structured query extraction from free-text claim questions
//!
//! Deterministic pattern rules run first and are the ground truth: they always
//! yield a fully populated `QueryRecord`. A generative enrichment pass may
//! then confirm or override individual fields, but only keys actually present
//! in its (repaired) output are taken; anything missing falls back to the
//! deterministic value. Extraction therefore never fails, no matter what the
//! generator does.

use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::GenerativeError;
use crate::llm::{generate_structured, GenerativeClient};
use crate::models::{Gender, QueryRecord};
use crate::repair::RepairEngine;

/// Procedures the deterministic rules recognize by exact substring.
const KNOWN_PROCEDURES: &[&str] = &[
    "knee surgery",
    "cataract surgery",
    "angioplasty",
    "appendectomy",
];

pub struct QueryExtractor {
    llm: Arc<dyn GenerativeClient>,
    repair: RepairEngine,
    duration_re: Regex,
    age_re: Regex,
    location_re: Regex,
}

impl QueryExtractor {
    pub fn new(llm: Arc<dyn GenerativeClient>) -> Self {
        Self {
            llm,
            repair: RepairEngine::new(),
            duration_re: Regex::new(r"(?i)(\d+)\s*(month|year|week|day)s?")
                .expect("valid duration pattern"),
            age_re: Regex::new(r"(?i)(\d+)-?\s*year[- ]old").expect("valid age pattern"),
            location_re: Regex::new(r"(?i)in\s+([A-Za-z\s]+?)(?:,|$)")
                .expect("valid location pattern"),
        }
    }

    /// Extract a `QueryRecord` from free text. Total: the deterministic
    /// record is returned untouched whenever enrichment fails.
    pub async fn extract(&self, free_text: &str) -> QueryRecord {
        let deterministic = self.deterministic_extract(free_text);
        debug!(?deterministic, "deterministic extraction");

        match self.enrich(free_text, &deterministic).await {
            Ok(enriched) => enriched,
            Err(e) => {
                warn!("generative enrichment failed, using deterministic record: {}", e);
                deterministic
            }
        }
    }

    /// Pattern-rule extraction. Pure and infallible; every field gets a value.
    pub fn deterministic_extract(&self, text: &str) -> QueryRecord {
        let lower = text.to_lowercase();

        let policy_duration_months = self
            .duration_re
            .captures(text)
            .and_then(|c| {
                let value: u32 = c[1].parse().ok()?;
                Some(convert_to_months(value, &c[2].to_lowercase()))
            })
            .unwrap_or(0);

        let age = self
            .age_re
            .captures(text)
            .and_then(|c| c[1].parse::<u32>().ok());

        // "male" is checked first and wins whenever both substrings appear;
        // "female" contains "male", so it wins there too. Established
        // behavior, covered by tests.
        let gender = if lower.contains("male") {
            Gender::Male
        } else if lower.contains("female") {
            Gender::Female
        } else {
            Gender::Other
        };

        let procedure = KNOWN_PROCEDURES
            .iter()
            .find(|p| lower.contains(**p))
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown procedure".to_string());

        let location = self
            .location_re
            .captures(text)
            .map(|c| c[1].trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        QueryRecord {
            age,
            gender,
            procedure,
            location,
            policy_duration_months,
        }
    }

    /// Generative confirmation pass. Fields present in the parsed output
    /// override the deterministic ones; everything else is left as-is.
    async fn enrich(
        &self,
        free_text: &str,
        deterministic: &QueryRecord,
    ) -> Result<QueryRecord, GenerativeError> {
        let prompt = build_extraction_prompt(free_text, deterministic);
        let parsed = generate_structured(self.llm.as_ref(), &self.repair, &prompt).await?;
        Ok(merge_parsed_fields(deterministic, &parsed))
    }
}

/// Unit conversion to months. Weeks and days use integer division, so
/// sub-month policies round down to 0; established behavior, keep it.
fn convert_to_months(value: u32, unit: &str) -> u32 {
    match unit {
        "year" => value * 12,
        "week" => value / 4,
        "day" => value / 30,
        _ => value,
    }
}

/// Constrained prompt embedding the deterministic extraction as the template
/// the generator is asked to confirm or replace.
fn build_extraction_prompt(query: &str, deterministic: &QueryRecord) -> String {
    let age = deterministic
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "null".to_string());
    let gender = serde_json::to_string(&deterministic.gender).unwrap_or_else(|_| "\"other\"".into());

    format!(
        r#"Extract information from this query and return ONLY a JSON object with these exact fields:

Query: "{query}"

Return this JSON structure (replace values with extracted data):
{{
  "age": {age},
  "gender": {gender},
  "procedure": "{procedure}",
  "location": "{location}",
  "policy_duration_months": {duration}
}}

IMPORTANT: Return ONLY the JSON object above. No explanations, no markdown, no extra text."#,
        query = query,
        age = age,
        gender = gender,
        procedure = deterministic.procedure,
        location = deterministic.location,
        duration = deterministic.policy_duration_months,
    )
}

/// Per-key override with deterministic defaults: a key absent from the parsed
/// value (or carrying an unusable type) keeps the deterministic field.
fn merge_parsed_fields(deterministic: &QueryRecord, parsed: &Value) -> QueryRecord {
    let mut record = deterministic.clone();

    if let Some(age_value) = parsed.get("age") {
        // explicit null means "no age found" and is honored; anything that
        // does not fit u32 is unusable and keeps the deterministic value
        if age_value.is_null() {
            record.age = None;
        } else if let Some(age) = age_value.as_u64().and_then(|v| u32::try_from(v).ok()) {
            record.age = Some(age);
        }
    }
    if let Some(gender) = parsed.get("gender").and_then(Value::as_str) {
        record.gender = Gender::parse(gender);
    }
    if let Some(procedure) = parsed.get("procedure").and_then(Value::as_str) {
        if !procedure.trim().is_empty() {
            record.procedure = procedure.trim().to_lowercase();
        }
    }
    if let Some(location) = parsed.get("location").and_then(Value::as_str) {
        if !location.trim().is_empty() {
            record.location = location.trim().to_string();
        }
    }
    if let Some(duration) = parsed
        .get("policy_duration_months")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
    {
        record.policy_duration_months = duration;
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::llm::GenerationOptions;

    /// Double that always fails, forcing the deterministic path.
    struct DeadClient;

    #[async_trait]
    impl GenerativeClient for DeadClient {
        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, GenerativeError> {
            Err(GenerativeError::EmptyResponse)
        }
    }

    /// Double that always returns the same canned text.
    struct CannedClient(String);

    #[async_trait]
    impl GenerativeClient for CannedClient {
        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<String, GenerativeError> {
            Ok(self.0.clone())
        }
    }

    fn extractor_with(client: impl GenerativeClient + 'static) -> QueryExtractor {
        QueryExtractor::new(Arc::new(client))
    }

    #[test]
    fn extracts_canonical_example() {
        let extractor = extractor_with(DeadClient);
        let record = extractor.deterministic_extract("45-year old male needs knee surgery");
        assert_eq!(record.age, Some(45));
        assert_eq!(record.gender, Gender::Male);
        assert_eq!(record.procedure, "knee surgery");
        assert_eq!(record.policy_duration_months, 0);
        assert_eq!(record.location, "unknown");
    }

    #[test]
    fn duration_unit_conversion() {
        let extractor = extractor_with(DeadClient);
        let months = |text: &str| extractor.deterministic_extract(text).policy_duration_months;
        assert_eq!(months("policy active for 2 years"), 24);
        assert_eq!(months("6 months into the policy"), 6);
        assert_eq!(months("bought the policy 9 weeks ago"), 2);
        assert_eq!(months("policy is 45 days old"), 1);
        // integer division: sub-month durations collapse to zero
        assert_eq!(months("1 week old policy"), 0);
        assert_eq!(months("29 days since purchase"), 0);
        assert_eq!(months("no duration mentioned"), 0);
    }

    #[test]
    fn gender_precedence_male_wins() {
        let extractor = extractor_with(DeadClient);
        let gender = |text: &str| extractor.deterministic_extract(text).gender;
        assert_eq!(gender("a male patient"), Gender::Male);
        // "female" contains "male": the male branch wins, by precedent
        assert_eq!(gender("a female patient"), Gender::Male);
        assert_eq!(gender("the patient"), Gender::Other);
    }

    #[test]
    fn location_extraction() {
        let extractor = extractor_with(DeadClient);
        let record =
            extractor.deterministic_extract("knee surgery in Pune, policy is 3 months old");
        assert_eq!(record.location, "Pune");
        assert_eq!(record.policy_duration_months, 3);
    }

    #[test]
    fn unknown_procedure_fallback() {
        let extractor = extractor_with(DeadClient);
        let record = extractor.deterministic_extract("needs a brain transplant");
        assert_eq!(record.procedure, "unknown procedure");
    }

    #[tokio::test]
    async fn dead_generator_yields_deterministic_record() {
        let extractor = extractor_with(DeadClient);
        let record = extractor.extract("45-year old male needs knee surgery").await;
        assert_eq!(record.age, Some(45));
        assert_eq!(record.procedure, "knee surgery");
    }

    #[tokio::test]
    async fn enrichment_overrides_only_present_keys() {
        // generator corrects the procedure but says nothing about the rest
        let extractor = extractor_with(CannedClient(
            "{\"procedure\": \"Knee Arthroscopy\"}".to_string(),
        ));
        let record = extractor
            .extract("45-year old male needs knee surgery, policy is 6 months old")
            .await;
        assert_eq!(record.procedure, "knee arthroscopy");
        // defaults preserved for keys the generator omitted
        assert_eq!(record.age, Some(45));
        assert_eq!(record.gender, Gender::Male);
        assert_eq!(record.policy_duration_months, 6);
    }

    #[tokio::test]
    async fn out_of_range_enrichment_numbers_keep_deterministic_values() {
        // 4294967381 is u32::MAX + 86: a wrapping cast would turn it into 85
        // and flip the verdict to conditional via the age rule
        let extractor = extractor_with(CannedClient(
            "{\"age\": 4294967381, \"policy_duration_months\": 99999999999}".to_string(),
        ));
        let record = extractor
            .extract("45-year old male needs knee surgery, policy is 6 months old")
            .await;
        assert_eq!(record.age, Some(45));
        assert_eq!(record.policy_duration_months, 6);
        assert_eq!(
            crate::decision::decide(&record).decision,
            crate::models::Decision::Approved
        );
    }

    #[tokio::test]
    async fn garbage_enrichment_is_ignored() {
        let extractor = extractor_with(CannedClient(
            "I'm sorry, I can't produce structured output right now.".to_string(),
        ));
        let record = extractor.extract("cataract surgery, 12 month policy").await;
        assert_eq!(record.procedure, "cataract surgery");
        assert_eq!(record.policy_duration_months, 12);
    }
}
