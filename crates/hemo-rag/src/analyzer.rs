//! Language-model assessment of extracted blood parameters.

use std::fmt::Write as _;
use std::sync::Arc;

use hemo_core::error::{Error, Result};
use hemo_core::report::{extract_parameters, BloodParameters, HemoglobinopathyClass};
use hemo_core::traits::AnswerGenerator;
use serde::Serialize;

pub const ANALYSIS_SYSTEM_ROLE: &str = "You are a medical expert specializing in hemoglobinopathy analysis.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub parameters: BloodParameters,
    /// Full model reply, reasoning included.
    pub text: String,
    /// Category named in the reply, if any.
    pub category: Option<HemoglobinopathyClass>,
}

pub struct ReportAnalyzer {
    generator: Arc<dyn AnswerGenerator>,
}

impl ReportAnalyzer {
    /// `generator` should be configured with the analysis temperature.
    pub fn new(generator: Arc<dyn AnswerGenerator>) -> Self {
        Self { generator }
    }

    pub fn analyze(&self, parameters: &BloodParameters) -> Result<Assessment> {
        if parameters.is_empty() {
            tracing::warn!("no blood parameters found, assessment will rely on N/A values");
        }
        let prompt = build_prompt(parameters);
        let text = self
            .generator
            .complete(ANALYSIS_SYSTEM_ROLE, &prompt)
            .map_err(|e| Error::AnswerUnavailable(format!("assessment failed: {e}")))?;
        let category = HemoglobinopathyClass::detect(&text);
        tracing::info!(found = parameters.found_count(), category = ?category, "report assessed");
        Ok(Assessment { parameters: parameters.clone(), text, category })
    }

    /// Extract parameters from report text, then assess them.
    pub fn analyze_text(&self, report_text: &str) -> Result<Assessment> {
        self.analyze(&extract_parameters(report_text))
    }
}

pub fn build_prompt(parameters: &BloodParameters) -> String {
    let mut prompt =
        String::from("Analyze the following blood test results and provide an assessment for potential hemoglobinopathies:\n\n");
    for (label, value) in parameters.fields() {
        match value {
            Some(v) => {
                let _ = writeln!(prompt, "{label}: {v}");
            }
            None => {
                let _ = writeln!(prompt, "{label}: N/A");
            }
        }
    }
    prompt.push_str("\nClassify the results into one of the following categories:\n");
    for (i, class) in HemoglobinopathyClass::ALL.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, class.label());
    }
    prompt.push_str("\nProvide detailed reasoning for the classification.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_field_and_category() {
        let params = BloodParameters { hgb: Some(10.9), a2_concentration: Some(5.4), ..Default::default() };
        let prompt = build_prompt(&params);
        assert!(prompt.contains("HGB: 10.9\n"));
        assert!(prompt.contains("A2 Concentration: 5.4\n"));
        assert!(prompt.contains("RBC: N/A\n"));
        assert!(prompt.contains("S Peak: N/A\n"));
        assert!(prompt.contains("4. Beta Thalassemia Trait\n"));
        assert!(prompt.contains("6. For Further Review by Pathologist\n"));
    }
}
