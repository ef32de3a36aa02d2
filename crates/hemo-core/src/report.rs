//! Blood-parameter extraction from report text and the assessment categories.
//!
//! Text extraction from PDFs and images happens upstream; this module only
//! sees plain text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BloodParameters {
    pub rbc: Option<f64>,
    pub hgb: Option<f64>,
    pub mcv: Option<f64>,
    pub mch: Option<f64>,
    pub mchc: Option<f64>,
    pub rdw: Option<f64>,
    pub f_concentration: Option<f64>,
    pub a2_concentration: Option<f64>,
    pub ao_peak: Option<f64>,
    pub s_peak: Option<f64>,
}

impl BloodParameters {
    /// Display label and value for every field, in report order.
    pub fn fields(&self) -> [(&'static str, Option<f64>); 10] {
        [
            ("RBC", self.rbc),
            ("HGB", self.hgb),
            ("MCV", self.mcv),
            ("MCH", self.mch),
            ("MCHC", self.mchc),
            ("RDW", self.rdw),
            ("F Concentration", self.f_concentration),
            ("A2 Concentration", self.a2_concentration),
            ("Ao Peak", self.ao_peak),
            ("S Peak", self.s_peak),
        ]
    }

    pub fn found_count(&self) -> usize {
        self.fields().iter().filter(|(_, v)| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.found_count() == 0
    }
}

struct FieldPatterns {
    rbc: Regex,
    hgb: Regex,
    mcv: Regex,
    mch: Regex,
    mchc: Regex,
    rdw: Regex,
    f_concentration: Regex,
    a2_concentration: Regex,
    ao_peak: Regex,
    s_peak: Regex,
}

static PATTERNS: LazyLock<FieldPatterns> = LazyLock::new(|| {
    let re = |p: &str| Regex::new(p).expect("static field pattern");
    FieldPatterns {
        rbc: re(r"(?i)\bRBC[:\s]+(\d+\.?\d*)"),
        hgb: re(r"(?i)\bHGB[:\s]+(\d+\.?\d*)"),
        mcv: re(r"(?i)\bMCV[:\s]+(\d+\.?\d*)"),
        // the mandatory separator keeps MCH from matching inside MCHC
        mch: re(r"(?i)\bMCH[:\s]+(\d+\.?\d*)"),
        mchc: re(r"(?i)\bMCHC[:\s]+(\d+\.?\d*)"),
        rdw: re(r"(?i)\bRDW[:\s]+(\d+\.?\d*)"),
        f_concentration: re(r"(?i)\bF[:\s]+(\d+\.?\d*)"),
        a2_concentration: re(r"(?i)\bA2[:\s]+(\d+\.?\d*)"),
        ao_peak: re(r"(?i)\bAo\b[ \t\w]*?Calibrated Area[:\s]+(\d+\.?\d*)"),
        s_peak: re(r"(?i)\bS\b[ \t\w]*?Calibrated Area[:\s]+(\d+\.?\d*)"),
    }
});

fn capture(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Pull the known parameters out of report text. First match wins per field;
/// fields that never appear stay `None`.
pub fn extract_parameters(text: &str) -> BloodParameters {
    let p = &*PATTERNS;
    let params = BloodParameters {
        rbc: capture(&p.rbc, text),
        hgb: capture(&p.hgb, text),
        mcv: capture(&p.mcv, text),
        mch: capture(&p.mch, text),
        mchc: capture(&p.mchc, text),
        rdw: capture(&p.rdw, text),
        f_concentration: capture(&p.f_concentration, text),
        a2_concentration: capture(&p.a2_concentration, text),
        ao_peak: capture(&p.ao_peak, text),
        s_peak: capture(&p.s_peak, text),
    };
    tracing::debug!(found = params.found_count(), "extracted blood parameters");
    params
}

/// Categories the assessment prompt asks the model to choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HemoglobinopathyClass {
    SickleCellDisease,
    SickleCellTrait,
    AlphaThalassemiaTrait,
    BetaThalassemiaTrait,
    NormalFindings,
    PathologistReview,
}

impl HemoglobinopathyClass {
    pub const ALL: [HemoglobinopathyClass; 6] = [
        HemoglobinopathyClass::SickleCellDisease,
        HemoglobinopathyClass::SickleCellTrait,
        HemoglobinopathyClass::AlphaThalassemiaTrait,
        HemoglobinopathyClass::BetaThalassemiaTrait,
        HemoglobinopathyClass::NormalFindings,
        HemoglobinopathyClass::PathologistReview,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HemoglobinopathyClass::SickleCellDisease => "Sickle Cell Disease",
            HemoglobinopathyClass::SickleCellTrait => "Sickle Cell Trait",
            HemoglobinopathyClass::AlphaThalassemiaTrait => "Alpha Thalassemia Trait",
            HemoglobinopathyClass::BetaThalassemiaTrait => "Beta Thalassemia Trait",
            HemoglobinopathyClass::NormalFindings => "Normal Findings",
            HemoglobinopathyClass::PathologistReview => "For Further Review by Pathologist",
        }
    }

    /// The category mentioned earliest in `text`, case-insensitively.
    pub fn detect(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        Self::ALL
            .iter()
            .filter_map(|c| lower.find(&c.label().to_lowercase()).map(|pos| (pos, *c)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, c)| c)
    }
}

impl std::fmt::Display for HemoglobinopathyClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "FULL BLOOD COUNT\n\
        RBC: 5.62\nHGB 10.9\nMCV: 64.3\nMCH: 19.4\nMCHC: 30.2\nRDW: 16.8\n\
        HPLC\nF: 1.2\nA2: 5.4\nAo Calibrated Area: 84.1\nS Calibrated Area 0.0\n";

    #[test]
    fn extracts_all_fields_from_report() {
        let p = extract_parameters(REPORT);
        assert_eq!(p.rbc, Some(5.62));
        assert_eq!(p.hgb, Some(10.9));
        assert_eq!(p.mcv, Some(64.3));
        assert_eq!(p.mch, Some(19.4));
        assert_eq!(p.mchc, Some(30.2));
        assert_eq!(p.rdw, Some(16.8));
        assert_eq!(p.f_concentration, Some(1.2));
        assert_eq!(p.a2_concentration, Some(5.4));
        assert_eq!(p.ao_peak, Some(84.1));
        assert_eq!(p.s_peak, Some(0.0));
        assert_eq!(p.found_count(), 10);
    }

    #[test]
    fn mch_does_not_read_mchc_value() {
        let p = extract_parameters("MCHC: 33.1");
        assert_eq!(p.mchc, Some(33.1));
        assert_eq!(p.mch, None);
    }

    #[test]
    fn missing_fields_stay_empty() {
        let p = extract_parameters("no numbers here");
        assert!(p.is_empty());
    }

    #[test]
    fn detect_prefers_earliest_category() {
        let text = "Classification: Beta Thalassemia Trait. Sickle Cell Disease is unlikely.";
        assert_eq!(HemoglobinopathyClass::detect(text), Some(HemoglobinopathyClass::BetaThalassemiaTrait));
        assert_eq!(HemoglobinopathyClass::detect("unclear"), None);
    }
}
