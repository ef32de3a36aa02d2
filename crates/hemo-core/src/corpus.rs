//! Built-in hemoglobinopathy knowledge base.
//!
//! The corpus is the source of the default index and the last-resort context
//! when no index can be searched, so it is guaranteed non-empty.

use crate::error::{Error, Result};
use crate::types::Passage;

const KNOWLEDGE: &[(&str, &str)] = &[
    (
        "sickle-cell-disease",
        "Sickle Cell Disease (SCD):\n\
         - Inherited blood disorder affecting hemoglobin\n\
         - Causes red blood cells to become sickle-shaped\n\
         - Common symptoms: pain crises, anemia, frequent infections\n\
         - Diagnosis through hemoglobin electrophoresis\n\
         - Requires regular medical care and monitoring",
    ),
    (
        "sickle-cell-trait",
        "Sickle Cell Trait:\n\
         - Carrier state of sickle cell disease\n\
         - Usually no symptoms\n\
         - One normal and one sickle cell gene\n\
         - Important for family planning\n\
         - Can be detected through screening",
    ),
    (
        "alpha-thalassemia",
        "Alpha Thalassemia:\n\
         - Decreased alpha globin chain production\n\
         - Four genes control alpha globin production\n\
         - Severity depends on number of affected genes\n\
         - Common in Mediterranean, Asian, and African populations\n\
         - Can cause mild to severe anemia",
    ),
    (
        "beta-thalassemia",
        "Beta Thalassemia:\n\
         - Reduced or absent beta globin chain production\n\
         - Ranges from mild to severe forms\n\
         - Common symptoms include anemia, bone problems\n\
         - Regular blood transfusions may be needed\n\
         - Genetic counseling important for carriers",
    ),
    (
        "test-parameters",
        "Hemoglobin Test Parameters:\n\
         - RBC (Red Blood Cell Count): Measures number of red blood cells\n\
         - HGB (Hemoglobin): Oxygen-carrying protein level\n\
         - MCV (Mean Corpuscular Volume): Average red blood cell size\n\
         - MCH (Mean Corpuscular Hemoglobin): Average hemoglobin per red cell\n\
         - MCHC (Mean Corpuscular Hemoglobin Concentration): Concentration of hemoglobin in red cells",
    ),
    (
        "electrophoresis",
        "Hemoglobin Electrophoresis:\n\
         - Test to identify abnormal hemoglobin types\n\
         - Measures percentages of different hemoglobin forms\n\
         - Key test for diagnosing hemoglobinopathies\n\
         - Includes HbA, HbA2, HbF, and HbS measurements\n\
         - Essential for accurate diagnosis",
    ),
    (
        "treatment",
        "Treatment Options:\n\
         - Pain management for sickle cell crises\n\
         - Blood transfusions when needed\n\
         - Hydroxyurea therapy for severe cases\n\
         - Bone marrow transplant in selected cases\n\
         - Regular medical monitoring and preventive care",
    ),
    (
        "prevention",
        "Prevention and Management:\n\
         - Regular medical check-ups\n\
         - Vaccination against infections\n\
         - Proper hydration and nutrition\n\
         - Avoiding triggers of crises\n\
         - Genetic counseling for family planning",
    ),
];

/// Ordered, non-empty list of passages.
#[derive(Debug, Clone)]
pub struct Corpus {
    passages: Vec<Passage>,
}

impl Corpus {
    pub fn builtin() -> Self {
        let passages = KNOWLEDGE
            .iter()
            .map(|(slug, text)| Passage::with_source(*text, format!("builtin:{slug}")))
            .collect();
        Self { passages }
    }

    pub fn from_passages(passages: Vec<Passage>) -> Result<Self> {
        if passages.is_empty() {
            return Err(Error::InvalidConfig("knowledge corpus must not be empty".to_string()));
        }
        Ok(Self { passages })
    }

    pub fn from_texts<I, S>(texts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_passages(texts.into_iter().map(Passage::new).collect())
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Texts of the first `n` passages in declaration order, joined by newlines.
    pub fn leading_context(&self, n: usize) -> String {
        self.passages
            .iter()
            .take(n.max(1))
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::builtin()
    }
}
