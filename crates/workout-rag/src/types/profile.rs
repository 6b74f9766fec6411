//! User profile submitted with plan requests

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Training environment resolved from its categorical code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingEnvironment {
    /// Well-equipped gym
    Gym,
    /// Home with light equipment
    HomeLight,
    /// No equipment at all
    Bodyweight,
}

impl TrainingEnvironment {
    /// Resolve a code; anything unrecognised is treated as a gym
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "home_light" => Self::HomeLight,
            "bodyweight" => Self::Bodyweight,
            _ => Self::Gym,
        }
    }

    /// Sentence used in plan prompts
    pub fn description(&self) -> &'static str {
        match self {
            Self::Gym => {
                "well-equipped gym with access to machines, barbells, and full range of weights"
            }
            Self::HomeLight => {
                "home workout with limited equipment like dumbbells, resistance bands, and bodyweight exercises"
            }
            Self::Bodyweight => "bodyweight-only exercises with no equipment",
        }
    }

    /// Short label used in exercise explanations
    pub fn short_description(&self) -> &'static str {
        match self {
            Self::Gym => "well-equipped gym",
            Self::HomeLight => "home with light weights",
            Self::Bodyweight => "bodyweight-only, no equipment",
        }
    }
}

/// Describe a goal code
pub fn goal_description(goal: u8) -> &'static str {
    match goal {
        1 => "Weight Loss",
        2 => "Muscle Gain",
        3 => "Maintenance",
        _ => "General fitness",
    }
}

/// BMI classification used in physical assessments
pub fn bmi_category(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        "underweight"
    } else if bmi < 25.0 {
        "normal weight"
    } else if bmi < 30.0 {
        "overweight"
    } else {
        "obese"
    }
}

fn default_environment() -> String {
    "gym".to_string()
}

fn default_time_available() -> u32 {
    60
}

/// Person requesting a workout plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub gender: String,
    /// Height in centimetres
    pub height: f64,
    /// Weight in kilograms
    pub weight: f64,
    #[serde(default)]
    pub occupation: Option<String>,
    /// "Beginner", "Intermediate", "Advanced", ...
    pub experience_level: String,
    /// Goal code, see [`goal_description`]
    #[serde(default)]
    pub goal: u8,
    /// "gym" | "home_light" | "bodyweight"
    #[serde(default = "default_environment")]
    pub training_environment: String,
    /// Minutes available per day
    #[serde(default = "default_time_available")]
    pub time_available: u32,
    /// Free text, may contain pasted chat history
    #[serde(default)]
    pub additional_info: String,
}

impl UserProfile {
    /// Check required fields are present and physical values are positive
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("name", self.name.as_str()),
            ("gender", self.gender.as_str()),
            ("experience_level", self.experience_level.as_str()),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(Error::validation(format!(
                "All required fields must be provided (missing: {})",
                missing.join(", ")
            )));
        }

        if self.age == 0 {
            return Err(Error::validation("age must be positive"));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(Error::validation("height must be positive"));
        }
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(Error::validation("weight must be positive"));
        }
        Ok(())
    }

    /// Body-mass index from height (cm) and weight (kg)
    pub fn bmi(&self) -> f64 {
        let meters = self.height / 100.0;
        self.weight / (meters * meters)
    }

    pub fn environment(&self) -> TrainingEnvironment {
        TrainingEnvironment::from_code(&self.training_environment)
    }

    pub fn occupation_or_default(&self) -> &str {
        self.occupation
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .unwrap_or("Not specified")
    }
}
