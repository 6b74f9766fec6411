//! Workout plan generation with a fallback chain ending in the default plan

use crate::config::RetrievalProfile;
use crate::error::{Error, Result};
use crate::generation::{extract_json, ComposedPrompt, GenerationClient, PromptComposer};
use crate::retrieval::{RetrievalOptions, Retriever};
use crate::types::{ChatInsightSet, UserProfile, Weekday, WorkoutPlan};

use super::insights::extract_insights;

pub const EXPLANATION_FALLBACK: &str = "Unable to generate explanation at this time.";

pub const ASSESSMENT_FALLBACK: &str = "<p>Unable to generate a physical assessment at this time.</p>\
<p>Please proceed with creating your workout plan or try again later.</p>";

/// Orchestrates retrieval, prompting, generation and extraction for plans.
///
/// Only validation errors leave this type. Provider and parsing failures
/// degrade to a plainer prompt and finally to [`WorkoutPlan::default_plan`].
#[derive(Clone)]
pub struct PlanPipeline {
    retriever: Retriever,
    client: GenerationClient,
    retrieval: RetrievalOptions,
}

impl PlanPipeline {
    pub fn new(retriever: Retriever, client: GenerationClient, profile: RetrievalProfile) -> Self {
        Self {
            retriever,
            client,
            retrieval: profile.into(),
        }
    }

    /// Generate a weekly plan for `profile`
    pub async fn generate_plan(&self, profile: &UserProfile) -> Result<WorkoutPlan> {
        profile.validate()?;

        let insights = extract_insights(&profile.additional_info);
        let query = PromptComposer::plan_brief(profile, &insights);

        match self.retriever.retrieve(&query, &self.retrieval).await {
            Ok(chunks) if chunks.is_empty() => {
                tracing::warn!("No indexed context for plan of {}, using direct prompt", profile.name);
            }
            Ok(chunks) => {
                let sources: Vec<&str> = chunks.iter().map(|c| c.chunk.source_file_path.as_str()).collect();
                tracing::info!("Generating plan for {} with context from {:?}", profile.name, sources);

                let prompt = PromptComposer::plan_with_context(&chunks, profile, &insights);
                if let Some(plan) = self.generate(&prompt).await {
                    return Ok(plan);
                }
                tracing::warn!("Context-grounded plan failed for {}, retrying with direct prompt", profile.name);
            }
            Err(Error::RetrievalUnavailable(reason)) => {
                tracing::warn!("Retrieval unavailable ({}), using direct prompt", reason);
            }
            Err(e) => {
                tracing::error!("Retrieval failed for plan of {}: {}", profile.name, e);
            }
        }

        if let Some(plan) = self.generate(&PromptComposer::plan_direct(profile)).await {
            return Ok(plan);
        }

        tracing::warn!("Returning default plan for {}", profile.name);
        Ok(WorkoutPlan::default_plan())
    }

    /// Rewrite `current` according to a free-text instruction; no retrieval
    pub async fn adjust_plan(&self, current: &WorkoutPlan, instruction: &str, name: &str) -> Result<WorkoutPlan> {
        if instruction.trim().is_empty() {
            return Err(Error::validation("Adjustment text must not be empty"));
        }

        let prompt = PromptComposer::plan_adjustment(current, instruction, name);
        match self.generate(&prompt).await {
            Some(plan) => {
                tracing::info!("Adjusted plan for {} ({} days)", name, plan.len());
                Ok(plan)
            }
            None => {
                tracing::warn!("Plan adjustment failed for {}, returning default plan", name);
                Ok(WorkoutPlan::default_plan())
            }
        }
    }

    /// Explain why `exercise` sits on `day`
    pub async fn explain_exercise(
        &self,
        plan: &WorkoutPlan,
        day: Weekday,
        exercise: &str,
        profile: &UserProfile,
    ) -> Result<String> {
        if exercise.trim().is_empty() {
            return Err(Error::validation("Exercise must not be empty"));
        }

        let prompt = PromptComposer::exercise_explanation(plan, day, exercise, profile);
        Ok(self
            .complete_text(&prompt, self.client.chat_temperature())
            .await
            .unwrap_or_else(|| EXPLANATION_FALLBACK.to_string()))
    }

    /// HTML physical assessment for `profile` at the given BMI
    pub async fn assess_physical(&self, profile: &UserProfile, bmi: f64) -> Result<String> {
        profile.validate()?;
        if !(bmi.is_finite() && bmi > 0.0) {
            return Err(Error::validation("BMI must be a positive number"));
        }

        let prompt = PromptComposer::physical_assessment(profile, bmi);
        Ok(self
            .complete_text(&prompt, self.client.chat_temperature())
            .await
            .unwrap_or_else(|| ASSESSMENT_FALLBACK.to_string()))
    }

    pub fn extract_chat_insights(&self, transcript: &str) -> ChatInsightSet {
        extract_insights(transcript)
    }

    /// One generate/extract round; `None` means the caller falls back
    async fn generate(&self, prompt: &ComposedPrompt) -> Option<WorkoutPlan> {
        let reply = match self.client.complete(prompt, self.client.plan_temperature()).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Plan generation failed: {}", e);
                return None;
            }
        };

        let plan = extract_json(&reply).and_then(|value| WorkoutPlan::from_json(&value));
        if plan.is_none() {
            tracing::warn!("Model reply did not contain a weekday plan ({} chars)", reply.len());
        }
        plan
    }

    async fn complete_text(&self, prompt: &ComposedPrompt, temperature: f32) -> Option<String> {
        match self.client.complete(prompt, temperature).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                tracing::warn!("Model returned an empty reply");
                None
            }
            Err(e) => {
                tracing::error!("Text generation failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlmConfig, RetrievalConfig};
    use crate::providers::mock::{HashEmbedder, ScriptedLlm};
    use crate::providers::{EmbeddedChunk, EmbeddingProvider, InMemoryVectorStore, VectorStoreProvider};
    use crate::types::{DocumentChunk, FileType};
    use std::sync::Arc;

    const PLAN_REPLY: &str = r#"{"Monday": ["Goblet squat: 3 sets x 12 reps"], "Thursday": ["Push-ups: 3 sets x 10 reps"]}"#;

    fn profile() -> UserProfile {
        UserProfile {
            name: "Riley".to_string(),
            age: 41,
            gender: "female".to_string(),
            height: 165.0,
            weight: 70.0,
            occupation: Some("Nurse".to_string()),
            experience_level: "Beginner".to_string(),
            goal: 1,
            training_environment: "home_light".to_string(),
            time_available: 30,
            additional_info: String::new(),
        }
    }

    fn pipeline(retriever: Retriever, llm: Arc<ScriptedLlm>) -> PlanPipeline {
        PlanPipeline::new(
            retriever,
            GenerationClient::new(llm, &LlmConfig::default()),
            RetrievalConfig::default().plan,
        )
    }

    fn no_index() -> Retriever {
        Retriever::unavailable(Arc::new(HashEmbedder::new(32)))
    }

    async fn indexed() -> Retriever {
        let embedder = Arc::new(HashEmbedder::new(32));
        let store = Arc::new(InMemoryVectorStore::new());
        let text = "Beginners should start with goblet squats and incline push-ups at home.";
        store
            .upsert(vec![EmbeddedChunk {
                chunk: DocumentChunk {
                    text: text.to_string(),
                    source_file_path: "home-training.pdf".to_string(),
                    chunk_id: 0,
                    file_type: FileType::Pdf,
                    page_number: Some(2),
                    total_chunks: 1,
                },
                embedding: embedder.embed(text).await.unwrap(),
            }])
            .await
            .unwrap();
        Retriever::new(embedder, store)
    }

    #[tokio::test]
    async fn test_validation_error_is_surfaced() {
        let llm = Arc::new(ScriptedLlm::with_replies([PLAN_REPLY]));
        let mut p = profile();
        p.gender = String::new();

        let err = pipeline(no_index(), llm.clone()).generate_plan(&p).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_grounded_plan_uses_context() {
        let llm = Arc::new(ScriptedLlm::with_replies([PLAN_REPLY]));
        let plan = pipeline(indexed().await, llm.clone())
            .generate_plan(&profile())
            .await
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(llm.call_count(), 1);
        let prompt = llm.prompt(0).unwrap();
        assert!(prompt.contains("[1] home-training.pdf, Page 2"));
        assert!(prompt.contains("Context information from fitness resources"));
    }

    #[tokio::test]
    async fn test_unavailable_index_goes_straight_to_direct_prompt() {
        let llm = Arc::new(ScriptedLlm::with_replies([PLAN_REPLY]));
        let plan = pipeline(no_index(), llm.clone()).generate_plan(&profile()).await.unwrap();

        assert_eq!(plan.get(Weekday::Monday).unwrap()[0], "Goblet squat: 3 sets x 12 reps");
        assert_eq!(llm.call_count(), 1);
        assert!(llm
            .prompt(0)
            .unwrap()
            .starts_with("Please create a detailed weekly workout plan"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_retries_plain_once() {
        let llm = Arc::new(ScriptedLlm::with_replies([
            "Sorry, here are some thoughts about training instead.",
            "```json\n{\"Tuesday\": [\"Walk 30 minutes\"]}\n```",
        ]));
        let plan = pipeline(indexed().await, llm.clone())
            .generate_plan(&profile())
            .await
            .unwrap();

        assert_eq!(plan.get(Weekday::Tuesday).unwrap(), ["Walk 30 minutes"]);
        assert_eq!(llm.call_count(), 2);
        assert!(!llm.prompt(1).unwrap().contains("Context information"));
    }

    #[tokio::test]
    async fn test_default_plan_after_two_failures() {
        let llm = Arc::new(ScriptedLlm::with_replies(["not json", "still not json"]));
        let plan = pipeline(indexed().await, llm.clone())
            .generate_plan(&profile())
            .await
            .unwrap();
        assert_eq!(plan, WorkoutPlan::default_plan());
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_yields_default_plan() {
        let llm = Arc::new(ScriptedLlm::failing());
        let plan = pipeline(no_index(), llm).generate_plan(&profile()).await.unwrap();
        assert_eq!(plan, WorkoutPlan::default_plan());
    }

    #[tokio::test]
    async fn test_insights_reach_the_prompt() {
        let llm = Arc::new(ScriptedLlm::with_replies([PLAN_REPLY]));
        let mut p = profile();
        p.additional_info = "--- Imported Chat History --- I love swimming but have shoulder pain".to_string();

        pipeline(no_index(), llm.clone()).generate_plan(&p).await.unwrap();
        let prompt = llm.prompt(0).unwrap();
        assert!(prompt.contains("I love swimming"));

        let insights = pipeline(no_index(), Arc::new(ScriptedLlm::new())).extract_chat_insights(&p.additional_info);
        assert!(insights.iter().any(|i| i.contains("shoulder")));
    }

    #[tokio::test]
    async fn test_adjust_plan_reduces_active_days() {
        let reply = r#"{"Monday": ["Squats"], "Tuesday": ["Rest day"], "Wednesday": ["Rows"]}"#;
        let llm = Arc::new(ScriptedLlm::with_replies([reply]));
        let current = WorkoutPlan::from_json(&serde_json::json!({
            "Monday": ["Squats"], "Tuesday": ["Lunges"], "Wednesday": ["Rows"]
        }))
        .unwrap();

        let adjusted = pipeline(no_index(), llm.clone())
            .adjust_plan(&current, "add one rest day", "Riley")
            .await
            .unwrap();
        assert!(adjusted.active_days() <= current.active_days());
        assert!(llm.prompt(0).unwrap().contains("add one rest day"));
    }

    #[tokio::test]
    async fn test_adjust_plan_falls_back_to_default() {
        let llm = Arc::new(ScriptedLlm::failing());
        let adjusted = pipeline(no_index(), llm)
            .adjust_plan(&WorkoutPlan::default_plan(), "add one rest day", "Riley")
            .await
            .unwrap();
        assert_eq!(adjusted, WorkoutPlan::default_plan());
    }

    #[tokio::test]
    async fn test_adjust_requires_instruction() {
        let llm = Arc::new(ScriptedLlm::new());
        let err = pipeline(no_index(), llm)
            .adjust_plan(&WorkoutPlan::default_plan(), "  ", "Riley")
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_explain_and_assess_fallbacks() {
        let pipeline = pipeline(no_index(), Arc::new(ScriptedLlm::failing()));
        let p = profile();

        let explanation = pipeline
            .explain_exercise(&WorkoutPlan::default_plan(), Weekday::Monday, "30 minutes walking", &p)
            .await
            .unwrap();
        assert_eq!(explanation, EXPLANATION_FALLBACK);

        let assessment = pipeline.assess_physical(&p, p.bmi()).await.unwrap();
        assert_eq!(assessment, ASSESSMENT_FALLBACK);
    }

    #[tokio::test]
    async fn test_assessment_reply_is_returned() {
        let llm = Arc::new(ScriptedLlm::with_replies(["<p>Healthy range.</p>"]));
        let p = profile();
        let assessment = pipeline(no_index(), llm.clone()).assess_physical(&p, p.bmi()).await.unwrap();
        assert_eq!(assessment, "<p>Healthy range.</p>");
        assert!(llm.prompt(0).unwrap().contains("classified as overweight"));
    }
}
