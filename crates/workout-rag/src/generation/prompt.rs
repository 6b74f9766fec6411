//! Prompt templates for conversational answers and workout plans

use crate::providers::{ChatMessage, ScoredChunk};
use crate::types::{
    bmi_category, goal_description, ChatInsightSet, Turn, UserProfile, Weekday, WorkoutPlan,
};

/// System instruction shared by every plan generation and adjustment call
pub const PLAN_SYSTEM: &str = "You are a professional fitness trainer. Generate or modify workout plans based on \
user input. Always maintain proper exercise form, progression, and safety. \
IMPORTANT: Your response MUST be ONLY a valid JSON object with days of the week as keys \
and lists of exercises as values. DO NOT include any explanatory text, markdown code blocks, \
or other formatting - just the raw JSON object. Example format: \
{\"Monday\": [\"Exercise 1: 3 sets x 12 reps\", \"Exercise 2: 4 sets x 10 reps\"]}";

pub const EXPLAIN_SYSTEM: &str = "You are a professional fitness trainer explaining the benefits and \
reasoning behind specific exercises in a workout plan.";

pub const ASSESSMENT_SYSTEM: &str = "You are a professional fitness trainer and physical assessment \
specialist. Provide accurate, helpful, and respectful physical assessments based on the data provided.";

pub const CHAT_SYSTEM: &str = "You are a fitness assistant. Ground your answers in the context taken \
from the user's uploaded documents.";

/// Output contract appended to plan prompts
const PLAN_FORMAT_INSTRUCTIONS: &str = r#"IMPORTANT FORMATTING INSTRUCTIONS:
1. Your response MUST be ONLY a valid JSON object with days of the week as keys and lists of exercises as values.
2. DO NOT include any explanatory text, markdown, or other text before or after the JSON.
3. DO NOT include ```json or ``` markers or any other formatting - just the raw JSON object.
4. Ensure all exercises are suitable for the specified training environment.

Example of proper response format:
{"Monday": ["Exercise 1: 3 sets x 12 reps", "Exercise 2: 4 sets x 10 reps"], "Tuesday": ["Exercise 3: 30 minutes"]}"#;

const NO_CONTEXT: &str = "No relevant context was found in the uploaded documents.";
const NO_HISTORY: &str = "No previous conversation.";

/// A system instruction plus the user-turn prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
}

impl ComposedPrompt {
    fn new(system: &str, user: String) -> Self {
        Self {
            system: system.to_string(),
            user,
        }
    }

    /// Messages in the order the providers expect
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

/// Prompt composer
pub struct PromptComposer;

impl PromptComposer {
    /// Render retrieved chunks as a numbered context block
    pub fn build_context(chunks: &[ScoredChunk]) -> String {
        if chunks.is_empty() {
            return NO_CONTEXT.to_string();
        }

        chunks
            .iter()
            .enumerate()
            .map(|(i, result)| {
                format!(
                    "[{}] {}, Page {}\n\n{}",
                    i + 1,
                    result.chunk.source_file_path,
                    result.chunk.page_label(),
                    result.chunk.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }

    /// Render a session's prior exchanges
    pub fn build_history(history: &[Turn]) -> String {
        if history.is_empty() {
            return NO_HISTORY.to_string();
        }

        history
            .iter()
            .map(|turn| format!("Human: {}\nAI: {}", turn.question, turn.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Conversational QA over retrieved context and the session history
    pub fn chat_qa(chunks: &[ScoredChunk], history: &[Turn], question: &str) -> ComposedPrompt {
        let user = format!(
            "Answer the question based on the context, in a concise manner, in markdown and using bullet points where applicable.\n\n\
             Context: {context}\n\
             History: {history}\n\n\
             Question: {question}\n\
             Answer:",
            context = Self::build_context(chunks),
            history = Self::build_history(history),
            question = question,
        );
        ComposedPrompt::new(CHAT_SYSTEM, user)
    }

    /// Natural-language brief of a profile; doubles as the retrieval query
    pub fn plan_brief(profile: &UserProfile, insights: &ChatInsightSet) -> String {
        let mut brief = format!(
            "Create a detailed workout plan for a {age} year old {gender} with the following characteristics:\n\
             - Height: {height} cm\n\
             - Weight: {weight} kg\n\
             - Occupation: {occupation}\n\
             - Experience level: {experience}\n\
             - Goal: {goal}\n\
             - Time available: {minutes} minutes per day\n\n\
             Training Environment: {environment}\n\n\
             Additional information provided by the user:\n{additional}",
            age = profile.age,
            gender = profile.gender,
            height = profile.height,
            weight = profile.weight,
            occupation = profile.occupation_or_default(),
            experience = profile.experience_level,
            goal = goal_description(profile.goal),
            minutes = profile.time_available,
            environment = profile.environment().description(),
            additional = profile.additional_info.trim(),
        );

        if !insights.is_empty() {
            brief.push_str("\n\n");
            brief.push_str(&insights.render_for_prompt());
        }

        brief.push_str(
            "\n\nThe plan should include exercises that are safe, effective, and appropriate for this individual.\n\
             Take into account any limitations, injuries, or specific goals mentioned in the additional information.\n\
             All exercises MUST be suitable for the specified training environment.",
        );
        brief
    }

    /// Plan generation grounded in retrieved context
    pub fn plan_with_context(chunks: &[ScoredChunk], profile: &UserProfile, insights: &ChatInsightSet) -> ComposedPrompt {
        let user = format!(
            "You are creating a personalized workout plan. Use the context information about exercises, \
             workout structure, and fitness principles to create an appropriate plan.\n\n\
             Context information from fitness resources:\n{context}\n\n\
             User profile:\n{brief}\n\n\
             Create a balanced, safe, and effective workout plan for this person.\n\
             Include specific exercises, sets, reps, and rest periods that match their profile.\n\
             If the user profile contains any extracted insights from previous conversations, prioritize those \
             preferences and adapt the workout plan accordingly.\n\n\
             {format}",
            context = Self::build_context(chunks),
            brief = Self::plan_brief(profile, insights),
            format = PLAN_FORMAT_INSTRUCTIONS,
        );
        ComposedPrompt::new(PLAN_SYSTEM, user)
    }

    /// Plain profile-to-JSON plan prompt without retrieved context
    pub fn plan_direct(profile: &UserProfile) -> ComposedPrompt {
        let additional = match profile.additional_info.trim() {
            "" => "No additional information provided.",
            info => info,
        };
        let user = format!(
            "Please create a detailed weekly workout plan for a person with the following characteristics:\n\n\
             Personal Information:\n\
             - Age: {age}\n\
             - Gender: {gender}\n\
             - Height: {height} cm\n\
             - Weight: {weight} kg\n\
             - Occupation: {occupation}\n\n\
             Fitness Parameters:\n\
             - Goal: {goal}\n\
             - Experience Level: {experience}\n\
             - Training Environment: {environment}\n\
             - Time Available: {minutes} minutes per day\n\n\
             Additional Information:\n{additional}\n\n\
             Please provide a detailed weekly plan with specific exercises, sets, reps, and rest periods where applicable.\n\
             All exercises must be suitable for the specified training environment.\n\n\
             {format}",
            age = profile.age,
            gender = profile.gender,
            height = profile.height,
            weight = profile.weight,
            occupation = profile.occupation_or_default(),
            goal = goal_description(profile.goal),
            experience = profile.experience_level,
            environment = profile.environment().description(),
            minutes = profile.time_available,
            additional = additional,
            format = PLAN_FORMAT_INSTRUCTIONS,
        );
        ComposedPrompt::new(PLAN_SYSTEM, user)
    }

    /// Rewrite an existing plan according to a free-text request
    pub fn plan_adjustment(plan: &WorkoutPlan, instruction: &str, name: &str) -> ComposedPrompt {
        let user = format!(
            "Current workout plan for {name}:\n{plan}\n\n\
             User's adjustment request:\n{instruction}\n\n\
             Please modify the workout plan according to the user's request while maintaining:\n\
             1. A balanced workout structure\n\
             2. Appropriate progression\n\
             3. Adequate rest periods\n\
             4. Safe exercise selection\n\n\
             Return the adjusted plan in the same JSON format with days of the week as keys and lists of exercises as values.\n\n\
             {format}",
            name = name,
            plan = plan.to_pretty_json(),
            instruction = instruction.trim(),
            format = PLAN_FORMAT_INSTRUCTIONS,
        );
        ComposedPrompt::new(PLAN_SYSTEM, user)
    }

    pub fn exercise_explanation(
        plan: &WorkoutPlan,
        day: Weekday,
        exercise: &str,
        profile: &UserProfile,
    ) -> ComposedPrompt {
        let user = format!(
            "Current workout plan context:\n{plan}\n\n\
             Please explain why the exercise \"{exercise}\" was chosen for {day} for this person:\n\
             - Age: {age}\n\
             - Gender: {gender}\n\
             - Occupation: {occupation}\n\
             - Experience Level: {experience}\n\
             - Training Environment: {environment}\n\n\
             Provide a detailed explanation including:\n\
             1. Benefits of this exercise\n\
             2. How it fits into the overall plan\n\
             3. Why it's scheduled on this specific day\n\
             4. How it's appropriate for the person's experience level\n\
             5. How it's suitable for their training environment\n\
             6. Any safety considerations or form tips\n\n\
             Return the explanation in a clear, concise format.",
            plan = plan.to_pretty_json(),
            exercise = exercise,
            day = day,
            age = profile.age,
            gender = profile.gender,
            occupation = profile.occupation_or_default(),
            experience = profile.experience_level,
            environment = profile.environment().short_description(),
        );
        ComposedPrompt::new(EXPLAIN_SYSTEM, user)
    }

    pub fn physical_assessment(profile: &UserProfile, bmi: f64) -> ComposedPrompt {
        let user = format!(
            "Generate a brief physical assessment for a {age} year old {gender} with the following characteristics:\n\
             - Height: {height} cm\n\
             - Weight: {weight} kg\n\
             - BMI: {bmi:.1} (classified as {category})\n\
             - Occupation: {occupation}\n\
             - Fitness experience level: {experience}\n\n\
             Provide:\n\
             1. A brief analysis of their physical condition based on the provided metrics\n\
             2. Potential physical implications of their occupation\n\
             3. Some general recommendations based on their experience level\n\
             4. Potential concerns or considerations\n\n\
             The assessment should be concise, professional, and include HTML paragraph tags for formatting.",
            age = profile.age,
            gender = profile.gender,
            height = profile.height,
            weight = profile.weight,
            bmi = bmi,
            category = bmi_category(bmi),
            occupation = profile.occupation_or_default(),
            experience = profile.experience_level,
        );
        ComposedPrompt::new(ASSESSMENT_SYSTEM, user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocumentChunk, FileType};

    fn profile(environment: &str) -> UserProfile {
        UserProfile {
            name: "Jo".to_string(),
            age: 29,
            gender: "male".to_string(),
            height: 182.0,
            weight: 80.0,
            occupation: Some("Nurse".to_string()),
            experience_level: "Intermediate".to_string(),
            goal: 2,
            training_environment: environment.to_string(),
            time_available: 50,
            additional_info: String::new(),
        }
    }

    fn scored(source: &str, page: Option<u32>, text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: DocumentChunk {
                text: text.to_string(),
                source_file_path: source.to_string(),
                chunk_id: 0,
                file_type: FileType::Pdf,
                page_number: page,
                total_chunks: 1,
            },
            score: 0.9,
        }
    }

    #[test]
    fn test_empty_context_is_explicit() {
        let prompt = PromptComposer::chat_qa(&[], &[], "What is a deload week?");
        assert!(prompt.user.contains(NO_CONTEXT));
        assert!(prompt.user.contains(NO_HISTORY));
        assert!(prompt.user.ends_with("Question: What is a deload week?\nAnswer:"));
    }

    #[test]
    fn test_context_and_history_rendering() {
        let chunks = vec![
            scored("legs.pdf", Some(4), "Squat below parallel."),
            scored("notes.txt", None, "Walk daily."),
        ];
        let context = PromptComposer::build_context(&chunks);
        assert!(context.starts_with("[1] legs.pdf, Page 4\n\nSquat below parallel."));
        assert!(context.contains("[2] notes.txt, Page unknown"));

        let history = PromptComposer::build_history(&[Turn::new("hi", "hello")]);
        assert_eq!(history, "Human: hi\nAI: hello");
    }

    #[test]
    fn test_plan_prompt_carries_contract_and_environment() {
        let prompt = PromptComposer::plan_with_context(&[], &profile("bodyweight"), &ChatInsightSet::new());
        assert_eq!(prompt.system, PLAN_SYSTEM);
        assert!(prompt.user.contains("bodyweight-only exercises with no equipment"));
        assert!(prompt.user.contains("Goal: Muscle Gain"));
        assert!(prompt.user.contains("MUST be ONLY a valid JSON object"));
        assert!(!prompt.user.contains("INSIGHTS EXTRACTED"));
    }

    #[test]
    fn test_unknown_environment_uses_gym_description() {
        let prompt = PromptComposer::plan_direct(&profile("garage"));
        assert!(prompt.user.contains("well-equipped gym with access to machines"));
        assert!(prompt.user.contains("No additional information provided."));
    }

    #[test]
    fn test_plan_brief_appends_insights() {
        let insights = ChatInsightSet::from(vec!["User has mentioned yoga in their conversation.".to_string()]);
        let brief = PromptComposer::plan_brief(&profile("gym"), &insights);
        assert!(brief.contains("INSIGHTS EXTRACTED FROM CONVERSATION:\n- User has mentioned yoga"));
    }

    #[test]
    fn test_adjustment_prompt_serializes_plan() {
        let prompt = PromptComposer::plan_adjustment(&WorkoutPlan::default_plan(), "add one rest day", "Jo");
        assert!(prompt.user.starts_with("Current workout plan for Jo:\n{"));
        assert!(prompt.user.contains("\"Monday\""));
        assert!(prompt.user.contains("add one rest day"));
        assert!(prompt.user.contains("IMPORTANT FORMATTING INSTRUCTIONS"));
    }

    #[test]
    fn test_explanation_uses_short_environment() {
        let prompt = PromptComposer::exercise_explanation(
            &WorkoutPlan::default_plan(),
            Weekday::Tuesday,
            "Light cardio",
            &profile("home_light"),
        );
        assert!(prompt.user.contains("\"Light cardio\" was chosen for Tuesday"));
        assert!(prompt.user.contains("Training Environment: home with light weights"));
    }

    #[test]
    fn test_assessment_prompt() {
        let p = profile("gym");
        let prompt = PromptComposer::physical_assessment(&p, p.bmi());
        assert!(prompt.user.contains("BMI: 24.2 (classified as normal weight)"));
        assert!(prompt.user.contains("Occupation: Nurse"));
        assert_eq!(prompt.to_messages().len(), 2);
    }
}
