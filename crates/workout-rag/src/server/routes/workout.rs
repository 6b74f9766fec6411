//! Workout planning endpoints
//!
//! Plan generation and adjustment only fail on invalid input; provider
//! failures resolve to the default plan inside the pipeline.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{
    AdjustPlanRequest, AssessmentResponse, ExplainExerciseRequest, ExplanationResponse,
    InsightsRequest, InsightsResponse, PlanResponse, UserProfile, Weekday,
};

const NO_INSIGHTS: &str = "No specific workout insights found in the conversation.";

/// POST /api/workout/plan
pub async fn generate_plan(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UserProfile>, JsonRejection>,
) -> Result<Json<PlanResponse>> {
    let Json(profile) = payload?;
    let plan = state.planner().generate_plan(&profile).await?;
    Ok(Json(PlanResponse {
        plan,
        name: profile.name,
    }))
}

/// POST /api/workout/adjust
pub async fn adjust_plan(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AdjustPlanRequest>, JsonRejection>,
) -> Result<Json<PlanResponse>> {
    let Json(request) = payload?;
    let plan = state
        .planner()
        .adjust_plan(&request.current_plan, &request.adjustment, &request.name)
        .await?;
    Ok(Json(PlanResponse {
        plan,
        name: request.name,
    }))
}

/// POST /api/workout/explain
pub async fn explain_exercise(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExplainExerciseRequest>, JsonRejection>,
) -> Result<Json<ExplanationResponse>> {
    let Json(request) = payload?;
    let day = Weekday::parse(&request.day)
        .ok_or_else(|| Error::validation(format!("Unknown day: {}", request.day)))?;
    let explanation = state
        .planner()
        .explain_exercise(&request.plan, day, &request.exercise, &request.profile)
        .await?;
    Ok(Json(ExplanationResponse { explanation }))
}

/// POST /api/workout/assessment - BMI is computed here from height and weight
pub async fn assess_physical(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UserProfile>, JsonRejection>,
) -> Result<Json<AssessmentResponse>> {
    let Json(profile) = payload?;
    profile.validate()?;
    let bmi = profile.bmi();
    let assessment = state.planner().assess_physical(&profile, bmi).await?;
    Ok(Json(AssessmentResponse {
        assessment,
        name: profile.name,
        bmi: (bmi * 10.0).round() / 10.0,
    }))
}

/// POST /api/workout/insights
pub async fn analyze_insights(
    State(state): State<AppState>,
    payload: std::result::Result<Json<InsightsRequest>, JsonRejection>,
) -> Result<Json<InsightsResponse>> {
    let Json(request) = payload?;
    let insights = state.planner().extract_chat_insights(&request.text);
    let summary = if insights.is_empty() {
        NO_INSIGHTS.to_string()
    } else {
        insights.render_for_prompt()
    };
    Ok(Json(InsightsResponse {
        insights: insights.into_iter().collect(),
        summary,
    }))
}
