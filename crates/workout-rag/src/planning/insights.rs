//! Rule-based insight mining over pasted chat transcripts

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::ChatInsightSet;

/// Marker the planner UI inserts before pasted chat history
pub const IMPORT_MARKER: &str = "--- Imported Chat History ---";

/// Named exercises and modalities reported when mentioned as whole words
pub const EXERCISE_KEYWORDS: [&str; 15] = [
    "cardio",
    "strength",
    "weight",
    "hiit",
    "yoga",
    "pilates",
    "stretching",
    "flexibility",
    "squats",
    "deadlifts",
    "bench press",
    "pushups",
    "pull-ups",
    "running",
    "swimming",
];

/// Captured words that never name an activity or a body part
const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "my", "his", "her", "their", "no", "any", "some", "much", "of", "in", "on",
    "to", "at", "but", "and", "or", "is", "was", "so", "when", "after", "during", "have", "has",
    "had", "from", "since", "with", "it", "that", "this", "being", "nothing", "something",
    "anything", "everything", "get", "got", "feel", "felt", "having",
];

// "I enjoy short HIIT workouts": the word right before the workout noun
static PREFERENCE_NEAR_WORKOUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:prefer|like|enjoy|love|favou?rite)\w*\b[^.!?\n]*?\b(\w+)\s+(?:exercises?|workouts?|training|routines?)\b",
    )
    .expect("preference regex is valid")
});

// "I love running"
static PREFERENCE_ACTIVITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:prefer|like|enjoy|love)s?\s+(?:doing\s+)?(\w+ing)\b")
        .expect("activity preference regex is valid")
});

// "pain in my shoulder", "injured my ankle", "sore back"
static INJURY_THEN_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:injury|injured|pain|hurts?|sore)\b(?:\s+(?:in|on|to|at))?(?:\s+(?:my|the|his|her|their))?\s+(\w+)",
    )
    .expect("injury regex is valid")
});

// "knee pain", "wrist injury", "shoulder hurts"
static PART_THEN_INJURY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\w+)\s+(?:pain|injury|soreness|hurts|aches)\b")
        .expect("body part regex is valid")
});

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*(minutes?|hours?|mins?)\b[^.!?\n]*?\b(?:workouts?|training|exercises?)\b")
        .expect("duration regex is valid")
});

static KEYWORDS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    EXERCISE_KEYWORDS
        .iter()
        .map(|keyword| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword));
            (*keyword, Regex::new(&pattern).expect("keyword regex is valid"))
        })
        .collect()
});

/// Mine preferences, injuries, durations and named exercises from a transcript.
///
/// Text without [`IMPORT_MARKER`] yields an empty set. Families are reported
/// in that fixed order; within a family, lines follow their position in the
/// text. Repeated mentions produce repeated lines.
pub fn extract_insights(transcript: &str) -> ChatInsightSet {
    let mut insights = ChatInsightSet::new();
    if !transcript.contains(IMPORT_MARKER) {
        return insights;
    }

    for activity in captures_in_order(transcript, &[&PREFERENCE_NEAR_WORKOUT, &PREFERENCE_ACTIVITY]) {
        insights.push(format!("User seems to prefer {} exercises or workouts.", activity));
    }

    for part in captures_in_order(transcript, &[&INJURY_THEN_PART, &PART_THEN_INJURY]) {
        insights.push(format!(
            "User may have an injury or pain in their {}. Consider exercises that don't stress this area.",
            part
        ));
    }

    for caps in DURATION.captures_iter(transcript) {
        let amount = &caps[1];
        let unit = if caps[2].to_lowercase().starts_with('h') {
            "hour"
        } else {
            "minute"
        };
        let plural = if amount == "1" { "" } else { "s" };
        insights.push(format!(
            "User may prefer workouts lasting around {} {}{}.",
            amount, unit, plural
        ));
    }

    for (keyword, pattern) in KEYWORDS.iter() {
        if pattern.is_match(transcript) {
            insights.push(format!("User has mentioned {} in their conversation.", keyword));
        }
    }

    if !insights.is_empty() {
        tracing::info!("Extracted {} insights from imported chat history", insights.len());
    }
    insights
}

/// First capture group of every match of `patterns`, ordered by position
fn captures_in_order(text: &str, patterns: &[&Regex]) -> Vec<String> {
    let mut found: Vec<(usize, String)> = patterns
        .iter()
        .flat_map(|pattern| pattern.captures_iter(text))
        .filter_map(|caps| caps.get(1))
        .filter(|word| !FILLER_WORDS.contains(&word.as_str().to_lowercase().as_str()))
        .map(|word| (word.start(), word.as_str().to_lowercase()))
        .collect();
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, word)| word).collect()
}
