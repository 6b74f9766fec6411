//! End-to-end tests over the public API with deterministic providers

use std::sync::Arc;
use std::time::Duration;

use workout_rag::config::{LlmConfig, RetrievalConfig};
use workout_rag::ingestion::{FileParser, IngestPipeline, TextChunker};
use workout_rag::providers::mock::{HashEmbedder, ScriptedLlm};
use workout_rag::providers::{InMemoryVectorStore, VectorStoreProvider};
use workout_rag::types::PageText;
use workout_rag::{
    extract_insights, AnswerEvent, ChatService, ConversationMemory, GenerationClient, PlanPipeline,
    RetrievalOptions, Retriever, UserProfile, Weekday, WorkoutPlan,
};

const GUIDE: &str = "Progressive overload means adding weight or reps over time.\n\n\
Beginners training at home can use dumbbells for goblet squats, rows and presses.\n\n\
Rest days let muscles recover and reduce the risk of overuse injuries.";

struct Harness {
    embedder: Arc<HashEmbedder>,
    store: Arc<InMemoryVectorStore>,
    ingest: IngestPipeline,
}

fn harness() -> Harness {
    let embedder = Arc::new(HashEmbedder::new(128));
    let store = Arc::new(InMemoryVectorStore::new());
    let ingest = IngestPipeline::new(
        Arc::new(FileParser::new()),
        TextChunker::default(),
        embedder.clone(),
        store.clone(),
    );
    Harness {
        embedder,
        store,
        ingest,
    }
}

fn profile() -> UserProfile {
    UserProfile {
        name: "Morgan".to_string(),
        age: 52,
        gender: "male".to_string(),
        height: 178.0,
        weight: 88.0,
        occupation: Some("Accountant".to_string()),
        experience_level: "Beginner".to_string(),
        goal: 1,
        training_environment: "home_light".to_string(),
        time_available: 40,
        additional_info: "--- Imported Chat History --- I love running but have knee pain".to_string(),
    }
}

#[tokio::test]
async fn test_ingest_then_generate_grounded_plan() {
    let h = harness();
    let report = h
        .ingest
        .ingest_document("uploads/home-guide.md", GUIDE.as_bytes().to_vec())
        .await
        .unwrap();
    assert_eq!(report.source_file_path, "home-guide.md");
    assert_eq!(h.ingest.list_documents().await.unwrap(), vec!["home-guide.md"]);

    let llm = Arc::new(ScriptedLlm::with_replies([
        "Here you go:\n```json\n{\"monday\": [\"Goblet squats: 3 sets x 10 reps\"], \"Wednesday\": \"Rest day\"}\n```",
    ]));
    let planner = PlanPipeline::new(
        Retriever::new(h.embedder.clone(), h.store.clone()),
        GenerationClient::new(llm.clone(), &LlmConfig::default()),
        RetrievalConfig::default().plan,
    );

    let plan = planner.generate_plan(&profile()).await.unwrap();
    assert_eq!(plan.get(Weekday::Monday).unwrap(), ["Goblet squats: 3 sets x 10 reps"]);
    assert_eq!(plan.active_days(), 1);

    let prompt = llm.prompt(0).unwrap();
    assert!(prompt.contains("home-guide.md"));
    assert!(prompt.contains("INSIGHTS EXTRACTED FROM CONVERSATION"));
    assert!(prompt.contains("knee"));
}

#[tokio::test]
async fn test_plan_family_never_fails_on_provider_errors() {
    let h = harness();
    let planner = PlanPipeline::new(
        Retriever::new(h.embedder.clone(), h.store.clone()),
        GenerationClient::new(Arc::new(ScriptedLlm::failing()), &LlmConfig::default()),
        RetrievalConfig::default().plan,
    );

    let first = planner.generate_plan(&profile()).await.unwrap();
    let second = planner.generate_plan(&profile()).await.unwrap();
    assert_eq!(first, WorkoutPlan::default_plan());
    assert_eq!(first, second);

    let adjusted = planner
        .adjust_plan(&first, "add one rest day", "Morgan")
        .await
        .unwrap();
    assert!(adjusted.active_days() <= first.active_days());
}

#[tokio::test]
async fn test_empty_index_retrieval_is_empty() {
    let h = harness();
    let retriever = Retriever::new(h.embedder.clone(), h.store.clone());
    for k in [0, 1, 5] {
        let options = RetrievalOptions {
            k,
            fetch_k: 20,
            lambda_mult: 0.7,
            source_filter: None,
        };
        assert!(retriever.retrieve("any question", &options).await.unwrap().is_empty());
    }
}

#[test]
fn test_chunk_ids_are_contiguous_for_long_document() {
    let sentence = "Keep your core braced and your spine neutral during every lift. ";
    let text = sentence.repeat(120);
    let chunker = TextChunker::new(1200, 150);
    let chunks = chunker.chunk_pages(
        "form.pdf",
        workout_rag::types::FileType::Pdf,
        &[PageText {
            page_number: Some(1),
            text,
        }],
    );

    assert!(chunks.len() > 1);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_id as usize, i);
        assert_eq!(chunk.total_chunks as usize, chunks.len());
        assert!(chunk.text.chars().count() <= 1200);
    }
}

#[test]
fn test_insight_contract() {
    assert!(extract_insights("I love running but have knee pain").is_empty());

    let insights = extract_insights("--- Imported Chat History --- I love running but have knee pain");
    assert!(insights
        .iter()
        .any(|i| i.contains("prefer") && i.contains("running")));
    assert!(insights.iter().any(|i| i.contains("injury") && i.contains("knee")));
}

#[tokio::test]
async fn test_chat_over_ingested_documents() {
    let h = harness();
    h.ingest
        .ingest_document("home-guide.md", GUIDE.as_bytes().to_vec())
        .await
        .unwrap();

    let llm = Arc::new(ScriptedLlm::with_replies(["- Add reps each week"]));
    let chat = ChatService::new(
        Retriever::new(h.embedder.clone(), h.store.clone()),
        GenerationClient::new(llm, &LlmConfig::default()),
        Arc::new(ConversationMemory::new(20)),
        RetrievalConfig::default().chat,
    );

    let mut stream = chat.answer_query("session-1", "What is progressive overload?").unwrap();
    let mut sources = Vec::new();
    let mut answer = String::new();
    while let Some(event) = stream.next().await {
        match event {
            AnswerEvent::Fragment(f) => answer.push_str(&f),
            AnswerEvent::Sources(s) => sources = s,
            AnswerEvent::Done => break,
            AnswerEvent::Error(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(answer, "- Add reps each week");
    assert_eq!(sources, vec!["home-guide.md"]);
}

#[tokio::test]
async fn test_clear_is_serialized_with_ingestion() {
    let h = harness();
    let report = h
        .ingest
        .ingest_document("home-guide.md", GUIDE.as_bytes().to_vec())
        .await
        .unwrap();

    let lock = h.ingest.index_lock();
    let reader = lock.clone().read_owned().await;

    let ingest = Arc::new(h.ingest);
    let clearing = {
        let ingest = ingest.clone();
        tokio::spawn(async move { ingest.clear_documents().await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!clearing.is_finished());
    assert_eq!(h.store.len().await.unwrap(), report.chunks);

    drop(reader);
    let removed = clearing.await.unwrap().unwrap();
    assert_eq!(removed, report.chunks);
    assert!(ingest.list_documents().await.unwrap().is_empty());
}
