use civis_insights::agent::ChatAgent;
use civis_insights::ai::client::GenerationClient;
use civis_insights::ai::flows::FlowSet;
use civis_insights::ai::gemini::GeminiService;
use civis_insights::ai::prompts;
use civis_insights::ai::speech::GeminiSpeech;
use civis_insights::ai::tools::ToolCatalog;
use civis_insights::config::Config;
use civis_insights::core::conversation::ConversationState;
use civis_insights::core::issue::{InMemoryIssueStore, IssueReport, IssueStore};
use civis_insights::core::stats::IssueStats;
use civis_insights::core::types::{InsightsInput, IssueCategory, PredictDemandInput, PrioritizeInput};
use civis_insights::triage::TriageService;
use dotenv::dotenv;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::builder().filter_level(log::LevelFilter::Info).parse_default_env().init();

    let config = Config::from_env()?;
    let gemini = GeminiService::new(&config)?;
    let client = GenerationClient::new(Arc::new(gemini.clone()), config.request_timeout);
    let flows = Arc::new(FlowSet::new(client.clone(), &config.model)?);
    let catalog = Arc::new(ToolCatalog::new(flows.clone()));

    let mut agent = ChatAgent::new(client, catalog, &config);
    if config.speech_enabled {
        agent = agent.with_speech(Arc::new(GeminiSpeech::new(gemini, &config)));
    }

    println!("🏛️  CIVIS INSIGHTS AI INITIALIZED (model: {})", config.model);

    // --- Citizen intake ---
    let store: Arc<dyn IssueStore> = Arc::new(InMemoryIssueStore::seeded());
    let report = "Large pothole on the corner of Main St and 2nd Ave, causing traffic issues and risk of tire damage to vehicles daily.";
    let issue = IssueReport::submit(IssueCategory::RoadMaintenance, report, None)?;
    let issue_id = issue.id.clone();
    store.insert(issue).await?;
    println!("📝 Submitted {issue_id}");

    // --- Single flow ---
    let input = PrioritizeInput { report_text: report.to_string(), category: IssueCategory::RoadMaintenance };
    match flows.prioritize(&input).await {
        Ok(out) => println!("{}", serde_json::to_string_pretty(&out)?),
        Err(e) => eprintln!("❌ {}", e.user_message()),
    }

    // --- Staff triage ---
    let triage = TriageService::new(flows.clone(), store.clone());
    match triage.triage(&issue_id).await {
        Ok(t) => println!("🩺 {} -> {} (score {})", t.issue.id, t.priority.suggested_department, t.priority.priority_score),
        Err(e) => eprintln!("❌ {}", e.user_message()),
    }

    // --- Dashboard panels ---
    let stats = IssueStats::collect(store.as_ref()).await;
    println!(
        "📊 {} issues: {} new, {} in progress, {} resolved ({:.0}% resolved)",
        stats.total,
        stats.new,
        stats.in_progress,
        stats.resolved,
        stats.resolution_rate * 100.0
    );
    if let Some(top) = stats.top_category {
        println!("   Most reported: {top} ({})", stats.count_for(top));
    }

    let demand = PredictDemandInput {
        historical_data: "Past 6 months of service requests show a 15% increase in sanitation and a 5% decrease in parks & rec requests during winter.".into(),
        current_issue_summaries: "Recent issues include multiple reports of overflowing bins and requests for pothole repairs.".into(),
        prediction_horizon: "next month".into(),
    };
    match flows.predict_demand(&demand).await {
        Ok(out) => {
            for d in &out.predicted_demand {
                println!("📈 {:?}: {} -> {}", d.service, d.current_demand, d.predicted_demand);
            }
        }
        Err(e) => eprintln!("❌ {}", e.user_message()),
    }

    let insights = InsightsInput {
        citizen_feedback_summary: "Increased noise complaints around the new commercial complex. Repeated reports of illegal parking in the same area.".into(),
        historical_demand_data: "Spike in public safety calls by 30% in the commercial district over the last two months, coinciding with the complex opening.".into(),
    };
    match flows.generate_insights(&insights).await {
        Ok(out) => println!("💡 {}", out.key_insight),
        Err(e) => eprintln!("❌ {}", e.user_message()),
    }

    // --- Chat ---
    let mut session = ConversationState::with_greeting(prompts::GREETING);
    let reply = agent.respond(&mut session, "Prioritize an issue about a large pothole on Main St").await;
    println!("\n🤖 {}", reply.text);
    for call in &reply.tool_invocations {
        println!("   🔧 used {}", call.call.name);
    }
    if reply.audio.is_some() {
        println!("   🔊 audio attached");
    }

    Ok(())
}
