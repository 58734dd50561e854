//! Demo that drives the engine through a full refresh + favorite cycle with
//! a canned producer (no network).

use std::sync::Arc;

use anyhow::Result;
use fundnews_engine::{CandidateProducer, Engine, EngineConfig, SearchSpec};

struct CannedProducer;

#[async_trait::async_trait]
impl CandidateProducer for CannedProducer {
    async fn search(&self, spec: &SearchSpec) -> Result<String> {
        tracing::info!(query = spec.query(), count = spec.count, "canned search");
        Ok(r#"```json
        [
          {"title": "Fed Cuts Rates", "summary": "Policy pivot arrives earlier than expected.",
           "source": "Reuters", "time": "2 hours ago", "tags": ["Policy"], "isTopStory": true, "url": ""},
          {"title": "Spot Bitcoin ETF sees record inflows", "summary": "Institutional demand keeps climbing.",
           "source": "ETF Daily", "time": "4 hours ago", "tags": ["Crypto"]}
        ]
        ```"#
            .to_string())
    }
    fn name(&self) -> &'static str {
        "CannedProducer"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let engine = Engine::new(EngineConfig::load_default(), Arc::new(CannedProducer)).await;

    let outcome = engine.refresh(&SearchSpec::default()).await?;
    println!("refresh outcome: {outcome:?}");
    for item in engine.news() {
        println!("[{}] {} -> {}", item.source, item.title, item.url.as_deref().unwrap_or("-"));
    }

    if let Some(first) = engine.news().first() {
        let added = engine.toggle_favorite(first).await?;
        println!("toggled '{}' (added: {added})", first.title);
    }
    println!("favorites now: {}", engine.favorites().await.len());

    Ok(())
}
