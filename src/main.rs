use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use goal_onboarding::config::TutorialConfig;
use goal_onboarding::onboarding::layout::Rect;
use goal_onboarding::onboarding::{
    AutoStartOutcome, OnboardingEngine, VirtualPage, detect_page_type, script_for,
};
use goal_onboarding::store::{LibSqlStore, SettingsStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "/dashboard".to_string());
    let db_path = std::env::var("GOAL_ONBOARDING_DB_PATH")
        .unwrap_or_else(|_| "./data/onboarding.db".to_string());
    let profile =
        std::env::var("GOAL_ONBOARDING_PROFILE").unwrap_or_else(|_| "default".to_string());
    let config = TutorialConfig::from_env().context("invalid onboarding configuration")?;

    eprintln!("🎯 Goal onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Page: {} ({})", path, detect_page_type(&path));
    eprintln!("   Settings: {} (profile {})", db_path, profile);
    eprintln!("   Keys: n(ext) p(rev) s(kip) | start, reset, disable, status, html, quit\n");

    let store: Arc<dyn SettingsStore> = Arc::new(
        LibSqlStore::new_local(std::path::Path::new(&db_path), &profile)
            .await
            .with_context(|| format!("failed to open settings database at {db_path}"))?,
    );
    let page = Arc::new(demo_page(&path));
    let engine = Arc::new(OnboardingEngine::new(store, page.clone(), config));

    let outcome = engine.page_loaded().await.await?;
    match outcome {
        AutoStartOutcome::Started(_) => {}
        other => eprintln!("   No tutorial auto-started: {:?}", other),
    }
    print_overlay(&page);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            "n" | "next" => {
                engine.handle_key("ArrowRight").await;
            }
            "p" | "prev" => {
                engine.handle_key("ArrowLeft").await;
            }
            "s" | "skip" | "esc" => {
                engine.handle_key("Escape").await;
            }
            "start" => {
                engine.start_tutorial(None).await;
            }
            "reset" => engine.reset_tutorials().await,
            "disable" => engine.disable_all_tutorials().await,
            "status" => {
                println!("{}", serde_json::to_string_pretty(&engine.status().await)?);
            }
            "html" => match page.overlay_html() {
                Some(html) => println!("{html}"),
                None => eprintln!("(no overlay)"),
            },
            "q" | "quit" => break,
            other => eprintln!("unknown command: {other}"),
        }
        print_overlay(&page);
        eprint!("> ");
    }

    engine.page_unloaded().await;
    Ok(())
}

/// A page whose elements are exactly the targets of its tutorial, stacked
/// down the viewport, rendered for a user who registered just now.
fn demo_page(path: &str) -> VirtualPage {
    let user = serde_json::json!({ "created_at": chrono::Utc::now().to_rfc3339() });
    let mut page = VirtualPage::new(path).with_user_json(user.to_string());
    if let Some(script) = script_for(detect_page_type(path)) {
        for (i, step) in script.steps.iter().enumerate() {
            let top = 60.0 + i as f64 * 150.0;
            page = page.with_element(step.target_selector, Rect::new(top, 80.0, 520.0, 110.0));
        }
    }
    page
}

fn print_overlay(page: &VirtualPage) {
    match page.overlay() {
        Some(view) => {
            println!("\n┌─ {} ─ {}", view.indicator(), view.title);
            println!("│ {}", view.body);
            println!(
                "└─ [{}] [{}] [Skip tour]  @ {:?}\n",
                if view.show_previous { "Previous" } else { "        " },
                view.next_label,
                view.position
            );
        }
        None => println!("\n(no tutorial showing)\n"),
    }
}
