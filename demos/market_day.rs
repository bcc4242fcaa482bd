/// Market Day example: one short story authored against the bundled catalog.
///
/// Silo visits a busy market: arrival, exploring the stalls, the drums start,
/// a regulation beat with noise muffs, then a calm reflection.
///
/// Scene text comes from the offline narrator, so every line is the local
/// fallback. Swap in a real `TextGenerator` to get generated prose.
///
/// Run with: cargo run --example market_day

use curmunchkins_engine::core::collab::{CancelToken, Narrator};
use curmunchkins_engine::core::regulation::Alert;
use curmunchkins_engine::schema::spark::{EventDraft, EventPatch, SparkStage};
use curmunchkins_engine::schema::story::Goals;
use curmunchkins_engine::Session;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut session = Session::builder()
        .seed(2026)
        .build()
        .expect("Failed to build session");
    let narrator = Narrator::offline();
    let never = CancelToken::never();

    let story = session.create_new_story(
        "Silo and the Market Drums",
        Goals::new("feel safe in loud places", "ask for noise muffs"),
    );
    println!("=== {} ===\n", story.title);

    // --- Hook: arrive at the market ---
    let budget = session
        .move_character_to_location("silo-01", "market-square")
        .expect("market-square is in the bundled catalog");
    println!(
        "Market Square load: total {} (exceeded: {})",
        budget.budget.total(),
        budget.exceeded
    );

    let arrive = session
        .add_event(
            EventDraft::new(SparkStage::Hook, "Arriving at the market")
                .actor("silo-01")
                .at("market-square"),
        )
        .id
        .clone();

    // --- Explore: the stalls ---
    session.next_stage();
    session.add_event(
        EventDraft::new(SparkStage::Explore, "Looking at the stalls")
            .actor("silo-01")
            .at("market-square")
            .buggie("overwhelm", 2),
    );

    // --- Challenge: the drums start ---
    session.next_stage();
    let drums = session
        .add_event(
            EventDraft::new(SparkStage::Challenge, "The drums start")
                .actor("silo-01")
                .at("market-square")
                .buggie("loud-noises", 4),
        )
        .id
        .clone();
    session.adjust_buggie_intensity("loud-noises", 4);
    println!(
        "\nLoud Noises at 4, micro-beat alert: {}",
        session.regulation().micro_beat
    );

    let over_caps = session.gentler_request("The drums boom and everyone shouts.");
    let gentler = narrator.gentler_scene(&over_caps, &never).await;
    println!("Gentler scene: {}", gentler.value);

    // --- Support: regulation beat and noise muffs ---
    session.next_stage();
    if let Some(beat) = session.insert_regulation_beat() {
        println!("\n[{}] {}: {}", beat.spark, beat.title, beat.text);
    }
    let calmer = session
        .apply_budget("market-square", &["noise-muffs"])
        .expect("market-square is in the bundled catalog");
    println!(
        "With noise muffs: total {} (exceeded: {})",
        calmer.budget.total(),
        calmer.exceeded
    );
    if let Some(request) = session.regulation_beat_request("noise-muffs", "verbal-tiggie-01", "loud") {
        let coping = narrator.regulation_beat(&request, &never).await;
        println!("Coping step: {}", coping.value);
    }

    session.acknowledge(Alert::MicroBeat);
    session.adjust_buggie_intensity("loud-noises", 2);
    session.update_event(
        &drums,
        EventPatch {
            props: Some(vec!["noise-muffs".to_string()]),
            ..EventPatch::default()
        },
    );

    // --- Payoff: reflection ---
    session.next_stage();
    session.add_event(EventDraft::new(SparkStage::Payoff, "Dancing with muffs on").actor("silo-01"));
    let reflection = session.reflection_request(
        vec!["put on noise muffs".to_string(), "took deep breaths".to_string()],
        "kept trying",
    );
    println!("\nReflection: {}", narrator.reflection(&reflection, &never).await.value);

    if let Some(request) = session.scene_request(&arrive) {
        println!("Opening scene: {}", narrator.scene(&request, &never).await.value);
    }

    // --- Lanes ---
    println!("\n=== Lanes ===");
    for stage in SparkStage::ALL {
        println!(
            "  {:<10} {:>3}%  {} beat(s)",
            stage.name(),
            session.lane_progress(stage),
            session.lane(stage).len()
        );
    }

    session.advance(Duration::from_secs(7 * 60));
    println!("\n{}", session.care_note());
}
