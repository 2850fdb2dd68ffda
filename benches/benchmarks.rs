// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// Everything except the model call sits on the per-message hot path:
//   1. Startup: schema migration on a fresh database
//   2. Input classification and state transitions
//   3. Prompt rendering for full intakes and long conversations

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rusqlite::Connection;

use ragnosis::dialogue::machine::StateMachine;
use ragnosis::dialogue::menu::MenuConfig;
use ragnosis::dialogue::prompt::{PromptBuilder, PromptKind, PromptTemplates};
use ragnosis::dialogue::session::{AgeGroup, BiologicalSex, Session, Severity, Stage, SymptomDuration};
use ragnosis::memory::schema::run_migrations;

// ─── Helpers ────────────────────────────────────────────────────────────────

/// A session at the end of a full intake.
fn intake_session() -> Session {
    let mut s = Session::new("bench");
    for symptom in ["🤒 Fever", "🤧 Cough", "🤕 Headache", "😴 Fatigue"] {
        s.toggle_symptom(symptom);
    }
    s.demographics.age_group = Some(AgeGroup::Adult);
    s.demographics.biological_sex = Some(BiologicalSex::Female);
    s.duration = Some(SymptomDuration::OneToThreeDays);
    s.severity = Some(Severity::Moderate);
    s.stage = Stage::Analysis;
    s
}

/// A chat session holding `turns` turns.
fn chat_session(turns: usize) -> Session {
    let mut s = Session::new("bench");
    s.stage = Stage::FreeformChat;
    for i in 0..turns {
        s.record_turn(
            &format!("Question #{i}: my headache gets worse in the evening, why?"),
            &format!("Answer #{i}: evening headaches are often linked to screen time and dehydration."),
            turns,
        );
    }
    s
}

// ─── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_startup(c: &mut Criterion) {
    c.bench_function("startup_schema_init", |b| {
        b.iter(|| {
            let conn = Connection::open_in_memory().expect("open in-memory db");
            run_migrations(&conn).expect("run migrations");
            black_box(conn)
        });
    });
}

fn bench_step(c: &mut Criterion) {
    let menu = MenuConfig::default();
    let machine = StateMachine::new(menu.clone(), 20);
    let mut group = c.benchmark_group("step");

    group.bench_function("classify_button", |b| {
        b.iter(|| menu.classify(black_box("🕑 3-7 days")));
    });

    group.bench_function("classify_free_text", |b| {
        b.iter(|| menu.classify(black_box("I have had a dull ache behind my eyes since Monday")));
    });

    group.bench_function("toggle_symptom", |b| {
        let mut session = Session::new("bench");
        session.stage = Stage::Symptoms;
        let input = menu.classify("🤒 Fever");
        b.iter(|| {
            let t = machine.step(session.clone(), black_box(&input));
            black_box(t)
        });
    });

    group.bench_function("full_intake", |b| {
        let inputs: Vec<_> = [
            "/analyze",
            "🤒 Fever",
            "🤧 Cough",
            "/done",
            "🚫 Skip Age",
            "👩 Female",
            "🕐 1-3 days",
            "😐 Moderate",
        ]
        .iter()
        .map(|t| menu.classify(t))
        .collect();
        b.iter(|| {
            let mut session = Session::new("bench");
            for input in &inputs {
                session = machine.step(session, input).session;
            }
            black_box(session)
        });
    });

    group.finish();
}

fn bench_prompts(c: &mut Criterion) {
    let builder = PromptBuilder::new(PromptTemplates::default(), "RAGnosis", 8).expect("templates");
    let mut group = c.benchmark_group("prompt");

    let intake = intake_session();
    group.bench_function("render_full", |b| {
        b.iter(|| builder.render(black_box(&PromptKind::Full), &intake));
    });

    group.bench_function("render_quick", |b| {
        b.iter(|| builder.render(black_box(&PromptKind::Quick), &intake));
    });

    let chat = chat_session(50);
    let kind = PromptKind::Conversational {
        message: "Should I see a doctor about it?".into(),
    };
    group.bench_function("render_conversational_50_turns", |b| {
        b.iter(|| builder.render(black_box(&kind), &chat));
    });

    group.bench_function("render_summary_50_turns", |b| {
        b.iter(|| builder.render(black_box(&PromptKind::Summary), &chat));
    });

    group.finish();
}

criterion_group!(benches, bench_startup, bench_step, bench_prompts);
criterion_main!(benches);
