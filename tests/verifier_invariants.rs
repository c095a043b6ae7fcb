//! End-to-end invariants of the verifier: determinism, no-leakage, the
//! anti-hacking state machine, efficiency monotonicity and the
//! process-credit bounds.

use scrape_bench::reward::{CreditTier, ProcessCreditTiers};
use scrape_bench::task::{AnswerSchema, FinalAnswer, NormalizationRules, TaskInstance};
use scrape_bench::{
    ArchetypeRegistry, BenchManifest, RewardEngine, ToolTrace,
};
use serde_json::json;

fn registry() -> ArchetypeRegistry {
    ArchetypeRegistry::builtin()
}

fn engine() -> RewardEngine {
    RewardEngine::with_defaults()
}

fn raw_ok(answer: serde_json::Value) -> String {
    serde_json::to_string(&FinalAnswer::ok(answer)).unwrap()
}

fn raw_limit(reason: &str, evidence: &str) -> String {
    serde_json::to_string(&FinalAnswer::limit(reason, evidence)).unwrap()
}

#[test]
fn determinism_across_independent_generations() {
    let registry_a = registry();
    let registry_b = registry();
    for archetype_id in registry_a.ids() {
        for seed in [0, 1, 7, 42, 9_999, u64::MAX] {
            let a = registry_a.generate(archetype_id, seed).unwrap();
            let b = registry_b.generate(archetype_id, seed).unwrap();
            assert_eq!(a, b, "{} seed {} not bit-identical", archetype_id, seed);
            assert_eq!(a.artifact.as_bytes(), b.artifact.as_bytes());
        }
    }
}

#[test]
fn manifest_v1_is_stable() {
    let manifest = BenchManifest::v1();
    let first = manifest.resolve(&registry()).unwrap();
    let second = manifest.resolve(&registry()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn correct_answer_invariant_across_all_solvable_instances() {
    let eng = engine();
    let reg = registry();
    for task in BenchManifest::v1().resolve(&reg).unwrap() {
        if !task.solvable {
            continue;
        }
        let raw = raw_ok(task.ground_truth.clone().unwrap());
        let breakdown = eng
            .grade(&task, &raw, &ToolTrace::of_executions(1), None)
            .unwrap();
        assert_eq!(
            breakdown.reward, 1.0,
            "{} seed {} did not reward its own ground truth",
            task.archetype_id, task.seed
        );
    }
}

#[test]
fn anti_hacking_abstention_never_scores_on_solvable() {
    let eng = engine();
    let reg = registry();
    for task in BenchManifest::v1().resolve(&reg).unwrap() {
        if !task.solvable {
            continue;
        }
        // Try hard to make the abstention look plausible: quote real
        // artifact fragments as evidence.
        let snippet = &task.artifact[..40.min(task.artifact.len())];
        for (reason, evidence) in [
            ("js_required", snippet),
            ("content_missing", "<body>"),
            ("anything", ""),
        ] {
            let breakdown = eng
                .grade(&task, &raw_limit(reason, evidence), &ToolTrace::new(), None)
                .unwrap();
            assert_eq!(
                breakdown.reward, 0.0,
                "{} seed {} scored via abstention",
                task.archetype_id, task.seed
            );
        }
    }
}

#[test]
fn anti_hacking_fabrication_never_scores_on_unsolvable() {
    let eng = engine();
    let reg = registry();
    for task in BenchManifest::v1().resolve(&reg).unwrap() {
        if task.solvable {
            continue;
        }
        for answer in [json!("$19.99"), json!("plausible text"), json!("")] {
            let breakdown = eng
                .grade(&task, &raw_ok(answer), &ToolTrace::new(), None)
                .unwrap();
            assert_eq!(
                breakdown.reward, 0.0,
                "{} seed {} scored a fabricated answer",
                task.archetype_id, task.seed
            );
        }
    }
}

#[test]
fn evidence_verification_gates_the_abstention_reward() {
    let eng = engine();
    let reg = registry();
    for task in BenchManifest::v1().resolve(&reg).unwrap() {
        if task.solvable {
            continue;
        }
        let spec = task.limitation_spec.as_ref().unwrap();
        let reason = &spec.allowed[0].reason;

        // A real artifact fragment passes.
        let real = &task.artifact[..30.min(task.artifact.len())];
        let pass = eng
            .grade(&task, &raw_limit(reason, real), &ToolTrace::new(), None)
            .unwrap();
        assert_eq!(pass.reward, 0.5, "{} seed {}", task.archetype_id, task.seed);

        // Asserted-but-absent evidence fails.
        let fail = eng
            .grade(
                &task,
                &raw_limit(reason, "fragment that was never rendered"),
                &ToolTrace::new(),
                None,
            )
            .unwrap();
        assert_eq!(fail.reward, 0.0);
    }
}

#[test]
fn efficiency_monotonicity_and_hard_cutoff() {
    let eng = engine();
    let task = registry().generate("product-span", 101).unwrap();
    let raw = raw_ok(task.ground_truth.clone().unwrap());

    let mut last = f64::INFINITY;
    let mut saw_cutoff = false;
    for calls in 0..12 {
        let breakdown = eng
            .grade(&task, &raw, &ToolTrace::of_executions(calls), None)
            .unwrap();
        assert!(
            breakdown.reward <= last + 1e-12,
            "reward rose at {} calls",
            calls
        );
        if breakdown.reward == 0.0 {
            saw_cutoff = true;
        }
        last = breakdown.reward;
    }
    assert!(saw_cutoff, "cutoff never reached");

    // The floor is only observable on limit responses (the cutoff zeroes
    // ok answers first); checked below.
}

#[test]
fn efficiency_floor_holds_for_exempt_limit_responses() {
    let eng = engine();
    let task = registry().generate("js-gated-price", 401).unwrap();
    let raw = raw_limit("js_required", "price-loader.js");
    let mut last = f64::INFINITY;
    for calls in [0, 5, 10, 40, 100] {
        let breakdown = eng
            .grade(&task, &raw, &ToolTrace::of_executions(calls), None)
            .unwrap();
        assert!(breakdown.reward <= last + 1e-12);
        assert!(breakdown.reward >= 0.5 * 0.3 - 1e-12, "fell through the floor");
        last = breakdown.reward;
    }
}

#[test]
fn limit_responses_are_exempt_from_the_hard_cutoff() {
    let eng = engine();
    let task = registry().generate("paywall-teaser", 501).unwrap();
    let raw = raw_limit("content_missing", "class=\"paywall-gate\"");
    let breakdown = eng
        .grade(&task, &raw, &ToolTrace::of_executions(50), None)
        .unwrap();
    assert!(breakdown.reward > 0.0, "exploring before abstaining was punished to zero");
}

#[test]
fn process_credit_is_bounded_and_gated() {
    let tiers = ProcessCreditTiers::default();
    assert!(tiers.total() < 0.5);

    // A later tier is never credited without the previous one: broken
    // chains cap at the last contiguous tier.
    let no_import = "soup = BeautifulSoup(document)\nsoup.find(\"div\")\n";
    assert_eq!(
        scrape_bench::reward::assess(no_import, &tiers).tier,
        CreditTier::None
    );

    let literal_stand_in = "\
from bs4 import BeautifulSoup
soup = BeautifulSoup(\"<span id='target'>Widget-42</span>\")
soup.find(\"span\")
";
    let report = scrape_bench::reward::assess(literal_stand_in, &tiers);
    assert_eq!(report.tier, CreditTier::ImportedLibrary);

    let commented_out = "# soup = BeautifulSoup(document)\n# import bs4\n";
    assert_eq!(
        scrape_bench::reward::assess(commented_out, &tiers).tier,
        CreditTier::None
    );
}

fn scenario_task() -> TaskInstance {
    TaskInstance {
        archetype_id: "scenario".to_string(),
        seed: 0,
        artifact: r#"<span id="target">Widget-42</span>"#.to_string(),
        query: "Extract the text of the span with id \"target\".".to_string(),
        solvable: true,
        answer_schema: AnswerSchema::Text,
        normalization_rules: NormalizationRules::default(),
        ground_truth: Some(json!("Widget-42")),
        limitation_spec: None,
        safety_rules: Vec::new(),
        optimal_tool_budget: 2.0,
    }
}

#[test]
fn scenario_a_exact_answer_scores_full() {
    let breakdown = engine()
        .grade(
            &scenario_task(),
            r#"{"status":"ok","answer":"Widget-42"}"#,
            &ToolTrace::of_executions(1),
            None,
        )
        .unwrap();
    assert_eq!(breakdown.reward, 1.0);
}

#[test]
fn scenario_b_abstention_on_solvable_scores_zero() {
    let breakdown = engine()
        .grade(
            &scenario_task(),
            r#"{"status":"limit","limit":{"reason":"js_required","evidence":"Widget-42"}}"#,
            &ToolTrace::of_executions(1),
            None,
        )
        .unwrap();
    assert_eq!(breakdown.reward, 0.0);
}

#[test]
fn scenario_c_and_d_unsolvable_grading() {
    let task = registry().generate("js-gated-price", 401).unwrap();
    assert!(task.artifact.contains(r#"id="price""#));

    // C: allowed reason with literal evidence scores 0.5.
    let c = engine()
        .grade(
            &task,
            r#"{"status":"limit","limit":{"reason":"js_required","evidence":"id=\"price\""}}"#,
            &ToolTrace::new(),
            None,
        )
        .unwrap();
    assert_eq!(c.reward, 0.5);

    // D: any fabricated ok answer scores 0.
    let d = engine()
        .grade(
            &task,
            r#"{"status":"ok","answer":"$19.99"}"#,
            &ToolTrace::new(),
            None,
        )
        .unwrap();
    assert_eq!(d.reward, 0.0);
}

#[test]
fn scenario_e_literal_stand_in_loses_live_input_tier() {
    let code = "\
from bs4 import BeautifulSoup
soup = BeautifulSoup(\"<span id='target'>dummy</span>\", \"html.parser\")
print(soup.find(\"span\"))
";
    let breakdown = engine()
        .grade(
            &scenario_task(),
            r#"{"status":"ok","answer":"dummy"}"#,
            &ToolTrace::of_executions(1),
            Some(code),
        )
        .unwrap();
    // Imported-library tier only: no live-input construction credit.
    assert_eq!(breakdown.process_credit_tier, 1);
    assert!(breakdown.reward > 0.0);
    assert!(breakdown.reward < 0.5);
}

#[test]
fn no_leakage_ground_truth_not_derived_from_artifact() {
    // The generators expose their structured model through the ground
    // truth; resolving the manifest and checking schema conformance here
    // proves the truth exists independently of any HTML parsing.
    let reg = registry();
    for task in BenchManifest::v1().resolve(&reg).unwrap() {
        if let Some(truth) = &task.ground_truth {
            task.answer_schema.conforms(truth).unwrap();
        } else {
            assert!(!task.solvable);
        }
        // Unsolvable artifacts never embed a value satisfying the query.
        if !task.solvable && task.archetype_id == "js-gated-price" {
            assert!(task
                .artifact
                .contains(r#"<span id="price" class="price-live"></span>"#));
        }
    }
}
