use diet_guard::config::RewriteConfig;
use diet_guard::plan::{day_key, parse_day_key};
use diet_guard::plan_parser::parse_plan_text;
use diet_guard::{
    find_safe_replacement, rewrite_plan, MealEntry, MealRewriter, MealSlot, ReplacementMap,
    RestrictionSet, UserProfile,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};
use std::io::Write;
use tempfile::NamedTempFile;

const FOODS: &[&str] = &[
    "Beef curry",
    "Rice (brown, raw)",
    "Egg bhaji",
    "Grilled fish",
    "Milk tea",
    "Pork ribs",
    "Dal",
    "Eggplant bharta",
    "Peanut chutney",
    "Cheese toast",
    "Banana",
];

fn random_plan(rng: &mut StdRng, days: u32) -> Value {
    let mut plan = Map::new();
    for day in 1..=days {
        let mut slots = Map::new();
        for slot in [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner, MealSlot::Snacks] {
            let count = rng.gen_range(0..5);
            let entries: Vec<Value> = (0..count)
                .map(|_| {
                    let food = FOODS.choose(rng).copied().unwrap_or("Dal");
                    match rng.gen_range(0..3) {
                        0 => json!(format!("{}: {}g", food, rng.gen_range(20..300))),
                        1 => json!(food),
                        _ => json!({"name": food, "prep_time": rng.gen_range(5..40)}),
                    }
                })
                .collect();
            slots.insert(slot.label().to_string(), Value::Array(entries));
        }
        plan.insert(day_key(day), Value::Object(slots));
    }
    Value::Object(plan)
}

fn shape(plan: &Value) -> Vec<(String, Vec<(String, usize)>)> {
    plan.as_object()
        .unwrap()
        .iter()
        .map(|(day, slots)| {
            let slots = slots
                .as_object()
                .unwrap()
                .iter()
                .map(|(slot, entries)| (slot.clone(), entries.as_array().unwrap().len()))
                .collect();
            (day.clone(), slots)
        })
        .collect()
}

#[test]
fn test_empty_restrictions_leave_plan_byte_identical() {
    let mut rng = StdRng::seed_from_u64(7);
    let plan = random_plan(&mut rng, 30);
    let restrictions = RestrictionSet::from_fields("none", "", "None");

    let outcome = rewrite_plan(&plan, &restrictions, &ReplacementMap::builtin(), 3);
    assert_eq!(
        serde_json::to_string(&outcome.plan).unwrap(),
        serde_json::to_string(&plan).unwrap()
    );
    assert_eq!(outcome.report.entries_changed, 0);
}

#[test]
fn test_shape_is_preserved_for_random_plans() {
    let restrictions =
        RestrictionSet::from_fields("peanut, egg", "beef,pork", "fish, milk, cheese");
    let map = ReplacementMap::builtin();
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let days = rng.gen_range(1..=30);
        let plan = random_plan(&mut rng, days);
        let outcome = rewrite_plan(&plan, &restrictions, &map, 3);

        assert_eq!(shape(&outcome.plan), shape(&plan), "seed {}", seed);
        assert!(outcome.report.skipped.is_empty());
        assert!(outcome.report.day_gaps.is_empty());

        // no restricted keyword survives in any food name
        for (_, slots) in outcome.plan.as_object().unwrap() {
            for (_, entries) in slots.as_object().unwrap() {
                for entry in entries.as_array().unwrap() {
                    let entry = MealEntry::from(entry.clone());
                    let name = entry.food_name().unwrap().to_lowercase();
                    assert!(
                        restrictions.iter().all(|kw| !name.contains(kw)),
                        "restricted term left in {:?} (seed {})",
                        name,
                        seed
                    );
                }
            }
        }
    }
}

#[test]
fn test_beef_curry_example() {
    let plan = json!({"Day 1": {"Lunch": ["Beef curry: 150g"]}});
    let restrictions = RestrictionSet::from_terms(["beef"]);
    let map = ReplacementMap::empty().with_entry("beef", "chicken").unwrap();

    let outcome = rewrite_plan(&plan, &restrictions, &map, 3);
    let text = outcome.plan["Day 1"]["Lunch"][0].as_str().unwrap();
    assert_eq!(text, "Chicken curry: 150g");
    assert_eq!(text.to_lowercase(), "chicken curry: 150g");
}

#[test]
fn test_mutually_referencing_substitutes_terminate() {
    let restrictions = RestrictionSet::from_terms(["tofu", "seitan"]);
    let map = ReplacementMap::empty()
        .with_entry("tofu", "seitan strips")
        .unwrap()
        .with_entry("seitan", "smoked tofu")
        .unwrap();

    for depth in [0, 1, 2, 3, 10, 1000] {
        assert_eq!(
            find_safe_replacement("tofu", &restrictions, &map, depth),
            map.fallback()
        );
    }

    let rewriter = MealRewriter::new(&restrictions, &map, 3);
    let (out, changed) = rewriter.rewrite_entry(&MealEntry::Text("Tofu stir fry: 1 cup".into()));
    assert!(changed);
    assert_eq!(out, MealEntry::Text("Vegetables stir fry: 1 cup".into()));
}

#[test]
fn test_structured_entry_field_isolation() {
    let plan = json!({
        "Day 1": {"Breakfast": [{"name": "Egg Toast", "prep_time": 10, "foods": ["eggs", "bread"]}]}
    });
    let outcome = rewrite_plan(
        &plan,
        &RestrictionSet::from_terms(["egg"]),
        &ReplacementMap::builtin(),
        3,
    );
    assert_eq!(
        outcome.plan["Day 1"]["Breakfast"][0],
        json!({"name": "Tofu scramble Toast", "prep_time": 10, "foods": ["eggs", "bread"]})
    );
}

#[test]
fn test_absent_profile_field_resolves_like_empty() {
    let absent: UserProfile = serde_json::from_value(json!({
        "dietary_restrictions": "no_beef, pork",
        "disliked_foods": "Eggplant"
    }))
    .unwrap();
    let empty: UserProfile = serde_json::from_value(json!({
        "allergies": "",
        "dietary_restrictions": "no_beef, pork",
        "disliked_foods": "Eggplant"
    }))
    .unwrap();
    assert_eq!(absent.allergies, None);
    assert_eq!(
        RestrictionSet::from_profile(&absent),
        RestrictionSet::from_profile(&empty)
    );
}

#[test]
fn test_malformed_day_key_passes_through() {
    let plan = json!({
        "Day 1": {"Lunch": ["Pork ribs: 100g"]},
        "Day one": {"Lunch": ["Pork ribs: 100g"]},
        "Day 2": {"Dinner": ["Pork stew: 200g"]}
    });
    let outcome = rewrite_plan(
        &plan,
        &RestrictionSet::from_terms(["pork"]),
        &ReplacementMap::builtin(),
        3,
    );
    assert_eq!(outcome.plan["Day one"], plan["Day one"]);
    assert_eq!(outcome.plan["Day 1"]["Lunch"][0], "Chicken ribs: 100g");
    assert_eq!(outcome.plan["Day 2"]["Dinner"][0], "Chicken stew: 200g");
    assert_eq!(outcome.report.skipped, vec!["Day one"]);
}

#[test]
fn test_fenced_response_through_csv_table() -> anyhow::Result<()> {
    let mut table = NamedTempFile::new()?;
    writeln!(table, "restricted,substitute")?;
    writeln!(table, "shrimp,paneer")?;
    writeln!(table, "paneer,chickpeas")?;
    table.flush()?;

    let config = RewriteConfig {
        replacement_table: Some(table.path().to_path_buf()),
        ..Default::default()
    };
    let map = config.load_replacement_map()?;

    let raw = concat!(
        "```json\n",
        r#"{"Day 1": {"Suhoor": ["Shrimp malai: 100g"], "Iftar": ["Paneer pakora: 3 pcs"]}}"#,
        "\n```"
    );
    let plan = parse_plan_text(raw)?;
    let restrictions = RestrictionSet::from_fields("shrimp", "paneer", "");
    let outcome = rewrite_plan(&plan, &restrictions, &map, config.max_depth);

    assert_eq!(outcome.plan["Day 1"]["Suhoor"][0], "Chickpeas malai: 100g");
    assert_eq!(outcome.plan["Day 1"]["Iftar"][0], "Chickpeas pakora: 3 pcs");
    Ok(())
}

#[test]
fn test_day_keys_round_trip() {
    for day in 1..=30 {
        assert_eq!(parse_day_key(&day_key(day)), Some(day));
    }
}
