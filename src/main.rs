use anyhow::{Context, Result};
use diet_guard::cli::{parse_args, Command, ItemsArgs, RewriteArgs};
use diet_guard::config::RewriteConfig;
use diet_guard::plan::{day_entries, PlanWalker};
use diet_guard::plan_parser::parse_plan_text;
use diet_guard::quantity::parse_quantity;
use diet_guard::{RestrictionSet, UserProfile};
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

async fn read_plan(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read plan file '{}'", path.display()))?;
    parse_plan_text(&content)
        .with_context(|| format!("Failed to parse plan file '{}'", path.display()))
}

async fn load_profile(args: &RewriteArgs) -> Result<UserProfile> {
    let mut profile = match &args.profile {
        Some(path) => {
            let content = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read profile file '{}'", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse profile file '{}'", path.display()))?
        }
        None => UserProfile::default(),
    };
    if let Some(allergies) = &args.allergies {
        profile.allergies = Some(allergies.clone());
    }
    if let Some(restrictions) = &args.dietary_restrictions {
        profile.dietary_restrictions = Some(restrictions.clone());
    }
    if let Some(disliked) = &args.disliked_foods {
        profile.disliked_foods = Some(disliked.clone());
    }
    Ok(profile)
}

async fn run_rewrite(args: RewriteArgs) -> Result<()> {
    let mut config = RewriteConfig::from_env().context("Failed to read configuration")?;
    if let Some(depth) = args.max_depth {
        config.max_depth = depth;
    }
    if let Some(fallback) = &args.fallback {
        config.fallback = fallback.clone();
    }
    if let Some(path) = &args.replacements {
        config.replacement_table = Some(path.clone());
    }

    let replacement_map = config
        .load_replacement_map()
        .context("Failed to load replacement table")?;
    let profile = load_profile(&args).await?;
    let restrictions = RestrictionSet::from_profile(&profile);
    tracing::info!(
        restrictions = restrictions.len(),
        max_depth = config.max_depth,
        "resolved dietary restrictions"
    );

    let plan = read_plan(&args.plan).await?;
    let outcome = PlanWalker::new(&restrictions, &replacement_map, config.max_depth).rewrite(&plan);
    tracing::info!(
        visited = outcome.report.entries_visited,
        changed = outcome.report.entries_changed,
        skipped = outcome.report.skipped.len(),
        "plan rewritten"
    );

    let rendered = serde_json::to_string_pretty(&outcome.plan)?;
    match &args.output {
        Some(path) => fs::write(path, rendered + "\n")
            .await
            .with_context(|| format!("Failed to write output file '{}'", path.display()))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(rendered.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    if args.report {
        eprintln!("{}", serde_json::to_string_pretty(&outcome.report)?);
    }
    Ok(())
}

async fn run_items(args: ItemsArgs) -> Result<()> {
    let plan = read_plan(&args.plan).await?;
    let slots = day_entries(&plan, args.day);
    if slots.is_empty() {
        anyhow::bail!("Day {} not found in '{}'", args.day, args.plan.display());
    }

    for (slot, entries) in slots {
        println!("{}:", slot);
        for entry in entries {
            let Some(name) = entry.food_name() else {
                continue;
            };
            let quantity_text = entry.quantity_text().unwrap_or("");
            let quantity = parse_quantity(quantity_text);
            println!(
                "  - {} [{}] grams={:?} pieces={:?}",
                name, quantity_text, quantity.grams, quantity.pieces
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match parse_args().command {
        Command::Rewrite(args) => run_rewrite(args).await,
        Command::Items(args) => run_items(args).await,
    }
}
