use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Strip restricted foods from generated meal plans",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rewrite a plan for a user's allergies, restrictions and dislikes
    Rewrite(RewriteArgs),
    /// List one day's entries with parsed quantities
    Items(ItemsArgs),
}

#[derive(Args, Debug)]
pub struct RewriteArgs {
    /// Plan file: JSON, or a raw model response wrapped in a code fence
    #[arg(short, long)]
    pub plan: PathBuf,

    /// JSON profile with `allergies`, `dietary_restrictions`, `disliked_foods`
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Comma-separated allergies (overrides the profile field)
    #[arg(long)]
    pub allergies: Option<String>,

    /// Comma-separated dietary or medical restrictions (overrides the profile field)
    #[arg(long)]
    pub dietary_restrictions: Option<String>,

    /// Comma-separated disliked foods (overrides the profile field)
    #[arg(long)]
    pub disliked_foods: Option<String>,

    /// Substitution search depth before falling back
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Substitute used when no safe replacement is found
    #[arg(long)]
    pub fallback: Option<String>,

    /// CSV replacement table with `restricted,substitute` columns
    #[arg(long)]
    pub replacements: Option<PathBuf>,

    /// Write the rewritten plan here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the rewrite report to stderr
    #[arg(long)]
    pub report: bool,
}

#[derive(Args, Debug)]
pub struct ItemsArgs {
    /// Plan file: JSON, or a raw model response wrapped in a code fence
    #[arg(short, long)]
    pub plan: PathBuf,

    /// Day number to list
    #[arg(short, long, default_value_t = 1)]
    pub day: u32,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
