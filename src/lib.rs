pub mod cli;
pub mod config;
pub mod error;
pub mod meal_entry;
pub mod plan;
pub mod plan_parser;
pub mod quantity;
pub mod replacement;
pub mod restrictions;

pub use error::{GuardError, Result};
pub use meal_entry::{MealEntry, MealRewriter};
pub use plan::{rewrite_plan, MealSlot, PlanWalker, RewriteOutcome, RewriteReport};
pub use replacement::{find_safe_replacement, ReplacementMap};
pub use restrictions::{RestrictionSet, UserProfile};
