// Model name routing (Claude → Gemini)

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// Configured tier targets for model routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTargets {
    #[serde(default = "default_big_model")]
    pub big_model: String,
    #[serde(default = "default_small_model")]
    pub small_model: String,
}

fn default_big_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_small_model() -> String {
    "gemini-2.5-flash".to_string()
}

impl Default for ModelTargets {
    fn default() -> Self {
        Self {
            big_model: default_big_model(),
            small_model: default_small_model(),
        }
    }
}

/// Tier a Claude model name routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Big,
    Small,
}

/// Known Claude model names and their tier.
static MODEL_TIERS: phf::Map<&'static str, Tier> = phf_map! {
    // Claude 4 models
    "claude-4-opus" => Tier::Big,
    "claude-4-sonnet" => Tier::Big,
    "claude-4-haiku" => Tier::Small,
    "claude-opus-4" => Tier::Big,
    "claude-sonnet-4" => Tier::Big,
    "claude-haiku-4" => Tier::Small,
    "claude-opus-4-5" => Tier::Big,
    "claude-sonnet-4-5" => Tier::Big,
    "claude-haiku-4-5" => Tier::Small,

    // Claude 3.5 models
    "claude-3-5-sonnet" => Tier::Big,
    "claude-3-5-haiku" => Tier::Small,

    // Claude 3 models
    "claude-3-opus" => Tier::Big,
    "claude-3-sonnet" => Tier::Big,
    "claude-3-haiku" => Tier::Small,
};

/// Map a Claude model name onto the configured Gemini target.
///
/// Total by design: names starting with `gemini-` pass through untouched,
/// unknown Claude names fall back by tier keyword, and anything else routes
/// to the big tier.
pub fn map_model(claude_model: &str, targets: &ModelTargets) -> String {
    if claude_model.starts_with("gemini-") {
        return claude_model.to_string();
    }

    let normalized = strip_date_suffix(claude_model);

    if let Some(tier) = MODEL_TIERS.get(normalized) {
        return target_for(*tier, targets);
    }

    // Keyword fallback for unlisted Claude names
    let lower = normalized.to_lowercase();
    if lower.contains("haiku") {
        return targets.small_model.clone();
    }
    if lower.contains("sonnet") || lower.contains("opus") {
        return targets.big_model.clone();
    }

    targets.big_model.clone()
}

fn target_for(tier: Tier, targets: &ModelTargets) -> String {
    match tier {
        Tier::Big => targets.big_model.clone(),
        Tier::Small => targets.small_model.clone(),
    }
}

/// Strip date suffix from model names (e.g., "claude-sonnet-4-5-20250929" -> "claude-sonnet-4-5")
fn strip_date_suffix(model: &str) -> &str {
    // Date suffixes are 8 digits at the end: YYYYMMDD
    if model.len() > 9 && model.as_bytes()[model.len() - 9] == b'-' {
        let suffix = &model[model.len() - 8..];
        if suffix.chars().all(|c| c.is_ascii_digit()) {
            return &model[..model.len() - 9];
        }
    }
    model
}
