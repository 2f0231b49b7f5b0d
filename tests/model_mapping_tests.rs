// Model mapping tests

use claude2gemini::models::mapping::{map_model, ModelTargets};

#[test]
fn test_defaults_route_known_claude_models() {
    let targets = ModelTargets::default();

    assert_eq!(map_model("claude-opus-4-5", &targets), "gemini-2.5-pro");
    assert_eq!(map_model("claude-sonnet-4-5", &targets), "gemini-2.5-pro");
    assert_eq!(map_model("claude-haiku-4-5", &targets), "gemini-2.5-flash");
    assert_eq!(map_model("claude-3-5-haiku", &targets), "gemini-2.5-flash");
}

#[test]
fn test_dated_model_names() {
    let targets = ModelTargets::default();
    assert_eq!(
        map_model("claude-3-5-sonnet-20241022", &targets),
        "gemini-2.5-pro"
    );
    assert_eq!(
        map_model("claude-3-5-haiku-20241022", &targets),
        "gemini-2.5-flash"
    );
}

#[test]
fn test_gemini_names_pass_through() {
    let targets = ModelTargets::default();
    assert_eq!(
        map_model("gemini-2.5-flash-lite", &targets),
        "gemini-2.5-flash-lite"
    );
}

#[test]
fn test_mapping_is_total() {
    let targets = ModelTargets::default();
    // anything unrecognized still resolves to a backend model
    for name in ["", "gpt-4", "claude", "some-random-model"] {
        let mapped = map_model(name, &targets);
        assert!(mapped.starts_with("gemini-"), "{} -> {}", name, mapped);
    }
}
