use lazy_static::lazy_static;
use regex::Regex;

use super::dto::{ExistingRecipe, SuggestedRecipe};

pub const SYSTEM_PROMPT: &str = r#"You are a helpful culinary assistant that suggests recipes. You provide recipe suggestions in a structured JSON format.

When suggesting recipes, be creative and diverse. Consider different cuisines, difficulty levels, and ingredients.

IMPORTANT: You must respond with ONLY a valid JSON object in this exact format, no other text:
{
  "recipes": [
    {
      "name": "Recipe Name",
      "description": "A brief description of the recipe (1-2 sentences)",
      "imagePrompt": "A short English phrase describing the dish for image generation (e.g., 'creamy mushroom risotto with parmesan')"
    }
  ]
}

Generate 3-8 recipe suggestions based on the user's request. Make sure not to suggest recipes that already exist in their collection (if any are provided)."#;

pub fn build_user_prompt(existing: &[ExistingRecipe], prompt: &str) -> String {
    let context = if existing.is_empty() {
        String::new()
    } else {
        let list = existing
            .iter()
            .enumerate()
            .map(|(i, r)| match r.description.as_deref() {
                Some(d) => format!("{}. {} - {}", i + 1, r.name, d),
                None => format!("{}. {}", i + 1, r.name),
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("Here are the recipes I already have in my collection:\n{list}\n\n")
    };
    format!(
        "{context}{prompt}\n\nPlease suggest some recipes based on my request above. \
         Remember to respond with ONLY the JSON object."
    )
}

/// Tolerant parse of the model output: strips a markdown code fence when
/// present, then reads the `recipes` array. A malformed reply yields an
/// empty list and the parse_error flag, never an error.
pub fn parse_suggestions(raw: &str) -> (Vec<SuggestedRecipe>, bool) {
    lazy_static! {
        static ref FENCE_RE: Regex = Regex::new(r"```(?:json)?\s*([\s\S]*?)```").unwrap();
    }
    let json_str = FENCE_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(raw);

    let Ok(value) = serde_json::from_str::<serde_json::Value>(json_str) else {
        return (Vec::new(), true);
    };
    let Some(items) = value.get("recipes").and_then(|r| r.as_array()) else {
        return (Vec::new(), true);
    };

    let recipes = items
        .iter()
        .map(|r| SuggestedRecipe {
            name: r
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            description: r
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            image_prompt: r
                .get("imagePrompt")
                .and_then(|v| v.as_str())
                .map(String::from),
        })
        .collect();
    (recipes, false)
}

/// Cost in USD given per-1M-token prices.
pub fn estimated_cost(
    prompt_tokens: i64,
    completion_tokens: i64,
    input_price: f64,
    output_price: f64,
) -> f64 {
    (prompt_tokens as f64 * input_price + completion_tokens as f64 * output_price) / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let raw = r#"{"recipes":[{"name":"Pad Thai","description":"Stir-fried noodles.","imagePrompt":"pad thai with lime"}]}"#;
        let (recipes, parse_error) = parse_suggestions(raw);
        assert!(!parse_error);
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "Pad Thai");
        assert_eq!(recipes[0].image_prompt.as_deref(), Some("pad thai with lime"));
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "Sure!\n```json\n{\"recipes\":[{\"name\":\"Laksa\",\"description\":\"Spicy noodle soup.\"}]}\n```";
        let (recipes, parse_error) = parse_suggestions(raw);
        assert!(!parse_error);
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "Laksa");
        assert!(recipes[0].image_prompt.is_none());
    }

    #[test]
    fn malformed_reply_sets_flag_without_failing() {
        let (recipes, parse_error) = parse_suggestions("I cannot answer in JSON, sorry.");
        assert!(parse_error);
        assert!(recipes.is_empty());

        let (recipes, parse_error) = parse_suggestions(r#"{"noodles": []}"#);
        assert!(parse_error);
        assert!(recipes.is_empty());
    }

    #[test]
    fn user_prompt_lists_existing_recipes() {
        let existing = vec![
            ExistingRecipe {
                name: "Carbonara".into(),
                description: Some("Roman pasta".into()),
            },
            ExistingRecipe {
                name: "Dal".into(),
                description: None,
            },
        ];
        let p = build_user_prompt(&existing, "something vegetarian");
        assert!(p.contains("1. Carbonara - Roman pasta"));
        assert!(p.contains("2. Dal"));
        assert!(p.contains("something vegetarian"));
    }

    #[test]
    fn user_prompt_without_context() {
        let p = build_user_prompt(&[], "weeknight dinners");
        assert!(p.starts_with("weeknight dinners"));
    }

    #[test]
    fn cost_uses_per_million_prices() {
        // 1M prompt tokens at $2/1M plus 0.5M completion at $4/1M.
        let cost = estimated_cost(1_000_000, 500_000, 2.0, 4.0);
        assert!((cost - 4.0).abs() < 1e-9);
        assert_eq!(estimated_cost(1000, 1000, 0.0, 0.0), 0.0);
    }
}
