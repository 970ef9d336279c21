use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input};

/// Asks for a line of text. Empty answers are refused.
pub fn prompt(prompt: &str) -> Result<String> {
    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .validate_with(|input: &String| {
            if input.trim().is_empty() {
                Err("Please enter a value")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(answer.trim().to_string())
}
