//! Plain-text cooking recipes.
//!
//! One directive per line, `#` starts a comment:
//!
//! ```text
//! # yogurt
//! kp 0.4
//! target 42
//! hold 480
//! finish
//! ```
//!
//! Directives compile to command records with append addressing, in order.

use jar_proto::records::{CommandRecord, SLOT_APPEND};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RecipeError {
    #[error("line {0}: unknown directive '{1}'")]
    UnknownDirective(usize, String),

    #[error("line {0}: '{1}' requires an argument")]
    MissingArgument(usize, &'static str),

    #[error("line {0}: invalid value for '{1}': {2}")]
    InvalidValue(usize, &'static str, String),

    #[error("recipe does not fit the 32-slot program array")]
    TooManySteps,
}

/// Compiles recipe text into the command records to upload.
pub fn compile(text: &str) -> Result<Vec<CommandRecord>, RecipeError> {
    let mut records = Vec::new();
    for (n, raw_line) in text.lines().enumerate() {
        let line_no = n + 1;
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut words = line.split_whitespace();
        let directive = words.next().unwrap_or("");
        let argument = words.next();

        let record = match directive {
            "target" => {
                let celsius: u8 = parse(line_no, "target", argument)?;
                CommandRecord::target_temperature(celsius, SLOT_APPEND)
            }
            "hold" => {
                let minutes: u16 = parse(line_no, "hold", argument)?;
                CommandRecord::hold(minutes, SLOT_APPEND)
            }
            "kp" => CommandRecord::set_kp(parse(line_no, "kp", argument)?, SLOT_APPEND),
            "ti" => CommandRecord::set_ti(parse(line_no, "ti", argument)?, SLOT_APPEND),
            "td" => CommandRecord::set_td(parse(line_no, "td", argument)?, SLOT_APPEND),
            "phase" => {
                CommandRecord::set_phase_delay(parse(line_no, "phase", argument)?, SLOT_APPEND)
            }
            "finish" => CommandRecord::finish(SLOT_APPEND),
            other => {
                return Err(RecipeError::UnknownDirective(line_no, other.to_string()));
            }
        };
        records.push(record);
    }
    if records.len() > jar_proto::records::PROGRAM_CAPACITY {
        return Err(RecipeError::TooManySteps);
    }
    Ok(records)
}

fn parse<T: std::str::FromStr>(
    line_no: usize,
    directive: &'static str,
    argument: Option<&str>,
) -> Result<T, RecipeError> {
    let raw = argument.ok_or(RecipeError::MissingArgument(line_no, directive))?;
    raw.parse()
        .map_err(|_| RecipeError::InvalidValue(line_no, directive, raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jar_proto::records::Opcode;

    #[test]
    fn a_full_recipe_compiles_in_order() {
        let text = "\
# yogurt
kp 0.4
target 42   # culture temperature
hold 480
finish
";
        let records = compile(text).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].opcode(), Some(Opcode::SetKp));
        assert_eq!(records[0].param_f32(0), 0.4);
        assert_eq!(records[1].opcode(), Some(Opcode::TargetTemperature));
        assert_eq!(records[1].params[0], 42);
        assert_eq!(records[2].opcode(), Some(Opcode::Hold));
        assert_eq!(records[2].param_u16(0), 480);
        assert_eq!(records[3].opcode(), Some(Opcode::Finish));
        assert!(records.iter().all(|r| r.index == SLOT_APPEND));
    }

    #[test]
    fn errors_carry_line_numbers() {
        assert_eq!(
            compile("target 42\nsimmer 3\n"),
            Err(RecipeError::UnknownDirective(2, "simmer".to_string()))
        );
        assert_eq!(
            compile("hold\n"),
            Err(RecipeError::MissingArgument(1, "hold"))
        );
        assert_eq!(
            compile("target warm\n"),
            Err(RecipeError::InvalidValue(1, "target", "warm".to_string()))
        );
    }

    #[test]
    fn oversized_recipes_are_rejected() {
        let text = "target 40\n".repeat(33);
        assert_eq!(compile(&text), Err(RecipeError::TooManySteps));
    }
}
