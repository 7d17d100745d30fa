//! Confirmer - entkoppelte Ja/Nein-Abfrage
//!
//! Die Bootstrap-Bestätigung läuft über dieses Trait, damit die
//! Retry-Policy unabhängig von der Eingabequelle testbar ist.

use std::io::{BufRead, Write};

use crate::UpdateRunnerError;

/// Antwort auf eine Bestätigungsabfrage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
    /// Alles außer exakt "Y" oder "N"
    Invalid,
}

/// Trait für eine einzelne Ja/Nein-Abfrage.
pub trait Confirmer {
    fn ask(&mut self) -> Result<Confirmation, UpdateRunnerError>;
}

/// Echte Abfrage über stdin/stdout.
///
/// Akzeptiert exakt "Y" und "N", case-sensitive.
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn ask(&mut self) -> Result<Confirmation, UpdateRunnerError> {
        print!("Do you want to continue the operation this time? (Y/N) ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;

        Ok(parse_answer(&line))
    }
}

fn parse_answer(line: &str) -> Confirmation {
    match line.trim_end_matches(['\r', '\n']) {
        "Y" => Confirmation::Yes,
        "N" => Confirmation::No,
        _ => Confirmation::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_answers() {
        assert_eq!(parse_answer("Y\n"), Confirmation::Yes);
        assert_eq!(parse_answer("N\r\n"), Confirmation::No);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(parse_answer("y\n"), Confirmation::Invalid);
        assert_eq!(parse_answer("n\n"), Confirmation::Invalid);
        assert_eq!(parse_answer("yes\n"), Confirmation::Invalid);
        assert_eq!(parse_answer("\n"), Confirmation::Invalid);
    }

    #[test]
    fn test_parse_does_not_trim_inner_whitespace() {
        assert_eq!(parse_answer(" Y\n"), Confirmation::Invalid);
    }
}
