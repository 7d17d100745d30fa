//! Bootstrap Guard - Auflösung des "kein Membership-Record"-Zustands
//!
//! Fehlt der persistierte Record, ist "echter erster Lauf" nicht von
//! "Record wurde zurückgesetzt, Maschinen entsprechen noch einer älteren
//! Konfiguration" unterscheidbar. Der Guard warnt, holt eine begrenzte
//! interaktive Bestätigung ein und bricht sonst ohne Side Effects ab.

use crate::confirm::{Confirmation, Confirmer};
use crate::ui::UpdateUI;
use crate::UpdateRunnerError;

/// Maximale Anzahl an Bestätigungsversuchen.
pub const MAX_CONFIRM_ATTEMPTS: u32 = 3;

/// Ergebnis der Bootstrap-Auflösung.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapDecision {
    /// Operator hat bestätigt: die deklarierte Membership gilt für diesen
    /// Lauf als persistierte Baseline (Remove-Menge leer)
    Proceed,
    /// Operator hat mit "N" abgelehnt: Lauf endet normal, ohne Side Effects
    Declined,
}

/// Warnt und holt die Bestätigung ein.
///
/// Exakt "Y" bestätigt, exakt "N" lehnt ab, jede andere Eingabe verbraucht
/// einen Versuch. Die dritte Nicht-"Y"-Antwort beendet den Lauf mit
/// `ConfirmationExhausted`.
pub fn resolve_bootstrap<F, U>(
    confirmer: &mut F,
    ui: &mut U,
) -> Result<BootstrapDecision, UpdateRunnerError>
where
    F: Confirmer + ?Sized,
    U: UpdateUI,
{
    ui.on_bootstrap_warning();

    for _ in 0..MAX_CONFIRM_ATTEMPTS {
        match confirmer.ask()? {
            Confirmation::Yes => return Ok(BootstrapDecision::Proceed),
            Confirmation::No => return Ok(BootstrapDecision::Declined),
            Confirmation::Invalid => ui.on_invalid_confirmation(),
        }
    }

    ui.on_confirmation_exhausted();
    Err(UpdateRunnerError::ConfirmationExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockUI, ScriptedConfirmer};

    #[test]
    fn test_yes_on_first_attempt_proceeds() {
        let mut confirmer = ScriptedConfirmer::new(vec![Confirmation::Yes]);
        let mut ui = MockUI::new();

        let decision = resolve_bootstrap(&mut confirmer, &mut ui).unwrap();

        assert_eq!(decision, BootstrapDecision::Proceed);
        assert!(ui.events.contains(&"bootstrap_warning".to_string()));
    }

    #[test]
    fn test_no_declines() {
        let mut confirmer = ScriptedConfirmer::new(vec![Confirmation::No]);
        let mut ui = MockUI::new();

        let decision = resolve_bootstrap(&mut confirmer, &mut ui).unwrap();

        assert_eq!(decision, BootstrapDecision::Declined);
    }

    #[test]
    fn test_yes_on_last_attempt_proceeds() {
        let mut confirmer = ScriptedConfirmer::new(vec![
            Confirmation::Invalid,
            Confirmation::Invalid,
            Confirmation::Yes,
        ]);
        let mut ui = MockUI::new();

        let decision = resolve_bootstrap(&mut confirmer, &mut ui).unwrap();

        assert_eq!(decision, BootstrapDecision::Proceed);
        assert_eq!(
            ui.events.iter().filter(|e| *e == "invalid_confirmation").count(),
            2
        );
    }

    #[test]
    fn test_three_invalid_answers_exhaust() {
        let mut confirmer = ScriptedConfirmer::new(vec![
            Confirmation::Invalid,
            Confirmation::Invalid,
            Confirmation::Invalid,
        ]);
        let mut ui = MockUI::new();

        let result = resolve_bootstrap(&mut confirmer, &mut ui);

        assert!(matches!(result, Err(UpdateRunnerError::ConfirmationExhausted)));
        assert!(ui.events.contains(&"confirmation_exhausted".to_string()));
    }

    #[test]
    fn test_no_fourth_attempt_is_made() {
        let mut confirmer = ScriptedConfirmer::new(vec![
            Confirmation::Invalid,
            Confirmation::Invalid,
            Confirmation::Invalid,
            Confirmation::Yes,
        ]);
        let mut ui = MockUI::new();

        let result = resolve_bootstrap(&mut confirmer, &mut ui);

        assert!(result.is_err());
        assert_eq!(confirmer.asked(), 3);
    }
}
