//! Terminal fallback that makes a PNR importable.
//!
//! A record the structured API refuses to import is opened in the terminal,
//! given an open placeholder segment and saved; after that the import request
//! succeeds. Each stage checks the screen it gets back before moving on.

use classify::{ClassifiedError, ErrorKind};
use normalize::CanonicalBooking;
use screen::{contains_segment_line, shows_pnr, PlaceholderSegment};

/// Number of import requests after the record is saved; the last one is kept.
pub const IMPORT_RETRIEVALS: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum ImportStage {
    OpenPnr,
    AddPlaceholderSegment,
    /// Sending `command`, entry `sent` of the configured save sequence.
    ConfirmSave { sent: usize, command: String },
    Reparse,
    RetrieveRecord,
    Done(Vec<CanonicalBooking>),
    Failed(ClassifiedError),
}

impl ImportStage {
    pub fn name(&self) -> &'static str {
        match self {
            ImportStage::OpenPnr => "open_pnr",
            ImportStage::AddPlaceholderSegment => "add_placeholder_segment",
            ImportStage::ConfirmSave { .. } => "confirm_save",
            ImportStage::Reparse => "reparse",
            ImportStage::RetrieveRecord => "retrieve_record",
            ImportStage::Done(_) => "done",
            ImportStage::Failed(_) => "failed",
        }
    }
}

/// Call-local progress of one import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportState {
    pub stage: ImportStage,
    pub pnr: String,
    pub added_segment_line: Option<String>,
    pub retrieval_attempts: u32,
}

/// What the orchestrator must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStep {
    Command(String),
    Retrieve,
    Finished,
}

#[derive(Debug, Clone)]
pub struct ImportMachine {
    state: ImportState,
    segment: PlaceholderSegment,
    save_commands: Vec<String>,
}

impl ImportMachine {
    pub fn new(
        pnr: impl Into<String>,
        segment: PlaceholderSegment,
        save_commands: Vec<String>,
    ) -> Self {
        Self {
            state: ImportState {
                stage: ImportStage::OpenPnr,
                pnr: pnr.into(),
                added_segment_line: None,
                retrieval_attempts: 0,
            },
            segment,
            save_commands,
        }
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    pub fn next_step(&self) -> ImportStep {
        match &self.state.stage {
            ImportStage::OpenPnr | ImportStage::Reparse => {
                ImportStep::Command(format!("*{}", self.state.pnr))
            }
            ImportStage::AddPlaceholderSegment => ImportStep::Command(self.segment.command()),
            ImportStage::ConfirmSave { command, .. } => ImportStep::Command(command.clone()),
            ImportStage::RetrieveRecord => ImportStep::Retrieve,
            ImportStage::Done(_) | ImportStage::Failed(_) => ImportStep::Finished,
        }
    }

    /// Feed back the screen produced by the last [`ImportStep::Command`].
    pub fn on_screen(&mut self, screen: Result<String, ClassifiedError>) {
        let screen = match screen {
            Ok(screen) => screen,
            Err(err) => return self.fail(err),
        };
        let pnr = self.state.pnr.clone();
        let next = match &self.state.stage {
            ImportStage::OpenPnr if shows_pnr(&screen, &pnr) => ImportStage::AddPlaceholderSegment,
            ImportStage::OpenPnr => ImportStage::Failed(ClassifiedError::new(
                ErrorKind::UnableToOpenPnrInTerminal,
                format!("terminal did not display {pnr}"),
            )),
            ImportStage::AddPlaceholderSegment if contains_segment_line(&screen, &self.segment) => {
                self.state.added_segment_line = Some(self.segment.confirmation_line());
                self.after_save(0)
            }
            ImportStage::AddPlaceholderSegment => ImportStage::Failed(ClassifiedError::new(
                ErrorKind::UnableToAddExtraSegment,
                format!("terminal did not confirm segment {}", self.segment.command()),
            )),
            ImportStage::ConfirmSave { sent, .. } => self.after_save(sent + 1),
            ImportStage::Reparse
                if shows_pnr(&screen, &pnr) && contains_segment_line(&screen, &self.segment) =>
            {
                ImportStage::RetrieveRecord
            }
            ImportStage::Reparse => ImportStage::Failed(ClassifiedError::new(
                ErrorKind::UnableToSaveBookingWithExtraSegment,
                format!("{pnr} does not list the placeholder segment after saving"),
            )),
            other => unexpected(other, "a screen"),
        };
        self.state.stage = next;
    }

    /// Feed back the result of an [`ImportStep::Retrieve`].
    pub fn on_record(&mut self, record: Result<Vec<CanonicalBooking>, ClassifiedError>) {
        if self.state.stage != ImportStage::RetrieveRecord {
            self.state.stage = unexpected(&self.state.stage, "a record");
            return;
        }
        self.state.retrieval_attempts += 1;
        match record {
            Err(err) => self.fail(err),
            Ok(bookings) if self.state.retrieval_attempts >= IMPORT_RETRIEVALS => {
                self.state.stage = ImportStage::Done(bookings);
            }
            Ok(_) => {}
        }
    }

    /// Final result; failures are wrapped as [`ErrorKind::UnableToImportPnr`].
    pub fn finish(self) -> Result<Vec<CanonicalBooking>, ClassifiedError> {
        let pnr = self.state.pnr;
        match self.state.stage {
            ImportStage::Done(bookings) => Ok(bookings),
            ImportStage::Failed(cause) => Err(ClassifiedError::wrap(
                ErrorKind::UnableToImportPnr,
                format!("unable to import {pnr}"),
                cause,
            )),
            other => Err(ClassifiedError::wrap(
                ErrorKind::UnableToImportPnr,
                format!("unable to import {pnr}"),
                ClassifiedError::new(
                    ErrorKind::UnhandledError,
                    format!("import stopped in {}", other.name()),
                ),
            )),
        }
    }

    fn after_save(&self, sent: usize) -> ImportStage {
        match self.save_commands.get(sent) {
            Some(command) => ImportStage::ConfirmSave { sent, command: command.clone() },
            None => ImportStage::Reparse,
        }
    }

    fn fail(&mut self, err: ClassifiedError) {
        self.state.stage = ImportStage::Failed(err);
    }
}

fn unexpected(stage: &ImportStage, what: &str) -> ImportStage {
    ImportStage::Failed(ClassifiedError::new(
        ErrorKind::UnhandledError,
        format!("import received {what} while in {}", stage.name()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn machine() -> ImportMachine {
        let segment = PlaceholderSegment::new(NaiveDate::from_ymd_opt(2024, 6, 12).unwrap());
        ImportMachine::new("PNR001", segment, vec!["R:UAPI".into(), "ER".into()])
    }

    fn line() -> String {
        "1. OK OPEN Y  12JUN DOHODM NO1".to_string()
    }

    fn run_screens(machine: &mut ImportMachine, screens: &[String]) -> Vec<String> {
        let mut commands = Vec::new();
        for screen in screens {
            match machine.next_step() {
                ImportStep::Command(command) => commands.push(command),
                step => panic!("unexpected step {step:?}"),
            }
            machine.on_screen(Ok(screen.clone()));
        }
        commands
    }

    #[test]
    fn full_sequence_imports_on_second_retrieval() {
        let mut machine = machine();
        let screens = [
            "PNR001/".to_string(),
            line(),
            "true".to_string(),
            "true".to_string(),
            format!("PNR001/\n{}", line()),
        ];
        let commands = run_screens(&mut machine, &screens);
        assert_eq!(
            commands,
            vec!["*PNR001", "0OKOPENY12JUNDOHODMNO1", "R:UAPI", "ER", "*PNR001"]
        );
        assert_eq!(machine.state().added_segment_line, Some(line()));

        assert_eq!(machine.next_step(), ImportStep::Retrieve);
        machine.on_record(Ok(Vec::new()));
        assert_eq!(machine.next_step(), ImportStep::Retrieve);
        machine.on_record(Ok(Vec::new()));
        assert_eq!(machine.next_step(), ImportStep::Finished);
        assert_eq!(machine.state().retrieval_attempts, 2);
        assert!(machine.finish().is_ok());
    }

    #[test]
    fn wrong_record_on_open() {
        let mut machine = machine();
        run_screens(&mut machine, &["PNR002/".to_string()]);
        let err = machine.finish().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnableToImportPnr);
        assert_eq!(err.cause().map(|c| c.kind), Some(ErrorKind::UnableToOpenPnrInTerminal));
    }

    #[test]
    fn unconfirmed_segment() {
        let mut machine = machine();
        run_screens(&mut machine, &["PNR001/".to_string(), "INVALID CITY".to_string()]);
        let err = machine.finish().unwrap_err();
        assert_eq!(err.cause().map(|c| c.kind), Some(ErrorKind::UnableToAddExtraSegment));
    }

    #[test]
    fn reparse_without_segment_fails() {
        let mut machine = machine();
        let screens = [
            "PNR001/".to_string(),
            line(),
            "true".to_string(),
            "true".to_string(),
            "PNR001/".to_string(),
        ];
        run_screens(&mut machine, &screens);
        let err = machine.finish().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnableToImportPnr);
        assert_eq!(
            err.cause().map(|c| c.kind),
            Some(ErrorKind::UnableToSaveBookingWithExtraSegment)
        );
    }

    #[test]
    fn terminal_error_stops_the_import() {
        let mut machine = machine();
        machine.on_screen(Err(ClassifiedError::new(ErrorKind::TerminalFailure, "gone")));
        assert_eq!(machine.next_step(), ImportStep::Finished);
        let err = machine.finish().unwrap_err();
        assert_eq!(err.root_cause().kind, ErrorKind::TerminalFailure);
    }

    #[test]
    fn failed_retrieval_is_wrapped() {
        let mut machine = machine();
        machine.state.stage = ImportStage::RetrieveRecord;
        machine.on_record(Err(ClassifiedError::new(ErrorKind::NoReservationToImport, "still")));
        let err = machine.finish().unwrap_err();
        assert_eq!(err.cause().map(|c| c.kind), Some(ErrorKind::NoReservationToImport));
    }

    #[test]
    fn save_stages_carry_their_command() {
        let segment = PlaceholderSegment::new(NaiveDate::from_ymd_opt(2024, 6, 12).unwrap());
        let mut machine = ImportMachine::new("PNR001", segment.clone(), vec!["ER".into()]);
        run_screens(&mut machine, &["PNR001/".to_string(), line()]);
        assert_eq!(
            machine.state().stage,
            ImportStage::ConfirmSave { sent: 0, command: "ER".into() }
        );

        let mut machine = ImportMachine::new("PNR001", segment, Vec::new());
        let screens = ["PNR001/".to_string(), line(), format!("PNR001/\n{}", line())];
        let commands = run_screens(&mut machine, &screens);
        assert_eq!(commands, vec!["*PNR001", "0OKOPENY12JUNDOHODMNO1", "*PNR001"]);
        assert_eq!(machine.next_step(), ImportStep::Retrieve);
    }
}
