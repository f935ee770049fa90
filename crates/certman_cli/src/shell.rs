//! Interactive command loop.
//!
//! Every command builds its stores from the shared connection, runs to
//! completion, and reports failures without ending the session.

use crate::render::report_table;
use certman_core::{
    core_version, CertificateDraft, CertificateService, CertmanConfig, FileStore, ReportEngine,
    ServiceError, SqliteCertificateRepository, SystemClock,
};
use log::error;
use rusqlite::Connection;
use std::error::Error;
use std::io::{self, BufRead, Write};

const SECRET_QUESTION_COUNT: usize = 4;

const COMMANDS: &[(&str, &str)] = &[
    ("addcert", "add new certificate today"),
    ("report", "generate this week report"),
    ("delete", "delete certificate by ID or email"),
    ("settings", "show current settings"),
    ("help", "show this help"),
    ("exit", "exit"),
];

pub struct Shell<'a, R: BufRead, W: Write> {
    config: &'a CertmanConfig,
    files: FileStore,
    conn: &'a Connection,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(
        config: &'a CertmanConfig,
        files: FileStore,
        conn: &'a Connection,
        input: R,
        output: W,
    ) -> Self {
        Self {
            config,
            files,
            conn,
            input,
            output,
        }
    }

    /// Runs until `exit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        self.print_banner()?;
        self.print_help()?;

        loop {
            let Some(command) = self.read_command()? else {
                return Ok(());
            };

            let outcome = match command.as_str() {
                "addcert" => self.add_certificates(),
                "report" => self.report(),
                "delete" => self.delete(),
                "settings" => self.print_settings(),
                "help" => {
                    self.print_banner()?;
                    self.print_help()?;
                    Ok(())
                }
                "exit" => return Ok(()),
                other => {
                    writeln!(self.output, "Unknown command `{other}`; type `help`.")?;
                    Ok(())
                }
            };

            if let Err(err) = outcome {
                error!("event=command module=cli status=error command={command} error={err}");
                writeln!(self.output, "\tCommand failed: {err}")?;
            }
        }
    }

    fn add_certificates(&mut self) -> Result<(), Box<dyn Error>> {
        let repo = SqliteCertificateRepository::try_new(self.conn)?;
        let service = CertificateService::new(self.files.clone(), repo, SystemClock, self.config);
        let mut session = service.session();

        loop {
            let Some(draft) = self.read_draft()? else {
                break;
            };

            match session.submit(draft) {
                Ok(_) => {}
                Err(ServiceError::Validation(err)) => {
                    writeln!(self.output, "\tInvalid input ({err}), try again")?;
                    continue;
                }
                Err(err @ ServiceError::Duplicate { .. }) => {
                    writeln!(self.output, "\t{err}")?;
                }
                Err(err) => {
                    writeln!(
                        self.output,
                        "Successfully added {} certificates",
                        session.added()
                    )?;
                    return Err(err.into());
                }
            }

            if self.prompt("Add new one? (y/n): ")?.as_deref() != Some("y") {
                break;
            }
        }

        writeln!(
            self.output,
            "Successfully added {} certificates",
            session.added()
        )?;
        Ok(())
    }

    fn read_draft(&mut self) -> io::Result<Option<CertificateDraft>> {
        let Some(email) = self.prompt("E-mail: ")? else {
            return Ok(None);
        };

        let mut answers = Vec::with_capacity(SECRET_QUESTION_COUNT);
        for index in 1..=SECRET_QUESTION_COUNT {
            let Some(answer) = self.prompt(&format!("Question {index}: "))? else {
                return Ok(None);
            };
            answers.push(answer);
        }

        let Some(enrollment_id) = self.prompt("Enrollment: ")? else {
            return Ok(None);
        };
        let Some(password) = self.prompt("Password: ")? else {
            return Ok(None);
        };

        Ok(Some(
            CertificateDraft::new(email)
                .questions(answers)
                .enrollment_id(enrollment_id)
                .password(password),
        ))
    }

    fn report(&mut self) -> Result<(), Box<dyn Error>> {
        let repo = SqliteCertificateRepository::try_new(self.conn)?;
        let report = ReportEngine::new(&repo, SystemClock).generate_report()?;
        write!(self.output, "{}", report_table(&report))?;
        Ok(())
    }

    fn delete(&mut self) -> Result<(), Box<dyn Error>> {
        let Some(identifier) = self.prompt("Please enter E-mail or ID: ")? else {
            return Ok(());
        };

        let repo = SqliteCertificateRepository::try_new(self.conn)?;
        let service = CertificateService::new(self.files.clone(), repo, SystemClock, self.config);

        let Some(found) = service.find(&identifier)?.into_certificate() else {
            writeln!(self.output, "No certificates with E-mail or ID '{identifier}' found.")?;
            return Ok(());
        };

        let confirm = self.prompt(&format!(
            "Are you sure that you want to delete the certificate for '{}'? (y/n): ",
            found.email
        ))?;
        if confirm.as_deref() != Some("y") {
            return Ok(());
        }

        match service.delete_certificate(&identifier) {
            Ok(deleted) => writeln!(
                self.output,
                "Certificate with e-mail '{}' deleted successfully.",
                deleted.email
            )?,
            Err(err) if err.is_retryable() => writeln!(self.output, "\t{err}")?,
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    fn print_settings(&mut self) -> Result<(), Box<dyn Error>> {
        writeln!(self.output, "{}", self.config)?;
        Ok(())
    }

    fn print_banner(&mut self) -> io::Result<()> {
        writeln!(self.output, "Certificates Manager v.{}", core_version())?;
        writeln!(self.output, "===")
    }

    fn print_help(&mut self) -> io::Result<()> {
        for (name, description) in COMMANDS {
            writeln!(self.output, "{name} - {description}")?;
        }
        Ok(())
    }

    /// Reads a non-empty, lower-cased command; `None` at end of input.
    fn read_command(&mut self) -> io::Result<Option<String>> {
        loop {
            match self.prompt("> ")? {
                None => return Ok(None),
                Some(line) if line.is_empty() => continue,
                Some(line) => return Ok(Some(line.to_ascii_lowercase())),
            }
        }
    }

    /// Prints `label` and reads one trimmed line; `None` at end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
