//! `ugc languages` command implementation.

use std::io::{self, Write};

use clap::Args;
use serde::Serialize;
use ugc_platform::{DEFAULT_LANGUAGE, LANGUAGES};

use crate::error::CliError;

/// Arguments for the languages command.
#[derive(Args)]
pub(crate) struct LanguagesArgs {
    /// Print the table as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct LanguageEntry {
    code: &'static str,
    name: &'static str,
    default: bool,
}

impl LanguagesArgs {
    /// List the language codes accepted by `--language`.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let mut stdout = io::stdout().lock();

        if self.json {
            let entries: Vec<LanguageEntry> = LANGUAGES
                .iter()
                .map(|&(code, name)| LanguageEntry {
                    code,
                    name,
                    default: code == DEFAULT_LANGUAGE,
                })
                .collect();
            serde_json::to_writer_pretty(&mut stdout, &entries)?;
            writeln!(stdout)?;
            return Ok(());
        }

        for (code, name) in LANGUAGES {
            let marker = if *code == DEFAULT_LANGUAGE {
                " (default)"
            } else {
                ""
            };
            writeln!(stdout, "{code:<12}{name}{marker}")?;
        }
        Ok(())
    }
}
