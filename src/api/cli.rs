use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::config::AppConfig;
use crate::error::{CheckerError, ExportError};
use crate::export::{render_breakdown, render_clean_table, render_spam_table, save_clean_bag, save_spam_bag};
use crate::pipeline::{BagChecker, BagReport};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Checker(#[from] CheckerError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error("Console I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser)]
#[command(name = "bag-checker")]
#[command(about = "Split a wallet's NFTs into a clean bag with floor prices and a spam bag")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Check one wallet and print both bags
    Check {
        /// Wallet address (with or without 0x) or ENS name
        address: String,
        /// Save the clean bag under this file name
        #[arg(long)]
        clean_csv: Option<String>,
        /// Save the spam bag under this file name
        #[arg(long)]
        spam_csv: Option<String>,
    },
    /// Prompt for wallets one after another (the default)
    Interactive,
    /// Print a sample configuration file
    Config,
}

pub struct CliHandler {
    checker: BagChecker,
    export_dir: PathBuf,
}

impl CliHandler {
    pub fn new(checker: BagChecker, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            checker,
            export_dir: export_dir.into(),
        }
    }

    /// Run a command against the process's stdin and stdout
    pub async fn execute_command(&self, command: &Commands) -> Result<(), CliError> {
        let stdout = io::stdout();
        match command {
            Commands::Check { address, clean_csv, spam_csv } => {
                self.check_address(address, clean_csv.as_deref(), spam_csv.as_deref(), &mut stdout.lock())
                    .await
            }
            Commands::Interactive => {
                let stdin = io::stdin();
                self.run_interactive(stdin.lock(), stdout.lock()).await
            }
            Commands::Config => print_sample_config(&mut stdout.lock()),
        }
    }

    /// Check one wallet without prompting; CSV files are written only when named
    pub async fn check_address<W: Write>(
        &self,
        address: &str,
        clean_csv: Option<&str>,
        spam_csv: Option<&str>,
        out: &mut W,
    ) -> Result<(), CliError> {
        writeln!(out, "Downloading your data...")?;
        let report = self.checker.check(address).await?;
        self.print_report(&report, out).await?;

        if let Some(title) = clean_csv {
            let path = save_clean_bag(&self.export_dir, title, &report.clean)?;
            writeln!(out, "{} has been saved!", path.display())?;
        }
        if let Some(title) = spam_csv {
            let path = save_spam_bag(&self.export_dir, title, &report.spam)?;
            writeln!(out, "{} has been saved!", path.display())?;
        }
        Ok(())
    }

    /// Prompt loop: ask for a wallet, show its bags, offer CSV copies,
    /// then offer another wallet. Ends on "no" or end of input.
    pub async fn run_interactive<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<(), CliError> {
        let mut console = Console { input, output };
        print_banner(&mut console.output)?;

        loop {
            writeln!(console.output)?;
            let address = match console.prompt("Please enter your ENS name or wallet address: ")? {
                Some(answer) => answer.to_lowercase(),
                None => return Ok(()),
            };
            writeln!(console.output, "You entered: {}", address)?;

            writeln!(console.output, "Downloading your data...")?;
            let report = match self.checker.check(&address).await {
                Ok(report) => report,
                Err(CheckerError::Validation(e)) => {
                    writeln!(console.output, "{}. Try again.", e)?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            writeln!(console.output, "Cleanse complete!")?;

            self.print_report(&report, &mut console.output).await?;
            self.offer_downloads(&report, &mut console)?;

            if !console.confirm("Check another wallet? [Y/N] ")? {
                writeln!(console.output, "See ya!")?;
                return Ok(());
            }
        }
    }

    async fn print_report<W: Write>(&self, report: &BagReport, out: &mut W) -> Result<(), CliError> {
        let summary = &report.summary;

        writeln!(out)?;
        writeln!(out, "##############################################")?;
        writeln!(out, "#        Quick stats on your NFT bag!        #")?;
        writeln!(out, "##############################################")?;
        writeln!(out)?;
        writeln!(out, "Your Ethereum address is: {}", report.address)?;
        if let Some(image) = self.checker.name_image_url(report).await {
            writeln!(out, "Your name's image: {}", image)?;
        }
        writeln!(out, "You own {} non-SPAM NFT(s)", summary.clean_count)?;
        writeln!(out, "You own {} SPAM NFT(s)", summary.spam_count)?;
        writeln!(out, "Token types among your non-SPAM NFTs:")?;
        write!(out, "{}", render_breakdown(&summary.clean_token_types))?;
        writeln!(out, "Token types among your SPAM NFTs:")?;
        write!(out, "{}", render_breakdown(&summary.spam_token_types))?;

        for failure in &report.fetch_failures {
            writeln!(
                out,
                "Warning: the {} query stopped after {} page(s) ({}). The address likely has no holdings, verify manually.",
                failure.query, failure.pages_collected, failure.message
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Clean non-SPAM bag:")?;
        write!(out, "{}", render_clean_table(&report.clean))?;
        writeln!(out)?;
        writeln!(out, "SPAM bag:")?;
        write!(out, "{}", render_spam_table(&report.spam))?;
        Ok(())
    }

    fn offer_downloads<R: BufRead, W: Write>(
        &self,
        report: &BagReport,
        console: &mut Console<R, W>,
    ) -> Result<(), CliError> {
        writeln!(console.output)?;
        if !console.confirm("Would you like a CSV download of your data? [Y/N] ")? {
            return Ok(());
        }

        writeln!(console.output, "Your clean bag:")?;
        if let Some(title) = console.ask_file_name()? {
            let path = save_clean_bag(&self.export_dir, &title, &report.clean)?;
            writeln!(console.output, "{} has been downloaded!", path.display())?;
        }

        writeln!(console.output, "Your dirty bag:")?;
        if let Some(title) = console.ask_file_name()? {
            let path = save_spam_bag(&self.export_dir, &title, &report.spam)?;
            writeln!(console.output, "{} has been downloaded!", path.display())?;
        }
        Ok(())
    }
}

struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// `None` at end of input
    fn prompt(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Re-prompts until the answer is yes or no; end of input counts as no
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        loop {
            let Some(answer) = self.prompt(question)? else {
                return Ok(false);
            };
            match answer.to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Invalid option. Try again.")?,
            }
        }
    }

    fn ask_file_name(&mut self) -> io::Result<Option<String>> {
        if !self.confirm("Enter [Y/N] to proceed: ")? {
            writeln!(self.output, "You chose not to save.")?;
            return Ok(None);
        }

        loop {
            match self.prompt("What would you like to name the file? ")? {
                None => return Ok(None),
                Some(title) if title.is_empty() => writeln!(self.output, "The file needs a name.")?,
                Some(title) => return Ok(Some(title.to_lowercase())),
            }
        }
    }
}

pub fn print_sample_config<W: Write>(out: &mut W) -> Result<(), CliError> {
    let sample = AppConfig::generate_sample_config().map_err(CheckerError::from)?;
    write!(out, "{}", sample)?;
    Ok(())
}

fn print_banner<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "##############################################")?;
    writeln!(out, "#           CHECK YOUR NFT BAG               #")?;
    writeln!(out, "##############################################")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use std::io::Cursor;

    fn handler() -> CliHandler {
        let config = ProviderConfig {
            api_key: Some("test-key".to_string()),
            ..ProviderConfig::default()
        };
        CliHandler::new(BagChecker::from_config(&config).unwrap(), ".")
    }

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console {
            input: Cursor::new(input.as_bytes().to_vec()),
            output: Vec::new(),
        }
    }

    #[test]
    fn test_parse_check_command() {
        let cli = Cli::try_parse_from(["bag-checker", "check", "vitalik.eth", "--clean-csv", "clean"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Check {
                address: "vitalik.eth".to_string(),
                clean_csv: Some("clean".to_string()),
                spam_csv: None,
            })
        );

        let bare = Cli::try_parse_from(["bag-checker"]).unwrap();
        assert!(bare.command.is_none());
    }

    #[test]
    fn test_confirm_reprompts_on_invalid_answer() {
        let mut console = console("maybe\nYES\n");
        assert!(console.confirm("? ").unwrap());

        let output = String::from_utf8(console.output).unwrap();
        assert_eq!(output.matches("Invalid option. Try again.").count(), 1);
    }

    #[test]
    fn test_confirm_end_of_input_is_no() {
        assert!(!console("").confirm("? ").unwrap());
        assert!(!console("n\n").confirm("? ").unwrap());
    }

    #[test]
    fn test_file_name_is_lowercased() {
        let mut console = console("y\n\nMy_Bag\n");
        assert_eq!(console.ask_file_name().unwrap(), Some("my_bag".to_string()));
        assert!(String::from_utf8(console.output).unwrap().contains("The file needs a name."));
    }

    #[tokio::test]
    async fn test_interactive_reprompts_on_invalid_address() {
        let mut output = Vec::new();
        handler()
            .run_interactive(Cursor::new(b"not-an-address\n".to_vec()), &mut output)
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("CHECK YOUR NFT BAG"));
        assert!(output.contains("Invalid address or ENS name: not-an-address. Try again."));
        assert_eq!(output.matches("Please enter your ENS name").count(), 2);
    }

    #[test]
    fn test_sample_config() {
        let mut output = Vec::new();
        print_sample_config(&mut output).unwrap();
        assert!(String::from_utf8(output).unwrap().contains("[provider]"));
    }
}
