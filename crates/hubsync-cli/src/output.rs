//! Terminal and JSON rendering of command results.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use console::style;

use hubsync_core::fs::format_size;
use hubsync_core::git::{LfsStatus, RemoteChange};
use hubsync_core::hosted::Repository;
use hubsync_core::types::{FileSurvey, PushOutcome, RepositoryState, SyncReport};

use crate::OutputFormat;

pub struct Printer<W: Write = io::Stdout> {
    writer: W,
}

impl Printer<io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            writer: io::stdout(),
        }
    }
}

impl<W: Write> Printer<W> {
    #[cfg(test)]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn created(&mut self, repo: &Repository) -> Result<()> {
        writeln!(
            self.writer,
            "{} Created {} ({})",
            style("✓").green(),
            style(&repo.full_name).bold(),
            visibility(repo)
        )?;
        writeln!(self.writer, "  {}", repo.html_url)?;
        Ok(())
    }

    pub fn cloned(&mut self, path: &Path) -> Result<()> {
        writeln!(self.writer, "{} Cloned into {}", style("✓").green(), path.display())?;
        Ok(())
    }

    pub fn deleted(&mut self, name: &str) -> Result<()> {
        writeln!(self.writer, "{} Deleted {name}", style("✓").green())?;
        Ok(())
    }

    pub fn report(&mut self, report: &SyncReport, format: OutputFormat) -> Result<()> {
        if format == OutputFormat::Json {
            writeln!(self.writer, "{}", serde_json::to_string_pretty(report)?)?;
            return Ok(());
        }

        let headline = match &report.outcome {
            PushOutcome::Success => format!("{} Pushed {}", style("✓").green(), report.branch),
            PushOutcome::NoOpNoChanges => {
                format!("{} {} is already up to date", style("•").cyan(), report.branch)
            }
            other => format!("{} Push failed: {other}", style("✗").red()),
        };
        writeln!(self.writer, "{headline}")?;

        if report.state == RepositoryState::Uninitialized {
            writeln!(self.writer, "  Initialized a new repository")?;
        }
        match &report.remote {
            RemoteChange::Added => writeln!(self.writer, "  Remote added")?,
            RemoteChange::Retargeted { previous } => {
                writeln!(self.writer, "  Remote retargeted (was {previous})")?
            }
            RemoteChange::Unchanged => {}
        }
        match &report.lfs {
            LfsStatus::Installed { tracked, skipped } => {
                writeln!(
                    self.writer,
                    "  Large file tracking enabled for {} patterns",
                    tracked.len()
                )?;
                if !skipped.is_empty() {
                    writeln!(self.writer, "  Could not track: {}", skipped.join(" "))?;
                }
            }
            LfsStatus::NotAvailable => writeln!(
                self.writer,
                "  {} git-lfs is not installed",
                style("⚠").yellow()
            )?,
            LfsStatus::Skipped => {}
        }
        if report.committed {
            writeln!(self.writer, "  New commit created")?;
        }

        if let Some(survey) = report.survey.as_ref().filter(|s| s.has_large_files()) {
            writeln!(self.writer, "  Large files:")?;
            self.large_files(survey)?;
        }
        let untracked = report.untracked_large_files();
        if !untracked.is_empty() {
            writeln!(
                self.writer,
                "  {} {} large files will be stored as regular blobs and may be rejected",
                style("⚠").yellow(),
                untracked.len()
            )?;
        }

        if let Some(diagnostic) = &report.diagnostic {
            writeln!(self.writer)?;
            for line in diagnostic.lines() {
                writeln!(self.writer, "  {}", style(line).dim())?;
            }
        }
        Ok(())
    }

    pub fn info(
        &mut self,
        repo: &Repository,
        topics: &[String],
        readme: Option<&[u8]>,
        format: OutputFormat,
    ) -> Result<()> {
        if format == OutputFormat::Json {
            let output = serde_json::json!({
                "repository": repo,
                "topics": topics,
                "readme": readme.map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
            });
            writeln!(self.writer, "{}", serde_json::to_string_pretty(&output)?)?;
            return Ok(());
        }

        writeln!(self.writer, "{}", style(&repo.full_name).bold())?;
        if let Some(description) = &repo.description {
            writeln!(self.writer, "  {description}")?;
        }
        writeln!(self.writer, "  Visibility:     {}", visibility(repo))?;
        if let Some(branch) = &repo.default_branch {
            writeln!(self.writer, "  Default branch: {branch}")?;
        }
        if let Some(language) = &repo.language {
            writeln!(self.writer, "  Language:       {language}")?;
        }
        if !topics.is_empty() {
            writeln!(self.writer, "  Topics:         {}", topics.join(", "))?;
        }
        if let Some(updated) = repo.updated_at {
            writeln!(self.writer, "  Updated:        {}", updated.format("%Y-%m-%d %H:%M"))?;
        }
        writeln!(self.writer, "  Clone URL:      {}", repo.clone_url)?;

        if let Some(readme) = readme {
            writeln!(self.writer)?;
            writeln!(self.writer, "{}", String::from_utf8_lossy(readme))?;
        }
        Ok(())
    }

    pub fn list(&mut self, repos: &[Repository], format: OutputFormat) -> Result<()> {
        if format == OutputFormat::Json {
            writeln!(self.writer, "{}", serde_json::to_string_pretty(repos)?)?;
            return Ok(());
        }
        if repos.is_empty() {
            writeln!(self.writer, "No repositories")?;
            return Ok(());
        }

        let width = repos.iter().map(|r| r.name.len()).max().unwrap_or(0);
        for repo in repos {
            let marker = if repo.private { "private" } else { "" };
            let description = repo.description.as_deref().unwrap_or("");
            writeln!(
                self.writer,
                "{:width$}  {:7}  {}",
                repo.name,
                marker,
                style(description).dim()
            )?;
        }
        Ok(())
    }

    pub fn survey(&mut self, survey: &FileSurvey, threshold: u64, format: OutputFormat) -> Result<()> {
        if format == OutputFormat::Json {
            writeln!(self.writer, "{}", serde_json::to_string_pretty(survey)?)?;
            return Ok(());
        }

        writeln!(
            self.writer,
            "Total size: {}",
            format_size(survey.total_size_bytes)
        )?;
        if !survey.has_large_files() {
            writeln!(self.writer, "No files above {}", format_size(threshold))?;
            return Ok(());
        }
        writeln!(
            self.writer,
            "{} files above {}:",
            survey.large_files.len(),
            format_size(threshold)
        )?;
        self.large_files(survey)
    }

    fn large_files(&mut self, survey: &FileSurvey) -> Result<()> {
        for file in &survey.large_files {
            writeln!(
                self.writer,
                "    {:>10}  {}",
                format_size(file.size_bytes),
                file.path.display()
            )?;
        }
        Ok(())
    }
}

fn visibility(repo: &Repository) -> &'static str {
    if repo.private { "private" } else { "public" }
}
