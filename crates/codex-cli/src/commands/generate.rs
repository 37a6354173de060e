use console::style;
use dialoguer::{Confirm, Editor, Input, Select, theme::ColorfulTheme};
use tracing::info;

use codex_config::{CodexConfig, SinkKind};
use codex_core::{CodexError, Result};
use codex_prd::brief::{self, BriefSource};
use codex_prd::{
    Feedback, NoMatchChoice, OpportunityBrief, PersistenceAdapter, PrdDraft, PrdWorkflow, Relevance,
    ReviewDecision, ReviewLoop, Reviewer, Section,
};

pub(super) struct GenerateOptions {
    pub brief: Option<String>,
    pub text: Option<String>,
    pub sink: Option<SinkKind>,
    pub yes: bool,
    pub date: Option<chrono::NaiveDate>,
}

pub(super) async fn cmd_generate(config: CodexConfig, options: GenerateOptions) -> Result<()> {
    let interactive = !options.yes && console::user_attended();
    let mut reviewer = TerminalReviewer::new(interactive);

    // Phase 1: intake
    let brief = intake(options.brief.as_deref(), options.text, interactive).await?;

    // Phases 2-4: scope, ground, compose
    let workflow = PrdWorkflow::open(&config)?;
    let scope = workflow.identify_scope(brief, &mut reviewer)?;
    print_scope(&scope);

    let date = options
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let grounding = workflow.ground(&scope)?;
    let first = workflow.compose(&scope, &grounding, date)?;

    // Phase 5: review
    let accepted = ReviewLoop::new(first).run(&mut reviewer, || workflow.compose(&scope, &grounding, date))?;

    // Phase 6: delivery
    let sink = options.sink.unwrap_or(config.output.default_sink);
    let adapter = PersistenceAdapter::from_config(&config.output, &config.wiki);
    let report = workflow
        .deliver(&accepted, &scope, &adapter, sink, &mut reviewer)
        .await?;

    if let Some(ref reason) = report.fallback_reason {
        eprintln!(
            "{} {} was unavailable ({reason}); shown on the terminal instead.",
            style("⚠️").yellow(),
            report.requested
        );
    }
    match report.location {
        Some(ref location) => eprintln!("✅ PRD delivered via {}: {location}", report.delivered),
        None => eprintln!("✅ PRD delivered via {}", report.delivered),
    }
    info!(
        requested = %report.requested,
        delivered = %report.delivered,
        rounds = accepted.rounds(),
        "workflow complete"
    );
    Ok(())
}

/// Load the brief from a reference, inline text, or prompts. An unloadable
/// reference falls back to asking for the content directly.
async fn intake(reference: Option<&str>, text: Option<String>, interactive: bool) -> Result<OpportunityBrief> {
    let source = match (reference, text) {
        (Some(r), _) => BriefSource::from_reference(r),
        (None, Some(t)) => BriefSource::Text(t),
        (None, None) if interactive => return prompt_brief(),
        (None, None) => {
            return Err(CodexError::BriefUnloadable {
                origin: "command line".into(),
                reason: "no --brief or --text given and no terminal to prompt on".into(),
            });
        }
    };

    match brief::load(&source).await {
        Ok(b) => Ok(b),
        Err(err @ CodexError::BriefUnloadable { .. }) if interactive => {
            eprintln!("{} {err}", style("⚠️").yellow());
            eprintln!("Enter the brief directly instead.");
            prompt_brief()
        }
        Err(err) => Err(err),
    }
}

fn prompt_closed(e: dialoguer::Error) -> CodexError {
    CodexError::Abandoned(format!("waiting for input ({e})"))
}

fn prompt_brief() -> Result<OpportunityBrief> {
    let theme = ColorfulTheme::default();
    let ask = |prompt: &str, required: bool| -> Result<String> {
        Input::<String>::with_theme(&theme)
            .with_prompt(prompt)
            .allow_empty(!required)
            .interact_text()
            .map_err(prompt_closed)
    };

    let title = ask("Feature name (optional)", false)?;
    let brief = OpportunityBrief {
        title: (!title.trim().is_empty()).then_some(title),
        problem_statement: ask("Problem statement", true)?,
        hypothesis: ask("Hypothesis", false)?,
        roi_projection: ask("ROI projection", false)?,
        target_users: ask("Target users (comma-separated)", false)?,
        strategic_alignment: ask("Strategic alignment", false)?,
        origin: Some("prompt".into()),
    };
    Ok(brief)
}

fn print_scope(scope: &codex_prd::Scope) {
    if scope.matches.is_empty() {
        eprintln!("{}", style("No topics matched; drafting without documentation grounding.").yellow());
        return;
    }
    eprintln!("{}", style("Topics in scope:").bold());
    for m in &scope.matches {
        let label = match m.relevance {
            Relevance::High => style(m.relevance.to_string()).green(),
            Relevance::Medium => style(m.relevance.to_string()).cyan(),
            Relevance::Related => style(m.relevance.to_string()).dim(),
        };
        let via = m.via.as_deref().map(|v| format!(" via {v}")).unwrap_or_default();
        eprintln!("  {:<28} {:<8}{via}", m.topic, label);
    }
    eprintln!();
}

/// Prompts a person at the terminal. Non-interactive sessions accept the
/// first draft, stop on no match, and print the PRD when a write fails.
struct TerminalReviewer {
    interactive: bool,
    theme: ColorfulTheme,
}

impl TerminalReviewer {
    fn new(interactive: bool) -> Self {
        Self {
            interactive,
            theme: ColorfulTheme::default(),
        }
    }

    fn feedback(&self, draft: &PrdDraft) -> Result<Vec<Feedback>> {
        let titles: Vec<&str> = Section::ALL.iter().map(|s| s.title()).collect();
        let mut out = Vec::new();
        loop {
            let idx = Select::with_theme(&self.theme)
                .with_prompt("Which section?")
                .items(&titles)
                .default(0)
                .interact()
                .map_err(prompt_closed)?;
            let section = Section::ALL[idx];

            let mode = Select::with_theme(&self.theme)
                .with_prompt(format!("{section}"))
                .items(["Append a note", "Rewrite in $EDITOR"])
                .default(0)
                .interact()
                .map_err(prompt_closed)?;

            let fb = if mode == 0 {
                let text: String = Input::with_theme(&self.theme)
                    .with_prompt("Text to append")
                    .interact_text()
                    .map_err(prompt_closed)?;
                Feedback::append(section, text)
            } else {
                let current = draft.rendered_section(section);
                match Editor::new().extension(".md").edit(current).map_err(prompt_closed)? {
                    Some(text) => Feedback::replace(section, text.trim_end()),
                    None => {
                        eprintln!("Editor closed without saving; {section} unchanged.");
                        continue;
                    }
                }
            };
            out.push(fb);

            let more = Confirm::with_theme(&self.theme)
                .with_prompt("Change another section?")
                .default(false)
                .interact()
                .map_err(prompt_closed)?;
            if !more {
                return Ok(out);
            }
        }
    }
}

impl Reviewer for TerminalReviewer {
    fn review(&mut self, draft: &PrdDraft, round: u32) -> Result<ReviewDecision> {
        if !self.interactive {
            return Ok(ReviewDecision::Accept);
        }
        println!("{}", draft.render());
        eprintln!("{}", style(format!("── Review round {round} ──")).bold());

        let choice = Select::with_theme(&self.theme)
            .with_prompt("Accept this draft?")
            .items(["Accept", "Revise sections", "Abandon"])
            .default(0)
            .interact()
            .map_err(prompt_closed)?;
        match choice {
            0 => Ok(ReviewDecision::Accept),
            1 => Ok(ReviewDecision::Revise(self.feedback(draft)?)),
            _ => Ok(ReviewDecision::Abandon),
        }
    }

    fn on_no_match(&mut self, brief: &OpportunityBrief) -> Result<NoMatchChoice> {
        eprintln!(
            "{} No codex topic matched this brief.",
            style("⚠️").yellow()
        );
        if !self.interactive {
            return Ok(NoMatchChoice::Abort);
        }
        let choice = Select::with_theme(&self.theme)
            .with_prompt("How to continue?")
            .items([
                "Add detail to the problem statement",
                "Draft without documentation grounding",
                "Stop",
            ])
            .default(0)
            .interact()
            .map_err(prompt_closed)?;
        match choice {
            0 => {
                let problem: String = Input::with_theme(&self.theme)
                    .with_prompt("Problem statement")
                    .with_initial_text(brief.problem_statement.clone())
                    .interact_text()
                    .map_err(prompt_closed)?;
                Ok(NoMatchChoice::Refine(OpportunityBrief {
                    problem_statement: problem,
                    ..brief.clone()
                }))
            }
            1 => Ok(NoMatchChoice::Proceed),
            _ => Ok(NoMatchChoice::Abort),
        }
    }

    fn choose_sink(&mut self, failed: SinkKind, error: &CodexError) -> Result<Option<SinkKind>> {
        eprintln!("{} {error}", style("❌").red());
        if !self.interactive {
            return Ok((failed != SinkKind::Display).then_some(SinkKind::Display));
        }
        let options: Vec<SinkKind> = SinkKind::ALL.into_iter().filter(|k| *k != failed).collect();
        let mut items: Vec<String> = options.iter().map(|k| k.to_string()).collect();
        items.push("Cancel".into());
        let idx = Select::with_theme(&self.theme)
            .with_prompt(format!("{failed} failed. Deliver somewhere else?"))
            .items(&items)
            .default(0)
            .interact()
            .map_err(prompt_closed)?;
        Ok(options.get(idx).copied())
    }
}
