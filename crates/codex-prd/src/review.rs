use serde::Serialize;
use tracing::info;

use codex_config::SinkKind;
use codex_core::{CodexError, Result};

use crate::brief::OpportunityBrief;
use crate::draft::{Feedback, PrdDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReviewState {
    Drafted,
    UnderReview { round: u32 },
    Accepted,
}

/// A reviewer's answer to one draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Accept,
    Revise(Vec<Feedback>),
    Abandon,
}

/// What to do when no topic matched the brief.
#[derive(Debug, Clone, PartialEq)]
pub enum NoMatchChoice {
    /// Draft anyway, with no documentation grounding.
    Proceed,
    /// Try again with a more detailed brief.
    Refine(OpportunityBrief),
    Abort,
}

/// The human side of the workflow. The CLI prompts a person; tests script
/// the answers.
pub trait Reviewer {
    fn review(&mut self, draft: &PrdDraft, round: u32) -> Result<ReviewDecision>;

    fn on_no_match(&mut self, _brief: &OpportunityBrief) -> Result<NoMatchChoice> {
        Ok(NoMatchChoice::Abort)
    }

    /// Pick another sink after `failed` could not deliver. `None` stops.
    ///
    /// Unless overridden the draft goes to the display, so an accepted PRD
    /// is always shown somewhere.
    fn choose_sink(&mut self, failed: SinkKind, _error: &CodexError) -> Result<Option<SinkKind>> {
        Ok((failed != SinkKind::Display).then_some(SinkKind::Display))
    }
}

/// A draft the reviewer explicitly accepted. Only the review loop creates these,
/// so persistence never sees an unreviewed draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedPrd {
    draft: PrdDraft,
    rounds: u32,
}

impl AcceptedPrd {
    pub fn draft(&self) -> &PrdDraft {
        &self.draft
    }

    /// Feedback rounds before acceptance.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn render(&self) -> String {
        self.draft.render()
    }

    #[cfg(test)]
    pub(crate) fn for_tests(draft: PrdDraft) -> Self {
        Self { draft, rounds: 0 }
    }
}

/// `Drafted → UnderReview (→ UnderReview)* → Accepted`.
///
/// Every feedback round recomposes from scratch and re-applies all feedback
/// given so far, in order. There is no round limit.
#[derive(Debug)]
pub struct ReviewLoop {
    state: ReviewState,
    draft: PrdDraft,
    overrides: Vec<Feedback>,
}

impl ReviewLoop {
    pub fn new(draft: PrdDraft) -> Self {
        Self {
            state: ReviewState::Drafted,
            draft,
            overrides: Vec::new(),
        }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn draft(&self) -> &PrdDraft {
        &self.draft
    }

    /// Feedback accumulated so far.
    pub fn overrides(&self) -> &[Feedback] {
        &self.overrides
    }

    /// Drive the loop until the reviewer accepts or abandons.
    pub fn run<R, F>(mut self, reviewer: &mut R, mut recompose: F) -> Result<AcceptedPrd>
    where
        R: Reviewer + ?Sized,
        F: FnMut() -> Result<PrdDraft>,
    {
        let mut round = 1;
        loop {
            self.state = ReviewState::UnderReview { round };
            match reviewer.review(&self.draft, round)? {
                ReviewDecision::Accept => {
                    self.state = ReviewState::Accepted;
                    info!(rounds = round - 1, "draft accepted");
                    return Ok(AcceptedPrd {
                        draft: self.draft,
                        rounds: round - 1,
                    });
                }
                ReviewDecision::Revise(feedback) => {
                    info!(round, changes = feedback.len(), "recomposing with feedback");
                    self.overrides.extend(feedback);
                    let mut draft = recompose()?;
                    for fb in &self.overrides {
                        draft.apply(fb);
                    }
                    self.draft = draft;
                    round += 1;
                }
                ReviewDecision::Abandon => {
                    info!(round, "review abandoned");
                    return Err(CodexError::Abandoned(format!("reviewing draft (round {round})")));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::Section;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<ReviewDecision>, Vec<String>);

    impl Reviewer for Scripted {
        fn review(&mut self, draft: &PrdDraft, _round: u32) -> Result<ReviewDecision> {
            self.1.push(draft.render());
            Ok(self.0.pop_front().unwrap_or(ReviewDecision::Accept))
        }
    }

    fn base() -> PrdDraft {
        let mut d = PrdDraft::new("Feature");
        d.set(Section::Timeline, "Q3");
        d
    }

    #[test]
    fn accept_without_feedback_is_unchanged() {
        let mut reviewer = Scripted(VecDeque::new(), Vec::new());
        let accepted = ReviewLoop::new(base()).run(&mut reviewer, || Ok(base())).unwrap();
        assert_eq!(accepted.render(), base().render());
        assert_eq!(accepted.rounds(), 0);
    }

    #[test]
    fn feedback_accumulates_across_rounds() {
        let mut reviewer = Scripted(
            VecDeque::from([
                ReviewDecision::Revise(vec![Feedback::append(Section::Timeline, "Beta in August")]),
                ReviewDecision::Revise(vec![Feedback::replace(Section::DesignArtifacts, "See Figma")]),
                ReviewDecision::Accept,
            ]),
            Vec::new(),
        );
        let mut recomposed = 0;
        let accepted = ReviewLoop::new(base())
            .run(&mut reviewer, || {
                recomposed += 1;
                Ok(base())
            })
            .unwrap();
        assert_eq!(recomposed, 2);
        assert_eq!(accepted.rounds(), 2);
        assert_eq!(accepted.draft().section(Section::Timeline), "Q3\n\nBeta in August");
        assert_eq!(accepted.draft().section(Section::DesignArtifacts), "See Figma");
        assert_eq!(reviewer.1.len(), 3);
    }

    #[test]
    fn abandon_returns_error() {
        let mut reviewer = Scripted(VecDeque::from([ReviewDecision::Abandon]), Vec::new());
        let err = ReviewLoop::new(base()).run(&mut reviewer, || Ok(base())).unwrap_err();
        assert!(matches!(err, CodexError::Abandoned(_)));
    }

    #[test]
    fn starts_drafted() {
        let rl = ReviewLoop::new(base());
        assert_eq!(rl.state(), ReviewState::Drafted);
        assert!(rl.overrides().is_empty());
    }
}
