use console::style;

use codex_config::CodexConfig;
use codex_core::{CodexError, Result};
use codex_skills::{SkillDefinition, SkillRegistry};

use super::SkillAction;

pub(super) fn cmd_skill(config: CodexConfig, action: SkillAction) -> Result<()> {
    let skills_dir = config.corpus.skills_path();
    let mut registry = SkillRegistry::new(&skills_dir);
    registry.discover()?;

    match action {
        SkillAction::List => {
            if registry.is_empty() {
                eprintln!("📭 No skill templates under {}", skills_dir.display());
                return Ok(());
            }
            println!("{}", style(format!("🧩 Skill templates ({})", registry.count())).bold());
            for s in registry.list() {
                let phases = match s.phases.len() {
                    0 => String::new(),
                    1 => " · 1 phase".to_string(),
                    n => format!(" · {n} phases"),
                };
                println!("  {:<24} {}{}", style(&s.name).cyan(), style(format!("v{}", s.version)).dim(), phases);
                println!("  {:<24} {}", "", s.description);
            }
        }
        SkillAction::Show { name } => {
            let skill = registry.get(&name).ok_or_else(|| {
                CodexError::Skill(format!("no skill named '{name}' under {}", skills_dir.display()))
            })?;
            print_skill(skill);
        }
    }
    Ok(())
}

fn print_skill(skill: &SkillDefinition) {
    println!("{} {}", style(&skill.name).bold(), style(format!("v{}", skill.version)).dim());
    println!("{}\n", skill.description);

    let mut facts: Vec<(&str, String)> = vec![("Source", skill.file_path.display().to_string())];
    if let Some(ref author) = skill.author {
        facts.push(("Author", author.clone()));
    }
    if !skill.tags.is_empty() {
        facts.push(("Tags", skill.tags.join(", ")));
    }
    for (label, value) in facts {
        println!("  {:<8} {value}", style(label).dim());
    }

    if !skill.phases.is_empty() {
        println!("\n{}", style("Phases").bold());
        for phase in &skill.phases {
            println!("  {:>2}. {}", phase.number, phase.title);
        }
    }
}
