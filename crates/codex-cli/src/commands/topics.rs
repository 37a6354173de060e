use codex_config::CodexConfig;
use codex_corpus::Corpus;
use codex_prd::TopicMapper;

pub(super) fn cmd_topics(config: CodexConfig, text: &str, json: bool) -> codex_core::Result<()> {
    let corpus = Corpus::open(&config.corpus.root, &config.matching.aliases)?;
    let matches = TopicMapper::new(&corpus.index, &config.matching).rank_text(text);

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!(
            "No topic matched (threshold {}, {} topics indexed).",
            config.matching.threshold,
            corpus.index.len()
        );
        return Ok(());
    }

    println!("\x1b[1mMatched Topics ({}):\x1b[0m\n", matches.len());
    for m in &matches {
        let detail = match m.via {
            Some(ref via) => format!("linked from {via}"),
            None => m.matched_terms.join(", "),
        };
        println!(
            "  \x1b[36m{:<28}\x1b[0m {:>3}  {:<8} {}",
            m.topic, m.score, m.relevance, detail
        );
    }
    Ok(())
}
