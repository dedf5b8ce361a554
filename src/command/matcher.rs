use super::pattern::Segment;
use super::table::CommandEntry;

#[derive(Debug, PartialEq, Eq)]
pub enum MatchError {
    NoMatch,
    Ambiguous { patterns: Vec<String> },
}

/// Picks the candidate whose segments line up with `tokens` positionally:
/// every literal must equal its token exactly (case-sensitive), every
/// placeholder consumes exactly one token, and lengths must agree. Ties
/// resolve to the candidate with the fewest placeholders; a residual tie is
/// a configuration defect reported as `Ambiguous`.
///
/// Returns the winning entry together with the tokens at its placeholder
/// positions, in pattern order.
pub fn resolve<'e, W>(
    candidates: &'e [CommandEntry<W>],
    tokens: &[&str],
) -> Result<(&'e CommandEntry<W>, Vec<String>), MatchError> {
    let mut matched: Vec<&CommandEntry<W>> = candidates
        .iter()
        .filter(|entry| fits(entry.pattern().segments(), tokens))
        .collect();

    if matched.is_empty() {
        return Err(MatchError::NoMatch);
    }

    let fewest = matched
        .iter()
        .map(|entry| entry.pattern().param_count())
        .min()
        .unwrap_or(0);
    matched.retain(|entry| entry.pattern().param_count() == fewest);

    if matched.len() > 1 {
        return Err(MatchError::Ambiguous {
            patterns: matched
                .iter()
                .map(|entry| entry.pattern().source().to_string())
                .collect(),
        });
    }

    let entry = matched[0];
    let raw_args = entry
        .pattern()
        .segments()
        .iter()
        .zip(tokens.iter())
        .filter(|(segment, _)| matches!(segment, Segment::Param(_)))
        .map(|(_, token)| token.to_string())
        .collect();
    Ok((entry, raw_args))
}

fn fits(segments: &[Segment], tokens: &[&str]) -> bool {
    segments.len() == tokens.len()
        && segments
            .iter()
            .zip(tokens.iter())
            .all(|(segment, token)| match segment {
                Segment::Literal(text) => text == token,
                Segment::Param(_) => true,
            })
}
