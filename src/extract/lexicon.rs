// Word lists used by the rule-based extractor.
//
// Business verbs are reported as facts. Generic verbs only split noun
// phrases; they carry no meaning worth mapping on their own.

/// Verbs that describe business actions. Base forms only.
pub const BUSINESS_VERBS: &[&str] = &[
    "acquire", "adopt", "align", "allocate", "automate", "build", "capture",
    "collaborate", "commercialize", "compete", "consolidate", "coordinate",
    "create", "cut", "deliver", "design", "develop", "differentiate",
    "diversify", "divest", "dominate", "enter", "exit", "expand", "export",
    "finance", "franchise", "grow", "hire", "import", "innovate", "integrate",
    "invest", "launch", "leverage", "license", "lock", "manufacture",
    "market", "merge", "negotiate", "outsource", "own", "partner", "price",
    "procure", "produce", "raise", "reduce", "restructure", "scale", "sell",
    "source", "standardize", "subcontract", "supply", "target", "undercut",
    "use",
];

/// Common verbs that end a noun phrase but are not facts themselves.
pub const GENERIC_VERBS: &[&str] = &[
    "analyze", "apply", "ask", "become", "begin", "believe", "bring", "call",
    "cause", "change", "come", "consider", "continue", "describe", "discuss",
    "evaluate", "explain", "face", "fall", "feel", "find", "focus", "get",
    "give", "go", "happen", "help", "hold", "identify", "include", "keep",
    "know", "lead", "leave", "let", "like", "look", "lose", "make", "mean",
    "move", "need", "offer", "pay", "play", "provide", "put", "reach",
    "remain", "require", "rise", "run", "say", "see", "seem", "serve", "set",
    "show", "start", "suggest", "take", "tell", "think", "try", "turn",
    "understand", "want", "work", "write",
];

/// Reduce an inflected lowercase word to a base form found in `lexicon`.
///
/// Handles -s, -es, -ies, -ed, -d, -ied, -ing (with and without a dropped
/// final "e") and doubled final consonants ("cutting", "planned").
pub fn verb_lemma<'a>(word: &str, lexicon: &[&'a str]) -> Option<&'a str> {
    let find = |candidate: &str| lexicon.iter().copied().find(|v| *v == candidate);

    if let Some(v) = find(word) {
        return Some(v);
    }

    let mut candidates: Vec<String> = Vec::new();
    if let Some(stem) = word.strip_suffix("ies").or_else(|| word.strip_suffix("ied")) {
        candidates.push(format!("{stem}y"));
    }
    if let Some(stem) = word.strip_suffix("es") {
        candidates.push(stem.to_string());
    }
    if let Some(stem) = word.strip_suffix('s') {
        candidates.push(stem.to_string());
    }
    for suffix in ["ed", "ing"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            candidates.push(stem.to_string());
            candidates.push(format!("{stem}e"));
            let mut chars = stem.chars().rev();
            if let (Some(last), Some(prev)) = (chars.next(), chars.next()) {
                if last == prev {
                    candidates.push(stem[..stem.len() - last.len_utf8()].to_string());
                }
            }
        }
    }
    if let Some(stem) = word.strip_suffix('d') {
        candidates.push(stem.to_string());
    }

    candidates.iter().find_map(|c| find(c))
}
