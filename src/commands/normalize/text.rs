use super::*;

pub(crate) const ZWJ: char = '\u{200D}';
pub(crate) const ZWNJ: char = '\u{200C}';

/// Literal encodings seen in extracted and translated text, matched
/// case-insensitively. No pattern is a substring of another.
const ESCAPE_TABLE: &[(&str, char)] = &[
    ("#zwj;", ZWJ),
    ("&zwj;", ZWJ),
    ("&#8205;", ZWJ),
    ("&#x200d;", ZWJ),
    ("<zwj>", ZWJ),
    ("[zwj]", ZWJ),
    ("\\u200d", ZWJ),
    ("#zwnj;", ZWNJ),
    ("&zwnj;", ZWNJ),
    ("&#8204;", ZWNJ),
    ("&#x200c;", ZWNJ),
    ("\\u200c", ZWNJ),
    ("\\u0dca", '\u{0DCA}'),
    ("\\u0dbb", '\u{0DBB}'),
    ("\\u0dba", '\u{0DBA}'),
    ("\\u0dcf", '\u{0DCF}'),
    ("\\u0dd2", '\u{0DD2}'),
    ("\\u0dd4", '\u{0DD4}'),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct NormalizeStats {
    pub strings_visited: usize,
    pub joiner_fixes: usize,
    pub joiner_runs_collapsed: usize,
    pub prefixes_stripped: usize,
}

impl NormalizeStats {
    pub(crate) fn unicode_fixes(&self) -> usize {
        self.joiner_fixes + self.joiner_runs_collapsed
    }

    pub(crate) fn total_fixes(&self) -> usize {
        self.unicode_fixes() + self.prefixes_stripped
    }

    pub(crate) fn absorb(&mut self, other: &NormalizeStats) {
        self.strings_visited += other.strings_visited;
        self.joiner_fixes += other.joiner_fixes;
        self.joiner_runs_collapsed += other.joiner_runs_collapsed;
        self.prefixes_stripped += other.prefixes_stripped;
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TextNormalizer {
    rules: SuffixRules,
    escapes: Regex,
    targets: HashMap<String, char>,
    joiner_run: Regex,
    numeric_prefix: Regex,
}

impl TextNormalizer {
    pub(crate) fn new(rules: &SuffixRules) -> Result<Self> {
        let mut patterns = ESCAPE_TABLE
            .iter()
            .map(|(pattern, _)| regex::escape(pattern))
            .collect::<Vec<String>>();
        patterns.sort_by_key(|pattern| std::cmp::Reverse(pattern.len()));

        Ok(Self {
            rules: rules.clone(),
            escapes: Regex::new(&format!("(?i){}", patterns.join("|")))
                .context("failed to compile joiner escape regex")?,
            targets: ESCAPE_TABLE
                .iter()
                .map(|(pattern, target)| (pattern.to_ascii_lowercase(), *target))
                .collect(),
            joiner_run: Regex::new(r"\x{200D}{2,}").context("failed to compile joiner run regex")?,
            numeric_prefix: Regex::new(r"^\s*\d+\s+\.\s+")
                .context("failed to compile numeric prefix regex")?,
        })
    }

    pub(crate) fn rules(&self) -> &SuffixRules {
        &self.rules
    }

    pub(crate) fn canonicalize_joiners(&self, input: &str) -> (String, usize) {
        let mut count = 0usize;
        let output = self.escapes.replace_all(input, |captures: &Captures| {
            let matched = captures.get(0).map(|m| m.as_str()).unwrap_or_default();
            match self.targets.get(&matched.to_ascii_lowercase()) {
                Some(target) => {
                    count += 1;
                    target.to_string()
                }
                None => matched.to_string(),
            }
        });
        (output.into_owned(), count)
    }

    pub(crate) fn collapse_joiner_runs(&self, input: &str) -> (String, usize) {
        let runs = self.joiner_run.find_iter(input).count();
        if runs == 0 {
            return (input.to_string(), 0);
        }
        let output = self.joiner_run.replace_all(input, ZWJ.to_string().as_str());
        (output.into_owned(), runs)
    }

    pub(crate) fn strip_numeric_prefixes(&self, input: &str) -> (String, usize) {
        let mut stripped = 0usize;
        let lines = input
            .split('\n')
            .map(|line| {
                if self.is_title_line(line) {
                    return line.to_string();
                }

                let mut current = line;
                while let Some(found) = self.numeric_prefix.find(current) {
                    current = &current[found.end()..];
                    stripped += 1;
                }
                current.to_string()
            })
            .collect::<Vec<String>>();

        (lines.join("\n"), stripped)
    }

    pub(crate) fn normalize_text(
        &self,
        input: &str,
        body: bool,
        stats: &mut NormalizeStats,
    ) -> String {
        stats.strings_visited += 1;

        let (canonical, fixes) = self.canonicalize_joiners(input);
        stats.joiner_fixes += fixes;

        let (collapsed, runs) = self.collapse_joiner_runs(&canonical);
        stats.joiner_runs_collapsed += runs;

        if !body {
            return collapsed;
        }

        let (stripped, prefixes) = self.strip_numeric_prefixes(&collapsed);
        stats.prefixes_stripped += prefixes;
        stripped
    }

    pub(crate) fn canonical(&self, input: &str) -> String {
        let (canonical, _) = self.canonicalize_joiners(input);
        canonical
    }

    pub(crate) fn is_title_line(&self, line: &str) -> bool {
        self.rules.is_title(&self.canonical(line))
    }
}
