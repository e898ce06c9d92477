use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineClass<'a> {
    Blank,
    Absorbed { number: u32, title: &'a str },
    RangeStart { start: u32, end: u32, content: &'a str },
    Vagga { name: &'a str },
    TitleHeading { number: u32, title: &'a str },
    SectionStart { number: u32, content: &'a str },
    Footer { text: &'a str },
    Body { text: &'a str },
}

#[derive(Debug, Clone)]
pub(crate) struct LineClassifier {
    normalizer: TextNormalizer,
    absorbed: Regex,
    range: Regex,
    numbered: Regex,
}

impl LineClassifier {
    pub(crate) fn new(normalizer: &TextNormalizer) -> Result<Self> {
        Ok(Self {
            normalizer: normalizer.clone(),
            absorbed: Regex::new(r"^\s*[\(\[]\s*(\d+)\s*[\)\]]\s*(\S.*)$")
                .context("failed to compile absorbed heading regex")?,
            range: Regex::new(r"^\s*(\d+)\s*[-–]\s*(\d+)\.(?:\s+(.*))?$")
                .context("failed to compile range start regex")?,
            numbered: Regex::new(r"^\s*(\d+)\.(?:\s+(.*))?$")
                .context("failed to compile numbered line regex")?,
        })
    }

    pub(crate) fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    fn is_title(&self, text: &str) -> bool {
        self.normalizer.rules().is_title(&self.normalizer.canonical(text))
    }

    fn is_vagga(&self, text: &str) -> bool {
        self.normalizer.rules().is_vagga(&self.normalizer.canonical(text))
    }

    fn is_footer(&self, text: &str) -> bool {
        self.normalizer.rules().is_footer(&self.normalizer.canonical(text))
    }

    pub(crate) fn numbered<'a>(&self, line: &'a str) -> Option<(u32, &'a str)> {
        let captures = self.numbered.captures(line)?;
        let number = positive_number(&captures, 1)?;
        Some((number, captured(&captures, 2).trim()))
    }

    pub(crate) fn classify<'a>(&self, line: &'a str) -> LineClass<'a> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return LineClass::Blank;
        }

        if let Some(captures) = self.absorbed.captures(trimmed) {
            let title = captured(&captures, 2).trim();
            if let Some(number) = positive_number(&captures, 1)
                && self.is_title(title)
            {
                return LineClass::Absorbed { number, title };
            }
        }

        if let Some(captures) = self.range.captures(trimmed)
            && let (Some(start), Some(end)) = (
                positive_number(&captures, 1),
                positive_number(&captures, 2),
            )
            && start <= end
        {
            return LineClass::RangeStart {
                start,
                end,
                content: captured(&captures, 3).trim(),
            };
        }

        let numbered = self.numbered(trimmed);

        if self.is_vagga(trimmed) {
            let name = numbered.map(|(_, content)| content).unwrap_or(trimmed);
            return LineClass::Vagga { name };
        }

        if let Some((number, content)) = numbered {
            if self.is_title(content) {
                return LineClass::TitleHeading {
                    number,
                    title: content,
                };
            }
            return LineClass::SectionStart { number, content };
        }

        if self.is_footer(trimmed) {
            return LineClass::Footer { text: trimmed };
        }

        LineClass::Body { text: trimmed }
    }
}

fn captured<'a>(captures: &Captures<'a>, index: usize) -> &'a str {
    captures.get(index).map(|m| m.as_str()).unwrap_or_default()
}

fn positive_number(captures: &Captures<'_>, index: usize) -> Option<u32> {
    captured(captures, index)
        .parse::<u32>()
        .ok()
        .filter(|number| *number > 0)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ChannelSection {
    pub number: u32,
    pub number_range: Option<String>,
    pub title: Option<String>,
    pub vagga: Option<String>,
    pub body: Vec<String>,
    pub absorbed: Vec<(u32, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ChannelSegments {
    pub title: String,
    pub footer: Vec<String>,
    pub sections: Vec<ChannelSection>,
    pub ignored_lines: usize,
}

impl ChannelSegments {
    pub(crate) fn duplicate_numbers(&self) -> usize {
        let mut seen = HashSet::new();
        self.sections
            .iter()
            .filter(|section| !seen.insert(section.number))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Searching,
    InChapter,
    InSection,
}

#[derive(Debug)]
struct SectionMachine<'c> {
    classifier: &'c LineClassifier,
    state: State,
    pending_title: Option<(u32, String)>,
    current_vagga: Option<String>,
    segments: ChannelSegments,
}

impl<'c> SectionMachine<'c> {
    fn new(classifier: &'c LineClassifier) -> Self {
        Self {
            classifier,
            state: State::Searching,
            pending_title: None,
            current_vagga: None,
            segments: ChannelSegments::default(),
        }
    }

    fn feed(&mut self, line: &str) {
        if self.state == State::Searching {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return;
            }
            let title = self
                .classifier
                .numbered(trimmed)
                .map(|(_, content)| content)
                .unwrap_or(trimmed);
            self.segments.title = title.to_string();
            self.state = State::InChapter;
            return;
        }

        match self.classifier.classify(line) {
            LineClass::Blank => {}
            LineClass::Absorbed { number, title } => match self.open_section_mut() {
                Some(section) => section.absorbed.push((number, title.to_string())),
                None => self.ignore(line),
            },
            LineClass::RangeStart {
                start,
                end,
                content,
            } => self.open_section(start, Some(format!("{start}-{end}")), content),
            LineClass::Vagga { name } => self.current_vagga = Some(name.to_string()),
            LineClass::TitleHeading { number, title } => {
                self.flush_pending_title();
                self.pending_title = Some((number, title.to_string()));
            }
            LineClass::SectionStart { number, content } => self.open_section(number, None, content),
            LineClass::Footer { text } => self.segments.footer.push(text.to_string()),
            LineClass::Body { text } => {
                if let Some(number) = self.pending_number() {
                    self.open_section(number, None, text);
                } else if let Some(section) = self.open_section_mut() {
                    section.body.push(text.to_string());
                } else {
                    self.ignore(line);
                }
            }
        }
    }

    fn finish(mut self) -> ChannelSegments {
        self.flush_pending_title();
        self.segments
    }

    fn open_section(&mut self, number: u32, number_range: Option<String>, content: &str) {
        let title = self.pending_title.take().map(|(_, title)| title);
        let mut body = Vec::new();
        if !content.is_empty() {
            body.push(content.to_string());
        }

        self.segments.sections.push(ChannelSection {
            number,
            number_range,
            title,
            vagga: self.current_vagga.clone(),
            body,
            absorbed: Vec::new(),
        });
        self.state = State::InSection;
    }

    fn open_section_mut(&mut self) -> Option<&mut ChannelSection> {
        if self.state != State::InSection {
            return None;
        }
        self.segments.sections.last_mut()
    }

    fn flush_pending_title(&mut self) {
        if let Some(number) = self.pending_number() {
            self.open_section(number, None, "");
        }
    }

    fn pending_number(&self) -> Option<u32> {
        self.pending_title.as_ref().map(|(number, _)| *number)
    }

    fn ignore(&mut self, line: &str) {
        debug!(line = %line.trim(), "ignoring line outside any section");
        self.segments.ignored_lines += 1;
    }
}

pub(crate) fn segment_channel(classifier: &LineClassifier, lines: &[&str]) -> ChannelSegments {
    let mut machine = SectionMachine::new(classifier);
    for line in lines {
        machine.feed(line);
    }
    machine.finish()
}
